use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use quizr::session::StoredResult;
use quizr::session::history::HistoryComparison;
use quizr::session::result::Performance;
use quizr::session::timer::format_clock;

use crate::ui::theme::Theme;

pub struct ResultCard<'a> {
    pub stored: &'a StoredResult,
    pub subject_name: &'a str,
    pub comparison: Option<&'a HistoryComparison>,
    pub theme: &'a Theme,
}

impl<'a> ResultCard<'a> {
    pub fn new(
        stored: &'a StoredResult,
        subject_name: &'a str,
        comparison: Option<&'a HistoryComparison>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            stored,
            subject_name,
            comparison,
            theme,
        }
    }
}

fn format_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{delta:.1} points")
    } else if delta < 0.0 {
        format!("{delta:.1} points")
    } else {
        "no change".to_string()
    }
}

impl Widget for ResultCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let result = &self.stored.result;
        let performance = result.performance();

        let block = Block::bordered()
            .title(" Test Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                self.subject_name,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({})", result.difficulty.label()),
                Style::default().fg(colors.muted()),
            ),
        ]))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let score_color = match performance {
            Performance::Excellent => colors.success(),
            Performance::Good => colors.warning(),
            Performance::NeedsImprovement => colors.error(),
        };
        let label = Style::default().fg(colors.fg());
        let stats = vec![
            Line::from(vec![
                Span::styled("  Score:    ", label),
                Span::styled(
                    format!("{:.0}%", result.score_percent),
                    Style::default().fg(score_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  ({})", performance.label()),
                    Style::default().fg(score_color),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Correct:  ", label),
                Span::styled(
                    format!("{} / {}", result.correct_count, result.total_count),
                    label,
                ),
            ]),
            Line::from(vec![
                Span::styled("  Time:     ", label),
                Span::styled(format_clock(result.time_spent_secs), label),
            ]),
        ];
        Paragraph::new(stats).render(layout[1], buf);

        Paragraph::new(Line::from(Span::styled(
            format!("  {}", performance.advice()),
            Style::default().fg(colors.fg()),
        )))
        .wrap(Wrap { trim: false })
        .render(layout[2], buf);

        let mut history_lines = Vec::new();
        match self.comparison {
            None => history_lines.push(Line::from(Span::styled(
                "  Loading previous attempts...",
                Style::default().fg(colors.muted()),
            ))),
            Some(cmp) if cmp.attempts == 0 => history_lines.push(Line::from(Span::styled(
                "  First attempt at this subject.",
                Style::default().fg(colors.muted()),
            ))),
            Some(cmp) => {
                if let Some(delta) = cmp.delta_from_previous(result.score_percent) {
                    let color = if delta >= 0.0 {
                        colors.success()
                    } else {
                        colors.error()
                    };
                    history_lines.push(Line::from(vec![
                        Span::styled("  Since last attempt: ", label),
                        Span::styled(format_delta(delta), Style::default().fg(color)),
                    ]));
                }
                if let (Some(best), Some(avg)) = (cmp.best_score, cmp.average_score) {
                    history_lines.push(Line::from(Span::styled(
                        format!(
                            "  Best {best:.0}%, average {avg:.0}% over {} earlier attempt{}",
                            cmp.attempts,
                            if cmp.attempts == 1 { "" } else { "s" }
                        ),
                        Style::default().fg(colors.muted()),
                    )));
                }
                if cmp.is_personal_best(result.score_percent) {
                    history_lines.push(Line::from(Span::styled(
                        "  New personal best!",
                        Style::default()
                            .fg(colors.success())
                            .add_modifier(Modifier::BOLD),
                    )));
                }
            }
        }
        Paragraph::new(history_lines).render(layout[3], buf);

        Paragraph::new(Line::from(Span::styled(
            "  [Enter] Menu  [n] New test  [h] History",
            Style::default().fg(colors.accent()),
        )))
        .render(layout[4], buf);
    }
}
