use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use quizr::session::StoredResult;
use quizr::session::result::Performance;
use quizr::session::timer::format_clock;

use crate::ui::theme::Theme;

/// Stored results, newest first, with the selected row highlighted.
pub struct HistoryTable<'a> {
    pub results: &'a [StoredResult],
    pub selected: usize,
    pub subject_name: &'a dyn Fn(u32) -> String,
    pub loading: bool,
    pub error: Option<&'a str>,
    pub theme: &'a Theme,
}

pub fn format_row(index: usize, stored: &StoredResult, subject: &str) -> String {
    let r = &stored.result;
    format!(
        " {index:>3}  {date}  {subject:<14.14}  {difficulty:<12}  {score:>5.0}%  {correct:>3}/{total:<3}  {time:>6}",
        date = stored.created_at.format("%Y-%m-%d %H:%M"),
        difficulty = r.difficulty.label(),
        score = r.score_percent,
        correct = r.correct_count,
        total = r.total_count,
        time = format_clock(r.time_spent_secs),
    )
}

impl Widget for HistoryTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(Line::from(Span::styled(
                " Your Results ",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![
            Line::from(Span::styled(
                "   #  Date              Subject         Difficulty    Score  Correct    Time",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "  \u{2500}".to_string() + &"\u{2500}".repeat(74),
                Style::default().fg(colors.border()),
            )),
        ];

        if let Some(err) = self.error {
            lines.push(Line::from(Span::styled(
                format!("  {err}"),
                Style::default().fg(colors.error()),
            )));
        } else if self.loading && self.results.is_empty() {
            lines.push(Line::from(Span::styled(
                "  Loading...",
                Style::default().fg(colors.muted()),
            )));
        } else if self.results.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No results yet.",
                Style::default().fg(colors.muted()),
            )));
        }

        let visible = inner.height.saturating_sub(2) as usize;
        let offset = self.selected.saturating_sub(visible.saturating_sub(1));
        let total = self.results.len();
        for (i, stored) in self.results.iter().enumerate().skip(offset).take(visible) {
            let color = match stored.result.performance() {
                Performance::Excellent => colors.success(),
                Performance::Good => colors.warning(),
                Performance::NeedsImprovement => colors.error(),
            };
            let style = if i == self.selected {
                Style::default().fg(color).bg(colors.accent_dim())
            } else {
                Style::default().fg(color)
            };
            let subject = (self.subject_name)(stored.result.subject_id);
            lines.push(Line::from(Span::styled(
                format_row(total - i, stored, &subject),
                style,
            )));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use quizr::session::{Difficulty, TestResult};

    #[test]
    fn test_format_row_columns() {
        let at = Utc.with_ymd_and_hms(2026, 5, 4, 13, 7, 0).unwrap();
        let stored = StoredResult {
            id: 9,
            created_at: at,
            result: TestResult {
                student_id: 1,
                subject_id: 1,
                difficulty: Difficulty::Advanced,
                correct_count: 4,
                total_count: 5,
                score_percent: 80.0,
                time_spent_secs: 605,
                created_at: at,
            },
        };
        let row = format_row(3, &stored, "Mathematics");
        assert!(row.starts_with("   3  2026-05-04 13:07  Mathematics"));
        assert!(row.contains("80%"));
        assert!(row.contains("4/5"));
        assert!(row.ends_with("10:05"));
    }
}
