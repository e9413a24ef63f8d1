use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use quizr::session::Difficulty;
use quizr::wizard::WizardStep;

use crate::app::{StudentField, WizardState};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

pub struct WizardView<'a> {
    pub state: &'a WizardState,
    pub theme: &'a Theme,
}

impl<'a> WizardView<'a> {
    pub fn new(state: &'a WizardState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn step_bar(&self) -> Line<'static> {
        let colors = &self.theme.colors;
        let mut spans = vec![Span::raw("  ")];
        for step in WizardStep::ALL {
            let style = if step == self.state.step {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else if step.index() < self.state.step.index() {
                Style::default().fg(colors.success())
            } else {
                Style::default().fg(colors.muted())
            };
            spans.push(Span::styled(
                format!("{}. {}", step.index() + 1, step.title()),
                style,
            ));
            if step.next().is_some() {
                spans.push(Span::styled("  \u{203a}  ", Style::default().fg(colors.muted())));
            }
        }
        Line::from(spans)
    }

    fn choice_lines(&self, rows: Vec<(String, String)>) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let mut lines = Vec::new();
        for (i, (label, detail)) in rows.into_iter().enumerate() {
            let selected = i == self.state.cursor;
            let indicator = if selected { ">" } else { " " };
            let style = if selected {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(Span::styled(format!(" {indicator} {label}"), style)));
            if !detail.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("     {detail}"),
                    Style::default().fg(colors.muted()),
                )));
            }
        }
        lines
    }

    fn body(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let draft = &self.state.draft;
        match self.state.step {
            WizardStep::Subject => {
                if self.state.subjects_loading {
                    return vec![Line::from(Span::styled(
                        "  Loading subjects...",
                        Style::default().fg(colors.muted()),
                    ))];
                }
                self.choice_lines(
                    self.state
                        .subjects
                        .iter()
                        .map(|s| (s.name.clone(), String::new()))
                        .collect(),
                )
            }
            WizardStep::Difficulty => self.choice_lines(
                Difficulty::ALL
                    .iter()
                    .map(|d| (d.label().to_string(), d.description().to_string()))
                    .collect(),
            ),
            WizardStep::Limits => {
                let field = |idx: usize, label: &str, value: String| {
                    let selected = self.state.limits_field == idx;
                    let style = if selected {
                        Style::default()
                            .fg(colors.accent())
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(colors.fg())
                    };
                    Line::from(vec![
                        Span::styled(
                            format!(" {} {label:<20}", if selected { ">" } else { " " }),
                            style,
                        ),
                        Span::styled(format!("< {value} >"), style),
                    ])
                };
                vec![
                    field(0, "Duration", format!("{} minutes", draft.duration_minutes)),
                    Line::from(""),
                    field(1, "Questions", draft.question_count.to_string()),
                ]
            }
            WizardStep::Review => {
                let row = |label: &str, value: String| {
                    Line::from(vec![
                        Span::styled(format!("   {label:<12}"), Style::default().fg(colors.muted())),
                        Span::styled(value, Style::default().fg(colors.fg())),
                    ])
                };
                vec![
                    row(
                        "Subject",
                        draft
                            .subject
                            .as_ref()
                            .map(|s| s.name.clone())
                            .unwrap_or_default(),
                    ),
                    row(
                        "Difficulty",
                        draft.difficulty.map(|d| d.label().to_string()).unwrap_or_default(),
                    ),
                    row("Duration", format!("{} minutes", draft.duration_minutes)),
                    row("Questions", draft.question_count.to_string()),
                ]
            }
            WizardStep::Student => vec![
                self.input_line("Full name", &self.state.name_input, StudentField::Name),
                Line::from(""),
                self.input_line("Email", &self.state.email_input, StudentField::Email),
            ],
        }
    }

    fn input_line(&self, label: &str, input: &LineInput, field: StudentField) -> Line<'static> {
        let colors = &self.theme.colors;
        let focused = self.state.student_field == field;
        let label_style = if focused {
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.fg())
        };
        let mut spans = vec![Span::styled(format!("   {label:<12}"), label_style)];
        let (before, cursor, after) = input.render_parts();
        spans.push(Span::styled(before.to_string(), Style::default().fg(colors.fg())));
        if focused {
            spans.push(Span::styled(
                cursor.map(String::from).unwrap_or_else(|| " ".to_string()),
                Style::default().fg(colors.cursor_fg()).bg(colors.cursor_bg()),
            ));
        } else if let Some(ch) = cursor {
            spans.push(Span::styled(ch.to_string(), Style::default().fg(colors.fg())));
        }
        spans.push(Span::styled(after.to_string(), Style::default().fg(colors.fg())));
        Line::from(spans)
    }

    fn hint(&self) -> &'static str {
        match self.state.step {
            WizardStep::Subject | WizardStep::Difficulty => "[\u{2191}/\u{2193}] Choose  [Enter] Next  [Esc] Back",
            WizardStep::Limits => "[\u{2191}/\u{2193}] Field  [\u{2190}/\u{2192}] Adjust  [Enter] Next  [Esc] Back",
            WizardStep::Review => "[Enter] Continue  [Esc] Back",
            WizardStep::Student => "[Tab] Switch field  [Enter] Start test  [Esc] Back",
        }
    }
}

impl Widget for WizardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" New Test: {} ", self.state.step.title()))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(4),
                Constraint::Length(2),
                Constraint::Length(1),
            ])
            .split(inner);

        Paragraph::new(self.step_bar()).render(layout[0], buf);
        Paragraph::new(self.body())
            .wrap(Wrap { trim: false })
            .render(layout[1], buf);

        if let Some(err) = &self.state.error {
            Paragraph::new(Line::from(Span::styled(
                format!("  {err}"),
                Style::default().fg(colors.error()),
            )))
            .wrap(Wrap { trim: false })
            .render(layout[2], buf);
        }

        Paragraph::new(Line::from(Span::styled(
            format!("  {}", self.hint()),
            Style::default().fg(colors.muted()),
        )))
        .render(layout[3], buf);
    }
}
