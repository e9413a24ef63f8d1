use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use quizr::session::Session;

use crate::ui::theme::Theme;

/// Grid of numbered markers, one per question: current, answered or open.
pub struct QuestionNav<'a> {
    pub session: &'a Session,
    pub theme: &'a Theme,
    pub bordered: bool,
}

impl<'a> QuestionNav<'a> {
    pub fn new(session: &'a Session, theme: &'a Theme) -> Self {
        Self {
            session,
            theme,
            bordered: true,
        }
    }
}

impl Widget for QuestionNav<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let inner = if self.bordered {
            let block = Block::bordered()
                .title(" Questions ")
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg()));
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let width = self.session.len().to_string().len();
        let mut spans = Vec::with_capacity(self.session.len() * 2);
        for i in 0..self.session.len() {
            let label = format!("[{:>width$}]", i + 1);
            let style = if i == self.session.current_index() {
                Style::default()
                    .fg(colors.cursor_fg())
                    .bg(colors.cursor_bg())
                    .add_modifier(Modifier::BOLD)
            } else if self.session.is_answered(i) {
                Style::default().fg(colors.success())
            } else {
                Style::default().fg(colors.muted())
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }

        let summary = Line::from(Span::styled(
            format!(
                "{} of {} answered",
                self.session.answered_count(),
                self.session.len()
            ),
            Style::default().fg(colors.fg()),
        ));

        let mut lines = vec![Line::from(spans)];
        if self.bordered {
            lines.push(Line::from(""));
            lines.push(summary);
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
