use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use quizr::session::Session;

use crate::ui::theme::Theme;

/// The current question with its options. The highlighted row follows the
/// option cursor; the recorded answer is marked separately.
pub struct QuestionCard<'a> {
    pub session: &'a Session,
    pub cursor: usize,
    pub theme: &'a Theme,
}

impl<'a> QuestionCard<'a> {
    pub fn new(session: &'a Session, cursor: usize, theme: &'a Theme) -> Self {
        Self {
            session,
            cursor,
            theme,
        }
    }
}

impl Widget for QuestionCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let question = self.session.current_question();
        let recorded = self.session.answer_for(question.id);
        let locked = self.session.is_locked();

        let title = format!(
            " Question {} of {} ",
            self.session.current_index() + 1,
            self.session.len()
        );
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {}", question.prompt),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];

        for (i, option) in question.options.iter().enumerate() {
            let chosen = recorded == Some(option.as_str());
            let marker = if chosen { "(\u{2022})" } else { "( )" };
            let text = format!("  {marker} {}. {option}", i + 1);
            let style = if i == self.cursor && !locked {
                Style::default().fg(colors.cursor_fg()).bg(colors.cursor_bg())
            } else if chosen {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            lines.push(Line::from(Span::styled(text, style)));
        }

        lines.push(Line::from(""));
        let hint = if self.session.submission().is_pending() {
            Span::styled("  Saving result...", Style::default().fg(colors.warning()))
        } else if locked {
            Span::styled(
                "  Time is up, answers are final",
                Style::default().fg(colors.warning()),
            )
        } else if recorded.is_none() {
            Span::styled(
                "  Choose an answer to continue",
                Style::default().fg(colors.muted()),
            )
        } else {
            Span::styled("  Answer recorded", Style::default().fg(colors.success()))
        };
        lines.push(Line::from(hint));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
