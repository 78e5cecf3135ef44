//! Status bar rendering with keybindings and state indicators
//!
//! The left half shows the latest message from the channel, or the command
//! prompt while the operator is typing. The right half lists keybindings
//! and flags an in-flight refresh or pending operation.

use crate::message::{Message, Severity};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// What the status bar needs to know about the application
pub struct StatusLine<'a> {
    pub latest: Option<&'a Message>,
    pub input: Option<&'a str>,
    pub generation: u64,
    pub refreshing: bool,
    pub pending: Option<&'static str>,
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, status: StatusLine<'_>) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let is_error = status
        .latest
        .is_some_and(|m| m.severity == Severity::Error);

    let left_spans = if let Some(input) = status.input {
        vec![
            Span::styled(
                " CMD ",
                Style::default()
                    .bg(DEFAULT_THEME.secondary)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" :{}█", input),
                Style::default()
                    .bg(DEFAULT_THEME.current_line_bg)
                    .fg(DEFAULT_THEME.fg),
            ),
        ]
    } else {
        let text = status
            .latest
            .map(|m| m.text.as_str())
            .unwrap_or("Ready!");
        vec![
            Span::styled(
                format!(" Snapshot #{} ", status.generation),
                Style::default()
                    .bg(if is_error {
                        DEFAULT_THEME.error
                    } else {
                        DEFAULT_THEME.primary
                    })
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                " | ",
                Style::default()
                    .bg(DEFAULT_THEME.current_line_bg)
                    .fg(DEFAULT_THEME.comment),
            ),
            Span::styled(
                format!(" {} ", text),
                Style::default()
                    .bg(DEFAULT_THEME.current_line_bg)
                    .fg(if is_error {
                        DEFAULT_THEME.error
                    } else {
                        DEFAULT_THEME.fg
                    }),
            ),
        ]
    };

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let mut right_spans = vec![
        Span::styled(" : ", key_style),
        Span::styled(" command ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" c/d/v ", key_style),
        Span::styled(" create/delete/convert ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" r ", key_style),
        Span::styled(" refresh ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled("q", key_style),
        Span::styled(" quit ", desc_style),
    ];

    if let Some(pending) = status.pending {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            format!(" ⏳ {} ", pending.to_uppercase()),
            Style::default()
                .bg(DEFAULT_THEME.secondary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    } else if status.refreshing {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            " ⟳ SYNC ",
            Style::default()
                .bg(DEFAULT_THEME.success)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}
