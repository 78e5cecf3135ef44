//! Message log pane

use super::{clamp_scroll, pane_block};
use crate::message::{Message, Severity};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, Padding, Paragraph},
    Frame,
};

pub fn render_messages_pane(
    frame: &mut Frame,
    area: Rect,
    messages: &[Message],
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Messages ", is_focused);

    if messages.is_empty() {
        let paragraph = Paragraph::new("(no messages)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    clamp_scroll(scroll_offset, messages.len(), visible_height);

    let items: Vec<ListItem> = messages
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|message| {
            let color = match message.severity {
                Severity::Info => DEFAULT_THEME.success,
                Severity::Error => DEFAULT_THEME.error,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>3} ", message.id),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
                Span::styled(message.text.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
