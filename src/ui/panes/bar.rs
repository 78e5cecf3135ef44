//! Proportional memory bar
//!
//! Each segment of the frame becomes a run of coloured cells whose width
//! comes from [`scale_to_width`]. Labels are drawn inside a segment only
//! when they fit.

use super::pane_block;
use crate::render::{scale_to_width, SegmentKind, VisualizationFrame};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Padding, Paragraph},
    Frame,
};

pub fn render_bar_pane(frame: &mut Frame, area: Rect, visual: &VisualizationFrame) {
    let title = match &visual.scheme {
        Some(scheme) => format!(" Memory Map ({}) ", scheme),
        None => " Memory Map ".to_string(),
    };
    let block = pane_block(&title, false).padding(Padding::new(1, 1, 0, 0));
    let inner = block.inner(area);

    if visual.empty || visual.segments.is_empty() {
        let paragraph = Paragraph::new("(no memory)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let cells = scale_to_width(visual, inner.width);
    let bar_height = inner.height.saturating_sub(1).max(1) as usize;

    let mut lines = Vec::with_capacity(bar_height + 1);
    for row in 0..bar_height {
        let show_label = row == bar_height / 2;
        let spans: Vec<Span> = visual
            .segments
            .iter()
            .zip(&cells)
            .filter(|(_, width)| **width > 0)
            .map(|(segment, &width)| {
                let (bg, label) = match segment.kind {
                    SegmentKind::Free => (DEFAULT_THEME.free, String::new()),
                    SegmentKind::Allocated(pid) => {
                        (DEFAULT_THEME.process_color(pid), format!("P{}", pid))
                    }
                };
                let text = if show_label {
                    centered(&label, width as usize)
                } else {
                    " ".repeat(width as usize)
                };
                Span::styled(
                    text,
                    Style::default()
                        .bg(bg)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                )
            })
            .collect();
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(scale_line(visual, inner.width as usize)));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Address ticks under the bar: `0` on the left, total on the right
fn scale_line(visual: &VisualizationFrame, width: usize) -> Vec<Span<'static>> {
    let start = "0".to_string();
    let end = format!("{} {}", visual.usage.total, visual.unit);
    let gap = width.saturating_sub(start.len() + end.len());
    vec![
        Span::styled(start, Style::default().fg(DEFAULT_THEME.comment)),
        Span::raw(" ".repeat(gap)),
        Span::styled(end, Style::default().fg(DEFAULT_THEME.comment)),
    ]
}

/// Center `label` in `width` cells, or blank it if it does not fit
fn centered(label: &str, width: usize) -> String {
    if label.is_empty() || label.len() > width {
        return " ".repeat(width);
    }
    let left = (width - label.len()) / 2;
    let right = width - label.len() - left;
    format!("{}{}{}", " ".repeat(left), label, " ".repeat(right))
}
