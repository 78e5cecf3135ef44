//! Aggregate usage pane

use super::pane_block;
use crate::render::VisualizationFrame;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Gauge, Paragraph},
    Frame,
};

pub fn render_usage_pane(frame: &mut Frame, area: Rect, visual: &VisualizationFrame) {
    let block = pane_block(" Usage ", false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let usage = visual.usage;
    let ratio = usage.utilization().clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(DEFAULT_THEME.primary)
                .bg(DEFAULT_THEME.free),
        )
        .ratio(ratio)
        .label(format!("{:.1}%", ratio * 100.0));
    frame.render_widget(gauge, rows[0]);

    let label = Style::default().fg(DEFAULT_THEME.comment);
    let value = Style::default().fg(DEFAULT_THEME.fg);
    let lines = vec![
        Line::from(vec![
            Span::styled("Used  ", label),
            Span::styled(format!("{} {}", usage.used, visual.unit), value),
        ]),
        Line::from(vec![
            Span::styled("Free  ", label),
            Span::styled(format!("{} {}", usage.free, visual.unit), value),
        ]),
        Line::from(vec![
            Span::styled("Total ", label),
            Span::styled(format!("{} {}", usage.total, visual.unit), value),
            Span::styled(format!("  ({} processes)", usage.processes), label),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), rows[1]);
}
