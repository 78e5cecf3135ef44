//! Block table pane: one row per block, columns chosen by the frame

use super::{clamp_scroll, pane_block};
use crate::render::{BlockStatus, Column, VisualizationFrame};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

pub fn render_table_pane(
    frame: &mut Frame,
    area: Rect,
    visual: &VisualizationFrame,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Blocks ", is_focused);

    if visual.rows.is_empty() {
        let paragraph = Paragraph::new("(no blocks)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    // Borders and header row
    let visible_height = area.height.saturating_sub(3).max(1) as usize;
    clamp_scroll(scroll_offset, visual.rows.len(), visible_height);

    let header = Row::new(
        visual
            .columns
            .iter()
            .map(|c| Cell::from(c.title()))
            .collect::<Vec<_>>(),
    )
    .style(
        Style::default()
            .fg(DEFAULT_THEME.primary)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = visual
        .rows
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|row| {
            let style = match row.status {
                BlockStatus::Allocated => Style::default().fg(DEFAULT_THEME.fg),
                BlockStatus::Free => Style::default().fg(DEFAULT_THEME.comment),
            };
            Row::new(
                visual
                    .columns
                    .iter()
                    .map(|&c| Cell::from(row.cell(c, &visual.unit)))
                    .collect::<Vec<_>>(),
            )
            .style(style)
        })
        .collect();

    let widths: Vec<Constraint> = visual.columns.iter().map(|&c| column_width(c)).collect();

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn column_width(column: Column) -> Constraint {
    match column {
        Column::Occupant => Constraint::Length(12),
        Column::Size => Constraint::Length(14),
        Column::Status => Constraint::Length(11),
        Column::Base | Column::Limit => Constraint::Min(8),
    }
}
