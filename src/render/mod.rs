//! Pure projection of a [`MemoryMap`] into visualization artifacts
//!
//! [`render`] produces a [`VisualizationFrame`]: proportional bar segments,
//! table rows and aggregate usage. Proportion is the only sizing quantity in
//! a frame; turning it into terminal cells is done by [`scale_to_width`] at
//! presentation time. Optional output facets (extra table columns, unit
//! label) are selected through [`RenderOptions`] rather than separate code
//! paths.
//!
//! A frame is a complete description of what to draw. Targets replace their
//! previous content with it wholesale.

use crate::model::{MemoryMap, ProcessId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_base: bool,
    pub show_limit: bool,
    pub unit: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            show_base: true,
            show_limit: false,
            unit: "KB".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Free,
    Allocated(ProcessId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub size: u64,
    /// `size / total_memory`, or 0 for an empty address space
    pub proportion: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Allocated,
    Free,
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockStatus::Allocated => write!(f, "Allocated"),
            BlockStatus::Free => write!(f, "Free"),
        }
    }
}

/// Visible table columns, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Occupant,
    Size,
    Status,
    Base,
    Limit,
}

impl Column {
    pub fn title(&self) -> &'static str {
        match self {
            Column::Occupant => "Process ID",
            Column::Size => "Size",
            Column::Status => "Status",
            Column::Base => "Base",
            Column::Limit => "Limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub occupant: String,
    pub size: u64,
    pub status: BlockStatus,
    pub base: u64,
    pub limit: u64,
}

impl TableRow {
    pub fn cell(&self, column: Column, unit: &str) -> String {
        match column {
            Column::Occupant => self.occupant.clone(),
            Column::Size => format!("{} {}", self.size, unit),
            Column::Status => self.status.to_string(),
            Column::Base => self.base.to_string(),
            Column::Limit => self.limit.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// Number of allocated blocks
    pub processes: usize,
}

impl Usage {
    /// Fraction of the address space in use, 0 when there is none
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationFrame {
    pub segments: Vec<Segment>,
    pub columns: Vec<Column>,
    pub rows: Vec<TableRow>,
    pub usage: Usage,
    pub unit: String,
    pub scheme: Option<String>,
    /// Set when the address space has zero capacity
    pub empty: bool,
}

impl VisualizationFrame {
    /// Frame drawn before anything has been fetched
    pub fn blank(options: &RenderOptions) -> Self {
        render(&MemoryMap::empty(), options)
    }
}

pub fn occupant_label(kind: SegmentKind) -> String {
    match kind {
        SegmentKind::Free => "Free".to_string(),
        SegmentKind::Allocated(pid) => format!("PID {}", pid),
    }
}

/// Project a memory map into a frame
pub fn render(map: &MemoryMap, options: &RenderOptions) -> VisualizationFrame {
    let total = map.total_memory();
    let empty = total == 0;

    let segments = map
        .blocks()
        .iter()
        .map(|block| Segment {
            kind: match block.occupant {
                Some(pid) => SegmentKind::Allocated(pid),
                None => SegmentKind::Free,
            },
            size: block.size,
            proportion: if empty {
                0.0
            } else {
                block.size as f64 / total as f64
            },
        })
        .collect::<Vec<_>>();

    let rows = map
        .blocks()
        .iter()
        .zip(&segments)
        .map(|(block, segment)| TableRow {
            occupant: occupant_label(segment.kind),
            size: block.size,
            status: if block.is_free() {
                BlockStatus::Free
            } else {
                BlockStatus::Allocated
            },
            base: block.base,
            limit: block.limit(),
        })
        .collect();

    let mut columns = vec![Column::Occupant, Column::Size, Column::Status];
    if options.show_base {
        columns.push(Column::Base);
    }
    if options.show_limit {
        columns.push(Column::Limit);
    }

    let used = map.used();

    VisualizationFrame {
        segments,
        columns,
        rows,
        usage: Usage {
            total,
            used,
            free: total.saturating_sub(used),
            processes: map.process_count(),
        },
        unit: options.unit.clone(),
        scheme: map.scheme().map(|s| s.to_string()),
        empty,
    }
}

/// Apportion `width` cells among the frame's segments
///
/// Uses the largest-remainder method on exact integer arithmetic so the
/// cells sum to `width`. When there is room, every segment gets at least one
/// cell, taken from the widest segment.
pub fn scale_to_width(frame: &VisualizationFrame, width: u16) -> Vec<u16> {
    let count = frame.segments.len();
    let total = frame.usage.total as u128;
    if frame.empty || count == 0 || width == 0 || total == 0 {
        return vec![0; count];
    }

    let width_u = width as u128;
    let mut cells: Vec<u16> = Vec::with_capacity(count);
    let mut remainders: Vec<(u128, usize)> = Vec::with_capacity(count);
    for (index, segment) in frame.segments.iter().enumerate() {
        let scaled = segment.size as u128 * width_u;
        cells.push((scaled / total) as u16);
        remainders.push((scaled % total, index));
    }

    let assigned: u32 = cells.iter().map(|&c| c as u32).sum();
    let mut leftover = (width as u32).saturating_sub(assigned);
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, index) in remainders.iter().cycle().take(count * 2) {
        if leftover == 0 {
            break;
        }
        cells[index] += 1;
        leftover -= 1;
    }

    if (width as usize) >= count {
        for index in 0..count {
            if cells[index] == 0 {
                if let Some(donor) = (0..count)
                    .filter(|&i| cells[i] > 1)
                    .max_by_key(|&i| (cells[i], std::cmp::Reverse(i)))
                {
                    cells[donor] -= 1;
                    cells[index] = 1;
                }
            }
        }
    }

    cells
}
