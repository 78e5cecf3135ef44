use crate::model::ProcessId;
use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub primary: Color,   // Blue
    pub secondary: Color, // Orange
    pub comment: Color,   // Grey
    pub success: Color,   // Green
    pub error: Color,     // Red
    pub free: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub processes: [Color; 6], // Cycled by pid
}

impl Theme {
    pub fn process_color(&self, pid: ProcessId) -> Color {
        self.processes[(pid.0 % self.processes.len() as u64) as usize]
    }
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),   // Blue
    secondary: Color::Rgb(250, 179, 135), // Orange
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    free: Color::Rgb(69, 71, 90),              // Surface grey for free space
    border_focused: Color::Rgb(249, 226, 175), // Yellow border for focus
    border_normal: Color::Rgb(108, 112, 134),  // Grey border for normal
    current_line_bg: Color::Rgb(50, 50, 70),   // Slightly lighter BG for current line
    processes: [
        Color::Rgb(137, 180, 250), // Blue
        Color::Rgb(166, 227, 161), // Green
        Color::Rgb(250, 179, 135), // Orange
        Color::Rgb(245, 194, 231), // Pink
        Color::Rgb(148, 226, 213), // Teal
        Color::Rgb(249, 226, 175), // Yellow
    ],
};
