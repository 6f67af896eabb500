// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the dashboard.
pub struct AppLayout {
    pub targets: Rect,
    pub results: Rect,
    pub summary: Rect,
    pub footer: Rect,
}

/// Splits the frame into a targets bar on top, the result list and the
/// summary side by side in the middle, and a one-line footer.
pub fn create_layout(frame_size: Rect) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame_size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main_chunks[1]);

    AppLayout {
        targets: main_chunks[0],
        results: content_chunks[0],
        summary: content_chunks[1],
        footer: main_chunks[2],
    }
}
