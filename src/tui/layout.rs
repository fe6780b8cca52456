//! Root layout computation for header + main content + status bar.

use ratatui::layout::{Constraint, Layout, Rect};

/// Height of the header bar (route title + breadcrumb).
pub const HEADER_HEIGHT: u16 = 1;
/// Hide the header below this terminal height.
pub const HIDE_HEADER_THRESHOLD: u16 = 12;

/// Computed layout regions for a single frame.
pub struct AppLayout {
    /// Header row (None on very short terminals).
    pub header: Option<Rect>,
    /// Main content area.
    pub main: Rect,
    /// Status bar (bottom row).
    pub status: Rect,
}

impl AppLayout {
    /// Compute layout regions from the terminal area.
    pub fn compute(area: Rect) -> Self {
        if area.height < HIDE_HEADER_THRESHOLD {
            let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
            return AppLayout {
                header: None,
                main: rows[0],
                status: rows[1],
            };
        }

        let rows = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

        AppLayout {
            header: Some(rows[0]),
            main: rows[1],
            status: rows[2],
        }
    }
}
