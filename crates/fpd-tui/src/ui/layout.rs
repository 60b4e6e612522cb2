//! Layout helpers for the FPD TUI.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Main application layout areas, top to bottom.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    /// Title, connection status, device and notification badge
    pub header: Rect,
    pub tabs: Rect,
    pub content: Rect,
    /// Key hints or the last daemon error
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let [header, tabs, content, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .areas(area);

        Self {
            header,
            tabs,
            content,
            footer,
        }
    }
}

/// Dashboard tab: a row of stat cards over the two recent-activity panels.
#[derive(Debug, Clone, Copy)]
pub struct DashboardLayout {
    pub cards: [Rect; 4],
    pub recent_access: Rect,
    pub recent_notifications: Rect,
}

impl DashboardLayout {
    pub fn new(area: Rect) -> Self {
        let [cards_row, panels] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(4)])
            .areas(area);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .areas(cards_row);

        let [recent_access, recent_notifications] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(panels);

        Self {
            cards,
            recent_access,
            recent_notifications,
        }
    }
}

/// A rectangle `width_percent` wide and `height` rows tall, centered in `area`.
pub fn centered_rect(width_percent: u16, height: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height.min(area.height)),
            Constraint::Fill(1),
        ])
        .areas(area);

    let side = 100u16.saturating_sub(width_percent) / 2;
    let [_, center, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(side),
            Constraint::Percentage(width_percent),
            Constraint::Percentage(side),
        ])
        .areas(middle);

    center
}
