//! UI rendering module for the FPD TUI.
//!
//! # Layout Structure
//!
//! ```text
//! +--------------------------------------------------+
//! |  Header: title, connection, device, bell         |  <- 3 lines
//! +--------------------------------------------------+
//! |  1 Dashboard | 2 Users | 3 Access Logs | 4 ...   |  <- 3 lines
//! +--------------------------------------------------+
//! |  Active tab body                                 |  <- fills remaining
//! |                                                  |
//! +--------------------------------------------------+
//! |  Footer: key hints or last error                 |  <- 3 lines
//! +--------------------------------------------------+
//! ```
//!
//! The enrollment form and confirmation prompts are drawn on top of the
//! body when the app is in a modal mode.

pub mod dashboard;
pub mod devices;
pub mod layout;
pub mod logs;
pub mod modal;
pub mod status_bar;
pub mod theme;
pub mod users;

use crate::app::{App, Tab};
use layout::AppLayout;
use ratatui::Frame;

pub use dashboard::render_dashboard;
pub use devices::render_devices;
pub use logs::render_logs;
pub use modal::render_modal;
pub use status_bar::{render_footer, render_header, render_tabs};
pub use users::render_users;

/// Renders the complete TUI interface.
///
/// ```ignore
/// terminal.draw(|frame| {
///     ui::render(frame, &app);
/// })?;
/// ```
pub fn render(frame: &mut Frame, app: &App) {
    let layout = AppLayout::new(frame.area());

    render_header(frame, layout.header, app);
    render_tabs(frame, layout.tabs, app);
    render_footer(frame, layout.footer, app);

    match app.tab {
        Tab::Dashboard => render_dashboard(frame, layout.content, app),
        Tab::Users => render_users(frame, layout.content, app),
        Tab::Logs => render_logs(frame, layout.content, app),
        Tab::Devices => render_devices(frame, layout.content, app),
    }

    render_modal(frame, app);
}

/// Truncates to `max_len` characters, ending with "..." when cut.
fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::app::App;
    use chrono::{Duration, Utc};
    use fpd_core::{
        AccessLogEntry, AccessSeq, CardId, DashboardStats, Device, DeviceId, DeviceStatus,
        Notification, NotificationId, NotificationKind, RegistrySnapshot, User, UserId,
    };
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    /// A connected app holding a small, fixed registry.
    pub fn seeded_app() -> App {
        let now = Utc::now();
        let mut app = App::new();
        app.apply_snapshot(RegistrySnapshot {
            devices: vec![Device::new(
                DeviceId::new("ESP32_001"),
                "Main Entrance",
                DeviceStatus::Online,
                now,
                2,
            )],
            users: vec![
                User::confirmed(UserId::new(1), "John Doe", "+1234567890", CardId::new("CARD001")),
                User::pending(UserId::new(2), "Jane Smith", "+0987654321", CardId::new("CARD002")),
            ],
            access_log: vec![
                AccessLogEntry::new(AccessSeq::new(1), "John Doe", "CARD001", true, now - Duration::minutes(5)),
                AccessLogEntry::new(AccessSeq::new(2), "", "", false, now),
            ],
            notifications: vec![Notification {
                id: NotificationId::new(now.timestamp_millis()),
                kind: NotificationKind::Success,
                message: "System ready".to_string(),
                timestamp: now,
            }],
            stats: DashboardStats::default(),
        });
        app
    }

    /// Draws `app` into a `width` x `height` buffer and returns it row by row.
    pub fn draw(app: &App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| super::render(frame, app)).unwrap();
        rows(terminal.backend().buffer())
    }

    pub fn rows(buffer: &Buffer) -> Vec<String> {
        let width = usize::from(buffer.area.width);
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    pub fn contains(rows: &[String], needle: &str) -> bool {
        rows.iter().any(|row| row.contains(needle))
    }
}
