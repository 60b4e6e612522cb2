//! Shared colours and glyphs for the FPD TUI.

use fpd_core::{DeviceStatus, NotificationKind};
use ratatui::style::Color;

/// Accent used for titles and key hints.
pub const ACCENT: Color = Color::Magenta;

/// Background of the selected table row.
pub const SELECTED_ROW: Color = Color::Rgb(40, 30, 55);

/// Color coding:
/// - Green: success
/// - Yellow: warning
/// - Blue: info
/// - Red: error
pub fn notification_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Success => Color::Green,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Info => Color::Blue,
        NotificationKind::Error => Color::Red,
    }
}

pub fn notification_icon(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "+",
        NotificationKind::Warning => "!",
        NotificationKind::Info => "i",
        NotificationKind::Error => "x",
    }
}

pub fn access_color(granted: bool) -> Color {
    if granted {
        Color::Green
    } else {
        Color::Red
    }
}

pub fn access_label(granted: bool) -> &'static str {
    if granted {
        "Granted"
    } else {
        "Denied"
    }
}

pub fn device_status_color(status: DeviceStatus) -> Color {
    match status {
        DeviceStatus::Online => Color::Green,
        DeviceStatus::Offline => Color::Red,
    }
}

/// Enrolled users show green, those still waiting for a fingerprint yellow.
pub fn enrollment_color(enrolled: bool) -> Color {
    if enrolled {
        Color::Green
    } else {
        Color::Yellow
    }
}
