//! Header, tab bar and footer for the FPD TUI.
//!
//! - Header: title, connection status, selected device, notification badge
//! - Tabs: the four views
//! - Footer: key hints for the current tab or modal, or the last error

use crate::app::{App, AppState, Mode, Tab};
use crate::ui::theme::ACCENT;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

/// Renders the header bar.
///
/// The right-hand side shows the selected device id and a bell with the
/// number of notifications currently held.
pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let (status_text, status_style) = get_status_display(&app.state);

    let device = app
        .selected_device()
        .map_or_else(|| "none".to_string(), |d| d.id().to_string());

    let badge = app.notification_badge();
    let badge_style = if badge > 0 {
        Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let header_line = Line::from(vec![
        Span::styled(
            "Smart Security System",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " - Fingerprint Access Control | ",
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(status_text, status_style),
        Span::styled(
            format!(" | Device: {device} | "),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("Bell {badge}"), badge_style),
    ]);

    let border_style = match app.state {
        AppState::Connected => Style::default().fg(Color::Green),
        AppState::Connecting => Style::default().fg(Color::Yellow),
        AppState::Disconnected { .. } => Style::default().fg(Color::Red),
    };

    let header = Paragraph::new(header_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    frame.render_widget(header, area);
}

pub fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD));

    frame.render_widget(tabs, area);
}

/// Renders the footer.
///
/// A pending daemon error takes the whole line until the next keypress.
pub fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let footer_line = match &app.last_error {
        Some(message) => Line::from(Span::styled(
            format!(" Error: {message}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(hint_spans(key_hints(app))),
    };

    let footer = Paragraph::new(footer_line).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

/// `(key, description)` pairs for the current mode and tab.
fn key_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.mode {
        Mode::Enroll(_) => vec![
            ("Tab", "next field"),
            ("Enter", "enroll"),
            ("Esc", "cancel"),
        ],
        Mode::Confirm(_) => vec![("y", "yes"), ("n", "no")],
        Mode::Normal => {
            let mut hints = vec![("Tab", "switch view")];
            match app.tab {
                Tab::Dashboard => hints.push(("r", "resync")),
                Tab::Users => {
                    hints.push(("j/k", "select"));
                    hints.push(("n", "enroll"));
                    hints.push(("c", "confirm"));
                    hints.push(("d", "delete"));
                    hints.push(("X", "clear all"));
                }
                Tab::Logs => hints.push(("r", "simulate access")),
                Tab::Devices => hints.push(("r", "refresh devices")),
            }
            hints.push(("v", "device"));
            hints.push(("q", "quit"));
            hints
        }
    }
}

fn hint_spans(hints: Vec<(&'static str, &'static str)>) -> Vec<Span<'static>> {
    let key_style = Style::default().fg(ACCENT).add_modifier(Modifier::BOLD);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (i, (key, description)) in hints.into_iter().enumerate() {
        spans.push(Span::styled(if i == 0 { " " } else { "  |  " }, sep_style));
        spans.push(Span::styled(key, key_style));
        spans.push(Span::raw(format!(" {description}")));
    }
    spans
}

fn get_status_display(state: &AppState) -> (&'static str, Style) {
    match state {
        AppState::Connected => (
            "Connected",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        AppState::Connecting => (
            "Connecting...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        AppState::Disconnected { retry_count, .. } => {
            let text = if *retry_count > 3 {
                "Disconnected (retrying...)"
            } else {
                "Disconnected"
            };
            (
                text,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        }
    }
}
