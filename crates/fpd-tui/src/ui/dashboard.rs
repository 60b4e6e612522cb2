//! Dashboard tab: stat cards and recent activity.

use crate::app::App;
use crate::ui::layout::DashboardLayout;
use crate::ui::theme::{access_color, access_label, notification_color, notification_icon};
use crate::ui::truncate_string;
use chrono::Utc;
use fpd_core::format_relative;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Renders the four stat cards above the recent access and notification
/// panels.
pub fn render_dashboard(frame: &mut Frame, area: Rect, app: &App) {
    let layout = DashboardLayout::new(area);
    let stats = app.stats();

    let cards = [
        ("Total Users", stats.total_users, Color::Cyan),
        ("Active Devices", stats.active_devices, Color::Green),
        ("Today's Access", stats.today_access, Color::Blue),
        ("Failed Attempts", stats.failed_attempts, Color::Red),
    ];

    for (rect, (title, value, color)) in layout.cards.into_iter().zip(cards) {
        render_card(frame, rect, title, value, color);
    }

    render_recent_access(frame, layout.recent_access, app);
    render_recent_notifications(frame, layout.recent_notifications, app);
}

fn render_card(frame: &mut Frame, area: Rect, title: &str, value: usize, color: Color) {
    let card = Paragraph::new(Line::from(Span::styled(
        value.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {title} "))
            .border_style(Style::default().fg(color)),
    );

    frame.render_widget(card, area);
}

fn render_recent_access(frame: &mut Frame, area: Rect, app: &App) {
    let now = Utc::now();
    let items: Vec<ListItem> = app
        .recent_access()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<8}", access_label(entry.granted)),
                    Style::default()
                        .fg(access_color(entry.granted))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    truncate_string(&entry.user_name, 16),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!(" {}", format_relative(entry.timestamp, now)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    render_panel(frame, area, " Recent Access ", items, "No access events yet");
}

fn render_recent_notifications(frame: &mut Frame, area: Rect, app: &App) {
    let now = Utc::now();
    let items: Vec<ListItem> = app
        .recent_notifications()
        .map(|notification| {
            let color = notification_color(notification.kind);
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", notification_icon(notification.kind)),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(notification.message.clone(), Style::default().fg(color)),
                Span::styled(
                    format!(" {}", format_relative(notification.timestamp, now)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    render_panel(
        frame,
        area,
        " Notifications ",
        items,
        "No notifications",
    );
}

fn render_panel(
    frame: &mut Frame,
    area: Rect,
    title: &'static str,
    items: Vec<ListItem>,
    empty_hint: &'static str,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::White));

    if items.is_empty() {
        let hint = Paragraph::new(Line::from(Span::styled(
            empty_hint,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    frame.render_widget(List::new(items).block(block), area);
}
