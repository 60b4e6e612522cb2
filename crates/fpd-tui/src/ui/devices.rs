//! Devices tab.

use crate::app::App;
use crate::ui::theme::{device_status_color, SELECTED_ROW};
use chrono::Utc;
use fpd_core::{format_relative, Device};
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

const WIDTHS: [Constraint; 5] = [
    Constraint::Length(12),
    Constraint::Min(16),
    Constraint::Length(8),
    Constraint::Length(6),
    Constraint::Length(12),
];

/// Renders one row per device; the device shown in the header is tinted.
pub fn render_devices(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Devices ({}) ", app.devices.len()))
        .border_style(Style::default().fg(Color::White));

    if app.devices.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "No devices registered",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let header = Row::new(["Device ID", "Name", "Status", "Users", "Last Seen"]).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    let now = Utc::now();
    let rows: Vec<Row> = app
        .devices
        .iter()
        .enumerate()
        .map(|(idx, device)| {
            let row = device_row(device, now);
            if idx == app.selected_device {
                row.style(Style::default().bg(SELECTED_ROW))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(rows, WIDTHS).header(header).block(block);

    frame.render_widget(table, area);
}

fn device_row(device: &Device, now: chrono::DateTime<Utc>) -> Row<'static> {
    let status = device.status();

    Row::new(vec![
        Cell::from(Span::styled(
            device.id().to_string(),
            Style::default().fg(Color::Cyan),
        )),
        Cell::from(device.name.clone()),
        Cell::from(Span::styled(
            status.label(),
            Style::default()
                .fg(device_status_color(status))
                .add_modifier(Modifier::BOLD),
        )),
        Cell::from(device.enrolled_users.to_string()),
        Cell::from(Span::styled(
            format_relative(device.last_seen(), now),
            Style::default().fg(Color::Gray),
        )),
    ])
}
