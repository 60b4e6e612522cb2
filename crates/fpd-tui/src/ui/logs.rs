//! Access Logs tab: every recorded attempt, newest first.

use crate::app::App;
use crate::ui::theme::{access_color, access_label};
use crate::ui::truncate_string;
use chrono::{Local, Utc};
use fpd_core::{format_relative, AccessLogEntry};
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

const WIDTHS: [Constraint; 5] = [
    Constraint::Length(5),
    Constraint::Min(16),
    Constraint::Length(10),
    Constraint::Length(8),
    Constraint::Length(20),
];

pub fn render_logs(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Access Logs ({}) ", app.access_log.len()))
        .border_style(Style::default().fg(Color::White));

    if app.access_log.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "No access attempts recorded",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let header = Row::new(["#", "User", "Card", "Result", "Time"]).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    let now = Utc::now();
    let rows: Vec<Row> = app
        .access_log
        .iter()
        .map(|entry| log_row(entry, now))
        .collect();

    let table = Table::new(rows, WIDTHS).header(header).block(block);

    frame.render_widget(table, area);
}

/// Time column: relative for the last day, then the local date and time.
fn log_row(entry: &AccessLogEntry, now: chrono::DateTime<Utc>) -> Row<'static> {
    let when = if now.signed_duration_since(entry.timestamp).num_hours() < 24 {
        format_relative(entry.timestamp, now)
    } else {
        entry
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    };

    Row::new(vec![
        Cell::from(Span::styled(
            entry.id.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
        Cell::from(truncate_string(&entry.user_name, 24)),
        Cell::from(entry.card_id.clone()),
        Cell::from(Span::styled(
            access_label(entry.granted),
            Style::default()
                .fg(access_color(entry.granted))
                .add_modifier(Modifier::BOLD),
        )),
        Cell::from(Span::styled(when, Style::default().fg(Color::Gray))),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::test_support::{contains, rows, seeded_app};
    use chrono::Duration;
    use fpd_core::AccessSeq;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw_logs(app: &App) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal
            .draw(|frame| render_logs(frame, frame.area(), app))
            .unwrap();
        rows(terminal.backend().buffer())
    }

    #[test]
    fn test_log_rows_newest_first() {
        let app = seeded_app();
        let rows = draw_logs(&app);

        assert!(contains(&rows, "Access Logs (2)"));
        let unknown = rows.iter().position(|r| r.contains("Unknown")).unwrap();
        let john = rows.iter().position(|r| r.contains("John Doe")).unwrap();
        assert!(unknown < john);
        assert!(contains(&rows, "N/A"));
        assert!(contains(&rows, "Denied"));
    }

    #[test]
    fn test_old_entries_show_date() {
        let now = Utc::now();
        let old = now - Duration::days(3);
        let entry = AccessLogEntry::new(AccessSeq::new(7), "Ann", "C7", true, old);

        let mut app = App::new();
        app.access_log.push(entry);
        let rows = draw_logs(&app);

        let expected = old.with_timezone(&Local).format("%Y-%m-%d").to_string();
        assert!(contains(&rows, &expected));
    }

    #[test]
    fn test_empty_log_hint() {
        let rows = draw_logs(&App::new());
        assert!(contains(&rows, "No access attempts recorded"));
    }
}
