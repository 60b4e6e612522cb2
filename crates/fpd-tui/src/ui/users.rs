//! Users tab: the enrolled and pending users, one row each.

use crate::app::{App, AppState};
use crate::ui::theme::{enrollment_color, SELECTED_ROW};
use crate::ui::truncate_string;
use fpd_core::User;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

const WIDTHS: [Constraint; 5] = [
    Constraint::Length(4),
    Constraint::Min(16),
    Constraint::Length(14),
    Constraint::Length(10),
    Constraint::Length(9),
];

/// Renders the users table.
///
/// The selected row carries a `>` marker and a tinted background; an empty
/// registry shows how to enroll the first user instead.
pub fn render_users(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Users ({}) ", app.users.len()))
        .border_style(Style::default().fg(Color::White));

    if app.users.is_empty() {
        render_empty_state(frame, area, block, &app.state);
        return;
    }

    let header = Row::new(["ID", "Name", "Phone", "Card ID", "Status"]).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .users
        .iter()
        .enumerate()
        .map(|(idx, user)| user_row(user, idx == app.selected_user))
        .collect();

    let table = Table::new(rows, WIDTHS).header(header).block(block);

    frame.render_widget(table, area);
}

fn user_row(user: &User, is_selected: bool) -> Row<'static> {
    let marker = if is_selected { ">" } else { " " };

    let row = Row::new(vec![
        Cell::from(Span::styled(
            format!("{marker}{}", user.id),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Cell::from(truncate_string(&user.name, 24)),
        Cell::from(Span::styled(
            user.phone.clone(),
            Style::default().fg(Color::Gray),
        )),
        Cell::from(Span::styled(
            user.card_id.to_string(),
            Style::default().fg(Color::Gray),
        )),
        Cell::from(Span::styled(
            user.status_label(),
            Style::default().fg(enrollment_color(user.enrolled)),
        )),
    ]);

    if is_selected {
        row.style(Style::default().bg(SELECTED_ROW))
    } else {
        row
    }
}

fn render_empty_state(frame: &mut Frame, area: Rect, block: Block, state: &AppState) {
    let lines = match state {
        AppState::Connected => vec![
            Line::from(""),
            Line::from(Span::styled(
                "No users enrolled",
                Style::default().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from("Press n to enroll a new user"),
        ],
        AppState::Connecting | AppState::Disconnected { .. } => vec![
            Line::from(""),
            Line::from(Span::styled(
                "Waiting for the daemon...",
                Style::default().fg(Color::DarkGray),
            )),
        ],
    };

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::test_support::{contains, rows, seeded_app};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw_users(app: &App) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        terminal
            .draw(|frame| render_users(frame, frame.area(), app))
            .unwrap();
        rows(terminal.backend().buffer())
    }

    #[test]
    fn test_users_table_rows() {
        let app = seeded_app();
        let rows = draw_users(&app);

        assert!(contains(&rows, "Users (2)"));
        assert!(contains(&rows, "Card ID"));
        assert!(contains(&rows, ">1"));
        assert!(contains(&rows, "John Doe"));
        assert!(contains(&rows, "CARD002"));
        assert!(contains(&rows, "Enrolled"));
        assert!(contains(&rows, "Pending"));
    }

    #[test]
    fn test_selection_marker_follows_app() {
        let mut app = seeded_app();
        app.select_next();
        let rows = draw_users(&app);

        assert!(contains(&rows, ">2"));
        assert!(!contains(&rows, ">1"));
    }

    #[test]
    fn test_empty_users_hint() {
        let mut app = App::new();
        app.state = AppState::Connected;
        let rows = draw_users(&app);

        assert!(contains(&rows, "Users (0)"));
        assert!(contains(&rows, "Press n to enroll a new user"));
    }
}
