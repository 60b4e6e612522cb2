//! Enrollment form and yes/no confirmation, drawn over the active tab.

use crate::app::{App, EnrollField, EnrollForm, Mode, PendingConfirm};
use crate::ui::layout::centered_rect;
use crate::ui::theme::ACCENT;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Width of the popups as a percentage of the terminal.
const MODAL_WIDTH: u16 = 60;

/// Draws the modal for the current mode, if any.
pub fn render_modal(frame: &mut Frame, app: &App) {
    match &app.mode {
        Mode::Normal => {}
        Mode::Enroll(form) => render_enroll_form(frame, frame.area(), form),
        Mode::Confirm(pending) => render_confirm(frame, frame.area(), pending),
    }
}

fn render_enroll_form(frame: &mut Frame, area: Rect, form: &EnrollForm) {
    // Borders, four fields, a blank line, the error or hint line
    let popup = centered_rect(MODAL_WIDTH, 8, area);

    let label_width = EnrollField::ALL
        .iter()
        .map(|f| f.label().len())
        .max()
        .unwrap_or(0);

    let mut lines: Vec<Line> = EnrollField::ALL
        .iter()
        .map(|&field| field_line(form, field, label_width))
        .collect();

    lines.push(Line::from(""));
    lines.push(match &form.error {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Line::from(Span::styled(
            "Enter to enroll, Esc to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    });

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Enroll New User ")
            .border_style(Style::default().fg(ACCENT)),
    );

    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn field_line(form: &EnrollForm, field: EnrollField, label_width: usize) -> Line<'static> {
    let focused = form.focus == field;

    let label_style = if focused {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut value = form.value(field).to_string();
    if focused {
        value.push('_');
    }

    Line::from(vec![
        Span::styled(if focused { "> " } else { "  " }, label_style),
        Span::styled(format!("{:<label_width$}: ", field.label()), label_style),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn render_confirm(frame: &mut Frame, area: Rect, pending: &PendingConfirm) {
    let popup = centered_rect(MODAL_WIDTH, 6, area);

    let (title, color) = match pending {
        PendingConfirm::DeleteUser { .. } => (" Delete User ", Color::Yellow),
        PendingConfirm::ClearUsers => (" Clear All Users ", Color::Red),
    };

    let lines = vec![
        Line::from(Span::styled(
            pending.prompt(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::raw(" confirm   "),
            Span::styled("n", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(color)),
        );

    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}
