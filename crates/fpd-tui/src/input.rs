//! Keyboard input handling for the FPD TUI.
//!
//! Keys are interpreted against the current [`Mode`]: the enrollment modal
//! captures text, a confirmation prompt only takes yes/no, and everything
//! else goes to tab navigation and per-tab actions.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fpd_core::{RegistrySnapshot, UserId};
use fpd_protocol::{RawEnrollForm, RegistryEvent};

use crate::app::{App, Mode, PendingConfirm, Tab};

// ============================================================================
// Event Types
// ============================================================================

/// Events that drive the main loop.
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),

    Resize(u16, u16),

    /// Full registry state, sent right after subscribing.
    Snapshot(Box<RegistrySnapshot>),

    /// A committed change pushed by the daemon.
    Registry(RegistryEvent),

    /// The daemon rejected a request.
    DaemonError(String),

    DaemonDisconnected,
}

// ============================================================================
// Client Commands
// ============================================================================

/// Requests the main loop hands to the daemon client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Enroll(RawEnrollForm),
    ConfirmEnrollment(UserId),
    DeleteUser(UserId),
    ClearUsers,
    /// Draw and record one random access event.
    SimulateAccess,
    /// Draw a fresh status for every device.
    RefreshDevices,
    /// Re-fetch the full snapshot.
    Resync,
}

// ============================================================================
// Action Types
// ============================================================================

/// What the main loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Send(ClientCommand),
}

// ============================================================================
// Input Handler
// ============================================================================

/// Handles a keyboard event and updates application state accordingly.
///
/// # Key Bindings
///
/// | Key                  | Where          | Action                         |
/// |----------------------|----------------|--------------------------------|
/// | `q`, `Esc`, `Ctrl+C` | anywhere       | Quit (`Esc` closes modals)     |
/// | `Tab`, `l`, `Right`  | normal         | Next tab                       |
/// | `BackTab`, `h`, `Left` | normal       | Previous tab                   |
/// | `1`-`4`              | normal         | Jump to tab                    |
/// | `v`                  | normal         | Cycle the selected device      |
/// | `r`                  | normal         | Refresh the current tab        |
/// | `j`/`k`, arrows      | users          | Move selection                 |
/// | `n`                  | users          | Open the enrollment form       |
/// | `c`                  | users          | Confirm pending fingerprint    |
/// | `d`                  | users          | Delete selected user           |
/// | `X`                  | users          | Clear all users                |
#[must_use]
pub fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return Action::Quit;
    }

    app.last_error = None;

    match app.mode.clone() {
        Mode::Normal => handle_normal_key(key, app),
        Mode::Enroll(_) => handle_enroll_key(key, app),
        Mode::Confirm(pending) => handle_confirm_key(key, app, pending),
    }
}

fn handle_normal_key(key: KeyEvent, app: &mut App) -> Action {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            app.quit();
            Action::Quit
        }

        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
            app.tab = app.tab.next();
            Action::None
        }
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
            app.tab = app.tab.previous();
            Action::None
        }
        KeyCode::Char(c @ '1'..='4') => {
            let index = c.to_digit(10).map_or(0, |d| d as usize).saturating_sub(1);
            if let Some(tab) = Tab::from_index(index) {
                app.tab = tab;
            }
            Action::None
        }

        KeyCode::Char('v') => {
            app.cycle_device();
            Action::None
        }

        KeyCode::Char('r') | KeyCode::Char('R') => match app.tab {
            Tab::Logs => Action::Send(ClientCommand::SimulateAccess),
            Tab::Devices => Action::Send(ClientCommand::RefreshDevices),
            Tab::Dashboard | Tab::Users => Action::Send(ClientCommand::Resync),
        },

        _ if app.tab == Tab::Users => handle_users_key(key, app),

        _ => Action::None,
    }
}

fn handle_users_key(key: KeyEvent, app: &mut App) -> Action {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            Action::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
            Action::None
        }
        KeyCode::Char('n') => {
            app.open_enroll();
            Action::None
        }
        KeyCode::Char('c') => match app.selected_user() {
            Some(user) if !user.enrolled => Action::Send(ClientCommand::ConfirmEnrollment(user.id)),
            _ => Action::None,
        },
        KeyCode::Char('d') | KeyCode::Delete => {
            app.request_delete();
            Action::None
        }
        KeyCode::Char('X') => {
            app.request_clear();
            Action::None
        }
        _ => Action::None,
    }
}

fn handle_enroll_key(key: KeyEvent, app: &mut App) -> Action {
    let Mode::Enroll(form) = &mut app.mode else {
        return Action::None;
    };

    match key.code {
        KeyCode::Esc => {
            app.close_modal();
            Action::None
        }
        KeyCode::Tab | KeyCode::Down => {
            form.focus_next();
            Action::None
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.focus_previous();
            Action::None
        }
        KeyCode::Backspace => {
            form.pop_char();
            Action::None
        }
        KeyCode::Enter => {
            let raw = form.to_raw();
            // Checked locally so the modal can stay open with the message
            match raw.to_request() {
                Ok(_) => {
                    app.close_modal();
                    Action::Send(ClientCommand::Enroll(raw))
                }
                Err(e) => {
                    form.error = Some(e.to_string());
                    Action::None
                }
            }
        }
        KeyCode::Char(c) => {
            form.push_char(c);
            Action::None
        }
        _ => Action::None,
    }
}

fn handle_confirm_key(key: KeyEvent, app: &mut App, pending: PendingConfirm) -> Action {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.close_modal();
            match pending {
                PendingConfirm::DeleteUser { id, .. } => Action::Send(ClientCommand::DeleteUser(id)),
                PendingConfirm::ClearUsers => Action::Send(ClientCommand::ClearUsers),
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.close_modal();
            Action::None
        }
        _ => Action::None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fpd_core::{CardId, DashboardStats, User};

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        handle_key_event(key_event(code), app)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            let _ = press(app, KeyCode::Char(c));
        }
    }

    fn users_app() -> App {
        let mut app = App::new();
        app.apply_snapshot(RegistrySnapshot {
            devices: Vec::new(),
            users: vec![
                User::confirmed(UserId::new(1), "John Doe", "+1", CardId::new("CARD001")),
                User::pending(UserId::new(4), "Alice", "+1", CardId::new("CARD004")),
            ],
            access_log: Vec::new(),
            notifications: Vec::new(),
            stats: DashboardStats::default(),
        });
        app.tab = Tab::Users;
        app
    }

    #[test]
    fn test_q_quits() {
        let mut app = App::new();
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_from_modal() {
        let mut app = App::new();
        app.open_enroll();
        let action = handle_key_event(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &mut app,
        );
        assert_eq!(action, Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_tab_navigation() {
        let mut app = App::new();
        let _ = press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Users);
        let _ = press(&mut app, KeyCode::BackTab);
        assert_eq!(app.tab, Tab::Dashboard);
        let _ = press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.tab, Tab::Devices);
    }

    #[test]
    fn test_refresh_depends_on_tab() {
        let mut app = App::new();
        app.tab = Tab::Logs;
        assert_eq!(
            press(&mut app, KeyCode::Char('r')),
            Action::Send(ClientCommand::SimulateAccess)
        );
        app.tab = Tab::Devices;
        assert_eq!(
            press(&mut app, KeyCode::Char('r')),
            Action::Send(ClientCommand::RefreshDevices)
        );
        app.tab = Tab::Dashboard;
        assert_eq!(
            press(&mut app, KeyCode::Char('r')),
            Action::Send(ClientCommand::Resync)
        );
    }

    #[test]
    fn test_user_keys_only_on_users_tab() {
        let mut app = users_app();
        app.tab = Tab::Dashboard;
        let _ = press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Normal);

        app.tab = Tab::Users;
        let _ = press(&mut app, KeyCode::Char('n'));
        assert!(matches!(app.mode, Mode::Enroll(_)));
    }

    #[test]
    fn test_confirm_only_pending_users() {
        let mut app = users_app();
        assert_eq!(press(&mut app, KeyCode::Char('c')), Action::None);

        let _ = press(&mut app, KeyCode::Char('j'));
        assert_eq!(
            press(&mut app, KeyCode::Char('c')),
            Action::Send(ClientCommand::ConfirmEnrollment(UserId::new(4)))
        );
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = users_app();
        assert_eq!(press(&mut app, KeyCode::Char('d')), Action::None);
        assert!(matches!(app.mode, Mode::Confirm(_)));

        // Navigation keys are ignored while the prompt is up
        assert_eq!(press(&mut app, KeyCode::Char('j')), Action::None);
        assert_eq!(
            press(&mut app, KeyCode::Char('y')),
            Action::Send(ClientCommand::DeleteUser(UserId::new(1)))
        );
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_clear_can_be_cancelled() {
        let mut app = users_app();
        let _ = press(&mut app, KeyCode::Char('X'));
        assert_eq!(app.mode, Mode::Confirm(PendingConfirm::ClearUsers));

        assert_eq!(press(&mut app, KeyCode::Esc), Action::None);
        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_enroll_submit() {
        let mut app = users_app();
        let _ = press(&mut app, KeyCode::Char('n'));

        type_text(&mut app, "5");
        let _ = press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Mike Brown");
        let _ = press(&mut app, KeyCode::Tab);
        type_text(&mut app, "+250780000000");
        let _ = press(&mut app, KeyCode::Tab);
        type_text(&mut app, "CARD005");

        match press(&mut app, KeyCode::Enter) {
            Action::Send(ClientCommand::Enroll(form)) => {
                assert_eq!(form.user_id, "5");
                assert_eq!(form.name, "Mike Brown");
                assert_eq!(form.card_id, "CARD005");
            }
            other => panic!("Expected Enroll command, got {other:?}"),
        }
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_enroll_blank_fields_keep_modal_open() {
        let mut app = users_app();
        let _ = press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "5");

        assert_eq!(press(&mut app, KeyCode::Enter), Action::None);
        match &app.mode {
            Mode::Enroll(form) => {
                assert_eq!(form.user_id, "5");
                assert!(form
                    .error
                    .as_deref()
                    .is_some_and(|e| e.contains("Please fill all fields")));
            }
            other => panic!("Expected Enroll mode, got {other:?}"),
        }
    }

    #[test]
    fn test_enroll_typing_q_does_not_quit() {
        let mut app = users_app();
        let _ = press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "q");
        assert!(!app.should_quit);

        assert_eq!(press(&mut app, KeyCode::Esc), Action::None);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_keypress_clears_error() {
        let mut app = App::new();
        app.set_error("boom");
        let _ = press(&mut app, KeyCode::Char('x'));
        assert!(app.last_error.is_none());
    }
}
