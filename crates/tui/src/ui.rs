//! UI rendering functions
//!
//! This module contains all the Ratatui rendering logic for the TUI.

use auth::{AsyncResult, LoginField, SignupField};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, FormItem, InputMode, LogLevel, Screen};

/// Primary colors for the UI
const ACCENT_COLOR: Color = Color::Cyan;
const SUCCESS_COLOR: Color = Color::Green;
const ERROR_COLOR: Color = Color::Red;
const WARNING_COLOR: Color = Color::Yellow;
const MUTED_COLOR: Color = Color::DarkGray;

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let form_height = app.items().len() as u16 + 4;

    // Main layout: Header, Form, Logs, Footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),           // Header with status
            Constraint::Length(form_height), // Form
            Constraint::Min(5),              // Logs
            Constraint::Length(3),           // Help footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_form(frame, app, chunks[1]);
    render_logs(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    // Render overlays
    if app.is_busy() {
        render_progress(frame);
    }

    if app.input_mode == InputMode::Help {
        render_help_overlay(frame);
    }
}

/// Render the header with Google status
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (google_text, google_color) = if !app.google_configured {
        ("Not configured", MUTED_COLOR)
    } else if app.google_signed_in {
        ("● Signed in", SUCCESS_COLOR)
    } else {
        ("● Signed out", WARNING_COLOR)
    };

    let header_text = vec![
        Line::from(vec![
            Span::raw("  Screen: "),
            Span::styled(app.screen.title(), Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::raw("  Google: "),
            Span::styled(google_text, Style::default().fg(google_color)),
        ]),
    ];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .title(format!(" UserAuth v{} ", env!("CARGO_PKG_VERSION")))
            .title_style(Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(ACCENT_COLOR)),
    );

    frame.render_widget(header, area);
}

/// What a text field row shows
struct FieldView<'a> {
    label: &'static str,
    value: &'a str,
    masked: bool,
    error: bool,
    hint: &'static str,
}

fn login_field_view(app_state: &auth::LoginState, field: LoginField) -> FieldView<'_> {
    let (label, masked, hint) = match field {
        LoginField::Email => ("Email", false, "Enter a valid email address"),
        LoginField::Password => ("Password", !app_state.show_password, "At least 6 characters"),
    };
    FieldView {
        label,
        value: app_state.value(field),
        masked,
        error: app_state.field_error(field),
        hint,
    }
}

fn signup_field_view(state: &auth::SignupState, field: SignupField) -> FieldView<'_> {
    let (label, masked, hint) = match field {
        SignupField::FullName => ("Full name", false, "At least 4 characters"),
        SignupField::Email => ("Email", false, "Enter a valid email address"),
        SignupField::Password => ("Password", !state.show_password, "At least 6 characters"),
        SignupField::ConfirmPassword => (
            "Confirm password",
            !state.show_confirm_password,
            "Passwords must match",
        ),
        SignupField::PhoneNumber => ("Phone number", false, "At least 10 digits"),
    };
    let hint = if field == SignupField::Password && state.password_mismatch_error && !state.password_error {
        "Passwords must match"
    } else {
        hint
    };
    FieldView {
        label,
        value: state.value(field),
        masked,
        error: state.field_error(field),
        hint,
    }
}

fn field_line(view: FieldView<'_>, focused: bool) -> Line<'static> {
    let marker = if focused { "▶ " } else { "  " };
    let label_style = if view.error {
        Style::default().fg(ERROR_COLOR)
    } else if focused {
        Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let shown = if view.masked {
        "•".repeat(view.value.chars().count())
    } else {
        view.value.to_string()
    };

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(ACCENT_COLOR)),
        Span::styled(format!("{:<18}", view.label), label_style),
        Span::styled(shown, Style::default().fg(Color::White)),
    ];
    if focused {
        spans.push(Span::styled("_", Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::SLOW_BLINK)));
    }
    if view.error {
        spans.push(Span::styled(format!("  {}", view.hint), Style::default().fg(ERROR_COLOR)));
    }
    Line::from(spans)
}

fn button_line(label: String, focused: bool, enabled: bool) -> Line<'static> {
    let marker = if focused { "▶ " } else { "  " };
    let style = match (focused, enabled) {
        (_, false) => Style::default().fg(MUTED_COLOR),
        (true, true) => Style::default().fg(Color::Black).bg(ACCENT_COLOR).add_modifier(Modifier::BOLD),
        (false, true) => Style::default().fg(ACCENT_COLOR),
    };
    Line::from(vec![
        Span::styled(marker, Style::default().fg(ACCENT_COLOR)),
        Span::styled(format!("[ {label} ]"), style),
    ])
}

/// Status line for the last result of the current screen
fn result_line(result: &AsyncResult) -> Line<'static> {
    match result {
        AsyncResult::Succeeded(message) => {
            Line::from(Span::styled(format!("  ✓ {message}"), Style::default().fg(SUCCESS_COLOR)))
        }
        AsyncResult::Failed(message) => {
            Line::from(Span::styled(format!("  ✗ {message}"), Style::default().fg(ERROR_COLOR)))
        }
        AsyncResult::Pending => Line::from(Span::styled("  ◐ Please wait...", Style::default().fg(WARNING_COLOR))),
        AsyncResult::Absent => Line::from(""),
    }
}

/// Render the form of the current screen
fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let submit_enabled = app.is_submit_enabled();
    let google_enabled = app.google_configured && !app.is_busy();

    let mut lines: Vec<Line> = Vec::new();
    let last_result = match app.screen {
        Screen::Login => {
            let state = app.login.state();
            for (index, item) in app.items().iter().enumerate() {
                let focused = index == app.focus;
                lines.push(match item {
                    FormItem::Login(field) => field_line(login_field_view(&state, *field), focused),
                    FormItem::Submit => button_line("Sign in".to_string(), focused, submit_enabled),
                    FormItem::Google => button_line("Continue with Google".to_string(), focused, google_enabled),
                    FormItem::Signup(_) => continue,
                });
            }
            if state.google_result != AsyncResult::Absent {
                state.google_result
            } else {
                state.login_result
            }
        }
        Screen::Signup => {
            let state = app.signup.state();
            for (index, item) in app.items().iter().enumerate() {
                let focused = index == app.focus;
                lines.push(match item {
                    FormItem::Signup(field) => field_line(signup_field_view(&state, *field), focused),
                    FormItem::Submit => button_line("Sign up".to_string(), focused, submit_enabled),
                    FormItem::Google => button_line("Sign up with Google".to_string(), focused, google_enabled),
                    FormItem::Login(_) => continue,
                });
            }
            if state.credential_signup_result != AsyncResult::Absent {
                state.credential_signup_result
            } else {
                state.signup_result
            }
        }
    };
    lines.push(Line::from(""));
    lines.push(result_line(&last_result));

    let other = match app.screen {
        Screen::Login => "Don't have an account? [Ctrl+N] Sign up",
        Screen::Signup => "Already have an account? [Ctrl+N] Sign in",
    };

    let form = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" {} ", app.screen.title()))
            .title_style(Style::default().fg(Color::White))
            .title_bottom(Line::from(Span::styled(format!(" {other} "), Style::default().fg(MUTED_COLOR))))
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(MUTED_COLOR)),
    );

    frame.render_widget(form, area);
}

/// Render the log viewer with colored levels
fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let visible_height = area.height.saturating_sub(2) as usize;
    // Calculate max message width (area width - borders - timestamp - icon - padding)
    let max_msg_width = area.width.saturating_sub(22) as usize;

    let log_lines: Vec<Line> = app
        .logs
        .iter()
        .skip(app.log_scroll)
        .take(visible_height)
        .map(|entry| {
            let (level_icon, level_color) = match entry.level {
                LogLevel::Info => ("•", MUTED_COLOR),
                LogLevel::Success => ("✓", SUCCESS_COLOR),
                LogLevel::Warning => ("⚠", WARNING_COLOR),
                LogLevel::Error => ("✗", ERROR_COLOR),
            };

            // Truncate on a char boundary if too long
            let message = if entry.message.chars().count() > max_msg_width {
                let kept: String = entry.message.chars().take(max_msg_width.saturating_sub(1)).collect();
                format!("{kept}…")
            } else {
                entry.message.clone()
            };

            Line::from(vec![
                Span::styled(format!(" [{}] ", entry.timestamp), Style::default().fg(MUTED_COLOR)),
                Span::styled(format!("{} ", level_icon), Style::default().fg(level_color)),
                Span::styled(message, Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let logs = Paragraph::new(log_lines).block(
        Block::default()
            .title(" Activity ")
            .title_style(Style::default().fg(Color::White))
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(MUTED_COLOR)),
    );

    frame.render_widget(logs, area);
}

/// Render the help footer
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD));

    let help_text = match app.input_mode {
        InputMode::Editing => Line::from(vec![
            key(" [Tab]"),
            Span::raw(" Next "),
            key("[Enter]"),
            Span::raw(" Select "),
            key("[^P]"),
            Span::raw(" Show password "),
            key("[^G]"),
            Span::raw(" Google "),
            key("[F1]"),
            Span::raw(" Help "),
            key("[Esc]"),
            Span::raw(" Quit"),
        ]),
        InputMode::Help => Line::from(vec![Span::styled(
            " Press any key to close help",
            Style::default().fg(MUTED_COLOR),
        )]),
    };

    let footer = Paragraph::new(help_text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(MUTED_COLOR)),
    );

    frame.render_widget(footer, area);
}

/// Render the progress indicator while an action is pending
fn render_progress(frame: &mut Frame) {
    let area = centered_rect(30, 15, frame.area());
    frame.render_widget(Clear, area);

    let progress = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "◐ Please wait...",
            Style::default().fg(WARNING_COLOR).add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::DOUBLE)
            .border_style(Style::default().fg(WARNING_COLOR)),
    );

    frame.render_widget(progress, area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());

    // Clear the background
    frame.render_widget(Clear, area);

    let binding = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<12}"), Style::default().fg(ACCENT_COLOR)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Keybindings",
            Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        binding("Tab/↓", "Next field"),
        binding("S-Tab/↑", "Previous field"),
        binding("Enter", "Next field, or press the focused button"),
        binding("Backspace", "Delete last character"),
        Line::from(""),
        binding("Ctrl+P", "Show or hide the focused password"),
        binding("Ctrl+G", "Continue with Google"),
        binding("Ctrl+O", "Sign out of Google"),
        binding("Ctrl+N", "Switch between sign in and sign up"),
        Line::from(""),
        binding("PgUp/PgDn", "Scroll activity"),
        binding("F1", "Show this help"),
        binding("Esc/Ctrl+C", "Quit application"),
        Line::from(""),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .title_style(Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_set(border::DOUBLE)
                .border_style(Style::default().fg(ACCENT_COLOR)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help, area);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
