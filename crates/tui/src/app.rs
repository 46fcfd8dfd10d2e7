//! Application state and update logic

use anyhow::Result;
use auth::{AsyncResult, LoginField, LoginViewModel, SignupField, SignupViewModel, SubmitOutcome};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use identity::IdentityProvider;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::debug;
use user_store::UserStore;

use crate::event::{self as app_event, Action, AppEvent, EventReceiver, EventSender};
use crate::ui;

/// Which form is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Signup,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Login => "Sign in",
            Screen::Signup => "Create account",
        }
    }

    fn items(self) -> &'static [FormItem] {
        match self {
            Screen::Login => &LOGIN_ITEMS,
            Screen::Signup => &SIGNUP_ITEMS,
        }
    }
}

/// A focusable row of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormItem {
    Login(LoginField),
    Signup(SignupField),
    Submit,
    Google,
}

const LOGIN_ITEMS: [FormItem; 4] = [
    FormItem::Login(LoginField::Email),
    FormItem::Login(LoginField::Password),
    FormItem::Submit,
    FormItem::Google,
];

const SIGNUP_ITEMS: [FormItem; 7] = [
    FormItem::Signup(SignupField::FullName),
    FormItem::Signup(SignupField::Email),
    FormItem::Signup(SignupField::Password),
    FormItem::Signup(SignupField::ConfirmPassword),
    FormItem::Signup(SignupField::PhoneNumber),
    FormItem::Submit,
    FormItem::Google,
];

/// Log entry with level
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Active input mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Editing,
    Help,
}

/// Main application state
pub struct App {
    /// Is the application running?
    pub running: bool,
    pub screen: Screen,
    /// Index into the current screen's items
    pub focus: usize,
    pub input_mode: InputMode,
    pub login: Arc<LoginViewModel>,
    pub signup: Arc<SignupViewModel>,
    /// Whether a Google client id is configured
    pub google_configured: bool,
    /// Last known Google sign-in state, refreshed when a Google action settles
    pub google_signed_in: bool,
    /// Log buffer
    pub logs: Vec<LogEntry>,
    /// Log scroll position
    pub log_scroll: usize,
    store: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
    /// Actions started from the current screen
    tasks: Vec<AbortHandle>,
    events_tx: EventSender,
    events_rx: EventReceiver,
}

impl App {
    pub fn new(store: Arc<dyn UserStore>, identity: Arc<dyn IdentityProvider>, google_configured: bool) -> Self {
        let (events_tx, events_rx) = app_event::create_channel();

        let mut app = Self {
            running: true,
            screen: Screen::Login,
            focus: 0,
            input_mode: InputMode::Editing,
            login: Arc::new(LoginViewModel::new(store.clone(), identity.clone())),
            signup: Arc::new(SignupViewModel::new(store.clone(), identity.clone())),
            google_configured,
            google_signed_in: false,
            logs: Vec::new(),
            log_scroll: 0,
            store,
            identity,
            tasks: Vec::new(),
            events_tx,
            events_rx,
        };

        app.refresh_google_status();
        app.log_info("UserAuth started");
        if !google_configured {
            app.log_warning("Google sign-in is not configured");
        }
        app.log_info("Press [F1] for help");

        app
    }

    /// Get current timestamp
    fn now() -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }

    /// Add a log entry with level
    fn log_with_level(&mut self, message: impl Into<String>, level: LogLevel) {
        self.logs.push(LogEntry {
            timestamp: Self::now(),
            message: message.into(),
            level,
        });
        // Auto-scroll to bottom (keep last 5 visible)
        if self.logs.len() > 5 {
            self.log_scroll = self.logs.len().saturating_sub(5);
        }
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log_with_level(message, LogLevel::Info);
    }

    pub fn log_success(&mut self, message: impl Into<String>) {
        self.log_with_level(message, LogLevel::Success);
    }

    pub fn log_warning(&mut self, message: impl Into<String>) {
        self.log_with_level(message, LogLevel::Warning);
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.log_with_level(message, LogLevel::Error);
    }

    pub fn items(&self) -> &'static [FormItem] {
        self.screen.items()
    }

    pub fn focused(&self) -> FormItem {
        self.items()[self.focus]
    }

    /// Whether the current screen has an action pending
    pub fn is_busy(&self) -> bool {
        match self.screen {
            Screen::Login => self.login.state().is_busy(),
            Screen::Signup => self.signup.state().is_busy(),
        }
    }

    pub fn is_submit_enabled(&self) -> bool {
        match self.screen {
            Screen::Login => self.login.is_submit_enabled(),
            Screen::Signup => self.signup.is_submit_enabled(),
        }
    }

    fn refresh_google_status(&mut self) {
        self.google_signed_in = self.login.is_signed_in_with_google();
    }

    /// Run the main event loop
    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let tick_rate = Duration::from_millis(100);

        while self.running {
            while let Ok(event) = self.events_rx.try_recv() {
                self.handle_event(event);
            }

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }

        self.abort_tasks();
        Ok(())
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.input_mode == InputMode::Help {
            // Any key exits help
            self.input_mode = InputMode::Editing;
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if ctrl => self.running = false,
            KeyCode::F(1) => self.input_mode = InputMode::Help,
            KeyCode::Char('n') if ctrl => self.switch_screen(),
            KeyCode::Char('g') if ctrl => self.continue_with_google(),
            KeyCode::Char('o') if ctrl => self.sign_out_of_google(),
            KeyCode::Char('p') if ctrl => self.toggle_visibility(),
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::PageUp => self.log_scroll = self.log_scroll.saturating_sub(1),
            KeyCode::PageDown => {
                if self.log_scroll < self.logs.len().saturating_sub(1) {
                    self.log_scroll += 1;
                }
            }
            KeyCode::Enter => match self.focused() {
                FormItem::Submit => self.submit(),
                FormItem::Google => self.continue_with_google(),
                FormItem::Login(_) | FormItem::Signup(_) => self.focus_next(),
            },
            KeyCode::Backspace => self.edit(|value| {
                value.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.edit(|value| value.push(c)),
            _ => {}
        }
    }

    /// Handle a report from a background task
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ActionFinished { action, outcome } => {
                if matches!(action, Action::GoogleLogin | Action::GoogleSignup) {
                    self.refresh_google_status();
                }
                self.report(action, outcome);
            }
            AppEvent::SignedOut(result) => {
                self.refresh_google_status();
                match result {
                    Ok(()) => self.log_success("Signed out of Google"),
                    Err(e) => self.log_error(format!("Sign-out failed: {e}")),
                }
            }
        }
    }

    fn report(&mut self, action: Action, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Succeeded | SubmitOutcome::Failed => {
                let result = self.result_of(action);
                match result {
                    AsyncResult::Succeeded(message) => self.log_success(message),
                    AsyncResult::Failed(message) => self.log_error(message),
                    // The screen was recreated after the task reported
                    AsyncResult::Absent | AsyncResult::Pending => {}
                }
            }
            SubmitOutcome::Invalid => self.log_warning("Please correct the highlighted fields"),
            SubmitOutcome::AlreadyPending => self.log_warning("Please wait for the current request"),
            SubmitOutcome::Cancelled => self.log_info("Google sign-in cancelled"),
        }
    }

    fn result_of(&self, action: Action) -> AsyncResult {
        match action {
            Action::Login => self.login.state().login_result,
            Action::GoogleLogin => self.login.state().google_result,
            Action::Signup => self.signup.state().signup_result,
            Action::GoogleSignup => self.signup.state().credential_signup_result,
        }
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.items().len();
    }

    fn focus_prev(&mut self) {
        let len = self.items().len();
        self.focus = (self.focus + len - 1) % len;
    }

    /// Applies `change` to the focused field's value
    fn edit(&mut self, change: impl FnOnce(&mut String)) {
        match self.focused() {
            FormItem::Login(field) => {
                let mut value = self.login.state().value(field).to_string();
                change(&mut value);
                self.login.on_field_change(field, value);
            }
            FormItem::Signup(field) => {
                let mut value = self.signup.state().value(field).to_string();
                change(&mut value);
                if field == SignupField::PhoneNumber && !value.chars().all(|c| c.is_ascii_digit()) {
                    return;
                }
                self.signup.on_field_change(field, value);
            }
            FormItem::Submit | FormItem::Google => {}
        }
    }

    fn toggle_visibility(&mut self) {
        match self.focused() {
            FormItem::Signup(SignupField::ConfirmPassword) => self.signup.toggle_confirm_password_visibility(),
            _ => match self.screen {
                Screen::Login => self.login.toggle_password_visibility(),
                Screen::Signup => self.signup.toggle_password_visibility(),
            },
        }
    }

    /// Recreates the other screen's form and shows it
    ///
    /// Actions still pending on the screen being left are dropped.
    fn switch_screen(&mut self) {
        self.abort_tasks();
        self.screen = match self.screen {
            Screen::Login => {
                self.signup = Arc::new(SignupViewModel::new(self.store.clone(), self.identity.clone()));
                Screen::Signup
            }
            Screen::Signup => {
                self.login = Arc::new(LoginViewModel::new(self.store.clone(), self.identity.clone()));
                Screen::Login
            }
        };
        self.focus = 0;
        debug!("Switched to {:?} screen", self.screen);
    }

    fn submit(&mut self) {
        match self.screen {
            Screen::Login => {
                let vm = self.login.clone();
                self.spawn_action(Action::Login, async move { vm.submit().await });
            }
            Screen::Signup => {
                let vm = self.signup.clone();
                self.spawn_action(Action::Signup, async move { vm.submit().await });
            }
        }
    }

    fn continue_with_google(&mut self) {
        if !self.google_configured {
            self.log_warning("Set google.client_id in the config file to use Google sign-in");
            return;
        }
        self.log_info("Opening Google sign-in in your browser...");
        match self.screen {
            Screen::Login => {
                let vm = self.login.clone();
                self.spawn_action(Action::GoogleLogin, async move { vm.sign_in_with_google().await });
            }
            Screen::Signup => {
                let vm = self.signup.clone();
                self.spawn_action(Action::GoogleSignup, async move { vm.sign_up_with_google().await });
            }
        }
    }

    fn sign_out_of_google(&mut self) {
        if !self.google_signed_in {
            self.log_info("Not signed in with Google");
            return;
        }
        let vm = self.login.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = vm.sign_out_of_google().await.map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::SignedOut(result));
        });
    }

    fn spawn_action<F>(&mut self, action: Action, action_future: F)
    where
        F: Future<Output = SubmitOutcome> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        let handle = tokio::spawn(async move {
            let outcome = action_future.await;
            let _ = tx.send(AppEvent::ActionFinished { action, outcome });
        });
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(handle.abort_handle());
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
