//! Events from background tasks to the UI loop
//!
//! Submits run on spawned tasks so the screen keeps drawing while they are
//! pending; each task reports back here when it settles.

use auth::SubmitOutcome;
use tokio::sync::mpsc;

/// Which button started a background action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Signup,
    GoogleLogin,
    GoogleSignup,
}

/// Event types the app can receive
#[derive(Debug)]
pub enum AppEvent {
    /// A spawned action settled
    ActionFinished { action: Action, outcome: SubmitOutcome },
    /// Sign-out finished; `Err` carries the reason
    SignedOut(Result<(), String>),
}

/// Event sender for background tasks
pub type EventSender = mpsc::UnboundedSender<AppEvent>;
/// Event receiver for the main loop
pub type EventReceiver = mpsc::UnboundedReceiver<AppEvent>;

/// Create an event channel
pub fn create_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
