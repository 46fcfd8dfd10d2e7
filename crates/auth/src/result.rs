//! Tri-state submit results and the in-flight guard

use tracing::debug;

use crate::error::AuthError;
use crate::observable::Observable;

/// Outcome of an asynchronous form action as the screen sees it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AsyncResult<T = String> {
    /// Nothing submitted yet, or the last attempt was cancelled
    #[default]
    Absent,
    Pending,
    Succeeded(T),
    Failed(String),
}

impl<T> AsyncResult<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, AsyncResult::Pending)
    }
}

impl AsyncResult<String> {
    /// The message to show the user, if the action finished
    pub fn message(&self) -> Option<&str> {
        match self {
            AsyncResult::Succeeded(message) | AsyncResult::Failed(message) => Some(message),
            AsyncResult::Absent | AsyncResult::Pending => None,
        }
    }
}

/// What a call to `submit` (or a Google sign-in) did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A field failed validation; nothing was called
    Invalid,
    /// Another action is still pending; nothing was called
    AlreadyPending,
    Succeeded,
    Failed,
    /// The user backed out of a federated sign-in
    Cancelled,
}

/// Selects which result field of a form state an action writes to
pub(crate) type ResultSlot<S> = fn(&mut S) -> &mut AsyncResult;

/// A running action that owns one result slot while it is `Pending`.
///
/// Dropping it without [`InFlight::finish`] (the caller's future was
/// dropped) discards the action: the slot goes back to `Absent`.
pub(crate) struct InFlight<'a, S: Clone + PartialEq> {
    state: &'a Observable<S>,
    slot: ResultSlot<S>,
    done: bool,
}

impl<'a, S: Clone + PartialEq> InFlight<'a, S> {
    /// Marks the slot `Pending` unless `busy` says an action is already running.
    pub(crate) fn begin(state: &'a Observable<S>, slot: ResultSlot<S>, busy: fn(&S) -> bool) -> Option<Self> {
        let started = state.update_if(|s| {
            if busy(s) {
                return false;
            }
            *slot(s) = AsyncResult::Pending;
            true
        });

        started.then_some(Self {
            state,
            slot,
            done: false,
        })
    }

    pub(crate) fn finish(mut self, result: Result<String, AuthError>) -> SubmitOutcome {
        let (value, outcome) = match result {
            Ok(message) => (AsyncResult::Succeeded(message), SubmitOutcome::Succeeded),
            Err(e) => (AsyncResult::Failed(e.to_string()), SubmitOutcome::Failed),
        };
        let slot = self.slot;
        self.state.update(|s| *slot(s) = value);
        self.done = true;
        outcome
    }

    /// Ends the action without a result
    pub(crate) fn cancel(mut self) -> SubmitOutcome {
        let slot = self.slot;
        self.state.update(|s| *slot(s) = AsyncResult::Absent);
        self.done = true;
        SubmitOutcome::Cancelled
    }
}

impl<S: Clone + PartialEq> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let slot = self.slot;
        self.state.update(|s| {
            let result = slot(s);
            if result.is_pending() {
                *result = AsyncResult::Absent;
            }
        });
        debug!("Discarded pending result of a dropped action");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Form {
        result: AsyncResult,
    }

    fn slot(form: &mut Form) -> &mut AsyncResult {
        &mut form.result
    }

    fn busy(form: &Form) -> bool {
        form.result.is_pending()
    }

    #[test]
    fn test_only_one_in_flight() {
        let state = Observable::new(Form::default());

        let first = InFlight::begin(&state, slot, busy).unwrap();
        assert!(state.get().result.is_pending());
        assert!(InFlight::begin(&state, slot, busy).is_none());

        assert_eq!(first.finish(Ok("done".into())), SubmitOutcome::Succeeded);
        assert_eq!(state.get().result, AsyncResult::Succeeded("done".into()));
        assert!(InFlight::begin(&state, slot, busy).is_some());
    }

    #[test]
    fn test_failure_message() {
        let state = Observable::new(Form::default());

        let flight = InFlight::begin(&state, slot, busy).unwrap();
        assert_eq!(flight.finish(Err(AuthError::NotFound)), SubmitOutcome::Failed);
        assert_eq!(state.get().result.message(), Some("Invalid email or password"));
    }

    #[test]
    fn test_drop_discards_pending() {
        let state = Observable::new(Form::default());

        drop(InFlight::begin(&state, slot, busy).unwrap());
        assert_eq!(state.get().result, AsyncResult::Absent);
    }

    #[test]
    fn test_cancel() {
        let state = Observable::new(Form::default());

        let flight = InFlight::begin(&state, slot, busy).unwrap();
        assert_eq!(flight.cancel(), SubmitOutcome::Cancelled);
        assert_eq!(state.get().result, AsyncResult::Absent);
    }
}
