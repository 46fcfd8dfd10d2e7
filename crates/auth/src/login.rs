//! Login screen state holder

use identity::{IdentityProvider, SignInOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use user_store::UserStore;

use crate::error::AuthError;
use crate::observable::Observable;
use crate::result::{AsyncResult, InFlight, SubmitOutcome};
use crate::validation::{invalid_email, invalid_password};

pub const LOGIN_SUCCESS: &str = "Login successful";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginState {
    pub email_id: String,
    pub password: String,

    pub email_id_error: bool,
    pub password_error: bool,

    pub show_password: bool,

    /// Email/password submit
    pub login_result: AsyncResult,
    /// "Continue with Google"
    pub google_result: AsyncResult,
}

impl LoginState {
    /// Whether any action is pending; a new one may not start until it settles
    pub fn is_busy(&self) -> bool {
        self.login_result.is_pending() || self.google_result.is_pending()
    }

    pub fn has_errors(&self) -> bool {
        self.email_id_error || self.password_error
    }

    pub fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Email => &self.email_id,
            LoginField::Password => &self.password,
        }
    }

    pub fn field_error(&self, field: LoginField) -> bool {
        match field {
            LoginField::Email => self.email_id_error,
            LoginField::Password => self.password_error,
        }
    }
}

fn login_slot(state: &mut LoginState) -> &mut AsyncResult {
    &mut state.login_result
}

fn google_slot(state: &mut LoginState) -> &mut AsyncResult {
    &mut state.google_result
}

pub struct LoginViewModel {
    state: Observable<LoginState>,
    store: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl LoginViewModel {
    pub fn new(store: Arc<dyn UserStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            state: Observable::default(),
            store,
            identity,
        }
    }

    pub fn state(&self) -> LoginState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoginState> {
        self.state.subscribe()
    }

    /// Stores the new value and re-checks that field right away
    pub fn on_field_change(&self, field: LoginField, value: impl Into<String>) {
        let value = value.into();
        self.state.update(|s| match field {
            LoginField::Email => {
                s.email_id_error = invalid_email(&value);
                s.email_id = value;
            }
            LoginField::Password => {
                s.password_error = invalid_password(&value);
                s.password = value;
            }
        });
    }

    pub fn toggle_password_visibility(&self) {
        self.state.update(|s| s.show_password = !s.show_password);
    }

    /// Whether the sign-in button should be enabled
    pub fn is_submit_enabled(&self) -> bool {
        let s = self.state.get();
        !s.email_id.is_empty() && !s.password.is_empty() && !s.has_errors() && !s.is_busy()
    }

    /// Re-checks every field; returns true when the form may be submitted
    fn validate(&self) -> bool {
        self.state.update(|s| {
            s.email_id_error = invalid_email(&s.email_id);
            s.password_error = invalid_password(&s.password);
        });
        !self.state.get().has_errors()
    }

    /// Looks the credentials up in the local store
    pub async fn submit(&self) -> SubmitOutcome {
        if self.state.get().is_busy() {
            debug!("Login submit ignored, another action is pending");
            return SubmitOutcome::AlreadyPending;
        }

        if !self.validate() {
            debug!("Login submit rejected by validation");
            return SubmitOutcome::Invalid;
        }

        let Some(flight) = InFlight::begin(&self.state, login_slot, LoginState::is_busy) else {
            return SubmitOutcome::AlreadyPending;
        };

        let LoginState { email_id, password, .. } = self.state.get();
        let result = match self.store.find_by_credentials(&email_id, &password).await {
            Ok(Some(user)) => {
                info!("User {} logged in", user.email_id);
                Ok(LOGIN_SUCCESS.to_string())
            }
            Ok(None) => {
                info!("Login failed for {}", email_id);
                Err(AuthError::NotFound)
            }
            Err(e) => {
                warn!("Login lookup failed: {}", e);
                Err(AuthError::from(e))
            }
        };

        flight.finish(result)
    }

    /// Signs in through the identity provider; validation does not apply
    pub async fn sign_in_with_google(&self) -> SubmitOutcome {
        let Some(flight) = InFlight::begin(&self.state, google_slot, LoginState::is_busy) else {
            debug!("Google sign-in ignored, another action is pending");
            return SubmitOutcome::AlreadyPending;
        };

        match self.identity.sign_in().await {
            SignInOutcome::Success(user) => flight.finish(Ok(format!("Signed in as {}", user.email))),
            SignInOutcome::Failure(reason) => flight.finish(Err(AuthError::RemoteFailure(reason))),
            SignInOutcome::Cancelled => {
                info!("Google sign-in cancelled");
                flight.cancel()
            }
        }
    }

    pub fn is_signed_in_with_google(&self) -> bool {
        self.identity.is_signed_in()
    }

    pub async fn sign_out_of_google(&self) -> anyhow::Result<()> {
        self.identity.sign_out().await?;
        self.state.update(|s| {
            if !s.google_result.is_pending() {
                s.google_result = AsyncResult::Absent;
            }
        });
        Ok(())
    }
}
