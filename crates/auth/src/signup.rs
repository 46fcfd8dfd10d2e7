//! Signup screen state holder

use identity::{IdentityProvider, SignInOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use user_store::{NewUser, UserStore};

use crate::error::AuthError;
use crate::observable::Observable;
use crate::result::{AsyncResult, InFlight, SubmitOutcome};
use crate::validation::{
    invalid_email, invalid_name, invalid_password, invalid_phone_number, passwords_mismatch,
};

pub const SIGNUP_SUCCESS: &str = "Signup successful";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    FullName,
    Email,
    Password,
    ConfirmPassword,
    PhoneNumber,
}

impl SignupField {
    pub const ALL: [SignupField; 5] = [
        SignupField::FullName,
        SignupField::Email,
        SignupField::Password,
        SignupField::ConfirmPassword,
        SignupField::PhoneNumber,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignupState {
    pub full_name: String,
    pub email_id: String,
    pub password: String,
    pub confirm_password: String,
    pub phone_number: String,

    pub full_name_error: bool,
    pub email_id_error: bool,
    pub password_error: bool,
    pub conf_password_error: bool,
    pub password_mismatch_error: bool,
    pub phone_number_error: bool,

    pub show_password: bool,
    pub show_confirm_password: bool,

    /// Local account creation
    pub signup_result: AsyncResult,
    /// Account creation through Google
    pub credential_signup_result: AsyncResult,
}

impl SignupState {
    pub fn is_busy(&self) -> bool {
        self.signup_result.is_pending() || self.credential_signup_result.is_pending()
    }

    pub fn has_errors(&self) -> bool {
        self.full_name_error
            || self.email_id_error
            || self.password_error
            || self.conf_password_error
            || self.password_mismatch_error
            || self.phone_number_error
    }

    pub fn value(&self, field: SignupField) -> &str {
        match field {
            SignupField::FullName => &self.full_name,
            SignupField::Email => &self.email_id,
            SignupField::Password => &self.password,
            SignupField::ConfirmPassword => &self.confirm_password,
            SignupField::PhoneNumber => &self.phone_number,
        }
    }

    /// Whether the field should render as erroneous; the password pair also
    /// shows the mismatch
    pub fn field_error(&self, field: SignupField) -> bool {
        match field {
            SignupField::FullName => self.full_name_error,
            SignupField::Email => self.email_id_error,
            SignupField::Password => self.password_error || self.password_mismatch_error,
            SignupField::ConfirmPassword => self.conf_password_error || self.password_mismatch_error,
            SignupField::PhoneNumber => self.phone_number_error,
        }
    }

    fn recheck_all(&mut self) {
        self.full_name_error = invalid_name(&self.full_name);
        self.email_id_error = invalid_email(&self.email_id);
        self.password_error = invalid_password(&self.password);
        self.conf_password_error = invalid_password(&self.confirm_password);
        self.password_mismatch_error = passwords_mismatch(&self.password, &self.confirm_password);
        self.phone_number_error = invalid_phone_number(&self.phone_number);
    }
}

fn signup_slot(state: &mut SignupState) -> &mut AsyncResult {
    &mut state.signup_result
}

fn credential_slot(state: &mut SignupState) -> &mut AsyncResult {
    &mut state.credential_signup_result
}

pub struct SignupViewModel {
    state: Observable<SignupState>,
    store: Arc<dyn UserStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl SignupViewModel {
    pub fn new(store: Arc<dyn UserStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            state: Observable::default(),
            store,
            identity,
        }
    }

    pub fn state(&self) -> SignupState {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<SignupState> {
        self.state.subscribe()
    }

    /// Stores the new value and re-checks that field right away
    pub fn on_field_change(&self, field: SignupField, value: impl Into<String>) {
        let value = value.into();
        self.state.update(|s| match field {
            SignupField::FullName => {
                s.full_name_error = invalid_name(&value);
                s.full_name = value;
            }
            SignupField::Email => {
                s.email_id_error = invalid_email(&value);
                s.email_id = value;
            }
            SignupField::Password => {
                s.password_error = invalid_password(&value);
                s.password_mismatch_error = passwords_mismatch(&value, &s.confirm_password);
                s.password = value;
            }
            SignupField::ConfirmPassword => {
                s.conf_password_error = invalid_password(&value);
                s.password_mismatch_error = passwords_mismatch(&s.password, &value);
                s.confirm_password = value;
            }
            SignupField::PhoneNumber => {
                s.phone_number_error = invalid_phone_number(&value);
                s.phone_number = value;
            }
        });
    }

    pub fn toggle_password_visibility(&self) {
        self.state.update(|s| s.show_password = !s.show_password);
    }

    pub fn toggle_confirm_password_visibility(&self) {
        self.state.update(|s| s.show_confirm_password = !s.show_confirm_password);
    }

    /// Whether the sign-up button should be enabled
    pub fn is_submit_enabled(&self) -> bool {
        let s = self.state.get();
        SignupField::ALL.iter().all(|field| !s.value(*field).is_empty())
            && !s.has_errors()
            && !s.is_busy()
    }

    /// Creates the account in the local store
    pub async fn submit(&self) -> SubmitOutcome {
        if self.state.get().is_busy() {
            debug!("Signup submit ignored, another action is pending");
            return SubmitOutcome::AlreadyPending;
        }

        self.state.update(SignupState::recheck_all);
        if self.state.get().has_errors() {
            debug!("Signup submit rejected by validation");
            return SubmitOutcome::Invalid;
        }

        let Some(flight) = InFlight::begin(&self.state, signup_slot, SignupState::is_busy) else {
            return SubmitOutcome::AlreadyPending;
        };

        let state = self.state.get();
        let result = self.register(&state).await;
        if let Err(e) = &result {
            warn!("Signup for {} failed: {}", state.email_id, e);
        }

        flight.finish(result)
    }

    async fn register(&self, state: &SignupState) -> Result<String, AuthError> {
        if let Some(existing) = self
            .store
            .find_by_email_or_phone(&state.email_id, &state.phone_number)
            .await?
        {
            debug!("Signup pre-check matched user {}", existing.id);
            return Err(AuthError::DuplicateConstraint);
        }

        // The unique indexes still guard against a concurrent signup that
        // lands between the pre-check and this insert.
        let id = self
            .store
            .insert(NewUser {
                email_id: state.email_id.clone(),
                phone_number: state.phone_number.clone(),
                full_name: state.full_name.clone(),
                password: state.password.clone(),
            })
            .await?;

        info!("Registered user {} with id {}", state.email_id, id);
        Ok(SIGNUP_SUCCESS.to_string())
    }

    /// Creates the account through the identity provider instead of the form
    pub async fn sign_up_with_google(&self) -> SubmitOutcome {
        let Some(flight) = InFlight::begin(&self.state, credential_slot, SignupState::is_busy) else {
            debug!("Google signup ignored, another action is pending");
            return SubmitOutcome::AlreadyPending;
        };

        match self.identity.sign_in().await {
            SignInOutcome::Success(user) => flight.finish(Ok(format!("Signed up as {}", user.email))),
            SignInOutcome::Failure(reason) => flight.finish(Err(AuthError::RemoteFailure(reason))),
            SignInOutcome::Cancelled => {
                info!("Google signup cancelled");
                flight.cancel()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingStore, FakeIdentity, alice, google_user};
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    fn view_model(store: Arc<CountingStore>) -> SignupViewModel {
        SignupViewModel::new(store, FakeIdentity::new(SignInOutcome::Cancelled))
    }

    fn fill(vm: &SignupViewModel, email: &str, phone: &str, name: &str, password: &str) {
        vm.on_field_change(SignupField::FullName, name);
        vm.on_field_change(SignupField::Email, email);
        vm.on_field_change(SignupField::Password, password);
        vm.on_field_change(SignupField::ConfirmPassword, password);
        vm.on_field_change(SignupField::PhoneNumber, phone);
    }

    #[test]
    fn test_mismatch_tracks_both_fields() {
        let vm = view_model(CountingStore::new());

        vm.on_field_change(SignupField::Password, "secret1");
        assert!(!vm.state().password_mismatch_error);

        vm.on_field_change(SignupField::ConfirmPassword, "secret");
        let state = vm.state();
        assert!(state.conf_password_error);
        assert!(!state.password_mismatch_error);

        vm.on_field_change(SignupField::ConfirmPassword, "secret2");
        let state = vm.state();
        assert!(!state.conf_password_error);
        assert!(state.password_mismatch_error);
        assert!(state.field_error(SignupField::Password));
        assert!(state.field_error(SignupField::ConfirmPassword));

        vm.on_field_change(SignupField::Password, "secret2");
        assert!(!vm.state().password_mismatch_error);
    }

    #[test]
    fn test_submit_enabled_needs_every_field() {
        let vm = view_model(CountingStore::new());
        fill(&vm, "a@b.com", "1234567890", "Alice", "secret1");
        assert!(vm.is_submit_enabled());

        vm.on_field_change(SignupField::PhoneNumber, "123456789");
        assert!(vm.state().phone_number_error);
        assert!(!vm.is_submit_enabled());
    }

    #[tokio::test]
    async fn test_empty_form_aborts_without_store_call() {
        let store = CountingStore::new();
        let vm = view_model(store.clone());

        assert_eq!(vm.submit().await, SubmitOutcome::Invalid);

        let state = vm.state();
        assert!(state.full_name_error);
        assert!(state.email_id_error);
        assert!(state.password_error);
        assert!(state.conf_password_error);
        assert!(state.phone_number_error);
        assert_eq!(state.signup_result, AsyncResult::Absent);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_mismatch_blocks_submit() {
        let store = CountingStore::new();
        let vm = view_model(store.clone());
        fill(&vm, "a@b.com", "1234567890", "Alice", "secret1");
        vm.on_field_change(SignupField::ConfirmPassword, "secret2");

        assert_eq!(vm.submit().await, SubmitOutcome::Invalid);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_signup_then_duplicate() {
        let store = CountingStore::new();

        let vm = view_model(store.clone());
        fill(&vm, "a@b.com", "1234567890", "Alice", "secret1");
        assert_eq!(vm.submit().await, SubmitOutcome::Succeeded);
        assert_eq!(vm.state().signup_result, AsyncResult::Succeeded(SIGNUP_SUCCESS.into()));

        let vm = view_model(store.clone());
        fill(&vm, "a@b.com", "0000000000", "Bobby", "secret2");
        assert_eq!(vm.submit().await, SubmitOutcome::Failed);
        assert_eq!(
            vm.state().signup_result,
            AsyncResult::Failed(AuthError::DuplicateConstraint.to_string())
        );

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.find_by_credentials("a@b.com", "secret1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_constraint_catches_race_after_clean_precheck() {
        let store = CountingStore::racing();
        store.insert(alice()).await.unwrap();

        let vm = view_model(store.clone());
        fill(&vm, "a@b.com", "1234567890", "Alice", "secret1");

        assert_eq!(vm.submit().await, SubmitOutcome::Failed);
        assert_eq!(
            vm.state().signup_result.message(),
            Some(AuthError::DuplicateConstraint.to_string().as_str())
        );
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_submit_is_noop_while_pending() {
        let gate = Arc::new(Semaphore::new(0));
        let store = CountingStore::gated(gate.clone());
        let vm = Arc::new(view_model(store.clone()));
        fill(&vm, "a@b.com", "1234567890", "Alice", "secret1");

        let mut rx = vm.subscribe();
        let first = tokio::spawn({
            let vm = vm.clone();
            async move { vm.submit().await }
        });
        rx.wait_for(|s| s.signup_result.is_pending()).await.unwrap();

        assert_eq!(vm.submit().await, SubmitOutcome::AlreadyPending);

        // one permit each for the pre-check and the insert
        gate.add_permits(2);

        assert_eq!(first.await.unwrap(), SubmitOutcome::Succeeded);
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_google_signup() {
        let vm = SignupViewModel::new(
            CountingStore::new(),
            FakeIdentity::new(SignInOutcome::Success(google_user())),
        );
        assert_eq!(vm.sign_up_with_google().await, SubmitOutcome::Succeeded);
        assert_eq!(
            vm.state().credential_signup_result,
            AsyncResult::Succeeded("Signed up as alice@gmail.com".into())
        );
        assert_eq!(vm.state().signup_result, AsyncResult::Absent);

        let vm = view_model(CountingStore::new());
        assert_eq!(vm.sign_up_with_google().await, SubmitOutcome::Cancelled);
        assert_eq!(vm.state().credential_signup_result, AsyncResult::Absent);
    }
}
