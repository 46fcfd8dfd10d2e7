//! Test doubles for the state holder tests

use async_trait::async_trait;
use identity::{IdentityProvider, SignInOutcome, SignedInUser};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use user_store::{NewUser, SqliteUserStore, StoreError, UserRecord, UserStore};

/// In-memory SQLite store that counts calls and can hold each call at a gate
/// until the test releases a permit
pub struct CountingStore {
    inner: SqliteUserStore,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    /// Makes `find_by_email_or_phone` miss, as if another holder inserted
    /// between the pre-check and the insert
    skip_precheck: bool,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(None, false))
    }

    pub fn gated(gate: Arc<Semaphore>) -> Arc<Self> {
        Arc::new(Self::build(Some(gate), false))
    }

    pub fn racing() -> Arc<Self> {
        Arc::new(Self::build(None, true))
    }

    fn build(gate: Option<Arc<Semaphore>>, skip_precheck: bool) -> Self {
        Self {
            inner: SqliteUserStore::open_in_memory().unwrap(),
            calls: AtomicUsize::new(0),
            gate,
            skip_precheck,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl UserStore for CountingStore {
    async fn insert(&self, user: NewUser) -> Result<i64, StoreError> {
        self.enter().await;
        self.inner.insert(user).await
    }

    async fn find_by_credentials(&self, email_id: &str, password: &str) -> Result<Option<UserRecord>, StoreError> {
        self.enter().await;
        self.inner.find_by_credentials(email_id, password).await
    }

    async fn find_by_email_or_phone(
        &self,
        email_id: &str,
        phone_number: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.enter().await;
        if self.skip_precheck {
            return Ok(None);
        }
        self.inner.find_by_email_or_phone(email_id, phone_number).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}

pub fn alice() -> NewUser {
    NewUser {
        email_id: "a@b.com".into(),
        phone_number: "1234567890".into(),
        full_name: "Alice".into(),
        password: "secret1".into(),
    }
}

pub fn google_user() -> SignedInUser {
    SignedInUser {
        provider_id: "99".into(),
        email: "alice@gmail.com".into(),
        display_name: Some("Alice".into()),
        picture_url: None,
    }
}

/// Identity provider that answers every sign-in with a fixed outcome
pub struct FakeIdentity {
    outcome: SignInOutcome,
    signed_in: AtomicBool,
    calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn new(outcome: SignInOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            signed_in: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self) -> SignInOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.clone();
        if matches!(outcome, SignInOutcome::Success(_)) {
            self.signed_in.store(true, Ordering::SeqCst);
        }
        outcome
    }

    async fn sign_out(&self) -> anyhow::Result<()> {
        self.signed_in.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }
}
