//! Local user store for UserAuth
//!
//! Persists signed-up users in a single SQLite table and answers the two
//! lookups the login and signup screens need. Passwords are kept as the
//! plaintext the user typed and compared by exact string equality, which
//! is only acceptable for a local demo store.

pub mod sqlite;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use sqlite::SqliteUserStore;

/// A persisted user row
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Store-assigned identifier
    pub id: i64,
    pub email_id: String,
    pub phone_number: String,
    pub full_name: String,
    pub password: String,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email_id", &self.email_id)
            .field("phone_number", &self.phone_number)
            .field("full_name", &self.full_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Insert payload: a user before the store assigns its id
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email_id: String,
    pub phone_number: String,
    pub full_name: String,
    pub password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email_id", &self.email_id)
            .field("phone_number", &self.phone_number)
            .field("full_name", &self.full_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Uniqueness violation on email or phone number
    #[error("a user with this email or phone number already exists")]
    DuplicateConstraint,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The blocking database task panicked or was cancelled
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("failed to prepare database directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Durable table of user records
///
/// Email and phone number are each unique across the store. Implementations
/// must enforce that on `insert` even when the caller already ran
/// `find_by_email_or_phone`, since two callers can race between the check
/// and the write.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user and returns its id.
    ///
    /// Fails with [`StoreError::DuplicateConstraint`] if the email or phone
    /// number is taken; nothing is written in that case.
    async fn insert(&self, user: NewUser) -> Result<i64, StoreError>;

    /// Exact, case-sensitive match on both email and password
    async fn find_by_credentials(
        &self,
        email_id: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// First record whose email or phone number matches
    async fn find_by_email_or_phone(
        &self,
        email_id: &str,
        phone_number: &str,
    ) -> Result<Option<UserRecord>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}
