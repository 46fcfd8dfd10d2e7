//! SQLite implementation of [`UserStore`]
//!
//! Schema: one `user` table (`emailId`, `phoneNumber`, `fullName`,
//! `password`) with unique indexes on email and phone number.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{NewUser, StoreError, UserRecord, UserStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "user" (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    emailId TEXT NOT NULL,
    phoneNumber TEXT NOT NULL,
    fullName TEXT NOT NULL,
    password TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS index_user_emailId ON "user"(emailId);
CREATE UNIQUE INDEX IF NOT EXISTS index_user_phoneNumber ON "user"(phoneNumber);
"#;

const SELECT_COLUMNS: &str = r#"SELECT id, emailId, phoneNumber, fullName, password FROM "user""#;

/// SQLite-backed user store
///
/// Queries run on tokio's blocking pool; the connection lock is never held
/// across an `.await`.
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    /// Opens (or creates) the database at `path`, creating parent directories
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        info!("Opened user database at {:?} (journal_mode={})", path, journal_mode);
        Self::with_connection(conn)
    }

    /// Private in-memory database, gone when the store is dropped
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock())).await?
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        email_id: row.get(1)?,
        phone_number: row.get(2)?,
        full_name: row.get(3)?,
        password: row.get(4)?,
    })
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn insert(&self, user: NewUser) -> Result<i64, StoreError> {
        self.with_conn(move |conn| {
            let result = conn.execute(
                r#"INSERT INTO "user" (emailId, phoneNumber, fullName, password)
                   VALUES (?1, ?2, ?3, ?4)"#,
                params![user.email_id, user.phone_number, user.full_name, user.password],
            );

            match result {
                Ok(_) => {
                    let id = conn.last_insert_rowid();
                    info!("Inserted user {} with id {}", user.email_id, id);
                    Ok(id)
                }
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    warn!("Rejected duplicate user {}", user.email_id);
                    Err(StoreError::DuplicateConstraint)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn find_by_credentials(
        &self,
        email_id: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let (email_id, password) = (email_id.to_owned(), password.to_owned());
        self.with_conn(move |conn| {
            let user = conn
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE emailId = ?1 AND password = ?2 LIMIT 1"),
                    params![email_id, password],
                    map_row,
                )
                .optional()?;

            debug!("Credential lookup for {}: found={}", email_id, user.is_some());
            Ok(user)
        })
        .await
    }

    async fn find_by_email_or_phone(
        &self,
        email_id: &str,
        phone_number: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let (email_id, phone_number) = (email_id.to_owned(), phone_number.to_owned());
        self.with_conn(move |conn| {
            let user = conn
                .query_row(
                    &format!(
                        "{SELECT_COLUMNS} WHERE emailId = ?1 OR phoneNumber = ?2 ORDER BY id LIMIT 1"
                    ),
                    params![email_id, phone_number],
                    map_row,
                )
                .optional()?;
            Ok(user)
        })
        .await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row(r#"SELECT COUNT(*) FROM "user""#, [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}
