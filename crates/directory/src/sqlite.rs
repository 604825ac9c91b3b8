//! SQLite-backed user directory.
//!
//! Tables:
//! - `users`: id, uid, username, email, password_hash, created_at
//!
//! Username and uid carry `UNIQUE` constraints; a violation on `username`
//! is reported as [`DirectoryError::DuplicateUsername`], a violation on
//! `uid` triggers a retry with a fresh uid.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{info, warn};

use crate::{
    generate_uid, DirectoryError, NewUser, Result, UserDirectory, UserRecord, UID_ATTEMPTS,
};

/// Schema migrations, applied in order and tracked through `PRAGMA user_version`.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        uid INTEGER NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE,
        email TEXT,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );",
)];

const SELECT_USER: &str =
    "SELECT id, uid, username, email, password_hash, created_at FROM users WHERE username = ?1";

/// SQLite-backed user directory
pub struct SqliteDirectory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDirectory {
    /// Open (or create) the directory database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || op(&conn.lock()))
            .await
            .map_err(|e| DirectoryError::TaskError(e.to_string()))?
    }
}

#[async_trait]
impl UserDirectory for SqliteDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let username = username.to_string();
        self.blocking(move |conn| {
            let user = conn
                .query_row(SELECT_USER, params![username], user_from_row)
                .optional()?;
            Ok(user)
        })
        .await
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord> {
        self.blocking(move |conn| insert_user(conn, user)).await
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.pragma_update(None, "user_version", version)?;
        info!(version, "applied directory migration");
    }

    Ok(())
}

fn insert_user(conn: &Connection, user: NewUser) -> Result<UserRecord> {
    let created_at = Utc::now();

    for _ in 0..UID_ATTEMPTS {
        let uid = generate_uid();
        let inserted = conn.execute(
            "INSERT INTO users (uid, username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                uid as i64,
                user.username,
                user.email,
                user.password_hash,
                created_at.to_rfc3339()
            ],
        );

        match inserted {
            Ok(_) => {
                return Ok(UserRecord {
                    id: conn.last_insert_rowid(),
                    uid,
                    username: user.username,
                    email: user.email,
                    password_hash: user.password_hash,
                    created_at,
                });
            }
            Err(err) => match unique_violation(&err) {
                Some("username") => return Err(DirectoryError::DuplicateUsername(user.username)),
                Some("uid") => warn!(uid, "uid collision, drawing a new one"),
                _ => return Err(err.into()),
            },
        }
    }

    Err(DirectoryError::UidExhausted(UID_ATTEMPTS))
}

/// Name of the column whose `UNIQUE` constraint `err` violated, if any.
fn unique_violation(err: &rusqlite::Error) -> Option<&'static str> {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message))
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            if message.contains("users.username") {
                Some("username")
            } else if message.contains("users.uid") {
                Some("uid")
            } else {
                None
            }
        }
        _ => None,
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    let uid: i64 = row.get("uid")?;
    let created_at: String = row.get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(UserRecord {
        id: row.get("id")?,
        uid: uid as u64,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        created_at,
    })
}
