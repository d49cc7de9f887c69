use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use crate::auth::Profile;
use crate::models::{Role, User};

/// SQLite-backed user store.
///
/// Holds the single connection behind a mutex; every operation is one
/// read and/or one write, so contention is not a concern here.
pub struct UserStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("User not found")]
    NotFound,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl UserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                auth0_sub TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL,
                email TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                role TEXT NOT NULL DEFAULT 'USER',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_login_at TEXT
            )",
            [],
        )?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Map a verified claim profile to a persisted user.
    ///
    /// Creates the record on first sight of the subject; on every later
    /// sight only the profile fields (`username`, `email`) and
    /// `last_login_at` are rewritten. `role` and `is_active` are never
    /// touched by this path.
    pub fn reconcile(&self, profile: &Profile) -> Result<User, StoreError> {
        let conn = self.lock()?;
        let now = Utc::now();
        let username = derive_username(profile);
        let email = profile.email.clone();

        if let Some(existing) = Self::get_by_subject(&conn, &profile.sub)? {
            return Self::refresh_login(&conn, existing, username, email, now);
        }

        let user = User {
            id: Uuid::new_v4(),
            auth0_sub: profile.sub.clone(),
            username,
            email,
            // New accounts start active; see DESIGN.md for the rationale.
            is_active: true,
            role: Role::User,
            created_at: now,
            updated_at: now,
            last_login_at: Some(now),
        };

        let inserted = conn.execute(
            "INSERT INTO users (id, auth0_sub, username, email, is_active, role, created_at, updated_at, last_login_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user.id.to_string(),
                user.auth0_sub,
                user.username,
                user.email,
                user.is_active,
                user.role.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => Ok(user),
            // Lost a simultaneous first-login race for this subject: the
            // UNIQUE constraint on auth0_sub fired, so another writer has
            // created the row. Retry as the update path.
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                let existing = Self::get_by_subject(&conn, &profile.sub)?
                    .ok_or_else(|| StoreError::Database("constraint violation without existing row".to_string()))?;
                Self::refresh_login(&conn, existing, user.username, user.email, now)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_USER),
                params![id.to_string()],
                map_user_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_by_subject(&self, sub: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        Self::get_by_subject(&conn, sub)
    }

    pub fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY created_at", SELECT_USER))?;
        let users = stmt
            .query_map([], map_user_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Admin action: enable or disable an account.
    pub fn set_active(&self, id: Uuid, is_active: bool) -> Result<User, StoreError> {
        let conn = self.lock()?;
        let mut user = Self::get_by_id(&conn, id)?.ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        conn.execute(
            "UPDATE users SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            params![is_active, now.to_rfc3339(), id.to_string()],
        )?;
        user.is_active = is_active;
        user.updated_at = now;
        Ok(user)
    }

    /// Admin action: change an account's role.
    pub fn set_role(&self, id: Uuid, role: Role) -> Result<User, StoreError> {
        let conn = self.lock()?;
        let mut user = Self::get_by_id(&conn, id)?.ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        conn.execute(
            "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
            params![role.as_str(), now.to_rfc3339(), id.to_string()],
        )?;
        user.role = role;
        user.updated_at = now;
        Ok(user)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_by_subject(conn: &Connection, sub: &str) -> Result<Option<User>, StoreError> {
        let user = conn
            .query_row(
                &format!("{} WHERE auth0_sub = ?1", SELECT_USER),
                params![sub],
                map_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn get_by_id(conn: &Connection, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_USER),
                params![id.to_string()],
                map_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn refresh_login(
        conn: &Connection,
        existing: User,
        username: String,
        email: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        conn.execute(
            "UPDATE users SET username = ?1, email = ?2, last_login_at = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                username,
                email,
                now.to_rfc3339(),
                now.to_rfc3339(),
                existing.id.to_string(),
            ],
        )?;
        Ok(User {
            username,
            email,
            last_login_at: Some(now),
            updated_at: now,
            ..existing
        })
    }
}

const SELECT_USER: &str =
    "SELECT id, auth0_sub, username, email, is_active, role, created_at, updated_at, last_login_at FROM users";

/// Display name for a profile: first non-empty of nickname, name, the
/// local part of the email address, else the subject itself.
fn derive_username(profile: &Profile) -> String {
    if let Some(nickname) = non_empty(&profile.nickname) {
        return nickname.to_string();
    }
    if let Some(name) = non_empty(&profile.name) {
        return name.to_string();
    }
    if let Some(email) = non_empty(&profile.email) {
        return email.split('@').next().unwrap_or(email).to_string();
    }
    profile.sub.clone()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn map_user_row(row: &Row) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let role: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    let last_login_at: Option<String> = row.get(8)?;

    Ok(User {
        id: Uuid::parse_str(&id).map_err(|e| text_conversion_error(0, e))?,
        auth0_sub: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        is_active: row.get(4)?,
        role: Role::parse(&role).ok_or_else(|| {
            text_conversion_error(5, format!("unknown role: {role}"))
        })?,
        created_at: parse_timestamp(6, &created_at)?,
        updated_at: parse_timestamp(7, &updated_at)?,
        last_login_at: last_login_at
            .map(|ts| parse_timestamp(8, &ts))
            .transpose()?,
    })
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| text_conversion_error(column, e))
}

fn text_conversion_error(
    column: usize,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, source.into())
}
