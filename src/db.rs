use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use thiserror::Error;

use crate::models::{NewUser, PasswordHash, User};
use crate::utils;

const USER_COLUMNS: &str = "id, name, email, password, created_at_utc, updated_at_utc";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("entity not found")]
    NotFound,
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound,
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                RepositoryError::Constraint(message.unwrap_or_else(|| failure.to_string()))
            }
            other => RepositoryError::Database(other),
        }
    }
}

/// CRUD access to user records. Lookups that match nothing return `Ok(None)`.
pub trait UserRepository {
    fn get_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    fn get_by_email_and_password(
        &self,
        email: &str,
        password: &PasswordHash,
    ) -> RepositoryResult<Option<User>>;
    fn create(&self, user: &NewUser) -> RepositoryResult<User>;
    fn save(&self, user: &User) -> RepositoryResult<User>;
    fn delete(&self, id: i64) -> RepositoryResult<()>;
}

pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    pub fn open_default() -> RepositoryResult<Self> {
        Self::open(&utils::database_path())
    }

    pub fn open(path: &Path) -> RepositoryResult<Self> {
        utils::ensure_parent(path);
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> RepositoryResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> RepositoryResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at_utc TEXT NOT NULL,
                updated_at_utc TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn find_one(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
        let user = self
            .conn
            .query_row(&sql, params, user_from_row)
            .optional()?;
        Ok(user)
    }
}

impl UserRepository for UserStore {
    fn get_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        self.find_one("id = ?1", params![id])
    }

    fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.find_one("email = ?1", params![email])
    }

    fn get_by_email_and_password(
        &self,
        email: &str,
        password: &PasswordHash,
    ) -> RepositoryResult<Option<User>> {
        self.find_one(
            "email = ?1 AND password = ?2",
            params![email, password.as_str()],
        )
    }

    fn create(&self, user: &NewUser) -> RepositoryResult<User> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO users (name, email, password, created_at_utc, updated_at_utc)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![user.name, user.email, user.password.as_str(), now],
        )?;
        let id = self.conn.last_insert_rowid();
        log::debug!("created user {id}");
        Ok(User {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    fn save(&self, user: &User) -> RepositoryResult<User> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE users SET name = ?2, email = ?3, password = ?4, updated_at_utc = ?5
             WHERE id = ?1",
            params![user.id, user.name, user.email, user.password.as_str(), now],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(User {
            updated_at: now,
            ..user.clone()
        })
    }

    fn delete(&self, id: i64) -> RepositoryResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        log::debug!("deleted user {id}");
        Ok(())
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: PasswordHash::from_hex(row.get::<_, String>(3)?),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
