//! Account persistence
//!
//! Handlers talk to the [`AccountStore`] trait; [`UserRepository`] is the
//! SQLite implementation.

use crate::core::error::{Result, TextpertError};
use crate::db::manager::DatabaseManager;
use crate::db::models::{NewUser, User, UserId, UserUpdate};
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;

/// Persistence capability for user accounts
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account; a duplicate email is [`TextpertError::EmailTaken`]
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Apply the present fields of `update`; `None` if the account does not exist
    async fn update(&self, id: UserId, update: &UserUpdate) -> Result<Option<User>>;

    /// Replace the stored password hash; `false` if the account does not exist
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<bool>;

    /// Remove an account; `false` if it did not exist
    async fn delete(&self, id: UserId) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

const USER_COLUMNS: &str = "id, first_name, last_name, company_name, industry, company_address, \
                            zip_code, email, phone, password_hash, logo, created_at, updated_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        company_name: row.get(3)?,
        industry: row.get(4)?,
        company_address: row.get(5)?,
        zip_code: row.get(6)?,
        email: row.get(7)?,
        phone: row.get(8)?,
        password_hash: row.get(9)?,
        logo: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn select_by_id(conn: &rusqlite::Connection, id: UserId) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
        [id],
        map_user,
    )
    .optional()
    .map_err(TextpertError::DatabaseError)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Column assignments for the present fields of an update
fn assignments(update: &UserUpdate) -> Vec<(&'static str, Value)> {
    fn text(value: &Option<String>) -> Value {
        value.clone().map(Value::Text).unwrap_or(Value::Null)
    }

    let fields: [(&'static str, Option<Value>); 8] = [
        ("first_name", update.first_name.as_ref().map(|v| Value::Text(v.clone()))),
        ("last_name", update.last_name.as_ref().map(|v| Value::Text(v.clone()))),
        ("company_name", update.company_name.as_ref().map(|v| Value::Text(v.clone()))),
        ("industry", update.industry.as_ref().map(|v| Value::Text(v.clone()))),
        ("company_address", update.company_address.as_ref().map(|v| Value::Text(v.clone()))),
        ("zip_code", update.zip_code.as_ref().map(|v| Value::Text(v.clone()))),
        ("phone", update.phone.as_ref().map(|v| Value::Text(v.clone()))),
        ("logo", update.logo.as_ref().map(text)),
    ];

    fields
        .into_iter()
        .filter_map(|(column, value)| value.map(|value| (column, value)))
        .collect()
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// SQLite-backed account store
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for UserRepository {
    async fn create(&self, user: NewUser) -> Result<User> {
        self.db.transaction(move |tx| {
            let now = timestamp();
            let inserted = tx.execute(
                "INSERT INTO users (first_name, last_name, company_name, industry, company_address, \
                 zip_code, email, phone, password_hash, logo, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &user.first_name,
                    &user.last_name,
                    &user.company_name,
                    &user.industry,
                    &user.company_address,
                    &user.zip_code,
                    &user.email,
                    &user.phone,
                    &user.password_hash,
                    &user.logo,
                    &now,
                    &now,
                ],
            );

            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(TextpertError::EmailTaken(user.email.clone()));
                }
                Err(e) => return Err(TextpertError::DatabaseError(e)),
            }

            let id = tx.last_insert_rowid();
            select_by_id(tx, id)?.ok_or_else(|| {
                TextpertError::Internal(format!("User {} vanished after insert", id))
            })
        }).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                [&email],
                map_user,
            )
            .optional()
            .map_err(TextpertError::DatabaseError)
        }).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        self.db.execute(move |conn| select_by_id(conn, id)).await
    }

    async fn update(&self, id: UserId, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.find_by_id(id).await;
        }
        let mut assignments = assignments(update);
        assignments.push(("updated_at", Value::Text(timestamp())));

        self.db.transaction(move |tx| {
            let set_clause = assignments
                .iter()
                .map(|(column, _)| format!("{} = ?", column))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("UPDATE users SET {} WHERE id = ?", set_clause);

            let params = assignments
                .into_iter()
                .map(|(_, value)| value)
                .chain(std::iter::once(Value::Integer(id)));

            let changed = tx.execute(&sql, rusqlite::params_from_iter(params))?;
            if changed == 0 {
                return Ok(None);
            }

            select_by_id(tx, id)
        }).await
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<bool> {
        let password_hash = password_hash.to_string();
        self.db.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
                rusqlite::params![&password_hash, timestamp(), id],
            )?;
            Ok(changed > 0)
        }).await
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        self.db.execute(move |conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?", [id])?;
            Ok(changed > 0)
        }).await
    }

    async fn count(&self) -> Result<i64> {
        self.db.execute(|conn| {
            conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(TextpertError::DatabaseError)
        }).await
    }
}
