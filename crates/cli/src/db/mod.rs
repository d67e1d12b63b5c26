//! Store access for the command interpreter.
//!
//! # Tables
//!
//! - `users` - Identity rows, read-only here
//! - `admins` - Admin permission records, one per user
//! - `qr_codes` - QR records created by an admin, removed with their admin
//! - `flags` - Named boolean toggles
//! - `whitelists` - Pre-approved emails
//!
//! The schema is owned by the backend; this crate runs no migrations.
//!
//! [`Store`] is the seam between the record services and persistence.
//! [`PgStore`] talks to `PostgreSQL`. With the `test-support` feature,
//! `MemoryStore` keeps everything in process and records each operation so
//! tests can assert on what was (and was not) issued.

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use checkpoint_core::{AdminId, Email, UserId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::models::{Admin, Flag, User, WhitelistEntry};

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryStore, Operation};
pub use postgres::PgStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., a second admin for the same user).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The store refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Row counts from deleting an admin together with its QR records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdminRemoval {
    pub qr_codes: u64,
    pub admins: u64,
}

/// Persistence operations used by the record services.
///
/// Every method is a single logical statement except
/// [`Store::delete_admin`], which removes dependent QR records before the
/// admin row.
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up a user by exact email.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;

    /// Look up the admin record attached to a user.
    async fn find_admin_by_user(&self, user_id: UserId) -> Result<Option<Admin>, StoreError>;

    /// Insert a new admin record.
    ///
    /// Returns `StoreError::Conflict` if the user already has one.
    async fn insert_admin(&self, admin: &Admin) -> Result<(), StoreError>;

    /// Overwrite the five access fields and `updated_at` of the admin owned by
    /// `admin.user_id`. Returns the number of rows updated.
    async fn update_admin_access(&self, admin: &Admin) -> Result<u64, StoreError>;

    /// Delete an admin and the QR records that reference it.
    async fn delete_admin(&self, admin_id: AdminId) -> Result<AdminRemoval, StoreError>;

    /// Whether a flag row with this name exists.
    async fn flag_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Write a flag value. Returns the number of rows updated.
    async fn write_flag(&self, name: &str, value: bool) -> Result<u64, StoreError>;

    /// Every flag, ordered by name.
    ///
    /// Fails as a whole if any row cannot be read.
    async fn list_flags(&self) -> Result<Vec<Flag>, StoreError>;

    /// Look up a whitelist entry by exact email.
    async fn find_whitelist_entry(
        &self,
        email: &str,
    ) -> Result<Option<WhitelistEntry>, StoreError>;

    /// Insert a whitelist entry.
    async fn insert_whitelist_entry(&self, entry: &WhitelistEntry) -> Result<(), StoreError>;
}

/// Connection pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 2,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// The tool runs one statement at a time, so the pool stays small.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    settings: PoolSettings,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(1)
        .acquire_timeout(settings.acquire_timeout)
        .connect(database_url.expose_secret())
        .await
}
