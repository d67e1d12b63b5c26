//! `PostgreSQL` implementation of [`Store`].
//!
//! Queries are checked at runtime (`query`/`query_as`) so the crate builds
//! without a live database or an offline query cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::PgPool;
use uuid::Uuid;

use checkpoint_core::{AccessSet, AdminId, Email, UserId, WhitelistId};

use super::{AdminRemoval, Store, StoreError};
use crate::models::{Admin, Flag, Timestamps, User, WhitelistEntry};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email)
            .map_err(|e| StoreError::DataCorruption(format!("invalid email in users: {e}")))?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            email,
            name: row.name,
            timestamps: Timestamps {
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
#[allow(clippy::struct_excessive_bools)]
struct AdminRow {
    id: Uuid,
    checkin_access: bool,
    anticheat_access: bool,
    qrmgmt_access: bool,
    question_management_access: bool,
    communication_access: bool,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            id: AdminId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            access: AccessSet {
                checkin: row.checkin_access,
                anticheat: row.anticheat_access,
                qr_management: row.qrmgmt_access,
                question_management: row.question_management_access,
                communication: row.communication_access,
            },
            timestamps: Timestamps {
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FlagRow {
    name: String,
    value: bool,
}

impl From<FlagRow> for Flag {
    fn from(row: FlagRow) -> Self {
        Self {
            name: row.name,
            value: row.value,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WhitelistRow {
    id: Uuid,
    name: String,
    email: String,
}

impl From<WhitelistRow> for WhitelistEntry {
    fn from(row: WhitelistRow) -> Self {
        Self {
            id: WhitelistId::from_uuid(row.id),
            name: row.name,
            email: row.email,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Store backed by a `PostgreSQL` pool.
pub struct PgStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgStore<'a> {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore<'_> {
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_admin_by_user(&self, user_id: UserId) -> Result<Option<Admin>, StoreError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            SELECT id, checkin_access, anticheat_access, qrmgmt_access,
                   question_management_access, communication_access, user_id,
                   created_at, updated_at
            FROM admins
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO admins (id, checkin_access, anticheat_access, qrmgmt_access,
                                question_management_access, communication_access, user_id,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(admin.id)
        .bind(admin.access.checkin)
        .bind(admin.access.anticheat)
        .bind(admin.access.qr_management)
        .bind(admin.access.question_management)
        .bind(admin.access.communication)
        .bind(admin.user_id)
        .bind(admin.timestamps.created_at)
        .bind(admin.timestamps.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("user already has an admin record".to_owned());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn update_admin_access(&self, admin: &Admin) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r"
            UPDATE admins
            SET checkin_access = $1, anticheat_access = $2, qrmgmt_access = $3,
                question_management_access = $4, communication_access = $5,
                updated_at = $6
            WHERE user_id = $7
            ",
        )
        .bind(admin.access.checkin)
        .bind(admin.access.anticheat)
        .bind(admin.access.qr_management)
        .bind(admin.access.question_management)
        .bind(admin.access.communication)
        .bind(admin.timestamps.updated_at)
        .bind(admin.user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_admin(&self, admin_id: AdminId) -> Result<AdminRemoval, StoreError> {
        // Both deletes commit together so a failure cannot strand an admin
        // without its QR records.
        let mut tx = self.pool.begin().await?;

        let qr_codes = sqlx::query("DELETE FROM qr_codes WHERE admin_id = $1")
            .bind(admin_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let admins = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(admin_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(AdminRemoval { qr_codes, admins })
    }

    async fn flag_exists(&self, name: &str) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, String>("SELECT name FROM flags WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn write_flag(&self, name: &str, value: bool) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE flags SET value = $1 WHERE name = $2")
            .bind(value)
            .bind(name)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_flags(&self) -> Result<Vec<Flag>, StoreError> {
        let flags: Vec<Flag> =
            sqlx::query_as::<_, FlagRow>("SELECT name, value FROM flags ORDER BY name")
                .fetch(self.pool)
                .map_ok(Flag::from)
                .try_collect()
                .await?;

        Ok(flags)
    }

    async fn find_whitelist_entry(
        &self,
        email: &str,
    ) -> Result<Option<WhitelistEntry>, StoreError> {
        let row = sqlx::query_as::<_, WhitelistRow>(
            "SELECT id, name, email FROM whitelists WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn insert_whitelist_entry(&self, entry: &WhitelistEntry) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO whitelists (id, name, email) VALUES ($1, $2, $3)")
            .bind(entry.id)
            .bind(&entry.name)
            .bind(&entry.email)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Conflict(format!(
                        "whitelist already contains {}",
                        entry.email
                    ));
                }
                StoreError::Database(e)
            })?;

        Ok(())
    }
}
