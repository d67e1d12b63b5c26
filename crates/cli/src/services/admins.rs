//! Admin permission records: add, delete, modify.

use std::io::{BufRead, Write};

use checkpoint_core::Email;
use tracing::{debug, info, instrument, warn};

use super::RecordError;
use crate::console::Console;
use crate::db::{AdminRemoval, Store, StoreError};
use crate::models::{Admin, User};
use crate::render;

/// Admin record operations over a store.
pub struct AdminService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> AdminService<'a, S> {
    /// Create a new admin service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    async fn user(&self, email: &str) -> Result<User, RecordError> {
        // Stored user emails always parse, so a malformed one cannot match.
        let parsed = Email::parse(email).map_err(|e| {
            debug!(error = %e, "email does not parse, no user can match");
            RecordError::UserNotFound
        })?;
        let user = self
            .store
            .find_user_by_email(&parsed)
            .await?
            .ok_or(RecordError::UserNotFound)?;
        debug!(user_id = %user.id, "resolved user");
        Ok(user)
    }

    /// Create an admin record for the user with `email`.
    ///
    /// The record starts with every capability off; the operator is then
    /// asked about each one and the result is inserted once.
    ///
    /// # Errors
    ///
    /// - `RecordError::UserNotFound` if no user has `email`
    /// - `RecordError::AdminAlreadyExists` if the user already has one
    /// - `RecordError::Cancelled` if the operator leaves mid-prompt (nothing
    ///   is written)
    /// - `RecordError::Store` on any other store failure
    #[instrument(skip(self, console))]
    pub async fn add<R: BufRead, W: Write>(
        &self,
        email: &str,
        console: &mut Console<R, W>,
    ) -> Result<Admin, RecordError> {
        let user = self.user(email).await?;

        if self.store.find_admin_by_user(user.id).await?.is_some() {
            warn!(user_id = %user.id, "user already has an admin record");
            return Err(RecordError::AdminAlreadyExists);
        }

        let mut admin = Admin::for_user(&user);
        console.collect_access(&mut admin.access)?;

        self.store.insert_admin(&admin).await.map_err(|e| match e {
            StoreError::Conflict(_) => RecordError::AdminAlreadyExists,
            other => RecordError::Store(other),
        })?;

        info!(admin_id = %admin.id, user_id = %user.id, "admin created");
        Ok(admin)
    }

    /// Delete the admin record for the user with `email`, along with the QR
    /// records it owns.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::AdminNotFound` if the user has no admin record
    /// (no delete is issued) or the delete removed nothing.
    #[instrument(skip(self))]
    pub async fn delete(&self, email: &str) -> Result<AdminRemoval, RecordError> {
        let user = self.user(email).await?;
        let admin = self
            .store
            .find_admin_by_user(user.id)
            .await?
            .ok_or(RecordError::AdminNotFound)?;

        let removal = self.store.delete_admin(admin.id).await?;
        if removal.admins == 0 {
            warn!(admin_id = %admin.id, "admin vanished before delete");
            return Err(RecordError::AdminNotFound);
        }

        info!(
            admin_id = %admin.id,
            qr_codes = removal.qr_codes,
            "admin deleted"
        );
        Ok(removal)
    }

    /// Re-prompt every capability of an existing admin.
    ///
    /// Prints the current details, asks about each field (an empty answer
    /// keeps the current value), writes the five fields and `updated_at`,
    /// then prints the details again.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::AdminNotFound` if the user has no admin record,
    /// and `RecordError::Cancelled` if the operator leaves mid-prompt.
    #[instrument(skip(self, console))]
    pub async fn modify<R: BufRead, W: Write>(
        &self,
        email: &str,
        console: &mut Console<R, W>,
    ) -> Result<Admin, RecordError> {
        let user = self.user(email).await?;
        let mut admin = self
            .store
            .find_admin_by_user(user.id)
            .await?
            .ok_or(RecordError::AdminNotFound)?;

        console.print(&render::admin_details(&user, &admin))?;
        console.collect_access(&mut admin.access)?;
        admin.timestamps.touch();

        if self.store.update_admin_access(&admin).await? == 0 {
            return Err(RecordError::AdminNotFound);
        }
        info!(admin_id = %admin.id, access = ?admin.access, "admin modified");

        console.print(&render::admin_details(&user, &admin))?;
        Ok(admin)
    }
}
