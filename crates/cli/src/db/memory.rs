//! In-process implementation of [`Store`].
//!
//! Holds every table in memory and appends an [`Operation`] to a log for each
//! call, so callers can check exactly which statements a command issued.
//! Individual operations can be made to fail with [`MemoryStore::fail_on`].

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use checkpoint_core::{AdminId, Email, UserId};

use super::{AdminRemoval, Store, StoreError};
use crate::models::{Admin, Flag, Timestamps, User, WhitelistEntry};

/// A statement the store was asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindUser,
    FindAdmin,
    InsertAdmin,
    UpdateAdmin,
    DeleteQrCodes,
    DeleteAdmin,
    FindFlag,
    WriteFlag,
    ListFlags,
    FindWhitelistEntry,
    InsertWhitelistEntry,
}

impl Operation {
    /// Whether the operation mutates a table.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Self::InsertAdmin
                | Self::UpdateAdmin
                | Self::DeleteQrCodes
                | Self::DeleteAdmin
                | Self::WriteFlag
                | Self::InsertWhitelistEntry
        )
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    admins: Vec<Admin>,
    qr_codes: Vec<AdminId>,
    flags: BTreeMap<String, bool>,
    whitelist: Vec<WhitelistEntry>,
    log: Vec<Operation>,
    failing: HashSet<Operation>,
}

impl Tables {
    fn record(&mut self, op: Operation) -> Result<(), StoreError> {
        self.log.push(op);
        if self.failing.contains(&op) {
            return Err(StoreError::Unavailable(format!("{op:?} rejected")));
        }
        Ok(())
    }
}

/// Store that keeps all records in process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a user and return it.
    ///
    /// # Panics
    ///
    /// Panics if `email` is not a valid address; seeds are fixed test data.
    #[must_use = "the seeded user carries the generated id"]
    pub fn add_user(&self, email: &str, name: &str) -> User {
        let user = User {
            id: UserId::generate(),
            email: Email::parse(email).expect("seed email must be valid"),
            name: name.to_owned(),
            timestamps: Timestamps::now(),
        };
        self.tables().users.push(user.clone());
        user
    }

    /// Seed an admin row.
    pub fn add_admin(&self, admin: Admin) {
        self.tables().admins.push(admin);
    }

    /// Seed a QR record owned by an admin.
    pub fn add_qr_code(&self, admin_id: AdminId) {
        self.tables().qr_codes.push(admin_id);
    }

    /// Seed a flag.
    pub fn add_flag(&self, name: &str, value: bool) {
        self.tables().flags.insert(name.to_owned(), value);
    }

    /// Seed a whitelist entry.
    pub fn add_whitelist_entry(&self, entry: WhitelistEntry) {
        self.tables().whitelist.push(entry);
    }

    /// Make every future call of `op` fail with `StoreError::Unavailable`.
    pub fn fail_on(&self, op: Operation) {
        self.tables().failing.insert(op);
    }

    /// Current admin rows.
    #[must_use]
    pub fn admins(&self) -> Vec<Admin> {
        self.tables().admins.clone()
    }

    /// Admin row for a user, if any.
    #[must_use]
    pub fn admin_for(&self, user_id: UserId) -> Option<Admin> {
        self.tables()
            .admins
            .iter()
            .find(|a| a.user_id == user_id)
            .cloned()
    }

    /// Number of QR records owned by an admin.
    #[must_use]
    pub fn qr_code_count(&self, admin_id: AdminId) -> usize {
        self.tables()
            .qr_codes
            .iter()
            .filter(|id| **id == admin_id)
            .count()
    }

    /// Current value of a flag.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.tables().flags.get(name).copied()
    }

    /// Current whitelist entries in insertion order.
    #[must_use]
    pub fn whitelist(&self) -> Vec<WhitelistEntry> {
        self.tables().whitelist.clone()
    }

    /// Every operation issued so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.tables().log.clone()
    }

    /// Mutating operations issued so far, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<Operation> {
        self.tables()
            .log
            .iter()
            .copied()
            .filter(|op| op.is_write())
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::FindUser)?;
        Ok(tables.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn find_admin_by_user(&self, user_id: UserId) -> Result<Option<Admin>, StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::FindAdmin)?;
        Ok(tables.admins.iter().find(|a| a.user_id == user_id).cloned())
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::InsertAdmin)?;
        if tables.admins.iter().any(|a| a.user_id == admin.user_id) {
            return Err(StoreError::Conflict(
                "user already has an admin record".to_owned(),
            ));
        }
        tables.admins.push(admin.clone());
        Ok(())
    }

    async fn update_admin_access(&self, admin: &Admin) -> Result<u64, StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::UpdateAdmin)?;
        let mut updated = 0;
        for row in tables.admins.iter_mut().filter(|a| a.user_id == admin.user_id) {
            row.access = admin.access;
            row.timestamps.updated_at = admin.timestamps.updated_at;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_admin(&self, admin_id: AdminId) -> Result<AdminRemoval, StoreError> {
        let mut tables = self.tables();

        tables.record(Operation::DeleteQrCodes)?;
        let before = tables.qr_codes.len();
        tables.qr_codes.retain(|id| *id != admin_id);
        let qr_codes = (before - tables.qr_codes.len()) as u64;

        tables.record(Operation::DeleteAdmin)?;
        let before = tables.admins.len();
        tables.admins.retain(|a| a.id != admin_id);
        let admins = (before - tables.admins.len()) as u64;

        Ok(AdminRemoval { qr_codes, admins })
    }

    async fn flag_exists(&self, name: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::FindFlag)?;
        Ok(tables.flags.contains_key(name))
    }

    async fn write_flag(&self, name: &str, value: bool) -> Result<u64, StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::WriteFlag)?;
        Ok(tables
            .flags
            .get_mut(name)
            .map_or(0, |slot| {
                *slot = value;
                1
            }))
    }

    async fn list_flags(&self) -> Result<Vec<Flag>, StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::ListFlags)?;
        Ok(tables
            .flags
            .iter()
            .map(|(name, value)| Flag {
                name: name.clone(),
                value: *value,
            })
            .collect())
    }

    async fn find_whitelist_entry(
        &self,
        email: &str,
    ) -> Result<Option<WhitelistEntry>, StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::FindWhitelistEntry)?;
        Ok(tables.whitelist.iter().find(|e| e.email == email).cloned())
    }

    async fn insert_whitelist_entry(&self, entry: &WhitelistEntry) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.record(Operation::InsertWhitelistEntry)?;
        if tables.whitelist.iter().any(|e| e.email == entry.email) {
            return Err(StoreError::Conflict(format!(
                "whitelist already contains {}",
                entry.email
            )));
        }
        tables.whitelist.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_operations_are_logged_in_order() {
        let store = MemoryStore::new();
        let user = store.add_user("a@b.com", "A");
        store.find_user_by_email(&user.email).await.unwrap();
        store.find_admin_by_user(user.id).await.unwrap();
        assert_eq!(
            store.operations(),
            vec![Operation::FindUser, Operation::FindAdmin]
        );
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_fail_on_rejects_and_still_logs() {
        let store = MemoryStore::new();
        store.add_flag("beta", false);
        store.fail_on(Operation::ListFlags);
        let err = store.list_flags().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.operations(), vec![Operation::ListFlags]);
    }

    #[tokio::test]
    async fn test_delete_admin_removes_qr_codes_first() {
        let store = MemoryStore::new();
        let user = store.add_user("a@b.com", "A");
        let admin = Admin::for_user(&user);
        store.add_admin(admin.clone());
        store.add_qr_code(admin.id);
        store.add_qr_code(admin.id);

        let removal = store.delete_admin(admin.id).await.unwrap();

        assert_eq!(removal, AdminRemoval { qr_codes: 2, admins: 1 });
        assert_eq!(
            store.writes(),
            vec![Operation::DeleteQrCodes, Operation::DeleteAdmin]
        );
        assert_eq!(store.qr_code_count(admin.id), 0);
        assert!(store.admins().is_empty());
    }

    #[tokio::test]
    async fn test_insert_admin_enforces_one_per_user() {
        let store = MemoryStore::new();
        let user = store.add_user("a@b.com", "A");
        store.insert_admin(&Admin::for_user(&user)).await.unwrap();
        let err = store.insert_admin(&Admin::for_user(&user)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.admins().len(), 1);
    }

    #[tokio::test]
    async fn test_write_flag_reports_missing_rows() {
        let store = MemoryStore::new();
        assert_eq!(store.write_flag("ghost", true).await.unwrap(), 0);
        assert_eq!(store.flag("ghost"), None);
    }
}
