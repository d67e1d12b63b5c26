//! Feature flag operations.

use tracing::{info, instrument, warn};

use super::RecordError;
use crate::db::Store;
use crate::models::Flag;

/// Flag operations over a store.
pub struct FlagService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> FlagService<'a, S> {
    /// Create a new flag service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Turn a flag on.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::FlagNotFound` if no flag has this name; nothing
    /// is written in that case.
    pub async fn set(&self, name: &str) -> Result<(), RecordError> {
        self.write(name, true).await
    }

    /// Turn a flag off.
    ///
    /// # Errors
    ///
    /// See [`FlagService::set`].
    pub async fn reset(&self, name: &str) -> Result<(), RecordError> {
        self.write(name, false).await
    }

    #[instrument(skip(self))]
    async fn write(&self, name: &str, value: bool) -> Result<(), RecordError> {
        if !self.store.flag_exists(name).await? {
            warn!("unknown flag");
            return Err(RecordError::FlagNotFound(name.to_owned()));
        }

        // Unconditional write: setting a flag to its current value is fine.
        if self.store.write_flag(name, value).await? == 0 {
            return Err(RecordError::FlagNotFound(name.to_owned()));
        }

        info!("flag written");
        Ok(())
    }

    /// Every flag, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Store` if any row cannot be read; no partial
    /// listing is returned.
    pub async fn list(&self) -> Result<Vec<Flag>, RecordError> {
        Ok(self.store.list_flags().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Operation, StoreError};

    #[tokio::test]
    async fn test_set_and_reset_are_idempotent() {
        let store = MemoryStore::new();
        store.add_flag("registration_open", false);
        let flags = FlagService::new(&store);

        flags.set("registration_open").await.unwrap();
        flags.set("registration_open").await.unwrap();
        assert_eq!(store.flag("registration_open"), Some(true));

        flags.reset("registration_open").await.unwrap();
        assert_eq!(store.flag("registration_open"), Some(false));
        assert_eq!(store.writes().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_flag_is_never_written() {
        let store = MemoryStore::new();
        let flags = FlagService::new(&store);

        for result in [flags.set("ghost").await, flags.reset("ghost").await] {
            assert!(matches!(result, Err(RecordError::FlagNotFound(name)) if name == "ghost"));
        }
        assert!(store.writes().is_empty());
        assert_eq!(store.operations(), vec![Operation::FindFlag, Operation::FindFlag]);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_name() {
        let store = MemoryStore::new();
        store.add_flag("leaderboard", true);
        store.add_flag("checkin", false);

        let names: Vec<String> = FlagService::new(&store)
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["checkin", "leaderboard"]);
    }

    #[tokio::test]
    async fn test_list_failure_is_reported_whole() {
        let store = MemoryStore::new();
        store.add_flag("checkin", false);
        store.fail_on(Operation::ListFlags);

        let err = FlagService::new(&store).list().await.unwrap_err();
        assert!(matches!(err, RecordError::Store(StoreError::Unavailable(_))));
    }
}
