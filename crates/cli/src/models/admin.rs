//! Admin permission records.

use checkpoint_core::{AccessSet, AdminId, UserId};

use super::{Timestamps, User};

/// Binds one user to five independent access capabilities.
///
/// At most one admin exists per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: AdminId,
    pub user_id: UserId,
    pub access: AccessSet,
    pub timestamps: Timestamps,
}

impl Admin {
    /// A new admin for `user` with every capability off.
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            id: AdminId::generate(),
            user_id: user.id,
            access: AccessSet::default(),
            timestamps: Timestamps::now(),
        }
    }
}
