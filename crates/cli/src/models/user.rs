//! Users, owned by the identity system and only ever read here.

use checkpoint_core::{Email, UserId};

use super::Timestamps;

/// A registered user an admin record can be attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub timestamps: Timestamps,
}
