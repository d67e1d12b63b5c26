//! Domain records read and written by the command interpreter.
//!
//! These are request-scoped copies: every command re-reads what it needs
//! from the store and nothing is cached between commands.

pub mod admin;
pub mod flag;
pub mod user;
pub mod whitelist;

use chrono::{DateTime, Utc};

pub use admin::Admin;
pub use flag::Flag;
pub use user::User;
pub use whitelist::WhitelistEntry;

/// Creation and last-update times carried by users and admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Both timestamps set to the current time.
    #[must_use]
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the record as updated now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
