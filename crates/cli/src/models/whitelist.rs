//! Whitelist pre-approval entries.

use checkpoint_core::WhitelistId;

/// Pre-approval record keyed by email.
///
/// The email is kept as imported. Whitelist files come from outside and
/// only need a non-empty third column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub id: WhitelistId,
    pub name: String,
    pub email: String,
}

impl WhitelistEntry {
    /// A new entry with a freshly generated id.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: WhitelistId::generate(),
            name: name.into(),
            email: email.into(),
        }
    }
}
