//! Session modes.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a [`Mode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown mode '{0}' (expected admin, flag or whitelist)")]
pub struct ModeError(pub String);

/// Which record kind a session manages, and therefore which command table
/// it dispatches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// `add`, `delete`, `modify` on admin permission records.
    #[default]
    Admin,
    /// `see`, `set`, `reset` on feature flags.
    Flag,
    /// `add` imports the whitelist CSV.
    Whitelist,
}

impl Mode {
    /// Keyword used on the command line and in batch file names.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Flag => "flag",
            Self::Whitelist => "whitelist",
        }
    }

    /// Whether a batch file may target this mode.
    ///
    /// The whitelist table has no command that takes a per-line argument.
    #[must_use]
    pub const fn supports_batch(self) -> bool {
        matches!(self, Self::Admin | Self::Flag)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl std::str::FromStr for Mode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "flag" => Ok(Self::Flag),
            "whitelist" => Ok(Self::Whitelist),
            _ => Err(ModeError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_round_trip() {
        for mode in [Mode::Admin, Mode::Flag, Mode::Whitelist] {
            assert_eq!(mode.keyword().parse::<Mode>(), Ok(mode));
        }
    }

    #[test]
    fn test_keywords_are_exact() {
        assert!("Admin".parse::<Mode>().is_err());
        assert!("flags".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_default_is_admin() {
        assert_eq!(Mode::default(), Mode::Admin);
    }

    #[test]
    fn test_batch_support() {
        assert!(Mode::Admin.supports_batch());
        assert!(Mode::Flag.supports_batch());
        assert!(!Mode::Whitelist.supports_batch());
    }
}
