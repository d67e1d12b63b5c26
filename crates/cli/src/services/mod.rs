//! Record services: the operations behind every interpreter command.
//!
//! Each service borrows a [`Store`](crate::db::Store) and, where a command
//! needs operator input, a [`Console`](crate::console::Console) for the
//! duration of one call. Nothing is cached between calls.

pub mod admins;
pub mod flags;
pub mod whitelist;

use std::io;

use thiserror::Error;

use crate::console::PromptError;
use crate::db::StoreError;

pub use admins::AdminService;
pub use flags::FlagService;
pub use whitelist::{ImportSummary, WhitelistRow, WhitelistService, parse_whitelist};

/// Errors returned by record operations.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("user not found")]
    UserNotFound,

    #[error("admin not found")]
    AdminNotFound,

    #[error("admin already exists")]
    AdminAlreadyExists,

    #[error("flag '{0}' not found")]
    FlagNotFound(String),

    /// A whitelist row could not be parsed. `line` is 1-based and counts the
    /// header.
    #[error("line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operator left while being prompted.
    #[error("cancelled by user")]
    Cancelled,
}

impl From<PromptError> for RecordError {
    fn from(err: PromptError) -> Self {
        match err {
            PromptError::Cancelled => Self::Cancelled,
            PromptError::Io(e) => Self::Io(e),
        }
    }
}
