//! Core types for Checkpoint.
//!
//! This module provides type-safe wrappers for the domain concepts the
//! command interpreter works with.

pub mod access;
pub mod email;
pub mod id;
pub mod mode;

pub use access::{AccessField, AccessSet, Decision};
pub use email::{Email, EmailError};
pub use id::*;
pub use mode::{Mode, ModeError};
