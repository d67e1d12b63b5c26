//! Checkpoint Core - Shared types library.
//!
//! This crate provides the types shared by the Checkpoint command-line tools:
//! - `cli` - Interactive and batch administration of admins, flags and the whitelist
//! - `integration-tests` - End-to-end session tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. The
//! `postgres` feature adds `sqlx` encode/decode support so the types can be
//! bound directly as query parameters.
//!
//! # Modules
//!
//! - [`types`] - Email addresses, typed identifiers, access fields and session modes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
