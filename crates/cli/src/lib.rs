//! Checkpoint CLI - administration of admins, flags and the whitelist.
//!
//! The binary (`ckpt-cli`) is a thin wrapper; everything it runs lives here
//! so sessions can be driven against any [`db::Store`] and any console.
//!
//! # Modules
//!
//! - [`session`] - Argument decoding, interactive loop, batch files, exit codes
//! - [`commands`] - Command tables and the line dispatcher
//! - [`services`] - Admin, flag and whitelist operations
//! - [`console`] - Line input and the access prompt
//! - [`db`] - Store trait with `PostgreSQL` and in-memory implementations
//! - [`models`] - Records read and written by the services
//! - [`render`] - Admin detail and flag tables
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commands;
pub mod config;
pub mod console;
pub mod db;
pub mod models;
pub mod render;
pub mod services;
pub mod session;
