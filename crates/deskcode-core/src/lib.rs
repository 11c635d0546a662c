//! `DeskCode` Core Library
//!
//! Shared functionality for `DeskCode` components:
//! - `SQLite` pool helpers and the shared `DatabaseError`
//! - Configuration resolution and hierarchy
//! - Tracing initialisation
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
