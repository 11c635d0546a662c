//! `DeskCode` Admin Server Library
//!
//! Core functionality for the `DeskCode` admin backend:
//! - SQLite storage for admin users, server profiles, config codes and usage
//! - Config-code engine: issuance, redemption, usage accounting, offline codes
//! - JWT authentication and password hashing
//! - Runtime-mutable system settings
//! - axum HTTP surface (client API and admin API)

pub mod auth;
pub mod engine;
pub mod http;
pub mod settings;
pub mod storage;
