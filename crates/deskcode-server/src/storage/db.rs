//! SQLite database handle for the admin server.

pub use deskcode_core::db::DatabaseError;

deskcode_core::define_database!(AdminDatabase, "Admin database migrations complete");
