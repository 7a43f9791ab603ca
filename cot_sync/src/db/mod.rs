//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - [`connection::connect_sqlite`]: opens the report database for concurrent readers and a single writer.
//! - Embedded Diesel migrations: [`migrate::run_sqlite`] applies pending migrations to a database file.
//!
//! Example:
//! ```no_run
//! use cot_sync::db::{migrate, connection};
//!
//! let db_path = std::env::temp_dir().join("cot_sync_example.db");
//! let db_path = db_path.to_string_lossy();
//! migrate::run_sqlite(&db_path).expect("migrations");
//!
//! let _conn = connection::connect_sqlite(&db_path).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
