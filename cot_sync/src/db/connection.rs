//! Opening the report database.
//!
//! One process writes (the pipeline, under its run lock) while CLI read commands and
//! the [`crate::service::ReadService`] open their own connections at any time. Every
//! connection therefore runs in WAL mode so readers see the last committed upsert
//! instead of blocking, and waits up to [`BUSY_TIMEOUT_MS`] for the writer's
//! `BEGIN IMMEDIATE` to finish rather than failing with `SQLITE_BUSY`.
//!
//! ```no_run
//! use cot_sync::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("cot.db");
//! let _conn = connect_sqlite(&path.to_string_lossy()).expect("open report db");
//! ```

use anyhow::Context;
use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

/// How long a connection waits on a locked database.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Opens `database_url` and applies the connection-wide settings of the report store.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(database_url)?;

    let busy_timeout = format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS};");
    for pragma in ["PRAGMA journal_mode=WAL;", "PRAGMA foreign_keys=ON;", busy_timeout.as_str()] {
        sql_query(pragma)
            .execute(&mut conn)
            .with_context(|| format!("{pragma} on {database_url}"))?;
    }
    Ok(conn)
}
