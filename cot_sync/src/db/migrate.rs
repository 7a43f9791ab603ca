//! Embedded schema migrations.
//!
//! Each migration directory is applied at most once, in version order, and recorded
//! in `__diesel_schema_migrations`. Migrations only ever add tables, nullable
//! columns, or indexes.

use anyhow::anyhow;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending migrations on the SQLite database at `url`.
///
/// Returns the versions applied by this call; empty when the schema was current.
pub fn run_sqlite(url: &str) -> anyhow::Result<Vec<String>> {
    let mut conn = SqliteConnection::establish(url)?;
    conn.batch_execute("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
    run_pending(&mut conn)
}

/// Runs pending migrations on an open connection.
pub fn run_pending(conn: &mut SqliteConnection) -> anyhow::Result<Vec<String>> {
    let applied: Vec<String> = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?
        .into_iter()
        .map(|v| v.to_string())
        .collect();
    if !applied.is_empty() {
        info!(versions = ?applied, "applied migrations");
    }
    Ok(applied)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        let first = run_sqlite(&path).expect("first run");
        assert_eq!(first.len(), 2);
        let second = run_sqlite(&path).expect("second run");
        assert!(second.is_empty());

        let mut conn = SqliteConnection::establish(&path).unwrap();
        conn.batch_execute(
            "INSERT INTO download_ledger (report_type, sub_type, year, row_count, ingested_at) \
             VALUES ('legacy', 'fo', 2024, 10, '2024-12-31T00:00:00Z')",
        )
        .unwrap();
    }
}
