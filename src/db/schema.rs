//! Schema setup for the document store.
//!
//! The schema version is kept in SQLite's `user_version` pragma. Entry `n`
//! of [`MIGRATIONS`] takes the schema from version `n` to `n + 1`.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

const MIGRATIONS: &[(&str, &str)] = &[("documents", include_str!("migrations/001_documents.sql"))];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    require_json_functions(conn)?;

    let current = schema_version(conn)?;
    if current > MIGRATIONS.len() {
        bail!(
            "Database schema version {} is newer than this build understands ({})",
            current,
            MIGRATIONS.len()
        );
    }

    for (index, (name, sql)) in MIGRATIONS.iter().enumerate().skip(current) {
        let version = index + 1;
        tracing::info!("Applying migration {:03}: {}", version, name);

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .with_context(|| format!("Failed to apply migration {:03}: {}", version, name))?;
        tx.pragma_update(None, "user_version", i64::try_from(version)?)?;
        tx.commit()?;
    }

    Ok(())
}

fn schema_version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    usize::try_from(version).context("Negative schema version")
}

/// The store merges and queries through SQLite's JSON functions.
fn require_json_functions(conn: &Connection) -> Result<()> {
    conn.query_row("SELECT json_patch('{}', '{}')", [], |_| Ok(()))
        .context("SQLite was built without JSON functions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND tbl_name='documents'
                 AND name LIKE 'idx_documents_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(schema_version(&conn).unwrap(), MIGRATIONS.len());
    }

    #[test]
    fn rerunning_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn refuses_a_schema_from_a_newer_build() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 99).unwrap();
        let err = run_migrations(&conn).unwrap_err();
        assert!(err.to_string().contains("newer"));
    }
}
