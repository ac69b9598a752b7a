use rusqlite::{Connection, OptionalExtension, params};

/// Runs pending schema migrations.
///
/// Version 1 creates the key/value table used for quiz snapshots.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    fn is_applied(conn: &Connection, version: i64) -> rusqlite::Result<bool> {
        let row = conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                params![version],
                |_| Ok(()),
            )
            .optional()?;
        Ok(row.is_some())
    }

    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );
        ",
    )?;

    // Version 1: key/value entries.
    if !is_applied(conn, 1)? {
        conn.execute_batch(
            r"
            BEGIN;
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            INSERT INTO schema_migrations (version, applied_at) VALUES (1, datetime('now'));
            COMMIT;
            ",
        )?;
    }

    Ok(())
}
