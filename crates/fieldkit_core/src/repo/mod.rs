//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data access contract per entity (definitions, values,
//!   projects) so the services stay storage-agnostic.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths enforce `FieldDefinition::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - SQLite constructors verify the connection is migrated and carries the
//!   tables/columns they touch.

use crate::db::migrations::latest_version;
use rusqlite::Connection;

pub mod field_repo;
pub mod project_dir;
pub mod value_repo;

use self::field_repo::{RepoError, RepoResult};

/// Verifies that `conn` is migrated and exposes `table` with `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected = latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }
    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

/// Translates a unique-constraint rejection into a `Conflict` error; every
/// other SQLite failure passes through unchanged.
pub(crate) fn map_constraint_violation(
    err: rusqlite::Error,
    conflict: impl FnOnce() -> String,
) -> RepoError {
    if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
        RepoError::Conflict(conflict())
    } else {
        err.into()
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
