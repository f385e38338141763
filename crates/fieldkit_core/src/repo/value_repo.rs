//! Field value repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist at most one value row per (field, project) pair.
//!
//! # Invariants
//! - `UNIQUE(field_id, project_id)` backs the one-row invariant; a
//!   constraint rejection surfaces as `Conflict`.
//! - Updates keep the row identity; only `value` and `updated_at` change.

use crate::model::field::{FieldId, FieldValue, ProjectId, ValueId};
use crate::repo::field_repo::{parse_uuid, RepoError, RepoResult};
use crate::repo::{ensure_connection_ready, map_constraint_violation};
use rusqlite::{params, Connection, Row};

const VALUE_SELECT_SQL: &str = "SELECT
    id,
    field_id,
    project_id,
    value
FROM project_custom_field_values";

/// Repository interface for stored field values.
pub trait FieldValueRepository {
    /// Gets the stored value for one (field, project) pair.
    fn get(&self, field_id: FieldId, project_id: ProjectId) -> RepoResult<Option<FieldValue>>;
    /// Persists a new value row and returns its id.
    fn insert(&self, value: &FieldValue) -> RepoResult<ValueId>;
    /// Replaces the stored string of an existing value row.
    fn update(&self, value: &FieldValue) -> RepoResult<()>;
}

/// SQLite-backed field value repository.
pub struct SqliteValueRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteValueRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "project_custom_field_values",
            &["id", "field_id", "project_id", "value"],
        )?;
        Ok(Self { conn })
    }
}

impl FieldValueRepository for SqliteValueRepository<'_> {
    fn get(&self, field_id: FieldId, project_id: ProjectId) -> RepoResult<Option<FieldValue>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VALUE_SELECT_SQL}
             WHERE field_id = ?1
               AND project_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![field_id.to_string(), project_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_value_row(row)?));
        }

        Ok(None)
    }

    fn insert(&self, value: &FieldValue) -> RepoResult<ValueId> {
        self.conn
            .execute(
                "INSERT INTO project_custom_field_values (
                    id,
                    field_id,
                    project_id,
                    value
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    value.id.to_string(),
                    value.field_id.to_string(),
                    value.project_id.to_string(),
                    value.value.as_str(),
                ],
            )
            .map_err(|err| {
                map_constraint_violation(err, || {
                    format!(
                        "value already exists for field {} in project {}",
                        value.field_id, value.project_id
                    )
                })
            })?;

        Ok(value.id)
    }

    fn update(&self, value: &FieldValue) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE project_custom_field_values
             SET
                value = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![value.id.to_string(), value.value.as_str()],
        )?;

        if changed == 0 {
            return Err(RepoError::ValueNotFound(value.id));
        }

        Ok(())
    }
}

fn parse_value_row(row: &Row<'_>) -> RepoResult<FieldValue> {
    let id_text: String = row.get("id")?;
    let field_text: String = row.get("field_id")?;
    let project_text: String = row.get("project_id")?;

    Ok(FieldValue {
        id: parse_uuid(&id_text, "project_custom_field_values.id")?,
        field_id: parse_uuid(&field_text, "project_custom_field_values.field_id")?,
        project_id: parse_uuid(&project_text, "project_custom_field_values.project_id")?,
        value: row.get("value")?,
    })
}
