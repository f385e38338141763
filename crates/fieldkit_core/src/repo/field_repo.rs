//! Field definition repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD plus the value-joined read projection over
//!   `project_custom_fields`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `FieldDefinition::validate()` before SQL mutations.
//! - A type-change update deletes the stale stored value in the same
//!   transaction that rewrites the definition.
//! - `UNIQUE(project_id, field_name)` backs the duplicate-name pre-check;
//!   a constraint rejection surfaces as `Conflict`.

use crate::db::DbError;
use crate::model::field::{
    DefinitionError, FieldDefinition, FieldId, FieldType, FieldWithValue, ProjectId, ValueId,
};
use crate::repo::{ensure_connection_ready, map_constraint_violation};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const FIELD_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    field_name,
    field_type,
    is_required,
    options,
    field_order
FROM project_custom_fields";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer error shared by the custom field repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Definition metadata failed invariant checks.
    Definition(DefinitionError),
    /// Underlying database failure.
    Db(DbError),
    /// No field row matched the requested (field, project) pair.
    FieldNotFound(FieldId),
    /// No value row matched the requested id.
    ValueNotFound(ValueId),
    /// A unique constraint rejected the write.
    Conflict(String),
    /// Persisted state failed to parse back into the domain model.
    InvalidData(String),
    /// Connection is not migrated to the supported schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing on this connection.
    MissingRequiredTable(&'static str),
    /// Required column is missing on this connection.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Definition(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::FieldNotFound(id) => {
                write!(f, "field {id} not found or does not belong to this project")
            }
            Self::ValueNotFound(id) => write!(f, "field value not found: {id}"),
            Self::Conflict(message) => write!(f, "conflicting write: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted field data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match supported {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Definition(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DefinitionError> for RepoError {
    fn from(value: DefinitionError) -> Self {
        Self::Definition(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for field definition storage.
pub trait FieldDefinitionRepository {
    /// Persists a new definition and returns its id.
    fn insert(&self, definition: &FieldDefinition) -> RepoResult<FieldId>;
    /// Rewrites an existing definition; when `drop_value` is set, the stored
    /// value for this field is deleted in the same transaction.
    fn update(&self, definition: &FieldDefinition, drop_value: bool) -> RepoResult<()>;
    /// Deletes the definition matched by both ids; stored values cascade.
    fn delete(&self, field_id: FieldId, project_id: ProjectId) -> RepoResult<()>;
    /// Gets one definition matched by both ids.
    fn get(&self, field_id: FieldId, project_id: ProjectId)
        -> RepoResult<Option<FieldDefinition>>;
    /// Finds a definition by exact name within a project.
    fn find_by_name(&self, project_id: ProjectId, name: &str)
        -> RepoResult<Option<FieldDefinition>>;
    /// Lists a project's definitions joined with their current values,
    /// ordered by `field_order` ascending with id as the tie-breaker.
    fn list_with_values(&self, project_id: ProjectId) -> RepoResult<Vec<FieldWithValue>>;
}

/// SQLite-backed field definition repository.
pub struct SqliteFieldRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFieldRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "project_custom_fields",
            &[
                "id",
                "project_id",
                "field_name",
                "field_type",
                "is_required",
                "options",
                "field_order",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl FieldDefinitionRepository for SqliteFieldRepository<'_> {
    fn insert(&self, definition: &FieldDefinition) -> RepoResult<FieldId> {
        definition.validate()?;
        let options = options_to_db(&definition.field_type)?;

        self.conn
            .execute(
                "INSERT INTO project_custom_fields (
                    id,
                    project_id,
                    field_name,
                    field_type,
                    is_required,
                    options,
                    field_order
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    definition.id.to_string(),
                    definition.project_id.to_string(),
                    definition.name.as_str(),
                    definition.field_type.tag(),
                    bool_to_int(definition.required),
                    options,
                    definition.order,
                ],
            )
            .map_err(|err| {
                map_constraint_violation(err, || {
                    format!(
                        "field `{}` already exists in project {}",
                        definition.name, definition.project_id
                    )
                })
            })?;

        Ok(definition.id)
    }

    fn update(&self, definition: &FieldDefinition, drop_value: bool) -> RepoResult<()> {
        definition.validate()?;
        let options = options_to_db(&definition.field_type)?;

        // Callers hold shared borrows of the connection, so the cascade runs
        // on an unchecked transaction; bootstrap never nests transactions.
        let tx = self.conn.unchecked_transaction()?;

        if drop_value {
            tx.execute(
                "DELETE FROM project_custom_field_values
                 WHERE field_id = ?1
                   AND project_id = ?2;",
                params![
                    definition.id.to_string(),
                    definition.project_id.to_string()
                ],
            )?;
        }

        let changed = tx
            .execute(
                "UPDATE project_custom_fields
                 SET
                    field_name = ?3,
                    field_type = ?4,
                    is_required = ?5,
                    options = ?6,
                    field_order = ?7,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND project_id = ?2;",
                params![
                    definition.id.to_string(),
                    definition.project_id.to_string(),
                    definition.name.as_str(),
                    definition.field_type.tag(),
                    bool_to_int(definition.required),
                    options,
                    definition.order,
                ],
            )
            .map_err(|err| {
                map_constraint_violation(err, || {
                    format!(
                        "field `{}` already exists in project {}",
                        definition.name, definition.project_id
                    )
                })
            })?;

        if changed == 0 {
            // Dropping the transaction rolls the value deletion back.
            return Err(RepoError::FieldNotFound(definition.id));
        }

        tx.commit()?;
        Ok(())
    }

    fn delete(&self, field_id: FieldId, project_id: ProjectId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM project_custom_fields
             WHERE id = ?1
               AND project_id = ?2;",
            params![field_id.to_string(), project_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::FieldNotFound(field_id));
        }

        Ok(())
    }

    fn get(
        &self,
        field_id: FieldId,
        project_id: ProjectId,
    ) -> RepoResult<Option<FieldDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FIELD_SELECT_SQL}
             WHERE id = ?1
               AND project_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![field_id.to_string(), project_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_field_row(row)?));
        }

        Ok(None)
    }

    fn find_by_name(
        &self,
        project_id: ProjectId,
        name: &str,
    ) -> RepoResult<Option<FieldDefinition>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FIELD_SELECT_SQL}
             WHERE project_id = ?1
               AND field_name = ?2;"
        ))?;

        let mut rows = stmt.query(params![project_id.to_string(), name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_field_row(row)?));
        }

        Ok(None)
    }

    fn list_with_values(&self, project_id: ProjectId) -> RepoResult<Vec<FieldWithValue>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                f.id,
                f.field_name,
                f.field_type,
                f.is_required,
                f.options,
                f.field_order,
                COALESCE(v.value, '') AS value
             FROM project_custom_fields f
             LEFT JOIN project_custom_field_values v
               ON v.field_id = f.id
              AND v.project_id = f.project_id
             WHERE f.project_id = ?1
             ORDER BY f.field_order ASC, f.id ASC;",
        )?;

        let mut rows = stmt.query([project_id.to_string()])?;
        let mut fields = Vec::new();

        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            fields.push(FieldWithValue {
                id: parse_uuid(&id_text, "project_custom_fields.id")?,
                name: row.get("field_name")?,
                field_type: field_type_from_row(
                    &row.get::<_, String>("field_type")?,
                    row.get("options")?,
                )?,
                required: parse_required(row.get("is_required")?)?,
                order: row.get("field_order")?,
                value: row.get("value")?,
            });
        }

        Ok(fields)
    }
}

fn parse_field_row(row: &Row<'_>) -> RepoResult<FieldDefinition> {
    let id_text: String = row.get("id")?;
    let project_text: String = row.get("project_id")?;

    Ok(FieldDefinition {
        id: parse_uuid(&id_text, "project_custom_fields.id")?,
        project_id: parse_uuid(&project_text, "project_custom_fields.project_id")?,
        name: row.get("field_name")?,
        field_type: field_type_from_row(&row.get::<_, String>("field_type")?, row.get("options")?)?,
        required: parse_required(row.get("is_required")?)?,
        order: row.get("field_order")?,
    })
}

/// Encodes select options as a JSON column value; non-select types store
/// NULL so the "options iff select" invariant holds at rest.
fn options_to_db(field_type: &FieldType) -> RepoResult<Option<String>> {
    match field_type.options() {
        Some(values) => serde_json::to_string(values).map(Some).map_err(|err| {
            RepoError::InvalidData(format!("options are not JSON-encodable: {err}"))
        }),
        None => Ok(None),
    }
}

fn field_type_from_row(tag: &str, options: Option<String>) -> RepoResult<FieldType> {
    if tag == "select" {
        let raw = options.ok_or_else(|| {
            RepoError::InvalidData("select field has no stored options".to_string())
        })?;
        let values: Vec<String> = serde_json::from_str(&raw).map_err(|err| {
            RepoError::InvalidData(format!("invalid options JSON `{raw}`: {err}"))
        })?;
        if values.is_empty() {
            return Err(RepoError::InvalidData(
                "select field has an empty stored option list".to_string(),
            ));
        }
        return Ok(FieldType::Select(values));
    }

    FieldType::from_parts(tag, None).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid field type `{tag}` in project_custom_fields.field_type"
        ))
    })
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_required(value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in is_required column"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
