//! Read-only project directory contract and SQLite implementation.
//!
//! The `projects` table is owned by the external project manager. This
//! core checks existence and reads records; it never writes.

use crate::model::field::ProjectId;
use crate::model::project::Project;
use crate::repo::ensure_connection_ready;
use crate::repo::field_repo::{parse_uuid, RepoResult};
use rusqlite::{Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description
FROM projects";

/// Directory of projects owned by an external collaborator.
pub trait ProjectDirectory {
    /// Returns whether a project with this id exists.
    fn exists(&self, project_id: ProjectId) -> RepoResult<bool>;
    /// Gets one project by id.
    fn get(&self, project_id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists all projects, newest first.
    fn list(&self) -> RepoResult<Vec<Project>>;
}

/// SQLite-backed read view over the external `projects` table.
pub struct SqliteProjectDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectDirectory<'conn> {
    /// Constructs a directory from a migrated, ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "projects", &["id", "name", "description"])?;
        Ok(Self { conn })
    }
}

impl ProjectDirectory for SqliteProjectDirectory<'_> {
    fn exists(&self, project_id: ProjectId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM projects
                WHERE id = ?1
            );",
            [project_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get(&self, project_id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE id = ?1;"
        ))?;

        let mut rows = stmt.query([project_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }

        Ok(None)
    }

    fn list(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             ORDER BY created_at DESC, id ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }

        Ok(projects)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    Ok(Project {
        id: parse_uuid(&id_text, "projects.id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}
