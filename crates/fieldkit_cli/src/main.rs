//! CLI smoke flow for the fieldkit core crate.
//!
//! # Responsibility
//! - Exercise the define-validate-save-read path against an in-memory
//!   database, standing in for the external project manager.
//! - Keep output readable for quick local sanity checks.

use fieldkit_core::db::open_db_in_memory;
use fieldkit_core::{
    CreateFieldRequest, FieldPatch, FieldService, ProjectId, SqliteFieldRepository,
    SqliteProjectDirectory, SqliteValueRepository, ValueInput, ValueService,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn main() {
    if let Err(err) = run() {
        eprintln!("fieldkit smoke flow failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = std::env::temp_dir().join("fieldkit-logs");
    if let Err(err) = fieldkit_core::init_logging(
        fieldkit_core::default_log_level(),
        &log_dir.to_string_lossy(),
    ) {
        eprintln!("logging disabled: {err}");
    }

    println!("fieldkit_core version={}", fieldkit_core::core_version());

    let conn = open_db_in_memory()?;
    let project_id = seed_project(&conn, "Website relaunch")?;

    let fields = FieldService::new(
        SqliteProjectDirectory::try_new(&conn)?,
        SqliteFieldRepository::try_new(&conn)?,
    );

    let start_date = fields.create(
        project_id,
        &CreateFieldRequest {
            required: true,
            ..CreateFieldRequest::new("Start Date", "date")
        },
    )?;
    let status = fields.create(
        project_id,
        &CreateFieldRequest {
            options: Some(vec!["Open".to_string(), "Closed".to_string()]),
            order: 1,
            ..CreateFieldRequest::new("Status", "select")
        },
    )?;
    let budget = fields.create(
        project_id,
        &CreateFieldRequest {
            order: 2,
            ..CreateFieldRequest::new("Budget", "number")
        },
    )?;
    println!("defined fields: Start Date (date), Status (select), Budget (number)");

    let values = ValueService::new(
        SqliteFieldRepository::try_new(&conn)?,
        SqliteValueRepository::try_new(&conn)?,
    );
    let summary = values.save_many(
        project_id,
        &[
            ValueInput {
                field_id: start_date.id,
                value: "2026-08-04".to_string(),
            },
            ValueInput {
                field_id: status.id,
                value: "Open".to_string(),
            },
            ValueInput {
                field_id: budget.id,
                value: "not-a-number".to_string(),
            },
        ],
    );
    println!("save summary: {}", serde_json::to_string_pretty(&summary)?);

    // Turn the select into plain text: its stored value and options go away.
    fields.update(
        status.id,
        project_id,
        &FieldPatch {
            field_type: Some("text".to_string()),
            ..FieldPatch::default()
        },
    )?;

    let listed = fields.list_with_values(project_id)?;
    println!("fields with values: {}", serde_json::to_string_pretty(&listed)?);

    Ok(())
}

// The smoke flow stands in for the external project manager, which owns
// the projects table.
fn seed_project(conn: &Connection, name: &str) -> Result<ProjectId, rusqlite::Error> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO projects (id, name) VALUES (?1, ?2);",
        params![id.to_string(), name],
    )?;
    Ok(id)
}
