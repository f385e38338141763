use fieldkit_core::db::open_db_in_memory;
use fieldkit_core::{
    CreateFieldRequest, FieldDefinition, FieldDefinitionRepository, FieldService, FieldType,
    ProjectId, SqliteFieldRepository, SqliteProjectDirectory, SqliteValueRepository, ValueInput,
    ValueService, ValueServiceError,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn seed_project(conn: &Connection) -> ProjectId {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO projects (id, name) VALUES (?1, ?2);",
        params![id.to_string(), "demo project"],
    )
    .unwrap();
    id
}

fn field_service(
    conn: &Connection,
) -> FieldService<SqliteProjectDirectory<'_>, SqliteFieldRepository<'_>> {
    FieldService::new(
        SqliteProjectDirectory::try_new(conn).unwrap(),
        SqliteFieldRepository::try_new(conn).unwrap(),
    )
}

fn value_service(
    conn: &Connection,
) -> ValueService<SqliteFieldRepository<'_>, SqliteValueRepository<'_>> {
    ValueService::new(
        SqliteFieldRepository::try_new(conn).unwrap(),
        SqliteValueRepository::try_new(conn).unwrap(),
    )
}

fn stored_value_rows(conn: &Connection, field_id: Uuid) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT value FROM project_custom_field_values WHERE field_id = ?1;")
        .unwrap();
    let rows = stmt
        .query_map([field_id.to_string()], |row| row.get::<_, String>(0))
        .unwrap();
    rows.map(Result::unwrap).collect()
}

#[test]
fn required_date_field_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let project_id = seed_project(&conn);
    let fields = field_service(&conn);
    let values = value_service(&conn);

    let field = fields
        .create(
            project_id,
            &CreateFieldRequest {
                required: true,
                ..CreateFieldRequest::new("Start Date", "date")
            },
        )
        .unwrap();
    assert_eq!(field.field_type, FieldType::Date);

    let err = values
        .save_one(field.id, project_id, "2024-13-40")
        .unwrap_err();
    assert!(matches!(err, ValueServiceError::Value(_)));
    assert!(err.to_string().contains("YYYY-MM-DD"));

    let err = values.save_one(field.id, project_id, "  ").unwrap_err();
    assert!(err.to_string().contains("required"));

    let saved = values.save_one(field.id, project_id, "2024-05-01").unwrap();
    assert_eq!(saved.value, "2024-05-01");
    assert_eq!(stored_value_rows(&conn, field.id), vec!["2024-05-01"]);
}

#[test]
fn select_field_rejects_unknown_option() {
    let conn = open_db_in_memory().unwrap();
    let project_id = seed_project(&conn);
    let fields = field_service(&conn);
    let values = value_service(&conn);

    let field = fields
        .create(
            project_id,
            &CreateFieldRequest {
                options: Some(vec!["Open".to_string(), "Closed".to_string()]),
                ..CreateFieldRequest::new("Status", "select")
            },
        )
        .unwrap();

    let err = values.save_one(field.id, project_id, "Pending").unwrap_err();
    assert!(err.to_string().contains("allowed: Open, Closed"));

    let saved = values.save_one(field.id, project_id, "Open").unwrap();
    assert_eq!(saved.value, "Open");
}

#[test]
fn save_one_updates_the_existing_row_in_place() {
    let conn = open_db_in_memory().unwrap();
    let project_id = seed_project(&conn);
    let fields = field_service(&conn);
    let values = value_service(&conn);

    let field = fields
        .create(project_id, &CreateFieldRequest::new("Budget", "number"))
        .unwrap();

    let first = values.save_one(field.id, project_id, "100").unwrap();
    let second = values.save_one(field.id, project_id, "250").unwrap();

    // Same row identity, new content, still exactly one row.
    assert_eq!(second.id, first.id);
    assert_eq!(second.value, "250");
    assert_eq!(stored_value_rows(&conn, field.id), vec!["250"]);
}

#[test]
fn save_one_is_idempotent_on_value_content() {
    let conn = open_db_in_memory().unwrap();
    let project_id = seed_project(&conn);
    let fields = field_service(&conn);
    let values = value_service(&conn);

    let field = fields
        .create(project_id, &CreateFieldRequest::new("Budget", "number"))
        .unwrap();

    values.save_one(field.id, project_id, "100").unwrap();
    values.save_one(field.id, project_id, "100").unwrap();

    assert_eq!(stored_value_rows(&conn, field.id), vec!["100"]);
}

#[test]
fn optional_blank_value_is_stored_as_given() {
    let conn = open_db_in_memory().unwrap();
    let project_id = seed_project(&conn);
    let fields = field_service(&conn);
    let values = value_service(&conn);

    let field = fields
        .create(project_id, &CreateFieldRequest::new("Budget", "number"))
        .unwrap();

    let saved = values.save_one(field.id, project_id, "  ").unwrap();
    assert_eq!(saved.value, "  ");
}

#[test]
fn save_one_rejects_unknown_field_and_wrong_project() {
    let conn = open_db_in_memory().unwrap();
    let project_a = seed_project(&conn);
    let project_b = seed_project(&conn);
    let fields = field_service(&conn);
    let values = value_service(&conn);

    let err = values
        .save_one(Uuid::new_v4(), project_a, "x")
        .unwrap_err();
    assert!(matches!(err, ValueServiceError::FieldNotFound(_)));

    let field = fields
        .create(project_a, &CreateFieldRequest::new("Notes", "text"))
        .unwrap();
    let err = values.save_one(field.id, project_b, "x").unwrap_err();
    assert!(matches!(err, ValueServiceError::FieldNotFound(id) if id == field.id));
}

#[test]
fn save_many_reports_partial_failures_without_aborting() {
    let conn = open_db_in_memory().unwrap();
    let project_id = seed_project(&conn);
    let fields = field_service(&conn);
    let values = value_service(&conn);

    let field_a = fields
        .create(project_id, &CreateFieldRequest::new("Headcount", "number"))
        .unwrap();
    let field_b = fields
        .create(project_id, &CreateFieldRequest::new("Budget", "number"))
        .unwrap();
    let field_c = fields
        .create(project_id, &CreateFieldRequest::new("Notes", "text"))
        .unwrap();

    let summary = values.save_many(
        project_id,
        &[
            ValueInput {
                field_id: field_a.id,
                value: "5".to_string(),
            },
            ValueInput {
                field_id: field_b.id,
                value: "not-a-number".to_string(),
            },
            ValueInput {
                field_id: field_c.id,
                value: "processed after the failure".to_string(),
            },
        ],
    );

    assert_eq!(summary.succeeded.len(), 2);
    assert_eq!(summary.succeeded[0].field_id, field_a.id);
    assert_eq!(summary.succeeded[1].field_id, field_c.id);

    let failed = summary.failed.expect("one item should have failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].field_id, field_b.id);
    assert!(failed[0].reason.contains("expects a number"));
}

#[test]
fn save_many_omits_failed_when_everything_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let project_id = seed_project(&conn);
    let fields = field_service(&conn);
    let values = value_service(&conn);

    let field = fields
        .create(project_id, &CreateFieldRequest::new("Notes", "text"))
        .unwrap();

    let summary = values.save_many(
        project_id,
        &[ValueInput {
            field_id: field.id,
            value: "all good".to_string(),
        }],
    );

    assert_eq!(summary.succeeded.len(), 1);
    assert!(summary.failed.is_none());

    // The wire shape omits the key entirely rather than sending null.
    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("failed").is_none());
}

#[test]
fn list_with_values_is_ordered_and_defaults_to_empty() {
    let conn = open_db_in_memory().unwrap();
    let project_id = seed_project(&conn);
    let values = value_service(&conn);
    let repo = SqliteFieldRepository::try_new(&conn).unwrap();

    // Fixed ids make the order tie-break deterministic.
    let first_of_tie = FieldDefinition {
        id: Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap(),
        project_id,
        name: "Tie A".to_string(),
        field_type: FieldType::Text,
        required: false,
        order: 1,
    };
    let second_of_tie = FieldDefinition {
        id: Uuid::parse_str("00000000-0000-4000-8000-000000000002").unwrap(),
        project_id,
        name: "Tie B".to_string(),
        field_type: FieldType::Text,
        required: false,
        order: 1,
    };
    let last = FieldDefinition {
        id: Uuid::parse_str("00000000-0000-4000-8000-000000000003").unwrap(),
        project_id,
        name: "Last".to_string(),
        field_type: FieldType::Number,
        required: false,
        order: 5,
    };
    repo.insert(&last).unwrap();
    repo.insert(&second_of_tie).unwrap();
    repo.insert(&first_of_tie).unwrap();

    values
        .save_one(second_of_tie.id, project_id, "filled")
        .unwrap();

    let listed = field_service(&conn).list_with_values(project_id).unwrap();
    let names: Vec<&str> = listed.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(names, ["Tie A", "Tie B", "Last"]);

    assert_eq!(listed[0].value, "");
    assert_eq!(listed[1].value, "filled");
    assert_eq!(listed[2].value, "");
}

#[test]
fn list_with_values_for_unknown_project_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let service = field_service(&conn);

    let listed = service.list_with_values(Uuid::new_v4()).unwrap();
    assert!(listed.is_empty());
}
