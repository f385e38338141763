use fieldkit_core::db::open_db_in_memory;
use fieldkit_core::{ProjectDirectory, SqliteProjectDirectory};
use rusqlite::{params, Connection};
use uuid::Uuid;

fn seed_project(conn: &Connection, name: &str, description: Option<&str>, created_at: i64) -> Uuid {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO projects (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4);",
        params![id.to_string(), name, description, created_at],
    )
    .unwrap();
    id
}

#[test]
fn exists_and_get_read_seeded_projects() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteProjectDirectory::try_new(&conn).unwrap();

    let id = seed_project(&conn, "Website relaunch", Some("Q3 push"), 1_000);

    assert!(directory.exists(id).unwrap());
    assert!(!directory.exists(Uuid::new_v4()).unwrap());

    let project = directory.get(id).unwrap().unwrap();
    assert_eq!(project.name, "Website relaunch");
    assert_eq!(project.description.as_deref(), Some("Q3 push"));

    assert!(directory.get(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn list_returns_projects_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteProjectDirectory::try_new(&conn).unwrap();

    let older = seed_project(&conn, "older", None, 1_000);
    let newer = seed_project(&conn, "newer", None, 2_000);

    let listed = directory.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer);
    assert_eq!(listed[1].id, older);
}
