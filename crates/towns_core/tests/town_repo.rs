use rusqlite::Connection;
use towns_core::db::migrations::latest_version;
use towns_core::db::{open_db_in_memory, DbError};
use towns_core::{
    InMemoryTownRepository, RepoError, SqliteTownRepository, TownRepository,
    TownValidationError,
};

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTownRepository::try_new(&conn).unwrap();

    let created = repo.create_town("Sofia", 1_200_000).unwrap();
    assert_eq!(created.id, 1);

    let loaded = repo.get_town(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(repo.get_town(created.id + 1).unwrap().is_none());
}

#[test]
fn create_stores_lowercase_name_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTownRepository::try_new(&conn).unwrap();

    let created = repo.create_town("Stara Zagora", 130).unwrap();

    let (name, name_key): (String, String) = conn
        .query_row(
            "SELECT name, name_key FROM towns WHERE id = ?1;",
            [created.id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(name, "Stara Zagora");
    assert_eq!(name_key, "stara zagora");
}

#[test]
fn create_duplicate_name_returns_duplicate_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTownRepository::try_new(&conn).unwrap();

    repo.create_town("Varna", 50).unwrap();
    let err = repo.create_town("VARNA", 60).unwrap_err();

    assert!(matches!(err, RepoError::DuplicateName(name) if name == "VARNA"));
    assert_eq!(repo.list_towns().unwrap().len(), 1);
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTownRepository::try_new(&conn).unwrap();

    let err = repo.create_town("AB", 10).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TownValidationError::InvalidName)
    ));

    let town = repo.create_town("Burgas", 10).unwrap();
    let err = repo.update_population(town.id, 0).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TownValidationError::NonPositivePopulation)
    ));
    assert_eq!(repo.get_town(town.id).unwrap().unwrap().population, 10);
}

#[test]
fn update_and_delete_not_found_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTownRepository::try_new(&conn).unwrap();

    let err = repo.update_population(42, 10).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(42)));

    let err = repo.delete_town(42).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(42)));
}

#[test]
fn list_is_ordered_by_insertion() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTownRepository::try_new(&conn).unwrap();

    for (name, population) in [("Vratsa", 3), ("Aytos", 1), ("Montana", 2)] {
        repo.create_town(name, population).unwrap();
    }

    let names: Vec<_> = repo
        .list_towns()
        .unwrap()
        .into_iter()
        .map(|town| town.name)
        .collect();
    assert_eq!(names, ["Vratsa", "Aytos", "Montana"]);
}

#[test]
fn clear_towns_resets_id_sequence() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTownRepository::try_new(&conn).unwrap();

    repo.create_town("Sofia", 1).unwrap();
    let varna = repo.create_town("Varna", 2).unwrap();
    repo.delete_town(varna.id).unwrap();
    assert_eq!(repo.create_town("Lom", 3).unwrap().id, 3);

    repo.clear_towns().unwrap();
    assert!(repo.list_towns().unwrap().is_empty());
    assert_eq!(repo.create_town("Lom", 3).unwrap().id, 1);
}

#[test]
fn read_path_rejects_invalid_persisted_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO towns (name, name_key, population) VALUES ('X', 'x', 5);",
        [],
    )
    .unwrap();
    let repo = SqliteTownRepository::try_new(&conn).unwrap();

    let err = repo.list_towns().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn population_check_constraint_guards_table() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO towns (name, name_key, population) VALUES ('Sofia', 'sofia', 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteTownRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_newer_schema_version() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();

    let result = SqliteTownRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::Db(DbError::UnsupportedSchemaVersion {
            db_version: 999,
            ..
        }))
    ));
}

#[test]
fn repository_rejects_connection_without_required_towns_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTownRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("towns"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_towns_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE towns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            population INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTownRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "towns",
            column: "name_key"
        })
    ));
}

#[test]
fn memory_repository_matches_sqlite_contract() {
    let repo = InMemoryTownRepository::new();

    let sofia = repo.create_town("Sofia", 100).unwrap();
    let varna = repo.create_town("Varna", 50).unwrap();
    assert_eq!((sofia.id, varna.id), (1, 2));

    assert_eq!(repo.find_town_by_name("SOFIA").unwrap(), Some(sofia.clone()));
    repo.update_population(sofia.id, 150).unwrap();
    assert_eq!(repo.get_town(sofia.id).unwrap().unwrap().population, 150);

    assert!(matches!(
        repo.update_population(99, 1).unwrap_err(),
        RepoError::NotFound(99)
    ));
    assert!(matches!(
        repo.delete_town(99).unwrap_err(),
        RepoError::NotFound(99)
    ));

    repo.delete_town(varna.id).unwrap();
    assert_eq!(repo.create_town("Lom", 30).unwrap().id, 3);

    repo.clear_towns().unwrap();
    assert!(repo.list_towns().unwrap().is_empty());
    assert_eq!(repo.create_town("Lom", 30).unwrap().id, 1);
}
