//! Tests that the flat-file storage survives a full engine restart.

use std::fs;

use tabdb::catalog::Catalog;
use tabdb::executor::Executor;

fn run(catalog: &mut Catalog, commands: &[&str]) -> Vec<String> {
    let mut executor = Executor::new(catalog);
    commands
        .iter()
        .map(|command| executor.handle_command(command))
        .collect()
}

#[test]
fn test_data_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("databases");

    let mut catalog = Catalog::new(root.clone());
    run(
        &mut catalog,
        &[
            "CREATE DATABASE markbook;",
            "USE markbook;",
            "CREATE TABLE marks (name, mark);",
            "INSERT INTO marks VALUES ('Sam', 70);",
            "INSERT INTO marks VALUES ('Pam', 35);",
        ],
    );
    drop(catalog);

    // A fresh catalog over the same directory sees the same rows.
    let mut catalog = Catalog::new(root);
    let responses = run(&mut catalog, &["USE markbook;", "SELECT * FROM marks;"]);
    assert_eq!(responses[0], "[OK]");
    let lines: Vec<&str> = responses[1].lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[2].contains("Sam"));
    assert!(lines[3].contains("Pam"));
}

#[test]
fn test_reload_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("databases");

    let mut catalog = Catalog::new(root.clone());
    run(
        &mut catalog,
        &[
            "CREATE DATABASE markbook;",
            "USE markbook;",
            "CREATE TABLE marks (name);",
            "INSERT INTO marks VALUES ('Sam');",
        ],
    );
    drop(catalog);

    let file = root.join("markbook/marks.tab");
    let before = fs::read_to_string(&file).unwrap();

    // Load and persist without changing anything.
    let mut catalog = Catalog::new(root);
    run(
        &mut catalog,
        &[
            "USE markbook;",
            "INSERT INTO marks VALUES ('Pam');",
            "DELETE FROM marks WHERE name == 'Pam';",
        ],
    );
    drop(catalog);

    let after = fs::read_to_string(&file).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_mutations_are_persisted_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("databases");

    let mut catalog = Catalog::new(root.clone());
    run(
        &mut catalog,
        &[
            "CREATE DATABASE markbook;",
            "USE markbook;",
            "CREATE TABLE marks (name, mark);",
            "INSERT INTO marks VALUES ('Sam', 70);",
            "UPDATE marks SET mark = 75 WHERE name == 'Sam';",
        ],
    );

    // No shutdown hook: the file already reflects the update.
    let contents = fs::read_to_string(root.join("markbook/marks.tab")).unwrap();
    assert!(contents.contains("75"));
    assert!(!contents.contains("70"));
}

#[test]
fn test_table_files_are_aligned_text() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("databases");

    let mut catalog = Catalog::new(root.clone());
    run(
        &mut catalog,
        &[
            "CREATE DATABASE markbook;",
            "USE markbook;",
            "CREATE TABLE marks (name, mark);",
            "INSERT INTO marks VALUES ('Sam', 70);",
        ],
    );

    let contents = fs::read_to_string(root.join("markbook/marks.tab")).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0].trim_end(), "id                name              mark");
    assert!(lines[1].starts_with("1 "));
}

#[test]
fn test_absent_values_round_trip_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("databases");

    let mut catalog = Catalog::new(root.clone());
    run(
        &mut catalog,
        &[
            "CREATE DATABASE markbook;",
            "USE markbook;",
            "CREATE TABLE marks (name);",
            "INSERT INTO marks VALUES ('Sam');",
            "ALTER TABLE marks ADD age;",
        ],
    );
    drop(catalog);

    let mut catalog = Catalog::new(root);
    let responses = run(
        &mut catalog,
        &["USE markbook;", "SELECT age FROM marks WHERE name == 'Sam';"],
    );
    assert_eq!(responses[1], "[OK]\nage\nNULL");
}

#[test]
fn test_spaced_value_rejected_and_database_stays_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("databases");

    let mut catalog = Catalog::new(root.clone());
    let responses = run(
        &mut catalog,
        &[
            "CREATE DATABASE markbook;",
            "USE markbook;",
            "CREATE TABLE marks (name);",
            "INSERT INTO marks VALUES ('Sam Smith');",
            "INSERT INTO marks VALUES ('Sam');",
        ],
    );
    // A value with embedded whitespace cannot round-trip through the
    // whitespace-delimited file, so it is rejected up front.
    assert!(responses[3].starts_with("[ERROR]: "));
    assert_eq!(responses[4], "[OK]");
    drop(catalog);

    let mut catalog = Catalog::new(root);
    let responses = run(&mut catalog, &["USE markbook;", "SELECT name FROM marks;"]);
    assert_eq!(responses[0], "[OK]");
    assert_eq!(responses[1], "[OK]\nname\nSam");
}

#[test]
fn test_ids_restart_from_one_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("databases");

    let mut catalog = Catalog::new(root.clone());
    run(
        &mut catalog,
        &[
            "CREATE DATABASE markbook;",
            "USE markbook;",
            "CREATE TABLE marks (name);",
            "INSERT INTO marks VALUES ('Sam');",
            "INSERT INTO marks VALUES ('Pam');",
            "DELETE FROM marks WHERE name == 'Sam';",
        ],
    );
    drop(catalog);

    // Rows are renumbered on load, so the surviving row becomes id 1.
    let mut catalog = Catalog::new(root);
    let responses = run(
        &mut catalog,
        &["USE markbook;", "SELECT id FROM marks WHERE name == 'Pam';"],
    );
    assert_eq!(responses[1], "[OK]\nid\n1");
}

#[test]
fn test_dropped_table_file_is_gone_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("databases");

    let mut catalog = Catalog::new(root.clone());
    run(
        &mut catalog,
        &[
            "CREATE DATABASE markbook;",
            "USE markbook;",
            "CREATE TABLE marks (name);",
            "DROP TABLE marks;",
        ],
    );
    drop(catalog);

    let mut catalog = Catalog::new(root);
    let responses = run(&mut catalog, &["USE markbook;", "SELECT * FROM marks;"]);
    assert!(responses[1].starts_with("[ERROR]: "));
}
