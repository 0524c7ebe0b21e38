use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_library-erd");

fn run(args: &[&str], cwd: &Path) -> Output {
    Command::new(BIN)
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run library-erd")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

/// Runs the showcase into `dir/library.db` and returns the database path.
fn seeded_db(dir: &Path) -> PathBuf {
    let db = dir.join("library.db");
    let output = run(&["showcase", "--db", path_str(&db)], dir);
    assert!(output.status.success(), "showcase failed: {}", stderr(&output));
    db
}

// ---------------------------------------------------------------------------
// Showcase
// ---------------------------------------------------------------------------

#[test]
fn showcase_creates_database_and_loans_1984() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("library.db");

    let output = run(&["showcase", "--db", path_str(&db)], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(db.exists());

    let out = stdout(&output);
    assert!(out.contains("Added member Alice Future"));
    assert!(out.contains("Found available copy 1."));
    assert!(out.contains("Member: Alice Future, Book: '1984'"));
    assert!(out.contains("Member: John Smith, Book: '1984'"));
}

#[test]
fn showcase_recreates_database_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());

    let output = run(&["showcase", "--db", path_str(&db)], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Removed old database"));
    assert!(out.contains("Added member Alice Future"));
}

#[test]
fn showcase_keep_reports_duplicate_member() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());

    let output = run(&["showcase", "--db", path_str(&db), "--keep"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("already registered"));
    assert!(!out.contains("Step 4"));
}

#[test]
fn showcase_with_external_dump_script() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("custom.db");
    let script = dir.path().join("schema.sql");
    fs::write(
        &script,
        "PRAGMA foreign_keys=OFF;
         BEGIN TRANSACTION;
         CREATE TABLE Members (MemberID INTEGER PRIMARY KEY, FirstName TEXT, LastName TEXT,
             Email TEXT UNIQUE, MembershipExpiryDate TEXT);
         CREATE TABLE Books (BookID INTEGER PRIMARY KEY, Title TEXT);
         CREATE TABLE BookCopies (CopyID INTEGER PRIMARY KEY,
             BookID INTEGER REFERENCES Books(BookID), Status TEXT);
         CREATE TABLE Loans (LoanID INTEGER PRIMARY KEY,
             CopyID INTEGER REFERENCES BookCopies(CopyID),
             MemberID INTEGER REFERENCES Members(MemberID),
             IssueDate TEXT, DueDate TEXT, ActualReturnDate TEXT);
         INSERT INTO Books (Title) VALUES ('1984');
         INSERT INTO BookCopies (BookID, Status) VALUES (1, 'available');
         COMMIT;",
    )
    .unwrap();

    let output = run(
        &[
            "showcase",
            "--db",
            path_str(&db),
            "--schema",
            path_str(&script),
        ],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Script"));
    assert!(out.contains("Member: Alice Future, Book: '1984'"));
    assert!(!out.contains("John Smith"));
}

// ---------------------------------------------------------------------------
// ERD
// ---------------------------------------------------------------------------

#[test]
fn erd_writes_dot_source() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());
    let base = dir.path().join("library_erd");

    let output = run(
        &[
            "erd",
            "--db",
            path_str(&db),
            "--output",
            path_str(&base),
            "--format",
            "dot",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let dot = fs::read_to_string(dir.path().join("library_erd.dot")).unwrap();
    for table in ["Members", "Books", "BookCopies", "Loans"] {
        assert!(dot.contains(&format!("<b>{table}</b>")), "missing node {table}");
    }
    assert!(dot.contains(r#""Loans" -> "Members" [label="MemberID → MemberID""#));
    assert!(dot.contains(r#""BookCopies" -> "Books""#));
    assert!(!dot.contains("sqlite_sequence"));
}

#[test]
fn erd_sorted_json_graph() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());
    let base = dir.path().join("graph");

    let output = run(
        &[
            "erd",
            "--db",
            path_str(&db),
            "--output",
            path_str(&base),
            "--format",
            "json",
            "--sorted",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let raw = fs::read_to_string(dir.path().join("graph.json")).unwrap();
    let graph: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let ids: Vec<&str> = graph["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["BookCopies", "Books", "Loans", "Members"]);
    assert_eq!(graph["edges"].as_array().unwrap().len(), 3);
}

#[test]
fn erd_bootstraps_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("fresh.db");
    let base = dir.path().join("erd");
    assert!(!db.exists());

    let output = run(
        &[
            "erd",
            "--db",
            path_str(&db),
            "--output",
            path_str(&base),
            "--format",
            "dot",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(db.exists());
    assert!(stdout(&output).contains("created by the seeding process"));
    assert!(dir.path().join("erd.dot").exists());
}

#[test]
fn erd_without_bootstrap_fails_on_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("missing.db");

    let output = run(
        &["erd", "--db", path_str(&db), "--no-bootstrap", "--format", "dot"],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("does not exist"));
    assert!(!db.exists());
}

#[test]
fn erd_reports_missing_renderer() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());
    let base = dir.path().join("erd");

    let output = run(
        &[
            "erd",
            "--db",
            path_str(&db),
            "--output",
            path_str(&base),
            "--format",
            "png",
            "--dot-binary",
            "library-erd-no-such-dot-binary",
        ],
        dir.path(),
    );
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("renderer unavailable"), "{err}");
    assert!(err.contains("Graphviz"));
    assert!(!dir.path().join("erd.png").exists());
}

#[test]
fn erd_uses_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = seeded_db(dir.path());
    let config = dir.path().join("library-erd.yaml");
    fs::write(
        &config,
        format!(
            "database: {}\nerd:\n  output: {}\n  format: dot\n  style:\n    rank_dir: TB\n",
            path_str(&db),
            path_str(&dir.path().join("from_config"))
        ),
    )
    .unwrap();

    let output = run(&["--config", path_str(&config), "erd"], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let dot = fs::read_to_string(dir.path().join("from_config.dot")).unwrap();
    assert!(dot.contains(r#"rankdir="TB""#));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.yaml");
    fs::write(&config, "erd:\n  format: gif\n").unwrap();

    let output = run(&["--config", path_str(&config), "migrate", "status"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid config"));
}

// ---------------------------------------------------------------------------
// Migrate
// ---------------------------------------------------------------------------

#[test]
fn migrate_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("migrate.db");
    let db_arg = path_str(&db);

    let output = run(&["migrate", "status", "--db", db_arg], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Tables exist: no"));

    let output = run(&["migrate", "up", "--db", db_arg], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(&["migrate", "seed", "--db", db_arg], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Books: 3"));
    assert!(out.contains("Loans: 1 (1 active)"));

    // Second seed violates unique keys and is rolled back.
    let output = run(&["migrate", "seed", "--db", db_arg], dir.path());
    assert!(!output.status.success());

    let output = run(&["migrate", "refresh", "--db", db_arg], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Members: 2"));

    let output = run(&["migrate", "down", "--db", db_arg], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run(&["migrate", "status", "--db", db_arg], dir.path());
    assert!(stdout(&output).contains("Tables exist: no"));
}
