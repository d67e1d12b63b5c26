//! Whitelist import through an interactive whitelist session.

#![allow(clippy::unwrap_used)]

use checkpoint_cli::db::Operation;
use checkpoint_cli::models::WhitelistEntry;
use checkpoint_integration_tests::{Harness, WHITELIST_FILE};

#[tokio::test]
async fn test_import_every_row() {
    let harness = Harness::new();
    let _path = harness.write_file(
        WHITELIST_FILE,
        "name,team,email\nAda,Engines,ada@example.com\nGrace,Compilers,grace@example.com\n",
    );

    let outcome = harness.run(&["whitelist"], "add\nq\n").await;

    assert_eq!(outcome.exit_code(), 0);
    assert!(outcome.output.contains("Imported 2 whitelist entries"));
    let names: Vec<String> = harness
        .store
        .whitelist()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, ["Ada", "Grace"]);
}

#[tokio::test]
async fn test_duplicate_stops_the_import() {
    let harness = Harness::new();
    let _path = harness.write_file(
        WHITELIST_FILE,
        "name,team,email\n\
         Ada,Engines,ada@example.com\n\
         Ada Again,Engines,ada@example.com\n\
         Grace,Compilers,grace@example.com\n",
    );

    let outcome = harness.run(&["whitelist"], "add\nq\n").await;

    // Rows after the first already-present email are never looked at.
    let whitelist = harness.store.whitelist();
    assert_eq!(whitelist.len(), 1);
    assert_eq!(whitelist[0].email, "ada@example.com");
    assert_eq!(
        harness.store.operations(),
        vec![
            Operation::FindWhitelistEntry,
            Operation::InsertWhitelistEntry,
            Operation::FindWhitelistEntry,
        ]
    );
    assert!(
        outcome
            .output
            .contains("Imported 1 whitelist entries (stopped at existing email on line 3)")
    );
    assert_eq!(outcome.error_lines(), 0);
}

#[tokio::test]
async fn test_entry_from_an_earlier_run_stops_the_import() {
    let harness = Harness::new();
    harness
        .store
        .add_whitelist_entry(WhitelistEntry::new("Grace", "grace@example.com"));
    let _path = harness.write_file(
        WHITELIST_FILE,
        "name,team,email\n\
         Grace,Compilers,grace@example.com\n\
         Ada,Engines,ada@example.com\n",
    );

    let outcome = harness.run(&["whitelist"], "add\nq\n").await;

    assert_eq!(outcome.error_lines(), 0);
    assert!(
        outcome
            .output
            .contains("Imported 0 whitelist entries (stopped at existing email on line 2)")
    );
    assert!(harness.store.writes().is_empty());
    assert_eq!(harness.store.whitelist().len(), 1);
}

#[tokio::test]
async fn test_malformed_row_after_duplicate_is_never_reached() {
    let harness = Harness::new();
    let _path = harness.write_file(
        WHITELIST_FILE,
        "name,team,email\n\
         Ada,Engines,ada@example.com\n\
         Ada,Engines,ada@example.com\n\
         broken\n",
    );

    let outcome = harness.run(&["whitelist"], "add\nq\n").await;

    assert_eq!(outcome.error_lines(), 0);
    assert!(outcome.output.contains("Imported 1 whitelist entries"));
    assert_eq!(harness.store.whitelist().len(), 1);
}

#[tokio::test]
async fn test_malformed_row_stops_with_an_error() {
    let harness = Harness::new();
    let _path = harness.write_file(
        WHITELIST_FILE,
        "name,team,email\nAda,Engines,ada@example.com\nGrace,grace@example.com\n",
    );

    let outcome = harness.run(&["whitelist"], "add\nq\n").await;

    assert_eq!(outcome.exit_code(), 0);
    assert!(outcome.output.contains("Error: importing whitelist: line 3:"));
    assert_eq!(
        harness.store.writes(),
        vec![Operation::InsertWhitelistEntry]
    );
}

#[tokio::test]
async fn test_missing_file_is_a_command_error() {
    let harness = Harness::new();

    let outcome = harness.run(&["whitelist"], "add\nq\n").await;

    assert_eq!(outcome.exit_code(), 0);
    assert!(outcome.output.contains("Error: importing whitelist: I/O error"));
}
