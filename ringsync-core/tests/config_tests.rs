//! Config loading error-message, file-reference, and validation tests.

use assert_fs::prelude::*;
use predicates::prelude::*;
use ringsync_core::{config, ConfigError, TrackedPath, WatchList};
use rstest::rstest;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("ringsync.yaml");
    let err = config::load_at(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("ringsync.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("ringsync.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("ringsync.yaml"));
}

// ---------------------------------------------------------------------------
// 2. Referenced plain-text files
// ---------------------------------------------------------------------------

#[test]
fn file_entries_come_before_inline_entries() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("clients.conf")
        .write_str("[client \"arch\"]\n    path = /bedrock/clients/arch\n")
        .expect("write clients");
    dir.child("tracked.conf")
        .write_str("# mirrored\n/etc/resolv.conf\n")
        .expect("write tracked");
    let file = dir.child("ringsync.yaml");
    file.write_str(
        "clients_file: clients.conf\ntracked_file: tracked.conf\nclients:\n  - {name: debian, root: /bedrock/clients/debian}\ntracked: [/etc/hosts]\n",
    )
    .expect("write config");

    let resolved = config::load_resolved_at(file.path()).expect("resolve");
    let names: Vec<_> = resolved.clients.iter().map(|c| c.name.0.as_str()).collect();
    assert_eq!(names, ["arch", "debian"]);
    let tracked: Vec<_> = resolved.tracked.iter().map(|t| t.as_str()).collect();
    assert_eq!(tracked, ["/etc/resolv.conf", "/etc/hosts"]);
}

#[test]
fn malformed_client_file_reports_path_and_line() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("clients.conf")
        .write_str("[client \"arch\"]\n[client \"debian\"]\npath = /d\n")
        .expect("write clients");
    let file = dir.child("ringsync.yaml");
    file.write_str("clients_file: clients.conf\ntracked: [/etc/hosts]\n")
        .expect("write config");

    let err = config::load_resolved_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { line: 2, .. }), "got: {err}");
    assert!(predicate::str::contains("clients.conf").eval(&err.to_string()));
}

#[test]
fn missing_referenced_file_is_io_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("ringsync.yaml");
    file.write_str("clients: [{name: a, root: /a}]\ntracked_file: nope.conf\n")
        .expect("write config");

    let err = config::load_resolved_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("nope.conf"));
}

#[test]
fn duplicate_client_across_file_and_inline_is_rejected() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("clients.conf")
        .write_str("[client \"arch\"]\npath = /a\n")
        .expect("write clients");
    let file = dir.child("ringsync.yaml");
    file.write_str("clients_file: clients.conf\nclients: [{name: arch, root: /b}]\ntracked: [/etc/hosts]\n")
        .expect("write config");

    let err = config::load_resolved_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateClient { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 3. Tracked path validation
// ---------------------------------------------------------------------------

#[rstest]
#[case("/etc/resolv.conf", true)]
#[case("/etc/X11/xorg.conf", true)]
#[case("etc/hosts", false)]
#[case("/", false)]
#[case("/etc/", false)]
#[case("/etc//hosts", false)]
#[case("/etc/../shadow", false)]
#[case("/./etc/hosts", false)]
fn tracked_path_validation(#[case] path: &str, #[case] valid: bool) {
    let result = WatchList::new(vec![TrackedPath::from(path)]);
    assert_eq!(result.is_ok(), valid, "{path}: {result:?}");
    if let Err(err) = result {
        assert!(matches!(err, ConfigError::InvalidTrackedPath { .. }), "got: {err}");
    }
}
