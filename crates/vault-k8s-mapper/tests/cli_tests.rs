//! End-to-end checks of the binary's failure paths
//!
//! Every case here fails before any network call, so no Vault server or
//! cluster is needed.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::TempDir;

const BASE_ENV: [(&str, &str); 6] = [
    ("NAMESPACE", "apps"),
    ("VAULT_ADDRESS", "http://127.0.0.1:1"),
    ("VAULT_ROLE", "mapper"),
    ("VAULT_AUTH_PATH", "kubernetes"),
    ("SECRET_TARGET", "app-secrets"),
    ("SECRET_SOURCES", "apps/:password"),
];

/// Binary with an empty environment, run from an empty directory
fn mapper(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vault-k8s-mapper").unwrap();
    cmd.env_clear().current_dir(dir.path());
    cmd
}

#[test]
fn test_help_lists_flags() {
    let dir = TempDir::new().unwrap();
    mapper(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--env-file"));
}

#[test]
fn test_missing_environment_fails() {
    let dir = TempDir::new().unwrap();
    mapper(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Required variable NAMESPACE not found",
        ));
}

#[test]
fn test_reports_first_missing_variable() {
    let dir = TempDir::new().unwrap();
    mapper(&dir)
        .envs(BASE_ENV.iter().filter(|(k, _)| *k != "VAULT_ROLE").copied())
        .assert()
        .failure()
        .stderr(predicate::str::contains("VAULT_ROLE"));
}

#[test]
fn test_missing_path_in_sources_fails() {
    let dir = TempDir::new().unwrap();
    mapper(&dir)
        .envs(BASE_ENV)
        .env("SECRET_SOURCES", "apps/:password,:password")
        .env("VAULT_TOKEN", "jwt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing path"));
}

#[test]
fn test_invalid_target_fails() {
    let dir = TempDir::new().unwrap();
    mapper(&dir)
        .envs(BASE_ENV)
        .env("SECRET_SOURCES", "bad$target:apps/db")
        .env("VAULT_TOKEN", "jwt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SECRET_SOURCES"));
}

#[test]
fn test_unreadable_token_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-token");
    mapper(&dir)
        .envs(BASE_ENV)
        .env("TOKEN_PATH", &missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not open token file"));
}

#[test]
fn test_env_file_supplies_configuration() {
    let dir = TempDir::new().unwrap();
    let env_path = dir.path().join("mapper.env");
    let mut file = std::fs::File::create(&env_path).unwrap();
    for (key, value) in BASE_ENV.iter().filter(|(k, _)| *k != "SECRET_SOURCES") {
        writeln!(file, "{}={}", key, value).unwrap();
    }
    writeln!(file, "SECRET_SOURCES=:password").unwrap();

    // Parsing fails after configuration loads, so the file was read
    mapper(&dir)
        .arg("--env-file")
        .arg(&env_path)
        .env("VAULT_TOKEN", "jwt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing path"));
}

#[test]
fn test_missing_env_file_fails() {
    let dir = TempDir::new().unwrap();
    mapper(&dir)
        .args(["--env-file", "does-not-exist.env"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load env file"));
}
