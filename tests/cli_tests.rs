//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

mod common;

use common::pipeline_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    pipeline_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VCM Pipeline"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("competencias"))
        .stdout(predicate::str::contains("tech-specs"))
        .stdout(predicate::str::contains("rag"))
        .stdout(predicate::str::contains("fluxos"))
        .stdout(predicate::str::contains("workflows"))
        .stdout(predicate::str::contains("cascade"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command() {
    pipeline_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vcm-pipeline"))
        .stdout(predicate::str::contains("Build Information"))
        .stdout(predicate::str::contains("Git Hash"))
        .stdout(predicate::str::contains("Target"));
}

#[test]
fn test_short_version_flag() {
    pipeline_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vcm-pipeline"));
}

// ─────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_default() {
    pipeline_cmd()
        .arg("config")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("[storage]"))
        .stdout(predicate::str::contains("[generation]"))
        .stdout(predicate::str::contains("[analysis]"))
        .stdout(predicate::str::contains("[logging]"));
}

#[test]
fn test_config_validate_default() {
    // Default config should always be valid
    pipeline_cmd()
        .arg("config")
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_init_and_validate() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("pipeline.toml");

    pipeline_cmd()
        .args(["config", "init", "--path", config_path.to_str().unwrap()])
        .assert()
        .success();
    assert!(config_path.exists());

    pipeline_cmd()
        .args(["config", "validate", "--config", config_path.to_str().unwrap()])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────
// Stage Argument Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_stage_requires_empresa_codigo() {
    pipeline_cmd()
        .arg("competencias")
        .env_remove("VCM_EMPRESA_CODIGO")
        .assert()
        .failure()
        .stderr(predicate::str::contains("empresa-codigo"));
}

#[test]
fn test_stage_fails_without_upstream_artifact() {
    let tmp = TempDir::new().unwrap();

    // Stage 1 without generated biographies: missing-prerequisite error
    // naming the generate command, artifact error band (exit 30).
    pipeline_cmd()
        .args([
            "competencias",
            "--empresa-codigo",
            "GHOST",
            "--data-dir",
            tmp.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(30)
        .stderr(predicate::str::contains("generate"));
}

#[test]
fn test_rag_names_upstream_stage() {
    let tmp = TempDir::new().unwrap();
    common::generate_reference_company(tmp.path(), "GATE");

    // Biographies exist but stage 1/2 artifacts do not: the error names
    // the stage to run first.
    pipeline_cmd()
        .args([
            "rag",
            "--empresa-codigo",
            "GATE",
            "--data-dir",
            tmp.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(30)
        .stderr(predicate::str::contains("competencias"));
}

#[test]
fn test_generate_rejects_unknown_nationality() {
    let tmp = TempDir::new().unwrap();

    pipeline_cmd()
        .args([
            "generate",
            "--empresa-codigo",
            "BAD",
            "--data-dir",
            tmp.path().to_str().unwrap(),
            "--nacionalidade",
            "marcianos",
        ])
        .assert()
        .failure()
        .code(40)
        .stderr(predicate::str::contains("marcianos"));
}

#[test]
fn test_generate_rejects_unknown_specialty() {
    let tmp = TempDir::new().unwrap();

    pipeline_cmd()
        .args([
            "generate",
            "--empresa-codigo",
            "BAD",
            "--data-dir",
            tmp.path().to_str().unwrap(),
            "--especialistas",
            "hr,astrologia",
        ])
        .assert()
        .failure()
        .code(40)
        .stderr(predicate::str::contains("astrologia"));
}
