//! Common test utilities and fixtures
//!
//! Shared helpers for driving the vcm-pipeline binary against a
//! temporary company data directory.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Get a command for the vcm-pipeline binary
pub fn pipeline_cmd() -> Command {
    Command::cargo_bin("vcm-pipeline").unwrap()
}

/// Root of a company workspace inside a test data dir
pub fn company_root(data_dir: &Path, codigo: &str) -> PathBuf {
    data_dir.join(format!("EMPRESA_{}", codigo.to_uppercase()))
}

/// Generate the reference 7-persona company (1 CEO + 2 executives +
/// 2 assistants + specialists in hr and tecnologia), seeded.
pub fn generate_reference_company(data_dir: &Path, codigo: &str) {
    pipeline_cmd()
        .args([
            "generate",
            "--empresa-codigo",
            codigo,
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--executivos-homens",
            "1",
            "--executivos-mulheres",
            "1",
            "--assistentes-homens",
            "1",
            "--assistentes-mulheres",
            "1",
            "--especialistas",
            "hr,tecnologia",
            "--especialistas-homens",
            "1",
            "--seed",
            "1234",
        ])
        .assert()
        .success();
}

/// Run one stage command against the test data dir
pub fn run_stage(data_dir: &Path, codigo: &str, stage: &str) {
    pipeline_cmd()
        .args([
            stage,
            "--empresa-codigo",
            codigo,
            "--data-dir",
            data_dir.to_str().unwrap(),
        ])
        .assert()
        .success();
}

/// Load a JSON artifact from the company root
pub fn load_json(data_dir: &Path, codigo: &str, file: &str) -> serde_json::Value {
    let path = company_root(data_dir, codigo).join(file);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("cannot parse {}: {}", path.display(), e))
}
