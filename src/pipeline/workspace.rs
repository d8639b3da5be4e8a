//! Company workspace — the on-disk directory contract shared by all stages.
//!
//! Layout, relative to the configured data directory:
//!
//! ```text
//! EMPRESA_<CODE>/
//!   personas_config.json
//!   competencias_analysis.json            (stage 1)
//!   tech_specifications.json              (stage 2)
//!   rag_knowledge_base.json               (stage 3)
//!   fluxos_analise_completa.json          (stage 4)
//!   n8n_workflows_completo.json           (stage 5)
//!   04_BIOS_PERSONAS/<categoria>/<Persona_Name>/
//!     <Persona_Name>_bio.md
//!     script{1..5}_*/<slice>.json
//!   06_N8N_WORKFLOWS/<workflow>.json + IMPLEMENTACAO.md
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::persona::Category;

use super::{Artifact, Stage};

/// Directory holding the per-persona trees.
pub const BIOS_DIR: &str = "04_BIOS_PERSONAS";

/// Directory holding the exported N8N workflow files.
pub const WORKFLOWS_DIR: &str = "06_N8N_WORKFLOWS";

/// Paths and JSON I/O for one company's pipeline run.
#[derive(Debug, Clone)]
pub struct CompanyWorkspace {
    codigo: String,
    root: PathBuf,
    /// `--input-path` override for one upstream artifact.
    input_override: Option<(Artifact, PathBuf)>,
}

impl CompanyWorkspace {
    /// Create a workspace rooted at `<data_dir>/EMPRESA_<CODE>`.
    pub fn new(data_dir: impl AsRef<Path>, codigo: &str) -> Self {
        let codigo = codigo.to_uppercase();
        let root = data_dir.as_ref().join(format!("EMPRESA_{}", codigo));
        Self {
            codigo,
            root,
            input_override: None,
        }
    }

    /// Workspace rooted at an explicit directory (for `--output-path`).
    pub fn at_root(root: impl Into<PathBuf>, codigo: &str) -> Self {
        Self {
            codigo: codigo.to_uppercase(),
            root: root.into(),
            input_override: None,
        }
    }

    /// Read `artifact` from `path` instead of the company directory.
    pub fn with_input_override(mut self, artifact: Artifact, path: impl Into<PathBuf>) -> Self {
        self.input_override = Some((artifact, path.into()));
        self
    }

    pub fn codigo(&self) -> &str {
        &self.codigo
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────
    // Paths
    // ─────────────────────────────────────────────────────────────

    /// Root of the per-persona trees.
    pub fn bios_dir(&self) -> PathBuf {
        self.root.join(BIOS_DIR)
    }

    /// Directory for exported N8N workflow JSON files.
    pub fn workflows_dir(&self) -> PathBuf {
        self.root.join(WORKFLOWS_DIR)
    }

    /// Path of a consolidated artifact.
    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.root.join(artifact.file_name())
    }

    /// Directory of one persona.
    pub fn persona_dir(&self, categoria: Category, folder: &str) -> PathBuf {
        self.bios_dir().join(categoria.slug()).join(folder)
    }

    /// Per-persona slice directory of a stage, created on demand.
    pub fn stage_dir(&self, persona_dir: &Path, stage: Stage) -> Result<PathBuf> {
        let name = stage.persona_dir_name().ok_or_else(|| {
            Error::Internal(format!("stage {} has no persona directory", stage))
        })?;
        let dir = persona_dir.join(name);
        fs::create_dir_all(&dir).map_err(|e| Error::io_write(&dir, e))?;
        Ok(dir)
    }

    // ─────────────────────────────────────────────────────────────
    // Prerequisites
    // ─────────────────────────────────────────────────────────────

    /// Fail with an actionable error when the personas tree is absent.
    pub fn require_personas_dir(&self) -> Result<PathBuf> {
        let dir = self.bios_dir();
        if !dir.is_dir() {
            return Err(Error::PersonasDirMissing { path: dir });
        }
        Ok(dir)
    }

    /// Fail with an error naming the producing command when an upstream
    /// artifact is absent.
    pub fn require_artifact(&self, artifact: Artifact) -> Result<PathBuf> {
        let path = match &self.input_override {
            Some((overridden, path)) if *overridden == artifact => path.clone(),
            _ => self.artifact_path(artifact),
        };
        if !path.is_file() {
            let run_first = format!(
                "vcm-pipeline {} --empresa-codigo {}",
                artifact.produced_by().slug(),
                self.codigo
            );
            return Err(Error::artifact_missing(
                artifact.display_name(),
                path,
                run_first,
            ));
        }
        Ok(path)
    }

    /// Load and deserialize an upstream artifact.
    pub fn load_artifact<T: DeserializeOwned>(&self, artifact: Artifact) -> Result<T> {
        let path = self.require_artifact(artifact)?;
        self.read_json(&path)
    }

    // ─────────────────────────────────────────────────────────────
    // JSON I/O
    // ─────────────────────────────────────────────────────────────

    /// Read and deserialize a JSON file.
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path).map_err(|e| Error::io_read(path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::ArtifactMalformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Serialize and write a JSON file, creating parent directories.
    /// Writes are whole-file overwrites.
    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io_write(parent, e))?;
        }
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');
        fs::write(path, content).map_err(|e| Error::io_write(path, e))?;
        debug!(path = %path.display(), "Artifact written");
        Ok(())
    }

    /// Write a text file, creating parent directories.
    pub fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io_write(parent, e))?;
        }
        fs::write(path, content).map_err(|e| Error::io_write(path, e))
    }

    // ─────────────────────────────────────────────────────────────
    // Persona discovery
    // ─────────────────────────────────────────────────────────────

    /// Walk the personas tree: (category slug, folder name, path), sorted
    /// for deterministic stage output.
    pub fn list_persona_dirs(&self) -> Result<Vec<(String, String, PathBuf)>> {
        let bios = self.require_personas_dir()?;
        let mut out = Vec::new();

        let mut categories: Vec<PathBuf> = fs::read_dir(&bios)
            .map_err(|e| Error::io_read(&bios, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        categories.sort();

        for category_path in categories {
            let category = category_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            let mut personas: Vec<PathBuf> = fs::read_dir(&category_path)
                .map_err(|e| Error::io_read(&category_path, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_dir())
                .collect();
            personas.sort();

            for persona_path in personas {
                let folder = persona_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                out.push((category.clone(), folder, persona_path));
            }
        }

        Ok(out)
    }

    /// Find the `*_bio.md` file inside a persona directory.
    pub fn find_bio_file(&self, persona_dir: &Path) -> Result<Option<PathBuf>> {
        let entries = fs::read_dir(persona_dir).map_err(|e| Error::io_read(persona_dir, e))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_bio.md"))
            {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn test_root_layout() {
        let ws = CompanyWorkspace::new("/data", "arvatest");
        assert_eq!(ws.codigo(), "ARVATEST");
        assert_eq!(ws.root(), Path::new("/data/EMPRESA_ARVATEST"));
        assert!(ws.bios_dir().ends_with("04_BIOS_PERSONAS"));
    }

    #[test]
    fn test_json_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let ws = CompanyWorkspace::new(tmp.path(), "TEST");
        let path = ws.root().join("nested").join("sample.json");

        ws.write_json(&path, &Sample { value: 7 }).unwrap();
        let loaded: Sample = ws.read_json(&path).unwrap();
        assert_eq!(loaded, Sample { value: 7 });
    }

    #[test]
    fn test_require_artifact_names_producer() {
        let tmp = TempDir::new().unwrap();
        let ws = CompanyWorkspace::new(tmp.path(), "TEST");

        let err = ws.require_artifact(Artifact::RagKnowledgeBase).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("rag"), "{}", msg);
        assert!(msg.contains("TEST"), "{}", msg);
    }

    #[test]
    fn test_input_override_redirects_one_artifact() {
        let tmp = TempDir::new().unwrap();
        let custom = tmp.path().join("custom.json");
        fs::write(&custom, "{}").unwrap();

        let ws = CompanyWorkspace::new(tmp.path(), "TEST")
            .with_input_override(Artifact::CompetenciasAnalysis, &custom);

        let path = ws.require_artifact(Artifact::CompetenciasAnalysis).unwrap();
        assert_eq!(path, custom);
        // Other artifacts still resolve inside the company directory
        assert!(ws.require_artifact(Artifact::RagKnowledgeBase).is_err());
    }

    #[test]
    fn test_require_personas_dir_missing() {
        let tmp = TempDir::new().unwrap();
        let ws = CompanyWorkspace::new(tmp.path(), "TEST");
        assert!(ws.require_personas_dir().is_err());

        fs::create_dir_all(ws.bios_dir()).unwrap();
        assert!(ws.require_personas_dir().is_ok());
    }

    #[test]
    fn test_list_persona_dirs_sorted() {
        let tmp = TempDir::new().unwrap();
        let ws = CompanyWorkspace::new(tmp.path(), "TEST");
        for (cat, name) in [
            ("executivos", "Zoe_Silva"),
            ("executivos", "Ana_Silva"),
            ("assistentes", "Luis_Perez"),
        ] {
            fs::create_dir_all(ws.bios_dir().join(cat).join(name)).unwrap();
        }

        let dirs = ws.list_persona_dirs().unwrap();
        assert_eq!(dirs.len(), 3);
        // Categories sort first, then folders within a category
        assert_eq!(dirs[0].0, "assistentes");
        assert_eq!(dirs[1].1, "Ana_Silva");
        assert_eq!(dirs[2].1, "Zoe_Silva");
    }

    #[test]
    fn test_find_bio_file() {
        let tmp = TempDir::new().unwrap();
        let ws = CompanyWorkspace::new(tmp.path(), "TEST");
        let dir = ws.bios_dir().join("executivos").join("Ana_Silva");
        fs::create_dir_all(&dir).unwrap();

        assert!(ws.find_bio_file(&dir).unwrap().is_none());

        fs::write(dir.join("Ana_Silva_bio.md"), "# Ana").unwrap();
        let found = ws.find_bio_file(&dir).unwrap().unwrap();
        assert!(found.ends_with("Ana_Silva_bio.md"));
    }
}
