//! Configuration system for the VCM pipeline
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (VCM_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Data storage paths
    pub storage: StorageSettings,

    /// Persona generation defaults
    pub generation: GenerationSettings,

    /// Flow analysis cost model
    pub analysis: AnalysisSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Storage path settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory holding one EMPRESA_<CODE> directory per company
    pub data_dir: String,
}

/// Defaults applied by `generate` when flags are omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Default nationality bucket for new companies
    pub nacionalidade: String,

    /// Default CEO gender
    pub ceo_genero: String,

    /// Default headcount per category
    pub executivos_homens: u32,
    pub executivos_mulheres: u32,
    pub assistentes_homens: u32,
    pub assistentes_mulheres: u32,

    /// Extra languages offered to every persona in addition to the
    /// base + regional pools
    pub idiomas_extras: Vec<String>,
}

/// Cost model used by the flow analysis ROI estimates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Average hourly cost of manual work
    pub custo_hora: u32,

    /// Baseline automation implementation cost
    pub custo_implementacao: u32,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            generation: GenerationSettings::default(),
            analysis: AnalysisSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.vcm/companies".to_string(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            nacionalidade: "latinos".to_string(),
            ceo_genero: "feminino".to_string(),
            executivos_homens: 2,
            executivos_mulheres: 2,
            assistentes_homens: 2,
            assistentes_mulheres: 3,
            idiomas_extras: vec![],
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            custo_hora: 50,
            custo_implementacao: 10_000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
            config = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let expanded = shellexpand::tilde(path);
            let path = PathBuf::from(expanded.as_ref());
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("vcm-pipeline.toml"),
            PathBuf::from("config.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("vcm").join("pipeline.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".vcm").join("pipeline.toml"))
                .unwrap_or_default(),
            // System config (Linux)
            PathBuf::from("/etc/vcm/pipeline.toml"),
        ];

        for path in &search_paths {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Storage settings
        if let Ok(val) = std::env::var("VCM_DATA_DIR") {
            self.storage.data_dir = val;
        }

        // Generation settings
        if let Ok(val) = std::env::var("VCM_NACIONALIDADE") {
            self.generation.nacionalidade = val;
        }
        if let Ok(val) = std::env::var("VCM_CEO_GENERO") {
            self.generation.ceo_genero = val;
        }

        // Analysis settings
        if let Ok(val) = std::env::var("VCM_CUSTO_HORA") {
            if let Ok(n) = val.parse() {
                self.analysis.custo_hora = n;
            }
        }
        if let Ok(val) = std::env::var("VCM_CUSTO_IMPLEMENTACAO") {
            if let Ok(n) = val.parse() {
                self.analysis.custo_implementacao = n;
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("VCM_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("VCM_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("VCM_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.storage.data_dir = expand_path(&self.storage.data_dir);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.storage.data_dir.is_empty() {
            return Err(Error::Config("data_dir cannot be empty".to_string()));
        }

        // Validate nationality and gender slugs up front so `generate`
        // does not fail halfway through a company
        let valid_nationalities = [
            "europeus", "latinos", "asiaticos", "oriente_medio", "balcas", "nordicos",
        ];
        if !valid_nationalities.contains(&self.generation.nacionalidade.as_str()) {
            return Err(Error::Config(format!(
                "Invalid nacionalidade '{}'. Must be one of: {}",
                self.generation.nacionalidade,
                valid_nationalities.join(", ")
            )));
        }

        let valid_genders = ["masculino", "feminino"];
        if !valid_genders.contains(&self.generation.ceo_genero.as_str()) {
            return Err(Error::Config(format!(
                "Invalid ceo_genero '{}'. Must be one of: {}",
                self.generation.ceo_genero,
                valid_genders.join(", ")
            )));
        }

        if self.analysis.custo_hora == 0 {
            return Err(Error::Config(
                "custo_hora must be greater than zero".to_string(),
            ));
        }
        if self.analysis.custo_implementacao == 0 {
            return Err(Error::Config(
                "custo_implementacao must be greater than zero".to_string(),
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }
}

/// Expand a path with tilde and environment variables
fn expand_path(path: &str) -> String {
    shellexpand::tilde(path).to_string()
}

/// Initialize a new configuration file with defaults
pub fn init_config(path: Option<&str>, force: bool) -> Result<()> {
    let dest = match path {
        Some(p) => PathBuf::from(expand_path(p)),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vcm")
            .join("pipeline.toml"),
    };

    if dest.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            dest.display()
        )));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io_write(parent, e))?;
    }

    let default_config = PipelineConfig::default();
    let content = toml::to_string_pretty(&default_config)?;
    fs::write(&dest, content).map_err(|e| Error::io_write(&dest, e))?;

    println!("Configuration file created: {}", dest.display());
    Ok(())
}
