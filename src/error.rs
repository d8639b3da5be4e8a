//! Error types for the VCM pipeline
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Error context and chaining
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,
    JsonError = 210,

    // Artifact / prerequisite errors (3xx)
    ArtifactMissing = 300,
    ArtifactMalformed = 301,
    PersonasDirMissing = 302,

    // Input errors (4xx)
    UnknownSpecialty = 400,
    UnknownCategory = 401,
    UnknownNationality = 402,
    UnknownGender = 403,

    // Generation errors (5xx)
    StageFailed = 500,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Artifact errors
            400..=499 => 40, // Input errors
            500..=599 => 50, // Generation errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Artifact / Prerequisite Errors
    // ─────────────────────────────────────────────────────────────

    /// Upstream artifact file not found
    #[error("{artifact} not found: {path}. Run '{run_first}' first")]
    ArtifactMissing {
        artifact: String,
        path: PathBuf,
        run_first: String,
    },

    /// Artifact file exists but cannot be interpreted
    #[error("Malformed artifact {path}: {message}")]
    ArtifactMalformed { path: PathBuf, message: String },

    /// Personas root directory absent
    #[error("Personas directory not found: {path}")]
    PersonasDirMissing { path: PathBuf },

    // ─────────────────────────────────────────────────────────────
    // Input Errors
    // ─────────────────────────────────────────────────────────────

    /// Unknown specialty slug
    #[error("Unknown specialty '{0}'. Valid: hr, youtube, midias_sociais, marketing, financeiro, tecnologia")]
    UnknownSpecialty(String),

    /// Unknown persona category
    #[error("Unknown category '{0}'. Valid: executivos, assistentes, especialistas")]
    UnknownCategory(String),

    /// Unknown nationality bucket
    #[error("Unknown nationality '{0}'. Valid: europeus, latinos, asiaticos, oriente_medio, balcas, nordicos")]
    UnknownNationality(String),

    /// Unknown gender value
    #[error("Unknown gender '{0}'. Valid: masculino, feminino")]
    UnknownGender(String),

    // ─────────────────────────────────────────────────────────────
    // Generation Errors
    // ─────────────────────────────────────────────────────────────

    /// A pipeline stage aborted
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::JsonError,

            Error::ArtifactMissing { .. } => ErrorCode::ArtifactMissing,
            Error::ArtifactMalformed { .. } => ErrorCode::ArtifactMalformed,
            Error::PersonasDirMissing { .. } => ErrorCode::PersonasDirMissing,

            Error::UnknownSpecialty(_) => ErrorCode::UnknownSpecialty,
            Error::UnknownCategory(_) => ErrorCode::UnknownCategory,
            Error::UnknownNationality(_) => ErrorCode::UnknownNationality,
            Error::UnknownGender(_) => ErrorCode::UnknownGender,

            Error::StageFailed { .. } => ErrorCode::StageFailed,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'vcm-pipeline config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'vcm-pipeline config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values. See documentation for valid options."
            ),

            Error::ArtifactMissing { .. } => Some(
                "Pipeline stages build on each other. Run the command named in the error for this company, then retry."
            ),
            Error::ArtifactMalformed { .. } => Some(
                "The artifact on disk is not what this stage expects. Re-run the producing stage to regenerate it."
            ),
            Error::PersonasDirMissing { .. } => Some(
                "Run 'vcm-pipeline generate --empresa-codigo <CODE>' to create the company's personas first."
            ),

            Error::UnknownSpecialty(_) | Error::UnknownCategory(_)
            | Error::UnknownNationality(_) | Error::UnknownGender(_) => Some(
                "Check the spelling of the value; the full list of accepted slugs is in the error message."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a file read error
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create a file write error
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a missing-artifact error naming the command that produces it
    pub fn artifact_missing(
        artifact: impl Into<String>,
        path: impl Into<PathBuf>,
        run_first: impl Into<String>,
    ) -> Self {
        Error::ArtifactMissing {
            artifact: artifact.into(),
            path: path.into(),
            run_first: run_first.into(),
        }
    }

    /// Create a stage failure error
    pub fn stage_failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Error::StageFailed {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::ArtifactMissing.as_str(), "E300");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::ArtifactMissing.exit_code(), 30);
        assert_eq!(ErrorCode::UnknownSpecialty.exit_code(), 40);
        assert_eq!(ErrorCode::StageFailed.exit_code(), 50);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_display() {
        let err = Error::config_not_found("/path/to/config.toml");
        assert!(err.to_string().contains("/path/to/config.toml"));
    }

    #[test]
    fn test_artifact_missing_names_producer() {
        let err = Error::artifact_missing(
            "RAG knowledge base",
            "/tmp/rag_knowledge_base.json",
            "vcm-pipeline rag",
        );
        assert_eq!(err.code(), ErrorCode::ArtifactMissing);
        assert!(err.to_string().contains("vcm-pipeline rag"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_error_codes() {
        let err = Error::config_not_found("/test");
        assert_eq!(err.code(), ErrorCode::ConfigNotFound);

        let err = Error::UnknownSpecialty("dados".to_string());
        assert_eq!(err.code(), ErrorCode::UnknownSpecialty);

        let err = Error::stage_failed("competencias", "boom");
        assert_eq!(err.code(), ErrorCode::StageFailed);
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_terminal();

        // Should contain error code
        assert!(formatted.contains("E100"));
        // Should contain ANSI color codes
        assert!(formatted.contains("\x1b[31m"));
        // Should contain hint
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E100]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
