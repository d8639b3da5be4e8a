//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the VCM pipeline.

use clap::{Args, Parser, Subcommand};

/// VCM Pipeline - Virtual Company Manager generator
///
/// Synthesizes a fictional company's personas and derives competency
/// profiles, technical specifications, a RAG knowledge base, process-flow
/// analysis and N8N automation workflows from them, stage by stage.
#[derive(Parser, Debug)]
#[command(name = "vcm-pipeline")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate persona biographies for a company (stage 0)
    Generate(GenerateArgs),

    /// Derive competency profiles from biographies (stage 1)
    Competencias(StageArgs),

    /// Generate technical specifications (stage 2)
    TechSpecs(StageArgs),

    /// Build the RAG knowledge base (stage 3)
    Rag(StageArgs),

    /// Analyze business process flows (stage 4)
    Fluxos(StageArgs),

    /// Synthesize N8N automation workflows (stage 5)
    Workflows(StageArgs),

    /// Run stages 1-5 in order against existing biographies
    Cascade(StageArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Arguments shared by every stage command
#[derive(Args, Debug, Clone)]
pub struct StageArgs {
    /// Company code (e.g. ARVATEST)
    #[arg(long = "empresa-codigo", env = "VCM_EMPRESA_CODIGO")]
    pub empresa_codigo: String,

    /// Override the configured company data directory
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Read the stage's primary input artifact from this file instead of
    /// the company directory
    #[arg(long)]
    pub input_path: Option<String>,

    /// Alias of --input-path kept for older invocations
    #[arg(long, conflicts_with = "input_path")]
    pub input_dir: Option<String>,

    /// Write outputs under this directory instead of
    /// <data-dir>/EMPRESA_<CODE>
    #[arg(long)]
    pub output_path: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "VCM_CONFIG")]
    pub config: Option<String>,
}

/// Company setup for `generate`
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub stage: StageArgs,

    /// Company display name (defaults to the company code)
    #[arg(long)]
    pub nome: Option<String>,

    /// Industry the company operates in
    #[arg(long, default_value = "tecnologia")]
    pub industria: String,

    /// Nationality bucket: europeus, latinos, asiaticos, oriente_medio, balcas, nordicos
    #[arg(long)]
    pub nacionalidade: Option<String>,

    /// CEO gender: masculino or feminino
    #[arg(long)]
    pub ceo_genero: Option<String>,

    #[arg(long)]
    pub executivos_homens: Option<u32>,

    #[arg(long)]
    pub executivos_mulheres: Option<u32>,

    #[arg(long)]
    pub assistentes_homens: Option<u32>,

    #[arg(long)]
    pub assistentes_mulheres: Option<u32>,

    /// Specialties to staff, comma separated (default: all six)
    #[arg(long, value_delimiter = ',')]
    pub especialistas: Option<Vec<String>>,

    /// How many specialists (by position in the list) are male
    #[arg(long, default_value_t = 3)]
    pub especialistas_homens: u32,

    /// Extra languages added to every persona's pool, comma separated
    #[arg(long, value_delimiter = ',')]
    pub idiomas_extras: Option<Vec<String>>,

    /// RNG seed for reproducible companies
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Verifies that the CLI definition is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["vcm-pipeline", "generate", "--empresa-codigo", "ACME"]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.stage.empresa_codigo, "ACME");
                assert_eq!(args.industria, "tecnologia");
                assert!(args.nacionalidade.is_none());
                assert_eq!(args.especialistas_homens, 3);
                assert!(args.seed.is_none());
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_with_specialties() {
        let cli = Cli::parse_from([
            "vcm-pipeline",
            "generate",
            "--empresa-codigo",
            "ACME",
            "--especialistas",
            "hr,tecnologia",
            "--seed",
            "42",
        ]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(
                    args.especialistas,
                    Some(vec!["hr".to_string(), "tecnologia".to_string()])
                );
                assert_eq!(args.seed, Some(42));
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_stage_command() {
        let cli = Cli::parse_from(["vcm-pipeline", "competencias", "--empresa-codigo", "ACME"]);
        match cli.command {
            Commands::Competencias(args) => {
                assert_eq!(args.empresa_codigo, "ACME");
                assert!(args.data_dir.is_none());
            }
            _ => panic!("Expected Competencias command"),
        }
    }

    #[test]
    fn test_stage_path_overrides() {
        let cli = Cli::parse_from([
            "vcm-pipeline",
            "tech-specs",
            "--empresa-codigo",
            "ACME",
            "--input-path",
            "/tmp/custom.json",
            "--output-path",
            "/tmp/out",
        ]);
        match cli.command {
            Commands::TechSpecs(args) => {
                assert_eq!(args.input_path.as_deref(), Some("/tmp/custom.json"));
                assert_eq!(args.output_path.as_deref(), Some("/tmp/out"));
                assert!(args.input_dir.is_none());
            }
            _ => panic!("Expected TechSpecs command"),
        }
    }

    #[test]
    fn test_stage_requires_empresa_codigo() {
        let result = Cli::try_parse_from(["vcm-pipeline", "rag"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cascade_command() {
        let cli = Cli::parse_from([
            "vcm-pipeline",
            "cascade",
            "--empresa-codigo",
            "ACME",
            "--data-dir",
            "/tmp/companies",
        ]);
        match cli.command {
            Commands::Cascade(args) => {
                assert_eq!(args.data_dir, Some("/tmp/companies".to_string()));
            }
            _ => panic!("Expected Cascade command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["vcm-pipeline", "-vv", "version"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::parse_from(["vcm-pipeline", "--quiet", "version"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_config_show() {
        let cli = Cli::parse_from(["vcm-pipeline", "config", "show"]);
        match cli.command {
            Commands::Config { subcommand: ConfigSubcommand::Show { config } } => {
                assert!(config.is_none());
            }
            _ => panic!("Expected Config Show command"),
        }
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["vcm-pipeline", "config", "init", "--force"]);
        match cli.command {
            Commands::Config { subcommand: ConfigSubcommand::Init { path, force } } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
