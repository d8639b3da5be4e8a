//! VCM Pipeline - Virtual Company Manager generator
//!
//! This is the main entry point for the vcm-pipeline binary. It generates
//! synthetic company personas and runs the five derivation stages
//! (competencies, tech specs, RAG knowledge base, flow analysis, N8N
//! workflows) over the company's on-disk workspace.

mod cli;
mod config;
mod error;
mod logging;
mod persona;
mod pipeline;
mod version;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands, ConfigSubcommand, GenerateArgs, StageArgs};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::persona::{CompanyProfile, CompanySetup, Specialty};
use crate::pipeline::workspace::CompanyWorkspace;
use crate::pipeline::{biografias, run_cascade, run_stage, Stage, StageReport};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            version::print_version();
            Ok(())
        }
        Commands::Config { subcommand } => {
            // Config commands use minimal logging
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)
        }
        Commands::Generate(args) => {
            let config = load_config(&args.stage, cli.verbose, cli.quiet)?;
            let _guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;
            log_startup();
            run_generate(&args, &config)
        }
        Commands::Competencias(args) => {
            run_single_stage(Stage::Competencias, args, cli.verbose, cli.quiet)
        }
        Commands::TechSpecs(args) => run_single_stage(Stage::TechSpecs, args, cli.verbose, cli.quiet),
        Commands::Rag(args) => run_single_stage(Stage::Rag, args, cli.verbose, cli.quiet),
        Commands::Fluxos(args) => run_single_stage(Stage::Fluxos, args, cli.verbose, cli.quiet),
        Commands::Workflows(args) => {
            run_single_stage(Stage::Workflows, args, cli.verbose, cli.quiet)
        }
        Commands::Cascade(args) => {
            let config = load_config(&args, cli.verbose, cli.quiet)?;
            let _guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;
            log_startup();
            let workspace = workspace_for(&args, &config);
            let reports = run_cascade(&workspace, &config)?;
            for report in &reports {
                print_report(report);
            }
            println!(
                "Cascade finalizado: {} estágios executados para {}",
                reports.len(),
                workspace.codigo()
            );
            Ok(())
        }
    }
}

/// Load configuration; config errors bypass logging setup.
fn load_config(args: &StageArgs, _verbose: u8, _quiet: bool) -> Result<PipelineConfig> {
    PipelineConfig::load(args.config.as_deref())
}

fn log_startup() {
    let build = version::build_info();
    info!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting VCM Pipeline"
    );
}

fn workspace_for(args: &StageArgs, config: &PipelineConfig) -> CompanyWorkspace {
    match &args.output_path {
        Some(root) => CompanyWorkspace::at_root(root, &args.empresa_codigo),
        None => {
            let data_dir = args
                .data_dir
                .clone()
                .unwrap_or_else(|| config.storage.data_dir.clone());
            CompanyWorkspace::new(data_dir, &args.empresa_codigo)
        }
    }
}

/// Run one derivation stage and print its summary.
fn run_single_stage(stage: Stage, args: StageArgs, verbose: u8, quiet: bool) -> Result<()> {
    let config = load_config(&args, verbose, quiet)?;
    let _guards = logging::init_logging(&config.logging, verbose, quiet)?;
    log_startup();

    let mut workspace = workspace_for(&args, &config);
    if let Some(input) = args.input_path.as_ref().or(args.input_dir.as_ref()) {
        if let Some(artifact) = stage.inputs().first() {
            workspace = workspace.with_input_override(*artifact, input);
        }
    }

    let report = run_stage(stage, &workspace, &config)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &StageReport) {
    println!(
        "Estágio {} finalizado: {} itens, artefato em {}",
        report.stage,
        report.items,
        report.output.display()
    );
}

/// Handle `generate`: build the company setup from flags + config defaults.
fn run_generate(args: &GenerateArgs, config: &PipelineConfig) -> Result<()> {
    let generation = &config.generation;

    let nacionalidade = args
        .nacionalidade
        .as_deref()
        .unwrap_or(&generation.nacionalidade)
        .parse()?;
    let ceo_genero = args
        .ceo_genero
        .as_deref()
        .unwrap_or(&generation.ceo_genero)
        .parse()?;

    let especialidades: Vec<Specialty> = match &args.especialistas {
        Some(slugs) => slugs
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<_>>>()?,
        None => Specialty::all().to_vec(),
    };

    let codigo = args.stage.empresa_codigo.to_uppercase();
    let setup = CompanySetup {
        empresa: CompanyProfile {
            codigo: codigo.clone(),
            nome: args.nome.clone().unwrap_or_else(|| codigo.clone()),
            industria: args.industria.clone(),
        },
        nacionalidade,
        ceo_genero,
        executivos_homens: args
            .executivos_homens
            .unwrap_or(generation.executivos_homens),
        executivos_mulheres: args
            .executivos_mulheres
            .unwrap_or(generation.executivos_mulheres),
        assistentes_homens: args
            .assistentes_homens
            .unwrap_or(generation.assistentes_homens),
        assistentes_mulheres: args
            .assistentes_mulheres
            .unwrap_or(generation.assistentes_mulheres),
        especialidades,
        especialistas_homens: args.especialistas_homens,
        idiomas_extras: args
            .idiomas_extras
            .clone()
            .unwrap_or_else(|| generation.idiomas_extras.clone()),
        seed: args.seed,
    };

    let workspace = workspace_for(&args.stage, config);
    let report = biografias::run(&workspace, &setup)?;

    println!(
        "{} personas geradas para {} em {}",
        report.items,
        workspace.codigo(),
        workspace.root().display()
    );
    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = PipelineConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            config::init_config(path.as_deref(), force)?;
        }
        ConfigSubcommand::Validate { config } => {
            match PipelineConfig::load(config.as_deref()) {
                Ok(_) => {
                    println!("Configuration is valid.");
                }
                Err(e) => {
                    eprint!("{}", e.format_for_terminal());
                    std::process::exit(e.exit_code());
                }
            }
        }
    }

    Ok(())
}
