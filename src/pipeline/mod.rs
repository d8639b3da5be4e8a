//! The five-stage generation pipeline and its orchestration.
//!
//! Stages form an explicit chain: each one declares the artifacts it reads
//! and the artifact it writes. Individual commands run a single stage and
//! fail fast when an input artifact is missing; `cascade` validates the
//! biography precondition once and then runs stages 1-5 in order.

pub mod biografias;
pub mod competencias;
pub mod fluxos;
pub mod rag;
pub mod tech_specs;
pub mod workflows;
pub mod workspace;

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use workspace::CompanyWorkspace;

// ─────────────────────────────────────────────────────────────────
// Artifacts
// ─────────────────────────────────────────────────────────────────

/// The consolidated JSON artifacts exchanged between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    PersonasConfig,
    CompetenciasAnalysis,
    TechSpecifications,
    RagKnowledgeBase,
    FluxosAnalise,
    N8nWorkflows,
}

impl Artifact {
    /// File name inside the company directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::PersonasConfig => "personas_config.json",
            Artifact::CompetenciasAnalysis => "competencias_analysis.json",
            Artifact::TechSpecifications => "tech_specifications.json",
            Artifact::RagKnowledgeBase => "rag_knowledge_base.json",
            Artifact::FluxosAnalise => "fluxos_analise_completa.json",
            Artifact::N8nWorkflows => "n8n_workflows_completo.json",
        }
    }

    /// Human-readable name for error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Artifact::PersonasConfig => "Personas config",
            Artifact::CompetenciasAnalysis => "Competency analysis",
            Artifact::TechSpecifications => "Technical specifications",
            Artifact::RagKnowledgeBase => "RAG knowledge base",
            Artifact::FluxosAnalise => "Flow analysis",
            Artifact::N8nWorkflows => "N8N workflow summary",
        }
    }

    /// The stage that writes this artifact.
    pub fn produced_by(&self) -> Stage {
        match self {
            Artifact::PersonasConfig => Stage::Biografias,
            Artifact::CompetenciasAnalysis => Stage::Competencias,
            Artifact::TechSpecifications => Stage::TechSpecs,
            Artifact::RagKnowledgeBase => Stage::Rag,
            Artifact::FluxosAnalise => Stage::Fluxos,
            Artifact::N8nWorkflows => Stage::Workflows,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Stages
// ─────────────────────────────────────────────────────────────────

/// Pipeline stages in execution order. Biografias is stage 0; the cascade
/// runs stages 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Biografias,
    Competencias,
    TechSpecs,
    Rag,
    Fluxos,
    Workflows,
}

impl Stage {
    /// CLI command slug.
    pub fn slug(&self) -> &'static str {
        match self {
            Stage::Biografias => "generate",
            Stage::Competencias => "competencias",
            Stage::TechSpecs => "tech-specs",
            Stage::Rag => "rag",
            Stage::Fluxos => "fluxos",
            Stage::Workflows => "workflows",
        }
    }

    /// Artifacts this stage reads.
    pub fn inputs(&self) -> &'static [Artifact] {
        match self {
            Stage::Biografias => &[],
            Stage::Competencias => &[Artifact::PersonasConfig],
            Stage::TechSpecs => &[Artifact::CompetenciasAnalysis],
            Stage::Rag => &[Artifact::CompetenciasAnalysis, Artifact::TechSpecifications],
            Stage::Fluxos => &[Artifact::RagKnowledgeBase],
            Stage::Workflows => &[Artifact::FluxosAnalise],
        }
    }

    /// Artifact this stage writes.
    pub fn output(&self) -> Artifact {
        match self {
            Stage::Biografias => Artifact::PersonasConfig,
            Stage::Competencias => Artifact::CompetenciasAnalysis,
            Stage::TechSpecs => Artifact::TechSpecifications,
            Stage::Rag => Artifact::RagKnowledgeBase,
            Stage::Fluxos => Artifact::FluxosAnalise,
            Stage::Workflows => Artifact::N8nWorkflows,
        }
    }

    /// Per-persona slice directory name, where the stage writes one.
    pub fn persona_dir_name(&self) -> Option<&'static str> {
        match self {
            Stage::Biografias => None,
            Stage::Competencias => Some("script1_competencias"),
            Stage::TechSpecs => Some("script2_techspecs"),
            Stage::Rag => Some("script3_rag"),
            Stage::Fluxos => Some("script4_fluxos"),
            Stage::Workflows => Some("script5_n8n"),
        }
    }

    /// The cascade order, stages 1-5.
    pub fn cascade() -> &'static [Stage] {
        &[
            Stage::Competencias,
            Stage::TechSpecs,
            Stage::Rag,
            Stage::Fluxos,
            Stage::Workflows,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

// ─────────────────────────────────────────────────────────────────
// Stage report
// ─────────────────────────────────────────────────────────────────

/// Summary of one stage run, for CLI output.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    /// Personas (or workflows, for stage 5) processed.
    pub items: usize,
    /// The consolidated artifact written.
    pub output: PathBuf,
}

// ─────────────────────────────────────────────────────────────────
// Cascade
// ─────────────────────────────────────────────────────────────────

/// Run stages 1-5 in order against existing biographies.
///
/// The chain is validated up front: biographies must exist, and every stage
/// writes the artifact the next one reads, so no mid-cascade prerequisite
/// check can fail for a missing file.
pub fn run_cascade(
    workspace: &CompanyWorkspace,
    config: &PipelineConfig,
) -> Result<Vec<StageReport>> {
    workspace.require_personas_dir()?;
    workspace.require_artifact(Artifact::PersonasConfig)?;

    let mut reports = Vec::new();
    for stage in Stage::cascade() {
        info!(stage = %stage, empresa = %workspace.codigo(), "Cascade stage starting");
        let report = run_stage(*stage, workspace, config)?;
        reports.push(report);
    }
    Ok(reports)
}

/// Dispatch a single stage run.
pub fn run_stage(
    stage: Stage,
    workspace: &CompanyWorkspace,
    config: &PipelineConfig,
) -> Result<StageReport> {
    match stage {
        Stage::Biografias => Err(crate::error::Error::stage_failed(
            Stage::Biografias.slug(),
            "stage 0 needs a company setup; run it through the generate command",
        )),
        Stage::Competencias => competencias::run(workspace),
        Stage::TechSpecs => tech_specs::run(workspace),
        Stage::Rag => rag::run(workspace),
        Stage::Fluxos => fluxos::run(workspace, &config.analysis),
        Stage::Workflows => workflows::run(workspace),
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_chain_is_closed() {
        // Every input of a cascade stage is produced by an earlier stage.
        let mut produced = vec![Artifact::PersonasConfig];
        for stage in Stage::cascade() {
            for input in stage.inputs() {
                assert!(
                    produced.contains(input),
                    "stage {} reads {:?} before it is produced",
                    stage,
                    input
                );
            }
            produced.push(stage.output());
        }
    }

    #[test]
    fn test_artifact_producers_match_outputs() {
        for stage in Stage::cascade() {
            assert_eq!(stage.output().produced_by(), *stage);
        }
        assert_eq!(
            Artifact::PersonasConfig.produced_by(),
            Stage::Biografias
        );
    }

    #[test]
    fn test_artifact_file_names() {
        assert_eq!(Artifact::RagKnowledgeBase.file_name(), "rag_knowledge_base.json");
        assert_eq!(Artifact::FluxosAnalise.file_name(), "fluxos_analise_completa.json");
        assert_eq!(Artifact::N8nWorkflows.file_name(), "n8n_workflows_completo.json");
    }

    #[test]
    fn test_persona_dir_names() {
        assert_eq!(Stage::Competencias.persona_dir_name(), Some("script1_competencias"));
        assert_eq!(Stage::Workflows.persona_dir_name(), Some("script5_n8n"));
        assert_eq!(Stage::Biografias.persona_dir_name(), None);
    }
}
