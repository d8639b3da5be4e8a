//! Stage 1 — derive technical/behavioural competencies and tools per persona.
//!
//! Selection is a pure function of (category, specialty): the catalogs below
//! are fixed, three universal behavioural entries are always appended, and
//! the result is deduplicated in first-occurrence order and truncated to at
//! most 7 technical, 6 behavioural and 7 tool entries.

use std::collections::BTreeMap;

use pulldown_cmark::{Event, Parser};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::persona::{Category, PersonasConfig, Specialty};

use super::workspace::CompanyWorkspace;
use super::{Artifact, Stage, StageReport};

// ─────────────────────────────────────────────────────────────────
// Catalogs
// ─────────────────────────────────────────────────────────────────

/// Behavioural competencies every persona receives.
const COMPORTAMENTAIS_UNIVERSAIS: &[&str] = &[
    "Trabalho em Equipe",
    "Comunicação Eficaz",
    "Orientação a Resultados",
];

const MAX_TECNICAS: usize = 7;
const MAX_COMPORTAMENTAIS: usize = 6;
const MAX_FERRAMENTAS: usize = 7;

/// Catalog triple: (technical, behavioural, tools).
type Catalog = (
    &'static [&'static str],
    &'static [&'static str],
    &'static [&'static str],
);

fn catalogo_especialidade(especialidade: Specialty) -> Catalog {
    match especialidade {
        Specialty::Hr => (
            &[
                "Gestão de Talentos",
                "Recrutamento e Seleção",
                "Desenvolvimento Organizacional",
                "Gestão de Performance",
                "Políticas de RH",
                "Employee Experience",
                "People Analytics",
            ],
            &[
                "Liderança Empática",
                "Comunicação Assertiva",
                "Mediação de Conflitos",
                "Pensamento Estratégico",
                "Orientação a Pessoas",
                "Adaptabilidade Cultural",
            ],
            &[
                "HRIS Systems",
                "ATS (Applicant Tracking Systems)",
                "Microsoft Office 365",
                "Google Workspace",
                "Slack",
                "Zoom",
                "LinkedIn Recruiter",
            ],
        ),
        Specialty::Youtube => (
            &[
                "Produção de Vídeo",
                "Edição de Vídeo",
                "YouTube Analytics",
                "SEO para YouTube",
                "Marketing de Conteúdo",
                "Storytelling Digital",
                "Live Streaming",
            ],
            &[
                "Criatividade",
                "Comunicação Visual",
                "Persistência",
                "Orientação a Resultados",
                "Adaptabilidade",
                "Inovação",
            ],
            &[
                "Adobe Premiere Pro",
                "Final Cut Pro",
                "Adobe After Effects",
                "Photoshop",
                "YouTube Studio",
                "TubeBuddy",
                "VidIQ",
            ],
        ),
        Specialty::MidiasSociais => (
            &[
                "Social Media Marketing",
                "Community Management",
                "Gestão de Campanhas",
                "Analytics e Métricas",
                "Influencer Marketing",
                "Paid Social Advertising",
            ],
            &[
                "Comunicação Digital",
                "Criatividade",
                "Agilidade",
                "Orientação a Tendências",
                "Trabalho em Equipe",
                "Resolução de Problemas",
            ],
            &[
                "Facebook Business Manager",
                "Instagram Creator Studio",
                "Hootsuite",
                "Buffer",
                "Canva",
                "Adobe Creative Suite",
                "Google Analytics",
            ],
        ),
        Specialty::Marketing => (
            &[
                "Marketing Digital",
                "Growth Hacking",
                "Marketing Analytics",
                "Automação de Marketing",
                "Inbound Marketing",
                "Performance Marketing",
            ],
            &[
                "Pensamento Analítico",
                "Orientação a Dados",
                "Inovação",
                "Visão Estratégica",
                "Adaptabilidade",
                "Orientação a Resultados",
            ],
            &[
                "Google Ads",
                "Facebook Ads",
                "HubSpot",
                "Mailchimp",
                "Google Analytics",
                "SEMrush",
                "Hotjar",
            ],
        ),
        Specialty::Financeiro => (
            &[
                "Análise Financeira",
                "Controladoria",
                "Planejamento Financeiro",
                "Gestão de Riscos",
                "Auditoria",
                "Compliance Financeiro",
            ],
            &[
                "Precisão",
                "Pensamento Analítico",
                "Orientação a Detalhes",
                "Ética Profissional",
                "Comunicação Técnica",
                "Gestão de Pressão",
            ],
            &[
                "Excel Avançado",
                "SAP",
                "Power BI",
                "QuickBooks",
                "Tableau",
                "SQL",
                "Python/R para Finanças",
            ],
        ),
        Specialty::Tecnologia => (
            &[
                "Desenvolvimento de Software",
                "DevOps",
                "Cloud Computing",
                "Arquitetura de Sistemas",
                "Segurança da Informação",
                "Integração de APIs",
            ],
            &[
                "Pensamento Lógico",
                "Resolução de Problemas",
                "Aprendizagem Contínua",
                "Colaboração",
                "Atenção aos Detalhes",
                "Inovação Tecnológica",
            ],
            &[
                "Git/GitHub",
                "Docker",
                "Kubernetes",
                "AWS/Azure/GCP",
                "Jenkins",
                "MongoDB/PostgreSQL",
                "React/Node.js",
            ],
        ),
    }
}

fn catalogo_executivos() -> Catalog {
    (
        &[
            "Gestão Estratégica",
            "Liderança de Equipes",
            "Planejamento Empresarial",
            "Análise de Mercado",
            "Gestão de Mudanças",
            "Business Intelligence",
        ],
        &[
            "Liderança Visionária",
            "Pensamento Estratégico",
            "Tomada de Decisão",
            "Comunicação Executiva",
            "Negociação",
            "Influência",
        ],
        &[
            "Microsoft Office 365",
            "Google Workspace",
            "Slack",
            "Zoom",
            "Power BI",
            "Tableau",
        ],
    )
}

fn catalogo_assistentes() -> Catalog {
    (
        &[
            "Gestão Administrativa",
            "Organização de Agendas",
            "Comunicação Empresarial",
            "Suporte Executivo",
            "Gestão Documental",
            "Coordenação de Reuniões",
        ],
        &[
            "Organização",
            "Proatividade",
            "Discrição",
            "Multitasking",
            "Comunicação Eficaz",
            "Orientação ao Cliente Interno",
        ],
        &[
            "Microsoft Office 365",
            "Google Workspace",
            "Slack",
            "Zoom",
            "Trello",
            "Notion",
        ],
    )
}

// ─────────────────────────────────────────────────────────────────
// Output types
// ─────────────────────────────────────────────────────────────────

/// Derived competency set for one persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyProfile {
    pub tecnicas: Vec<String>,
    pub comportamentais: Vec<String>,
    pub ferramentas: Vec<String>,
}

/// Identity facts repeated in every per-persona artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaResumo {
    pub nome: String,
    pub categoria: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidade: Option<Specialty>,
    pub experiencia: u32,
}

/// What the biography analysis extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiografiaAnalise {
    pub educacao: String,
    pub idiomas: Vec<String>,
    pub secoes_extraidas: Vec<String>,
}

/// Per-persona slice written to `script1_competencias/competencias_core.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaCompetencias {
    pub persona: PersonaResumo,
    pub competencias: CompetencyProfile,
    pub analise_biografia: BiografiaAnalise,
    pub data_processamento: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetenciasUnicas {
    pub tecnicas: Vec<String>,
    pub comportamentais: Vec<String>,
    pub ferramentas: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstatisticasCompetencias {
    pub por_categoria: BTreeMap<String, u32>,
    pub por_especialidade: BTreeMap<String, u32>,
    pub competencias_unicas: CompetenciasUnicas,
}

/// Consolidated artifact, `competencias_analysis.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetenciasAnalysis {
    pub empresa_codigo: String,
    pub run_id: String,
    pub data_processamento: String,
    pub total_personas: u32,
    pub personas: BTreeMap<String, PersonaCompetencias>,
    pub estatisticas: EstatisticasCompetencias,
}

// ─────────────────────────────────────────────────────────────────
// Derivation
// ─────────────────────────────────────────────────────────────────

/// Derive the competency profile for a persona.
///
/// Deterministic: the same (category, specialty, role) always yields the
/// same profile. Unknown combinations yield an empty base catalog (plus the
/// universal behavioural entries) and a logged warning.
pub fn derive_competencias(
    nome: &str,
    categoria: Category,
    especialidade: Option<Specialty>,
) -> CompetencyProfile {
    let catalog = if categoria == Category::Executivos || nome.contains("CEO") {
        Some(catalogo_executivos())
    } else if categoria == Category::Assistentes {
        Some(catalogo_assistentes())
    } else if categoria == Category::Especialistas {
        match especialidade {
            Some(esp) => Some(catalogo_especialidade(esp)),
            None => {
                warn!(persona = %nome, "Specialist without specialty, deriving empty profile");
                None
            }
        }
    } else {
        None
    };

    let (tecnicas, comportamentais, ferramentas) = catalog.unwrap_or((&[], &[], &[]));

    let mut comportamentais: Vec<String> =
        comportamentais.iter().map(|s| s.to_string()).collect();
    comportamentais.extend(COMPORTAMENTAIS_UNIVERSAIS.iter().map(|s| s.to_string()));

    CompetencyProfile {
        tecnicas: dedup_truncate(
            tecnicas.iter().map(|s| s.to_string()).collect(),
            MAX_TECNICAS,
        ),
        comportamentais: dedup_truncate(comportamentais, MAX_COMPORTAMENTAIS),
        ferramentas: dedup_truncate(
            ferramentas.iter().map(|s| s.to_string()).collect(),
            MAX_FERRAMENTAS,
        ),
    }
}

/// Deduplicate in first-occurrence order, then truncate.
fn dedup_truncate(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out: Vec<String> = items.into_iter().filter(|i| seen.insert(i.clone())).collect();
    out.truncate(limit);
    out
}

// ─────────────────────────────────────────────────────────────────
// Biography analysis
// ─────────────────────────────────────────────────────────────────

/// Biography section headers extracted for the analysis block.
fn secao_patterns() -> Vec<(&'static str, Regex)> {
    let patterns = [
        ("formacao", r"(?s)## FORMAÇÃO ACADÊMICA\s*(.*?)(?:\n## |\z)"),
        ("experiencia", r"(?s)## EXPERIÊNCIA PROFISSIONAL\s*(.*?)(?:\n## |\z)"),
        (
            "competencias_tecnicas",
            r"(?s)## COMPETÊNCIAS TÉCNICAS\s*(.*?)(?:\n## |\z)",
        ),
        (
            "competencias_comportamentais",
            r"(?s)## COMPETÊNCIAS COMPORTAMENTAIS\s*(.*?)(?:\n## |\z)",
        ),
        (
            "responsabilidades",
            r"(?s)## RESPONSABILIDADES NA .*?\n(.*?)(?:\n## |\z)",
        ),
    ];
    patterns
        .into_iter()
        .map(|(name, pattern)| (name, Regex::new(pattern).expect("static section pattern")))
        .collect()
}

/// Section names found in a biography, in pattern order.
pub fn extrair_secoes(biografia: &str) -> Vec<String> {
    secao_patterns()
        .iter()
        .filter(|(_, re)| {
            re.captures(biografia)
                .and_then(|c| c.get(1))
                .is_some_and(|m| !m.as_str().trim().is_empty())
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Strip markdown down to plain text.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(_) => {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }
    text.trim().to_string()
}

// ─────────────────────────────────────────────────────────────────
// Stage runner
// ─────────────────────────────────────────────────────────────────

/// Run stage 1 for a company.
pub fn run(workspace: &CompanyWorkspace) -> Result<StageReport> {
    let config: PersonasConfig = workspace.load_artifact(Artifact::PersonasConfig)?;
    let persona_dirs = workspace.list_persona_dirs()?;

    let mut analysis = CompetenciasAnalysis {
        empresa_codigo: workspace.codigo().to_string(),
        run_id: format!("run-{}", &uuid::Uuid::new_v4().to_string()[..8]),
        data_processamento: chrono::Utc::now().to_rfc3339(),
        total_personas: 0,
        personas: BTreeMap::new(),
        estatisticas: EstatisticasCompetencias::default(),
    };

    let mut tecnicas_unicas = Vec::new();
    let mut comportamentais_unicas = Vec::new();
    let mut ferramentas_unicas = Vec::new();

    for (categoria_slug, folder, persona_path) in persona_dirs {
        // Per-persona failures are recovered locally: log and move on.
        let result = process_persona(workspace, &config, &categoria_slug, &folder, &persona_path);
        let persona_comp = match result {
            Ok(Some(pc)) => pc,
            Ok(None) => continue,
            Err(e) => {
                warn!(persona = %folder, error = %e, "Persona skipped");
                continue;
            }
        };

        *analysis
            .estatisticas
            .por_categoria
            .entry(categoria_slug.clone())
            .or_insert(0) += 1;
        if let Some(esp) = persona_comp.persona.especialidade {
            *analysis
                .estatisticas
                .por_especialidade
                .entry(esp.slug().to_string())
                .or_insert(0) += 1;
        }

        collect_unique(&mut tecnicas_unicas, &persona_comp.competencias.tecnicas);
        collect_unique(
            &mut comportamentais_unicas,
            &persona_comp.competencias.comportamentais,
        );
        collect_unique(&mut ferramentas_unicas, &persona_comp.competencias.ferramentas);

        analysis.total_personas += 1;
        analysis.personas.insert(folder, persona_comp);
    }

    analysis.estatisticas.competencias_unicas = CompetenciasUnicas {
        tecnicas: tecnicas_unicas,
        comportamentais: comportamentais_unicas,
        ferramentas: ferramentas_unicas,
    };

    let output = workspace.artifact_path(Artifact::CompetenciasAnalysis);
    workspace.write_json(&output, &analysis)?;

    info!(
        empresa = %workspace.codigo(),
        personas = analysis.total_personas,
        tecnicas = analysis.estatisticas.competencias_unicas.tecnicas.len(),
        ferramentas = analysis.estatisticas.competencias_unicas.ferramentas.len(),
        "Stage 1 (competencias) finished"
    );

    Ok(StageReport {
        stage: Stage::Competencias,
        items: analysis.total_personas as usize,
        output,
    })
}

/// Analyse one persona directory; `Ok(None)` means there was nothing to do.
fn process_persona(
    workspace: &CompanyWorkspace,
    config: &PersonasConfig,
    categoria_slug: &str,
    folder: &str,
    persona_path: &std::path::Path,
) -> Result<Option<PersonaCompetencias>> {
    let bio_path = match workspace.find_bio_file(persona_path)? {
        Some(p) => p,
        None => {
            warn!(persona = %folder, "Biography not found, skipping");
            return Ok(None);
        }
    };
    let biografia = std::fs::read_to_string(&bio_path)
        .map_err(|e| crate::error::Error::io_read(&bio_path, e))?;
    tracing::debug!(
        persona = %folder,
        texto_chars = markdown_to_text(&biografia).len(),
        "Biography parsed"
    );

    // Prefer the persona record; fall back to basic facts derived from the
    // directory when the config predates this folder.
    let (resumo, analise) = match config.find_by_folder(folder) {
        Some(record) => (
            PersonaResumo {
                nome: record.nome_completo.clone(),
                categoria: record.categoria,
                especialidade: record.especialidade,
                experiencia: record.anos_experiencia,
            },
            BiografiaAnalise {
                educacao: record.educacao.clone(),
                idiomas: record.idiomas.clone(),
                secoes_extraidas: extrair_secoes(&biografia),
            },
        ),
        None => {
            warn!(persona = %folder, "No config entry, using defaults");
            let categoria = categoria_slug.parse().unwrap_or(Category::Especialistas);
            (
                PersonaResumo {
                    nome: folder.replace('_', " "),
                    categoria,
                    especialidade: None,
                    experiencia: 5,
                },
                BiografiaAnalise {
                    educacao: "Ensino Superior".to_string(),
                    idiomas: vec!["português".to_string(), "inglês".to_string()],
                    secoes_extraidas: extrair_secoes(&biografia),
                },
            )
        }
    };

    let competencias = derive_competencias(&resumo.nome, resumo.categoria, resumo.especialidade);

    let persona_comp = PersonaCompetencias {
        persona: resumo,
        competencias,
        analise_biografia: analise,
        data_processamento: chrono::Utc::now().to_rfc3339(),
    };

    let stage_dir = workspace.stage_dir(persona_path, Stage::Competencias)?;
    workspace.write_json(&stage_dir.join("competencias_core.json"), &persona_comp)?;

    Ok(Some(persona_comp))
}

/// Append new entries preserving first-occurrence order.
fn collect_unique(into: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !into.contains(item) {
            into.push(item.clone());
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
    fn test_profile_bounds_all_specialties() {
        for esp in Specialty::all() {
            let profile = derive_competencias("X", Category::Especialistas, Some(*esp));
            assert!(profile.tecnicas.len() <= MAX_TECNICAS);
            assert!(profile.comportamentais.len() <= MAX_COMPORTAMENTAIS);
            assert!(profile.ferramentas.len() <= MAX_FERRAMENTAS);
            assert_no_duplicates(&profile.tecnicas);
            assert_no_duplicates(&profile.comportamentais);
            assert_no_duplicates(&profile.ferramentas);
        }
    }

    fn assert_no_duplicates(items: &[String]) {
        let unique: std::collections::HashSet<_> = items.iter().collect();
        assert_eq!(unique.len(), items.len(), "{:?}", items);
    }

    #[test]
    fn test_executive_profile() {
        let profile = derive_competencias("Ana Silva", Category::Executivos, None);
        assert!(profile.tecnicas.contains(&"Gestão Estratégica".to_string()));
        assert!(profile.ferramentas.contains(&"Power BI".to_string()));
        // Universal entries present even though the executive catalog
        // already fills most behavioural slots
        assert!(profile.comportamentais.len() == MAX_COMPORTAMENTAIS);
    }

    #[test]
    fn test_ceo_name_forces_executive_catalog() {
        // The CEO lives under executivos anyway, but the name check also
        // catches records tagged otherwise
        let profile = derive_competencias("CEO Maria Lopez", Category::Especialistas, None);
        assert!(profile.tecnicas.contains(&"Gestão Estratégica".to_string()));
    }

    #[test]
    fn test_specialist_without_specialty_is_empty_but_universal() {
        let profile = derive_competencias("X", Category::Especialistas, None);
        assert!(profile.tecnicas.is_empty());
        assert!(profile.ferramentas.is_empty());
        assert_eq!(
            profile.comportamentais,
            COMPORTAMENTAIS_UNIVERSAIS
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_universal_behaviorals_deduplicate() {
        // midias_sociais already contains "Trabalho em Equipe"
        let profile =
            derive_competencias("X", Category::Especialistas, Some(Specialty::MidiasSociais));
        let count = profile
            .comportamentais
            .iter()
            .filter(|c| c.as_str() == "Trabalho em Equipe")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_competencias("Ana", Category::Especialistas, Some(Specialty::Financeiro));
        let b = derive_competencias("Ana", Category::Especialistas, Some(Specialty::Financeiro));
        assert_eq!(a, b);
    }

    #[test]
    fn test_dedup_truncate_keeps_first_occurrence() {
        let items = vec!["a", "b", "a", "c", "b", "d"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(dedup_truncate(items, 3), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_extrair_secoes() {
        let bio = "# Ana\n\n## FORMAÇÃO ACADÊMICA\nMBA\n\n## EXPERIÊNCIA PROFISSIONAL\n10 anos\n\n## COMPETÊNCIAS TÉCNICAS\n- SQL\n";
        let secoes = extrair_secoes(bio);
        assert_eq!(
            secoes,
            vec!["formacao", "experiencia", "competencias_tecnicas"]
        );
    }

    #[test]
    fn test_markdown_to_text_strips_formatting() {
        let text = markdown_to_text("# Title\n\nSome **bold** and `code` text");
        assert!(text.contains("Title"));
        assert!(text.contains("bold"));
        assert!(!text.contains("**"));
        assert!(!text.contains('`'));
    }
}
