//! Stage 3 — consolidate personas, competencies and tech specs into a
//! cross-referenced knowledge base.
//!
//! "RAG" here means retrieval-ready structured JSON: deduplicated catalogs
//! with back-references, precomputed indices and embedding-ready text blobs.
//! No vectors are computed in this stage.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::persona::{Category, Specialty};

use super::competencias::CompetenciasAnalysis;
use super::tech_specs::TechSpecifications;
use super::workspace::CompanyWorkspace;
use super::{Artifact, Stage, StageReport};

// ─────────────────────────────────────────────────────────────────
// Competency levels
// ─────────────────────────────────────────────────────────────────

/// Qualitative proficiency scale inferred from years of experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetencyLevel {
    #[serde(rename = "básico")]
    Basico,
    #[serde(rename = "intermediário")]
    Intermediario,
    #[serde(rename = "avançado")]
    Avancado,
    #[serde(rename = "expert")]
    Expert,
}

/// Tools whose proficiency ramps quickly.
const FERRAMENTAS_BASICAS: &[&str] = &[
    "Microsoft Office 365",
    "Google Workspace",
    "Slack",
    "Zoom",
];

impl CompetencyLevel {
    /// Numeric weight for averaging (básico=1 ... expert=4).
    pub fn score(&self) -> u32 {
        match self {
            CompetencyLevel::Basico => 1,
            CompetencyLevel::Intermediario => 2,
            CompetencyLevel::Avancado => 3,
            CompetencyLevel::Expert => 4,
        }
    }

    /// Competency level from years of experience.
    pub fn from_experience(anos: u32) -> Self {
        if anos >= 10 {
            CompetencyLevel::Expert
        } else if anos >= 5 {
            CompetencyLevel::Avancado
        } else if anos >= 2 {
            CompetencyLevel::Intermediario
        } else {
            CompetencyLevel::Basico
        }
    }

    /// Tool proficiency; everyday tools ramp faster than specialized ones.
    pub fn tool_proficiency(ferramenta: &str, anos: u32) -> Self {
        if FERRAMENTAS_BASICAS.contains(&ferramenta) {
            return if anos >= 2 {
                CompetencyLevel::Avancado
            } else {
                CompetencyLevel::Intermediario
            };
        }
        if anos >= 7 {
            CompetencyLevel::Expert
        } else if anos >= 4 {
            CompetencyLevel::Avancado
        } else if anos >= 2 {
            CompetencyLevel::Intermediario
        } else {
            CompetencyLevel::Basico
        }
    }

    /// Bucket a weighted average back into the scale.
    pub fn from_average(media: f64) -> Self {
        if media >= 3.5 {
            CompetencyLevel::Expert
        } else if media >= 2.5 {
            CompetencyLevel::Avancado
        } else if media >= 1.5 {
            CompetencyLevel::Intermediario
        } else {
            CompetencyLevel::Basico
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Knowledge base types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagCompetencia {
    pub id: String,
    pub nome: String,
    /// "tecnica" or "comportamental".
    pub categoria: String,
    pub nivel: CompetencyLevel,
    pub contexto: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagFerramenta {
    pub id: String,
    pub nome: String,
    pub categoria_uso: String,
    pub nivel_proficiencia: CompetencyLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especificacoes: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagBiografia {
    pub educacao: String,
    pub idiomas: Vec<String>,
    pub secoes_extraidas: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagCompetencias {
    pub tecnicas: Vec<RagCompetencia>,
    pub comportamentais: Vec<RagCompetencia>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub tags: Vec<String>,
    pub embedding_text: String,
    pub update_timestamp: String,
}

/// One persona, structured for retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagPersona {
    pub id: u32,
    pub persona_key: String,
    pub nome_completo: String,
    pub categoria: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidade: Option<Specialty>,
    pub experiencia_anos: u32,
    pub biografia: RagBiografia,
    pub competencias: RagCompetencias,
    pub ferramentas: Vec<RagFerramenta>,
    pub search_metadata: SearchMetadata,
}

/// Back-reference from a catalog entry to a persona that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaRef {
    pub persona_id: u32,
    pub nome: String,
    pub nivel: CompetencyLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidade: Option<Specialty>,
}

/// Company-wide competency catalog entry, deduplicated by (name, category).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogoCompetencia {
    pub id: u32,
    pub nome: String,
    pub categoria: String,
    pub contexto: String,
    pub personas_possuidoras: Vec<PersonaRef>,
    pub ferramentas_relacionadas: Vec<String>,
    pub nivel_medio_calculado: CompetencyLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsuarioRef {
    pub persona_id: u32,
    pub nome: String,
    pub proficiencia: CompetencyLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidade: Option<Specialty>,
    pub categoria: Category,
}

/// Company-wide tool catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogoFerramenta {
    pub id: u32,
    pub nome: String,
    pub categoria_uso: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especificacoes_tecnicas: Option<Value>,
    pub usuarios: Vec<UsuarioRef>,
    pub casos_uso: Vec<String>,
    pub integracao_prioridade: String,
}

/// Precomputed lookup indices (ids into the `personas`/catalog arrays).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indices {
    pub por_persona: BTreeMap<String, u32>,
    pub por_especialidade: BTreeMap<String, Vec<u32>>,
    pub por_categoria: BTreeMap<String, Vec<u32>>,
    pub por_competencia: BTreeMap<String, u32>,
    pub por_ferramenta: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelPersonaCompetencia {
    pub persona_id: u32,
    pub competencia_nome: String,
    pub nivel: CompetencyLevel,
    pub categoria: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelPersonaFerramenta {
    pub persona_id: u32,
    pub ferramenta_nome: String,
    pub proficiencia: CompetencyLevel,
    pub categoria_uso: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relacionamentos {
    pub persona_competencia: Vec<RelPersonaCompetencia>,
    pub persona_ferramenta: Vec<RelPersonaFerramenta>,
}

/// A retrieval context: one per persona, unique competency and unique tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchContext {
    pub id: String,
    pub tipo: String,
    pub titulo: String,
    pub conteudo: String,
    pub metadata: Value,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagMetadata {
    pub total_personas: u32,
    pub total_competencias: u32,
    pub total_ferramentas: u32,
    pub total_contextos: u32,
    pub schema_version: String,
    pub embedding_ready: bool,
}

/// Consolidated artifact, `rag_knowledge_base.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagKnowledgeBase {
    pub empresa_codigo: String,
    pub versao_rag: String,
    pub data_criacao: String,
    pub personas: Vec<RagPersona>,
    pub competencias: Vec<CatalogoCompetencia>,
    pub ferramentas: Vec<CatalogoFerramenta>,
    pub indices: Indices,
    pub relacionamentos: Relacionamentos,
    pub contextos_busca: Vec<SearchContext>,
    pub metadata_rag: RagMetadata,
    pub query_templates: Value,
    pub embed_categories: Value,
}

impl RagKnowledgeBase {
    /// Check that every catalog back-reference points at an existing
    /// persona id. Returns the dangling references.
    pub fn dangling_references(&self) -> Vec<u32> {
        let ids: std::collections::HashSet<u32> = self.personas.iter().map(|p| p.id).collect();
        let mut dangling = Vec::new();
        for comp in &self.competencias {
            for pref in &comp.personas_possuidoras {
                if !ids.contains(&pref.persona_id) {
                    dangling.push(pref.persona_id);
                }
            }
        }
        for tool in &self.ferramentas {
            for uref in &tool.usuarios {
                if !ids.contains(&uref.persona_id) {
                    dangling.push(uref.persona_id);
                }
            }
        }
        dangling
    }
}

// ─────────────────────────────────────────────────────────────────
// Text helpers
// ─────────────────────────────────────────────────────────────────

/// Canned context sentences for well-known competencies.
fn contexto_competencia(competencia: &str, escopo: &str) -> String {
    match competencia {
        "Liderança" => {
            "Capacidade de guiar equipes e influenciar resultados organizacionais".to_string()
        }
        "Gestão de Projetos" => {
            "Coordenação de recursos, prazos e entregas para atingir objetivos".to_string()
        }
        "Marketing Digital" => {
            "Estratégias de promoção e engajamento em plataformas digitais".to_string()
        }
        "Análise de Dados" => {
            "Interpretação de informações para tomada de decisões estratégicas".to_string()
        }
        "Comunicação Eficaz" => {
            "Habilidade de transmitir ideias de forma clara e persuasiva".to_string()
        }
        "Trabalho em Equipe" => {
            "Colaboração produtiva com diferentes perfis profissionais".to_string()
        }
        _ => format!(
            "Competência em {} aplicada no contexto de {}",
            competencia, escopo
        ),
    }
}

/// Usage bucket of a tool.
fn categoria_uso_ferramenta(ferramenta: &str) -> &'static str {
    match ferramenta {
        "Microsoft Office 365" | "Google Workspace" => "produtividade_geral",
        "Slack" | "Zoom" => "comunicacao",
        "Power BI" | "Tableau" => "analytics",
        "Adobe Creative Suite" | "Figma" => "design",
        "Git/GitHub" => "desenvolvimento",
        "Docker" => "infraestrutura",
        _ => "especializada",
    }
}

/// Fixed-order embedding text; empty facts are omitted, not rendered blank.
fn embedding_text(persona: &RagPersona) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(format!(
        "{} trabalha como {}",
        persona.nome_completo,
        persona.categoria.slug()
    ));
    if let Some(esp) = persona.especialidade {
        parts.push(format!("especialista em {}", esp.slug()));
    }
    parts.push(format!(
        "com {} anos de experiência",
        persona.experiencia_anos
    ));
    if !persona.competencias.tecnicas.is_empty() {
        parts.push(format!(
            "competências técnicas: {}",
            join_names(&persona.competencias.tecnicas)
        ));
    }
    if !persona.competencias.comportamentais.is_empty() {
        parts.push(format!(
            "competências comportamentais: {}",
            join_names(&persona.competencias.comportamentais)
        ));
    }
    if !persona.ferramentas.is_empty() {
        let nomes: Vec<&str> = persona.ferramentas.iter().map(|f| f.nome.as_str()).collect();
        parts.push(format!("utiliza ferramentas: {}", nomes.join(", ")));
    }
    if !persona.biografia.educacao.is_empty() {
        parts.push(format!("educação: {}", persona.biografia.educacao));
    }
    if !persona.biografia.idiomas.is_empty() {
        parts.push(format!("idiomas: {}", persona.biografia.idiomas.join(", ")));
    }
    parts.join(". ")
}

fn join_names(comps: &[RagCompetencia]) -> String {
    comps
        .iter()
        .map(|c| c.nome.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Search tags: category, specialty, top-3 technical, top-2 behavioural.
fn tags_persona(persona: &RagPersona) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    push(persona.categoria.slug().to_string());
    if let Some(esp) = persona.especialidade {
        push(esp.slug().to_string());
    }
    for comp in persona.competencias.tecnicas.iter().take(3) {
        push(comp.nome.clone());
    }
    for comp in persona.competencias.comportamentais.iter().take(2) {
        push(comp.nome.clone());
    }
    tags
}

// ─────────────────────────────────────────────────────────────────
// Stage runner
// ─────────────────────────────────────────────────────────────────

/// Run stage 3 for a company.
pub fn run(workspace: &CompanyWorkspace) -> Result<StageReport> {
    let analysis: CompetenciasAnalysis =
        workspace.load_artifact(Artifact::CompetenciasAnalysis)?;
    let tech_specs: TechSpecifications =
        workspace.load_artifact(Artifact::TechSpecifications)?;

    // 1. Personas.
    let personas = estruturar_personas(&analysis, &tech_specs);

    // 2-3. Catalogs.
    let competencias = catalogo_competencias(&personas);
    let ferramentas = catalogo_ferramentas(&personas, &tech_specs);

    // 4. Indices, relationships, contexts.
    let indices = montar_indices(&personas, &competencias, &ferramentas);
    let relacionamentos = montar_relacionamentos(&personas);
    let contextos_busca = montar_contextos(&personas, &competencias, &ferramentas);

    let kb = RagKnowledgeBase {
        empresa_codigo: workspace.codigo().to_string(),
        versao_rag: "1.0.0".to_string(),
        data_criacao: chrono::Utc::now().to_rfc3339(),
        metadata_rag: RagMetadata {
            total_personas: personas.len() as u32,
            total_competencias: competencias.len() as u32,
            total_ferramentas: ferramentas.len() as u32,
            total_contextos: contextos_busca.len() as u32,
            schema_version: "1.0".to_string(),
            embedding_ready: true,
        },
        personas,
        competencias,
        ferramentas,
        indices,
        relacionamentos,
        contextos_busca,
        query_templates: query_templates(),
        embed_categories: embed_categories(),
    };

    // Catalog back-references must stay closed over personas[].
    let dangling = kb.dangling_references();
    if !dangling.is_empty() {
        return Err(crate::error::Error::Internal(format!(
            "knowledge base has dangling persona references: {:?}",
            dangling
        )));
    }

    // 5. Per-persona slices.
    for (_, folder, persona_path) in workspace.list_persona_dirs()? {
        let Some(persona) = kb.personas.iter().find(|p| p.persona_key == folder) else {
            continue;
        };

        let slice = json!({
            "persona_profile": persona,
            "relacionamentos": {
                "competencias_relacionadas": kb.relacionamentos.persona_competencia
                    .iter()
                    .filter(|rel| rel.persona_id == persona.id)
                    .collect::<Vec<_>>(),
                "ferramentas_relacionadas": kb.relacionamentos.persona_ferramenta
                    .iter()
                    .filter(|rel| rel.persona_id == persona.id)
                    .collect::<Vec<_>>(),
            },
            "contextos_relevantes": kb.contextos_busca
                .iter()
                .filter(|ctx| ctx.tags.iter().any(|t| persona.search_metadata.tags.contains(t)))
                .collect::<Vec<_>>(),
            "query_examples": query_examples(persona),
            "data_processamento": chrono::Utc::now().to_rfc3339(),
        });

        let stage_dir = workspace.stage_dir(&persona_path, Stage::Rag)?;
        workspace.write_json(&stage_dir.join("rag_knowledge.json"), &slice)?;
    }

    let output = workspace.artifact_path(Artifact::RagKnowledgeBase);
    workspace.write_json(&output, &kb)?;

    info!(
        empresa = %workspace.codigo(),
        personas = kb.metadata_rag.total_personas,
        competencias = kb.metadata_rag.total_competencias,
        ferramentas = kb.metadata_rag.total_ferramentas,
        contextos = kb.metadata_rag.total_contextos,
        "Stage 3 (rag) finished"
    );

    Ok(StageReport {
        stage: Stage::Rag,
        items: kb.metadata_rag.total_personas as usize,
        output,
    })
}

/// Structure each analysed persona for retrieval.
fn estruturar_personas(
    analysis: &CompetenciasAnalysis,
    tech_specs: &TechSpecifications,
) -> Vec<RagPersona> {
    let mut personas = Vec::new();
    let now = chrono::Utc::now().to_rfc3339();

    for (id, (folder, data)) in analysis.personas.iter().enumerate() {
        let id = id as u32 + 1;
        let experiencia = data.persona.experiencia;

        let tecnicas = data
            .competencias
            .tecnicas
            .iter()
            .enumerate()
            .map(|(idx, nome)| RagCompetencia {
                id: format!("{}_t_{}", id, idx + 1),
                nome: nome.clone(),
                categoria: "tecnica".to_string(),
                nivel: CompetencyLevel::from_experience(experiencia),
                contexto: contexto_competencia(
                    nome,
                    data.persona
                        .especialidade
                        .map(|e| e.slug())
                        .unwrap_or(data.persona.categoria.slug()),
                ),
            })
            .collect();

        let comportamentais = data
            .competencias
            .comportamentais
            .iter()
            .enumerate()
            .map(|(idx, nome)| RagCompetencia {
                id: format!("{}_c_{}", id, idx + 1),
                nome: nome.clone(),
                categoria: "comportamental".to_string(),
                nivel: CompetencyLevel::from_experience(experiencia),
                contexto: contexto_competencia(nome, data.persona.categoria.slug()),
            })
            .collect();

        let ferramentas = data
            .competencias
            .ferramentas
            .iter()
            .enumerate()
            .map(|(idx, nome)| RagFerramenta {
                id: format!("{}_f_{}", id, idx + 1),
                nome: nome.clone(),
                categoria_uso: categoria_uso_ferramenta(nome).to_string(),
                nivel_proficiencia: CompetencyLevel::tool_proficiency(nome, experiencia),
                especificacoes: especificacao_ferramenta(nome, tech_specs),
            })
            .collect();

        let mut persona = RagPersona {
            id,
            persona_key: folder.clone(),
            nome_completo: data.persona.nome.clone(),
            categoria: data.persona.categoria,
            especialidade: data.persona.especialidade,
            experiencia_anos: experiencia,
            biografia: RagBiografia {
                educacao: data.analise_biografia.educacao.clone(),
                idiomas: data.analise_biografia.idiomas.clone(),
                secoes_extraidas: data.analise_biografia.secoes_extraidas.clone(),
            },
            competencias: RagCompetencias {
                tecnicas,
                comportamentais,
            },
            ferramentas,
            search_metadata: SearchMetadata {
                tags: Vec::new(),
                embedding_text: String::new(),
                update_timestamp: now.clone(),
            },
        };
        persona.search_metadata.tags = tags_persona(&persona);
        persona.search_metadata.embedding_text = embedding_text(&persona);
        personas.push(persona);
    }

    personas
}

/// Technical spec summary for a tool, from the stage-2 category blocks.
fn especificacao_ferramenta(nome: &str, tech_specs: &TechSpecifications) -> Option<Value> {
    for spec in tech_specs.especificacoes_categorias.values() {
        if spec.ferramentas.iter().any(|f| f == nome) {
            return Some(json!({
                "categoria": spec.categoria,
                "api_integracao": spec.especificacoes.get("integracao_api"),
                "requisitos_sistema": spec.especificacoes.get("requisitos_sistema"),
                "funcionalidades": spec.especificacoes.get("funcionalidades_core"),
            }));
        }
    }
    None
}

/// Deduplicate competencies by (name, category), accumulating holders.
/// The rollup level is always recomputed from the full holder list.
fn catalogo_competencias(personas: &[RagPersona]) -> Vec<CatalogoCompetencia> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut map: HashMap<(String, String), (Vec<PersonaRef>, Vec<u32>, String)> = HashMap::new();

    for persona in personas {
        for comp in persona
            .competencias
            .tecnicas
            .iter()
            .chain(persona.competencias.comportamentais.iter())
        {
            let key = (comp.nome.clone(), comp.categoria.clone());
            let entry = map.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                (Vec::new(), Vec::new(), comp.contexto.clone())
            });
            entry.0.push(PersonaRef {
                persona_id: persona.id,
                nome: persona.nome_completo.clone(),
                nivel: comp.nivel,
                especialidade: persona.especialidade,
            });
            entry.1.push(comp.nivel.score());
        }
    }

    // Tools used by holders of a technical competency become related tools.
    let mut relacionadas: HashMap<(String, String), Vec<String>> = HashMap::new();
    for persona in personas {
        for comp in &persona.competencias.tecnicas {
            let key = (comp.nome.clone(), comp.categoria.clone());
            let tools = relacionadas.entry(key).or_default();
            for ferramenta in &persona.ferramentas {
                if !tools.contains(&ferramenta.nome) {
                    tools.push(ferramenta.nome.clone());
                }
            }
        }
    }

    order
        .into_iter()
        .enumerate()
        .map(|(idx, key)| {
            let (possuidoras, scores, contexto) = map.remove(&key).unwrap_or_default();
            let media = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<u32>() as f64 / scores.len() as f64
            };
            CatalogoCompetencia {
                id: idx as u32 + 1,
                nome: key.0.clone(),
                categoria: key.1.clone(),
                contexto,
                personas_possuidoras: possuidoras,
                ferramentas_relacionadas: relacionadas.remove(&key).unwrap_or_default(),
                nivel_medio_calculado: CompetencyLevel::from_average(media),
            }
        })
        .collect()
}

/// Deduplicate tools by name, accumulating users and use cases.
fn catalogo_ferramentas(
    personas: &[RagPersona],
    tech_specs: &TechSpecifications,
) -> Vec<CatalogoFerramenta> {
    let mut order: Vec<String> = Vec::new();
    let mut map: HashMap<String, CatalogoFerramenta> = HashMap::new();

    for persona in personas {
        for ferramenta in &persona.ferramentas {
            let entry = map.entry(ferramenta.nome.clone()).or_insert_with(|| {
                order.push(ferramenta.nome.clone());
                CatalogoFerramenta {
                    id: order.len() as u32,
                    nome: ferramenta.nome.clone(),
                    categoria_uso: ferramenta.categoria_uso.clone(),
                    especificacoes_tecnicas: especificacao_ferramenta(
                        &ferramenta.nome,
                        tech_specs,
                    ),
                    usuarios: Vec::new(),
                    casos_uso: Vec::new(),
                    integracao_prioridade: "média".to_string(),
                }
            });

            entry.usuarios.push(UsuarioRef {
                persona_id: persona.id,
                nome: persona.nome_completo.clone(),
                proficiencia: ferramenta.nivel_proficiencia,
                especialidade: persona.especialidade,
                categoria: persona.categoria,
            });

            let caso_uso = format!(
                "{} para {}",
                ferramenta.categoria_uso,
                persona
                    .especialidade
                    .map(|e| e.slug())
                    .unwrap_or(persona.categoria.slug())
            );
            if !entry.casos_uso.contains(&caso_uso) {
                entry.casos_uso.push(caso_uso);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|nome| map.remove(&nome))
        .collect()
}

fn montar_indices(
    personas: &[RagPersona],
    competencias: &[CatalogoCompetencia],
    ferramentas: &[CatalogoFerramenta],
) -> Indices {
    let mut indices = Indices::default();

    for persona in personas {
        indices
            .por_persona
            .insert(persona.nome_completo.clone(), persona.id);
        if let Some(esp) = persona.especialidade {
            indices
                .por_especialidade
                .entry(esp.slug().to_string())
                .or_default()
                .push(persona.id);
        }
        indices
            .por_categoria
            .entry(persona.categoria.slug().to_string())
            .or_default()
            .push(persona.id);
    }

    for comp in competencias {
        indices.por_competencia.insert(comp.nome.clone(), comp.id);
    }
    for tool in ferramentas {
        indices.por_ferramenta.insert(tool.nome.clone(), tool.id);
    }

    indices
}

fn montar_relacionamentos(personas: &[RagPersona]) -> Relacionamentos {
    let mut rel = Relacionamentos::default();

    for persona in personas {
        for comp in persona
            .competencias
            .tecnicas
            .iter()
            .chain(persona.competencias.comportamentais.iter())
        {
            rel.persona_competencia.push(RelPersonaCompetencia {
                persona_id: persona.id,
                competencia_nome: comp.nome.clone(),
                nivel: comp.nivel,
                categoria: comp.categoria.clone(),
            });
        }
        for ferramenta in &persona.ferramentas {
            rel.persona_ferramenta.push(RelPersonaFerramenta {
                persona_id: persona.id,
                ferramenta_nome: ferramenta.nome.clone(),
                proficiencia: ferramenta.nivel_proficiencia,
                categoria_uso: ferramenta.categoria_uso.clone(),
            });
        }
    }

    rel
}

/// One retrieval context per persona, unique competency and unique tool.
fn montar_contextos(
    personas: &[RagPersona],
    competencias: &[CatalogoCompetencia],
    ferramentas: &[CatalogoFerramenta],
) -> Vec<SearchContext> {
    let mut contextos = Vec::new();

    for persona in personas {
        contextos.push(SearchContext {
            id: format!("persona_{}", persona.id),
            tipo: "persona_profile".to_string(),
            titulo: format!("Perfil de {}", persona.nome_completo),
            conteudo: persona.search_metadata.embedding_text.clone(),
            metadata: json!({
                "categoria": persona.categoria,
                "especialidade": persona.especialidade,
                "experiencia": persona.experiencia_anos,
            }),
            tags: persona.search_metadata.tags.clone(),
        });
    }

    for comp in competencias {
        let nomes: Vec<&str> = comp
            .personas_possuidoras
            .iter()
            .map(|p| p.nome.as_str())
            .collect();
        let mut tags = vec![comp.nome.clone(), comp.categoria.clone()];
        tags.extend(comp.ferramentas_relacionadas.iter().cloned());
        contextos.push(SearchContext {
            id: format!("competencia_{}", comp.id),
            tipo: "competencia_analysis".to_string(),
            titulo: format!("Análise da competência {}", comp.nome),
            conteudo: format!(
                "{}. Personas com esta competência: {}. Ferramentas relacionadas: {}.",
                comp.contexto,
                nomes.join(", "),
                comp.ferramentas_relacionadas.join(", ")
            ),
            metadata: json!({
                "categoria": comp.categoria,
                "nivel_medio": comp.nivel_medio_calculado,
                "total_personas": comp.personas_possuidoras.len(),
            }),
            tags,
        });
    }

    for tool in ferramentas {
        let usuarios: Vec<&str> = tool.usuarios.iter().map(|u| u.nome.as_str()).collect();
        let mut tags = vec![tool.nome.clone(), tool.categoria_uso.clone()];
        tags.extend(tool.casos_uso.iter().cloned());
        contextos.push(SearchContext {
            id: format!("ferramenta_{}", tool.id),
            tipo: "ferramenta_usage".to_string(),
            titulo: format!("Uso da ferramenta {}", tool.nome),
            conteudo: format!(
                "{} é utilizada para {}. Casos de uso identificados: {}. Usuários: {}.",
                tool.nome,
                tool.categoria_uso,
                tool.casos_uso.join(", "),
                usuarios.join(", ")
            ),
            metadata: json!({
                "categoria_uso": tool.categoria_uso,
                "total_usuarios": tool.usuarios.len(),
                "casos_uso_count": tool.casos_uso.len(),
            }),
            tags,
        });
    }

    contextos
}

/// Query templates for downstream consumers.
fn query_templates() -> Value {
    json!({
        "persona_lookup": {
            "template": "Encontre informações sobre {persona_nome} que trabalha como {cargo} na área de {especialidade}.",
            "campos_retorno": ["biografia", "competencias", "experiencia", "ferramentas"]
        },
        "competencia_search": {
            "template": "Busque pessoas com competência em {competencia} ou ferramentas relacionadas a {area}.",
            "campos_retorno": ["personas_com_competencia", "nivel_expertise", "ferramentas_utilizadas"]
        },
        "ferramenta_analysis": {
            "template": "Analise o uso de {ferramenta} na empresa e quem pode implementar/utilizar.",
            "campos_retorno": ["usuarios_atuais", "especificacoes_tecnicas", "processo_implementacao"]
        },
        "processo_optimization": {
            "template": "Identifique oportunidades de otimização no processo de {processo} envolvendo {personas}.",
            "campos_retorno": ["processo_atual", "gargalos", "automacao_possivel", "recursos_necessarios"]
        }
    })
}

/// Topic buckets used when embedding the contexts downstream.
fn embed_categories() -> Value {
    json!({
        "biographical": ["biografia", "formacao", "experiencia", "trajetoria"],
        "technical": ["competencia_tecnica", "ferramenta", "tecnologia", "sistema"],
        "behavioral": ["competencia_comportamental", "soft_skill", "lideranca", "colaboracao"],
        "process": ["processo", "workflow", "procedimento", "metodologia"],
        "business": ["estrategia", "negocio", "mercado", "resultado"]
    })
}

/// Example queries attached to every per-persona slice.
fn query_examples(persona: &RagPersona) -> Value {
    json!([
        {
            "tipo": "competencia_lookup",
            "query": format!("Quais são as competências de {}?", persona.nome_completo),
            "resposta_esperada": "Lista de competências técnicas e comportamentais"
        },
        {
            "tipo": "ferramenta_usage",
            "query": format!("Que ferramentas {} sabe usar?", persona.nome_completo),
            "resposta_esperada": "Lista de ferramentas com nível de proficiência"
        },
        {
            "tipo": "colaboracao_potential",
            "query": format!("Com quem {} pode colaborar em projetos?", persona.nome_completo),
            "resposta_esperada": "Personas com competências complementares"
        },
        {
            "tipo": "processo_involvement",
            "query": format!("Em que processos {} deveria estar envolvido?", persona.nome_completo),
            "resposta_esperada": "Processos que aproveitam suas competências"
        }
    ])
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_experience_thresholds() {
        assert_eq!(CompetencyLevel::from_experience(1), CompetencyLevel::Basico);
        assert_eq!(CompetencyLevel::from_experience(2), CompetencyLevel::Intermediario);
        assert_eq!(CompetencyLevel::from_experience(5), CompetencyLevel::Avancado);
        assert_eq!(CompetencyLevel::from_experience(10), CompetencyLevel::Expert);
    }

    #[test]
    fn test_tool_proficiency_basic_fast_path() {
        assert_eq!(
            CompetencyLevel::tool_proficiency("Slack", 3),
            CompetencyLevel::Avancado
        );
        assert_eq!(
            CompetencyLevel::tool_proficiency("Slack", 1),
            CompetencyLevel::Intermediario
        );
        // Specialized tools follow the slower schedule
        assert_eq!(
            CompetencyLevel::tool_proficiency("Docker", 3),
            CompetencyLevel::Intermediario
        );
        assert_eq!(
            CompetencyLevel::tool_proficiency("Docker", 8),
            CompetencyLevel::Expert
        );
    }

    #[test]
    fn test_level_average_buckets() {
        assert_eq!(CompetencyLevel::from_average(3.5), CompetencyLevel::Expert);
        assert_eq!(CompetencyLevel::from_average(3.0), CompetencyLevel::Avancado);
        assert_eq!(CompetencyLevel::from_average(2.0), CompetencyLevel::Intermediario);
        assert_eq!(CompetencyLevel::from_average(1.0), CompetencyLevel::Basico);
    }

    #[test]
    fn test_level_serde_uses_accented_labels() {
        assert_eq!(
            serde_json::to_string(&CompetencyLevel::Avancado).unwrap(),
            "\"avançado\""
        );
        assert_eq!(
            serde_json::from_str::<CompetencyLevel>("\"básico\"").unwrap(),
            CompetencyLevel::Basico
        );
    }

    #[test]
    fn test_contexto_canned_and_fallback() {
        assert!(contexto_competencia("Trabalho em Equipe", "hr").contains("Colaboração"));
        let fallback = contexto_competencia("People Analytics", "hr");
        assert!(fallback.contains("People Analytics"));
        assert!(fallback.contains("hr"));
    }

    #[test]
    fn test_categoria_uso() {
        assert_eq!(categoria_uso_ferramenta("Slack"), "comunicacao");
        assert_eq!(categoria_uso_ferramenta("Power BI"), "analytics");
        assert_eq!(categoria_uso_ferramenta("SAP"), "especializada");
    }
}
