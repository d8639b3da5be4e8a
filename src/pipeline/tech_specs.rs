//! Stage 2 — map discovered tools to technical-specification bundles.
//!
//! `ToolCategory` is the single source of category keys: the specification
//! block, implementation priority and time estimate are all match arms on
//! the same enum, so the three tables cannot drift apart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::Result;
use crate::persona::Specialty;

use super::competencias::{CompetenciasAnalysis, CompetencyProfile, PersonaResumo};
use super::workspace::CompanyWorkspace;
use super::{Artifact, Stage, StageReport};

// ─────────────────────────────────────────────────────────────────
// Tool categories
// ─────────────────────────────────────────────────────────────────

/// Technical-specification category a tool belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    CrmSistemas,
    ComunicacaoColaboracao,
    ProdutividadeEscritorio,
    AnalyticsBi,
    DesenvolvimentoDesign,
    CloudInfrastructure,
}

impl ToolCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            ToolCategory::CrmSistemas => "crm_sistemas",
            ToolCategory::ComunicacaoColaboracao => "comunicacao_colaboracao",
            ToolCategory::ProdutividadeEscritorio => "produtividade_escritorio",
            ToolCategory::AnalyticsBi => "analytics_bi",
            ToolCategory::DesenvolvimentoDesign => "desenvolvimento_design",
            ToolCategory::CloudInfrastructure => "cloud_infrastructure",
        }
    }

    pub fn all() -> &'static [ToolCategory] {
        &[
            ToolCategory::CrmSistemas,
            ToolCategory::ComunicacaoColaboracao,
            ToolCategory::ProdutividadeEscritorio,
            ToolCategory::AnalyticsBi,
            ToolCategory::DesenvolvimentoDesign,
            ToolCategory::CloudInfrastructure,
        ]
    }

    /// Human-readable category title.
    pub fn titulo(&self) -> &'static str {
        match self {
            ToolCategory::CrmSistemas => "CRM e Gestão de Relacionamento",
            ToolCategory::ComunicacaoColaboracao => "Comunicação e Colaboração",
            ToolCategory::ProdutividadeEscritorio => "Produtividade e Escritório",
            ToolCategory::AnalyticsBi => "Analytics e Business Intelligence",
            ToolCategory::DesenvolvimentoDesign => "Desenvolvimento e Design",
            ToolCategory::CloudInfrastructure => "Cloud e Infraestrutura",
        }
    }

    /// Reference tools of the category.
    pub fn ferramentas(&self) -> &'static [&'static str] {
        match self {
            ToolCategory::CrmSistemas => &["HubSpot", "Salesforce", "Pipedrive", "Zoho CRM"],
            ToolCategory::ComunicacaoColaboracao => {
                &["Slack", "Microsoft Teams", "Zoom", "Google Meet"]
            }
            ToolCategory::ProdutividadeEscritorio => {
                &["Microsoft Office 365", "Google Workspace", "Notion", "Trello"]
            }
            ToolCategory::AnalyticsBi => &["Power BI", "Tableau", "Google Analytics", "Looker"],
            ToolCategory::DesenvolvimentoDesign => {
                &["Adobe Creative Suite", "Figma", "Git/GitHub", "Docker"]
            }
            ToolCategory::CloudInfrastructure => {
                &["AWS", "Azure", "Google Cloud", "Docker", "Kubernetes"]
            }
        }
    }

    /// Implementation priority label.
    pub fn prioridade(&self) -> &'static str {
        match self {
            ToolCategory::ComunicacaoColaboracao => "alta",
            ToolCategory::ProdutividadeEscritorio => "alta",
            ToolCategory::CloudInfrastructure => "alta",
            ToolCategory::CrmSistemas => "média",
            ToolCategory::AnalyticsBi => "média",
            ToolCategory::DesenvolvimentoDesign => "baixa",
        }
    }

    /// Implementation time estimate.
    pub fn tempo_estimado(&self) -> &'static str {
        match self {
            ToolCategory::ComunicacaoColaboracao => "2-3 semanas",
            ToolCategory::ProdutividadeEscritorio => "1-2 semanas",
            ToolCategory::CrmSistemas => "4-6 semanas",
            ToolCategory::AnalyticsBi => "6-8 semanas",
            ToolCategory::DesenvolvimentoDesign => "3-4 semanas",
            ToolCategory::CloudInfrastructure => "2-4 semanas",
        }
    }

    /// Specification block (API integration, system requirements, core
    /// features). Shapes vary per category, so this stays loosely typed.
    pub fn especificacoes(&self) -> Value {
        match self {
            ToolCategory::CrmSistemas => json!({
                "integracao_api": {
                    "tipo": "REST API",
                    "autenticacao": "OAuth 2.0 / API Key",
                    "rate_limits": "1000-5000 requests/hour",
                    "webhooks": true,
                    "formatos_dados": ["JSON", "XML"]
                },
                "requisitos_sistema": {
                    "cloud_native": true,
                    "backup_frequencia": "diário",
                    "uptime_garantido": "99.9%",
                    "seguranca": ["SSL/TLS", "2FA", "GDPR Compliance"]
                },
                "funcionalidades_core": [
                    "Gestão de Contatos",
                    "Pipeline de Vendas",
                    "Automação de Marketing",
                    "Relatórios e Analytics",
                    "Gestão de Tarefas"
                ]
            }),
            ToolCategory::ComunicacaoColaboracao => json!({
                "integracao_api": {
                    "tipo": "REST API + WebSockets",
                    "autenticacao": "OAuth 2.0",
                    "real_time": true,
                    "webhooks": true,
                    "bot_framework": true
                },
                "requisitos_sistema": {
                    "largura_banda": "mínimo 1 Mbps por usuário",
                    "latencia_maxima": "150ms",
                    "dispositivos_suportados": ["Desktop", "Mobile", "Tablet"],
                    "cross_platform": true
                },
                "funcionalidades_core": [
                    "Mensagens Instantâneas",
                    "Videoconferência",
                    "Compartilhamento de Arquivos",
                    "Integrações com Apps",
                    "Canais Organizados"
                ]
            }),
            ToolCategory::ProdutividadeEscritorio => json!({
                "integracao_api": {
                    "tipo": "REST API + Graph API",
                    "autenticacao": "OAuth 2.0 / SAML",
                    "sincronizacao": "real-time",
                    "offline_support": true,
                    "versionamento": "automático"
                },
                "requisitos_sistema": {
                    "armazenamento_base": "1TB por usuário",
                    "sincronizacao_dispositivos": "ilimitada",
                    "backup_automatico": true,
                    "colaboracao_simultanea": "100+ usuários"
                },
                "funcionalidades_core": [
                    "Processamento de Texto",
                    "Planilhas Avançadas",
                    "Apresentações",
                    "Gerenciamento de E-mail",
                    "Calendário Integrado"
                ]
            }),
            ToolCategory::AnalyticsBi => json!({
                "integracao_api": {
                    "tipo": "REST API + ODATA",
                    "autenticacao": "Service Principal + OAuth",
                    "data_refresh": "programado + real-time",
                    "custom_connectors": true,
                    "embedded_analytics": true
                },
                "requisitos_sistema": {
                    "processamento_dados": "até 10GB por dataset",
                    "performance_queries": "< 5 segundos",
                    "concurrent_users": "500+ usuários",
                    "data_warehouse": "compatível com SQL"
                },
                "funcionalidades_core": [
                    "Dashboards Interativos",
                    "Relatórios Automatizados",
                    "Data Modeling",
                    "Alertas Inteligentes",
                    "Visualizações Avançadas"
                ]
            }),
            ToolCategory::DesenvolvimentoDesign => json!({
                "integracao_api": {
                    "tipo": "REST API + WebHooks",
                    "autenticacao": "OAuth 2.0 + Personal Access Tokens",
                    "ci_cd_integration": true,
                    "version_control": "Git-based",
                    "asset_management": true
                },
                "requisitos_sistema": {
                    "hardware_minimo": "16GB RAM, GPU dedicada",
                    "armazenamento_projetos": "500GB por usuário",
                    "network_speed": "100 Mbps para colaboração",
                    "backup_versioned": "incremental diário"
                },
                "funcionalidades_core": [
                    "Design Colaborativo",
                    "Version Control",
                    "Asset Libraries",
                    "Prototipagem Interativa",
                    "Deploy Automatizado"
                ]
            }),
            ToolCategory::CloudInfrastructure => json!({
                "integracao_api": {
                    "tipo": "REST API + CLI + SDKs",
                    "autenticacao": "IAM + Service Accounts",
                    "automation": "Infrastructure as Code",
                    "monitoring": "CloudWatch/Azure Monitor",
                    "scaling": "auto-scaling habilitado"
                },
                "requisitos_sistema": {
                    "availability_zones": "mínimo 2 AZs",
                    "disaster_recovery": "RTO < 4 horas",
                    "security_compliance": ["SOC 2", "ISO 27001", "GDPR"],
                    "cost_optimization": "reserved instances + spot"
                },
                "funcionalidades_core": [
                    "Container Orchestration",
                    "Auto-scaling",
                    "Load Balancing",
                    "Monitoring e Alertas",
                    "Backup e Recovery"
                ]
            }),
        }
    }

    /// Exact-match tool lookup. Unknown tools map to `None`; callers log
    /// the miss and drop the tool from the spec.
    pub fn for_tool(ferramenta: &str) -> Option<ToolCategory> {
        match ferramenta {
            "HubSpot" | "Salesforce" | "Pipedrive" | "Zoho CRM" => Some(ToolCategory::CrmSistemas),
            "Slack" | "Microsoft Teams" | "Zoom" | "Google Meet" => {
                Some(ToolCategory::ComunicacaoColaboracao)
            }
            "Microsoft Office 365" | "Google Workspace" | "Notion" | "Trello" => {
                Some(ToolCategory::ProdutividadeEscritorio)
            }
            "Power BI" | "Tableau" | "Google Analytics" | "Looker" => {
                Some(ToolCategory::AnalyticsBi)
            }
            "Adobe Creative Suite" | "Figma" | "Git/GitHub" => {
                Some(ToolCategory::DesenvolvimentoDesign)
            }
            "Docker" | "AWS" | "Azure" | "Google Cloud" | "Kubernetes" => {
                Some(ToolCategory::CloudInfrastructure)
            }
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Output types
// ─────────────────────────────────────────────────────────────────

/// One category's entry in the consolidated document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriaSpec {
    pub categoria: String,
    pub ferramentas: Vec<String>,
    pub especificacoes: Value,
    pub status_implementacao: String,
    pub prioridade: String,
    pub tempo_estimado_implementacao: String,
}

/// Specialty-specific requirements block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecPersonalizada {
    pub especialidade: Specialty,
    pub competencias_tecnicas: Vec<String>,
    pub ferramentas_principais: Vec<String>,
    pub requisitos_especificos: Vec<String>,
    pub integracao_sugerida: Vec<String>,
    pub documentacao_necessaria: Vec<String>,
}

/// System requirements adjusted for a persona's tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequisitosSistema {
    pub computacao: String,
    pub armazenamento: String,
    pub rede: String,
    pub seguranca: Vec<String>,
    pub backup: String,
}

/// Per-persona slice written to `script2_techspecs/tech_specs_core.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechSpecsPersona {
    pub persona: PersonaResumo,
    pub especificacoes_tecnicas: EspecificacoesTecnicas,
    pub documentacao_tecnica: DocumentacaoTecnica,
    pub data_processamento: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EspecificacoesTecnicas {
    pub ferramentas_utilizadas: Vec<String>,
    pub categorias_aplicaveis: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requisitos_personalizados: Option<SpecPersonalizada>,
    pub integracao_prioridade: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentacaoTecnica {
    pub apis_necessarias: Vec<String>,
    pub requisitos_sistema: RequisitosSistema,
    pub guias_implementacao: Vec<String>,
}

/// Consolidated artifact, `tech_specifications.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechSpecifications {
    pub empresa_codigo: String,
    pub data_geracao: String,
    pub sistema_overview: SistemaOverview,
    pub especificacoes_categorias: BTreeMap<String, CategoriaSpec>,
    pub especificacoes_personalizadas: BTreeMap<String, SpecPersonalizada>,
    pub infraestrutura_requisitos: Value,
    pub implementacao_roadmap: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SistemaOverview {
    pub descricao: String,
    pub categorias_implementadas: Vec<String>,
    pub ferramentas_core: Vec<String>,
    pub arquitetura_recomendada: String,
}

// ─────────────────────────────────────────────────────────────────
// Derivation helpers
// ─────────────────────────────────────────────────────────────────

/// Integration priority tiers, checked in order; ties break toward the
/// earlier tier.
const TIER_ALTA: &[&str] = &["Microsoft Office 365", "Google Workspace", "Slack", "Zoom"];
const TIER_MEDIA: &[&str] = &["HubSpot", "Salesforce", "Power BI", "Tableau"];
const TIER_BAIXA: &[&str] = &["Adobe Creative Suite", "Figma", "Docker", "Kubernetes"];

/// Pick the priority tier with the most matches among the persona's tools.
pub fn integracao_prioridade(ferramentas: &[String]) -> &'static str {
    let count = |tier: &[&str]| {
        ferramentas
            .iter()
            .filter(|f| tier.contains(&f.as_str()))
            .count()
    };

    let tiers = [
        ("alta", count(TIER_ALTA)),
        ("media", count(TIER_MEDIA)),
        ("baixa", count(TIER_BAIXA)),
    ];

    let mut best = tiers[0];
    for tier in &tiers[1..] {
        if tier.1 > best.1 {
            best = *tier;
        }
    }
    best.0
}

/// APIs implied by the persona's tools, deduplicated.
pub fn apis_necessarias(ferramentas: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ferramenta in ferramentas {
        let apis: &[&str] = match ferramenta.as_str() {
            "Microsoft Office 365" => &["Microsoft Graph API", "SharePoint API"],
            "Google Workspace" => &["Google Workspace API", "Gmail API", "Drive API"],
            "Slack" => &["Slack Web API", "Slack Events API"],
            "Zoom" => &["Zoom API v2", "Zoom Webhooks"],
            "HubSpot" => &["HubSpot CRM API", "HubSpot Marketing API"],
            "Power BI" => &["Power BI REST API", "Power BI Embedded API"],
            "Salesforce" => &["Salesforce REST API", "Salesforce Bulk API"],
            _ => &[],
        };
        for api in apis {
            if !out.iter().any(|a| a == api) {
                out.push(api.to_string());
            }
        }
    }
    out
}

/// Baseline system requirements, bumped for heavy tool sets.
pub fn requisitos_sistema(ferramentas: &[String]) -> RequisitosSistema {
    let mut requisitos = RequisitosSistema {
        computacao: "2 vCPU, 4GB RAM mínimo".to_string(),
        armazenamento: "50GB SSD mínimo".to_string(),
        rede: "10 Mbps mínimo".to_string(),
        seguranca: vec!["SSL/TLS".to_string(), "OAuth 2.0".to_string()],
        backup: "diário automático".to_string(),
    };

    let has = |tools: &[&str]| ferramentas.iter().any(|f| tools.contains(&f.as_str()));

    if has(&["Adobe Creative Suite", "Figma"]) {
        requisitos.computacao = "4 vCPU, 16GB RAM recomendado".to_string();
        requisitos.armazenamento = "500GB SSD recomendado".to_string();
    }
    if has(&["Power BI", "Tableau"]) {
        requisitos.computacao = "4 vCPU, 8GB RAM recomendado".to_string();
        requisitos.rede = "50 Mbps recomendado".to_string();
    }

    requisitos
}

/// Fixed implementation-guide checklist.
fn guias_implementacao() -> Vec<String> {
    [
        "Setup e Configuração Inicial",
        "Integração de APIs",
        "Configuração de Segurança",
        "Testes de Conectividade",
        "Deploy em Produção",
        "Monitoramento e Manutenção",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Build the specialty-specific requirements block.
pub fn spec_personalizada(
    especialidade: Specialty,
    competencias: &CompetencyProfile,
) -> SpecPersonalizada {
    let (requisitos, integracao): (&[&str], &[&str]) = match especialidade {
        Specialty::Youtube => (
            &[
                "Storage para vídeos: mínimo 2TB",
                "Upload speed: mínimo 100 Mbps",
                "GPU para edição: GTX 1660 ou superior",
                "Backup automático de projetos",
            ],
            &[
                "YouTube Data API v3",
                "Google Drive API",
                "Adobe Creative Cloud APIs",
                "Analytics Reporting API",
            ],
        ),
        Specialty::MidiasSociais => (
            &[
                "Social Media Management Platform",
                "Multi-account authentication",
                "Content scheduling system",
                "Analytics aggregation dashboard",
            ],
            &[
                "Facebook Graph API",
                "Instagram Basic Display API",
                "Twitter API v2",
                "LinkedIn Marketing API",
            ],
        ),
        Specialty::Marketing => (
            &[
                "Marketing automation platform",
                "A/B testing framework",
                "Customer segmentation engine",
                "ROI tracking dashboard",
            ],
            &[
                "Google Ads API",
                "Facebook Marketing API",
                "Email service provider APIs",
                "CRM integration APIs",
            ],
        ),
        Specialty::Financeiro => (
            &[
                "Financial data security (encryption)",
                "Audit trail capabilities",
                "Multi-currency support",
                "Compliance reporting tools",
            ],
            &[
                "Banking APIs (Open Banking)",
                "ERP system integration",
                "Tax calculation APIs",
                "Regulatory reporting APIs",
            ],
        ),
        Specialty::Hr => (
            &[
                "HRIS platform integration",
                "Employee data privacy controls",
                "Performance tracking system",
                "Recruitment workflow automation",
            ],
            &[
                "ATS (Applicant Tracking) APIs",
                "Payroll system APIs",
                "Learning Management APIs",
                "Background check APIs",
            ],
        ),
        Specialty::Tecnologia => (
            &[
                "Development environment setup",
                "CI/CD pipeline configuration",
                "Code repository management",
                "Monitoring and alerting system",
            ],
            &[
                "GitHub/GitLab APIs",
                "Container registry APIs",
                "Cloud provider APIs",
                "Monitoring service APIs",
            ],
        ),
    };

    SpecPersonalizada {
        especialidade,
        competencias_tecnicas: competencias.tecnicas.clone(),
        ferramentas_principais: competencias.ferramentas.clone(),
        requisitos_especificos: requisitos.iter().map(|s| s.to_string()).collect(),
        integracao_sugerida: integracao.iter().map(|s| s.to_string()).collect(),
        documentacao_necessaria: [
            "API Integration Guide",
            "System Requirements Document",
            "Security Configuration Guide",
            "User Training Materials",
            "Troubleshooting Handbook",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

// ─────────────────────────────────────────────────────────────────
// Stage runner
// ─────────────────────────────────────────────────────────────────

/// Run stage 2 for a company.
pub fn run(workspace: &CompanyWorkspace) -> Result<StageReport> {
    let analysis: CompetenciasAnalysis =
        workspace.load_artifact(Artifact::CompetenciasAnalysis)?;

    // Discover tools and the categories they imply, in first-seen order.
    let mut ferramentas_identificadas: Vec<String> = Vec::new();
    let mut categorias_necessarias: Vec<ToolCategory> = Vec::new();
    let mut especificacoes_personalizadas: BTreeMap<String, SpecPersonalizada> = BTreeMap::new();

    for persona_data in analysis.personas.values() {
        for ferramenta in &persona_data.competencias.ferramentas {
            if !ferramentas_identificadas.contains(ferramenta) {
                ferramentas_identificadas.push(ferramenta.clone());
            }
            match ToolCategory::for_tool(ferramenta) {
                Some(categoria) => {
                    if !categorias_necessarias.contains(&categoria) {
                        categorias_necessarias.push(categoria);
                    }
                }
                None => {
                    warn!(ferramenta = %ferramenta, "Tool has no spec category, dropped");
                }
            }
        }

        if let Some(especialidade) = persona_data.persona.especialidade {
            especificacoes_personalizadas
                .entry(especialidade.slug().to_string())
                .or_insert_with(|| spec_personalizada(especialidade, &persona_data.competencias));
        }
    }

    let especificacoes_categorias: BTreeMap<String, CategoriaSpec> = categorias_necessarias
        .iter()
        .map(|cat| {
            (
                cat.slug().to_string(),
                CategoriaSpec {
                    categoria: cat.titulo().to_string(),
                    ferramentas: cat.ferramentas().iter().map(|s| s.to_string()).collect(),
                    especificacoes: cat.especificacoes(),
                    status_implementacao: "planejado".to_string(),
                    prioridade: cat.prioridade().to_string(),
                    tempo_estimado_implementacao: cat.tempo_estimado().to_string(),
                },
            )
        })
        .collect();

    let documentacao = TechSpecifications {
        empresa_codigo: workspace.codigo().to_string(),
        data_geracao: chrono::Utc::now().to_rfc3339(),
        sistema_overview: SistemaOverview {
            descricao: format!(
                "Sistema integrado para {} com {} ferramentas principais",
                workspace.codigo(),
                ferramentas_identificadas.len()
            ),
            categorias_implementadas: categorias_necessarias
                .iter()
                .map(|c| c.slug().to_string())
                .collect(),
            ferramentas_core: ferramentas_identificadas.clone(),
            arquitetura_recomendada: "Microserviços com API Gateway".to_string(),
        },
        especificacoes_categorias,
        especificacoes_personalizadas: especificacoes_personalizadas.clone(),
        infraestrutura_requisitos: json!({
            "cloud_provider": "AWS/Azure (recomendado)",
            "compute_instances": "t3.medium para desenvolvimento, m5.large para produção",
            "database": "PostgreSQL 13+ ou MySQL 8.0+",
            "cache": "Redis 6.0+",
            "monitoring": "CloudWatch/Azure Monitor + Grafana",
            "backup_strategy": "Snapshots diários + replicação cross-region"
        }),
        implementacao_roadmap: json!({
            "fase_1": "Infraestrutura base e autenticação",
            "fase_2": "Integração de ferramentas core",
            "fase_3": "Automações e workflows",
            "fase_4": "Analytics e relatórios",
            "fase_5": "Otimização e scaling"
        }),
    };

    // Per-persona slices.
    let mut personas_processadas = 0usize;
    for (_, folder, persona_path) in workspace.list_persona_dirs()? {
        let Some(persona_data) = analysis.personas.get(&folder) else {
            continue;
        };

        let ferramentas = &persona_data.competencias.ferramentas;
        let categorias_aplicaveis: Vec<String> = ferramentas
            .iter()
            .filter_map(|f| ToolCategory::for_tool(f))
            .map(|c| c.slug().to_string())
            .collect();

        let requisitos_personalizados = persona_data
            .persona
            .especialidade
            .and_then(|e| especificacoes_personalizadas.get(e.slug()).cloned());

        let tech_specs = TechSpecsPersona {
            persona: persona_data.persona.clone(),
            especificacoes_tecnicas: EspecificacoesTecnicas {
                ferramentas_utilizadas: ferramentas.clone(),
                categorias_aplicaveis,
                requisitos_personalizados,
                integracao_prioridade: integracao_prioridade(ferramentas).to_string(),
            },
            documentacao_tecnica: DocumentacaoTecnica {
                apis_necessarias: apis_necessarias(ferramentas),
                requisitos_sistema: requisitos_sistema(ferramentas),
                guias_implementacao: guias_implementacao(),
            },
            data_processamento: chrono::Utc::now().to_rfc3339(),
        };

        let stage_dir = workspace.stage_dir(&persona_path, Stage::TechSpecs)?;
        workspace.write_json(&stage_dir.join("tech_specs_core.json"), &tech_specs)?;
        personas_processadas += 1;
    }

    let output = workspace.artifact_path(Artifact::TechSpecifications);
    workspace.write_json(&output, &documentacao)?;

    info!(
        empresa = %workspace.codigo(),
        personas = personas_processadas,
        categorias = documentacao.sistema_overview.categorias_implementadas.len(),
        ferramentas = ferramentas_identificadas.len(),
        "Stage 2 (tech specs) finished"
    );

    Ok(StageReport {
        stage: Stage::TechSpecs,
        items: personas_processadas,
        output,
    })
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Category;
    use crate::pipeline::competencias::derive_competencias;

    #[test]
    fn test_category_tables_cover_every_variant() {
        // Priority, time estimate and spec blocks are match arms on the
        // same enum; this pins that every variant answers all three.
        for cat in ToolCategory::all() {
            assert!(!cat.prioridade().is_empty());
            assert!(!cat.tempo_estimado().is_empty());
            let spec = cat.especificacoes();
            assert!(spec.get("integracao_api").is_some());
            assert!(spec.get("requisitos_sistema").is_some());
            assert!(spec.get("funcionalidades_core").is_some());
        }
    }

    #[test]
    fn test_tool_lookup() {
        assert_eq!(ToolCategory::for_tool("Slack"), Some(ToolCategory::ComunicacaoColaboracao));
        assert_eq!(ToolCategory::for_tool("Docker"), Some(ToolCategory::CloudInfrastructure));
        assert_eq!(
            ToolCategory::for_tool("Git/GitHub"),
            Some(ToolCategory::DesenvolvimentoDesign)
        );
        assert_eq!(ToolCategory::for_tool("Caneta Bic"), None);
    }

    #[test]
    fn test_integration_priority_counts() {
        let ferramentas: Vec<String> = ["Slack", "Zoom", "Power BI"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(integracao_prioridade(&ferramentas), "alta");

        let ferramentas: Vec<String> = ["HubSpot", "Tableau", "Figma"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(integracao_prioridade(&ferramentas), "media");
    }

    #[test]
    fn test_integration_priority_tie_breaks_to_alta() {
        let ferramentas: Vec<String> = ["Slack", "Power BI"].iter().map(|s| s.to_string()).collect();
        assert_eq!(integracao_prioridade(&ferramentas), "alta");
    }

    #[test]
    fn test_apis_deduplicated() {
        let ferramentas: Vec<String> = ["Slack", "Slack", "Power BI"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let apis = apis_necessarias(&ferramentas);
        assert!(apis.contains(&"Slack Web API".to_string()));
        assert_eq!(apis.iter().filter(|a| a.as_str() == "Slack Web API").count(), 1);
    }

    #[test]
    fn test_requisitos_bump_for_design_tools() {
        let base = requisitos_sistema(&["Slack".to_string()]);
        assert!(base.computacao.contains("2 vCPU"));

        let design = requisitos_sistema(&["Figma".to_string()]);
        assert!(design.computacao.contains("16GB"));
        assert!(design.armazenamento.contains("500GB"));
    }

    #[test]
    fn test_spec_personalizada_per_specialty() {
        for esp in Specialty::all() {
            let profile = derive_competencias("X", Category::Especialistas, Some(*esp));
            let spec = spec_personalizada(*esp, &profile);
            assert_eq!(spec.requisitos_especificos.len(), 4);
            assert_eq!(spec.integracao_sugerida.len(), 4);
            assert_eq!(spec.documentacao_necessaria.len(), 5);
        }
    }
}
