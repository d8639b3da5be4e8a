//! Stage 4 — match personas to business-process templates and score them.
//!
//! Every specialty present in the knowledge base instantiates its three
//! canned process templates. Scores are fixed point rules: viability from
//! headcount + tool coverage, collaboration potential from headcount +
//! shared tools, ROI from a small hours-per-process table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalysisSettings;
use crate::error::Result;
use crate::persona::Specialty;

use super::rag::{CompetencyLevel, RagKnowledgeBase, RagPersona};
use super::workspace::CompanyWorkspace;
use super::{Artifact, Stage, StageReport};

// ─────────────────────────────────────────────────────────────────
// Process templates
// ─────────────────────────────────────────────────────────────────

/// A canned business-process template.
#[derive(Debug, Clone, Copy)]
pub struct ProcessTemplate {
    pub nome: &'static str,
    pub etapas: &'static [&'static str],
    pub personas_envolvidas: &'static [&'static str],
    pub ferramentas: &'static [&'static str],
    pub automacao_potencial: u32,
    pub kpis: &'static [&'static str],
}

/// The three process templates of a specialty.
pub fn templates(especialidade: Specialty) -> &'static [ProcessTemplate] {
    match especialidade {
        Specialty::Hr => &[
            ProcessTemplate {
                nome: "Recrutamento e Seleção",
                etapas: &["Abertura de vaga", "Triagem curricular", "Entrevistas", "Testes técnicos", "Contratação"],
                personas_envolvidas: &["HR Business Partner", "Recrutador", "Gerente da área"],
                ferramentas: &["ATS", "LinkedIn Recruiter", "Calendário", "E-mail"],
                automacao_potencial: 70,
                kpis: &["Time to hire", "Custo por contratação", "Quality of hire"],
            },
            ProcessTemplate {
                nome: "Onboarding de Funcionários",
                etapas: &["Documentação", "Treinamentos", "Apresentação da equipe", "Setup de ferramentas", "Follow-up"],
                personas_envolvidas: &["HR Generalist", "Manager", "IT Support"],
                ferramentas: &["HRIS", "LMS", "Slack", "Office 365"],
                automacao_potencial: 60,
                kpis: &["Time to productivity", "Employee satisfaction", "Retention rate"],
            },
            ProcessTemplate {
                nome: "Avaliação de Performance",
                etapas: &["Setup ciclo", "Autoavaliação", "Avaliação 360", "Calibração", "Feedback"],
                personas_envolvidas: &["HR Business Partner", "Managers", "Employees"],
                ferramentas: &["Performance Management System", "Calendário", "Office 365"],
                automacao_potencial: 50,
                kpis: &["Completion rate", "Manager engagement", "Goal achievement"],
            },
        ],
        Specialty::Marketing => &[
            ProcessTemplate {
                nome: "Criação de Campanha Digital",
                etapas: &["Briefing", "Pesquisa", "Criação", "Aprovação", "Veiculação", "Monitoramento"],
                personas_envolvidas: &["Marketing Manager", "Designer", "Copywriter", "Analista"],
                ferramentas: &["Figma", "Canva", "Google Ads", "Facebook Ads", "Analytics"],
                automacao_potencial: 40,
                kpis: &["CTR", "CPC", "ROAS", "Conversions"],
            },
            ProcessTemplate {
                nome: "Gestão de Conteúdo",
                etapas: &["Planejamento", "Criação", "Revisão", "Agendamento", "Publicação", "Engajamento"],
                personas_envolvidas: &["Content Manager", "Social Media", "Designer", "Copywriter"],
                ferramentas: &["Hootsuite", "Buffer", "Canva", "Google Drive", "Analytics"],
                automacao_potencial: 65,
                kpis: &["Engagement rate", "Reach", "Brand awareness", "Lead generation"],
            },
            ProcessTemplate {
                nome: "Lead Nurturing",
                etapas: &["Captura", "Segmentação", "Scoring", "Campanhas", "Conversão", "Análise"],
                personas_envolvidas: &["Marketing Automation", "Sales", "Content Creator"],
                ferramentas: &["HubSpot", "Mailchimp", "CRM", "Analytics"],
                automacao_potencial: 80,
                kpis: &["Lead quality", "Conversion rate", "Cost per lead", "ROI"],
            },
        ],
        Specialty::Financeiro => &[
            ProcessTemplate {
                nome: "Controle de Despesas",
                etapas: &["Solicitação", "Aprovação", "Pagamento", "Conciliação", "Relatório"],
                personas_envolvidas: &["Analista Financeiro", "Controller", "Gerente"],
                ferramentas: &["ERP", "Excel", "Sistema bancário", "Power BI"],
                automacao_potencial: 75,
                kpis: &["Tempo de aprovação", "Acurácia", "Compliance", "Custo operacional"],
            },
            ProcessTemplate {
                nome: "Fechamento Mensal",
                etapas: &["Coleta dados", "Conciliações", "Ajustes", "Demonstrativos", "Análise"],
                personas_envolvidas: &["Contador", "Analista", "Controller", "CFO"],
                ferramentas: &["ERP", "Excel", "Power BI", "Sistema contábil"],
                automacao_potencial: 60,
                kpis: &["Prazo fechamento", "Acurácia", "Variações", "Insights gerados"],
            },
            ProcessTemplate {
                nome: "Planejamento Orçamentário",
                etapas: &["Diretrizes", "Coleta inputs", "Consolidação", "Revisões", "Aprovação"],
                personas_envolvidas: &["Controller", "CFO", "Gerentes", "Diretores"],
                ferramentas: &["Excel", "Power BI", "ERP", "BI Tools"],
                automacao_potencial: 45,
                kpis: &["Acurácia previsão", "Tempo planejamento", "Aderência orçamento"],
            },
        ],
        Specialty::Tecnologia => &[
            ProcessTemplate {
                nome: "Deploy de Aplicação",
                etapas: &["Code review", "Testes", "Build", "Deploy staging", "Testes UAT", "Deploy produção"],
                personas_envolvidas: &["Developer", "DevOps", "QA", "Tech Lead"],
                ferramentas: &["Git", "Jenkins", "Docker", "Kubernetes", "Monitoring"],
                automacao_potencial: 85,
                kpis: &["Deploy frequency", "Lead time", "MTTR", "Change failure rate"],
            },
            ProcessTemplate {
                nome: "Gestão de Incidentes",
                etapas: &["Detecção", "Triagem", "Investigação", "Resolução", "Post-mortem"],
                personas_envolvidas: &["SRE", "Developer", "Tech Lead", "Support"],
                ferramentas: &["Monitoring", "Ticketing", "Slack", "Documentation"],
                automacao_potencial: 70,
                kpis: &["MTTR", "MTBF", "SLA compliance", "Customer satisfaction"],
            },
            ProcessTemplate {
                nome: "Desenvolvimento de Feature",
                etapas: &["Requisitos", "Design", "Desenvolvimento", "Testes", "Review", "Deploy"],
                personas_envolvidas: &["Product Owner", "Developer", "Designer", "QA"],
                ferramentas: &["Jira", "Git", "IDE", "Testing framework", "CI/CD"],
                automacao_potencial: 60,
                kpis: &["Velocity", "Quality", "Time to market", "Technical debt"],
            },
        ],
        Specialty::Youtube => &[
            ProcessTemplate {
                nome: "Produção de Vídeo",
                etapas: &["Planejamento", "Roteiro", "Gravação", "Edição", "Revisão", "Upload"],
                personas_envolvidas: &["Content Creator", "Editor", "Thumbnail Designer"],
                ferramentas: &["Premiere Pro", "After Effects", "Photoshop", "YouTube Studio"],
                automacao_potencial: 35,
                kpis: &["Views", "Watch time", "Engagement", "Subscriber growth"],
            },
            ProcessTemplate {
                nome: "Otimização de Canal",
                etapas: &["Análise métricas", "Pesquisa palavras-chave", "Otimização SEO", "A/B test thumbnails", "Ajustes conteúdo"],
                personas_envolvidas: &["YouTube Manager", "Analista", "Designer"],
                ferramentas: &["YouTube Analytics", "TubeBuddy", "VidIQ", "Photoshop"],
                automacao_potencial: 55,
                kpis: &["CTR", "Retention rate", "Search ranking", "Revenue"],
            },
            ProcessTemplate {
                nome: "Gestão de Comunidade",
                etapas: &["Moderação comentários", "Resposta audiência", "Engagement posts", "Live streams", "Community polls"],
                personas_envolvidas: &["Community Manager", "Content Creator"],
                ferramentas: &["YouTube Studio", "Social Media Tools", "Analytics"],
                automacao_potencial: 45,
                kpis: &["Engagement rate", "Community growth", "Sentiment analysis"],
            },
        ],
        Specialty::MidiasSociais => &[
            ProcessTemplate {
                nome: "Gestão de Conteúdo Multiplataforma",
                etapas: &["Planejamento", "Criação", "Adaptação por plataforma", "Agendamento", "Monitoramento", "Engajamento"],
                personas_envolvidas: &["Social Media Manager", "Designer", "Copywriter"],
                ferramentas: &["Hootsuite", "Canva", "Analytics", "Scheduling tools"],
                automacao_potencial: 70,
                kpis: &["Reach", "Engagement", "Follower growth", "Brand mentions"],
            },
            ProcessTemplate {
                nome: "Influencer Marketing",
                etapas: &["Identificação", "Outreach", "Negociação", "Briefing", "Acompanhamento", "Análise ROI"],
                personas_envolvidas: &["Influencer Manager", "Marketing Manager"],
                ferramentas: &["Influencer platforms", "CRM", "Analytics", "Payment systems"],
                automacao_potencial: 50,
                kpis: &["Reach amplification", "Engagement rate", "ROI", "Brand alignment"],
            },
            ProcessTemplate {
                nome: "Crisis Management",
                etapas: &["Monitoramento", "Detecção", "Avaliação", "Resposta", "Escalação", "Follow-up"],
                personas_envolvidas: &["Social Media Manager", "PR Manager", "Leadership"],
                ferramentas: &["Social listening", "Alert systems", "Communication tools"],
                automacao_potencial: 60,
                kpis: &["Response time", "Sentiment recovery", "Mention volume", "Brand reputation"],
            },
        ],
    }
}

// ─────────────────────────────────────────────────────────────────
// Output types
// ─────────────────────────────────────────────────────────────────

/// Viability bucket from the fixed point-scoring rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Viabilidade {
    #[serde(rename = "alta")]
    Alta,
    #[serde(rename = "média")]
    Media,
    #[serde(rename = "baixa")]
    Baixa,
    #[serde(rename = "crítica")]
    Critica,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaDisponivel {
    pub id: u32,
    pub nome: String,
    pub categoria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidade: Option<Specialty>,
    pub nivel_competencia: CompetencyLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustosEstimados {
    pub setup: u32,
    pub mensal: u32,
}

/// A process template instantiated against the company's personas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessoRecord {
    pub id: String,
    pub nome: String,
    pub categoria: String,
    pub etapas: Vec<String>,
    pub personas_disponiveis: Vec<PersonaDisponivel>,
    pub ferramentas_necessarias: Vec<String>,
    pub ferramentas_disponiveis: Vec<String>,
    pub cobertura_ferramentas: u32,
    pub automacao_potencial: u32,
    pub kpis: Vec<String>,
    pub viabilidade: Viabilidade,
    pub custos_estimados: CustosEstimados,
    pub tempo_implementacao: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiEstimado {
    pub economia_mensal: u32,
    pub custo_implementacao: u32,
    pub payback_meses: u32,
    pub roi_anual_percent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OportunidadeAutomacao {
    pub processo: String,
    pub especialidade: Specialty,
    pub potencial: u32,
    pub ferramentas_necessarias: Vec<String>,
    pub roi_estimado: RoiEstimado,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaMin {
    pub id: u32,
    pub nome: String,
}

/// Pairwise synergy record, only for pairs with a canned pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Colaboracao {
    pub especialidades: Vec<String>,
    pub personas_envolvidas: BTreeMap<String, Vec<PersonaMin>>,
    pub processos_compartilhados: Vec<String>,
    pub sinergias_identificadas: Vec<String>,
    pub pontos_friccao: Vec<String>,
    pub ferramentas_comuns: Vec<String>,
    pub potencial_colaboracao: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gargalo {
    pub tipo: String,
    pub recurso: String,
    pub descricao: String,
    pub impacto: String,
    pub usuarios_afetados: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidades_afetadas: Option<Vec<String>>,
    pub recomendacao: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recomendacao {
    pub categoria: String,
    pub titulo: String,
    pub descricao: String,
    pub impacto: String,
    pub prazo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_estimado: Option<RoiEstimado>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursos_necessarios: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficios: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ferramentas_comuns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acao_recomendada: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstatisticasFluxos {
    pub total_processos: u32,
    pub processos_alta_viabilidade: u32,
    pub oportunidades_automacao: u32,
    pub colaboracoes_identificadas: u32,
    pub gargalos_criticos: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessoAutomatizavel {
    pub processo: String,
    pub especialidade: Specialty,
    pub potencial: u32,
    pub ferramentas: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPrioritario {
    pub nome: String,
    pub etapas: Vec<String>,
    pub ferramentas: Vec<String>,
    pub kpis: Vec<String>,
}

/// Hand-off block consumed by stage 5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparacaoN8n {
    pub processos_automatizaveis: Vec<ProcessoAutomatizavel>,
    pub workflows_prioritarios: Vec<WorkflowPrioritario>,
}

/// Consolidated artifact, `fluxos_analise_completa.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowAnalysis {
    pub empresa_codigo: String,
    pub versao_analise: String,
    pub data_analise: String,
    pub processos: Vec<ProcessoRecord>,
    pub colaboracoes: Vec<Colaboracao>,
    pub automacao_oportunidades: Vec<OportunidadeAutomacao>,
    pub gargalos: Vec<Gargalo>,
    pub recomendacoes: Vec<Recomendacao>,
    pub estatisticas: EstatisticasFluxos,
    pub preparacao_n8n: PreparacaoN8n,
}

// ─────────────────────────────────────────────────────────────────
// Scoring
// ─────────────────────────────────────────────────────────────────

/// Viability points: headcount (40/30/20) + tool coverage (40/30/20/10)
/// + 20 base, thresholded at 80/60/40.
pub fn viabilidade(num_personas: usize, cobertura_ferramentas: u32) -> Viabilidade {
    let mut pontos = 0u32;

    if num_personas >= 3 {
        pontos += 40;
    } else if num_personas >= 2 {
        pontos += 30;
    } else if num_personas >= 1 {
        pontos += 20;
    }

    if cobertura_ferramentas >= 80 {
        pontos += 40;
    } else if cobertura_ferramentas >= 60 {
        pontos += 30;
    } else if cobertura_ferramentas >= 40 {
        pontos += 20;
    } else {
        pontos += 10;
    }

    pontos += 20;

    if pontos >= 80 {
        Viabilidade::Alta
    } else if pontos >= 60 {
        Viabilidade::Media
    } else if pontos >= 40 {
        Viabilidade::Baixa
    } else {
        Viabilidade::Critica
    }
}

/// Collaboration potential: headcount (30/20/10) + shared tools
/// (40/30/20/5) + 30 base, thresholded at 80/60/40.
pub fn potencial_colaboracao(total_personas: usize, ferramentas_comuns: usize) -> &'static str {
    let mut pontos = 0u32;

    if total_personas >= 4 {
        pontos += 30;
    } else if total_personas >= 2 {
        pontos += 20;
    } else {
        pontos += 10;
    }

    if ferramentas_comuns >= 3 {
        pontos += 40;
    } else if ferramentas_comuns >= 2 {
        pontos += 30;
    } else if ferramentas_comuns >= 1 {
        pontos += 20;
    } else {
        pontos += 5;
    }

    pontos += 30;

    if pontos >= 80 {
        "alto"
    } else if pontos >= 60 {
        "médio"
    } else if pontos >= 40 {
        "baixo"
    } else {
        "mínimo"
    }
}

/// Manual hours per month for known processes; 20 otherwise.
fn horas_processo_manual(processo: &str) -> u32 {
    match processo {
        "Recrutamento e Seleção" => 40,
        "Lead Nurturing" => 20,
        "Deploy de Aplicação" => 8,
        "Controle de Despesas" => 16,
        "Gestão de Conteúdo" => 12,
        _ => 20,
    }
}

/// ROI of automating a process: monthly savings over 4 weeks at the
/// configured hourly rate, payback in whole months, annual ROI percent.
pub fn roi_automacao(
    processo: &str,
    potencial: u32,
    settings: &AnalysisSettings,
) -> RoiEstimado {
    let horas = horas_processo_manual(processo) as f64;
    let economia_horas = horas * (potencial as f64 / 100.0);
    let economia_mensal = economia_horas * settings.custo_hora as f64 * 4.0;
    let custo = settings.custo_implementacao as f64;

    let payback_meses = (custo / economia_mensal).ceil() as u32;
    let roi_anual = ((economia_mensal * 12.0 - custo) / custo) * 100.0;

    RoiEstimado {
        economia_mensal: economia_mensal.round() as u32,
        custo_implementacao: settings.custo_implementacao,
        payback_meses,
        roi_anual_percent: roi_anual.round() as i64,
    }
}

/// Setup/monthly cost estimate per process name.
fn custos_processo(processo: &str) -> CustosEstimados {
    let (setup, mensal) = match processo {
        "Recrutamento e Seleção" => (5_000, 2_000),
        "Onboarding de Funcionários" => (3_000, 1_000),
        "Criação de Campanha Digital" => (8_000, 4_000),
        "Gestão de Conteúdo" => (4_000, 2_500),
        "Deploy de Aplicação" => (15_000, 3_000),
        "Produção de Vídeo" => (12_000, 5_000),
        _ => (5_000, 2_000),
    };
    CustosEstimados { setup, mensal }
}

/// Implementation time estimate by automation tier.
pub fn tempo_implementacao(automacao_potencial: u32) -> &'static str {
    if automacao_potencial >= 86 {
        "3-6 meses"
    } else if automacao_potencial >= 61 {
        "2-3 meses"
    } else if automacao_potencial >= 31 {
        "3-6 semanas"
    } else {
        "1-2 semanas"
    }
}

/// Integration tooling required to automate a known process.
fn ferramentas_automacao(processo: &str) -> Vec<String> {
    let tools: &[&str] = match processo {
        "Recrutamento e Seleção" => {
            &["ATS API", "Email automation", "Calendar API", "Assessment tools"]
        }
        "Lead Nurturing" => &["Marketing automation", "CRM API", "Email platform", "Analytics API"],
        "Deploy de Aplicação" => &[
            "CI/CD pipeline",
            "Container orchestration",
            "Monitoring",
            "Notification system",
        ],
        "Controle de Despesas" => {
            &["ERP API", "Approval workflow", "Payment gateway", "Reporting tools"]
        }
        "Gestão de Conteúdo" => &[
            "CMS API",
            "Social media API",
            "Scheduling tools",
            "Analytics integration",
        ],
        _ => &["Workflow automation", "API integration", "Notification system"],
    };
    tools.iter().map(|s| s.to_string()).collect()
}

// ─────────────────────────────────────────────────────────────────
// Matching
// ─────────────────────────────────────────────────────────────────

fn substring_match(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// A persona applies to a process if it matches the specialty directly or
/// its competency names overlap the process steps.
fn persona_aplicavel(persona: &RagPersona, especialidade: Specialty, template: &ProcessTemplate) -> bool {
    if persona.especialidade == Some(especialidade) {
        return true;
    }
    if persona.categoria.slug() == especialidade.slug() {
        return true;
    }
    persona
        .competencias
        .tecnicas
        .iter()
        .chain(persona.competencias.comportamentais.iter())
        .any(|comp| template.etapas.iter().any(|etapa| substring_match(etapa, &comp.nome)))
}

/// Points over known tools and step-relevant competencies, bucketed.
fn nivel_competencia_processo(persona: &RagPersona, template: &ProcessTemplate) -> CompetencyLevel {
    let mut pontos = 0u32;
    let mut total = 0u32;

    for ferramenta in template.ferramentas {
        if let Some(f) = persona
            .ferramentas
            .iter()
            .find(|f| substring_match(&f.nome, ferramenta))
        {
            pontos += f.nivel_proficiencia.score();
            total += 4;
        }
    }

    for comp in persona
        .competencias
        .tecnicas
        .iter()
        .chain(persona.competencias.comportamentais.iter())
    {
        let relevante = template
            .etapas
            .iter()
            .any(|etapa| etapa.to_lowercase().contains(&comp.nome.to_lowercase()));
        if relevante {
            pontos += comp.nivel.score();
            total += 4;
        }
    }

    if total == 0 {
        return CompetencyLevel::Basico;
    }
    let percentual = pontos as f64 / total as f64 * 100.0;
    if percentual >= 75.0 {
        CompetencyLevel::Expert
    } else if percentual >= 50.0 {
        CompetencyLevel::Avancado
    } else if percentual >= 25.0 {
        CompetencyLevel::Intermediario
    } else {
        CompetencyLevel::Basico
    }
}

/// Required tools covered by the available set, as a rounded percentage.
/// Matching is bidirectional substring ("Office 365" covers
/// "Microsoft Office 365").
pub fn cobertura_ferramentas(necessarias: &[&str], disponiveis: &[String]) -> u32 {
    if necessarias.is_empty() {
        return 0;
    }
    let cobertas = necessarias
        .iter()
        .filter(|n| disponiveis.iter().any(|d| substring_match(d, n)))
        .count();
    (cobertas as f64 / necessarias.len() as f64 * 100.0).round() as u32
}

// ─────────────────────────────────────────────────────────────────
// Collaboration patterns
// ─────────────────────────────────────────────────────────────────

struct ColaboracaoPattern {
    par: (Specialty, Specialty),
    processos_compartilhados: &'static [&'static str],
    sinergias: &'static [&'static str],
    pontos_friccao: &'static [&'static str],
}

/// The four canned specialty pairs with a known collaboration shape.
fn colaboracao_patterns() -> [ColaboracaoPattern; 4] {
    [
        ColaboracaoPattern {
            par: (Specialty::Marketing, Specialty::Tecnologia),
            processos_compartilhados: &[
                "Landing pages",
                "Marketing automation",
                "Analytics implementation",
            ],
            sinergias: &["Tech stack integration", "Data pipeline", "Performance optimization"],
            pontos_friccao: &["Different priorities", "Technical complexity", "Timeline alignment"],
        },
        ColaboracaoPattern {
            par: (Specialty::Hr, Specialty::Marketing),
            processos_compartilhados: &[
                "Employer branding",
                "Internal communications",
                "Event management",
            ],
            sinergias: &["Brand consistency", "Employee advocacy", "Content creation"],
            pontos_friccao: &["Compliance requirements", "Message approval", "Target audiences"],
        },
        ColaboracaoPattern {
            par: (Specialty::Financeiro, Specialty::Marketing),
            processos_compartilhados: &["Budget planning", "ROI measurement", "Cost optimization"],
            sinergias: &["Data-driven decisions", "Performance tracking", "Resource allocation"],
            pontos_friccao: &[
                "Cost control vs growth",
                "Attribution complexity",
                "Reporting standards",
            ],
        },
        ColaboracaoPattern {
            par: (Specialty::Youtube, Specialty::MidiasSociais),
            processos_compartilhados: &["Content planning", "Cross-promotion", "Analytics"],
            sinergias: &["Content repurposing", "Audience growth", "Brand consistency"],
            pontos_friccao: &[
                "Platform-specific optimization",
                "Resource allocation",
                "Content formats",
            ],
        },
    ]
}

/// Build the collaboration record for a pair, if a pattern exists
/// (checked in both orders).
fn analisar_colaboracao(
    esp1: Specialty,
    esp2: Specialty,
    personas: &[RagPersona],
) -> Option<Colaboracao> {
    let patterns = colaboracao_patterns();
    let pattern = patterns
        .iter()
        .find(|p| p.par == (esp1, esp2) || p.par == (esp2, esp1))?;

    let lado = |esp: Specialty| -> Vec<&RagPersona> {
        personas
            .iter()
            .filter(|p| p.especialidade == Some(esp) || p.categoria.slug() == esp.slug())
            .collect()
    };
    let personas1 = lado(esp1);
    let personas2 = lado(esp2);

    let ferramentas = |ps: &[&RagPersona]| -> Vec<String> {
        let mut out = Vec::new();
        for p in ps {
            for f in &p.ferramentas {
                if !out.contains(&f.nome) {
                    out.push(f.nome.clone());
                }
            }
        }
        out
    };
    let f1 = ferramentas(&personas1);
    let f2 = ferramentas(&personas2);
    let ferramentas_comuns: Vec<String> = f1.into_iter().filter(|f| f2.contains(f)).collect();

    let mut personas_envolvidas = BTreeMap::new();
    personas_envolvidas.insert(
        esp1.slug().to_string(),
        personas1
            .iter()
            .map(|p| PersonaMin {
                id: p.id,
                nome: p.nome_completo.clone(),
            })
            .collect(),
    );
    personas_envolvidas.insert(
        esp2.slug().to_string(),
        personas2
            .iter()
            .map(|p| PersonaMin {
                id: p.id,
                nome: p.nome_completo.clone(),
            })
            .collect(),
    );

    let potencial =
        potencial_colaboracao(personas1.len() + personas2.len(), ferramentas_comuns.len());

    Some(Colaboracao {
        especialidades: vec![esp1.slug().to_string(), esp2.slug().to_string()],
        personas_envolvidas,
        processos_compartilhados: to_strings(pattern.processos_compartilhados),
        sinergias_identificadas: to_strings(pattern.sinergias),
        pontos_friccao: to_strings(pattern.pontos_friccao),
        ferramentas_comuns,
        potencial_colaboracao: potencial.to_string(),
    })
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ─────────────────────────────────────────────────────────────────
// Bottlenecks
// ─────────────────────────────────────────────────────────────────

/// Tools used by >= 70% of personas and specialties held by exactly one.
pub fn identificar_gargalos(personas: &[RagPersona]) -> Vec<Gargalo> {
    let mut gargalos = Vec::new();
    let total = personas.len();

    // Tool concentration, in first-seen order.
    let mut ordem: Vec<String> = Vec::new();
    let mut uso: BTreeMap<String, (Vec<String>, Vec<String>)> = BTreeMap::new();
    for persona in personas {
        let grupo = persona
            .especialidade
            .map(|e| e.slug().to_string())
            .unwrap_or_else(|| persona.categoria.slug().to_string());
        for ferramenta in &persona.ferramentas {
            if !ordem.contains(&ferramenta.nome) {
                ordem.push(ferramenta.nome.clone());
            }
            let entry = uso.entry(ferramenta.nome.clone()).or_default();
            entry.0.push(persona.nome_completo.clone());
            if !entry.1.contains(&grupo) {
                entry.1.push(grupo.clone());
            }
        }
    }

    for nome in &ordem {
        let (usuarios, especialidades) = &uso[nome];
        if usuarios.len() as f64 >= total as f64 * 0.7 {
            gargalos.push(Gargalo {
                tipo: "ferramenta_critica".to_string(),
                recurso: nome.clone(),
                descricao: format!(
                    "{} é usada por {} personas ({}%)",
                    nome,
                    usuarios.len(),
                    (usuarios.len() as f64 / total as f64 * 100.0).round() as u32
                ),
                impacto: "alto".to_string(),
                usuarios_afetados: usuarios.clone(),
                especialidades_afetadas: Some(especialidades.clone()),
                recomendacao: "Considerar redundância ou alternativas para esta ferramenta crítica"
                    .to_string(),
            });
        }
    }

    // Single-person specialties.
    let mut grupos: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for persona in personas {
        let grupo = persona
            .especialidade
            .map(|e| e.slug().to_string())
            .unwrap_or_else(|| persona.categoria.slug().to_string());
        grupos.entry(grupo).or_default().push(persona.nome_completo.clone());
    }

    for (grupo, nomes) in grupos {
        if nomes.len() == 1 {
            gargalos.push(Gargalo {
                tipo: "especialidade_critica".to_string(),
                recurso: grupo.clone(),
                descricao: format!("Apenas 1 pessoa com especialidade em {}", grupo),
                impacto: "crítico".to_string(),
                usuarios_afetados: nomes,
                especialidades_afetadas: None,
                recomendacao:
                    "Priorizar contratação ou desenvolvimento de backup para esta especialidade"
                        .to_string(),
            });
        }
    }

    gargalos
}

// ─────────────────────────────────────────────────────────────────
// Recommendations
// ─────────────────────────────────────────────────────────────────

fn impacto_rank(impacto: &str) -> u32 {
    match impacto {
        "crítico" => 3,
        "alto" => 2,
        "médio" => 1,
        _ => 0,
    }
}

fn gerar_recomendacoes(
    oportunidades: &[OportunidadeAutomacao],
    colaboracoes: &[Colaboracao],
    gargalos: &[Gargalo],
) -> Vec<Recomendacao> {
    let mut recomendacoes = Vec::new();

    let mut alta_automacao: Vec<&OportunidadeAutomacao> =
        oportunidades.iter().filter(|o| o.potencial >= 70).collect();
    alta_automacao.sort_by(|a, b| b.potencial.cmp(&a.potencial));

    for oport in alta_automacao.into_iter().take(3) {
        recomendacoes.push(Recomendacao {
            categoria: "automacao_prioritaria".to_string(),
            titulo: format!("Automatizar {}", oport.processo),
            descricao: format!(
                "Processo com {}% de potencial de automação",
                oport.potencial
            ),
            impacto: "alto".to_string(),
            prazo: "2-3 meses".to_string(),
            roi_estimado: Some(oport.roi_estimado.clone()),
            recursos_necessarios: Some(oport.ferramentas_necessarias.clone()),
            beneficios: None,
            ferramentas_comuns: None,
            acao_recomendada: None,
        });
    }

    for colab in colaboracoes
        .iter()
        .filter(|c| c.potencial_colaboracao == "alto")
    {
        recomendacoes.push(Recomendacao {
            categoria: "melhoria_colaboracao".to_string(),
            titulo: format!(
                "Otimizar colaboração {}",
                colab.especialidades.join(" + ")
            ),
            descricao: format!(
                "Alta sinergia identificada entre {}",
                colab.especialidades.join(" e ")
            ),
            impacto: "médio".to_string(),
            prazo: "1-2 meses".to_string(),
            roi_estimado: None,
            recursos_necessarios: None,
            beneficios: Some(colab.sinergias_identificadas.clone()),
            ferramentas_comuns: Some(colab.ferramentas_comuns.clone()),
            acao_recomendada: None,
        });
    }

    for gargalo in gargalos.iter().filter(|g| g.impacto == "crítico") {
        recomendacoes.push(Recomendacao {
            categoria: "resolucao_gargalo".to_string(),
            titulo: format!("Resolver gargalo: {}", gargalo.recurso),
            descricao: gargalo.descricao.clone(),
            impacto: "crítico".to_string(),
            prazo: "imediato".to_string(),
            roi_estimado: None,
            recursos_necessarios: None,
            beneficios: None,
            ferramentas_comuns: None,
            acao_recomendada: Some(gargalo.recomendacao.clone()),
        });
    }

    recomendacoes.sort_by(|a, b| impacto_rank(&b.impacto).cmp(&impacto_rank(&a.impacto)));
    recomendacoes
}

// ─────────────────────────────────────────────────────────────────
// Stage runner
// ─────────────────────────────────────────────────────────────────

/// Run stage 4 for a company.
pub fn run(workspace: &CompanyWorkspace, settings: &AnalysisSettings) -> Result<StageReport> {
    let kb: RagKnowledgeBase = workspace.load_artifact(Artifact::RagKnowledgeBase)?;

    // Specialties present, in canonical order.
    let especialidades: Vec<Specialty> = Specialty::all()
        .iter()
        .copied()
        .filter(|esp| kb.personas.iter().any(|p| p.especialidade == Some(*esp)))
        .collect();

    info!(
        empresa = %workspace.codigo(),
        especialidades = ?especialidades.iter().map(|e| e.slug()).collect::<Vec<_>>(),
        "Flow analysis starting"
    );

    // Instantiate each specialty's templates against the roster.
    let mut processos = Vec::new();
    let mut oportunidades = Vec::new();

    for especialidade in &especialidades {
        for template in templates(*especialidade) {
            let aplicaveis: Vec<&RagPersona> = kb
                .personas
                .iter()
                .filter(|p| persona_aplicavel(p, *especialidade, template))
                .collect();

            let mut disponiveis: Vec<String> = Vec::new();
            for persona in &aplicaveis {
                for f in &persona.ferramentas {
                    if !disponiveis.contains(&f.nome) {
                        disponiveis.push(f.nome.clone());
                    }
                }
            }

            let cobertura = cobertura_ferramentas(template.ferramentas, &disponiveis);

            processos.push(ProcessoRecord {
                id: format!(
                    "processo_{}",
                    template.nome.to_lowercase().replace(' ', "_")
                ),
                nome: template.nome.to_string(),
                categoria: especialidade.slug().to_string(),
                etapas: to_strings(template.etapas),
                personas_disponiveis: aplicaveis
                    .iter()
                    .map(|p| PersonaDisponivel {
                        id: p.id,
                        nome: p.nome_completo.clone(),
                        categoria: p.categoria.slug().to_string(),
                        especialidade: p.especialidade,
                        nivel_competencia: nivel_competencia_processo(p, template),
                    })
                    .collect(),
                ferramentas_necessarias: to_strings(template.ferramentas),
                ferramentas_disponiveis: disponiveis,
                cobertura_ferramentas: cobertura,
                automacao_potencial: template.automacao_potencial,
                kpis: to_strings(template.kpis),
                viabilidade: viabilidade(aplicaveis.len(), cobertura),
                custos_estimados: custos_processo(template.nome),
                tempo_implementacao: tempo_implementacao(template.automacao_potencial)
                    .to_string(),
            });

            if template.automacao_potencial >= 60 {
                oportunidades.push(OportunidadeAutomacao {
                    processo: template.nome.to_string(),
                    especialidade: *especialidade,
                    potencial: template.automacao_potencial,
                    ferramentas_necessarias: ferramentas_automacao(template.nome),
                    roi_estimado: roi_automacao(template.nome, template.automacao_potencial, settings),
                });
            }
        }
    }

    // Pairwise collaborations, only where a pattern exists.
    let mut colaboracoes = Vec::new();
    for i in 0..especialidades.len() {
        for j in (i + 1)..especialidades.len() {
            if let Some(colab) =
                analisar_colaboracao(especialidades[i], especialidades[j], &kb.personas)
            {
                colaboracoes.push(colab);
            }
        }
    }

    let gargalos = identificar_gargalos(&kb.personas);
    let recomendacoes = gerar_recomendacoes(&oportunidades, &colaboracoes, &gargalos);

    let analise = FlowAnalysis {
        empresa_codigo: workspace.codigo().to_string(),
        versao_analise: "1.0.0".to_string(),
        data_analise: chrono::Utc::now().to_rfc3339(),
        estatisticas: EstatisticasFluxos {
            total_processos: processos.len() as u32,
            processos_alta_viabilidade: processos
                .iter()
                .filter(|p| p.viabilidade == Viabilidade::Alta)
                .count() as u32,
            oportunidades_automacao: oportunidades.iter().filter(|o| o.potencial >= 70).count()
                as u32,
            colaboracoes_identificadas: colaboracoes.len() as u32,
            gargalos_criticos: gargalos.iter().filter(|g| g.impacto == "crítico").count() as u32,
        },
        preparacao_n8n: PreparacaoN8n {
            processos_automatizaveis: oportunidades
                .iter()
                .filter(|o| o.potencial >= 60)
                .map(|o| ProcessoAutomatizavel {
                    processo: o.processo.clone(),
                    especialidade: o.especialidade,
                    potencial: o.potencial,
                    ferramentas: o.ferramentas_necessarias.clone(),
                })
                .collect(),
            workflows_prioritarios: processos
                .iter()
                .filter(|p| p.viabilidade == Viabilidade::Alta && p.automacao_potencial >= 50)
                .map(|p| WorkflowPrioritario {
                    nome: p.nome.clone(),
                    etapas: p.etapas.clone(),
                    ferramentas: p.ferramentas_necessarias.clone(),
                    kpis: p.kpis.clone(),
                })
                .collect(),
        },
        processos,
        colaboracoes,
        automacao_oportunidades: oportunidades,
        gargalos,
        recomendacoes,
    };

    // Per-persona slices.
    for (_, folder, persona_path) in workspace.list_persona_dirs()? {
        let Some(persona) = kb.personas.iter().find(|p| p.persona_key == folder) else {
            continue;
        };

        let esp_slug = persona.especialidade.map(|e| e.slug().to_string());
        let slice = serde_json::json!({
            "persona": {
                "id": persona.id,
                "nome": persona.nome_completo,
                "categoria": persona.categoria,
                "especialidade": persona.especialidade,
            },
            "processos_aplicaveis": analise.processos.iter()
                .filter(|p| p.personas_disponiveis.iter().any(|d| d.id == persona.id))
                .collect::<Vec<_>>(),
            "colaboracoes_envolvidas": analise.colaboracoes.iter()
                .filter(|c| esp_slug.as_ref().is_some_and(|e| c.especialidades.contains(e)))
                .collect::<Vec<_>>(),
            "automacao_participacao": analise.automacao_oportunidades.iter()
                .filter(|o| Some(o.especialidade) == persona.especialidade)
                .collect::<Vec<_>>(),
            "recomendacoes_especificas": analise.recomendacoes.iter()
                .filter(|r| {
                    let titulo = r.titulo.to_lowercase();
                    esp_slug.as_ref().is_some_and(|e| titulo.contains(e))
                        || titulo.contains(persona.categoria.slug())
                })
                .collect::<Vec<_>>(),
            "data_processamento": chrono::Utc::now().to_rfc3339(),
        });

        let stage_dir = workspace.stage_dir(&persona_path, Stage::Fluxos)?;
        workspace.write_json(&stage_dir.join("fluxos_analise.json"), &slice)?;
    }

    let output = workspace.artifact_path(Artifact::FluxosAnalise);
    workspace.write_json(&output, &analise)?;

    info!(
        empresa = %workspace.codigo(),
        processos = analise.estatisticas.total_processos,
        oportunidades = analise.estatisticas.oportunidades_automacao,
        colaboracoes = analise.estatisticas.colaboracoes_identificadas,
        gargalos = analise.gargalos.len(),
        "Stage 4 (fluxos) finished"
    );

    Ok(StageReport {
        stage: Stage::Fluxos,
        items: analise.estatisticas.total_processos as usize,
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
    use crate::pipeline::rag::{
        RagBiografia, RagCompetencias, RagFerramenta, SearchMetadata,
    };

    fn persona(id: u32, nome: &str, esp: Option<Specialty>, tools: &[&str]) -> RagPersona {
        RagPersona {
            id,
            persona_key: nome.replace(' ', "_"),
            nome_completo: nome.to_string(),
            categoria: if esp.is_some() {
                Category::Especialistas
            } else {
                Category::Executivos
            },
            especialidade: esp,
            experiencia_anos: 8,
            biografia: RagBiografia {
                educacao: "MBA".to_string(),
                idiomas: vec!["inglês".to_string()],
                secoes_extraidas: vec![],
            },
            competencias: RagCompetencias {
                tecnicas: vec![],
                comportamentais: vec![],
            },
            ferramentas: tools
                .iter()
                .enumerate()
                .map(|(i, t)| RagFerramenta {
                    id: format!("{}_f_{}", id, i + 1),
                    nome: t.to_string(),
                    categoria_uso: "especializada".to_string(),
                    nivel_proficiencia: CompetencyLevel::Avancado,
                    especificacoes: None,
                })
                .collect(),
            search_metadata: SearchMetadata {
                tags: vec![],
                embedding_text: String::new(),
                update_timestamp: String::new(),
            },
        }
    }

    #[test]
    fn test_viabilidade_buckets() {
        // 3 personas + 85% coverage: 40 + 40 + 20 = 100 => alta
        assert_eq!(viabilidade(3, 85), Viabilidade::Alta);
        // 1 persona + 10% coverage: 20 + 10 + 20 = 50 => baixa
        assert_eq!(viabilidade(1, 10), Viabilidade::Baixa);
        // 0 personas + 0% coverage: 0 + 10 + 20 = 30 => crítica
        assert_eq!(viabilidade(0, 0), Viabilidade::Critica);
        // 2 personas + 60% coverage: 30 + 30 + 20 = 80 => alta
        assert_eq!(viabilidade(2, 60), Viabilidade::Alta);
    }

    #[test]
    fn test_roi_recrutamento() {
        let settings = AnalysisSettings::default();
        let roi = roi_automacao("Recrutamento e Seleção", 80, &settings);
        // 40h * 0.8 * 50 * 4 = 6400
        assert_eq!(roi.economia_mensal, 6_400);
        assert_eq!(roi.payback_meses, 2);
        assert_eq!(roi.roi_anual_percent, 668);
    }

    #[test]
    fn test_roi_default_hours() {
        let settings = AnalysisSettings::default();
        let roi = roi_automacao("Processo Desconhecido", 60, &settings);
        // 20h * 0.6 * 50 * 4 = 2400
        assert_eq!(roi.economia_mensal, 2_400);
        assert_eq!(roi.payback_meses, 5);
    }

    #[test]
    fn test_potencial_colaboracao_buckets() {
        // 4 people, 3 shared tools: 30 + 40 + 30 = 100 => alto
        assert_eq!(potencial_colaboracao(4, 3), "alto");
        // 2 people, 1 shared tool: 20 + 20 + 30 = 70 => médio
        assert_eq!(potencial_colaboracao(2, 1), "médio");
        // 1 person, 0 shared: 10 + 5 + 30 = 45 => baixo
        assert_eq!(potencial_colaboracao(1, 0), "baixo");
    }

    #[test]
    fn test_cobertura_substring_both_directions() {
        let disponiveis = vec!["Microsoft Office 365".to_string(), "Slack".to_string()];
        // "Office 365" matches "Microsoft Office 365"
        assert_eq!(cobertura_ferramentas(&["Office 365", "Slack"], &disponiveis), 100);
        assert_eq!(cobertura_ferramentas(&["Office 365", "SAP"], &disponiveis), 50);
    }

    #[test]
    fn test_bottleneck_critical_tool() {
        let mut personas: Vec<RagPersona> = (1..=8)
            .map(|i| persona(i, &format!("P {}", i), None, &["Slack"]))
            .collect();
        personas.push(persona(9, "P 9", None, &["Excel"]));
        personas.push(persona(10, "P 10", None, &["Excel"]));

        let gargalos = identificar_gargalos(&personas);
        let ferramenta: Vec<_> = gargalos
            .iter()
            .filter(|g| g.tipo == "ferramenta_critica")
            .collect();
        assert_eq!(ferramenta.len(), 1);
        assert_eq!(ferramenta[0].recurso, "Slack");
        assert_eq!(ferramenta[0].usuarios_afetados.len(), 8);
    }

    #[test]
    fn test_bottleneck_single_person_specialty() {
        let mut personas: Vec<RagPersona> = (1..=9)
            .map(|i| persona(i, &format!("P {}", i), Some(Specialty::Tecnologia), &[]))
            .collect();
        personas.push(persona(10, "Solo Fin", Some(Specialty::Financeiro), &[]));

        let gargalos = identificar_gargalos(&personas);
        let criticos: Vec<_> = gargalos
            .iter()
            .filter(|g| g.tipo == "especialidade_critica")
            .collect();
        assert_eq!(criticos.len(), 1);
        assert_eq!(criticos[0].recurso, "financeiro");
        assert_eq!(criticos[0].impacto, "crítico");
    }

    #[test]
    fn test_no_pattern_for_hr_tecnologia() {
        let personas = vec![
            persona(1, "A", Some(Specialty::Hr), &["Slack"]),
            persona(2, "B", Some(Specialty::Tecnologia), &["Slack"]),
        ];
        assert!(analisar_colaboracao(Specialty::Hr, Specialty::Tecnologia, &personas).is_none());
    }

    #[test]
    fn test_pattern_matches_either_order() {
        let personas = vec![
            persona(1, "A", Some(Specialty::Marketing), &["Slack", "Canva", "HubSpot"]),
            persona(2, "B", Some(Specialty::Tecnologia), &["Slack", "Canva", "HubSpot"]),
        ];
        let a = analisar_colaboracao(Specialty::Marketing, Specialty::Tecnologia, &personas);
        let b = analisar_colaboracao(Specialty::Tecnologia, Specialty::Marketing, &personas);
        assert!(a.is_some());
        assert!(b.is_some());
        assert_eq!(a.unwrap().ferramentas_comuns.len(), 3);
    }

    #[test]
    fn test_tempo_implementacao_tiers() {
        assert_eq!(tempo_implementacao(90), "3-6 meses");
        assert_eq!(tempo_implementacao(70), "2-3 meses");
        assert_eq!(tempo_implementacao(45), "3-6 semanas");
        assert_eq!(tempo_implementacao(20), "1-2 semanas");
    }

    #[test]
    fn test_recommendations_sorted_by_impact() {
        let settings = AnalysisSettings::default();
        let oportunidades = vec![OportunidadeAutomacao {
            processo: "Lead Nurturing".to_string(),
            especialidade: Specialty::Marketing,
            potencial: 80,
            ferramentas_necessarias: vec![],
            roi_estimado: roi_automacao("Lead Nurturing", 80, &settings),
        }];
        let gargalos = vec![Gargalo {
            tipo: "especialidade_critica".to_string(),
            recurso: "financeiro".to_string(),
            descricao: "x".to_string(),
            impacto: "crítico".to_string(),
            usuarios_afetados: vec![],
            especialidades_afetadas: None,
            recomendacao: "y".to_string(),
        }];

        let recs = gerar_recomendacoes(&oportunidades, &[], &gargalos);
        assert_eq!(recs[0].impacto, "crítico");
        assert_eq!(recs[1].impacto, "alto");
    }
}
