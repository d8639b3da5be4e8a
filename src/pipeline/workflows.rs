//! Stage 5 — synthesize N8N workflow graphs from the flow analysis.
//!
//! Opportunities with automation potential >= 60 resolve to a named node
//! template per (specialty, process-name substring); high-viability
//! processes without a template get an ad-hoc workflow with one function
//! node per step. Nodes chain linearly: node i connects only to node i+1.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::Result;
use crate::persona::{sanitize_name, Specialty};

use super::fluxos::{FlowAnalysis, ProcessoAutomatizavel, WorkflowPrioritario};
use super::workspace::CompanyWorkspace;
use super::{Artifact, Stage, StageReport};

// ─────────────────────────────────────────────────────────────────
// Node templates
// ─────────────────────────────────────────────────────────────────

/// Horizontal spacing between nodes (layout metadata only).
const NODE_SPACING_X: i64 = 220;
const NODE_START_X: i64 = 240;
const NODE_Y: i64 = 300;

/// One node of a workflow template, before materialization.
#[derive(Debug, Clone)]
pub struct NodeDef {
    pub tipo: &'static str,
    pub nome: String,
    pub config: Value,
}

/// A named workflow template.
#[derive(Debug, Clone)]
pub struct WorkflowTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub nodes: Vec<NodeDef>,
}

fn node(tipo: &'static str, nome: &str, config: Value) -> NodeDef {
    NodeDef {
        tipo,
        nome: nome.to_string(),
        config,
    }
}

/// The per-specialty node templates.
fn template_definition(key: &str) -> Option<WorkflowTemplate> {
    let template = match key {
        "hr_recrutamento" => WorkflowTemplate {
            key: "hr_recrutamento",
            name: "Automação de Recrutamento",
            description: "Automatiza processo de triagem e agendamento de entrevistas",
            nodes: vec![
                node("webhook", "Nova Candidatura", json!({"path": "nova-candidatura", "method": "POST"})),
                node("function", "Processar Currículo", json!({"code": "return items.map(item => ({ ...item, score: calculateResumeScore(item.resume) }));"})),
                node("if", "Score Qualificação", json!({"condition": "{{ $node.score >= 75 }}"})),
                node("gmail", "Enviar Email Aprovado", json!({"operation": "send", "to": "{{ $json.email }}", "subject": "Próximas etapas - Processo seletivo"})),
                node("calendly", "Agendar Entrevista", json!({"operation": "create", "event_type": "entrevista-inicial"})),
                node("slack", "Notificar RH", json!({"channel": "#recrutamento", "message": "Nova entrevista agendada: {{ $json.name }}"})),
            ],
        },
        "marketing_campanha" => WorkflowTemplate {
            key: "marketing_campanha",
            name: "Automação de Campanhas",
            description: "Automatiza criação e monitoramento de campanhas digitais",
            nodes: vec![
                node("cron", "Trigger Semanal", json!({"expression": "0 9 * * 1"})),
                node("googlesheets", "Ler Planejamento", json!({"operation": "read", "range": "Campanhas!A:Z"})),
                node("function", "Processar Dados", json!({"code": "return items.filter(item => item.status === 'Aprovado' && new Date(item.dataInicio) <= new Date());"})),
                node("facebook", "Criar Campanha FB", json!({"operation": "createCampaign", "objective": "TRAFFIC"})),
                node("google-ads", "Criar Campanha Google", json!({"operation": "createCampaign", "type": "SEARCH"})),
                node("slack", "Notificar Equipe", json!({"channel": "#marketing", "message": "Campanhas ativadas: {{ $json.length }}"})),
            ],
        },
        "financeiro_aprovacao" => WorkflowTemplate {
            key: "financeiro_aprovacao",
            name: "Automação de Aprovações",
            description: "Automatiza fluxo de aprovação de despesas e pagamentos",
            nodes: vec![
                node("webhook", "Nova Solicitação", json!({"path": "nova-despesa", "method": "POST"})),
                node("function", "Validar Dados", json!({"code": "return items.map(item => ({ ...item, needsApproval: item.valor > 1000 }));"})),
                node("if", "Precisa Aprovação", json!({"condition": "{{ $json.needsApproval === true }}"})),
                node("slack", "Solicitar Aprovação", json!({"channel": "#aprovacoes", "message": "Nova despesa para aprovação: R$ {{ $json.valor }}"})),
                node("wait", "Aguardar Resposta", json!({"amount": 24, "unit": "hours"})),
                node("erp-system", "Registrar no ERP", json!({"operation": "create", "module": "expenses"})),
            ],
        },
        "tecnologia_deploy" => WorkflowTemplate {
            key: "tecnologia_deploy",
            name: "Automação de Deploy",
            description: "Automatiza processo de deploy e monitoramento",
            nodes: vec![
                node("github", "Git Push Trigger", json!({"repository": "main", "branch": "main"})),
                node("function", "Validar Branch", json!({"code": "return items.filter(item => item.ref === 'refs/heads/main');"})),
                node("jenkins", "Iniciar Build", json!({"job": "build-and-test", "parameters": {}})),
                node("wait", "Aguardar Build", json!({"amount": 10, "unit": "minutes"})),
                node("if", "Build Sucesso", json!({"condition": "{{ $json.status === 'SUCCESS' }}"})),
                node("kubernetes", "Deploy Produção", json!({"operation": "apply", "namespace": "production"})),
                node("slack", "Notificar Deploy", json!({"channel": "#deployments", "message": "Deploy realizado com sucesso! Version: {{ $json.version }}"})),
            ],
        },
        "youtube_otimizacao" => WorkflowTemplate {
            key: "youtube_otimizacao",
            name: "Automação YouTube",
            description: "Automatiza otimização e análise de canal YouTube",
            nodes: vec![
                node("cron", "Análise Diária", json!({"expression": "0 10 * * *"})),
                node("youtube", "Buscar Vídeos Recentes", json!({"operation": "list", "part": "statistics,snippet"})),
                node("function", "Calcular Métricas", json!({"code": "return items.map(item => ({ ...item, performanceScore: calculatePerformance(item.statistics) }));"})),
                node("googlesheets", "Atualizar Dashboard", json!({"operation": "append", "spreadsheet": "YouTube Analytics"})),
                node("if", "Performance Baixa", json!({"condition": "{{ $json.performanceScore < 50 }}"})),
                node("slack", "Alert Performance", json!({"channel": "#youtube", "message": "Vídeo com baixa performance: {{ $json.title }}"})),
            ],
        },
        "midias_sociais_monitoramento" => WorkflowTemplate {
            key: "midias_sociais_monitoramento",
            name: "Automação Mídias Sociais",
            description: "Monitora menções e automatiza engajamento",
            nodes: vec![
                node("cron", "Monitoramento Contínuo", json!({"expression": "*/15 * * * *"})),
                node("twitter", "Buscar Menções", json!({"operation": "search", "query": "@empresa_handle"})),
                node("instagram", "Buscar Tags", json!({"operation": "searchHashtag", "hashtag": "#empresa"})),
                node("function", "Analisar Sentimento", json!({"code": "return items.map(item => ({ ...item, sentiment: analyzeSentiment(item.text) }));"})),
                node("if", "Sentimento Negativo", json!({"condition": "{{ $json.sentiment === 'negative' }}"})),
                node("slack", "Alerta Crise", json!({"channel": "#crisis-management", "message": "Menção negativa detectada: {{ $json.text }}"})),
                node("airtable", "Registrar Interação", json!({"operation": "create", "table": "Social Monitoring"})),
            ],
        },
        _ => return None,
    };
    Some(template)
}

/// Resolve a (specialty, process name) pair to a template key, matching
/// the process name by substring in either direction.
pub fn template_key_for(especialidade: Specialty, processo: &str) -> Option<&'static str> {
    let candidatos: &[(&str, &str)] = match especialidade {
        Specialty::Hr => &[
            ("Recrutamento e Seleção", "hr_recrutamento"),
            ("Onboarding", "hr_onboarding"),
        ],
        Specialty::Marketing => &[
            ("Criação de Campanha", "marketing_campanha"),
            ("Gestão de Conteúdo", "marketing_conteudo"),
        ],
        Specialty::Financeiro => &[
            ("Controle de Despesas", "financeiro_aprovacao"),
            ("Aprovações", "financeiro_aprovacao"),
        ],
        Specialty::Tecnologia => &[
            ("Deploy", "tecnologia_deploy"),
            ("CI/CD", "tecnologia_deploy"),
        ],
        Specialty::Youtube => &[
            ("Otimização", "youtube_otimizacao"),
            ("Analytics", "youtube_analytics"),
        ],
        Specialty::MidiasSociais => &[
            ("Monitoramento", "midias_sociais_monitoramento"),
            ("Engagement", "midias_sociais_engagement"),
        ],
    };

    let processo_lower = processo.to_lowercase();
    for (chave, template) in candidatos {
        let chave_lower = chave.to_lowercase();
        if processo_lower.contains(&chave_lower) || chave_lower.contains(&processo_lower) {
            return Some(template);
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────
// Scoring
// ─────────────────────────────────────────────────────────────────

/// Specialties whose automation is considered business-critical.
const ESPECIALIDADES_PRIORITARIAS: &[Specialty] =
    &[Specialty::Tecnologia, Specialty::Financeiro, Specialty::Hr];

/// Priority: potential tier + critical-specialty bonus + inverse tool
/// count, thresholded at 80/60/40.
pub fn prioridade_workflow(
    potencial: u32,
    especialidade: Specialty,
    ferramentas_count: usize,
) -> &'static str {
    let mut score = 0u32;

    if potencial >= 80 {
        score += 40;
    } else if potencial >= 60 {
        score += 30;
    } else {
        score += 20;
    }

    if ESPECIALIDADES_PRIORITARIAS.contains(&especialidade) {
        score += 30;
    } else {
        score += 20;
    }

    if ferramentas_count <= 3 {
        score += 30;
    } else if ferramentas_count <= 5 {
        score += 20;
    } else {
        score += 10;
    }

    if score >= 80 {
        "crítica"
    } else if score >= 60 {
        "alta"
    } else if score >= 40 {
        "média"
    } else {
        "baixa"
    }
}

/// Implementation complexity from tool count, template and potential.
pub fn complexidade_workflow(
    ferramentas_count: usize,
    template_key: &str,
    potencial: u32,
) -> &'static str {
    let mut score = 0u32;

    if ferramentas_count > 5 {
        score += 30;
    } else if ferramentas_count > 3 {
        score += 20;
    } else {
        score += 10;
    }

    if template_key == "tecnologia_deploy" || template_key == "financeiro_aprovacao" {
        score += 30;
    } else {
        score += 15;
    }

    if potencial >= 80 {
        score += 25;
    } else if potencial >= 60 {
        score += 15;
    } else {
        score += 5;
    }

    if score >= 60 {
        "alta"
    } else if score >= 35 {
        "média"
    } else {
        "baixa"
    }
}

/// Integration credentials implied by the automation tooling names.
pub fn identificar_integracoes(ferramentas: &[String]) -> Vec<Value> {
    let mut integracoes = Vec::new();

    for ferramenta in ferramentas {
        let normalizada = ferramenta.to_lowercase().replace(' ', "");
        if normalizada.contains("slack") {
            integracoes.push(json!({
                "node_type": "n8n-nodes-base.slack",
                "auth_type": "oauth2",
                "required_scopes": ["chat:write", "channels:read"],
                "common_operations": ["postMessage", "getChannels", "getUsers"]
            }));
        }
        if normalizada.contains("gmail") || normalizada.contains("email") {
            integracoes.push(json!({
                "node_type": "n8n-nodes-base.gmail",
                "auth_type": "oauth2",
                "required_scopes": ["https://www.googleapis.com/auth/gmail.send"],
                "common_operations": ["send", "get", "list"]
            }));
        }
        if normalizada.contains("sheets") || normalizada.contains("planilha") {
            integracoes.push(json!({
                "node_type": "n8n-nodes-base.googleSheets",
                "auth_type": "serviceAccount",
                "required_scopes": ["https://www.googleapis.com/auth/spreadsheets"],
                "common_operations": ["read", "append", "update", "create"]
            }));
        }
        if normalizada.contains("hubspot") || normalizada.contains("crm") {
            integracoes.push(json!({
                "node_type": "n8n-nodes-base.hubspot",
                "auth_type": "apiKey",
                "required_permissions": ["contacts", "deals", "tickets"],
                "common_operations": ["create", "update", "get", "list"]
            }));
        }
    }

    integracoes
}

// ─────────────────────────────────────────────────────────────────
// N8N JSON model
// ─────────────────────────────────────────────────────────────────

/// One node in N8N's JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct N8nNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: [i64; 2],
    pub parameters: Value,
    #[serde(rename = "typeVersion")]
    pub type_version: u32,
    pub notes: String,
    #[serde(rename = "webhookId", skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Value>,
}

/// A complete N8N-importable workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct N8nWorkflow {
    pub name: String,
    pub nodes: Vec<N8nNode>,
    pub connections: BTreeMap<String, Value>,
    pub active: bool,
    pub settings: Value,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(rename = "versionId")]
    pub version_id: String,
    pub meta: Value,
}

/// Map a template node kind onto the N8N node type.
fn n8n_node_type(tipo: &str) -> String {
    let known = match tipo {
        "webhook" => "n8n-nodes-base.webhook",
        "function" => "n8n-nodes-base.function",
        "if" => "n8n-nodes-base.if",
        "slack" => "n8n-nodes-base.slack",
        "gmail" => "n8n-nodes-base.gmail",
        "googlesheets" => "n8n-nodes-base.googleSheets",
        "hubspot" => "n8n-nodes-base.hubspot",
        "cron" => "n8n-nodes-base.cron",
        "wait" => "n8n-nodes-base.wait",
        "set" => "n8n-nodes-base.set",
        "http" => "n8n-nodes-base.httpRequest",
        _ => return "n8n-nodes-base.function".to_string(),
    };
    known.to_string()
}

/// Node parameters per kind.
fn n8n_parameters(node_def: &NodeDef) -> Value {
    let config = &node_def.config;
    match node_def.tipo {
        "webhook" => json!({
            "path": config.get("path").cloned().unwrap_or(Value::Null),
            "httpMethod": config.get("method").cloned().unwrap_or(json!("POST")),
            "responseMode": "onReceived",
        }),
        "slack" => json!({
            "resource": "message",
            "operation": "post",
            "channel": config.get("channel").cloned().unwrap_or(Value::Null),
            "text": config.get("message").cloned().unwrap_or(Value::Null),
        }),
        "gmail" => json!({
            "resource": "message",
            "operation": "send",
            "to": config.get("to").cloned().unwrap_or(Value::Null),
            "subject": config.get("subject").cloned().unwrap_or(Value::Null),
            "message": config.get("message").cloned().unwrap_or(json!("Enviado automaticamente pelo VCM")),
        }),
        "cron" => json!({
            "rule": {
                "interval": [{
                    "field": "cronExpression",
                    "value": config.get("expression").cloned().unwrap_or(Value::Null),
                }]
            }
        }),
        "if" => json!({
            "conditions": {
                "string": [{
                    "value1": config.get("condition").cloned().unwrap_or(Value::Null),
                    "operation": "equal",
                    "value2": "true",
                }]
            }
        }),
        "function" => json!({
            "functionCode": config.get("code").cloned().unwrap_or(Value::Null),
        }),
        "wait" => json!({
            "amount": config.get("amount").cloned().unwrap_or(Value::Null),
            "unit": config.get("unit").cloned().unwrap_or(Value::Null),
        }),
        _ => json!({
            "operation": config.get("operation").cloned().unwrap_or(json!("execute")),
        }),
    }
}

/// Materialize a template into an importable workflow. Nodes are laid out
/// left to right and chained linearly.
pub fn gerar_workflow(
    template: &WorkflowTemplate,
    especialidade: Specialty,
    processo: &str,
    empresa_codigo: &str,
) -> N8nWorkflow {
    let now = chrono::Utc::now().to_rfc3339();
    let mut nodes = Vec::new();
    let mut connections: BTreeMap<String, Value> = BTreeMap::new();

    for (index, node_def) in template.nodes.iter().enumerate() {
        let node_id = (index + 1).to_string();
        let mut n8n_node = N8nNode {
            id: node_id.clone(),
            name: node_def.nome.clone(),
            node_type: n8n_node_type(node_def.tipo),
            position: [NODE_START_X + index as i64 * NODE_SPACING_X, NODE_Y],
            parameters: n8n_parameters(node_def),
            type_version: 1,
            notes: format!("Gerado automaticamente para {}", empresa_codigo),
            webhook_id: None,
            credentials: None,
        };

        if node_def.tipo == "webhook" {
            let path = node_def
                .config
                .get("path")
                .and_then(|v| v.as_str())
                .unwrap_or("workflow-trigger");
            n8n_node.webhook_id = Some(format!("{}_{}", empresa_codigo, path));
        }
        if node_def.tipo == "slack" {
            n8n_node.credentials = Some(json!({
                "slackApi": {
                    "id": format!("slack_{}", empresa_codigo),
                    "name": format!("Slack {}", empresa_codigo.to_uppercase()),
                }
            }));
        }

        // Linear chain: the previous node's single outgoing edge points here.
        if index > 0 {
            connections.insert(
                index.to_string(),
                json!({
                    "main": [[{ "node": node_id, "type": "main", "index": 0 }]]
                }),
            );
        }

        nodes.push(n8n_node);
    }

    N8nWorkflow {
        name: format!("{}_{}", empresa_codigo.to_uppercase(), template.name),
        nodes,
        connections,
        active: false,
        settings: json!({
            "executionOrder": "v1",
            "saveManualExecutions": true,
            "callerPolicy": "workflowsFromSameOwner",
            "errorWorkflow": format!("{}_Error_Handler", empresa_codigo.to_uppercase()),
            "timezone": "America/Sao_Paulo",
        }),
        created_at: now.clone(),
        updated_at: now,
        version_id: "1".to_string(),
        meta: json!({
            "empresa": empresa_codigo,
            "versao": "1.0.0",
            "autor": "VCM Auto-Generator",
            "descricao": template.description,
            "especialidade": especialidade.slug(),
            "processo_origem": processo,
        }),
    }
}

/// Ad-hoc template for processes without a canned one: one function node
/// per step plus a closing notification node.
pub fn template_custom(workflow: &WorkflowPrioritario) -> WorkflowTemplate {
    let mut nodes = vec![node(
        "webhook",
        "Trigger Inicial",
        json!({
            "path": workflow.nome.to_lowercase().replace(' ', "-"),
            "method": "POST",
        }),
    )];

    for etapa in &workflow.etapas {
        nodes.push(node(
            "function",
            &format!("Processar {}", etapa),
            json!({"code": format!("// Processamento para: {}\nreturn items;", etapa)}),
        ));
    }

    nodes.push(node(
        "slack",
        "Notificar Conclusão",
        json!({
            "channel": "#workflows",
            "message": format!("Workflow {} executado com sucesso!", workflow.nome),
        }),
    ));

    WorkflowTemplate {
        key: "custom",
        name: "Automação Customizada",
        description: "Workflow gerado a partir das etapas do processo",
        nodes,
    }
}

// ─────────────────────────────────────────────────────────────────
// Documentation
// ─────────────────────────────────────────────────────────────────

fn complexidade_grafo(workflow: &N8nWorkflow) -> &'static str {
    let total_nos = workflow.nodes.len() as f64;
    let tipos: std::collections::HashSet<&str> =
        workflow.nodes.iter().map(|n| n.node_type.as_str()).collect();
    let conexoes = workflow.connections.len() as f64;

    let score = total_nos + tipos.len() as f64 * 2.0 + conexoes * 1.5;
    if score >= 20.0 {
        "alta"
    } else if score >= 12.0 {
        "média"
    } else {
        "baixa"
    }
}

fn integracoes_do_grafo(workflow: &N8nWorkflow) -> Vec<String> {
    let mut out = Vec::new();
    for n in &workflow.nodes {
        if let Some(sufixo) = n.node_type.split('.').nth(1) {
            let sufixo = sufixo.to_string();
            if !out.contains(&sufixo) {
                out.push(sufixo);
            }
        }
    }
    out
}

fn tempo_setup_horas(workflow: &N8nWorkflow) -> u32 {
    let total_nos = workflow.nodes.len() as f64;
    let integracoes = integracoes_do_grafo(workflow).len() as f64;
    (2.0 + total_nos * 0.5 + integracoes).ceil() as u32
}

/// Render the implementation guide markdown.
fn render_implementacao_md(
    empresa_codigo: &str,
    workflows: &[&N8nWorkflow],
) -> String {
    let mut doc = format!(
        "# Implementação de Workflows N8N - {}\n\n\
         ## Visão Geral\n\n\
         - **Total de Workflows:** {}\n\
         - **Versão:** 1.0.0\n\n\
         ## Guia de Instalação\n\n\
         ### Pré-requisitos\n\
         - N8N instalado e configurado\n\
         - Credenciais configuradas para integrações\n\
         - Webhooks URLs configuradas\n\
         - Permissões de API validadas\n\n\
         ### Passos de Implementação\n\
         1. Importar workflows JSON no N8N\n\
         2. Configurar credenciais de integração\n\
         3. Testar conexões com sistemas externos\n\
         4. Ativar workflows em ambiente de teste\n\
         5. Validar execuções e ajustar parâmetros\n\
         6. Migrar para produção\n\n\
         ## Workflows Implementados\n",
        empresa_codigo.to_uppercase(),
        workflows.len(),
    );

    for workflow in workflows {
        doc.push_str(&format!(
            "\n### {}\n- **Descrição:** {}\n- **Complexidade:** {}\n- **Tempo de Setup:** {} horas\n- **Total de Nós:** {}\n",
            workflow.name,
            workflow
                .meta
                .get("descricao")
                .and_then(|v| v.as_str())
                .unwrap_or(""),
            complexidade_grafo(workflow),
            tempo_setup_horas(workflow),
            workflow.nodes.len(),
        ));
    }

    doc.push_str(
        "\n## Monitoramento\n\n\
         ### Métricas a Acompanhar\n\
         - Taxa de sucesso de execuções\n\
         - Tempo médio de execução\n\
         - Frequência de erros\n\
         - Throughput de processamento\n\n\
         ### Alertas Recomendados\n\
         - Falha em workflow crítico\n\
         - Execução com duração anômala\n\
         - Erro de integração externa\n\
         - Webhook não responsivo\n\n\
         ---\n\
         *Gerado automaticamente pelo VCM (Virtual Company Manager)*\n",
    );

    doc
}

// ─────────────────────────────────────────────────────────────────
// Stage runner
// ─────────────────────────────────────────────────────────────────

/// A generated workflow plus the configuration that produced it.
struct WorkflowGerado {
    workflow: N8nWorkflow,
    arquivo: String,
    processo: String,
    especialidade: Specialty,
    prioridade: String,
    complexidade: String,
    integracoes: Vec<Value>,
}

/// Run stage 5 for a company.
pub fn run(workspace: &CompanyWorkspace) -> Result<StageReport> {
    let analise: FlowAnalysis = workspace.load_artifact(Artifact::FluxosAnalise)?;
    let empresa_codigo = workspace.codigo().to_string();

    let mut gerados: Vec<WorkflowGerado> = Vec::new();

    // Templated workflows from the automation opportunities.
    for processo in &analise.preparacao_n8n.processos_automatizaveis {
        if processo.potencial < 60 {
            continue;
        }
        match resolver_template(processo) {
            Some((key, template)) => {
                let workflow = gerar_workflow(
                    &template,
                    processo.especialidade,
                    &processo.processo,
                    &empresa_codigo,
                );
                gerados.push(WorkflowGerado {
                    arquivo: format!("{}.json", workflow.name),
                    prioridade: prioridade_workflow(
                        processo.potencial,
                        processo.especialidade,
                        processo.ferramentas.len(),
                    )
                    .to_string(),
                    complexidade: complexidade_workflow(
                        processo.ferramentas.len(),
                        key,
                        processo.potencial,
                    )
                    .to_string(),
                    integracoes: identificar_integracoes(&processo.ferramentas),
                    processo: processo.processo.clone(),
                    especialidade: processo.especialidade,
                    workflow,
                });
            }
            None => {
                warn!(
                    processo = %processo.processo,
                    especialidade = %processo.especialidade,
                    "No workflow template resolved, dropped"
                );
            }
        }
    }

    // Ad-hoc workflows for high-viability processes without a template.
    for prioritario in &analise.preparacao_n8n.workflows_prioritarios {
        if gerados.iter().any(|g| g.processo == prioritario.nome) {
            continue;
        }
        let Some(origem) = analise.processos.iter().find(|p| p.nome == prioritario.nome) else {
            continue;
        };
        let Ok(especialidade) = origem.categoria.parse::<Specialty>() else {
            continue;
        };

        let template = template_custom(prioritario);
        let mut workflow = gerar_workflow(
            &template,
            especialidade,
            &prioritario.nome,
            &empresa_codigo,
        );
        workflow.name = format!(
            "{}_Automação {}",
            empresa_codigo.to_uppercase(),
            prioritario.nome
        );

        gerados.push(WorkflowGerado {
            arquivo: format!("{}.json", workflow.name),
            prioridade: "alta".to_string(),
            complexidade: "média".to_string(),
            integracoes: identificar_integracoes(&prioritario.ferramentas),
            processo: prioritario.nome.clone(),
            especialidade,
            workflow,
        });
    }

    // Write individual workflow files.
    let workflows_dir = workspace.workflows_dir();
    for gerado in &gerados {
        let path = workflows_dir.join(&gerado.arquivo);
        workspace.write_json(&path, &gerado.workflow)?;
        info!(workflow = %gerado.workflow.name, "Workflow written");
    }

    // Implementation guide.
    let refs: Vec<&N8nWorkflow> = gerados.iter().map(|g| &g.workflow).collect();
    let guia = render_implementacao_md(&empresa_codigo, &refs);
    workspace.write_text(&workflows_dir.join("IMPLEMENTACAO.md"), &guia)?;

    // Consolidated result.
    let prioridade_rank = |p: &str| match p {
        "crítica" => 4,
        "alta" => 3,
        "média" => 2,
        _ => 1,
    };
    let mut ordem: Vec<&WorkflowGerado> = gerados.iter().collect();
    ordem.sort_by(|a, b| prioridade_rank(&b.prioridade).cmp(&prioridade_rank(&a.prioridade)));

    let tempo_total: u32 = gerados.iter().map(|g| tempo_setup_horas(&g.workflow)).sum();
    let especialidades_cobertas: Vec<String> = {
        let mut out = Vec::new();
        for g in &gerados {
            let slug = g.especialidade.slug().to_string();
            if !out.contains(&slug) {
                out.push(slug);
            }
        }
        out
    };

    let resultado = json!({
        "empresa_codigo": empresa_codigo,
        "versao_n8n": "1.0.0",
        "data_geracao": chrono::Utc::now().to_rfc3339(),
        "workflows": gerados.iter().map(|g| json!({
            "nome": g.workflow.name,
            "arquivo": g.arquivo,
            "processo_origem": g.processo,
            "especialidade": g.especialidade.slug(),
            "prioridade": g.prioridade,
            "complexidade": g.complexidade,
            "nos_count": g.workflow.nodes.len(),
            "integracoes_necessarias": g.integracoes,
        })).collect::<Vec<_>>(),
        "estatisticas": {
            "total_workflows": gerados.len(),
            "workflows_alta_prioridade": gerados.iter()
                .filter(|g| g.prioridade == "alta" || g.prioridade == "crítica")
                .count(),
            "workflows_baixa_complexidade": gerados.iter()
                .filter(|g| g.complexidade == "baixa")
                .count(),
            "especialidades_cobertas": especialidades_cobertas,
            "integracoes_unicas": gerados.iter()
                .flat_map(|g| integracoes_do_grafo(&g.workflow))
                .collect::<std::collections::BTreeSet<_>>(),
        },
        "implementacao": {
            "ordem_implementacao": ordem.iter().enumerate().map(|(i, g)| json!({
                "nome": g.workflow.name,
                "prioridade": g.prioridade,
                "ordem": i + 1,
            })).collect::<Vec<_>>(),
            "tempo_total_setup": format!(
                "{} horas ({} dias úteis)",
                tempo_total,
                (tempo_total as f64 / 8.0).ceil() as u32
            ),
        },
    });

    // Per-persona slices: workflows from processes the persona appears in.
    for (_, folder, persona_path) in workspace.list_persona_dirs()? {
        let aplicaveis: Vec<&WorkflowGerado> = gerados
            .iter()
            .filter(|g| {
                analise
                    .processos
                    .iter()
                    .filter(|p| p.nome == g.processo)
                    .any(|p| {
                        p.personas_disponiveis
                            .iter()
                            .any(|d| sanitize_name(&d.nome) == folder)
                    })
            })
            .collect();

        let slice = json!({
            "persona_folder": folder,
            "workflows_aplicaveis": aplicaveis.iter().map(|g| json!({
                "nome": g.workflow.name,
                "arquivo": g.arquivo,
                "descricao": g.workflow.meta.get("descricao"),
                "complexidade": g.complexidade,
                "prioridade": g.prioridade,
            })).collect::<Vec<_>>(),
            "implementacao_sugerida": {
                "primeiro_workflow": aplicaveis.first().map(|g| g.workflow.name.clone()),
                "ordem_implementacao": aplicaveis.iter().enumerate().map(|(i, g)| json!({
                    "ordem": i + 1,
                    "nome": g.workflow.name,
                })).collect::<Vec<_>>(),
            },
            "recursos_necessarios": {
                "credenciais": aplicaveis.iter()
                    .flat_map(|g| g.workflow.nodes.iter())
                    .filter_map(|n| n.credentials.as_ref())
                    .filter_map(|c| c.as_object())
                    .flat_map(|o| o.keys().cloned())
                    .collect::<std::collections::BTreeSet<_>>(),
                "apis_integradas": aplicaveis.iter()
                    .flat_map(|g| integracoes_do_grafo(&g.workflow))
                    .collect::<std::collections::BTreeSet<_>>(),
            },
            "data_processamento": chrono::Utc::now().to_rfc3339(),
        });

        let stage_dir = workspace.stage_dir(&persona_path, Stage::Workflows)?;
        workspace.write_json(&stage_dir.join("n8n_workflows.json"), &slice)?;
    }

    let output = workspace.artifact_path(Artifact::N8nWorkflows);
    workspace.write_json(&output, &resultado)?;

    info!(
        empresa = %workspace.codigo(),
        workflows = gerados.len(),
        "Stage 5 (workflows) finished"
    );

    Ok(StageReport {
        stage: Stage::Workflows,
        items: gerados.len(),
        output,
    })
}

/// Resolve the template for an automatable process.
fn resolver_template(
    processo: &ProcessoAutomatizavel,
) -> Option<(&'static str, WorkflowTemplate)> {
    let key = template_key_for(processo.especialidade, &processo.processo)?;
    let template = template_definition(key)?;
    Some((template.key, template))
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
