//! End-to-end pipeline tests
//!
//! Drives the binary through the full stage chain against a seeded
//! reference company: 1 CEO + 2 executives + 2 assistants + specialists
//! in hr and tecnologia (7 personas).

mod common;

use std::collections::HashSet;

use common::{company_root, generate_reference_company, load_json, pipeline_cmd, run_stage};
use tempfile::TempDir;

const CODIGO: &str = "ARVATEST";

fn run_full_pipeline(data_dir: &std::path::Path) {
    generate_reference_company(data_dir, CODIGO);
    for stage in ["competencias", "tech-specs", "rag", "fluxos", "workflows"] {
        run_stage(data_dir, CODIGO, stage);
    }
}

// ─────────────────────────────────────────────────────────────────
// Stage 0 — generation
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_generate_writes_seven_personas() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);

    let config = load_json(tmp.path(), CODIGO, "personas_config.json");
    assert_eq!(config["executivos"].as_object().unwrap().len(), 2);
    assert_eq!(config["assistentes"].as_object().unwrap().len(), 2);
    assert_eq!(config["especialistas"].as_object().unwrap().len(), 2);
    assert!(config["ceo"]["is_ceo"].as_bool().unwrap());

    // Biographies land under category directories with the bio suffix
    let bios = company_root(tmp.path(), CODIGO).join("04_BIOS_PERSONAS");
    assert!(bios.join("executivos").is_dir());
    assert!(bios.join("assistentes").is_dir());
    assert!(bios.join("especialistas").is_dir());
}

#[test]
fn test_generate_names_unique() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);

    let config = load_json(tmp.path(), CODIGO, "personas_config.json");
    let mut names = HashSet::new();
    names.insert(config["ceo"]["nome_completo"].as_str().unwrap().to_string());
    for section in ["executivos", "assistentes", "especialistas"] {
        for persona in config[section].as_object().unwrap().values() {
            let nome = persona["nome_completo"].as_str().unwrap().to_string();
            assert!(names.insert(nome.clone()), "duplicate name {}", nome);
        }
    }
    assert_eq!(names.len(), 7);
}

// ─────────────────────────────────────────────────────────────────
// Stage 1 — competencies
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_competencias_consolidated_and_bounded() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);
    run_stage(tmp.path(), CODIGO, "competencias");

    let analysis = load_json(tmp.path(), CODIGO, "competencias_analysis.json");
    assert_eq!(analysis["total_personas"], 7);
    assert_eq!(analysis["estatisticas"]["por_categoria"]["executivos"], 3);
    assert_eq!(analysis["estatisticas"]["por_especialidade"]["hr"], 1);
    assert_eq!(analysis["estatisticas"]["por_especialidade"]["tecnologia"], 1);

    for (folder, persona) in analysis["personas"].as_object().unwrap() {
        let comp = &persona["competencias"];
        let tecnicas = comp["tecnicas"].as_array().unwrap();
        let comportamentais = comp["comportamentais"].as_array().unwrap();
        let ferramentas = comp["ferramentas"].as_array().unwrap();

        assert!(tecnicas.len() <= 7, "{}: {:?}", folder, tecnicas);
        assert!(comportamentais.len() <= 6);
        assert!(ferramentas.len() <= 7);

        for list in [tecnicas, comportamentais, ferramentas] {
            let unique: HashSet<&str> = list.iter().filter_map(|v| v.as_str()).collect();
            assert_eq!(unique.len(), list.len(), "duplicates for {}", folder);
        }

        // Per-persona slice exists
        let slice = company_root(tmp.path(), CODIGO)
            .join("04_BIOS_PERSONAS")
            .join(persona["persona"]["categoria"].as_str().unwrap())
            .join(folder)
            .join("script1_competencias")
            .join("competencias_core.json");
        assert!(slice.exists(), "missing {}", slice.display());
    }
}

#[test]
fn test_competencias_rerun_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);

    run_stage(tmp.path(), CODIGO, "competencias");
    let first = load_json(tmp.path(), CODIGO, "competencias_analysis.json");

    run_stage(tmp.path(), CODIGO, "competencias");
    let second = load_json(tmp.path(), CODIGO, "competencias_analysis.json");

    // Unchanged persona + unchanged catalogs: identical derived profiles
    for (folder, persona) in first["personas"].as_object().unwrap() {
        assert_eq!(
            persona["competencias"], second["personas"][folder]["competencias"],
            "profile drifted for {}",
            folder
        );
    }
}

// ─────────────────────────────────────────────────────────────────
// Stage 2 — tech specs
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_tech_specs_categories() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);
    run_stage(tmp.path(), CODIGO, "competencias");
    run_stage(tmp.path(), CODIGO, "tech-specs");

    let specs = load_json(tmp.path(), CODIGO, "tech_specifications.json");
    let categorias = specs["especificacoes_categorias"].as_object().unwrap();

    // Executives/assistants bring productivity, communication and analytics
    // tools; the tech specialist brings cloud and dev/design
    assert!(categorias.contains_key("produtividade_escritorio"));
    assert!(categorias.contains_key("comunicacao_colaboracao"));
    assert!(categorias.contains_key("analytics_bi"));
    assert!(categorias.contains_key("cloud_infrastructure"));

    for spec in categorias.values() {
        assert!(spec["prioridade"].is_string());
        assert!(spec["tempo_estimado_implementacao"].is_string());
        assert!(spec["especificacoes"]["funcionalidades_core"].is_array());
    }

    // Specialty blocks only for staffed specialties
    let personalizadas = specs["especificacoes_personalizadas"].as_object().unwrap();
    assert_eq!(personalizadas.len(), 2);
    assert!(personalizadas.contains_key("hr"));
    assert!(personalizadas.contains_key("tecnologia"));
}

#[test]
fn test_tech_specs_accepts_input_path_override() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);
    run_stage(tmp.path(), CODIGO, "competencias");

    // Move the stage-1 artifact elsewhere and point stage 2 at it
    let root = company_root(tmp.path(), CODIGO);
    let moved = tmp.path().join("analysis_moved.json");
    std::fs::rename(root.join("competencias_analysis.json"), &moved).unwrap();

    pipeline_cmd()
        .args([
            "tech-specs",
            "--empresa-codigo",
            CODIGO,
            "--data-dir",
            tmp.path().to_str().unwrap(),
            "--input-path",
            moved.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(root.join("tech_specifications.json").exists());
}

// ─────────────────────────────────────────────────────────────────
// Stage 3 — RAG knowledge base
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_rag_referential_integrity() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);
    run_stage(tmp.path(), CODIGO, "competencias");
    run_stage(tmp.path(), CODIGO, "tech-specs");
    run_stage(tmp.path(), CODIGO, "rag");

    let kb = load_json(tmp.path(), CODIGO, "rag_knowledge_base.json");
    assert_eq!(kb["metadata_rag"]["total_personas"], 7);

    let ids: HashSet<u64> = kb["personas"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 7);

    for comp in kb["competencias"].as_array().unwrap() {
        for possuidora in comp["personas_possuidoras"].as_array().unwrap() {
            let id = possuidora["persona_id"].as_u64().unwrap();
            assert!(ids.contains(&id), "dangling persona_id {} in competencias", id);
        }
    }
    for tool in kb["ferramentas"].as_array().unwrap() {
        for usuario in tool["usuarios"].as_array().unwrap() {
            let id = usuario["persona_id"].as_u64().unwrap();
            assert!(ids.contains(&id), "dangling persona_id {} in ferramentas", id);
        }
    }

    // One context per persona, unique competency and unique tool
    let esperado = 7
        + kb["competencias"].as_array().unwrap().len()
        + kb["ferramentas"].as_array().unwrap().len();
    assert_eq!(kb["contextos_busca"].as_array().unwrap().len(), esperado);
}

#[test]
fn test_rag_embedding_text_shape() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);
    run_stage(tmp.path(), CODIGO, "competencias");
    run_stage(tmp.path(), CODIGO, "tech-specs");
    run_stage(tmp.path(), CODIGO, "rag");

    let kb = load_json(tmp.path(), CODIGO, "rag_knowledge_base.json");
    for persona in kb["personas"].as_array().unwrap() {
        let text = persona["search_metadata"]["embedding_text"].as_str().unwrap();
        assert!(text.contains("trabalha como"));
        assert!(text.contains("anos de experiência"));
        assert!(text.contains("competências técnicas:"));
        assert!(text.contains("idiomas:"));
    }
}

// ─────────────────────────────────────────────────────────────────
// Stage 4 — flow analysis
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_fluxos_reference_scenario() {
    let tmp = TempDir::new().unwrap();
    run_full_pipeline(tmp.path());

    let analise = load_json(tmp.path(), CODIGO, "fluxos_analise_completa.json");

    // Three canned templates per staffed specialty
    let processos = analise["processos"].as_array().unwrap();
    assert_eq!(processos.len(), 6);
    assert_eq!(
        processos.iter().filter(|p| p["categoria"] == "hr").count(),
        3
    );
    assert_eq!(
        processos.iter().filter(|p| p["categoria"] == "tecnologia").count(),
        3
    );

    // No collaboration pattern exists for the hr/tecnologia pair
    assert_eq!(analise["colaboracoes"].as_array().unwrap().len(), 0);

    // Both single-person specialties are critical bottlenecks
    let criticas: Vec<&str> = analise["gargalos"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|g| g["tipo"] == "especialidade_critica")
        .map(|g| g["recurso"].as_str().unwrap())
        .collect();
    assert!(criticas.contains(&"hr"));
    assert!(criticas.contains(&"tecnologia"));

    // Shared office tooling crosses the 70% threshold
    assert!(analise["gargalos"]
        .as_array()
        .unwrap()
        .iter()
        .any(|g| g["tipo"] == "ferramenta_critica"));
}

#[test]
fn test_fluxos_roi_arithmetic() {
    let tmp = TempDir::new().unwrap();
    run_full_pipeline(tmp.path());

    let analise = load_json(tmp.path(), CODIGO, "fluxos_analise_completa.json");
    let recrutamento = analise["automacao_oportunidades"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["processo"] == "Recrutamento e Seleção")
        .expect("recruitment opportunity present (potential 70)");

    // 40h * 0.7 * 50 * 4 = 5600; payback ceil(10000/5600) = 2
    let roi = &recrutamento["roi_estimado"];
    assert_eq!(roi["economia_mensal"], 5600);
    assert_eq!(roi["payback_meses"], 2);
    assert_eq!(roi["custo_implementacao"], 10000);
}

// ─────────────────────────────────────────────────────────────────
// Stage 5 — workflows
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_workflows_generated_and_linear() {
    let tmp = TempDir::new().unwrap();
    run_full_pipeline(tmp.path());

    let resultado = load_json(tmp.path(), CODIGO, "n8n_workflows_completo.json");
    let workflows = resultado["workflows"].as_array().unwrap();
    assert!(!workflows.is_empty());

    // The deploy process (potential 85, tecnologia) always resolves
    let deploy = workflows
        .iter()
        .find(|w| w["processo_origem"] == "Deploy de Aplicação")
        .expect("deploy workflow generated");
    assert_eq!(deploy["especialidade"], "tecnologia");

    // Exported workflow files are valid N8N JSON with a linear chain
    let workflows_dir = company_root(tmp.path(), CODIGO).join("06_N8N_WORKFLOWS");
    assert!(workflows_dir.join("IMPLEMENTACAO.md").exists());

    let arquivo = deploy["arquivo"].as_str().unwrap();
    let workflow: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(workflows_dir.join(arquivo)).unwrap(),
    )
    .unwrap();

    let nodes = workflow["nodes"].as_array().unwrap();
    let connections = workflow["connections"].as_object().unwrap();
    assert_eq!(connections.len(), nodes.len() - 1);
    for (id, edge) in connections {
        let origem: usize = id.parse().unwrap();
        let destino = edge["main"][0][0]["node"].as_str().unwrap();
        assert_eq!(destino, (origem + 1).to_string());
    }
}

// ─────────────────────────────────────────────────────────────────
// Cascade
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_cascade_runs_all_stages() {
    let tmp = TempDir::new().unwrap();
    generate_reference_company(tmp.path(), CODIGO);

    pipeline_cmd()
        .args([
            "cascade",
            "--empresa-codigo",
            CODIGO,
            "--data-dir",
            tmp.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    let root = company_root(tmp.path(), CODIGO);
    for artifact in [
        "competencias_analysis.json",
        "tech_specifications.json",
        "rag_knowledge_base.json",
        "fluxos_analise_completa.json",
        "n8n_workflows_completo.json",
    ] {
        assert!(root.join(artifact).exists(), "missing {}", artifact);
    }
}

#[test]
fn test_cascade_requires_biographies() {
    let tmp = TempDir::new().unwrap();

    pipeline_cmd()
        .args([
            "cascade",
            "--empresa-codigo",
            "EMPTY",
            "--data-dir",
            tmp.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(30);
}
