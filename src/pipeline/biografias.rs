//! Stage 0 — generate the persona roster and write biographies to disk.

use tracing::info;

use crate::error::Result;
use crate::persona::{BiographyGenerator, CompanySetup};

use super::workspace::CompanyWorkspace;
use super::{Artifact, Stage, StageReport};

/// Generate all personas for a company and persist biographies plus the
/// consolidated `personas_config.json`.
pub fn run(workspace: &CompanyWorkspace, setup: &CompanySetup) -> Result<StageReport> {
    let mut generator = BiographyGenerator::new(setup.seed);
    let config = generator.generate_company(setup);

    for persona in config.all_personas() {
        let dir = workspace.persona_dir(persona.categoria, &persona.folder_name());
        let bio_path = dir.join(persona.bio_file_name());
        workspace.write_text(&bio_path, &persona.biografia_md)?;
        info!(
            persona = %persona.nome_completo,
            categoria = %persona.categoria,
            "Biography written"
        );
    }

    let output = workspace.artifact_path(Artifact::PersonasConfig);
    workspace.write_json(&output, &config)?;

    info!(
        empresa = %workspace.codigo(),
        personas = config.total(),
        nomes_unicos = generator.unique_names(),
        "Stage 0 (biografias) finished"
    );

    Ok(StageReport {
        stage: Stage::Biografias,
        items: config.total(),
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{CompanyProfile, Gender, Nationality, PersonasConfig, Specialty};
    use tempfile::TempDir;

    fn setup(codigo: &str) -> CompanySetup {
        CompanySetup {
            empresa: CompanyProfile {
                codigo: codigo.to_string(),
                nome: "Arvatest Inc".to_string(),
                industria: "tecnologia".to_string(),
            },
            nacionalidade: Nationality::Latinos,
            ceo_genero: Gender::Feminino,
            executivos_homens: 1,
            executivos_mulheres: 1,
            assistentes_homens: 1,
            assistentes_mulheres: 1,
            especialidades: vec![Specialty::Hr, Specialty::Tecnologia],
            especialistas_homens: 1,
            idiomas_extras: vec![],
            seed: Some(5),
        }
    }

    #[test]
    fn test_writes_bios_and_config() {
        let tmp = TempDir::new().unwrap();
        let ws = CompanyWorkspace::new(tmp.path(), "ARVATEST");
        let report = run(&ws, &setup("ARVATEST")).unwrap();

        assert_eq!(report.items, 7);
        assert!(ws.artifact_path(Artifact::PersonasConfig).exists());

        let config: PersonasConfig = ws.load_artifact(Artifact::PersonasConfig).unwrap();
        assert_eq!(config.total(), 7);

        for persona in config.all_personas() {
            let bio = ws
                .persona_dir(persona.categoria, &persona.folder_name())
                .join(persona.bio_file_name());
            assert!(bio.exists(), "missing bio {}", bio.display());
        }
    }

    #[test]
    fn test_personas_listable_after_generation() {
        let tmp = TempDir::new().unwrap();
        let ws = CompanyWorkspace::new(tmp.path(), "ARVATEST");
        run(&ws, &setup("ARVATEST")).unwrap();

        let dirs = ws.list_persona_dirs().unwrap();
        assert_eq!(dirs.len(), 7);
        // CEO lands under executivos with the other executives
        assert_eq!(dirs.iter().filter(|(c, _, _)| c == "executivos").count(), 3);
    }
}
