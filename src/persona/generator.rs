//! Biography generator — builds the persona roster for one company.
//!
//! Pure over its inputs plus the owned name registry and RNG; writing the
//! generated records to disk is the pipeline stage's job.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::names::{NameRegistry, IDIOMAS_BASE};
use super::types::{
    Category, CompanyProfile, Gender, Nationality, PersonaRecord, PersonasConfig, Specialty,
};

// ─────────────────────────────────────────────────────────────────
// Company Setup
// ─────────────────────────────────────────────────────────────────

/// Demographic parameters for one company-generation run.
#[derive(Debug, Clone)]
pub struct CompanySetup {
    pub empresa: CompanyProfile,
    pub nacionalidade: Nationality,
    pub ceo_genero: Gender,
    pub executivos_homens: u32,
    pub executivos_mulheres: u32,
    pub assistentes_homens: u32,
    pub assistentes_mulheres: u32,
    /// One specialist is generated per entry, in order.
    pub especialidades: Vec<Specialty>,
    /// The first N specialists are male, the rest female.
    pub especialistas_homens: u32,
    pub idiomas_extras: Vec<String>,
    /// Fixed RNG seed for reproducible companies.
    pub seed: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────
// Education / specialization catalogs
// ─────────────────────────────────────────────────────────────────

const EDUCACAO_EXECUTIVO: &[&str] = &[
    "MBA em Administração de Empresas pela Harvard Business School",
    "Mestrado em Gestão Estratégica pela INSEAD",
    "Bacharelado em Economia pela Universidade de Stanford",
    "MBA em Liderança pela Wharton School",
];

const EDUCACAO_ASSISTENTE: &[&str] = &[
    "Bacharelado em Administração de Empresas",
    "Tecnólogo em Gestão Comercial",
    "Curso Superior em Secretariado Executivo",
    "Bacharelado em Comunicação Social",
];

const ESPECIALIZACOES_EXECUTIVO: &[&str] = &[
    "Gestão de Operações e Processos",
    "Desenvolvimento de Negócios e Estratégia",
    "Gestão de Projetos e Inovação",
    "Gestão Comercial e Vendas",
];

const ESPECIALIZACAO_CEO: &str = "Liderança Executiva e Gestão Estratégica";
const ESPECIALIZACAO_ASSISTENTE: &str = "Suporte Executivo e Gestão Administrativa";

/// CEO ages skew higher than the executive range.
const CEO_AGE_RANGE: (u32, u32) = (35, 50);

// ─────────────────────────────────────────────────────────────────
// Biography Generator
// ─────────────────────────────────────────────────────────────────

/// Generates persona records with company-unique names.
pub struct BiographyGenerator {
    registry: NameRegistry,
    rng: StdRng,
}

impl BiographyGenerator {
    /// Create a generator, seeded for reproducibility when requested.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        debug!(seed, "Biography generator seeded");
        Self {
            registry: NameRegistry::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of unique names handed out so far.
    pub fn unique_names(&self) -> usize {
        self.registry.len()
    }

    /// Generate the full persona roster for a company.
    pub fn generate_company(&mut self, setup: &CompanySetup) -> PersonasConfig {
        // New company, new name space.
        self.registry.reset();

        let idiomas = language_pool(setup.nacionalidade, &setup.idiomas_extras);

        let ceo = self.generate_persona(
            "CEO",
            Category::Executivos,
            setup.ceo_genero,
            &idiomas,
            setup,
            true,
            None,
        );

        let mut executivos = BTreeMap::new();
        for i in 0..setup.executivos_homens {
            let persona = self.generate_persona(
                "Executivo",
                Category::Executivos,
                Gender::Masculino,
                &idiomas,
                setup,
                false,
                None,
            );
            executivos.insert(format!("executivo_m_{}", i + 1), persona);
        }
        for i in 0..setup.executivos_mulheres {
            let persona = self.generate_persona(
                "Executiva",
                Category::Executivos,
                Gender::Feminino,
                &idiomas,
                setup,
                false,
                None,
            );
            executivos.insert(format!("executiva_f_{}", i + 1), persona);
        }

        let mut assistentes = BTreeMap::new();
        for i in 0..setup.assistentes_homens {
            let persona = self.generate_persona(
                "Assistente Executivo",
                Category::Assistentes,
                Gender::Masculino,
                &idiomas,
                setup,
                false,
                None,
            );
            assistentes.insert(format!("assistente_m_{}", i + 1), persona);
        }
        for i in 0..setup.assistentes_mulheres {
            let persona = self.generate_persona(
                "Assistente Executiva",
                Category::Assistentes,
                Gender::Feminino,
                &idiomas,
                setup,
                false,
                None,
            );
            assistentes.insert(format!("assistente_f_{}", i + 1), persona);
        }

        let mut especialistas = BTreeMap::new();
        for (i, especialidade) in setup.especialidades.iter().enumerate() {
            let genero = if (i as u32) < setup.especialistas_homens {
                Gender::Masculino
            } else {
                Gender::Feminino
            };
            let role = format!("Especialista {}", especialidade.display_name());
            let persona = self.generate_persona(
                &role,
                Category::Especialistas,
                genero,
                &idiomas,
                setup,
                false,
                Some(*especialidade),
            );
            especialistas.insert(format!("especialista_{}", especialidade.slug()), persona);
        }

        info!(
            empresa = %setup.empresa.codigo,
            personas = 1 + executivos.len() + assistentes.len() + especialistas.len(),
            nomes_unicos = self.registry.len(),
            "Company roster generated"
        );

        PersonasConfig {
            empresa: setup.empresa.clone(),
            ceo,
            executivos,
            assistentes,
            especialistas,
        }
    }

    /// Generate a single persona record.
    #[allow(clippy::too_many_arguments)]
    fn generate_persona(
        &mut self,
        role: &str,
        categoria: Category,
        genero: Gender,
        idiomas_pool: &[String],
        setup: &CompanySetup,
        is_ceo: bool,
        especialidade: Option<Specialty>,
    ) -> PersonaRecord {
        let name = self
            .registry
            .allocate(&mut self.rng, genero, setup.nacionalidade);

        let (min_age, max_age) = if is_ceo {
            CEO_AGE_RANGE
        } else {
            categoria.age_range()
        };
        let idade = self.rng.random_range(min_age..=max_age);

        let paises = setup.nacionalidade.paises();
        let pais_origem = paises[self.rng.random_range(0..paises.len())].to_string();

        let educacao = match categoria {
            Category::Executivos => {
                EDUCACAO_EXECUTIVO[self.rng.random_range(0..EDUCACAO_EXECUTIVO.len())].to_string()
            }
            Category::Assistentes => {
                EDUCACAO_ASSISTENTE[self.rng.random_range(0..EDUCACAO_ASSISTENTE.len())].to_string()
            }
            Category::Especialistas => especialidade
                .map(|e| e.educacao().to_string())
                .unwrap_or_else(|| {
                    "Bacharelado em área específica com especializações relevantes".to_string()
                }),
        };

        let anos_experiencia = idade.saturating_sub(22).max(3);

        let mut idiomas: Vec<String> = idiomas_pool.to_vec();
        idiomas.shuffle(&mut self.rng);
        let num_idiomas = self.rng.random_range(3..=6).min(idiomas.len());
        idiomas.truncate(num_idiomas);

        let especializacao = if is_ceo {
            ESPECIALIZACAO_CEO.to_string()
        } else {
            match categoria {
                Category::Executivos => ESPECIALIZACOES_EXECUTIVO
                    [self.rng.random_range(0..ESPECIALIZACOES_EXECUTIVO.len())]
                .to_string(),
                Category::Assistentes => ESPECIALIZACAO_ASSISTENTE.to_string(),
                Category::Especialistas => especialidade
                    .map(|e| e.display_name().to_string())
                    .unwrap_or_else(|| "Especialização Técnica".to_string()),
            }
        };

        let biografia_md = render_biografia(
            &name.nome_completo,
            idade,
            &pais_origem,
            role,
            &especializacao,
            &educacao,
            anos_experiencia,
            genero,
            &idiomas,
            &setup.empresa,
        );

        PersonaRecord {
            nome_completo: name.nome_completo,
            primeiro_nome: name.primeiro_nome,
            sobrenome: name.sobrenome,
            idade,
            genero,
            pais_origem,
            nacionalidade: setup.nacionalidade,
            role: role.to_string(),
            categoria,
            especializacao,
            educacao,
            anos_experiencia,
            idiomas,
            biografia_md,
            especialidade,
            is_ceo,
        }
    }
}

/// Deduplicated base + regional + extra language pool, first occurrence wins.
fn language_pool(nacionalidade: Nationality, extras: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut pool = Vec::new();
    for idioma in IDIOMAS_BASE
        .iter()
        .map(|s| s.to_string())
        .chain(nacionalidade.idiomas_regionais().iter().map(|s| s.to_string()))
        .chain(extras.iter().cloned())
    {
        if seen.insert(idioma.clone()) {
            pool.push(idioma);
        }
    }
    pool
}

/// Render the markdown biography. Section headers are load-bearing: the
/// competency stage extracts them by name.
#[allow(clippy::too_many_arguments)]
fn render_biografia(
    nome: &str,
    idade: u32,
    pais: &str,
    role: &str,
    especializacao: &str,
    educacao: &str,
    experiencia: u32,
    genero: Gender,
    idiomas: &[String],
    empresa: &CompanyProfile,
) -> String {
    let pronome = genero.pronome();
    let sufixo = genero.sufixo();
    let data = chrono::Utc::now().format("%d/%m/%Y");

    format!(
        r#"# {nome}

## INFORMAÇÕES BÁSICAS
- **Nome:** {nome}
- **Idade:** {idade} anos
- **Nacionalidade:** {pais}
- **Cargo:** {role}
- **Especialização:** {especializacao}

## FORMAÇÃO ACADÊMICA
{educacao}

## EXPERIÊNCIA PROFISSIONAL
Com {experiencia} anos de experiência na área de {especializacao_lower}, {nome} traz uma perspectiva única e valiosa para a {empresa_nome}.

Ao longo de sua carreira, {pronome} desenvolveu competências sólidas em:
- Gestão estratégica e operacional
- Liderança de equipes multiculturais
- Desenvolvimento e implementação de processos
- Análise e otimização de resultados
- Comunicação executiva eficaz

## COMPETÊNCIAS LINGUÍSTICAS
**Idiomas:** {idiomas}

## RESPONSABILIDADES NA {empresa_upper}
Como {role}, {nome} é responsável por:
- Suporte direto às operações estratégicas da empresa
- Coordenação de atividades relacionadas à {especializacao_lower}
- Implementação de melhores práticas na área de {industria}
- Colaboração com equipes internas e stakeholders externos
- Desenvolvimento e execução de iniciativas de crescimento

## COMPETÊNCIAS TÉCNICAS
- Domínio de ferramentas de gestão empresarial
- Conhecimento avançado em metodologias ágeis
- Experiência com sistemas de CRM e ERP
- Análise de dados e KPIs
- Gestão de projetos complexos

## COMPETÊNCIAS COMPORTAMENTAIS
- Liderança inspiradora e colaborativa
- Comunicação assertiva e empática
- Adaptabilidade e flexibilidade
- Pensamento estratégico
- Orientação para resultados
- Trabalho em equipe multicultural

## OBJETIVOS E METAS
{nome} está focad{sufixo} em contribuir para o crescimento sustentável da {empresa_nome}, aplicando sua experiência em {especializacao_lower} para:
- Otimizar processos e aumentar a eficiência operacional
- Desenvolver soluções inovadoras para desafios do setor de {industria}
- Fortalecer a cultura organizacional e o engajamento da equipe
- Expandir a presença da empresa no mercado internacional

---
*Biografia gerada automaticamente pelo Virtual Company Manager*
*Data: {data}*"#,
        nome = nome,
        idade = idade,
        pais = pais,
        role = role,
        especializacao = especializacao,
        especializacao_lower = especializacao.to_lowercase(),
        educacao = educacao,
        experiencia = experiencia,
        pronome = pronome,
        sufixo = sufixo,
        idiomas = idiomas.join(", "),
        empresa_nome = empresa.nome,
        empresa_upper = empresa.nome.to_uppercase(),
        industria = empresa.industria,
        data = data,
    )
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn test_setup() -> CompanySetup {
        CompanySetup {
            empresa: CompanyProfile {
                codigo: "TESTCO".to_string(),
                nome: "TechVision Solutions".to_string(),
                industria: "tecnologia".to_string(),
            },
            nacionalidade: Nationality::Latinos,
            ceo_genero: Gender::Feminino,
            executivos_homens: 2,
            executivos_mulheres: 2,
            assistentes_homens: 2,
            assistentes_mulheres: 3,
            especialidades: Specialty::all().to_vec(),
            especialistas_homens: 3,
            idiomas_extras: vec!["alemão".to_string(), "japonês".to_string()],
            seed: Some(99),
        }
    }

    #[test]
    fn test_company_headcount() {
        let setup = test_setup();
        let mut generator = BiographyGenerator::new(setup.seed);
        let config = generator.generate_company(&setup);

        assert_eq!(config.executivos.len(), 4);
        assert_eq!(config.assistentes.len(), 5);
        assert_eq!(config.especialistas.len(), 6);
        assert_eq!(config.total(), 16);
        assert!(config.ceo.is_ceo);
    }

    #[test]
    fn test_names_unique_across_company() {
        let setup = test_setup();
        let mut generator = BiographyGenerator::new(setup.seed);
        let config = generator.generate_company(&setup);

        let mut names = std::collections::HashSet::new();
        for persona in config.all_personas() {
            assert!(
                names.insert(persona.nome_completo.clone()),
                "duplicate name {}",
                persona.nome_completo
            );
        }
        assert_eq!(generator.unique_names(), config.total());
    }

    #[test]
    fn test_ages_within_category_ranges() {
        let setup = test_setup();
        let mut generator = BiographyGenerator::new(setup.seed);
        let config = generator.generate_company(&setup);

        assert!((35..=50).contains(&config.ceo.idade));
        for p in config.executivos.values() {
            assert!((30..=45).contains(&p.idade));
        }
        for p in config.assistentes.values() {
            assert!((25..=35).contains(&p.idade));
        }
        for p in config.especialistas.values() {
            assert!((28..=40).contains(&p.idade));
        }
    }

    #[test]
    fn test_experience_floor() {
        let setup = test_setup();
        let mut generator = BiographyGenerator::new(setup.seed);
        let config = generator.generate_company(&setup);

        for p in config.all_personas() {
            assert!(p.anos_experiencia >= 3);
            assert_eq!(p.anos_experiencia, p.idade.saturating_sub(22).max(3));
        }
    }

    #[test]
    fn test_language_counts() {
        let setup = test_setup();
        let mut generator = BiographyGenerator::new(setup.seed);
        let config = generator.generate_company(&setup);

        for p in config.all_personas() {
            assert!((3..=6).contains(&p.idiomas.len()), "{:?}", p.idiomas);
            let unique: std::collections::HashSet<_> = p.idiomas.iter().collect();
            assert_eq!(unique.len(), p.idiomas.len());
        }
    }

    #[test]
    fn test_specialist_education_is_canned() {
        let setup = test_setup();
        let mut generator = BiographyGenerator::new(setup.seed);
        let config = generator.generate_company(&setup);

        let tech = &config.especialistas["especialista_tecnologia"];
        assert_eq!(tech.educacao, Specialty::Tecnologia.educacao());
        assert_eq!(tech.especialidade, Some(Specialty::Tecnologia));
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let setup = test_setup();
        let a = BiographyGenerator::new(setup.seed).generate_company(&setup);
        let b = BiographyGenerator::new(setup.seed).generate_company(&setup);

        let names_a: Vec<_> = a.all_personas().iter().map(|p| p.nome_completo.clone()).collect();
        let names_b: Vec<_> = b.all_personas().iter().map(|p| p.nome_completo.clone()).collect();
        assert_eq!(names_a, names_b);
        assert_eq!(a.ceo.idade, b.ceo.idade);
        assert_eq!(a.ceo.idiomas, b.ceo.idiomas);
    }

    #[test]
    fn test_biography_sections_present() {
        let setup = test_setup();
        let mut generator = BiographyGenerator::new(setup.seed);
        let config = generator.generate_company(&setup);

        let bio = &config.ceo.biografia_md;
        for header in [
            "## INFORMAÇÕES BÁSICAS",
            "## FORMAÇÃO ACADÊMICA",
            "## EXPERIÊNCIA PROFISSIONAL",
            "## COMPETÊNCIAS TÉCNICAS",
            "## COMPETÊNCIAS COMPORTAMENTAIS",
            "## RESPONSABILIDADES NA TECHVISION SOLUTIONS",
        ] {
            assert!(bio.contains(header), "missing header {}", header);
        }
    }

    #[test]
    fn test_pronoun_follows_gender_field() {
        let mut setup = test_setup();
        setup.ceo_genero = Gender::Feminino;
        let config = BiographyGenerator::new(setup.seed).generate_company(&setup);
        assert!(config.ceo.biografia_md.contains("ela desenvolveu"));
        assert!(config.ceo.biografia_md.contains("focada"));

        setup.ceo_genero = Gender::Masculino;
        let config = BiographyGenerator::new(setup.seed).generate_company(&setup);
        assert!(config.ceo.biografia_md.contains("ele desenvolveu"));
        assert!(config.ceo.biografia_md.contains("focado"));
    }

    #[test]
    fn test_language_pool_merges_without_duplicates() {
        let pool = language_pool(Nationality::Latinos, &["alemão".to_string()]);
        // base has espanhol/português/inglês/francês; regional repeats them
        let unique: std::collections::HashSet<_> = pool.iter().collect();
        assert_eq!(unique.len(), pool.len());
        assert!(pool.contains(&"alemão".to_string()));
        assert_eq!(pool[0], "inglês");
    }
}
