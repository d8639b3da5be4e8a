//! Core types for the persona model.
//!
//! Personas carry the demographic and career facts that every downstream
//! pipeline stage derives from. Field names follow the JSON artifact schema.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Category
// ─────────────────────────────────────────────────────────────────

/// The three persona categories of a generated company.
///
/// The CEO is a special executive and lives under `executivos` on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Leadership — strategy, decisions, business development.
    Executivos,
    /// Executive support — agendas, coordination, documentation.
    Assistentes,
    /// Domain specialists — one per specialty.
    Especialistas,
}

impl Category {
    /// Slug used in directory names and artifact keys.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Executivos => "executivos",
            Category::Assistentes => "assistentes",
            Category::Especialistas => "especialistas",
        }
    }

    /// All categories in generation order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Executivos,
            Category::Assistentes,
            Category::Especialistas,
        ]
    }

    /// Inclusive age range sampled for this category (the CEO uses 35-50).
    pub fn age_range(&self) -> (u32, u32) {
        match self {
            Category::Executivos => (30, 45),
            Category::Assistentes => (25, 35),
            Category::Especialistas => (28, 40),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Category {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "executivos" => Ok(Category::Executivos),
            "assistentes" => Ok(Category::Assistentes),
            "especialistas" => Ok(Category::Especialistas),
            _ => Err(crate::error::Error::UnknownCategory(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Specialty
// ─────────────────────────────────────────────────────────────────

/// The six specialist domains a company can staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Hr,
    Youtube,
    MidiasSociais,
    Marketing,
    Financeiro,
    Tecnologia,
}

impl Specialty {
    /// Slug used in artifact keys and CLI arguments.
    pub fn slug(&self) -> &'static str {
        match self {
            Specialty::Hr => "hr",
            Specialty::Youtube => "youtube",
            Specialty::MidiasSociais => "midias_sociais",
            Specialty::Marketing => "marketing",
            Specialty::Financeiro => "financeiro",
            Specialty::Tecnologia => "tecnologia",
        }
    }

    /// Human-readable specialization title.
    pub fn display_name(&self) -> &'static str {
        match self {
            Specialty::Hr => "Recursos Humanos e Gestão de Talentos",
            Specialty::Youtube => "Criação de Conteúdo e YouTube Marketing",
            Specialty::MidiasSociais => "Marketing Digital e Mídias Sociais",
            Specialty::Marketing => "Marketing Estratégico e Growth Hacking",
            Specialty::Financeiro => "Análise Financeira e Controladoria",
            Specialty::Tecnologia => "Desenvolvimento de Sistemas e DevOps",
        }
    }

    /// Canned education line for the specialist biography.
    pub fn educacao(&self) -> &'static str {
        match self {
            Specialty::Hr => "Bacharelado em Psicologia Organizacional e MBA em Gestão de Pessoas",
            Specialty::Youtube => {
                "Bacharelado em Comunicação Social com especialização em Marketing Digital"
            }
            Specialty::MidiasSociais => {
                "Bacharelado em Marketing Digital e Certificação Google Analytics"
            }
            Specialty::Marketing => "Bacharelado em Marketing e MBA em Growth Marketing",
            Specialty::Financeiro => "Bacharelado em Ciências Contábeis e CFA Charter",
            Specialty::Tecnologia => "Bacharelado em Ciência da Computação e Certificações AWS",
        }
    }

    /// All specialties in canonical order.
    pub fn all() -> &'static [Specialty] {
        &[
            Specialty::Hr,
            Specialty::Youtube,
            Specialty::MidiasSociais,
            Specialty::Marketing,
            Specialty::Financeiro,
            Specialty::Tecnologia,
        ]
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Specialty {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hr" => Ok(Specialty::Hr),
            "youtube" => Ok(Specialty::Youtube),
            "midias_sociais" | "midias-sociais" => Ok(Specialty::MidiasSociais),
            "marketing" => Ok(Specialty::Marketing),
            "financeiro" => Ok(Specialty::Financeiro),
            "tecnologia" => Ok(Specialty::Tecnologia),
            _ => Err(crate::error::Error::UnknownSpecialty(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Gender
// ─────────────────────────────────────────────────────────────────

/// Persona gender, drives name pool selection and biography pronouns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Masculino,
    Feminino,
}

impl Gender {
    pub fn slug(&self) -> &'static str {
        match self {
            Gender::Masculino => "masculino",
            Gender::Feminino => "feminino",
        }
    }

    /// Subject pronoun used in rendered biographies.
    pub fn pronome(&self) -> &'static str {
        match self {
            Gender::Masculino => "ele",
            Gender::Feminino => "ela",
        }
    }

    /// Gendered suffix for "focado(a)"-style adjectives.
    pub fn sufixo(&self) -> &'static str {
        match self {
            Gender::Masculino => "o",
            Gender::Feminino => "a",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Gender {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "masculino" | "m" => Ok(Gender::Masculino),
            "feminino" | "f" => Ok(Gender::Feminino),
            _ => Err(crate::error::Error::UnknownGender(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Nationality
// ─────────────────────────────────────────────────────────────────

/// The six demographic region buckets. Name, country and language pools
/// hang off this enum in `names.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nationality {
    Europeus,
    Latinos,
    Asiaticos,
    OrienteMedio,
    Balcas,
    Nordicos,
}

impl Nationality {
    pub fn slug(&self) -> &'static str {
        match self {
            Nationality::Europeus => "europeus",
            Nationality::Latinos => "latinos",
            Nationality::Asiaticos => "asiaticos",
            Nationality::OrienteMedio => "oriente_medio",
            Nationality::Balcas => "balcas",
            Nationality::Nordicos => "nordicos",
        }
    }

    pub fn all() -> &'static [Nationality] {
        &[
            Nationality::Europeus,
            Nationality::Latinos,
            Nationality::Asiaticos,
            Nationality::OrienteMedio,
            Nationality::Balcas,
            Nationality::Nordicos,
        ]
    }
}

impl fmt::Display for Nationality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Nationality {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "europeus" => Ok(Nationality::Europeus),
            "latinos" => Ok(Nationality::Latinos),
            "asiaticos" => Ok(Nationality::Asiaticos),
            "oriente_medio" | "oriente-medio" => Ok(Nationality::OrienteMedio),
            "balcas" => Ok(Nationality::Balcas),
            "nordicos" => Ok(Nationality::Nordicos),
            _ => Err(crate::error::Error::UnknownNationality(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Record
// ─────────────────────────────────────────────────────────────────

/// Identity, demographics and career facts for one synthetic employee.
///
/// Created once per generation run and immutable thereafter; reruns of the
/// derivation stages never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaRecord {
    /// Full name, unique within one company-generation run.
    pub nome_completo: String,
    pub primeiro_nome: String,
    pub sobrenome: String,

    /// Age within the category's range.
    pub idade: u32,
    pub genero: Gender,

    /// Country sampled from the nationality bucket.
    pub pais_origem: String,
    pub nacionalidade: Nationality,

    /// Role title, e.g. "CEO" or "Especialista Análise Financeira e Controladoria".
    pub role: String,
    pub categoria: Category,

    /// Specialization text shown in the biography.
    pub especializacao: String,
    pub educacao: String,

    /// Derived as max(idade - 22, 3).
    pub anos_experiencia: u32,

    /// 3-6 languages sampled from base + regional + extra pools.
    pub idiomas: Vec<String>,

    /// Rendered markdown biography.
    pub biografia_md: String,

    /// Only set for specialists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidade: Option<Specialty>,

    #[serde(default)]
    pub is_ceo: bool,
}

impl PersonaRecord {
    /// Directory-safe name: strips punctuation, joins words with `_`.
    pub fn folder_name(&self) -> String {
        sanitize_name(&self.nome_completo)
    }

    /// Biography file name inside the persona directory.
    pub fn bio_file_name(&self) -> String {
        format!("{}_bio.md", self.folder_name())
    }
}

/// Strip non-alphanumeric characters and collapse whitespace into `_`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

// ─────────────────────────────────────────────────────────────────
// Personas Config
// ─────────────────────────────────────────────────────────────────

/// Company identity carried into biographies and artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub codigo: String,
    pub nome: String,
    pub industria: String,
}

/// The full persona roster of one generated company, as persisted in
/// `personas_config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonasConfig {
    pub empresa: CompanyProfile,
    pub ceo: PersonaRecord,
    pub executivos: BTreeMap<String, PersonaRecord>,
    pub assistentes: BTreeMap<String, PersonaRecord>,
    pub especialistas: BTreeMap<String, PersonaRecord>,
}

impl PersonasConfig {
    /// All personas, CEO first, in stable key order per category.
    pub fn all_personas(&self) -> Vec<&PersonaRecord> {
        let mut out = vec![&self.ceo];
        out.extend(self.executivos.values());
        out.extend(self.assistentes.values());
        out.extend(self.especialistas.values());
        out
    }

    /// Total headcount including the CEO.
    pub fn total(&self) -> usize {
        1 + self.executivos.len() + self.assistentes.len() + self.especialistas.len()
    }

    /// Find a persona by its on-disk folder name.
    pub fn find_by_folder(&self, folder: &str) -> Option<&PersonaRecord> {
        self.all_personas()
            .into_iter()
            .find(|p| p.folder_name() == folder)
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_slug_roundtrip() {
        for cat in Category::all() {
            assert_eq!(cat.slug().parse::<Category>().unwrap(), *cat);
        }
        assert!("gerentes".parse::<Category>().is_err());
    }

    #[test]
    fn test_specialty_slug_roundtrip() {
        for spec in Specialty::all() {
            assert_eq!(spec.slug().parse::<Specialty>().unwrap(), *spec);
        }
        assert!("dados".parse::<Specialty>().is_err());
    }

    #[test]
    fn test_nationality_slug_roundtrip() {
        for nat in Nationality::all() {
            assert_eq!(nat.slug().parse::<Nationality>().unwrap(), *nat);
        }
        assert!("atlantida".parse::<Nationality>().is_err());
    }

    #[test]
    fn test_serde_uses_slugs() {
        let json = serde_json::to_string(&Specialty::MidiasSociais).unwrap();
        assert_eq!(json, "\"midias_sociais\"");
        let json = serde_json::to_string(&Nationality::OrienteMedio).unwrap();
        assert_eq!(json, "\"oriente_medio\"");
        let json = serde_json::to_string(&Gender::Feminino).unwrap();
        assert_eq!(json, "\"feminino\"");
    }

    #[test]
    fn test_age_ranges() {
        assert_eq!(Category::Executivos.age_range(), (30, 45));
        assert_eq!(Category::Assistentes.age_range(), (25, 35));
        assert_eq!(Category::Especialistas.age_range(), (28, 40));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Ana Sofia Silva"), "Ana_Sofia_Silva");
        assert_eq!(sanitize_name("Van Der Berg"), "Van_Der_Berg");
        // Punctuation is stripped, not replaced
        assert_eq!(sanitize_name("Al-Rashid"), "AlRashid");
    }

    #[test]
    fn test_gender_pronouns() {
        assert_eq!(Gender::Masculino.pronome(), "ele");
        assert_eq!(Gender::Feminino.pronome(), "ela");
    }
}
