//! Demographic name pools and the per-company name uniqueness registry.
//!
//! The registry tracks full names and (first, last, nationality) triples for
//! one generation run. Allocation never fails: after the retry budget is
//! exhausted it degrades to suffixed and finally timestamp-tagged names that
//! are near-certainly unique rather than guaranteed unique.

use std::collections::HashSet;

use rand::Rng;

use super::types::{Gender, Nationality};

// ─────────────────────────────────────────────────────────────────
// Pools
// ─────────────────────────────────────────────────────────────────

impl Nationality {
    /// Countries of origin for this bucket.
    pub fn paises(&self) -> &'static [&'static str] {
        match self {
            Nationality::Europeus => &[
                "França", "Alemanha", "Itália", "Espanha", "Reino Unido", "Holanda", "Suécia",
            ],
            Nationality::Latinos => &[
                "Brasil", "México", "Argentina", "Colômbia", "Chile", "Peru", "Venezuela",
            ],
            Nationality::Asiaticos => &[
                "Japão", "Coreia do Sul", "China", "Singapura", "Taiwan", "Hong Kong", "Tailândia",
            ],
            Nationality::OrienteMedio => &[
                "Emirados Árabes Unidos", "Israel", "Turquia", "Líbano", "Jordânia", "Qatar",
            ],
            Nationality::Balcas => &[
                "Sérvia", "Croácia", "Bósnia", "Montenegro", "Eslovênia", "Macedônia",
            ],
            Nationality::Nordicos => &[
                "Suécia", "Noruega", "Dinamarca", "Finlândia", "Islândia",
            ],
        }
    }

    /// First-name pool for the given gender.
    pub fn primeiros_nomes(&self, genero: Gender) -> &'static [&'static str] {
        match (self, genero) {
            (Nationality::Europeus, Gender::Masculino) => &[
                "Pierre", "Hans", "Marco", "Carlos", "James", "Erik", "Anders",
            ],
            (Nationality::Europeus, Gender::Feminino) => &[
                "Marie", "Greta", "Sofia", "Carmen", "Emma", "Anna", "Astrid",
            ],
            (Nationality::Latinos, Gender::Masculino) => &[
                "João", "Diego", "Mateo", "Carlos", "Sebastián", "Luis", "Rafael",
            ],
            (Nationality::Latinos, Gender::Feminino) => &[
                "Ana", "Sofia", "Isabella", "Camila", "Valentina", "Lucia", "Carmen",
            ],
            (Nationality::Asiaticos, Gender::Masculino) => &[
                "Hiroshi", "Min-jun", "Wei", "Kai", "Chen", "Akira", "Somchai",
            ],
            (Nationality::Asiaticos, Gender::Feminino) => &[
                "Yuki", "So-young", "Li", "Mei", "Lin", "Sakura", "Ploy",
            ],
            (Nationality::OrienteMedio, Gender::Masculino) => &[
                "Ahmed", "David", "Mehmet", "Omar", "Khalil", "Rashid",
            ],
            (Nationality::OrienteMedio, Gender::Feminino) => &[
                "Fatima", "Sarah", "Ayşe", "Layla", "Noor", "Zara",
            ],
            (Nationality::Balcas, Gender::Masculino) => &[
                "Miloš", "Marko", "Stefan", "Aleksandar", "Nikola", "Luka",
            ],
            (Nationality::Balcas, Gender::Feminino) => &[
                "Ana", "Milica", "Jovana", "Marija", "Teodora", "Nevena",
            ],
            (Nationality::Nordicos, Gender::Masculino) => &[
                "Erik", "Lars", "Magnus", "Bjørn", "Olaf", "Gunnar",
            ],
            (Nationality::Nordicos, Gender::Feminino) => &[
                "Astrid", "Ingrid", "Sigrid", "Helga", "Freya", "Solveig",
            ],
        }
    }

    /// Surname pool.
    pub fn sobrenomes(&self) -> &'static [&'static str] {
        match self {
            Nationality::Europeus => &[
                "Dubois", "Schmidt", "Rossi", "Garcia", "Smith", "Van Der Berg", "Andersson",
            ],
            Nationality::Latinos => &[
                "Silva", "Rodriguez", "Gonzalez", "Martinez", "Lopez", "Perez", "Sanchez",
            ],
            Nationality::Asiaticos => &[
                "Tanaka", "Kim", "Wang", "Lee", "Chen", "Yamamoto", "Sato",
            ],
            Nationality::OrienteMedio => &[
                "Al-Rashid", "Cohen", "Özkan", "Khoury", "Al-Zahra", "Al-Maktoum",
            ],
            Nationality::Balcas => &[
                "Petrović", "Nikolić", "Marković", "Đorđević", "Stojanović", "Ilić",
            ],
            Nationality::Nordicos => &[
                "Andersson", "Hansen", "Nielsen", "Virtanen", "Eriksson", "Olsen",
            ],
        }
    }

    /// Regional language pool, merged with the base pool at generation time.
    pub fn idiomas_regionais(&self) -> &'static [&'static str] {
        match self {
            Nationality::Europeus => &["inglês", "francês", "alemão", "italiano", "espanhol"],
            Nationality::Latinos => &["espanhol", "português", "inglês", "francês"],
            Nationality::Asiaticos => &["inglês", "japonês", "coreano", "chinês", "tailandês"],
            Nationality::OrienteMedio => &["inglês", "árabe", "hebraico", "turco"],
            Nationality::Balcas => &["inglês", "sérvio", "croata", "bósnio", "esloveno"],
            Nationality::Nordicos => &[
                "inglês", "sueco", "norueguês", "dinamarquês", "finlandês",
            ],
        }
    }
}

/// Languages every company offers regardless of region.
pub const IDIOMAS_BASE: &[&str] = &["inglês", "espanhol", "português", "francês"];

// ─────────────────────────────────────────────────────────────────
// Name Registry
// ─────────────────────────────────────────────────────────────────

/// Retry budget before the suffix fallback kicks in.
const MAX_ATTEMPTS: usize = 50;

/// Suffix budget before the timestamp fallback kicks in.
const MAX_SUFFIXES: usize = 100;

/// A name allocated from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedName {
    pub primeiro_nome: String,
    pub sobrenome: String,
    pub nome_completo: String,
}

/// Tracks names already handed out during one company-generation run.
///
/// Scoped to a single [`super::BiographyGenerator`]; generating two companies
/// concurrently cannot cross-contaminate pools because each generator owns
/// its registry.
#[derive(Debug, Default)]
pub struct NameRegistry {
    used_full_names: HashSet<String>,
    used_triples: HashSet<(String, String, Nationality)>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of full names handed out so far.
    pub fn len(&self) -> usize {
        self.used_full_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used_full_names.is_empty()
    }

    /// Clear all tracked names, for the start of a new company run.
    pub fn reset(&mut self) {
        self.used_full_names.clear();
        self.used_triples.clear();
    }

    /// Allocate a name unique within this registry.
    ///
    /// Tiers: uniform sampling with up to 50 retries, then alphabetic
    /// suffixes on the pools' first entries, then the low-order digits of
    /// the current timestamp. The last tier is near-certainly unique but
    /// not formally collision-free; none of the tiers fail.
    pub fn allocate<R: Rng>(
        &mut self,
        rng: &mut R,
        genero: Gender,
        nacionalidade: Nationality,
    ) -> AllocatedName {
        let primeiros = nacionalidade.primeiros_nomes(genero);
        let sobrenomes = nacionalidade.sobrenomes();

        for _ in 0..MAX_ATTEMPTS {
            let primeiro = primeiros[rng.random_range(0..primeiros.len())];
            let sobrenome = sobrenomes[rng.random_range(0..sobrenomes.len())];
            let completo = format!("{} {}", primeiro, sobrenome);
            let triple = (primeiro.to_string(), sobrenome.to_string(), nacionalidade);

            if !self.used_full_names.contains(&completo) && !self.used_triples.contains(&triple) {
                self.used_full_names.insert(completo.clone());
                self.used_triples.insert(triple);
                return AllocatedName {
                    primeiro_nome: primeiro.to_string(),
                    sobrenome: sobrenome.to_string(),
                    nome_completo: completo,
                };
            }
        }

        // Pools exhausted: suffix the first pool entries alphabetically.
        let primeiro = primeiros[0];
        let sobrenome_base = sobrenomes[0];
        for i in 0..MAX_SUFFIXES {
            let sobrenome = format!("{} {}", sobrenome_base, alpha_suffix(i));
            let completo = format!("{} {}", primeiro, sobrenome);
            if !self.used_full_names.contains(&completo) {
                self.used_full_names.insert(completo.clone());
                self.used_triples.insert((
                    primeiro.to_string(),
                    sobrenome.clone(),
                    nacionalidade,
                ));
                return AllocatedName {
                    primeiro_nome: primeiro.to_string(),
                    sobrenome,
                    nome_completo: completo,
                };
            }
        }

        // Last resort: tag with the low-order digits of the clock.
        let stamp = chrono::Utc::now().timestamp_millis() % 1000;
        let sobrenome = format!("{}{:03}", sobrenome_base, stamp);
        let completo = format!("{} {}", primeiro, sobrenome);
        self.used_full_names.insert(completo.clone());
        AllocatedName {
            primeiro_nome: primeiro.to_string(),
            sobrenome,
            nome_completo: completo,
        }
    }
}

/// Alphabetic suffix sequence: A..Z, AA..AZ, BA..BZ, ...
fn alpha_suffix(i: usize) -> String {
    if i < 26 {
        ((b'A' + i as u8) as char).to_string()
    } else {
        let first = (b'A' + (i / 26 - 1) as u8) as char;
        let second = (b'A' + (i % 26) as u8) as char;
        format!("{}{}", first, second)
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pools_are_nonempty() {
        for nat in Nationality::all() {
            assert!(!nat.paises().is_empty());
            assert!(!nat.sobrenomes().is_empty());
            assert!(!nat.idiomas_regionais().is_empty());
            assert!(!nat.primeiros_nomes(Gender::Masculino).is_empty());
            assert!(!nat.primeiros_nomes(Gender::Feminino).is_empty());
        }
    }

    #[test]
    fn test_allocations_are_pairwise_distinct() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut registry = NameRegistry::new();
        let mut seen = std::collections::HashSet::new();

        // 49 = full combinatorial capacity of one gendered latinos pool;
        // go past it so the suffix tier is exercised too.
        for _ in 0..80 {
            let name = registry.allocate(&mut rng, Gender::Masculino, Nationality::Latinos);
            assert!(
                seen.insert(name.nome_completo.clone()),
                "duplicate name: {}",
                name.nome_completo
            );
        }
        assert_eq!(registry.len(), 80);
    }

    #[test]
    fn test_triples_are_unique_across_genders() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut registry = NameRegistry::new();
        let mut triples = std::collections::HashSet::new();

        for _ in 0..20 {
            let m = registry.allocate(&mut rng, Gender::Masculino, Nationality::Europeus);
            let f = registry.allocate(&mut rng, Gender::Feminino, Nationality::Europeus);
            assert!(triples.insert((m.primeiro_nome, m.sobrenome)));
            assert!(triples.insert((f.primeiro_nome, f.sobrenome)));
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut registry = NameRegistry::new();
        registry.allocate(&mut rng, Gender::Feminino, Nationality::Nordicos);
        assert_eq!(registry.len(), 1);

        registry.reset();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_suffix_fallback_stays_alphabetic() {
        assert_eq!(alpha_suffix(0), "A");
        assert_eq!(alpha_suffix(25), "Z");
        assert_eq!(alpha_suffix(26), "AA");
        assert_eq!(alpha_suffix(27), "AB");
        assert_eq!(alpha_suffix(52), "BA");
    }

    #[test]
    fn test_allocation_never_fails_past_all_tiers() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut registry = NameRegistry::new();

        // oriente_medio has 6x6 = 36 combinations per gender; allocating far
        // past capacity must still return names.
        for _ in 0..140 {
            let name = registry.allocate(&mut rng, Gender::Feminino, Nationality::OrienteMedio);
            assert!(!name.nome_completo.is_empty());
        }
    }
}
