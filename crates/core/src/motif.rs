//! Catalogue de motifs régulateurs et recherche dans une séquence

use crate::error::CatalogError;
use crate::sequence::{is_nucleotide, Sequence};
use serde::{Deserialize, Serialize};

/// Motifs promoteurs courants, dans l'ordre de rapport
const PROMOTER_MOTIFS: [(&str, &str); 6] = [
    ("TATA Box", "TATAAA"),
    ("CAAT Box", "CAAT"),
    ("-10 Region", "TATAAT"),
    ("-35 Region", "TTGACA"),
    ("GC Box", "GGGCGG"),
    ("CAP Site", "AAATGTG"),
];

/// Entrée de catalogue: un motif littéral nommé
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMotif")]
pub struct Motif {
    name: String,
    pattern: String,
}

#[derive(Deserialize)]
struct RawMotif {
    name: String,
    pattern: String,
}

impl TryFrom<RawMotif> for Motif {
    type Error = CatalogError;

    fn try_from(raw: RawMotif) -> Result<Self, CatalogError> {
        Motif::new(raw.name, raw.pattern)
    }
}

impl Motif {
    /// Crée un motif; le motif est mis en majuscule et doit rester sur {A, T, C, G}
    pub fn new(name: impl Into<String>, pattern: impl AsRef<str>) -> Result<Self, CatalogError> {
        let name = name.into();
        let pattern = pattern.as_ref().to_ascii_uppercase();

        if pattern.is_empty() {
            return Err(CatalogError::EmptyPattern { name });
        }
        if let Some(base) = pattern.chars().find(|c| !is_nucleotide(*c)) {
            return Err(CatalogError::InvalidPattern { name, base });
        }

        Ok(Self { name, pattern })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// Catalogue ordonné de motifs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotifCatalog {
    motifs: Vec<Motif>,
}

impl MotifCatalog {
    /// Crée un catalogue depuis des motifs déjà validés
    pub fn new(motifs: Vec<Motif>) -> Self {
        Self { motifs }
    }

    /// Crée un catalogue depuis des paires (nom, motif)
    pub fn from_entries<N, P>(entries: impl IntoIterator<Item = (N, P)>) -> Result<Self, CatalogError>
    where
        N: Into<String>,
        P: AsRef<str>,
    {
        let motifs = entries
            .into_iter()
            .map(|(name, pattern)| Motif::new(name, pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { motifs })
    }

    /// Catalogue des motifs promoteurs (TATA, CAAT, -10, -35, GC, CAP)
    pub fn promoter() -> Self {
        let motifs = PROMOTER_MOTIFS
            .iter()
            .map(|(name, pattern)| Motif {
                name: (*name).to_string(),
                pattern: (*pattern).to_string(),
            })
            .collect();
        Self { motifs }
    }

    pub fn motifs(&self) -> &[Motif] {
        &self.motifs
    }

    pub fn len(&self) -> usize {
        self.motifs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motifs.is_empty()
    }
}

impl Default for MotifCatalog {
    fn default() -> Self {
        Self::promoter()
    }
}

/// Résultat de recherche d'un motif du catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotifMatch {
    pub name: String,
    pub pattern: String,
    /// Index de la première occurrence, absent si non trouvé
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub found: bool,
}

impl MotifMatch {
    fn new(motif: &Motif, position: Option<usize>) -> Self {
        Self {
            name: motif.name.clone(),
            pattern: motif.pattern.clone(),
            position,
            found: position.is_some(),
        }
    }
}

/// Recherche chaque motif du catalogue dans la séquence.
///
/// Une entrée par motif, dans l'ordre du catalogue, trouvée ou non. Seule la
/// première occurrence est rapportée; pas de recherche du brin complémentaire.
pub fn scan(sequence: &Sequence, catalog: &MotifCatalog) -> Vec<MotifMatch> {
    // Séquence et motifs sont en ASCII majuscule: index d'octet == index de nucléotide
    catalog
        .motifs()
        .iter()
        .map(|motif| MotifMatch::new(motif, sequence.as_str().find(motif.pattern())))
        .collect()
}

/// Scanner lié à un catalogue
#[derive(Debug, Clone, Default)]
pub struct MotifScanner {
    catalog: MotifCatalog,
}

impl MotifScanner {
    pub fn new(catalog: MotifCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &MotifCatalog {
        &self.catalog
    }

    pub fn scan(&self, sequence: &Sequence) -> Vec<MotifMatch> {
        scan(sequence, &self.catalog)
    }
}
