//! Séquences nucléotidiques normalisées et leur validation

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alphabet accepté après normalisation
pub const ALPHABET: [char; 4] = ['A', 'T', 'C', 'G'];

/// Longueur minimale par défaut d'une séquence soumise
pub const DEFAULT_MIN_LENGTH: usize = 10;

/// Retourne true si le caractère (déjà en majuscule) est un nucléotide accepté
pub fn is_nucleotide(c: char) -> bool {
    matches!(c, 'A' | 'T' | 'C' | 'G')
}

/// Séquence ADN validée: non vide, majuscule, sur {A, T, C, G}.
///
/// Seul [`SequenceValidator`] peut en construire une.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sequence(String);

impl Sequence {
    /// Retourne la séquence normalisée
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Retourne la longueur en nucléotides
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Toujours faux pour une séquence validée
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ratio GC (0-1)
    pub fn gc_ratio(&self) -> f64 {
        let gc = self.0.bytes().filter(|b| matches!(b, b'G' | b'C')).count();
        gc as f64 / self.0.len() as f64
    }

    /// Consomme la séquence et retourne la chaîne sous-jacente
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sequence {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Règles structurelles configurables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceRules {
    /// Longueur minimale en nucléotides
    pub min_length: usize,
}

impl Default for SequenceRules {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

/// Validateur de séquences brutes
#[derive(Debug, Clone, Default)]
pub struct SequenceValidator {
    rules: SequenceRules,
}

impl SequenceValidator {
    /// Crée un validateur avec les règles par défaut
    pub fn new() -> Self {
        Self::default()
    }

    /// Crée un validateur avec des règles personnalisées
    pub fn with_rules(rules: SequenceRules) -> Self {
        Self { rules }
    }

    /// Retourne les règles actuelles
    pub fn rules(&self) -> &SequenceRules {
        &self.rules
    }

    /// Normalise puis valide une entrée brute.
    ///
    /// Toutes les règles violées sont rapportées ensemble. Les espaces ne
    /// sont jamais retirés: ce sont des caractères invalides.
    pub fn validate(&self, raw: &str) -> Result<Sequence, Vec<ValidationError>> {
        let normalized = raw.to_ascii_uppercase();
        let mut errors = Vec::new();

        let offending: Vec<(usize, char)> = normalized
            .chars()
            .enumerate()
            .filter(|(_, c)| !is_nucleotide(*c))
            .collect();

        // Une entrée vide ne correspond pas non plus à l'alphabet
        if normalized.is_empty() || !offending.is_empty() {
            errors.push(ValidationError::InvalidAlphabet { offending });
        }

        let len = normalized.chars().count();
        if len < self.rules.min_length {
            errors.push(ValidationError::TooShort {
                len,
                min: self.rules.min_length,
            });
        }

        if errors.is_empty() {
            Ok(Sequence(normalized))
        } else {
            Err(errors)
        }
    }
}

/// Valide une entrée brute avec les règles par défaut
pub fn validate(raw: &str) -> Result<Sequence, Vec<ValidationError>> {
    SequenceValidator::new().validate(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_sequence_is_uppercased() {
        let seq = validate("tataaaatcgatcgatcg").unwrap();
        assert_eq!(seq.as_str(), "TATAAAATCGATCGATCG");
        assert_eq!(seq.len(), 18);
    }

    #[test]
    fn test_too_short() {
        let errors = validate("ATCG").unwrap_err();
        assert_eq!(errors, vec![ValidationError::TooShort { len: 4, min: 10 }]);
    }

    #[test]
    fn test_invalid_characters_reported_with_positions() {
        let errors = validate("ATXG ATCG").unwrap_err();
        match &errors[0] {
            ValidationError::InvalidAlphabet { offending } => {
                assert_eq!(offending, &vec![(2, 'X'), (4, ' ')]);
            }
            other => panic!("erreur inattendue: {other:?}"),
        }
        // 9 caractères: la longueur échoue aussi
        assert!(errors.iter().any(|e| matches!(e, ValidationError::TooShort { len: 9, .. })));
    }

    #[test]
    fn test_empty_fails_both_rules() {
        let errors = validate("").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], ValidationError::InvalidAlphabet { offending } if offending.is_empty()));
        assert!(matches!(errors[1], ValidationError::TooShort { len: 0, min: 10 }));
    }

    #[test]
    fn test_whitespace_is_not_stripped() {
        let errors = validate("  ATCGATCGATCG  ").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::InvalidAlphabet { offending } if offending.len() == 4));
    }

    #[test]
    fn test_custom_min_length() {
        let validator = SequenceValidator::with_rules(SequenceRules { min_length: 4 });
        assert!(validator.validate("ATCG").is_ok());
        assert!(validator.validate("ATC").is_err());
    }

    #[test]
    fn test_gc_ratio() {
        let seq = validate("GGGGCCCCAT").unwrap();
        assert!((seq.gc_ratio() - 0.8).abs() < 1e-9);
    }
}
