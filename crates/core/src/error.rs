//! Types d'erreurs pour la validation de promoteurs

use crate::pipeline::PipelineStage;
use thiserror::Error;

/// Violation d'une règle structurelle de séquence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Séquence ADN invalide: seuls A, T, C, G sont autorisés ({} caractère(s) rejeté(s))", .offending.len())]
    InvalidAlphabet {
        /// Positions (en caractères) et caractères rejetés
        offending: Vec<(usize, char)>,
    },

    #[error("Séquence trop courte: {len} < {min} nucléotides")]
    TooShort { len: usize, min: usize },
}

/// Entrée de catalogue de motifs invalide
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Motif {name:?}: motif vide")]
    EmptyPattern { name: String },

    #[error("Motif {name:?}: base invalide {base:?} dans le motif")]
    InvalidPattern { name: String, base: char },
}

/// Échec de l'appel au classifieur externe
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifieur injoignable: {0}")]
    Transport(String),

    #[error("Réponse du classifieur malformée: {0}")]
    Malformed(String),

    #[error("Classifieur: délai dépassé après {0:?}")]
    Timeout(std::time::Duration),
}

impl From<std::io::Error> for ClassifierError {
    fn from(err: std::io::Error) -> Self {
        ClassifierError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::Malformed(err.to_string())
    }
}

/// Échec d'une exécution du pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Validation de la séquence échouée: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Classification échouée: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Erreur de sérialisation: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Étape à laquelle l'exécution a échoué
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Validation(_) => PipelineStage::Validating,
            PipelineError::Classifier(_) => PipelineStage::Classifying,
            PipelineError::Serialization(_) => PipelineStage::Fingerprinting,
        }
    }

    /// Seules les erreurs du classifieur justifient un nouvel essai
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::Classifier(_))
    }

    /// Erreurs de validation, si l'échec vient de la séquence
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            PipelineError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_stage() {
        let err = PipelineError::Validation(vec![ValidationError::TooShort { len: 4, min: 10 }]);
        assert_eq!(err.stage(), PipelineStage::Validating);
        assert!(!err.is_retryable());

        let err = PipelineError::from(ClassifierError::Transport("refused".to_string()));
        assert_eq!(err.stage(), PipelineStage::Classifying);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_validation_message_lists_all_errors() {
        let err = PipelineError::Validation(vec![
            ValidationError::InvalidAlphabet { offending: vec![(2, 'X')] },
            ValidationError::TooShort { len: 4, min: 10 },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("1 caractère(s)"));
        assert!(msg.contains("4 < 10"));
    }
}
