//! Modèles de données pour l'API web

use crate::config::AppConfig;
use chrono::{DateTime, Utc};
use promoter_core::{extract_sequence, Classifier, ValidationPipeline, ValidationRecord};
use promoter_storage::{AuditArchive, DatabaseManager, LedgerEntry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// État global de l'application
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: ValidationPipeline,
    /// Absent tant qu'aucune commande n'est configurée
    pub classifier: Option<Arc<dyn Classifier>>,
    pub archive: AuditArchive,
    pub database: Option<DatabaseManager>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        classifier: Option<Arc<dyn Classifier>>,
        archive: AuditArchive,
        database: Option<DatabaseManager>,
    ) -> Self {
        Self {
            pipeline: ValidationPipeline::with_config(&config.pipeline),
            config,
            classifier,
            archive,
            database,
        }
    }
}

/// Requête de validation: séquence brute ou texte FASTA
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub sequence: Option<String>,
    pub fasta: Option<String>,
    pub subject_id: Option<String>,
    pub analyst_id: Option<String>,
    #[serde(default)]
    pub log_to_ledger: bool,
}

impl ValidateRequest {
    /// Le FASTA l'emporte sur la séquence brute; ses en-têtes sont ignorés
    pub fn raw_sequence(&self) -> Option<String> {
        match (&self.fasta, &self.sequence) {
            (Some(fasta), _) => Some(extract_sequence(fasta)),
            (None, Some(sequence)) => Some(sequence.clone()),
            (None, None) => None,
        }
    }
}

/// Requête d'inscription au registre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRequest {
    pub subject_id: String,
    pub validation_id: Uuid,
}

/// Réponse d'inscription au registre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogResponse {
    pub status: String,
    pub ledger_tx: String,
    pub height: u64,
    pub validation_id: Uuid,
}

/// Historique d'un sujet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub subject_id: String,
    pub validations: Vec<ValidationRecord>,
    pub total_count: usize,
}

/// Transaction du registre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction: LedgerEntry,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRecord>,
}

/// État de santé du service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub validations: usize,
    pub ledger_height: u64,
    pub classifier_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Réponse d'erreur standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: String, code: u16) -> Self {
        Self {
            error,
            details: Vec::new(),
            code,
        }
    }

    pub fn with_details(error: String, details: Vec<String>, code: u16) -> Self {
        Self { error, details, code }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fasta_takes_precedence() {
        let request = ValidateRequest {
            sequence: Some("ATCG".to_string()),
            fasta: Some(">h1\nTATAAAATCG\nATCGATCG\n".to_string()),
            ..Default::default()
        };
        assert_eq!(request.raw_sequence().as_deref(), Some("TATAAAATCGATCGATCG"));
    }

    #[test]
    fn test_request_defaults() {
        let request: ValidateRequest = serde_json::from_str(r#"{"sequence":"tataaaatcg"}"#).unwrap();
        assert!(!request.log_to_ledger);
        assert!(request.subject_id.is_none());
        assert_eq!(request.raw_sequence().as_deref(), Some("tataaaatcg"));
        assert!(ValidateRequest::default().raw_sequence().is_none());
    }
}
