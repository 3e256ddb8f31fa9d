//! Gestion des erreurs pour le module de stockage

use thiserror::Error;

/// Échec d'écriture dans le registre
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Registre indisponible: {0}")]
    Unavailable(String),

    #[error("Empreinte incohérente pour l'enregistrement {record_id}: le contenu ne correspond plus à {fingerprint}")]
    FingerprintMismatch { record_id: String, fingerprint: String },

    #[error("Entrée existante {tx} pour l'empreinte {fingerprint} avec un contenu différent")]
    DuplicateMismatch { tx: String, fingerprint: String },

    #[error("Erreur de base de données: {0}")]
    Database(String),

    #[error("Erreur de sérialisation: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Les pannes de transport peuvent être retentées, pas les incohérences
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_) | LedgerError::Database(_))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Database(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Transaction non trouvée: {0}")]
    TransactionNotFound(String),

    #[error("Validation non trouvée: {0}")]
    RecordNotFound(String),

    #[error("Erreur de base de données: {0}")]
    DatabaseError(String),

    #[error("Erreur de configuration: {0}")]
    ConfigError(String),

    #[error("Erreur de sérialisation: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl StorageError {
    /// Vrai pour « pas de tel enregistrement », par opposition à une panne
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::TransactionNotFound(_) | StorageError::RecordNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}

impl From<chrono::ParseError> for StorageError {
    fn from(err: chrono::ParseError) -> Self {
        StorageError::DatabaseError(format!("date invalide: {}", err))
    }
}

impl From<uuid::Error> for StorageError {
    fn from(err: uuid::Error) -> Self {
        StorageError::DatabaseError(format!("UUID invalide: {}", err))
    }
}
