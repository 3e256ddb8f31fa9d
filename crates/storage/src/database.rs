//! Module de base de données pour l'historique et le registre

use crate::error::{Result, StorageError};
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{info, instrument};

/// Schéma: une table de validations, une table de registre en ajout seul
const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS validation_records (
        id TEXT PRIMARY KEY,
        subject_id TEXT NOT NULL,
        analyst_id TEXT NOT NULL,
        sequence TEXT NOT NULL,
        sequence_fingerprint TEXT NOT NULL,
        prediction TEXT NOT NULL,
        probability REAL NOT NULL,
        model_version_hash TEXT NOT NULL,
        motifs TEXT NOT NULL,
        record_fingerprint TEXT NOT NULL,
        ledger_tx TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_validation_records_subject
        ON validation_records (subject_id, created_at)",
    "CREATE TABLE IF NOT EXISTS ledger_entries (
        height INTEGER PRIMARY KEY,
        tx TEXT NOT NULL UNIQUE,
        record_fingerprint TEXT NOT NULL UNIQUE,
        sequence_fingerprint TEXT NOT NULL,
        model_version_hash TEXT NOT NULL,
        prediction TEXT NOT NULL,
        probability REAL NOT NULL,
        logged_at TEXT NOT NULL
    )",
];

/// Configuration de la base de données
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: "sqlite::memory:".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    fn is_in_memory(&self) -> bool {
        self.connection_string.contains(":memory:")
    }
}

/// Gestionnaire de base de données principal
#[derive(Debug)]
pub struct DatabaseManager {
    config: DatabaseConfig,
    pool: Option<SqlitePool>,
}

impl DatabaseManager {
    /// Crée un nouveau gestionnaire de base de données
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, pool: None }
    }

    /// Base en mémoire prête à l'emploi
    pub async fn in_memory() -> Result<Self> {
        let mut manager = Self::new(DatabaseConfig::default());
        manager.initialize().await?;
        Ok(manager)
    }

    /// Connecte à la base de données
    #[instrument(skip(self), fields(url = %self.config.connection_string))]
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connexion à la base de données SQLite...");

        let options = SqliteConnectOptions::from_str(&self.config.connection_string)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?
            .create_if_missing(true);

        // Une base en mémoire n'existe que pour sa connexion
        let max_connections = if self.config.is_in_memory() {
            1
        } else {
            self.config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        self.pool = Some(pool);
        info!("Connexion établie avec succès");
        Ok(())
    }

    /// Retourne le pool de connexions
    pub fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| StorageError::ConfigError("Base de données non connectée".to_string()))
    }

    /// Initialise la base de données
    #[instrument(skip(self))]
    pub async fn initialize(&mut self) -> Result<()> {
        self.connect().await?;
        self.migrate().await?;
        Ok(())
    }

    /// Crée les tables manquantes
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.pool()?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }

        info!("Schéma initialisé avec succès");
        Ok(())
    }

    /// Vérifie l'état de santé de la base de données
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(self.pool()?).await?;
        Ok(())
    }
}
