//! Repository pour la persistance des validations

use crate::error::{Result, StorageError};
use chrono::{DateTime, SecondsFormat, Utc};
use promoter_core::{Fingerprint, MotifMatch, Prediction, ValidationRecord};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Modèle de validation pour la base de données
#[derive(Debug, FromRow)]
pub struct DbValidation {
    pub id: String,
    pub subject_id: String,
    pub analyst_id: String,
    pub sequence: String,
    pub sequence_fingerprint: String,
    pub prediction: String,
    pub probability: f64,
    pub model_version_hash: String,
    pub motifs: String,      // JSON
    pub record_fingerprint: String,
    pub ledger_tx: Option<String>,
    pub created_at: String,  // Stocké comme ISO 8601 string
}

impl TryFrom<DbValidation> for ValidationRecord {
    type Error = StorageError;

    fn try_from(row: DbValidation) -> Result<Self> {
        let motifs: Vec<MotifMatch> = serde_json::from_str(&row.motifs)?;
        let prediction = row
            .prediction
            .parse::<Prediction>()
            .map_err(StorageError::DatabaseError)?;

        Ok(ValidationRecord {
            id: Uuid::parse_str(&row.id)?,
            sequence_fingerprint: Fingerprint::from_hex(row.sequence_fingerprint),
            sequence: row.sequence,
            prediction,
            probability: row.probability,
            model_version_hash: row.model_version_hash,
            motifs,
            subject_id: row.subject_id,
            analyst_id: row.analyst_id,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)?.with_timezone(&Utc),
            record_fingerprint: Fingerprint::from_hex(row.record_fingerprint),
            ledger_tx: row.ledger_tx,
        })
    }
}

const SELECT_VALIDATION: &str = "SELECT id, subject_id, analyst_id, sequence, sequence_fingerprint, \
     prediction, probability, model_version_hash, motifs, record_fingerprint, ledger_tx, created_at \
     FROM validation_records";

/// Repository pour les opérations sur les validations
#[derive(Debug, Clone)]
pub struct ValidationRepository {
    pool: SqlitePool,
}

impl ValidationRepository {
    /// Crée un nouveau repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Sauvegarde une validation.
    ///
    /// Seule la transaction du registre peut changer pour un ID déjà présent.
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn save_record(&self, record: &ValidationRecord) -> Result<()> {
        let motifs_json = serde_json::to_string(&record.motifs)?;

        sqlx::query(
            "INSERT INTO validation_records
             (id, subject_id, analyst_id, sequence, sequence_fingerprint, prediction, probability,
              model_version_hash, motifs, record_fingerprint, ledger_tx, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET ledger_tx = excluded.ledger_tx",
        )
        .bind(record.id.to_string())
        .bind(&record.subject_id)
        .bind(&record.analyst_id)
        .bind(&record.sequence)
        .bind(record.sequence_fingerprint.as_str())
        .bind(record.prediction.as_str())
        .bind(record.probability)
        .bind(&record.model_version_hash)
        .bind(motifs_json)
        .bind(record.record_fingerprint.as_str())
        .bind(&record.ledger_tx)
        .bind(record.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true))
        .execute(&self.pool)
        .await?;

        debug!("Validation {} sauvegardée", record.id);
        Ok(())
    }

    /// Récupère une validation par ID
    #[instrument(skip(self))]
    pub async fn get_record(&self, id: Uuid) -> Result<ValidationRecord> {
        let row = sqlx::query_as::<_, DbValidation>(&format!("{SELECT_VALIDATION} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => ValidationRecord::try_from(row),
            None => Err(StorageError::RecordNotFound(id.to_string())),
        }
    }

    /// Historique d'un sujet, par created_at croissant
    #[instrument(skip(self))]
    pub async fn history_for(&self, subject_id: &str) -> Result<Vec<ValidationRecord>> {
        let rows = sqlx::query_as::<_, DbValidation>(&format!(
            "{SELECT_VALIDATION} WHERE subject_id = ? ORDER BY created_at, rowid"
        ))
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ValidationRecord::try_from).collect()
    }

    /// Toutes les validations, par created_at croissant
    #[instrument(skip(self))]
    pub async fn all_records(&self) -> Result<Vec<ValidationRecord>> {
        let rows = sqlx::query_as::<_, DbValidation>(&format!("{SELECT_VALIDATION} ORDER BY created_at, rowid"))
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .into_iter()
            .map(ValidationRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        info!("{} validations chargées", records.len());
        Ok(records)
    }

    /// Compte le nombre total de validations
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM validation_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use crate::test_support::record;
    use chrono::Duration;

    async fn repository() -> (DatabaseManager, ValidationRepository) {
        let db = DatabaseManager::in_memory().await.unwrap();
        let repo = ValidationRepository::new(db.pool().unwrap().clone());
        (db, repo)
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let (_db, repo) = repository().await;
        let r = record("P1", "TATAAAATCGATCGATCG", 0);

        repo.save_record(&r).await.unwrap();
        let loaded = repo.get_record(r.id).await.unwrap();

        assert_eq!(loaded, r);
        assert!(loaded.verify_fingerprint().unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_record() {
        let (_db, repo) = repository().await;
        let err = repo.get_record(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_updates_only_ledger_tx() {
        let (_db, repo) = repository().await;
        let r = record("P1", "TATAAAATCGATCGATCG", 0);
        repo.save_record(&r).await.unwrap();

        let logged = r.with_ledger_tx("0x1234567890abcdef");
        repo.save_record(&logged).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let loaded = repo.get_record(r.id).await.unwrap();
        assert_eq!(loaded.ledger_tx.as_deref(), Some("0x1234567890abcdef"));
        assert_eq!(loaded.record_fingerprint, r.record_fingerprint);
    }

    #[tokio::test]
    async fn test_history_order() {
        let (_db, repo) = repository().await;
        let late = record("P1", "TATAAAATCGATCGATCG", 0);
        let mut early = record("P1", "CAATCAATCAATCAAT", 0);
        early.created_at = late.created_at - Duration::milliseconds(5);

        repo.save_record(&late).await.unwrap();
        repo.save_record(&record("P2", "GGGCGGGGGCGG", 0)).await.unwrap();
        repo.save_record(&early).await.unwrap();

        let history = repo.history_for("P1").await.unwrap();
        let ids: Vec<Uuid> = history.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        assert!(repo.history_for("P9").await.unwrap().is_empty());
        assert_eq!(repo.all_records().await.unwrap().len(), 3);
    }
}
