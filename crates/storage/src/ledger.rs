//! Registre d'audit en ajout seul
//!
//! Un simple journal append-only de références de validation, sans consensus.
//! Au plus une entrée par empreinte d'enregistrement.

use crate::error::{LedgerError, Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use promoter_core::{fingerprint, Fingerprint, Prediction, ValidationRecord};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument};

/// Entrée du registre, jamais modifiée ni supprimée
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub tx: String,
    pub record_fingerprint: Fingerprint,
    pub sequence_fingerprint: Fingerprint,
    pub model_version_hash: String,
    pub prediction: Prediction,
    pub probability: f64,
    /// Position 1-based de l'entrée dans le journal
    pub height: u64,
    pub logged_at: DateTime<Utc>,
}

impl LedgerEntry {
    fn for_record(record: &ValidationRecord, height: u64) -> Self {
        Self {
            tx: transaction_handle(&record.record_fingerprint),
            record_fingerprint: record.record_fingerprint.clone(),
            sequence_fingerprint: record.sequence_fingerprint.clone(),
            model_version_hash: record.model_version_hash.clone(),
            prediction: record.prediction,
            probability: record.probability,
            height,
            logged_at: Utc::now(),
        }
    }

    /// Vérifie qu'une entrée existante décrit bien le même contenu.
    ///
    /// L'empreinte couvre déjà ces champs: seule une ligne écrite hors de ce
    /// module peut échouer ici.
    fn ensure_matches(&self, record: &ValidationRecord) -> std::result::Result<(), LedgerError> {
        let same = self.sequence_fingerprint == record.sequence_fingerprint
            && self.model_version_hash == record.model_version_hash
            && self.prediction == record.prediction;
        if same {
            Ok(())
        } else {
            Err(LedgerError::DuplicateMismatch {
                tx: self.tx.clone(),
                fingerprint: record.record_fingerprint.to_string(),
            })
        }
    }
}

/// Handle de transaction: `0x` suivi de 16 caractères hexadécimaux
pub fn transaction_handle(record_fingerprint: &Fingerprint) -> String {
    let digest = fingerprint(&format!("ledger:{}", record_fingerprint));
    format!("0x{}", digest.short())
}

/// Refuse un enregistrement dont le contenu ne correspond plus à son empreinte
fn check_integrity(record: &ValidationRecord) -> std::result::Result<(), LedgerError> {
    if record.verify_fingerprint()? {
        Ok(())
    } else {
        Err(LedgerError::FingerprintMismatch {
            record_id: record.id.to_string(),
            fingerprint: record.record_fingerprint.to_string(),
        })
    }
}

/// Journal d'audit des validations
#[async_trait]
pub trait LedgerLogger: Send + Sync {
    /// Ajoute l'enregistrement, ou retourne l'entrée existante pour la même empreinte
    async fn log(&self, record: &ValidationRecord) -> std::result::Result<LedgerEntry, LedgerError>;

    /// Retrouve une entrée par son handle de transaction
    async fn get_by_tx(&self, tx: &str) -> Result<LedgerEntry>;

    /// Nombre d'entrées
    async fn len(&self) -> Result<u64>;
}

#[derive(Debug, Default)]
struct MemoryLog {
    entries: Vec<LedgerEntry>,
    by_fingerprint: HashMap<Fingerprint, usize>,
    by_tx: HashMap<String, usize>,
}

/// Registre en mémoire, un seul écrivain à la fois
#[derive(Debug)]
pub struct MemoryLedger {
    log: Mutex<MemoryLog>,
    available: AtomicBool,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self {
            log: Mutex::new(MemoryLog::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simule une panne (ou un retour) du service de registre
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Copie des entrées, dans l'ordre d'ajout
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.log.lock().entries.clone()
    }
}

#[async_trait]
impl LedgerLogger for MemoryLedger {
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    async fn log(&self, record: &ValidationRecord) -> std::result::Result<LedgerEntry, LedgerError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("registre hors service".to_string()));
        }
        check_integrity(record)?;

        let mut log = self.log.lock();
        if let Some(&index) = log.by_fingerprint.get(&record.record_fingerprint) {
            let existing = log.entries[index].clone();
            existing.ensure_matches(record)?;
            return Ok(existing);
        }

        let entry = LedgerEntry::for_record(record, log.entries.len() as u64 + 1);
        let index = log.entries.len();
        log.by_fingerprint.insert(entry.record_fingerprint.clone(), index);
        log.by_tx.insert(entry.tx.clone(), index);
        log.entries.push(entry.clone());

        info!("Validation {} inscrite au registre: {} (hauteur {})", record.id, entry.tx, entry.height);
        Ok(entry)
    }

    async fn get_by_tx(&self, tx: &str) -> Result<LedgerEntry> {
        let log = self.log.lock();
        log.by_tx
            .get(tx)
            .map(|&index| log.entries[index].clone())
            .ok_or_else(|| StorageError::TransactionNotFound(tx.to_string()))
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.log.lock().entries.len() as u64)
    }
}

/// Ligne de la table ledger_entries
#[derive(Debug, FromRow)]
struct LedgerRow {
    height: i64,
    tx: String,
    record_fingerprint: String,
    sequence_fingerprint: String,
    model_version_hash: String,
    prediction: String,
    probability: f64,
    logged_at: String,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = StorageError;

    fn try_from(row: LedgerRow) -> Result<Self> {
        let prediction = row
            .prediction
            .parse::<Prediction>()
            .map_err(StorageError::DatabaseError)?;
        let logged_at = DateTime::parse_from_rfc3339(&row.logged_at)?.with_timezone(&Utc);

        Ok(LedgerEntry {
            tx: row.tx,
            record_fingerprint: Fingerprint::from_hex(row.record_fingerprint),
            sequence_fingerprint: Fingerprint::from_hex(row.sequence_fingerprint),
            model_version_hash: row.model_version_hash,
            prediction,
            probability: row.probability,
            height: row.height as u64,
            logged_at,
        })
    }
}

const SELECT_ENTRY: &str = "SELECT height, tx, record_fingerprint, sequence_fingerprint, \
     model_version_hash, prediction, probability, logged_at FROM ledger_entries";

/// Registre persistant en SQLite.
///
/// L'unicité de `record_fingerprint` est garantie par la table elle-même;
/// la hauteur suit le nombre d'entrées déjà présentes.
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Le schéma doit déjà exister (voir [`crate::DatabaseManager::initialize`])
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_by_fingerprint(
        conn: &mut SqliteConnection,
        fp: &Fingerprint,
    ) -> std::result::Result<Option<LedgerEntry>, LedgerError> {
        let row = sqlx::query_as::<_, LedgerRow>(&format!("{SELECT_ENTRY} WHERE record_fingerprint = ?"))
            .bind(fp.as_str())
            .fetch_optional(&mut *conn)
            .await?;
        row.map(LedgerEntry::try_from)
            .transpose()
            .map_err(|e| LedgerError::Database(e.to_string()))
    }

    /// Recherche puis ajout, sous le verrou d'écriture déjà pris
    async fn append(
        conn: &mut SqliteConnection,
        record: &ValidationRecord,
    ) -> std::result::Result<(LedgerEntry, bool), LedgerError> {
        if let Some(existing) = Self::find_by_fingerprint(conn, &record.record_fingerprint).await? {
            existing.ensure_matches(record)?;
            return Ok((existing, false));
        }

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ledger_entries")
            .fetch_one(&mut *conn)
            .await?;
        let entry = LedgerEntry::for_record(record, count as u64 + 1);

        sqlx::query(
            "INSERT INTO ledger_entries
             (height, tx, record_fingerprint, sequence_fingerprint, model_version_hash, prediction, probability, logged_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.height as i64)
        .bind(&entry.tx)
        .bind(entry.record_fingerprint.as_str())
        .bind(entry.sequence_fingerprint.as_str())
        .bind(&entry.model_version_hash)
        .bind(entry.prediction.as_str())
        .bind(entry.probability)
        .bind(entry.logged_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        Ok((entry, true))
    }
}

#[async_trait]
impl LedgerLogger for SqliteLedger {
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    async fn log(&self, record: &ValidationRecord) -> std::result::Result<LedgerEntry, LedgerError> {
        check_integrity(record)?;

        // BEGIN IMMEDIATE: un seul écrivain entre la recherche et l'insertion
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = Self::append(&mut conn, record).await;
        let end = if outcome.is_ok() { "COMMIT" } else { "ROLLBACK" };
        sqlx::query(end).execute(&mut *conn).await?;

        let (entry, inserted) = outcome?;
        if inserted {
            info!("Validation {} inscrite au registre: {} (hauteur {})", record.id, entry.tx, entry.height);
        }
        Ok(entry)
    }

    async fn get_by_tx(&self, tx: &str) -> Result<LedgerEntry> {
        let row = sqlx::query_as::<_, LedgerRow>(&format!("{SELECT_ENTRY} WHERE tx = ?"))
            .bind(tx)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => LedgerEntry::try_from(row),
            None => Err(StorageError::TransactionNotFound(tx.to_string())),
        }
    }

    async fn len(&self) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ledger_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use crate::test_support::record;

    #[test]
    fn test_transaction_handle_format() {
        let tx = transaction_handle(&fingerprint("abc"));
        assert_eq!(tx.len(), 18);
        assert!(tx.starts_with("0x"));
        assert!(tx[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_memory_ledger_is_idempotent() {
        let ledger = MemoryLedger::new();
        let r = record("P1", "TATAAAATCGATCGATCG", 0);

        let first = ledger.log(&r).await.unwrap();
        let second = ledger.log(&r).await.unwrap();

        assert_eq!(first.tx, second.tx);
        assert_eq!(first.height, 1);
        assert_eq!(ledger.len().await.unwrap(), 1);
        assert_eq!(ledger.get_by_tx(&first.tx).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_memory_ledger_distinct_records() {
        let ledger = MemoryLedger::new();
        let a = ledger.log(&record("P1", "TATAAAATCGATCGATCG", 0)).await.unwrap();
        let b = ledger.log(&record("P1", "TATAAAATCGATCGATCG", 1)).await.unwrap();

        assert_ne!(a.tx, b.tx);
        assert_eq!(b.height, 2);
    }

    #[tokio::test]
    async fn test_memory_ledger_unknown_tx() {
        let ledger = MemoryLedger::new();
        let err = ledger.get_by_tx("0xdeadbeef").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_tampered_record_is_rejected() {
        let ledger = MemoryLedger::new();
        let mut r = record("P1", "TATAAAATCGATCGATCG", 0);
        r.probability = 0.01;

        let err = ledger.log(&r).await.unwrap_err();
        assert!(matches!(err, LedgerError::FingerprintMismatch { .. }));
        assert_eq!(ledger.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_ledger() {
        let ledger = MemoryLedger::new();
        ledger.set_available(false);

        let err = ledger.log(&record("P1", "TATAAAATCGATCGATCG", 0)).await.unwrap_err();
        assert!(err.is_retryable());

        ledger.set_available(true);
        assert!(ledger.log(&record("P1", "TATAAAATCGATCGATCG", 0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_sqlite_ledger_is_idempotent() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let ledger = SqliteLedger::new(db.pool().unwrap().clone());
        let r = record("P1", "TATAAAATCGATCGATCG", 0);

        let first = ledger.log(&r).await.unwrap();
        let second = ledger.log(&r).await.unwrap();

        assert_eq!(first.tx, second.tx);
        assert_eq!(first.height, 1);
        assert_eq!(ledger.len().await.unwrap(), 1);

        let fetched = ledger.get_by_tx(&first.tx).await.unwrap();
        assert_eq!(fetched.record_fingerprint, r.record_fingerprint);
        assert_eq!(fetched.prediction, r.prediction);
    }

    #[tokio::test]
    async fn test_sqlite_ledger_heights_and_lookup() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let ledger = SqliteLedger::new(db.pool().unwrap().clone());

        ledger.log(&record("P1", "TATAAAATCGATCGATCG", 0)).await.unwrap();
        let second = ledger.log(&record("P2", "GGGCGGGGGCGG", 0)).await.unwrap();

        assert_eq!(second.height, 2);
        assert!(ledger.get_by_tx("0x0000000000000000").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_relogging_does_not_skip_heights() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let sqlite = SqliteLedger::new(db.pool().unwrap().clone());
        let memory = MemoryLedger::new();
        let a = record("P1", "TATAAAATCGATCGATCG", 0);
        let b = record("P2", "GGGCGGGGGCGG", 0);

        for _ in 0..3 {
            assert_eq!(sqlite.log(&a).await.unwrap().height, 1);
            assert_eq!(memory.log(&a).await.unwrap().height, 1);
        }
        let from_sqlite = sqlite.log(&b).await.unwrap();
        let from_memory = memory.log(&b).await.unwrap();

        assert_eq!(from_sqlite.height, 2);
        assert_eq!(from_memory.height, 2);
        assert_eq!(sqlite.len().await.unwrap(), 2);
        assert_eq!(sqlite.get_by_tx(&from_sqlite.tx).await.unwrap().height, 2);
    }

    #[tokio::test]
    async fn test_sqlite_conflicting_row_is_rejected() {
        let db = DatabaseManager::in_memory().await.unwrap();
        let pool = db.pool().unwrap().clone();
        let r = record("P1", "TATAAAATCGATCGATCG", 0);

        // Ligne écrite directement en base, avec un autre modèle
        sqlx::query(
            "INSERT INTO ledger_entries
             (height, tx, record_fingerprint, sequence_fingerprint, model_version_hash, prediction, probability, logged_at)
             VALUES (1, ?, ?, ?, 'model-9999', ?, ?, ?)",
        )
        .bind(transaction_handle(&r.record_fingerprint))
        .bind(r.record_fingerprint.as_str())
        .bind(r.sequence_fingerprint.as_str())
        .bind(r.prediction.as_str())
        .bind(r.probability)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .unwrap();

        let ledger = SqliteLedger::new(pool);
        let err = ledger.log(&r).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateMismatch { .. }));
        assert!(!err.is_retryable());
        assert_eq!(ledger.len().await.unwrap(), 1);

        // La transaction a été annulée: le registre reste utilisable
        let other = ledger.log(&record("P2", "GGGCGGGGGCGG", 0)).await.unwrap();
        assert_eq!(other.height, 2);
    }
}
