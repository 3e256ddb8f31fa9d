//! Archive d'audit: historique en mémoire, registre et persistance optionnelle

use crate::error::{Result, StorageError};
use crate::history::HistoryStore;
use crate::ledger::{LedgerEntry, LedgerLogger};
use crate::repository::ValidationRepository;
use crate::stats::ValidationStats;
use promoter_core::ValidationRecord;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Regroupe les trois dépôts d'un enregistrement validé.
///
/// Le pipeline ne touche à aucun d'eux: c'est l'appelant qui décide de
/// stocker un enregistrement, puis éventuellement de l'inscrire au registre.
pub struct AuditArchive {
    history: HistoryStore,
    ledger: Arc<dyn LedgerLogger>,
    repository: Option<ValidationRepository>,
}

impl AuditArchive {
    /// Archive sans persistance des enregistrements
    pub fn new(ledger: Arc<dyn LedgerLogger>) -> Self {
        Self {
            history: HistoryStore::new(),
            ledger,
            repository: None,
        }
    }

    /// Ajoute la persistance SQLite des enregistrements
    pub fn with_repository(mut self, repository: ValidationRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn ledger(&self) -> &dyn LedgerLogger {
        self.ledger.as_ref()
    }

    /// Recharge l'historique depuis la base, s'il y en a une
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<usize> {
        let Some(repository) = &self.repository else {
            return Ok(0);
        };

        let records = repository.all_records().await?;
        let count = records.len();
        for record in records {
            self.history.append(record);
        }

        info!("{} validations restaurées dans l'historique", count);
        Ok(count)
    }

    /// Conserve un enregistrement produit par le pipeline
    #[instrument(skip(self, record), fields(record_id = %record.id, subject_id = %record.subject_id))]
    pub async fn store(&self, record: ValidationRecord) -> Result<Arc<ValidationRecord>> {
        if let Some(repository) = &self.repository {
            repository.save_record(&record).await?;
        }
        Ok(self.history.append(record))
    }

    /// Inscrit une validation déjà stockée au registre.
    ///
    /// En cas d'échec du registre, l'historique et la base restent inchangés.
    #[instrument(skip(self))]
    pub async fn log_to_ledger(&self, id: Uuid) -> Result<(LedgerEntry, Arc<ValidationRecord>)> {
        let record = self.history.get(id)?;

        let entry = match self.ledger.log(&record).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Échec d'inscription de la validation {}: {}", id, e);
                return Err(StorageError::Ledger(e));
            }
        };

        if let Some(repository) = &self.repository {
            repository.save_record(&record.with_ledger_tx(&entry.tx)).await?;
        }
        let updated = self.history.attach_ledger_tx(id, &entry.tx)?;

        Ok((entry, updated))
    }

    /// Historique d'un sujet, par created_at croissant
    pub fn history_for(&self, subject_id: &str) -> Vec<Arc<ValidationRecord>> {
        self.history.history_for(subject_id)
    }

    /// Entrée du registre et validation associée, si elle est connue ici
    pub async fn transaction(&self, tx: &str) -> Result<(LedgerEntry, Option<Arc<ValidationRecord>>)> {
        let entry = self.ledger.get_by_tx(tx).await?;
        let record = match self.history.by_tx(tx) {
            Ok(record) => Some(record),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        Ok((entry, record))
    }

    /// Statistiques globales
    pub async fn stats(&self) -> Result<ValidationStats> {
        let records = self.history.all();
        let ledger_transactions = self.ledger.len().await?;
        Ok(ValidationStats::compute(
            records.iter().map(|r| r.as_ref()),
            ledger_transactions,
        ))
    }
}
