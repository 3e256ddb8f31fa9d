//! Historique des validations par sujet

use crate::error::{Result, StorageError};
use parking_lot::{Mutex, RwLock};
use promoter_core::{Fingerprint, ValidationRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

type SubjectSlot = Arc<Mutex<Vec<Arc<ValidationRecord>>>>;

/// Index des enregistrements par sujet et par transaction.
///
/// Chaque sujet a son propre verrou: les ajouts pour des sujets différents
/// ne se bloquent pas. Les enregistrements stockés ne sont jamais modifiés
/// en place; une mise à jour remplace la référence.
#[derive(Debug, Default)]
pub struct HistoryStore {
    /// Map subject_id -> enregistrements triés par created_at
    subjects: RwLock<HashMap<String, SubjectSlot>>,

    /// Index par ID de validation
    by_id: RwLock<HashMap<Uuid, String>>,

    /// Index par transaction du registre
    by_tx: RwLock<HashMap<String, Arc<ValidationRecord>>>,
}

impl HistoryStore {
    /// Crée un historique vide
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, subject_id: &str) -> Option<SubjectSlot> {
        self.subjects.read().get(subject_id).cloned()
    }

    fn slot_or_insert(&self, subject_id: &str) -> SubjectSlot {
        if let Some(slot) = self.slot(subject_id) {
            return slot;
        }
        self.subjects
            .write()
            .entry(subject_id.to_string())
            .or_default()
            .clone()
    }

    /// Ajoute un enregistrement.
    ///
    /// Réajouter un ID déjà présent ne change rien et retourne la référence stockée.
    pub fn append(&self, record: ValidationRecord) -> Arc<ValidationRecord> {
        let slot = self.slot_or_insert(&record.subject_id);
        let mut records = slot.lock();

        if let Some(existing) = records.iter().find(|r| r.id == record.id) {
            return existing.clone();
        }

        // Les égalités de created_at gardent l'ordre d'insertion
        let position = records.partition_point(|r| r.created_at <= record.created_at);
        let record = Arc::new(record);
        records.insert(position, record.clone());

        self.by_id.write().insert(record.id, record.subject_id.clone());
        if let Some(tx) = &record.ledger_tx {
            self.by_tx.write().insert(tx.clone(), record.clone());
        }

        debug!("Validation {} ajoutée pour le sujet {}", record.id, record.subject_id);
        record
    }

    /// Historique d'un sujet, par created_at croissant (vide si inconnu)
    pub fn history_for(&self, subject_id: &str) -> Vec<Arc<ValidationRecord>> {
        match self.slot(subject_id) {
            Some(slot) => slot.lock().clone(),
            None => Vec::new(),
        }
    }

    /// Enregistrement associé à une transaction du registre
    pub fn by_tx(&self, tx: &str) -> Result<Arc<ValidationRecord>> {
        self.by_tx
            .read()
            .get(tx)
            .cloned()
            .ok_or_else(|| StorageError::TransactionNotFound(tx.to_string()))
    }

    /// Enregistrement par ID de validation
    pub fn get(&self, id: Uuid) -> Result<Arc<ValidationRecord>> {
        let subject_id = self
            .by_id
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::RecordNotFound(id.to_string()))?;

        self.slot(&subject_id)
            .and_then(|slot| slot.lock().iter().find(|r| r.id == id).cloned())
            .ok_or_else(|| StorageError::RecordNotFound(id.to_string()))
    }

    /// Attache une transaction du registre à un enregistrement.
    ///
    /// La référence stockée est remplacée par un nouvel enregistrement;
    /// l'ancien reste intact pour ceux qui le détiennent.
    pub fn attach_ledger_tx(&self, id: Uuid, tx: &str) -> Result<Arc<ValidationRecord>> {
        let subject_id = self
            .by_id
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::RecordNotFound(id.to_string()))?;
        let slot = self
            .slot(&subject_id)
            .ok_or_else(|| StorageError::RecordNotFound(id.to_string()))?;

        let mut records = slot.lock();
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StorageError::RecordNotFound(id.to_string()))?;

        if records[index].ledger_tx.as_deref() == Some(tx) {
            return Ok(records[index].clone());
        }

        let updated = Arc::new(records[index].with_ledger_tx(tx));
        records[index] = updated.clone();
        self.by_tx.write().insert(tx.to_string(), updated.clone());

        debug!("Transaction {} attachée à la validation {}", tx, id);
        Ok(updated)
    }

    /// Soumissions antérieures de la même séquence, tous sujets confondus
    pub fn duplicates_of(&self, sequence_fingerprint: &Fingerprint) -> Vec<Arc<ValidationRecord>> {
        let mut matches: Vec<_> = self
            .all()
            .into_iter()
            .filter(|r| &r.sequence_fingerprint == sequence_fingerprint)
            .collect();
        matches.sort_by_key(|r| r.created_at);
        matches
    }

    /// Tous les enregistrements, par created_at croissant
    pub fn all(&self) -> Vec<Arc<ValidationRecord>> {
        let slots: Vec<SubjectSlot> = self.subjects.read().values().cloned().collect();
        let mut records: Vec<_> = slots
            .iter()
            .flat_map(|slot| slot.lock().clone())
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    /// Sujets connus, triés
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.subjects.read().keys().cloned().collect();
        subjects.sort();
        subjects
    }

    /// Nombre total d'enregistrements
    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    /// Vérifie si l'historique est vide
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use chrono::Duration;

    #[test]
    fn test_history_creation() {
        let store = HistoryStore::new();
        assert!(store.is_empty());
        assert!(store.history_for("P1").is_empty());
    }

    #[test]
    fn test_history_is_per_subject_and_ordered() {
        let store = HistoryStore::new();
        let late = record("P1", "TATAAAATCGATCGATCG", 0);
        let mut early = record("P1", "CAATCAATCAATCAAT", 0);
        early.created_at = late.created_at - Duration::seconds(60);
        let other = record("P2", "GGGCGGGGGCGG", 0);

        store.append(late.clone());
        store.append(other);
        store.append(early.clone());

        let history = store.history_for("P1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, early.id);
        assert_eq!(history[1].id, late.id);
        assert!(history.iter().all(|r| r.subject_id == "P1"));
        assert_eq!(store.len(), 3);
        assert_eq!(store.subjects(), vec!["P1".to_string(), "P2".to_string()]);
    }

    #[test]
    fn test_append_same_id_is_noop() {
        let store = HistoryStore::new();
        let r = record("P1", "TATAAAATCGATCGATCG", 0);

        store.append(r.clone());
        store.append(r);

        assert_eq!(store.history_for("P1").len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_attach_ledger_tx_replaces_reference() {
        let store = HistoryStore::new();
        let held = store.append(record("P1", "TATAAAATCGATCGATCG", 0));

        assert!(matches!(store.by_tx("0xabc"), Err(StorageError::TransactionNotFound(_))));

        let updated = store.attach_ledger_tx(held.id, "0xabc").unwrap();
        assert_eq!(updated.ledger_tx.as_deref(), Some("0xabc"));
        // La référence déjà détenue n'a pas changé
        assert!(held.ledger_tx.is_none());

        assert_eq!(store.by_tx("0xabc").unwrap().id, held.id);
        assert_eq!(store.history_for("P1")[0].ledger_tx.as_deref(), Some("0xabc"));
        assert_eq!(store.get(held.id).unwrap().ledger_tx.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_attach_unknown_record() {
        let store = HistoryStore::new();
        let err = store.attach_ledger_tx(Uuid::new_v4(), "0xabc").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_record_with_tx_is_indexed_on_append() {
        let store = HistoryStore::new();
        let r = record("P1", "TATAAAATCGATCGATCG", 0).with_ledger_tx("0xfeed");
        store.append(r);

        assert!(store.by_tx("0xfeed").is_ok());
    }

    #[test]
    fn test_duplicates_of() {
        let store = HistoryStore::new();
        let a = store.append(record("P1", "TATAAAATCGATCGATCG", 0));
        store.append(record("P2", "TATAAAATCGATCGATCG", 0));
        store.append(record("P3", "GGGCGGGGGCGG", 0));

        let dups = store.duplicates_of(&a.sequence_fingerprint);
        assert_eq!(dups.len(), 2);
    }
}
