//! Enregistrement de validation produit par le pipeline

use crate::fingerprint::{fingerprint, Fingerprint};
use crate::motif::MotifMatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Étiquette retournée par le classifieur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    Promoter,
    NonPromoter,
}

impl Prediction {
    pub fn as_str(self) -> &'static str {
        match self {
            Prediction::Promoter => "promoter",
            Prediction::NonPromoter => "non_promoter",
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prediction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promoter" => Ok(Prediction::Promoter),
            "non_promoter" => Ok(Prediction::NonPromoter),
            other => Err(format!("étiquette inconnue: {other}")),
        }
    }
}

/// Résultat immuable d'une exécution réussie du pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub id: Uuid,
    pub sequence_fingerprint: Fingerprint,
    pub sequence: String,
    pub prediction: Prediction,
    pub probability: f64,
    pub model_version_hash: String,
    pub motifs: Vec<MotifMatch>,
    pub subject_id: String,
    pub analyst_id: String,
    pub created_at: DateTime<Utc>,
    pub record_fingerprint: Fingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_tx: Option<String>,
}

/// Contenu stable d'un enregistrement, dans un ordre de champs fixe.
///
/// `id`, `created_at`, `ledger_tx` et la séquence brute n'en font pas partie.
#[derive(Serialize)]
pub struct RecordContent<'a> {
    pub sequence_fingerprint: &'a Fingerprint,
    pub prediction: Prediction,
    pub probability: f64,
    pub model_version_hash: &'a str,
    pub motifs: &'a [MotifMatch],
    pub subject_id: &'a str,
    pub analyst_id: &'a str,
}

impl RecordContent<'_> {
    /// Empreinte de la sérialisation JSON canonique
    pub fn fingerprint(&self) -> serde_json::Result<Fingerprint> {
        let canonical = serde_json::to_string(self)?;
        Ok(fingerprint(&canonical))
    }
}

impl ValidationRecord {
    /// Contenu servant au calcul de `record_fingerprint`
    pub fn content(&self) -> RecordContent<'_> {
        RecordContent {
            sequence_fingerprint: &self.sequence_fingerprint,
            prediction: self.prediction,
            probability: self.probability,
            model_version_hash: &self.model_version_hash,
            motifs: &self.motifs,
            subject_id: &self.subject_id,
            analyst_id: &self.analyst_id,
        }
    }

    /// Recalcule l'empreinte et la compare à celle stockée
    pub fn verify_fingerprint(&self) -> serde_json::Result<bool> {
        Ok(self.content().fingerprint()? == self.record_fingerprint)
    }

    /// Nouvel enregistrement portant la transaction du registre.
    ///
    /// `self` reste inchangé pour ceux qui le détiennent déjà.
    pub fn with_ledger_tx(&self, tx: impl Into<String>) -> Self {
        Self {
            ledger_tx: Some(tx.into()),
            ..self.clone()
        }
    }

    /// Motifs trouvés uniquement
    pub fn found_motifs(&self) -> impl Iterator<Item = &MotifMatch> {
        self.motifs.iter().filter(|m| m.found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValidationRecord {
        let sequence_fingerprint = fingerprint("TATAAAATCGATCGATCG");
        let motifs = vec![MotifMatch {
            name: "TATA Box".to_string(),
            pattern: "TATAAA".to_string(),
            position: Some(0),
            found: true,
        }];
        let record_fingerprint = RecordContent {
            sequence_fingerprint: &sequence_fingerprint,
            prediction: Prediction::Promoter,
            probability: 0.85,
            model_version_hash: "a1b2c3d4e5f60718",
            motifs: &motifs,
            subject_id: "P12345678",
            analyst_id: "ANALYST001",
        }
        .fingerprint()
        .unwrap();

        ValidationRecord {
            id: Uuid::new_v4(),
            sequence_fingerprint,
            sequence: "TATAAAATCGATCGATCG".to_string(),
            prediction: Prediction::Promoter,
            probability: 0.85,
            model_version_hash: "a1b2c3d4e5f60718".to_string(),
            motifs,
            subject_id: "P12345678".to_string(),
            analyst_id: "ANALYST001".to_string(),
            created_at: Utc::now(),
            record_fingerprint,
            ledger_tx: None,
        }
    }

    #[test]
    fn test_prediction_serialization() {
        assert_eq!(serde_json::to_string(&Prediction::NonPromoter).unwrap(), "\"non_promoter\"");
        assert_eq!("promoter".parse::<Prediction>().unwrap(), Prediction::Promoter);
        assert!("maybe".parse::<Prediction>().is_err());
    }

    #[test]
    fn test_fingerprint_ignores_volatile_fields() {
        let a = sample();
        let mut b = a.clone();
        b.id = Uuid::new_v4();
        b.created_at = a.created_at + chrono::Duration::seconds(30);
        b.ledger_tx = Some("0xabc".to_string());

        assert_eq!(a.content().fingerprint().unwrap(), b.content().fingerprint().unwrap());
        assert!(b.verify_fingerprint().unwrap());
    }

    #[test]
    fn test_tampering_is_detected() {
        let mut record = sample();
        assert!(record.verify_fingerprint().unwrap());

        record.probability = 0.99;
        assert!(!record.verify_fingerprint().unwrap());
    }

    #[test]
    fn test_with_ledger_tx_leaves_original_untouched() {
        let original = sample();
        let logged = original.with_ledger_tx("0x1234567890abcdef");

        assert_eq!(original.ledger_tx, None);
        assert_eq!(logged.ledger_tx.as_deref(), Some("0x1234567890abcdef"));
        assert_eq!(logged.record_fingerprint, original.record_fingerprint);
    }

    #[test]
    fn test_json_roundtrip_keeps_fingerprint_valid() {
        let record = sample();
        let json = serde_json::to_string(&record).unwrap();
        let back: ValidationRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back, record);
        assert!(back.verify_fingerprint().unwrap());
    }
}
