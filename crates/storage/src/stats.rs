//! Statistiques agrégées sur l'historique des validations

use promoter_core::ValidationRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vue d'ensemble des validations enregistrées
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_validations: usize,
    /// Nombre de validations par étiquette
    pub predictions: BTreeMap<String, usize>,
    /// Probabilité moyenne, 0 sans validation
    pub average_confidence: f64,
    pub ledger_transactions: u64,
}

impl ValidationStats {
    pub fn compute<'a, I>(records: I, ledger_transactions: u64) -> Self
    where
        I: IntoIterator<Item = &'a ValidationRecord>,
    {
        let mut stats = ValidationStats {
            ledger_transactions,
            ..Default::default()
        };
        let mut confidence_sum = 0.0;

        for record in records {
            stats.total_validations += 1;
            confidence_sum += record.probability;
            *stats
                .predictions
                .entry(record.prediction.as_str().to_string())
                .or_insert(0) += 1;
        }

        if stats.total_validations > 0 {
            stats.average_confidence = confidence_sum / stats.total_validations as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use promoter_core::Prediction;

    #[test]
    fn test_empty_stats() {
        let stats = ValidationStats::compute(std::iter::empty(), 0);
        assert_eq!(stats.total_validations, 0);
        assert_eq!(stats.average_confidence, 0.0);
        assert!(stats.predictions.is_empty());
    }

    #[test]
    fn test_stats_counts_labels() {
        let a = record("P1", "TATAAAATCGATCGATCG", 0);
        let mut b = record("P2", "GGGCGGGGGCGG", 0);
        b.prediction = Prediction::NonPromoter;
        b.probability = 0.25;

        let stats = ValidationStats::compute([&a, &b], 1);

        assert_eq!(stats.total_validations, 2);
        assert_eq!(stats.predictions.get("promoter"), Some(&1));
        assert_eq!(stats.predictions.get("non_promoter"), Some(&1));
        assert!((stats.average_confidence - (a.probability + 0.25) / 2.0).abs() < 1e-12);
        assert_eq!(stats.ledger_transactions, 1);
    }
}
