//! Affichage des statistiques

use promoter_storage::ValidationStats;
use std::fmt::Write;

/// Affiche les statistiques globales
pub fn print_stats(stats: &ValidationStats) {
    print!("{}", render_stats(stats));
}

fn render_stats(stats: &ValidationStats) -> String {
    if stats.total_validations == 0 {
        return "Aucune validation enregistrée\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "\n┌────────────────────────────────────────────────┐");
    let _ = writeln!(out, "│ Statistiques Globales                          │");
    let _ = writeln!(out, "├────────────────────────────────────────────────┤");
    let _ = writeln!(out, "│ Validations            : {:>8}              │", stats.total_validations);
    for (label, count) in &stats.predictions {
        let _ = writeln!(out, "│   {:<20} : {:>8}              │", label, count);
    }
    let _ = writeln!(out, "│ Confiance moyenne      : {:>8.1}%             │", stats.average_confidence * 100.0);
    let _ = writeln!(out, "│ Transactions registre  : {:>8}              │", stats.ledger_transactions);
    let _ = writeln!(out, "└────────────────────────────────────────────────┘");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_stats_print_message_only() {
        let stats = ValidationStats::compute(std::iter::empty(), 0);
        assert_eq!(render_stats(&stats), "Aucune validation enregistrée\n");
    }

    #[test]
    fn test_stats_box() {
        let stats = ValidationStats {
            total_validations: 3,
            predictions: BTreeMap::from([("promoter".to_string(), 2), ("non_promoter".to_string(), 1)]),
            average_confidence: 0.8,
            ledger_transactions: 2,
        };
        let rendered = render_stats(&stats);
        assert!(rendered.contains("Statistiques Globales"));
        assert!(rendered.contains("promoter"));
        assert!(rendered.contains("80.0%"));
        assert!(!rendered.contains("Aucune validation"));
    }
}
