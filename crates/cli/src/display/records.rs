//! Tableaux de validations, motifs et transactions

use super::describe;
use console::style;
use promoter_core::{FastaRecord, MotifMatch, Sequence, ValidationError, ValidationRecord};
use promoter_storage::LedgerEntry;
use std::sync::Arc;
use tabled::{Table, Tabled};

#[derive(Tabled)]
pub struct CheckRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Header")]
    header: String,
    #[tabled(rename = "Length")]
    length: usize,
    #[tabled(rename = "Status")]
    status: String,
}

impl CheckRow {
    pub fn new(index: usize, record: &FastaRecord, result: &Result<Sequence, Vec<ValidationError>>) -> Self {
        let status = match result {
            Ok(sequence) => format!("OK (GC {:.1}%)", sequence.gc_ratio() * 100.0),
            Err(errors) => errors.iter().map(describe).collect::<Vec<_>>().join("; "),
        };
        Self {
            index,
            header: truncate(&record.header, 30),
            length: record.sequence.chars().count(),
            status,
        }
    }
}

pub fn print_check_table(rows: Vec<CheckRow>) {
    println!();
    println!("{}", Table::new(rows));
}

#[derive(Tabled)]
struct MotifRow {
    #[tabled(rename = "Motif")]
    name: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Found")]
    found: String,
    #[tabled(rename = "Position")]
    position: String,
}

pub fn print_motif_table(matches: &[MotifMatch]) {
    let rows: Vec<MotifRow> = matches
        .iter()
        .map(|m| MotifRow {
            name: m.name.clone(),
            pattern: m.pattern.clone(),
            found: if m.found { "yes".to_string() } else { "no".to_string() },
            position: m.position.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!();
    println!("{}", Table::new(rows));
}

/// Détail d'une validation
pub fn print_record(record: &ValidationRecord) {
    println!("{}", style(format!("Validation {}", record.id)).bold());
    println!("  Sujet      : {}", record.subject_id);
    println!("  Analyste   : {}", record.analyst_id);
    println!("  Date       : {}", record.created_at.to_rfc3339());
    println!("  Prédiction : {} ({:.1}%)", record.prediction, record.probability * 100.0);
    println!("  Modèle     : {}", record.model_version_hash);
    println!("  Séquence   : {} ({} nt)", truncate(&record.sequence, 50), record.sequence.len());
    println!("  Empreinte  : {}", record.sequence_fingerprint);
    println!("  Contenu    : {}", record.record_fingerprint);
    if let Some(tx) = &record.ledger_tx {
        println!("  Registre   : {}", style(tx).cyan());
    }
    print_motif_table(&record.motifs);
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    created_at: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Prediction")]
    prediction: String,
    #[tabled(rename = "Motifs")]
    motifs: String,
    #[tabled(rename = "Fingerprint")]
    fingerprint: String,
    #[tabled(rename = "Ledger")]
    ledger_tx: String,
}

pub fn print_history_table(history: &[Arc<ValidationRecord>]) {
    let rows: Vec<HistoryRow> = history
        .iter()
        .map(|r| HistoryRow {
            created_at: r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            id: r.id.to_string().chars().take(8).collect(),
            prediction: format!("{} ({:.2})", r.prediction, r.probability),
            motifs: r.found_motifs().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", "),
            fingerprint: r.record_fingerprint.short().to_string(),
            ledger_tx: r.ledger_tx.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!();
    println!("{}", Table::new(rows));
}

pub fn print_ledger_entry(entry: &LedgerEntry) {
    println!("{}", style(format!("Transaction {}", entry.tx)).bold());
    println!("  Hauteur    : {}", entry.height);
    println!("  Inscrite   : {}", entry.logged_at.to_rfc3339());
    println!("  Prédiction : {} ({:.1}%)", entry.prediction, entry.probability * 100.0);
    println!("  Modèle     : {}", entry.model_version_hash);
    println!("  Séquence   : {}", entry.sequence_fingerprint);
    println!("  Contenu    : {}", entry.record_fingerprint);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("ATCG", 10), "ATCG");
        assert_eq!(truncate("ATCGATCGATCG", 4), "ATCG...");
    }

    #[test]
    fn test_check_row_reports_errors() {
        let record = FastaRecord {
            header: "seq1".to_string(),
            sequence: "ATCG".to_string(),
        };
        let result = Err(vec![ValidationError::TooShort { len: 4, min: 10 }]);
        let row = CheckRow::new(1, &record, &result);
        assert_eq!(row.length, 4);
        assert!(row.status.contains("4"));
    }
}
