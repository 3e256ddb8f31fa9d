//! Extraction de séquences depuis du texte FASTA

use crate::error::ValidationError;
use crate::sequence::{Sequence, SequenceValidator};
use rayon::prelude::*;
use serde::Serialize;

/// Enregistrement FASTA brut (non validé)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastaRecord {
    /// En-tête sans le '>' (vide si le texte ne commence pas par un en-tête)
    pub header: String,
    /// Nucléotides concaténés, tels quels
    pub sequence: String,
}

/// Extrait les nucléotides bruts d'un texte FASTA.
///
/// Les lignes commençant par '>' sont ignorées, les autres sont nettoyées
/// de leurs blancs de bord puis concaténées. Aucune validation ici.
pub fn extract_sequence(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with('>'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Découpe un texte FASTA multi-enregistrements
pub fn parse_records(text: &str) -> Vec<FastaRecord> {
    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;

    for line in text.lines() {
        if let Some(header) = line.strip_prefix('>') {
            // Sauvegarder l'enregistrement précédent
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(FastaRecord {
                header: header.trim().to_string(),
                sequence: String::new(),
            });
            continue;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        current
            .get_or_insert_with(|| FastaRecord {
                header: String::new(),
                sequence: String::new(),
            })
            .sequence
            .push_str(line);
    }

    // Dernier enregistrement
    if let Some(record) = current {
        records.push(record);
    }

    records
}

/// Valide chaque enregistrement séparément, en parallèle.
///
/// L'ordre du résultat suit celui des enregistrements.
pub fn validate_records<'a>(
    records: &'a [FastaRecord],
    validator: &SequenceValidator,
) -> Vec<(&'a FastaRecord, Result<Sequence, Vec<ValidationError>>)> {
    records
        .par_iter()
        .map(|record| (record, validator.validate(&record.sequence)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_discards_headers() {
        let text = ">seq1 promoter candidate\nTATAAAATCG\nATCGATCG\n";
        assert_eq!(extract_sequence(text), "TATAAAATCGATCGATCG");
    }

    #[test]
    fn test_extract_handles_crlf_and_blank_lines() {
        let text = ">h\r\nTATA\r\n\r\nAAAT\r\n";
        assert_eq!(extract_sequence(text), "TATAAAAT");
    }

    #[test]
    fn test_extract_without_header() {
        assert_eq!(extract_sequence("atcg\nggcc"), "atcgggcc");
    }

    #[test]
    fn test_extract_keeps_inner_spaces() {
        // Les espaces internes restent, le validateur les rejettera
        assert_eq!(extract_sequence(">h\nAT CG\n"), "AT CG");
    }

    #[test]
    fn test_parse_multiple_records() {
        let text = "ACGT\n>first\nTATAAA\nCAAT\n>second\nGGGCGG\n";
        let records = parse_records(text);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].header, "");
        assert_eq!(records[0].sequence, "ACGT");
        assert_eq!(records[1].header, "first");
        assert_eq!(records[1].sequence, "TATAAACAAT");
        assert_eq!(records[2].header, "second");
        assert_eq!(records[2].sequence, "GGGCGG");
    }

    #[test]
    fn test_validate_records_keeps_order() {
        let records = parse_records(">ok\nTATAAAATCGATCG\n>short\nATCG\n");
        let results = validate_records(&records, &SequenceValidator::new());

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.header, "ok");
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0.header, "short");
        assert!(results[1].1.is_err());
    }
}
