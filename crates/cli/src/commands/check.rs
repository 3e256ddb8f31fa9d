//! Commande de vérification structurelle

use crate::display::records::{print_check_table, CheckRow};
use crate::SequenceInput;
use anyhow::Result;
use console::style;
use promoter_core::{validate_records, SequenceRules, SequenceValidator};

pub fn run(input: SequenceInput, min_length: usize) -> Result<()> {
    let records = input.read_records()?;
    if records.is_empty() {
        anyhow::bail!("Aucun enregistrement dans l'entrée");
    }

    let validator = SequenceValidator::with_rules(SequenceRules { min_length });
    let results = promoter_core::log_operation!("check", { validate_records(&records, &validator) });

    let rows: Vec<CheckRow> = results
        .iter()
        .enumerate()
        .map(|(i, (record, result))| CheckRow::new(i + 1, record, result))
        .collect();
    let invalid = results.iter().filter(|(_, result)| result.is_err()).count();

    print_check_table(rows);

    if invalid > 0 {
        anyhow::bail!("{} séquence(s) invalide(s) sur {}", invalid, results.len());
    }

    println!("\n{} {} séquence(s) valide(s)", style("✅").green(), results.len());
    Ok(())
}
