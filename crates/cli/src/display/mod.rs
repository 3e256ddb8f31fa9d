//! Affichage terminal

pub mod records;
pub mod stats;

use console::style;
use promoter_core::ValidationError;

/// Décrit une violation, avec les caractères rejetés le cas échéant
pub fn describe(error: &ValidationError) -> String {
    match error {
        ValidationError::InvalidAlphabet { offending } if !offending.is_empty() => {
            let shown: Vec<String> = offending
                .iter()
                .take(5)
                .map(|(position, c)| format!("{:?}@{}", c, position))
                .collect();
            let more = if offending.len() > 5 { ", ..." } else { "" };
            format!("{} [{}{}]", error, shown.join(", "), more)
        }
        other => other.to_string(),
    }
}

/// Affiche toutes les violations et retourne l'erreur de la commande
pub fn validation_failure(errors: Vec<ValidationError>) -> anyhow::Error {
    eprintln!("{} Séquence rejetée:", style("❌").red());
    for error in &errors {
        eprintln!("  - {}", describe(error));
    }
    anyhow::anyhow!("{} violation(s) de structure", errors.len())
}
