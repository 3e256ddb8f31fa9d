//! Commande d'historique par sujet

use super::open_archive;
use crate::display::records::print_history_table;
use crate::{DatabaseArgs, OutputFormat};
use anyhow::Result;

pub async fn run(subject_id: String, database: DatabaseArgs, format: OutputFormat) -> Result<()> {
    let (_db, archive) = open_archive(&database).await?;
    let history = archive.history_for(&subject_id);

    match format {
        OutputFormat::Table => {
            if history.is_empty() {
                println!("Aucune validation pour le sujet {}", subject_id);
                return Ok(());
            }
            println!("📜 Sujet {}: {} validation(s)", subject_id, history.len());
            print_history_table(&history);
        }
        OutputFormat::Json => {
            let validations: Vec<_> = history.iter().map(|r| r.as_ref()).collect();
            let body = serde_json::json!({
                "subject_id": subject_id,
                "validations": validations,
                "total_count": history.len(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
