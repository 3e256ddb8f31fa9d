//! Commande de recherche de motifs

use crate::display::records::print_motif_table;
use crate::{OutputFormat, SequenceInput};
use anyhow::Result;
use promoter_core::{MotifScanner, SequenceValidator};

pub fn run(input: SequenceInput, format: OutputFormat) -> Result<()> {
    let raw = input.read_sequence()?;
    let sequence = SequenceValidator::new()
        .validate(&raw)
        .map_err(crate::display::validation_failure)?;

    let matches = MotifScanner::default().scan(&sequence);

    match format {
        OutputFormat::Table => {
            println!("🔬 {} nucléotides, GC {:.1}%", sequence.len(), sequence.gc_ratio() * 100.0);
            print_motif_table(&matches);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&matches)?),
    }

    Ok(())
}
