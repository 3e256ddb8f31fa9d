//! Commande d'empreinte

use crate::SequenceInput;
use anyhow::Result;
use promoter_core::{sequence_fingerprint, validate};

pub fn run(input: SequenceInput) -> Result<()> {
    let raw = input.read_sequence()?;
    let sequence = validate(&raw).map_err(crate::display::validation_failure)?;

    println!("{}", sequence_fingerprint(&sequence));
    Ok(())
}
