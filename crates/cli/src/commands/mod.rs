//! Sous-commandes de la CLI

pub mod check;
pub mod fingerprint;
pub mod history;
pub mod run;
pub mod scan;
pub mod stats;
pub mod tx;

use crate::{DatabaseArgs, SequenceInput};
use anyhow::{Context, Result};
use promoter_core::{extract_sequence, parse_records, FastaRecord};
use promoter_storage::{AuditArchive, DatabaseConfig, DatabaseManager, SqliteLedger, ValidationRepository};
use std::sync::Arc;

impl SequenceInput {
    /// Texte brut de l'entrée: contenu du fichier ou séquence passée en argument
    fn read_text(&self) -> Result<String> {
        match (&self.input, &self.sequence) {
            (Some(path), _) => std::fs::read_to_string(path)
                .with_context(|| format!("Lecture impossible: {}", path.display())),
            (None, Some(sequence)) => Ok(sequence.clone()),
            (None, None) => anyhow::bail!("Aucune séquence fournie (--input ou --sequence)"),
        }
    }

    /// Séquence unique; les en-têtes FASTA sont ignorés
    pub fn read_sequence(&self) -> Result<String> {
        let text = self.read_text()?;
        if self.input.is_some() {
            Ok(extract_sequence(&text))
        } else {
            Ok(text)
        }
    }

    /// Un enregistrement par en-tête FASTA
    pub fn read_records(&self) -> Result<Vec<FastaRecord>> {
        let text = self.read_text()?;
        if self.input.is_some() {
            Ok(parse_records(&text))
        } else {
            Ok(vec![FastaRecord {
                header: String::new(),
                sequence: text,
            }])
        }
    }
}

/// Ouvre la base et l'archive d'audit associée, historique rechargé
pub async fn open_archive(database: &DatabaseArgs) -> Result<(DatabaseManager, AuditArchive)> {
    let mut db = DatabaseManager::new(DatabaseConfig {
        connection_string: database.db.clone(),
        ..Default::default()
    });
    db.initialize()
        .await
        .with_context(|| format!("Ouverture de la base {}", database.db))?;

    let pool = db.pool()?.clone();
    let archive = AuditArchive::new(Arc::new(SqliteLedger::new(pool.clone())))
        .with_repository(ValidationRepository::new(pool));
    archive.restore().await?;

    Ok((db, archive))
}
