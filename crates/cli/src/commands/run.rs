//! Commande d'exécution du pipeline complet

use super::open_archive;
use crate::display::records::print_record;
use crate::{create_spinner, DatabaseArgs, OutputFormat, SequenceInput};
use anyhow::Result;
use console::style;
use promoter_core::{generate_subject_id, PipelineStage, ProcessClassifier, ValidationPipeline};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct RunOptions {
    pub classifier_cmd: String,
    pub classifier_args: Vec<String>,
    pub timeout: u64,
    pub subject: Option<String>,
    pub analyst: String,
    pub log: bool,
    pub persist: bool,
    pub format: OutputFormat,
}

pub async fn run(input: SequenceInput, options: RunOptions, database: DatabaseArgs) -> Result<()> {
    let raw = input.read_sequence()?;
    let subject_id = options.subject.clone().unwrap_or_else(generate_subject_id);

    let classifier = ProcessClassifier::new(&options.classifier_cmd)
        .with_args(options.classifier_args.clone())
        .with_timeout(Duration::from_secs(options.timeout));
    let pipeline = ValidationPipeline::new();

    // 1. Pipeline, avec l'étape courante affichée par le spinner
    let spinner = create_spinner("Validation...");
    let (progress, mut stages) = watch::channel(PipelineStage::Validating);
    let watcher = {
        let spinner = spinner.clone();
        tokio::spawn(async move {
            while stages.changed().await.is_ok() {
                let stage = *stages.borrow_and_update();
                spinner.set_message(format!("Étape: {}", stage));
            }
        })
    };

    let outcome = pipeline
        .run_with_progress(&raw, &subject_id, &options.analyst, &classifier, Some(progress))
        .await;
    watcher.await.ok();

    let record = match outcome {
        Ok(record) => {
            spinner.finish_with_message(format!("Validation {} terminée", record.id));
            record
        }
        Err(e) => {
            spinner.abandon_with_message(format!("Échec à l'étape {}", e.stage()));
            return Err(match e.validation_errors() {
                Some(errors) => crate::display::validation_failure(errors.to_vec()),
                None => e.into(),
            });
        }
    };

    // 2. Persistance et registre, à la demande
    let record = if options.persist || options.log {
        let (_db, archive) = open_archive(&database).await?;
        let mut stored = archive.store(record).await?;

        if options.log {
            let spinner = create_spinner("Inscription au registre...");
            let (entry, updated) = archive.log_to_ledger(stored.id).await?;
            spinner.finish_with_message(format!("Transaction {} (hauteur {})", entry.tx, entry.height));
            stored = updated;
        }
        stored
    } else {
        Arc::new(record)
    };

    match options.format {
        OutputFormat::Table => {
            print_record(&record);
            println!("\n{} Validation terminée!", style("✅").green());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record.as_ref())?),
    }

    Ok(())
}
