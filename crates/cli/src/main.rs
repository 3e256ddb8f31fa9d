//! CLI pour la validation de séquences promotrices

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

mod commands;
mod display;

use commands::{check, fingerprint, history, run, scan, stats, tx};

#[derive(Parser)]
#[command(name = "promoter")]
#[command(about = "Validation et audit de séquences promotrices", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Niveau de verbosité
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Séquence brute ou fichier FASTA
#[derive(Args, Clone)]
#[group(required = true, multiple = false)]
pub struct SequenceInput {
    /// Fichier FASTA (ou texte brut) d'entrée
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Séquence passée directement
    #[arg(short, long)]
    sequence: Option<String>,
}

/// Base SQLite de l'historique et du registre
#[derive(Args, Clone)]
pub struct DatabaseArgs {
    /// URL de la base (ex. sqlite://audit.db)
    #[arg(long, default_value = "sqlite://promoter.db")]
    db: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Vérifie la structure des séquences (un résultat par enregistrement FASTA)
    Check {
        #[command(flatten)]
        input: SequenceInput,

        /// Longueur minimale acceptée
        #[arg(short, long, default_value = "10")]
        min_length: usize,
    },

    /// Recherche les motifs promoteurs connus
    Scan {
        #[command(flatten)]
        input: SequenceInput,

        /// Format de sortie
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Calcule l'empreinte SHA-256 de la séquence normalisée
    Fingerprint {
        #[command(flatten)]
        input: SequenceInput,
    },

    /// Exécute le pipeline complet avec un classifieur externe
    Run {
        #[command(flatten)]
        input: SequenceInput,

        /// Commande du classifieur (requête JSON sur stdin, réponse JSON sur stdout)
        #[arg(short, long)]
        classifier_cmd: String,

        /// Argument supplémentaire pour le classifieur (répétable)
        #[arg(long = "classifier-arg")]
        classifier_args: Vec<String>,

        /// Délai maximal du classifieur, en secondes
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Identifiant du sujet (généré si absent)
        #[arg(long)]
        subject: Option<String>,

        /// Identifiant de l'analyste
        #[arg(long, default_value = "ANALYST001")]
        analyst: String,

        /// Inscrit la validation au registre
        #[arg(short, long)]
        log: bool,

        /// Conserve la validation dans la base
        #[arg(long)]
        persist: bool,

        #[command(flatten)]
        database: DatabaseArgs,

        /// Format de sortie
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Historique des validations d'un sujet
    History {
        /// Identifiant du sujet
        subject: String,

        #[command(flatten)]
        database: DatabaseArgs,

        /// Format de sortie
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Détail d'une transaction du registre
    Tx {
        /// Handle de transaction (0x...)
        tx: String,

        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// Statistiques globales
    Stats {
        #[command(flatten)]
        database: DatabaseArgs,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
pub enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    promoter_core::init_logging_with_level(promoter_core::level_for_verbosity(cli.verbose));

    match cli.command {
        Commands::Check { input, min_length } => {
            check::run(input, min_length)?;
        }
        Commands::Scan { input, format } => {
            scan::run(input, format)?;
        }
        Commands::Fingerprint { input } => {
            fingerprint::run(input)?;
        }
        Commands::Run {
            input,
            classifier_cmd,
            classifier_args,
            timeout,
            subject,
            analyst,
            log,
            persist,
            database,
            format,
        } => {
            let options = run::RunOptions {
                classifier_cmd,
                classifier_args,
                timeout,
                subject,
                analyst,
                log,
                persist,
                format,
            };
            run::run(input, options, database).await?;
        }
        Commands::History { subject, database, format } => {
            history::run(subject, database, format).await?;
        }
        Commands::Tx { tx, database } => {
            tx::run(tx, database).await?;
        }
        Commands::Stats { database } => {
            stats::run(database).await?;
        }
    }

    Ok(())
}

/// Crée une barre de progression spinner
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb
}
