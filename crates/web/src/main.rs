//! Promoter Audit Web Server
//!
//! Serveur web pour la validation de séquences promotrices et leur registre d'audit

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use promoter_core::{Classifier, ProcessClassifier};
use promoter_storage::{AuditArchive, DatabaseManager, LedgerLogger, MemoryLedger, SqliteLedger, ValidationRepository};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

mod config;
mod models;
mod routes;

use config::AppConfig;
use models::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Charger la configuration
    let config = match AppConfig::load_from_file("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Erreur de chargement de la configuration: {}. Utilisation des valeurs par défaut.", e);
            AppConfig::default()
        }
    };

    // Initialiser le logging
    init_logging(&config.logging);

    // Initialiser la base de données si activée
    let database = if config.database.enabled {
        let mut db_manager = DatabaseManager::new(promoter_storage::DatabaseConfig {
            connection_string: config.database.url.clone(),
            max_connections: config.database.max_connections,
        });

        if let Err(e) = db_manager.initialize().await {
            tracing::error!("Erreur d'initialisation de la base de données: {}", e);
            None
        } else {
            Some(db_manager)
        }
    } else {
        None
    };

    // Registre et historique: SQLite si la base est disponible, mémoire sinon
    let archive = match database.as_ref().and_then(|db| db.pool().ok()) {
        Some(pool) => {
            let ledger: Arc<dyn LedgerLogger> = Arc::new(SqliteLedger::new(pool.clone()));
            AuditArchive::new(ledger).with_repository(ValidationRepository::new(pool.clone()))
        }
        None => AuditArchive::new(Arc::new(MemoryLedger::new())),
    };
    if let Err(e) = archive.restore().await {
        promoter_core::log_error!(e);
    }

    let classifier = config.classifier.command.as_ref().map(|command| {
        let classifier = ProcessClassifier::new(command.clone())
            .with_args(config.classifier.args.clone())
            .with_timeout(config.classifier.timeout());
        Arc::new(classifier) as Arc<dyn Classifier>
    });
    if classifier.is_none() {
        tracing::warn!("Aucun classifieur configuré: /promoter/validate répondra 503");
    }

    // Créer l'état de l'application
    let app_state = web::Data::new(AppState::new(config.clone(), classifier, archive, database));

    tracing::info!(
        "🧬 Démarrage du serveur Promoter Audit sur http://{}:{}",
        config.server.host,
        config.server.port
    );

    let json_limit = config.server.json_limit;
    HttpServer::new(move || {
        // Configurer CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(app_state.clone())
            .app_data(web::JsonConfig::default().limit(json_limit))
            .configure(routes::configure)
    })
    .workers(config.server.workers)
    .bind((config.server.host.clone(), config.server.port))?
    .run()
    .await
}

/// Initialise le système de logging
fn init_logging(config: &crate::config::LoggingConfig) {
    let filter = match config.level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };

    match config.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .init();
        }
    }
}
