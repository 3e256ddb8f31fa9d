//! Routes de l'API web

use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse, ResponseError};
use promoter_core::{generate_subject_id, PipelineError, ValidationError};
use promoter_storage::{LedgerError, StorageError};
use tracing::{info, instrument, warn};

use crate::models::{
    AppState, ErrorResponse, HealthResponse, HistoryResponse, LogRequest, LogResponse, TransactionResponse,
    ValidateRequest,
};

/// Erreurs de l'API, chacune avec son code HTTP
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Requête invalide: {0}")]
    BadRequest(String),

    #[error("Séquence invalide")]
    Validation(Vec<ValidationError>),

    #[error("Aucun classifieur configuré")]
    ClassifierUnavailable,

    #[error(transparent)]
    Pipeline(PipelineError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(errors) => ApiError::Validation(errors),
            other => ApiError::Pipeline(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ClassifierUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Pipeline(PipelineError::Classifier(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::Ledger(e)) => match e {
                LedgerError::FingerprintMismatch { .. } | LedgerError::DuplicateMismatch { .. } => {
                    StatusCode::CONFLICT
                }
                e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        let body = match self {
            ApiError::Validation(errors) => ErrorResponse::with_details(
                self.to_string(),
                errors.iter().map(|e| e.to_string()).collect(),
                code.as_u16(),
            ),
            _ => ErrorResponse::new(self.to_string(), code.as_u16()),
        };
        HttpResponse::build(code).json(body)
    }
}

/// Enregistre toutes les routes de l'API
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(validate)
        .service(log_to_chain)
        .service(history)
        .service(transaction)
        .service(stats)
        .service(motifs);
}

/// Route pour la santé de l'API
#[get("/health")]
#[instrument(skip(data))]
pub async fn health_check(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let ledger_height = data.archive.ledger().len().await?;
    let database = match &data.database {
        Some(db) => Some(match db.health_check().await {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                warn!("Base de données indisponible: {}", e);
                "error".to_string()
            }
        }),
        None => None,
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        validations: data.archive.history().len(),
        ledger_height,
        classifier_configured: data.classifier.is_some(),
        database,
    }))
}

/// Valide une séquence, et l'inscrit au registre si demandé
#[post("/promoter/validate")]
#[instrument(skip(data, body))]
pub async fn validate(
    data: web::Data<AppState>,
    body: web::Json<ValidateRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let raw = request
        .raw_sequence()
        .ok_or_else(|| ApiError::BadRequest("champ `sequence` ou `fasta` requis".to_string()))?;

    let subject_id = request.subject_id.clone().unwrap_or_else(generate_subject_id);
    let analyst_id = request
        .analyst_id
        .clone()
        .unwrap_or_else(|| data.config.pipeline.default_analyst_id.clone());

    // Les erreurs de structure passent avant l'absence de classifieur
    if let Err(errors) = data.pipeline.validator().validate(&raw) {
        return Err(ApiError::Validation(errors));
    }
    let classifier = data.classifier.as_ref().ok_or(ApiError::ClassifierUnavailable)?;

    let record = data
        .pipeline
        .run(&raw, &subject_id, &analyst_id, classifier.as_ref())
        .await?;
    let mut stored = data.archive.store(record).await?;

    if request.log_to_ledger {
        let (entry, updated) = data.archive.log_to_ledger(stored.id).await?;
        info!("Validation {} inscrite: {}", stored.id, entry.tx);
        stored = updated;
    }

    Ok(HttpResponse::Ok().json(stored.as_ref()))
}

/// Inscrit une validation existante au registre
#[post("/promoter/log-to-chain")]
#[instrument(skip(data, body))]
pub async fn log_to_chain(
    data: web::Data<AppState>,
    body: web::Json<LogRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();

    let record = data.archive.history().get(request.validation_id)?;
    if record.subject_id != request.subject_id {
        return Err(StorageError::RecordNotFound(request.validation_id.to_string()).into());
    }

    let (entry, _) = data.archive.log_to_ledger(request.validation_id).await?;

    Ok(HttpResponse::Ok().json(LogResponse {
        status: "logged".to_string(),
        ledger_tx: entry.tx,
        height: entry.height,
        validation_id: request.validation_id,
    }))
}

/// Historique des validations d'un sujet
#[get("/promoter/history/{subject_id}")]
#[instrument(skip(data))]
pub async fn history(data: web::Data<AppState>, subject_id: web::Path<String>) -> HttpResponse {
    let subject_id = subject_id.into_inner();
    let validations: Vec<_> = data
        .archive
        .history_for(&subject_id)
        .iter()
        .map(|r| r.as_ref().clone())
        .collect();

    HttpResponse::Ok().json(HistoryResponse {
        subject_id,
        total_count: validations.len(),
        validations,
    })
}

/// Détail d'une transaction du registre
#[get("/promoter/transaction/{tx}")]
#[instrument(skip(data))]
pub async fn transaction(data: web::Data<AppState>, tx: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let (entry, record) = data.archive.transaction(&tx).await?;

    Ok(HttpResponse::Ok().json(TransactionResponse {
        transaction: entry,
        status: "confirmed".to_string(),
        validation: record.map(|r| r.as_ref().clone()),
    }))
}

/// Statistiques globales
#[get("/promoter/stats")]
#[instrument(skip(data))]
pub async fn stats(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.archive.stats().await?))
}

/// Catalogue de motifs actif
#[get("/promoter/motifs")]
pub async fn motifs(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.pipeline.catalog())
}
