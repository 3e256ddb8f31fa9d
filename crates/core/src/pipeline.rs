//! Pipeline de validation: Validating → Classifying → Scanning → Fingerprinting → Complete
//!
//! Chaque exécution possède sa propre machine à états ([`PipelineRun`]).
//! Le pipeline ne persiste rien: l'historique et le registre sont des
//! appels explicites de l'appelant une fois l'enregistrement obtenu.

use crate::classifier::{ClassificationRequest, Classifier};
use crate::error::{PipelineError, Result};
use crate::fingerprint::sequence_fingerprint;
use crate::motif::{MotifCatalog, MotifScanner};
use crate::record::{RecordContent, ValidationRecord};
use crate::sequence::{SequenceRules, SequenceValidator};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Étapes d'une exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    Classifying,
    Scanning,
    Fingerprinting,
    Complete,
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Complete | PipelineStage::Failed)
    }

    /// Étape suivante sur le chemin nominal
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Validating => Some(PipelineStage::Classifying),
            PipelineStage::Classifying => Some(PipelineStage::Scanning),
            PipelineStage::Scanning => Some(PipelineStage::Fingerprinting),
            PipelineStage::Fingerprinting => Some(PipelineStage::Complete),
            PipelineStage::Complete | PipelineStage::Failed => None,
        }
    }

    /// `Failed` est atteignable depuis toute étape non terminale
    pub fn can_transition_to(self, to: PipelineStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == PipelineStage::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Classifying => "classifying",
            PipelineStage::Scanning => "scanning",
            PipelineStage::Fingerprinting => "fingerprinting",
            PipelineStage::Complete => "complete",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// État local d'une exécution
#[derive(Debug)]
pub struct PipelineRun {
    stage: PipelineStage,
    trail: Vec<PipelineStage>,
    progress: Option<watch::Sender<PipelineStage>>,
}

impl PipelineRun {
    fn new(progress: Option<watch::Sender<PipelineStage>>) -> Self {
        let run = Self {
            stage: PipelineStage::Validating,
            trail: vec![PipelineStage::Validating],
            progress,
        };
        run.publish();
        run
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Étapes traversées, dans l'ordre
    pub fn trail(&self) -> &[PipelineStage] {
        &self.trail
    }

    fn advance(&mut self, to: PipelineStage) {
        debug_assert!(
            self.stage.can_transition_to(to),
            "transition interdite {} -> {}",
            self.stage,
            to
        );
        debug!("Pipeline: {} -> {}", self.stage, to);
        self.stage = to;
        self.trail.push(to);
        self.publish();
    }

    fn fail(&mut self, error: PipelineError) -> PipelineError {
        warn!("Pipeline en échec à l'étape {}: {}", self.stage, error);
        self.advance(PipelineStage::Failed);
        error
    }

    fn publish(&self) {
        if let Some(progress) = &self.progress {
            // Aucun abonné n'est pas une erreur
            let _ = progress.send(self.stage);
        }
    }
}

/// Configuration du pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub rules: SequenceRules,
    pub default_analyst_id: String,
    pub motifs: MotifCatalog,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rules: SequenceRules::default(),
            default_analyst_id: "ANALYST001".to_string(),
            motifs: MotifCatalog::promoter(),
        }
    }
}

/// Orchestration validateur → classifieur → scanner → empreintes
#[derive(Debug, Clone, Default)]
pub struct ValidationPipeline {
    validator: SequenceValidator,
    scanner: MotifScanner,
}

impl ValidationPipeline {
    /// Pipeline avec les règles et le catalogue par défaut
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &PipelineConfig) -> Self {
        Self {
            validator: SequenceValidator::with_rules(config.rules.clone()),
            scanner: MotifScanner::new(config.motifs.clone()),
        }
    }

    pub fn validator(&self) -> &SequenceValidator {
        &self.validator
    }

    pub fn catalog(&self) -> &MotifCatalog {
        self.scanner.catalog()
    }

    /// Exécute le pipeline complet sur une entrée brute
    pub async fn run(
        &self,
        raw_sequence: &str,
        subject_id: &str,
        analyst_id: &str,
        classifier: &dyn Classifier,
    ) -> Result<ValidationRecord> {
        self.run_with_progress(raw_sequence, subject_id, analyst_id, classifier, None)
            .await
    }

    /// Comme [`run`](Self::run), en publiant chaque changement d'étape
    #[instrument(skip(self, raw_sequence, classifier, progress), fields(len = raw_sequence.len()))]
    pub async fn run_with_progress(
        &self,
        raw_sequence: &str,
        subject_id: &str,
        analyst_id: &str,
        classifier: &dyn Classifier,
        progress: Option<watch::Sender<PipelineStage>>,
    ) -> Result<ValidationRecord> {
        let mut run = PipelineRun::new(progress);

        // Validating: le classifieur n'est jamais appelé sur une entrée invalide
        let sequence = match self.validator.validate(raw_sequence) {
            Ok(sequence) => sequence,
            Err(errors) => return Err(run.fail(PipelineError::Validation(errors))),
        };

        run.advance(PipelineStage::Classifying);
        let request = ClassificationRequest {
            sequence: sequence.as_str().to_string(),
            subject_id: subject_id.to_string(),
            analyst_id: analyst_id.to_string(),
        };
        let response = match classifier.classify(&request).await {
            Ok(response) => response,
            Err(e) => return Err(run.fail(e.into())),
        };
        if let Err(e) = response.check() {
            return Err(run.fail(e.into()));
        }

        run.advance(PipelineStage::Scanning);
        let motifs = self.scanner.scan(&sequence);

        run.advance(PipelineStage::Fingerprinting);
        let sequence_fingerprint = sequence_fingerprint(&sequence);
        let content = RecordContent {
            sequence_fingerprint: &sequence_fingerprint,
            prediction: response.prediction,
            probability: response.probability,
            model_version_hash: &response.model_version_hash,
            motifs: &motifs,
            subject_id,
            analyst_id,
        };
        let record_fingerprint = match content.fingerprint() {
            Ok(fp) => fp,
            Err(e) => return Err(run.fail(e.into())),
        };

        let record = ValidationRecord {
            id: Uuid::new_v4(),
            sequence_fingerprint,
            sequence: sequence.into_string(),
            prediction: response.prediction,
            probability: response.probability,
            model_version_hash: response.model_version_hash,
            motifs,
            subject_id: subject_id.to_string(),
            analyst_id: analyst_id.to_string(),
            created_at: Utc::now(),
            record_fingerprint,
            ledger_tx: None,
        };

        run.advance(PipelineStage::Complete);
        info!(
            "Validation {} terminée: {} ({:.2}), {} motif(s) trouvé(s)",
            record.id,
            record.prediction,
            record.probability,
            record.found_motifs().count()
        );
        Ok(record)
    }
}

/// Génère un identifiant de sujet: `P` suivi de 8 caractères hexadécimaux majuscules
pub fn generate_subject_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("P{}", hex[..8].to_ascii_uppercase())
}
