//! Frontière avec le classifieur promoteur externe
//!
//! Le modèle lui-même n'est pas implémenté ici: on ne définit que le contrat
//! d'appel et la vérification de la réponse.

use crate::error::ClassifierError;
use crate::record::Prediction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Requête envoyée au classifieur
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub sequence: String,
    pub subject_id: String,
    pub analyst_id: String,
}

/// Réponse attendue du classifieur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResponse {
    pub prediction: Prediction,
    pub probability: f64,
    pub model_version_hash: String,
}

impl ClassifierResponse {
    /// Vérifie la forme de la réponse
    pub fn check(&self) -> Result<(), ClassifierError> {
        if !self.probability.is_finite() || !(0.0..=1.0).contains(&self.probability) {
            return Err(ClassifierError::Malformed(format!(
                "probabilité hors de [0, 1]: {}",
                self.probability
            )));
        }
        if self.model_version_hash.trim().is_empty() {
            return Err(ClassifierError::Malformed(
                "hash de version du modèle vide".to_string(),
            ));
        }
        Ok(())
    }
}

/// Service de classification promoteur / non-promoteur
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassifierResponse, ClassifierError>;
}

/// Classifieur joint via une commande externe.
///
/// La requête est écrite en JSON sur l'entrée standard, la réponse est lue
/// en JSON sur la sortie standard.
#[derive(Debug, Clone)]
pub struct ProcessClassifier {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessClassifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn invoke(&self, request: &ClassificationRequest) -> Result<Vec<u8>, ClassifierError> {
        let payload = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await?;
            // Fermer stdin pour signaler la fin de la requête
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ClassifierError::Transport(format!(
                "{} a terminé avec {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Classifier for ProcessClassifier {
    #[instrument(skip(self, request), fields(program = %self.program))]
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassifierResponse, ClassifierError> {
        let stdout = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.invoke(request))
                .await
                .map_err(|_| ClassifierError::Timeout(limit))??,
            None => self.invoke(request).await?,
        };

        debug!("Réponse du classifieur: {} octets", stdout.len());
        Ok(serde_json::from_slice(&stdout)?)
    }
}

/// Classifieur déterministe retournant toujours la même réponse
#[derive(Debug)]
pub struct StaticClassifier {
    response: ClassifierResponse,
    calls: AtomicUsize,
}

impl StaticClassifier {
    pub fn new(prediction: Prediction, probability: f64, model_version_hash: impl Into<String>) -> Self {
        Self {
            response: ClassifierResponse {
                prediction,
                probability,
                model_version_hash: model_version_hash.into(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    /// Nombre d'appels reçus
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<ClassifierResponse, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}
