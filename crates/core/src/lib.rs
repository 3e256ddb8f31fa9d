//! Promoter Core Library
//!
//! Validation de séquences nucléotidiques, recherche de motifs promoteurs,
//! empreintes de contenu et pipeline de validation autour d'un classifieur externe.

pub mod classifier;
pub mod error;
pub mod fasta;
pub mod fingerprint;
pub mod logging;
pub mod motif;
pub mod pipeline;
pub mod record;
pub mod sequence;

// Réexportations principales
pub use classifier::{ClassificationRequest, Classifier, ClassifierResponse, ProcessClassifier, StaticClassifier};
pub use error::{CatalogError, ClassifierError, PipelineError, Result, ValidationError};
pub use fasta::{extract_sequence, parse_records, validate_records, FastaRecord};
pub use fingerprint::{fingerprint, sequence_fingerprint, Fingerprint};
pub use logging::{init_logging_with_level, level_for_verbosity};
// Les macros log_operation et log_error sont automatiquement exportées à la racine du crate
#[doc(hidden)]
pub use tracing as __tracing;
pub use motif::{scan, Motif, MotifCatalog, MotifMatch, MotifScanner};
pub use pipeline::{generate_subject_id, PipelineConfig, PipelineRun, PipelineStage, ValidationPipeline};
pub use record::{Prediction, RecordContent, ValidationRecord};
pub use sequence::{validate, Sequence, SequenceRules, SequenceValidator};
