//! Historique, registre d'audit et persistance des validations

pub mod archive;
pub mod database;
pub mod error;
pub mod history;
pub mod ledger;
pub mod repository;
pub mod stats;

pub use archive::AuditArchive;
pub use database::{DatabaseConfig, DatabaseManager};
pub use error::{LedgerError, Result, StorageError};
pub use history::HistoryStore;
pub use ledger::{transaction_handle, LedgerEntry, LedgerLogger, MemoryLedger, SqliteLedger};
pub use repository::{DbValidation, ValidationRepository};
pub use stats::ValidationStats;
