//! Commande de consultation d'une transaction du registre

use super::open_archive;
use crate::display::records::{print_ledger_entry, print_record};
use crate::DatabaseArgs;
use anyhow::Result;
use promoter_storage::StorageError;

pub async fn run(tx: String, database: DatabaseArgs) -> Result<()> {
    let (_db, archive) = open_archive(&database).await?;

    let (entry, record) = match archive.transaction(&tx).await {
        Ok(found) => found,
        Err(StorageError::TransactionNotFound(_)) => anyhow::bail!("Transaction inconnue: {}", tx),
        Err(e) => return Err(e.into()),
    };

    print_ledger_entry(&entry);
    if let Some(record) = record {
        println!();
        print_record(&record);
    }

    Ok(())
}
