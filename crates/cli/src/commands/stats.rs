//! Commande de statistiques

use super::open_archive;
use crate::display::stats::print_stats;
use crate::DatabaseArgs;
use anyhow::Result;

pub async fn run(database: DatabaseArgs) -> Result<()> {
    let (_db, archive) = open_archive(&database).await?;
    let stats = archive.stats().await?;

    print_stats(&stats);
    Ok(())
}
