//! Vector index statistics.
//!
//! Gives a quick summary of what's indexed: total vectors, dimension,
//! and per-namespace counts. Used by `strandwise stats` to confirm that
//! seeding and re-indexing landed where expected.

use anyhow::Result;

use crate::config::Config;
use crate::index::create_index;

/// Run the stats command: describe the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let index = create_index(&config.index)?;
    let stats = index.describe().await?;

    println!("StrandWise — Index Stats");
    println!("========================");
    println!();
    println!("  Provider:    {}", config.index.provider);
    println!("  Vectors:     {}", stats.total_vector_count);
    println!("  Dimension:   {}", stats.dimension);

    if !stats.namespaces.is_empty() {
        println!();
        println!("  By namespace:");
        println!("  {:<24} {:>10}", "NAMESPACE", "VECTORS");
        println!("  {}", "-".repeat(36));
        for (name, count) in &stats.namespaces {
            let display = if name.is_empty() { "(default)" } else { name };
            println!("  {:<24} {:>10}", display, count);
        }
    }

    println!();
    Ok(())
}
