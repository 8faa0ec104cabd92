//! Status command - store statistics

use anyhow::Result;
use colored::Colorize;

use crate::search::store::MenuStore;

/// Run status command
pub fn run(json: bool) -> Result<()> {
    let db_path = super::default_db_path();

    if !db_path.exists() {
        if json {
            println!("{}", serde_json::json!({ "exists": false }));
        } else {
            println!(
                "{} No database yet. Run {} first.",
                "!".yellow().bold(),
                "askmenu upload".cyan()
            );
        }
        return Ok(());
    }

    let store = MenuStore::open(&db_path)?;
    let stats = store.stats()?;
    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "restaurant_count": stats.restaurant_count,
                "chunk_count": stats.chunk_count,
                "file_size_bytes": file_size,
                "db_path": db_path.display().to_string(),
            })
        );
        return Ok(());
    }

    println!("{}", "Store Status".bold());
    println!();
    println!(
        "  {} {} restaurants",
        "→".dimmed(),
        stats.restaurant_count.to_string().cyan()
    );
    println!(
        "  {} {} menu sections",
        "→".dimmed(),
        stats.chunk_count.to_string().cyan()
    );
    println!(
        "  {} Size: {:.2} KB",
        "→".dimmed(),
        file_size as f64 / 1024.0
    );
    println!("  {} Database: {}", "→".dimmed(), db_path.display());

    Ok(())
}
