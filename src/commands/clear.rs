//! Clear command - bulk delete of all stored data
//!
//! There is no per-chunk or per-restaurant delete; clearing everything
//! is the only destructive operation.

use anyhow::Result;
use colored::Colorize;

use crate::search::store::MenuStore;

/// Run clear command. Without --force, reports what would be deleted
/// and exits nonzero.
pub fn run(force: bool, json: bool) -> Result<()> {
    let db_path = super::default_db_path();

    if !db_path.exists() {
        if json {
            println!("{}", serde_json::json!({ "cleared": false, "reason": "no data" }));
        } else {
            println!("{} Nothing to clear", "→".dimmed());
        }
        return Ok(());
    }

    let store = MenuStore::open(&db_path)?;
    let stats = store.stats()?;

    if !force {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "cleared": false,
                    "restaurants": stats.restaurant_count,
                    "chunks": stats.chunk_count,
                    "hint": "re-run with --force to delete",
                })
            );
        } else {
            println!(
                "{} This would delete {} restaurants and {} menu sections. Re-run with {} to proceed.",
                "!".yellow().bold(),
                stats.restaurant_count,
                stats.chunk_count,
                "--force".cyan()
            );
        }
        std::process::exit(1);
    }

    store.clear_all()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "cleared": true,
                "restaurants": stats.restaurant_count,
                "chunks": stats.chunk_count,
            })
        );
    } else {
        println!(
            "{} Cleared {} restaurants and {} menu sections",
            "✓".green().bold(),
            stats.restaurant_count,
            stats.chunk_count
        );
    }

    Ok(())
}
