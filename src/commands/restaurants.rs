//! Restaurants command - list uploaded restaurants with chunk counts

use anyhow::Result;
use colored::Colorize;

use crate::search::store::MenuStore;

/// Run restaurants command
pub fn run(json: bool) -> Result<()> {
    let db_path = super::default_db_path();

    if !db_path.exists() {
        if json {
            println!("{}", serde_json::json!([]));
        } else {
            println!(
                "{} No menus uploaded yet. Run {} first.",
                "!".yellow().bold(),
                "askmenu upload".cyan()
            );
        }
        return Ok(());
    }

    let store = MenuStore::open(&db_path)?;
    let restaurants = store.restaurants()?;

    if json {
        let json_rows: Vec<_> = restaurants
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "name": r.name,
                    "chunk_count": r.chunk_count,
                    "created_at": r.created_at,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_rows)?);
        return Ok(());
    }

    if restaurants.is_empty() {
        println!(
            "{} No menus uploaded yet. Run {} first.",
            "!".yellow().bold(),
            "askmenu upload".cyan()
        );
        return Ok(());
    }

    println!("{} {} restaurants", "→".dimmed(), restaurants.len());
    println!();

    for r in &restaurants {
        let uploaded = chrono::DateTime::from_timestamp(r.created_at, 0)
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {} ({} sections, uploaded {})",
            r.name.cyan(),
            r.chunk_count,
            uploaded.dimmed()
        );
    }

    Ok(())
}
