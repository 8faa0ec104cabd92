//! Upload command - chunk, embed, and store a restaurant menu

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::io::Read;
use std::path::PathBuf;

use crate::search::engine::MenuEngine;

/// Run upload command. Menu text comes from a file or stdin.
pub fn run(name: &str, file: Option<PathBuf>, json: bool) -> Result<()> {
    if name.trim().is_empty() {
        bail!("restaurant name must not be empty");
    }

    let menu_text = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read menu file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read menu text from stdin")?;
            buf
        }
    };

    if menu_text.trim().is_empty() {
        bail!("menu text is empty");
    }

    let db_path = super::default_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let engine = MenuEngine::open(&db_path)?;
    let stats = engine.upload(name.trim(), &menu_text)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "restaurant": stats.restaurant,
                "chunks_inserted": stats.chunks_inserted,
            })
        );
        return Ok(());
    }

    if stats.chunks_inserted == 0 {
        println!(
            "{} No menu sections survived the length filter (paragraphs must be longer than 20 characters)",
            "!".yellow().bold()
        );
        return Ok(());
    }

    println!(
        "{} Uploaded {} menu sections for {}",
        "✓".green().bold(),
        stats.chunks_inserted.to_string().cyan(),
        stats.restaurant.cyan()
    );

    Ok(())
}
