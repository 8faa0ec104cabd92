mod commands;
mod core;
mod llm;
mod search;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "askmenu")]
#[command(about = "Ask questions about uploaded restaurant menus", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a menu for a restaurant (text from --file or stdin)
    Upload {
        /// Restaurant name
        name: String,
        #[arg(long, help = "Read menu text from a file instead of stdin")]
        file: Option<PathBuf>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Ask a question about uploaded menus
    Ask {
        question: String,
        #[arg(
            long,
            help = "Retrieval scope: single (most recent restaurant) or all"
        )]
        scope: String,
        #[arg(
            long,
            default_value = "hybrid",
            help = "Retrieval mode: vector, fulltext, lexical, or hybrid"
        )]
        mode: String,
        #[arg(long, short, help = "Per-strategy candidate limit")]
        limit: Option<usize>,
        #[arg(long, help = "Show retrieved chunks and scores")]
        show_context: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List uploaded restaurants
    Restaurants {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Delete all restaurants and menu sections
    Clear {
        #[arg(long, help = "Actually delete (default: report only)")]
        force: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show store statistics
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload { name, file, json } => commands::upload::run(&name, file, json),
        Commands::Ask {
            question,
            scope,
            mode,
            limit,
            show_context,
            json,
        } => commands::ask::run(&question, &scope, &mode, limit, show_context, json),
        Commands::Restaurants { json } => commands::restaurants::run(json),
        Commands::Clear { force, json } => commands::clear::run(force, json),
        Commands::Status { json } => commands::status::run(json),
    }
}
