//! Ask command - retrieve relevant chunks and answer the question

use anyhow::{bail, Result};
use colored::Colorize;

use crate::llm::claude::{fallback_answer, ClaudeClient, LlmError};
use crate::search::engine::MenuEngine;
use crate::search::retriever::{build_context, AskScope, RetrievalMode, ScoredChunk};

/// Answer returned without consulting the model when retrieval comes
/// back empty.
const NO_INFO_ANSWER: &str = "I couldn't find any relevant menu information to answer your question. Please try rephrasing or upload more menu data.";

/// Run ask command
pub fn run(
    question: &str,
    scope: &str,
    mode: &str,
    limit: Option<usize>,
    show_context: bool,
    json: bool,
) -> Result<()> {
    if question.trim().is_empty() {
        bail!("question must not be empty");
    }
    let scope: AskScope = scope.parse()?;
    let mode: RetrievalMode = mode.parse()?;

    let db_path = super::default_db_path();
    if !db_path.exists() {
        return print_answer(NO_INFO_ANSWER, &[], show_context, json);
    }

    let engine = MenuEngine::open(&db_path)?;
    let chunks = engine.retrieve(question, scope, mode, limit)?;

    if chunks.is_empty() {
        return print_answer(NO_INFO_ANSWER, &[], show_context, json);
    }

    let context = build_context(&chunks);

    let answer = match ClaudeClient::from_env() {
        Ok(client) => client.ask(question, &context, scope)?,
        Err(LlmError::MissingApiKey) => {
            if !json {
                println!(
                    "{} ANTHROPIC_API_KEY not set, using keyword fallback",
                    "!".yellow()
                );
                println!();
            }
            fallback_answer(question, &context)
        }
        Err(e) => return Err(e.into()),
    };

    print_answer(&answer, &chunks, show_context, json)
}

fn print_answer(
    answer: &str,
    chunks: &[ScoredChunk],
    show_context: bool,
    json: bool,
) -> Result<()> {
    if json {
        let json_chunks: Vec<_> = chunks
            .iter()
            .map(|c| {
                serde_json::json!({
                    "restaurant": c.restaurant,
                    "content": c.content,
                    "score": c.score,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "answer": answer,
                "chunks": json_chunks,
            })
        );
        return Ok(());
    }

    if show_context && !chunks.is_empty() {
        println!("{}", "Context".bold());
        for chunk in chunks {
            let score_str = format!("{:.2}", chunk.score);
            let score_colored = if chunk.score > 0.8 {
                score_str.green()
            } else if chunk.score > 0.6 {
                score_str.yellow()
            } else {
                score_str.dimmed()
            };
            println!(
                "  [{}] {} {}",
                score_colored,
                chunk.restaurant.cyan(),
                preview(&chunk.content).dimmed()
            );
        }
        println!();
    }

    println!("{}", answer);
    Ok(())
}

/// Truncate chunk text for display (char-aware for Unicode)
fn preview(content: &str) -> String {
    let flat = content.replace('\n', " ");
    if flat.chars().count() > 100 {
        format!("{}...", flat.chars().take(100).collect::<String>())
    } else {
        flat
    }
}
