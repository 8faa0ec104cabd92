//! Anthropic Messages API client
//!
//! One blocking request per question, no retry: a missing key and a
//! failed call are both terminal for the current ask. When no key is
//! configured the caller can fall back to `fallback_answer`, a purely
//! extractive answer over the retrieved context.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::search::retriever::AskScope;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const MAX_TOKENS: usize = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SINGLE_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about a restaurant menu. Use the provided menu information to answer the user's question accurately and helpfully. If the answer isn't in the menu, say so politely.";

const MULTI_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about multiple restaurant menus. Use the provided menu information from different restaurants to answer the user's question. When mentioning items, include which restaurant they're from. If comparing options, provide helpful comparisons across restaurants.";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,
    #[error("Claude API call failed: {0}")]
    CallFailed(String),
}

/// Blocking Anthropic Messages client
pub struct ClaudeClient {
    api_key: String,
    model: String,
    client: Client,
}

impl ClaudeClient {
    /// Build a client from ANTHROPIC_API_KEY (and optionally
    /// ANTHROPIC_MODEL). Errors when no key is configured.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;
        let model =
            std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::CallFailed(e.to_string()))?;

        Ok(Self {
            api_key,
            model,
            client,
        })
    }

    /// Ask Claude the question against the assembled menu context.
    pub fn ask(&self, question: &str, context: &str, scope: AskScope) -> Result<String, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(self.api_key.trim())
                .map_err(|_| LlmError::CallFailed("invalid API key header".to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: system_prompt(scope),
            messages: vec![Message {
                role: "user",
                content: user_prompt(question, context),
            }],
        };

        let resp = self
            .client
            .post(API_URL)
            .headers(headers)
            .json(&body)
            .send()
            .map_err(|e| LlmError::CallFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(LlmError::CallFailed(format!("{}: {}", status, text)));
        }

        let parsed: MessagesResponse = resp
            .json()
            .map_err(|e| LlmError::CallFailed(e.to_string()))?;

        let answer = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if answer.is_empty() {
            return Err(LlmError::CallFailed(
                "response missing text content".to_string(),
            ));
        }
        Ok(answer)
    }
}

fn system_prompt(scope: AskScope) -> &'static str {
    match scope {
        AskScope::Single => SINGLE_SYSTEM_PROMPT,
        AskScope::All => MULTI_SYSTEM_PROMPT,
    }
}

fn user_prompt(question: &str, context: &str) -> String {
    format!(
        "Menu Information:\n{}\n\nQuestion: {}\n\nPlease provide a helpful and accurate answer based on the menu information above.",
        context, question
    )
}

/// Extractive answer used when no API key is configured.
///
/// Picks context lines containing any question word longer than two
/// chars (up to five lines); with no matching line, falls back to the
/// leading context lines.
pub fn fallback_answer(question: &str, context: &str) -> String {
    let question_lower = question.to_lowercase();
    let question_words: Vec<&str> = question_lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect();

    let context_lines: Vec<&str> = context
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let relevant: Vec<&str> = context_lines
        .iter()
        .filter(|line| {
            let line_lower = line.to_lowercase();
            question_words.iter().any(|word| line_lower.contains(*word))
        })
        .take(5)
        .copied()
        .collect();

    let note = "Note: this is a keyword match over the menu text. Set ANTHROPIC_API_KEY for AI-powered answers.";

    if !relevant.is_empty() {
        format!(
            "Based on the menu information, here's what I found:\n\n{}\n\n{}",
            relevant.join("\n\n"),
            note
        )
    } else {
        format!(
            "I found menu information but couldn't find specific matches for your question. Here's some general menu content:\n\n{}\n\n{}",
            context_lines
                .iter()
                .take(3)
                .copied()
                .collect::<Vec<_>>()
                .join("\n\n"),
            note
        )
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
