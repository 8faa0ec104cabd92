//! Menu text chunking
//!
//! Uploaded menu text (OCR output or hand-typed) is split into
//! paragraph-scale chunks, the atomic unit of retrieval.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // One or more blank lines (possibly containing whitespace)
    static ref PARAGRAPH_RE: Regex = Regex::new(r"\n\s*\n").unwrap();
}

/// Pieces at or below this many chars are discarded — stray headings,
/// page numbers, OCR noise.
const MIN_CHUNK_CHARS: usize = 20;

/// Split menu text into paragraph chunks.
///
/// Paragraphs are delimited by blank lines; each surviving chunk is
/// trimmed and longer than MIN_CHUNK_CHARS.
pub fn split_menu_text(text: &str) -> Vec<String> {
    PARAGRAPH_RE
        .split(text)
        .map(str::trim)
        .filter(|chunk| chunk.chars().count() > MIN_CHUNK_CHARS)
        .map(String::from)
        .collect()
}
