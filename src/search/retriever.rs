//! Chunk ranking and selection
//!
//! Pure helpers between the store and the language model: lexical
//! relevance scoring, the unscored fallback, content-keyed dedup, the
//! context-size cap, and context assembly.

use std::collections::HashSet;
use std::str::FromStr;

use super::store::ChunkRecord;

/// Hard cap on chunks handed to context assembly, to bound the data
/// volume passed to the model.
pub const CONTEXT_CHUNK_CAP: usize = 8;

/// Neutral score for chunks selected only by the no-match fallback.
pub const UNSCORED: f32 = 0.5;

/// How candidate chunks are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Cosine similarity between question and chunk embeddings.
    Vector,
    /// FTS5 rank from the store.
    Fulltext,
    /// Keyword overlap between question and chunk text.
    Lexical,
    /// Vector search unioned with full-text search, vector first.
    Hybrid,
}

impl FromStr for RetrievalMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vector" => Ok(Self::Vector),
            "fulltext" => Ok(Self::Fulltext),
            "lexical" => Ok(Self::Lexical),
            "hybrid" => Ok(Self::Hybrid),
            other => anyhow::bail!(
                "unknown retrieval mode '{}' (expected vector, fulltext, lexical, or hybrid)",
                other
            ),
        }
    }
}

/// Which restaurants a question runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskScope {
    /// The most recently uploaded restaurant only.
    Single,
    /// Every restaurant in the store.
    All,
}

impl FromStr for AskScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "all" => Ok(Self::All),
            other => anyhow::bail!("unknown scope '{}' (expected single or all)", other),
        }
    }
}

/// A chunk paired with a retrieval score: cosine similarity in [-1,1],
/// a full-text rank, a lexical match fraction, or UNSCORED.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub restaurant: String,
    pub content: String,
    pub score: f32,
}

impl From<(ChunkRecord, f32)> for ScoredChunk {
    fn from((record, score): (ChunkRecord, f32)) -> Self {
        Self {
            restaurant: record.restaurant,
            content: record.content,
            score,
        }
    }
}

/// Score chunks by keyword overlap with the question.
///
/// A chunk is relevant when its lowercased content contains at least one
/// whitespace-delimited token of the lowercased question as a substring;
/// its score is the fraction of question tokens it contains.
/// Sorted by score descending. Chunks with no overlap are omitted.
pub fn lexical_rank(question: &str, chunks: &[ChunkRecord]) -> Vec<ScoredChunk> {
    let question_lower = question.to_lowercase();
    let terms: Vec<&str> = question_lower.split_whitespace().collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<ScoredChunk> = chunks
        .iter()
        .filter_map(|chunk| {
            let content_lower = chunk.content.to_lowercase();
            let matched = terms
                .iter()
                .filter(|term| content_lower.contains(**term))
                .count();

            if matched == 0 {
                return None;
            }

            Some(ScoredChunk {
                restaurant: chunk.restaurant.clone(),
                content: chunk.content.clone(),
                score: matched as f32 / terms.len() as f32,
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

/// The full candidate list with the neutral placeholder score. Used when
/// no chunk matched lexically, so a question with no keyword overlap
/// still gets some context rather than an empty answer.
pub fn fallback_unscored(chunks: &[ChunkRecord]) -> Vec<ScoredChunk> {
    chunks
        .iter()
        .map(|chunk| ScoredChunk {
            restaurant: chunk.restaurant.clone(),
            content: chunk.content.clone(),
            score: UNSCORED,
        })
        .collect()
}

/// Drop repeated contents, keeping the first occurrence in order.
///
/// Dedup keys are exact content strings — two chunks with identical text
/// collapse to one entry, whichever was listed first.
pub fn dedupe_by_content(scored: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    let mut seen: HashSet<String> = HashSet::new();
    scored
        .into_iter()
        .filter(|chunk| seen.insert(chunk.content.clone()))
        .collect()
}

/// Format selected chunks into the model context.
///
/// Entries carry a `restaurant: ` prefix only when more than one
/// restaurant is represented; entries are separated by a blank line.
pub fn build_context(selected: &[ScoredChunk]) -> String {
    let distinct_sources: HashSet<&str> =
        selected.iter().map(|c| c.restaurant.as_str()).collect();
    let multi_source = distinct_sources.len() > 1;

    selected
        .iter()
        .map(|chunk| {
            if multi_source {
                format!("{}: {}", chunk.restaurant, chunk.content)
            } else {
                chunk.content.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(restaurant: &str, content: &str) -> ChunkRecord {
        ChunkRecord {
            restaurant: restaurant.to_string(),
            content: content.to_string(),
        }
    }

    fn scored(restaurant: &str, content: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            restaurant: restaurant.to_string(),
            content: content.to_string(),
            score,
        }
    }

    #[test]
    fn test_lexical_rank_selects_matching_chunk() {
        let candidates = vec![
            chunk("A", "Veggie Burger $9"),
            chunk("B", "Cheese Pizza $11"),
        ];

        // "price" matches no content, "pizza" matches chunk B
        let results = lexical_rank("pizza price", &candidates);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].restaurant, "B");
        assert!(results[0].content.contains("Pizza"));
    }

    #[test]
    fn test_lexical_rank_orders_by_match_fraction() {
        let candidates = vec![
            chunk("A", "House salad with croutons"),
            chunk("A", "Greek salad with feta and olives"),
        ];

        let results = lexical_rank("greek salad feta", &candidates);
        assert_eq!(results.len(), 2);
        assert!(results[0].content.contains("Greek"));
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_lexical_rank_short_tokens_match() {
        // Lexical matching has no minimum token length, unlike embedding
        let candidates = vec![chunk("A", "Oxtail stew with dumplings")];
        let results = lexical_rank("ox", &candidates);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_fallback_unscored() {
        let candidates = vec![
            chunk("A", "Veggie Burger $9"),
            chunk("B", "Cheese Pizza $11"),
        ];

        // Nothing matches lexically, but the candidate set is non-empty,
        // so the fallback still produces context
        assert!(lexical_rank("quinoa", &candidates).is_empty());

        let fallback = fallback_unscored(&candidates);
        assert_eq!(fallback.len(), 2);
        assert!(fallback.iter().all(|c| c.score == UNSCORED));
    }

    #[test]
    fn test_empty_candidates() {
        assert!(lexical_rank("pizza", &[]).is_empty());
        assert!(fallback_unscored(&[]).is_empty());
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        // The same chunk surfacing in both the vector and full-text lists
        // collapses to the first (vector) entry
        let merged = vec![
            scored("A", "Cheese Pizza $11", 0.9),
            scored("A", "Veggie Burger $9", 0.7),
            scored("A", "Cheese Pizza $11", 0.3),
        ];

        let deduped = dedupe_by_content(merged);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].content, "Cheese Pizza $11");
        assert_eq!(deduped[0].score, 0.9);
        assert_eq!(deduped[1].content, "Veggie Burger $9");
    }

    #[test]
    fn test_dedupe_is_exact_match_only() {
        // Dedup compares exact content strings, not normalized ones
        let merged = vec![
            scored("A", "Cheese Pizza $11", 0.9),
            scored("A", "cheese pizza $11", 0.8),
        ];
        assert_eq!(dedupe_by_content(merged).len(), 2);
    }

    #[test]
    fn test_build_context_single_source() {
        let selected = vec![
            scored("Trattoria Roma", "Margherita Pizza $12.99", 0.9),
            scored("Trattoria Roma", "Spaghetti Carbonara $15.50", 0.8),
        ];

        let context = build_context(&selected);
        assert_eq!(
            context,
            "Margherita Pizza $12.99\n\nSpaghetti Carbonara $15.50"
        );
    }

    #[test]
    fn test_build_context_multi_source_labels() {
        let selected = vec![
            scored("Trattoria Roma", "Margherita Pizza $12.99", 0.9),
            scored("Blue Moon Diner", "Veggie Burger $9.75", 0.8),
        ];

        let context = build_context(&selected);
        assert_eq!(
            context,
            "Trattoria Roma: Margherita Pizza $12.99\n\nBlue Moon Diner: Veggie Burger $9.75"
        );
    }

    #[test]
    fn test_mode_and_scope_parsing() {
        assert_eq!(
            "hybrid".parse::<RetrievalMode>().unwrap(),
            RetrievalMode::Hybrid
        );
        assert_eq!(
            "vector".parse::<RetrievalMode>().unwrap(),
            RetrievalMode::Vector
        );
        assert!("bm42".parse::<RetrievalMode>().is_err());

        assert_eq!("single".parse::<AskScope>().unwrap(), AskScope::Single);
        assert_eq!("all".parse::<AskScope>().unwrap(), AskScope::All);
        assert!("latest".parse::<AskScope>().is_err());
    }
}
