//! Menu engine - combines chunking, embedding, and the chunk store
//!
//! Ingestion: menu text → paragraph chunks → embeddings → store.
//! Retrieval: question → scored candidates per mode → dedup → cap.

use anyhow::Result;
use std::path::Path;

use super::embedding::embed;
use super::retriever::{
    dedupe_by_content, fallback_unscored, lexical_rank, AskScope, RetrievalMode, ScoredChunk,
    CONTEXT_CHUNK_CAP,
};
use super::store::{MenuStore, Scope, StoreStats};
use crate::core::chunk::split_menu_text;

/// Per-strategy fetch size before merge/dedup/cap, when the caller does
/// not override it. All-restaurant questions fetch more because the
/// candidate pool is wider.
const SINGLE_SCOPE_FETCH: usize = 5;
const ALL_SCOPE_FETCH: usize = 10;

/// Upload statistics
#[derive(Debug)]
pub struct UploadStats {
    pub restaurant: String,
    pub chunks_inserted: usize,
}

/// Engine combining the vectorizer and the chunk store
pub struct MenuEngine {
    store: MenuStore,
}

impl MenuEngine {
    /// Create engine over a database file
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            store: MenuStore::open(db_path)?,
        })
    }

    /// Create engine with in-memory storage (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            store: MenuStore::open_in_memory()?,
        })
    }

    pub fn store(&self) -> &MenuStore {
        &self.store
    }

    /// Chunk, embed, and store a menu for a restaurant.
    ///
    /// Uploading again for the same name adds chunks to the existing
    /// restaurant. Returns how many chunks survived the length filter.
    pub fn upload(&self, restaurant: &str, menu_text: &str) -> Result<UploadStats> {
        let restaurant_id = self.store.get_or_create_restaurant(restaurant)?;

        let chunks = split_menu_text(menu_text);
        for content in &chunks {
            let embedding = embed(content);
            self.store.insert_chunk(restaurant_id, content, &embedding)?;
        }

        Ok(UploadStats {
            restaurant: restaurant.to_string(),
            chunks_inserted: chunks.len(),
        })
    }

    /// Retrieve up to CONTEXT_CHUNK_CAP chunks relevant to the question.
    ///
    /// An empty result means the scope had no chunks at all (or, for
    /// Single scope, no restaurant exists yet); the caller is expected
    /// to answer with a fixed "no information" message without invoking
    /// the model.
    pub fn retrieve(
        &self,
        question: &str,
        scope: AskScope,
        mode: RetrievalMode,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredChunk>> {
        let store_scope = match scope {
            AskScope::All => Scope::All,
            AskScope::Single => match self.store.latest_restaurant()? {
                Some(row) => Scope::Restaurant(row.id),
                None => return Ok(Vec::new()),
            },
        };

        let fetch = limit.unwrap_or(match scope {
            AskScope::Single => SINGLE_SCOPE_FETCH,
            AskScope::All => ALL_SCOPE_FETCH,
        });

        let merged: Vec<ScoredChunk> = match mode {
            RetrievalMode::Vector => {
                let query_embedding = embed(question);
                self.store
                    .vector_search(&query_embedding, store_scope, fetch)?
                    .into_iter()
                    .map(ScoredChunk::from)
                    .collect()
            }
            RetrievalMode::Fulltext => self
                .store
                .fts_search(question, store_scope, fetch)?
                .into_iter()
                .map(ScoredChunk::from)
                .collect(),
            RetrievalMode::Lexical => {
                let candidates = self.store.chunks(store_scope)?;
                let relevant = lexical_rank(question, &candidates);
                if relevant.is_empty() {
                    // No keyword overlap anywhere: hand back leading
                    // candidates so the question still gets context
                    let mut unscored = fallback_unscored(&candidates);
                    unscored.truncate(CONTEXT_CHUNK_CAP);
                    unscored
                } else {
                    relevant
                }
            }
            RetrievalMode::Hybrid => {
                let query_embedding = embed(question);
                let mut merged: Vec<ScoredChunk> = self
                    .store
                    .vector_search(&query_embedding, store_scope, fetch)?
                    .into_iter()
                    .map(ScoredChunk::from)
                    .collect();
                merged.extend(
                    self.store
                        .fts_search(question, store_scope, fetch)?
                        .into_iter()
                        .map(ScoredChunk::from),
                );
                merged
            }
        };

        let mut selected = dedupe_by_content(merged);
        selected.truncate(CONTEXT_CHUNK_CAP);
        Ok(selected)
    }

    /// Get store statistics
    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROMA_MENU: &str = "\
Margherita Pizza with fresh tomatoes and mozzarella cheese $12.99

Quattro Formaggi Pizza with gorgonzola and parmesan $14.99

Spaghetti Carbonara with pancetta and pecorino $15.50

Tiramisu with espresso-soaked ladyfingers $7.00";

    const DINER_MENU: &str = "\
Veggie Burger with sweet potato fries $9.75

Buttermilk Pancakes with maple syrup $8.25";

    fn seeded_engine() -> MenuEngine {
        let engine = MenuEngine::open_in_memory().unwrap();
        engine.upload("Trattoria Roma", ROMA_MENU).unwrap();
        engine.upload("Blue Moon Diner", DINER_MENU).unwrap();
        engine
    }

    #[test]
    fn test_upload_counts_chunks() {
        let engine = MenuEngine::open_in_memory().unwrap();
        let stats = engine.upload("Trattoria Roma", ROMA_MENU).unwrap();
        assert_eq!(stats.chunks_inserted, 4);
        assert_eq!(engine.stats().unwrap().chunk_count, 4);
    }

    #[test]
    fn test_retrieve_empty_store() {
        let engine = MenuEngine::open_in_memory().unwrap();
        for scope in [AskScope::Single, AskScope::All] {
            let results = engine
                .retrieve("anything on the menu?", scope, RetrievalMode::Hybrid, None)
                .unwrap();
            assert!(results.is_empty());
        }
    }

    #[test]
    fn test_single_scope_sees_latest_restaurant_only() {
        let engine = seeded_engine();
        let results = engine
            .retrieve("pizza", AskScope::Single, RetrievalMode::Lexical, None)
            .unwrap();
        // Latest upload is the diner, which has no pizza; the fallback
        // still supplies diner chunks, never Roma ones
        assert!(!results.is_empty());
        assert!(results.iter().all(|c| c.restaurant == "Blue Moon Diner"));
    }

    #[test]
    fn test_vector_mode_ranks_overlapping_chunk_first() {
        let engine = seeded_engine();
        let results = engine
            .retrieve(
                "margherita pizza mozzarella",
                AskScope::All,
                RetrievalMode::Vector,
                None,
            )
            .unwrap();
        assert!(!results.is_empty());
        assert!(results[0].content.contains("Margherita"));
    }

    #[test]
    fn test_fulltext_mode() {
        let engine = seeded_engine();
        let results = engine
            .retrieve("pancakes", AskScope::All, RetrievalMode::Fulltext, None)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("Pancakes"));
    }

    #[test]
    fn test_hybrid_mode_dedupes_across_strategies() {
        let engine = seeded_engine();
        let results = engine
            .retrieve("carbonara", AskScope::All, RetrievalMode::Hybrid, None)
            .unwrap();

        // The carbonara chunk surfaces in both strategy lists but appears once
        let carbonara_hits = results
            .iter()
            .filter(|c| c.content.contains("Carbonara"))
            .count();
        assert_eq!(carbonara_hits, 1);

        let mut contents: Vec<&str> = results.iter().map(|c| c.content.as_str()).collect();
        contents.sort_unstable();
        contents.dedup();
        assert_eq!(contents.len(), results.len());
    }

    #[test]
    fn test_cap_law() {
        let engine = MenuEngine::open_in_memory().unwrap();
        // 20 distinct chunks, all lexically relevant to "pizza"
        let menu: String = (0..20)
            .map(|i| format!("Specialty pizza number {} with toppings $1{}.00\n\n", i, i % 10))
            .collect();
        engine.upload("Pizza Palace", &menu).unwrap();

        let results = engine
            .retrieve(
                "pizza",
                AskScope::All,
                RetrievalMode::Lexical,
                Some(50),
            )
            .unwrap();
        assert_eq!(results.len(), CONTEXT_CHUNK_CAP);
    }

    #[test]
    fn test_fallback_law() {
        let engine = seeded_engine();
        // No keyword overlap with any chunk, candidates exist → non-empty
        let results = engine
            .retrieve("zzyzx", AskScope::All, RetrievalMode::Lexical, None)
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= CONTEXT_CHUNK_CAP);
        assert!(results.iter().all(|c| c.score == crate::search::retriever::UNSCORED));
    }

    #[test]
    fn test_pizza_price_scenario() {
        let engine = MenuEngine::open_in_memory().unwrap();
        engine
            .upload("A", "Veggie Burger $9 with lettuce and tomato")
            .unwrap();
        engine
            .upload("B", "Cheese Pizza $11 with basil and oregano")
            .unwrap();

        let results = engine
            .retrieve("pizza price", AskScope::All, RetrievalMode::Lexical, None)
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().any(|c| c.restaurant == "B"));
    }
}
