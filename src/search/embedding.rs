//! Hashed bag-of-words embedding
//!
//! A deterministic, training-free embedding: tokens are hashed with the
//! classic `h*31 + c` polynomial rolling hash and scattered into a
//! fixed-width vector, which is then L2-normalized.
//!
//! Key properties:
//! - No external embedding service or model file required
//! - Deterministic (same input → same output, across processes)
//! - Captures lexical overlap, not meaning — paraphrases and synonyms
//!   score low by construction
//! - The hash wraps to 32-bit signed integers at every step; embeddings
//!   stored by earlier versions stay comparable only while that holds

/// Embedding dimension, fixed process-wide.
///
/// Every stored chunk embedding and every query embedding has exactly
/// this many components; cosine comparison is undefined otherwise.
pub const EMBEDDING_DIM: usize = 384;

/// Tokens shorter than this are dropped before hashing. Removes most
/// stop-word and punctuation fragments (also short meaningful tokens
/// like "ox" — an accepted lossy tradeoff).
const MIN_TOKEN_LEN: usize = 3;

/// Offset between the three scatter positions of one token.
const SCATTER_STRIDE: i32 = 1001;

/// Generate an embedding for a text.
///
/// Steps:
/// 1. Lowercase, strip non-alphanumeric chars, tokenize
/// 2. Hash each surviving token and scatter `1/sqrt(token_count)` into
///    three positions of the vector
/// 3. L2 normalize
///
/// Always succeeds. Text with no surviving tokens (empty, whitespace,
/// only short tokens) yields the all-zero vector; everything else yields
/// a unit-length vector.
pub fn embed(text: &str) -> Vec<f32> {
    let tokens = tokenize(text);

    let mut embedding = vec![0.0f32; EMBEDDING_DIM];
    if tokens.is_empty() {
        return embedding;
    }

    let weight = 1.0 / (tokens.len() as f32).sqrt();

    for token in &tokens {
        let hash = token_hash(token);
        for i in 0..3i32 {
            let pos = hash.wrapping_add(i * SCATTER_STRIDE).unsigned_abs() as usize
                % EMBEDDING_DIM;
            embedding[pos] += weight;
        }
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in &mut embedding {
            *val /= norm;
        }
    }

    embedding
}

/// Polynomial rolling hash over the token's chars.
///
/// `h = h*31 + c`, wrapped to i32 at every step. The wraparound is part
/// of the scheme: changing it changes the collision distribution and
/// therefore every embedding value.
fn token_hash(token: &str) -> i32 {
    let mut hash: i32 = 0;
    for c in token.chars() {
        hash = hash.wrapping_mul(31).wrapping_add(c as i32);
    }
    hash
}

/// Lowercase, replace non-alphanumeric chars with spaces, split on
/// whitespace, drop tokens shorter than MIN_TOKEN_LEN.
fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(String::from)
        .collect()
}

/// Cosine similarity between two embeddings.
///
/// Returns 0.0 when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_embed_deterministic() {
        let emb1 = embed("grilled salmon with lemon butter");
        let emb2 = embed("grilled salmon with lemon butter");
        let emb3 = embed("chocolate lava cake");

        // Bit-identical across calls
        assert_eq!(emb1, emb2);
        assert_ne!(emb1, emb3);
        assert_eq!(emb1.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_embed_unit_norm() {
        let emb = embed("Margherita Pizza with fresh tomatoes and mozzarella cheese - $12.99");
        assert_eq!(emb.len(), EMBEDDING_DIM);
        assert!((norm(&emb) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_embed_degenerate_input() {
        // Empty, whitespace-only, and all-short-token text yield the zero vector
        for text in ["", "   ", "a."] {
            let emb = embed(text);
            assert_eq!(emb.len(), EMBEDDING_DIM);
            assert!(emb.iter().all(|&x| x == 0.0), "expected zero vector for {:?}", text);
        }
    }

    #[test]
    fn test_token_length_filter() {
        // "ox" is two chars and gets dropped; "oxtail" survives
        assert!(embed("ox is on").iter().all(|&x| x == 0.0));
        assert!(norm(&embed("oxtail soup")) > 0.0);
    }

    #[test]
    fn test_punctuation_stripped() {
        // Punctuation splits tokens the same way spaces do
        assert_eq!(embed("mozzarella, basil!"), embed("mozzarella basil"));
    }

    #[test]
    fn test_similarity_monotonicity() {
        // A chunk sharing tokens with the query must score at least as
        // high as one sharing none (in aggregate; individual tokens can
        // collide in the hash space)
        let query = embed("pizza mozzarella tomato");
        let overlapping = embed("pizza with mozzarella and tomato sauce");
        let disjoint = embed("grilled chicken skewers with peanut dressing");

        let sim_overlap = cosine_similarity(&query, &overlapping);
        let sim_disjoint = cosine_similarity(&query, &disjoint);
        assert!(
            sim_overlap >= sim_disjoint,
            "overlap {} < disjoint {}",
            sim_overlap,
            sim_disjoint
        );
        assert!(sim_overlap > 0.1);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        // Zero vectors and mismatched lengths score 0.0 instead of dividing
        // by zero; callers do not re-validate dimensions on every call
        let zero = vec![0.0; 3];
        let unit = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&zero, &unit), 0.0);
        assert_eq!(cosine_similarity(&unit, &zero), 0.0);
        assert_eq!(cosine_similarity(&unit, &[1.0, 0.0]), 0.0);
    }
}
