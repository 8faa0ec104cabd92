//! Chunk store backed by SQLite
//!
//! Embeddings are stored as little-endian f32 BLOBs and similarity is
//! computed in Rust; full-text rank comes from an FTS5 table over the
//! chunk contents. Chunks are immutable once inserted — the only
//! destructive operation is a bulk clear of everything.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::embedding::cosine_similarity;

/// Which chunks a read operation sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// One restaurant's chunks.
    Restaurant(i64),
    /// Every chunk in the store.
    All,
}

/// A stored menu chunk with its source restaurant.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub restaurant: String,
    pub content: String,
}

/// A restaurant row with its chunk count.
#[derive(Debug, Clone)]
pub struct RestaurantRow {
    pub id: i64,
    pub name: String,
    pub chunk_count: usize,
    pub created_at: i64,
}

/// Store counters.
#[derive(Debug)]
pub struct StoreStats {
    pub restaurant_count: usize,
    pub chunk_count: usize,
}

/// SQLite-backed store for restaurants and menu chunks
pub struct MenuStore {
    conn: Connection,
}

impl MenuStore {
    /// Open or create database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS restaurants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS menu_chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                restaurant_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (restaurant_id) REFERENCES restaurants(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_menu_chunks_restaurant_id
                ON menu_chunks(restaurant_id);

            -- Full-text index over chunk contents; rowid mirrors menu_chunks.id
            CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(content);
            "#,
        )?;

        Ok(())
    }

    /// Look up a restaurant by name, creating it if missing. Uploading
    /// more text for an existing name adds chunks to it.
    pub fn get_or_create_restaurant(&self, name: &str) -> Result<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM restaurants WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO restaurants (name, created_at) VALUES (?1, ?2)",
            params![name, chrono::Utc::now().timestamp()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a chunk with its embedding and index it for full-text search
    pub fn insert_chunk(&self, restaurant_id: i64, content: &str, embedding: &[f32]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO menu_chunks (restaurant_id, content, embedding, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                restaurant_id,
                content,
                embedding_to_blob(embedding),
                chrono::Utc::now().timestamp(),
            ],
        )?;
        let chunk_id = self.conn.last_insert_rowid();

        self.conn.execute(
            "INSERT INTO chunks_fts (rowid, content) VALUES (?1, ?2)",
            params![chunk_id, content],
        )?;

        Ok(())
    }

    /// Most recently created restaurant, if any
    pub fn latest_restaurant(&self) -> Result<Option<RestaurantRow>> {
        self.restaurant_row(
            "SELECT r.id, r.name, COUNT(c.id), r.created_at
             FROM restaurants r
             LEFT JOIN menu_chunks c ON c.restaurant_id = r.id
             GROUP BY r.id, r.name, r.created_at
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT 1",
        )
    }

    fn restaurant_row(&self, sql: &str) -> Result<Option<RestaurantRow>> {
        let row = self
            .conn
            .query_row(sql, [], |row| {
                Ok(RestaurantRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    chunk_count: row.get::<_, i64>(2)? as usize,
                    created_at: row.get(3)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    /// All restaurants with chunk counts, newest first
    pub fn restaurants(&self) -> Result<Vec<RestaurantRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.name, COUNT(c.id), r.created_at
             FROM restaurants r
             LEFT JOIN menu_chunks c ON c.restaurant_id = r.id
             GROUP BY r.id, r.name, r.created_at
             ORDER BY r.created_at DESC, r.id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RestaurantRow {
                id: row.get(0)?,
                name: row.get(1)?,
                chunk_count: row.get::<_, i64>(2)? as usize,
                created_at: row.get(3)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// All chunks visible in scope, without embeddings
    pub fn chunks(&self, scope: Scope) -> Result<Vec<ChunkRecord>> {
        let sql = "SELECT r.name, c.content
                   FROM menu_chunks c
                   JOIN restaurants r ON r.id = c.restaurant_id";

        let mut result = Vec::new();
        match scope {
            Scope::All => {
                let mut stmt = self.conn.prepare(&format!("{} ORDER BY c.id", sql))?;
                let rows = stmt.query_map([], |row| {
                    Ok(ChunkRecord {
                        restaurant: row.get(0)?,
                        content: row.get(1)?,
                    })
                })?;
                for row in rows {
                    result.push(row?);
                }
            }
            Scope::Restaurant(id) => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{} WHERE c.restaurant_id = ?1 ORDER BY c.id", sql))?;
                let rows = stmt.query_map(params![id], |row| {
                    Ok(ChunkRecord {
                        restaurant: row.get(0)?,
                        content: row.get(1)?,
                    })
                })?;
                for row in rows {
                    result.push(row?);
                }
            }
        }
        Ok(result)
    }

    /// Cosine-similarity search over scoped chunks.
    ///
    /// Loads every scoped embedding and scores in Rust. O(n), fine for
    /// menu-sized corpora; swap in sqlite-vec if that stops being true.
    pub fn vector_search(
        &self,
        query_embedding: &[f32],
        scope: Scope,
        limit: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>> {
        let sql = "SELECT r.name, c.content, c.embedding
                   FROM menu_chunks c
                   JOIN restaurants r ON r.id = c.restaurant_id";

        let mut scored: Vec<(ChunkRecord, f32)> = Vec::new();
        let mut push_row = |restaurant: String, content: String, blob: Vec<u8>| {
            let embedding = blob_to_embedding(&blob);
            let similarity = cosine_similarity(query_embedding, &embedding);
            scored.push((
                ChunkRecord {
                    restaurant,
                    content,
                },
                similarity,
            ));
        };

        match scope {
            Scope::All => {
                let mut stmt = self.conn.prepare(sql)?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get::<_, Vec<u8>>(2)?))
                })?;
                for row in rows {
                    let (restaurant, content, blob) = row?;
                    push_row(restaurant, content, blob);
                }
            }
            Scope::Restaurant(id) => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{} WHERE c.restaurant_id = ?1", sql))?;
                let rows = stmt.query_map(params![id], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get::<_, Vec<u8>>(2)?))
                })?;
                for row in rows {
                    let (restaurant, content, blob) = row?;
                    push_row(restaurant, content, blob);
                }
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    /// Full-text search over scoped chunks, best match first.
    ///
    /// The question is reduced to a quoted OR-query before hitting FTS5,
    /// so raw user input cannot produce a MATCH syntax error. Scores are
    /// negated bm25 values (bm25 is lower-is-better).
    pub fn fts_search(
        &self,
        question: &str,
        scope: Scope,
        limit: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>> {
        let match_query = match fts_match_query(question) {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };

        let sql = "SELECT r.name, c.content, bm25(chunks_fts) AS rank
                   FROM chunks_fts
                   JOIN menu_chunks c ON c.id = chunks_fts.rowid
                   JOIN restaurants r ON r.id = c.restaurant_id";

        let mut result = Vec::new();
        match scope {
            Scope::All => {
                let mut stmt = self.conn.prepare(&format!(
                    "{} WHERE chunks_fts MATCH ?1 ORDER BY rank LIMIT ?2",
                    sql
                ))?;
                let rows = stmt.query_map(params![match_query, limit as i64], |row| {
                    Ok((
                        ChunkRecord {
                            restaurant: row.get(0)?,
                            content: row.get(1)?,
                        },
                        -row.get::<_, f64>(2)? as f32,
                    ))
                })?;
                for row in rows {
                    result.push(row?);
                }
            }
            Scope::Restaurant(id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{} WHERE chunks_fts MATCH ?1 AND c.restaurant_id = ?2 ORDER BY rank LIMIT ?3",
                    sql
                ))?;
                let rows = stmt.query_map(params![match_query, id, limit as i64], |row| {
                    Ok((
                        ChunkRecord {
                            restaurant: row.get(0)?,
                            content: row.get(1)?,
                        },
                        -row.get::<_, f64>(2)? as f32,
                    ))
                })?;
                for row in rows {
                    result.push(row?);
                }
            }
        }
        Ok(result)
    }

    /// Delete every restaurant, chunk, and full-text row
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            DELETE FROM menu_chunks;
            DELETE FROM restaurants;
            DELETE FROM chunks_fts;
            "#,
        )?;
        Ok(())
    }

    /// Get store statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let restaurant_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM restaurants", [], |row| row.get(0))?;
        let chunk_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM menu_chunks", [], |row| row.get(0))?;

        Ok(StoreStats {
            restaurant_count: restaurant_count as usize,
            chunk_count: chunk_count as usize,
        })
    }
}

/// Reduce a free-text question to an FTS5 OR-query of quoted tokens.
/// Returns None when no alphanumeric token survives.
fn fts_match_query(question: &str) -> Option<String> {
    let tokens: Vec<String> = question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t))
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

/// Convert f32 embedding to BLOB
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

/// Convert BLOB to f32 embedding
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}
