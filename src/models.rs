//! Core data models used throughout recall.
//!
//! These types represent the documents flowing into the index and the
//! ranked results flowing back out of it.

/// A knowledge unit stored in the full-text index.
///
/// `id` is the sole identity: indexing a document whose `id` already exists
/// replaces the prior entry entirely.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Search hints from the document header; may be empty.
    pub keywords: Vec<String>,
    /// Full body text. Markup is indexed as plain text.
    pub content: String,
    /// Pre-computed short excerpt shown to users.
    pub summary: String,
}

/// A ranked search result returned from the index store.
///
/// `score` follows the SQLite `bm25()` convention: lower (more negative)
/// means more relevant. Results are ordered ascending by score and the
/// store never inverts the sign.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub score: f64,
}
