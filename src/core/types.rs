use serde::{Serialize, Deserialize};
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::config::RankOptions;

/// Opaque per-document payload handed to scoring criteria.
pub type ScoringFields = Arc<dyn Any + Send + Sync>;

/// A single pre-tokenized term with its byte offsets in the original text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenData {
    pub text: String,
    pub locations: Vec<usize>,
}

/// Input payload for indexing one document.
///
/// Either `content` is segmented by the engine, or `tokens` is taken
/// verbatim when `content` is empty. `labels` must match but carry no
/// positions; `fields` is stored in the ranker for scoring criteria.
#[derive(Clone, Default)]
pub struct DocumentData {
    pub content: String,
    pub tokens: Vec<TokenData>,
    pub labels: Vec<String>,
    pub fields: Option<ScoringFields>,
}

/// One keyword of a document as seen by the indexer.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    pub text: String,
    pub frequency: f32,
    pub starts: Vec<usize>,
}

/// A fully segmented document, the unit enqueued to an indexer shard.
/// Each token appears in `keywords` at most once.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    pub doc_id: u64,
    pub token_length: f32,
    pub keywords: Vec<KeywordIndex>,
}

/// A lookup hit before ranking.
///
/// `token_locations` is the proximity-minimizing position vector, parallel
/// to the query tokens; `token_snippet_locations` holds the same positions
/// sorted ascending for highlighting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedDocument {
    pub doc_id: u64,
    pub bm25: f32,
    pub token_proximity: i32,
    pub token_snippet_locations: Vec<usize>,
    pub token_locations: Vec<usize>,
}

/// A ranked search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub doc_id: u64,
    pub scores: Vec<f32>,
    pub token_snippet_locations: Vec<usize>,
    pub token_locations: Vec<usize>,
}

#[derive(Clone, Default)]
pub struct SearchRequest {
    /// Query text, segmented by the engine (stop tokens dropped). When
    /// empty, `tokens` is used verbatim instead.
    pub text: String,
    pub tokens: Vec<String>,
    /// Tokens the document must contain but which do not participate in
    /// proximity or snippet computation.
    pub labels: Vec<String>,
    /// When set, restricts hits to this doc ID set.
    pub doc_ids: Option<HashSet<u64>>,
    /// Per-request override; unset fields fall back to the engine default.
    pub rank_options: Option<RankOptions>,
    /// Wall-clock budget in milliseconds for collecting shard responses;
    /// <= 0 waits without bound.
    pub timeout_ms: i64,
    pub count_docs_only: bool,
    /// Skip the global re-sort and pagination, returning merged per-shard
    /// output as-is.
    pub orderless: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResponse {
    /// The query tokens actually looked up.
    pub tokens: Vec<String>,
    pub docs: Vec<ScoredDocument>,
    /// Total hit count, unconstrained by pagination.
    pub num_docs: usize,
    /// True when the timeout expired before every shard answered.
    pub timeout: bool,
}
