use std::any::Any;

use crate::core::types::IndexedDocument;

/// Pluggable scoring rule.
///
/// Sorting compares the first returned value, falls through to the second
/// on ties, and so on. An empty vector excludes the document from the
/// results entirely. `fields` is whatever the caller attached to the
/// document at indexing time, if anything.
pub trait ScoringCriteria: Send + Sync {
    fn score(&self, doc: &IndexedDocument, fields: Option<&(dyn Any + Send + Sync)>) -> Vec<f32>;
}

/// Score a document by its BM25 value.
pub struct RankByBm25;

impl ScoringCriteria for RankByBm25 {
    fn score(&self, doc: &IndexedDocument, _fields: Option<&(dyn Any + Send + Sync)>) -> Vec<f32> {
        vec![doc.bm25]
    }
}
