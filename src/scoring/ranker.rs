use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::core::config::RankOptions;
use crate::core::types::{IndexedDocument, ScoredDocument, ScoringFields};

/// One ranker shard: scoring fields for the documents routed to it.
///
/// A map entry with `None` fields still marks the document as present;
/// candidates without any entry are skipped, which covers removed documents
/// whose stale lookup hits are still in flight.
pub struct Ranker {
    state: RwLock<HashMap<u64, Option<ScoringFields>>>,
}

impl Ranker {
    pub fn new() -> Self {
        Ranker { state: RwLock::new(HashMap::new()) }
    }

    pub fn add_doc(&self, doc_id: u64, fields: Option<ScoringFields>) {
        self.state.write().insert(doc_id, fields);
    }

    pub fn remove_doc(&self, doc_id: u64) {
        self.state.write().remove(&doc_id);
    }

    /// Score, filter, sort and paginate the candidates.
    ///
    /// The returned count is the number of scored (non-excluded) documents
    /// before pagination.
    pub fn rank(
        &self,
        docs: &[IndexedDocument],
        options: &RankOptions,
        count_docs_only: bool,
    ) -> (Vec<ScoredDocument>, usize) {
        let Some(criteria) = options.scoring_criteria.as_ref() else {
            return (Vec::new(), 0);
        };

        let mut output = Vec::new();
        let mut num_docs = 0;
        for doc in docs {
            // Hold the lock only for the map read; user scoring code runs
            // outside it.
            let entry = {
                let state = self.state.read();
                match state.get(&doc.doc_id) {
                    Some(fields) => fields.clone(),
                    None => continue,
                }
            };
            let scores = criteria.score(doc, entry.as_deref());
            if scores.is_empty() {
                continue;
            }
            num_docs += 1;
            if !count_docs_only {
                output.push(ScoredDocument {
                    doc_id: doc.doc_id,
                    scores,
                    token_snippet_locations: doc.token_snippet_locations.clone(),
                    token_locations: doc.token_locations.clone(),
                });
            }
        }

        if count_docs_only {
            return (output, num_docs);
        }

        output.sort_by(|a, b| compare_scored(a, b, options.reverse_order));
        let start = options.output_offset.min(output.len());
        let end = if options.max_outputs == 0 {
            output.len()
        } else {
            (start + options.max_outputs).min(output.len())
        };
        (output[start..end].to_vec(), num_docs)
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordering of scored documents: score vectors compare lexicographically
/// with higher values first (a longer vector wins over an equal prefix);
/// ties fall back to ascending doc ID in both directions so the overall
/// order is deterministic.
pub fn compare_scored(a: &ScoredDocument, b: &ScoredDocument, reverse: bool) -> Ordering {
    let by_score = score_vec_cmp(&b.scores, &a.scores);
    let by_score = if reverse { by_score.reverse() } else { by_score };
    by_score.then_with(|| a.doc_id.cmp(&b.doc_id))
}

fn score_vec_cmp(a: &[f32], b: &[f32]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.partial_cmp(y).unwrap_or(Ordering::Equal) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}
