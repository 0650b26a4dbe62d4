use log::debug;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::core::config::{Bm25Params, IndexKind, IndexerOptions};
use crate::core::types::{DocumentIndex, IndexedDocument};
use crate::index::posting::{Posting, PostingList};

/// One shard of the inverted index.
///
/// Owns the token table and the write cache. Cache appends and flushes run
/// under the exclusive lock; lookups run under the shared lock, so a lookup
/// observes either the pre- or post-flush state, never a half-applied one.
pub struct Indexer {
    kind: IndexKind,
    bm25: Bm25Params,
    doc_cache_size: usize,
    state: RwLock<IndexerState>,
}

#[derive(Default)]
struct IndexerState {
    table: HashMap<String, PostingList>,
    /// Tokens of every currently indexed document, for remove/replace.
    doc_tokens: HashMap<u64, Vec<String>>,
    /// Token length of every currently indexed document. Its size is the
    /// shard's document count.
    doc_token_lengths: HashMap<u64, f32>,
    total_token_length: f32,
    pending_adds: Vec<DocumentIndex>,
    pending_removes: Vec<u64>,
}

impl Indexer {
    pub fn new(options: IndexerOptions) -> Self {
        let mut options = options;
        options.normalize();
        Indexer {
            kind: options.index_kind,
            bm25: options.bm25,
            doc_cache_size: options.doc_cache_size,
            state: RwLock::new(IndexerState::default()),
        }
    }

    pub fn index_kind(&self) -> IndexKind {
        self.kind
    }

    /// Queue a document for insertion. `None` (or doc ID 0) queues nothing
    /// and only matters for its `force_update` side effect.
    pub fn add_document_to_cache(&self, document: Option<DocumentIndex>, force_update: bool) {
        let mut state = self.state.write();
        if let Some(document) = document {
            if document.doc_id != 0 {
                state.pending_adds.push(document);
            }
        }
        if force_update || self.cache_full(&state) {
            Self::flush(&mut state, self.kind);
        }
    }

    /// Queue a document for removal. Doc ID 0 queues nothing and only
    /// matters for its `force_update` side effect.
    pub fn remove_document_to_cache(&self, doc_id: u64, force_update: bool) {
        let mut state = self.state.write();
        if doc_id != 0 {
            state.pending_removes.push(doc_id);
        }
        if force_update || self.cache_full(&state) {
            Self::flush(&mut state, self.kind);
        }
    }

    fn cache_full(&self, state: &IndexerState) -> bool {
        state.pending_adds.len() + state.pending_removes.len() >= self.doc_cache_size
    }

    /// Apply pending removes, then pending adds, in arrival order. An add
    /// for an already indexed doc ID purges every old posting of that doc
    /// first; the replacement is definitive.
    fn flush(state: &mut IndexerState, kind: IndexKind) {
        let removes = std::mem::take(&mut state.pending_removes);
        let adds = std::mem::take(&mut state.pending_adds);
        if removes.is_empty() && adds.is_empty() {
            return;
        }
        debug!("index flush: {} adds, {} removes", adds.len(), removes.len());

        for doc_id in removes {
            Self::purge_doc(state, doc_id);
        }

        for doc in adds {
            if state.doc_token_lengths.contains_key(&doc.doc_id) {
                Self::purge_doc(state, doc.doc_id);
            }
            let mut tokens = Vec::with_capacity(doc.keywords.len());
            for keyword in &doc.keywords {
                let posting = match kind {
                    IndexKind::DocIds => Posting {
                        doc_id: doc.doc_id,
                        frequency: 0.0,
                        locations: Vec::new(),
                    },
                    IndexKind::Frequencies => Posting {
                        doc_id: doc.doc_id,
                        frequency: keyword.frequency,
                        locations: Vec::new(),
                    },
                    IndexKind::Locations => Posting {
                        doc_id: doc.doc_id,
                        frequency: keyword.frequency,
                        locations: keyword.starts.clone(),
                    },
                };
                state
                    .table
                    .entry(keyword.text.clone())
                    .or_default()
                    .add(posting);
                tokens.push(keyword.text.clone());
            }
            state.doc_tokens.insert(doc.doc_id, tokens);
            state.doc_token_lengths.insert(doc.doc_id, doc.token_length);
            state.total_token_length += doc.token_length;
        }
    }

    /// Drop one document entirely: length bookkeeping once, then every
    /// posting it owns. Unindexed doc IDs are a no-op.
    fn purge_doc(state: &mut IndexerState, doc_id: u64) {
        let Some(token_length) = state.doc_token_lengths.remove(&doc_id) else {
            return;
        };
        state.total_token_length -= token_length;
        for token in state.doc_tokens.remove(&doc_id).unwrap_or_default() {
            if let Some(list) = state.table.get_mut(&token) {
                list.remove(doc_id);
                if list.is_empty() {
                    state.table.remove(&token);
                }
            }
        }
    }

    /// Boolean-AND lookup over `tokens` and `labels`, walking the shortest
    /// posting list and advancing the others. Candidates come out in
    /// descending doc ID order; ranking re-sorts them anyway.
    ///
    /// `labels` must match but stay out of proximity and BM25. An unknown
    /// token or label, or an empty `tokens`, yields an empty result.
    pub fn lookup(
        &self,
        tokens: &[String],
        labels: &[String],
        doc_ids: Option<&HashSet<u64>>,
        count_docs_only: bool,
    ) -> (Vec<IndexedDocument>, usize) {
        if tokens.is_empty() {
            return (Vec::new(), 0);
        }
        let state = self.state.read();

        let mut lists: Vec<&PostingList> = Vec::with_capacity(tokens.len() + labels.len());
        for text in tokens.iter().chain(labels.iter()) {
            match state.table.get(text) {
                Some(list) => lists.push(list),
                None => return (Vec::new(), 0),
            }
        }

        let mut driver = 0;
        for (i, list) in lists.iter().enumerate() {
            if list.len() < lists[driver].len() {
                driver = i;
            }
        }

        let shard_docs = state.doc_token_lengths.len();
        let avg_doc_length = if shard_docs > 0 {
            state.total_token_length / shard_docs as f32
        } else {
            0.0
        };
        let use_bm25 = self.kind != IndexKind::DocIds && avg_doc_length > 0.0;
        // idf per query token; labels carry no score weight.
        let idfs: Vec<f32> = if use_bm25 {
            (0..tokens.len())
                .map(|i| (shard_docs as f64 / lists[i].len() as f64 + 1.0).log2() as f32)
                .collect()
        } else {
            Vec::new()
        };

        let mut docs = Vec::new();
        let mut num_docs = 0;
        let mut cursors: Vec<usize> = lists.iter().map(|list| list.len()).collect();

        'candidates: for base in (0..lists[driver].len()).rev() {
            let candidate = lists[driver].postings()[base].doc_id;
            if let Some(filter) = doc_ids {
                if !filter.contains(&candidate) {
                    continue;
                }
            }

            for (i, list) in lists.iter().enumerate() {
                if i == driver {
                    cursors[i] = base + 1;
                    continue;
                }
                let mut cursor = cursors[i];
                while cursor > 0 && list.postings()[cursor - 1].doc_id > candidate {
                    cursor -= 1;
                }
                cursors[i] = cursor;
                if cursor == 0 {
                    // Nothing at or below the candidate remains; no smaller
                    // driver entry can match either.
                    break 'candidates;
                }
                if list.postings()[cursor - 1].doc_id != candidate {
                    continue 'candidates;
                }
            }

            num_docs += 1;
            if count_docs_only {
                continue;
            }

            let hit_postings: Vec<&Posting> = (0..tokens.len())
                .map(|i| &lists[i].postings()[cursors[i] - 1])
                .collect();

            let mut bm25 = 0.0f32;
            if use_bm25 {
                let doc_length = state
                    .doc_token_lengths
                    .get(&candidate)
                    .copied()
                    .unwrap_or(0.0);
                let Bm25Params { k1, b } = self.bm25;
                for (i, posting) in hit_postings.iter().enumerate() {
                    let tf = posting.frequency;
                    bm25 += idfs[i] * tf * (k1 + 1.0)
                        / (tf + k1 * (1.0 - b + b * doc_length / avg_doc_length));
                }
            }

            let (token_proximity, token_locations) = if self.kind == IndexKind::Locations {
                let location_lists: Vec<&[usize]> = hit_postings
                    .iter()
                    .map(|p| p.locations.as_slice())
                    .collect();
                let byte_lengths: Vec<usize> = tokens.iter().map(|t| t.len()).collect();
                match min_token_proximity(&location_lists, &byte_lengths) {
                    Some((proximity, locations)) => (proximity, locations),
                    None => (-1, Vec::new()),
                }
            } else {
                (0, Vec::new())
            };

            let mut token_snippet_locations = token_locations.clone();
            token_snippet_locations.sort_unstable();

            docs.push(IndexedDocument {
                doc_id: candidate,
                bm25,
                token_proximity,
                token_snippet_locations,
                token_locations,
            });
        }

        (docs, num_docs)
    }
}

/// Best alignment of one position per query token against the query token
/// order: minimizes the summed byte deviation
/// `Σ |(p[i+1] − p[i]) − byte_len(token_i)|`.
///
/// Returns `None` when any position list is empty. Among all minimizers the
/// lexicographically smallest position vector wins: the backward pass
/// computes optimal suffix costs, the forward pass then greedily takes the
/// smallest position that still achieves them.
fn min_token_proximity(
    location_lists: &[&[usize]],
    byte_lengths: &[usize],
) -> Option<(i32, Vec<usize>)> {
    if location_lists.iter().any(|locations| locations.is_empty()) {
        return None;
    }
    let count = location_lists.len();
    if count == 1 {
        return Some((0, vec![location_lists[0][0]]));
    }

    // suffix[i][j]: minimal cost of aligning tokens i.. with token i at
    // position index j.
    let mut suffix: Vec<Vec<i64>> = location_lists
        .iter()
        .map(|locations| vec![0i64; locations.len()])
        .collect();
    for i in (0..count - 1).rev() {
        for (j, &position) in location_lists[i].iter().enumerate() {
            let mut best = i64::MAX;
            for (next_j, &next_position) in location_lists[i + 1].iter().enumerate() {
                let gap = next_position as i64 - position as i64 - byte_lengths[i] as i64;
                let cost = gap.abs() + suffix[i + 1][next_j];
                if cost < best {
                    best = cost;
                }
            }
            suffix[i][j] = best;
        }
    }

    let mut total = i64::MAX;
    let mut chosen = 0;
    for (j, &cost) in suffix[0].iter().enumerate() {
        if cost < total {
            total = cost;
            chosen = j;
        }
    }

    let mut positions = Vec::with_capacity(count);
    positions.push(location_lists[0][chosen]);
    let mut current = chosen;
    for i in 0..count - 1 {
        let position = location_lists[i][current] as i64;
        let remaining = suffix[i][current];
        let mut next = 0;
        let mut found = false;
        for (next_j, &next_position) in location_lists[i + 1].iter().enumerate() {
            let gap = next_position as i64 - position - byte_lengths[i] as i64;
            if gap.abs() + suffix[i + 1][next_j] == remaining {
                next = next_j;
                found = true;
                break;
            }
        }
        debug_assert!(found);
        positions.push(location_lists[i + 1][next]);
        current = next;
    }

    Some((total as i32, positions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::KeywordIndex;

    fn keyword(text: &str, starts: &[usize]) -> KeywordIndex {
        KeywordIndex {
            text: text.to_string(),
            frequency: starts.len() as f32,
            starts: starts.to_vec(),
        }
    }

    fn doc(doc_id: u64, keywords: Vec<KeywordIndex>) -> DocumentIndex {
        DocumentIndex { doc_id, token_length: 0.0, keywords }
    }

    fn locations_indexer() -> Indexer {
        Indexer::new(IndexerOptions {
            index_kind: IndexKind::Locations,
            ..Default::default()
        })
    }

    fn doc_ids_for(indexer: &Indexer, token: &str) -> Vec<u64> {
        indexer
            .state
            .read()
            .table
            .get(token)
            .map(|list| list.doc_ids())
            .unwrap_or_default()
    }

    /// (doc_id, proximity, minimizing positions) per hit, descending doc ID.
    fn hits(
        indexer: &Indexer,
        tokens: &[&str],
        labels: &[&str],
        within: Option<&HashSet<u64>>,
    ) -> Vec<(u64, i32, Vec<usize>)> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        let (docs, _) = indexer.lookup(&tokens, &labels, within, false);
        docs.into_iter()
            .map(|d| (d.doc_id, d.token_proximity, d.token_locations))
            .collect()
    }

    fn add_corpus(indexer: &Indexer) {
        // doc1 = "token2 token3"
        indexer.add_document_to_cache(
            Some(doc(1, vec![keyword("token2", &[0]), keyword("token3", &[7])])),
            false,
        );
        // doc2 = "token1 token2 token3"
        indexer.add_document_to_cache(
            Some(doc(
                2,
                vec![
                    keyword("token1", &[0]),
                    keyword("token2", &[7]),
                    keyword("token3", &[14]),
                ],
            )),
            false,
        );
        // doc3 = "token1 token2"
        indexer.add_document_to_cache(
            Some(doc(3, vec![keyword("token1", &[0]), keyword("token2", &[7])])),
            false,
        );
        // doc4 = "token2"
        indexer.add_document_to_cache(Some(doc(4, vec![keyword("token2", &[0])])), false);
        // doc7 = "token1 token3"
        indexer.add_document_to_cache(
            Some(doc(7, vec![keyword("token1", &[0]), keyword("token3", &[7])])),
            false,
        );
        // doc9 = "token3"
        indexer.add_document_to_cache(Some(doc(9, vec![keyword("token3", &[0])])), true);
    }

    #[test]
    fn add_replaces_earlier_version() {
        let indexer = locations_indexer();
        indexer.add_document_to_cache(Some(doc(1, vec![keyword("token1", &[])])), false);
        indexer.add_document_to_cache(Some(doc(2, vec![keyword("token2", &[])])), false);
        indexer.add_document_to_cache(Some(doc(3, vec![keyword("token3", &[])])), false);
        indexer.add_document_to_cache(Some(doc(7, vec![keyword("token7", &[])])), false);
        // Replacements: doc1 now holds token2 only, doc7 token77 only.
        indexer.add_document_to_cache(Some(doc(1, vec![keyword("token2", &[])])), false);
        indexer.add_document_to_cache(Some(doc(7, vec![keyword("token77", &[])])), false);
        indexer.add_document_to_cache(None, true);

        assert!(doc_ids_for(&indexer, "token1").is_empty());
        assert_eq!(doc_ids_for(&indexer, "token2"), vec![1, 2]);
        assert_eq!(doc_ids_for(&indexer, "token3"), vec![3]);
        assert!(doc_ids_for(&indexer, "token7").is_empty());
        assert_eq!(doc_ids_for(&indexer, "token77"), vec![7]);
    }

    #[test]
    fn remove_and_reindex() {
        let indexer = locations_indexer();
        // doc1 = "token2 token3"
        indexer.add_document_to_cache(
            Some(doc(1, vec![keyword("token2", &[0]), keyword("token3", &[7])])),
            false,
        );
        // doc2 = "token1 token2"
        indexer.add_document_to_cache(
            Some(doc(2, vec![keyword("token1", &[0]), keyword("token2", &[7])])),
            true,
        );
        assert_eq!(doc_ids_for(&indexer, "token1"), vec![2]);
        assert_eq!(doc_ids_for(&indexer, "token2"), vec![1, 2]);
        assert_eq!(doc_ids_for(&indexer, "token3"), vec![1]);

        indexer.remove_document_to_cache(2, false);
        // doc1 = "token1 token3"
        indexer.add_document_to_cache(
            Some(doc(1, vec![keyword("token1", &[0]), keyword("token3", &[7])])),
            true,
        );
        assert_eq!(doc_ids_for(&indexer, "token1"), vec![1]);
        assert!(doc_ids_for(&indexer, "token2").is_empty());
        assert_eq!(doc_ids_for(&indexer, "token3"), vec![1]);

        // doc2 = "token1 token2 token3"
        indexer.add_document_to_cache(
            Some(doc(
                2,
                vec![
                    keyword("token1", &[0]),
                    keyword("token2", &[7]),
                    keyword("token3", &[14]),
                ],
            )),
            true,
        );
        assert_eq!(doc_ids_for(&indexer, "token1"), vec![1, 2]);
        assert_eq!(doc_ids_for(&indexer, "token2"), vec![2]);
        assert_eq!(doc_ids_for(&indexer, "token3"), vec![1, 2]);

        // Add doc3 and remove it in the same cache generation.
        indexer.add_document_to_cache(
            Some(doc(3, vec![keyword("token1", &[0]), keyword("token2", &[7])])),
            true,
        );
        indexer.remove_document_to_cache(3, true);
        assert_eq!(doc_ids_for(&indexer, "token1"), vec![1, 2]);
        assert_eq!(doc_ids_for(&indexer, "token2"), vec![2]);
        assert_eq!(doc_ids_for(&indexer, "token3"), vec![1, 2]);

        // doc2 shrinks to "token2 token3": token1 must not keep doc2.
        indexer.add_document_to_cache(
            Some(doc(2, vec![keyword("token2", &[0]), keyword("token3", &[7])])),
            true,
        );
        indexer.add_document_to_cache(
            Some(doc(3, vec![keyword("token1", &[0]), keyword("token2", &[7])])),
            true,
        );
        assert_eq!(doc_ids_for(&indexer, "token1"), vec![1, 3]);
        assert_eq!(doc_ids_for(&indexer, "token2"), vec![2, 3]);
        assert_eq!(doc_ids_for(&indexer, "token3"), vec![1, 2]);
    }

    #[test]
    fn lookup_locations_index() {
        let indexer = locations_indexer();
        add_corpus(&indexer);

        assert_eq!(doc_ids_for(&indexer, "token1"), vec![2, 3, 7]);
        assert_eq!(doc_ids_for(&indexer, "token2"), vec![1, 2, 3, 4]);
        assert_eq!(doc_ids_for(&indexer, "token3"), vec![1, 2, 7, 9]);

        assert!(hits(&indexer, &["token4"], &[], None).is_empty());
        assert_eq!(
            hits(&indexer, &["token1"], &[], None),
            vec![(7, 0, vec![0]), (3, 0, vec![0]), (2, 0, vec![0])]
        );
        assert!(hits(&indexer, &["token1", "token4"], &[], None).is_empty());

        assert_eq!(
            hits(&indexer, &["token1", "token2"], &[], None),
            vec![(3, 1, vec![0, 7]), (2, 1, vec![0, 7])]
        );
        assert_eq!(
            hits(&indexer, &["token2", "token1"], &[], None),
            vec![(3, 13, vec![7, 0]), (2, 13, vec![7, 0])]
        );
        assert_eq!(
            hits(&indexer, &["token1", "token3"], &[], None),
            vec![(7, 1, vec![0, 7]), (2, 8, vec![0, 14])]
        );
        assert_eq!(
            hits(&indexer, &["token3", "token1"], &[], None),
            vec![(7, 13, vec![7, 0]), (2, 20, vec![14, 0])]
        );
        assert_eq!(
            hits(&indexer, &["token2", "token3"], &[], None),
            vec![(2, 1, vec![7, 14]), (1, 1, vec![0, 7])]
        );
        assert_eq!(
            hits(&indexer, &["token3", "token2"], &[], None),
            vec![(2, 13, vec![14, 7]), (1, 13, vec![7, 0])]
        );

        assert_eq!(
            hits(&indexer, &["token1", "token2", "token3"], &[], None),
            vec![(2, 2, vec![0, 7, 14])]
        );
        assert_eq!(
            hits(&indexer, &["token3", "token2", "token1"], &[], None),
            vec![(2, 26, vec![14, 7, 0])]
        );
    }

    #[test]
    fn lookup_doc_ids_index() {
        let indexer = Indexer::new(IndexerOptions::default());
        assert_eq!(indexer.index_kind(), IndexKind::DocIds);
        add_corpus(&indexer);

        assert_eq!(
            hits(&indexer, &["token1"], &[], None),
            vec![(7, 0, vec![]), (3, 0, vec![]), (2, 0, vec![])]
        );
        assert_eq!(
            hits(&indexer, &["token2", "token3"], &[], None),
            vec![(2, 0, vec![]), (1, 0, vec![])]
        );
        assert_eq!(
            hits(&indexer, &["token3", "token2", "token1"], &[], None),
            vec![(2, 0, vec![])]
        );
        let (docs, _) = indexer.lookup(&["token1".to_string()], &[], None, false);
        assert!(docs.iter().all(|d| d.bm25 == 0.0));
    }

    #[test]
    fn lookup_with_proximity_prefers_closest_alignment() {
        let indexer = locations_indexer();

        // doc1 = "token2 token4 token4 token2 token3 token4"
        indexer.add_document_to_cache(
            Some(doc(
                1,
                vec![
                    keyword("token2", &[0, 21]),
                    keyword("token3", &[28]),
                    keyword("token4", &[7, 14, 35]),
                ],
            )),
            true,
        );
        assert_eq!(
            hits(&indexer, &["token2", "token3"], &[], None),
            vec![(1, 1, vec![21, 28])]
        );

        // doc1 = "t2 t1 . . . t2 t3"
        indexer.add_document_to_cache(
            Some(doc(
                1,
                vec![
                    keyword("t1", &[3]),
                    keyword("t2", &[0, 12]),
                    keyword("t3", &[15]),
                ],
            )),
            true,
        );
        assert_eq!(
            hits(&indexer, &["t1", "t2", "t3"], &[], None),
            vec![(1, 8, vec![3, 12, 15])]
        );

        // doc1 = "t3 t2 t1 . . . . . t2 t3"
        indexer.add_document_to_cache(
            Some(doc(
                1,
                vec![
                    keyword("t1", &[6]),
                    keyword("t2", &[3, 19]),
                    keyword("t3", &[0, 22]),
                ],
            )),
            true,
        );
        assert_eq!(
            hits(&indexer, &["t1", "t2", "t3"], &[], None),
            vec![(1, 10, vec![6, 3, 0])]
        );
    }

    #[test]
    fn labels_constrain_without_scoring() {
        let indexer = locations_indexer();
        // doc1 carries the out-of-text label "label1".
        indexer.add_document_to_cache(
            Some(doc(
                1,
                vec![
                    keyword("token2", &[0, 21]),
                    keyword("token3", &[28]),
                    keyword("label1", &[]),
                    keyword("token4", &[7, 14, 35]),
                ],
            )),
            false,
        );
        indexer.add_document_to_cache(
            Some(doc(
                2,
                vec![
                    keyword("token2", &[0, 21]),
                    keyword("token3", &[28]),
                    keyword("token4", &[7, 14, 35]),
                ],
            )),
            true,
        );

        assert_eq!(doc_ids_for(&indexer, "label1"), vec![1]);
        assert_eq!(
            hits(&indexer, &["token2", "token3"], &["label1"], None),
            vec![(1, 1, vec![21, 28])]
        );
    }

    #[test]
    fn bm25_uses_frequencies_and_lengths() {
        let indexer = Indexer::new(IndexerOptions {
            index_kind: IndexKind::Frequencies,
            bm25: Bm25Params { k1: 1.0, b: 1.0 },
            ..Default::default()
        });
        // doc1: 6 tokens, doc2: 2 tokens, so avgdl = 4.
        indexer.add_document_to_cache(
            Some(DocumentIndex {
                doc_id: 1,
                token_length: 6.0,
                keywords: vec![
                    KeywordIndex { text: "token2".into(), frequency: 3.0, starts: vec![0, 21] },
                    KeywordIndex { text: "token3".into(), frequency: 7.0, starts: vec![28] },
                    KeywordIndex { text: "token4".into(), frequency: 15.0, starts: vec![7, 14, 35] },
                ],
            }),
            false,
        );
        indexer.add_document_to_cache(
            Some(DocumentIndex {
                doc_id: 2,
                token_length: 2.0,
                keywords: vec![
                    KeywordIndex { text: "token6".into(), frequency: 3.0, starts: vec![0] },
                    KeywordIndex { text: "token7".into(), frequency: 15.0, starts: vec![7] },
                ],
            }),
            true,
        );

        let (docs, _) = indexer.lookup(
            &["token2".into(), "token3".into(), "token4".into()],
            &[],
            None,
            false,
        );
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].doc_id, 1);
        // log2(3) * (12/9 + 28/17 + 60/33)
        assert!((docs[0].bm25 - 7.6055).abs() < 1e-4);
        assert!(docs[0].token_locations.is_empty());
    }

    #[test]
    fn lookup_within_doc_id_set() {
        let indexer = locations_indexer();
        add_corpus(&indexer);

        let within: HashSet<u64> = [1, 3].into_iter().collect();
        assert_eq!(
            hits(&indexer, &["token2"], &[], Some(&within)),
            vec![(3, 0, vec![7]), (1, 0, vec![0])]
        );
    }

    #[test]
    fn replace_purges_stale_postings() {
        let indexer = locations_indexer();
        indexer.add_document_to_cache(
            Some(doc(
                1,
                vec![
                    keyword("token2", &[0, 21]),
                    keyword("token3", &[28]),
                    keyword("token4", &[7, 14, 35]),
                ],
            )),
            true,
        );
        indexer.add_document_to_cache(
            Some(doc(
                2,
                vec![
                    keyword("token3", &[0, 21]),
                    keyword("token5", &[28]),
                    keyword("token2", &[7, 14, 35]),
                ],
            )),
            true,
        );

        indexer.remove_document_to_cache(2, true);
        assert_eq!(
            hits(&indexer, &["token2", "token3"], &[], None),
            vec![(1, 1, vec![21, 28])]
        );
        assert!(doc_ids_for(&indexer, "token5").is_empty());
    }

    #[test]
    fn counters_stay_consistent() {
        let indexer = locations_indexer();
        indexer.add_document_to_cache(
            Some(DocumentIndex {
                doc_id: 1,
                token_length: 3.0,
                keywords: vec![keyword("a", &[0]), keyword("b", &[2])],
            }),
            false,
        );
        indexer.add_document_to_cache(
            Some(DocumentIndex {
                doc_id: 2,
                token_length: 5.0,
                keywords: vec![keyword("b", &[0])],
            }),
            true,
        );
        {
            let state = indexer.state.read();
            assert_eq!(state.doc_token_lengths.len(), 2);
            assert_eq!(state.total_token_length, 8.0);
        }

        // Replacing doc 1 with a shorter version updates both counters.
        indexer.add_document_to_cache(
            Some(DocumentIndex {
                doc_id: 1,
                token_length: 1.0,
                keywords: vec![keyword("c", &[0])],
            }),
            true,
        );
        {
            let state = indexer.state.read();
            assert_eq!(state.doc_token_lengths.len(), 2);
            assert_eq!(state.total_token_length, 6.0);
        }

        indexer.remove_document_to_cache(1, true);
        indexer.remove_document_to_cache(42, true); // unindexed: no-op
        let state = indexer.state.read();
        assert_eq!(state.doc_token_lengths.len(), 1);
        assert_eq!(state.total_token_length, 5.0);
        assert!(!state.table.contains_key("c"));
    }

    #[test]
    fn empty_and_counting_queries() {
        let indexer = locations_indexer();
        add_corpus(&indexer);

        let (docs, count) = indexer.lookup(&[], &[], None, false);
        assert!(docs.is_empty());
        assert_eq!(count, 0);

        let (docs, count) = indexer.lookup(
            &["token2".to_string(), "token3".to_string()],
            &[],
            None,
            true,
        );
        assert!(docs.is_empty());
        assert_eq!(count, 2);
    }
}
