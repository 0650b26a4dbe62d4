use std::path::PathBuf;
use std::sync::Arc;

use crate::scoring::criteria::{RankByBm25, ScoringCriteria};

/// How much information each posting carries. Fixed per shard at
/// construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    /// Postings carry doc IDs only.
    #[default]
    DocIds,
    /// Postings carry doc IDs and term frequencies.
    Frequencies,
    /// Postings carry doc IDs, frequencies and byte positions.
    Locations,
}

#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 2.0, b: 0.75 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexerOptions {
    pub index_kind: IndexKind,
    pub bm25: Bm25Params,
    /// Pending adds + removes accumulate up to this many entries before a
    /// flush is forced.
    pub doc_cache_size: usize,
}

impl IndexerOptions {
    pub(crate) fn normalize(&mut self) {
        if self.doc_cache_size == 0 {
            self.doc_cache_size = 300_000;
        }
    }
}

/// Ranking behavior for one search.
#[derive(Clone, Default)]
pub struct RankOptions {
    /// Criterion used to score candidates; falls back to the engine
    /// default when unset.
    pub scoring_criteria: Option<Arc<dyn ScoringCriteria>>,
    pub reverse_order: bool,
    /// Hits to skip in the final output.
    pub output_offset: usize,
    /// Upper bound on returned hits; 0 means unbounded.
    pub max_outputs: usize,
}

pub struct EngineOptions {
    pub num_shards: usize,
    pub num_segmenter_threads: usize,
    /// Lookup workers per shard.
    pub num_indexer_threads_per_shard: usize,
    pub num_ranker_threads_per_shard: usize,
    /// Capacity of each indexer-side queue.
    pub indexer_buffer_length: usize,
    /// Capacity of each ranker-side queue.
    pub ranker_buffer_length: usize,
    pub indexer_options: IndexerOptions,
    pub default_rank_options: RankOptions,
    /// Extra segmenter dictionaries, loaded on top of the built-in one.
    pub segmenter_dict_paths: Vec<PathBuf>,
    pub stop_token_path: Option<PathBuf>,
    pub synonym_path: Option<PathBuf>,
    /// Skip the segmenter entirely; documents must arrive pre-tokenized.
    pub not_using_segmenter: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            num_shards: 2,
            num_segmenter_threads: num_cpus::get(),
            num_indexer_threads_per_shard: 0,
            num_ranker_threads_per_shard: 0,
            indexer_buffer_length: num_cpus::get(),
            ranker_buffer_length: num_cpus::get(),
            indexer_options: IndexerOptions::default(),
            default_rank_options: RankOptions::default(),
            segmenter_dict_paths: Vec::new(),
            stop_token_path: None,
            synonym_path: None,
            not_using_segmenter: false,
        }
    }
}

impl EngineOptions {
    /// Fill zero-valued knobs with their derived defaults.
    pub(crate) fn normalize(&mut self) {
        if self.num_shards == 0 {
            self.num_shards = 2;
        }
        if self.num_segmenter_threads == 0 {
            self.num_segmenter_threads = num_cpus::get();
        }
        let per_shard = (num_cpus::get() / self.num_shards).max(1);
        if self.num_indexer_threads_per_shard == 0 {
            self.num_indexer_threads_per_shard = per_shard;
        }
        if self.num_ranker_threads_per_shard == 0 {
            self.num_ranker_threads_per_shard = per_shard;
        }
        if self.indexer_buffer_length == 0 {
            self.indexer_buffer_length = num_cpus::get();
        }
        if self.ranker_buffer_length == 0 {
            self.ranker_buffer_length = num_cpus::get();
        }
        self.indexer_options.normalize();
        if self.default_rank_options.scoring_criteria.is_none() {
            self.default_rank_options.scoring_criteria = Some(Arc::new(RankByBm25));
        }
    }
}
