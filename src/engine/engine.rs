use crossbeam::channel::{Receiver, Sender, bounded};
use log::info;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use crate::analysis::segmenter::Segmenter;
use crate::analysis::stopwords::StopTokens;
use crate::analysis::synonyms::Synonyms;
use crate::core::config::{EngineOptions, RankOptions};
use crate::core::types::{DocumentData, ScoredDocument, SearchRequest, SearchResponse};
use crate::engine::counters::Counters;
use crate::engine::requests::{
    IndexerLookupRequest, IndexerRemoveRequest, RankerRemoveRequest, RankerReturn,
    SegmenterRequest,
};
use crate::engine::workers::{
    SegmenterContext, indexer_add_worker, indexer_lookup_worker, indexer_remove_worker,
    ranker_add_worker, ranker_rank_worker, ranker_remove_worker, segmenter_worker,
};
use crate::index::indexer::Indexer;
use crate::scoring::ranker::{Ranker, compare_scored};

/// Sharded search engine: segmentation, indexing, removal, lookup, ranking
/// and merging connected by bounded queues over per-shard worker pools.
///
/// Construction spawns every worker, so a constructed engine is always
/// usable; loader failures are fatal configuration faults and panic.
/// Indexing and removal are asynchronous: call `flush_index` before
/// `search` to read your own writes.
pub struct Engine {
    options: EngineOptions,
    counters: Arc<Counters>,
    segmenter: Option<Arc<Segmenter>>,
    stop_tokens: Arc<StopTokens>,
    synonyms: Arc<Synonyms>,
    segmenter_tx: Sender<SegmenterRequest>,
    indexer_remove_txs: Vec<Sender<IndexerRemoveRequest>>,
    indexer_lookup_txs: Vec<Sender<IndexerLookupRequest>>,
    ranker_remove_txs: Vec<Sender<RankerRemoveRequest>>,
    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        let mut options = options;
        options.normalize();

        let (segmenter, stop_tokens, synonyms) = if options.not_using_segmenter {
            (None, StopTokens::empty(), Synonyms::empty())
        } else {
            let mut segmenter = Segmenter::new();
            for path in &options.segmenter_dict_paths {
                segmenter.load_dictionary(path).unwrap_or_else(|err| {
                    panic!("cannot load segmenter dictionary {}: {}", path.display(), err)
                });
            }
            let stop_tokens = match &options.stop_token_path {
                Some(path) => StopTokens::from_file(path).unwrap_or_else(|err| {
                    panic!("cannot load stop token file {}: {}", path.display(), err)
                }),
                None => StopTokens::empty(),
            };
            let synonyms = match &options.synonym_path {
                Some(path) => Synonyms::from_file(path).unwrap_or_else(|err| {
                    panic!("cannot load synonym file {}: {}", path.display(), err)
                }),
                None => Synonyms::empty(),
            };
            (Some(Arc::new(segmenter)), stop_tokens, synonyms)
        };
        let stop_tokens = Arc::new(stop_tokens);
        let synonyms = Arc::new(synonyms);
        let counters = Arc::new(Counters::default());

        let num_shards = options.num_shards;
        let indexers: Vec<Arc<Indexer>> = (0..num_shards)
            .map(|_| Arc::new(Indexer::new(options.indexer_options.clone())))
            .collect();
        let rankers: Vec<Arc<Ranker>> = (0..num_shards).map(|_| Arc::new(Ranker::new())).collect();

        let (segmenter_tx, segmenter_rx) = bounded(options.num_segmenter_threads);
        let mut indexer_add_txs = Vec::with_capacity(num_shards);
        let mut indexer_add_rxs = Vec::with_capacity(num_shards);
        let mut indexer_remove_txs = Vec::with_capacity(num_shards);
        let mut indexer_remove_rxs = Vec::with_capacity(num_shards);
        let mut indexer_lookup_txs = Vec::with_capacity(num_shards);
        let mut indexer_lookup_rxs = Vec::with_capacity(num_shards);
        for _ in 0..num_shards {
            let (tx, rx) = bounded(options.indexer_buffer_length);
            indexer_add_txs.push(tx);
            indexer_add_rxs.push(rx);
            let (tx, rx) = bounded(options.indexer_buffer_length);
            indexer_remove_txs.push(tx);
            indexer_remove_rxs.push(rx);
            let (tx, rx) = bounded(options.indexer_buffer_length);
            indexer_lookup_txs.push(tx);
            indexer_lookup_rxs.push(rx);
        }
        let mut ranker_add_txs = Vec::with_capacity(num_shards);
        let mut ranker_add_rxs = Vec::with_capacity(num_shards);
        let mut ranker_rank_txs = Vec::with_capacity(num_shards);
        let mut ranker_rank_rxs = Vec::with_capacity(num_shards);
        let mut ranker_remove_txs = Vec::with_capacity(num_shards);
        let mut ranker_remove_rxs = Vec::with_capacity(num_shards);
        for _ in 0..num_shards {
            let (tx, rx) = bounded(options.ranker_buffer_length);
            ranker_add_txs.push(tx);
            ranker_add_rxs.push(rx);
            let (tx, rx) = bounded(options.ranker_buffer_length);
            ranker_rank_txs.push(tx);
            ranker_rank_rxs.push(rx);
            let (tx, rx) = bounded(options.ranker_buffer_length);
            ranker_remove_txs.push(tx);
            ranker_remove_rxs.push(rx);
        }

        let (shutdown_tx, shutdown_rx) =
            bounded(options.num_segmenter_threads + 6 * num_shards);

        for _ in 0..options.num_segmenter_threads {
            let ctx = SegmenterContext {
                shutdown_rx: shutdown_rx.clone(),
                requests_rx: segmenter_rx.clone(),
                indexer_add_txs: indexer_add_txs.clone(),
                ranker_add_txs: ranker_add_txs.clone(),
                segmenter: segmenter.clone(),
                stop_tokens: Arc::clone(&stop_tokens),
                synonyms: Arc::clone(&synonyms),
            };
            thread::spawn(move || segmenter_worker(ctx));
        }

        for shard in 0..num_shards {
            {
                let (shutdown, rx) = (shutdown_rx.clone(), indexer_add_rxs[shard].clone());
                let (indexer, counters) = (Arc::clone(&indexers[shard]), Arc::clone(&counters));
                thread::spawn(move || indexer_add_worker(shutdown, rx, indexer, counters));
            }
            {
                let (shutdown, rx) = (shutdown_rx.clone(), indexer_remove_rxs[shard].clone());
                let (indexer, counters) = (Arc::clone(&indexers[shard]), Arc::clone(&counters));
                thread::spawn(move || indexer_remove_worker(shutdown, rx, indexer, counters));
            }
            {
                let (shutdown, rx) = (shutdown_rx.clone(), ranker_add_rxs[shard].clone());
                let ranker = Arc::clone(&rankers[shard]);
                thread::spawn(move || ranker_add_worker(shutdown, rx, ranker));
            }
            {
                let (shutdown, rx) = (shutdown_rx.clone(), ranker_remove_rxs[shard].clone());
                let ranker = Arc::clone(&rankers[shard]);
                thread::spawn(move || ranker_remove_worker(shutdown, rx, ranker));
            }
            for _ in 0..options.num_indexer_threads_per_shard {
                let (shutdown, rx) = (shutdown_rx.clone(), indexer_lookup_rxs[shard].clone());
                let indexer = Arc::clone(&indexers[shard]);
                let rank_tx = ranker_rank_txs[shard].clone();
                thread::spawn(move || indexer_lookup_worker(shutdown, rx, indexer, rank_tx));
            }
            for _ in 0..options.num_ranker_threads_per_shard {
                let (shutdown, rx) = (shutdown_rx.clone(), ranker_rank_rxs[shard].clone());
                let ranker = Arc::clone(&rankers[shard]);
                thread::spawn(move || ranker_rank_worker(shutdown, rx, ranker));
            }
        }

        info!(
            "engine started: {} shards, {} segmenter threads",
            num_shards, options.num_segmenter_threads
        );

        Engine {
            options,
            counters,
            segmenter,
            stop_tokens,
            synonyms,
            segmenter_tx,
            indexer_remove_txs,
            indexer_lookup_txs,
            ranker_remove_txs,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Queue a document for (re-)indexing. Doc ID 0 is reserved for the
    /// flush sentinel. Asynchronous: the document becomes searchable only
    /// once its shard's cache flushes; blocks when queues are full.
    pub fn index_document(&self, doc_id: u64, data: DocumentData, force_update: bool) {
        if doc_id != 0 {
            self.counters
                .num_indexing_requests
                .fetch_add(1, Ordering::SeqCst);
        }
        if force_update {
            self.counters
                .num_force_updating_requests
                .fetch_add(1, Ordering::SeqCst);
        }
        let hash = crc32fast::hash(format!("{}{}", doc_id, data.content).as_bytes());
        let _ = self.segmenter_tx.send(SegmenterRequest {
            doc_id,
            hash,
            data,
            force_update,
        });
    }

    /// Queue a document for removal on every shard (the engine does not
    /// track which shard holds it). Doc ID 0 is a flush-only broadcast.
    pub fn remove_document(&self, doc_id: u64, force_update: bool) {
        if doc_id != 0 {
            self.counters
                .num_removing_requests
                .fetch_add(1, Ordering::SeqCst);
        }
        if force_update {
            self.counters
                .num_force_updating_requests
                .fetch_add(1, Ordering::SeqCst);
        }
        for shard in 0..self.options.num_shards {
            let _ = self.indexer_remove_txs[shard]
                .send(IndexerRemoveRequest { doc_id, force_update });
            if doc_id == 0 {
                continue;
            }
            let _ = self.ranker_remove_txs[shard].send(RankerRemoveRequest { doc_id });
        }
    }

    /// Fan a lookup out to every shard, collect ranked shard results and
    /// merge them. With a positive `timeout_ms`, whatever arrived by the
    /// deadline is returned with `timeout = true`.
    pub fn search(&self, request: SearchRequest) -> SearchResponse {
        let mut rank_options = match request.rank_options {
            Some(options) => options,
            None => self.options.default_rank_options.clone(),
        };
        if rank_options.scoring_criteria.is_none() {
            rank_options.scoring_criteria = self
                .options
                .default_rank_options
                .scoring_criteria
                .clone();
        }

        let tokens: Vec<String> = match &self.segmenter {
            Some(segmenter) if !request.text.is_empty() => segmenter
                .segment_query(&request.text)
                .into_iter()
                .filter(|token| !self.stop_tokens.is_stop_token(&token.text))
                .map(|token| token.text)
                .collect(),
            _ => request.tokens.clone(),
        };

        let (return_tx, return_rx) = bounded(self.options.num_shards);
        for shard in 0..self.options.num_shards {
            let _ = self.indexer_lookup_txs[shard].send(IndexerLookupRequest {
                tokens: tokens.clone(),
                labels: request.labels.clone(),
                doc_ids: request.doc_ids.clone(),
                options: rank_options.clone(),
                count_docs_only: request.count_docs_only,
                return_tx: return_tx.clone(),
            });
        }

        let mut merged: Vec<ScoredDocument> = Vec::new();
        let mut num_docs = 0;
        let mut timeout = false;
        if request.timeout_ms <= 0 {
            for _ in 0..self.options.num_shards {
                match return_rx.recv() {
                    Ok(RankerReturn { docs, num_docs: shard_docs }) => {
                        if !request.count_docs_only {
                            merged.extend(docs);
                        }
                        num_docs += shard_docs;
                    }
                    Err(_) => break,
                }
            }
        } else {
            let deadline = Instant::now() + Duration::from_millis(request.timeout_ms as u64);
            for _ in 0..self.options.num_shards {
                match return_rx.recv_deadline(deadline) {
                    Ok(RankerReturn { docs, num_docs: shard_docs }) => {
                        if !request.count_docs_only {
                            merged.extend(docs);
                        }
                        num_docs += shard_docs;
                    }
                    Err(_) => {
                        timeout = true;
                        break;
                    }
                }
            }
        }

        if !request.count_docs_only && !request.orderless {
            merged.sort_by(|a, b| compare_scored(a, b, rank_options.reverse_order));
        }

        let docs = if request.count_docs_only {
            Vec::new()
        } else if request.orderless {
            // No pagination either: the caller gets the raw merge.
            merged
        } else {
            let start = rank_options.output_offset.min(merged.len());
            let end = if rank_options.max_outputs == 0 {
                merged.len()
            } else {
                (start + rank_options.max_outputs).min(merged.len())
            };
            merged[start..end].to_vec()
        };

        SearchResponse { tokens, docs, num_docs, timeout }
    }

    /// Block until every queued add and remove has reached its shard cache,
    /// then force-flush every shard and wait for the flushes to apply.
    /// After it returns, `search` observes all prior writes.
    pub fn flush_index(&self) {
        let num_shards = self.options.num_shards as u64;
        loop {
            thread::yield_now();
            let indexing_done = self.counters.num_indexing_requests.load(Ordering::SeqCst)
                == self.counters.num_documents_indexed.load(Ordering::SeqCst);
            let removing_done = self.counters.num_removing_requests.load(Ordering::SeqCst)
                * num_shards
                == self.counters.num_documents_removed.load(Ordering::SeqCst);
            if indexing_done && removing_done {
                break;
            }
        }
        // The sentinel is the last request: once it has been force-applied
        // on every shard, everything before it has too.
        self.index_document(0, DocumentData::default(), true);
        loop {
            thread::yield_now();
            if self
                .counters
                .num_force_updating_requests
                .load(Ordering::SeqCst)
                * num_shards
                == self
                    .counters
                    .num_documents_force_updated
                    .load(Ordering::SeqCst)
            {
                return;
            }
        }
    }

    /// Signal every worker to exit and wait until all shutdown tokens have
    /// been consumed. Irrevocable; in-flight work finishes, queued work is
    /// dropped. Call `flush_index` first in normal use.
    pub fn shutdown(&self) {
        let total = self.options.num_segmenter_threads + 6 * self.options.num_shards;
        for _ in 0..total {
            let _ = self.shutdown_tx.send(());
        }
        while !self.shutdown_rx.is_empty() {
            thread::yield_now();
        }
        info!("engine stopped");
    }

    /// Segment `text` the way a query is segmented (stop tokens dropped).
    /// With `include_synonyms`, each token is followed by its synonym
    /// group siblings. Empty when the engine runs without a segmenter.
    pub fn segment(&self, text: &str, include_synonyms: bool) -> Vec<String> {
        let Some(segmenter) = &self.segmenter else {
            return Vec::new();
        };
        let mut output = Vec::new();
        for token in segmenter.segment_query(text) {
            if self.stop_tokens.is_stop_token(&token.text) {
                continue;
            }
            if include_synonyms {
                if let Some(group) = self.synonyms.group(&token.text) {
                    output.push(token.text.clone());
                    for sibling in group.iter() {
                        if sibling != &token.text {
                            output.push(sibling.clone());
                        }
                    }
                    continue;
                }
            }
            output.push(token.text);
        }
        output
    }

    /// Keywords handed to the indexers so far (adds only, for sync checks).
    pub fn num_token_index_added(&self) -> u64 {
        self.counters.num_token_index_added.load(Ordering::SeqCst)
    }

    /// Documents handed to the indexers so far.
    pub fn num_documents_indexed(&self) -> u64 {
        self.counters.num_documents_indexed.load(Ordering::SeqCst)
    }

    /// Per-shard remove applications so far.
    pub fn num_documents_removed(&self) -> u64 {
        self.counters.num_documents_removed.load(Ordering::SeqCst)
    }
}
