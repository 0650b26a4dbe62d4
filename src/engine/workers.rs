use crossbeam::channel::{Receiver, Sender};
use crossbeam::select;
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::analysis::segmenter::Segmenter;
use crate::analysis::stopwords::StopTokens;
use crate::analysis::synonyms::Synonyms;
use crate::core::types::{DocumentIndex, KeywordIndex};
use crate::engine::counters::Counters;
use crate::engine::requests::{
    IndexerAddRequest, IndexerLookupRequest, IndexerRemoveRequest, RankerAddRequest,
    RankerRankRequest, RankerRemoveRequest, RankerReturn, SegmenterRequest,
};
use crate::index::indexer::Indexer;
use crate::scoring::ranker::Ranker;

/// Everything a segmenter worker needs; cloned once per worker thread.
#[derive(Clone)]
pub(crate) struct SegmenterContext {
    pub shutdown_rx: Receiver<()>,
    pub requests_rx: Receiver<SegmenterRequest>,
    pub indexer_add_txs: Vec<Sender<IndexerAddRequest>>,
    pub ranker_add_txs: Vec<Sender<RankerAddRequest>>,
    pub segmenter: Option<Arc<Segmenter>>,
    pub stop_tokens: Arc<StopTokens>,
    pub synonyms: Arc<Synonyms>,
}

pub(crate) fn segmenter_worker(ctx: SegmenterContext) {
    loop {
        select! {
            recv(ctx.shutdown_rx) -> _ => return,
            recv(ctx.requests_rx) -> msg => match msg {
                Ok(request) => handle_segmenter_request(&ctx, request),
                Err(_) => return,
            },
        }
    }
}

fn handle_segmenter_request(ctx: &SegmenterContext, request: SegmenterRequest) {
    let num_shards = ctx.indexer_add_txs.len();

    // Doc ID 0 is the flush sentinel: broadcast a bare force-update marker
    // to every shard and nothing else.
    if request.doc_id == 0 {
        if request.force_update {
            for tx in &ctx.indexer_add_txs {
                let _ = tx.send(IndexerAddRequest { document: None, force_update: true });
            }
        }
        return;
    }

    let shard = request.hash as usize % num_shards;
    let mut tokens_map: HashMap<String, Vec<usize>> = HashMap::new();
    let mut num_tokens = 0usize;
    match &ctx.segmenter {
        Some(segmenter) if !request.data.content.is_empty() => {
            for token in segmenter.segment_index(&request.data.content) {
                if ctx.stop_tokens.is_stop_token(&token.text) {
                    continue;
                }
                tokens_map.entry(token.text).or_default().push(token.start);
                num_tokens += 1;
            }
        }
        _ => {
            // Caller-supplied tokens bypass the segmenter and the stop set.
            for token in &request.data.tokens {
                tokens_map.insert(token.text.clone(), token.locations.clone());
            }
            num_tokens = request.data.tokens.len();
        }
    }

    // Synonym aliasing: every sibling inherits the original token's
    // positions, so a query by any group member finds the document.
    let originals: Vec<(String, Vec<usize>)> = tokens_map
        .iter()
        .map(|(token, positions)| (token.clone(), positions.clone()))
        .collect();
    for (token, positions) in originals {
        if let Some(group) = ctx.synonyms.group(&token) {
            for sibling in group.iter() {
                if sibling != &token {
                    tokens_map.insert(sibling.clone(), positions.clone());
                }
            }
            num_tokens += group.len() - 1;
        }
    }

    // Labels match like tokens but carry no positions. A label already in
    // the text keeps its position information.
    for label in &request.data.labels {
        if tokens_map.contains_key(label) {
            continue;
        }
        if ctx.segmenter.is_some() && ctx.stop_tokens.is_stop_token(label) {
            continue;
        }
        tokens_map.insert(label.clone(), Vec::new());
    }

    let keywords: Vec<KeywordIndex> = tokens_map
        .into_iter()
        .map(|(text, starts)| KeywordIndex {
            frequency: starts.len() as f32,
            text,
            starts,
        })
        .collect();
    let document = DocumentIndex {
        doc_id: request.doc_id,
        token_length: num_tokens as f32,
        keywords,
    };

    if ctx.indexer_add_txs[shard]
        .send(IndexerAddRequest { document: Some(document), force_update: request.force_update })
        .is_err()
    {
        warn!("indexer add queue for shard {} is closed", shard);
        return;
    }
    if request.force_update {
        for (i, tx) in ctx.indexer_add_txs.iter().enumerate() {
            if i == shard {
                continue;
            }
            let _ = tx.send(IndexerAddRequest { document: None, force_update: true });
        }
    }
    let _ = ctx.ranker_add_txs[shard].send(RankerAddRequest {
        doc_id: request.doc_id,
        fields: request.data.fields,
    });
}

pub(crate) fn indexer_add_worker(
    shutdown_rx: Receiver<()>,
    requests_rx: Receiver<IndexerAddRequest>,
    indexer: Arc<Indexer>,
    counters: Arc<Counters>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => return,
            recv(requests_rx) -> msg => match msg {
                Ok(request) => {
                    let keyword_count = request
                        .document
                        .as_ref()
                        .map(|doc| doc.keywords.len() as u64);
                    indexer.add_document_to_cache(request.document, request.force_update);
                    if let Some(keyword_count) = keyword_count {
                        counters
                            .num_token_index_added
                            .fetch_add(keyword_count, Ordering::SeqCst);
                        counters.num_documents_indexed.fetch_add(1, Ordering::SeqCst);
                    }
                    if request.force_update {
                        counters
                            .num_documents_force_updated
                            .fetch_add(1, Ordering::SeqCst);
                    }
                }
                Err(_) => return,
            },
        }
    }
}

pub(crate) fn indexer_remove_worker(
    shutdown_rx: Receiver<()>,
    requests_rx: Receiver<IndexerRemoveRequest>,
    indexer: Arc<Indexer>,
    counters: Arc<Counters>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => return,
            recv(requests_rx) -> msg => match msg {
                Ok(request) => {
                    indexer.remove_document_to_cache(request.doc_id, request.force_update);
                    if request.doc_id != 0 {
                        counters.num_documents_removed.fetch_add(1, Ordering::SeqCst);
                    }
                    if request.force_update {
                        counters
                            .num_documents_force_updated
                            .fetch_add(1, Ordering::SeqCst);
                    }
                }
                Err(_) => return,
            },
        }
    }
}

pub(crate) fn indexer_lookup_worker(
    shutdown_rx: Receiver<()>,
    requests_rx: Receiver<IndexerLookupRequest>,
    indexer: Arc<Indexer>,
    ranker_rank_tx: Sender<RankerRankRequest>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => return,
            recv(requests_rx) -> msg => match msg {
                Ok(request) => handle_lookup_request(&indexer, &ranker_rank_tx, request),
                Err(_) => return,
            },
        }
    }
}

fn handle_lookup_request(
    indexer: &Indexer,
    ranker_rank_tx: &Sender<RankerRankRequest>,
    request: IndexerLookupRequest,
) {
    let (docs, num_docs) = indexer.lookup(
        &request.tokens,
        &request.labels,
        request.doc_ids.as_ref(),
        request.count_docs_only,
    );
    // Nothing to score: answer the query directly.
    if docs.is_empty() || request.count_docs_only {
        let _ = request
            .return_tx
            .send(RankerReturn { docs: Vec::new(), num_docs });
        return;
    }
    let _ = ranker_rank_tx.send(RankerRankRequest {
        docs,
        options: request.options,
        count_docs_only: request.count_docs_only,
        return_tx: request.return_tx,
    });
}

pub(crate) fn ranker_add_worker(
    shutdown_rx: Receiver<()>,
    requests_rx: Receiver<RankerAddRequest>,
    ranker: Arc<Ranker>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => return,
            recv(requests_rx) -> msg => match msg {
                Ok(request) => ranker.add_doc(request.doc_id, request.fields),
                Err(_) => return,
            },
        }
    }
}

pub(crate) fn ranker_rank_worker(
    shutdown_rx: Receiver<()>,
    requests_rx: Receiver<RankerRankRequest>,
    ranker: Arc<Ranker>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => return,
            recv(requests_rx) -> msg => match msg {
                Ok(mut request) => {
                    // Each shard returns enough hits to cover the global
                    // offset; the engine re-applies it after the merge.
                    if request.options.max_outputs != 0 {
                        request.options.max_outputs += request.options.output_offset;
                    }
                    request.options.output_offset = 0;
                    let (docs, num_docs) =
                        ranker.rank(&request.docs, &request.options, request.count_docs_only);
                    let _ = request.return_tx.send(RankerReturn { docs, num_docs });
                }
                Err(_) => return,
            },
        }
    }
}

pub(crate) fn ranker_remove_worker(
    shutdown_rx: Receiver<()>,
    requests_rx: Receiver<RankerRemoveRequest>,
    ranker: Arc<Ranker>,
) {
    loop {
        select! {
            recv(shutdown_rx) -> _ => return,
            recv(requests_rx) -> msg => match msg {
                Ok(request) => ranker.remove_doc(request.doc_id),
                Err(_) => return,
            },
        }
    }
}
