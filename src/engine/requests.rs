use crossbeam::channel::Sender;
use std::collections::HashSet;

use crate::core::config::RankOptions;
use crate::core::types::{
    DocumentData, DocumentIndex, IndexedDocument, ScoredDocument, ScoringFields,
};

pub(crate) struct SegmenterRequest {
    pub doc_id: u64,
    pub hash: u32,
    pub data: DocumentData,
    pub force_update: bool,
}

pub(crate) struct IndexerAddRequest {
    /// `None` is a bare force-update marker.
    pub document: Option<DocumentIndex>,
    pub force_update: bool,
}

pub(crate) struct IndexerRemoveRequest {
    pub doc_id: u64,
    pub force_update: bool,
}

pub(crate) struct IndexerLookupRequest {
    pub tokens: Vec<String>,
    pub labels: Vec<String>,
    pub doc_ids: Option<HashSet<u64>>,
    pub options: RankOptions,
    pub count_docs_only: bool,
    pub return_tx: Sender<RankerReturn>,
}

pub(crate) struct RankerAddRequest {
    pub doc_id: u64,
    pub fields: Option<ScoringFields>,
}

pub(crate) struct RankerRankRequest {
    pub docs: Vec<IndexedDocument>,
    pub options: RankOptions,
    pub count_docs_only: bool,
    pub return_tx: Sender<RankerReturn>,
}

pub(crate) struct RankerRemoveRequest {
    pub doc_id: u64,
}

pub(crate) struct RankerReturn {
    pub docs: Vec<ScoredDocument>,
    pub num_docs: usize,
}
