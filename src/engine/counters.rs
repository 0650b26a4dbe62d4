use std::sync::atomic::AtomicU64;

/// Cross-shard atomic counters driving the flush barrier.
///
/// `*_requests` count what callers asked for; the matching counters count
/// what the shard workers have applied. Removals and force updates are
/// broadcast, so their applied counters advance once per shard.
#[derive(Default)]
pub struct Counters {
    pub num_indexing_requests: AtomicU64,
    pub num_removing_requests: AtomicU64,
    pub num_force_updating_requests: AtomicU64,
    pub num_documents_indexed: AtomicU64,
    pub num_documents_removed: AtomicU64,
    pub num_documents_force_updated: AtomicU64,
    pub num_token_index_added: AtomicU64,
}
