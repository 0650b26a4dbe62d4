pub mod indexer;
pub mod posting;
