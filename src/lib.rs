pub mod analysis;
pub mod core;
pub mod engine;
pub mod index;
pub mod scoring;

pub use crate::core::config::{Bm25Params, EngineOptions, IndexKind, IndexerOptions, RankOptions};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{
    DocumentData, ScoredDocument, SearchRequest, SearchResponse, TokenData,
};
pub use crate::engine::engine::Engine;
pub use crate::scoring::criteria::{RankByBm25, ScoringCriteria};
