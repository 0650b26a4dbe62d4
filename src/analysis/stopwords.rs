use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::error::Result;

/// Membership set of tokens dropped during segmented ingestion and query
/// segmentation. Caller-supplied token lists bypass this set.
#[derive(Debug, Default)]
pub struct StopTokens {
    tokens: HashSet<String>,
}

impl StopTokens {
    pub fn empty() -> Self {
        StopTokens::default()
    }

    /// Load from a one-token-per-line UTF-8 file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut tokens = HashSet::new();
        for line in BufReader::new(file).lines() {
            let token = line?;
            let token = token.trim();
            if !token.is_empty() {
                tokens.insert(token.to_string());
            }
        }
        Ok(StopTokens { tokens })
    }

    pub fn is_stop_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
