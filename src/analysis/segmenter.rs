use jieba_rs::{Jieba, TokenizeMode};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::core::error::Result;

/// A segment of the input text with its starting byte offset.
#[derive(Debug, Clone)]
pub struct SegmentedToken {
    pub text: String,
    pub start: usize,
}

/// Chinese word segmenter backed by jieba.
///
/// Indexing uses search mode (overlapping segments so long words are also
/// findable by their parts); queries use precise mode.
pub struct Segmenter {
    jieba: Jieba,
}

impl Segmenter {
    pub fn new() -> Self {
        Segmenter { jieba: Jieba::new() }
    }

    /// Load an extra dictionary on top of the built-in one.
    pub fn load_dictionary<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path.as_ref())?;
        self.jieba.load_dict(&mut BufReader::new(file))?;
        Ok(())
    }

    pub fn segment_index(&self, text: &str) -> Vec<SegmentedToken> {
        self.tokenize(text, TokenizeMode::Search)
    }

    pub fn segment_query(&self, text: &str) -> Vec<SegmentedToken> {
        self.tokenize(text, TokenizeMode::Default)
    }

    fn tokenize(&self, text: &str, mode: TokenizeMode) -> Vec<SegmentedToken> {
        // jieba reports char offsets; postings store byte offsets.
        let byte_offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        self.jieba
            .tokenize(text, mode, true)
            .into_iter()
            .map(|token| SegmentedToken {
                text: token.word.to_string(),
                start: byte_offsets[token.start],
            })
            .collect()
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_segmentation_reports_byte_offsets() {
        let segmenter = Segmenter::new();
        let tokens = segmenter.segment_query("中国人口");
        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["中国", "人口"]);
        assert_eq!(tokens[0].start, 0);
        // "中国" is six bytes of UTF-8.
        assert_eq!(tokens[1].start, 6);
    }

    #[test]
    fn index_segmentation_covers_query_tokens() {
        let segmenter = Segmenter::new();
        let indexed: Vec<String> = segmenter
            .segment_index("中国人口")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert!(indexed.contains(&"中国".to_string()));
        assert!(indexed.contains(&"人口".to_string()));
    }
}
