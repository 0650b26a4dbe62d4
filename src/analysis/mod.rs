pub mod segmenter;
pub mod stopwords;
pub mod synonyms;
