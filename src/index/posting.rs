/// One document's entry in a token's posting list.
#[derive(Debug, Clone, Default)]
pub struct Posting {
    pub doc_id: u64,
    pub frequency: f32,
    /// Byte offsets of the token in the document; empty unless the shard
    /// keeps locations.
    pub locations: Vec<usize>,
}

/// Per-token postings, kept in ascending doc ID order with at most one
/// entry per document. Every lookup algorithm relies on the ordering.
#[derive(Debug, Default)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList::default()
    }

    /// Insert a posting, replacing any existing entry for the same doc.
    pub fn add(&mut self, posting: Posting) {
        match self.postings.binary_search_by_key(&posting.doc_id, |p| p.doc_id) {
            Ok(index) => self.postings[index] = posting,
            Err(index) => self.postings.insert(index, posting),
        }
    }

    /// Remove the entry for `doc_id` if present.
    pub fn remove(&mut self, doc_id: u64) -> Option<Posting> {
        match self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(index) => Some(self.postings.remove(index)),
            Err(_) => None,
        }
    }

    pub fn get(&self, doc_id: u64) -> Option<&Posting> {
        match self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(index) => Some(&self.postings[index]),
            Err(_) => None,
        }
    }

    /// Index of the first entry with `doc_id >= key`.
    pub fn cursor_from(&self, key: u64) -> usize {
        self.postings.partition_point(|p| p.doc_id < key)
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn doc_ids(&self) -> Vec<u64> {
        self.postings.iter().map(|p| p.doc_id).collect()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
