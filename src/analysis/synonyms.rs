use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::core::error::Result;

/// Synonym table: token → its equivalence class.
///
/// Every member of a class holds a reference to the same group, so
/// expanding by any sibling yields the identical token set.
#[derive(Debug, Default)]
pub struct Synonyms {
    entries: HashMap<String, Arc<Vec<String>>>,
}

impl Synonyms {
    pub fn empty() -> Self {
        Synonyms::default()
    }

    /// Load from a file with one equivalence class per line, tokens
    /// separated by single spaces. Tokens are lowercased on load.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut entries = HashMap::new();
        for line in BufReader::new(file).lines() {
            let line = line?.to_lowercase();
            let words: Vec<String> = line
                .split(' ')
                .filter(|w| !w.is_empty())
                .map(|w| w.to_string())
                .collect();
            if words.is_empty() {
                continue;
            }
            let group = Arc::new(words);
            for word in group.iter() {
                entries.insert(word.clone(), Arc::clone(&group));
            }
        }
        Ok(Synonyms { entries })
    }

    /// The word's equivalence class in file order, the word included.
    /// Unknown words yield an empty list.
    pub fn get_synonyms(&self, word: &str) -> Vec<String> {
        match self.entries.get(word) {
            Some(group) => group.as_ref().clone(),
            None => Vec::new(),
        }
    }

    pub fn group(&self, word: &str) -> Option<&Arc<Vec<String>>> {
        self.entries.get(word)
    }
}

impl fmt::Display for Synonyms {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let table: HashMap<&String, &Vec<String>> =
            self.entries.iter().map(|(k, v)| (k, v.as_ref())).collect();
        match serde_json::to_string(&table) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "{{}}"),
        }
    }
}
