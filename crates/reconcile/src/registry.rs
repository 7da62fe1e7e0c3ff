use std::collections::HashMap;

/// Dedup key: the full message text, trimmed and case-folded.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Identity-free deduplication index mapping normalized message text to a
/// bubble id. One registry per speaker role.
///
/// Values are ids, not owned bubbles — liveness is resolved against the
/// board, so an entry whose bubble has since been detached behaves like a
/// miss and gets replaced on the next upsert.
#[derive(Debug, Default)]
pub struct ContentRegistry {
    entries: HashMap<String, String>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: String, bubble_id: String) {
        self.entries.insert(key, bubble_id);
    }

    /// Remove the mapping unconditionally. Returns the bubble id the key
    /// pointed at, if any.
    pub fn evict(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
