//! Identifier interning for one parse session

use dashmap::DashSet;
use std::sync::Arc;

/// Interning pool that maps source text to shared string handles.
///
/// A table is owned by one parse session. Equal identifiers interned through
/// the same table share one allocation, so stubs built from a single file do not
/// duplicate names like `value` or `String`.
#[derive(Debug, Default)]
pub struct CharTable {
    strings: DashSet<Arc<str>>,
}

impl CharTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an arbitrary string.
    pub fn intern(&self, text: &str) -> Arc<str> {
        if let Some(entry) = self.strings.get(text) {
            return Arc::clone(entry.key());
        }
        let handle: Arc<str> = Arc::from(text);
        if self.strings.insert(Arc::clone(&handle)) {
            return handle;
        }
        // Another reader inserted the same text in between; keep theirs.
        self.strings
            .get(text)
            .map(|entry| Arc::clone(entry.key()))
            .unwrap_or(handle)
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
