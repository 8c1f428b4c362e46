//! Index keys contributed by stubs.
//!
//! Element types push `(index, key)` pairs into an [`IndexSink`]. The
//! serializer owns the sink and attributes every pair to the stub being
//! written, producing [`IndexContributions`]:
//! `index name -> multimap(key -> stub id)`.

use crate::stub::StubId;
use multimap::MultiMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Value type an index accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexValueType {
    Str,
    Int,
}

/// Named, typed index declared by an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StubIndexKey {
    pub name: &'static str,
    pub value_type: IndexValueType,
}

impl StubIndexKey {
    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            value_type: IndexValueType::Str,
        }
    }

    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            value_type: IndexValueType::Int,
        }
    }
}

/// A key stored in an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Str(Arc<str>),
    Int(i64),
}

impl IndexKey {
    pub const fn value_type(&self) -> IndexValueType {
        match self {
            Self::Str(_) => IndexValueType::Str,
            Self::Int(_) => IndexValueType::Int,
        }
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<Arc<str>> for IndexKey {
    fn from(value: Arc<str>) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for IndexKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

/// Write-only bag of index contributions for one stub.
pub trait IndexSink {
    fn occurrence(&mut self, index: &StubIndexKey, key: IndexKey);
}

/// All index contributions of one stub tree.
#[derive(Debug, Clone, Default)]
pub struct IndexContributions {
    indexes: BTreeMap<&'static str, MultiMap<IndexKey, StubId>>,
}

impl IndexContributions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink attributing every occurrence to `stub`.
    pub fn sink_for(&mut self, stub: StubId) -> StubIndexSink<'_> {
        StubIndexSink {
            contributions: self,
            stub,
        }
    }

    fn record(&mut self, index: &StubIndexKey, key: IndexKey, stub: StubId) {
        if key.value_type() != index.value_type {
            warn!(
                index = index.name,
                key = %key,
                "dropping index key of the wrong type"
            );
            return;
        }
        self.indexes.entry(index.name).or_default().insert(key, stub);
    }

    /// Stubs recorded under `key` in `index`, in contribution order.
    pub fn get(&self, index: &str, key: &IndexKey) -> &[StubId] {
        self.indexes
            .get(index)
            .and_then(|map| map.get_vec(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Names of the indexes that received at least one key.
    pub fn index_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.indexes.keys().copied()
    }

    /// Keys of one index.
    pub fn keys(&self, index: &str) -> Vec<IndexKey> {
        let mut keys: Vec<IndexKey> = self
            .indexes
            .get(index)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Every `(index, key, stub)` triple, sorted.
    pub fn triples(&self) -> Vec<(&'static str, IndexKey, StubId)> {
        let mut out = Vec::new();
        for (name, map) in &self.indexes {
            for (key, stubs) in map.iter_all() {
                for stub in stubs {
                    out.push((*name, key.clone(), *stub));
                }
            }
        }
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.indexes
            .values()
            .map(|map| map.iter_all().map(|(_, v)| v.len()).sum::<usize>())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for IndexContributions {
    fn eq(&self, other: &Self) -> bool {
        self.triples() == other.triples()
    }
}

impl Eq for IndexContributions {}

/// [`IndexSink`] bound to a single stub.
#[derive(Debug)]
pub struct StubIndexSink<'a> {
    contributions: &'a mut IndexContributions,
    stub: StubId,
}

impl IndexSink for StubIndexSink<'_> {
    fn occurrence(&mut self, index: &StubIndexKey, key: IndexKey) {
        self.contributions.record(index, key, self.stub);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NAMES: StubIndexKey = StubIndexKey::string("test.names");
    const COUNTS: StubIndexKey = StubIndexKey::int("test.counts");

    #[test]
    fn test_sink_attributes_stub() {
        let mut contributions = IndexContributions::new();
        contributions.sink_for(StubId(3)).occurrence(&NAMES, "run".into());
        contributions.sink_for(StubId(5)).occurrence(&NAMES, "run".into());
        contributions.sink_for(StubId(5)).occurrence(&COUNTS, IndexKey::Int(2));

        assert_eq!(contributions.get("test.names", &"run".into()), &[StubId(3), StubId(5)]);
        assert_eq!(contributions.get("test.counts", &IndexKey::Int(2)), &[StubId(5)]);
        assert_eq!(contributions.len(), 3);
    }

    #[test]
    fn test_wrong_key_type_is_dropped() {
        let mut contributions = IndexContributions::new();
        contributions.sink_for(StubId(1)).occurrence(&COUNTS, "oops".into());
        assert!(contributions.is_empty());
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let mut a = IndexContributions::new();
        a.sink_for(StubId(1)).occurrence(&NAMES, "x".into());
        a.sink_for(StubId(2)).occurrence(&NAMES, "y".into());

        let mut b = IndexContributions::new();
        b.sink_for(StubId(2)).occurrence(&NAMES, "y".into());
        b.sink_for(StubId(1)).occurrence(&NAMES, "x".into());

        assert_eq!(a, b);
    }
}
