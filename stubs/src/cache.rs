//! LRU cache for built stub trees with size-based eviction

use crate::index::IndexContributions;
use crate::stub::StubTree;
use lru::LruCache;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

/// sha256 of a source file.
pub type ContentHash = [u8; 32];

/// Approximate in-memory size of one stub.
const STUB_SIZE_ESTIMATE: usize = 96;

/// Stubs of one file as last indexed.
#[derive(Debug, Clone)]
pub struct CachedStubs {
    pub tree: Arc<StubTree>,
    pub contributions: Arc<IndexContributions>,
    pub source: Arc<str>,
    pub content_hash: ContentHash,
}

impl CachedStubs {
    /// Source text size + estimated tree overhead
    pub fn estimated_size(&self) -> usize {
        self.source.len() + self.tree.len() * STUB_SIZE_ESTIMATE
    }
}

/// Stub cache keyed by file path
#[derive(Debug)]
pub struct StubCache {
    cache: LruCache<PathBuf, Arc<CachedStubs>>,
    max_size_bytes: usize,
    current_size_bytes: usize,
    hits: u64,
    misses: u64,
}

impl StubCache {
    /// Create a new stub cache with maximum size in bytes
    pub fn new(max_size_bytes: usize) -> Self {
        Self {
            // Entry count is bounded by size, not by the LRU capacity.
            cache: LruCache::unbounded(),
            max_size_bytes,
            current_size_bytes: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Get cached stubs, counting a hit only if the content hash matches
    pub fn get(&mut self, path: &Path, content_hash: &ContentHash) -> Option<Arc<CachedStubs>> {
        match self.cache.get(path) {
            Some(entry) if entry.content_hash == *content_hash => {
                self.hits += 1;
                Some(Arc::clone(entry))
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert stubs into the cache
    pub fn insert(&mut self, path: PathBuf, entry: Arc<CachedStubs>) {
        let size = entry.estimated_size();

        // Evict entries if needed to make space
        while self.current_size_bytes + size > self.max_size_bytes && !self.cache.is_empty() {
            if let Some((_, evicted)) = self.cache.pop_lru() {
                self.current_size_bytes -= evicted.estimated_size();
            }
        }

        if let Some((_, old)) = self.cache.push(path, entry) {
            self.current_size_bytes -= old.estimated_size();
        }
        self.current_size_bytes += size;
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
        self.current_size_bytes = 0;
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            entries: self.cache.len(),
            size_bytes: self.current_size_bytes,
            max_size_bytes: self.max_size_bytes,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
        }
    }

    /// Invalidate cache entry for a path
    pub fn invalidate(&mut self, path: &Path) {
        if let Some(removed) = self.cache.pop(path) {
            self.current_size_bytes -= removed.estimated_size();
        }
    }

    /// Check if a path is cached
    pub fn contains(&self, path: &Path) -> bool {
        self.cache.contains(path)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub size_bytes: usize,
    pub max_size_bytes: usize,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StubTreeBuilder;
    use crate::java;
    use stubindex_ast::java::parse_java;
    use tokio_util::sync::CancellationToken;

    fn entry(source: &str, hash: u8) -> Arc<CachedStubs> {
        let registry = Arc::new(java::registry().unwrap());
        let parsed = parse_java(source, &CancellationToken::new()).unwrap();
        let tree = StubTreeBuilder::new(registry)
            .build(&parsed, &CancellationToken::new())
            .unwrap();
        Arc::new(CachedStubs {
            tree: Arc::new(tree),
            contributions: Arc::new(IndexContributions::new()),
            source: Arc::from(source),
            content_hash: [hash; 32],
        })
    }

    #[test]
    fn test_cache_basic() {
        let mut cache = StubCache::new(1024 * 1024); // 1MB
        let path = PathBuf::from("A.java");

        cache.insert(path.clone(), entry("class A {}", 1));
        assert!(cache.contains(&path));
        assert!(cache.get(&path, &[1; 32]).is_some());
        assert!(cache.get(&path, &[2; 32]).is_none());
        assert!((cache.stats().hit_rate - 0.5).abs() < f64::EPSILON);

        cache.invalidate(&path);
        assert!(!cache.contains(&path));
        assert_eq!(cache.stats().size_bytes, 0);
    }

    #[test]
    fn test_cache_eviction() {
        let mut cache = StubCache::new(600); // Very small cache

        for i in 0..10 {
            let source = format!("class C{i} {{ int f; }}");
            cache.insert(PathBuf::from(format!("C{i}.java")), entry(&source, i as u8));
        }

        assert!(cache.stats().entries < 10);
        assert!(cache.current_size_bytes <= cache.max_size_bytes);
        assert!(cache.contains(Path::new("C9.java")));
    }
}
