//! Stub engine: indexes source files and answers index queries.

use crate::builder::StubTreeBuilder;
use crate::cache::CacheStats;
use crate::cache::CachedStubs;
use crate::cache::ContentHash;
use crate::cache::StubCache;
use crate::config::StubEngineConfig;
use crate::error::StubError;
use crate::error::StubResult;
use crate::index::IndexContributions;
use crate::index::IndexKey;
use crate::lazy::SourceReparser;
use crate::lazy::StubBasedFile;
use crate::project_index::IndexHit;
use crate::project_index::ProjectIndex;
use crate::registry::ElementTypeRegistry;
use crate::serializer::StubSerializer;
use crate::stub::StubTree;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use sha2::Digest;
use sha2::Sha256;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use stubindex_ast::Language;
use stubindex_ast::LanguageRegistry;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

/// Persistent storage for serialized stub streams, keyed by source path.
#[async_trait]
pub trait StubStore: Send + Sync + fmt::Debug {
    /// Stored stream for `path`, or `None` when absent or written for other
    /// content.
    async fn load(&self, path: &Path, content_hash: &ContentHash) -> StubResult<Option<Bytes>>;

    async fn save(&self, path: &Path, content_hash: &ContentHash, stream: &[u8]) -> StubResult<()>;

    async fn remove(&self, path: &Path) -> StubResult<()>;
}

/// sha256 of source text.
pub fn content_hash(source: &str) -> ContentHash {
    Sha256::digest(source.as_bytes()).into()
}

/// Where the stubs returned by [`StubEngine::index_file`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubOrigin {
    Cache,
    Store,
    Parsed,
}

/// Result of indexing one file.
#[derive(Debug, Clone)]
pub struct IndexedFile {
    pub path: PathBuf,
    pub tree: Arc<StubTree>,
    pub contributions: Arc<IndexContributions>,
    pub origin: StubOrigin,
}

/// Main stub engine
#[derive(Debug)]
pub struct StubEngine {
    config: StubEngineConfig,
    languages: Arc<LanguageRegistry>,
    builder: StubTreeBuilder,
    serializer: StubSerializer,
    cache: Arc<RwLock<StubCache>>,
    index: ProjectIndex,
    store: Option<Arc<dyn StubStore>>,
    open_files: DashMap<PathBuf, Arc<StubBasedFile>>,
}

impl StubEngine {
    /// Create an engine over the process-wide element type registry.
    pub fn new(config: StubEngineConfig) -> StubResult<Self> {
        Self::with_registry(config, crate::registry::global()?)
    }

    pub fn with_registry(
        config: StubEngineConfig,
        registry: Arc<ElementTypeRegistry>,
    ) -> StubResult<Self> {
        config.validate()?;
        Ok(Self {
            languages: Arc::new(LanguageRegistry::with_max_file_size(config.max_file_size)),
            builder: StubTreeBuilder::new(Arc::clone(&registry)),
            serializer: StubSerializer::new(registry),
            cache: Arc::new(RwLock::new(StubCache::new(config.cache_capacity_bytes))),
            index: ProjectIndex::new(),
            store: None,
            open_files: DashMap::new(),
            config,
        })
    }

    /// Persist serialized stubs in `store`.
    pub fn with_store(mut self, store: Arc<dyn StubStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub const fn config(&self) -> &StubEngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ElementTypeRegistry> {
        self.serializer.registry()
    }

    pub fn languages(&self) -> &Arc<LanguageRegistry> {
        &self.languages
    }

    pub const fn project_index(&self) -> &ProjectIndex {
        &self.index
    }

    /// Index a source file, reusing cached or stored stubs when the content
    /// is unchanged.
    pub async fn index_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> StubResult<IndexedFile> {
        let (entry, origin) = self.load(path, cancel).await?;
        Ok(IndexedFile {
            path: path.to_path_buf(),
            tree: Arc::clone(&entry.tree),
            contributions: Arc::clone(&entry.contributions),
            origin,
        })
    }

    /// Lazy syntax view of a file; the handle is shared while the file is
    /// unchanged.
    pub async fn open_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> StubResult<Arc<StubBasedFile>> {
        let language = self.languages.detect_language(path)?;
        let (entry, _) = self.load(path, cancel).await?;
        if let Some(open) = self.open_files.get(path)
            && Arc::ptr_eq(open.stubs(), &entry.tree)
        {
            return Ok(Arc::clone(open.value()));
        }

        let reparser = SourceReparser::new(
            Arc::clone(&self.languages),
            language,
            Arc::clone(&entry.source),
        );
        let file = Arc::new(StubBasedFile::new(
            Arc::clone(&entry.tree),
            Box::new(reparser),
        ));
        Ok(Arc::clone(
            self.open_files
                .entry(path.to_path_buf())
                .and_modify(|open| {
                    if !Arc::ptr_eq(open.stubs(), &entry.tree) {
                        *open = Arc::clone(&file);
                    }
                })
                .or_insert(file)
                .value(),
        ))
    }

    /// Every stub in the project recorded under `key` in `index`.
    pub fn find(&self, index: &str, key: &IndexKey) -> Vec<IndexHit> {
        self.index.get(index, key)
    }

    /// Like [`StubEngine::find`], limited to paths accepted by `filter`.
    pub fn find_in<F>(&self, index: &str, key: &IndexKey, filter: F) -> Vec<IndexHit>
    where
        F: Fn(&Path) -> bool,
    {
        self.index.get_filtered(index, key, filter)
    }

    /// Forget everything known about a file.
    pub async fn invalidate(&self, path: &Path) {
        self.cache.write().await.invalidate(path);
        self.index.remove_file(path);
        self.open_files.remove(path);
        if let Some(store) = &self.store
            && let Err(e) = store.remove(path).await
        {
            warn!(path = %path.display(), error = %e, "failed to remove stored stubs");
        }
    }

    /// Clear the in-memory cache. The project index and store are kept.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    fn check_size(&self, path: &Path, size: usize) -> StubResult<()> {
        if size > self.config.max_file_size {
            return Err(StubError::ParseFailed(format!(
                "{} is {size} bytes, limit is {}",
                path.display(),
                self.config.max_file_size
            )));
        }
        Ok(())
    }

    async fn load(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> StubResult<(Arc<CachedStubs>, StubOrigin)> {
        let language = self.languages.detect_language(path)?;
        let size = tokio::fs::metadata(path).await?.len();
        self.check_size(path, usize::try_from(size).unwrap_or(usize::MAX))?;
        let source: Arc<str> = tokio::fs::read_to_string(path).await?.into();
        // The file may have grown since the metadata was read.
        self.check_size(path, source.len())?;
        let hash = content_hash(&source);

        // Check cache first
        {
            let mut cache = self.cache.write().await;
            if let Some(entry) = cache.get(path, &hash) {
                return Ok((entry, StubOrigin::Cache));
            }
        }

        let (entry, origin) = match self.load_stored(path, &hash, &source, cancel).await? {
            Some(entry) => (entry, StubOrigin::Store),
            None => (
                self.build(path, language, &hash, source, cancel).await?,
                StubOrigin::Parsed,
            ),
        };

        let entry = Arc::new(entry);
        self.cache
            .write()
            .await
            .insert(path.to_path_buf(), Arc::clone(&entry));
        self.index
            .update_file(path.to_path_buf(), Arc::clone(&entry.contributions));
        debug!(path = %path.display(), ?origin, stubs = entry.tree.len(), "indexed file");
        Ok((entry, origin))
    }

    /// Stubs from the store, or `None` when they have to be rebuilt.
    async fn load_stored(
        &self,
        path: &Path,
        hash: &ContentHash,
        source: &Arc<str>,
        cancel: &CancellationToken,
    ) -> StubResult<Option<CachedStubs>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let bytes = match store.load(path, hash).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stored stubs unreadable, rebuilding");
                return Ok(None);
            }
        };

        let expected = self.serializer.registry().version();
        let tree = match self.serializer.deserialize(&bytes, expected, cancel) {
            Ok(tree) => tree,
            Err(e) if e.requires_rebuild() => {
                warn!(path = %path.display(), error = %e, "stored stubs stale, rebuilding");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let contributions = self.serializer.index_only(&tree, cancel)?;
        Ok(Some(CachedStubs {
            tree: Arc::new(tree),
            contributions: Arc::new(contributions),
            source: Arc::clone(source),
            content_hash: *hash,
        }))
    }

    async fn build(
        &self,
        path: &Path,
        language: Language,
        hash: &ContentHash,
        source: Arc<str>,
        cancel: &CancellationToken,
    ) -> StubResult<CachedStubs> {
        let parsed = self
            .languages
            .parse(language, Arc::clone(&source), cancel)?;
        let tree = self.builder.build(&parsed, cancel)?;
        let (stream, contributions) = self.serializer.serialize_with_index(&tree, cancel)?;

        if let Some(store) = &self.store
            && let Err(e) = store.save(path, hash, &stream).await
        {
            warn!(path = %path.display(), error = %e, "failed to store stubs");
        }

        Ok(CachedStubs {
            tree: Arc::new(tree),
            contributions: Arc::new(contributions),
            source,
            content_hash: *hash,
        })
    }
}
