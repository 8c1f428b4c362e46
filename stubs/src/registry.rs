//! Element type registry.
//!
//! Types are registered on a [`RegistryBuilder`] during initialization and
//! frozen into an [`ElementTypeRegistry`]. The frozen registry has no
//! mutation path; it is shared through `Arc` by trees, serializers and the
//! engine.

use crate::element_type::ElementTypeId;
use crate::element_type::StubElementType;
use crate::error::StubError;
use crate::error::StubResult;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use stubindex_ast::SyntaxKind;
use tracing::debug;

/// Mutable registration phase of a registry.
pub struct RegistryBuilder {
    version: u32,
    min_supported_version: u32,
    types: Vec<Arc<dyn StubElementType>>,
    by_name: HashMap<String, ElementTypeId>,
    by_kind: HashMap<SyntaxKind, ElementTypeId>,
}

impl RegistryBuilder {
    /// Start a registry writing streams of format `version`.
    pub fn new(version: u32) -> Self {
        Self {
            version,
            min_supported_version: version,
            types: Vec::new(),
            by_name: HashMap::new(),
            by_kind: HashMap::new(),
        }
    }

    /// Oldest stream version this registry can still read.
    pub fn min_supported_version(mut self, version: u32) -> Self {
        self.min_supported_version = version.min(self.version);
        self
    }

    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Register a type, assigning it the next id.
    pub fn register(&mut self, element_type: Arc<dyn StubElementType>) -> StubResult<ElementTypeId> {
        let name = element_type.debug_name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(StubError::DuplicateRegistration(name));
        }
        let kind = element_type.syntax_kind();
        if let Some(existing) = self.by_kind.get(&kind) {
            return Err(StubError::DuplicateRegistration(format!(
                "{name}: parse kind {kind} already claimed by {existing}"
            )));
        }
        let id = ElementTypeId(self.types.len() as u32 + 1);
        self.by_name.insert(name, id);
        self.by_kind.insert(kind, id);
        self.types.push(element_type);
        Ok(id)
    }

    /// Freeze the registry.
    pub fn build(self) -> ElementTypeRegistry {
        let file_type = self
            .types
            .iter()
            .position(|t| t.is_file() && t.is_stubbed())
            .map(|i| ElementTypeId(i as u32 + 1));
        debug!(
            version = self.version,
            types = self.types.len(),
            "element type registry frozen"
        );
        ElementTypeRegistry {
            version: self.version,
            min_supported_version: self.min_supported_version,
            types: self.types,
            by_name: self.by_name,
            by_kind: self.by_kind,
            file_type,
        }
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("version", &self.version)
            .field("types", &self.types.len())
            .finish()
    }
}

/// Frozen `id <-> element type` mapping.
pub struct ElementTypeRegistry {
    version: u32,
    min_supported_version: u32,
    types: Vec<Arc<dyn StubElementType>>,
    by_name: HashMap<String, ElementTypeId>,
    by_kind: HashMap<SyntaxKind, ElementTypeId>,
    file_type: Option<ElementTypeId>,
}

impl ElementTypeRegistry {
    pub const fn version(&self) -> u32 {
        self.version
    }

    pub const fn min_supported_version(&self) -> u32 {
        self.min_supported_version
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn lookup(&self, id: ElementTypeId) -> StubResult<&Arc<dyn StubElementType>> {
        id.0.checked_sub(1)
            .and_then(|i| self.types.get(i as usize))
            .ok_or(StubError::UnknownElementType(id.0))
    }

    pub fn by_debug_name(&self, name: &str) -> Option<(ElementTypeId, &Arc<dyn StubElementType>)> {
        let id = *self.by_name.get(name)?;
        self.lookup(id).ok().map(|t| (id, t))
    }

    /// Type registered for a parse-node kind.
    pub fn for_syntax_kind(&self, kind: SyntaxKind) -> Option<(ElementTypeId, &Arc<dyn StubElementType>)> {
        let id = *self.by_kind.get(&kind)?;
        self.lookup(id).ok().map(|t| (id, t))
    }

    pub fn is_stubbed(&self, id: ElementTypeId) -> StubResult<bool> {
        Ok(self.lookup(id)?.is_stubbed())
    }

    /// Type of the root stub of every tree.
    pub fn file_type(&self) -> StubResult<(ElementTypeId, &Arc<dyn StubElementType>)> {
        let id = self
            .file_type
            .ok_or_else(|| StubError::ParseFailed("registry has no file element type".into()))?;
        Ok((id, self.lookup(id)?))
    }

    /// Accept stream versions in `min_supported_version..=expected`.
    pub fn check_version(&self, found: u32, expected: u32) -> StubResult<()> {
        if found > expected || found < self.min_supported_version {
            return Err(StubError::VersionMismatch { found, expected });
        }
        Ok(())
    }

    /// Registered types in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementTypeId, &Arc<dyn StubElementType>)> + '_ {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (ElementTypeId(i as u32 + 1), t))
    }
}

impl fmt::Debug for ElementTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementTypeRegistry")
            .field("version", &self.version)
            .field("min_supported_version", &self.min_supported_version)
            .field("types", &self.types.len())
            .finish()
    }
}

static GLOBAL: OnceCell<Arc<ElementTypeRegistry>> = OnceCell::new();

/// Install the process-wide registry.
///
/// Fails with [`StubError::RegistryFrozen`] once a registry was installed or
/// the default one was handed out by [`global`].
pub fn install_global(registry: ElementTypeRegistry) -> StubResult<Arc<ElementTypeRegistry>> {
    let registry = Arc::new(registry);
    GLOBAL
        .set(Arc::clone(&registry))
        .map_err(|_| StubError::RegistryFrozen)?;
    Ok(registry)
}

/// The process-wide registry, defaulting to the Java catalogue.
pub fn global() -> StubResult<Arc<ElementTypeRegistry>> {
    GLOBAL
        .get_or_try_init(|| crate::java::registry().map(Arc::new))
        .cloned()
}
