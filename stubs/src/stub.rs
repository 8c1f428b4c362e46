//! Stub trees.
//!
//! A stub tree is an immutable arena of stubs stored in preorder, so a
//! [`StubId`] doubles as the dense preorder number used by the serializer
//! and the index. Parents are plain ids, never owning references.

use crate::element_type::ElementTypeId;
use crate::element_type::StubElementType;
use crate::java::payload::AnnotationStubData;
use crate::java::payload::ClassStubData;
use crate::java::payload::FieldStubData;
use crate::java::payload::FileStubData;
use crate::java::payload::ImportStubData;
use crate::java::payload::MethodStubData;
use crate::java::payload::ModifierListStubData;
use crate::java::payload::ModuleReferenceStubData;
use crate::java::payload::ModuleStubData;
use crate::java::payload::NameValuePairStubData;
use crate::java::payload::PackageStubData;
use crate::java::payload::ParameterStubData;
use crate::java::payload::ReferenceListStubData;
use crate::java::payload::RequiresStubData;
use crate::java::payload::TypeParameterStubData;
use crate::registry::ElementTypeRegistry;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

/// Index of a stub in its tree, equal to its preorder number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StubId(pub u32);

impl StubId {
    pub const ROOT: Self = Self(0);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-specific data carried by a stub.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StubPayload {
    /// Types whose stubs carry nothing beyond their position in the tree.
    #[default]
    Empty,
    File(FileStubData),
    Package(PackageStubData),
    Import(ImportStubData),
    Class(ClassStubData),
    Method(MethodStubData),
    Field(FieldStubData),
    Parameter(ParameterStubData),
    TypeParameter(TypeParameterStubData),
    ModifierList(ModifierListStubData),
    Annotation(AnnotationStubData),
    NameValuePair(NameValuePairStubData),
    ReferenceList(ReferenceListStubData),
    Module(ModuleStubData),
    Requires(RequiresStubData),
    ModuleReference(ModuleReferenceStubData),
}

impl StubPayload {
    /// Declared name, if the construct has one.
    pub const fn name(&self) -> Option<&Arc<str>> {
        match self {
            Self::File(d) => d.package_name.as_ref(),
            Self::Package(d) => d.package_name.as_ref(),
            Self::Import(d) => d.reference.as_ref(),
            Self::Class(d) => d.name.as_ref(),
            Self::Method(d) => d.name.as_ref(),
            Self::Field(d) => d.name.as_ref(),
            Self::Parameter(d) => d.name.as_ref(),
            Self::TypeParameter(d) => d.name.as_ref(),
            Self::Annotation(d) => d.qualified_name.as_ref(),
            Self::NameValuePair(d) => d.name.as_ref(),
            Self::Module(d) => d.name.as_ref(),
            Self::Requires(d) => d.module_name.as_ref(),
            Self::ModuleReference(d) => d.reference.as_ref(),
            Self::Empty | Self::ModifierList(_) | Self::ReferenceList(_) => None,
        }
    }

    /// Raw flag bits, `0` for payloads without flags.
    pub const fn flag_bits(&self) -> u32 {
        match self {
            Self::Import(d) => d.flags.bits(),
            Self::Class(d) => d.flags.bits(),
            Self::Method(d) => d.flags.bits(),
            Self::Field(d) => d.flags.bits(),
            Self::Parameter(d) => d.flags.bits(),
            Self::ModifierList(d) => d.modifiers.bits(),
            Self::Module(d) => d.flags.bits(),
            Self::Requires(d) => d.flags.bits(),
            _ => 0,
        }
    }
}

/// One node of a stub tree.
#[derive(Debug, Clone)]
pub struct Stub {
    type_id: ElementTypeId,
    element_type: Arc<dyn StubElementType>,
    parent: Option<StubId>,
    children: Vec<StubId>,
    payload: StubPayload,
}

impl Stub {
    pub const fn type_id(&self) -> ElementTypeId {
        self.type_id
    }

    pub fn element_type(&self) -> &Arc<dyn StubElementType> {
        &self.element_type
    }

    pub const fn parent(&self) -> Option<StubId> {
        self.parent
    }

    pub fn children(&self) -> &[StubId] {
        &self.children
    }

    pub const fn payload(&self) -> &StubPayload {
        &self.payload
    }
}

impl PartialEq for Stub {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
            && self.parent == other.parent
            && self.children == other.children
            && self.payload == other.payload
    }
}

impl Eq for Stub {}

/// Immutable stub tree rooted at a file stub.
#[derive(Debug, Clone)]
pub struct StubTree {
    registry: Arc<ElementTypeRegistry>,
    stubs: Vec<Stub>,
}

impl StubTree {
    pub fn registry(&self) -> &Arc<ElementTypeRegistry> {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    pub fn root(&self) -> StubRef<'_> {
        StubRef {
            tree: self,
            id: StubId::ROOT,
        }
    }

    pub fn get(&self, id: StubId) -> Option<StubRef<'_>> {
        (id.index() < self.stubs.len()).then_some(StubRef { tree: self, id })
    }

    pub fn stub(&self, id: StubId) -> Option<&Stub> {
        self.stubs.get(id.index())
    }

    /// Stub for an id known to belong to this tree.
    pub(crate) fn stub_at(&self, id: StubId) -> &Stub {
        &self.stubs[id.index()]
    }

    /// Every stub in preorder.
    pub fn iter(&self) -> impl Iterator<Item = StubRef<'_>> + '_ {
        (0..self.stubs.len() as u32).map(|i| StubRef {
            tree: self,
            id: StubId(i),
        })
    }

    /// Indented outline, one stub per line.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        for stub in self.iter() {
            let depth = stub.depth();
            let _ = write!(out, "{}{}", "  ".repeat(depth), stub.element_type().debug_name());
            if let Some(name) = stub.payload().name() {
                let _ = write!(out, " {name:?}");
            }
            out.push('\n');
        }
        out
    }
}

impl PartialEq for StubTree {
    fn eq(&self, other: &Self) -> bool {
        self.stubs == other.stubs
    }
}

impl Eq for StubTree {}

/// Borrowed handle to one stub of a tree.
#[derive(Clone, Copy)]
pub struct StubRef<'a> {
    tree: &'a StubTree,
    id: StubId,
}

impl<'a> StubRef<'a> {
    pub const fn id(&self) -> StubId {
        self.id
    }

    pub const fn tree(&self) -> &'a StubTree {
        self.tree
    }

    fn stub(&self) -> &'a Stub {
        &self.tree.stubs[self.id.index()]
    }

    pub fn type_id(&self) -> ElementTypeId {
        self.stub().type_id
    }

    pub fn element_type(&self) -> &'a Arc<dyn StubElementType> {
        &self.stub().element_type
    }

    pub fn payload(&self) -> &'a StubPayload {
        &self.stub().payload
    }

    pub fn parent(&self) -> Option<StubRef<'a>> {
        self.stub().parent.map(|id| StubRef {
            tree: self.tree,
            id,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = StubRef<'a>> + 'a {
        let tree = self.tree;
        self.stub()
            .children
            .iter()
            .map(move |id| StubRef { tree, id: *id })
    }

    /// Distance from the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.stub().parent;
        while let Some(id) = current {
            depth += 1;
            current = self.tree.stubs[id.index()].parent;
        }
        depth
    }
}

impl fmt::Debug for StubRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubRef")
            .field("id", &self.id)
            .field("type", &self.element_type().debug_name())
            .field("payload", self.payload())
            .finish()
    }
}

/// Append-only assembly of a stub tree in preorder.
///
/// Used by the tree builder and the deserializer; the finished tree is never
/// mutated.
#[derive(Debug)]
pub(crate) struct StubTreeAssembler {
    registry: Arc<ElementTypeRegistry>,
    stubs: Vec<Stub>,
}

impl StubTreeAssembler {
    pub(crate) const fn new(registry: Arc<ElementTypeRegistry>) -> Self {
        Self {
            registry,
            stubs: Vec::new(),
        }
    }

    pub(crate) fn payload(&self, id: StubId) -> Option<&StubPayload> {
        self.stubs.get(id.index()).map(|s| &s.payload)
    }

    pub(crate) fn push(
        &mut self,
        type_id: ElementTypeId,
        element_type: Arc<dyn StubElementType>,
        parent: Option<StubId>,
        payload: StubPayload,
    ) -> StubId {
        let id = StubId(self.stubs.len() as u32);
        if let Some(parent) = parent {
            self.stubs[parent.index()].children.push(id);
        }
        self.stubs.push(Stub {
            type_id,
            element_type,
            parent,
            children: Vec::new(),
            payload,
        });
        id
    }

    pub(crate) fn finish(self) -> StubTree {
        StubTree {
            registry: self.registry,
            stubs: self.stubs,
        }
    }
}
