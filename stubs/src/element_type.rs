//! The contract every stub element type implements.

use crate::error::StubResult;
use crate::index::IndexSink;
use crate::stream::StubInputStream;
use crate::stream::StubOutputStream;
use crate::stub::StubPayload;
use std::fmt;
use std::sync::Arc;
use stubindex_ast::LighterAst;
use stubindex_ast::NodeRef;
use stubindex_ast::SyntaxKind;

/// Numeric id of a registered element type. Ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementTypeId(pub u32);

impl fmt::Display for ElementTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Attributes a lazy syntax node answers without touching the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttributes {
    pub name: Option<Arc<str>>,
    pub flags: u32,
}

/// Descriptor of one language construct.
///
/// The parse factory, the serialized form and the index keys of a construct
/// all live on one type so they cannot drift apart. Implementations are
/// immutable and shared through the registry.
pub trait StubElementType: Send + Sync + fmt::Debug {
    /// Stable textual id, unique within a registry.
    fn debug_name(&self) -> &str;

    /// Parse-tree node kind this type is built from.
    fn syntax_kind(&self) -> SyntaxKind;

    /// Non-stubbed types may appear in a parse tree but never get a stub.
    fn is_stubbed(&self) -> bool {
        true
    }

    /// Whether this type is the root of a stub tree.
    fn is_file(&self) -> bool {
        false
    }

    /// Extract the payload of a new stub from `node` and its direct children.
    fn create_stub(
        &self,
        tree: &dyn LighterAst,
        node: NodeRef,
        parent: Option<&StubPayload>,
    ) -> StubPayload;

    /// Write the payload. The element-type id and the children are framed by
    /// the serializer.
    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()>;

    /// Read back what [`serialize`](Self::serialize) wrote.
    fn deserialize(
        &self,
        input: &mut StubInputStream<'_>,
        parent: Option<&StubPayload>,
    ) -> StubResult<StubPayload>;

    /// Contribute index keys derived from the payload.
    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink);

    /// Attributes exposed by the lazy syntax node of a stub of this type.
    fn node_attributes(&self, payload: &StubPayload) -> NodeAttributes {
        NodeAttributes {
            name: payload.name().cloned(),
            flags: payload.flag_bits(),
        }
    }
}
