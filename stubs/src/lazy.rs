//! Lazy syntax nodes backed by stubs.
//!
//! A [`StubBasedFile`] starts out answering every structural query from its
//! stub tree. The first query that needs token-level data reparses the file,
//! walks the new parse tree in the builder's preorder and binds each stub to
//! its parse node. The transition is one-way and happens at most once per
//! file; handles handed out before it stay valid and identical afterwards.

use crate::builder::StubTreeBuilder;
use crate::element_type::NodeAttributes;
use crate::element_type::StubElementType;
use crate::error::StubError;
use crate::error::StubResult;
use crate::stub::StubId;
use crate::stub::StubPayload;
use crate::stub::StubTree;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use stubindex_ast::FlatTree;
use stubindex_ast::Language;
use stubindex_ast::LanguageRegistry;
use stubindex_ast::LighterAst;
use stubindex_ast::NodeRef;
use stubindex_ast::SyntaxKind;
use stubindex_ast::TextRange;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Produces a fresh parse tree for a file whose stubs are already known.
pub trait Reparser: Send + Sync {
    fn reparse(&self, cancel: &CancellationToken) -> StubResult<FlatTree>;
}

/// Reparses retained source text.
#[derive(Debug, Clone)]
pub struct SourceReparser {
    languages: Arc<LanguageRegistry>,
    language: Language,
    source: Arc<str>,
}

impl SourceReparser {
    pub const fn new(languages: Arc<LanguageRegistry>, language: Language, source: Arc<str>) -> Self {
        Self {
            languages,
            language,
            source,
        }
    }
}

impl Reparser for SourceReparser {
    fn reparse(&self, cancel: &CancellationToken) -> StubResult<FlatTree> {
        Ok(self
            .languages
            .parse(self.language, Arc::clone(&self.source), cancel)?)
    }
}

/// State of a stub-based file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    StubOnly,
    Parsed,
}

struct Binding {
    tree: FlatTree,
    /// Parse node of each stub, indexed by stub id.
    nodes: Vec<NodeRef>,
}

struct FileInner {
    stubs: Arc<StubTree>,
    reparser: Box<dyn Reparser>,
    handles: Vec<OnceCell<Arc<LazySyntaxNode>>>,
    binding: OnceCell<Binding>,
    reparses: AtomicUsize,
}

impl FileInner {
    fn handle(self: &Arc<Self>, id: StubId) -> Option<Arc<LazySyntaxNode>> {
        let cell = self.handles.get(id.index())?;
        let stub = self.stubs.stub(id)?;
        Some(Arc::clone(cell.get_or_init(|| {
            Arc::new(LazySyntaxNode {
                id,
                stubs: Arc::clone(&self.stubs),
                element_type: Arc::clone(stub.element_type()),
                attributes: stub.element_type().node_attributes(stub.payload()),
                file: Arc::downgrade(self),
            })
        })))
    }

    fn binding(&self, cancel: &CancellationToken) -> StubResult<&Binding> {
        self.binding.get_or_try_init(|| {
            self.reparses.fetch_add(1, Ordering::SeqCst);
            let tree = self.reparser.reparse(cancel)?;
            let built = StubTreeBuilder::new(Arc::clone(self.stubs.registry()))
                .build_with_nodes(&tree, cancel)?;
            if built.tree.len() != self.stubs.len()
                || built
                    .tree
                    .iter()
                    .zip(self.stubs.iter())
                    .any(|(parsed, stub)| parsed.type_id() != stub.type_id())
            {
                return Err(StubError::ParseFailed(format!(
                    "reparsed tree has {} stubbed nodes, stubs have {}",
                    built.tree.len(),
                    self.stubs.len()
                )));
            }
            debug!(stubs = self.stubs.len(), "bound stubs to reparsed tree");
            Ok(Binding {
                tree,
                nodes: built.nodes,
            })
        })
    }
}

/// A file whose syntax nodes are created lazily from its stubs.
#[derive(Clone)]
pub struct StubBasedFile {
    inner: Arc<FileInner>,
}

impl StubBasedFile {
    pub fn new(stubs: Arc<StubTree>, reparser: Box<dyn Reparser>) -> Self {
        let handles = (0..stubs.len()).map(|_| OnceCell::new()).collect();
        Self {
            inner: Arc::new(FileInner {
                stubs,
                reparser,
                handles,
                binding: OnceCell::new(),
                reparses: AtomicUsize::new(0),
            }),
        }
    }

    pub fn stubs(&self) -> &Arc<StubTree> {
        &self.inner.stubs
    }

    /// Handle of the file stub.
    pub fn root(&self) -> StubResult<Arc<LazySyntaxNode>> {
        self.node(StubId::ROOT)
    }

    /// Memoized handle of a stub.
    pub fn node(&self, id: StubId) -> StubResult<Arc<LazySyntaxNode>> {
        self.inner
            .handle(id)
            .ok_or_else(|| StubError::PayloadMismatch(format!("no stub {id} in file")))
    }

    pub fn state(&self) -> FileState {
        if self.inner.binding.get().is_some() {
            FileState::Parsed
        } else {
            FileState::StubOnly
        }
    }

    /// Force the *StubOnly -> Parsed* transition.
    pub fn ensure_parsed(&self, cancel: &CancellationToken) -> StubResult<()> {
        self.inner.binding(cancel).map(|_| ())
    }

    /// Number of reparses attempted so far.
    pub fn reparse_count(&self) -> usize {
        self.inner.reparses.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for StubBasedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubBasedFile")
            .field("stubs", &self.inner.stubs.len())
            .field("state", &self.state())
            .finish()
    }
}

/// Syntax node of one stub.
///
/// Structural attributes come from the stub payload. Text and token queries
/// bind the file to a parse tree first.
///
/// Handles are tied to the lifetime of their [`StubBasedFile`]: once the file
/// is dropped, payload accessors keep working but every navigation or text
/// query fails with [`StubError::FileClosed`].
pub struct LazySyntaxNode {
    id: StubId,
    stubs: Arc<StubTree>,
    element_type: Arc<dyn StubElementType>,
    attributes: NodeAttributes,
    file: Weak<FileInner>,
}

impl LazySyntaxNode {
    pub const fn id(&self) -> StubId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.name.as_deref()
    }

    pub fn kind(&self) -> SyntaxKind {
        self.element_type().syntax_kind()
    }

    pub const fn flags(&self) -> u32 {
        self.attributes.flags
    }

    pub fn element_type(&self) -> &Arc<dyn StubElementType> {
        &self.element_type
    }

    pub fn payload(&self) -> &StubPayload {
        self.stubs.stub_at(self.id).payload()
    }

    fn file(&self) -> StubResult<Arc<FileInner>> {
        self.file
            .upgrade()
            .ok_or(StubError::FileClosed)
    }

    pub fn parent(&self) -> StubResult<Option<Arc<LazySyntaxNode>>> {
        let file = self.file()?;
        Ok(self
            .stubs
            .stub_at(self.id)
            .parent()
            .and_then(|parent| file.handle(parent)))
    }

    pub fn children(&self) -> StubResult<Vec<Arc<LazySyntaxNode>>> {
        let file = self.file()?;
        Ok(self
            .stubs
            .stub_at(self.id)
            .children()
            .iter()
            .filter_map(|child| file.handle(*child))
            .collect())
    }

    fn with_node<T>(
        &self,
        cancel: &CancellationToken,
        f: impl FnOnce(&FlatTree, NodeRef) -> T,
    ) -> StubResult<T> {
        let file = self.file()?;
        let binding = file.binding(cancel)?;
        let node = *binding
            .nodes
            .get(self.id.index())
            .ok_or_else(|| StubError::ParseFailed(format!("stub {} has no parse node", self.id)))?;
        Ok(f(&binding.tree, node))
    }

    /// Source text of the node.
    pub fn text(&self, cancel: &CancellationToken) -> StubResult<String> {
        self.with_node(cancel, |tree, node| tree.text(node).to_string())
    }

    pub fn text_range(&self, cancel: &CancellationToken) -> StubResult<TextRange> {
        self.with_node(cancel, |tree, node| tree.range(node))
    }

    /// Kinds of all parse children, tokens included.
    pub fn syntax_children(&self, cancel: &CancellationToken) -> StubResult<Vec<SyntaxKind>> {
        self.with_node(cancel, |tree, node| {
            tree.children(node).iter().map(|c| tree.kind(*c)).collect()
        })
    }
}

impl fmt::Debug for LazySyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySyntaxNode")
            .field("id", &self.id)
            .field("type", &self.element_type().debug_name())
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java;
    use pretty_assertions::assert_eq;

    struct FailingReparser;

    impl Reparser for FailingReparser {
        fn reparse(&self, _cancel: &CancellationToken) -> StubResult<FlatTree> {
            Err(StubError::ParseFailed("no source".into()))
        }
    }

    fn open(source: &str) -> StubBasedFile {
        let registry = Arc::new(java::registry().unwrap());
        let languages = Arc::new(LanguageRegistry::new());
        let source: Arc<str> = Arc::from(source);
        let parsed = languages
            .parse(Language::Java, Arc::clone(&source), &CancellationToken::new())
            .unwrap();
        let stubs = StubTreeBuilder::new(registry)
            .build(&parsed, &CancellationToken::new())
            .unwrap();
        StubBasedFile::new(
            Arc::new(stubs),
            Box::new(SourceReparser::new(languages, Language::Java, source)),
        )
    }

    fn class_node(file: &StubBasedFile) -> Arc<LazySyntaxNode> {
        file.root()
            .unwrap()
            .children()
            .unwrap()
            .into_iter()
            .find(|n| n.kind() == SyntaxKind::Class)
            .unwrap()
    }

    #[test]
    fn test_structure_without_parse() {
        let file = open("package p;\n@Deprecated public class Foo { void run() {} }");
        let class = class_node(&file);
        assert_eq!(class.name(), Some("Foo"));
        assert_eq!(
            class.flags(),
            java::flags::ClassFlags::DEPRECATED.bits()
        );
        let parent = class.parent().unwrap().unwrap();
        assert!(Arc::ptr_eq(&parent, &file.root().unwrap()));
        assert_eq!(file.state(), FileState::StubOnly);
        assert_eq!(file.reparse_count(), 0);
    }

    #[test]
    fn test_text_forces_single_parse() {
        let file = open("class Foo { int x; }");
        let class = class_node(&file);
        let token = CancellationToken::new();
        assert_eq!(class.text(&token).unwrap(), "class Foo { int x; }");
        assert_eq!(file.state(), FileState::Parsed);

        let field = class
            .children()
            .unwrap()
            .into_iter()
            .find(|n| n.kind() == SyntaxKind::Field)
            .unwrap();
        assert_eq!(field.text(&token).unwrap(), "int x;");
        assert_eq!(field.text_range(&token).unwrap(), TextRange::new(12, 18));
        assert!(field.syntax_children(&token).unwrap().contains(&SyntaxKind::Identifier));
        assert_eq!(file.reparse_count(), 1);
    }

    #[test]
    fn test_handles_survive_transition() {
        let file = open("class Foo { void a() {} }");
        let before = class_node(&file);
        file.ensure_parsed(&CancellationToken::new()).unwrap();
        let after = class_node(&file);
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_failed_parse_stays_stub_only() {
        let file = open("class Foo {}");
        let file = StubBasedFile::new(Arc::clone(file.stubs()), Box::new(FailingReparser));
        let class = class_node(&file);
        assert!(matches!(
            class.text(&CancellationToken::new()),
            Err(StubError::ParseFailed(_))
        ));
        assert_eq!(file.state(), FileState::StubOnly);
        assert_eq!(class.name(), Some("Foo"));
    }

    #[test]
    fn test_cancelled_parse_stays_stub_only() {
        let file = open("class Foo {}");
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            file.ensure_parsed(&token),
            Err(StubError::Cancelled)
        ));
        assert_eq!(file.state(), FileState::StubOnly);
        file.ensure_parsed(&CancellationToken::new()).unwrap();
        assert_eq!(file.state(), FileState::Parsed);
    }

    #[test]
    fn test_handles_outliving_file_report_closed() {
        let file = open("class Foo { int x; }");
        let class = class_node(&file);
        drop(file);

        assert_eq!(class.name(), Some("Foo"));
        assert!(matches!(class.parent(), Err(StubError::FileClosed)));
        assert!(matches!(class.children(), Err(StubError::FileClosed)));
        assert!(matches!(
            class.text(&CancellationToken::new()),
            Err(StubError::FileClosed)
        ));
    }

    #[test]
    fn test_mismatched_reparse_fails() {
        struct Other;
        impl Reparser for Other {
            fn reparse(&self, cancel: &CancellationToken) -> StubResult<FlatTree> {
                Ok(stubindex_ast::java::parse_java("class A {} class B {}", cancel)?)
            }
        }
        let file = open("class A {}");
        let file = StubBasedFile::new(Arc::clone(file.stubs()), Box::new(Other));
        assert!(matches!(
            file.ensure_parsed(&CancellationToken::new()),
            Err(StubError::ParseFailed(_))
        ));
    }
}
