//! Building stub trees from lightweight parse trees.

use crate::error::StubError;
use crate::error::StubResult;
use crate::registry::ElementTypeRegistry;
use crate::stub::StubId;
use crate::stub::StubTree;
use crate::stub::StubTreeAssembler;
use std::sync::Arc;
use stubindex_ast::LighterAst;
use stubindex_ast::NodeRef;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

/// A built stub tree together with the parse node of every stub.
#[derive(Debug)]
pub struct BuiltStubs {
    pub tree: StubTree,
    /// Parse node of each stub, indexed by [`StubId`].
    pub nodes: Vec<NodeRef>,
}

/// Walks a parse tree in preorder and creates one stub per stubbed node.
#[derive(Debug, Clone)]
pub struct StubTreeBuilder {
    registry: Arc<ElementTypeRegistry>,
}

impl StubTreeBuilder {
    pub const fn new(registry: Arc<ElementTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ElementTypeRegistry> {
        &self.registry
    }

    /// Build the stub tree of `tree`.
    pub fn build(&self, tree: &dyn LighterAst, cancel: &CancellationToken) -> StubResult<StubTree> {
        Ok(self.build_with_nodes(tree, cancel)?.tree)
    }

    /// Build the stub tree and keep the stub-to-node binding.
    pub fn build_with_nodes(
        &self,
        tree: &dyn LighterAst,
        cancel: &CancellationToken,
    ) -> StubResult<BuiltStubs> {
        let root = tree.root();
        let (file_id, _) = self.registry.file_type()?;
        let root_kind = tree.kind(root);
        match self.registry.for_syntax_kind(root_kind) {
            Some((id, _)) if id == file_id => {}
            _ => {
                return Err(StubError::ParseFailed(format!(
                    "root node {root_kind} is not a file"
                )));
            }
        }

        let mut walk = Walk {
            registry: &self.registry,
            tree,
            cancel,
            assembler: StubTreeAssembler::new(Arc::clone(&self.registry)),
            nodes: Vec::new(),
        };
        walk.visit(root)?;

        let Walk {
            assembler, nodes, ..
        } = walk;
        let tree = assembler.finish();
        debug!(stubs = tree.len(), "built stub tree");
        Ok(BuiltStubs { tree, nodes })
    }
}

struct Walk<'a> {
    registry: &'a ElementTypeRegistry,
    tree: &'a dyn LighterAst,
    cancel: &'a CancellationToken,
    assembler: StubTreeAssembler,
    nodes: Vec<NodeRef>,
}

impl Walk<'_> {
    /// Preorder walk with an explicit stack, so nesting depth is bounded by
    /// memory rather than by the thread stack.
    fn visit(&mut self, root: NodeRef) -> StubResult<()> {
        let registry = self.registry;
        let mut pending: Vec<(NodeRef, Option<StubId>)> = vec![(root, None)];
        while let Some((node, parent)) = pending.pop() {
            if self.cancel.is_cancelled() {
                return Err(StubError::Cancelled);
            }

            let kind = self.tree.kind(node);
            let mut current = parent;
            if let Some((type_id, element_type)) = registry.for_syntax_kind(kind)
                && element_type.is_stubbed()
            {
                let parent_payload = parent.and_then(|p| self.assembler.payload(p));
                let payload = element_type.create_stub(self.tree, node, parent_payload);
                let id = self
                    .assembler
                    .push(type_id, Arc::clone(element_type), parent, payload);
                trace!(stub = %id, kind = %kind, "created stub");
                self.nodes.push(node);
                current = Some(id);
            }

            for child in self.tree.children(node).iter().rev() {
                if !self.tree.kind(*child).is_token() {
                    pending.push((*child, current));
                }
            }
        }
        Ok(())
    }
}

/// Build a stub tree with the process-wide registry.
pub fn build_stub_tree(tree: &dyn LighterAst) -> StubResult<StubTree> {
    StubTreeBuilder::new(crate::registry::global()?).build(tree, &CancellationToken::new())
}
