//! Lightweight, read-only parse trees.
//!
//! A lightweight tree is a flat arena of nodes in preorder. It is cheap to
//! build and to walk, and it is all the stub builder ever looks at: node kinds,
//! ordered children and source text served through a [`CharTable`].

use crate::char_table::CharTable;
use crate::error::AstError;
use crate::error::AstResult;
use crate::types::SyntaxKind;
use crate::types::TextRange;
use std::sync::Arc;

/// Handle to a node inside one lightweight tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub u32);

impl NodeRef {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Read-only view over a lightweight parse tree.
pub trait LighterAst {
    /// Root node (the file).
    fn root(&self) -> NodeRef;

    /// Ordered children of `node`, tokens included.
    fn children(&self, node: NodeRef) -> &[NodeRef];

    fn kind(&self, node: NodeRef) -> SyntaxKind;

    fn range(&self, node: NodeRef) -> TextRange;

    /// Whole source buffer the tree was parsed from.
    fn source(&self) -> &str;

    /// Interning table of the parse session that produced the tree.
    fn char_table(&self) -> &CharTable;

    /// Raw source text covered by `node`.
    fn text(&self, node: NodeRef) -> &str {
        self.source().get(self.range(node).as_range()).unwrap_or("")
    }

    /// First direct child of the given kind.
    fn first_child_of_kind(&self, node: NodeRef, kind: SyntaxKind) -> Option<NodeRef> {
        self.children(node)
            .iter()
            .copied()
            .find(|child| self.kind(*child) == kind)
    }

    /// Interned text of `node`.
    fn intern(&self, node: NodeRef) -> Arc<str> {
        self.char_table().intern(self.text(node))
    }
}

#[derive(Debug, Clone)]
struct FlatNode {
    kind: SyntaxKind,
    range: TextRange,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

/// Arena-backed lightweight tree, nodes stored in preorder.
#[derive(Debug)]
pub struct FlatTree {
    source: Arc<str>,
    nodes: Vec<FlatNode>,
    char_table: CharTable,
}

impl FlatTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes.get(node.index()).and_then(|n| n.parent)
    }

    pub fn source_arc(&self) -> &Arc<str> {
        &self.source
    }

    /// Every node in preorder.
    pub fn preorder(&self) -> impl Iterator<Item = NodeRef> + '_ {
        (0..self.nodes.len() as u32).map(NodeRef)
    }

    /// Indented outline of the tree, one node per line.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let kind = self.kind(node);
            out.push_str(&"  ".repeat(depth));
            out.push_str(kind.name());
            if kind.is_token() {
                out.push_str(&format!(" {:?}", self.text(node)));
            }
            out.push('\n');
            for child in self.children(node).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }
}

impl LighterAst for FlatTree {
    fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    fn children(&self, node: NodeRef) -> &[NodeRef] {
        self.nodes
            .get(node.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn kind(&self, node: NodeRef) -> SyntaxKind {
        self.nodes
            .get(node.index())
            .map(|n| n.kind)
            .unwrap_or(SyntaxKind::ErrorElement)
    }

    fn range(&self, node: NodeRef) -> TextRange {
        self.nodes
            .get(node.index())
            .map(|n| n.range)
            .unwrap_or_default()
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn char_table(&self) -> &CharTable {
        &self.char_table
    }
}

/// Incremental builder for [`FlatTree`], driven in preorder.
///
/// ```
/// use stubindex_ast::FlatTreeBuilder;
/// use stubindex_ast::SyntaxKind;
///
/// let mut builder = FlatTreeBuilder::new("class A {}");
/// builder.start_node(SyntaxKind::JavaFile, 0);
/// builder.start_node(SyntaxKind::Class, 0);
/// builder.token(SyntaxKind::Keyword, 0, 5);
/// builder.token(SyntaxKind::Identifier, 6, 7);
/// builder.finish_node(10);
/// builder.finish_node(10);
/// let tree = builder.finish().unwrap();
/// assert_eq!(tree.len(), 4);
/// ```
#[derive(Debug)]
pub struct FlatTreeBuilder {
    source: Arc<str>,
    nodes: Vec<FlatNode>,
    open: Vec<NodeRef>,
}

impl FlatTreeBuilder {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            nodes: Vec::new(),
            open: Vec::new(),
        }
    }

    fn push(&mut self, kind: SyntaxKind, range: TextRange) -> NodeRef {
        let id = NodeRef(self.nodes.len() as u32);
        let parent = self.open.last().copied();
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        self.nodes.push(FlatNode {
            kind,
            range,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Open a composite node starting at `start`.
    pub fn start_node(&mut self, kind: SyntaxKind, start: u32) -> NodeRef {
        let id = self.push(kind, TextRange::empty(start));
        self.open.push(id);
        id
    }

    /// Close the innermost open node at `end`.
    pub fn finish_node(&mut self, end: u32) {
        if let Some(node) = self.open.pop() {
            let range = &mut self.nodes[node.index()].range;
            range.end = end.max(range.start);
        }
    }

    /// Add a leaf under the innermost open node.
    pub fn token(&mut self, kind: SyntaxKind, start: u32, end: u32) -> NodeRef {
        self.push(kind, TextRange::new(start, end.max(start)))
    }

    pub fn finish(self) -> AstResult<FlatTree> {
        if !self.open.is_empty() {
            return Err(AstError::InvalidNode(format!(
                "{} node(s) left open",
                self.open.len()
            )));
        }
        if self.nodes.is_empty() {
            return Err(AstError::InvalidNode("empty tree".to_string()));
        }
        let len = self.source.len();
        if let Some(node) = self.nodes.iter().find(|n| n.range.end as usize > len) {
            return Err(AstError::InvalidNode(format!(
                "{} range {} exceeds source length {}",
                node.kind, node.range, len
            )));
        }
        Ok(FlatTree {
            source: self.source,
            nodes: self.nodes,
            char_table: CharTable::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> FlatTree {
        let mut b = FlatTreeBuilder::new("class Foo { int x; }");
        b.start_node(SyntaxKind::JavaFile, 0);
        b.start_node(SyntaxKind::Class, 0);
        b.token(SyntaxKind::Keyword, 0, 5);
        b.token(SyntaxKind::Identifier, 6, 9);
        b.start_node(SyntaxKind::Field, 12);
        b.start_node(SyntaxKind::Type, 12);
        b.token(SyntaxKind::Keyword, 12, 15);
        b.finish_node(15);
        b.token(SyntaxKind::Identifier, 16, 17);
        b.finish_node(18);
        b.finish_node(20);
        b.finish_node(20);
        b.finish().unwrap()
    }

    #[test]
    fn test_structure_and_text() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(tree.kind(root), SyntaxKind::JavaFile);

        let class = tree.children(root)[0];
        assert_eq!(tree.kind(class), SyntaxKind::Class);
        let name = tree.first_child_of_kind(class, SyntaxKind::Identifier).unwrap();
        assert_eq!(tree.text(name), "Foo");
        assert_eq!(tree.parent(name), Some(class));

        let field = tree.first_child_of_kind(class, SyntaxKind::Field).unwrap();
        assert_eq!(tree.text(field), "int x;");
    }

    #[test]
    fn test_preorder_matches_insertion() {
        let tree = sample();
        let kinds: Vec<SyntaxKind> = tree.preorder().map(|n| tree.kind(n)).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::JavaFile,
                SyntaxKind::Class,
                SyntaxKind::Keyword,
                SyntaxKind::Identifier,
                SyntaxKind::Field,
                SyntaxKind::Type,
                SyntaxKind::Keyword,
                SyntaxKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_intern_goes_through_char_table() {
        let tree = sample();
        let class = tree.children(tree.root())[0];
        let name = tree.first_child_of_kind(class, SyntaxKind::Identifier).unwrap();
        let a = tree.intern(name);
        let b = tree.char_table().intern("Foo");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_debug_dump_of_deep_tree() {
        let mut b = FlatTreeBuilder::new("");
        b.start_node(SyntaxKind::JavaFile, 0);
        for _ in 0..20_000 {
            b.start_node(SyntaxKind::Class, 0);
        }
        for _ in 0..20_000 {
            b.finish_node(0);
        }
        b.finish_node(0);
        let tree = b.finish().unwrap();

        let dump = tree.debug_dump();
        assert_eq!(dump.lines().count(), 20_001);
        assert_eq!(dump.lines().nth(2), Some("    CLASS"));
    }

    #[test]
    fn test_unbalanced_builder_fails() {
        let mut b = FlatTreeBuilder::new("x");
        b.start_node(SyntaxKind::JavaFile, 0);
        assert!(b.finish().is_err());
    }
}
