//! Lowering of tree-sitter-java trees into lightweight trees.
//!
//! The lowering reshapes the concrete tree-sitter tree into the skeleton the
//! stub builder expects: every declaration carries a modifier list, each
//! variable declarator of a field becomes its own `FIELD`, a bare annotation
//! argument is wrapped in an unnamed `NAME_VALUE_PAIR`, and bodies of methods
//! and initializers are flattened into opaque `CODE_BLOCK`s.

use crate::error::AstError;
use crate::error::AstResult;
use crate::lighter::FlatTree;
use crate::lighter::FlatTreeBuilder;
use crate::types::SyntaxKind;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tree_sitter::Node;
use tree_sitter::Parser;
use tree_sitter::Tree;

const TYPE_KINDS: &[&str] = &[
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
    "annotated_type",
];

const CLASS_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "annotation_type_declaration",
    "record_declaration",
];

/// Deepest declaration nesting the lowering accepts.
pub const MAX_NESTING_DEPTH: usize = 256;

const BODY_KINDS: &[&str] = &[
    "class_body",
    "interface_body",
    "enum_body",
    "enum_body_declarations",
    "annotation_type_body",
];

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn is_comment(node: Node<'_>) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment" | "comment")
}

/// Classify a tree-sitter leaf as a lightweight token kind.
fn token_kind(node: Node<'_>) -> SyntaxKind {
    let kind = node.kind();
    if is_comment(node) {
        return SyntaxKind::Comment;
    }
    match kind {
        "identifier" | "type_identifier" => return SyntaxKind::Identifier,
        "true" | "false" | "null_literal" | "string_fragment" | "character_literal" => {
            return SyntaxKind::Literal;
        }
        _ => {}
    }
    if kind.ends_with("_literal") {
        return SyntaxKind::Literal;
    }
    let word = kind.strip_prefix('@').unwrap_or(kind);
    if !node.is_named()
        && !word.is_empty()
        && word.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
    {
        return SyntaxKind::Keyword;
    }
    SyntaxKind::Punctuation
}

/// Converts one tree-sitter tree.
struct Lowering<'a> {
    builder: FlatTreeBuilder,
    cancel: &'a CancellationToken,
    depth: usize,
}

impl<'a> Lowering<'a> {
    fn check_cancelled(&self) -> AstResult<()> {
        if self.cancel.is_cancelled() {
            return Err(AstError::Cancelled);
        }
        Ok(())
    }

    fn start(&mut self, kind: SyntaxKind, node: Node<'_>) {
        self.builder.start_node(kind, node.start_byte() as u32);
    }

    fn finish(&mut self, node: Node<'_>) {
        self.builder.finish_node(node.end_byte() as u32);
    }

    fn leaf(&mut self, node: Node<'_>) {
        if node.is_missing() {
            return;
        }
        self.builder.token(
            token_kind(node),
            node.start_byte() as u32,
            node.end_byte() as u32,
        );
    }

    /// Emit every leaf below `node` as a token of the current open node.
    fn flatten_leaves(&mut self, node: Node<'_>) -> AstResult<()> {
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            self.check_cancelled()?;
            if node.child_count() == 0 || is_comment(node) {
                self.leaf(node);
                continue;
            }
            stack.extend(children(node).into_iter().rev());
        }
        Ok(())
    }

    /// Wrap all leaves of `node` in a single opaque composite.
    fn opaque(&mut self, kind: SyntaxKind, node: Node<'_>) -> AstResult<()> {
        self.start(kind, node);
        self.flatten_leaves(node)?;
        self.finish(node);
        Ok(())
    }

    fn empty_modifier_list(&mut self, at: u32) {
        self.builder.start_node(SyntaxKind::ModifierList, at);
        self.builder.finish_node(at);
    }

    fn file(&mut self, root: Node<'_>) -> AstResult<()> {
        self.builder.start_node(SyntaxKind::JavaFile, 0);
        for child in children(root) {
            self.structural(child)?;
        }
        self.finish(root);
        Ok(())
    }

    /// Lowering for nodes appearing in declaration context.
    ///
    /// Declarations nest through this method, so it is where the depth limit
    /// is enforced.
    fn structural(&mut self, node: Node<'_>) -> AstResult<()> {
        self.check_cancelled()?;
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(AstError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        let result = self.declaration(node);
        self.depth -= 1;
        result
    }

    fn declaration(&mut self, node: Node<'_>) -> AstResult<()> {
        let kind = node.kind();
        match kind {
            "package_declaration" => self.package(node),
            "import_declaration" => self.import(node),
            "module_declaration" => self.module(node),
            k if CLASS_KINDS.contains(&k) => self.class(node),
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                self.method(node, SyntaxKind::Method)
            }
            "annotation_type_element_declaration" => self.method(node, SyntaxKind::AnnotationMethod),
            "field_declaration" | "constant_declaration" => self.fields(node),
            "enum_constant" => self.enum_constant(node),
            "block" | "static_initializer" => self.opaque(SyntaxKind::CodeBlock, node),
            "modifiers" => self.modifiers(node),
            "annotation" | "marker_annotation" => self.annotation(node),
            "ERROR" => {
                self.start(SyntaxKind::ErrorElement, node);
                for child in children(node) {
                    self.structural(child)?;
                }
                self.finish(node);
                Ok(())
            }
            _ if node.child_count() == 0 || is_comment(node) => {
                self.leaf(node);
                Ok(())
            }
            _ => {
                self.start(SyntaxKind::Other, node);
                for child in children(node) {
                    self.structural(child)?;
                }
                self.finish(node);
                Ok(())
            }
        }
    }

    fn package(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::PackageStatement, node);
        for child in children(node) {
            match child.kind() {
                "identifier" | "scoped_identifier" => {
                    self.opaque(SyntaxKind::JavaCodeReference, child)?
                }
                "annotation" | "marker_annotation" => self.annotation(child)?,
                _ => self.leaf(child),
            }
        }
        self.finish(node);
        Ok(())
    }

    fn import(&mut self, node: Node<'_>) -> AstResult<()> {
        let is_static = children(node).iter().any(|c| c.kind() == "static");
        let kind = if is_static {
            SyntaxKind::ImportStaticStatement
        } else {
            SyntaxKind::ImportStatement
        };
        self.start(kind, node);
        for child in children(node) {
            match child.kind() {
                "identifier" | "scoped_identifier" => {
                    self.opaque(SyntaxKind::JavaCodeReference, child)?
                }
                _ => self.flatten_leaves(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    fn module(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::Module, node);
        for child in children(node) {
            match child.kind() {
                "identifier" | "scoped_identifier" => {
                    self.opaque(SyntaxKind::JavaCodeReference, child)?
                }
                "annotation" | "marker_annotation" => self.annotation(child)?,
                "module_body" => {
                    for part in children(child) {
                        if part.kind().ends_with("_module_directive") {
                            self.module_directive(part)?;
                        } else {
                            self.flatten_leaves(part)?;
                        }
                    }
                }
                _ => self.flatten_leaves(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    /// `requires`, `exports`, `opens`, `uses` and `provides`; every name in
    /// the directive becomes a code reference in source order.
    fn module_directive(&mut self, node: Node<'_>) -> AstResult<()> {
        let kind = match node.kind() {
            "requires_module_directive" => SyntaxKind::RequiresStatement,
            "exports_module_directive" => SyntaxKind::ExportsStatement,
            "opens_module_directive" => SyntaxKind::OpensStatement,
            "uses_module_directive" => SyntaxKind::UsesStatement,
            "provides_module_directive" => SyntaxKind::ProvidesStatement,
            _ => return self.flatten_leaves(node),
        };
        self.start(kind, node);
        for child in children(node) {
            match child.kind() {
                "identifier" | "scoped_identifier" => {
                    self.opaque(SyntaxKind::JavaCodeReference, child)?
                }
                _ => self.flatten_leaves(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    fn class(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::Class, node);
        let kids = children(node);
        if !kids.iter().any(|c| c.kind() == "modifiers") {
            self.empty_modifier_list(node.start_byte() as u32);
        }
        for child in kids {
            match child.kind() {
                "modifiers" => self.modifiers(child)?,
                "identifier" => self.leaf(child),
                "type_parameters" => self.type_parameters(child)?,
                "superclass" | "extends_interfaces" => {
                    self.reference_list(SyntaxKind::ExtendsList, child)?
                }
                "super_interfaces" => self.reference_list(SyntaxKind::ImplementsList, child)?,
                "formal_parameters" => self.parameters(child)?,
                k if BODY_KINDS.contains(&k) => self.body(child)?,
                _ => self.structural(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    /// Class bodies are inlined into the class node, braces included.
    fn body(&mut self, node: Node<'_>) -> AstResult<()> {
        for child in children(node) {
            if BODY_KINDS.contains(&child.kind()) {
                self.body(child)?;
            } else {
                self.structural(child)?;
            }
        }
        Ok(())
    }

    fn modifiers(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::ModifierList, node);
        for child in children(node) {
            match child.kind() {
                "annotation" | "marker_annotation" => self.annotation(child)?,
                _ => self.flatten_leaves(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    fn annotation(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::Annotation, node);
        for child in children(node) {
            match child.kind() {
                "identifier" | "scoped_identifier" => {
                    self.opaque(SyntaxKind::JavaCodeReference, child)?
                }
                "annotation_argument_list" => self.annotation_arguments(child)?,
                _ => self.leaf(child),
            }
        }
        self.finish(node);
        Ok(())
    }

    fn annotation_arguments(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::AnnotationParameterList, node);
        for child in children(node) {
            match child.kind() {
                "element_value_pair" => self.name_value_pair(child)?,
                "(" | ")" | "," => self.leaf(child),
                _ if is_comment(child) => self.leaf(child),
                // `@A(1)`: a single unnamed value is an implicit `value` pair.
                _ => {
                    self.start(SyntaxKind::NameValuePair, child);
                    self.opaque(SyntaxKind::Expression, child)?;
                    self.finish(child);
                }
            }
        }
        self.finish(node);
        Ok(())
    }

    fn name_value_pair(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::NameValuePair, node);
        let key = node.child_by_field_name("key");
        for child in children(node) {
            if Some(child) == key || child.kind() == "=" || is_comment(child) {
                self.leaf(child);
            } else {
                self.opaque(SyntaxKind::Expression, child)?;
            }
        }
        self.finish(node);
        Ok(())
    }

    fn type_parameters(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::TypeParameterList, node);
        for child in children(node) {
            if child.kind() == "type_parameter" {
                self.start(SyntaxKind::TypeParameter, child);
                for part in children(child) {
                    match part.kind() {
                        "type_identifier" | "identifier" => self.leaf(part),
                        "type_bound" => self.reference_list(SyntaxKind::ExtendsBoundList, part)?,
                        "annotation" | "marker_annotation" => self.annotation(part)?,
                        _ => self.flatten_leaves(part)?,
                    }
                }
                self.finish(child);
            } else {
                self.leaf(child);
            }
        }
        self.finish(node);
        Ok(())
    }

    /// `extends A`, `implements B, C`, `throws E`, `T extends X & Y`.
    fn reference_list(&mut self, kind: SyntaxKind, node: Node<'_>) -> AstResult<()> {
        self.start(kind, node);
        self.references(node)?;
        self.finish(node);
        Ok(())
    }

    fn references(&mut self, node: Node<'_>) -> AstResult<()> {
        for child in children(node) {
            let kind = child.kind();
            if kind == "type_list" {
                self.references(child)?;
            } else if TYPE_KINDS.contains(&kind) || kind == "identifier" || kind == "scoped_identifier" {
                self.opaque(SyntaxKind::JavaCodeReference, child)?;
            } else {
                self.flatten_leaves(child)?;
            }
        }
        Ok(())
    }

    fn method(&mut self, node: Node<'_>, kind: SyntaxKind) -> AstResult<()> {
        self.start(kind, node);
        let kids = children(node);
        if !kids.iter().any(|c| c.kind() == "modifiers") {
            self.empty_modifier_list(node.start_byte() as u32);
        }
        let return_type = node.child_by_field_name("type");
        let default_value = node.child_by_field_name("value");
        for child in kids {
            match child.kind() {
                "modifiers" => self.modifiers(child)?,
                "type_parameters" => self.type_parameters(child)?,
                "identifier" => self.leaf(child),
                "formal_parameters" => self.parameters(child)?,
                "throws" => self.reference_list(SyntaxKind::ThrowsList, child)?,
                "block" | "constructor_body" => self.opaque(SyntaxKind::CodeBlock, child)?,
                _ if Some(child) == return_type => self.opaque(SyntaxKind::Type, child)?,
                _ if Some(child) == default_value => self.opaque(SyntaxKind::Expression, child)?,
                _ => self.flatten_leaves(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    fn parameters(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::ParameterList, node);
        for child in children(node) {
            match child.kind() {
                "formal_parameter" | "spread_parameter" => self.parameter(child)?,
                _ => self.flatten_leaves(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    fn parameter(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::Parameter, node);
        let kids = children(node);
        if !kids.iter().any(|c| c.kind() == "modifiers") {
            self.empty_modifier_list(node.start_byte() as u32);
        }
        for child in kids {
            match child.kind() {
                "modifiers" => self.modifiers(child)?,
                "identifier" => self.leaf(child),
                // `String... args` keeps its name inside a declarator.
                "variable_declarator" => {
                    for part in children(child) {
                        if part.kind() == "identifier" {
                            self.leaf(part);
                        } else {
                            self.flatten_leaves(part)?;
                        }
                    }
                }
                k if TYPE_KINDS.contains(&k) => self.opaque(SyntaxKind::Type, child)?,
                _ => self.flatten_leaves(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    /// One `FIELD` per variable declarator, each with its own copy of the
    /// modifier list and type.
    fn fields(&mut self, node: Node<'_>) -> AstResult<()> {
        let kids = children(node);
        let modifiers = kids.iter().copied().find(|c| c.kind() == "modifiers");
        let field_type = node.child_by_field_name("type");
        let declarators: Vec<Node<'_>> = kids
            .iter()
            .copied()
            .filter(|c| c.kind() == "variable_declarator")
            .collect();

        for (i, declarator) in declarators.iter().enumerate() {
            let start = if i == 0 {
                node.start_byte()
            } else {
                declarator.start_byte()
            };
            let end = if i + 1 == declarators.len() {
                node.end_byte()
            } else {
                declarator.end_byte()
            };
            self.builder.start_node(SyntaxKind::Field, start as u32);
            match modifiers {
                Some(m) => self.modifiers(m)?,
                None => self.empty_modifier_list(start as u32),
            }
            if let Some(t) = field_type {
                self.opaque(SyntaxKind::Type, t)?;
            }
            self.declarator(*declarator)?;
            self.builder.finish_node(end as u32);
        }
        Ok(())
    }

    fn declarator(&mut self, node: Node<'_>) -> AstResult<()> {
        let value = node.child_by_field_name("value");
        for child in children(node) {
            match child.kind() {
                "identifier" | "=" => self.leaf(child),
                _ if Some(child) == value => self.opaque(SyntaxKind::Expression, child)?,
                _ => self.flatten_leaves(child)?,
            }
        }
        Ok(())
    }

    fn enum_constant(&mut self, node: Node<'_>) -> AstResult<()> {
        self.start(SyntaxKind::EnumConstant, node);
        let kids = children(node);
        if !kids.iter().any(|c| c.kind() == "modifiers") {
            self.empty_modifier_list(node.start_byte() as u32);
        }
        for child in kids {
            match child.kind() {
                "modifiers" => self.modifiers(child)?,
                "identifier" => self.leaf(child),
                "argument_list" => self.opaque(SyntaxKind::Expression, child)?,
                "class_body" => self.opaque(SyntaxKind::CodeBlock, child)?,
                _ => self.flatten_leaves(child)?,
            }
        }
        self.finish(node);
        Ok(())
    }
}

/// Parse Java source with tree-sitter.
pub fn parse_tree_sitter(source: &str) -> AstResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| AstError::ParserError(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| AstError::ParserError("Failed to parse source code".to_string()))
}

/// Lower a tree-sitter-java tree for `source` into a lightweight tree.
pub fn lower(tree: &Tree, source: Arc<str>, cancel: &CancellationToken) -> AstResult<FlatTree> {
    let mut lowering = Lowering {
        builder: FlatTreeBuilder::new(Arc::clone(&source)),
        cancel,
        depth: 0,
    };
    lowering.file(tree.root_node())?;
    lowering.builder.finish()
}

/// Parse Java source straight into a lightweight tree.
pub fn parse_java(source: impl Into<Arc<str>>, cancel: &CancellationToken) -> AstResult<FlatTree> {
    let source = source.into();
    if cancel.is_cancelled() {
        return Err(AstError::Cancelled);
    }
    let tree = parse_tree_sitter(&source)?;
    lower(&tree, source, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighter::LighterAst;
    use crate::lighter::NodeRef;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> FlatTree {
        parse_java(source, &CancellationToken::new()).unwrap()
    }

    fn find_all(tree: &FlatTree, kind: SyntaxKind) -> Vec<NodeRef> {
        tree.preorder().filter(|n| tree.kind(*n) == kind).collect()
    }

    fn child_kinds(tree: &FlatTree, node: NodeRef) -> Vec<SyntaxKind> {
        tree.children(node).iter().map(|c| tree.kind(*c)).collect()
    }

    #[test]
    fn test_class_skeleton() {
        let tree = parse("package a.b;\nimport java.util.List;\npublic class Foo extends Bar implements Baz { }");
        assert_eq!(tree.kind(tree.root()), SyntaxKind::JavaFile);

        let class = find_all(&tree, SyntaxKind::Class)[0];
        let kinds = child_kinds(&tree, class);
        assert!(kinds.contains(&SyntaxKind::ModifierList));
        assert!(kinds.contains(&SyntaxKind::Identifier));
        assert!(kinds.contains(&SyntaxKind::ExtendsList));
        assert!(kinds.contains(&SyntaxKind::ImplementsList));

        let name = tree.first_child_of_kind(class, SyntaxKind::Identifier).unwrap();
        assert_eq!(tree.text(name), "Foo");

        let package = find_all(&tree, SyntaxKind::PackageStatement)[0];
        let reference = tree
            .first_child_of_kind(package, SyntaxKind::JavaCodeReference)
            .unwrap();
        assert_eq!(tree.text(reference), "a.b");
        assert_eq!(find_all(&tree, SyntaxKind::ImportStatement).len(), 1);
    }

    #[test]
    fn test_annotation_pairs() {
        let tree = parse("@A(x = 1, y = 2) class C {}");
        let pairs = find_all(&tree, SyntaxKind::NameValuePair);
        assert_eq!(pairs.len(), 2);
        let names: Vec<&str> = pairs
            .iter()
            .map(|p| {
                let id = tree.first_child_of_kind(*p, SyntaxKind::Identifier).unwrap();
                tree.text(id)
            })
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_bare_annotation_value_is_wrapped() {
        let tree = parse("@A(1) class C {}");
        let pairs = find_all(&tree, SyntaxKind::NameValuePair);
        assert_eq!(pairs.len(), 1);
        assert!(tree.first_child_of_kind(pairs[0], SyntaxKind::Identifier).is_none());
        assert_eq!(child_kinds(&tree, pairs[0]), vec![SyntaxKind::Expression]);
    }

    #[test]
    fn test_field_per_declarator() {
        let tree = parse("class C { private int a = 1, b; }");
        let fields = find_all(&tree, SyntaxKind::Field);
        assert_eq!(fields.len(), 2);
        for field in &fields {
            assert!(tree.first_child_of_kind(*field, SyntaxKind::ModifierList).is_some());
            assert!(tree.first_child_of_kind(*field, SyntaxKind::Type).is_some());
        }
        let second = tree.first_child_of_kind(fields[1], SyntaxKind::Identifier).unwrap();
        assert_eq!(tree.text(second), "b");
    }

    #[test]
    fn test_method_and_parameters() {
        let tree = parse("class C { void run(int a, String... rest) throws E { call(); } }");
        let method = find_all(&tree, SyntaxKind::Method)[0];
        let kinds = child_kinds(&tree, method);
        assert!(kinds.contains(&SyntaxKind::Type));
        assert!(kinds.contains(&SyntaxKind::ParameterList));
        assert!(kinds.contains(&SyntaxKind::ThrowsList));
        assert!(kinds.contains(&SyntaxKind::CodeBlock));

        let params = find_all(&tree, SyntaxKind::Parameter);
        assert_eq!(params.len(), 2);
        let rest = tree.first_child_of_kind(params[1], SyntaxKind::Identifier).unwrap();
        assert_eq!(tree.text(rest), "rest");
    }

    fn nested_classes(depth: usize) -> String {
        let mut source = String::new();
        for i in 0..depth {
            source.push_str(&format!("class C{i} {{ "));
        }
        source.push_str(&"}".repeat(depth));
        source
    }

    #[test]
    fn test_nesting_within_limit() {
        let tree = parse(&nested_classes(100));
        assert_eq!(find_all(&tree, SyntaxKind::Class).len(), 100);
        assert!(tree.debug_dump().lines().count() > 100);
    }

    #[test]
    fn test_deep_nesting_is_refused() {
        let err = parse_java(nested_classes(1000), &CancellationToken::new()).unwrap_err();
        assert_eq!(
            err,
            AstError::NestingTooDeep {
                max: MAX_NESTING_DEPTH
            }
        );
    }

    #[test]
    fn test_deep_expression_is_flattened() {
        let depth = 5000;
        let source = format!(
            "class C {{ int x = {}1{}; }}",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let tree = parse(&source);
        let field = find_all(&tree, SyntaxKind::Field)[0];
        let value = tree.first_child_of_kind(field, SyntaxKind::Expression).unwrap();
        assert_eq!(tree.children(value).len(), 2 * depth + 1);
    }

    #[test]
    fn test_module_declaration() {
        let tree = parse(
            "open module com.example.app {\n\
             requires transitive java.base;\n\
             exports com.example.api to com.example.web, com.example.cli;\n\
             uses com.example.spi.Plugin;\n\
             provides com.example.spi.Plugin with com.example.impl.Default;\n\
             }\n",
        );
        let module = find_all(&tree, SyntaxKind::Module)[0];
        let name = tree
            .first_child_of_kind(module, SyntaxKind::JavaCodeReference)
            .unwrap();
        assert_eq!(tree.text(name), "com.example.app");
        assert!(
            tree.children(module)
                .iter()
                .any(|c| tree.kind(*c) == SyntaxKind::Keyword && tree.text(*c) == "open")
        );

        let kinds = child_kinds(&tree, module);
        for kind in [
            SyntaxKind::RequiresStatement,
            SyntaxKind::ExportsStatement,
            SyntaxKind::UsesStatement,
            SyntaxKind::ProvidesStatement,
        ] {
            assert!(kinds.contains(&kind), "missing {kind}");
        }

        let exports = find_all(&tree, SyntaxKind::ExportsStatement)[0];
        let names: Vec<&str> = tree
            .children(exports)
            .iter()
            .filter(|c| tree.kind(**c) == SyntaxKind::JavaCodeReference)
            .map(|c| tree.text(*c))
            .collect();
        assert_eq!(names, vec!["com.example.api", "com.example.web", "com.example.cli"]);
    }

    #[test]
    fn test_cancelled_parse() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(parse_java("class C {}", &token).unwrap_err(), AstError::Cancelled);
    }
}
