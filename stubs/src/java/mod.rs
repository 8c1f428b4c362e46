//! Java stub element types.

pub mod flags;
pub mod payload;
pub mod types;

use crate::error::StubResult;
use crate::index::StubIndexKey;
use crate::registry::ElementTypeRegistry;
use crate::registry::RegistryBuilder;
use flags::ModifierFlags;
use std::sync::Arc;
use stubindex_ast::LighterAst;
use stubindex_ast::NodeRef;
use stubindex_ast::SyntaxKind;
use stubindex_ast::normalize_text;
use types::AnnotationElementType;
use types::ClassElementType;
use types::EmptyElementType;
use types::FieldElementType;
use types::FileElementType;
use types::ImportElementType;
use types::MarkerElementType;
use types::MethodElementType;
use types::ModifierListElementType;
use types::ModuleElementType;
use types::ModuleReferenceElementType;
use types::NameValuePairElementType;
use types::PackageElementType;
use types::ParameterElementType;
use types::ReferenceListElementType;
use types::RequiresElementType;
use types::TypeParameterElementType;

/// Current Java stub format version.
pub const JAVA_STUB_VERSION: u32 = 1;

pub const JAVA_LANGUAGE_ID: &str = "java";

pub const PACKAGE_INDEX: StubIndexKey = StubIndexKey::string("java.package");
pub const CLASS_SHORT_NAME_INDEX: StubIndexKey = StubIndexKey::string("java.class.shortname");
pub const CLASS_FQN_INDEX: StubIndexKey = StubIndexKey::string("java.class.fqn");
pub const METHOD_NAME_INDEX: StubIndexKey = StubIndexKey::string("java.method.name");
pub const METHOD_PARAMETER_COUNT_INDEX: StubIndexKey =
    StubIndexKey::int("java.method.parameter.count");
pub const FIELD_NAME_INDEX: StubIndexKey = StubIndexKey::string("java.field.name");
pub const ANNOTATION_INDEX: StubIndexKey = StubIndexKey::string("java.annotations");
pub const ANNOTATION_ATTRIBUTE_NAME_INDEX: StubIndexKey = StubIndexKey::string("annoAttrName");
pub const SUPER_CLASS_INDEX: StubIndexKey = StubIndexKey::string("java.class.extlist");
pub const MODULE_NAME_INDEX: StubIndexKey = StubIndexKey::string("java.module.name");

/// Register the Java catalogue in its fixed order.
///
/// Types added later go after the existing ones so that ids already written
/// to stored streams keep their meaning.
pub fn register_all(builder: &mut RegistryBuilder) -> StubResult<()> {
    let version = builder.version();
    builder.register(Arc::new(FileElementType::new(version)))?;
    builder.register(Arc::new(PackageElementType))?;
    builder.register(Arc::new(ImportElementType::new(
        "IMPORT_STATEMENT",
        SyntaxKind::ImportStatement,
        false,
    )))?;
    builder.register(Arc::new(ImportElementType::new(
        "IMPORT_STATIC_STATEMENT",
        SyntaxKind::ImportStaticStatement,
        true,
    )))?;
    builder.register(Arc::new(ClassElementType))?;
    builder.register(Arc::new(MethodElementType::new(
        "METHOD",
        SyntaxKind::Method,
        false,
    )))?;
    builder.register(Arc::new(MethodElementType::new(
        "ANNOTATION_METHOD",
        SyntaxKind::AnnotationMethod,
        true,
    )))?;
    builder.register(Arc::new(FieldElementType::new(
        "FIELD",
        SyntaxKind::Field,
        false,
    )))?;
    builder.register(Arc::new(FieldElementType::new(
        "ENUM_CONSTANT",
        SyntaxKind::EnumConstant,
        true,
    )))?;
    builder.register(Arc::new(EmptyElementType::new(
        "PARAMETER_LIST",
        SyntaxKind::ParameterList,
    )))?;
    builder.register(Arc::new(ParameterElementType))?;
    builder.register(Arc::new(EmptyElementType::new(
        "TYPE_PARAMETER_LIST",
        SyntaxKind::TypeParameterList,
    )))?;
    builder.register(Arc::new(TypeParameterElementType))?;
    builder.register(Arc::new(ModifierListElementType))?;
    builder.register(Arc::new(AnnotationElementType))?;
    builder.register(Arc::new(NameValuePairElementType))?;
    builder.register(Arc::new(ReferenceListElementType::new(
        "EXTENDS_LIST",
        SyntaxKind::ExtendsList,
        true,
    )))?;
    builder.register(Arc::new(ReferenceListElementType::new(
        "IMPLEMENTS_LIST",
        SyntaxKind::ImplementsList,
        true,
    )))?;
    builder.register(Arc::new(ReferenceListElementType::new(
        "THROWS_LIST",
        SyntaxKind::ThrowsList,
        false,
    )))?;
    builder.register(Arc::new(ReferenceListElementType::new(
        "EXTENDS_BOUND_LIST",
        SyntaxKind::ExtendsBoundList,
        false,
    )))?;

    for kind in [
        SyntaxKind::AnnotationParameterList,
        SyntaxKind::CodeBlock,
        SyntaxKind::Expression,
        SyntaxKind::Type,
        SyntaxKind::JavaCodeReference,
    ] {
        builder.register(Arc::new(MarkerElementType::new(kind)))?;
    }

    builder.register(Arc::new(ModuleElementType))?;
    builder.register(Arc::new(RequiresElementType))?;
    for (name, kind) in [
        ("EXPORTS_STATEMENT", SyntaxKind::ExportsStatement),
        ("OPENS_STATEMENT", SyntaxKind::OpensStatement),
        ("USES_STATEMENT", SyntaxKind::UsesStatement),
        ("PROVIDES_STATEMENT", SyntaxKind::ProvidesStatement),
    ] {
        builder.register(Arc::new(ModuleReferenceElementType::new(name, kind)))?;
    }
    Ok(())
}

/// Registry holding only the Java catalogue at [`JAVA_STUB_VERSION`].
pub fn registry() -> StubResult<ElementTypeRegistry> {
    let mut builder = RegistryBuilder::new(JAVA_STUB_VERSION);
    register_all(&mut builder)?;
    Ok(builder.build())
}

/// Last dotted segment of a reference, type arguments dropped.
pub fn short_name(reference: &str) -> &str {
    let raw = reference.split('<').next().unwrap_or(reference).trim_end();
    raw.rsplit('.').next().unwrap_or(raw).trim()
}

/// First identifier token among the direct children of `node`.
pub(crate) fn identifier(tree: &dyn LighterAst, node: NodeRef) -> Option<Arc<str>> {
    tree.first_child_of_kind(node, SyntaxKind::Identifier)
        .map(|id| tree.intern(id))
}

/// Whitespace-normalized text of `node`, interned.
pub(crate) fn normalized(tree: &dyn LighterAst, node: NodeRef) -> Arc<str> {
    tree.char_table().intern(&normalize_text(tree.text(node)))
}

/// Dotted reference text of `node` with all whitespace removed, interned.
pub(crate) fn reference(tree: &dyn LighterAst, node: NodeRef) -> Option<Arc<str>> {
    let compact: String = tree.text(node).split_whitespace().collect();
    (!compact.is_empty()).then(|| tree.char_table().intern(&compact))
}

/// Reference text of the first code-reference child of `node`.
pub(crate) fn child_reference(tree: &dyn LighterAst, node: NodeRef) -> Option<Arc<str>> {
    tree.first_child_of_kind(node, SyntaxKind::JavaCodeReference)
        .and_then(|r| reference(tree, r))
}

/// Whether `node` has a direct token child of `kind` spelled `text`.
pub(crate) fn has_token(tree: &dyn LighterAst, node: NodeRef, kind: SyntaxKind, text: &str) -> bool {
    tree.children(node)
        .iter()
        .any(|c| tree.kind(*c) == kind && tree.text(*c) == text)
}

/// Modifier keywords of a modifier-list node.
pub(crate) fn modifier_flags(tree: &dyn LighterAst, list: NodeRef) -> ModifierFlags {
    tree.children(list)
        .iter()
        .filter(|c| tree.kind(**c) == SyntaxKind::Keyword)
        .filter_map(|c| ModifierFlags::from_keyword(tree.text(*c)))
        .fold(ModifierFlags::empty(), |acc, flag| acc | flag)
}

/// Modifiers of the declaration `node`, empty when it has no modifier list.
pub(crate) fn declaration_modifiers(tree: &dyn LighterAst, node: NodeRef) -> ModifierFlags {
    tree.first_child_of_kind(node, SyntaxKind::ModifierList)
        .map(|list| modifier_flags(tree, list))
        .unwrap_or_default()
}

/// Whether the modifier list of `node` carries `@Deprecated`.
pub(crate) fn is_deprecated(tree: &dyn LighterAst, node: NodeRef) -> bool {
    let Some(list) = tree.first_child_of_kind(node, SyntaxKind::ModifierList) else {
        return false;
    };
    tree.children(list)
        .iter()
        .filter(|c| tree.kind(**c) == SyntaxKind::Annotation)
        .filter_map(|a| child_reference(tree, *a))
        .any(|name| matches!(&*name, "Deprecated" | "java.lang.Deprecated"))
}
