//! Element type implementations of the Java catalogue.

use super::ANNOTATION_ATTRIBUTE_NAME_INDEX;
use super::ANNOTATION_INDEX;
use super::CLASS_FQN_INDEX;
use super::CLASS_SHORT_NAME_INDEX;
use super::FIELD_NAME_INDEX;
use super::JAVA_LANGUAGE_ID;
use super::METHOD_NAME_INDEX;
use super::METHOD_PARAMETER_COUNT_INDEX;
use super::MODULE_NAME_INDEX;
use super::PACKAGE_INDEX;
use super::SUPER_CLASS_INDEX;
use super::child_reference;
use super::declaration_modifiers;
use super::flags::ClassFlags;
use super::flags::FieldFlags;
use super::flags::ImportFlags;
use super::flags::MethodFlags;
use super::flags::ModifierFlags;
use super::flags::ModuleFlags;
use super::flags::ParameterFlags;
use super::flags::RequiresFlags;
use super::has_token;
use super::identifier;
use super::is_deprecated;
use super::modifier_flags;
use super::normalized;
use super::reference;
use super::payload::AnnotationStubData;
use super::payload::ClassStubData;
use super::payload::FieldStubData;
use super::payload::FileStubData;
use super::payload::ImportStubData;
use super::payload::MethodStubData;
use super::payload::ModifierListStubData;
use super::payload::ModuleReferenceStubData;
use super::payload::ModuleStubData;
use super::payload::NameValuePairStubData;
use super::payload::PackageStubData;
use super::payload::ParameterStubData;
use super::payload::ReferenceListStubData;
use super::payload::RequiresStubData;
use super::payload::TypeParameterStubData;
use super::short_name;
use crate::element_type::StubElementType;
use crate::error::StubError;
use crate::error::StubResult;
use crate::index::IndexKey;
use crate::index::IndexSink;
use crate::stream::StubInputStream;
use crate::stream::StubOutputStream;
use crate::stub::StubPayload;
use std::sync::Arc;
use stubindex_ast::LighterAst;
use stubindex_ast::NodeRef;
use stubindex_ast::SyntaxKind;

fn wrong_payload(element: &dyn StubElementType, payload: &StubPayload) -> StubError {
    StubError::PayloadMismatch(format!(
        "{} cannot write payload {:?}",
        element.debug_name(),
        payload
    ))
}

fn read_flags<F>(input: &mut StubInputStream<'_>, from_bits: fn(u32) -> Option<F>) -> StubResult<F> {
    let offset = input.position();
    let bits = input.read_u32()?;
    from_bits(bits).ok_or_else(|| {
        StubError::PayloadMismatch(format!("unknown flag bits {bits:#x} at {offset}"))
    })
}

#[derive(Debug)]
pub struct FileElementType {
    version: u32,
}

impl FileElementType {
    pub const fn new(version: u32) -> Self {
        Self { version }
    }
}

impl StubElementType for FileElementType {
    fn debug_name(&self) -> &str {
        "java.FILE"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::JavaFile
    }

    fn is_file(&self) -> bool {
        true
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        let package_name = tree
            .first_child_of_kind(node, SyntaxKind::PackageStatement)
            .and_then(|package| child_reference(tree, package));
        StubPayload::File(FileStubData {
            language: tree.char_table().intern(JAVA_LANGUAGE_ID),
            package_name,
            version: self.version,
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::File(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_str(&data.language);
        out.write_name(data.package_name.as_ref());
        out.write_u32(data.version);
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::File(FileStubData {
            language: input.read_str()?,
            package_name: input.read_name()?,
            version: input.read_u32()?,
        }))
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}

#[derive(Debug)]
pub struct PackageElementType;

impl StubElementType for PackageElementType {
    fn debug_name(&self) -> &str {
        "PACKAGE_STATEMENT"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::PackageStatement
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        StubPayload::Package(PackageStubData {
            package_name: child_reference(tree, node),
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Package(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.package_name.as_ref());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Package(PackageStubData {
            package_name: input.read_name()?,
        }))
    }

    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink) {
        if let StubPayload::Package(PackageStubData {
            package_name: Some(name),
        }) = payload
        {
            sink.occurrence(&PACKAGE_INDEX, IndexKey::Str(Arc::clone(name)));
        }
    }
}

/// Single-type and static imports.
#[derive(Debug)]
pub struct ImportElementType {
    name: &'static str,
    kind: SyntaxKind,
    is_static: bool,
}

impl ImportElementType {
    pub const fn new(name: &'static str, kind: SyntaxKind, is_static: bool) -> Self {
        Self {
            name,
            kind,
            is_static,
        }
    }
}

impl StubElementType for ImportElementType {
    fn debug_name(&self) -> &str {
        self.name
    }

    fn syntax_kind(&self) -> SyntaxKind {
        self.kind
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        let mut flags = ImportFlags::empty();
        flags.set(ImportFlags::STATIC, self.is_static);
        flags.set(
            ImportFlags::ON_DEMAND,
            has_token(tree, node, SyntaxKind::Punctuation, "*"),
        );
        StubPayload::Import(ImportStubData {
            reference: child_reference(tree, node),
            flags,
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Import(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.reference.as_ref());
        out.write_u32(data.flags.bits());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Import(ImportStubData {
            reference: input.read_name()?,
            flags: read_flags(input, ImportFlags::from_bits)?,
        }))
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}

/// Classes, interfaces, enums, records and annotation types.
#[derive(Debug)]
pub struct ClassElementType;

impl ClassElementType {
    fn qualified_name(parent: Option<&StubPayload>, name: &str) -> Option<String> {
        match parent {
            Some(StubPayload::File(file)) => Some(match &file.package_name {
                Some(package) => format!("{package}.{name}"),
                None => name.to_string(),
            }),
            Some(StubPayload::Class(outer)) => outer
                .qualified_name
                .as_ref()
                .map(|outer| format!("{outer}.{name}")),
            _ => None,
        }
    }
}

impl StubElementType for ClassElementType {
    fn debug_name(&self) -> &str {
        "CLASS"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::Class
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, parent: Option<&StubPayload>) -> StubPayload {
        let mut flags = ClassFlags::empty();
        for child in tree.children(node) {
            if tree.kind(*child) != SyntaxKind::Keyword {
                continue;
            }
            match tree.text(*child) {
                "interface" => flags |= ClassFlags::INTERFACE,
                "@interface" => flags |= ClassFlags::INTERFACE | ClassFlags::ANNOTATION_TYPE,
                "enum" => flags |= ClassFlags::ENUM,
                "record" => flags |= ClassFlags::RECORD,
                _ => {}
            }
        }
        flags.set(ClassFlags::DEPRECATED, is_deprecated(tree, node));
        flags.set(
            ClassFlags::HAS_TYPE_PARAMETERS,
            tree.first_child_of_kind(node, SyntaxKind::TypeParameterList)
                .is_some(),
        );

        let name = identifier(tree, node);
        let qualified_name = name
            .as_deref()
            .and_then(|name| Self::qualified_name(parent, name))
            .map(|q| tree.char_table().intern(&q));
        StubPayload::Class(ClassStubData {
            name,
            qualified_name,
            flags,
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Class(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.name.as_ref());
        out.write_name(data.qualified_name.as_ref());
        out.write_u32(data.flags.bits());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Class(ClassStubData {
            name: input.read_name()?,
            qualified_name: input.read_name()?,
            flags: read_flags(input, ClassFlags::from_bits)?,
        }))
    }

    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink) {
        let StubPayload::Class(data) = payload else {
            return;
        };
        if let Some(name) = &data.name {
            sink.occurrence(&CLASS_SHORT_NAME_INDEX, IndexKey::Str(Arc::clone(name)));
        }
        if let Some(fqn) = &data.qualified_name {
            sink.occurrence(&CLASS_FQN_INDEX, IndexKey::Str(Arc::clone(fqn)));
        }
    }
}

/// Methods, constructors and annotation methods.
#[derive(Debug)]
pub struct MethodElementType {
    name: &'static str,
    kind: SyntaxKind,
    annotation_method: bool,
}

impl MethodElementType {
    pub const fn new(name: &'static str, kind: SyntaxKind, annotation_method: bool) -> Self {
        Self {
            name,
            kind,
            annotation_method,
        }
    }
}

impl StubElementType for MethodElementType {
    fn debug_name(&self) -> &str {
        self.name
    }

    fn syntax_kind(&self) -> SyntaxKind {
        self.kind
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        let return_type = tree
            .first_child_of_kind(node, SyntaxKind::Type)
            .map(|t| normalized(tree, t));
        let default_value = tree
            .first_child_of_kind(node, SyntaxKind::Expression)
            .map(|e| normalized(tree, e));

        let parameters: Vec<NodeRef> = tree
            .first_child_of_kind(node, SyntaxKind::ParameterList)
            .map(|list| {
                tree.children(list)
                    .iter()
                    .copied()
                    .filter(|c| tree.kind(*c) == SyntaxKind::Parameter)
                    .collect()
            })
            .unwrap_or_default();
        let varargs = parameters
            .last()
            .is_some_and(|last| has_token(tree, *last, SyntaxKind::Punctuation, "..."));

        let mut flags = MethodFlags::empty();
        flags.set(MethodFlags::ANNOTATION_METHOD, self.annotation_method);
        flags.set(
            MethodFlags::CONSTRUCTOR,
            !self.annotation_method && return_type.is_none(),
        );
        flags.set(MethodFlags::VARARGS, varargs);
        flags.set(MethodFlags::HAS_DEFAULT_VALUE, default_value.is_some());
        flags.set(MethodFlags::DEPRECATED, is_deprecated(tree, node));

        StubPayload::Method(MethodStubData {
            name: identifier(tree, node),
            return_type,
            default_value,
            parameter_count: parameters.len() as u32,
            flags,
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Method(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.name.as_ref());
        out.write_name(data.return_type.as_ref());
        out.write_name(data.default_value.as_ref());
        out.write_u32(data.parameter_count);
        out.write_u32(data.flags.bits());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Method(MethodStubData {
            name: input.read_name()?,
            return_type: input.read_name()?,
            default_value: input.read_name()?,
            parameter_count: input.read_u32()?,
            flags: read_flags(input, MethodFlags::from_bits)?,
        }))
    }

    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink) {
        let StubPayload::Method(data) = payload else {
            return;
        };
        if let Some(name) = &data.name {
            sink.occurrence(&METHOD_NAME_INDEX, IndexKey::Str(Arc::clone(name)));
        }
        sink.occurrence(
            &METHOD_PARAMETER_COUNT_INDEX,
            IndexKey::Int(i64::from(data.parameter_count)),
        );
    }
}

/// Fields and enum constants.
#[derive(Debug)]
pub struct FieldElementType {
    name: &'static str,
    kind: SyntaxKind,
    enum_constant: bool,
}

impl FieldElementType {
    pub const fn new(name: &'static str, kind: SyntaxKind, enum_constant: bool) -> Self {
        Self {
            name,
            kind,
            enum_constant,
        }
    }
}

impl StubElementType for FieldElementType {
    fn debug_name(&self) -> &str {
        self.name
    }

    fn syntax_kind(&self) -> SyntaxKind {
        self.kind
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        let mut flags = FieldFlags::empty();
        flags.set(FieldFlags::ENUM_CONSTANT, self.enum_constant);
        flags.set(FieldFlags::DEPRECATED, is_deprecated(tree, node));

        let mut initializer = None;
        if !self.enum_constant
            && let Some(expr) = tree.first_child_of_kind(node, SyntaxKind::Expression)
        {
            flags |= FieldFlags::HAS_INITIALIZER;
            if declaration_modifiers(tree, node).contains(ModifierFlags::FINAL) {
                initializer = Some(normalized(tree, expr));
            }
        }

        StubPayload::Field(FieldStubData {
            name: identifier(tree, node),
            type_text: tree
                .first_child_of_kind(node, SyntaxKind::Type)
                .map(|t| normalized(tree, t)),
            initializer,
            flags,
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Field(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.name.as_ref());
        out.write_name(data.type_text.as_ref());
        out.write_name(data.initializer.as_ref());
        out.write_u32(data.flags.bits());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Field(FieldStubData {
            name: input.read_name()?,
            type_text: input.read_name()?,
            initializer: input.read_name()?,
            flags: read_flags(input, FieldFlags::from_bits)?,
        }))
    }

    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink) {
        if let StubPayload::Field(FieldStubData {
            name: Some(name), ..
        }) = payload
        {
            sink.occurrence(&FIELD_NAME_INDEX, IndexKey::Str(Arc::clone(name)));
        }
    }
}

/// Stubs that only group their children: parameter and type-parameter lists.
#[derive(Debug)]
pub struct EmptyElementType {
    name: &'static str,
    kind: SyntaxKind,
}

impl EmptyElementType {
    pub const fn new(name: &'static str, kind: SyntaxKind) -> Self {
        Self { name, kind }
    }
}

impl StubElementType for EmptyElementType {
    fn debug_name(&self) -> &str {
        self.name
    }

    fn syntax_kind(&self) -> SyntaxKind {
        self.kind
    }

    fn create_stub(&self, _tree: &dyn LighterAst, _node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        StubPayload::Empty
    }

    fn serialize(&self, payload: &StubPayload, _out: &mut StubOutputStream) -> StubResult<()> {
        match payload {
            StubPayload::Empty => Ok(()),
            other => Err(wrong_payload(self, other)),
        }
    }

    fn deserialize(&self, _input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Empty)
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}

#[derive(Debug)]
pub struct ParameterElementType;

impl StubElementType for ParameterElementType {
    fn debug_name(&self) -> &str {
        "PARAMETER"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::Parameter
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        let mut flags = ParameterFlags::empty();
        flags.set(
            ParameterFlags::VARARGS,
            has_token(tree, node, SyntaxKind::Punctuation, "..."),
        );
        StubPayload::Parameter(ParameterStubData {
            name: identifier(tree, node),
            type_text: tree
                .first_child_of_kind(node, SyntaxKind::Type)
                .map(|t| normalized(tree, t)),
            flags,
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Parameter(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.name.as_ref());
        out.write_name(data.type_text.as_ref());
        out.write_u32(data.flags.bits());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Parameter(ParameterStubData {
            name: input.read_name()?,
            type_text: input.read_name()?,
            flags: read_flags(input, ParameterFlags::from_bits)?,
        }))
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}

#[derive(Debug)]
pub struct TypeParameterElementType;

impl StubElementType for TypeParameterElementType {
    fn debug_name(&self) -> &str {
        "TYPE_PARAMETER"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::TypeParameter
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        StubPayload::TypeParameter(TypeParameterStubData {
            name: identifier(tree, node),
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::TypeParameter(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.name.as_ref());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::TypeParameter(TypeParameterStubData {
            name: input.read_name()?,
        }))
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}

#[derive(Debug)]
pub struct ModifierListElementType;

impl StubElementType for ModifierListElementType {
    fn debug_name(&self) -> &str {
        "MODIFIER_LIST"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::ModifierList
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        StubPayload::ModifierList(ModifierListStubData {
            modifiers: modifier_flags(tree, node),
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::ModifierList(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_u32(data.modifiers.bits());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::ModifierList(ModifierListStubData {
            modifiers: read_flags(input, ModifierFlags::from_bits)?,
        }))
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}

#[derive(Debug)]
pub struct AnnotationElementType;

impl StubElementType for AnnotationElementType {
    fn debug_name(&self) -> &str {
        "ANNOTATION"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::Annotation
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        StubPayload::Annotation(AnnotationStubData {
            qualified_name: child_reference(tree, node),
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Annotation(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.qualified_name.as_ref());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Annotation(AnnotationStubData {
            qualified_name: input.read_name()?,
        }))
    }

    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink) {
        if let StubPayload::Annotation(data) = payload
            && let Some(short) = data.short_name()
        {
            sink.occurrence(&ANNOTATION_INDEX, IndexKey::from(short));
        }
    }
}

/// `name = value` inside an annotation argument list.
#[derive(Debug)]
pub struct NameValuePairElementType;

impl StubElementType for NameValuePairElementType {
    fn debug_name(&self) -> &str {
        "NAME_VALUE_PAIR"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::NameValuePair
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        StubPayload::NameValuePair(NameValuePairStubData {
            name: identifier(tree, node),
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::NameValuePair(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.name.as_ref());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::NameValuePair(NameValuePairStubData {
            name: input.read_name()?,
        }))
    }

    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink) {
        if let StubPayload::NameValuePair(NameValuePairStubData { name: Some(name) }) = payload {
            sink.occurrence(&ANNOTATION_ATTRIBUTE_NAME_INDEX, IndexKey::Str(Arc::clone(name)));
        }
    }
}

/// Lists of type references.
#[derive(Debug)]
pub struct ReferenceListElementType {
    name: &'static str,
    kind: SyntaxKind,
    indexes_supertypes: bool,
}

impl ReferenceListElementType {
    pub const fn new(name: &'static str, kind: SyntaxKind, indexes_supertypes: bool) -> Self {
        Self {
            name,
            kind,
            indexes_supertypes,
        }
    }
}

impl StubElementType for ReferenceListElementType {
    fn debug_name(&self) -> &str {
        self.name
    }

    fn syntax_kind(&self) -> SyntaxKind {
        self.kind
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        let references = tree
            .children(node)
            .iter()
            .filter(|c| tree.kind(**c) == SyntaxKind::JavaCodeReference)
            .map(|c| normalized(tree, *c))
            .collect();
        StubPayload::ReferenceList(ReferenceListStubData { references })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::ReferenceList(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        write_references(&data.references, out);
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::ReferenceList(ReferenceListStubData {
            references: read_references(input)?,
        }))
    }

    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink) {
        if !self.indexes_supertypes {
            return;
        }
        if let StubPayload::ReferenceList(data) = payload {
            for reference in &data.references {
                sink.occurrence(&SUPER_CLASS_INDEX, IndexKey::from(short_name(reference)));
            }
        }
    }
}

fn read_references(input: &mut StubInputStream<'_>) -> StubResult<Vec<Arc<str>>> {
    let count = input.read_u32()? as usize;
    if count > input.remaining() {
        return Err(StubError::TruncatedStream {
            offset: input.position(),
        });
    }
    let mut references = Vec::with_capacity(count);
    for _ in 0..count {
        references.push(input.read_str()?);
    }
    Ok(references)
}

fn write_references(references: &[Arc<str>], out: &mut StubOutputStream) {
    out.write_u32(references.len() as u32);
    for reference in references {
        out.write_str(reference);
    }
}

/// Code-reference children of `node` in source order.
fn references_of(tree: &dyn LighterAst, node: NodeRef) -> Vec<Arc<str>> {
    tree.children(node)
        .iter()
        .filter(|c| tree.kind(**c) == SyntaxKind::JavaCodeReference)
        .filter_map(|c| reference(tree, *c))
        .collect()
}

/// `module` declarations of `module-info.java`.
#[derive(Debug)]
pub struct ModuleElementType;

impl StubElementType for ModuleElementType {
    fn debug_name(&self) -> &str {
        "MODULE"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::Module
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        let mut flags = ModuleFlags::empty();
        flags.set(
            ModuleFlags::OPEN,
            has_token(tree, node, SyntaxKind::Keyword, "open"),
        );
        StubPayload::Module(ModuleStubData {
            name: child_reference(tree, node),
            flags,
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Module(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.name.as_ref());
        out.write_u32(data.flags.bits());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Module(ModuleStubData {
            name: input.read_name()?,
            flags: read_flags(input, ModuleFlags::from_bits)?,
        }))
    }

    fn index_stub(&self, payload: &StubPayload, sink: &mut dyn IndexSink) {
        if let StubPayload::Module(ModuleStubData {
            name: Some(name), ..
        }) = payload
        {
            sink.occurrence(&MODULE_NAME_INDEX, IndexKey::Str(Arc::clone(name)));
        }
    }
}

#[derive(Debug)]
pub struct RequiresElementType;

impl StubElementType for RequiresElementType {
    fn debug_name(&self) -> &str {
        "REQUIRES_STATEMENT"
    }

    fn syntax_kind(&self) -> SyntaxKind {
        SyntaxKind::RequiresStatement
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        // The modifiers are contextual keywords; match them by text only.
        let mut flags = RequiresFlags::empty();
        for child in tree.children(node) {
            match tree.text(*child) {
                "transitive" => flags |= RequiresFlags::TRANSITIVE,
                "static" => flags |= RequiresFlags::STATIC,
                _ => {}
            }
        }
        StubPayload::Requires(RequiresStubData {
            module_name: child_reference(tree, node),
            flags,
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::Requires(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.module_name.as_ref());
        out.write_u32(data.flags.bits());
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::Requires(RequiresStubData {
            module_name: input.read_name()?,
            flags: read_flags(input, RequiresFlags::from_bits)?,
        }))
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}

/// `exports`, `opens`, `uses` and `provides`: a leading reference followed
/// by target modules or provider types.
#[derive(Debug)]
pub struct ModuleReferenceElementType {
    name: &'static str,
    kind: SyntaxKind,
}

impl ModuleReferenceElementType {
    pub const fn new(name: &'static str, kind: SyntaxKind) -> Self {
        Self { name, kind }
    }
}

impl StubElementType for ModuleReferenceElementType {
    fn debug_name(&self) -> &str {
        self.name
    }

    fn syntax_kind(&self) -> SyntaxKind {
        self.kind
    }

    fn create_stub(&self, tree: &dyn LighterAst, node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        let mut references = references_of(tree, node).into_iter();
        let reference = references.next();
        StubPayload::ModuleReference(ModuleReferenceStubData {
            reference,
            targets: references.collect(),
        })
    }

    fn serialize(&self, payload: &StubPayload, out: &mut StubOutputStream) -> StubResult<()> {
        let StubPayload::ModuleReference(data) = payload else {
            return Err(wrong_payload(self, payload));
        };
        out.write_name(data.reference.as_ref());
        write_references(&data.targets, out);
        Ok(())
    }

    fn deserialize(&self, input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Ok(StubPayload::ModuleReference(ModuleReferenceStubData {
            reference: input.read_name()?,
            targets: read_references(input)?,
        }))
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}

/// Parse kinds that are known to the registry but never stubbed.
#[derive(Debug)]
pub struct MarkerElementType {
    kind: SyntaxKind,
}

impl MarkerElementType {
    pub const fn new(kind: SyntaxKind) -> Self {
        Self { kind }
    }
}

impl StubElementType for MarkerElementType {
    fn debug_name(&self) -> &str {
        self.kind.name()
    }

    fn syntax_kind(&self) -> SyntaxKind {
        self.kind
    }

    fn is_stubbed(&self) -> bool {
        false
    }

    fn create_stub(&self, _tree: &dyn LighterAst, _node: NodeRef, _parent: Option<&StubPayload>) -> StubPayload {
        StubPayload::Empty
    }

    fn serialize(&self, _payload: &StubPayload, _out: &mut StubOutputStream) -> StubResult<()> {
        Err(StubError::PayloadMismatch(format!(
            "{} is not stubbed",
            self.kind
        )))
    }

    fn deserialize(&self, _input: &mut StubInputStream<'_>, _parent: Option<&StubPayload>) -> StubResult<StubPayload> {
        Err(StubError::PayloadMismatch(format!(
            "{} is not stubbed",
            self.kind
        )))
    }

    fn index_stub(&self, _payload: &StubPayload, _sink: &mut dyn IndexSink) {}
}
