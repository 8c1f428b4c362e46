//! Core types for lightweight parse trees

use std::fmt;
use std::ops::Range;

/// Kind of a node in a lightweight parse tree.
///
/// Composite kinds mirror the declarative skeleton of a Java file; token kinds
/// are deliberately coarse (the text disambiguates keywords and punctuation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum SyntaxKind {
    // Composite elements
    JavaFile,
    PackageStatement,
    ImportStatement,
    ImportStaticStatement,
    Class,
    Method,
    AnnotationMethod,
    Field,
    EnumConstant,
    ParameterList,
    Parameter,
    TypeParameterList,
    TypeParameter,
    ModifierList,
    Annotation,
    AnnotationParameterList,
    NameValuePair,
    ExtendsList,
    ImplementsList,
    ThrowsList,
    ExtendsBoundList,
    Module,
    RequiresStatement,
    ExportsStatement,
    OpensStatement,
    UsesStatement,
    ProvidesStatement,
    Type,
    JavaCodeReference,
    CodeBlock,
    Expression,
    ErrorElement,
    Other,

    // Tokens
    Identifier,
    Keyword,
    Literal,
    Punctuation,
    Comment,
}

impl SyntaxKind {
    /// Tokens are leaves; everything else may have children.
    pub const fn is_token(self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::Keyword | Self::Literal | Self::Punctuation | Self::Comment
        )
    }

    /// Stable upper-case name used as the debug id of element types.
    pub const fn name(self) -> &'static str {
        match self {
            Self::JavaFile => "JAVA_FILE",
            Self::PackageStatement => "PACKAGE_STATEMENT",
            Self::ImportStatement => "IMPORT_STATEMENT",
            Self::ImportStaticStatement => "IMPORT_STATIC_STATEMENT",
            Self::Class => "CLASS",
            Self::Method => "METHOD",
            Self::AnnotationMethod => "ANNOTATION_METHOD",
            Self::Field => "FIELD",
            Self::EnumConstant => "ENUM_CONSTANT",
            Self::ParameterList => "PARAMETER_LIST",
            Self::Parameter => "PARAMETER",
            Self::TypeParameterList => "TYPE_PARAMETER_LIST",
            Self::TypeParameter => "TYPE_PARAMETER",
            Self::ModifierList => "MODIFIER_LIST",
            Self::Annotation => "ANNOTATION",
            Self::AnnotationParameterList => "ANNOTATION_PARAMETER_LIST",
            Self::NameValuePair => "NAME_VALUE_PAIR",
            Self::ExtendsList => "EXTENDS_LIST",
            Self::ImplementsList => "IMPLEMENTS_LIST",
            Self::ThrowsList => "THROWS_LIST",
            Self::ExtendsBoundList => "EXTENDS_BOUND_LIST",
            Self::Module => "MODULE",
            Self::RequiresStatement => "REQUIRES_STATEMENT",
            Self::ExportsStatement => "EXPORTS_STATEMENT",
            Self::OpensStatement => "OPENS_STATEMENT",
            Self::UsesStatement => "USES_STATEMENT",
            Self::ProvidesStatement => "PROVIDES_STATEMENT",
            Self::Type => "TYPE",
            Self::JavaCodeReference => "JAVA_CODE_REFERENCE",
            Self::CodeBlock => "CODE_BLOCK",
            Self::Expression => "EXPRESSION",
            Self::ErrorElement => "ERROR_ELEMENT",
            Self::Other => "OTHER",
            Self::Identifier => "IDENTIFIER",
            Self::Keyword => "KEYWORD",
            Self::Literal => "LITERAL",
            Self::Punctuation => "PUNCTUATION",
            Self::Comment => "COMMENT",
        }
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-open byte range into the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub const fn empty(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub const fn as_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Collapse every whitespace run to a single space and trim both ends.
///
/// Used for type and reference texts so that stub payloads do not depend on
/// source formatting.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Map<String,\n   Integer> "), "Map<String, Integer>");
        assert_eq!(normalize_text("java . util"), "java . util");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_token_kinds() {
        assert!(SyntaxKind::Identifier.is_token());
        assert!(!SyntaxKind::Class.is_token());
        assert_eq!(SyntaxKind::NameValuePair.name(), "NAME_VALUE_PAIR");
    }
}
