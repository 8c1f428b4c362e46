//! Payload data of Java stubs.
//!
//! Optional strings are `None` when the parse tree had no corresponding
//! token; they serialize as the null string slot.

use super::flags::ClassFlags;
use super::flags::FieldFlags;
use super::flags::ImportFlags;
use super::flags::MethodFlags;
use super::flags::ModifierFlags;
use super::flags::ModuleFlags;
use super::flags::ParameterFlags;
use super::flags::RequiresFlags;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileStubData {
    pub language: Arc<str>,
    /// Package declared by the file, used to qualify top-level classes.
    pub package_name: Option<Arc<str>>,
    /// Format version of the registry that built the stub.
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageStubData {
    pub package_name: Option<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportStubData {
    pub reference: Option<Arc<str>>,
    pub flags: ImportFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassStubData {
    pub name: Option<Arc<str>>,
    pub qualified_name: Option<Arc<str>>,
    pub flags: ClassFlags,
}

/// Shared by methods and annotation methods.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodStubData {
    pub name: Option<Arc<str>>,
    /// `None` for constructors.
    pub return_type: Option<Arc<str>>,
    pub default_value: Option<Arc<str>>,
    pub parameter_count: u32,
    pub flags: MethodFlags,
}

/// Shared by fields and enum constants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldStubData {
    pub name: Option<Arc<str>>,
    pub type_text: Option<Arc<str>>,
    /// Initializer text, kept for `final` fields only.
    pub initializer: Option<Arc<str>>,
    pub flags: FieldFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterStubData {
    pub name: Option<Arc<str>>,
    pub type_text: Option<Arc<str>>,
    pub flags: ParameterFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeParameterStubData {
    pub name: Option<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModifierListStubData {
    pub modifiers: ModifierFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnnotationStubData {
    pub qualified_name: Option<Arc<str>>,
}

impl AnnotationStubData {
    /// Last segment of the annotation reference.
    pub fn short_name(&self) -> Option<&str> {
        self.qualified_name.as_deref().map(super::short_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameValuePairStubData {
    /// `None` for the implicit `value` of `@A(1)`.
    pub name: Option<Arc<str>>,
}

/// Extends, implements, throws and bound lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceListStubData {
    pub references: Vec<Arc<str>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleStubData {
    pub name: Option<Arc<str>>,
    pub flags: ModuleFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequiresStubData {
    pub module_name: Option<Arc<str>>,
    pub flags: RequiresFlags,
}

/// `exports`, `opens`, `uses` and `provides` directives.
///
/// `reference` is the exported or opened package, or the service type;
/// `targets` are the modules after `to`, or the providers after `with`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleReferenceStubData {
    pub reference: Option<Arc<str>>,
    pub targets: Vec<Arc<str>>,
}
