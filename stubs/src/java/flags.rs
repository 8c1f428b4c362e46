//! Flag sets stored in Java stub payloads.

use bitflags::bitflags;

bitflags! {
    /// Modifier keywords of a modifier list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierFlags: u32 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        const NATIVE = 1 << 6;
        const SYNCHRONIZED = 1 << 7;
        const TRANSIENT = 1 << 8;
        const VOLATILE = 1 << 9;
        const STRICTFP = 1 << 10;
        const DEFAULT = 1 << 11;
        const SEALED = 1 << 12;
        const NON_SEALED = 1 << 13;
    }
}

impl ModifierFlags {
    /// Flag for a modifier keyword, if it is one.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let flag = match keyword {
            "public" => Self::PUBLIC,
            "protected" => Self::PROTECTED,
            "private" => Self::PRIVATE,
            "static" => Self::STATIC,
            "final" => Self::FINAL,
            "abstract" => Self::ABSTRACT,
            "native" => Self::NATIVE,
            "synchronized" => Self::SYNCHRONIZED,
            "transient" => Self::TRANSIENT,
            "volatile" => Self::VOLATILE,
            "strictfp" => Self::STRICTFP,
            "default" => Self::DEFAULT,
            "sealed" => Self::SEALED,
            "non-sealed" => Self::NON_SEALED,
            _ => return None,
        };
        Some(flag)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u32 {
        const INTERFACE = 1 << 0;
        const ENUM = 1 << 1;
        const ANNOTATION_TYPE = 1 << 2;
        const RECORD = 1 << 3;
        const DEPRECATED = 1 << 4;
        const HAS_TYPE_PARAMETERS = 1 << 5;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u32 {
        const CONSTRUCTOR = 1 << 0;
        const VARARGS = 1 << 1;
        const ANNOTATION_METHOD = 1 << 2;
        const HAS_DEFAULT_VALUE = 1 << 3;
        const DEPRECATED = 1 << 4;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u32 {
        const ENUM_CONSTANT = 1 << 0;
        const HAS_INITIALIZER = 1 << 1;
        const DEPRECATED = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImportFlags: u32 {
        const STATIC = 1 << 0;
        const ON_DEMAND = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParameterFlags: u32 {
        const VARARGS = 1 << 0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModuleFlags: u32 {
        const OPEN = 1 << 0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RequiresFlags: u32 {
        const TRANSITIVE = 1 << 0;
        const STATIC = 1 << 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_keywords() {
        assert_eq!(ModifierFlags::from_keyword("non-sealed"), Some(ModifierFlags::NON_SEALED));
        assert_eq!(ModifierFlags::from_keyword("class"), None);
    }

    #[test]
    fn test_unknown_bits_rejected() {
        assert!(ClassFlags::from_bits(1 << 31).is_none());
        assert_eq!(
            ClassFlags::from_bits(0b11),
            Some(ClassFlags::INTERFACE | ClassFlags::ENUM)
        );
    }
}
