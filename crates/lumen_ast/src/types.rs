//! Qualified type references.

use crate::{DeclArena, DeclId, DeclKind, Expr};

/// Type qualifier flags carried by a [`QualType`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_local: bool,
}

impl Qualifiers {
    pub const NONE: Qualifiers = Qualifiers {
        is_const: false,
        is_volatile: false,
        is_local: false,
    };

    pub fn const_only() -> Self {
        Qualifiers { is_const: true, ..Self::NONE }
    }
}

/// A type reference plus qualifier flags.
///
/// This is the canonical way the AST refers to types. Named types
/// (struct/enum/function/alias) hold non-owning [`DeclId`] handles into the
/// [`DeclArena`] that owns their defining declarations.
#[derive(Clone, Debug)]
pub struct QualType {
    pub kind: TypeKind,
    pub quals: Qualifiers,
}

impl QualType {
    pub fn new(kind: TypeKind) -> Self {
        Self { kind, quals: Qualifiers::NONE }
    }

    pub fn with_quals(kind: TypeKind, quals: Qualifiers) -> Self {
        Self { kind, quals }
    }

    /// Shorthand for an unqualified builtin type.
    pub fn builtin(b: BuiltinType) -> Self {
        Self::new(TypeKind::Builtin(b))
    }

    /// Shorthand for an unqualified pointer type.
    pub fn pointer_to(referent: QualType) -> Self {
        Self::new(TypeKind::Pointer(Box::new(referent)))
    }

    /// Shorthand for an unqualified array type.
    pub fn array_of(elem: QualType, size: Option<Expr>) -> Self {
        Self::new(TypeKind::Array {
            elem: Box::new(elem),
            size: size.map(Box::new),
        })
    }

    /// Resolve alias sugar down to the canonical type.
    ///
    /// The top-level type is canonical only after alias resolution; array
    /// declarator emission depends on this.
    pub fn canonical<'a>(&'a self, arena: &'a DeclArena) -> &'a QualType {
        let mut ty = self;
        loop {
            match &ty.kind {
                TypeKind::Alias(id) => match &arena[*id].kind {
                    DeclKind::AliasType(alias) => ty = &alias.ty,
                    _ => panic!("alias type handle does not reference an alias declaration"),
                },
                _ => return ty,
            }
        }
    }

    /// True when the canonical type is an array.
    pub fn is_array(&self, arena: &DeclArena) -> bool {
        matches!(self.canonical(arena).kind, TypeKind::Array { .. })
    }
}

/// The per-kind payload of a [`QualType`].
#[derive(Clone, Debug)]
pub enum TypeKind {
    /// One of the closed set of builtin types.
    Builtin(BuiltinType),

    /// Pointer to a referent type.
    Pointer(Box<QualType>),

    /// Array of an element type with an optional size expression.
    Array {
        elem: Box<QualType>,
        size: Option<Box<Expr>>,
    },

    /// A type alias, referencing its [`crate::AliasTypeDecl`].
    Alias(DeclId),

    /// A struct or union type, referencing its [`crate::StructTypeDecl`].
    Struct(DeclId),

    /// An enum type, referencing its [`crate::EnumTypeDecl`].
    Enum(DeclId),

    /// A function type, referencing its [`crate::FunctionTypeDecl`].
    Function(DeclId),

    /// A type the front end could not resolve; carries the spelled literal.
    Unresolved(String),
}

/// The closed set of Lumen builtin types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Void,
}

impl BuiltinType {
    /// The Lumen spelling of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinType::I8 => "i8",
            BuiltinType::I16 => "i16",
            BuiltinType::I32 => "i32",
            BuiltinType::I64 => "i64",
            BuiltinType::U8 => "u8",
            BuiltinType::U16 => "u16",
            BuiltinType::U32 => "u32",
            BuiltinType::U64 => "u64",
            BuiltinType::F32 => "f32",
            BuiltinType::F64 => "f64",
            BuiltinType::Bool => "bool",
            BuiltinType::Void => "void",
        }
    }
}
