//! Declaration AST nodes and the arena that owns them.

use crate::{Expr, QualType, SourceLoc, Stmt};
use std::ops::Index;

/// A non-owning handle to a declaration in a [`DeclArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeclId(pub u32);

/// Owns every declaration of a program.
///
/// All cross-references between AST nodes (identifier uses, named type
/// payloads, struct members, function arguments) are [`DeclId`] handles into
/// this arena, which sidesteps cyclic ownership between declarations and the
/// types that mention them.
#[derive(Debug, Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a declaration and return its handle.
    pub fn alloc(&mut self, decl: Decl) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.0 as usize]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl Index<DeclId> for DeclArena {
    type Output = Decl;

    fn index(&self, id: DeclId) -> &Decl {
        self.decl(id)
    }
}

/// A declaration.
#[derive(Clone, Debug)]
pub struct Decl {
    /// Declared name; empty for anonymous struct/union members.
    pub name: String,

    pub kind: DeclKind,

    /// Public declarations are visible outside their module.
    pub is_public: bool,

    /// Owning module name. `None` for function arguments, local variables
    /// and struct members, which never get a mangling prefix.
    pub module: Option<String>,

    /// Definition site, consumed by the tag writer.
    pub loc: SourceLoc,
}

/// The kind of declaration.
#[derive(Clone, Debug)]
pub enum DeclKind {
    Import(ImportDecl),
    Var(VarDecl),
    Function(FunctionDecl),
    StructType(StructTypeDecl),
    EnumType(EnumTypeDecl),
    AliasType(AliasTypeDecl),
    FunctionType(FunctionTypeDecl),
    EnumConstant(EnumConstantDecl),
    ArrayValue(ArrayValueDecl),
}

/// An import of another module.
#[derive(Clone, Debug)]
pub struct ImportDecl {
    /// Name of the imported module.
    pub module_name: String,

    /// True when the import refers to a native C header.
    pub is_plain_c: bool,
}

/// A variable declaration (module-scoped, argument or member).
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub ty: QualType,
    pub init: Option<Expr>,
}

impl VarDecl {
    /// True when the variable was declared with the `local` qualifier.
    pub fn has_local_qualifier(&self) -> bool {
        self.ty.quals.is_local
    }
}

/// A function declaration.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub return_type: QualType,

    /// Argument declarations, all [`DeclKind::Var`].
    pub args: Vec<DeclId>,

    pub is_variadic: bool,

    /// The compound body. `None` only for the inner declaration of a
    /// [`FunctionTypeDecl`].
    pub body: Option<Stmt>,
}

/// A struct or union type declaration.
///
/// Anonymous when the owning [`Decl`] has an empty name; nested struct and
/// union members are permitted.
#[derive(Clone, Debug)]
pub struct StructTypeDecl {
    /// True for `struct`, false for `union`.
    pub is_struct: bool,

    /// Module-scoped (emitted as a typedef) rather than nested.
    pub is_global: bool,

    /// Members: [`DeclKind::Var`] or nested [`DeclKind::StructType`].
    pub members: Vec<DeclId>,
}

/// An enum type declaration.
#[derive(Clone, Debug)]
pub struct EnumTypeDecl {
    /// Constants, all [`DeclKind::EnumConstant`].
    pub constants: Vec<DeclId>,
}

/// A type alias declaration.
#[derive(Clone, Debug)]
pub struct AliasTypeDecl {
    pub ty: QualType,
}

/// A function type declaration, wrapping a bodiless [`FunctionDecl`].
#[derive(Clone, Debug)]
pub struct FunctionTypeDecl {
    /// The inner declaration, a [`DeclKind::Function`] without a body.
    pub func: DeclId,
}

/// A single enum constant.
#[derive(Clone, Debug)]
pub struct EnumConstantDecl {
    pub init: Option<Expr>,
}

/// An incremental array value entry (`name += expr`).
#[derive(Clone, Debug)]
pub struct ArrayValueDecl {
    pub value: Expr,
}

impl Decl {
    /// Convenience constructor for declarations without a source position.
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_public: false,
            module: None,
            loc: SourceLoc::none(),
        }
    }

    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn at(mut self, loc: SourceLoc) -> Self {
        self.loc = loc;
        self
    }
}
