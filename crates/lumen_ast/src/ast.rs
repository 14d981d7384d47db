//! Per-module translation units.

use crate::DeclId;

/// One resolved translation unit: the declarations of a single module's
/// source file, bucketed in emission order.
#[derive(Clone, Debug)]
pub struct Ast {
    /// Name of the module this unit belongs to.
    pub module_name: String,

    /// Path of the source file, consumed by the tag writer.
    pub file_name: String,

    /// Import declarations.
    pub imports: Vec<DeclId>,

    /// Type declarations (struct, union, enum, alias, function type).
    pub types: Vec<DeclId>,

    /// Module-scoped variable declarations.
    pub vars: Vec<DeclId>,

    /// Function declarations.
    pub functions: Vec<DeclId>,
}

impl Ast {
    pub fn new(module_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            file_name: file_name.into(),
            imports: Vec::new(),
            types: Vec::new(),
            vars: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn add_import(&mut self, id: DeclId) {
        self.imports.push(id);
    }

    pub fn add_type(&mut self, id: DeclId) {
        self.types.push(id);
    }

    pub fn add_var(&mut self, id: DeclId) {
        self.vars.push(id);
    }

    pub fn add_function(&mut self, id: DeclId) {
        self.functions.push(id);
    }
}
