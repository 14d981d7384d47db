//! Cross-reference tag generation for Lumen sources.
//!
//! [`TagWriter`] walks a resolved AST and records, for every identifier use,
//! where the referenced symbol is defined. Records are grouped by the file
//! of the use site and serialised into a stable line-oriented format that
//! companion tooling can grep.
//!
//! The analysis is best-effort: uses whose declaration back-reference is
//! missing indicate an unresolved AST and are skipped silently.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use lumen_ast::{
    Ast, BuiltinExpr, DeclArena, DeclId, DeclKind, Expr, FunctionDecl, QualType, SourceLoc, Stmt,
    TypeKind,
};
use lumen_util::StringBuilder;
use thiserror::Error;

/// An error surfaced when serialising the tag table.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for tag operations.
pub type TagResult<T> = Result<T, TagError>;

/// One cross-reference record: a symbol use site and its definition site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRef {
    pub use_line: u32,
    pub use_col: u32,
    pub symbol: String,
    /// Index of the definition file in the writer's file table.
    pub def_file: u32,
    pub def_line: u32,
    pub def_col: u32,
}

/// The records collected for one source file.
#[derive(Clone, Debug, Default)]
pub struct TagFile {
    pub refs: Vec<TagRef>,
}

/// Collects cross-reference records over one or more ASTs and serialises
/// them to a tag file.
#[derive(Debug, Default)]
pub struct TagWriter {
    /// File table keyed by path; the entry index is the file index used in
    /// records. First reference of a path allocates its slot.
    files: IndexMap<String, TagFile>,

    /// Index of the file the last record landed in; successive records
    /// within one file skip the map lookup.
    current: Option<usize>,
}

impl TagWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every identifier use in `ast`.
    pub fn analyse(&mut self, ast: &Ast, arena: &DeclArena) {
        for &id in ast
            .imports
            .iter()
            .chain(&ast.types)
            .chain(&ast.vars)
            .chain(&ast.functions)
        {
            self.analyse_decl(id, arena);
        }
    }

    /// Record a single use site. Synthesized locations are ignored.
    pub fn add_ref(&mut self, use_loc: &SourceLoc, symbol: &str, def_loc: &SourceLoc) {
        if use_loc.is_none() || def_loc.is_none() {
            return;
        }
        let idx = self.file_index(&use_loc.file);
        let def_file = self.file_index(&def_loc.file) as u32;
        self.files[idx].refs.push(TagRef {
            use_line: use_loc.line,
            use_col: use_loc.col,
            symbol: symbol.to_string(),
            def_file,
            def_line: def_loc.line,
            def_col: def_loc.col,
        });
    }

    /// The collected records for `path`, if any were recorded.
    pub fn file(&self, path: &str) -> Option<&TagFile> {
        self.files.get(path)
    }

    /// Serialise the table to `path`.
    ///
    /// Format: a `!tags <title>` line, one `F <idx> <path>` line per file in
    /// index order, then one `R <file> <line> <col> <symbol> <def-file>
    /// <def-line> <def-col>` line per record, ordered by file index and
    /// (use_line, use_col).
    pub fn write(&self, title: &str, path: &Path) -> TagResult<()> {
        let mut out = StringBuilder::new();
        out.push_str("!tags ");
        out.push_str(title);
        out.push_char('\n');

        for (idx, (file_path, _)) in self.files.iter().enumerate() {
            out.push_str("F ");
            out.push_int(idx as i64);
            out.push_char(' ');
            out.push_str(file_path);
            out.push_char('\n');
        }

        for (idx, (_, file)) in self.files.iter().enumerate() {
            let mut refs: Vec<&TagRef> = file.refs.iter().collect();
            refs.sort_by_key(|r| (r.use_line, r.use_col));
            for r in refs {
                out.push_str("R ");
                out.push_int(idx as i64);
                out.push_char(' ');
                out.push_int(i64::from(r.use_line));
                out.push_char(' ');
                out.push_int(i64::from(r.use_col));
                out.push_char(' ');
                out.push_str(&r.symbol);
                out.push_char(' ');
                out.push_int(i64::from(r.def_file));
                out.push_char(' ');
                out.push_int(i64::from(r.def_line));
                out.push_char(' ');
                out.push_int(i64::from(r.def_col));
                out.push_char('\n');
            }
        }

        fs::write(path, out.as_bytes()).map_err(|e| TagError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn file_index(&mut self, path: &str) -> usize {
        if let Some(idx) = self.current {
            if self.files.get_index(idx).map(|(k, _)| k.as_str()) == Some(path) {
                return idx;
            }
        }
        let idx = match self.files.get_index_of(path) {
            Some(idx) => idx,
            None => self.files.insert_full(path.to_string(), TagFile::default()).0,
        };
        self.current = Some(idx);
        idx
    }

    fn analyse_decl(&mut self, id: DeclId, arena: &DeclArena) {
        let decl = &arena[id];
        match &decl.kind {
            DeclKind::Import(_) => {}
            DeclKind::Var(v) => {
                self.analyse_type(&v.ty, arena);
                if let Some(init) = &v.init {
                    self.analyse_expr(init, arena);
                }
            }
            DeclKind::Function(f) => self.analyse_function(f, arena),
            DeclKind::StructType(s) => {
                for &member in &s.members {
                    self.analyse_decl(member, arena);
                }
            }
            DeclKind::EnumType(e) => {
                for &constant in &e.constants {
                    self.analyse_decl(constant, arena);
                }
            }
            DeclKind::AliasType(a) => self.analyse_type(&a.ty, arena),
            DeclKind::FunctionType(ft) => self.analyse_decl(ft.func, arena),
            DeclKind::EnumConstant(c) => {
                if let Some(init) = &c.init {
                    self.analyse_expr(init, arena);
                }
            }
            DeclKind::ArrayValue(av) => self.analyse_expr(&av.value, arena),
        }
    }

    fn analyse_function(&mut self, f: &FunctionDecl, arena: &DeclArena) {
        self.analyse_type(&f.return_type, arena);
        for &arg in &f.args {
            self.analyse_decl(arg, arena);
        }
        if let Some(body) = &f.body {
            self.analyse_stmt(body, arena);
        }
    }

    fn analyse_type(&mut self, ty: &QualType, arena: &DeclArena) {
        match &ty.kind {
            TypeKind::Pointer(referent) => self.analyse_type(referent, arena),
            TypeKind::Array { elem, size } => {
                self.analyse_type(elem, arena);
                if let Some(size) = size {
                    self.analyse_expr(size, arena);
                }
            }
            _ => {}
        }
    }

    fn analyse_stmt(&mut self, s: &Stmt, arena: &DeclArena) {
        match s {
            Stmt::Return(expr) => {
                if let Some(e) = expr {
                    self.analyse_expr(e, arena);
                }
            }
            Stmt::Expr(e) | Stmt::Decl(e) => self.analyse_expr(e, arena),
            Stmt::If { cond, then_branch, else_branch } => {
                self.analyse_expr(cond, arena);
                self.analyse_stmt(then_branch, arena);
                if let Some(els) = else_branch {
                    self.analyse_stmt(els, arena);
                }
            }
            Stmt::While { cond, body } => {
                self.analyse_expr(cond, arena);
                self.analyse_stmt(body, arena);
            }
            Stmt::Do { body, cond } => {
                self.analyse_stmt(body, arena);
                self.analyse_expr(cond, arena);
            }
            Stmt::For { init, cond, incr, body } => {
                for e in [init, cond, incr].into_iter().flatten() {
                    self.analyse_expr(e, arena);
                }
                self.analyse_stmt(body, arena);
            }
            Stmt::Switch { cond, cases } => {
                self.analyse_expr(cond, arena);
                for case in cases {
                    self.analyse_stmt(case, arena);
                }
            }
            Stmt::Case { cond, stmts } => {
                self.analyse_expr(cond, arena);
                for s in stmts {
                    self.analyse_stmt(s, arena);
                }
            }
            Stmt::Default { stmts } => {
                for s in stmts {
                    self.analyse_stmt(s, arena);
                }
            }
            Stmt::Break | Stmt::Continue | Stmt::Goto(_) => {}
            Stmt::Label { stmt, .. } => self.analyse_stmt(stmt, arena),
            Stmt::Compound(stmts) => {
                for s in stmts {
                    self.analyse_stmt(s, arena);
                }
            }
        }
    }

    fn analyse_expr(&mut self, e: &Expr, arena: &DeclArena) {
        match e {
            Expr::IntegerLiteral(_)
            | Expr::FloatLiteral(_)
            | Expr::BoolLiteral(_)
            | Expr::CharLiteral(_)
            | Expr::StringLiteral(_)
            | Expr::Nil => {}
            Expr::Identifier { name, decl, loc } => {
                // Missing back-references mean the front end left the AST
                // unresolved; skip, never fail.
                if let Some(id) = decl {
                    let def = &arena[*id];
                    self.add_ref(loc, name, &def.loc);
                }
            }
            Expr::Call { callee, args } => {
                self.analyse_expr(callee, arena);
                for arg in args {
                    self.analyse_expr(arg, arena);
                }
            }
            Expr::Member { base, member, decl, is_module_prefix, loc, .. } => {
                if *is_module_prefix {
                    if let Some(id) = decl {
                        let def = &arena[*id];
                        self.add_ref(loc, member, &def.loc);
                    }
                } else {
                    self.analyse_expr(base, arena);
                }
            }
            Expr::ArraySubscript { base, index } => {
                self.analyse_expr(base, arena);
                self.analyse_expr(index, arena);
            }
            Expr::InitList(values) => {
                for value in values {
                    self.analyse_expr(value, arena);
                }
            }
            Expr::Paren(inner) => self.analyse_expr(inner, arena),
            Expr::Binary { lhs, rhs, .. } => {
                self.analyse_expr(lhs, arena);
                self.analyse_expr(rhs, arena);
            }
            Expr::Conditional { cond, then_expr, else_expr } => {
                self.analyse_expr(cond, arena);
                self.analyse_expr(then_expr, arena);
                self.analyse_expr(else_expr, arena);
            }
            Expr::Unary { expr, .. } => self.analyse_expr(expr, arena),
            Expr::Builtin(BuiltinExpr::Sizeof(inner))
            | Expr::Builtin(BuiltinExpr::Elemsof(inner)) => self.analyse_expr(inner, arena),
            Expr::Type(ty) => self.analyse_type(ty, arena),
            Expr::Decl(d) => {
                self.analyse_type(&d.ty, arena);
                if let Some(init) = &d.init {
                    self.analyse_expr(init, arena);
                }
            }
        }
    }
}
