//! The C code generator.
//!
//! Walks resolved ASTs and fills two output buffers, one for the header and
//! one for the source file. All traversal state lives on the generator; a
//! fresh generator must be created per output unit.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use lumen_ast::{
    Ast, BuiltinExpr, BuiltinType, Decl, DeclArena, DeclExpr, DeclId, DeclKind, EnumTypeDecl,
    Expr, FunctionDecl, FunctionTypeDecl, Modules, QualType, Stmt, StructTypeDecl, TypeKind,
    VarDecl,
};
use lumen_util::StringBuilder;
use tracing::debug;

use crate::error::{GenError, GenResult};
use crate::genutils;

/// Indentation step of the emitted C, in spaces.
const INDENT: usize = 4;

/// Output placement mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The emitted pair forms one standalone translation unit: every
    /// function prototype goes to the header and every function is `static`
    /// unless it is `main`.
    SingleFile,

    /// Public declarations go to the header, private declarations and all
    /// function bodies to the source file.
    MultiFile,
}

/// Which of the two output buffers an emission routine writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sink {
    Header,
    Source,
}

/// Generates C99 for one output unit from a list of resolved module ASTs.
pub struct CGenerator<'a> {
    /// Output base name; also the include-guard source.
    filename: String,
    hfilename: String,
    cfilename: String,

    mode: Mode,
    no_local_prefix: bool,

    /// The resolved module map.
    modules: &'a Modules,

    /// Owns every declaration the ASTs reference.
    arena: &'a DeclArena,

    /// The ASTs to emit, in input order.
    entries: Vec<&'a Ast>,

    /// Module of the AST currently being walked; reset between passes.
    cur_module: Option<&'a str>,

    /// Header output buffer.
    hbuf: StringBuilder,

    /// Source output buffer.
    cbuf: StringBuilder,
}

impl<'a> CGenerator<'a> {
    /// Create a generator for the output unit named `filename`.
    pub fn new(
        filename: &str,
        mode: Mode,
        no_local_prefix: bool,
        modules: &'a Modules,
        arena: &'a DeclArena,
    ) -> Self {
        Self {
            filename: filename.to_string(),
            hfilename: format!("{filename}.h"),
            cfilename: format!("{filename}.c"),
            mode,
            no_local_prefix,
            modules,
            arena,
            entries: Vec::new(),
            cur_module: None,
            hbuf: StringBuilder::with_capacity(4096),
            cbuf: StringBuilder::with_capacity(4096),
        }
    }

    /// Add a module AST to this output unit.
    pub fn add_entry(&mut self, ast: &'a Ast) {
        self.entries.push(ast);
    }

    /// Run the four emission passes over all entries.
    pub fn generate(&mut self) {
        self.hbuf.push_str("#ifndef ");
        genutils::to_capital(&self.filename, &mut self.hbuf);
        self.hbuf.push_str("_H\n");
        self.hbuf.push_str("#define ");
        genutils::to_capital(&self.filename, &mut self.hbuf);
        self.hbuf.push_str("_H\n");
        self.hbuf.push_char('\n');

        self.emit_includes();

        let entries = self.entries.clone();

        for ast in &entries {
            self.cur_module = Some(ast.module_name.as_str());
            for &id in &ast.types {
                self.emit_type_decl(id);
            }
            self.cur_module = None;
        }

        for ast in &entries {
            self.cur_module = Some(ast.module_name.as_str());
            for &id in &ast.vars {
                self.emit_variable(id);
            }
            self.cur_module = None;
        }

        for ast in &entries {
            self.cur_module = Some(ast.module_name.as_str());
            for &id in &ast.functions {
                self.emit_function(id);
            }
            self.cur_module = None;
        }

        self.hbuf.push_str("#endif\n");
    }

    /// The generated header bytes.
    pub fn header(&self) -> &[u8] {
        self.hbuf.as_bytes()
    }

    /// The generated source bytes.
    pub fn source(&self) -> &[u8] {
        self.cbuf.as_bytes()
    }

    /// Write `<base>.h` and `<base>.c` under `out_dir`, creating the
    /// directory if needed.
    pub fn write(&self, out_dir: &Path) -> GenResult<()> {
        fs::create_dir_all(out_dir).map_err(|e| GenError::Io {
            path: out_dir.to_path_buf(),
            source: e,
        })?;

        let cpath = out_dir.join(&self.cfilename);
        fs::write(&cpath, self.cbuf.as_bytes()).map_err(|e| GenError::Io {
            path: cpath.clone(),
            source: e,
        })?;

        let hpath = out_dir.join(&self.hfilename);
        fs::write(&hpath, self.hbuf.as_bytes()).map_err(|e| GenError::Io {
            path: hpath.clone(),
            source: e,
        })?;

        Ok(())
    }

    /// Render both buffers with their file names, for debugging.
    pub fn dump(&self) -> String {
        format!(
            "---- code for {} ----\n{}\n---- code for {} ----\n{}\n",
            self.hfilename, self.hbuf, self.cfilename, self.cbuf
        )
    }

    fn buf(&mut self, out: Sink) -> &mut StringBuilder {
        match out {
            Sink::Header => &mut self.hbuf,
            Sink::Source => &mut self.cbuf,
        }
    }

    /// Collect the import sets of every entry and emit them: system includes
    /// first, then local includes, each group sorted and deduplicated.
    fn emit_includes(&mut self) {
        let arena = self.arena;
        let modules = self.modules;

        let mut system_includes: BTreeSet<&'a str> = BTreeSet::new();
        let mut local_includes: BTreeSet<&'a str> = BTreeSet::new();

        for ast in &self.entries {
            for &id in &ast.imports {
                let decl = &arena[id];
                let DeclKind::Import(import) = &decl.kind else {
                    unreachable!("import list entry is not an import declaration");
                };
                let module = modules
                    .get(&import.module_name)
                    .unwrap_or_else(|| panic!("unresolved module: {}", import.module_name));
                if module.is_plain_c {
                    system_includes.insert(module.name.as_str());
                } else if self.mode == Mode::MultiFile {
                    local_includes.insert(module.name.as_str());
                }
            }
        }

        for name in &system_includes {
            self.cbuf.push_str("#include <");
            self.cbuf.push_str(name);
            self.cbuf.push_str(".h>\n");
        }
        for name in &local_includes {
            self.cbuf.push_str("#include \"");
            self.cbuf.push_str(name);
            self.cbuf.push_str(".h\"\n");
        }
        self.cbuf.push_char('\n');
    }

    fn emit_type_decl(&mut self, id: DeclId) {
        let arena = self.arena;
        let decl = &arena[id];
        debug!(name = %decl.name, "emit type decl");

        let out = if decl.is_public { Sink::Header } else { Sink::Source };
        match &decl.kind {
            DeclKind::AliasType(alias) => {
                self.buf(out).push_str("typedef ");
                self.emit_type_pre_name(&alias.ty, out);
                self.buf(out).push_char(' ');
                self.add_prefix(decl.module.as_deref(), &decl.name, out);
                self.emit_type_post_name(&alias.ty, out);
                self.buf(out).push_str(";\n\n");
            }
            DeclKind::StructType(s) => self.emit_struct_type(decl, s, out, 0),
            DeclKind::EnumType(e) => self.emit_enum_type(decl, e, out),
            DeclKind::FunctionType(ft) => self.emit_function_type(decl, ft, out),
            DeclKind::Import(_)
            | DeclKind::Var(_)
            | DeclKind::Function(_)
            | DeclKind::EnumConstant(_)
            | DeclKind::ArrayValue(_) => {
                unreachable!("declaration kind cannot appear in a type pass")
            }
        }
    }

    /// Emit a struct or union type. Global ones become typedefs followed by
    /// a blank line; nested ones recurse at deeper indentation.
    fn emit_struct_type(&mut self, decl: &Decl, s: &StructTypeDecl, out: Sink, indent: usize) {
        let arena = self.arena;

        let buf = self.buf(out);
        buf.indent(indent);
        if s.is_global {
            buf.push_str("typedef ");
        }
        buf.push_str(if s.is_struct { "struct " } else { "union " });
        buf.push_str("{\n");

        for &member_id in &s.members {
            let member = &arena[member_id];
            match &member.kind {
                DeclKind::Var(v) => {
                    self.emit_var_decl(member, v, out, indent + INDENT);
                    self.buf(out).push_str(";\n");
                }
                DeclKind::StructType(nested) => {
                    self.emit_struct_type(member, nested, out, indent + INDENT);
                }
                _ => unreachable!("struct member must be a variable or nested struct"),
            }
        }

        let buf = self.buf(out);
        buf.indent(indent);
        buf.push_char('}');
        if !decl.name.is_empty() {
            buf.push_char(' ');
            buf.push_str(&decl.name);
        }
        buf.push_str(";\n");
        if s.is_global {
            self.buf(out).push_char('\n');
        }
    }

    fn emit_enum_type(&mut self, decl: &Decl, e: &EnumTypeDecl, out: Sink) {
        let arena = self.arena;

        self.buf(out).push_str("typedef enum {\n");
        for &const_id in &e.constants {
            let constant = &arena[const_id];
            let DeclKind::EnumConstant(c) = &constant.kind else {
                unreachable!("enum member is not an enum constant");
            };
            self.buf(out).indent(INDENT);
            self.add_prefix(constant.module.as_deref(), &constant.name, out);
            if let Some(init) = &c.init {
                self.buf(out).push_str(" = ");
                self.emit_expr(init, out);
            }
            self.buf(out).push_str(",\n");
        }
        let buf = self.buf(out);
        buf.push_str("} ");
        buf.push_str(&decl.name);
        buf.push_str(";\n\n");
    }

    /// Emit `typedef <ret> (*name)(args);` for a function type.
    fn emit_function_type(&mut self, decl: &Decl, ft: &FunctionTypeDecl, out: Sink) {
        let arena = self.arena;
        let DeclKind::Function(f) = &arena[ft.func].kind else {
            unreachable!("function type does not wrap a function declaration");
        };

        self.buf(out).push_str("typedef ");
        self.emit_type_pre_name(&f.return_type, out);
        self.emit_type_post_name(&f.return_type, out);
        let buf = self.buf(out);
        buf.push_str(" (*");
        buf.push_str(&decl.name);
        buf.push_char(')');
        self.emit_function_args(f, out);
        self.buf(out).push_str(";\n\n");
    }

    fn emit_variable(&mut self, id: DeclId) {
        let arena = self.arena;
        let decl = &arena[id];
        let DeclKind::Var(v) = &decl.kind else {
            unreachable!("variable pass entry is not a variable");
        };
        debug!(name = %decl.name, "emit variable");

        if decl.is_public && self.mode != Mode::SingleFile {
            self.hbuf.push_str("extern ");
            self.emit_type_pre_name(&v.ty, Sink::Header);
            self.hbuf.push_char(' ');
            self.add_prefix(decl.module.as_deref(), &decl.name, Sink::Header);
            self.emit_type_post_name(&v.ty, Sink::Header);
            self.hbuf.push_str(";\n");
            self.hbuf.push_char('\n');
        } else {
            self.cbuf.push_str("static ");
        }

        self.emit_type_pre_name(&v.ty, Sink::Source);
        self.cbuf.push_char(' ');
        self.add_prefix(decl.module.as_deref(), &decl.name, Sink::Source);
        self.emit_type_post_name(&v.ty, Sink::Source);
        if let Some(init) = &v.init {
            self.cbuf.push_str(" = ");
            self.emit_expr(init, Sink::Source);
        }
        self.cbuf.push_str(";\n");
        self.cbuf.push_char('\n');
    }

    fn emit_function(&mut self, id: DeclId) {
        let arena = self.arena;
        let decl = &arena[id];
        let DeclKind::Function(f) = &decl.kind else {
            unreachable!("function pass entry is not a function");
        };
        debug!(name = %decl.name, "emit function");

        match self.mode {
            Mode::SingleFile => {
                // All prototypes become forward declarations in the header.
                self.emit_function_proto(decl, f, Sink::Header);
                self.hbuf.push_str(";\n\n");
            }
            Mode::MultiFile => {
                if decl.is_public {
                    self.emit_function_proto(decl, f, Sink::Header);
                    self.hbuf.push_str(";\n\n");
                } else if decl.name != "main" {
                    self.cbuf.push_str("static ");
                }
            }
        }

        self.emit_function_proto(decl, f, Sink::Source);
        self.cbuf.push_char(' ');
        let body = f.body.as_ref().expect("function definition without a body");
        let Stmt::Compound(stmts) = body else {
            panic!("function body must be a compound statement");
        };
        self.emit_compound_stmt(stmts, 0, false);
        self.cbuf.push_char('\n');
    }

    fn emit_function_proto(&mut self, decl: &Decl, f: &FunctionDecl, out: Sink) {
        if self.mode == Mode::SingleFile && decl.name != "main" {
            self.buf(out).push_str("static ");
        }
        self.emit_type_pre_name(&f.return_type, out);
        self.emit_type_post_name(&f.return_type, out);
        self.buf(out).push_char(' ');
        self.add_prefix(decl.module.as_deref(), &decl.name, out);
        self.emit_function_args(f, out);
    }

    fn emit_function_args(&mut self, f: &FunctionDecl, out: Sink) {
        let arena = self.arena;

        self.buf(out).push_char('(');
        let mut count = f.args.len() + usize::from(f.is_variadic);
        for &arg_id in &f.args {
            let arg = &arena[arg_id];
            let DeclKind::Var(v) = &arg.kind else {
                unreachable!("function argument is not a variable");
            };
            self.emit_var_decl(arg, v, out, 0);
            if count != 1 {
                self.buf(out).push_str(", ");
            }
            count -= 1;
        }
        if f.is_variadic {
            self.buf(out).push_str("...");
        }
        self.buf(out).push_char(')');
    }

    /// Emit `<pre> <name><post> [= init]` without a trailing semicolon; used
    /// for struct members and function arguments.
    fn emit_var_decl(&mut self, decl: &Decl, v: &VarDecl, out: Sink, indent: usize) {
        self.buf(out).indent(indent);
        self.emit_type_pre_name(&v.ty, out);
        self.buf(out).push_char(' ');
        let name = decl.name.as_str();
        self.buf(out).push_str(name);
        self.emit_type_post_name(&v.ty, out);
        if let Some(init) = &v.init {
            self.buf(out).push_str(" = ");
            self.emit_expr(init, out);
        }
    }

    fn emit_stmt(&mut self, s: &Stmt, indent: usize) {
        match s {
            Stmt::Return(expr) => {
                self.cbuf.indent(indent);
                self.cbuf.push_str("return");
                if let Some(e) = expr {
                    self.cbuf.push_char(' ');
                    self.emit_expr(e, Sink::Source);
                }
                self.cbuf.push_str(";\n");
            }
            Stmt::Expr(e) | Stmt::Decl(e) => {
                self.cbuf.indent(indent);
                self.emit_expr(e, Sink::Source);
                self.cbuf.push_str(";\n");
            }
            Stmt::If { cond, then_branch, else_branch } => {
                self.cbuf.indent(indent);
                self.cbuf.push_str("if (");
                self.emit_expr(cond, Sink::Source);
                self.cbuf.push_str(")\n");
                self.emit_stmt(then_branch, indent);
                if let Some(els) = else_branch {
                    self.cbuf.indent(indent);
                    self.cbuf.push_str("else\n");
                    self.emit_stmt(els, indent);
                }
            }
            Stmt::While { cond, body } => {
                self.cbuf.indent(indent);
                self.cbuf.push_str("while (");
                self.emit_expr(cond, Sink::Source);
                self.cbuf.push_str(") ");
                self.emit_body(body, indent);
            }
            Stmt::Do { body, cond } => {
                self.cbuf.indent(indent);
                self.cbuf.push_str("do ");
                self.emit_body(body, indent);
                self.cbuf.indent(indent);
                self.cbuf.push_str("while (");
                self.emit_expr(cond, Sink::Source);
                self.cbuf.push_str(");\n");
            }
            Stmt::For { init, cond, incr, body } => {
                self.cbuf.indent(indent);
                self.cbuf.push_str("for (");
                if let Some(init) = init {
                    self.emit_expr(init, Sink::Source);
                }
                self.cbuf.push_char(';');
                if let Some(cond) = cond {
                    self.cbuf.push_char(' ');
                    self.emit_expr(cond, Sink::Source);
                }
                self.cbuf.push_char(';');
                if let Some(incr) = incr {
                    self.cbuf.push_char(' ');
                    self.emit_expr(incr, Sink::Source);
                }
                self.cbuf.push_str(") ");
                self.emit_body(body, indent);
            }
            Stmt::Switch { cond, cases } => self.emit_switch_stmt(cond, cases, indent),
            Stmt::Case { .. } | Stmt::Default { .. } => {
                unreachable!("case and default are only valid inside a switch")
            }
            Stmt::Break => {
                self.cbuf.indent(indent);
                self.cbuf.push_str("break;\n");
            }
            Stmt::Continue => {
                self.cbuf.indent(indent);
                self.cbuf.push_str("continue;\n");
            }
            Stmt::Label { name, stmt } => {
                self.cbuf.push_str(name);
                self.cbuf.push_str(":\n");
                self.emit_stmt(stmt, indent);
            }
            Stmt::Goto(name) => {
                self.cbuf.indent(indent);
                self.cbuf.push_str("goto ");
                self.cbuf.push_str(name);
                self.cbuf.push_str(";\n");
            }
            Stmt::Compound(stmts) => self.emit_compound_stmt(stmts, indent, true),
        }
    }

    /// Emit a loop body: a compound keeps its brace on the control line,
    /// anything else is emitted bare.
    fn emit_body(&mut self, body: &Stmt, indent: usize) {
        if let Stmt::Compound(stmts) = body {
            self.emit_compound_stmt(stmts, indent, false);
        } else {
            self.emit_stmt(body, 0);
        }
    }

    fn emit_compound_stmt(&mut self, stmts: &[Stmt], indent: usize, start_on_new_line: bool) {
        if start_on_new_line {
            self.cbuf.indent(indent);
        }
        self.cbuf.push_str("{\n");
        for s in stmts {
            self.emit_stmt(s, indent + INDENT);
        }
        self.cbuf.indent(indent);
        self.cbuf.push_str("}\n");
    }

    fn emit_switch_stmt(&mut self, cond: &Expr, cases: &[Stmt], indent: usize) {
        self.cbuf.indent(indent);
        self.cbuf.push_str("switch (");
        self.emit_expr(cond, Sink::Source);
        self.cbuf.push_str(") {\n");

        for case in cases {
            match case {
                Stmt::Case { cond, stmts } => {
                    self.cbuf.indent(indent + INDENT);
                    self.cbuf.push_str("case ");
                    self.emit_expr(cond, Sink::Source);
                    self.cbuf.push_str(":\n");
                    for s in stmts {
                        self.emit_stmt(s, indent + 2 * INDENT);
                    }
                }
                Stmt::Default { stmts } => {
                    self.cbuf.indent(indent + INDENT);
                    self.cbuf.push_str("default:\n");
                    for s in stmts {
                        self.emit_stmt(s, indent + 2 * INDENT);
                    }
                }
                _ => unreachable!("switch child must be a case or default"),
            }
        }

        self.cbuf.indent(indent);
        self.cbuf.push_str("}\n");
    }

    fn emit_expr(&mut self, e: &Expr, out: Sink) {
        match e {
            Expr::IntegerLiteral(v) => self.buf(out).push_int(*v),
            Expr::FloatLiteral(v) => {
                let text = format!("{v:.6}");
                self.buf(out).push_str(&text);
            }
            Expr::BoolLiteral(b) => self.buf(out).push_int(i64::from(*b)),
            Expr::CharLiteral(c) => self.emit_char_literal(*c, out),
            Expr::StringLiteral(s) => self.emit_string_literal(s, out),
            Expr::Nil => self.buf(out).push_str("NULL"),
            Expr::Identifier { name, decl, .. } => {
                let id = decl.unwrap_or_else(|| panic!("unresolved identifier: {name}"));
                self.emit_decl_ref(id, out);
            }
            Expr::Call { callee, args } => {
                self.emit_expr(callee, out);
                self.buf(out).push_char('(');
                for (i, arg) in args.iter().enumerate() {
                    if i != 0 {
                        self.buf(out).push_str(", ");
                    }
                    self.emit_expr(arg, out);
                }
                self.buf(out).push_char(')');
            }
            Expr::Member { base, member, decl, is_arrow, is_module_prefix, .. } => {
                if *is_module_prefix {
                    // module.symbol: the member is the declaration itself.
                    let id = decl.unwrap_or_else(|| panic!("unresolved member: {member}"));
                    self.emit_decl_ref(id, out);
                } else {
                    self.emit_expr(base, out);
                    self.buf(out).push_str(if *is_arrow { "->" } else { "." });
                    self.buf(out).push_str(member);
                }
            }
            Expr::ArraySubscript { base, index } => {
                self.emit_expr(base, out);
                self.buf(out).push_char('[');
                self.emit_expr(index, out);
                self.buf(out).push_char(']');
            }
            Expr::InitList(values) => {
                self.buf(out).push_str("{ ");
                for (i, value) in values.iter().enumerate() {
                    if i == 0 && matches!(value, Expr::InitList(_)) {
                        self.buf(out).push_char('\n');
                    }
                    self.emit_expr(value, out);
                    if i != values.len() - 1 {
                        self.buf(out).push_str(", ");
                    }
                    if matches!(value, Expr::InitList(_)) {
                        self.buf(out).push_char('\n');
                    }
                }
                self.buf(out).push_str(" }");
            }
            Expr::Paren(inner) => {
                self.buf(out).push_char('(');
                self.emit_expr(inner, out);
                self.buf(out).push_char(')');
            }
            Expr::Binary { op, lhs, rhs } => {
                self.emit_expr(lhs, out);
                self.buf(out).push_char(' ');
                self.buf(out).push_str(op.as_str());
                self.buf(out).push_char(' ');
                self.emit_expr(rhs, out);
            }
            Expr::Conditional { cond, then_expr, else_expr } => {
                self.emit_expr(cond, out);
                self.buf(out).push_str(" ? ");
                self.emit_expr(then_expr, out);
                self.buf(out).push_str(" : ");
                self.emit_expr(else_expr, out);
            }
            Expr::Unary { op, expr } => {
                if op.is_postfix() {
                    self.emit_expr(expr, out);
                    self.buf(out).push_str(op.as_str());
                } else {
                    self.buf(out).push_str(op.as_str());
                    self.emit_expr(expr, out);
                }
            }
            Expr::Builtin(b) => self.emit_builtin_expr(b, out),
            Expr::Type(ty) => {
                self.emit_type_pre_name(ty, out);
                self.emit_type_post_name(ty, out);
            }
            Expr::Decl(d) => self.emit_decl_expr(d, out, 0),
        }
    }

    fn emit_builtin_expr(&mut self, b: &BuiltinExpr, out: Sink) {
        let arena = self.arena;
        match b {
            BuiltinExpr::Sizeof(e) => {
                self.buf(out).push_str("sizeof(");
                self.emit_expr(e, out);
                self.buf(out).push_char(')');
            }
            BuiltinExpr::Elemsof(e) => {
                let Expr::Identifier { name, decl, .. } = &**e else {
                    unreachable!("elemsof operand must be an identifier");
                };
                let id = decl.unwrap_or_else(|| panic!("unresolved identifier: {name}"));
                match &arena[id].kind {
                    DeclKind::Var(v) => {
                        if !v.ty.is_array(arena) {
                            // Enum element counts have no C rendering; a
                            // prior stage must reject them.
                            unimplemented!("elemsof on enum operands");
                        }
                        let buf = self.buf(out);
                        buf.push_str("sizeof(");
                        buf.push_str(name);
                        buf.push_str(")/sizeof(");
                        buf.push_str(name);
                        buf.push_str("[0])");
                    }
                    _ => unreachable!("elemsof operand must resolve to a variable"),
                }
            }
        }
    }

    /// Emit `[static ]<pre> <name><post>[ = init]`, the rendering of a
    /// declaration in expression position.
    fn emit_decl_expr(&mut self, d: &DeclExpr, out: Sink, indent: usize) {
        self.buf(out).indent(indent);
        if d.has_local_qualifier() {
            self.buf(out).push_str("static ");
        }
        self.emit_type_pre_name(&d.ty, out);
        self.buf(out).push_char(' ');
        let name = d.name.as_str();
        self.buf(out).push_str(name);
        self.emit_type_post_name(&d.ty, out);
        if let Some(init) = &d.init {
            self.buf(out).push_str(" = ");
            self.emit_expr(init, out);
        }
    }

    /// Emit a reference to a declaration, mangled with its module prefix.
    fn emit_decl_ref(&mut self, id: DeclId, out: Sink) {
        let arena = self.arena;
        let decl = &arena[id];
        self.add_prefix(decl.module.as_deref(), &decl.name, out);
    }

    /// Emit the leading portion of a type declarator: qualifiers, base type
    /// and pointer stars. Array brackets belong to the post-name portion.
    fn emit_type_pre_name(&mut self, ty: &QualType, out: Sink) {
        let arena = self.arena;

        if ty.quals.is_const {
            self.buf(out).push_str("const ");
        }
        match &ty.kind {
            TypeKind::Builtin(b) => self.buf(out).push_str(builtin_c_name(*b)),
            TypeKind::Pointer(referent) => {
                self.emit_type_pre_name(referent, out);
                self.buf(out).push_char('*');
            }
            TypeKind::Array { elem, .. } => self.emit_type_pre_name(elem, out),
            TypeKind::Alias(id) => {
                let DeclKind::AliasType(alias) = &arena[*id].kind else {
                    unreachable!("alias type handle does not reference an alias declaration");
                };
                self.emit_type_pre_name(&alias.ty, out);
            }
            TypeKind::Struct(id) | TypeKind::Enum(id) | TypeKind::Function(id) => {
                let name = arena[*id].name.as_str();
                self.buf(out).push_str(name);
            }
            TypeKind::Unresolved(literal) => self.buf(out).push_str(literal),
        }
    }

    /// Emit the trailing portion of a type declarator: nested array brackets
    /// in declaration order. Resolves alias sugar first; the canonical type
    /// decides whether brackets are emitted at all.
    fn emit_type_post_name(&mut self, ty: &QualType, out: Sink) {
        let arena = self.arena;
        if !ty.is_array(arena) {
            return;
        }
        let canonical = ty.canonical(arena);
        let TypeKind::Array { elem, size } = &canonical.kind else {
            unreachable!("canonical array type is not an array");
        };
        self.emit_type_post_name(elem, out);
        self.buf(out).push_char('[');
        if let Some(size) = size {
            self.emit_expr(size, out);
        }
        self.buf(out).push_char(']');
    }

    fn emit_char_literal(&mut self, c: u8, out: Sink) {
        let buf = self.buf(out);
        buf.push_char('\'');
        match c {
            b'\n' => buf.push_str("\\n"),
            b'\r' => buf.push_str("\\r"),
            b'\t' => buf.push_str("\\t"),
            0x1b => buf.push_str("\\033"),
            b'\'' => buf.push_str("\\'"),
            b'\\' => buf.push_str("\\\\"),
            _ => buf.push(c),
        }
        buf.push_char('\'');
    }

    fn emit_string_literal(&mut self, s: &str, out: Sink) {
        let buf = self.buf(out);
        buf.push_char('"');
        for b in s.bytes() {
            match b {
                b'\n' => buf.push_str("\\n"),
                b'\r' => buf.push_str("\\r"),
                b'\t' => buf.push_str("\\t"),
                0x1b => buf.push_str("\\033"),
                b'"' => buf.push_str("\\\""),
                b'\\' => buf.push_str("\\\\"),
                _ => buf.push(b),
            }
        }
        buf.push_char('"');
    }

    /// Append `name`, prefixed with its module's mangling prefix unless the
    /// declaration is module-less, is `main`, or belongs to the current
    /// module while no-local-prefix mode is on.
    fn add_prefix(&mut self, module: Option<&str>, name: &str, out: Sink) {
        let Some(module) = module else {
            self.buf(out).push_str(name);
            return;
        };
        if name == "main" {
            self.buf(out).push_str(name);
            return;
        }
        if self.no_local_prefix && Some(module) == self.cur_module {
            self.buf(out).push_str(name);
            return;
        }
        let c_name = self
            .modules
            .get(module)
            .map(|m| m.c_name.as_str())
            .unwrap_or(module);
        genutils::add_name(c_name, name, self.buf(out));
    }
}

/// The closed builtin-to-C type mapping.
fn builtin_c_name(b: BuiltinType) -> &'static str {
    match b {
        BuiltinType::I8 => "char",
        BuiltinType::I16 => "short",
        BuiltinType::I32 => "int",
        BuiltinType::I64 => "long long",
        BuiltinType::U8 => "unsigned char",
        BuiltinType::U16 => "unsigned short",
        BuiltinType::U32 => "unsigned int",
        BuiltinType::U64 => "unsigned long long",
        BuiltinType::F32 => "float",
        BuiltinType::F64 => "double",
        BuiltinType::Bool => "int",
        BuiltinType::Void => "void",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_ast::{AliasTypeDecl, Module, Qualifiers};

    fn empty_modules() -> Modules {
        Modules::new()
    }

    fn render_type(arena: &DeclArena, ty: &QualType) -> (String, String) {
        let modules = empty_modules();
        let mut gen = CGenerator::new("t", Mode::SingleFile, false, &modules, arena);
        gen.emit_type_pre_name(ty, Sink::Source);
        let pre = String::from_utf8(gen.cbuf.as_bytes().to_vec()).unwrap();
        let mut gen = CGenerator::new("t", Mode::SingleFile, false, &modules, arena);
        gen.emit_type_post_name(ty, Sink::Source);
        let post = String::from_utf8(gen.cbuf.as_bytes().to_vec()).unwrap();
        (pre, post)
    }

    #[test]
    fn pointer_stars_go_before_the_name() {
        let arena = DeclArena::new();
        let ty = QualType::pointer_to(QualType::pointer_to(QualType::builtin(BuiltinType::U8)));
        let (pre, post) = render_type(&arena, &ty);
        assert_eq!(pre, "unsigned char**");
        assert_eq!(post, "");
    }

    #[test]
    fn nested_arrays_keep_declaration_order() {
        let arena = DeclArena::new();
        let ty = QualType::array_of(
            QualType::array_of(
                QualType::builtin(BuiltinType::I32),
                Some(Expr::IntegerLiteral(5)),
            ),
            Some(Expr::IntegerLiteral(3)),
        );
        let (pre, post) = render_type(&arena, &ty);
        assert_eq!(pre, "int");
        assert_eq!(post, "[3][5]");
    }

    #[test]
    fn alias_of_array_resolves_before_bracket_emission() {
        let mut arena = DeclArena::new();
        let alias = arena.alloc(
            Decl::new(
                "Row",
                DeclKind::AliasType(AliasTypeDecl {
                    ty: QualType::array_of(
                        QualType::builtin(BuiltinType::I16),
                        Some(Expr::IntegerLiteral(8)),
                    ),
                }),
            )
            .in_module("m"),
        );
        let ty = QualType::new(TypeKind::Alias(alias));
        let (pre, post) = render_type(&arena, &ty);
        assert_eq!(pre, "short");
        assert_eq!(post, "[8]");
    }

    #[test]
    fn const_qualifier_prints_before_the_base() {
        let arena = DeclArena::new();
        let ty = QualType::with_quals(
            TypeKind::Builtin(BuiltinType::F64),
            Qualifiers::const_only(),
        );
        let (pre, _) = render_type(&arena, &ty);
        assert_eq!(pre, "const double");
    }

    #[test]
    fn string_literals_escape_the_known_set() {
        let arena = DeclArena::new();
        let modules = empty_modules();
        let mut gen = CGenerator::new("t", Mode::SingleFile, false, &modules, &arena);
        gen.emit_expr(
            &Expr::StringLiteral("a\tb\n\x1b[0m \"q\"".into()),
            Sink::Source,
        );
        assert_eq!(gen.cbuf.to_string(), "\"a\\tb\\n\\033[0m \\\"q\\\"\"");
    }

    #[test]
    fn mangling_honours_no_local_prefix() {
        let arena = DeclArena::new();
        let mut modules = empty_modules();
        modules.insert("net".into(), Module::new("net", false));

        let mut gen = CGenerator::new("t", Mode::SingleFile, true, &modules, &arena);
        gen.cur_module = Some("net");
        gen.add_prefix(Some("net"), "connect", Sink::Source);
        gen.add_prefix(Some("other"), "shutdown", Sink::Source);
        assert_eq!(gen.cbuf.to_string(), "connectother_shutdown");
    }

    #[test]
    fn main_is_never_prefixed() {
        let arena = DeclArena::new();
        let mut modules = empty_modules();
        modules.insert("app".into(), Module::new("app", false));

        let mut gen = CGenerator::new("t", Mode::MultiFile, false, &modules, &arena);
        gen.cur_module = Some("app");
        gen.add_prefix(Some("app"), "main", Sink::Source);
        assert_eq!(gen.cbuf.to_string(), "main");
    }

    #[test]
    fn conditional_and_unary_render_structurally() {
        let arena = DeclArena::new();
        let modules = empty_modules();
        let mut gen = CGenerator::new("t", Mode::SingleFile, false, &modules, &arena);
        gen.emit_expr(
            &Expr::Conditional {
                cond: Box::new(Expr::BoolLiteral(true)),
                then_expr: Box::new(Expr::Unary {
                    op: lumen_ast::UnaryOp::Minus,
                    expr: Box::new(Expr::IntegerLiteral(1)),
                }),
                else_expr: Box::new(Expr::Unary {
                    op: lumen_ast::UnaryOp::PostInc,
                    expr: Box::new(Expr::IntegerLiteral(2)),
                }),
            },
            Sink::Source,
        );
        assert_eq!(gen.cbuf.to_string(), "1 ? -1 : 2++");
    }
}
