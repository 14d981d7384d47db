//! Statement AST nodes.

use crate::Expr;

/// A statement.
///
/// `Case` and `Default` only ever appear as children of `Switch`; they are
/// not free-standing statements and the emitters refuse them elsewhere.
#[derive(Clone, Debug)]
pub enum Stmt {
    /// `return [expr];`
    Return(Option<Expr>),

    /// Expression statement.
    Expr(Expr),

    /// `if (cond) then [else els]`
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while (cond) body`
    While { cond: Expr, body: Box<Stmt> },

    /// `do body while (cond);`
    Do { body: Box<Stmt>, cond: Expr },

    /// `for (init; cond; incr) body`, each header part optional.
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        incr: Option<Expr>,
        body: Box<Stmt>,
    },

    /// `switch (cond) { cases }`; children are `Case`/`Default` only.
    Switch { cond: Expr, cases: Vec<Stmt> },

    /// `case cond:` with its trailing statements.
    Case { cond: Expr, stmts: Vec<Stmt> },

    /// `default:` with its trailing statements.
    Default { stmts: Vec<Stmt> },

    /// `break;`
    Break,

    /// `continue;`
    Continue,

    /// `name:` followed by the labelled statement.
    Label { name: String, stmt: Box<Stmt> },

    /// `goto name;`
    Goto(String),

    /// `{ ... }`
    Compound(Vec<Stmt>),

    /// A declaration statement; the expression is a [`Expr::Decl`].
    Decl(Expr),
}
