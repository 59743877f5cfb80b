//! Core expressions (spec §3 "Core AST (post-desugar)") — the reduced
//! language the type checker and, downstream, the code generator see.
//!
//! Everything the desugarer eliminates (currying, `|>`, `>>`/`<<`, list
//! literals, or-patterns, guards, if/else) is gone: `App` takes exactly one
//! argument, `Lambda` binds exactly one parameter, `LetIn` binds exactly one
//! (possibly destructuring) pattern, and lists are `Cons`/`Nil` variant
//! constructions.

use crate::core::pattern::Pattern;
use crate::span::Span;
use crate::syntax::{BinaryOp, Literal, TypeExpr, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordUpdateItem {
    Field(String, Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal, Span),
    Var(String, Span),
    Lambda {
        param: Pattern,
        param_type: Option<TypeExpr>,
        body: Box<Expr>,
        span: Span,
    },
    App {
        func: Box<Expr>,
        arg: Box<Expr>,
        span: Span,
    },
    LetIn {
        pattern: Pattern,
        recursive: bool,
        type_ann: Option<TypeExpr>,
        value: Box<Expr>,
        body: Box<Expr>,
        span: Span,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
        span: Span,
    },
    /// Closed-row record construction; field expressions evaluate in
    /// source order.
    Record {
        fields: Vec<(String, Expr)>,
        span: Span,
    },
    Proj {
        record: Box<Expr>,
        field: String,
        span: Span,
    },
    /// `{ ...r, f: v, ... }` — folded left to right over an empty open
    /// record, exactly the ordered Field/Spread list written by the user, so
    /// the checker sees the same evaluation and override order (spec §4.3
    /// "rightmost-wins", "preserve the ordered Field/Spread list").
    RecordUpdate {
        updates: Vec<RecordUpdateItem>,
        span: Span,
    },
    /// A user variant constructor application, or a desugared list
    /// (`Cons`/`Nil`, reserved built-ins owned by the compiler).
    Variant {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    Tuple(Vec<Expr>, Span),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    RefAssign {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    MakeRef(Box<Expr>, Span),
    Unsafe(Box<Expr>, Span),
    Annotate {
        expr: Box<Expr>,
        type_expr: TypeExpr,
        span: Span,
    },
    While {
        cond: Box<Expr>,
        body: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Literal(_, s)
            | Expr::Var(_, s)
            | Expr::Lambda { span: s, .. }
            | Expr::App { span: s, .. }
            | Expr::LetIn { span: s, .. }
            | Expr::Match { span: s, .. }
            | Expr::Record { span: s, .. }
            | Expr::Proj { span: s, .. }
            | Expr::RecordUpdate { span: s, .. }
            | Expr::Variant { span: s, .. }
            | Expr::Tuple(_, s)
            | Expr::Binary { span: s, .. }
            | Expr::Unary { span: s, .. }
            | Expr::RefAssign { span: s, .. }
            | Expr::MakeRef(_, s)
            | Expr::Unsafe(_, s)
            | Expr::Annotate { span: s, .. }
            | Expr::While { span: s, .. } => s,
        }
    }
}

/// The reserved list-constructor names; not redeclarable by user `type`
/// declarations (spec §3 "Invariants").
pub const NIL: &str = "Nil";
pub const CONS: &str = "Cons";
