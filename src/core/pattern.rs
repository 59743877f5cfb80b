//! Core patterns (spec §3 "Core AST (post-desugar)"): no list patterns (
//! lowered to `Cons`/`Nil`), no or-patterns (duplicated into separate arms).

use crate::span::Span;
use crate::syntax::{Literal, TypeExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPatternField {
    pub name: String,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Wildcard(Span),
    Var {
        name: String,
        type_ann: Option<TypeExpr>,
        span: Span,
    },
    Literal(Literal, Span),
    Variant {
        name: String,
        args: Vec<Pattern>,
        span: Span,
    },
    /// Partial field list: fields not mentioned are unconstrained (width).
    Record {
        fields: Vec<RecordPatternField>,
        span: Span,
    },
    Tuple(Vec<Pattern>, Span),
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Pattern::Wildcard(s)
            | Pattern::Var { span: s, .. }
            | Pattern::Literal(_, s)
            | Pattern::Variant { span: s, .. }
            | Pattern::Record { span: s, .. }
            | Pattern::Tuple(_, s) => s,
        }
    }
}
