//! Surface patterns (spec §3 "Pattern").

use crate::span::Span;
use crate::syntax::expr::Literal;
use crate::syntax::type_expr::TypeExpr;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPatternField {
    pub name: String,
    /// `None` is the shorthand form `{ x }`, binding `x` to a variable named
    /// `x`; `Some(p)` is the explicit `{ x: p }` form.
    pub pattern: Option<Pattern>,
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
    /// A nullary or applied variant constructor, e.g. `None` or `Some(x)`.
    Variant {
        name: String,
        args: Vec<Pattern>,
        span: Span,
    },
    Tuple(Vec<Pattern>, Span),
    Record {
        fields: Vec<RecordPatternField>,
        span: Span,
    },
    List {
        elements: Vec<Pattern>,
        rest: Option<Box<Pattern>>,
        span: Span,
    },
    Cons {
        head: Box<Pattern>,
        tail: Box<Pattern>,
        span: Span,
    },
    /// `p1 | p2 | ...`. No alternative may introduce a variable binding
    /// (spec §3 "Pattern"), checked by the parser at construction time.
    Or(Vec<Pattern>, Span),
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Pattern::Wildcard(s)
            | Pattern::Var { span: s, .. }
            | Pattern::Literal(_, s)
            | Pattern::Variant { span: s, .. }
            | Pattern::Tuple(_, s)
            | Pattern::Record { span: s, .. }
            | Pattern::List { span: s, .. }
            | Pattern::Cons { span: s, .. }
            | Pattern::Or(_, s) => s,
        }
    }

    /// Names bound by this pattern, used to reject bindings inside
    /// or-pattern alternatives.
    pub fn bound_names(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Wildcard(_) | Pattern::Literal(_, _) => {}
            Pattern::Var { name, .. } => out.push(name.clone()),
            Pattern::Variant { args, .. } => args.iter().for_each(|p| p.bound_names(out)),
            Pattern::Tuple(items, _) => items.iter().for_each(|p| p.bound_names(out)),
            Pattern::Record { fields, .. } => fields.iter().for_each(|f| match &f.pattern {
                Some(p) => p.bound_names(out),
                None => out.push(f.name.clone()),
            }),
            Pattern::List { elements, rest, .. } => {
                elements.iter().for_each(|p| p.bound_names(out));
                if let Some(rest) = rest {
                    rest.bound_names(out);
                }
            }
            Pattern::Cons { head, tail, .. } => {
                head.bound_names(out);
                tail.bound_names(out);
            }
            Pattern::Or(alts, _) => alts.iter().for_each(|p| p.bound_names(out)),
        }
    }
}
