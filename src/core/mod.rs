//! Core AST: the reduced language produced by the desugarer and consumed by
//! the type checker (spec §3 "Core AST (post-desugar)"). Read-only once
//! produced — see [`crate::desugar`] for the Surface → Core transform.

pub mod decl;
pub mod expr;
pub mod pattern;

pub use decl::{Declaration, LetBinding, Module};
pub use expr::{Expr, MatchArm, RecordUpdateItem, CONS, NIL};
pub use pattern::{Pattern, RecordPatternField};
