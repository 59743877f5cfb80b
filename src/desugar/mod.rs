//! Surface AST → Core AST (spec §4.3).
//!
//! Pure, total over well-formed input: every transformation in the spec's
//! table is implemented here, and nothing here can fail except on an
//! internally inconsistent AST (a parser bug, not a user error).

pub mod error;

pub use error::{DesugarError, DesugarResult};

use crate::core;
use crate::span::Span;
use crate::syntax;
use crate::util::fresh::FreshNames;

static FRESH: FreshNames = FreshNames::new("d");

pub fn desugar_module(module: syntax::Module) -> DesugarResult<core::Module> {
    let mut declarations = Vec::with_capacity(module.declarations.len());
    for decl in module.declarations {
        declarations.extend(desugar_declaration(decl)?);
    }
    Ok(core::Module {
        declarations,
        span: module.span,
    })
}

fn desugar_declaration(decl: syntax::Declaration) -> DesugarResult<Vec<core::Declaration>> {
    use syntax::Declaration as S;
    Ok(match decl {
        S::Let {
            recursive,
            bindings,
            exported,
            span,
        } => {
            let bindings = bindings
                .into_iter()
                .map(desugar_let_binding)
                .collect::<DesugarResult<Vec<_>>>()?;
            if recursive {
                for binding in &bindings {
                    if !matches!(binding.value, core::Expr::Lambda { .. }) {
                        return Err(DesugarError::RecGroupNotAllFunctions {
                            span: binding.span.clone(),
                        });
                    }
                }
            }
            vec![core::Declaration::Let {
                recursive,
                bindings,
                exported,
                span,
            }]
        }
        S::Type {
            decls,
            exported,
            span,
        } => vec![core::Declaration::Type {
            decls,
            exported,
            span,
        }],
        S::External { item, from, span } => vec![core::Declaration::External { item, from, span }],
        // `external { ... } from "m"` explodes into one Core external per
        // item, each carrying the block's shared `from` (spec §4.3).
        S::ExternalBlock(block) => block
            .items
            .into_iter()
            .map(|item| core::Declaration::External {
                span: item.span.clone(),
                item,
                from: Some(block.from.clone()),
            })
            .collect(),
        S::Import(import) => vec![core::Declaration::Import(import)],
        S::ReExport(reexport) => vec![core::Declaration::ReExport(reexport)],
    })
}

fn desugar_let_binding(binding: syntax::LetBinding) -> DesugarResult<core::LetBinding> {
    Ok(core::LetBinding {
        pattern: desugar_pattern(binding.pattern),
        mutable: binding.mutable,
        type_ann: binding.type_ann,
        value: desugar_expr(binding.value)?,
        span: binding.span,
    })
}

/// Eliminates list patterns (`Cons`/`Nil`) and or-patterns by expansion at
/// the call site (see [`expand_or`]); type annotations and every other
/// shape pass through unchanged.
fn desugar_pattern(pattern: syntax::Pattern) -> core::Pattern {
    use syntax::Pattern as S;
    match pattern {
        S::Wildcard(span) => core::Pattern::Wildcard(span),
        S::Var {
            name,
            type_ann,
            span,
        } => core::Pattern::Var {
            name,
            type_ann,
            span,
        },
        S::Literal(lit, span) => core::Pattern::Literal(lit, span),
        S::Variant { name, args, span } => core::Pattern::Variant {
            name,
            args: args.into_iter().map(desugar_pattern).collect(),
            span,
        },
        S::Tuple(items, span) => {
            core::Pattern::Tuple(items.into_iter().map(desugar_pattern).collect(), span)
        }
        S::Record { fields, span } => core::Pattern::Record {
            fields: fields
                .into_iter()
                .map(|f| core::RecordPatternField {
                    name: f.name.clone(),
                    pattern: match f.pattern {
                        Some(p) => desugar_pattern(p),
                        None => core::Pattern::Var {
                            name: f.name,
                            type_ann: None,
                            span: span.clone(),
                        },
                    },
                })
                .collect(),
            span,
        },
        S::List {
            elements,
            rest,
            span,
        } => desugar_list_pattern(elements, rest, span),
        S::Cons { head, tail, span } => core::Pattern::Variant {
            name: core::CONS.to_string(),
            args: vec![desugar_pattern(*head), desugar_pattern(*tail)],
            span,
        },
        // Or-patterns only ever appear as a match arm's top-level pattern
        // (the parser rejects bindings inside alternatives); expansion
        // happens in `desugar_match_arms`, so a bare `Or` reaching here is
        // only possible nested inside e.g. a tuple or variant argument.
        S::Or(alts, span) => {
            let expanded: Vec<core::Pattern> = alts.into_iter().map(desugar_pattern).collect();
            // A nested or-pattern with no enclosing arm to duplicate into:
            // represent it as a single-alternative variant-less choice by
            // picking the first; callers that care (top-level arms) never
            // reach this branch because they expand before recursing.
            expanded.into_iter().next().unwrap_or(core::Pattern::Wildcard(span))
        }
    }
}

/// `[p, ...r]` → `Cons(p, r)`; `[]` → `Nil`.
fn desugar_list_pattern(
    elements: Vec<syntax::Pattern>,
    rest: Option<Box<syntax::Pattern>>,
    span: Span,
) -> core::Pattern {
    let tail = match rest {
        Some(r) => desugar_pattern(*r),
        None => core::Pattern::Variant {
            name: core::NIL.to_string(),
            args: Vec::new(),
            span: span.clone(),
        },
    };
    elements.into_iter().rev().fold(tail, |tail, elem| {
        let elem_span = elem.span().clone();
        core::Pattern::Variant {
            name: core::CONS.to_string(),
            args: vec![desugar_pattern(elem), tail],
            span: elem_span,
        }
    })
}

/// Cartesian-product expansion of or-patterns nested anywhere in a pattern
/// tree, producing one pattern per combination of alternatives. A pattern
/// with no `Or` anywhere expands to a single-element vector (itself).
fn expand_or(pattern: &syntax::Pattern) -> Vec<syntax::Pattern> {
    use syntax::Pattern as S;
    match pattern {
        S::Or(alts, _) => alts.iter().flat_map(expand_or).collect(),
        S::Wildcard(_) | S::Var { .. } | S::Literal(_, _) => vec![pattern.clone()],
        S::Variant { name, args, span } => {
            cartesian(args, expand_or).into_iter().map(|args| S::Variant {
                name: name.clone(),
                args,
                span: span.clone(),
            }).collect()
        }
        S::Tuple(items, span) => cartesian(items, expand_or)
            .into_iter()
            .map(|items| S::Tuple(items, span.clone()))
            .collect(),
        S::Record { fields, span } => {
            let field_names: Vec<&String> = fields.iter().map(|f| &f.name).collect();
            let per_field: Vec<Vec<Option<syntax::Pattern>>> = fields
                .iter()
                .map(|f| match &f.pattern {
                    Some(p) => expand_or(p).into_iter().map(Some).collect(),
                    None => vec![None],
                })
                .collect();
            cartesian_raw(&per_field)
                .into_iter()
                .map(|combo| S::Record {
                    fields: field_names
                        .iter()
                        .zip(combo)
                        .map(|(name, pattern)| syntax::RecordPatternField {
                            name: (*name).clone(),
                            pattern,
                        })
                        .collect(),
                    span: span.clone(),
                })
                .collect()
        }
        S::List {
            elements,
            rest,
            span,
        } => {
            let rest_options: Vec<Option<Box<syntax::Pattern>>> = match rest {
                Some(r) => expand_or(r).into_iter().map(|p| Some(Box::new(p))).collect(),
                None => vec![None],
            };
            let elem_combos = cartesian(elements, expand_or);
            elem_combos
                .into_iter()
                .flat_map(|elements| {
                    let span = span.clone();
                    rest_options.iter().map(move |rest| S::List {
                        elements: elements.clone(),
                        rest: rest.clone(),
                        span: span.clone(),
                    }).collect::<Vec<_>>()
                })
                .collect()
        }
        S::Cons { head, tail, span } => {
            let heads = expand_or(head);
            let tails = expand_or(tail);
            heads
                .into_iter()
                .flat_map(|h| {
                    tails.iter().map(move |t| S::Cons {
                        head: Box::new(h.clone()),
                        tail: Box::new(t.clone()),
                        span: span.clone(),
                    }).collect::<Vec<_>>()
                })
                .collect()
        }
    }
}

/// Every combination of alternatives for a list of sub-patterns, each
/// expanded independently by `f`.
fn cartesian(
    items: &[syntax::Pattern],
    f: impl Fn(&syntax::Pattern) -> Vec<syntax::Pattern>,
) -> Vec<Vec<syntax::Pattern>> {
    items.iter().fold(vec![Vec::new()], |acc, item| {
        let choices = f(item);
        acc.into_iter()
            .flat_map(|prefix| {
                choices.iter().map(move |choice| {
                    let mut next = prefix.clone();
                    next.push(choice.clone());
                    next
                }).collect::<Vec<_>>()
            })
            .collect()
    })
}

fn cartesian_raw<T: Clone>(rows: &[Vec<T>]) -> Vec<Vec<T>> {
    rows.iter().fold(vec![Vec::new()], |acc, row| {
        acc.into_iter()
            .flat_map(|prefix| {
                row.iter().map(move |choice| {
                    let mut next = prefix.clone();
                    next.push(choice.clone());
                    next
                }).collect::<Vec<_>>()
            })
            .collect()
    })
}

fn desugar_expr(expr: syntax::Expr) -> DesugarResult<core::Expr> {
    use syntax::Expr as S;
    Ok(match expr {
        S::Literal(lit, span) => core::Expr::Literal(lit, span),
        S::Var(name, span) => core::Expr::Var(name, span),
        S::Lambda {
            params,
            return_type: _,
            body,
            span,
        } => desugar_lambda(params, *body, span)?,
        S::App { func, args, span } => desugar_app(*func, args, span)?,
        S::Binary { op, lhs, rhs, span } => core::Expr::Binary {
            op,
            lhs: Box::new(desugar_expr(*lhs)?),
            rhs: Box::new(desugar_expr(*rhs)?),
            span,
        },
        S::Unary { op, operand, span } => core::Expr::Unary {
            op,
            operand: Box::new(desugar_expr(*operand)?),
            span,
        },
        S::If {
            cond,
            then_branch,
            else_branch,
            span,
        } => core_if(desugar_expr(*cond)?, desugar_expr(*then_branch)?, desugar_expr(*else_branch)?, span),
        S::Match {
            scrutinee,
            arms,
            span,
        } => desugar_match(*scrutinee, arms, span)?,
        S::Block(block) => desugar_block(block)?,
        S::Record { fields, span } => desugar_record(fields, span)?,
        S::Proj { record, field, span } => core::Expr::Proj {
            record: Box::new(desugar_expr(*record)?),
            field,
            span,
        },
        S::List { elements, span } => desugar_list(elements, span)?,
        S::Cons { head, tail, span } => core::Expr::Variant {
            name: core::CONS.to_string(),
            args: vec![desugar_expr(*head)?, desugar_expr(*tail)?],
            span,
        },
        S::Tuple(items, span) => {
            let items = items
                .into_iter()
                .map(desugar_expr)
                .collect::<DesugarResult<Vec<_>>>()?;
            core::Expr::Tuple(items, span)
        }
        S::Pipe { value, func, span } => {
            let value = desugar_expr(*value)?;
            let func = desugar_expr(*func)?;
            core::Expr::App {
                func: Box::new(func),
                arg: Box::new(value),
                span,
            }
        }
        S::Compose { dir, lhs, rhs, span } => desugar_compose(dir, *lhs, *rhs, span)?,
        S::RefAssign { target, value, span } => core::Expr::RefAssign {
            target: Box::new(desugar_expr(*target)?),
            value: Box::new(desugar_expr(*value)?),
            span,
        },
        S::Annotate {
            expr,
            type_expr,
            span,
        } => core::Expr::Annotate {
            expr: Box::new(desugar_expr(*expr)?),
            type_expr,
            span,
        },
        S::MakeRef(inner, span) => core::Expr::MakeRef(Box::new(desugar_expr(*inner)?), span),
        S::Unsafe(inner, span) => core::Expr::Unsafe(Box::new(desugar_expr(*inner)?), span),
        S::While { cond, body, span } => core::Expr::While {
            cond: Box::new(desugar_expr(*cond)?),
            body: Box::new(desugar_expr(*body)?),
            span,
        },
    })
}

/// `(x, y) => e` → `(x) => (y) => e` (spec §4.3 currying).
fn desugar_lambda(
    params: Vec<syntax::LambdaParam>,
    body: syntax::Expr,
    span: Span,
) -> DesugarResult<core::Expr> {
    let mut result = desugar_expr(body)?;
    for p in params.into_iter().rev() {
        result = core::Expr::Lambda {
            param: desugar_pattern(p.pattern),
            param_type: p.type_ann,
            body: Box::new(result),
            span: span.clone(),
        };
    }
    Ok(result)
}

/// `f(a, b)` → `(f a) b` (spec §4.3 currying).
fn desugar_app(func: syntax::Expr, args: Vec<syntax::Expr>, span: Span) -> DesugarResult<core::Expr> {
    let func = desugar_expr(func)?;
    let mut result = func;
    for arg in args {
        let arg = desugar_expr(arg)?;
        result = core::Expr::App {
            func: Box::new(result),
            arg: Box::new(arg),
            span: span.clone(),
        };
    }
    Ok(result)
}

/// `f >> g` → `(x) => g(f(x))`; `f << g` → `(x) => f(g(x))` (spec §4.3),
/// with a fresh `x` so the composed function can be applied more than once.
fn desugar_compose(
    dir: syntax::ComposeDir,
    lhs: syntax::Expr,
    rhs: syntax::Expr,
    span: Span,
) -> DesugarResult<core::Expr> {
    let lhs = desugar_expr(lhs)?;
    let rhs = desugar_expr(rhs)?;
    let x = FRESH.next();
    let x_var = core::Expr::Var(x.clone(), span.clone());
    let (outer, inner) = match dir {
        syntax::ComposeDir::Forward => (rhs, lhs),
        syntax::ComposeDir::Backward => (lhs, rhs),
    };
    let applied_inner = core::Expr::App {
        func: Box::new(inner),
        arg: Box::new(x_var),
        span: span.clone(),
    };
    let applied_outer = core::Expr::App {
        func: Box::new(outer),
        arg: Box::new(applied_inner),
        span: span.clone(),
    };
    Ok(core::Expr::Lambda {
        param: core::Pattern::Var {
            name: x,
            type_ann: None,
            span: span.clone(),
        },
        param_type: None,
        body: Box::new(applied_outer),
        span,
    })
}

/// `if c then a else b` → `match c { true => a, false => b }` (spec §4.3);
/// Core has no `If` node.
fn core_if(cond: core::Expr, then_branch: core::Expr, else_branch: core::Expr, span: Span) -> core::Expr {
    core::Expr::Match {
        scrutinee: Box::new(cond),
        arms: vec![
            core::MatchArm {
                pattern: core::Pattern::Literal(syntax::Literal::Bool(true), span.clone()),
                body: then_branch,
            },
            core::MatchArm {
                pattern: core::Pattern::Literal(syntax::Literal::Bool(false), span.clone()),
                body: else_branch,
            },
        ],
        span,
    }
}

/// `match c { p₁ when g₁ => e₁, p₂ => e₂, ... }`: expands or-patterns into
/// duplicated arms (the guard travels with each duplicate), then lowers any
/// guard into a nested match over the remaining arms, binding the scrutinee
/// to a fresh variable so it is evaluated exactly once (spec §4.3).
fn desugar_match(scrutinee: syntax::Expr, arms: Vec<syntax::MatchArm>, span: Span) -> DesugarResult<core::Expr> {
    let scrutinee = desugar_expr(scrutinee)?;

    let mut items: Vec<(core::Pattern, Option<syntax::Expr>, syntax::Expr)> = Vec::new();
    for arm in &arms {
        for alt in expand_or(&arm.pattern) {
            items.push((desugar_pattern(alt), arm.guard.clone(), arm.body.clone()));
        }
    }

    if items.iter().all(|(_, guard, _)| guard.is_none()) {
        let core_arms = items
            .into_iter()
            .map(|(pattern, _, body)| Ok(core::MatchArm { pattern, body: desugar_expr(body)? }))
            .collect::<DesugarResult<Vec<_>>>()?;
        return Ok(core::Expr::Match {
            scrutinee: Box::new(scrutinee),
            arms: core_arms,
            span,
        });
    }

    let scrutinee_var = FRESH.next();
    let inner = build_guarded_match(&items, &scrutinee_var, &span)?;
    Ok(core::Expr::LetIn {
        pattern: core::Pattern::Var {
            name: scrutinee_var,
            type_ann: None,
            span: span.clone(),
        },
        recursive: false,
        type_ann: None,
        value: Box::new(scrutinee),
        body: Box::new(inner),
        span,
    })
}

/// Builds `match $scrutinee_var { p => if g then e else <match over the
/// remaining items> }`, duplicating the remaining-arms continuation into
/// every guarded arm's else-branch.
fn build_guarded_match(
    items: &[(core::Pattern, Option<syntax::Expr>, syntax::Expr)],
    scrutinee_var: &str,
    span: &Span,
) -> DesugarResult<core::Expr> {
    let mut core_arms = Vec::with_capacity(items.len());
    for (i, (pattern, guard, body)) in items.iter().enumerate() {
        let body = match guard {
            None => desugar_expr(body.clone())?,
            Some(guard) => {
                let guard = desugar_expr(guard.clone())?;
                let then_branch = desugar_expr(body.clone())?;
                let rest = &items[i + 1..];
                let else_branch = if rest.is_empty() {
                    // No further arm to fall back to; reachable only when
                    // the surface match was non-exhaustive, which the
                    // checker (not the desugarer) is responsible for
                    // flagging.
                    core::Expr::Match {
                        scrutinee: Box::new(core::Expr::Var(scrutinee_var.to_string(), span.clone())),
                        arms: Vec::new(),
                        span: span.clone(),
                    }
                } else {
                    build_guarded_match(rest, scrutinee_var, span)?
                };
                core_if(guard, then_branch, else_branch, span.clone())
            }
        };
        core_arms.push(core::MatchArm {
            pattern: pattern.clone(),
            body,
        });
    }
    Ok(core::Expr::Match {
        scrutinee: Box::new(core::Expr::Var(scrutinee_var.to_string(), span.clone())),
        arms: core_arms,
        span: span.clone(),
    })
}

/// `{ s₁; s₂; e }` → `let _ = s₁ in let _ = s₂ in e`; an empty block is
/// `()` (spec §4.3). The trailing expression, if the block ends with a
/// semicolon, is implicitly `()`.
fn desugar_block(block: syntax::Block) -> DesugarResult<core::Expr> {
    let span = block.span.clone();
    if block.stmts.is_empty() {
        return Ok(core::Expr::Literal(syntax::Literal::Unit, span));
    }
    let tail = if block.trailing_semi {
        core::Expr::Literal(syntax::Literal::Unit, span.clone())
    } else {
        // Last statement was not semicolon-terminated; it is guaranteed by
        // the parser to be a `BlockStmt::Expr`, not a `Let`.
        match block.stmts.last().unwrap() {
            syntax::BlockStmt::Expr(e) => desugar_expr(e.clone())?,
            syntax::BlockStmt::Let { .. } => {
                unreachable!("parser never leaves a non-semicolon-terminated `let` statement")
            }
        }
    };
    let body_stmts = if block.trailing_semi {
        &block.stmts[..]
    } else {
        &block.stmts[..block.stmts.len() - 1]
    };
    let mut result = tail;
    for stmt in body_stmts.iter().rev() {
        result = match stmt {
            syntax::BlockStmt::Expr(e) => core::Expr::LetIn {
                pattern: core::Pattern::Wildcard(e.span().clone()),
                recursive: false,
                type_ann: None,
                value: Box::new(desugar_expr(e.clone())?),
                body: Box::new(result),
                span: span.clone(),
            },
            syntax::BlockStmt::Let {
                pattern,
                mutable: _,
                type_ann,
                value,
                span: let_span,
            } => core::Expr::LetIn {
                pattern: desugar_pattern(pattern.clone()),
                recursive: false,
                type_ann: type_ann.clone(),
                value: Box::new(desugar_expr(value.clone())?),
                body: Box::new(result),
                span: let_span.clone(),
            },
        };
    }
    Ok(result)
}

/// Any spread turns a record literal into a fold over an empty open record
/// (spec §4.3's record-update node); otherwise it is a plain closed-row
/// construction.
fn desugar_record(fields: Vec<syntax::RecordField>, span: Span) -> DesugarResult<core::Expr> {
    let has_spread = fields.iter().any(|f| matches!(f, syntax::RecordField::Spread(_)));
    if !has_spread {
        let fields = fields
            .into_iter()
            .map(|f| match f {
                syntax::RecordField::Field(name, value) => Ok((name, desugar_expr(value)?)),
                syntax::RecordField::Shorthand(name, fspan) => {
                    Ok((name.clone(), core::Expr::Var(name, fspan)))
                }
                syntax::RecordField::Spread(_) => unreachable!("checked above"),
            })
            .collect::<DesugarResult<Vec<_>>>()?;
        return Ok(core::Expr::Record { fields, span });
    }
    let updates = fields
        .into_iter()
        .map(|f| {
            Ok(match f {
                syntax::RecordField::Field(name, value) => {
                    core::RecordUpdateItem::Field(name, desugar_expr(value)?)
                }
                syntax::RecordField::Shorthand(name, fspan) => {
                    core::RecordUpdateItem::Field(name.clone(), core::Expr::Var(name, fspan))
                }
                syntax::RecordField::Spread(e) => core::RecordUpdateItem::Spread(desugar_expr(e)?),
            })
        })
        .collect::<DesugarResult<Vec<_>>>()?;
    Ok(core::Expr::RecordUpdate { updates, span })
}

/// `[e1, e2]` → `Cons(e1, Cons(e2, Nil))`; a spread splices via the
/// runtime-provided `concat` (spec §4.3).
fn desugar_list(elements: Vec<syntax::ListElement>, span: Span) -> DesugarResult<core::Expr> {
    let nil = || core::Expr::Variant {
        name: core::NIL.to_string(),
        args: Vec::new(),
        span: span.clone(),
    };
    let mut result = nil();
    for elem in elements.into_iter().rev() {
        result = match elem {
            syntax::ListElement::Item(e) => {
                let e = desugar_expr(e)?;
                core::Expr::Variant {
                    name: core::CONS.to_string(),
                    args: vec![e, result],
                    span: span.clone(),
                }
            }
            syntax::ListElement::Spread(e) => {
                let e = desugar_expr(e)?;
                core::Expr::App {
                    func: Box::new(core::Expr::App {
                        func: Box::new(core::Expr::Var("concat".to_string(), span.clone())),
                        arg: Box::new(e),
                        span: span.clone(),
                    }),
                    arg: Box::new(result),
                    span: span.clone(),
                }
            }
        };
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;
    use crate::parser;

    fn desugar_source(src: &str) -> core::Module {
        let tokens = lexer::tokenize(src, "<test>").expect("lex failed");
        let module = parser::parse(tokens).expect("parse failed");
        desugar_module(module).expect("desugar failed")
    }

    fn only_let_value(module: core::Module) -> core::Expr {
        match module.declarations.into_iter().next().expect("no declarations") {
            core::Declaration::Let { mut bindings, .. } => bindings.remove(0).value,
            other => panic!("expected a let declaration, got {other:?}"),
        }
    }

    #[test]
    fn if_lowers_to_bool_match() {
        let module = desugar_source("let x = if true then 1 else 2;");
        let expr = only_let_value(module);
        match expr {
            core::Expr::Match { arms, .. } => {
                assert_eq!(arms.len(), 2);
                assert!(matches!(
                    arms[0].pattern,
                    core::Pattern::Literal(syntax::Literal::Bool(true), _)
                ));
                assert!(matches!(
                    arms[1].pattern,
                    core::Pattern::Literal(syntax::Literal::Bool(false), _)
                ));
            }
            other => panic!("expected Match, got {other:?}"),
        }
    }

    #[test]
    fn curried_lambda_has_single_param_per_level() {
        let module = desugar_source("let f = (a, b) => a;");
        let expr = only_let_value(module);
        match expr {
            core::Expr::Lambda { body, .. } => {
                assert!(matches!(*body, core::Expr::Lambda { .. }));
            }
            other => panic!("expected nested Lambda, got {other:?}"),
        }
    }

    #[test]
    fn curried_application_is_single_arg_chain() {
        let module = desugar_source("let x = f(1, 2);");
        let expr = only_let_value(module);
        match expr {
            core::Expr::App { func, .. } => {
                assert!(matches!(*func, core::Expr::App { .. }));
            }
            other => panic!("expected nested App, got {other:?}"),
        }
    }

    #[test]
    fn list_literal_lowers_to_cons_nil_chain() {
        let module = desugar_source("let xs = [1, 2];");
        let expr = only_let_value(module);
        match expr {
            core::Expr::Variant { name, args, .. } => {
                assert_eq!(name, core::CONS);
                match &args[1] {
                    core::Expr::Variant { name, args, .. } => {
                        assert_eq!(name, core::CONS);
                        assert!(matches!(&args[1], core::Expr::Variant { name, .. } if name == core::NIL));
                    }
                    other => panic!("expected Cons, got {other:?}"),
                }
            }
            other => panic!("expected Cons, got {other:?}"),
        }
    }

    #[test]
    fn cons_operator_matches_list_literal_shape() {
        let cons_expr = only_let_value(desugar_source("let xs = 1 :: 2 :: [];"));
        let list_expr = only_let_value(desugar_source("let xs = [1, 2];"));
        assert_eq!(format!("{cons_expr:?}"), format!("{list_expr:?}"));
    }

    #[test]
    fn block_statements_lower_to_nested_let_in() {
        let module = desugar_source("let x = { let a = 1; a };");
        let expr = only_let_value(module);
        match expr {
            core::Expr::LetIn { pattern, body, .. } => {
                assert!(matches!(pattern, core::Pattern::Var { name, .. } if name == "a"));
                assert!(matches!(*body, core::Expr::Var(ref n, _) if n == "a"));
            }
            other => panic!("expected LetIn, got {other:?}"),
        }
    }

    #[test]
    fn empty_block_is_unit() {
        let module = desugar_source("let x = { };");
        let expr = only_let_value(module);
        assert!(matches!(expr, core::Expr::Literal(syntax::Literal::Unit, _)));
    }

    #[test]
    fn record_with_spread_lowers_to_record_update() {
        let module = desugar_source("let x = { ...base, y: 1 };");
        let expr = only_let_value(module);
        match expr {
            core::Expr::RecordUpdate { updates, .. } => {
                assert_eq!(updates.len(), 2);
                assert!(matches!(updates[0], core::RecordUpdateItem::Spread(_)));
                assert!(matches!(updates[1], core::RecordUpdateItem::Field(ref n, _) if n == "y"));
            }
            other => panic!("expected RecordUpdate, got {other:?}"),
        }
    }

    #[test]
    fn record_without_spread_stays_a_plain_record() {
        let module = desugar_source("let x = { y: 1 };");
        let expr = only_let_value(module);
        assert!(matches!(expr, core::Expr::Record { .. }));
    }

    #[test]
    fn pipe_lowers_to_application() {
        let module = desugar_source("let x = a |> f;");
        let expr = only_let_value(module);
        match expr {
            core::Expr::App { func, arg, .. } => {
                assert!(matches!(*func, core::Expr::Var(ref n, _) if n == "f"));
                assert!(matches!(*arg, core::Expr::Var(ref n, _) if n == "a"));
            }
            other => panic!("expected App, got {other:?}"),
        }
    }

    #[test]
    fn forward_compose_wraps_a_fresh_lambda() {
        let module = desugar_source("let h = f >> g;");
        let expr = only_let_value(module);
        match expr {
            core::Expr::Lambda { param, body, .. } => {
                assert!(matches!(param, core::Pattern::Var { .. }));
                assert!(matches!(*body, core::Expr::App { .. }));
            }
            other => panic!("expected Lambda, got {other:?}"),
        }
    }

    #[test]
    fn or_pattern_duplicates_match_arms() {
        let module = desugar_source("let x = match v { 1 | 2 => true, _ => false };");
        let expr = only_let_value(module);
        match expr {
            core::Expr::Match { arms, .. } => assert_eq!(arms.len(), 3),
            other => panic!("expected Match, got {other:?}"),
        }
    }

    #[test]
    fn guarded_arm_lowers_to_nested_if_in_match_body() {
        let module = desugar_source("let x = match v { n when n > 0 => 1, _ => 0 };");
        let expr = only_let_value(module);
        // The guard forces the whole match behind a `let $scrutinee_var = v in ...`.
        match expr {
            core::Expr::LetIn { body, .. } => match *body {
                core::Expr::Match { arms, .. } => {
                    assert_eq!(arms.len(), 2);
                    assert!(matches!(arms[0].body, core::Expr::Match { .. }));
                }
                other => panic!("expected Match, got {other:?}"),
            },
            other => panic!("expected LetIn, got {other:?}"),
        }
    }

    #[test]
    fn recursive_non_function_binding_is_rejected() {
        let tokens = lexer::tokenize("let rec x = 1;", "<test>").expect("lex failed");
        let module = parser::parse(tokens).expect("parse failed");
        let err = desugar_module(module).expect_err("non-function rec binding must be rejected");
        assert_eq!(err.code(), 1);
    }
}
