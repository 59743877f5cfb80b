//! Pattern exhaustiveness (spec §4.4.6), a Maranget-style usefulness check
//! over the Core AST. List patterns have already become `Cons`/`Nil`
//! variants and or-patterns/guards are already gone, so the only pattern
//! shapes left are wildcard/variable, literal, variant, record and tuple.

use crate::core::pattern::Pattern;
use crate::typeck::env::Env;
use crate::typeck::subst::Subst;
use crate::typeck::types::Monotype;

pub enum Exhaustiveness {
    Exhaustive,
    Missing(String),
    /// The scrutinee's type was still a variable; the caller should emit a
    /// VF4900-class warning rather than trusting the result either way.
    Undecidable,
}

/// One row of the pattern matrix: the patterns the checker still needs to
/// rule out (here always a single column, since every match has one
/// scrutinee, but specialization recurses into multi-argument sub-matrices).
type Matrix = Vec<Vec<Pattern>>;

pub fn check(env: &Env, subst: &Subst, scrutinee_ty: &Monotype, patterns: &[Pattern]) -> Exhaustiveness {
    let ty = subst.resolve(scrutinee_ty);
    if is_open_variable(&ty) {
        return Exhaustiveness::Undecidable;
    }
    let matrix: Matrix = patterns.iter().map(|p| vec![p.clone()]).collect();
    let wildcard = vec![Pattern::Wildcard(patterns.first().map(|p| p.span().clone()).unwrap_or(crate::span::Span::dummy()))];
    match useful(env, subst, &matrix, &[ty.clone()], &wildcard) {
        Some(witness) => Exhaustiveness::Missing(describe(&witness[0])),
        None => Exhaustiveness::Exhaustive,
    }
}

/// Is the arm at `index` redundant given every earlier arm? (spec:
/// "overlapping/unreachable arms report the redundant arm").
pub fn is_redundant(env: &Env, subst: &Subst, scrutinee_ty: &Monotype, patterns: &[Pattern], index: usize) -> bool {
    let ty = subst.resolve(scrutinee_ty);
    if is_open_variable(&ty) {
        return false;
    }
    let matrix: Matrix = patterns[..index].iter().map(|p| vec![p.clone()]).collect();
    let query = vec![patterns[index].clone()];
    useful(env, subst, &matrix, &[ty], &query).is_none()
}

fn is_open_variable(ty: &Monotype) -> bool {
    matches!(ty, Monotype::Var(_))
}

fn describe(p: &Pattern) -> String {
    match p {
        Pattern::Wildcard(_) | Pattern::Var { .. } => "_".to_string(),
        Pattern::Literal(l, _) => format!("{l:?}"),
        Pattern::Variant { name, args, .. } if args.is_empty() => name.clone(),
        Pattern::Variant { name, args, .. } => format!("{name}({})", args.iter().map(describe).collect::<Vec<_>>().join(", ")),
        Pattern::Record { fields, .. } => format!(
            "{{ {} }}",
            fields.iter().map(|f| format!("{}: {}", f.name, describe(&f.pattern))).collect::<Vec<_>>().join(", ")
        ),
        Pattern::Tuple(items, _) => format!("({})", items.iter().map(describe).collect::<Vec<_>>().join(", ")),
    }
}

/// `U(matrix, query)`: returns a witness row showing a value shape the
/// query covers that the matrix does not, or `None` if the matrix already
/// covers everything the query does (i.e. the query is useless).
fn useful(env: &Env, subst: &Subst, matrix: &Matrix, col_types: &[Monotype], query: &[Pattern]) -> Option<Vec<Pattern>> {
    if query.is_empty() {
        return if matrix.is_empty() { Some(Vec::new()) } else { None };
    }

    let head = &query[0];
    let rest_query = &query[1..];
    let rest_types = &col_types[1..];

    match head {
        Pattern::Wildcard(_) | Pattern::Var { .. } => {
            let ctors = column_constructors(matrix);
            if let Some(complete) = complete_signature(env, &col_types[0], &ctors) {
                for ctor in &complete {
                    let arity = ctor.arity;
                    let sub_matrix = specialize(matrix, ctor, arity);
                    let sub_col_types = ctor_arg_types(env, subst, &col_types[0], ctor);
                    let mut sub_query: Vec<Pattern> = vec![wildcard_like(&query[0]); arity];
                    sub_query.extend_from_slice(rest_query);
                    let mut sub_types = sub_col_types;
                    sub_types.extend_from_slice(rest_types);
                    if let Some(witness) = useful(env, subst, &sub_matrix, &sub_types, &sub_query) {
                        let (args, remainder) = witness.split_at(arity);
                        let built = ctor.rebuild(args.to_vec(), query[0].span().clone());
                        let mut out = vec![built];
                        out.extend_from_slice(remainder);
                        return Some(out);
                    }
                }
                None
            } else {
                let default = default_matrix(matrix);
                useful(env, subst, &default, rest_types, rest_query).map(|mut w| {
                    w.insert(0, Pattern::Wildcard(query[0].span().clone()));
                    w
                })
            }
        }
        _ => {
            let ctor = ctor_of(head);
            let arity = ctor.arity;
            let sub_matrix = specialize(matrix, &ctor, arity);
            let sub_col_types = ctor_arg_types(env, subst, &col_types[0], &ctor);
            let mut sub_query = sub_patterns(head);
            sub_query.extend_from_slice(rest_query);
            let mut sub_types = sub_col_types;
            sub_types.extend_from_slice(rest_types);
            useful(env, subst, &sub_matrix, &sub_types, &sub_query).map(|witness| {
                let (args, remainder) = witness.split_at(arity);
                let built = ctor.rebuild(args.to_vec(), head.span().clone());
                let mut out = vec![built];
                out.extend_from_slice(remainder);
                out
            })
        }
    }
}

fn wildcard_like(p: &Pattern) -> Pattern {
    Pattern::Wildcard(p.span().clone())
}

/// A constructor tag identifying which shape a specialization targets.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Ctor {
    Literal(String),
    Variant(String),
    Tuple,
    Record(Vec<String>),
}

struct CtorShape {
    tag: Ctor,
    arity: usize,
}

impl CtorShape {
    fn rebuild(&self, args: Vec<Pattern>, span: crate::span::Span) -> Pattern {
        match &self.tag {
            Ctor::Literal(_) => args.into_iter().next().unwrap_or(Pattern::Wildcard(span)),
            Ctor::Variant(name) => Pattern::Variant { name: name.clone(), args, span },
            Ctor::Tuple => Pattern::Tuple(args, span),
            Ctor::Record(names) => Pattern::Record {
                fields: names
                    .iter()
                    .cloned()
                    .zip(args)
                    .map(|(name, pattern)| crate::core::pattern::RecordPatternField { name, pattern })
                    .collect(),
                span,
            },
        }
    }
}

fn ctor_of(p: &Pattern) -> CtorShape {
    match p {
        Pattern::Literal(l, _) => CtorShape {
            tag: Ctor::Literal(format!("{l:?}")),
            arity: 0,
        },
        Pattern::Variant { name, args, .. } => CtorShape {
            tag: Ctor::Variant(name.clone()),
            arity: args.len(),
        },
        Pattern::Tuple(items, _) => CtorShape {
            tag: Ctor::Tuple,
            arity: items.len(),
        },
        Pattern::Record { fields, .. } => CtorShape {
            tag: Ctor::Record(fields.iter().map(|f| f.name.clone()).collect()),
            arity: fields.len(),
        },
        Pattern::Wildcard(_) | Pattern::Var { .. } => unreachable!("wildcard has no constructor"),
    }
}

fn sub_patterns(p: &Pattern) -> Vec<Pattern> {
    match p {
        Pattern::Literal(..) => Vec::new(),
        Pattern::Variant { args, .. } => args.clone(),
        Pattern::Tuple(items, _) => items.clone(),
        Pattern::Record { fields, .. } => fields.iter().map(|f| f.pattern.clone()).collect(),
        Pattern::Wildcard(_) | Pattern::Var { .. } => Vec::new(),
    }
}

fn column_constructors(matrix: &Matrix) -> Vec<CtorShape> {
    let mut seen: Vec<CtorShape> = Vec::new();
    for row in matrix {
        if let Some(head) = row.first() {
            if !matches!(head, Pattern::Wildcard(_) | Pattern::Var { .. }) {
                let shape = ctor_of(head);
                if !seen.iter().any(|s| s.tag == shape.tag) {
                    seen.push(shape);
                }
            }
        }
    }
    seen
}

/// Returns the full constructor set for `ty` if it's a closed, enumerable
/// shape (bool, unit, tuple, closed record, or a known variant type); `None`
/// when the type is open-ended (Int/Float/Str, or a record/variant that
/// can't be enumerated from the type alone), signalling "use the wildcard
/// default matrix instead".
fn complete_signature(env: &Env, ty: &Monotype, seen: &[CtorShape]) -> Option<Vec<CtorShape>> {
    match ty {
        Monotype::Bool => Some(vec![
            CtorShape {
                tag: Ctor::Literal("Bool(true)".into()),
                arity: 0,
            },
            CtorShape {
                tag: Ctor::Literal("Bool(false)".into()),
                arity: 0,
            },
        ]),
        Monotype::Unit => Some(vec![CtorShape {
            tag: Ctor::Literal("Unit".into()),
            arity: 0,
        }]),
        Monotype::Tuple(items) => Some(vec![CtorShape {
            tag: Ctor::Tuple,
            arity: items.len(),
        }]),
        Monotype::Record(row) => {
            if matches!(row.rest, crate::typeck::types::RowTail::Closed) {
                Some(vec![CtorShape {
                    tag: Ctor::Record(row.fields.iter().map(|(n, _)| n.clone()).collect()),
                    arity: row.fields.len(),
                }])
            } else {
                None
            }
        }
        Monotype::App(name, _) => {
            let def = env.types.get(name)?;
            match &def.kind {
                crate::typeck::env::TypeDefKind::Variant(cases) => Some(
                    cases
                        .iter()
                        .map(|(ctor_name, fields)| CtorShape {
                            tag: Ctor::Variant(ctor_name.clone()),
                            arity: fields.len(),
                        })
                        .collect(),
                ),
                _ => None,
            }
        }
        _ => {
            let _ = seen;
            None
        }
    }
}

fn ctor_arg_types(env: &Env, subst: &Subst, scrutinee_ty: &Monotype, ctor: &CtorShape) -> Vec<Monotype> {
    match &ctor.tag {
        Ctor::Literal(_) => Vec::new(),
        Ctor::Tuple => match subst.resolve(scrutinee_ty) {
            Monotype::Tuple(items) => items,
            _ => vec![Monotype::Var(u64::MAX); ctor.arity],
        },
        Ctor::Record(names) => match subst.resolve(scrutinee_ty) {
            Monotype::Record(row) => names.iter().map(|n| row.get(n).cloned().unwrap_or(Monotype::Var(u64::MAX))).collect(),
            _ => vec![Monotype::Var(u64::MAX); ctor.arity],
        },
        Ctor::Variant(name) => {
            let type_name = match subst.resolve(scrutinee_ty) {
                Monotype::App(t, _) => Some(t),
                _ => None,
            };
            type_name
                .and_then(|t| env.types.get(&t))
                .and_then(|def| match &def.kind {
                    crate::typeck::env::TypeDefKind::Variant(cases) => {
                        cases.iter().find(|(n, _)| n == name).map(|(_, fields)| fields.len())
                    }
                    _ => None,
                })
                .map(|n| vec![Monotype::Var(u64::MAX); n])
                .unwrap_or_else(|| vec![Monotype::Var(u64::MAX); ctor.arity])
        }
    }
}

fn specialize(matrix: &Matrix, ctor: &CtorShape, arity: usize) -> Matrix {
    let mut out = Vec::new();
    for row in matrix {
        let Some(head) = row.first() else { continue };
        match head {
            Pattern::Wildcard(s) | Pattern::Var { span: s, .. } => {
                let mut new_row = vec![Pattern::Wildcard(s.clone()); arity];
                new_row.extend_from_slice(&row[1..]);
                out.push(new_row);
            }
            _ if ctor_of(head).tag == ctor.tag => {
                let mut new_row = sub_patterns(head);
                new_row.extend_from_slice(&row[1..]);
                out.push(new_row);
            }
            _ => {}
        }
    }
    out
}

fn default_matrix(matrix: &Matrix) -> Matrix {
    let mut out = Vec::new();
    for row in matrix {
        if let Some(head) = row.first() {
            if matches!(head, Pattern::Wildcard(_) | Pattern::Var { .. }) {
                out.push(row[1..].to_vec());
            }
        }
    }
    out
}
