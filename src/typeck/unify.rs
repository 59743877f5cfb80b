//! Unification (spec §4.4.2): structural for `Fn`/`App`/`Reference`/`Tuple`;
//! row unification for records, implementing width subtyping over open rows.

use crate::span::Span;
use crate::typeck::error::TypeError;
use crate::typeck::subst::Subst;
use crate::typeck::types::{Monotype, Row, RowTail, VarId};

pub fn unify(subst: &mut Subst, a: &Monotype, b: &Monotype, span: &Span) -> Result<(), TypeError> {
    let a = subst.resolve(a);
    let b = subst.resolve(b);
    match (&a, &b) {
        (Monotype::Var(v1), Monotype::Var(v2)) if v1 == v2 => Ok(()),
        (Monotype::Var(v), _) => bind_var(subst, *v, &b, span),
        (_, Monotype::Var(v)) => bind_var(subst, *v, &a, span),
        (Monotype::Int, Monotype::Int)
        | (Monotype::Float, Monotype::Float)
        | (Monotype::Bool, Monotype::Bool)
        | (Monotype::Str, Monotype::Str)
        | (Monotype::Unit, Monotype::Unit) => Ok(()),
        (Monotype::Fn(a1, r1), Monotype::Fn(a2, r2)) => {
            unify(subst, a1, a2, span)?;
            unify(subst, r1, r2, span)
        }
        (Monotype::Reference(t1), Monotype::Reference(t2)) => unify(subst, t1, t2, span),
        (Monotype::Tuple(items1), Monotype::Tuple(items2)) => {
            if items1.len() != items2.len() {
                return Err(mismatch(&a, &b, span));
            }
            for (x, y) in items1.iter().zip(items2.iter()) {
                unify(subst, x, y, span)?;
            }
            Ok(())
        }
        (Monotype::App(n1, args1), Monotype::App(n2, args2)) => {
            if n1 != n2 || args1.len() != args2.len() {
                return Err(mismatch(&a, &b, span));
            }
            for (x, y) in args1.iter().zip(args2.iter()) {
                unify(subst, x, y, span)?;
            }
            Ok(())
        }
        (Monotype::Record(r1), Monotype::Record(r2)) => unify_rows(subst, r1, r2, span),
        _ => Err(mismatch(&a, &b, span)),
    }
}

fn mismatch(a: &Monotype, b: &Monotype, span: &Span) -> TypeError {
    TypeError::Mismatch {
        expected: a.clone(),
        actual: b.clone(),
        span: span.clone(),
    }
}

fn bind_var(subst: &mut Subst, v: VarId, ty: &Monotype, span: &Span) -> Result<(), TypeError> {
    if let Monotype::Var(other) = ty {
        if *other == v {
            return Ok(());
        }
    }
    if occurs(subst, v, ty) {
        return Err(TypeError::OccursCheck {
            var: v,
            ty: ty.clone(),
            span: span.clone(),
        });
    }
    let level = subst.level_of(v);
    lower_levels_in(subst, ty, level);
    subst.bind(v, ty.clone());
    Ok(())
}

fn lower_levels_in(subst: &mut Subst, ty: &Monotype, level: u32) {
    match subst.resolve(ty) {
        Monotype::Var(v) => subst.lower_level(v, level),
        Monotype::Fn(a, b) => {
            lower_levels_in(subst, &a, level);
            lower_levels_in(subst, &b, level);
        }
        Monotype::App(_, args) => {
            for a in &args {
                lower_levels_in(subst, a, level);
            }
        }
        Monotype::Tuple(items) => {
            for t in &items {
                lower_levels_in(subst, t, level);
            }
        }
        Monotype::Reference(inner) => lower_levels_in(subst, &inner, level),
        Monotype::Record(row) => {
            for (_, t) in &row.fields {
                lower_levels_in(subst, t, level);
            }
            if let RowTail::Open(v) = row.rest {
                subst.lower_level(v, level);
            }
        }
        Monotype::Int | Monotype::Float | Monotype::Bool | Monotype::Str | Monotype::Unit => {}
    }
}

fn occurs(subst: &Subst, v: VarId, ty: &Monotype) -> bool {
    match subst.resolve(ty) {
        Monotype::Var(v2) => v2 == v,
        Monotype::Fn(a, b) => occurs(subst, v, &a) || occurs(subst, v, &b),
        Monotype::App(_, args) => args.iter().any(|a| occurs(subst, v, a)),
        Monotype::Tuple(items) => items.iter().any(|t| occurs(subst, v, t)),
        Monotype::Reference(inner) => occurs(subst, v, &inner),
        Monotype::Record(row) => {
            row.fields.iter().any(|(_, t)| occurs(subst, v, t)) || matches!(row.rest, RowTail::Open(v2) if v2 == v)
        }
        Monotype::Int | Monotype::Float | Monotype::Bool | Monotype::Str | Monotype::Unit => false,
    }
}

/// Row unification (spec §4.4.2):
/// - closed/closed: field sets and types must match exactly.
/// - closed/open: the open side is closed over the closed side's fields,
///   erroring if the open side demands a field the closed side lacks.
/// - open/open: both sides get the union of exclusive fields, with a fresh
///   shared open tail for anything still unconstrained.
pub fn unify_rows(subst: &mut Subst, r1: &Row, r2: &Row, span: &Span) -> Result<(), TypeError> {
    let r1 = subst.resolve_row(r1);
    let r2 = subst.resolve_row(r2);

    match (&r1.rest, &r2.rest) {
        (RowTail::Closed, RowTail::Closed) => {
            let names1: Vec<&str> = r1.fields.iter().map(|(n, _)| n.as_str()).collect();
            let names2: Vec<&str> = r2.fields.iter().map(|(n, _)| n.as_str()).collect();
            let missing: Vec<String> = names2
                .iter()
                .filter(|n| !names1.contains(n))
                .map(|s| s.to_string())
                .collect();
            let extra: Vec<String> = names1
                .iter()
                .filter(|n| !names2.contains(n))
                .map(|s| s.to_string())
                .collect();
            if !missing.is_empty() || !extra.is_empty() {
                return Err(TypeError::RecordMismatch {
                    missing,
                    extra,
                    span: span.clone(),
                });
            }
            for (name, t1) in &r1.fields {
                let t2 = r2.get(name).expect("field set already checked equal");
                unify(subst, t1, t2, span)?;
            }
            Ok(())
        }
        (RowTail::Open(v), RowTail::Closed) => close_over(subst, *v, &r1.fields, &r2, span),
        (RowTail::Closed, RowTail::Open(v)) => close_over(subst, *v, &r2.fields, &r1, span),
        (RowTail::Open(v1), RowTail::Open(v2)) => {
            if v1 == v2 {
                return unify_shared_fields(subst, &r1.fields, &r2.fields, span);
            }
            unify_shared_fields(subst, &r1.fields, &r2.fields, span)?;
            let names1: Vec<&str> = r1.fields.iter().map(|(n, _)| n.as_str()).collect();
            let names2: Vec<&str> = r2.fields.iter().map(|(n, _)| n.as_str()).collect();
            let only1: Vec<(String, Monotype)> = r1
                .fields
                .iter()
                .filter(|(n, _)| !names2.contains(&n.as_str()))
                .cloned()
                .collect();
            let only2: Vec<(String, Monotype)> = r2
                .fields
                .iter()
                .filter(|(n, _)| !names1.contains(&n.as_str()))
                .cloned()
                .collect();
            let fresh_tail = subst.fresh_id(subst.level_of(*v1).min(subst.level_of(*v2)));
            subst.bind(
                *v1,
                Monotype::Record(Row {
                    fields: only2,
                    rest: RowTail::Open(fresh_tail),
                }),
            );
            subst.bind(
                *v2,
                Monotype::Record(Row {
                    fields: only1,
                    rest: RowTail::Open(fresh_tail),
                }),
            );
            Ok(())
        }
    }
}

fn unify_shared_fields(
    subst: &mut Subst,
    fields1: &[(String, Monotype)],
    fields2: &[(String, Monotype)],
    span: &Span,
) -> Result<(), TypeError> {
    for (name, t1) in fields1 {
        if let Some((_, t2)) = fields2.iter().find(|(n, _)| n == name) {
            unify(subst, t1, t2, span)?;
        }
    }
    Ok(())
}

/// Binds an open row variable `v` (whose known fields are `open_fields`) so
/// that it equals `closed`, erroring if `open_fields` names something
/// `closed` doesn't have.
fn close_over(subst: &mut Subst, v: VarId, open_fields: &[(String, Monotype)], closed: &Row, span: &Span) -> Result<(), TypeError> {
    let missing: Vec<String> = open_fields
        .iter()
        .map(|(n, _)| n.clone())
        .filter(|n| closed.get(n).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(TypeError::RecordMismatch {
            missing,
            extra: Vec::new(),
            span: span.clone(),
        });
    }
    for (name, t) in open_fields {
        let other = closed.get(name).expect("checked above");
        unify(subst, t, other, span)?;
    }
    subst.bind(v, Monotype::Record(closed.clone()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn sp() -> Span {
        Span::dummy()
    }

    #[test]
    fn unifies_equal_primitives() {
        let mut s = Subst::new();
        assert!(unify(&mut s, &Monotype::Int, &Monotype::Int, &sp()).is_ok());
    }

    #[test]
    fn mismatched_primitives_error() {
        let mut s = Subst::new();
        assert!(unify(&mut s, &Monotype::Int, &Monotype::Bool, &sp()).is_err());
    }

    #[test]
    fn binds_variable_to_concrete_type() {
        let mut s = Subst::new();
        let v = s.fresh_id(0);
        unify(&mut s, &Monotype::Var(v), &Monotype::Int, &sp()).unwrap();
        assert_eq!(s.resolve(&Monotype::Var(v)), Monotype::Int);
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut s = Subst::new();
        let v = s.fresh_id(0);
        let fn_ty = Monotype::Fn(Box::new(Monotype::Var(v)), Box::new(Monotype::Int));
        assert!(unify(&mut s, &Monotype::Var(v), &fn_ty, &sp()).is_err());
    }

    #[test]
    fn closed_open_row_unification_closes_the_open_side() {
        let mut s = Subst::new();
        let tail = s.fresh_id(0);
        let open = Row {
            fields: vec![("x".into(), Monotype::Int)],
            rest: RowTail::Open(tail),
        };
        let closed = Row::closed(vec![("x".into(), Monotype::Int), ("y".into(), Monotype::Bool)]);
        unify_rows(&mut s, &open, &closed, &sp()).unwrap();
        let resolved = s.resolve(&Monotype::Var(tail));
        match resolved {
            Monotype::Record(r) => {
                assert_eq!(r.rest, RowTail::Closed);
                assert_eq!(r.get("y"), Some(&Monotype::Bool));
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn closed_open_errors_when_open_side_demands_missing_field() {
        let mut s = Subst::new();
        let tail = s.fresh_id(0);
        let open = Row {
            fields: vec![("z".into(), Monotype::Int)],
            rest: RowTail::Open(tail),
        };
        let closed = Row::closed(vec![("x".into(), Monotype::Int)]);
        assert!(unify_rows(&mut s, &open, &closed, &sp()).is_err());
    }

    #[test]
    fn open_open_rows_merge_exclusive_fields() {
        let mut s = Subst::new();
        let t1 = s.fresh_id(0);
        let t2 = s.fresh_id(0);
        let r1 = Row {
            fields: vec![("x".into(), Monotype::Int)],
            rest: RowTail::Open(t1),
        };
        let r2 = Row {
            fields: vec![("y".into(), Monotype::Bool)],
            rest: RowTail::Open(t2),
        };
        unify_rows(&mut s, &r1, &r2, &sp()).unwrap();
        let resolved1 = s.resolve_row(&r1);
        let resolved2 = s.resolve_row(&r2);
        assert!(resolved1.get("y").is_some());
        assert!(resolved2.get("x").is_some());
    }
}
