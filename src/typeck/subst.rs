//! Union-find style substitution with levels (spec §4.4.1 "env / subst /
//! level"). Bindings are resolved on demand rather than eagerly compressed;
//! `level` records the let-nesting depth a variable was created at, which
//! generalization uses to decide which variables are "local enough" to
//! quantify without a full free-variable scan of the environment.

use std::collections::HashMap;

use crate::typeck::types::{Monotype, Row, RowTail, VarId};

#[derive(Debug, Default)]
pub struct Subst {
    next_var: VarId,
    bindings: HashMap<VarId, Monotype>,
    levels: HashMap<VarId, u32>,
}

impl Subst {
    pub fn new() -> Self {
        Subst {
            next_var: 0,
            bindings: HashMap::new(),
            levels: HashMap::new(),
        }
    }

    pub fn fresh(&mut self, level: u32) -> Monotype {
        let id = self.next_var;
        self.next_var += 1;
        self.levels.insert(id, level);
        Monotype::Var(id)
    }

    pub fn fresh_id(&mut self, level: u32) -> VarId {
        match self.fresh(level) {
            Monotype::Var(id) => id,
            _ => unreachable!(),
        }
    }

    pub fn level_of(&self, var: VarId) -> u32 {
        self.levels.get(&var).copied().unwrap_or(u32::MAX)
    }

    /// Lowers a variable's level when it's unified with something from an
    /// outer scope, so generalization doesn't quantify over it too early
    /// (standard level-based HM, as in the rank-tracking used by OCaml's
    /// inference).
    pub fn lower_level(&mut self, var: VarId, level: u32) {
        let entry = self.levels.entry(var).or_insert(level);
        if level < *entry {
            *entry = level;
        }
    }

    pub fn bind(&mut self, var: VarId, ty: Monotype) {
        self.bindings.insert(var, ty);
    }

    pub fn is_bound(&self, var: VarId) -> bool {
        self.bindings.contains_key(&var)
    }

    /// Follows variable bindings to a representative, non-destructively.
    pub fn resolve(&self, ty: &Monotype) -> Monotype {
        match ty {
            Monotype::Var(v) => match self.bindings.get(v) {
                Some(bound) => self.resolve(bound),
                None => Monotype::Var(*v),
            },
            Monotype::Int | Monotype::Float | Monotype::Bool | Monotype::Str | Monotype::Unit => ty.clone(),
            Monotype::Fn(a, b) => Monotype::Fn(Box::new(self.resolve(a)), Box::new(self.resolve(b))),
            Monotype::App(name, args) => Monotype::App(name.clone(), args.iter().map(|a| self.resolve(a)).collect()),
            Monotype::Tuple(items) => Monotype::Tuple(items.iter().map(|t| self.resolve(t)).collect()),
            Monotype::Reference(inner) => Monotype::Reference(Box::new(self.resolve(inner))),
            Monotype::Record(row) => Monotype::Record(self.resolve_row(row)),
        }
    }

    pub fn resolve_row(&self, row: &Row) -> Row {
        let fields = row.fields.iter().map(|(n, t)| (n.clone(), self.resolve(t))).collect();
        match row.rest {
            RowTail::Closed => Row {
                fields,
                rest: RowTail::Closed,
            },
            RowTail::Open(v) => match self.bindings.get(&v) {
                Some(Monotype::Record(inner)) => {
                    let inner = self.resolve_row(inner);
                    let mut merged = fields;
                    merged.extend(inner.fields);
                    Row {
                        fields: merged,
                        rest: inner.rest,
                    }
                }
                _ => Row {
                    fields,
                    rest: RowTail::Open(v),
                },
            },
        }
    }

    /// Free type variables of `ty` under the current substitution, that
    /// belong to a level deeper than `boundary` (candidates for
    /// generalization at a let that closes over level `boundary`).
    pub fn free_vars_above(&self, ty: &Monotype, boundary: u32, out: &mut Vec<VarId>) {
        match self.resolve(ty) {
            Monotype::Var(v) => {
                if self.level_of(v) > boundary && !out.contains(&v) {
                    out.push(v);
                }
            }
            Monotype::Int | Monotype::Float | Monotype::Bool | Monotype::Str | Monotype::Unit => {}
            Monotype::Fn(a, b) => {
                self.free_vars_above(&a, boundary, out);
                self.free_vars_above(&b, boundary, out);
            }
            Monotype::App(_, args) => {
                for a in &args {
                    self.free_vars_above(a, boundary, out);
                }
            }
            Monotype::Tuple(items) => {
                for t in &items {
                    self.free_vars_above(t, boundary, out);
                }
            }
            Monotype::Reference(inner) => self.free_vars_above(&inner, boundary, out),
            Monotype::Record(row) => {
                for (_, t) in &row.fields {
                    self.free_vars_above(t, boundary, out);
                }
                if let RowTail::Open(v) = row.rest {
                    if self.level_of(v) > boundary && !out.contains(&v) {
                        out.push(v);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_vars_are_distinct_and_leveled() {
        let mut s = Subst::new();
        let a = s.fresh_id(0);
        let b = s.fresh_id(1);
        assert_ne!(a, b);
        assert_eq!(s.level_of(a), 0);
        assert_eq!(s.level_of(b), 1);
    }

    #[test]
    fn resolve_follows_chained_bindings() {
        let mut s = Subst::new();
        let a = s.fresh_id(0);
        let b = s.fresh_id(0);
        s.bind(a, Monotype::Var(b));
        s.bind(b, Monotype::Int);
        assert_eq!(s.resolve(&Monotype::Var(a)), Monotype::Int);
    }

    #[test]
    fn resolve_row_merges_bound_open_tail() {
        let mut s = Subst::new();
        let tail = s.fresh_id(0);
        let row = Row {
            fields: vec![("x".into(), Monotype::Int)],
            rest: RowTail::Open(tail),
        };
        s.bind(
            tail,
            Monotype::Record(Row::closed(vec![("y".into(), Monotype::Bool)])),
        );
        let resolved = s.resolve_row(&row);
        assert_eq!(resolved.rest, RowTail::Closed);
        assert_eq!(
            resolved.fields,
            vec![("x".into(), Monotype::Int), ("y".into(), Monotype::Bool)]
        );
    }
}
