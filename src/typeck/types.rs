//! Checker-domain types (spec §3 "Types (checker domain)").

pub type VarId = u64;

/// A record's "further fields" marker: closed rows reject anything not
/// listed; open rows leave room for more, the mechanism behind width
/// subtyping (spec §4.4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowTail {
    Closed,
    Open(VarId),
}

/// Ordered record fields plus a tail (spec: "record (ordered fields + row
/// variable for open rows)").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub fields: Vec<(String, Monotype)>,
    pub rest: RowTail,
}

impl Row {
    pub fn closed(fields: Vec<(String, Monotype)>) -> Self {
        Row {
            fields,
            rest: RowTail::Closed,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Monotype> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Monotype {
    Var(VarId),
    Int,
    Float,
    Bool,
    Str,
    Unit,
    Fn(Box<Monotype>, Box<Monotype>),
    /// A user type constructor applied to its arguments, e.g. `Option<Int>`
    /// or a nullary `Option` applied to zero arguments.
    App(String, Vec<Monotype>),
    Record(Row),
    Tuple(Vec<Monotype>),
    Reference(Box<Monotype>),
}

impl Monotype {
    pub fn function(params: &[Monotype], result: Monotype) -> Monotype {
        params
            .iter()
            .rev()
            .fold(result, |acc, p| Monotype::Fn(Box::new(p.clone()), Box::new(acc)))
    }
}

/// `∀α₁…αₙ. τ` — quantifies only the variables bound at generalization time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    pub vars: Vec<VarId>,
    pub body: Monotype,
}

impl Scheme {
    pub fn monomorphic(body: Monotype) -> Self {
        Scheme {
            vars: Vec::new(),
            body,
        }
    }
}
