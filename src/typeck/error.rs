use crate::span::Span;
use crate::typeck::types::{Monotype, VarId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("type mismatch at {span}: expected {expected:?}, found {actual:?}")]
    Mismatch {
        expected: Monotype,
        actual: Monotype,
        span: Span,
    },
    #[error("occurs check failed at {span}: variable {var} occurs in {ty:?}")]
    OccursCheck { var: VarId, ty: Monotype, span: Span },
    #[error("record mismatch at {span}: missing {missing:?}, unexpected {extra:?}")]
    RecordMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
        span: Span,
    },
    #[error("undefined variable '{name}' at {span}")]
    UndefinedVariable { name: String, span: Span },
    #[error("undefined type '{name}' at {span}")]
    UndefinedType { name: String, span: Span },
    #[error("unknown record field '{field}' at {span}")]
    UnknownField { field: String, span: Span },
    #[error("no overload of '{name}' accepts {arity} argument(s) at {span}; valid arities: {valid:?}")]
    NoMatchingOverload {
        name: String,
        arity: usize,
        valid: Vec<usize>,
        span: Span,
    },
    #[error("redefinition of reserved constructor '{name}' at {span}")]
    ReservedConstructorRedefined { name: String, span: Span },
    #[error("type alias '{name}' at {span} expands into itself with no variant or record in between")]
    CyclicAlias { name: String, span: Span },
}

impl TypeError {
    pub fn span(&self) -> &Span {
        match self {
            TypeError::Mismatch { span, .. }
            | TypeError::OccursCheck { span, .. }
            | TypeError::RecordMismatch { span, .. }
            | TypeError::UndefinedVariable { span, .. }
            | TypeError::UndefinedType { span, .. }
            | TypeError::UnknownField { span, .. }
            | TypeError::NoMatchingOverload { span, .. }
            | TypeError::ReservedConstructorRedefined { span, .. }
            | TypeError::CyclicAlias { span, .. } => span,
        }
    }

    /// VF4xxx error code per spec §6.
    pub fn code(&self) -> u32 {
        match self {
            TypeError::Mismatch { .. } => 1,
            TypeError::UndefinedVariable { .. } => 2,
            TypeError::UndefinedType { .. } => 3,
            TypeError::OccursCheck { .. } => 4,
            TypeError::RecordMismatch { .. } => 5,
            TypeError::UnknownField { .. } => 6,
            TypeError::NoMatchingOverload { .. } => 7,
            TypeError::ReservedConstructorRedefined { .. } => 8,
            TypeError::CyclicAlias { .. } => 9,
        }
    }
}

/// VF49xx warnings: non-fatal findings accumulated during a single check
/// (spec §4.4.1 "warnings", §4.4.6/§4.4.7 "reported as VF49xx warnings").
#[derive(Debug, Clone, PartialEq)]
pub enum TypeWarning {
    NonExhaustiveMatch { missing_summary: String, span: Span },
    /// Exhaustiveness could not be decided because the scrutinee's type was
    /// still an unresolved variable (spec §4.4.6).
    ExhaustivenessUndecidable { span: Span },
    UnreachableArm { span: Span },
}

impl TypeWarning {
    pub fn code(&self) -> u32 {
        match self {
            TypeWarning::NonExhaustiveMatch { .. } => 900,
            TypeWarning::ExhaustivenessUndecidable { .. } => 901,
            TypeWarning::UnreachableArm { .. } => 902,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            TypeWarning::NonExhaustiveMatch { span, .. }
            | TypeWarning::ExhaustivenessUndecidable { span }
            | TypeWarning::UnreachableArm { span } => span,
        }
    }
}

pub type TypeResult<T> = Result<T, TypeError>;
