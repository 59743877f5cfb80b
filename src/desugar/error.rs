use crate::span::Span;

/// Internal consistency failures only — a well-formed Surface AST never
/// triggers these (spec §4.3 "fails only on malformed AST").
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DesugarError {
    #[error("`let rec ... and ...` group at {span} contains a non-function binding")]
    RecGroupNotAllFunctions { span: Span },
}

impl DesugarError {
    pub fn span(&self) -> &Span {
        match self {
            DesugarError::RecGroupNotAllFunctions { span } => span,
        }
    }

    /// VF3xxx error code per spec §6.
    pub fn code(&self) -> u32 {
        match self {
            DesugarError::RecGroupNotAllFunctions { .. } => 1,
        }
    }
}

pub type DesugarResult<T> = Result<T, DesugarError>;
