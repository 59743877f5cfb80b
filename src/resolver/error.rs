use std::path::PathBuf;

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot resolve import '{specifier}' from '{importer}' at {span}")]
    ModuleNotFound {
        specifier: String,
        importer: PathBuf,
        span: Span,
    },
    #[error("module '{path}' imports itself at {span}")]
    SelfImport { path: PathBuf, span: Span },
    #[error("invalid vibefun.json at '{path}': {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
    #[error("could not load module '{path}': {reason}")]
    LoadFailure { path: PathBuf, reason: String },
}

impl ResolveError {
    /// VF5xxx error code per spec §6.
    pub fn code(&self) -> u32 {
        match self {
            ResolveError::ModuleNotFound { .. } => 0,
            ResolveError::SelfImport { .. } => 4,
            ResolveError::InvalidConfig { .. } => 5,
            ResolveError::LoadFailure { .. } => 6,
        }
    }
}

/// Non-fatal resolver findings (spec §4.5, §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// A value-edge cycle among the given canonical paths (spec §4.5
    /// "Cycle detection"); the path is listed in DFS discovery order and
    /// closes back on its first element.
    CircularDependency { cycle: Vec<PathBuf> },
    /// The resolved path's basename differs from the importer's specifier
    /// only in case (spec §4.5 step 6).
    CaseMismatch {
        specifier: String,
        resolved: PathBuf,
        span: Span,
    },
}

impl ResolveWarning {
    pub fn code(&self) -> u32 {
        match self {
            ResolveWarning::CircularDependency { .. } => 900,
            ResolveWarning::CaseMismatch { .. } => 901,
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
