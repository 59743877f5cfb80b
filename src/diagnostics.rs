//! Cross-phase diagnostic model (spec §6, §7).
//!
//! Each phase defines its own error enum (see `lexer::LexError`,
//! `parser::ParseError`, `typeck::error::TypeError`,
//! `resolver::error::ResolveError`) and converts it into a [`Diagnostic`] at
//! the phase boundary. This is the type the "consumer interface" functions
//! (`tokenize`, `parse`, `desugar`, `typecheck`, `resolve_and_load`) report
//! through: a phase either returns its typed result or throws one fatal
//! `Diagnostic`, plus a `Vec<Diagnostic>` of accumulated warnings on success.

use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    Lexer,
    Parser,
    Desugarer,
    TypeChecker,
    Resolver,
}

impl Phase {
    fn prefix(self) -> &'static str {
        match self {
            Phase::Lexer => "VF1",
            Phase::Parser => "VF2",
            Phase::Desugarer => "VF3",
            Phase::TypeChecker => "VF4",
            Phase::Resolver => "VF5",
        }
    }
}

/// A single, fully-formed diagnostic: code, severity, phase, message,
/// location and an optional hint, exactly the fields spec §7 requires the
/// (out-of-scope) driver to print or serialize.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub phase: Phase,
    pub message: String,
    pub span: Span,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn new(
        phase: Phase,
        number: u32,
        severity: Severity,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Diagnostic {
            code: format!("{}{:03}", phase.prefix(), number),
            severity,
            phase,
            message: message.into(),
            span,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{code} [{sev}] {span}: {msg}",
            code = self.code,
            sev = match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            },
            span = self.span,
            msg = self.message,
        )?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
