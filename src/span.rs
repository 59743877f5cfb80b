//! Source locations shared by every compilation stage.
//!
//! Every Surface and Core AST node carries a [`Span`] recording the file,
//! line, column and byte offset of the token that triggered its
//! construction. Desugar-generated nodes inherit their parent's span rather
//! than fabricating a new one.

use std::fmt;
use std::rc::Rc;

/// A location in a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl Span {
    pub fn new(file: Rc<str>, line: usize, column: usize, byte_offset: usize) -> Self {
        Span {
            file,
            line,
            column,
            byte_offset,
        }
    }

    /// A span with no real provenance, used only in unit tests that do not
    /// care about locations.
    pub fn dummy() -> Self {
        Span {
            file: Rc::from("<test>"),
            line: 0,
            column: 0,
            byte_offset: 0,
        }
    }

    /// Merge two spans covering the same file into one spanning from `self`'s
    /// start to `other`'s start, used when a parsed construct's location
    /// should track its first token only (the common case in this parser).
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
            byte_offset: self.byte_offset.min(other.byte_offset),
        }
    }

    /// Render a short `file:line:column` excerpt of `source` pointing at this
    /// span, for use in tests and debug output. The driver's own diagnostic
    /// renderer (out of scope here) is expected to do something richer.
    pub fn excerpt(&self, source: &str) -> String {
        let line_text = source.lines().nth(self.line).unwrap_or("");
        let caret_padding = " ".repeat(self.column);
        format!(
            "{file}:{line}:{column}\n{line_text}\n{caret_padding}^",
            file = self.file,
            line = self.line + 1,
            column = self.column + 1,
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line + 1, self.column + 1)
    }
}
