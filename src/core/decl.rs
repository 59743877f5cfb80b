//! Core declarations (spec §3 "Core AST (post-desugar)"): `let`, `let rec`
//! group, `type`, `external`, `import`, `export`. External blocks are
//! exploded into individual externals during desugaring.

use crate::core::expr::Expr;
use crate::core::pattern::Pattern;
use crate::span::Span;
use crate::syntax::{ExternalItem, Import, ReExport, TypeDecl};

#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    pub pattern: Pattern,
    pub mutable: bool,
    pub type_ann: Option<crate::syntax::TypeExpr>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Let {
        recursive: bool,
        bindings: Vec<LetBinding>,
        exported: bool,
        span: Span,
    },
    Type {
        decls: Vec<TypeDecl>,
        exported: bool,
        span: Span,
    },
    /// One exploded external; always carries its `from` explicitly, even
    /// when it came from a single (non-block) surface external with no
    /// source module (`from: None`).
    External {
        item: ExternalItem,
        from: Option<String>,
        span: Span,
    },
    Import(Import),
    ReExport(ReExport),
}

impl Declaration {
    pub fn span(&self) -> &Span {
        match self {
            Declaration::Let { span, .. } => span,
            Declaration::Type { span, .. } => span,
            Declaration::External { span, .. } => span,
            Declaration::Import(i) => &i.span,
            Declaration::ReExport(r) => &r.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub declarations: Vec<Declaration>,
    pub span: Span,
}
