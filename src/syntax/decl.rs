//! Surface declarations and modules (spec §3 "Declaration", "Module").

use crate::span::Span;
use crate::syntax::expr::Expr;
use crate::syntax::pattern::Pattern;
use crate::syntax::type_expr::TypeExpr;

/// One binding in a `let` / `let rec ... and ...` group. A group of more
/// than one binding is only valid when the declaration is `rec` (spec §3
/// "`and` joins only `rec` groups").
#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    pub pattern: Pattern,
    /// `let mut x = ...` — gives `x` ref-cell semantics in the checker.
    pub mutable: bool,
    pub type_ann: Option<TypeExpr>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantCase {
    pub name: String,
    pub fields: Vec<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDeclBody {
    Alias(TypeExpr),
    Variant(Vec<VariantCase>),
    Record {
        fields: Vec<(String, TypeExpr)>,
        open: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: TypeDeclBody,
    pub span: Span,
}

/// One `name : Type = "jsName"` entry, shared by the single-external and
/// external-block surface forms (spec §3 "External").
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalItem {
    pub name: String,
    pub type_expr: TypeExpr,
    /// The bound JS identifier; defaults to `name` when omitted.
    pub js_name: Option<String>,
    pub span: Span,
}

/// `external { name: T = "js"; ... } from "module"` — multiple externals
/// sharing one `from` clause. Exploded into individual `External`
/// declarations during desugaring (spec §3 Core AST).
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalBlock {
    pub items: Vec<ExternalItem>,
    pub from: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub name: String,
    pub alias: Option<String>,
    /// `import { type T }` — this single item is type-only even when the
    /// surrounding import is not (a "mixed" import).
    pub type_only: bool,
}

/// How the imported bindings are bound into scope. A plain side-effect
/// import (`import "./setup";`) has no names at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportBindings {
    /// `import { a, b as c } from "mod"`
    Named(Vec<ImportItem>),
    /// `import * as ns from "mod"`
    Namespace(String),
    /// `import "mod"` with no bindings.
    SideEffectOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub bindings: ImportBindings,
    /// `import type { ... } from "mod"` — every binding in this import is
    /// type-only, contributing only a type-level dependency edge.
    pub type_only: bool,
    pub from: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReExportItem {
    Named { name: String, alias: Option<String> },
    Glob,
}

/// `export { a, b as c } from "./mod"`, distinct from marking a local
/// declaration `export` (spec §3 "Export" / "re-export").
#[derive(Debug, Clone, PartialEq)]
pub struct ReExport {
    pub items: Vec<ReExportItem>,
    pub from: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// A `let` declaration, or — when `recursive` and `bindings.len() > 1`
    /// — a `let rec ... and ...` mutually recursive group (parser
    /// disambiguation rule 6, a `LetRecGroup` node).
    Let {
        recursive: bool,
        bindings: Vec<LetBinding>,
        exported: bool,
        span: Span,
    },
    /// A `type` declaration, or a mutually recursive `type ... and ...`
    /// group (parser disambiguation rule 6 — a `TypeGroup` node).
    Type {
        decls: Vec<TypeDecl>,
        exported: bool,
        span: Span,
    },
    /// A single `external name : Type = "js";` declaration, with an
    /// optional source module (`from "module"`).
    External {
        item: ExternalItem,
        from: Option<String>,
        span: Span,
    },
    ExternalBlock(ExternalBlock),
    Import(Import),
    ReExport(ReExport),
}

impl Declaration {
    pub fn span(&self) -> &Span {
        match self {
            Declaration::Let { span, .. } => span,
            Declaration::Type { span, .. } => span,
            Declaration::External { span, .. } => span,
            Declaration::ExternalBlock(e) => &e.span,
            Declaration::Import(i) => &i.span,
            Declaration::ReExport(r) => &r.span,
        }
    }
}

/// A single source file, post-parse, pre-desugar.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub declarations: Vec<Declaration>,
    pub span: Span,
}
