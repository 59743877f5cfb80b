//! Surface AST: the tree produced directly by the parser, before
//! desugaring into [`crate::core`].

pub mod decl;
pub mod expr;
pub mod pattern;
pub mod type_expr;

pub use decl::{
    Declaration, ExternalBlock, ExternalItem, Import, ImportBindings, ImportItem, LetBinding,
    Module, ReExport, ReExportItem, TypeDecl, TypeDeclBody, VariantCase,
};
pub use expr::{
    BinaryOp, Block, BlockStmt, ComposeDir, Expr, LambdaParam, Literal, ListElement, MatchArm,
    RecordField, UnaryOp,
};
pub use pattern::{Pattern, RecordPatternField};
pub use type_expr::{RecordTypeField, TypeExpr};
