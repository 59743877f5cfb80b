//! Parser integration tests (spec §8 scenario 2: record vs. block
//! disambiguation), driven from source text through `tokenize` + `parse`.

use vibefun::lexer::tokenize;
use vibefun::parser::parse;
use vibefun::syntax::{BlockStmt, Expr, RecordField};

fn parse_expr_decl(src: &str) -> Expr {
    let module = parse(tokenize(&format!("let result = {src};"), "<test>").expect("lex failed")).expect("parse failed");
    match module.declarations.into_iter().next().expect("no declarations") {
        vibefun::syntax::Declaration::Let { mut bindings, .. } => bindings.remove(0).value,
        other => panic!("expected a let declaration, got {other:?}"),
    }
}

#[test]
fn brace_identifier_is_a_shorthand_record() {
    let expr = parse_expr_decl("{ x }");
    match expr {
        Expr::Record { fields, .. } => {
            assert_eq!(fields.len(), 1);
            assert!(matches!(&fields[0], RecordField::Shorthand(name, _) if name == "x"));
        }
        other => panic!("expected a record literal, got {other:?}"),
    }
}

#[test]
fn brace_identifier_semicolon_is_a_block() {
    let expr = parse_expr_decl("{ x; }");
    match expr {
        Expr::Block(block) => {
            assert_eq!(block.stmts.len(), 1);
            assert!(block.trailing_semi);
            assert!(matches!(&block.stmts[0], BlockStmt::Expr(Expr::Var(name, _)) if name == "x"));
        }
        other => panic!("expected a block, got {other:?}"),
    }
}

#[test]
fn brace_field_colon_value_is_a_record() {
    let expr = parse_expr_decl("{ x: 1 }");
    match expr {
        Expr::Record { fields, .. } => {
            assert_eq!(fields.len(), 1);
            assert!(matches!(&fields[0], RecordField::Field(name, _) if name == "x"));
        }
        other => panic!("expected a record literal, got {other:?}"),
    }
}

#[test]
fn brace_let_statement_is_a_block_evaluating_its_tail() {
    let expr = parse_expr_decl("{ let y = 1; y + 1 }");
    match expr {
        Expr::Block(block) => {
            assert_eq!(block.stmts.len(), 2);
            assert!(!block.trailing_semi);
            assert!(matches!(&block.stmts[0], BlockStmt::Let { .. }));
            assert!(matches!(&block.stmts[1], BlockStmt::Expr(Expr::Binary { .. })));
        }
        other => panic!("expected a block, got {other:?}"),
    }
}

#[test]
fn empty_braces_are_an_empty_record() {
    let expr = parse_expr_decl("{}");
    match expr {
        Expr::Record { fields, .. } => assert!(fields.is_empty()),
        other => panic!("expected an empty record, got {other:?}"),
    }
}
