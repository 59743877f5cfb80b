//! Desugarer integration tests (spec §8 scenario 3: list literals expand to
//! `Cons`/`Nil`), plus currying and if/else lowering checks, driven from
//! source text through `tokenize` + `parse` + `desugar`.

use vibefun::core::{self, NIL, CONS};
use vibefun::desugar;
use vibefun::lexer::tokenize;
use vibefun::parser::parse;

fn desugar_source(src: &str) -> core::Module {
    let tokens = tokenize(src, "<test>").expect("lex failed");
    let module = parse(tokens).expect("parse failed");
    desugar(module).expect("desugar failed")
}

fn only_let_value(module: &core::Module) -> &core::Expr {
    match &module.declarations[0] {
        core::Declaration::Let { bindings, .. } => &bindings[0].value,
        other => panic!("expected a let declaration, got {other:?}"),
    }
}

#[test]
fn empty_list_literal_desugars_to_nil() {
    let module = desugar_source("let xs = [];");
    match only_let_value(&module) {
        core::Expr::Variant { name, args, .. } => {
            assert_eq!(name, NIL);
            assert!(args.is_empty());
        }
        other => panic!("expected Nil, got {other:?}"),
    }
}

#[test]
fn list_literal_desugars_to_nested_cons() {
    let module = desugar_source("let xs = [1, 2];");
    match only_let_value(&module) {
        core::Expr::Variant { name, args, .. } => {
            assert_eq!(name, CONS);
            assert_eq!(args.len(), 2);
            assert!(matches!(&args[0], core::Expr::Literal(vibefun::syntax::Literal::Int(1), _)));
            match &args[1] {
                core::Expr::Variant { name: inner_name, args: inner_args, .. } => {
                    assert_eq!(inner_name, CONS);
                    assert_eq!(inner_args.len(), 2);
                    match &inner_args[1] {
                        core::Expr::Variant { name: tail_name, args: tail_args, .. } => {
                            assert_eq!(tail_name, NIL);
                            assert!(tail_args.is_empty());
                        }
                        other => panic!("expected Nil tail, got {other:?}"),
                    }
                }
                other => panic!("expected nested Cons, got {other:?}"),
            }
        }
        other => panic!("expected Cons, got {other:?}"),
    }
}

#[test]
fn curried_call_desugars_to_single_arg_applications() {
    let module = desugar_source("let add = (a, b) => a + b;\nlet three = add(1, 2);");
    match &module.declarations[1] {
        core::Declaration::Let { bindings, .. } => match &bindings[0].value {
            core::Expr::App { func, arg, .. } => {
                assert!(matches!(**arg, core::Expr::Literal(vibefun::syntax::Literal::Int(2), _)));
                assert!(matches!(**func, core::Expr::App { .. }));
            }
            other => panic!("expected a single-arg App, got {other:?}"),
        },
        other => panic!("expected a let declaration, got {other:?}"),
    }
}

#[test]
fn if_else_desugars_to_a_match() {
    let module = desugar_source("let x = if true then 1 else 2;");
    match only_let_value(&module) {
        core::Expr::Match { arms, .. } => assert_eq!(arms.len(), 2),
        other => panic!("expected if/else to desugar to a match, got {other:?}"),
    }
}
