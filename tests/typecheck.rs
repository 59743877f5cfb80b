//! Type checker integration tests (spec §8 scenarios 4-6: value restriction,
//! record width polymorphism, external overload resolution), driven from
//! source text through the full `tokenize` + `parse` + `desugar` +
//! `typecheck` pipeline.

use pretty_assertions::assert_eq;
use vibefun::desugar;
use vibefun::lexer::tokenize;
use vibefun::parser::parse;
use vibefun::typeck::{self, TypeError};

fn check(src: &str) -> Result<typeck::TypedModule, TypeError> {
    let tokens = tokenize(src, "<test>").expect("lex failed");
    let module = parse(tokens).expect("parse failed");
    let core_module = desugar(module).expect("desugar failed");
    typeck::typecheck(core_module, typeck::initial_env())
}

#[test]
fn value_restriction_keeps_a_partially_applied_identity_monomorphic() {
    let err = check(
        r#"
        let id = (x) => x;
        let idy = id(id);
        let a = idy(1);
        let b = idy(true);
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn value_restriction_still_allows_consistent_reuse() {
    check(
        r#"
        let id = (x) => x;
        let idy = id(id);
        let a = idy(1);
        let b = idy(2);
        "#,
    )
    .expect("consistent monomorphic reuse should type check");
}

#[test]
fn an_unapplied_lambda_is_still_generalized() {
    let typed = check(
        r#"
        let id = (x) => x;
        let a = id(1);
        let b = id(true);
        "#,
    )
    .expect("a bare lambda binding should be let-polymorphic");
    assert_eq!(typed.schemes.len(), 3);
}

#[test]
fn record_width_accepts_extra_fields() {
    check(
        r#"
        let f = (r) => r.x;
        let ok = f({ x: 1, y: 2 });
        "#,
    )
    .expect("a record with an extra field should satisfy a width-polymorphic parameter");
}

#[test]
fn record_width_rejects_missing_fields() {
    let err = check(
        r#"
        let f = (r) => r.x;
        let bad = f({ y: 2 });
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, TypeError::RecordMismatch { .. }));
}

#[test]
fn external_overload_resolves_by_call_site_arity() {
    check(
        r#"
        external fetch: String -> String;
        external fetch: String -> String -> String;
        let a = fetch("url");
        let b = fetch("url", "opts");
        "#,
    )
    .expect("both overloads should resolve by their distinct arities");
}

#[test]
fn external_overload_rejects_an_arity_nothing_declares() {
    let err = check(
        r#"
        external fetch: String -> String;
        external fetch: String -> String -> String;
        let c = fetch("url", "opts", "extra");
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, TypeError::NoMatchingOverload { .. }));
}

#[test]
fn mismatched_binary_operands_are_rejected() {
    let err = check("let x = 1 + true;").unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}

#[test]
fn concat_operator_requires_strings() {
    let err = check(r#"let x = 1 & "a";"#).unwrap_err();
    assert!(matches!(err, TypeError::Mismatch { .. }));
}
