//! Lexer integration tests (spec §8 scenario 1: reserved words) plus basic
//! token-stream sanity checks driven through the public `tokenize` entry
//! point rather than hand-built tokens.

use vibefun::lexer::{tokenize, LexError, TokenKind};

#[test]
fn reserved_word_is_rejected() {
    let err = tokenize("async", "<test>").unwrap_err();
    assert!(matches!(err, LexError::ReservedWord { ref word, .. } if word == "async"));
    assert_eq!(err.code(), 10);
}

#[test]
fn ordinary_identifier_is_accepted() {
    let tokens = tokenize("asynchronous", "<test>").expect("lex failed");
    assert!(matches!(tokens[0].kind, TokenKind::Id(ref s) if s == "asynchronous"));
}

#[test]
fn unterminated_string_is_an_error() {
    let err = tokenize("\"never closed", "<test>").unwrap_err();
    assert!(matches!(err, LexError::UnterminatedString { .. }));
}

#[test]
fn let_binding_tokenizes_to_expected_stream() {
    let tokens = tokenize("let x = 1;", "<test>").expect("lex failed");
    let kinds: Vec<&TokenKind> = tokens.iter().map(|t| &t.kind).collect();
    assert!(matches!(kinds[0], TokenKind::Keyword(_)));
    assert!(matches!(kinds.last().unwrap(), TokenKind::Eof));
}
