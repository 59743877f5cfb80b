//! Lexical analysis (spec §4.1): UTF-8 source text to a token stream.
//!
//! The lexer is a hand-rolled linear scanner over a `Peekable<Chars>`,
//! tracking line/column/byte-offset as it goes (mirroring the scanning
//! approach used throughout this codebase rather than a regex- or
//! grammar-generator-based matcher). Multi-character operators are recognized
//! by maximal munch against the [`token::OPERATORS`] table.

mod token;

pub use token::{Keyword, Op, Token, TokenKind, OPERATORS, RESERVED_WORDS};

use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use log::trace;
use unicode_normalization::UnicodeNormalization;

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("invalid character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },
    #[error("unterminated string literal starting at {span}")]
    UnterminatedString { span: Span },
    #[error("invalid escape sequence '\\{escape}' at {span}")]
    InvalidEscape { escape: String, span: Span },
    #[error("invalid numeric literal '{text}' at {span}")]
    InvalidNumber { text: String, span: Span },
    #[error("'{word}' is a reserved keyword for future language features, at {span}")]
    ReservedWord { word: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedChar { span, .. }
            | LexError::UnterminatedString { span, .. }
            | LexError::InvalidEscape { span, .. }
            | LexError::InvalidNumber { span, .. }
            | LexError::ReservedWord { span, .. } => span,
        }
    }

    /// VF1xxx error code per spec §6.
    pub fn code(&self) -> u32 {
        match self {
            LexError::InvalidEscape { .. } => 1,
            LexError::UnterminatedString { .. } => 2,
            LexError::InvalidNumber { .. } => 3,
            LexError::ReservedWord { .. } => 10,
            LexError::UnexpectedChar { .. } => 20,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;

/// Tokenize `source` (from logical file `filename`). Public contract from
/// spec §4.1: `tokenize(source, filename) -> [Token] | LexError`.
pub fn tokenize(source: &str, filename: &str) -> LexResult<Vec<Token>> {
    Lexer::new(source, filename).lex()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    file: Rc<str>,
    line: usize,
    col: usize,
    byte_offset: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, filename: &str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            file: Rc::from(filename),
            line: 0,
            col: 0,
            byte_offset: 0,
            tokens: Vec::new(),
        }
    }

    fn here(&self) -> Span {
        Span::new(self.file.clone(), self.line, self.col, self.byte_offset)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.byte_offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn rest_starts_with(&self, s: &str) -> bool {
        let mut clone = self.chars.clone();
        for expect in s.chars() {
            match clone.next() {
                Some(c) if c == expect => {}
                _ => return false,
            }
        }
        true
    }

    fn lex(mut self) -> LexResult<Vec<Token>> {
        loop {
            self.skip_trivia()?;
            let start = self.here();
            let Some(c) = self.peek() else {
                self.tokens.push(Token::new(TokenKind::Eof, start));
                return Ok(self.tokens);
            };

            if c == '\'' {
                self.lex_string(start)?;
            } else if c.is_ascii_digit() {
                self.lex_number(start)?;
            } else if is_ident_start(c) {
                self.lex_ident_or_keyword(start)?;
            } else {
                self.lex_operator(start)?;
            }
        }
    }

    fn skip_trivia(&mut self) -> LexResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek2() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek2() == Some('*') => {
                    self.skip_block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> LexResult<()> {
        let start = self.here();
        self.bump(); // '/'
        self.bump(); // '*'
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                None => {
                    return Err(LexError::UnterminatedString { span: start });
                }
                Some('*') if self.peek2() == Some('/') => {
                    self.bump();
                    self.bump();
                    depth -= 1;
                }
                Some('/') if self.peek2() == Some('*') => {
                    self.bump();
                    self.bump();
                    depth += 1;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
        Ok(())
    }

    fn lex_ident_or_keyword(&mut self, start: Span) -> LexResult<()> {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                raw.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if RESERVED_WORDS.contains(&raw.as_str()) {
            return Err(LexError::ReservedWord { word: raw, span: start });
        }

        if let Some(kw) = Keyword::from_str(&raw) {
            trace!("lexed keyword '{raw}' at {start}");
            self.tokens.push(Token::new(TokenKind::Keyword(kw), start));
            return Ok(());
        }

        let normalized: String = raw.nfc().collect();
        trace!("lexed identifier '{normalized}' at {start}");
        self.tokens.push(Token::new(TokenKind::Id(normalized), start));
        Ok(())
    }

    fn lex_number(&mut self, start: Span) -> LexResult<()> {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                raw.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let mut is_float = false;

        // `.5` and `5.` are rejected: a `.` only starts a fractional part if
        // followed by a digit, and that digit is then mandatory.
        if self.peek() == Some('.') && self.peek2().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            raw.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    raw.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut clone = self.chars.clone();
            let mut lookahead = String::new();
            lookahead.push(clone.next().unwrap());
            if matches!(clone.peek(), Some('+') | Some('-')) {
                lookahead.push(clone.next().unwrap());
            }
            if clone.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                raw.push_str(&lookahead);
                for _ in 0..lookahead.len() {
                    self.bump();
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        raw.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }

        if is_float {
            let value: f64 = raw
                .parse()
                .map_err(|_| LexError::InvalidNumber { text: raw.clone(), span: start.clone() })?;
            self.tokens.push(Token::new(TokenKind::Float(value), start));
        } else {
            let value: i64 = raw
                .parse()
                .map_err(|_| LexError::InvalidNumber { text: raw.clone(), span: start.clone() })?;
            self.tokens.push(Token::new(TokenKind::Integer(value), start));
        }
        Ok(())
    }

    fn lex_string(&mut self, start: Span) -> LexResult<()> {
        let triple = self.rest_starts_with("'''");
        if triple {
            self.bump();
            self.bump();
            self.bump();
        } else {
            self.bump();
        }

        let mut value = String::new();
        loop {
            if triple && self.rest_starts_with("'''") {
                self.bump();
                self.bump();
                self.bump();
                break;
            }
            if !triple && self.peek() == Some('\'') {
                self.bump();
                break;
            }
            match self.peek() {
                None => return Err(LexError::UnterminatedString { span: start }),
                Some('\n') if !triple => {
                    return Err(LexError::UnterminatedString { span: start });
                }
                Some('\\') => {
                    self.bump();
                    value.push(self.lex_escape(&start)?);
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }

        let normalized: String = value.nfc().collect();
        self.tokens.push(Token::new(TokenKind::Str(normalized), start));
        Ok(())
    }

    fn lex_escape(&mut self, start: &Span) -> LexResult<char> {
        let Some(c) = self.bump() else {
            return Err(LexError::UnterminatedString { span: start.clone() });
        };
        Ok(match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => self.lex_hex_escape(start, 2)?,
            'u' if self.peek() == Some('{') => {
                self.bump(); // '{'
                let mut digits = String::new();
                while let Some(c) = self.peek() {
                    if c == '}' {
                        break;
                    }
                    digits.push(c);
                    self.bump();
                }
                if self.peek() != Some('}') {
                    return Err(LexError::InvalidEscape {
                        escape: format!("u{{{digits}"),
                        span: start.clone(),
                    });
                }
                self.bump(); // '}'
                decode_code_point(&digits).ok_or_else(|| LexError::InvalidEscape {
                    escape: format!("u{{{digits}}}"),
                    span: start.clone(),
                })?
            }
            'u' => self.lex_hex_escape(start, 4)?,
            other => {
                return Err(LexError::InvalidEscape {
                    escape: other.to_string(),
                    span: start.clone(),
                })
            }
        })
    }

    fn lex_hex_escape(&mut self, start: &Span, count: usize) -> LexResult<char> {
        let mut digits = String::new();
        for _ in 0..count {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    digits.push(c);
                    self.bump();
                }
                _ => {
                    return Err(LexError::InvalidEscape {
                        escape: format!("x{digits}"),
                        span: start.clone(),
                    })
                }
            }
        }
        decode_code_point(&digits).ok_or_else(|| LexError::InvalidEscape {
            escape: digits.clone(),
            span: start.clone(),
        })
    }

    fn lex_operator(&mut self, start: Span) -> LexResult<()> {
        for (lexeme, op) in OPERATORS {
            if self.rest_starts_with(lexeme) {
                for _ in lexeme.chars() {
                    self.bump();
                }
                self.tokens.push(Token::new(TokenKind::Op(*op), start));
                return Ok(());
            }
        }
        let ch = self.peek().expect("lex_operator called at EOF");
        Err(LexError::UnexpectedChar { ch, span: start })
    }
}

fn decode_code_point(digits: &str) -> Option<char> {
    if digits.is_empty() {
        return None;
    }
    let code = u32::from_str_radix(digits, 16).ok()?;
    char::from_u32(code)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, "<test>")
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_let_binding() {
        assert_eq!(
            kinds("let x = 42;"),
            vec![
                TokenKind::Keyword(Keyword::Let),
                TokenKind::Id("x".into()),
                TokenKind::Op(Op::Assign),
                TokenKind::Integer(42),
                TokenKind::Op(Op::Semicolon),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn reserved_word_fails() {
        let err = tokenize("async", "<test>").unwrap_err();
        assert!(matches!(err, LexError::ReservedWord { .. }));
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn keyword_is_not_an_identifier() {
        assert_eq!(kinds("while"), vec![TokenKind::Keyword(Keyword::While), TokenKind::Eof]);
    }

    #[test]
    fn maximal_munch_orders_multichar_operators() {
        assert_eq!(
            kinds(":= : == = >> > ... .. ."),
            vec![
                TokenKind::Op(Op::ColonEq),
                TokenKind::Op(Op::Colon),
                TokenKind::Op(Op::EqEq),
                TokenKind::Op(Op::Assign),
                TokenKind::Op(Op::ComposeFwd),
                TokenKind::Op(Op::Gt),
                TokenKind::Op(Op::Ellipsis),
                TokenKind::Op(Op::DotDot),
                TokenKind::Op(Op::Dot),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn float_requires_digit_on_both_sides() {
        assert!(tokenize(".5", "<test>").is_ok()); // lexes as Dot, Integer(5)
        let kinds = kinds(".5");
        assert_eq!(kinds[0], TokenKind::Op(Op::Dot));
        assert_eq!(kinds[1], TokenKind::Integer(5));

        let kinds = kinds("5.");
        assert_eq!(kinds[0], TokenKind::Integer(5));
        assert_eq!(kinds[1], TokenKind::Op(Op::Dot));
    }

    #[test]
    fn float_with_exponent() {
        assert_eq!(kinds("1.5e10"), vec![TokenKind::Float(1.5e10), TokenKind::Eof]);
        assert_eq!(kinds("2e-3"), vec![TokenKind::Float(2e-3), TokenKind::Eof]);
    }

    #[test]
    fn string_escapes_and_unicode_braces() {
        assert_eq!(
            kinds(r"'a\nb\u{1F600}'"),
            vec![TokenKind::Str(format!("a\nb{}", '\u{1F600}')), TokenKind::Eof]
        );
    }

    #[test]
    fn triple_quoted_multiline_string() {
        assert_eq!(
            kinds("'''line1\nline2'''"),
            vec![TokenKind::Str("line1\nline2".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn identifier_is_nfc_normalized() {
        // "e" + combining acute accent decomposed form normalizes to U+00E9.
        let decomposed = "cafe\u{0301}";
        let tokens = kinds(decomposed);
        assert_eq!(tokens[0], TokenKind::Id("caf\u{00e9}".into()));
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        assert_eq!(kinds("/* outer /* inner */ still */ 1"), vec![TokenKind::Integer(1), TokenKind::Eof]);
    }

    #[test]
    fn line_comment_runs_to_newline() {
        assert_eq!(kinds("1 // comment\n2"), vec![TokenKind::Integer(1), TokenKind::Integer(2), TokenKind::Eof]);
    }
}
