use crate::span::Span;

/// The 19 active keywords (spec §4.1). Using an identifier spelled like one
/// of these always yields a `Keyword` token, never an `Id` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Keyword {
    Let,
    Mut,
    Type,
    If,
    Then,
    Else,
    Match,
    When,
    Rec,
    And,
    Import,
    Export,
    External,
    Unsafe,
    From,
    As,
    Ref,
    Try,
    Catch,
    While,
}

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        Some(match s {
            "let" => Keyword::Let,
            "mut" => Keyword::Mut,
            "type" => Keyword::Type,
            "if" => Keyword::If,
            "then" => Keyword::Then,
            "else" => Keyword::Else,
            "match" => Keyword::Match,
            "when" => Keyword::When,
            "rec" => Keyword::Rec,
            "and" => Keyword::And,
            "import" => Keyword::Import,
            "export" => Keyword::Export,
            "external" => Keyword::External,
            "unsafe" => Keyword::Unsafe,
            "from" => Keyword::From,
            "as" => Keyword::As,
            "ref" => Keyword::Ref,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "while" => Keyword::While,
            _ => return None,
        })
    }
}

/// The 8 reserved words (spec §4.1). Lexing one of these as an identifier is
/// always a `LexError`, regardless of parse context.
pub const RESERVED_WORDS: &[&str] = &[
    "async", "await", "trait", "impl", "where", "do", "yield", "return",
];

/// Punctuation and operator kinds. Multi-character operators are recognized
/// via maximal munch in [`super::Lexer`]; see [`OPERATORS`] for the
/// munch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Op {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    ColonColon, // `::` cons
    ColonEq,    // `:=` ref assignment
    Colon,
    Ellipsis, // `...` spread
    DotDot,   // `..` (lexed, reserved for future ranges)
    Dot,
    Arrow,     // `->`
    FatArrow,  // `=>`
    ComposeFwd, // `>>`
    ComposeBack, // `<<`
    PipeGt,    // `|>`
    OrOr,      // `||`
    AndAnd,    // `&&`
    Pipe,      // `|`
    Caret,     // `^`
    EqEq,      // `==`
    BangEq,    // `!=`
    LtEq,      // `<=`
    GtEq,      // `>=`
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp, // `&`
    Bang,
    Assign, // `=`
}

/// Maximal-munch table, longest lexemes first. [`super::Lexer::lex_operator`]
/// scans this table top-to-bottom so that e.g. `==` is matched before `=`,
/// `:=` before `:`, `>>` before `>`, and `...` before `..` before `.`.
pub const OPERATORS: &[(&str, Op)] = &[
    ("...", Op::Ellipsis),
    ("::", Op::ColonColon),
    (":=", Op::ColonEq),
    ("==", Op::EqEq),
    ("!=", Op::BangEq),
    ("<=", Op::LtEq),
    (">=", Op::GtEq),
    ("->", Op::Arrow),
    ("=>", Op::FatArrow),
    (">>", Op::ComposeFwd),
    ("<<", Op::ComposeBack),
    ("|>", Op::PipeGt),
    ("||", Op::OrOr),
    ("&&", Op::AndAnd),
    ("..", Op::DotDot),
    ("(", Op::LParen),
    (")", Op::RParen),
    ("{", Op::LBrace),
    ("}", Op::RBrace),
    ("[", Op::LBracket),
    ("]", Op::RBracket),
    (",", Op::Comma),
    (";", Op::Semicolon),
    (":", Op::Colon),
    (".", Op::Dot),
    ("|", Op::Pipe),
    ("^", Op::Caret),
    ("<", Op::Lt),
    (">", Op::Gt),
    ("+", Op::Plus),
    ("-", Op::Minus),
    ("*", Op::Star),
    ("/", Op::Slash),
    ("%", Op::Percent),
    ("&", Op::Amp),
    ("!", Op::Bang),
    ("=", Op::Assign),
];

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TokenKind {
    Integer(i64),
    Float(f64),
    /// Escape-processed, NFC-normalized string contents (delimiters stripped).
    Str(String),
    /// NFC-normalized identifier spelling.
    Id(String),
    Keyword(Keyword),
    Op(Op),
    Eof,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    pub fn is_op(&self, op: Op) -> bool {
        matches!(&self.kind, TokenKind::Op(o) if *o == op)
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(&self.kind, TokenKind::Keyword(k) if *k == kw)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
