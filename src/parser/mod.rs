//! Recursive-descent / Pratt parser (spec §4.2): tokens to Surface AST.
//!
//! Mirrors the teacher's hand-rolled scanning style rather than a grammar
//! generator: one method per grammar production, a precedence-climbing loop
//! for expressions, and explicit look-ahead for the handful of genuinely
//! ambiguous constructs (record vs. block, lambda vs. parenthesized
//! expression, `>>` splitting inside nested generics). Never recovers from
//! an error — the first `ParseError` aborts the parse (spec §4.2).

pub mod error;

pub use error::{ParseError, ParseResult};

use crate::lexer::{Keyword, Op, Token, TokenKind};
use crate::span::Span;
use crate::syntax::{
    BinaryOp, Block, BlockStmt, ComposeDir, Declaration, Expr, ExternalBlock, ExternalItem,
    Import, ImportBindings, ImportItem, LambdaParam, LetBinding, ListElement, Literal, MatchArm,
    Module, Pattern, RecordField, RecordPatternField, RecordTypeField, ReExport, ReExportItem,
    TypeDecl, TypeDeclBody, TypeExpr, UnaryOp, VariantCase,
};

/// Parse a full module from its token stream (the output of
/// [`crate::lexer::tokenize`]).
pub fn parse(tokens: Vec<Token>) -> ParseResult<Module> {
    Parser::new(tokens).parse_module()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Set after consuming a `>>` token as the first of two `>` closers
    /// needed to close nested generic argument lists (disambiguation rule
    /// 3). The next call to [`Parser::expect_close_angle`] consumes this
    /// instead of advancing the token stream.
    pending_gt: bool,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            pending_gt: false,
        }
    }

    // --- token stream plumbing -------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn here(&self) -> Span {
        self.current().span.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if !tok.is_eof() {
            self.pos += 1;
        }
        tok
    }

    fn is_op(&self, op: Op) -> bool {
        self.current().is_op(op)
    }

    fn is_keyword(&self, kw: Keyword) -> bool {
        self.current().is_keyword(kw)
    }

    fn is_eof(&self) -> bool {
        self.current().is_eof()
    }

    fn expect_op(&mut self, op: Op) -> ParseResult<Span> {
        if self.is_op(op) {
            Ok(self.advance().span)
        } else if self.is_eof() {
            Err(ParseError::UnexpectedEof {
                expected: format!("{op:?}"),
                span: self.here(),
            })
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{op:?}"),
                found: describe(self.current()),
                span: self.here(),
            })
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> ParseResult<Span> {
        if self.is_keyword(kw) {
            Ok(self.advance().span)
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{kw:?}"),
                found: describe(self.current()),
                span: self.here(),
            })
        }
    }

    fn expect_ident(&mut self) -> ParseResult<(String, Span)> {
        match &self.current().kind {
            TokenKind::Id(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "identifier".into(),
                found: describe(self.current()),
                span: self.here(),
            }),
        }
    }

    fn expect_semicolon(&mut self) -> ParseResult<()> {
        if self.is_op(Op::Semicolon) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::MissingSemicolon { span: self.here() })
        }
    }

    /// Closes one level of a nested generic argument list, honoring
    /// disambiguation rule 3: a `>>` token may supply two `>` closers.
    fn expect_close_angle(&mut self) -> ParseResult<()> {
        if self.pending_gt {
            self.pending_gt = false;
            return Ok(());
        }
        if self.is_op(Op::Gt) {
            self.advance();
            return Ok(());
        }
        if self.is_op(Op::ComposeFwd) {
            self.advance();
            self.pending_gt = true;
            return Ok(());
        }
        Err(ParseError::UnexpectedToken {
            expected: "'>'".into(),
            found: describe(self.current()),
            span: self.here(),
        })
    }

    // --- module / declarations --------------------------------------------------

    fn parse_module(&mut self) -> ParseResult<Module> {
        let start = self.here();
        let mut declarations = Vec::new();
        while !self.is_eof() {
            declarations.push(self.parse_declaration()?);
            if !self.is_eof() {
                self.expect_semicolon()?;
            }
        }
        Ok(Module {
            declarations,
            span: start,
        })
    }

    fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        let exported = if self.is_keyword(Keyword::Export) {
            // `export { a, b as c } from "mod"` is a re-export, not a
            // prefix on another declaration; peek for the `{` or `from`
            // shape before committing to the `exported` flag path.
            if self.peek_at(1).is_op(Op::LBrace) || self.peek_at(1).is_op(Op::Star) {
                return self.parse_reexport();
            }
            self.advance();
            true
        } else {
            false
        };

        if self.is_keyword(Keyword::Let) {
            self.parse_let_decl(exported)
        } else if self.is_keyword(Keyword::Type) {
            self.parse_type_decl(exported)
        } else if self.is_keyword(Keyword::External) {
            self.parse_external_decl()
        } else if self.is_keyword(Keyword::Import) {
            self.parse_import()
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "declaration".into(),
                found: describe(self.current()),
                span: self.here(),
            })
        }
    }

    fn parse_let_decl(&mut self, exported: bool) -> ParseResult<Declaration> {
        let start = self.expect_keyword(Keyword::Let)?;
        let recursive = if self.is_keyword(Keyword::Rec) {
            self.advance();
            true
        } else {
            false
        };
        let mut bindings = vec![self.parse_let_binding()?];
        // Disambiguation rule 6: `and` after `let rec` continues the group.
        while recursive && self.is_keyword(Keyword::And) {
            self.advance();
            bindings.push(self.parse_let_binding()?);
        }
        let span = start.merge(bindings.last().unwrap().span.clone());
        Ok(Declaration::Let {
            recursive,
            bindings,
            exported,
            span,
        })
    }

    fn parse_let_binding(&mut self) -> ParseResult<LetBinding> {
        let start = self.here();
        let mutable = if self.is_keyword(Keyword::Mut) {
            self.advance();
            true
        } else {
            false
        };
        let pattern = self.parse_pattern()?;
        let type_ann = if self.is_op(Op::Colon) {
            self.advance();
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        self.expect_op(Op::Assign)?;
        let value = self.parse_expr()?;
        let span = start.merge(value.span().clone());
        Ok(LetBinding {
            pattern,
            mutable,
            type_ann,
            value,
            span,
        })
    }

    fn parse_type_decl(&mut self, exported: bool) -> ParseResult<Declaration> {
        let start = self.expect_keyword(Keyword::Type)?;
        let mut decls = vec![self.parse_one_type_decl()?];
        while self.is_keyword(Keyword::And) {
            self.advance();
            decls.push(self.parse_one_type_decl()?);
        }
        let span = start.merge(decls.last().unwrap().span.clone());
        Ok(Declaration::Type {
            decls,
            exported,
            span,
        })
    }

    fn parse_one_type_decl(&mut self) -> ParseResult<TypeDecl> {
        let (name, start) = self.expect_ident()?;
        let mut params = Vec::new();
        if self.is_op(Op::Lt) {
            self.advance();
            loop {
                let (p, _) = self.expect_ident()?;
                params.push(p);
                if self.is_op(Op::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect_close_angle()?;
        }
        self.expect_op(Op::Assign)?;
        let body = self.parse_type_decl_body()?;
        Ok(TypeDecl {
            name,
            params,
            body,
            span: start,
        })
    }

    fn parse_type_decl_body(&mut self) -> ParseResult<TypeDeclBody> {
        if self.is_op(Op::Pipe) || self.peek_is_variant_case_start() {
            return self.parse_variant_body();
        }
        if self.is_op(Op::LBrace) {
            return self.parse_record_type_body();
        }
        Ok(TypeDeclBody::Alias(self.parse_type_expr()?))
    }

    /// A leading capitalized identifier directly followed by `(` reads as a
    /// variant constructor with arguments — the start of a variant body —
    /// rather than an aliased type name. A bare `Name` (no `(`, no leading
    /// `|`) is ambiguous between a nullary constructor and a type alias; we
    /// resolve it as an alias, matching the common case, since an explicit
    /// leading `|` is required to introduce a nullary-only variant body.
    fn peek_is_variant_case_start(&self) -> bool {
        matches!(&self.current().kind, TokenKind::Id(name) if name.chars().next().is_some_and(char::is_uppercase))
            && self.peek_at(1).is_op(Op::LParen)
    }

    fn parse_variant_body(&mut self) -> ParseResult<TypeDeclBody> {
        if self.is_op(Op::Pipe) {
            self.advance();
        }
        let mut cases = vec![self.parse_variant_case()?];
        while self.is_op(Op::Pipe) {
            self.advance();
            cases.push(self.parse_variant_case()?);
        }
        Ok(TypeDeclBody::Variant(cases))
    }

    fn parse_variant_case(&mut self) -> ParseResult<VariantCase> {
        let (name, start) = self.expect_ident()?;
        let mut fields = Vec::new();
        if self.is_op(Op::LParen) {
            self.advance();
            if !self.is_op(Op::RParen) {
                loop {
                    fields.push(self.parse_type_expr()?);
                    if self.is_op(Op::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.expect_op(Op::RParen)?;
        }
        Ok(VariantCase {
            name,
            fields,
            span: start,
        })
    }

    fn parse_record_type_body(&mut self) -> ParseResult<TypeDeclBody> {
        self.expect_op(Op::LBrace)?;
        let mut fields = Vec::new();
        let mut open = false;
        while !self.is_op(Op::RBrace) {
            if self.is_op(Op::Ellipsis) {
                self.advance();
                open = true;
                break;
            }
            let (name, _) = self.expect_ident()?;
            self.expect_op(Op::Colon)?;
            let type_expr = self.parse_type_expr()?;
            fields.push((name, type_expr));
            if self.is_op(Op::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect_op(Op::RBrace)?;
        Ok(TypeDeclBody::Record { fields, open })
    }

    fn parse_external_decl(&mut self) -> ParseResult<Declaration> {
        let start = self.expect_keyword(Keyword::External)?;
        if self.is_op(Op::LBrace) {
            return self.parse_external_block(start);
        }
        let item = self.parse_external_item()?;
        let from = if self.is_keyword(Keyword::From) {
            self.advance();
            Some(self.expect_string()?)
        } else {
            None
        };
        let span = start.merge(item.span.clone());
        Ok(Declaration::External { item, from, span })
    }

    fn parse_external_block(&mut self, start: Span) -> ParseResult<Declaration> {
        self.expect_op(Op::LBrace)?;
        let mut items = Vec::new();
        while !self.is_op(Op::RBrace) {
            items.push(self.parse_external_item()?);
            self.expect_semicolon()?;
        }
        self.expect_op(Op::RBrace)?;
        self.expect_keyword(Keyword::From)?;
        let from = self.expect_string()?;
        Ok(Declaration::ExternalBlock(ExternalBlock {
            items,
            from,
            span: start,
        }))
    }

    fn parse_external_item(&mut self) -> ParseResult<ExternalItem> {
        let (name, start) = self.expect_ident()?;
        self.expect_op(Op::Colon)?;
        let type_expr = self.parse_type_expr()?;
        let js_name = if self.is_op(Op::Assign) {
            self.advance();
            Some(self.expect_string()?)
        } else {
            None
        };
        Ok(ExternalItem {
            name,
            type_expr,
            js_name,
            span: start,
        })
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match &self.current().kind {
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "string literal".into(),
                found: describe(self.current()),
                span: self.here(),
            }),
        }
    }

    fn parse_import(&mut self) -> ParseResult<Declaration> {
        let start = self.expect_keyword(Keyword::Import)?;
        let type_only = if self.is_keyword(Keyword::Type) {
            self.advance();
            true
        } else {
            false
        };

        if let TokenKind::Str(_) = &self.current().kind {
            let from = self.expect_string()?;
            return Ok(Declaration::Import(Import {
                bindings: ImportBindings::SideEffectOnly,
                type_only,
                from,
                span: start,
            }));
        }

        let bindings = if self.is_op(Op::Star) {
            self.advance();
            self.expect_keyword(Keyword::As)?;
            let (ns, _) = self.expect_ident()?;
            ImportBindings::Namespace(ns)
        } else {
            self.expect_op(Op::LBrace)?;
            let mut items = Vec::new();
            while !self.is_op(Op::RBrace) {
                let item_type_only = if self.is_keyword(Keyword::Type) {
                    self.advance();
                    true
                } else {
                    false
                };
                let (name, _) = self.expect_ident()?;
                let alias = if self.is_keyword(Keyword::As) {
                    self.advance();
                    Some(self.expect_ident()?.0)
                } else {
                    None
                };
                items.push(ImportItem {
                    name,
                    alias,
                    type_only: item_type_only,
                });
                if self.is_op(Op::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect_op(Op::RBrace)?;
            ImportBindings::Named(items)
        };

        self.expect_keyword(Keyword::From)?;
        let from = self.expect_string()?;
        Ok(Declaration::Import(Import {
            bindings,
            type_only,
            from,
            span: start,
        }))
    }

    fn parse_reexport(&mut self) -> ParseResult<Declaration> {
        let start = self.expect_keyword(Keyword::Export)?;
        let items = if self.is_op(Op::Star) {
            self.advance();
            vec![ReExportItem::Glob]
        } else {
            self.expect_op(Op::LBrace)?;
            let mut items = Vec::new();
            while !self.is_op(Op::RBrace) {
                let (name, _) = self.expect_ident()?;
                let alias = if self.is_keyword(Keyword::As) {
                    self.advance();
                    Some(self.expect_ident()?.0)
                } else {
                    None
                };
                items.push(ReExportItem::Named { name, alias });
                if self.is_op(Op::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect_op(Op::RBrace)?;
            items
        };
        self.expect_keyword(Keyword::From)?;
        let from = self.expect_string()?;
        Ok(Declaration::ReExport(ReExport {
            items,
            from,
            span: start,
        }))
    }

    // --- type expressions ---------------------------------------------------

    fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let start = self.here();
        if self.is_op(Op::LParen) {
            let items = self.parse_type_paren_list()?;
            if self.is_op(Op::Arrow) {
                self.advance();
                let ret = self.parse_type_expr()?;
                let span = start.merge(ret.span().clone());
                return Ok(TypeExpr::Fn(items, Box::new(ret), span));
            }
            if items.len() == 1 {
                return Ok(items.into_iter().next().unwrap());
            }
            return Ok(TypeExpr::Tuple(items, start));
        }

        let atom = self.parse_type_postfix()?;
        if self.is_op(Op::Arrow) {
            self.advance();
            let ret = self.parse_type_expr()?;
            let span = start.merge(ret.span().clone());
            return Ok(TypeExpr::Fn(vec![atom], Box::new(ret), span));
        }
        Ok(atom)
    }

    fn parse_type_paren_list(&mut self) -> ParseResult<Vec<TypeExpr>> {
        self.expect_op(Op::LParen)?;
        let mut items = Vec::new();
        if !self.is_op(Op::RParen) {
            loop {
                items.push(self.parse_type_expr()?);
                if self.is_op(Op::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_op(Op::RParen)?;
        Ok(items)
    }

    fn parse_type_postfix(&mut self) -> ParseResult<TypeExpr> {
        let atom = self.parse_type_primary()?;
        if self.is_op(Op::Lt) {
            let start = atom.span().clone();
            self.advance();
            let mut args = vec![self.parse_type_expr()?];
            while self.is_op(Op::Comma) {
                self.advance();
                args.push(self.parse_type_expr()?);
            }
            self.expect_close_angle()?;
            return Ok(TypeExpr::Apply(Box::new(atom), args, start));
        }
        Ok(atom)
    }

    fn parse_type_primary(&mut self) -> ParseResult<TypeExpr> {
        let start = self.here();
        if self.is_keyword(Keyword::Ref) {
            self.advance();
            let inner = self.parse_type_postfix()?;
            return Ok(TypeExpr::Reference(Box::new(inner), start));
        }
        if self.is_op(Op::LBrace) {
            self.advance();
            let mut fields = Vec::new();
            let mut open = false;
            while !self.is_op(Op::RBrace) {
                if self.is_op(Op::Ellipsis) {
                    self.advance();
                    open = true;
                    break;
                }
                let (name, _) = self.expect_ident()?;
                self.expect_op(Op::Colon)?;
                let type_expr = self.parse_type_expr()?;
                fields.push(RecordTypeField { name, type_expr });
                if self.is_op(Op::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.expect_op(Op::RBrace)?;
            return Ok(TypeExpr::Record {
                fields,
                open,
                span: start,
            });
        }
        let (name, span) = self.expect_ident()?;
        Ok(TypeExpr::Name(name, span))
    }

    // --- patterns -------------------------------------------------------------

    fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        let first = self.parse_pattern_no_or()?;
        if self.is_op(Op::Pipe) {
            let mut alts = vec![first];
            while self.is_op(Op::Pipe) {
                self.advance();
                alts.push(self.parse_pattern_no_or()?);
            }
            let span = alts[0].span().clone();
            for alt in &alts[1..] {
                let mut names = Vec::new();
                alt.bound_names(&mut names);
                if !names.is_empty() {
                    return Err(ParseError::OrPatternBindsVariable {
                        span: alt.span().clone(),
                    });
                }
            }
            return Ok(Pattern::Or(alts, span));
        }
        Ok(first)
    }

    fn parse_pattern_no_or(&mut self) -> ParseResult<Pattern> {
        let cons = self.parse_pattern_cons()?;
        Ok(cons)
    }

    /// `::` is right-associative cons in patterns, same as in expressions.
    fn parse_pattern_cons(&mut self) -> ParseResult<Pattern> {
        let head = self.parse_pattern_primary()?;
        if self.is_op(Op::ColonColon) {
            let start = head.span().clone();
            self.advance();
            let tail = self.parse_pattern_cons()?;
            return Ok(Pattern::Cons {
                head: Box::new(head),
                tail: Box::new(tail),
                span: start,
            });
        }
        Ok(head)
    }

    fn parse_pattern_primary(&mut self) -> ParseResult<Pattern> {
        let start = self.here();
        match &self.current().kind {
            TokenKind::Id(name) if name == "_" => {
                self.advance();
                Ok(Pattern::Wildcard(start))
            }
            TokenKind::Id(name) if name.chars().next().is_some_and(char::is_uppercase) => {
                let name = name.clone();
                self.advance();
                let mut args = Vec::new();
                if self.is_op(Op::LParen) {
                    self.advance();
                    if !self.is_op(Op::RParen) {
                        loop {
                            args.push(self.parse_pattern()?);
                            if self.is_op(Op::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect_op(Op::RParen)?;
                }
                Ok(Pattern::Variant {
                    name,
                    args,
                    span: start,
                })
            }
            TokenKind::Id(name) => {
                let name = name.clone();
                self.advance();
                let type_ann = if self.is_op(Op::Colon) {
                    self.advance();
                    Some(self.parse_type_expr()?)
                } else {
                    None
                };
                Ok(Pattern::Var {
                    name,
                    type_ann,
                    span: start,
                })
            }
            TokenKind::Integer(n) => {
                let n = *n;
                self.advance();
                Ok(Pattern::Literal(Literal::Int(n), start))
            }
            TokenKind::Float(f) => {
                let f = *f;
                self.advance();
                Ok(Pattern::Literal(Literal::Float(f), start))
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(Pattern::Literal(Literal::Str(s), start))
            }
            TokenKind::Op(Op::LParen) => {
                self.advance();
                let mut items = Vec::new();
                if !self.is_op(Op::RParen) {
                    loop {
                        items.push(self.parse_pattern()?);
                        if self.is_op(Op::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect_op(Op::RParen)?;
                if items.len() == 1 {
                    Ok(items.into_iter().next().unwrap())
                } else {
                    Ok(Pattern::Tuple(items, start))
                }
            }
            TokenKind::Op(Op::LBracket) => {
                self.advance();
                let mut elements = Vec::new();
                let mut rest = None;
                while !self.is_op(Op::RBracket) {
                    if self.is_op(Op::Ellipsis) {
                        self.advance();
                        rest = Some(Box::new(self.parse_pattern()?));
                        break;
                    }
                    elements.push(self.parse_pattern()?);
                    if self.is_op(Op::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect_op(Op::RBracket)?;
                Ok(Pattern::List {
                    elements,
                    rest,
                    span: start,
                })
            }
            TokenKind::Op(Op::LBrace) => {
                self.advance();
                let mut fields = Vec::new();
                while !self.is_op(Op::RBrace) {
                    let (name, _) = self.expect_ident()?;
                    let pattern = if self.is_op(Op::Colon) {
                        self.advance();
                        Some(self.parse_pattern()?)
                    } else {
                        None
                    };
                    fields.push(RecordPatternField { name, pattern });
                    if self.is_op(Op::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect_op(Op::RBrace)?;
                Ok(Pattern::Record {
                    fields,
                    span: start,
                })
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "pattern".into(),
                found: describe(self.current()),
                span: start,
            }),
        }
    }

    // --- expressions: Pratt precedence climbing -------------------------------

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let Some((op, l_bp, r_bp, kind)) = self.peek_infix() else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let start = lhs.span().clone();
            lhs = match kind {
                InfixKind::Binary(bop) => {
                    let rhs = self.parse_expr_bp(r_bp)?;
                    let span = start.merge(rhs.span().clone());
                    Expr::Binary {
                        op: bop,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        span,
                    }
                }
                InfixKind::Cons => {
                    let rhs = self.parse_expr_bp(r_bp)?;
                    let span = start.merge(rhs.span().clone());
                    Expr::Cons {
                        head: Box::new(lhs),
                        tail: Box::new(rhs),
                        span,
                    }
                }
                InfixKind::Pipe => {
                    let rhs = self.parse_expr_bp(r_bp)?;
                    let span = start.merge(rhs.span().clone());
                    Expr::Pipe {
                        value: Box::new(lhs),
                        func: Box::new(rhs),
                        span,
                    }
                }
                InfixKind::Compose(dir) => {
                    let rhs = self.parse_expr_bp(r_bp)?;
                    let span = start.merge(rhs.span().clone());
                    Expr::Compose {
                        dir,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        span,
                    }
                }
                InfixKind::RefAssign => {
                    let rhs = self.parse_expr_bp(r_bp)?;
                    let span = start.merge(rhs.span().clone());
                    Expr::RefAssign {
                        target: Box::new(lhs),
                        value: Box::new(rhs),
                        span,
                    }
                }
            };
            let _ = op;
        }
        Ok(lhs)
    }

    fn peek_infix(&self) -> Option<(Op, u8, u8, InfixKind)> {
        let op = match &self.current().kind {
            TokenKind::Op(op) => *op,
            _ => return None,
        };
        let (l_bp, r_bp, kind) = match op {
            Op::ColonEq => (3, 2, InfixKind::RefAssign),
            Op::ComposeFwd => (5, 4, InfixKind::Compose(ComposeDir::Forward)),
            Op::ComposeBack => (5, 4, InfixKind::Compose(ComposeDir::Backward)),
            Op::PipeGt => (6, 7, InfixKind::Pipe),
            Op::OrOr => (8, 9, InfixKind::Binary(BinaryOp::Or)),
            Op::AndAnd => (10, 11, InfixKind::Binary(BinaryOp::And)),
            Op::Pipe => (12, 13, InfixKind::Binary(BinaryOp::BitOr)),
            Op::Caret => (14, 15, InfixKind::Binary(BinaryOp::BitXor)),
            _ => return self.peek_infix_rest(op),
        };
        Some((op, l_bp, r_bp, kind))
    }

    fn peek_infix_rest(&self, op: Op) -> Option<(Op, u8, u8, InfixKind)> {
        let (l_bp, r_bp, kind) = match op {
            Op::ColonColon => (17, 16, InfixKind::Cons),
            Op::EqEq => (18, 19, InfixKind::Binary(BinaryOp::Eq)),
            Op::BangEq => (18, 19, InfixKind::Binary(BinaryOp::Ne)),
            Op::Lt => (20, 21, InfixKind::Binary(BinaryOp::Lt)),
            Op::LtEq => (20, 21, InfixKind::Binary(BinaryOp::Le)),
            Op::Gt => (20, 21, InfixKind::Binary(BinaryOp::Gt)),
            Op::GtEq => (20, 21, InfixKind::Binary(BinaryOp::Ge)),
            Op::Plus => (22, 23, InfixKind::Binary(BinaryOp::Add)),
            Op::Minus => (22, 23, InfixKind::Binary(BinaryOp::Sub)),
            Op::Amp => (22, 23, InfixKind::Binary(BinaryOp::Concat)),
            Op::Star => (24, 25, InfixKind::Binary(BinaryOp::Mul)),
            Op::Slash => (24, 25, InfixKind::Binary(BinaryOp::Div)),
            Op::Percent => (24, 25, InfixKind::Binary(BinaryOp::Mod)),
            _ => return None,
        };
        Some((op, l_bp, r_bp, kind))
    }

    /// Prefix operators (`!`, `-`) bind tighter than every infix operator.
    const PREFIX_BP: u8 = 26;

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        let start = self.here();
        if self.is_op(Op::Bang) {
            self.advance();
            let operand = self.parse_expr_bp(Self::PREFIX_BP)?;
            let span = start.merge(operand.span().clone());
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            });
        }
        if self.is_op(Op::Minus) {
            self.advance();
            let operand = self.parse_expr_bp(Self::PREFIX_BP)?;
            let span = start.merge(operand.span().clone());
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.is_op(Op::LParen) {
                let start = expr.span().clone();
                self.advance();
                let mut args = Vec::new();
                if !self.is_op(Op::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.is_op(Op::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                let end = self.expect_op(Op::RParen)?;
                expr = Expr::App {
                    func: Box::new(expr),
                    args,
                    span: start.merge(end),
                };
            } else if self.is_op(Op::Dot) {
                self.advance();
                let (field, fspan) = self.expect_ident()?;
                let start = expr.span().clone();
                expr = Expr::Proj {
                    record: Box::new(expr),
                    field,
                    span: start.merge(fspan),
                };
            } else if self.is_op(Op::Bang) {
                // postfix deref, per disambiguation rule 1.
                let start = expr.span().clone();
                let bang_span = self.advance().span;
                expr = Expr::Unary {
                    op: UnaryOp::Deref,
                    operand: Box::new(expr),
                    span: start.merge(bang_span),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.here();
        match &self.current().kind {
            TokenKind::Integer(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Literal(Literal::Int(n), start))
            }
            TokenKind::Float(f) => {
                let f = *f;
                self.advance();
                Ok(Expr::Literal(Literal::Float(f), start))
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::Literal(Literal::Str(s), start))
            }
            TokenKind::Id(name) => {
                let name = name.clone();
                self.advance();
                match name.as_str() {
                    "true" => Ok(Expr::Literal(Literal::Bool(true), start)),
                    "false" => Ok(Expr::Literal(Literal::Bool(false), start)),
                    _ => Ok(Expr::Var(name, start)),
                }
            }
            TokenKind::Keyword(Keyword::Ref) => {
                self.advance();
                self.expect_op(Op::LParen)?;
                let inner = self.parse_expr()?;
                let end = self.expect_op(Op::RParen)?;
                Ok(Expr::MakeRef(Box::new(inner), start.merge(end)))
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if(start),
            TokenKind::Keyword(Keyword::Match) => self.parse_match(start),
            TokenKind::Keyword(Keyword::Unsafe) => {
                self.advance();
                let inner = self.parse_expr()?;
                let span = start.merge(inner.span().clone());
                Ok(Expr::Unsafe(Box::new(inner), span))
            }
            TokenKind::Keyword(Keyword::While) => self.parse_while(start),
            TokenKind::Op(Op::LParen) => self.parse_paren_or_lambda(start),
            TokenKind::Op(Op::LBrace) => self.parse_brace_expr(start),
            TokenKind::Op(Op::LBracket) => self.parse_list_expr(start),
            _ => Err(ParseError::UnexpectedToken {
                expected: "expression".into(),
                found: describe(self.current()),
                span: start,
            }),
        }
    }

    fn parse_if(&mut self, start: Span) -> ParseResult<Expr> {
        self.advance(); // `if`
        let cond = self.parse_expr()?;
        self.expect_keyword(Keyword::Then)?;
        let then_branch = self.parse_expr()?;
        self.expect_keyword(Keyword::Else)?;
        let else_branch = self.parse_expr()?;
        let span = start.merge(else_branch.span().clone());
        Ok(Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            span,
        })
    }

    fn parse_while(&mut self, start: Span) -> ParseResult<Expr> {
        self.advance(); // `while`
        let cond = self.parse_expr()?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span().clone());
        Ok(Expr::While {
            cond: Box::new(cond),
            body: Box::new(body),
            span,
        })
    }

    fn parse_match(&mut self, start: Span) -> ParseResult<Expr> {
        self.advance(); // `match`
        let scrutinee = self.parse_expr()?;
        self.expect_op(Op::LBrace)?;
        let mut arms = Vec::new();
        while !self.is_op(Op::RBrace) {
            let pattern = self.parse_pattern()?;
            let guard = if self.is_keyword(Keyword::When) {
                self.advance();
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expect_op(Op::FatArrow)?;
            let body = self.parse_expr()?;
            arms.push(MatchArm {
                pattern,
                guard,
                body,
            });
            if self.is_op(Op::Comma) || self.is_op(Op::Semicolon) {
                self.advance();
            } else {
                break;
            }
        }
        let end = self.expect_op(Op::RBrace)?;
        Ok(Expr::Match {
            scrutinee: Box::new(scrutinee),
            arms,
            span: start.merge(end),
        })
    }

    fn parse_list_expr(&mut self, start: Span) -> ParseResult<Expr> {
        self.advance(); // `[`
        let mut elements = Vec::new();
        while !self.is_op(Op::RBracket) {
            if self.is_op(Op::Ellipsis) {
                self.advance();
                elements.push(ListElement::Spread(self.parse_expr()?));
            } else {
                elements.push(ListElement::Item(self.parse_expr()?));
            }
            if self.is_op(Op::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let end = self.expect_op(Op::RBracket)?;
        Ok(Expr::List {
            elements,
            span: start.merge(end),
        })
    }

    /// Disambiguation rule 4/5: scans a balanced `(...)` prefix, optionally
    /// followed by a `: TypeExpr` return annotation (itself depth-tracked
    /// across `{`/`[`/`(`), then tests for `=>`.
    fn looks_like_lambda(&self) -> bool {
        let mut idx = self.pos;
        debug_assert!(self.tokens[idx].is_op(Op::LParen));
        let mut depth = 0i32;
        loop {
            match &self.tokens.get(idx) {
                None => return false,
                Some(t) => {
                    if t.is_op(Op::LParen) {
                        depth += 1;
                    } else if t.is_op(Op::RParen) {
                        depth -= 1;
                        if depth == 0 {
                            idx += 1;
                            break;
                        }
                    } else if t.is_eof() {
                        return false;
                    }
                    idx += 1;
                }
            }
        }
        if self.tokens.get(idx).is_some_and(|t| t.is_op(Op::Colon)) {
            idx += 1;
            let mut type_depth = 0i32;
            loop {
                match self.tokens.get(idx) {
                    None => return false,
                    Some(t) if t.is_eof() => return false,
                    Some(t)
                        if type_depth == 0
                            && (t.is_op(Op::FatArrow)
                                || t.is_op(Op::Semicolon)
                                || t.is_op(Op::Comma)) =>
                    {
                        break;
                    }
                    Some(t) => {
                        if t.is_op(Op::LParen) || t.is_op(Op::LBrace) || t.is_op(Op::LBracket) {
                            type_depth += 1;
                        } else if t.is_op(Op::RParen)
                            || t.is_op(Op::RBrace)
                            || t.is_op(Op::RBracket)
                        {
                            type_depth -= 1;
                        }
                        idx += 1;
                    }
                }
            }
        }
        self.tokens.get(idx).is_some_and(|t| t.is_op(Op::FatArrow))
    }

    fn parse_paren_or_lambda(&mut self, start: Span) -> ParseResult<Expr> {
        if self.looks_like_lambda() {
            return self.parse_lambda(start);
        }
        self.advance(); // `(`
        let mut items = vec![self.parse_expr()?];
        while self.is_op(Op::Comma) {
            self.advance();
            items.push(self.parse_expr()?);
        }
        let end = self.expect_op(Op::RParen)?;
        if items.len() == 1 {
            Ok(items.into_iter().next().unwrap())
        } else {
            Ok(Expr::Tuple(items, start.merge(end)))
        }
    }

    fn parse_lambda(&mut self, start: Span) -> ParseResult<Expr> {
        self.expect_op(Op::LParen)?;
        let mut params = Vec::new();
        if !self.is_op(Op::RParen) {
            loop {
                let pattern = self.parse_pattern()?;
                let type_ann = if self.is_op(Op::Colon) {
                    self.advance();
                    Some(self.parse_type_expr()?)
                } else {
                    None
                };
                params.push(LambdaParam { pattern, type_ann });
                if self.is_op(Op::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_op(Op::RParen)?;
        let return_type = if self.is_op(Op::Colon) {
            self.advance();
            Some(self.parse_type_expr()?)
        } else {
            None
        };
        self.expect_op(Op::FatArrow)?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span().clone());
        Ok(Expr::Lambda {
            params,
            return_type,
            body: Box::new(body),
            span,
        })
    }

    /// Disambiguation rule 2: record vs. block.
    fn parse_brace_expr(&mut self, start: Span) -> ParseResult<Expr> {
        self.advance(); // `{`
        if self.is_op(Op::RBrace) {
            let end = self.advance().span;
            return Ok(Expr::Record {
                fields: Vec::new(),
                span: start.merge(end),
            });
        }
        if self.starts_block_keyword() {
            return self.finish_block(start);
        }
        if self.is_op(Op::Ellipsis) {
            return self.parse_record_literal(start);
        }
        if let TokenKind::Id(_) = &self.current().kind {
            if self.peek_at(1).is_op(Op::Colon)
                || self.peek_at(1).is_op(Op::Comma)
                || self.peek_at(1).is_op(Op::RBrace)
            {
                return self.parse_record_literal(start);
            }
        }
        // Ambiguous tail: parse an expression and let the next token decide.
        let first = self.parse_expr()?;
        if self.is_op(Op::Semicolon) {
            return self.finish_block_with_first(start, BlockStmt::Expr(first));
        }
        // No semicolon immediately before `}`: a singleton block whose
        // value is `first` (the common case for a non-identifier
        // expression, which can never be a valid record field anyway).
        let end = self.expect_op(Op::RBrace)?;
        Ok(Expr::Block(Block {
            stmts: vec![BlockStmt::Expr(first)],
            trailing_semi: false,
            span: start.merge(end),
        }))
    }

    fn starts_block_keyword(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Keyword(
                Keyword::If | Keyword::Match | Keyword::Unsafe | Keyword::Let | Keyword::While
            )
        )
    }

    fn parse_record_literal(&mut self, start: Span) -> ParseResult<Expr> {
        let mut fields = Vec::new();
        while !self.is_op(Op::RBrace) {
            if self.is_op(Op::Ellipsis) {
                self.advance();
                fields.push(RecordField::Spread(self.parse_expr()?));
            } else {
                let (name, fspan) = self.expect_ident()?;
                if self.is_op(Op::Colon) {
                    self.advance();
                    let value = self.parse_expr()?;
                    fields.push(RecordField::Field(name, value));
                } else {
                    fields.push(RecordField::Shorthand(name, fspan));
                }
            }
            if self.is_op(Op::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        let end = self.expect_op(Op::RBrace)?;
        Ok(Expr::Record {
            fields,
            span: start.merge(end),
        })
    }

    fn finish_block(&mut self, start: Span) -> ParseResult<Expr> {
        let mut stmts = Vec::new();
        let mut trailing_semi = true;
        while !self.is_op(Op::RBrace) {
            let stmt = self.parse_block_stmt()?;
            if self.is_op(Op::Semicolon) {
                self.advance();
                stmts.push(stmt);
                trailing_semi = true;
            } else {
                stmts.push(stmt);
                trailing_semi = false;
                break;
            }
        }
        let end = self.expect_op(Op::RBrace)?;
        Ok(Expr::Block(Block {
            stmts,
            trailing_semi,
            span: start.merge(end),
        }))
    }

    fn finish_block_with_first(&mut self, start: Span, first: BlockStmt) -> ParseResult<Expr> {
        self.advance(); // the semicolon after `first`
        let mut stmts = vec![first];
        let mut trailing_semi = true;
        while !self.is_op(Op::RBrace) {
            let stmt = self.parse_block_stmt()?;
            if self.is_op(Op::Semicolon) {
                self.advance();
                stmts.push(stmt);
                trailing_semi = true;
            } else {
                stmts.push(stmt);
                trailing_semi = false;
                break;
            }
        }
        let end = self.expect_op(Op::RBrace)?;
        Ok(Expr::Block(Block {
            stmts,
            trailing_semi,
            span: start.merge(end),
        }))
    }

    fn parse_block_stmt(&mut self) -> ParseResult<BlockStmt> {
        if self.is_keyword(Keyword::Let) {
            let start = self.advance().span;
            let mutable = if self.is_keyword(Keyword::Mut) {
                self.advance();
                true
            } else {
                false
            };
            let pattern = self.parse_pattern()?;
            let type_ann = if self.is_op(Op::Colon) {
                self.advance();
                Some(self.parse_type_expr()?)
            } else {
                None
            };
            self.expect_op(Op::Assign)?;
            let value = self.parse_expr()?;
            let span = start.merge(value.span().clone());
            return Ok(BlockStmt::Let {
                pattern,
                mutable,
                type_ann,
                value,
                span,
            });
        }
        Ok(BlockStmt::Expr(self.parse_expr()?))
    }
}

enum InfixKind {
    Binary(BinaryOp),
    Cons,
    Pipe,
    Compose(ComposeDir),
    RefAssign,
}

fn describe(tok: &Token) -> String {
    match &tok.kind {
        TokenKind::Eof => "end of input".into(),
        TokenKind::Id(s) => format!("identifier '{s}'"),
        TokenKind::Keyword(k) => format!("keyword '{k:?}'"),
        TokenKind::Op(o) => format!("'{o:?}'"),
        TokenKind::Integer(n) => format!("integer '{n}'"),
        TokenKind::Float(f) => format!("float '{f}'"),
        TokenKind::Str(_) => "string literal".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Module {
        let tokens = tokenize(src, "<test>").expect("lex failed");
        parse(tokens).expect("parse failed")
    }

    fn parse_expr_src(src: &str) -> Expr {
        let tokens = tokenize(src, "<test>").expect("lex failed");
        let mut parser = Parser::new(tokens);
        parser.parse_expr().expect("parse failed")
    }

    #[test]
    fn parses_simple_let() {
        let module = parse_src("let x = 1;");
        assert_eq!(module.declarations.len(), 1);
        assert!(matches!(
            &module.declarations[0],
            Declaration::Let { recursive: false, bindings, .. } if bindings.len() == 1
        ));
    }

    #[test]
    fn record_shorthand_vs_block() {
        assert!(matches!(parse_expr_src("{ x }"), Expr::Record { .. }));
        assert!(matches!(parse_expr_src("{ x; }"), Expr::Block(_)));
        assert!(matches!(parse_expr_src("{ x: 1 }"), Expr::Record { .. }));
    }

    #[test]
    fn lambda_vs_parenthesized() {
        assert!(matches!(parse_expr_src("(x) => x"), Expr::Lambda { .. }));
        assert!(matches!(parse_expr_src("(1 + 2)"), Expr::Binary { .. }));
    }

    #[test]
    fn curried_application_parses_as_nested_app() {
        let expr = parse_expr_src("f(a, b)");
        match expr {
            Expr::App { args, .. } => assert_eq!(args.len(), 2),
            other => panic!("expected App, got {other:?}"),
        }
    }

    #[test]
    fn pipe_is_left_associative() {
        let expr = parse_expr_src("a |> f |> g");
        match expr {
            Expr::Pipe { value, .. } => assert!(matches!(*value, Expr::Pipe { .. })),
            other => panic!("expected Pipe, got {other:?}"),
        }
    }

    #[test]
    fn compose_is_right_associative() {
        let expr = parse_expr_src("f >> g >> h");
        match expr {
            Expr::Compose { rhs, .. } => assert!(matches!(*rhs, Expr::Compose { .. })),
            other => panic!("expected Compose, got {other:?}"),
        }
    }

    #[test]
    fn prefix_and_postfix_bang() {
        let expr = parse_expr_src("!x!");
        match expr {
            Expr::Unary { op: UnaryOp::Not, operand, .. } => {
                assert!(matches!(*operand, Expr::Unary { op: UnaryOp::Deref, .. }));
            }
            other => panic!("expected LogicalNot(Deref(..)), got {other:?}"),
        }
    }

    #[test]
    fn or_pattern_rejects_variable_binding() {
        let tokens = tokenize("match x { 1 | y => 1 }", "<test>").unwrap();
        let mut parser = Parser::new(tokens);
        let err = parser.parse_expr().unwrap_err();
        assert!(matches!(err, ParseError::OrPatternBindsVariable { .. }));
    }

    #[test]
    fn generic_type_application_splits_double_gt() {
        let tokens = tokenize("let f : Map<String, List<Int>> = g;", "<test>").unwrap();
        parse(tokens).expect("should split >> into nested >");
    }
}
