//! Textual module form
//!
//! Grammar, mirrored by the `Display` impls in [`crate::module`]:
//!
//! ```text
//! module  := "module" "@" IDENT attrs? "{" op* "}"
//! op      := STRING attrs? region*
//! region  := "(" op* ")"
//! attrs   := "[" (pair ("," pair)*)? "]"
//! pair    := IDENT "=" value
//! value   := INT | STRING | "true" | "false" | "unit" | "[" values? "]"
//! ```
//!
//! `//` comments run to end of line. Markers never appear in the textual
//! form; they are transient run state.

use crate::module::{Attr, AttrMap, Module, Op, Region};
use thiserror::Error;

/// Parse the textual form into a [`Module`].
pub fn parse_module(input: &str) -> Result<Module, ParseError> {
    let tokens = lex(input)?;
    Parser::new(tokens).parse_module()
}

/// Syntax error with source position.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}:{column}: unexpected character '{found}'")]
    UnexpectedChar {
        found: char,
        line: usize,
        column: usize,
    },

    #[error("line {line}:{column}: unterminated string literal")]
    UnterminatedString { line: usize, column: usize },

    #[error("line {line}:{column}: invalid integer literal '{text}'")]
    InvalidInt {
        text: String,
        line: usize,
        column: usize,
    },

    #[error("line {line}:{column}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    KwModule,
    KwTrue,
    KwFalse,
    KwUnit,
    Ident(String),
    Str(String),
    Int(i64),
    At,
    Comma,
    Eq,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::KwModule => "'module'".to_string(),
            TokenKind::KwTrue => "'true'".to_string(),
            TokenKind::KwFalse => "'false'".to_string(),
            TokenKind::KwUnit => "'unit'".to_string(),
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Str(text) => format!("string {:?}", text),
            TokenKind::Int(value) => format!("integer {}", value),
            TokenKind::At => "'@'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

fn lex(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1usize;
    let mut column = 1usize;

    macro_rules! push {
        ($kind:expr, $col:expr) => {
            tokens.push(Token {
                kind: $kind,
                line,
                column: $col,
            })
        };
    }

    while let Some(&c) = chars.peek() {
        let start_column = column;
        match c {
            '\n' => {
                chars.next();
                line += 1;
                column = 1;
            }
            ' ' | '\t' | '\r' => {
                chars.next();
                column += 1;
            }
            '/' => {
                // comment to end of line
                chars.next();
                column += 1;
                if chars.peek() != Some(&'/') {
                    return Err(ParseError::UnexpectedChar {
                        found: '/',
                        line,
                        column: start_column,
                    });
                }
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '@' => {
                chars.next();
                column += 1;
                push!(TokenKind::At, start_column);
            }
            ',' => {
                chars.next();
                column += 1;
                push!(TokenKind::Comma, start_column);
            }
            '=' => {
                chars.next();
                column += 1;
                push!(TokenKind::Eq, start_column);
            }
            '[' => {
                chars.next();
                column += 1;
                push!(TokenKind::LBracket, start_column);
            }
            ']' => {
                chars.next();
                column += 1;
                push!(TokenKind::RBracket, start_column);
            }
            '{' => {
                chars.next();
                column += 1;
                push!(TokenKind::LBrace, start_column);
            }
            '}' => {
                chars.next();
                column += 1;
                push!(TokenKind::RBrace, start_column);
            }
            '(' => {
                chars.next();
                column += 1;
                push!(TokenKind::LParen, start_column);
            }
            ')' => {
                chars.next();
                column += 1;
                push!(TokenKind::RParen, start_column);
            }
            '"' => {
                chars.next();
                column += 1;
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    column += 1;
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            let escaped = chars.next().ok_or(ParseError::UnterminatedString {
                                line,
                                column: start_column,
                            })?;
                            column += 1;
                            match escaped {
                                'n' => text.push('\n'),
                                't' => text.push('\t'),
                                other => text.push(other),
                            }
                        }
                        '\n' => {
                            return Err(ParseError::UnterminatedString {
                                line,
                                column: start_column,
                            })
                        }
                        other => text.push(other),
                    }
                }
                if !closed {
                    return Err(ParseError::UnterminatedString {
                        line,
                        column: start_column,
                    });
                }
                push!(TokenKind::Str(text), start_column);
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                column += 1;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        chars.next();
                        column += 1;
                    } else {
                        break;
                    }
                }
                let value = text.parse::<i64>().map_err(|_| ParseError::InvalidInt {
                    text: text.clone(),
                    line,
                    column: start_column,
                })?;
                push!(TokenKind::Int(value), start_column);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        text.push(c);
                        chars.next();
                        column += 1;
                    } else {
                        break;
                    }
                }
                let kind = match text.as_str() {
                    "module" => TokenKind::KwModule,
                    "true" => TokenKind::KwTrue,
                    "false" => TokenKind::KwFalse,
                    "unit" => TokenKind::KwUnit,
                    _ => TokenKind::Ident(text),
                };
                push!(kind, start_column);
            }
            other => {
                return Err(ParseError::UnexpectedChar {
                    found: other,
                    line,
                    column: start_column,
                })
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().map(|t| &t.kind == kind).unwrap_or(false)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error_here(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                expected,
                found: token.kind.describe(),
                line: token.line,
                column: token.column,
            },
            None => ParseError::UnexpectedEof { expected },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.match_token(&kind) {
            Ok(())
        } else {
            Err(self.error_here(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(_),
                ..
            }) => match self.advance() {
                Some(Token {
                    kind: TokenKind::Ident(name),
                    ..
                }) => Ok(name),
                _ => Err(ParseError::UnexpectedEof { expected }),
            },
            _ => Err(self.error_here(expected)),
        }
    }

    fn parse_module(&mut self) -> Result<Module, ParseError> {
        self.expect(TokenKind::KwModule, "'module'")?;
        self.expect(TokenKind::At, "'@'")?;
        let name = self.expect_identifier("module name")?;

        let mut module = Module::new(name);
        if self.check(&TokenKind::LBracket) {
            module.attrs = self.parse_attrs()?;
        }
        self.expect(TokenKind::LBrace, "'{'")?;
        while !self.check(&TokenKind::RBrace) {
            module.body.push(self.parse_op()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;

        match self.peek() {
            None => Ok(module),
            Some(_) => Err(self.error_here("end of input")),
        }
    }

    fn parse_op(&mut self) -> Result<Op, ParseError> {
        let name = match self.peek() {
            Some(Token {
                kind: TokenKind::Str(_),
                ..
            }) => match self.advance() {
                Some(Token {
                    kind: TokenKind::Str(name),
                    ..
                }) => name,
                _ => unreachable!("peeked string token"),
            },
            _ => return Err(self.error_here("operation name string")),
        };

        let mut op = Op::new(name);
        if self.check(&TokenKind::LBracket) {
            op.attrs = self.parse_attrs()?;
        }
        while self.match_token(&TokenKind::LParen) {
            let mut region = Region::default();
            while !self.check(&TokenKind::RParen) {
                region.0.push(self.parse_op()?);
            }
            self.expect(TokenKind::RParen, "')'")?;
            op.regions.push(region);
        }
        Ok(op)
    }

    fn parse_attrs(&mut self) -> Result<AttrMap, ParseError> {
        self.expect(TokenKind::LBracket, "'['")?;
        let mut attrs = AttrMap::new();
        if self.match_token(&TokenKind::RBracket) {
            return Ok(attrs);
        }
        loop {
            let key = self.expect_identifier("attribute key")?;
            self.expect(TokenKind::Eq, "'='")?;
            let value = self.parse_value()?;
            attrs.insert(key, value);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(attrs)
    }

    fn parse_value(&mut self) -> Result<Attr, ParseError> {
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Int(value)) => {
                self.advance();
                Ok(Attr::Int(value))
            }
            Some(TokenKind::Str(text)) => {
                self.advance();
                Ok(Attr::Str(text))
            }
            Some(TokenKind::KwTrue) => {
                self.advance();
                Ok(Attr::Bool(true))
            }
            Some(TokenKind::KwFalse) => {
                self.advance();
                Ok(Attr::Bool(false))
            }
            Some(TokenKind::KwUnit) => {
                self.advance();
                Ok(Attr::Unit)
            }
            Some(TokenKind::LBracket) => {
                self.advance();
                let mut items = Vec::new();
                if self.match_token(&TokenKind::RBracket) {
                    return Ok(Attr::Array(items));
                }
                loop {
                    items.push(self.parse_value()?);
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Attr::Array(items))
            }
            _ => Err(self.error_here("attribute value")),
        }
    }
}
