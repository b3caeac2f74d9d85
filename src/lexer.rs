//! Tokenizer shared by the parser, the analyzer and the highlighter.
//!
//! Lexing never fails: malformed input becomes `Tok::Error` tokens so the
//! highlighter can still render half-typed expressions. The parser turns the
//! first error token into a syntax error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("Unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("Unterminated comment")]
    UnterminatedComment,
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Number(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Colon,
    Question,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Bang,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PlusPlus,
    MinusMinus,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Error(LexicalError),
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Tok::Number(n) => return write!(f, "{}", crate::ast::Value::Number(*n)),
            Tok::Str(s) => return write!(f, "{:?}", s),
            Tok::Ident(name) => return write!(f, "{}", name),
            Tok::Error(e) => return write!(f, "{}", e),
            Tok::LParen => "(",
            Tok::RParen => ")",
            Tok::LBracket => "[",
            Tok::RBracket => "]",
            Tok::LBrace => "{",
            Tok::RBrace => "}",
            Tok::Comma => ",",
            Tok::Dot => ".",
            Tok::Semicolon => ";",
            Tok::Colon => ":",
            Tok::Question => "?",
            Tok::Plus => "+",
            Tok::Minus => "-",
            Tok::Star => "*",
            Tok::StarStar => "**",
            Tok::Slash => "/",
            Tok::Percent => "%",
            Tok::Bang => "!",
            Tok::Assign => "=",
            Tok::PlusAssign => "+=",
            Tok::MinusAssign => "-=",
            Tok::StarAssign => "*=",
            Tok::SlashAssign => "/=",
            Tok::PlusPlus => "++",
            Tok::MinusMinus => "--",
            Tok::EqEq => "==",
            Tok::EqEqEq => "===",
            Tok::NotEq => "!=",
            Tok::NotEqEq => "!==",
            Tok::Lt => "<",
            Tok::Le => "<=",
            Tok::Gt => ">",
            Tok::Ge => ">=",
            Tok::AndAnd => "&&",
            Tok::OrOr => "||",
        };
        f.write_str(text)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub span: Span,
    /// Set when a line break separates this token from the previous one.
    pub line_break_before: bool,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match &self.tok {
            Tok::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// Tokenizes the whole input. Whitespace and comments are dropped.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

pub struct Lexer<'input> {
    input: &'input str,
    pos: usize,
    failed: bool,
}

/// Operators ordered longest first so `===` wins over `==` and `=`.
const OPERATORS: &[(&str, Tok)] = &[
    ("===", Tok::EqEqEq),
    ("!==", Tok::NotEqEq),
    ("**", Tok::StarStar),
    ("==", Tok::EqEq),
    ("!=", Tok::NotEq),
    ("<=", Tok::Le),
    (">=", Tok::Ge),
    ("&&", Tok::AndAnd),
    ("||", Tok::OrOr),
    ("+=", Tok::PlusAssign),
    ("-=", Tok::MinusAssign),
    ("*=", Tok::StarAssign),
    ("/=", Tok::SlashAssign),
    ("++", Tok::PlusPlus),
    ("--", Tok::MinusMinus),
    ("(", Tok::LParen),
    (")", Tok::RParen),
    ("[", Tok::LBracket),
    ("]", Tok::RBracket),
    ("{", Tok::LBrace),
    ("}", Tok::RBrace),
    (",", Tok::Comma),
    (";", Tok::Semicolon),
    (":", Tok::Colon),
    ("?", Tok::Question),
    ("+", Tok::Plus),
    ("-", Tok::Minus),
    ("*", Tok::Star),
    ("/", Tok::Slash),
    ("%", Tok::Percent),
    ("!", Tok::Bang),
    ("=", Tok::Assign),
    ("<", Tok::Lt),
    (">", Tok::Gt),
];

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Lexer {
            input,
            pos: 0,
            failed: false,
        }
    }

    /// Skips whitespace and comments, reporting whether a line break was crossed.
    fn skip_trivia(&mut self) -> Result<bool, LexicalError> {
        let mut saw_newline = false;
        loop {
            let rest = &self.input[self.pos..];
            let ws = rest
                .bytes()
                .take_while(|b| b" \t\n\r".contains(b))
                .count();
            saw_newline |= rest[..ws].contains('\n');
            self.pos += ws;

            let rest = &self.input[self.pos..];
            if rest.starts_with("//") {
                let len = rest.find('\n').unwrap_or(rest.len());
                self.pos += len;
            } else if rest.starts_with("/*") {
                let Some(close) = rest[2..].find("*/") else {
                    self.pos = self.input.len();
                    return Err(LexicalError::UnterminatedComment);
                };
                saw_newline |= rest[..close + 2].contains('\n');
                self.pos += close + 4;
            } else {
                return Ok(saw_newline);
            }
        }
    }

    fn take_ident(&mut self) -> String {
        let rest = &self.input[self.pos..];
        let end = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        self.pos += end;
        rest[..end].to_string()
    }

    fn take_num(&mut self) -> Result<f64, LexicalError> {
        let rest = &self.input[self.pos..];
        let bytes = rest.as_bytes();
        let n = bytes.len();
        let mut end = 0;
        // [0-9]+\.?[0-9]* or \.[0-9]+
        while end < n && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < n && bytes[end] == b'.' {
            end += 1;
            while end < n && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
        // Optional exponent
        if end < n && (bytes[end] == b'e' || bytes[end] == b'E') {
            let exp_start = end;
            end += 1;
            if end < n && (bytes[end] == b'+' || bytes[end] == b'-') {
                end += 1;
            }
            if end < n && bytes[end].is_ascii_digit() {
                while end < n && bytes[end].is_ascii_digit() {
                    end += 1;
                }
            } else {
                end = exp_start;
            }
        }
        let text = &rest[..end];
        self.pos += end;
        text.parse::<f64>()
            .map_err(|_| LexicalError::InvalidNumber(text.to_string()))
    }

    fn take_string(&mut self, quote: char) -> Result<String, LexicalError> {
        let mut out = String::new();
        let mut chars = self.input[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                c if c == quote => {
                    self.pos += i + c.len_utf8();
                    return Ok(out);
                }
                '\n' => break,
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                c => out.push(c),
            }
        }
        self.pos = self.input.len();
        Err(LexicalError::UnterminatedString)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let start_before_trivia = self.pos;
        let line_break_before = match self.skip_trivia() {
            Ok(newline) => newline,
            Err(e) => {
                self.failed = true;
                return Some(Token {
                    tok: Tok::Error(e),
                    span: Span::new(start_before_trivia, self.input.len()),
                    line_break_before: false,
                });
            }
        };
        if self.pos >= self.input.len() {
            return None;
        }

        let start = self.pos;
        let rest = &self.input[self.pos..];
        let c = rest.chars().next()?;

        let tok = match c {
            'a'..='z' | 'A'..='Z' | '_' => Tok::Ident(self.take_ident()),
            '0'..='9' => self.take_num().map_or_else(Tok::Error, Tok::Number),
            '.' if rest[1..].starts_with(|d: char| d.is_ascii_digit()) => {
                self.take_num().map_or_else(Tok::Error, Tok::Number)
            }
            '"' | '\'' => {
                self.pos += 1;
                match self.take_string(c) {
                    Ok(s) => Tok::Str(s),
                    Err(e) => {
                        self.failed = true;
                        Tok::Error(e)
                    }
                }
            }
            _ => match OPERATORS.iter().find(|(text, _)| rest.starts_with(text)) {
                Some((text, tok)) => {
                    self.pos += text.len();
                    tok.clone()
                }
                None => {
                    self.pos += c.len_utf8();
                    Tok::Error(LexicalError::UnexpectedChar(c))
                }
            },
        };

        Some(Token {
            tok,
            span: Span::new(start, self.pos),
            line_break_before,
        })
    }
}
