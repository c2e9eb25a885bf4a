//! Errors that can occur while compiling one Jack compilation unit.
//! A grammar mismatch is unrecoverable for the unit: the error carries
//! enough context (expected vs. actual, position) to be debuggable,
//! and no partial output is produced.

use super::tokenizer::{Keyword, LexError, Span, Token};

#[derive(Debug)]
pub enum Error {
    Lex(Vec<LexError>),
    Syntax(SyntaxError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub span: Span,
    pub kind: SyntaxErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnexpectedToken { expected: Expected, found: Token },
    UnexpectedEndOfInput { expected: Expected },
    UndeclaredVariable(String),
}

/// What the parser was looking for at the point of failure — either one
/// specific token, or a named grammar production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Symbol(char),
    Keyword(Keyword),
    Production(&'static str),
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symbol(c) => write!(f, "`{c}`"),
            Self::Keyword(keyword) => write!(f, "`{keyword}`"),
            Self::Production(name) => write!(f, "{name}"),
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            SyntaxErrorKind::UnexpectedEndOfInput { expected } => {
                write!(f, "expected {expected}, found end of input")
            }
            SyntaxErrorKind::UndeclaredVariable(name) => {
                write!(f, "`{name}` is not declared in any enclosing scope")
            }
        }
    }
}
