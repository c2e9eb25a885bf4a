//! Lexical analysis of raw Jack source: classifies the character stream
//! into symbols, keywords, identifiers, integer constants and string
//! constants, discarding comments and whitespace.

use chumsky::prelude::*;

pub type Span = std::ops::Range<usize>;
pub type Spanned<T> = (T, Span);
pub type LexError = Simple<char>;

/// The fixed Jack symbol character set.
const SYMBOLS: &str = "{}()[].,;+-*/&<>|=~";

pub fn is_symbol_char(c: char) -> bool {
    SYMBOLS.contains(c)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Symbol(char),
    Keyword(Keyword),
    Identifier(String),
    IntConst(u16),
    StrConst(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symbol(c) => write!(f, "`{c}`"),
            Self::Keyword(keyword) => write!(f, "`{keyword}`"),
            Self::Identifier(name) => write!(f, "`{name}`"),
            Self::IntConst(value) => write!(f, "`{value}`"),
            Self::StrConst(string) => write!(f, "`\"{string}\"`"),
        }
    }
}

/// The Jack reserved-word set. A non-symbol run of characters is a keyword
/// exactly when it parses as one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

/// Tokenize one compilation unit (the full text of a `.jack` file).
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, Vec<LexError>> {
    lexer().parse(source)
}

/// Construct the lexer for a Jack compilation unit.
fn lexer() -> impl Parser<char, Vec<Spanned<Token>>, Error = LexError> {
    // `//` discards the rest of the physical line,
    // `/* ... */` discards everything up to the closing delimiter
    let line_comment = just("//")
        .then(take_until(text::newline().or(end())))
        .ignored();
    let block_comment = just("/*").then(take_until(just("*/"))).ignored();
    let comment = line_comment.or(block_comment);

    // a maximal run of digits
    let int_const = filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|digits, span| {
            digits
                .parse::<u16>()
                .map(Token::IntConst)
                .map_err(|_| Simple::custom(span, "integer constant does not fit in 16 bits"))
        });

    // quotes are dropped from the token text; newlines may not appear,
    // and only ASCII characters carry a Hack character code
    let str_const = just('"')
        .ignore_then(filter(|c: &char| *c != '"' && *c != '\n').repeated())
        .then_ignore(just('"'))
        .collect::<String>()
        .try_map(|text, span| {
            if text.is_ascii() {
                Ok(Token::StrConst(text))
            } else {
                Err(Simple::custom(
                    span,
                    "string constant contains a character outside the ASCII range",
                ))
            }
        });

    let symbol = one_of(SYMBOLS).map(Token::Symbol);

    // a maximal run of anything that cannot start/continue another token;
    // a leading digit is excluded so a malformed integer constant cannot
    // re-lex as an identifier; keyword-hood is decided by exact match
    // against the reserved-word set
    let word_char = |c: &char| !c.is_whitespace() && !is_symbol_char(*c) && *c != '"';
    let word = filter(move |c: &char| word_char(c) && !c.is_ascii_digit())
        .chain(filter(word_char).repeated())
        .collect::<String>()
        .map(|word| {
            word.parse::<Keyword>()
                .map_or(Token::Identifier(word), Token::Keyword)
        });

    let token = int_const.or(str_const).or(symbol).or(word);

    token
        .map_with_span(|token, span| (token, span))
        .padded_by(comment.padded().repeated())
        .padded()
        .repeated()
        .then_ignore(end())
}
