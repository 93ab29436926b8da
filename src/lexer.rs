// ABOUTME: Lexer turning RPAL source text into a token stream with positions

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while},
    character::complete::{anychar, char, digit1, multispace1, none_of, one_of},
    combinator::{opt, recognize},
    IResult, Parser,
};

use crate::error::RpalError;

/// Reserved words of the language; every other `[A-Za-z][A-Za-z0-9_]*`
/// lexeme is an identifier.
pub const KEYWORDS: [&str; 20] = [
    "let", "in", "fn", "where", "aug", "or", "not", "gr", "ge", "ls", "le", "eq", "ne", "true",
    "false", "nil", "dummy", "within", "and", "rec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    Keyword,
    Identifier,
    Number,
    Text,
    Operator,
    Punctuation,
    EndOfInput,
}

/// A lexeme with its category and the 1-indexed position of its first
/// character. Text tokens keep their surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub category: TokenCategory,
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(category: TokenCategory, value: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            category,
            value: value.into(),
            line,
            column,
        }
    }
}

// ============================================================================
// Lexeme recognizers
// ============================================================================

fn whitespace(input: &str) -> IResult<&str, &str> {
    multispace1(input)
}

/// A line comment: `//` up to (but not including) the next newline
fn comment(input: &str) -> IResult<&str, &str> {
    recognize((tag("//"), take_while(|c| c != '\n'))).parse(input)
}

/// A text literal delimited by single quotes; a backslash escapes the
/// character after it, so `\'` does not close the literal. The lexeme
/// includes both quotes.
fn text_literal(input: &str) -> IResult<&str, &str> {
    recognize((
        char('\''),
        opt(escaped(none_of("'\\"), '\\', anychar)),
        char('\''),
    ))
    .parse(input)
}

/// An identifier or keyword: `[A-Za-z][A-Za-z0-9_]*`
fn word(input: &str) -> IResult<&str, &str> {
    recognize((
        one_of("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz"),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    digit1(input)
}

/// Two-character operators win over their one-character prefixes
fn two_char_operator(input: &str) -> IResult<&str, &str> {
    alt((tag("->"), tag(">="), tag("<="), tag("=="), tag("!="))).parse(input)
}

fn one_char_operator(input: &str) -> IResult<&str, &str> {
    recognize(one_of("+-*/<>&.@:~|$#!%^_[]{}\"?=")).parse(input)
}

fn punctuation(input: &str) -> IResult<&str, &str> {
    recognize(one_of("();,")).parse(input)
}

// ============================================================================
// Driver
// ============================================================================

/// Walk `text`, updating the line counter and 1-indexed column
fn advance_position(text: &str, line: &mut usize, column: &mut usize) {
    for ch in text.chars() {
        if ch == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

/// Tokenize a complete source string. The result always ends with a
/// single EndOfInput token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, RpalError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line = 1usize;
    let mut column = 1usize;

    while !rest.is_empty() {
        // Whitespace and comments are consumed and discarded
        if let Ok((next, skipped)) = alt((whitespace, comment)).parse(rest) {
            advance_position(skipped, &mut line, &mut column);
            rest = next;
            continue;
        }

        let (start_line, start_column) = (line, column);

        let (next, category, lexeme) = if let Ok((next, lexeme)) = text_literal(rest) {
            (next, TokenCategory::Text, lexeme)
        } else if rest.starts_with('\'') {
            // A quote that opened but never closed
            return Err(RpalError::UnterminatedString {
                line: start_line,
                column: start_column,
            });
        } else if let Ok((next, lexeme)) = word(rest) {
            let category = if KEYWORDS.contains(&lexeme) {
                TokenCategory::Keyword
            } else {
                TokenCategory::Identifier
            };
            (next, category, lexeme)
        } else if let Ok((next, lexeme)) = number(rest) {
            (next, TokenCategory::Number, lexeme)
        } else if let Ok((next, lexeme)) = two_char_operator(rest) {
            (next, TokenCategory::Operator, lexeme)
        } else if let Ok((next, lexeme)) = one_char_operator(rest) {
            (next, TokenCategory::Operator, lexeme)
        } else if let Ok((next, lexeme)) = punctuation(rest) {
            (next, TokenCategory::Punctuation, lexeme)
        } else {
            return Err(RpalError::UnknownCharacter {
                character: rest.chars().next().unwrap_or('\0'),
                line: start_line,
                column: start_column,
            });
        };

        advance_position(lexeme, &mut line, &mut column);
        tokens.push(Token::new(category, lexeme, start_line, start_column));
        rest = next;
    }

    tokens.push(Token::new(TokenCategory::EndOfInput, "", line, column));
    Ok(tokens)
}
