// ABOUTME: Cursor over the token vector used by the recursive-descent parser

use crate::error::RpalError;
use crate::lexer::{Token, TokenCategory};

/// Forward-only cursor over a token vector. The lexer guarantees a
/// trailing EndOfInput token, and `peek` saturates there, so productions
/// never run off the end.
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| t.category),
            Some(TokenCategory::EndOfInput)
        ));
        TokenStream { tokens, pos: 0 }
    }

    pub fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// The token `offset` positions ahead, saturating at EndOfInput
    pub fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    pub fn at_end(&self) -> bool {
        self.peek().category == TokenCategory::EndOfInput
    }

    /// True when the current token's text is exactly `value`
    pub fn value_is(&self, value: &str) -> bool {
        self.peek().value == value
    }

    pub fn category_is(&self, category: TokenCategory) -> bool {
        self.peek().category == category
    }

    /// Consume and return the current token
    pub fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if its text is `value`, otherwise fail
    /// with a parse error naming the production
    pub fn expect_value(
        &mut self,
        value: &'static str,
        production: &'static str,
    ) -> Result<Token, RpalError> {
        let token = self.peek();
        if token.category == TokenCategory::EndOfInput {
            return Err(RpalError::UnexpectedEnd {
                production,
                expected: value,
            });
        }
        if token.value != value {
            return Err(RpalError::UnexpectedToken {
                production,
                expected: value,
                found: token.value.clone(),
                line: token.line,
                column: token.column,
            });
        }
        Ok(self.advance())
    }

    /// Consume the current token if it is an identifier, otherwise fail
    pub fn expect_identifier(&mut self, production: &'static str) -> Result<Token, RpalError> {
        let token = self.peek();
        match token.category {
            TokenCategory::Identifier => Ok(self.advance()),
            TokenCategory::EndOfInput => Err(RpalError::UnexpectedEnd {
                production,
                expected: "an identifier",
            }),
            _ => Err(RpalError::UnexpectedToken {
                production,
                expected: "an identifier",
                found: token.value.clone(),
                line: token.line,
                column: token.column,
            }),
        }
    }
}
