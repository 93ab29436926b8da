// ABOUTME: Recursive-descent parser building the AST from the token stream

use log::debug;

use crate::error::RpalError;
use crate::lexer::{Token, TokenCategory};
use crate::token_stream::TokenStream;
use crate::tree::{self, NodeRef, TreeNode};

/// Recursive-descent parser for the RPAL grammar. Each production method
/// consumes tokens and pushes finished subtrees onto a working stack;
/// emitting a tag with arity `n` adopts the top `n` subtrees as children.
pub struct SyntaxParser {
    tokens: TokenStream,
    stack: Vec<NodeRef>,
}

impl SyntaxParser {
    /// Parse a full program; the token stream must be consumed entirely
    pub fn parse(tokens: Vec<Token>) -> Result<NodeRef, RpalError> {
        let mut parser = SyntaxParser {
            tokens: TokenStream::new(tokens),
            stack: Vec::new(),
        };
        parser.e()?;

        if !parser.tokens.at_end() {
            return Err(RpalError::TrailingTokens(parser.tokens.peek().value.clone()));
        }

        let root = parser.stack.pop().ok_or(RpalError::UnexpectedEnd {
            production: "E",
            expected: "an expression",
        })?;
        debug_assert!(parser.stack.is_empty());

        tree::resync(&root, 0);
        debug!("parsed {} AST nodes", tree::flatten(&root).len());
        Ok(root)
    }

    // ------------------------------------------------------------------
    // Working-stack helpers
    // ------------------------------------------------------------------

    fn leaf(&mut self, tag: String) {
        self.stack.push(TreeNode::new(tag));
    }

    /// Adopt the top `arity` stack entries (in push order) as the
    /// children of a fresh `tag` node
    fn reduce(&mut self, tag: &str, arity: usize) {
        debug_assert!(self.stack.len() >= arity);
        let at = self.stack.len().saturating_sub(arity);
        let children = self.stack.split_off(at);
        self.stack.push(TreeNode::with_children(tag, children));
    }

    fn identifier_leaf(&mut self, token: &Token) {
        self.leaf(format!("<IDENTIFIER:{}>", token.value));
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    // E -> 'let' D 'in' E  => 'let'
    //   -> 'fn' Vb+ '.' E  => 'lambda'
    //   -> Ew
    fn e(&mut self) -> Result<(), RpalError> {
        if self.tokens.category_is(TokenCategory::Keyword) && self.tokens.value_is("let") {
            self.tokens.advance();
            self.d()?;
            self.tokens.expect_value("in", "E")?;
            self.e()?;
            self.reduce("let", 2);
            Ok(())
        } else if self.tokens.category_is(TokenCategory::Keyword) && self.tokens.value_is("fn") {
            self.tokens.advance();
            let mut n = 0;
            while self.tokens.category_is(TokenCategory::Identifier) || self.tokens.value_is("(") {
                self.vb()?;
                n += 1;
            }
            if n == 0 {
                let found = self.tokens.peek();
                return Err(RpalError::UnexpectedToken {
                    production: "E",
                    expected: "a parameter",
                    found: found.value.clone(),
                    line: found.line,
                    column: found.column,
                });
            }
            self.tokens.expect_value(".", "E")?;
            self.e()?;
            self.reduce("lambda", n + 1);
            Ok(())
        } else {
            self.ew()
        }
    }

    // Ew -> T 'where' Dr  => 'where'
    //    -> T
    fn ew(&mut self) -> Result<(), RpalError> {
        self.t()?;
        if self.tokens.value_is("where") {
            self.tokens.advance();
            self.dr()?;
            self.reduce("where", 2);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tuple expressions
    // ------------------------------------------------------------------

    // T -> Ta (',' Ta)+  => 'tau'
    //   -> Ta
    fn t(&mut self) -> Result<(), RpalError> {
        self.ta()?;
        let mut n = 1;
        while self.tokens.value_is(",") {
            self.tokens.advance();
            self.ta()?;
            n += 1;
        }
        if n > 1 {
            self.reduce("tau", n);
        }
        Ok(())
    }

    // Ta -> Tc ('aug' Tc)*  => 'aug' per repetition
    fn ta(&mut self) -> Result<(), RpalError> {
        self.tc()?;
        while self.tokens.value_is("aug") {
            self.tokens.advance();
            self.tc()?;
            self.reduce("aug", 2);
        }
        Ok(())
    }

    // Tc -> B ('->' Tc '|' Tc)?  => '->'
    fn tc(&mut self) -> Result<(), RpalError> {
        self.b()?;
        if self.tokens.value_is("->") {
            self.tokens.advance();
            self.tc()?;
            self.tokens.expect_value("|", "Tc")?;
            self.tc()?;
            self.reduce("->", 3);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Boolean expressions
    // ------------------------------------------------------------------

    // B -> Bt ('or' Bt)*
    fn b(&mut self) -> Result<(), RpalError> {
        self.bt()?;
        while self.tokens.value_is("or") {
            self.tokens.advance();
            self.bt()?;
            self.reduce("or", 2);
        }
        Ok(())
    }

    // Bt -> Bs ('&' Bs)*
    fn bt(&mut self) -> Result<(), RpalError> {
        self.bs()?;
        while self.tokens.value_is("&") {
            self.tokens.advance();
            self.bs()?;
            self.reduce("&", 2);
        }
        Ok(())
    }

    // Bs -> 'not' Bp  => 'not'
    //    -> Bp
    fn bs(&mut self) -> Result<(), RpalError> {
        if self.tokens.value_is("not") {
            self.tokens.advance();
            self.bp()?;
            self.reduce("not", 1);
        } else {
            self.bp()?;
        }
        Ok(())
    }

    // Bp -> A (comparison A)?; '>' '>=' '<' '<=' map to gr ge ls le
    fn bp(&mut self) -> Result<(), RpalError> {
        self.a()?;
        let tag = match self.tokens.peek().value.as_str() {
            ">" | "gr" => Some("gr"),
            ">=" | "ge" => Some("ge"),
            "<" | "ls" => Some("ls"),
            "<=" | "le" => Some("le"),
            "eq" => Some("eq"),
            "ne" => Some("ne"),
            _ => None,
        };
        if let Some(tag) = tag {
            self.tokens.advance();
            self.a()?;
            self.reduce(tag, 2);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Arithmetic expressions
    // ------------------------------------------------------------------

    // A -> ('+' | '-')? At (('+' | '-') At)*; leading '-' => 'neg'
    fn a(&mut self) -> Result<(), RpalError> {
        if self.tokens.value_is("+") {
            self.tokens.advance();
            self.at()?;
        } else if self.tokens.value_is("-") {
            self.tokens.advance();
            self.at()?;
            self.reduce("neg", 1);
        } else {
            self.at()?;
        }

        while self.tokens.value_is("+") || self.tokens.value_is("-") {
            let op = self.tokens.advance().value;
            self.at()?;
            self.reduce(&op, 2);
        }
        Ok(())
    }

    // At -> Af (('*' | '/') Af)*
    fn at(&mut self) -> Result<(), RpalError> {
        self.af()?;
        while (self.tokens.value_is("*") && !self.power_ahead()) || self.tokens.value_is("/") {
            let op = self.tokens.advance().value;
            self.af()?;
            self.reduce(&op, 2);
        }
        Ok(())
    }

    // Af -> Ap ('**' Af)?  -- the lexer emits '**' as two '*' tokens
    fn af(&mut self) -> Result<(), RpalError> {
        self.ap()?;
        if self.power_ahead() {
            self.tokens.advance();
            self.tokens.advance();
            self.af()?;
            self.reduce("**", 2);
        }
        Ok(())
    }

    fn power_ahead(&self) -> bool {
        self.tokens.value_is("*") && self.tokens.peek_at(1).value == "*"
    }

    // Ap -> R ('@' IDENTIFIER R)*  => '@' as a ternary
    fn ap(&mut self) -> Result<(), RpalError> {
        self.r()?;
        while self.tokens.value_is("@") {
            self.tokens.advance();
            let name = self.tokens.expect_identifier("Ap")?;
            self.identifier_leaf(&name);
            self.r()?;
            self.reduce("@", 3);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rators and rands
    // ------------------------------------------------------------------

    // R -> Rn Rn*  => left-associated 'gamma' per extra operand
    fn r(&mut self) -> Result<(), RpalError> {
        self.rn()?;
        while self.starts_operand() {
            self.rn()?;
            self.reduce("gamma", 2);
        }
        Ok(())
    }

    fn starts_operand(&self) -> bool {
        let token = self.tokens.peek();
        matches!(
            token.category,
            TokenCategory::Identifier | TokenCategory::Number | TokenCategory::Text
        ) || matches!(token.value.as_str(), "true" | "false" | "nil" | "dummy")
            || token.value == "("
    }

    // Rn -> IDENTIFIER | INTEGER | STRING
    //    -> 'true' | 'false' | 'nil' | 'dummy'
    //    -> '(' E ')'
    fn rn(&mut self) -> Result<(), RpalError> {
        let token = self.tokens.peek().clone();
        match token.category {
            TokenCategory::Identifier => {
                self.tokens.advance();
                self.identifier_leaf(&token);
                Ok(())
            }
            TokenCategory::Number => {
                self.tokens.advance();
                self.leaf(format!("<INTEGER:{}>", token.value));
                Ok(())
            }
            TokenCategory::Text => {
                self.tokens.advance();
                self.leaf(format!("<STRING:{}>", token.value));
                Ok(())
            }
            TokenCategory::Keyword => match token.value.as_str() {
                "true" => {
                    self.tokens.advance();
                    self.leaf("<TRUE_VALUE:true>".to_string());
                    Ok(())
                }
                "false" => {
                    self.tokens.advance();
                    self.leaf("<FALSE_VALUE:false>".to_string());
                    Ok(())
                }
                "nil" => {
                    self.tokens.advance();
                    self.leaf("<NIL:nil>".to_string());
                    Ok(())
                }
                "dummy" => {
                    self.tokens.advance();
                    self.leaf("<DUMMY:dummy>".to_string());
                    Ok(())
                }
                _ => Err(RpalError::UnexpectedToken {
                    production: "Rn",
                    expected: "an operand",
                    found: token.value,
                    line: token.line,
                    column: token.column,
                }),
            },
            TokenCategory::Punctuation if token.value == "(" => {
                self.tokens.advance();
                self.e()?;
                self.tokens.expect_value(")", "Rn")?;
                Ok(())
            }
            TokenCategory::EndOfInput => Err(RpalError::UnexpectedEnd {
                production: "Rn",
                expected: "an operand",
            }),
            _ => Err(RpalError::UnexpectedToken {
                production: "Rn",
                expected: "an operand",
                found: token.value,
                line: token.line,
                column: token.column,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    // D -> Da ('within' D)?  => 'within'
    fn d(&mut self) -> Result<(), RpalError> {
        self.da()?;
        if self.tokens.value_is("within") {
            self.tokens.advance();
            self.d()?;
            self.reduce("within", 2);
        }
        Ok(())
    }

    // Da -> Dr ('and' Dr)+  => 'and'
    //    -> Dr
    fn da(&mut self) -> Result<(), RpalError> {
        self.dr()?;
        let mut n = 1;
        while self.tokens.value_is("and") {
            self.tokens.advance();
            self.dr()?;
            n += 1;
        }
        if n > 1 {
            self.reduce("and", n);
        }
        Ok(())
    }

    // Dr -> 'rec'? Db  => 'rec' when present
    fn dr(&mut self) -> Result<(), RpalError> {
        let is_rec = self.tokens.value_is("rec");
        if is_rec {
            self.tokens.advance();
        }
        self.db()?;
        if is_rec {
            self.reduce("rec", 1);
        }
        Ok(())
    }

    // Db -> '(' D ')'
    //    -> IDENTIFIER Vb+ '=' E  => 'function_form'
    //    -> Vl '=' E              => '='
    fn db(&mut self) -> Result<(), RpalError> {
        if self.tokens.value_is("(") {
            self.tokens.advance();
            self.d()?;
            self.tokens.expect_value(")", "Db")?;
            Ok(())
        } else if self.tokens.category_is(TokenCategory::Identifier) {
            let next = self.tokens.peek_at(1);
            if next.value == "(" || next.category == TokenCategory::Identifier {
                // Function form: name, one or more binders, then the body
                let name = self.tokens.advance();
                self.identifier_leaf(&name);
                let mut n = 1;
                while self.tokens.category_is(TokenCategory::Identifier)
                    || self.tokens.value_is("(")
                {
                    self.vb()?;
                    n += 1;
                }
                self.tokens.expect_value("=", "Db")?;
                self.e()?;
                self.reduce("function_form", n + 1);
                Ok(())
            } else {
                self.vl()?;
                self.tokens.expect_value("=", "Db")?;
                self.e()?;
                self.reduce("=", 2);
                Ok(())
            }
        } else {
            let token = self.tokens.peek();
            Err(RpalError::UnexpectedToken {
                production: "Db",
                expected: "a definition",
                found: token.value.clone(),
                line: token.line,
                column: token.column,
            })
        }
    }

    // Vb -> IDENTIFIER | '(' Vl ')' | '(' ')'  => 'empty_params'
    fn vb(&mut self) -> Result<(), RpalError> {
        if self.tokens.category_is(TokenCategory::Identifier) {
            let token = self.tokens.advance();
            self.identifier_leaf(&token);
            Ok(())
        } else {
            self.tokens.expect_value("(", "Vb")?;
            if self.tokens.value_is(")") {
                self.tokens.advance();
                self.leaf("empty_params".to_string());
            } else {
                self.vl()?;
                self.tokens.expect_value(")", "Vb")?;
            }
            Ok(())
        }
    }

    // Vl -> IDENTIFIER (',' IDENTIFIER)*  => ',' when more than one
    fn vl(&mut self) -> Result<(), RpalError> {
        let first = self.tokens.expect_identifier("Vl")?;
        self.identifier_leaf(&first);
        let mut n = 1;
        while self.tokens.value_is(",") {
            self.tokens.advance();
            let name = self.tokens.expect_identifier("Vl")?;
            self.identifier_leaf(&name);
            n += 1;
        }
        if n > 1 {
            self.reduce(",", n);
        }
        Ok(())
    }
}
