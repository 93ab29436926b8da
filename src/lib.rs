// ABOUTME: Library module exposing the interpreter pipeline and its stages

pub mod config;
pub mod error;
pub mod lexer;
pub mod machine;
pub mod parser;
pub mod standardizer;
pub mod token_stream;
pub mod tree;

use std::io::Write;

use log::debug;

use crate::error::RpalError;
use crate::tree::NodeRef;

fn parse_source(source: &str) -> Result<NodeRef, RpalError> {
    let tokens = lexer::tokenize(source)?;
    debug!("lexed {} tokens", tokens.len());
    parser::SyntaxParser::parse(tokens)
}

/// Lex, parse, standardize, and evaluate `source`. Anything the program
/// `Print`s goes to `out`; the final value is returned in textual form.
pub fn interpret(source: &str, out: &mut dyn Write) -> Result<String, RpalError> {
    let root = parse_source(source)?;
    standardizer::standardize(&root)?;
    machine::evaluate(&root, out)
}

/// The AST dump: one `<dots><tag>` line per node in pre-order
pub fn ast_dump(source: &str) -> Result<Vec<String>, RpalError> {
    let root = parse_source(source)?;
    Ok(tree::flatten(&root))
}

/// The standardized-tree dump, in the same format as the AST dump
pub fn st_dump(source: &str) -> Result<Vec<String>, RpalError> {
    let root = parse_source(source)?;
    standardizer::standardize(&root)?;
    Ok(tree::flatten(&root))
}
