// ABOUTME: Error types for every stage of the interpreter pipeline

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpalError {
    // ===== Lexical errors =====
    /// A character that starts no token class
    #[error("unexpected character '{character}' at line {line}, column {column}")]
    UnknownCharacter {
        character: char,
        line: usize,
        column: usize,
    },

    /// A text literal whose closing quote never arrives
    #[error("unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    // ===== Parse errors =====
    /// The current token does not fit the production being parsed
    #[error("parse error in {production}: expected {expected}, found '{found}' at line {line}, column {column}")]
    UnexpectedToken {
        production: &'static str,
        expected: &'static str,
        found: String,
        line: usize,
        column: usize,
    },

    /// Input ran out mid-production
    #[error("parse error in {production}: unexpected end of input, expected {expected}")]
    UnexpectedEnd {
        production: &'static str,
        expected: &'static str,
    },

    /// A complete expression was parsed but tokens remain
    #[error("trailing input after a complete program, starting at '{0}'")]
    TrailingTokens(String),

    // ===== Standardization errors =====
    /// A rewrite found a tree shape the parser should never produce
    #[error("cannot standardize '{tag}' node: {message}")]
    MalformedTree { tag: String, message: String },

    /// The control generator met a tag it cannot compile
    #[error("unknown node tag in standardized tree: '{0}'")]
    UnknownNodeTag(String),

    /// An integer literal that does not fit the machine's integer type
    #[error("integer literal '{0}' does not fit in 64 bits")]
    IntegerOutOfRange(String),

    // ===== Runtime errors =====
    /// A name that is neither bound nor a primitive
    #[error("unbound name: {0}")]
    UnboundName(String),

    /// Gamma applied to a value that is not a function, tuple, or primitive
    #[error("cannot apply {0}: not a function")]
    NotApplicable(String),

    /// An operator or primitive received the wrong kind of value
    #[error("{operator}: expected {expected}, got {actual}")]
    WrongOperand {
        operator: String,
        expected: &'static str,
        actual: String,
    },

    /// 1-based tuple selection outside the tuple
    #[error("tuple index {index} out of range for a tuple of {size} elements")]
    TupleIndexOutOfRange { index: i64, size: usize },

    /// Beta popped something other than a truthvalue
    #[error("conditional requires a truthvalue, got {0}")]
    NonBooleanCondition(String),

    /// Checked arithmetic overflowed
    #[error("integer overflow in '{0}'")]
    ArithmeticOverflow(&'static str),

    /// Control or value stack in a shape the machine can never reach
    /// from a well-formed control sequence
    #[error("machine state corrupted: {0}")]
    MachineState(&'static str),

    #[error("i/o error: {0}")]
    Io(String),
}

impl RpalError {
    /// Wrong-operand error for an operator or primitive
    pub fn wrong_operand(operator: &str, expected: &'static str, actual: impl Into<String>) -> Self {
        RpalError::WrongOperand {
            operator: operator.to_string(),
            expected,
            actual: actual.into(),
        }
    }

    /// Structural error raised by a standardization rewrite
    pub fn malformed_tree(tag: &str, message: impl Into<String>) -> Self {
        RpalError::MalformedTree {
            tag: tag.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RpalError {
    fn from(err: std::io::Error) -> Self {
        RpalError::Io(err.to_string())
    }
}
