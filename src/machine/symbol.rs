// ABOUTME: Runtime symbols for the CSE machine: values, closures, and control markers

use std::fmt;
use std::rc::Rc;

/// A compiled control body: the flat symbol sequence for one subtree,
/// addressed by allocation order
#[derive(Debug)]
pub struct Delta {
    pub index: usize,
    pub symbols: Vec<Symbol>,
}

/// A lambda closure. The body is shared, the captured environment is
/// stamped when the closure is pushed onto the value stack.
#[derive(Debug, Clone)]
pub struct Closure {
    pub index: usize,
    pub params: Vec<String>,
    pub body: Rc<Delta>,
    pub env: Option<usize>,
}

/// Everything that can appear on the control or the value stack
#[derive(Debug, Clone)]
pub enum Symbol {
    /// An identifier awaiting lookup, or an unbound (primitive) name
    Id(String),
    Int(i64),
    Str(String),
    Bool(bool),
    Dummy,
    /// Tuples double as nil: nil is the empty tuple
    Tuple(Vec<Symbol>),
    Lambda(Closure),
    /// Recursive closure introduced by applying Y* to a lambda
    Eta(Closure),
    Gamma,
    Beta,
    Tau(usize),
    Ystar,
    Delta(Rc<Delta>),
    UnaryOp(String),
    BinaryOp(String),
    /// Environment frame marker; pushed on both control and stack when a
    /// lambda is entered, popped together when its body finishes
    EnvMarker(usize),
    /// `Conc` applied to its first string, waiting for the second
    ConcPartial(String),
}

impl Symbol {
    pub fn nil() -> Symbol {
        Symbol::Tuple(Vec::new())
    }

    /// Short noun for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Symbol::Id(_) => "name",
            Symbol::Int(_) => "integer",
            Symbol::Str(_) => "string",
            Symbol::Bool(_) => "truthvalue",
            Symbol::Dummy => "dummy",
            Symbol::Tuple(_) => "tuple",
            Symbol::Lambda(_) | Symbol::Eta(_) | Symbol::ConcPartial(_) => "function",
            Symbol::Gamma
            | Symbol::Beta
            | Symbol::Tau(_)
            | Symbol::Ystar
            | Symbol::Delta(_)
            | Symbol::UnaryOp(_)
            | Symbol::BinaryOp(_)
            | Symbol::EnvMarker(_) => "control marker",
        }
    }

    /// The textual form used for printing, `eq`/`ne`, and the
    /// lexicographic comparison fallback
    pub fn text_form(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Id(name) => write!(f, "{}", name),
            Symbol::Int(n) => write!(f, "{}", n),
            Symbol::Str(s) => write!(f, "{}", s),
            Symbol::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Symbol::Dummy => write!(f, "dummy"),
            Symbol::Tuple(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, ")")
            }
            Symbol::Lambda(c) => {
                write!(f, "[lambda closure: {}: {}]", c.params.join(", "), c.index)
            }
            Symbol::Eta(c) => write!(f, "[eta closure: {}: {}]", c.params.join(", "), c.index),
            Symbol::ConcPartial(s) => write!(f, "[Conc partial: '{}']", s),
            Symbol::Gamma => write!(f, "gamma"),
            Symbol::Beta => write!(f, "beta"),
            Symbol::Tau(n) => write!(f, "tau[{}]", n),
            Symbol::Ystar => write!(f, "<Y*>"),
            Symbol::Delta(d) => write!(f, "delta[{}]", d.index),
            Symbol::UnaryOp(op) | Symbol::BinaryOp(op) => write!(f, "{}", op),
            Symbol::EnvMarker(index) => write!(f, "e[{}]", index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_display_is_recursive() {
        let inner = Symbol::Tuple(vec![Symbol::Int(2), Symbol::Int(3)]);
        let outer = Symbol::Tuple(vec![Symbol::Int(1), inner, Symbol::Str("hi".into())]);
        assert_eq!(outer.text_form(), "(1, (2, 3), hi)");
    }

    #[test]
    fn test_nil_displays_as_empty_tuple() {
        assert_eq!(Symbol::nil().text_form(), "()");
    }

    #[test]
    fn test_booleans_render_lowercase() {
        assert_eq!(Symbol::Bool(true).text_form(), "true");
        assert_eq!(Symbol::Bool(false).text_form(), "false");
    }

    #[test]
    fn test_strings_render_bare() {
        assert_eq!(Symbol::Str("hello".into()).text_form(), "hello");
    }
}
