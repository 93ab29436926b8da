// ABOUTME: Compiles the standardized tree into numbered deltas and control symbols

use std::rc::Rc;

use log::debug;

use crate::error::RpalError;
use crate::machine::symbol::{Closure, Delta, Symbol};
use crate::tree::NodeRef;

const BINARY_OPS: [&str; 14] = [
    "+", "-", "*", "/", "**", "&", "or", "eq", "ne", "ls", "le", "gr", "ge", "aug",
];

/// Walks the standardized tree in pre-order, cutting it into flat delta
/// bodies. Lambda and delta indices are assigned in allocation order.
pub struct ControlFactory {
    lambda_index: usize,
    delta_index: usize,
}

/// Build the initial control for `root`: the global environment marker
/// followed by delta 0 wrapping the whole program
pub fn generate(root: &NodeRef) -> Result<Vec<Symbol>, RpalError> {
    let mut factory = ControlFactory {
        lambda_index: 1,
        delta_index: 0,
    };
    let delta = factory.delta(root)?;
    debug!(
        "generated {} deltas, {} lambdas",
        factory.delta_index,
        factory.lambda_index - 1
    );
    Ok(vec![Symbol::EnvMarker(0), Symbol::Delta(delta)])
}

impl ControlFactory {
    fn delta(&mut self, node: &NodeRef) -> Result<Rc<Delta>, RpalError> {
        let index = self.delta_index;
        self.delta_index += 1;
        let symbols = self.sequence(node)?;
        Ok(Rc::new(Delta { index, symbols }))
    }

    /// The flat symbol sequence for one subtree. Sequences are stored in
    /// pre-order; the machine pops them from the back, so operands run
    /// before their operator.
    fn sequence(&mut self, node: &NodeRef) -> Result<Vec<Symbol>, RpalError> {
        let tag = node.borrow().tag.clone();
        let children = node.borrow().children.clone();
        let mut symbols = Vec::new();

        match tag.as_str() {
            "lambda" => {
                symbols.push(Symbol::Lambda(self.closure(&children)?));
            }
            "->" => {
                if children.len() != 3 {
                    return Err(RpalError::malformed_tree("->", "expected three children"));
                }
                symbols.push(Symbol::Delta(self.delta(&children[1])?));
                symbols.push(Symbol::Delta(self.delta(&children[2])?));
                symbols.push(Symbol::Beta);
                symbols.extend(self.sequence(&children[0])?);
            }
            _ => {
                symbols.push(self.atom(&tag, &children)?);
                for child in &children {
                    symbols.extend(self.sequence(child)?);
                }
            }
        }
        Ok(symbols)
    }

    fn closure(&mut self, children: &[NodeRef]) -> Result<Closure, RpalError> {
        if children.len() != 2 {
            return Err(RpalError::malformed_tree(
                "lambda",
                "expected one binder and one body",
            ));
        }
        let index = self.lambda_index;
        self.lambda_index += 1;

        let body = self.delta(&children[1])?;
        let binder = &children[0];
        let params = if binder.borrow().tag == "," {
            binder
                .borrow()
                .children
                .iter()
                .map(param_name)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![param_name(binder)?]
        };

        Ok(Closure {
            index,
            params,
            body,
            env: None,
        })
    }

    /// The symbol for a single non-lambda, non-conditional node
    fn atom(&self, tag: &str, children: &[NodeRef]) -> Result<Symbol, RpalError> {
        if tag == "neg" || tag == "not" {
            return Ok(Symbol::UnaryOp(tag.to_string()));
        }
        if BINARY_OPS.contains(&tag) {
            return Ok(Symbol::BinaryOp(tag.to_string()));
        }
        match tag {
            "gamma" => Ok(Symbol::Gamma),
            "tau" => Ok(Symbol::Tau(children.len())),
            "<Y*>" => Ok(Symbol::Ystar),
            _ => leaf_symbol(tag),
        }
    }
}

/// Decode a leaf tag like `<INTEGER:42>` into its runtime value
fn leaf_symbol(tag: &str) -> Result<Symbol, RpalError> {
    if let Some(name) = payload(tag, "<IDENTIFIER:") {
        Ok(Symbol::Id(name.to_string()))
    } else if let Some(digits) = payload(tag, "<INTEGER:") {
        digits
            .parse::<i64>()
            .map(Symbol::Int)
            .map_err(|_| RpalError::IntegerOutOfRange(digits.to_string()))
    } else if let Some(text) = payload(tag, "<STRING:") {
        // The payload still carries its source quotes
        let content = text
            .strip_prefix('\'')
            .and_then(|t| t.strip_suffix('\''))
            .unwrap_or(text);
        Ok(Symbol::Str(content.to_string()))
    } else if tag.starts_with("<TRUE_VALUE:") {
        Ok(Symbol::Bool(true))
    } else if tag.starts_with("<FALSE_VALUE:") {
        Ok(Symbol::Bool(false))
    } else if tag.starts_with("<NIL") {
        Ok(Symbol::nil())
    } else if tag.starts_with("<DUMMY") {
        Ok(Symbol::Dummy)
    } else {
        Err(RpalError::UnknownNodeTag(tag.to_string()))
    }
}

fn payload<'a>(tag: &'a str, prefix: &str) -> Option<&'a str> {
    tag.strip_prefix(prefix)?.strip_suffix('>')
}

/// The bound name inside a binder leaf; an empty parameter list binds
/// a vacuous name
fn param_name(node: &NodeRef) -> Result<String, RpalError> {
    let tag = node.borrow().tag.clone();
    if let Some(name) = payload(&tag, "<IDENTIFIER:") {
        Ok(name.to_string())
    } else if tag == "empty_params" {
        Ok("empty_params".to_string())
    } else {
        Err(RpalError::malformed_tree(
            "lambda",
            format!("binder must be an identifier, found '{}'", tag),
        ))
    }
}
