// ABOUTME: Unary and binary operator semantics for the CSE machine

use crate::error::RpalError;
use crate::machine::symbol::Symbol;

/// Apply `neg` or `not` to a single operand
pub fn apply_unary(op: &str, rand: Symbol) -> Result<Symbol, RpalError> {
    match op {
        "neg" => match rand {
            Symbol::Int(n) => n
                .checked_neg()
                .map(Symbol::Int)
                .ok_or(RpalError::ArithmeticOverflow("neg")),
            other => Err(RpalError::wrong_operand("neg", "an integer", other.type_name())),
        },
        "not" => match rand {
            Symbol::Bool(b) => Ok(Symbol::Bool(!b)),
            other => Err(RpalError::wrong_operand("not", "a truthvalue", other.type_name())),
        },
        _ => Err(RpalError::UnknownNodeTag(op.to_string())),
    }
}

/// Apply a binary operator. `left` is the operand that was evaluated
/// last and therefore popped first.
pub fn apply_binary(op: &str, left: Symbol, right: Symbol) -> Result<Symbol, RpalError> {
    match op {
        "+" => add(left, right),
        "-" | "*" | "/" | "**" => arithmetic(op, left, right),
        "&" | "or" => logical(op, left, right),
        "eq" => Ok(Symbol::Bool(left.text_form() == right.text_form())),
        "ne" => Ok(Symbol::Bool(left.text_form() != right.text_form())),
        "ls" | "le" | "gr" | "ge" => compare(op, left, right),
        "aug" => augment(left, right),
        _ => Err(RpalError::UnknownNodeTag(op.to_string())),
    }
}

/// Integer addition when both sides are integers, otherwise
/// concatenation of the textual forms
fn add(left: Symbol, right: Symbol) -> Result<Symbol, RpalError> {
    match (&left, &right) {
        (Symbol::Int(a), Symbol::Int(b)) => a
            .checked_add(*b)
            .map(Symbol::Int)
            .ok_or(RpalError::ArithmeticOverflow("+")),
        _ => Ok(Symbol::Str(format!("{}{}", left.text_form(), right.text_form()))),
    }
}

fn arithmetic(op: &str, left: Symbol, right: Symbol) -> Result<Symbol, RpalError> {
    let (a, b) = match (&left, &right) {
        (Symbol::Int(a), Symbol::Int(b)) => (*a, *b),
        (Symbol::Int(_), other) | (other, _) => {
            return Err(RpalError::wrong_operand(op, "integers", other.type_name()));
        }
    };
    match op {
        "-" => a.checked_sub(b).ok_or(RpalError::ArithmeticOverflow("-")),
        "*" => a.checked_mul(b).ok_or(RpalError::ArithmeticOverflow("*")),
        "/" => {
            if b == 0 {
                Err(RpalError::wrong_operand("/", "a non-zero divisor", "0"))
            } else {
                // Truncated integer division
                Ok(a / b)
            }
        }
        "**" => {
            if b < 0 {
                Err(RpalError::wrong_operand("**", "a non-negative exponent", b.to_string()))
            } else {
                let exponent =
                    u32::try_from(b).map_err(|_| RpalError::ArithmeticOverflow("**"))?;
                a.checked_pow(exponent).ok_or(RpalError::ArithmeticOverflow("**"))
            }
        }
        _ => unreachable!("arithmetic called with '{}'", op),
    }
    .map(Symbol::Int)
}

fn logical(op: &str, left: Symbol, right: Symbol) -> Result<Symbol, RpalError> {
    match (&left, &right) {
        (Symbol::Bool(a), Symbol::Bool(b)) => Ok(Symbol::Bool(if op == "&" {
            *a && *b
        } else {
            *a || *b
        })),
        (Symbol::Bool(_), other) | (other, _) => {
            Err(RpalError::wrong_operand(op, "truthvalues", other.type_name()))
        }
    }
}

/// Numeric comparison when both sides are integers, lexicographic
/// comparison of the textual forms otherwise
fn compare(op: &str, left: Symbol, right: Symbol) -> Result<Symbol, RpalError> {
    let ordering = match (&left, &right) {
        (Symbol::Int(a), Symbol::Int(b)) => a.cmp(b),
        _ => left.text_form().cmp(&right.text_form()),
    };
    let result = match op {
        "ls" => ordering.is_lt(),
        "le" => ordering.is_le(),
        "gr" => ordering.is_gt(),
        "ge" => ordering.is_ge(),
        _ => unreachable!("compare called with '{}'", op),
    };
    Ok(Symbol::Bool(result))
}

/// Extend a tuple with the right operand, building a fresh tuple so no
/// shared value is mutated. A tuple on the right contributes its
/// elements; anything else is appended as a single element.
fn augment(left: Symbol, right: Symbol) -> Result<Symbol, RpalError> {
    let mut elements = match left {
        Symbol::Tuple(elements) => elements,
        other => {
            return Err(RpalError::wrong_operand("aug", "a tuple", other.type_name()));
        }
    };
    match right {
        Symbol::Tuple(more) => elements.extend(more),
        single => elements.push(single),
    }
    Ok(Symbol::Tuple(elements))
}
