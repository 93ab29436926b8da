// ABOUTME: Built-in primitive functions, dispatched by unbound-name text at gamma

use crate::error::RpalError;
use crate::machine::symbol::Symbol;
use crate::machine::CseMachine;

impl CseMachine<'_> {
    /// Apply the primitive called `name` to the top of the value stack.
    /// Names reach this point by falling through environment lookup.
    pub(crate) fn apply_builtin(&mut self, name: &str) -> Result<(), RpalError> {
        match name {
            // Writes the textual form of its argument and passes it through
            "Print" => {
                let value = self.pop_value()?;
                let text = value.text_form();
                self.emit(&text)?;
                self.push(value);
                Ok(())
            }
            "Stem" => {
                let s = self.pop_string("Stem")?;
                let first = s
                    .chars()
                    .next()
                    .ok_or_else(|| RpalError::wrong_operand("Stem", "a non-empty string", "''"))?;
                self.push(Symbol::Str(first.to_string()));
                Ok(())
            }
            "Stern" => {
                let s = self.pop_string("Stern")?;
                let mut chars = s.chars();
                if chars.next().is_none() {
                    return Err(RpalError::wrong_operand("Stern", "a non-empty string", "''"));
                }
                self.push(Symbol::Str(chars.as_str().to_string()));
                Ok(())
            }
            // Curried: the first application parks the left string in a
            // partial, the next gamma completes the concatenation
            "Conc" => {
                let first = self.pop_string("Conc")?;
                self.push(Symbol::ConcPartial(first));
                Ok(())
            }
            "Order" => {
                let elements = self.pop_tuple("Order")?;
                self.push(Symbol::Int(elements.len() as i64));
                Ok(())
            }
            "Null" => {
                let elements = self.pop_tuple("Null")?;
                self.push(Symbol::Bool(elements.is_empty()));
                Ok(())
            }
            "Itos" => {
                let n = self.pop_integer("Itos")?;
                self.push(Symbol::Str(n.to_string()));
                Ok(())
            }
            "Isinteger" => self.predicate(|v| matches!(v, Symbol::Int(_))),
            "Isstring" => self.predicate(|v| matches!(v, Symbol::Str(_))),
            "Istuple" => self.predicate(|v| matches!(v, Symbol::Tuple(_))),
            "Isdummy" => self.predicate(|v| matches!(v, Symbol::Dummy)),
            "Istruthvalue" => self.predicate(|v| matches!(v, Symbol::Bool(_))),
            "Isfunction" => {
                self.predicate(|v| matches!(v, Symbol::Lambda(_) | Symbol::Eta(_)))
            }
            _ => Err(RpalError::UnboundName(name.to_string())),
        }
    }

    /// Replace the top of the stack with the truthvalue of `test` on it
    fn predicate(&mut self, test: fn(&Symbol) -> bool) -> Result<(), RpalError> {
        let value = self.pop_value()?;
        self.push(Symbol::Bool(test(&value)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RpalError;
    use crate::lexer::tokenize;
    use crate::machine::evaluate;
    use crate::parser::SyntaxParser;
    use crate::standardizer::standardize;

    fn run(source: &str) -> Result<String, RpalError> {
        let root = SyntaxParser::parse(tokenize(source).unwrap()).unwrap();
        standardize(&root)?;
        let mut out = Vec::new();
        evaluate(&root, &mut out)
    }

    #[test]
    fn test_stem_takes_the_first_character() {
        assert_eq!(run("Stem 'hello'").unwrap(), "h");
    }

    #[test]
    fn test_stern_drops_the_first_character() {
        assert_eq!(run("Stern 'hello'").unwrap(), "ello");
    }

    #[test]
    fn test_stem_of_empty_string_fails() {
        assert!(run("Stem ''").is_err());
    }

    #[test]
    fn test_conc_is_curried_over_two_applications() {
        assert_eq!(run("Conc 'foo' 'bar'").unwrap(), "foobar");
        // Partially applied, then completed later
        assert_eq!(run("let greet = Conc 'hello ' in greet 'world'").unwrap(), "hello world");
    }

    #[test]
    fn test_order_counts_tuple_elements() {
        assert_eq!(run("Order (1, 2, 3)").unwrap(), "3");
        assert_eq!(run("Order nil").unwrap(), "0");
    }

    #[test]
    fn test_null_tests_for_the_empty_tuple() {
        assert_eq!(run("Null nil").unwrap(), "true");
        assert_eq!(run("Null (1, 2)").unwrap(), "false");
    }

    #[test]
    fn test_itos_renders_base_ten() {
        assert_eq!(run("Itos 42").unwrap(), "42");
        assert_eq!(run("Itos (0 - 7)").unwrap(), "-7");
    }

    #[test]
    fn test_type_predicates() {
        assert_eq!(run("Isinteger 1").unwrap(), "true");
        assert_eq!(run("Isinteger 'one'").unwrap(), "false");
        assert_eq!(run("Isstring 'one'").unwrap(), "true");
        assert_eq!(run("Istuple (1, 2)").unwrap(), "true");
        assert_eq!(run("Istuple nil").unwrap(), "true");
        assert_eq!(run("Isdummy dummy").unwrap(), "true");
        assert_eq!(run("Istruthvalue false").unwrap(), "true");
        assert_eq!(run("Istruthvalue nil").unwrap(), "false");
        assert_eq!(run("Isfunction (fn x. x)").unwrap(), "true");
        assert_eq!(run("Isfunction 3").unwrap(), "false");
    }

    #[test]
    fn test_order_rejects_non_tuples() {
        assert!(matches!(run("Order 5"), Err(RpalError::WrongOperand { .. })));
    }
}
