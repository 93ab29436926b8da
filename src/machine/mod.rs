// ABOUTME: The CSE machine: control/stack/environment loop executing compiled deltas

pub mod builtins;
pub mod environment;
pub mod generator;
pub mod ops;
pub mod symbol;

use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::error::RpalError;
use crate::machine::environment::EnvPool;
use crate::machine::symbol::{Closure, Delta, Symbol};
use crate::tree::NodeRef;

/// Compile the standardized tree and run it to a final value, rendered
/// in its textual form. `out` receives anything the program `Print`s.
pub fn evaluate(root: &NodeRef, out: &mut dyn Write) -> Result<String, RpalError> {
    let control = generator::generate(root)?;
    let machine = CseMachine::new(control, out);
    let result = machine.run()?;
    Ok(result.text_form())
}

/// A Control/Stack/Environment machine. The control and the value stack
/// both grow at the back; the environment pool only ever grows, so
/// closure-captured frame indices stay valid for the whole run.
pub struct CseMachine<'w> {
    control: Vec<Symbol>,
    stack: Vec<Symbol>,
    envs: EnvPool,
    current_env: usize,
    out: &'w mut dyn Write,
}

impl<'w> CseMachine<'w> {
    pub fn new(control: Vec<Symbol>, out: &'w mut dyn Write) -> Self {
        CseMachine {
            control,
            stack: vec![Symbol::EnvMarker(0)],
            envs: EnvPool::new(),
            current_env: 0,
            out,
        }
    }

    /// Run until the control is empty; the top of the value stack is the
    /// program's answer
    pub fn run(mut self) -> Result<Symbol, RpalError> {
        while let Some(symbol) = self.control.pop() {
            match symbol {
                Symbol::Id(name) => {
                    // Unresolved names flow as themselves; gamma treats
                    // them as primitive names
                    let value = self
                        .envs
                        .lookup(self.current_env, &name)
                        .unwrap_or(Symbol::Id(name));
                    self.stack.push(value);
                }
                Symbol::Lambda(mut closure) => {
                    closure.env = Some(self.current_env);
                    self.stack.push(Symbol::Lambda(closure));
                }
                Symbol::Gamma => self.apply()?,
                Symbol::EnvMarker(index) => self.exit_frame(index)?,
                Symbol::UnaryOp(op) => {
                    let rand = self.pop_value()?;
                    let result = ops::apply_unary(&op, rand)?;
                    self.stack.push(result);
                }
                Symbol::BinaryOp(op) => {
                    let left = self.pop_value()?;
                    let right = self.pop_value()?;
                    let result = ops::apply_binary(&op, left, right)?;
                    self.stack.push(result);
                }
                Symbol::Beta => self.branch()?,
                Symbol::Tau(n) => {
                    let mut elements = Vec::with_capacity(n);
                    for _ in 0..n {
                        elements.push(self.pop_value()?);
                    }
                    self.stack.push(Symbol::Tuple(elements));
                }
                Symbol::Delta(delta) => self.splice(&delta),
                value => self.stack.push(value),
            }
        }
        debug!("evaluation used {} environment frames", self.envs.frame_count());
        self.pop_value()
    }

    // ------------------------------------------------------------------
    // Gamma
    // ------------------------------------------------------------------

    /// Pop the callee and dispatch on what it is
    fn apply(&mut self) -> Result<(), RpalError> {
        match self.pop_value()? {
            Symbol::Lambda(closure) => self.enter_lambda(closure),
            Symbol::Tuple(elements) => self.select(elements),
            Symbol::Ystar => match self.pop_value()? {
                Symbol::Lambda(closure) => {
                    self.stack.push(Symbol::Eta(closure));
                    Ok(())
                }
                other => Err(RpalError::wrong_operand(
                    "<Y*>",
                    "a lambda closure",
                    other.type_name(),
                )),
            },
            Symbol::Eta(closure) => {
                // Re-apply the wrapped lambda to the eta itself; the
                // next two gammas realize the fixed point
                self.control.push(Symbol::Gamma);
                self.control.push(Symbol::Gamma);
                self.stack.push(Symbol::Eta(closure.clone()));
                self.stack.push(Symbol::Lambda(closure));
                Ok(())
            }
            Symbol::Id(name) => self.apply_builtin(&name),
            Symbol::ConcPartial(first) => {
                let second = self.pop_string("Conc")?;
                self.stack.push(Symbol::Str(format!("{}{}", first, second)));
                Ok(())
            }
            other => Err(RpalError::NotApplicable(other.text_form())),
        }
    }

    fn enter_lambda(&mut self, closure: Closure) -> Result<(), RpalError> {
        let captured = closure
            .env
            .ok_or(RpalError::MachineState("lambda applied before environment capture"))?;
        if !self.envs.contains(captured) {
            return Err(RpalError::MachineState("captured environment missing from pool"));
        }
        let frame = self.envs.allocate(captured);

        if closure.params.len() == 1 {
            let value = self.pop_value()?;
            self.envs.bind(frame, closure.params[0].clone(), value);
        } else {
            // Multiple binders take their values positionally from one tuple
            match self.pop_value()? {
                Symbol::Tuple(elements) if elements.len() == closure.params.len() => {
                    for (param, element) in closure.params.iter().zip(elements) {
                        self.envs.bind(frame, param.clone(), element);
                    }
                }
                other => {
                    return Err(RpalError::wrong_operand(
                        "lambda",
                        "a tuple matching the parameter list",
                        other.text_form(),
                    ));
                }
            }
        }

        self.current_env = frame;
        self.control.push(Symbol::EnvMarker(frame));
        self.splice(&closure.body);
        self.stack.push(Symbol::EnvMarker(frame));
        Ok(())
    }

    /// Tuples apply as selectors: a 1-based integer index picks an element
    fn select(&mut self, elements: Vec<Symbol>) -> Result<(), RpalError> {
        let index = match self.pop_value()? {
            Symbol::Int(i) => i,
            other => {
                return Err(RpalError::wrong_operand(
                    "tuple selection",
                    "an integer index",
                    other.type_name(),
                ));
            }
        };
        if index < 1 || index as usize > elements.len() {
            return Err(RpalError::TupleIndexOutOfRange {
                index,
                size: elements.len(),
            });
        }
        self.stack.push(elements[index as usize - 1].clone());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Control transitions
    // ------------------------------------------------------------------

    /// The body of a lambda has finished: drop its frame marker from the
    /// stack, retire the frame, and fall back to the newest live frame
    fn exit_frame(&mut self, index: usize) -> Result<(), RpalError> {
        if self.stack.len() < 2 {
            return Err(RpalError::MachineState("environment marker without a result"));
        }
        let marker_pos = self.stack.len() - 2;
        match self.stack.remove(marker_pos) {
            Symbol::EnvMarker(found) if found == index => {}
            _ => return Err(RpalError::MachineState("misplaced environment marker")),
        }
        self.envs.mark_removed(index);
        if let Some(active) = self.envs.newest_active() {
            self.current_env = active;
        }
        Ok(())
    }

    /// Beta: the two branch deltas sit directly under it on the control;
    /// keep the taken one and discard the other
    fn branch(&mut self) -> Result<(), RpalError> {
        let take_then = match self.pop_value()? {
            Symbol::Bool(b) => b,
            other => return Err(RpalError::NonBooleanCondition(other.type_name().to_string())),
        };
        let len = self.control.len();
        let both_deltas = len >= 2
            && matches!(self.control[len - 1], Symbol::Delta(_))
            && matches!(self.control[len - 2], Symbol::Delta(_));
        if !both_deltas {
            return Err(RpalError::MachineState("beta without its branch deltas"));
        }
        if take_then {
            self.control.remove(len - 1);
        } else {
            self.control.remove(len - 2);
        }
        Ok(())
    }

    fn splice(&mut self, delta: &Rc<Delta>) {
        self.control.extend(delta.symbols.iter().cloned());
    }

    // ------------------------------------------------------------------
    // Stack helpers (shared with the builtin primitives)
    // ------------------------------------------------------------------

    pub(crate) fn push(&mut self, value: Symbol) {
        self.stack.push(value);
    }

    pub(crate) fn pop_value(&mut self) -> Result<Symbol, RpalError> {
        match self.stack.pop() {
            Some(Symbol::EnvMarker(_)) => {
                Err(RpalError::MachineState("popped an environment marker as a value"))
            }
            Some(value) => Ok(value),
            None => Err(RpalError::MachineState("value stack exhausted")),
        }
    }

    pub(crate) fn pop_string(&mut self, operator: &str) -> Result<String, RpalError> {
        match self.pop_value()? {
            Symbol::Str(s) => Ok(s),
            other => Err(RpalError::wrong_operand(operator, "a string", other.type_name())),
        }
    }

    pub(crate) fn pop_integer(&mut self, operator: &str) -> Result<i64, RpalError> {
        match self.pop_value()? {
            Symbol::Int(n) => Ok(n),
            other => Err(RpalError::wrong_operand(operator, "an integer", other.type_name())),
        }
    }

    pub(crate) fn pop_tuple(&mut self, operator: &str) -> Result<Vec<Symbol>, RpalError> {
        match self.pop_value()? {
            Symbol::Tuple(elements) => Ok(elements),
            other => Err(RpalError::wrong_operand(operator, "a tuple", other.type_name())),
        }
    }

    pub(crate) fn emit(&mut self, text: &str) -> Result<(), RpalError> {
        write!(self.out, "{}", text)?;
        Ok(())
    }
}
