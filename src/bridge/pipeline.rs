//==================================================
// File: bridge/pipeline.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Message entry path
// Objective: Turn one incoming host message into an evaluation, post the
//            result or the error, and keep every message independent
//==================================================

use tracing::{debug, info};

use crate::atom::Atom;
use crate::codec::{atom_to_value, atoms_to_source, trim_quotes};
use crate::errors::BridgeError;
use crate::host::Host;
use crate::interpreter::{EvalError, EvalResult, Value};

use super::Bridge;

impl<H: Host> Bridge<H> {
    /// Handle one message. `eval` and selectors starting with `(` carry code;
    /// `reset`, `log-repl`, `log-null` and `read` configure the object; any
    /// other selector is called as `(selector args...)`.
    ///
    /// Errors are posted and also returned; nothing carries over to the next
    /// message.
    pub fn handle_message(&mut self, selector: &str, atoms: &[Atom]) -> EvalResult {
        let count = atoms.len() + 1;
        let limit = self.context.config.max_atoms_per_message;
        if count > limit {
            let err = BridgeError::TooManyAtoms { count, limit };
            self.post_error(&err);
            return Err(err.into());
        }
        debug!(selector, atoms = atoms.len(), "message");
        match selector {
            "eval" => self.eval_atoms(atoms),
            "reset" => {
                self.reset();
                Ok(Value::Unspecified)
            }
            "log-repl" => self.set_flag(selector, atoms, |bridge, on| bridge.set_log_repl(on)),
            "log-null" => self.set_flag(selector, atoms, |bridge, on| bridge.set_log_null(on)),
            "read" => self.read(atoms),
            code if code.starts_with('(') => {
                let mut all = Vec::with_capacity(atoms.len() + 1);
                all.push(Atom::symbol(code));
                all.extend_from_slice(atoms);
                self.eval_atoms(&all)
            }
            _ => self.dispatch(selector, atoms),
        }
    }

    /// Reassemble atoms into source text and evaluate it.
    pub fn eval_atoms(&mut self, atoms: &[Atom]) -> EvalResult {
        let source = atoms_to_source(atoms);
        self.eval_string(&source)
    }

    /// Evaluate source text, posting the result or the error.
    pub fn eval_string(&mut self, source: &str) -> EvalResult {
        let outcome = self.interpreter.eval_source(source, &mut self.context);
        self.settle(source, outcome)
    }

    fn dispatch(&mut self, selector: &str, atoms: &[Atom]) -> EvalResult {
        let mut call = Vec::with_capacity(atoms.len() + 1);
        call.push(Value::symbol(selector));
        call.extend(atoms.iter().map(atom_to_value));
        let expr = Value::list(call);
        let outcome = self.interpreter.eval(&expr, &mut self.context);
        self.settle(&expr.to_string(), outcome)
    }

    fn settle(&mut self, text: &str, outcome: EvalResult) -> EvalResult {
        match &outcome {
            Ok(value) => self.post_result(value),
            Err(err) => self.post_failure(text, err),
        }
        outcome
    }

    fn read(&mut self, atoms: &[Atom]) -> EvalResult {
        let Some(name) = atoms.first() else {
            let err = EvalError::Syntax("read expects a file name".into());
            self.post_failure("read", &err);
            return Err(err);
        };
        let name = trim_quotes(&name.to_string()).to_string();
        let value = self.load(&name)?;
        info!(name, "script read");
        Ok(value)
    }

    fn set_flag(
        &mut self,
        selector: &str,
        atoms: &[Atom],
        apply: fn(&mut Self, bool),
    ) -> EvalResult {
        match atoms.first().and_then(Atom::as_float) {
            Some(value) => {
                apply(self, value != 0.0);
                Ok(Value::Unspecified)
            }
            None => {
                let err = EvalError::Syntax(format!("{selector} expects 0 or 1"));
                self.post_failure(selector, &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::host::{HostEvent, SimHost};

    fn bridge() -> (Bridge<SimHost>, SimHost) {
        let host = SimHost::new();
        let bridge = Bridge::new(host.clone(), BridgeConfig::default()).expect("bridge");
        (bridge, host)
    }

    fn line(bridge: &mut Bridge<SimHost>, text: &str) -> EvalResult {
        let atoms = Atom::parse_line(text);
        let (selector, rest) = atoms.split_first().expect("selector");
        bridge.handle_message(&selector.to_string(), rest)
    }

    #[test]
    fn eval_messages_reassemble_source() {
        let (mut bridge, host) = bridge();
        let value = line(&mut bridge, "eval (string-append \"a b\" \"c\")").expect("eval");
        assert_eq!(value, Value::string("a bc"));
        assert_eq!(host.console(), vec!["s4pd> \"a bc\""]);
    }

    #[test]
    fn parenthesised_selectors_are_code() {
        let (mut bridge, _host) = bridge();
        assert_eq!(line(&mut bridge, "(+ 1 2)").expect("eval"), Value::Integer(3));
    }

    #[test]
    fn plain_selectors_call_functions() {
        let (mut bridge, host) = bridge();
        line(&mut bridge, "(define (note pitch vel) (output! 0 pitch vel 'on))").expect("define");
        line(&mut bridge, "note 60 0.5").expect("call");
        assert!(host.events().contains(&HostEvent::Outlet {
            index: 0,
            atoms: vec![Atom::float(60.0), Atom::float(0.5), Atom::symbol("on")],
        }));
    }

    #[test]
    fn quoted_symbol_arguments_stay_inert() {
        let (mut bridge, _host) = bridge();
        line(&mut bridge, "(define (id x) x)").expect("define");
        let quoted = line(&mut bridge, "id 'undefined-name").expect("call");
        assert_eq!(quoted, Value::symbol("undefined-name"));
        assert!(line(&mut bridge, "id undefined-name").is_err());
    }

    #[test]
    fn log_flags_gate_posting() {
        let (mut bridge, host) = bridge();
        line(&mut bridge, "(quote sym)").expect("eval");
        assert!(host.console().is_empty());
        line(&mut bridge, "log-null 1").expect("flag");
        line(&mut bridge, "(quote sym)").expect("eval");
        assert_eq!(host.console(), vec!["s4pd> sym"]);
        line(&mut bridge, "log-repl 0").expect("flag");
        line(&mut bridge, "(+ 1 1)").expect("eval");
        assert_eq!(host.console().len(), 1);
        assert!(line(&mut bridge, "log-repl").is_err());
    }

    #[test]
    fn reset_cancels_delays_and_forgets_definitions() {
        let (mut bridge, host) = bridge();
        line(&mut bridge, "(define x 1)").expect("define");
        line(&mut bridge, "(schedule-delay! 10 (lambda () (post \"late\")))").expect("schedule");
        line(&mut bridge, "reset").expect("reset");
        assert_eq!(host.pending_timers(), 0);
        assert!(line(&mut bridge, "x").is_err());
        bridge.advance(20.0);
        assert!(!host.console().iter().any(|text| text == "late"));
    }

    #[test]
    fn oversized_messages_are_refused() {
        let host = SimHost::new();
        let config = BridgeConfig {
            max_atoms_per_message: 3,
            ..BridgeConfig::default()
        };
        let mut bridge = Bridge::new(host.clone(), config).expect("bridge");
        let err = line(&mut bridge, "eval (+ 1 2 3)").expect_err("too many");
        assert_eq!(err.tag().as_str(), "too-many-atoms");
        assert!(host.console()[0].contains("E109"));
    }
}

//==================================================
// End of file
//==================================================
