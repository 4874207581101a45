//==================================================
// File: bridge/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: One bridge instance between a host object and its interpreter
// Objective: Own the interpreter, the delay registry and the host handle,
//            deliver timer firings, and cancel everything before teardown
//==================================================

mod pipeline;
mod primitives;

use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::errors::{BridgeError, ErrorCode};
use crate::host::{Host, SimHost};
use crate::interpreter::{EvalError, EvalResult, Interpreter, Value};
use crate::schedule::{DelayHandle, OwnerId, ScheduleRegistry};

/// Everything a primitive may touch while a script runs.
pub(crate) struct HostContext<H> {
    pub(crate) host: H,
    pub(crate) registry: ScheduleRegistry,
    pub(crate) config: BridgeConfig,
    pub(crate) owner: OwnerId,
}

//==================================================
// Section 1.0 - Bridge
//==================================================

pub struct Bridge<H: Host> {
    interpreter: Interpreter<HostContext<H>>,
    context: HostContext<H>,
}

impl<H: Host> Bridge<H> {
    /// Create a bridge and run the bootstrap file, if one is configured.
    /// A bootstrap that fails to load is reported on the console; the
    /// bridge is still usable.
    pub fn new(host: H, config: BridgeConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let owner = OwnerId::next();
        let mut bridge = Self {
            interpreter: build_interpreter(),
            context: HostContext {
                host,
                registry: ScheduleRegistry::new(),
                config,
                owner,
            },
        };
        info!(owner = owner.raw(), outlets = bridge.context.config.outlets, "bridge created");
        bridge.bootstrap();
        Ok(bridge)
    }

    pub fn host(&self) -> &H {
        &self.context.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.context.host
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.context.config
    }

    pub fn registry(&self) -> &ScheduleRegistry {
        &self.context.registry
    }

    pub fn owner(&self) -> OwnerId {
        self.context.owner
    }

    pub fn pending_delays(&self) -> usize {
        self.context.registry.pending_for(self.context.owner).len()
    }

    pub fn set_log_repl(&mut self, enabled: bool) {
        self.context.config.log_repl = enabled;
    }

    pub fn set_log_null(&mut self, enabled: bool) {
        self.context.config.log_null = enabled;
    }

    /// Bind a global in the interpreter.
    pub fn define(&mut self, name: &str, value: Value) {
        self.interpreter.define_global(name, value);
    }

    /// Evaluate without posting anything. Errors are returned, not reported.
    pub fn eval_quiet(&mut self, source: &str) -> EvalResult {
        self.interpreter.eval_source(source, &mut self.context)
    }

    /// Resolve and evaluate a file through the host search path, posting a
    /// diagnostic on failure.
    pub fn load(&mut self, name: &str) -> Result<Value, BridgeError> {
        let loaded = primitives::load_file(&mut self.interpreter, &mut self.context, name);
        if let Err(err) = &loaded {
            warn!(name, error = %err, "load failed");
            self.post_error(err);
        }
        loaded
    }

    /// Cancel every delay this bridge scheduled.
    pub fn cancel_all(&mut self) -> usize {
        let context = &mut self.context;
        context.registry.cancel_all(&mut context.host, context.owner)
    }

    /// Drop all pending delays and start over with a fresh interpreter.
    pub fn reset(&mut self) {
        let cancelled = self.cancel_all();
        self.interpreter = build_interpreter();
        info!(owner = self.context.owner.raw(), cancelled, "bridge reset");
        self.bootstrap();
    }

    //==================================================
    // Section 2.0 - Timer delivery
    //==================================================

    /// Called by the host when the timer armed for `handle` elapses. The
    /// entry leaves the registry before its callback runs; callback errors
    /// are posted and never reach the caller.
    pub fn on_timer_fire(&mut self, handle: DelayHandle) {
        match self.context.registry.owner_of(handle) {
            Some(owner) if owner == self.context.owner => {}
            Some(_) => {
                warn!(%handle, "timer fired for a delay owned by another bridge");
                return;
            }
            None => {
                warn!(%handle, "timer fired for a delay that is no longer pending");
                return;
            }
        }
        let Some(entry) = self.context.registry.take_fired(handle) else {
            return;
        };
        let outcome = self.run_callback(&entry.callback);
        if let Err(err) = outcome {
            let text = format!("delay {handle} ({})", entry.callback);
            self.post_failure(&text, &err);
        }
    }

    fn run_callback(&mut self, callback: &Value) -> EvalResult {
        let context = &mut self.context;
        match callback {
            Value::Procedure(_) => self.interpreter.apply(callback, Vec::new(), context),
            Value::Str(source) => self.interpreter.eval_source(source, context),
            Value::Symbol(_) => {
                let target = self.interpreter.eval(callback, context)?;
                if target.is_procedure() {
                    self.interpreter.apply(&target, Vec::new(), context)
                } else {
                    Ok(target)
                }
            }
            other => self.interpreter.eval(other, context),
        }
    }

    //==================================================
    // Section 3.0 - Diagnostics
    //==================================================

    fn bootstrap(&mut self) {
        if let Some(name) = self.context.config.bootstrap.clone() {
            let _ = self.load(&name);
        }
    }

    fn post_result(&mut self, value: &Value) {
        let config = &self.context.config;
        if !config.log_repl {
            return;
        }
        let uninteresting = matches!(value, Value::Null | Value::Unspecified | Value::Symbol(_));
        if uninteresting && !config.log_null {
            return;
        }
        self.context.host.post(&format!("s4pd> {value}"));
    }

    fn post_error(&mut self, err: &BridgeError) {
        self.context
            .host
            .error(&format!("s4pd: {} {err}", err.code_str()));
    }

    /// Report a failed evaluation of `text`. Primitive failures keep their
    /// own code; everything else is an evaluation error.
    fn post_failure(&mut self, text: &str, err: &EvalError) {
        let code = match err {
            EvalError::Bridge(inner) => inner.code_str(),
            _ => ErrorCode::Evaluation.as_str(),
        };
        let failure = BridgeError::Evaluation {
            text: text.to_string(),
            message: err.to_string(),
        };
        warn!(code, error = %err, "evaluation failed");
        self.context.host.error(&format!("s4pd: {code} {failure}"));
    }
}

impl<H: Host> Drop for Bridge<H> {
    fn drop(&mut self) {
        let cancelled = self.cancel_all();
        info!(owner = self.context.owner.raw(), cancelled, "bridge torn down");
    }
}

fn build_interpreter<H: Host>() -> Interpreter<HostContext<H>> {
    let mut interpreter = Interpreter::new();
    primitives::install(&mut interpreter);
    interpreter
}

//==================================================
// Section 4.0 - Simulated host driving
//==================================================

impl Bridge<SimHost> {
    /// Move the virtual clock forward by `ms`, firing every timer that falls
    /// due on the way in deadline order. Returns the number fired.
    pub fn advance(&mut self, ms: f64) -> usize {
        let until = self.host().now() + ms;
        let owner = self.owner();
        let mut fired = 0;
        while let Some(handle) = self.host().pop_due(owner, until) {
            self.on_timer_fire(handle);
            fired += 1;
        }
        self.host().advance_clock_to(until);
        fired
    }

    /// Fire this bridge's timers until none are left or the next one lies
    /// past `limit_ms` of absolute virtual time.
    pub fn run_until_idle(&mut self, limit_ms: f64) -> usize {
        let owner = self.owner();
        let mut fired = 0;
        while let Some(deadline) = self.host().next_deadline(owner) {
            if deadline > limit_ms {
                break;
            }
            if let Some(handle) = self.host().pop_due(owner, deadline) {
                self.on_timer_fire(handle);
                fired += 1;
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostEvent;

    fn bridge() -> (Bridge<SimHost>, SimHost) {
        let host = SimHost::new();
        let bridge = Bridge::new(host.clone(), BridgeConfig::default()).expect("bridge");
        (bridge, host)
    }

    #[test]
    fn callbacks_run_with_the_entry_already_gone() {
        let (mut bridge, host) = bridge();
        bridge
            .eval_quiet(
                "(define seen '())
                 (define (tick) (set! seen (cons (length seen) seen))
                   (if (< (length seen) 3) (schedule-delay! 10 tick)))
                 (schedule-delay! 10 tick)",
            )
            .expect("schedule");
        assert_eq!(bridge.advance(100.0), 3);
        assert_eq!(bridge.eval_quiet("seen").expect("seen").to_string(), "(2 1 0)");
        assert_eq!(bridge.pending_delays(), 0);
        assert!(bridge.registry().links_consistent());
        assert!(host.console().is_empty());
    }

    #[test]
    fn callback_kinds() {
        let (mut bridge, host) = bridge();
        bridge
            .eval_quiet(
                "(define (hello) (post \"proc\"))
                 (schedule-delay! 1 hello)
                 (schedule-delay! 2 \"(post \\\"string\\\")\")
                 (schedule-delay! 3 '(post \"list\"))
                 (schedule-delay! 4 'hello)",
            )
            .expect("schedule");
        bridge.advance(10.0);
        assert_eq!(host.console(), vec!["proc", "string", "list", "proc"]);
    }

    #[test]
    fn callback_errors_are_posted_not_propagated() {
        let (mut bridge, host) = bridge();
        bridge
            .eval_quiet("(schedule-delay! 5 (lambda () (car '())))")
            .expect("schedule");
        assert_eq!(bridge.advance(5.0), 1);
        let events = host.events().to_vec();
        assert!(matches!(&events[..], [HostEvent::Error(text)] if text.contains("E107")));
    }

    #[test]
    fn stale_firings_are_ignored() {
        let (mut bridge, host) = bridge();
        let value = bridge
            .eval_quiet("(schedule-delay! 5 (lambda () (post \"late\")))")
            .expect("schedule");
        let handle = DelayHandle::parse(&value.to_string()).expect("handle");
        assert_eq!(bridge.cancel_all(), 1);
        bridge.on_timer_fire(handle);
        assert!(host.events().is_empty());
    }

    #[test]
    fn dropping_the_bridge_disarms_every_timer() {
        let (mut bridge, host) = bridge();
        bridge
            .eval_quiet("(schedule-delay! 5 'x) (schedule-delay! 50 'y)")
            .expect("schedule");
        assert_eq!(host.pending_timers(), 2);
        drop(bridge);
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn invalid_outlet_count_is_rejected() {
        let config = BridgeConfig {
            outlets: 0,
            ..BridgeConfig::default()
        };
        assert!(Bridge::new(SimHost::new(), config).is_err());
    }
}

//==================================================
// End of file
//==================================================
