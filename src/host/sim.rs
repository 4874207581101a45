//==================================================
// File: host/sim.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: In-process simulated patch host
// Objective: Provide a virtual clock, named tables, named receivers and an
//            ordered event log so the bridge can run outside a real host
//==================================================

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::atom::{Atom, join};
use crate::config::HostConfig;
use crate::errors::BridgeError;
use crate::schedule::{DelayHandle, OwnerId};

use super::{Host, SearchPath, TimerId, Timers};

// Virtual time is kept in microsecond ticks so deadlines order exactly.
const TICKS_PER_MS: f64 = 1000.0;

fn ms_to_ticks(ms: f64) -> u64 {
    (ms * TICKS_PER_MS).round().max(0.0) as u64
}

fn ticks_to_ms(ticks: u64) -> f64 {
    ticks as f64 / TICKS_PER_MS
}

//==================================================
// Section 1.0 - Events
//==================================================

/// Everything the bridge asked the host to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Outlet { index: usize, atoms: Vec<Atom> },
    Send { receiver: String, atoms: Vec<Atom> },
    Post(String),
    Error(String),
}

impl std::fmt::Display for HostEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostEvent::Outlet { index, atoms } => write!(f, "outlet {index}: {}", join(atoms)),
            HostEvent::Send { receiver, atoms } => {
                write!(f, "send {receiver}: {}", join(atoms))
            }
            HostEvent::Post(text) => write!(f, "post: {text}"),
            HostEvent::Error(text) => write!(f, "error: {text}"),
        }
    }
}

//==================================================
// Section 2.0 - Shared State
//==================================================

#[derive(Debug, Default)]
struct SimState {
    now: u64,
    next_timer: u64,
    // Keyed by (deadline, arm order) so equal deadlines fire in arm order.
    timers: BTreeMap<(u64, u64), (OwnerId, DelayHandle)>,
    deadlines: HashMap<TimerId, u64>,
    tables: HashMap<String, Vec<f32>>,
    receivers: HashSet<String>,
    search: SearchPath,
    events: Vec<HostEvent>,
}

/// Cheap handle onto the simulated host. Clones share one state, so a test
/// can keep a copy and inspect it after the bridge that owns the other copy
/// is gone.
#[derive(Debug, Clone, Default)]
pub struct SimHost {
    state: Rc<RefCell<SimState>>,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &HostConfig) -> Self {
        let host = Self::new();
        {
            let mut state = host.state.borrow_mut();
            state.search = SearchPath::new(config.search_paths.iter().cloned());
            for (name, len) in &config.tables {
                state.tables.insert(name.clone(), vec![0.0; *len]);
            }
            state.receivers.extend(config.receivers.iter().cloned());
        }
        host
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> f64 {
        ticks_to_ms(self.state.borrow().now)
    }

    /// Move the clock forward to `ms`; never backwards.
    pub fn advance_clock_to(&self, ms: f64) {
        let state = &mut *self.state.borrow_mut();
        state.now = state.now.max(ms_to_ticks(ms));
    }

    pub fn add_table(&self, name: &str, len: usize) {
        self.set_table(name, vec![0.0; len]);
    }

    pub fn set_table(&self, name: &str, samples: Vec<f32>) {
        self.state.borrow_mut().tables.insert(name.to_string(), samples);
    }

    pub fn table(&self, name: &str) -> Option<Vec<f32>> {
        self.state.borrow().tables.get(name).cloned()
    }

    pub fn add_receiver(&self, name: &str) {
        self.state.borrow_mut().receivers.insert(name.to_string());
    }

    pub fn add_search_path(&self, root: impl AsRef<Path>) {
        self.state.borrow_mut().search.add_root(root);
    }

    pub fn events(&self) -> Ref<'_, [HostEvent]> {
        Ref::map(self.state.borrow(), |state| state.events.as_slice())
    }

    pub fn take_events(&self) -> Vec<HostEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    /// Console lines posted so far, errors included.
    pub fn console(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                HostEvent::Post(text) | HostEvent::Error(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Earliest deadline among the timers armed for `owner`.
    pub fn next_deadline(&self, owner: OwnerId) -> Option<f64> {
        let state = self.state.borrow();
        state
            .timers
            .iter()
            .find(|(_, (armed_for, _))| *armed_for == owner)
            .map(|((deadline, _), _)| ticks_to_ms(*deadline))
    }

    /// Pop the earliest timer armed for `owner` that is due at or before
    /// `until_ms`, moving the clock to its deadline. Other owners' timers
    /// stay armed; each bridge drains its own.
    pub fn pop_due(&self, owner: OwnerId, until_ms: f64) -> Option<DelayHandle> {
        let state = &mut *self.state.borrow_mut();
        let until = ms_to_ticks(until_ms);
        let key = state
            .timers
            .iter()
            .take_while(|((deadline, _), _)| *deadline <= until)
            .find(|(_, (armed_for, _))| *armed_for == owner)
            .map(|(key, _)| *key)?;
        let (_, handle) = state.timers.remove(&key)?;
        let (deadline, seq) = key;
        state.deadlines.remove(&TimerId(seq));
        state.now = state.now.max(deadline);
        Some(handle)
    }

    fn push(&self, event: HostEvent) {
        self.state.borrow_mut().events.push(event);
    }
}

//==================================================
// Section 3.0 - Host Contract
//==================================================

impl Timers for SimHost {
    fn arm_timer(&mut self, delay_ms: f64, owner: OwnerId, handle: DelayHandle) -> TimerId {
        let state = &mut *self.state.borrow_mut();
        state.next_timer += 1;
        let seq = state.next_timer;
        let deadline = state.now.saturating_add(ms_to_ticks(delay_ms));
        state.timers.insert((deadline, seq), (owner, handle));
        state.deadlines.insert(TimerId(seq), deadline);
        TimerId(seq)
    }

    fn disarm_timer(&mut self, timer: TimerId) {
        let state = &mut *self.state.borrow_mut();
        if let Some(deadline) = state.deadlines.remove(&timer) {
            state.timers.remove(&(deadline, timer.0));
        }
    }
}

impl Host for SimHost {
    fn outlet(&mut self, index: usize, atoms: &[Atom]) {
        self.push(HostEvent::Outlet {
            index,
            atoms: atoms.to_vec(),
        });
    }

    fn send(&mut self, receiver: &str, atoms: &[Atom]) -> Result<(), BridgeError> {
        if !self.state.borrow().receivers.contains(receiver) {
            return Err(BridgeError::UnknownReceiver(receiver.to_string()));
        }
        self.push(HostEvent::Send {
            receiver: receiver.to_string(),
            atoms: atoms.to_vec(),
        });
        Ok(())
    }

    fn table_len(&self, table: &str) -> Option<usize> {
        self.state.borrow().tables.get(table).map(Vec::len)
    }

    fn table_read(&self, table: &str, index: usize) -> Result<f32, BridgeError> {
        let state = self.state.borrow();
        let samples = state
            .tables
            .get(table)
            .ok_or_else(|| BridgeError::TableNotFound(table.to_string()))?;
        samples
            .get(index)
            .copied()
            .ok_or_else(|| BridgeError::IndexOutOfRange {
                table: table.to_string(),
                index: index as i64,
                len: samples.len(),
            })
    }

    fn table_write(&mut self, table: &str, index: usize, value: f32) -> Result<(), BridgeError> {
        let mut state = self.state.borrow_mut();
        let samples = state
            .tables
            .get_mut(table)
            .ok_or_else(|| BridgeError::TableNotFound(table.to_string()))?;
        let len = samples.len();
        let slot = samples
            .get_mut(index)
            .ok_or_else(|| BridgeError::IndexOutOfRange {
                table: table.to_string(),
                index: index as i64,
                len,
            })?;
        *slot = value;
        Ok(())
    }

    fn post(&mut self, text: &str) {
        self.push(HostEvent::Post(text.to_string()));
    }

    fn error(&mut self, text: &str) {
        self.push(HostEvent::Error(text.to_string()));
    }

    fn resolve_path(&mut self, name: &str) -> Option<PathBuf> {
        self.state.borrow_mut().search.resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Value;
    use crate::schedule::ScheduleRegistry;

    fn handles(host: &mut SimHost, owner: OwnerId, delays: &[f64]) -> Vec<DelayHandle> {
        let mut registry = ScheduleRegistry::new();
        delays
            .iter()
            .map(|delay| {
                registry
                    .schedule(host, owner, *delay, Value::Null)
                    .expect("schedule")
            })
            .collect()
    }

    #[test]
    fn timers_pop_in_deadline_then_arm_order() {
        let mut host = SimHost::new();
        let owner = OwnerId::next();
        let h = handles(&mut host, owner, &[50.0, 10.0, 10.0]);
        assert_eq!(host.next_deadline(owner), Some(10.0));
        assert_eq!(host.pop_due(owner, 5.0), None);
        assert_eq!(host.pop_due(owner, 100.0), Some(h[1]));
        assert_eq!(host.pop_due(owner, 100.0), Some(h[2]));
        assert_eq!(host.now(), 10.0);
        assert_eq!(host.pop_due(owner, 100.0), Some(h[0]));
        assert_eq!(host.now(), 50.0);
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn timers_pop_only_for_the_owner_that_armed_them() {
        let mut host = SimHost::new();
        let (first, second) = (OwnerId::next(), OwnerId::next());
        let early = handles(&mut host, second, &[5.0]);
        let late = handles(&mut host, first, &[10.0]);
        // Both registries start from slot 0, so the handles collide.
        assert_eq!(early, late);
        assert_eq!(host.next_deadline(first), Some(10.0));
        assert_eq!(host.pop_due(first, 6.0), None);
        assert_eq!(host.now(), 0.0);
        assert_eq!(host.pop_due(second, 6.0), Some(early[0]));
        assert_eq!(host.pop_due(first, 10.0), Some(late[0]));
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn disarmed_timers_never_pop() {
        let mut host = SimHost::new();
        let owner = OwnerId::next();
        let handle = DelayHandle::parse("delay:0:0").expect("handle");
        let timer = host.arm_timer(1.0, owner, handle);
        host.disarm_timer(timer);
        host.disarm_timer(timer);
        assert_eq!(host.pop_due(owner, 10.0), None);
    }

    #[test]
    fn tables_report_missing_and_out_of_range() {
        let mut host = SimHost::new();
        host.add_table("arr", 2);
        host.table_write("arr", 1, 0.5).expect("write");
        assert_eq!(host.table_read("arr", 1), Ok(0.5));
        assert!(matches!(
            host.table_read("missing", 0),
            Err(BridgeError::TableNotFound(_))
        ));
        assert!(matches!(
            host.table_write("arr", 2, 1.0),
            Err(BridgeError::IndexOutOfRange { len: 2, .. })
        ));
    }

    #[test]
    fn sends_require_a_registered_receiver() {
        let mut host = SimHost::new();
        host.add_receiver("synth");
        host.send("synth", &[Atom::float(1.0)]).expect("send");
        assert!(matches!(
            host.send("nobody", &[]),
            Err(BridgeError::UnknownReceiver(_))
        ));
        assert_eq!(host.events().len(), 1);
        assert_eq!(host.events()[0].to_string(), "send synth: 1");
    }

    #[test]
    fn clones_share_state() {
        let host = SimHost::new();
        let mut other = host.clone();
        other.post("hello");
        assert_eq!(host.console(), vec!["hello".to_string()]);
        assert_eq!(host.take_events().len(), 1);
        assert!(other.events().is_empty());
    }
}

//==================================================
// End of file
//==================================================
