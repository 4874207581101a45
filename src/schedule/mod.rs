//==================================================
// File: schedule/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Registry of pending one-shot delayed callbacks
// Objective: Own every pending entry in insertion order, arm and disarm host
//            timers, and hand each callback out at most once
//==================================================

pub mod arena;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::errors::BridgeError;
use crate::host::{TimerId, Timers};
use crate::interpreter::Value;

use arena::{Arena, SlotKey};

//==================================================
// Section 1.0 - Identities
//==================================================

/// Opaque reference to a pending delay. A handle whose entry has fired or
/// been cancelled never matches again, even after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelayHandle {
    index: u32,
    generation: u32,
}

impl DelayHandle {
    const PREFIX: &'static str = "delay:";

    /// Parse the script-visible form produced by `Display`.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.strip_prefix(Self::PREFIX)?;
        let (index, generation) = rest.split_once(':')?;
        Some(Self {
            index: index.parse().ok()?,
            generation: generation.parse().ok()?,
        })
    }

    fn key(self) -> SlotKey {
        SlotKey {
            index: self.index,
            generation: self.generation,
        }
    }
}

impl From<SlotKey> for DelayHandle {
    fn from(key: SlotKey) -> Self {
        Self {
            index: key.index,
            generation: key.generation,
        }
    }
}

impl fmt::Display for DelayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", Self::PREFIX, self.index, self.generation)
    }
}

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Identity of the bridge instance that scheduled an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    pub fn next() -> Self {
        Self(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

//==================================================
// Section 2.0 - Entries
//==================================================

#[derive(Debug)]
pub struct ScheduleEntry {
    pub handle: DelayHandle,
    pub owner: OwnerId,
    pub callback: Value,
    pub timer: TimerId,
    prev: Option<u32>,
    next: Option<u32>,
}

//==================================================
// Section 3.0 - Registry
//==================================================

#[derive(Debug, Default)]
pub struct ScheduleRegistry {
    entries: Arena<ScheduleEntry>,
    head: Option<u32>,
    tail: Option<u32>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain `callback`, append it to the list and arm a host timer for it.
    pub fn schedule(
        &mut self,
        timers: &mut dyn Timers,
        owner: OwnerId,
        delay_ms: f64,
        callback: Value,
    ) -> Result<DelayHandle, BridgeError> {
        if !delay_ms.is_finite() || delay_ms < 0.0 {
            return Err(BridgeError::InvalidDelay(delay_ms));
        }
        let prev = self.tail;
        let key = self.entries.insert_with(|key| {
            let handle = DelayHandle::from(key);
            ScheduleEntry {
                handle,
                owner,
                callback,
                timer: timers.arm_timer(delay_ms, owner, handle),
                prev,
                next: None,
            }
        });
        match prev.and_then(|index| self.entries.at_mut(index)) {
            Some(last) => last.next = Some(key.index),
            None => self.head = Some(key.index),
        }
        self.tail = Some(key.index);

        let handle = DelayHandle::from(key);
        debug!(%handle, delay_ms, owner = owner.raw(), "delay scheduled");
        Ok(handle)
    }

    /// Disarm and drop a pending entry. Unknown, fired and already
    /// cancelled handles return `false`.
    pub fn cancel(&mut self, timers: &mut dyn Timers, handle: DelayHandle) -> bool {
        match self.unlink(handle) {
            Some(entry) => {
                timers.disarm_timer(entry.timer);
                debug!(%handle, "delay cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every entry belonging to `owner`, returning how many there were.
    pub fn cancel_all(&mut self, timers: &mut dyn Timers, owner: OwnerId) -> usize {
        let mut cancelled = 0;
        for handle in self.pending_for(owner) {
            if self.cancel(timers, handle) {
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            debug!(owner = owner.raw(), cancelled, "all delays cancelled");
        }
        cancelled
    }

    /// Remove the entry for a timer that has just elapsed and hand back its
    /// callback. The entry is gone before the caller runs anything, so the
    /// callback may schedule and cancel freely.
    pub fn take_fired(&mut self, handle: DelayHandle) -> Option<ScheduleEntry> {
        let entry = self.unlink(handle)?;
        debug!(%handle, "delay fired");
        Some(entry)
    }

    fn unlink(&mut self, handle: DelayHandle) -> Option<ScheduleEntry> {
        let entry = self.entries.remove(handle.key())?;
        match entry.prev.and_then(|index| self.entries.at_mut(index)) {
            Some(prev) => prev.next = entry.next,
            None => self.head = entry.next,
        }
        match entry.next.and_then(|index| self.entries.at_mut(index)) {
            Some(next) => next.prev = entry.prev,
            None => self.tail = entry.prev,
        }
        Some(entry)
    }

    /// Owner of a pending entry.
    pub fn owner_of(&self, handle: DelayHandle) -> Option<OwnerId> {
        self.entries.get(handle.key()).map(|entry| entry.owner)
    }

    pub fn contains(&self, handle: DelayHandle) -> bool {
        self.entries.get(handle.key()).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            registry: self,
            cursor: self.head,
        }
    }

    pub fn pending_for(&self, owner: OwnerId) -> Vec<DelayHandle> {
        self.iter()
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.handle)
            .collect()
    }

    /// Walk the list both ways and check neighbours agree with each other and
    /// with the entry count.
    pub fn links_consistent(&self) -> bool {
        let mut forward = 0usize;
        let mut expected_prev = None;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let Some(entry) = self.entries.at(index) else {
                return false;
            };
            if entry.prev != expected_prev || forward > self.len() {
                return false;
            }
            forward += 1;
            expected_prev = Some(index);
            cursor = entry.next;
        }
        expected_prev == self.tail && forward == self.len()
    }
}

pub struct Iter<'a> {
    registry: &'a ScheduleRegistry,
    cursor: Option<u32>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ScheduleEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.registry.entries.at(self.cursor?)?;
        self.cursor = entry.next;
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeTimers {
        next: u64,
        armed: HashMap<TimerId, (f64, OwnerId, DelayHandle)>,
        disarmed: Vec<TimerId>,
    }

    impl Timers for FakeTimers {
        fn arm_timer(&mut self, delay_ms: f64, owner: OwnerId, handle: DelayHandle) -> TimerId {
            self.next += 1;
            let timer = TimerId(self.next);
            self.armed.insert(timer, (delay_ms, owner, handle));
            timer
        }

        fn disarm_timer(&mut self, timer: TimerId) {
            self.armed.remove(&timer);
            self.disarmed.push(timer);
        }
    }

    fn callback(n: i64) -> Value {
        Value::Integer(n)
    }

    #[test]
    fn handles_display_and_parse() {
        let mut timers = FakeTimers::default();
        let mut registry = ScheduleRegistry::new();
        let handle = registry
            .schedule(&mut timers, OwnerId::next(), 5.0, callback(1))
            .expect("schedule");
        let text = handle.to_string();
        assert!(text.starts_with("delay:"));
        assert_eq!(DelayHandle::parse(&text), Some(handle));
        assert_eq!(DelayHandle::parse("delay:x:1"), None);
        assert_eq!(DelayHandle::parse("foo"), None);
    }

    #[test]
    fn negative_and_non_finite_delays_are_rejected() {
        let mut timers = FakeTimers::default();
        let mut registry = ScheduleRegistry::new();
        let owner = OwnerId::next();
        for delay in [-1.0, f64::NAN, f64::INFINITY] {
            let err = registry
                .schedule(&mut timers, owner, delay, callback(0))
                .expect_err("invalid");
            assert!(matches!(err, BridgeError::InvalidDelay(_)));
        }
        assert!(registry.is_empty());
        assert!(timers.armed.is_empty());
        assert!(registry.schedule(&mut timers, owner, 0.0, callback(0)).is_ok());
    }

    #[test]
    fn cancel_disarms_and_is_idempotent() {
        let mut timers = FakeTimers::default();
        let mut registry = ScheduleRegistry::new();
        let owner = OwnerId::next();
        let handle = registry
            .schedule(&mut timers, owner, 50.0, callback(1))
            .expect("schedule");
        assert_eq!(timers.armed.values().next().map(|armed| armed.1), Some(owner));
        assert_eq!(registry.owner_of(handle), Some(owner));
        assert!(registry.cancel(&mut timers, handle));
        assert_eq!(registry.owner_of(handle), None);
        assert!(timers.armed.is_empty());
        assert!(!registry.cancel(&mut timers, handle));
        assert_eq!(timers.disarmed.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn fired_entries_leave_before_the_callback_runs() {
        let mut timers = FakeTimers::default();
        let mut registry = ScheduleRegistry::new();
        let owner = OwnerId::next();
        let a = registry.schedule(&mut timers, owner, 10.0, callback(1)).expect("a");
        let b = registry.schedule(&mut timers, owner, 20.0, callback(2)).expect("b");
        let fired = registry.take_fired(a).expect("pending");
        assert_eq!(fired.callback, Value::Integer(1));
        assert!(!registry.contains(a));
        assert!(registry.take_fired(a).is_none());
        assert!(!registry.cancel(&mut timers, a));
        assert!(registry.contains(b));
        assert!(registry.links_consistent());
    }

    #[test]
    fn stale_handles_do_not_touch_reused_slots() {
        let mut timers = FakeTimers::default();
        let mut registry = ScheduleRegistry::new();
        let owner = OwnerId::next();
        let old = registry.schedule(&mut timers, owner, 1.0, callback(1)).expect("old");
        assert!(registry.cancel(&mut timers, old));
        let new = registry.schedule(&mut timers, owner, 1.0, callback(2)).expect("new");
        assert_ne!(old, new);
        assert!(!registry.cancel(&mut timers, old));
        assert!(registry.contains(new));
    }

    #[test]
    fn cancel_all_only_touches_one_owner() {
        let mut timers = FakeTimers::default();
        let mut registry = ScheduleRegistry::new();
        let mine = OwnerId::next();
        let theirs = OwnerId::next();
        for n in 0..4 {
            registry.schedule(&mut timers, mine, 1.0, callback(n)).expect("mine");
            registry.schedule(&mut timers, theirs, 1.0, callback(n)).expect("theirs");
        }
        assert_eq!(registry.cancel_all(&mut timers, mine), 4);
        assert!(registry.pending_for(mine).is_empty());
        assert_eq!(registry.pending_for(theirs).len(), 4);
        assert_eq!(timers.armed.len(), 4);
        assert!(registry.links_consistent());
        assert_eq!(registry.cancel_all(&mut timers, mine), 0);
    }

    #[test]
    fn links_stay_consistent_under_interleaving() {
        let mut timers = FakeTimers::default();
        let mut registry = ScheduleRegistry::new();
        let owner = OwnerId::next();
        let mut live: Vec<DelayHandle> = Vec::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for step in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let roll = (seed >> 33) as usize;
            if live.is_empty() || roll % 3 != 0 {
                let handle = registry
                    .schedule(&mut timers, owner, (roll % 100) as f64, callback(step))
                    .expect("schedule");
                live.push(handle);
            } else {
                let victim = live.swap_remove(roll % live.len());
                if roll % 2 == 0 {
                    assert!(registry.cancel(&mut timers, victim));
                } else {
                    assert!(registry.take_fired(victim).is_some());
                }
            }
            assert!(registry.links_consistent(), "broken after step {step}");
            assert_eq!(registry.len(), live.len());
        }
        registry.cancel_all(&mut timers, owner);
        assert!(registry.is_empty());
        assert!(registry.links_consistent());
        assert_eq!(registry.iter().count(), 0);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut timers = FakeTimers::default();
        let mut registry = ScheduleRegistry::new();
        let owner = OwnerId::next();
        let handles: Vec<_> = [30.0, 10.0, 20.0]
            .into_iter()
            .map(|delay| registry.schedule(&mut timers, owner, delay, callback(0)).expect("ok"))
            .collect();
        registry.cancel(&mut timers, handles[1]);
        let order: Vec<_> = registry.iter().map(|entry| entry.handle).collect();
        assert_eq!(order, vec![handles[0], handles[2]]);
    }
}

//==================================================
// End of file
//==================================================
