//==================================================
// File: host/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Host collaborator contracts
// Objective: Describe what the bridge needs from the surrounding patch
//            environment: one-shot timers, outlets, receivers, tables,
//            console output and file search
//==================================================

pub mod search_path;
pub mod sim;

use std::path::PathBuf;

use crate::atom::Atom;
use crate::errors::BridgeError;
use crate::schedule::{DelayHandle, OwnerId};

pub use search_path::SearchPath;
pub use sim::{HostEvent, SimHost};

/// Host-side identity of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

//==================================================
// Section 1.0 - Timers
//==================================================

/// One-shot timer capability. An armed timer is delivered back to the bridge
/// of the owner that armed it, exactly once, on the control thread, through
/// `Bridge::on_timer_fire` with the handle it was armed with, unless it is
/// disarmed first. Handles are only unique per owner.
pub trait Timers {
    fn arm_timer(&mut self, delay_ms: f64, owner: OwnerId, handle: DelayHandle) -> TimerId;
    fn disarm_timer(&mut self, timer: TimerId);
}

//==================================================
// Section 2.0 - Host
//==================================================

pub trait Host: Timers {
    /// Emit atoms downstream from outlet `index`. The bridge has already
    /// checked the index against its outlet count.
    fn outlet(&mut self, index: usize, atoms: &[Atom]);

    /// Route a message to a named receiver, independent of patch wiring.
    fn send(&mut self, receiver: &str, atoms: &[Atom]) -> Result<(), BridgeError>;

    /// Current length of a named array, or `None` if no such array exists.
    fn table_len(&self, table: &str) -> Option<usize>;

    fn table_read(&self, table: &str, index: usize) -> Result<f32, BridgeError>;

    fn table_write(&mut self, table: &str, index: usize, value: f32) -> Result<(), BridgeError>;

    /// Ordinary console line.
    fn post(&mut self, text: &str);

    /// Console line flagged as an error.
    fn error(&mut self, text: &str);

    /// Find a file on the host's search path.
    fn resolve_path(&mut self, name: &str) -> Option<PathBuf>;
}

//==================================================
// End of file
//==================================================
