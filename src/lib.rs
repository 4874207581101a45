//==================================================
// File: lib.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: s4pd library root
// Objective: Bridge a message-driven patch host and an embedded Scheme
//            interpreter: atom conversion, delayed callbacks, host primitives
//            and the per-message evaluation path
//==================================================

pub mod atom;
pub mod bridge;
pub mod codec;
pub mod config;
pub mod errors;
pub mod host;
pub mod interpreter;
pub mod logging;
pub mod schedule;

pub use atom::Atom;
pub use bridge::Bridge;
pub use config::{BridgeConfig, Config, HostConfig};
pub use errors::{BridgeError, ConversionError, ErrorCode};
pub use host::{Host, HostEvent, SimHost, TimerId, Timers};
pub use interpreter::{EvalError, EvalResult, Interpreter, Value};
pub use schedule::{DelayHandle, OwnerId, ScheduleRegistry};

//==================================================
// End of file
//==================================================
