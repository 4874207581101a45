//==================================================
// File: bridge/primitives.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Host primitives exposed to scripts
// Objective: Validate arguments, reach the host and the delay registry, and
//            hand every failure back to the script as a catchable error
//==================================================

use std::fs;

use tracing::debug;

use crate::atom::Atom;
use crate::codec::{float_to_value, values_to_atoms};
use crate::errors::BridgeError;
use crate::host::Host;
use crate::interpreter::{Arity, EvalError, EvalResult, Interpreter, Value};
use crate::schedule::DelayHandle;

use super::HostContext;

type Interp<H> = Interpreter<HostContext<H>>;

pub(super) fn install<H: Host>(interp: &mut Interp<H>) {
    interp.register_native("output!", Arity::AtLeast(1), prim_output::<H>);
    interp.register_native("send!", Arity::AtLeast(1), prim_send::<H>);
    interp.register_native("table-read", Arity::Exact(2), prim_table_read::<H>);
    interp.register_native("table-write!", Arity::Exact(3), prim_table_write::<H>);
    interp.register_native("schedule-delay!", Arity::Exact(2), prim_schedule_delay::<H>);
    interp.register_native("cancel-delay!", Arity::Exact(1), prim_cancel_delay::<H>);
    interp.register_native("cancel-all!", Arity::Exact(0), prim_cancel_all::<H>);
    interp.register_native("load-from-path!", Arity::Exact(1), prim_load_from_path::<H>);
    interp.register_native("post", Arity::AtLeast(0), prim_post::<H>);
}

//==================================================
// Section 1.0 - Argument helpers
//==================================================

fn integer_arg(context: &str, value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Integer(n) => Ok(*n),
        Value::Real(n) if n.is_finite() => Ok(n.trunc() as i64),
        other => Err(EvalError::wrong_type(context, "an integer", other)),
    }
}

fn number_arg(context: &str, value: &Value) -> Result<f64, EvalError> {
    value
        .as_f64()
        .ok_or_else(|| EvalError::wrong_type(context, "a number", value))
}

fn name_arg<'v>(context: &str, value: &'v Value) -> Result<&'v str, EvalError> {
    match value {
        Value::Symbol(name) => Ok(name.as_str()),
        Value::Str(text) => Ok(text.as_ref()),
        other => Err(EvalError::wrong_type(context, "a symbol or string", other)),
    }
}

fn outgoing_atoms<H>(ctx: &HostContext<H>, values: &[Value]) -> Result<Vec<Atom>, BridgeError> {
    let atoms = values_to_atoms(values)?;
    let limit = ctx.config.max_atoms_per_output;
    if atoms.len() > limit {
        return Err(BridgeError::TooManyAtoms {
            count: atoms.len(),
            limit,
        });
    }
    Ok(atoms)
}

/// Resolve a table index: the table must exist before the index is judged.
fn table_slot<H: Host>(
    ctx: &HostContext<H>,
    table: &str,
    index: i64,
) -> Result<usize, BridgeError> {
    let len = ctx
        .host
        .table_len(table)
        .ok_or_else(|| BridgeError::TableNotFound(table.to_string()))?;
    match usize::try_from(index) {
        Ok(slot) if slot < len => Ok(slot),
        _ => Err(BridgeError::IndexOutOfRange {
            table: table.to_string(),
            index,
            len,
        }),
    }
}

//==================================================
// Section 2.0 - Output
//==================================================

/// `(output! index value...)`
fn prim_output<H: Host>(
    _: &mut Interp<H>,
    ctx: &mut HostContext<H>,
    args: Vec<Value>,
) -> EvalResult {
    let index = integer_arg("output!", &args[0])?;
    let outlets = ctx.config.outlets;
    let outlet = match usize::try_from(index) {
        Ok(outlet) if outlet < outlets => outlet,
        _ => return Err(BridgeError::OutletOutOfRange { index, outlets }.into()),
    };
    let atoms = outgoing_atoms(ctx, &args[1..])?;
    ctx.host.outlet(outlet, &atoms);
    Ok(Value::Unspecified)
}

/// `(send! 'receiver value...)`
fn prim_send<H: Host>(_: &mut Interp<H>, ctx: &mut HostContext<H>, args: Vec<Value>) -> EvalResult {
    let receiver = name_arg("send!", &args[0])?;
    let atoms = outgoing_atoms(ctx, &args[1..])?;
    ctx.host.send(receiver, &atoms)?;
    Ok(Value::Unspecified)
}

/// `(post value...)`: display forms, space separated.
fn prim_post<H: Host>(_: &mut Interp<H>, ctx: &mut HostContext<H>, args: Vec<Value>) -> EvalResult {
    let line = args
        .iter()
        .map(Value::display_string)
        .collect::<Vec<_>>()
        .join(" ");
    ctx.host.post(&line);
    Ok(Value::Unspecified)
}

//==================================================
// Section 3.0 - Tables
//==================================================

/// `(table-read 'name index)`
fn prim_table_read<H: Host>(
    _: &mut Interp<H>,
    ctx: &mut HostContext<H>,
    args: Vec<Value>,
) -> EvalResult {
    let table = name_arg("table-read", &args[0])?;
    let index = integer_arg("table-read", &args[1])?;
    let slot = table_slot(ctx, table, index)?;
    let sample = ctx.host.table_read(table, slot)?;
    Ok(float_to_value(sample))
}

/// `(table-write! 'name index value)`
fn prim_table_write<H: Host>(
    _: &mut Interp<H>,
    ctx: &mut HostContext<H>,
    args: Vec<Value>,
) -> EvalResult {
    let table = name_arg("table-write!", &args[0])?;
    let index = integer_arg("table-write!", &args[1])?;
    let sample = number_arg("table-write!", &args[2])? as f32;
    let slot = table_slot(ctx, table, index)?;
    ctx.host.table_write(table, slot, sample)?;
    Ok(Value::Unspecified)
}

//==================================================
// Section 4.0 - Delays
//==================================================

/// `(schedule-delay! ms callback)` returns the handle symbol.
fn prim_schedule_delay<H: Host>(
    _: &mut Interp<H>,
    ctx: &mut HostContext<H>,
    mut args: Vec<Value>,
) -> EvalResult {
    let delay_ms = number_arg("schedule-delay!", &args[0])?;
    let callback = args.pop().unwrap_or(Value::Unspecified);
    match callback {
        Value::Procedure(_) | Value::Str(_) | Value::List(_) | Value::Symbol(_) => {}
        other => {
            return Err(EvalError::wrong_type(
                "schedule-delay!",
                "a procedure, string or expression",
                &other,
            ));
        }
    }
    let handle = ctx
        .registry
        .schedule(&mut ctx.host, ctx.owner, delay_ms, callback)?;
    Ok(Value::symbol(&handle.to_string()))
}

/// `(cancel-delay! handle)`: `#t` if a pending delay was cancelled.
fn prim_cancel_delay<H: Host>(
    _: &mut Interp<H>,
    ctx: &mut HostContext<H>,
    args: Vec<Value>,
) -> EvalResult {
    let handle = args[0]
        .as_symbol()
        .and_then(|name| DelayHandle::parse(name.as_str()));
    let cancelled = match handle {
        Some(handle) => ctx.registry.cancel(&mut ctx.host, handle),
        None => false,
    };
    Ok(Value::Boolean(cancelled))
}

/// `(cancel-all!)` returns how many delays were pending.
fn prim_cancel_all<H: Host>(
    _: &mut Interp<H>,
    ctx: &mut HostContext<H>,
    _: Vec<Value>,
) -> EvalResult {
    let cancelled = ctx.registry.cancel_all(&mut ctx.host, ctx.owner);
    Ok(Value::Integer(cancelled as i64))
}

//==================================================
// Section 5.0 - Loading
//==================================================

fn prim_load_from_path<H: Host>(
    interp: &mut Interp<H>,
    ctx: &mut HostContext<H>,
    args: Vec<Value>,
) -> EvalResult {
    let name = name_arg("load-from-path!", &args[0])?;
    load_file(interp, ctx, name)?;
    Ok(Value::Boolean(true))
}

/// Resolve `name` on the host search path and evaluate the whole file.
/// Any failure, including errors raised while the file runs, is reported
/// against the file.
pub(super) fn load_file<H: Host>(
    interp: &mut Interp<H>,
    ctx: &mut HostContext<H>,
    name: &str,
) -> Result<Value, BridgeError> {
    let path = ctx.host.resolve_path(name).ok_or_else(|| BridgeError::Load {
        path: name.to_string(),
        message: "not found on the search path".to_string(),
    })?;
    let shown = path.display().to_string();
    let source = fs::read_to_string(&path).map_err(|err| BridgeError::Load {
        path: shown.clone(),
        message: err.to_string(),
    })?;
    debug!(path = %shown, "loading script");
    interp
        .eval_source(&source, ctx)
        .map_err(|err| BridgeError::Load {
            path: shown,
            message: err.to_string(),
        })
}

//==================================================
// End of file
//==================================================
