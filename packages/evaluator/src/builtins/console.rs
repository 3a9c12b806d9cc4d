use super::{object_of, Builtin};
use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::value::Value;
use tracing::{debug, error, info, warn};

/// Target of events emitted by executed `console.*` calls
pub const CONSOLE_TARGET: &str = "playbox::console";

pub(crate) fn console() -> Value {
    let members: [(&'static str, Builtin); 5] = [
        ("log", log),
        ("info", log),
        ("debug", console_debug),
        ("warn", console_warn),
        ("error", console_error),
    ];
    object_of(&members)
}

/// Strings print raw, everything else the way a console inspects it
fn line(args: &[Value]) -> String {
    args.iter()
        .map(|value| match value {
            Value::String(s) => s.to_string(),
            other => other.inspect(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn log(_interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let line = line(args);
    info!(target: "playbox::console", "{}", line);
    Ok(Value::Undefined)
}

fn console_debug(_interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let line = line(args);
    debug!(target: "playbox::console", "{}", line);
    Ok(Value::Undefined)
}

fn console_warn(_interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let line = line(args);
    warn!(target: "playbox::console", "{}", line);
    Ok(Value::Undefined)
}

fn console_error(_interp: &mut Interpreter, _this: &Value, args: &[Value]) -> EvalResult<Value> {
    let line = line(args);
    error!(target: "playbox::console", "{}", line);
    Ok(Value::Undefined)
}
