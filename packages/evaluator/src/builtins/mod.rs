//! Pure built-ins available to executed code. Nothing here touches the
//! host: no clock, no I/O, and `console` only emits `tracing` events.

pub mod array;
pub mod console;
pub mod errors;
pub mod function;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::realm::Intrinsics;
use crate::scope::Env;
use crate::value::Value;
use std::collections::HashMap;

/// Signature of every built-in: `(interpreter, this, args)`
pub type Builtin = fn(&mut Interpreter, &Value, &[Value]) -> EvalResult<Value>;

pub(crate) fn table(entries: &[(&'static str, Builtin)]) -> HashMap<&'static str, Value> {
    entries
        .iter()
        .map(|(name, builtin)| (*name, Value::native(name, *builtin)))
        .collect()
}

/// Function value carrying static members
pub(crate) fn namespace(function: Value, members: &[(&'static str, Builtin)]) -> Value {
    if let Value::Function(f) = &function {
        for (name, builtin) in members {
            f.set(*name, Value::native(name, *builtin));
        }
    }
    function
}

pub(crate) fn object_of(members: &[(&'static str, Builtin)]) -> Value {
    Value::object_from(members.iter().map(|(name, builtin)| (*name, Value::native(name, *builtin))))
}

/// Argument or `undefined`
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

/// Callable argument, or a TypeError naming the method
pub(crate) fn callback(args: &[Value], index: usize, method: &str) -> EvalResult<Value> {
    let value = arg(args, index);
    if value.is_callable() {
        Ok(value)
    } else {
        Err(EvalError::type_error(format!("{} is not a function (in {})", value.inspect(), method)))
    }
}

/// Clamp a relative index (negative counts from the end) into `0..=len`
pub(crate) fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if value.is_undefined() {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

pub(crate) fn install_globals(globals: &Env, intrinsics: &Intrinsics) {
    globals.define("undefined", Value::Undefined);
    globals.define("NaN", Value::Number(f64::NAN));
    globals.define("Infinity", Value::Number(f64::INFINITY));
    globals.define("console", console::console());
    globals.define("Math", math::math());
    globals.define("JSON", json::json());
    globals.define("Object", object::constructor());
    globals.define("Array", intrinsics.array_constructor.clone());
    globals.define("String", string::constructor());
    globals.define("Number", number::constructor());
    globals.define("Boolean", Value::native("Boolean", |_, _, args| Ok(Value::Bool(arg(args, 0).truthy()))));
    globals.define("parseInt", Value::native("parseInt", number::parse_int));
    globals.define("parseFloat", Value::native("parseFloat", number::parse_float));
    globals.define(
        "isNaN",
        Value::native("isNaN", |_, _, args| Ok(Value::Bool(arg(args, 0).to_number().is_nan()))),
    );
    globals.define(
        "isFinite",
        Value::native("isFinite", |_, _, args| Ok(Value::Bool(arg(args, 0).to_number().is_finite()))),
    );
    for (name, constructor) in errors::constructors(&intrinsics.error_prototypes) {
        globals.define(name, constructor);
    }
}
