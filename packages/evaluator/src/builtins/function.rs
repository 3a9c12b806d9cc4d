use super::{arg, table, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{Function, FunctionKind, Value};
use std::collections::HashMap;
use std::rc::Rc;

pub(crate) fn methods() -> HashMap<&'static str, Value> {
    let methods: [(&'static str, Builtin); 4] = [
        ("call", call),
        ("apply", apply),
        ("bind", bind),
        ("toString", to_string),
    ];
    table(&methods)
}

fn call(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let rest = args.iter().skip(1).cloned().collect();
    interp.call_function(this, arg(args, 0), rest)
}

fn apply(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let list = match arg(args, 1) {
        Value::Undefined | Value::Null => Vec::new(),
        Value::Array(items) => items.borrow().clone(),
        other => {
            return Err(EvalError::type_error(format!(
                "CreateListFromArrayLike called on non-object {}",
                other.inspect()
            )))
        }
    };
    interp.call_function(this, arg(args, 0), list)
}

fn bind(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let Value::Function(target) = this else {
        return Err(EvalError::type_error("Bind must be called on a function"));
    };
    Ok(Value::Function(Rc::new(Function::new(
        format!("bound {}", target.name),
        FunctionKind::Bound {
            target: this.clone(),
            this: arg(args, 0),
            args: args.iter().skip(1).cloned().collect(),
        },
    ))))
}

fn to_string(_: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(this.to_display_string()))
}
