use super::{arg, namespace, table, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{Object, Value};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Methods every object inherits
pub(crate) fn methods() -> HashMap<&'static str, Value> {
    let methods: [(&'static str, Builtin); 3] = [
        ("hasOwnProperty", has_own_property),
        ("toString", |_, this, _| Ok(Value::from(this.to_display_string()))),
        ("valueOf", |_, this, _| Ok(this.clone())),
    ];
    table(&methods)
}

pub(crate) fn constructor() -> Value {
    let object = Value::native("Object", |_, _, args| {
        let value = arg(args, 0);
        Ok(if value.is_nullish() { Value::empty_object() } else { value })
    });
    let statics: [(&'static str, Builtin); 9] = [
        ("keys", keys),
        ("values", values),
        ("entries", entries),
        ("assign", assign),
        ("freeze", freeze),
        ("isFrozen", is_frozen),
        ("fromEntries", from_entries),
        ("create", create),
        ("getPrototypeOf", get_prototype_of),
    ];
    namespace(object, &statics)
}

fn has_own_property(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let key = arg(args, 0).to_property_key();
    Ok(Value::Bool(interp.own_keys(this).contains(&key)))
}

fn require_object(value: &Value, method: &str) -> EvalResult<()> {
    if value.is_nullish() {
        return Err(EvalError::type_error(format!(
            "Cannot convert undefined or null to object (in Object.{})",
            method
        )));
    }
    Ok(())
}

fn keys(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    require_object(&target, "keys")?;
    Ok(Value::array(interp.own_keys(&target).into_iter().map(Value::from).collect()))
}

fn values(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    require_object(&target, "values")?;
    let mut values = Vec::new();
    for key in interp.own_keys(&target) {
        values.push(interp.get_property(&target, &key)?);
    }
    Ok(Value::array(values))
}

fn entries(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    require_object(&target, "entries")?;
    let mut entries = Vec::new();
    for key in interp.own_keys(&target) {
        let value = interp.get_property(&target, &key)?;
        entries.push(Value::array(vec![Value::from(key), value]));
    }
    Ok(Value::array(entries))
}

fn assign(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    require_object(&target, "assign")?;
    for source in args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        for key in interp.own_keys(source) {
            let value = interp.get_property(source, &key)?;
            interp.set_property(&target, &key, value)?;
        }
    }
    Ok(target)
}

fn freeze(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    if let Value::Object(object) = &target {
        object.borrow_mut().frozen = true;
    }
    Ok(target)
}

fn is_frozen(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(match arg(args, 0) {
        Value::Object(object) => object.borrow().frozen,
        Value::Array(_) | Value::Function(_) => false,
        _ => true,
    }))
}

fn from_entries(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut properties = IndexMap::new();
    for entry in interp.iterate(&arg(args, 0))? {
        let key = interp.get_property(&entry, "0")?.to_property_key();
        let value = interp.get_property(&entry, "1")?;
        properties.insert(key, value);
    }
    Ok(Value::object(properties))
}

fn create(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let proto = match arg(args, 0) {
        Value::Object(proto) => Some(proto),
        Value::Null => None,
        other => {
            return Err(EvalError::type_error(format!(
                "Object prototype may only be an Object or null: {}",
                other.inspect()
            )))
        }
    };
    Ok(Value::Object(Rc::new(RefCell::new(Object::with_proto(proto)))))
}

fn get_prototype_of(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(match arg(args, 0) {
        Value::Object(object) => object.borrow().proto.clone().map(Value::Object).unwrap_or(Value::Null),
        _ => Value::Null,
    })
}
