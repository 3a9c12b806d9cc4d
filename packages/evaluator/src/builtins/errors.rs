use super::arg;
use crate::value::{Object, ObjectRef, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const ERROR_TYPES: [&str; 5] = ["Error", "TypeError", "RangeError", "ReferenceError", "SyntaxError"];

/// One prototype per error type; the specific ones inherit from `Error`
pub(crate) fn prototypes() -> HashMap<&'static str, ObjectRef> {
    let base = prototype("Error", None);
    let mut prototypes = HashMap::new();
    for name in ERROR_TYPES {
        let proto = if name == "Error" {
            base.clone()
        } else {
            prototype(name, Some(base.clone()))
        };
        prototypes.insert(name, proto);
    }
    prototypes
}

fn prototype(name: &str, parent: Option<ObjectRef>) -> ObjectRef {
    let mut object = Object::with_proto(parent);
    object.properties.insert("name".to_string(), Value::string(name));
    object.properties.insert("message".to_string(), Value::string(""));
    Rc::new(RefCell::new(object))
}

/// `Error(message, { cause })` and friends. Called with `new` (or through
/// `super`) they fill in the receiver; called plainly they allocate.
pub(crate) fn constructors(prototypes: &HashMap<&'static str, ObjectRef>) -> Vec<(&'static str, Value)> {
    let mut constructors = Vec::new();
    for name in ERROR_TYPES {
        let Some(proto) = prototypes.get(name).cloned() else {
            continue;
        };
        let constructor = Value::native(name, move |interp, this, args| {
            let target = match this {
                Value::Object(_) => this.clone(),
                _ => interp.realm().make_error(name, ""),
            };
            let message = arg(args, 0);
            if !message.is_undefined() {
                let message = interp.to_string_value(&message)?;
                interp.set_property(&target, "message", Value::from(message))?;
            }
            if let Value::Object(options) = arg(args, 1) {
                let cause = options.borrow().properties.get("cause").cloned();
                if let Some(cause) = cause {
                    interp.set_property(&target, "cause", cause)?;
                }
            }
            Ok(target)
        });
        if let Value::Function(f) = &constructor {
            f.set("prototype", Value::Object(proto.clone()));
        }
        proto
            .borrow_mut()
            .properties
            .insert("constructor".to_string(), constructor.clone());
        constructors.push((name, constructor));
    }
    constructors
}
