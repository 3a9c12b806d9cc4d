//! Standard capability modules
//!
//! Each module is a plain script object built from host natives. Values are
//! shared by every execution that resolves them, so module objects are
//! frozen when they enter a registry.

pub mod dagre;
pub mod layout;
pub mod react;
pub mod reactflow;

use playbox_evaluator::builtins::Builtin;
use playbox_evaluator::Value;

/// Names the registry knows how to build, in registration order
pub const STANDARD_MODULES: [&str; 3] = ["react", "reactflow", "dagre"];

/// Fresh value for a standard module, `None` for any other name
pub fn standard_module(name: &str) -> Option<Value> {
    match name {
        "react" => Some(react::module()),
        "reactflow" => Some(reactflow::module()),
        "dagre" => Some(dagre::module()),
        _ => None,
    }
}

/// Freeze a module object and the plain objects nested in it
pub(crate) fn freeze(value: &Value) {
    let Value::Object(object) = value else {
        return;
    };
    let nested: Vec<Value> = {
        let mut object = object.borrow_mut();
        if object.frozen {
            return;
        }
        object.frozen = true;
        object.properties.values().cloned().collect()
    };
    for value in &nested {
        freeze(value);
    }
}

/// Object whose members are host natives
pub(crate) fn members(entries: &[(&'static str, Builtin)]) -> Value {
    Value::object_from(entries.iter().map(|(name, builtin)| (*name, Value::native(name, *builtin))))
}

/// Object of string constants, `{ Top: "top", ... }`
pub(crate) fn string_enum(entries: &[(&str, &str)]) -> Value {
    Value::object_from(entries.iter().map(|(key, value)| (*key, Value::string(value))))
}

/// Set `key` on an object value built by this crate
pub(crate) fn insert(target: &Value, key: &str, value: Value) {
    match target {
        Value::Object(object) => {
            object.borrow_mut().properties.insert(key.to_string(), value);
        }
        Value::Function(function) => function.set(key, value),
        _ => {}
    }
}
