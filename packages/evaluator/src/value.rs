use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::scope::Env;
use indexmap::IndexMap;
use playbox_parser::ast::{ClassDef, FunctionDef};
use playbox_common::StackGuard;
use playbox_parser::format_number;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type ObjectRef = Rc<RefCell<Object>>;
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Host function callable from script code: `(interpreter, this, args)`
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &Value, &[Value]) -> EvalResult<Value>>;

/// Runtime value
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    Function(Rc<Function>),
    Element(Rc<Element>),
}

/// Plain object with insertion-ordered properties
#[derive(Default)]
pub struct Object {
    pub properties: IndexMap<String, Value>,
    pub proto: Option<ObjectRef>,
    pub frozen: bool,
}

impl Object {
    pub fn with_proto(proto: Option<ObjectRef>) -> Self {
        Self {
            properties: IndexMap::new(),
            proto,
            frozen: false,
        }
    }

    /// Own property, then the prototype chain
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.properties.get(key) {
            return Some(value.clone());
        }
        let mut proto = self.proto.clone();
        while let Some(current) = proto {
            let object = current.borrow();
            if let Some(value) = object.properties.get(key) {
                return Some(value.clone());
            }
            proto = object.proto.clone();
        }
        None
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
    pub properties: RefCell<IndexMap<String, Value>>,
}

pub enum FunctionKind {
    Closure(Closure),
    Native(NativeFn),
    Class(Rc<Class>),
    /// Component implemented by the display surface; rendered, never called
    Host,
    Bound {
        target: Value,
        this: Value,
        args: Vec<Value>,
    },
}

pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub env: Env,
    /// Class a method or constructor belongs to, for `super`
    pub home: Option<Rc<Class>>,
}

pub struct Class {
    pub def: Rc<ClassDef>,
    pub env: Env,
    pub parent: Option<Value>,
    pub prototype: ObjectRef,
}

/// Result of `createElement`
pub struct Element {
    pub element_type: Value,
    pub props: Value,
    pub key: Option<String>,
}

impl Function {
    pub fn new(name: impl Into<String>, kind: FunctionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: RefCell::new(IndexMap::new()),
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, FunctionKind::Class(_))
    }

    pub fn is_host(&self) -> bool {
        matches!(self.kind, FunctionKind::Host)
    }

    /// Declared parameter count
    pub fn arity(&self) -> usize {
        match &self.kind {
            FunctionKind::Closure(closure) => closure.def.params.len(),
            FunctionKind::Class(class) => class.def.constructor.as_ref().map_or(0, |c| c.params.len()),
            _ => 0,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.properties.borrow().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.properties.borrow_mut().insert(key.into(), value);
    }
}

impl Value {
    pub fn string(text: &str) -> Value {
        Value::String(Rc::from(text))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(properties: IndexMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(Object {
            properties,
            proto: None,
            frozen: false,
        })))
    }

    pub fn empty_object() -> Value {
        Value::object(IndexMap::new())
    }

    /// Object from `(key, value)` pairs, keeping their order
    pub fn object_from<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn native<F>(name: &str, f: F) -> Value
    where
        F: Fn(&mut Interpreter, &Value, &[Value]) -> EvalResult<Value> + 'static,
    {
        Value::Function(Rc::new(Function::new(name, FunctionKind::Native(Rc::new(f)))))
    }

    pub fn host_component(name: &str) -> Value {
        Value::Function(Rc::new(Function::new(name, FunctionKind::Host)))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Array(_) | Value::Object(_) | Value::Element(_) => "object",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_display_string()),
            _ => f64::NAN,
        }
    }

    /// String conversion as seen by concatenation and `String(value)`
    pub fn to_display_string(&self) -> String {
        self.display_within(&mut Vec::new(), &StackGuard::default())
    }

    /// Arrays and error objects already being converted print as empty
    fn display_within(&self, seen: &mut Vec<Value>, guard: &StackGuard) -> String {
        if guard.exhausted() {
            return String::new();
        }
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Array(items) => {
                if seen.iter().any(|v| v.ptr_eq(self)) {
                    return String::new();
                }
                seen.push(self.clone());
                let text = items
                    .borrow()
                    .iter()
                    .map(|item| {
                        if item.is_nullish() {
                            String::new()
                        } else {
                            item.display_within(seen, guard)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                seen.pop();
                text
            }
            Value::Object(object) => {
                let object = object.borrow();
                // Error-like objects print as `Name: message`
                match (object.get("name"), object.get("message")) {
                    (Some(Value::String(name)), Some(message)) => {
                        if seen.iter().any(|v| v.ptr_eq(self)) {
                            return String::new();
                        }
                        seen.push(self.clone());
                        let message = message.display_within(seen, guard);
                        seen.pop();
                        if message.is_empty() {
                            name.to_string()
                        } else {
                            format!("{}: {}", name, message)
                        }
                    }
                    _ => "[object Object]".to_string(),
                }
            }
            Value::Function(f) => match f.kind {
                FunctionKind::Class(_) => format!("class {} {{ }}", f.name),
                _ => format!("function {}() {{ [native code] }}", f.name),
            },
            Value::Element(_) => "[object Object]".to_string(),
        }
    }

    /// Identity of reference values
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.ptr_eq(other),
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Bool(_)) => self.loose_equals(&Value::Number(other.to_number())),
            (Value::Array(_) | Value::Object(_), Value::Number(_) | Value::String(_)) => {
                Value::string(&self.to_display_string()).loose_equals(other)
            }
            (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Object(_)) => {
                self.loose_equals(&Value::string(&other.to_display_string()))
            }
            _ => self.strict_equals(other),
        }
    }

    /// Equality used by `includes`: like `===` but `NaN` equals itself
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    /// Property key for computed access
    pub fn to_property_key(&self) -> String {
        self.to_display_string()
    }

    /// Console-style rendering; strings are quoted when nested
    pub fn inspect(&self) -> String {
        self.inspect_at(0)
    }

    fn inspect_at(&self, depth: usize) -> String {
        match self {
            Value::String(s) if depth > 0 => format!("'{}'", s),
            Value::Array(items) => {
                if depth > 2 {
                    return "[Array]".to_string();
                }
                let items = items.borrow();
                if items.is_empty() {
                    return "[]".to_string();
                }
                let parts: Vec<String> = items.iter().map(|item| item.inspect_at(depth + 1)).collect();
                format!("[ {} ]", parts.join(", "))
            }
            Value::Object(object) => {
                if depth > 2 {
                    return "[Object]".to_string();
                }
                let object = object.borrow();
                if let (Some(Value::String(_)), Some(_)) = (object.get("name"), object.properties.get("message")) {
                    return self.to_display_string();
                }
                if object.properties.is_empty() {
                    return "{}".to_string();
                }
                let parts: Vec<String> = object
                    .properties
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value.inspect_at(depth + 1)))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            Value::Function(f) => {
                if f.is_class() {
                    format!("[class {}]", f.name)
                } else if f.name.is_empty() {
                    "[Function (anonymous)]".to_string()
                } else {
                    format!("[Function: {}]", f.name)
                }
            }
            Value::Element(element) => {
                let name = match &element.element_type {
                    Value::String(tag) => tag.to_string(),
                    Value::Function(f) => f.name.clone(),
                    other => other.to_display_string(),
                };
                format!("<{} />", name)
            }
            other => other.to_display_string(),
        }
    }
}

/// `Number(text)`: trimmed, empty is zero, radix prefixes allowed
pub fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust accepts spellings like "inf" and "nan" that scripts do not
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E' | 'x' | 'X' | 'b' | 'B' | 'o' | 'O' | 'a'..='f' | 'A'..='F')) {
        return f64::NAN;
    }
    playbox_parser::literals::parse_number(trimmed).unwrap_or(f64::NAN)
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other.inspect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(!Value::string("").truthy());
        assert!(Value::string("0").truthy());
        assert!(Value::array(vec![]).truthy());
        assert!(!Value::Null.truthy());
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(Value::string("1").loose_equals(&Value::Number(1.0)));
        assert!(Value::Bool(true).loose_equals(&Value::Number(1.0)));
        assert!(!Value::string("a").strict_equals(&Value::string("b")));
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x10"), 16.0);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
        let list = Value::array(vec![Value::Number(1.0), Value::Null, Value::string("a")]);
        assert_eq!(list.to_display_string(), "1,,a");
    }

    #[test]
    fn test_inspect() {
        let value = Value::object_from([
            ("name", Value::string("x")),
            ("tags", Value::array(vec![Value::Number(1.0)])),
        ]);
        assert_eq!(value.inspect(), "{ name: 'x', tags: [ 1 ] }");
    }
}
