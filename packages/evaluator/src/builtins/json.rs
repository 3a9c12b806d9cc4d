use super::{arg, object_of, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number};

pub(crate) fn json() -> Value {
    let members: [(&'static str, Builtin); 2] = [("stringify", stringify), ("parse", parse)];
    object_of(&members)
}

fn stringify(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let Some(json) = to_json(interp, &arg(args, 0))? else {
        return Ok(Value::Undefined);
    };
    let indent = match arg(args, 2) {
        Value::Number(n) if n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    let internal = |e: serde_json::Error| EvalError::Internal { message: e.to_string() };
    if indent.is_empty() {
        return serde_json::to_string(&json).map(Value::from).map_err(internal);
    }
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    json.serialize(&mut serializer).map_err(internal)?;
    Ok(Value::from(String::from_utf8_lossy(&out).into_owned()))
}

fn parse(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = interp.to_string_value(&arg(args, 0))?;
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => Ok(from_json(&json)),
        Err(e) => {
            let error = interp.realm().make_error("SyntaxError", &format!("JSON.parse: {}", e));
            Err(interp.throw_value(error))
        }
    }
}

/// JSON form of a value; `None` for values JSON skips (`undefined`,
/// functions)
pub(crate) fn to_json(interp: &mut Interpreter, value: &Value) -> EvalResult<Option<serde_json::Value>> {
    let mut stack = Vec::new();
    convert(interp, value, &mut stack)
}

fn convert(interp: &mut Interpreter, value: &Value, stack: &mut Vec<Value>) -> EvalResult<Option<serde_json::Value>> {
    interp.check_stack()?;
    if let Value::Object(_) = value {
        let to_json = interp.get_property(value, "toJSON")?;
        if to_json.is_callable() {
            let replaced = interp.call_function(&to_json, value.clone(), Vec::new())?;
            return convert(interp, &replaced, stack);
        }
    }
    let json = match value {
        Value::Undefined | Value::Function(_) => return Ok(None),
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number(*n),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Array(items) => {
            enter(value, stack)?;
            let items = items.borrow().clone();
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                out.push(convert(interp, item, stack)?.unwrap_or(serde_json::Value::Null));
            }
            stack.pop();
            serde_json::Value::Array(out)
        }
        Value::Object(_) => {
            enter(value, stack)?;
            let mut map = Map::new();
            for key in interp.own_keys(value) {
                let property = interp.get_property(value, &key)?;
                if let Some(json) = convert(interp, &property, stack)? {
                    map.insert(key, json);
                }
            }
            stack.pop();
            serde_json::Value::Object(map)
        }
        Value::Element(element) => {
            enter(value, stack)?;
            let mut map = Map::new();
            let element_type = match &element.element_type {
                Value::Function(f) => serde_json::Value::String(f.name.clone()),
                other => convert(interp, other, stack)?.unwrap_or(serde_json::Value::Null),
            };
            map.insert("type".to_string(), element_type);
            map.insert(
                "key".to_string(),
                element.key.clone().map_or(serde_json::Value::Null, serde_json::Value::String),
            );
            let props = convert(interp, &element.props, stack)?.unwrap_or(serde_json::Value::Null);
            map.insert("props".to_string(), props);
            stack.pop();
            serde_json::Value::Object(map)
        }
    };
    Ok(Some(json))
}

fn enter(value: &Value, stack: &mut Vec<Value>) -> EvalResult<()> {
    if stack.iter().any(|seen| seen.ptr_eq(value)) {
        return Err(EvalError::type_error("Converting circular structure to JSON"));
    }
    stack.push(value.clone());
    Ok(())
}

fn number(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

pub(crate) fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::object(
            map.iter()
                .map(|(key, value)| (key.clone(), from_json(value)))
                .collect::<IndexMap<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_numbers_have_no_fraction() {
        assert_eq!(number(3.0).to_string(), "3");
        assert_eq!(number(-0.5).to_string(), "-0.5");
        assert_eq!(number(f64::NAN), serde_json::Value::Null);
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let json: serde_json::Value = serde_json::from_str(r#"{"b": 1, "a": [true, null]}"#).unwrap();
        let value = from_json(&json);
        assert_eq!(value.inspect(), "{ b: 1, a: [ true, null ] }");
    }
}
