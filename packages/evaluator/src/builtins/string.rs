use super::{arg, namespace, relative_index, table, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::collections::HashMap;

pub(crate) fn methods() -> HashMap<&'static str, Value> {
    let methods: [(&'static str, Builtin); 26] = [
        ("charAt", char_at),
        ("charCodeAt", char_code_at),
        ("at", at),
        ("indexOf", index_of),
        ("lastIndexOf", last_index_of),
        ("includes", includes),
        ("startsWith", starts_with),
        ("endsWith", ends_with),
        ("slice", slice),
        ("substring", substring),
        ("toUpperCase", |_, this, _| Ok(Value::from(text(this).to_uppercase()))),
        ("toLowerCase", |_, this, _| Ok(Value::from(text(this).to_lowercase()))),
        ("trim", |_, this, _| Ok(Value::from(text(this).trim()))),
        ("trimStart", |_, this, _| Ok(Value::from(text(this).trim_start()))),
        ("trimEnd", |_, this, _| Ok(Value::from(text(this).trim_end()))),
        ("split", split),
        ("replace", replace),
        ("replaceAll", replace_all),
        ("repeat", repeat),
        ("padStart", pad_start),
        ("padEnd", pad_end),
        ("concat", concat),
        ("localeCompare", locale_compare),
        ("toString", |_, this, _| Ok(Value::from(text(this)))),
        ("valueOf", |_, this, _| Ok(Value::from(text(this)))),
        ("codePointAt", char_code_at),
    ];
    table(&methods)
}

pub(crate) fn constructor() -> Value {
    let string = Value::native("String", |interp, _, args| match args.first() {
        None => Ok(Value::string("")),
        Some(value) => Ok(Value::from(interp.to_string_value(value)?)),
    });
    let statics: [(&'static str, Builtin); 1] = [("fromCharCode", from_char_code)];
    namespace(string, &statics)
}

fn text(this: &Value) -> String {
    match this {
        Value::String(s) => s.to_string(),
        other => other.to_display_string(),
    }
}

fn chars(this: &Value) -> Vec<char> {
    text(this).chars().collect()
}

fn string_arg(interp: &mut Interpreter, args: &[Value], index: usize) -> EvalResult<String> {
    interp.to_string_value(&arg(args, index))
}

/// Char offset of a byte offset within `haystack`
fn char_offset(haystack: &str, byte: usize) -> usize {
    haystack[..byte].chars().count()
}

/// Byte offset of the `n`th char, clamped to the end
fn byte_offset(haystack: &str, n: usize) -> usize {
    haystack.char_indices().nth(n).map_or(haystack.len(), |(i, _)| i)
}

fn char_at(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let index = arg(args, 0).to_number();
    let index = if index.is_nan() { 0.0 } else { index.trunc() };
    if index < 0.0 {
        return Ok(Value::string(""));
    }
    Ok(Value::from(
        chars(this).get(index as usize).map(|c| c.to_string()).unwrap_or_default(),
    ))
}

fn char_code_at(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let index = arg(args, 0).to_number();
    let index = if index.is_nan() { 0.0 } else { index.trunc() };
    if index < 0.0 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(
        chars(this).get(index as usize).map_or(f64::NAN, |c| f64::from(u32::from(*c))),
    ))
}

fn at(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars(this);
    let n = arg(args, 0).to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let index = if n < 0.0 { chars.len() as f64 + n } else { n };
    if index < 0.0 {
        return Ok(Value::Undefined);
    }
    Ok(chars
        .get(index as usize)
        .map(|c| Value::from(c.to_string()))
        .unwrap_or(Value::Undefined))
}

fn index_of(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let haystack = text(this);
    let needle = string_arg(interp, args, 0)?;
    let start = relative_index(&arg(args, 1), haystack.chars().count(), 0);
    let from = byte_offset(&haystack, start);
    Ok(Value::Number(
        haystack[from..]
            .find(&needle)
            .map_or(-1.0, |i| char_offset(&haystack, from + i) as f64),
    ))
}

fn last_index_of(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let haystack = text(this);
    let needle = string_arg(interp, args, 0)?;
    Ok(Value::Number(
        haystack.rfind(&needle).map_or(-1.0, |i| char_offset(&haystack, i) as f64),
    ))
}

fn includes(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let needle = string_arg(interp, args, 0)?;
    Ok(Value::Bool(text(this).contains(&needle)))
}

fn starts_with(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let haystack = text(this);
    let needle = string_arg(interp, args, 0)?;
    let start = relative_index(&arg(args, 1), haystack.chars().count(), 0);
    Ok(Value::Bool(haystack[byte_offset(&haystack, start)..].starts_with(&needle)))
}

fn ends_with(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let haystack = text(this);
    let needle = string_arg(interp, args, 0)?;
    let length = haystack.chars().count();
    let end = relative_index(&arg(args, 1), length, length);
    Ok(Value::Bool(haystack[..byte_offset(&haystack, end)].ends_with(&needle)))
}

fn slice(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars(this);
    let start = relative_index(&arg(args, 0), chars.len(), 0);
    let end = relative_index(&arg(args, 1), chars.len(), chars.len());
    let slice: String = if start < end { chars[start..end].iter().collect() } else { String::new() };
    Ok(Value::from(slice))
}

fn substring(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let chars = chars(this);
    // Negative and NaN clamp to zero, then the bounds swap if reversed
    let clamp = |value: Value, default: usize| -> usize {
        if value.is_undefined() {
            return default;
        }
        let n = value.to_number();
        if n.is_nan() || n < 0.0 {
            0
        } else {
            (n.trunc() as usize).min(chars.len())
        }
    };
    let a = clamp(arg(args, 0), 0);
    let b = clamp(arg(args, 1), chars.len());
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    Ok(Value::from(chars[start..end].iter().collect::<String>()))
}

fn split(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let haystack = text(this);
    let limit = match arg(args, 1) {
        Value::Undefined => usize::MAX,
        other => other.to_number().max(0.0) as usize,
    };
    let parts: Vec<Value> = match arg(args, 0) {
        Value::Undefined => vec![Value::from(haystack)],
        separator => {
            let separator = interp.to_string_value(&separator)?;
            if separator.is_empty() {
                haystack.chars().map(|c| Value::from(c.to_string())).collect()
            } else {
                haystack.split(separator.as_str()).map(Value::from).collect()
            }
        }
    };
    Ok(Value::array(parts.into_iter().take(limit).collect()))
}

/// Replacement text for one match: a callback result, or a template
/// where `$&` stands for the match
fn replacement(interp: &mut Interpreter, with: &Value, matched: &str, offset: usize, whole: &str) -> EvalResult<String> {
    if with.is_callable() {
        let args = vec![
            Value::from(matched),
            Value::Number(char_offset(whole, offset) as f64),
            Value::from(whole),
        ];
        let result = interp.call_function(with, Value::Undefined, args)?;
        return interp.to_string_value(&result);
    }
    let template = interp.to_string_value(with)?;
    Ok(template.replace("$&", matched))
}

fn substitute(interp: &mut Interpreter, this: &Value, args: &[Value], all: bool) -> EvalResult<Value> {
    let haystack = text(this);
    let pattern = string_arg(interp, args, 0)?;
    let with = arg(args, 1);

    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    let matches: Vec<usize> = if pattern.is_empty() {
        // An empty pattern matches before every char (and at the end)
        let mut offsets: Vec<usize> = haystack.char_indices().map(|(i, _)| i).collect();
        offsets.push(haystack.len());
        offsets
    } else {
        haystack.match_indices(pattern.as_str()).map(|(i, _)| i).collect()
    };
    for offset in matches.into_iter().take(if all { usize::MAX } else { 1 }) {
        out.push_str(&haystack[last..offset]);
        out.push_str(&replacement(interp, &with, &pattern, offset, &haystack)?);
        last = offset + pattern.len();
    }
    out.push_str(&haystack[last..]);
    Ok(Value::from(out))
}

fn replace(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    substitute(interp, this, args, false)
}

fn replace_all(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    substitute(interp, this, args, true)
}

fn repeat(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let count = arg(args, 0).to_number();
    let count = if count.is_nan() { 0.0 } else { count.trunc() };
    if count < 0.0 || count.is_infinite() {
        return Err(EvalError::range(format!("Invalid count value: {}", Value::Number(count))));
    }
    Ok(Value::from(text(this).repeat(count as usize)))
}

fn pad(interp: &mut Interpreter, this: &Value, args: &[Value], at_start: bool) -> EvalResult<Value> {
    let original = text(this);
    let target = arg(args, 0).to_number();
    let filler = match arg(args, 1) {
        Value::Undefined => " ".to_string(),
        other => interp.to_string_value(&other)?,
    };
    let length = original.chars().count();
    if target.is_nan() || target as usize <= length || filler.is_empty() {
        return Ok(Value::from(original));
    }
    let padding: String = filler.chars().cycle().take(target as usize - length).collect();
    Ok(Value::from(if at_start {
        padding + &original
    } else {
        original + &padding
    }))
}

fn pad_start(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    pad(interp, this, args, true)
}

fn pad_end(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    pad(interp, this, args, false)
}

fn concat(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut out = text(this);
    for value in args {
        out.push_str(&interp.to_string_value(value)?);
    }
    Ok(Value::from(out))
}

fn locale_compare(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let other = string_arg(interp, args, 0)?;
    Ok(Value::Number(match text(this).as_str().cmp(other.as_str()) {
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => 0.0,
        std::cmp::Ordering::Greater => 1.0,
    }))
}

fn from_char_code(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let text: String = args
        .iter()
        .map(|code| {
            let code = crate::interpreter::to_int32(code.to_number()) as u32 & 0xffff;
            char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();
    Ok(Value::from(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_count_chars() {
        let text = "héllo";
        assert_eq!(char_offset(text, 3), 2);
        assert_eq!(byte_offset(text, 2), 3);
        assert_eq!(byte_offset(text, 10), text.len());
    }
}
