use super::{arg, namespace, table, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{string_to_number, Value};
use playbox_parser::format_number;
use std::collections::HashMap;

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub(crate) fn methods() -> HashMap<&'static str, Value> {
    let methods: [(&'static str, Builtin); 4] = [
        ("toFixed", to_fixed),
        ("toString", to_string),
        ("toLocaleString", to_locale_string),
        ("valueOf", |_, this, _| Ok(Value::Number(this.to_number()))),
    ];
    table(&methods)
}

pub(crate) fn constructor() -> Value {
    let number = Value::native("Number", |interp, _, args| match args.first() {
        None => Ok(Value::Number(0.0)),
        Some(value) => Ok(Value::Number(interp.to_primitive(value)?.to_number())),
    });
    let statics: [(&'static str, Builtin); 6] = [
        ("isInteger", |_, _, a| Ok(Value::Bool(matches!(arg(a, 0), Value::Number(n) if n.is_finite() && n.fract() == 0.0)))),
        ("isFinite", |_, _, a| Ok(Value::Bool(matches!(arg(a, 0), Value::Number(n) if n.is_finite())))),
        ("isNaN", |_, _, a| Ok(Value::Bool(matches!(arg(a, 0), Value::Number(n) if n.is_nan())))),
        ("isSafeInteger", |_, _, a| {
            Ok(Value::Bool(matches!(
                arg(a, 0),
                Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER
            )))
        }),
        ("parseFloat", parse_float),
        ("parseInt", parse_int),
    ];
    let number = namespace(number, &statics);
    if let Value::Function(f) = &number {
        for (name, value) in [
            ("MAX_SAFE_INTEGER", MAX_SAFE_INTEGER),
            ("MIN_SAFE_INTEGER", -MAX_SAFE_INTEGER),
            ("EPSILON", f64::EPSILON),
            ("MAX_VALUE", f64::MAX),
            ("MIN_VALUE", 5e-324),
            ("POSITIVE_INFINITY", f64::INFINITY),
            ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
            ("NaN", f64::NAN),
        ] {
            f.set(name, Value::Number(value));
        }
    }
    number
}

fn this_number(this: &Value, method: &str) -> EvalResult<f64> {
    match this {
        Value::Number(n) => Ok(*n),
        other => Err(EvalError::type_error(format!(
            "Number.prototype.{} requires that 'this' be a Number, got {}",
            method,
            other.inspect()
        ))),
    }
}

fn to_fixed(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let n = this_number(this, "toFixed")?;
    let digits = arg(args, 0).to_number();
    let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
    if !(0.0..=100.0).contains(&digits) {
        return Err(EvalError::range("toFixed() digits argument must be between 0 and 100"));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(Value::from(format_number(n)));
    }
    Ok(Value::from(format!("{:.*}", digits as usize, n)))
}

fn to_string(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let n = this_number(this, "toString")?;
    let radix = match arg(args, 0) {
        Value::Undefined => 10.0,
        other => other.to_number().trunc(),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(EvalError::range("toString() radix must be between 2 and 36"));
    }
    if radix == 10.0 || !n.is_finite() {
        return Ok(Value::from(format_number(n)));
    }
    Ok(Value::from(integer_in_radix(n.trunc(), radix as u32)))
}

/// Integral part in the given radix; fractional digits are dropped
fn integer_in_radix(n: f64, radix: u32) -> String {
    let negative = n < 0.0;
    let mut rest = n.abs();
    let mut digits = Vec::new();
    while rest >= 1.0 {
        let digit = (rest % f64::from(radix)) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        rest = (rest / f64::from(radix)).floor();
    }
    if digits.is_empty() {
        digits.push('0');
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// `1234567.891` renders as `1,234,567.891`
fn to_locale_string(_: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    let n = this_number(this, "toLocaleString")?;
    if !n.is_finite() {
        return Ok(Value::from(format_number(n)));
    }
    let rounded = (n * 1000.0).round() / 1000.0;
    let text = format_number(rounded.abs());
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer.to_string(), Some(fraction.to_string())),
        None => (text, None),
    };
    let mut grouped = String::new();
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(&fraction);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    Ok(Value::from(grouped))
}

/// Global `parseInt(text, radix?)`
pub(crate) fn parse_int(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = interp.to_string_value(&arg(args, 0))?;
    let mut text = text.trim_start();
    let negative = text.starts_with('-');
    if negative || text.starts_with('+') {
        text = &text[1..];
    }
    let mut radix = match arg(args, 1) {
        Value::Undefined => 0,
        other => crate::interpreter::to_int32(other.to_number()),
    };
    if radix != 0 && !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    if (radix == 0 || radix == 16) && (text.starts_with("0x") || text.starts_with("0X")) {
        text = &text[2..];
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    let digits: Vec<u32> = text.chars().map_while(|c| c.to_digit(radix as u32)).collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let value = digits
        .iter()
        .fold(0.0, |acc, digit| acc * f64::from(radix) + f64::from(*digit));
    Ok(Value::Number(if negative { -value } else { value }))
}

/// Global `parseFloat(text)`: the longest numeric prefix
pub(crate) fn parse_float(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = interp.to_string_value(&arg(args, 0))?;
    let text = text.trim_start();
    let unsigned = text.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") {
        let sign = if text.starts_with('-') { -1.0 } else { 1.0 };
        return Ok(Value::Number(sign * f64::INFINITY));
    }
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exponent = false;
    let bytes = text.as_bytes();
    while end < bytes.len() {
        let c = bytes[end];
        let accepted = match c {
            b'0'..=b'9' => true,
            b'+' | b'-' => end == 0 || matches!(bytes[end - 1], b'e' | b'E'),
            b'.' if !seen_dot && !seen_exponent => {
                seen_dot = true;
                true
            }
            b'e' | b'E' if !seen_exponent && end > 0 => {
                seen_exponent = true;
                true
            }
            _ => false,
        };
        if !accepted {
            break;
        }
        end += 1;
    }
    // Back off a dangling exponent or sign
    let mut candidate = &text[..end];
    while !candidate.is_empty() {
        let n = string_to_number(candidate);
        if !n.is_nan() && !candidate.ends_with(['e', 'E', '+', '-']) {
            return Ok(Value::Number(n));
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    Ok(Value::Number(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_in_radix() {
        assert_eq!(integer_in_radix(255.0, 16), "ff");
        assert_eq!(integer_in_radix(-5.0, 2), "-101");
        assert_eq!(integer_in_radix(0.0, 8), "0");
    }
}
