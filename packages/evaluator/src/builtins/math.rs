use super::{arg, Builtin};
use crate::error::EvalResult;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(crate) fn math() -> Value {
    let functions: [(&'static str, Builtin); 26] = [
        ("abs", |_, _, a| unary(a, f64::abs)),
        ("floor", |_, _, a| unary(a, f64::floor)),
        ("ceil", |_, _, a| unary(a, f64::ceil)),
        ("round", |_, _, a| unary(a, round)),
        ("trunc", |_, _, a| unary(a, f64::trunc)),
        ("sign", |_, _, a| unary(a, sign)),
        ("sqrt", |_, _, a| unary(a, f64::sqrt)),
        ("cbrt", |_, _, a| unary(a, f64::cbrt)),
        ("exp", |_, _, a| unary(a, f64::exp)),
        ("log", |_, _, a| unary(a, f64::ln)),
        ("log2", |_, _, a| unary(a, f64::log2)),
        ("log10", |_, _, a| unary(a, f64::log10)),
        ("sin", |_, _, a| unary(a, f64::sin)),
        ("cos", |_, _, a| unary(a, f64::cos)),
        ("tan", |_, _, a| unary(a, f64::tan)),
        ("asin", |_, _, a| unary(a, f64::asin)),
        ("acos", |_, _, a| unary(a, f64::acos)),
        ("atan", |_, _, a| unary(a, f64::atan)),
        ("atan2", |_, _, a| Ok(Value::Number(arg(a, 0).to_number().atan2(arg(a, 1).to_number())))),
        ("pow", pow),
        ("min", min),
        ("max", max),
        ("hypot", hypot),
        ("random", random),
        ("fround", |_, _, a| unary(a, |n| n as f32 as f64)),
        ("clz32", |_, _, a| {
            let n = crate::interpreter::to_int32(arg(a, 0).to_number()) as u32;
            Ok(Value::Number(f64::from(n.leading_zeros())))
        }),
    ];
    let math = super::object_of(&functions);
    if let Value::Object(object) = &math {
        let mut object = object.borrow_mut();
        for (name, value) in [
            ("PI", std::f64::consts::PI),
            ("E", std::f64::consts::E),
            ("LN2", std::f64::consts::LN_2),
            ("LN10", std::f64::consts::LN_10),
            ("LOG2E", std::f64::consts::LOG2_E),
            ("LOG10E", std::f64::consts::LOG10_E),
            ("SQRT2", std::f64::consts::SQRT_2),
            ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
        ] {
            object.properties.insert(name.to_string(), Value::Number(value));
        }
    }
    math
}

fn unary(args: &[Value], f: fn(f64) -> f64) -> EvalResult<Value> {
    Ok(Value::Number(f(arg(args, 0).to_number())))
}

/// Halves round towards +Infinity
fn round(n: f64) -> f64 {
    if !n.is_finite() || n.fract() == 0.0 {
        return n;
    }
    (n + 0.5).floor()
}

fn sign(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        n
    } else {
        n.signum()
    }
}

fn pow(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let exponent = arg(args, 1).to_number();
    if exponent.is_nan() {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(arg(args, 0).to_number().powf(exponent)))
}

fn min(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut result = f64::INFINITY;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.min(n);
    }
    Ok(Value::Number(result))
}

fn max(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut result = f64::NEG_INFINITY;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        result = result.max(n);
    }
    Ok(Value::Number(result))
}

fn hypot(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let sum: f64 = args.iter().map(|v| v.to_number().powi(2)).sum();
    Ok(Value::Number(sum.sqrt()))
}

fn random(interp: &mut Interpreter, _: &Value, _: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(interp.realm().next_random()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(-2.5), -2.0);
        assert_eq!(round(-2.6), -3.0);
        assert_eq!(round(4.0), 4.0);
    }
}
