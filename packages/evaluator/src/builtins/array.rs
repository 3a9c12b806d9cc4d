use super::{arg, callback, namespace, relative_index, table, Builtin};
use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{ArrayRef, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

pub(crate) fn methods() -> HashMap<&'static str, Value> {
    let methods: [(&'static str, Builtin); 33] = [
        ("map", map),
        ("filter", filter),
        ("forEach", for_each),
        ("reduce", reduce),
        ("reduceRight", reduce_right),
        ("find", find),
        ("findIndex", find_index),
        ("findLast", find_last),
        ("findLastIndex", find_last_index),
        ("some", some),
        ("every", every),
        ("includes", includes),
        ("indexOf", index_of),
        ("lastIndexOf", last_index_of),
        ("join", join),
        ("slice", slice),
        ("splice", splice),
        ("concat", concat),
        ("push", push),
        ("pop", pop),
        ("shift", shift),
        ("unshift", unshift),
        ("reverse", reverse),
        ("sort", sort),
        ("flat", flat),
        ("flatMap", flat_map),
        ("fill", fill),
        ("at", at),
        ("keys", keys),
        ("values", |_, this, _| Ok(Value::array(items(this, "values")?.borrow().clone()))),
        ("entries", entries),
        ("toString", |_, this, _| Ok(Value::from(this.to_display_string()))),
        ("toSorted", to_sorted),
    ];
    table(&methods)
}

/// Global `Array`: `Array(n)` makes holes, `Array(a, b)` lists its arguments
pub(crate) fn constructor() -> Value {
    let array = Value::native("Array", |_, _, args| match args {
        [Value::Number(n)] => {
            if *n < 0.0 || n.fract() != 0.0 || *n > u32::MAX as f64 {
                return Err(EvalError::range("Invalid array length"));
            }
            Ok(Value::array(vec![Value::Undefined; *n as usize]))
        }
        _ => Ok(Value::array(args.to_vec())),
    });
    let statics: [(&'static str, Builtin); 3] = [
        ("isArray", |_, _, args| Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))),
        ("from", from),
        ("of", |_, _, args| Ok(Value::array(args.to_vec()))),
    ];
    namespace(array, &statics)
}

fn items(this: &Value, method: &str) -> EvalResult<ArrayRef> {
    match this {
        Value::Array(items) => Ok(items.clone()),
        other => Err(EvalError::type_error(format!(
            "Array.prototype.{} called on {}",
            method,
            other.inspect()
        ))),
    }
}

/// Element at `index`, read fresh so callbacks may mutate the array
fn item(array: &ArrayRef, index: usize) -> Value {
    array.borrow().get(index).cloned().unwrap_or(Value::Undefined)
}

fn len(array: &ArrayRef) -> usize {
    array.borrow().len()
}

/// `callback(item, index, array)`
fn visit(interp: &mut Interpreter, f: &Value, this: &Value, array: &ArrayRef, index: usize) -> EvalResult<Value> {
    let args = vec![item(array, index), Value::Number(index as f64), this.clone()];
    interp.call_function(f, Value::Undefined, args)
}

fn map(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "map")?;
    let f = callback(args, 0, "Array.prototype.map")?;
    let length = len(&array);
    let mut out = Vec::with_capacity(length);
    for index in 0..length {
        out.push(visit(interp, &f, this, &array, index)?);
    }
    Ok(Value::array(out))
}

fn filter(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "filter")?;
    let f = callback(args, 0, "Array.prototype.filter")?;
    let mut out = Vec::new();
    for index in 0..len(&array) {
        if visit(interp, &f, this, &array, index)?.truthy() {
            out.push(item(&array, index));
        }
    }
    Ok(Value::array(out))
}

fn for_each(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "forEach")?;
    let f = callback(args, 0, "Array.prototype.forEach")?;
    for index in 0..len(&array) {
        visit(interp, &f, this, &array, index)?;
    }
    Ok(Value::Undefined)
}

fn fold(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    method: &str,
    order: impl Iterator<Item = usize>,
) -> EvalResult<Value> {
    let array = items(this, method)?;
    let f = callback(args, 0, method)?;
    let mut order = order.peekable();
    let mut accumulator = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match order.next() {
            Some(index) => item(&array, index),
            None => return Err(EvalError::type_error("Reduce of empty array with no initial value")),
        },
    };
    for index in order {
        let args = vec![accumulator, item(&array, index), Value::Number(index as f64), this.clone()];
        accumulator = interp.call_function(&f, Value::Undefined, args)?;
    }
    Ok(accumulator)
}

fn reduce(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let length = len(&items(this, "reduce")?);
    fold(interp, this, args, "reduce", 0..length)
}

fn reduce_right(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let length = len(&items(this, "reduceRight")?);
    fold(interp, this, args, "reduceRight", (0..length).rev())
}

/// First index (in `order`) whose callback result is truthy
fn search(
    interp: &mut Interpreter,
    this: &Value,
    args: &[Value],
    method: &str,
    reverse: bool,
) -> EvalResult<Option<usize>> {
    let array = items(this, method)?;
    let f = callback(args, 0, method)?;
    let length = len(&array);
    let order: Box<dyn Iterator<Item = usize>> = if reverse {
        Box::new((0..length).rev())
    } else {
        Box::new(0..length)
    };
    for index in order {
        if visit(interp, &f, this, &array, index)?.truthy() {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn find(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "find")?;
    let found = search(interp, this, args, "find", false)?;
    Ok(found.map_or(Value::Undefined, |index| item(&array, index)))
}

fn find_last(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "findLast")?;
    let found = search(interp, this, args, "findLast", true)?;
    Ok(found.map_or(Value::Undefined, |index| item(&array, index)))
}

fn find_index(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let found = search(interp, this, args, "findIndex", false)?;
    Ok(Value::Number(found.map_or(-1.0, |index| index as f64)))
}

fn find_last_index(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let found = search(interp, this, args, "findLastIndex", true)?;
    Ok(Value::Number(found.map_or(-1.0, |index| index as f64)))
}

fn some(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(search(interp, this, args, "some", false)?.is_some()))
}

fn every(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "every")?;
    let f = callback(args, 0, "Array.prototype.every")?;
    for index in 0..len(&array) {
        if !visit(interp, &f, this, &array, index)?.truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn includes(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "includes")?;
    let needle = arg(args, 0);
    let found = array.borrow().iter().any(|item| item.same_value_zero(&needle));
    Ok(Value::Bool(found))
}

fn index_of(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "indexOf")?;
    let needle = arg(args, 0);
    let items = array.borrow();
    let start = relative_index(&arg(args, 1), items.len(), 0);
    let found = items
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, item)| item.strict_equals(&needle))
        .map_or(-1.0, |(index, _)| index as f64);
    Ok(Value::Number(found))
}

fn last_index_of(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "lastIndexOf")?;
    let needle = arg(args, 0);
    let found = array
        .borrow()
        .iter()
        .rposition(|item| item.strict_equals(&needle))
        .map_or(-1.0, |index| index as f64);
    Ok(Value::Number(found))
}

fn join(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "join")?;
    let separator = match arg(args, 0) {
        Value::Undefined => ",".to_string(),
        other => interp.to_string_value(&other)?,
    };
    let snapshot = array.borrow().clone();
    let mut parts = Vec::with_capacity(snapshot.len());
    for item in &snapshot {
        parts.push(if item.is_nullish() {
            String::new()
        } else {
            interp.to_string_value(item)?
        });
    }
    Ok(Value::from(parts.join(&separator)))
}

fn slice(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "slice")?;
    let items = array.borrow();
    let start = relative_index(&arg(args, 0), items.len(), 0);
    let end = relative_index(&arg(args, 1), items.len(), items.len());
    let slice = if start < end { items[start..end].to_vec() } else { Vec::new() };
    Ok(Value::array(slice))
}

fn splice(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "splice")?;
    let mut items = array.borrow_mut();
    let length = items.len();
    let start = relative_index(&arg(args, 0), length, 0);
    let delete_count = match args.get(1) {
        None => length - start,
        Some(count) => {
            let count = count.to_number();
            if count.is_nan() || count < 0.0 {
                0
            } else {
                (count as usize).min(length - start)
            }
        }
    };
    let inserted = args.iter().skip(2).cloned();
    let removed: Vec<Value> = items.splice(start..start + delete_count, inserted).collect();
    Ok(Value::array(removed))
}

fn concat(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut out = items(this, "concat")?.borrow().clone();
    for value in args {
        match value {
            Value::Array(other) => out.extend(other.borrow().iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::array(out))
}

fn push(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "push")?;
    let mut items = array.borrow_mut();
    items.extend(args.iter().cloned());
    Ok(Value::Number(items.len() as f64))
}

fn pop(_: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    Ok(items(this, "pop")?.borrow_mut().pop().unwrap_or(Value::Undefined))
}

fn shift(_: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    let array = items(this, "shift")?;
    let mut items = array.borrow_mut();
    Ok(if items.is_empty() { Value::Undefined } else { items.remove(0) })
}

fn unshift(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "unshift")?;
    let mut items = array.borrow_mut();
    items.splice(0..0, args.iter().cloned());
    Ok(Value::Number(items.len() as f64))
}

fn reverse(_: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    items(this, "reverse")?.borrow_mut().reverse();
    Ok(this.clone())
}

fn comparator(args: &[Value]) -> EvalResult<Option<Value>> {
    match arg(args, 0) {
        Value::Undefined => Ok(None),
        f if f.is_callable() => Ok(Some(f)),
        _ => Err(EvalError::type_error(
            "The comparison function must be either a function or undefined",
        )),
    }
}

fn sort(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "sort")?;
    let compare = comparator(args)?;
    let snapshot = array.borrow().clone();
    let sorted = merge_sort(interp, snapshot, compare.as_ref())?;
    *array.borrow_mut() = sorted;
    Ok(this.clone())
}

fn to_sorted(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let snapshot = items(this, "toSorted")?.borrow().clone();
    let compare = comparator(args)?;
    Ok(Value::array(merge_sort(interp, snapshot, compare.as_ref())?))
}

/// Stable sort that can call back into script code
fn merge_sort(interp: &mut Interpreter, mut values: Vec<Value>, compare: Option<&Value>) -> EvalResult<Vec<Value>> {
    if values.len() <= 1 {
        return Ok(values);
    }
    let right = values.split_off(values.len() / 2);
    let left = merge_sort(interp, values, compare)?;
    let right = merge_sort(interp, right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        if compare_values(interp, a, b, compare)? == Ordering::Greater {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn compare_values(interp: &mut Interpreter, a: &Value, b: &Value, compare: Option<&Value>) -> EvalResult<Ordering> {
    // `undefined` always sorts last
    match (a.is_undefined(), b.is_undefined()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Greater),
        (false, true) => return Ok(Ordering::Less),
        _ => {}
    }
    match compare {
        Some(f) => {
            let result = interp.call_function(f, Value::Undefined, vec![a.clone(), b.clone()])?;
            let n = result.to_number();
            Ok(if n > 0.0 {
                Ordering::Greater
            } else if n < 0.0 {
                Ordering::Less
            } else {
                Ordering::Equal
            })
        }
        None => {
            let a = interp.to_string_value(a)?;
            let b = interp.to_string_value(b)?;
            Ok(a.cmp(&b))
        }
    }
}

fn flatten_into(out: &mut Vec<Value>, items: &[Value], depth: f64) {
    for item in items {
        match item {
            Value::Array(inner) if depth >= 1.0 => flatten_into(out, &inner.borrow(), depth - 1.0),
            other => out.push(other.clone()),
        }
    }
}

fn flat(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "flat")?;
    let depth = match arg(args, 0) {
        Value::Undefined => 1.0,
        other => other.to_number(),
    };
    let mut out = Vec::new();
    flatten_into(&mut out, &array.borrow(), depth);
    Ok(Value::array(out))
}

fn flat_map(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mapped = map(interp, this, args)?;
    flat(interp, &mapped, &[])
}

fn fill(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "fill")?;
    let value = arg(args, 0);
    let mut items = array.borrow_mut();
    let length = items.len();
    let start = relative_index(&arg(args, 1), length, 0);
    let end = relative_index(&arg(args, 2), length, length);
    for slot in items.iter_mut().take(end).skip(start) {
        *slot = value.clone();
    }
    drop(items);
    Ok(this.clone())
}

fn at(_: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = items(this, "at")?;
    let items = array.borrow();
    let n = arg(args, 0).to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let index = if n < 0.0 { items.len() as f64 + n } else { n };
    if index < 0.0 {
        return Ok(Value::Undefined);
    }
    Ok(items.get(index as usize).cloned().unwrap_or(Value::Undefined))
}

fn keys(_: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    let length = len(&items(this, "keys")?);
    Ok(Value::array((0..length).map(|i| Value::Number(i as f64)).collect()))
}

fn entries(_: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    let array = items(this, "entries")?;
    let entries = array
        .borrow()
        .iter()
        .enumerate()
        .map(|(i, item)| Value::array(vec![Value::Number(i as f64), item.clone()]))
        .collect();
    Ok(Value::array(entries))
}

/// `Array.from(iterable | { length }, mapFn?)`
fn from(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let source = arg(args, 0);
    let items = match &source {
        Value::Array(_) | Value::String(_) => interp.iterate(&source)?,
        Value::Object(_) => {
            let length = interp.get_property(&source, "length")?.to_number();
            let length = if length.is_finite() && length > 0.0 { length as usize } else { 0 };
            let mut items = Vec::with_capacity(length);
            for index in 0..length {
                items.push(interp.get_property(&source, &index.to_string())?);
            }
            items
        }
        Value::Undefined | Value::Null => {
            return Err(EvalError::type_error(format!("{} is not iterable", source.inspect())))
        }
        _ => Vec::new(),
    };
    let Some(f) = args.get(1).filter(|f| f.is_callable()) else {
        return Ok(Value::array(items));
    };
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        out.push(interp.call_function(f, Value::Undefined, vec![item, Value::Number(index as f64)])?);
    }
    Ok(Value::array(out))
}
