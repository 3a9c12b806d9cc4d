//! `react`: element factory, component base classes and single-pass hooks
//!
//! The preview renders each component exactly once, so hooks hand back their
//! initial values, setters are inert and effects never run.

use super::{insert, members};
use playbox_evaluator::builtins::arg;
use playbox_evaluator::{Element, EvalError, EvalResult, Interpreter, Value};
use std::rc::Rc;

pub const VERSION: &str = "18.2.0";

pub fn module() -> Value {
    let module = members(&[
        ("createElement", create_element),
        ("cloneElement", clone_element),
        ("isValidElement", is_valid_element),
        ("Fragment", fragment),
        ("StrictMode", fragment),
        ("memo", memo),
        ("forwardRef", forward_ref),
        ("createContext", create_context),
        ("createRef", create_ref),
        ("useState", use_state),
        ("useReducer", use_reducer),
        ("useMemo", use_memo),
        ("useCallback", use_callback),
        ("useRef", use_ref),
        ("useEffect", use_effect),
        ("useLayoutEffect", use_effect),
        ("useContext", use_context),
    ]);
    insert(&module, "Children", children());
    insert(&module, "Component", component_class("Component"));
    insert(&module, "PureComponent", component_class("PureComponent"));
    insert(&module, "version", Value::string(VERSION));
    insert(&module, "default", module.clone());
    module
}

// Elements

/// `createElement(type, config, ...children)`
fn create_element(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let element_type = arg(args, 0);
    let config = arg(args, 1);
    let props = Value::empty_object();
    let mut key = None;
    if !config.is_nullish() {
        for name in interp.own_keys(&config) {
            let value = interp.get_property(&config, &name)?;
            match name.as_str() {
                "key" => {
                    if !value.is_nullish() {
                        key = Some(interp.to_string_value(&value)?);
                    }
                }
                "ref" => {}
                _ => interp.set_property(&props, &name, value)?,
            }
        }
    }
    set_children(interp, &props, args.get(2..).unwrap_or_default())?;
    apply_default_props(interp, &element_type, &props)?;
    Ok(element(element_type, props, key))
}

/// `cloneElement(element, config, ...children)`: props merged over the original
fn clone_element(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let Value::Element(original) = arg(args, 0) else {
        return Err(EvalError::type_error(
            "React.cloneElement(...): The argument must be a React element",
        ));
    };
    let props = Value::empty_object();
    for name in interp.own_keys(&original.props) {
        let value = interp.get_property(&original.props, &name)?;
        interp.set_property(&props, &name, value)?;
    }
    let mut key = original.key.clone();
    let config = arg(args, 1);
    if !config.is_nullish() {
        for name in interp.own_keys(&config) {
            let value = interp.get_property(&config, &name)?;
            match name.as_str() {
                "key" => key = Some(interp.to_string_value(&value)?),
                "ref" => {}
                _ => interp.set_property(&props, &name, value)?,
            }
        }
    }
    set_children(interp, &props, args.get(2..).unwrap_or_default())?;
    Ok(element(original.element_type.clone(), props, key))
}

fn is_valid_element(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(arg(args, 0), Value::Element(_))))
}

fn element(element_type: Value, props: Value, key: Option<String>) -> Value {
    Value::Element(Rc::new(Element {
        element_type,
        props,
        key,
    }))
}

/// One child is stored as-is, several as an array, none leaves `props.children` alone
fn set_children(interp: &mut Interpreter, props: &Value, children: &[Value]) -> EvalResult<()> {
    match children {
        [] => Ok(()),
        [only] => interp.set_property(props, "children", only.clone()),
        many => interp.set_property(props, "children", Value::array(many.to_vec())),
    }
}

fn apply_default_props(interp: &mut Interpreter, element_type: &Value, props: &Value) -> EvalResult<()> {
    if !element_type.is_callable() {
        return Ok(());
    }
    let defaults = interp.get_property(element_type, "defaultProps")?;
    if defaults.is_nullish() {
        return Ok(());
    }
    for name in interp.own_keys(&defaults) {
        if interp.get_property(props, &name)?.is_undefined() {
            let value = interp.get_property(&defaults, &name)?;
            interp.set_property(props, &name, value)?;
        }
    }
    Ok(())
}

/// `Fragment` renders its children
fn fragment(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    props_children(interp, &arg(args, 0))
}

fn props_children(interp: &mut Interpreter, props: &Value) -> EvalResult<Value> {
    if props.is_nullish() {
        return Ok(Value::Undefined);
    }
    interp.get_property(props, "children")
}

// Component wrappers

/// Memoisation only matters across re-renders; the component is returned as is
fn memo(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(arg(args, 0))
}

/// `forwardRef(render)`: a component calling `render(props, null)`
fn forward_ref(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let render = arg(args, 0);
    if !render.is_callable() {
        return Err(EvalError::type_error(format!(
            "forwardRef requires a render function but was given {}",
            render.type_of()
        )));
    }
    let name = render.as_function().map(|f| f.name.clone()).unwrap_or_default();
    Ok(Value::native(&name, move |interp, _, args| {
        interp.call_function(&render, Value::Undefined, vec![arg(args, 0), Value::Null])
    }))
}

/// `createContext(defaultValue)`
///
/// Providers render their children without changing what consumers see;
/// `useContext` and `Consumer` always observe the default value.
fn create_context(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let default = arg(args, 0);
    let consumer_default = default.clone();
    let consumer = Value::native("Consumer", move |interp, _, args| {
        let render = props_children(interp, &arg(args, 0))?;
        if render.is_callable() {
            interp.call_function(&render, Value::Undefined, vec![consumer_default.clone()])
        } else {
            Ok(Value::Undefined)
        }
    });
    Ok(Value::object_from([
        ("Provider", Value::native("Provider", fragment)),
        ("Consumer", consumer),
        ("_currentValue", default),
    ]))
}

fn create_ref(_: &mut Interpreter, _: &Value, _: &[Value]) -> EvalResult<Value> {
    Ok(Value::object_from([("current", Value::Null)]))
}

// Hooks

/// `[initialState, setState]`; a function initialiser is called once
fn use_state(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let initial = arg(args, 0);
    let state = if initial.is_callable() {
        interp.call_function(&initial, Value::Undefined, Vec::new())?
    } else {
        initial
    };
    Ok(Value::array(vec![state, inert("setState")]))
}

/// `[init ? init(initialArg) : initialArg, dispatch]`
fn use_reducer(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let initial = arg(args, 1);
    let init = arg(args, 2);
    let state = if init.is_callable() {
        interp.call_function(&init, Value::Undefined, vec![initial])?
    } else {
        initial
    };
    Ok(Value::array(vec![state, inert("dispatch")]))
}

fn use_memo(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let factory = arg(args, 0);
    if !factory.is_callable() {
        return Err(EvalError::type_error(format!("{} is not a function (in useMemo)", factory.inspect())));
    }
    interp.call_function(&factory, Value::Undefined, Vec::new())
}

fn use_callback(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(arg(args, 0))
}

fn use_ref(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::object_from([("current", arg(args, 0))]))
}

fn use_effect(_: &mut Interpreter, _: &Value, _: &[Value]) -> EvalResult<Value> {
    Ok(Value::Undefined)
}

fn use_context(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let context = arg(args, 0);
    if context.is_nullish() {
        return Err(EvalError::type_error("useContext requires a context object"));
    }
    interp.get_property(&context, "_currentValue")
}

/// Setter that accepts anything and changes nothing
fn inert(name: &str) -> Value {
    Value::native(name, |_, _, _| Ok(Value::Undefined))
}

// Children

fn children() -> Value {
    members(&[
        ("toArray", children_to_array),
        ("map", children_map),
        ("forEach", children_for_each),
        ("count", children_count),
        ("only", children_only),
    ])
}

/// Flattened children without `null`, `undefined` or booleans
fn flatten_children(interp: &mut Interpreter, value: &Value, out: &mut Vec<Value>) -> EvalResult<()> {
    match value {
        Value::Undefined | Value::Null | Value::Bool(_) => Ok(()),
        Value::Array(_) => {
            for item in interp.iterate(value)? {
                flatten_children(interp, &item, out)?;
            }
            Ok(())
        }
        other => {
            out.push(other.clone());
            Ok(())
        }
    }
}

fn children_list(interp: &mut Interpreter, args: &[Value]) -> EvalResult<Vec<Value>> {
    let mut out = Vec::new();
    flatten_children(interp, &arg(args, 0), &mut out)?;
    Ok(out)
}

fn children_to_array(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::array(children_list(interp, args)?))
}

fn children_map(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let source = arg(args, 0);
    if source.is_nullish() {
        return Ok(source);
    }
    let callback = arg(args, 1);
    let mut mapped = Vec::new();
    for (index, child) in children_list(interp, args)?.into_iter().enumerate() {
        let result = interp.call_function(&callback, Value::Undefined, vec![child, Value::Number(index as f64)])?;
        flatten_children(interp, &result, &mut mapped)?;
    }
    Ok(Value::array(mapped))
}

fn children_for_each(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let callback = arg(args, 1);
    for (index, child) in children_list(interp, args)?.into_iter().enumerate() {
        interp.call_function(&callback, Value::Undefined, vec![child, Value::Number(index as f64)])?;
    }
    Ok(Value::Undefined)
}

fn children_count(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Number(children_list(interp, args)?.len() as f64))
}

fn children_only(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    match arg(args, 0) {
        child @ Value::Element(_) => Ok(child),
        _ => Err(EvalError::type_error(
            "React.Children.only expected to receive a single React element child.",
        )),
    }
}

// Class components

/// `Component` / `PureComponent`: stores `props` on the instance; the
/// prototype carries `setState` and `forceUpdate`
fn component_class(name: &str) -> Value {
    let class = Value::native(name, |interp, this, args| {
        if matches!(this, Value::Object(_)) {
            interp.set_property(this, "props", arg(args, 0))?;
            interp.set_property(this, "context", arg(args, 1))?;
            if interp.get_property(this, "state")?.is_undefined() {
                interp.set_property(this, "state", Value::Null)?;
            }
        }
        Ok(Value::Undefined)
    });
    let prototype = members(&[("setState", set_state), ("forceUpdate", use_effect)]);
    insert(&prototype, "isReactComponent", Value::empty_object());
    insert(&prototype, "constructor", class.clone());
    insert(&class, "prototype", prototype);
    class
}

/// Merges the update into `this.state`; nothing re-renders
fn set_state(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let previous = interp.get_property(this, "state")?;
    let mut update = arg(args, 0);
    if update.is_callable() {
        let props = interp.get_property(this, "props")?;
        update = interp.call_function(&update, Value::Undefined, vec![previous.clone(), props])?;
    }
    if update.is_nullish() {
        return Ok(Value::Undefined);
    }
    let next = Value::empty_object();
    for source in [&previous, &update] {
        if source.is_nullish() {
            continue;
        }
        for name in interp.own_keys(source) {
            let value = interp.get_property(source, &name)?;
            interp.set_property(&next, &name, value)?;
        }
    }
    interp.set_property(this, "state", next)?;
    Ok(Value::Undefined)
}
