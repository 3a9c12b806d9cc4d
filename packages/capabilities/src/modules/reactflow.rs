//! `reactflow`: diagram widget
//!
//! The widget itself is drawn by the display surface, so its components are
//! host components that reach the render tree with their JSON props. The
//! pure graph helpers (`addEdge`, `applyNodeChanges`, ...) run here.

use super::{insert, members, string_enum};
use playbox_evaluator::builtins::arg;
use playbox_evaluator::{EvalResult, Interpreter, Value};

/// Components rendered by the display surface
pub const HOST_COMPONENTS: [&str; 6] = ["ReactFlow", "Background", "Controls", "MiniMap", "Panel", "Handle"];

pub fn module() -> Value {
    let module = members(&[
        ("useNodesState", use_list_state),
        ("useEdgesState", use_list_state),
        ("useReactFlow", use_react_flow),
        ("addEdge", add_edge),
        ("applyNodeChanges", apply_changes),
        ("applyEdgeChanges", apply_changes),
    ]);
    for name in HOST_COMPONENTS {
        let component = Value::host_component(name);
        if name == "ReactFlow" {
            insert(&module, "default", component.clone());
        }
        insert(&module, name, component);
    }
    insert(
        &module,
        "ReactFlowProvider",
        Value::native("ReactFlowProvider", |interp, _, args| {
            let props = arg(args, 0);
            if props.is_nullish() {
                return Ok(Value::Undefined);
            }
            interp.get_property(&props, "children")
        }),
    );
    insert(
        &module,
        "Position",
        string_enum(&[("Left", "left"), ("Top", "top"), ("Right", "right"), ("Bottom", "bottom")]),
    );
    insert(
        &module,
        "MarkerType",
        string_enum(&[("Arrow", "arrow"), ("ArrowClosed", "arrowclosed")]),
    );
    insert(
        &module,
        "ConnectionLineType",
        string_enum(&[
            ("Bezier", "default"),
            ("Straight", "straight"),
            ("Step", "step"),
            ("SmoothStep", "smoothstep"),
            ("SimpleBezier", "simplebezier"),
        ]),
    );
    insert(
        &module,
        "BackgroundVariant",
        string_enum(&[("Lines", "lines"), ("Dots", "dots"), ("Cross", "cross")]),
    );
    module
}

/// `[initial, setList, onListChange]`
fn use_list_state(_: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::array(vec![arg(args, 0), inert("setState"), inert("onChange")]))
}

/// Instance API; viewport operations do nothing outside the display surface
fn use_react_flow(_: &mut Interpreter, _: &Value, _: &[Value]) -> EvalResult<Value> {
    let instance = Value::object_from(
        ["fitView", "zoomIn", "zoomOut", "zoomTo", "setViewport", "setNodes", "setEdges", "addNodes", "addEdges"]
            .into_iter()
            .map(|name| (name, inert(name))),
    );
    insert(&instance, "getNodes", Value::native("getNodes", |_, _, _| Ok(Value::array(Vec::new()))));
    insert(&instance, "getEdges", Value::native("getEdges", |_, _, _| Ok(Value::array(Vec::new()))));
    Ok(instance)
}

fn inert(name: &str) -> Value {
    Value::native(name, |_, _, _| Ok(Value::Undefined))
}

/// `addEdge(edgeParams, edges)`: new array with the edge appended, unless it
/// lacks an endpoint or duplicates an existing connection
fn add_edge(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let params = arg(args, 0);
    let edges = arg(args, 1);
    let existing = if edges.is_nullish() { Vec::new() } else { interp.iterate(&edges)? };
    if params.is_nullish() {
        return Ok(Value::array(existing));
    }
    let endpoint = |interp: &mut Interpreter, value: &Value, key: &str| -> EvalResult<String> {
        let field = interp.get_property(value, key)?;
        if field.is_nullish() {
            Ok(String::new())
        } else {
            interp.to_string_value(&field)
        }
    };
    let source = endpoint(interp, &params, "source")?;
    let target = endpoint(interp, &params, "target")?;
    if source.is_empty() || target.is_empty() {
        return Ok(Value::array(existing));
    }
    let source_handle = endpoint(interp, &params, "sourceHandle")?;
    let target_handle = endpoint(interp, &params, "targetHandle")?;

    for edge in &existing {
        if edge.is_nullish() {
            continue;
        }
        if endpoint(interp, edge, "source")? == source
            && endpoint(interp, edge, "target")? == target
            && endpoint(interp, edge, "sourceHandle")? == source_handle
            && endpoint(interp, edge, "targetHandle")? == target_handle
        {
            return Ok(Value::array(existing));
        }
    }

    let edge = shallow_copy(interp, &params)?;
    if interp.get_property(&edge, "id")?.is_nullish() {
        let id = edge_id(&source, &source_handle, &target, &target_handle);
        interp.set_property(&edge, "id", Value::from(id))?;
    }
    let mut next = existing;
    next.push(edge);
    Ok(Value::array(next))
}

pub fn edge_id(source: &str, source_handle: &str, target: &str, target_handle: &str) -> String {
    format!("reactflow__edge-{}{}-{}{}", source, source_handle, target, target_handle)
}

/// `applyNodeChanges(changes, nodes)` / `applyEdgeChanges(changes, edges)`
///
/// Returns a new array; changed items are copied, untouched items are shared.
fn apply_changes(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let changes = arg(args, 0);
    let items = arg(args, 1);
    let mut items = if items.is_nullish() { Vec::new() } else { interp.iterate(&items)? };
    let changes = if changes.is_nullish() { Vec::new() } else { interp.iterate(&changes)? };

    for change in &changes {
        if change.is_nullish() {
            continue;
        }
        let kind = interp.get_property(change, "type")?.to_display_string();
        match kind.as_str() {
            "add" => items.push(interp.get_property(change, "item")?),
            "remove" => {
                let id = interp.get_property(change, "id")?;
                let mut kept = Vec::with_capacity(items.len());
                for item in items {
                    if item.is_nullish() || !interp.get_property(&item, "id")?.strict_equals(&id) {
                        kept.push(item);
                    }
                }
                items = kept;
            }
            "reset" | "replace" => {
                let replacement = interp.get_property(change, "item")?;
                let id = interp.get_property(change, "id")?;
                if let Some(index) = position_of(interp, &items, &id)? {
                    items[index] = replacement;
                }
            }
            "position" | "select" | "dimensions" => {
                let id = interp.get_property(change, "id")?;
                let Some(index) = position_of(interp, &items, &id)? else {
                    continue;
                };
                let item = shallow_copy(interp, &items[index])?;
                apply_update(interp, &kind, change, &item)?;
                items[index] = item;
            }
            _ => {}
        }
    }
    Ok(Value::array(items))
}

fn apply_update(interp: &mut Interpreter, kind: &str, change: &Value, item: &Value) -> EvalResult<()> {
    match kind {
        "position" => {
            let position = interp.get_property(change, "position")?;
            if !position.is_nullish() {
                interp.set_property(item, "position", position)?;
            }
            let absolute = interp.get_property(change, "positionAbsolute")?;
            if !absolute.is_nullish() {
                interp.set_property(item, "positionAbsolute", absolute)?;
            }
            let dragging = interp.get_property(change, "dragging")?;
            if !dragging.is_undefined() {
                interp.set_property(item, "dragging", dragging)?;
            }
        }
        "select" => {
            let selected = interp.get_property(change, "selected")?;
            interp.set_property(item, "selected", Value::Bool(selected.truthy()))?;
        }
        "dimensions" => {
            let dimensions = interp.get_property(change, "dimensions")?;
            if !dimensions.is_nullish() {
                for key in ["width", "height"] {
                    let value = interp.get_property(&dimensions, key)?;
                    interp.set_property(item, key, value)?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn position_of(interp: &Interpreter, items: &[Value], id: &Value) -> EvalResult<Option<usize>> {
    for (index, item) in items.iter().enumerate() {
        if !item.is_nullish() && interp.get_property(item, "id")?.strict_equals(id) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn shallow_copy(interp: &Interpreter, value: &Value) -> EvalResult<Value> {
    let copy = Value::empty_object();
    for key in interp.own_keys(value) {
        let field = interp.get_property(value, &key)?;
        interp.set_property(&copy, &key, field)?;
    }
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id_format() {
        assert_eq!(edge_id("a", "", "b", ""), "reactflow__edge-a-b");
        assert_eq!(edge_id("a", "out", "b", "in"), "reactflow__edge-aout-bin");
    }
}
