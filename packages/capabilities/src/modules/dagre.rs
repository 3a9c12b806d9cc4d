//! `dagre`: directed graph container and layered layout
//!
//! A `graphlib.Graph` instance keeps its state in script-visible fields:
//! `_nodes` (id to label object), `_edges` (array of `{ v, w, label }`),
//! `_label` and `_defaultEdgeLabel`. `layout(g)` writes centre `x`/`y` into
//! every node label, `points` into object edge labels and `width`/`height`
//! into the graph label.

use super::layout::{self, LayoutOptions, RankDir, Size};
use super::{insert, members};
use playbox_evaluator::builtins::arg;
use playbox_evaluator::{EvalError, EvalResult, Interpreter, Value};
use tracing::debug;

pub const VERSION: &str = "0.8.5";

pub fn module() -> Value {
    Value::object_from([
        ("graphlib", Value::object_from([("Graph", graph_class())])),
        ("layout", Value::native("layout", run_layout)),
        ("version", Value::string(VERSION)),
    ])
}

fn graph_class() -> Value {
    let class = Value::native("Graph", |interp, this, args| {
        if !matches!(this, Value::Object(_)) {
            return Err(EvalError::type_error(
                "Class constructor Graph cannot be invoked without 'new'",
            ));
        }
        let options = arg(args, 0);
        interp.set_property(this, "_options", if options.is_nullish() { Value::empty_object() } else { options })?;
        interp.set_property(this, "_nodes", Value::empty_object())?;
        interp.set_property(this, "_edges", Value::array(Vec::new()))?;
        interp.set_property(this, "_label", Value::Undefined)?;
        interp.set_property(this, "_defaultEdgeLabel", Value::Undefined)?;
        Ok(Value::Undefined)
    });
    let prototype = members(&[
        ("setGraph", set_graph),
        ("graph", graph),
        ("setDefaultEdgeLabel", set_default_edge_label),
        ("setNode", set_node),
        ("node", node),
        ("hasNode", has_node),
        ("removeNode", remove_node),
        ("nodes", nodes),
        ("nodeCount", node_count),
        ("setEdge", set_edge),
        ("edge", edge),
        ("hasEdge", has_edge),
        ("removeEdge", remove_edge),
        ("edges", edges),
        ("edgeCount", edge_count),
        ("successors", successors),
        ("predecessors", predecessors),
    ]);
    insert(&prototype, "constructor", class.clone());
    insert(&class, "prototype", prototype);
    class
}

/// `_nodes` and `_edges` of a graph instance
fn state(interp: &Interpreter, this: &Value) -> EvalResult<(Value, Value)> {
    if !matches!(this, Value::Object(_)) {
        return Err(EvalError::type_error("Graph method called on a non-graph value"));
    }
    let nodes = interp.get_property(this, "_nodes")?;
    let edges = interp.get_property(this, "_edges")?;
    match (&nodes, &edges) {
        (Value::Object(_), Value::Array(_)) => Ok((nodes, edges)),
        _ => Err(EvalError::type_error("Graph method called on a non-graph value")),
    }
}

fn key(value: &Value) -> String {
    value.to_property_key()
}

fn edge_list(edges: &Value) -> Vec<Value> {
    match edges {
        Value::Array(items) => items.borrow().clone(),
        _ => Vec::new(),
    }
}

/// `(v, w)` from either `(v, w)` or `({ v, w })`, plus the index of the next argument
fn endpoints(interp: &Interpreter, args: &[Value]) -> EvalResult<(String, String, usize)> {
    let first = arg(args, 0);
    if matches!(first, Value::Object(_)) {
        let v = interp.get_property(&first, "v")?;
        let w = interp.get_property(&first, "w")?;
        return Ok((key(&v), key(&w), 1));
    }
    Ok((key(&first), key(&arg(args, 1)), 2))
}

/// Index of the stored `v -> w` edge
fn find_edge(interp: &Interpreter, edges: &Value, v: &str, w: &str) -> EvalResult<Option<usize>> {
    for (index, edge) in edge_list(edges).iter().enumerate() {
        if key(&interp.get_property(edge, "v")?) == v && key(&interp.get_property(edge, "w")?) == w {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

// Graph label

fn set_graph(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    interp.set_property(this, "_label", arg(args, 0))?;
    Ok(this.clone())
}

fn graph(interp: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    interp.get_property(this, "_label")
}

fn set_default_edge_label(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    interp.set_property(this, "_defaultEdgeLabel", arg(args, 0))?;
    Ok(this.clone())
}

// Nodes

/// `setNode(v, label)`: an existing label is kept when none is given
fn set_node(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (nodes, _) = state(interp, this)?;
    let id = key(&arg(args, 0));
    if args.len() > 1 || !interp.has_property(&nodes, &id) {
        interp.set_property(&nodes, &id, arg(args, 1))?;
    }
    Ok(this.clone())
}

fn node(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (nodes, _) = state(interp, this)?;
    interp.get_property(&nodes, &key(&arg(args, 0)))
}

fn has_node(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (nodes, _) = state(interp, this)?;
    Ok(Value::Bool(interp.has_property(&nodes, &key(&arg(args, 0)))))
}

fn remove_node(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (nodes, edges) = state(interp, this)?;
    let id = key(&arg(args, 0));
    if let Value::Object(object) = &nodes {
        object.borrow_mut().properties.shift_remove(&id);
    }
    let mut kept = Vec::new();
    for edge in edge_list(&edges) {
        let v = key(&interp.get_property(&edge, "v")?);
        let w = key(&interp.get_property(&edge, "w")?);
        if v != id && w != id {
            kept.push(edge);
        }
    }
    if let Value::Array(items) = &edges {
        *items.borrow_mut() = kept;
    }
    Ok(this.clone())
}

fn nodes(interp: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    let (nodes, _) = state(interp, this)?;
    Ok(Value::array(interp.own_keys(&nodes).into_iter().map(Value::from).collect()))
}

fn node_count(interp: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    let (nodes, _) = state(interp, this)?;
    Ok(Value::Number(interp.own_keys(&nodes).len() as f64))
}

// Edges

/// `setEdge(v, w, label)` or `setEdge({ v, w }, label)`; missing endpoints
/// become nodes, unlabelled edges take the default edge label
fn set_edge(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (nodes, edges) = state(interp, this)?;
    let (v, w, next) = endpoints(interp, args)?;
    let given = args.len() > next;
    let label = arg(args, next);

    if let Some(index) = find_edge(interp, &edges, &v, &w)? {
        if given {
            let existing = edge_list(&edges)[index].clone();
            interp.set_property(&existing, "label", label)?;
        }
        return Ok(this.clone());
    }

    for id in [&v, &w] {
        if !interp.has_property(&nodes, id) {
            interp.set_property(&nodes, id, Value::Undefined)?;
        }
    }
    let label = if given {
        label
    } else {
        let default = interp.get_property(this, "_defaultEdgeLabel")?;
        if default.is_callable() {
            interp.call_function(&default, Value::Undefined, vec![Value::from(v.as_str()), Value::from(w.as_str())])?
        } else {
            default
        }
    };
    let record = Value::object_from([
        ("v", Value::from(v.as_str())),
        ("w", Value::from(w.as_str())),
        ("label", label),
    ]);
    if let Value::Array(items) = &edges {
        items.borrow_mut().push(record);
    }
    Ok(this.clone())
}

fn edge(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (_, edges) = state(interp, this)?;
    let (v, w, _) = endpoints(interp, args)?;
    match find_edge(interp, &edges, &v, &w)? {
        Some(index) => interp.get_property(&edge_list(&edges)[index], "label"),
        None => Ok(Value::Undefined),
    }
}

fn has_edge(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (_, edges) = state(interp, this)?;
    let (v, w, _) = endpoints(interp, args)?;
    Ok(Value::Bool(find_edge(interp, &edges, &v, &w)?.is_some()))
}

fn remove_edge(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let (_, edges) = state(interp, this)?;
    let (v, w, _) = endpoints(interp, args)?;
    if let (Some(index), Value::Array(items)) = (find_edge(interp, &edges, &v, &w)?, &edges) {
        items.borrow_mut().remove(index);
    }
    Ok(this.clone())
}

/// `[{ v, w }, ...]` in insertion order
fn edges(interp: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    let (_, edges) = state(interp, this)?;
    let mut out = Vec::new();
    for edge in edge_list(&edges) {
        out.push(Value::object_from([
            ("v", interp.get_property(&edge, "v")?),
            ("w", interp.get_property(&edge, "w")?),
        ]));
    }
    Ok(Value::array(out))
}

fn edge_count(interp: &mut Interpreter, this: &Value, _: &[Value]) -> EvalResult<Value> {
    let (_, edges) = state(interp, this)?;
    Ok(Value::Number(edge_list(&edges).len() as f64))
}

fn successors(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    neighbours(interp, this, args, "v", "w")
}

fn predecessors(interp: &mut Interpreter, this: &Value, args: &[Value]) -> EvalResult<Value> {
    neighbours(interp, this, args, "w", "v")
}

fn neighbours(interp: &Interpreter, this: &Value, args: &[Value], from: &str, to: &str) -> EvalResult<Value> {
    let (nodes, edges) = state(interp, this)?;
    let id = key(&arg(args, 0));
    if !interp.has_property(&nodes, &id) {
        return Ok(Value::Undefined);
    }
    let mut out: Vec<Value> = Vec::new();
    for edge in edge_list(&edges) {
        if key(&interp.get_property(&edge, from)?) == id {
            let other = interp.get_property(&edge, to)?;
            if !out.iter().any(|seen| seen.strict_equals(&other)) {
                out.push(other);
            }
        }
    }
    Ok(Value::array(out))
}

// Layout

fn number_or(value: &Value, default: f64) -> f64 {
    match value {
        Value::Number(n) if n.is_finite() => *n,
        Value::String(_) => {
            let n = value.to_number();
            if n.is_finite() {
                n
            } else {
                default
            }
        }
        _ => default,
    }
}

fn layout_options(interp: &Interpreter, label: &Value) -> EvalResult<LayoutOptions> {
    let defaults = LayoutOptions::default();
    if label.is_nullish() {
        return Ok(defaults);
    }
    let rankdir = match interp.get_property(label, "rankdir")? {
        Value::String(text) => RankDir::parse(&text),
        _ => defaults.rankdir,
    };
    Ok(LayoutOptions {
        rankdir,
        nodesep: number_or(&interp.get_property(label, "nodesep")?, defaults.nodesep),
        ranksep: number_or(&interp.get_property(label, "ranksep")?, defaults.ranksep),
        marginx: number_or(&interp.get_property(label, "marginx")?, defaults.marginx),
        marginy: number_or(&interp.get_property(label, "marginy")?, defaults.marginy),
    })
}

fn point(x: f64, y: f64) -> Value {
    Value::object_from([("x", Value::Number(x)), ("y", Value::Number(y))])
}

/// `layout(g)`
fn run_layout(interp: &mut Interpreter, _: &Value, args: &[Value]) -> EvalResult<Value> {
    let graph = arg(args, 0);
    let (nodes, edges) = state(interp, &graph)?;
    let graph_label = interp.get_property(&graph, "_label")?;
    let options = layout_options(interp, &graph_label)?;

    let ids = interp.own_keys(&nodes);
    let mut labels = Vec::with_capacity(ids.len());
    let mut sizes = Vec::with_capacity(ids.len());
    for id in &ids {
        let mut label = interp.get_property(&nodes, id)?;
        if !matches!(label, Value::Object(_)) {
            label = Value::empty_object();
            interp.set_property(&nodes, id, label.clone())?;
        }
        sizes.push(Size {
            width: number_or(&interp.get_property(&label, "width")?, 0.0),
            height: number_or(&interp.get_property(&label, "height")?, 0.0),
        });
        labels.push(label);
    }

    let records = edge_list(&edges);
    let mut pairs = Vec::with_capacity(records.len());
    for record in &records {
        let v = key(&interp.get_property(record, "v")?);
        let w = key(&interp.get_property(record, "w")?);
        if let (Some(from), Some(to)) = (ids.iter().position(|id| *id == v), ids.iter().position(|id| *id == w)) {
            pairs.push((from, to, record.clone()));
        }
    }
    let index_pairs: Vec<(usize, usize)> = pairs.iter().map(|(from, to, _)| (*from, *to)).collect();

    let result = layout::layout(&sizes, &index_pairs, &options);
    debug!(
        nodes = ids.len(),
        edges = index_pairs.len(),
        width = result.width,
        height = result.height,
        "dagre layout"
    );

    for (label, position) in labels.iter().zip(&result.positions) {
        interp.set_property(label, "x", Value::Number(position.x))?;
        interp.set_property(label, "y", Value::Number(position.y))?;
    }
    for (from, to, record) in &pairs {
        let label = interp.get_property(record, "label")?;
        if !matches!(label, Value::Object(_)) {
            continue;
        }
        let (a, b) = (result.positions[*from], result.positions[*to]);
        let points = vec![
            point(a.x, a.y),
            point((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
            point(b.x, b.y),
        ];
        interp.set_property(&label, "points", Value::array(points))?;
    }
    if matches!(graph_label, Value::Object(_)) {
        interp.set_property(&graph_label, "width", Value::Number(result.width))?;
        interp.set_property(&graph_label, "height", Value::Number(result.height))?;
    }
    Ok(Value::Undefined)
}
