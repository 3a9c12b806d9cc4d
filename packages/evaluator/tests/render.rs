//! Tests for preview rendering

use playbox_evaluator::{
    execute, render_component, Component, Element, EvalError, EvalResult, ExecutorOptions, ModuleResolver,
    VNode, Value,
};
use std::rc::Rc;

struct NoModules;

impl ModuleResolver for NoModules {
    fn resolve(&self, name: &str) -> EvalResult<Value> {
        Err(EvalError::UnresolvedDependency { name: name.to_string() })
    }
}

/// Minimal runtime: `createElement`, `Fragment` and one host component
fn runtime() -> Value {
    let create_element = Value::native("createElement", |interp, _, args| {
        let element_type = args.first().cloned().unwrap_or(Value::Undefined);
        let config = args.get(1).cloned().unwrap_or(Value::Null);
        let props = Value::empty_object();
        let mut key = None;
        if !config.is_nullish() {
            for name in interp.own_keys(&config) {
                let value = interp.get_property(&config, &name)?;
                if name == "key" {
                    key = Some(value.to_display_string());
                } else {
                    interp.set_property(&props, &name, value)?;
                }
            }
        }
        let children = &args[args.len().min(2)..];
        match children.len() {
            0 => {}
            1 => interp.set_property(&props, "children", children[0].clone())?,
            _ => interp.set_property(&props, "children", Value::array(children.to_vec()))?,
        }
        Ok(Value::Element(Rc::new(Element {
            element_type,
            props,
            key,
        })))
    });
    let fragment = Value::native("Fragment", |interp, _, args| match args.first() {
        Some(props) if !props.is_nullish() => interp.get_property(props, "children"),
        _ => Ok(Value::Undefined),
    });
    Value::object_from([
        ("createElement", create_element),
        ("Fragment", fragment),
        ("Chart", Value::host_component("Chart")),
    ])
}

fn compile(text: &str) -> Component {
    execute(text, Rc::new(NoModules), &runtime(), &ExecutorOptions::default()).expect("execution failed")
}

fn render(text: &str) -> Vec<VNode> {
    render_component(&compile(text), Value::Undefined).expect("render failed")
}

#[test]
fn test_intrinsic_element_attributes() {
    let nodes = render(
        r#"exports.default = () => React.createElement("label", {
            className: "field",
            htmlFor: "name",
            disabled: true,
            hidden: false,
            title: undefined,
            tabIndex: 2,
            onClick: () => {},
        }, "Name");"#,
    );
    assert_eq!(nodes.len(), 1);
    let VNode::Element { tag, attributes, events, children, .. } = &nodes[0] else {
        panic!("expected element, got {:?}", nodes[0]);
    };
    assert_eq!(tag, "label");
    assert_eq!(attributes.get("class").map(String::as_str), Some("field"));
    assert_eq!(attributes.get("for").map(String::as_str), Some("name"));
    assert_eq!(attributes.get("disabled").map(String::as_str), Some(""));
    assert_eq!(attributes.get("tabIndex").map(String::as_str), Some("2"));
    assert!(!attributes.contains_key("hidden"));
    assert!(!attributes.contains_key("title"));
    assert_eq!(events, &vec!["onClick".to_string()]);
    assert_eq!(children, &vec![VNode::text("Name")]);
}

#[test]
fn test_style_object_becomes_css() {
    let nodes = render(
        r#"exports.default = () => React.createElement("div", {
            style: { backgroundColor: "red", width: 10, opacity: 0.5, margin: 0, display: null }
        });"#,
    );
    let VNode::Element { style, .. } = &nodes[0] else {
        panic!("expected element");
    };
    assert_eq!(
        style.as_deref(),
        Some("background-color: red; width: 10px; opacity: 0.5; margin: 0")
    );
}

#[test]
fn test_children_flatten_and_skip_empty_values() {
    let nodes = render(
        r#"exports.default = () => React.createElement("ul", null,
            [1, 2].map(n => React.createElement("li", { key: n }, "item ", n)),
            null, false, undefined, true,
            React.createElement(React.Fragment, null, "a", "b")
        );"#,
    );
    let children = nodes[0].children();
    assert_eq!(children.len(), 4);
    assert_eq!(children[0].text_content(), "item 1");
    assert_eq!(children[1].text_content(), "item 2");
    let VNode::Element { key, .. } = &children[1] else {
        panic!("expected element");
    };
    assert_eq!(key.as_deref(), Some("2"));
    assert_eq!(children[2], VNode::text("a"));
    assert_eq!(children[3], VNode::text("b"));
}

#[test]
fn test_function_components_receive_props_and_children() {
    let text = r#"
        function Card({ title, children }) {
            return React.createElement("section", null,
                React.createElement("h1", null, title),
                children);
        }
        exports.default = function App(props) {
            return React.createElement(Card, { title: props.heading ?? "Untitled" }, "body");
        };
    "#;
    let component = compile(text);
    let props = playbox_evaluator::props_from_json(&serde_json::json!({ "heading": "Hello" }));
    let nodes = render_component(&component, props).unwrap();
    assert_eq!(nodes[0].tag(), Some("section"));
    assert_eq!(nodes[0].text_content(), "Hellobody");

    let nodes = render_component(&component, Value::Undefined).unwrap();
    assert_eq!(nodes[0].text_content(), "Untitledbody");
}

#[test]
fn test_class_components_render() {
    let text = r#"
        class Greeting {
            constructor(props) { this.greeting = "Hi"; }
            render() { return React.createElement("p", null, this.greeting, " ", this.props.name); }
        }
        exports.default = () => React.createElement(Greeting, { name: "Ada" });
    "#;
    let nodes = render(text);
    assert_eq!(nodes[0].text_content(), "Hi Ada");
}

#[test]
fn test_host_components_keep_json_props() {
    let text = r#"
        exports.default = () => React.createElement(React.Chart, {
            nodes: [{ id: "1", position: { x: 0, y: 0 } }],
            fitView: true,
            onNodesChange: () => {},
        }, React.createElement("span", null, "legend"));
    "#;
    let nodes = render(text);
    let VNode::Host { name, props, children, .. } = &nodes[0] else {
        panic!("expected host node, got {:?}", nodes[0]);
    };
    assert_eq!(name, "Chart");
    assert_eq!(
        props,
        &serde_json::json!({ "nodes": [{ "id": "1", "position": { "x": 0, "y": 0 } }], "fitView": true })
    );
    assert_eq!(children[0].text_content(), "legend");
}

#[test]
fn test_render_serializes_with_type_tags() {
    let nodes = render(r#"exports.default = () => React.createElement("b", null, "x");"#);
    let json = serde_json::to_value(&nodes).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "type": "Element",
            "tag": "b",
            "attributes": {},
            "children": [{ "type": "Text", "content": "x" }]
        }])
    );
}

#[test]
fn test_object_child_is_an_error() {
    let component = compile(r#"exports.default = () => React.createElement("div", null, { a: 1 });"#);
    let err = render_component(&component, Value::Undefined).unwrap_err();
    assert!(err.to_string().contains("Objects are not valid as a React child"), "{}", err);
}

#[test]
fn test_errors_thrown_while_rendering_surface() {
    let text = r#"
        function Broken() { throw new Error("render failed"); }
        exports.default = () => React.createElement(Broken, null);
    "#;
    let err = render_component(&compile(text), Value::Undefined).unwrap_err();
    assert_eq!(err.to_string(), "Error: render failed");
}

#[test]
fn test_self_rendering_component_is_bounded() {
    let text = r#"
        function Loop() { return React.createElement(Loop, null); }
        exports.default = Loop;
    "#;
    let component = execute(
        text,
        Rc::new(NoModules),
        &runtime(),
        &ExecutorOptions {
            max_call_depth: 20,
            ..ExecutorOptions::default()
        },
    )
    .unwrap();
    let err = render_component(&component, Value::Undefined).unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Maximum call stack size exceeded");
}
