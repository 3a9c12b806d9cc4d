//! Capability modules exercised through executed text

use playbox_capabilities::{CapabilityRegistry, RegistryConfig};
use playbox_evaluator::{execute, render_component, Component, ExecutorOptions, ModuleResolver, VNode, Value};
use std::rc::Rc;

fn run(text: &str) -> Component {
    let registry = Rc::new(CapabilityRegistry::standard());
    let runtime = registry.runtime();
    execute(text, registry as Rc<dyn ModuleResolver>, &runtime, &ExecutorOptions::default())
        .expect("execution failed")
}

fn render(text: &str) -> Vec<VNode> {
    render_component(&run(text), Value::Undefined).expect("render failed")
}

/// Text content of the single rendered root
fn rendered_text(text: &str) -> String {
    let nodes = render(text);
    nodes.iter().map(VNode::text_content).collect()
}

#[test]
fn test_unknown_module_fails_execution() {
    let registry = Rc::new(CapabilityRegistry::standard());
    let err = execute(
        r#"const x = resolve("left-pad"); exports.default = () => null;"#,
        registry as Rc<dyn ModuleResolver>,
        &Value::Undefined,
        &ExecutorOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Cannot find module: left-pad");
}

#[test]
fn test_react_default_is_the_module() {
    let text = r#"
        const R = resolve("react").default;
        exports.default = () => React.createElement("i", null, String(R === React));
    "#;
    assert_eq!(rendered_text(text), "true");
}

#[test]
fn test_module_objects_are_frozen() {
    let registry = Rc::new(CapabilityRegistry::standard());
    let runtime = registry.runtime();
    let err = execute(
        r#"resolve("react").createElement = null; exports.default = () => null;"#,
        registry.clone() as Rc<dyn ModuleResolver>,
        &runtime,
        &ExecutorOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("TypeError: Cannot assign"), "{}", err);

    // Later executions still see the untouched module
    let component = execute(
        r#"exports.default = () => React.createElement("b", null, "ok");"#,
        registry as Rc<dyn ModuleResolver>,
        &runtime,
        &ExecutorOptions::default(),
    )
    .unwrap();
    let nodes = render_component(&component, Value::Undefined).unwrap();
    assert_eq!(nodes[0].text_content(), "ok");
}

#[test]
fn test_hooks_return_initial_values() {
    let text = r#"
        const { useState, useMemo, useRef, useEffect, useReducer, useCallback } = resolve("react");
        exports.default = function Counter() {
            const [count, setCount] = useState(() => 41);
            const doubled = useMemo(() => count * 2, [count]);
            const ref = useRef("r");
            const [state] = useReducer((s, a) => s, 1, n => n + 1);
            const onClick = useCallback(() => setCount(count + 1), [count]);
            useEffect(() => { throw new Error("effects do not run"); }, []);
            setCount(0);
            return React.createElement("span", { onClick }, count, "/", doubled, "/", ref.current, "/", state);
        };
    "#;
    assert_eq!(rendered_text(text), "41/82/r/2");
}

#[test]
fn test_context_default_value() {
    let text = r#"
        const Theme = React.createContext("light");
        function Label() {
            const theme = React.useContext(Theme);
            return React.createElement("em", null, theme);
        }
        exports.default = () => React.createElement(Theme.Provider, { value: "dark" },
            React.createElement(Label, null),
            React.createElement(Theme.Consumer, null, value => "+" + value));
    "#;
    assert_eq!(rendered_text(text), "light+light");
}

#[test]
fn test_class_component_extends_runtime_component() {
    let text = r#"
        class Hello extends React.Component {
            constructor(props) {
                super(props);
                this.state = { n: 1 };
            }
            render() {
                this.setState({ m: 2 });
                return React.createElement("p", null, this.props.name, this.state.n, this.state.m);
            }
        }
        Hello.defaultProps = { name: "anon" };
        exports.default = () => React.createElement(Hello, null);
    "#;
    assert_eq!(rendered_text(text), "anon12");
}

#[test]
fn test_memo_forward_ref_and_children_helpers() {
    let text = r#"
        const Item = React.memo(({ label }) => React.createElement("li", null, label));
        const Input = React.forwardRef((props, ref) => React.createElement("input", { value: props.value, ref }));
        function List({ children }) {
            const items = React.Children.toArray(children);
            return React.createElement("ul", { "data-count": React.Children.count(children) }, items);
        }
        exports.default = () => React.createElement(React.Fragment, null,
            React.createElement(List, null, React.createElement(Item, { label: "a" }), null, [React.createElement(Item, { label: "b" })]),
            React.createElement(Input, { value: "v" }));
    "#;
    let nodes = render(text);
    assert_eq!(nodes.len(), 2);
    let VNode::Element { attributes, children, .. } = &nodes[0] else {
        panic!("expected list");
    };
    assert_eq!(attributes.get("data-count").map(String::as_str), Some("2"));
    assert_eq!(children.len(), 2);
    assert_eq!(nodes[0].text_content(), "ab");
    assert_eq!(nodes[1].tag(), Some("input"));
}

#[test]
fn test_reactflow_components_are_host_nodes() {
    let text = r#"
        const ReactFlow = resolve("reactflow").default;
        const { Background, Controls, Position, MarkerType } = resolve("reactflow");
        const nodes = [{ id: "1", position: { x: 0, y: 0 }, sourcePosition: Position.Right, data: { label: "A" } }];
        const edges = [{ id: "e", source: "1", target: "1", markerEnd: { type: MarkerType.ArrowClosed } }];
        exports.default = () => React.createElement(ReactFlow, { nodes, edges, fitView: true },
            React.createElement(Background, null),
            React.createElement(Controls, null));
    "#;
    let nodes = render(text);
    let VNode::Host { name, props, children, .. } = &nodes[0] else {
        panic!("expected host node, got {:?}", nodes[0]);
    };
    assert_eq!(name, "ReactFlow");
    assert_eq!(props["nodes"][0]["sourcePosition"], "right");
    assert_eq!(props["edges"][0]["markerEnd"]["type"], "arrowclosed");
    assert_eq!(props["fitView"], true);
    assert_eq!(children.len(), 2);
    assert!(matches!(&children[0], VNode::Host { name, .. } if name == "Background"));
}

#[test]
fn test_reactflow_graph_helpers() {
    let text = r#"
        const { addEdge, applyNodeChanges, applyEdgeChanges, useNodesState } = resolve("reactflow");
        let edges = addEdge({ source: "a", target: "b" }, []);
        edges = addEdge({ source: "a", target: "b" }, edges);
        edges = addEdge({ source: "b" }, edges);
        const [initial] = useNodesState([{ id: "a", position: { x: 0, y: 0 } }, { id: "b", position: { x: 5, y: 5 } }]);
        const moved = applyNodeChanges([
            { type: "position", id: "a", position: { x: 10, y: 20 } },
            { type: "select", id: "b", selected: true },
            { type: "add", item: { id: "c", position: { x: 1, y: 1 } } },
        ], initial);
        const remaining = applyEdgeChanges([{ type: "remove", id: edges[0].id }], edges);
        const summary = [
            edges.length, edges[0].id,
            moved.length, moved[0].position.x, moved[1].selected, initial[0].position.x,
            remaining.length,
        ].join(",");
        exports.default = () => summary;
    "#;
    assert_eq!(rendered_text(text), "1,reactflow__edge-a-b,3,10,true,0,0");
}

#[test]
fn test_dagre_layout_assigns_centres() {
    let text = r#"
        const dagre = resolve("dagre");
        const g = new dagre.graphlib.Graph();
        g.setGraph({ rankdir: "LR", nodesep: 10, ranksep: 20 });
        g.setDefaultEdgeLabel(() => ({}));
        for (const id of ["a", "b", "c"]) {
            g.setNode(id, { width: 100, height: 40 });
        }
        g.setEdge("a", "b");
        g.setEdge("a", "c");
        dagre.layout(g);
        const out = g.nodes().map(id => `${id}:${g.node(id).x},${g.node(id).y}`).join(" ");
        const size = `${g.graph().width}x${g.graph().height}`;
        const points = g.edge("a", "b").points.length;
        exports.default = () => [out, " ", size, " ", points];
    "#;
    assert_eq!(rendered_text(text), "a:50,45 b:170,20 c:170,70 220x90 3");
}

#[test]
fn test_dagre_graph_queries() {
    let text = r#"
        const { graphlib } = resolve("dagre");
        const g = new graphlib.Graph();
        g.setEdge("x", "y", { weight: 2 });
        g.setEdge({ v: "y", w: "z" });
        g.setNode("x", { width: 1 });
        g.removeNode("z");
        const summary = [
            g.nodes().join("|"), g.edges().length, g.hasEdge("x", "y"), g.edge("x", "y").weight,
            g.successors("x").join("|"), g.predecessors("y").join("|"), g.node("x").width,
        ].join(",");
        exports.default = () => summary;
    "#;
    assert_eq!(rendered_text(text), "x|y,1,true,2,y,x,1");
}

#[test]
fn test_alias_reaches_the_same_capability() {
    let config = RegistryConfig::default().with_alias("@xyflow/react", "reactflow");
    let registry = Rc::new(CapabilityRegistry::from_config(&config).unwrap());
    let runtime = registry.runtime();
    let component = execute(
        r#"const same = resolve("@xyflow/react") === resolve("reactflow");
           exports.default = () => String(same);"#,
        registry as Rc<dyn ModuleResolver>,
        &runtime,
        &ExecutorOptions::default(),
    )
    .unwrap();
    let nodes = render_component(&component, Value::Undefined).unwrap();
    assert_eq!(nodes[0].text_content(), "true");
}
