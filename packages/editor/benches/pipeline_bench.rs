use criterion::{black_box, criterion_group, criterion_main, Criterion};
use playbox_capabilities::CapabilityRegistry;
use playbox_editor::{LiveSession, Pipeline, PipelineOptions};
use std::rc::Rc;

const FLOW_EXAMPLE: &str = r#"import React, { useState, useMemo } from "react";
import ReactFlow, { Background, Controls, Position } from "reactflow";
import dagre from "dagre";

const initialNodes = ["input", "parse", "check", "emit", "done"].map((id) => ({
    id,
    data: { label: id },
    position: { x: 0, y: 0 },
    sourcePosition: Position.Right,
    targetPosition: Position.Left,
}));
const initialEdges = initialNodes.slice(1).map((node, i) => ({
    id: `e${i}`,
    source: initialNodes[i].id,
    target: node.id,
}));

function layout(nodes, edges) {
    const g = new dagre.graphlib.Graph();
    g.setGraph({ rankdir: "LR" });
    g.setDefaultEdgeLabel(() => ({}));
    nodes.forEach((n) => g.setNode(n.id, { width: 120, height: 40 }));
    edges.forEach((e) => g.setEdge(e.source, e.target));
    dagre.layout(g);
    return nodes.map((n) => ({ ...n, position: { x: g.node(n.id).x - 60, y: g.node(n.id).y - 20 } }));
}

export default function Flow() {
    const [edges] = useState(initialEdges);
    const nodes = useMemo(() => layout(initialNodes, edges), [edges]);
    return (
        <div style={{ height: 400 }}>
            <ReactFlow nodes={nodes} edges={edges} fitView>
                <Background />
                <Controls />
            </ReactFlow>
        </div>
    );
}
"#;

fn pipeline() -> Pipeline {
    Pipeline::new(Rc::new(CapabilityRegistry::standard()), PipelineOptions::default())
}

fn full_recompile(c: &mut Criterion) {
    let pipeline = pipeline();
    c.bench_function("full_recompile", |b| b.iter(|| pipeline.run(black_box(FLOW_EXAMPLE))));
}

fn memoized_edit(c: &mut Criterion) {
    let mut session = match LiveSession::load(pipeline(), FLOW_EXAMPLE) {
        Ok(session) => session,
        Err(err) => panic!("baseline failed: {}", err),
    };
    c.bench_function("memoized_edit", |b| b.iter(|| session.on_text_change(black_box(FLOW_EXAMPLE))));
}

criterion_group!(benches, full_recompile, memoized_edit);
criterion_main!(benches);
