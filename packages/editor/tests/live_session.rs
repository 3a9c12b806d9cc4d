//! Live session behaviour: idempotence, fallback on failure, reset

use playbox_capabilities::CapabilityRegistry;
use playbox_editor::{FailureKind, LiveSession, Pipeline, PipelineOptions, Recompute};
use playbox_evaluator::{render_component, ExecutorOptions, Value};
use std::rc::Rc;

const BASELINE: &str = r#"import React from "react";

export default function Greeting() {
    return <p className="greeting">Hello</p>;
}
"#;

fn pipeline() -> Pipeline {
    Pipeline::new(Rc::new(CapabilityRegistry::standard()), PipelineOptions::default())
}

fn session() -> LiveSession {
    LiveSession::load(pipeline(), BASELINE).expect("baseline compiles")
}

fn rendered_text(session: &LiveSession) -> String {
    session
        .render(Value::Undefined)
        .expect("render")
        .iter()
        .map(|node| node.text_content())
        .collect()
}

#[test]
fn test_unchanged_text_does_not_recompute() {
    let mut session = session();
    assert_eq!(session.on_text_change(BASELINE), Recompute::Unchanged);
    assert_eq!(session.recompute_count(), 0);

    let edited = BASELINE.replace("Hello", "Hi");
    assert_eq!(session.on_text_change(&edited), Recompute::Compiled);
    let shown = session.component().clone();
    assert_eq!(session.on_text_change(&edited), Recompute::Unchanged);
    assert_eq!(session.on_text_change(&edited), Recompute::Unchanged);
    assert_eq!(session.recompute_count(), 1);
    assert!(session.component().ptr_eq(&shown));
    assert_eq!(rendered_text(&session), "Hi");
}

#[test]
fn test_same_failing_text_is_not_recompiled() {
    let mut session = session();
    let broken = "export default function Greeting() { return <p>; }";
    assert_eq!(session.on_text_change(broken), Recompute::Failed(FailureKind::Compile));
    assert_eq!(session.on_text_change(broken), Recompute::Unchanged);
    assert_eq!(session.recompute_count(), 1);
    assert!(session.diagnostic().is_some());
}

#[test]
fn test_failing_edit_keeps_last_component() {
    let mut session = session();
    let baseline = session.component().clone();

    let outcome = session.on_text_change("export default function Greeting() { return <div><span></div>; }");
    assert_eq!(outcome, Recompute::Failed(FailureKind::Compile));

    let state = session.render_state();
    assert!(state.component.ptr_eq(&baseline));
    assert!(state.diagnostic.is_some_and(|message| !message.is_empty()));
    assert_eq!(rendered_text(&session), "Hello");
}

#[test]
fn test_successful_edit_becomes_the_fallback() {
    let mut session = session();
    let second = BASELINE.replace("Hello", "Second");
    assert_eq!(session.on_text_change(&second), Recompute::Compiled);
    let second_component = session.component().clone();

    session.on_text_change("export default function Greeting() { return <p>; }");
    assert!(session.component().ptr_eq(&second_component));
    assert_eq!(rendered_text(&session), "Second");

    // Returning to the last good text clears the diagnostic without a recompile
    let count = session.recompute_count();
    assert_eq!(session.on_text_change(&second), Recompute::Restored);
    assert_eq!(session.recompute_count(), count);
    assert!(session.diagnostic().is_none());
}

#[test]
fn test_unresolvable_dependency_is_named() {
    let mut session = session();
    let outcome = session.on_text_change(
        "import X from \"nonexistent-module\";\nexport default function App() { return <X />; }",
    );
    assert_eq!(outcome, Recompute::Failed(FailureKind::UnresolvedDependency));
    let diagnostic = session.diagnostic().expect("diagnostic");
    assert!(diagnostic.contains("nonexistent-module"), "{}", diagnostic);
}

#[test]
fn test_non_component_export_is_rejected() {
    let mut session = session();
    let baseline = session.component().clone();
    let outcome = session.on_text_change("export default 42");
    assert_eq!(outcome, Recompute::Failed(FailureKind::NotAComponent));
    assert_eq!(session.diagnostic().as_deref(), Some("exported value must be a function"));
    assert!(session.component().ptr_eq(&baseline));
}

#[test]
fn test_runtime_error_uses_the_exception_message() {
    let mut session = session();
    let outcome = session.on_text_change(
        "const config = undefined;\nconst size = config.size;\nexport default function App() { return null; }",
    );
    assert_eq!(outcome, Recompute::Failed(FailureKind::Runtime));
    let diagnostic = session.diagnostic().expect("diagnostic");
    assert!(diagnostic.starts_with("TypeError: Cannot read properties of undefined"), "{}", diagnostic);

    session.on_text_change("throw new Error(\"boom\");\nexport default function App() { return null; }");
    assert_eq!(session.diagnostic().as_deref(), Some("Error: boom"));
}

#[test]
fn test_reset_restores_baseline_exactly() {
    let mut session = session();
    let baseline = session.baseline_component().clone();

    session.on_text_change(&BASELINE.replace("Hello", "One"));
    session.on_text_change("export default function Greeting() { return <p>; }");
    session.on_text_change(&BASELINE.replace("Hello", "Two"));
    session.on_text_change("export default 42");
    assert!(session.is_edited());

    session.reset();
    let state = session.render_state();
    assert!(state.component.ptr_eq(&baseline));
    assert!(state.diagnostic.is_none());
    assert_eq!(session.text(), BASELINE);
    assert!(!session.is_edited());
    assert_eq!(rendered_text(&session), "Hello");

    // The baseline text is memoized again after reset
    let count = session.recompute_count();
    assert_eq!(session.on_text_change(BASELINE), Recompute::Unchanged);
    assert_eq!(session.recompute_count(), count);
}

#[test]
fn test_default_binding_capture() {
    let pipeline = pipeline();
    let text = "export default function Widget(){ return 1 }";
    let unit = pipeline.compile(text).unwrap();
    assert_eq!(unit.default_binding.as_deref(), Some("Widget"));

    let component = pipeline.run(text).unwrap();
    assert_eq!(component.name(), "Widget");
    let nodes = render_component(&component, Value::Undefined).unwrap();
    assert_eq!(nodes[0].text_content(), "1");
}

#[test]
fn test_first_default_export_wins() {
    let pipeline = pipeline();
    let text = "export default function First() { return 1; }\nfunction Second() { return 2; }\nexport default Second;";
    let unit = pipeline.compile(text).unwrap();
    assert_eq!(unit.default_binding.as_deref(), Some("First"));
    assert_eq!(pipeline.run(text).unwrap().name(), "First");
}

/// Import forms resolve to the bindings a module system would produce
#[test]
fn test_rewritten_imports_bind_like_modules() {
    let stub = Value::object_from([
        ("default", Value::from("X")),
        ("a", Value::from(1.0)),
        ("b", Value::from(2.0)),
    ]);
    let registry = CapabilityRegistry::builder()
        .module("m", stub)
        .unwrap()
        .module("plain", Value::object_from([("a", Value::from(1.0))]))
        .unwrap()
        .build()
        .unwrap();
    let pipeline = Pipeline::new(Rc::new(registry), PipelineOptions::default());

    let cases = [
        ("import Foo, { a, b } from \"m\";", "[Foo, a, b]", "X,1,2"),
        ("import * as N from \"m\";", "[N.default, N.a, N.b]", "X,1,2"),
        ("import { a, b as c } from \"m\";", "[a, c]", "1,2"),
        ("import Foo from \"m\";", "Foo", "X"),
        ("import Plain from \"plain\";", "Plain.a", "1"),
        ("import \"./theme.css\";", "\"css dropped\"", "css dropped"),
        ("import \"m\";", "\"bare import dropped\"", "bare import dropped"),
    ];
    for (import, expr, expected) in cases {
        let text = format!("{}\nexport default function Probe() {{ return String({}); }}", import, expr);
        let component = pipeline
            .run(&text)
            .unwrap_or_else(|err| panic!("{}: {}", import, err));
        let nodes = render_component(&component, Value::Undefined).unwrap();
        assert_eq!(nodes[0].text_content(), expected, "{}", import);
    }
}

#[test]
fn test_unbounded_recursion_is_a_diagnostic() {
    let options = PipelineOptions {
        executor: ExecutorOptions {
            max_call_depth: 20,
            ..ExecutorOptions::default()
        },
        ..PipelineOptions::default()
    };
    let pipeline = Pipeline::new(Rc::new(CapabilityRegistry::standard()), options);
    let mut session = LiveSession::load(pipeline, BASELINE).unwrap();
    let outcome = session.on_text_change("function f() { return f(); }\nf();\nexport default function App() { return null; }");
    assert_eq!(outcome, Recompute::Failed(FailureKind::Runtime));
    assert_eq!(
        session.diagnostic().as_deref(),
        Some("RangeError: Maximum call stack size exceeded")
    );
}

#[test]
fn test_deeply_nested_code_is_a_compile_failure() {
    let mut session = session();
    let baseline = session.component().clone();
    let text = format!(
        "const x = {}1{};\nexport default function App() {{ return null; }}",
        "(".repeat(5000),
        ")".repeat(5000)
    );
    assert_eq!(session.on_text_change(&text), Recompute::Failed(FailureKind::Compile));
    let diagnostic = session.diagnostic().expect("diagnostic");
    assert!(diagnostic.contains("Code is nested too deeply"), "{}", diagnostic);
    assert!(session.component().ptr_eq(&baseline));
    assert_eq!(rendered_text(&session), "Hello");
}

#[test]
fn test_deeply_nested_markup_is_a_compile_failure() {
    let mut session = session();
    let baseline = session.component().clone();
    let text = format!(
        "export default function App() {{ return {}x{}; }}",
        "<div>".repeat(5000),
        "</div>".repeat(5000)
    );
    assert_eq!(session.on_text_change(&text), Recompute::Failed(FailureKind::Compile));
    let diagnostic = session.diagnostic().expect("diagnostic");
    assert!(diagnostic.starts_with("Markup is nested too deeply"), "{}", diagnostic);
    assert!(session.component().ptr_eq(&baseline));
}

#[test]
fn test_recursion_with_nested_bodies_is_a_diagnostic() {
    let mut session = session();
    let baseline = session.component().clone();
    let text = "function f(n) { if (true) { for (const x of [1]) { try { return [[[{ a: (((f(n + 1)))) }]]]; } finally {} } } }\nf(0);\nexport default function App() { return null; }";
    assert_eq!(session.on_text_change(text), Recompute::Failed(FailureKind::Runtime));
    assert_eq!(
        session.diagnostic().as_deref(),
        Some("RangeError: Maximum call stack size exceeded")
    );
    assert!(session.component().ptr_eq(&baseline));
}

#[test]
fn test_baseline_must_compile() {
    let err = LiveSession::load(pipeline(), "export default 42").err().expect("baseline error");
    assert_eq!(err.to_string(), "Baseline failed to compile: exported value must be a function");
}

#[test]
fn test_open_reads_baseline_from_file() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join("playbox_live_session_test");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("greeting.jsx");
    std::fs::write(&path, BASELINE)?;

    let session = LiveSession::open(pipeline(), &path)?;
    assert_eq!(session.baseline_text(), BASELINE);
    assert_eq!(rendered_text(&session), "Hello");

    std::fs::remove_file(&path)?;
    Ok(())
}
