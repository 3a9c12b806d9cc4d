//! Tests for the sandbox executor boundary

use indexmap::IndexMap;
use playbox_evaluator::{execute, Component, EvalError, EvalResult, ExecutorOptions, ModuleResolver, Value};
use std::rc::Rc;

/// Resolver over a fixed table, like the capability registry
struct Modules(IndexMap<String, Value>);

impl ModuleResolver for Modules {
    fn resolve(&self, name: &str) -> EvalResult<Value> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnresolvedDependency { name: name.to_string() })
    }
}

fn stub_modules() -> Rc<dyn ModuleResolver> {
    let m = Value::object_from([
        ("default", Value::string("X")),
        ("a", Value::Number(1.0)),
        ("b", Value::Number(2.0)),
    ]);
    let mut table = IndexMap::new();
    table.insert("m".to_string(), m);
    table.insert("plain".to_string(), Value::object_from([("a", Value::Number(3.0))]));
    Rc::new(Modules(table))
}

fn run(text: &str) -> EvalResult<Component> {
    execute(text, stub_modules(), &Value::Undefined, &ExecutorOptions::default())
}

/// Call the component with no props
fn call(component: &Component) -> Value {
    let mut interp = playbox_evaluator::Interpreter::new(component.realm().clone());
    interp
        .call_function(component.value(), Value::Undefined, vec![Value::empty_object()])
        .expect("component call failed")
}

#[test]
fn test_default_export_slot_is_the_component() {
    let component = run("function Widget() { return 1; }\nexports.default = Widget;").unwrap();
    assert_eq!(component.name(), "Widget");
    assert_eq!(call(&component), Value::Number(1.0));
}

#[test]
fn test_replaced_exports_slot_is_the_component() {
    let component = run("exports = function Direct() { return 'd'; };").unwrap();
    assert_eq!(component.name(), "Direct");
    assert_eq!(call(&component), Value::string("d"));
}

#[test]
fn test_injected_bindings_resolve() {
    let text = r#"
        const __import0 = resolve("m");
        const Foo = __import0.default ?? __import0;
        const { a, b } = __import0;
        const __import1 = resolve("plain");
        const Plain = __import1.default ?? __import1;
        exports.default = function Check() { return [Foo, a, b, Plain.a]; };
    "#;
    let component = run(text).unwrap();
    assert_eq!(call(&component).inspect(), "[ 'X', 1, 2, 3 ]");
}

#[test]
fn test_unresolved_dependency_names_the_module() {
    let err = run("const X = resolve(\"nonexistent-module\");").unwrap_err();
    assert_eq!(
        err,
        EvalError::UnresolvedDependency {
            name: "nonexistent-module".to_string()
        }
    );
    assert!(err.to_string().contains("nonexistent-module"));
}

#[test]
fn test_non_callable_export_is_rejected() {
    let err = run("exports.default = 42;").unwrap_err();
    assert_eq!(err, EvalError::NotAComponent);
    assert_eq!(err.to_string(), "exported value must be a function");

    assert_eq!(run("42;").unwrap_err(), EvalError::NotAComponent);
}

#[test]
fn test_runtime_error_message_surfaces() {
    let err = run("undefinedThing.call();").unwrap_err();
    assert_eq!(err.to_string(), "ReferenceError: undefinedThing is not defined");

    let err = run("throw new Error('boom');").unwrap_err();
    assert_eq!(err.to_string(), "Error: boom");
}

#[test]
fn test_syntax_error_is_reported() {
    let err = run("function (").unwrap_err();
    assert!(matches!(err, EvalError::Syntax { .. }), "{:?}", err);
}

#[test]
fn test_executions_are_independent() {
    // Globals written by one execution are invisible to the next
    run("globalThisLeak = 1; exports.default = () => 1;").unwrap_err();
    let first = run("var shared = 1; exports.default = () => shared;").unwrap();
    let second = run("exports.default = () => typeof shared;").unwrap();
    assert_eq!(call(&first), Value::Number(1.0));
    assert_eq!(call(&second), Value::string("undefined"));
    assert!(!first.ptr_eq(&second));
}

#[test]
fn test_runtime_parameter_is_visible() {
    let runtime = Value::object_from([("version", Value::string("18"))]);
    let component = execute(
        "exports.default = () => React.version;",
        stub_modules(),
        &runtime,
        &ExecutorOptions::default(),
    )
    .unwrap();
    assert_eq!(call(&component), Value::string("18"));
}
