use crate::{compile_markup, compile_unit, CompileOptions};

fn compile(source: &str) -> String {
    compile_markup(source, &CompileOptions::default()).expect("Failed to compile")
}

fn compile_err(source: &str) -> String {
    compile_markup(source, &CompileOptions::default())
        .expect_err("Expected a compile error")
        .message
}

#[test]
fn test_self_closing_element() {
    assert_eq!(compile("<br />"), "React.createElement(\"br\", null)");
}

#[test]
fn test_component_with_expression_attribute_and_child() {
    let result = compile("const App = () => <Card title={name}><span>{count}</span></Card>;");
    assert_eq!(
        result,
        "const App = () => React.createElement(Card, { title: name }, React.createElement(\"span\", null, count));"
    );
}

#[test]
fn test_fragment() {
    assert_eq!(
        compile("<><a /></>"),
        "React.createElement(React.Fragment, null, React.createElement(\"a\", null))"
    );
}

#[test]
fn test_member_expression_tag() {
    assert_eq!(
        compile("<Flow.Provider value={v} />"),
        "React.createElement(Flow.Provider, { value: v })"
    );
}

#[test]
fn test_spread_boolean_and_dashed_attributes() {
    assert_eq!(
        compile("<input {...rest} disabled data-id=\"x\" />"),
        "React.createElement(\"input\", { ...rest, disabled: true, \"data-id\": \"x\" })"
    );
}

#[test]
fn test_string_attribute_is_escaped() {
    assert_eq!(
        compile("<a title='say \"hi\"' />"),
        "React.createElement(\"a\", { title: \"say \\\"hi\\\"\" })"
    );
}

#[test]
fn test_nested_markup_inside_expression_container() {
    let result = compile("<ul>{items.map(i => <li key={i}>{i}</li>)}</ul>");
    assert_eq!(
        result,
        "React.createElement(\"ul\", null, items.map(i => React.createElement(\"li\", { key: i }, i)))"
    );
}

#[test]
fn test_multiline_text_is_collapsed_and_lines_are_kept() {
    let source = "const el = (\n  <p>\n    Hello\n    world\n  </p>\n);";
    let result = compile(source);

    println!("Generated code:\n{}", result);

    assert!(result.contains("React.createElement(\"p\", null, \"Hello world\""));
    assert_eq!(result.lines().count(), source.lines().count());
}

#[test]
fn test_entities_in_text() {
    assert_eq!(
        compile("<p>a &amp; b</p>"),
        "React.createElement(\"p\", null, \"a & b\")"
    );
}

#[test]
fn test_comment_only_container_is_dropped() {
    assert_eq!(
        compile("<div>{/* note */}</div>"),
        "React.createElement(\"div\", null)"
    );
}

#[test]
fn test_markup_after_return() {
    let result = compile("function A() {\n  return <b>x</b>;\n}");
    assert_eq!(
        result,
        "function A() {\n  return React.createElement(\"b\", null, \"x\");\n}"
    );
}

#[test]
fn test_comparisons_are_not_markup() {
    let source = "if (a < b && c > d) { x = a<b; }";
    assert_eq!(compile(source), source);
}

#[test]
fn test_literals_are_copied_verbatim() {
    let source = "const s = \"<div>\";\nconst t = `<span>${ \"<i>\" }</span>`;\n// <p>\n";
    assert_eq!(compile(source), source);
}

#[test]
fn test_template_substitution_may_contain_markup() {
    assert_eq!(
        compile("const t = `${<b />}`;"),
        "const t = `${React.createElement(\"b\", null)}`;"
    );
}

#[test]
fn test_custom_pragma() {
    let options = CompileOptions {
        pragma: "h".to_string(),
        pragma_frag: "Frag".to_string(),
        ..CompileOptions::default()
    };
    let result = compile_markup("<><i /></>", &options).unwrap();
    assert_eq!(result, "h(Frag, null, h(\"i\", null))");
}

#[test]
fn test_compilation_is_pure() {
    let source = "const App = () => <div className=\"x\">{label}</div>;";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn test_mismatched_closing_tag() {
    let message = compile_err("<div></span>");
    assert!(message.contains("Expected corresponding JSX closing tag for <div>"));
}

#[test]
fn test_unterminated_element() {
    let message = compile_err("const a = <div>hello");
    assert!(message.contains("Unterminated JSX contents"));
}

#[test]
fn test_empty_attribute_expression() {
    let message = compile_err("<div a={} />");
    assert!(message.contains("non-empty expression"));
}

#[test]
fn test_error_position() {
    let err = compile_markup("const a = 1;\nconst b = <div></p>;", &CompileOptions::default()).unwrap_err();
    assert_eq!(err.pos.line, 2);
    assert_eq!(err.pos.column, 16);
}

#[test]
fn test_unbalanced_code_around_markup() {
    assert!(compile_err("function f() {\n  return <div />;\n").contains("Unclosed '{'"));
    assert!(compile_err("a = (1));").contains("Unexpected ')'"));
    assert!(compile_err("a = [1, 2);").contains("expected ']'"));
}

#[test]
fn test_unit_appends_default_postamble() {
    let unit = compile_unit("function App() { return <i />; }", Some("App"), &CompileOptions::default()).unwrap();
    assert_eq!(unit.default_binding.as_deref(), Some("App"));
    assert!(unit.executable_text.starts_with("function App() { return React.createElement(\"i\", null); }"));
    assert!(unit
        .executable_text
        .ends_with("\nif (typeof App !== \"undefined\") { exports.default = App; }\n"));
}

#[test]
fn test_unit_without_default_binding() {
    let unit = compile_unit("const x = 1;", None, &CompileOptions::default()).unwrap();
    assert_eq!(unit.executable_text, "const x = 1;");
    assert_eq!(unit.default_binding, None);
}

#[test]
fn test_deeply_nested_markup_is_rejected() {
    let depth = 5000;
    let source = format!("const x = {}{};", "<div>".repeat(depth), "</div>".repeat(depth));
    assert_eq!(compile_err(&source), "Markup is nested too deeply");

    let containers = format!("const x = {}1{};", "<b>{".repeat(depth), "}</b>".repeat(depth));
    assert_eq!(compile_err(&containers), "Markup is nested too deeply");
}

#[test]
fn test_moderately_nested_markup_compiles() {
    let source = format!("const x = {}{};", "<div>".repeat(30), "</div>".repeat(30));
    let output = compile(&source);
    assert_eq!(output.matches("React.createElement(\"div\"").count(), 30);
}
