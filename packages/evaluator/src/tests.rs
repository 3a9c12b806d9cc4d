use crate::error::{EvalError, EvalResult};
use crate::execute::ExecutorOptions;
use crate::interpreter::Interpreter;
use crate::realm::Realm;
use crate::value::Value;

/// Run `source` and return the value bound to `result`
fn try_eval(source: &str) -> EvalResult<Value> {
    try_eval_with(source, ExecutorOptions::default())
}

fn try_eval_with(source: &str, options: ExecutorOptions) -> EvalResult<Value> {
    let program = playbox_parser::parse(source)?;
    let realm = Realm::new(options);
    let scope = realm.globals.child();
    let mut interp = Interpreter::new(realm);
    interp.run_program(&program, &scope)?;
    Ok(scope.get("result").unwrap_or(Value::Undefined))
}

fn eval(source: &str) -> Value {
    try_eval(source).expect("evaluation failed")
}

fn eval_display(source: &str) -> String {
    eval(source).to_display_string()
}

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(eval("const result = 1 + 2 * 3 - 4 / 2;"), Value::Number(5.0));
    assert_eq!(eval("const result = 2 ** 3 ** 2;"), Value::Number(512.0));
    assert_eq!(eval("const result = 7 % 3;"), Value::Number(1.0));
    assert_eq!(eval("const result = '3' * '4';"), Value::Number(12.0));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval_display("const result = 'a' + 1 + 2;"), "a12");
    assert_eq!(eval_display("const result = 1 + 2 + 'a';"), "3a");
    assert_eq!(eval_display("const result = [1, 2] + '';"), "1,2");
}

#[test]
fn test_template_literal() {
    let source = "const name = 'Ada'; const n = 3; const result = `hi ${name}, ${n * 2}!`;";
    assert_eq!(eval_display(source), "hi Ada, 6!");
}

#[test]
fn test_equality() {
    assert_eq!(eval("const result = 1 == '1';"), Value::Bool(true));
    assert_eq!(eval("const result = 1 === '1';"), Value::Bool(false));
    assert_eq!(eval("const result = null == undefined;"), Value::Bool(true));
    assert_eq!(eval("const result = null === undefined;"), Value::Bool(false));
    assert_eq!(eval("const result = NaN === NaN;"), Value::Bool(false));
}

#[test]
fn test_logical_operators_short_circuit() {
    let source = r#"
        let calls = 0;
        function touch() { calls++; return true; }
        false && touch();
        true || touch();
        const a = null ?? 'fallback';
        const b = 0 ?? 'unused';
        const result = [calls, a, b];
    "#;
    assert_eq!(eval(source).inspect(), "[ 0, 'fallback', 0 ]");
}

#[test]
fn test_closures_capture_environment() {
    let source = r#"
        function counter() {
            let count = 0;
            return () => ++count;
        }
        const next = counter();
        next();
        next();
        const result = next();
    "#;
    assert_eq!(eval(source), Value::Number(3.0));
}

#[test]
fn test_for_let_binds_per_iteration() {
    let source = r#"
        const fns = [];
        for (let i = 0; i < 3; i++) {
            fns.push(() => i);
        }
        const result = fns.map(f => f());
    "#;
    assert_eq!(eval(source).inspect(), "[ 0, 1, 2 ]");
}

#[test]
fn test_loops_with_break_and_continue() {
    let source = r#"
        let total = 0;
        for (const n of [1, 2, 3, 4, 5, 6]) {
            if (n % 2 === 0) continue;
            if (n > 4) break;
            total += n;
        }
        let i = 0;
        while (i < 10) { i += 3; }
        do { i++; } while (false);
        const result = [total, i];
    "#;
    assert_eq!(eval(source).inspect(), "[ 4, 13 ]");
}

#[test]
fn test_for_in_visits_keys_in_order() {
    let source = r#"
        const keys = [];
        for (const key in { b: 1, a: 2 }) keys.push(key);
        const result = keys.join(",");
    "#;
    assert_eq!(eval_display(source), "b,a");
}

#[test]
fn test_switch_falls_through() {
    let source = r#"
        function label(n) {
            let out = '';
            switch (n) {
                case 1:
                    out += 'one';
                case 2:
                    out += 'two';
                    break;
                default:
                    out = 'many';
            }
            return out;
        }
        const result = [label(1), label(2), label(9)];
    "#;
    assert_eq!(eval(source).inspect(), "[ 'onetwo', 'two', 'many' ]");
}

#[test]
fn test_destructuring() {
    let source = r#"
        const { a, b: renamed, c = 10, ...rest } = { a: 1, b: 2, d: 4, e: 5 };
        const [first, , third = 'x', ...tail] = [1, 2, undefined, 4, 5];
        const result = [a, renamed, c, rest, first, third, tail];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ 1, 2, 10, { d: 4, e: 5 }, 1, 'x', [ 4, 5 ] ]"
    );
}

#[test]
fn test_spread_in_calls_arrays_and_objects() {
    let source = r#"
        const sum = (...xs) => xs.reduce((a, b) => a + b, 0);
        const parts = [1, 2];
        const merged = { ...{ a: 1, b: 1 }, b: 2 };
        const result = [sum(...parts, 3), [...parts, ...'ab'], merged];
    "#;
    assert_eq!(eval(source).inspect(), "[ 6, [ 1, 2, 'a', 'b' ], { a: 1, b: 2 } ]");
}

#[test]
fn test_optional_chaining() {
    let source = r#"
        const data = { user: { name: 'Ada' } };
        const result = [data.user?.name, data.missing?.name, data.missing?.deep.deeper, data.fn?.()];
    "#;
    assert_eq!(eval(source).inspect(), "[ 'Ada', undefined, undefined, undefined ]");
}

#[test]
fn test_classes_with_inheritance() {
    let source = r#"
        class Shape {
            static kind = 'shape';
            constructor(name) { this.name = name; }
            describe() { return this.name + ' with area ' + this.area(); }
            static create(name) { return new this(name); }
        }
        class Square extends Shape {
            constructor(size) {
                super('square');
                this.size = size;
            }
            area() { return this.size * this.size; }
            describe() { return '[' + super.describe() + ']'; }
        }
        const sq = new Square(3);
        const result = [sq.describe(), sq instanceof Square, sq instanceof Shape, Square.kind];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ '[square with area 9]', true, true, 'shape' ]"
    );
}

#[test]
fn test_class_fields_see_this() {
    let source = r#"
        class Counter {
            count = 1;
            double = this.count * 2;
            increment = () => { this.count++; return this.count; };
        }
        const c = new Counter();
        const inc = c.increment;
        inc();
        const result = [c.count, c.double];
    "#;
    assert_eq!(eval(source).inspect(), "[ 2, 2 ]");
}

#[test]
fn test_class_without_new_is_type_error() {
    let err = try_eval("class A {}\nA();").unwrap_err();
    assert!(matches!(err, EvalError::Type { .. }), "{:?}", err);
    assert!(err.to_string().contains("without 'new'"));
}

#[test]
fn test_try_catch_finally() {
    let source = r#"
        const log = [];
        try {
            log.push('try');
            throw new TypeError('bad');
        } catch (e) {
            log.push(e.name + ':' + e.message);
            log.push(e instanceof TypeError);
            log.push(e instanceof Error);
        } finally {
            log.push('finally');
        }
        const result = log;
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ 'try', 'TypeError:bad', true, true, 'finally' ]"
    );
}

#[test]
fn test_runtime_errors_are_catchable() {
    let source = r#"
        let message;
        try { missing.value; } catch (e) { message = e.message; }
        const result = message;
    "#;
    assert_eq!(eval_display(source), "missing is not defined");
}

#[test]
fn test_uncaught_throw_carries_message() {
    let err = try_eval("throw new Error('boom');").unwrap_err();
    assert_eq!(err.to_string(), "Error: boom");

    let err = try_eval("throw 'plain';").unwrap_err();
    assert_eq!(err.to_string(), "plain");
}

#[test]
fn test_reference_error() {
    let err = try_eval("const result = nope + 1;").unwrap_err();
    assert_eq!(err.to_string(), "ReferenceError: nope is not defined");
}

#[test]
fn test_const_assignment_fails() {
    let err = try_eval("const x = 1; x = 2;").unwrap_err();
    assert_eq!(err.to_string(), "TypeError: Assignment to constant variable.");
}

#[test]
fn test_let_redeclaration_is_syntax_error() {
    let err = try_eval("let x = 1; let x = 2;").unwrap_err();
    assert!(matches!(err, EvalError::Syntax { .. }), "{:?}", err);
}

#[test]
fn test_reading_property_of_undefined() {
    let err = try_eval("const o = {}; const result = o.a.b;").unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: Cannot read properties of undefined (reading 'b')"
    );
}

#[test]
fn test_call_depth_is_bounded() {
    let options = ExecutorOptions {
        max_call_depth: 50,
        ..ExecutorOptions::default()
    };
    let err = try_eval_with("function f(n) { return f(n + 1); }\nf(0);", options).unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Maximum call stack size exceeded");
}

/// Frames that nest blocks, loops and literals stop at whichever of the stack
/// budget or the call limit comes first, on the default test thread stack
#[test]
fn test_nested_recursion_stays_within_stack_budget() {
    let source = r#"
        function f(n) {
            if (true) {
                for (const x of [1]) {
                    try { return [[[{ a: (((f(n + 1)))) }]]]; } finally {}
                }
            }
        }
        f(0);
    "#;
    let err = try_eval(source).unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Maximum call stack size exceeded");
}

#[test]
fn test_stack_exhaustion_is_catchable() {
    let source = r#"
        function down(n) { return down(n + 1) + 1; }
        let result;
        try { down(0); } catch (e) { result = e.name + ": " + e.message; }
    "#;
    assert_eq!(eval_display(source), "RangeError: Maximum call stack size exceeded");
}

#[test]
fn test_cyclic_array_converts_to_string() {
    let source = r#"
        const a = [1, 2];
        a.push(a);
        const result = String(a) + "|" + [a, [3]].join(";");
    "#;
    assert_eq!(eval_display(source), "1,2,|1,2,;3");
}

#[test]
fn test_function_hoisting() {
    let source = r#"
        const result = twice(4);
        function twice(n) { return n * 2; }
    "#;
    assert_eq!(eval(source), Value::Number(8.0));
}

#[test]
fn test_this_binding_and_bind() {
    let source = r#"
        const obj = {
            name: 'obj',
            plain() { return this.name; },
            arrow() { return [1].map(() => this.name)[0]; },
        };
        const other = { name: 'other' };
        const bound = obj.plain.bind(other);
        const result = [obj.plain(), obj.arrow(), bound(), obj.plain.call(other), obj.plain.apply(other, [])];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ 'obj', 'obj', 'other', 'other', 'other' ]"
    );
}

#[test]
fn test_typeof() {
    let source = r#"
        const result = [typeof 1, typeof 'a', typeof undefined, typeof null, typeof {}, typeof [], typeof (() => 1), typeof undeclared];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ 'number', 'string', 'undefined', 'object', 'object', 'object', 'function', 'undefined' ]"
    );
}

#[test]
fn test_array_methods() {
    let source = r#"
        const xs = [5, 1, 4, 2, 3];
        const result = [
            xs.filter(x => x > 2).map(x => x * 10),
            xs.slice().sort((a, b) => a - b),
            xs.find(x => x < 3),
            xs.findIndex(x => x === 4),
            xs.some(x => x > 4),
            xs.every(x => x > 0),
            xs.includes(2),
            xs.indexOf(9),
            [[1, [2]], [3]].flat(),
            xs.slice(-2),
            [3, 20, 100].sort(),
        ];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ [ 50, 40, 30 ], [ 1, 2, 3, 4, 5 ], 1, 2, true, true, true, -1, [ 1, [ 2 ], 3 ], [ 2, 3 ], [ 100, 20, 3 ] ]"
    );
}

#[test]
fn test_array_mutation() {
    let source = r#"
        const xs = [1, 2, 3];
        xs.push(4, 5);
        const popped = xs.pop();
        const shifted = xs.shift();
        xs.unshift(0);
        const removed = xs.splice(1, 2, 'a', 'b', 'c');
        xs.length = 3;
        const result = [xs, popped, shifted, removed];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ [ 0, 'a', 'b' ], 5, 1, [ 2, 3 ] ]"
    );
}

#[test]
fn test_sort_is_stable() {
    let source = r#"
        const people = [
            { name: 'a', age: 30 },
            { name: 'b', age: 20 },
            { name: 'c', age: 30 },
            { name: 'd', age: 20 },
        ];
        const result = people.sort((x, y) => x.age - y.age).map(p => p.name).join('');
    "#;
    assert_eq!(eval_display(source), "bdac");
}

#[test]
fn test_string_methods() {
    let source = r#"
        const s = '  Hello, World  ';
        const t = s.trim();
        const result = [
            t.toUpperCase(),
            t.split(', '),
            t.slice(-5),
            t.substring(7, 0),
            t.replace('l', 'L'),
            t.replaceAll('l', 'L'),
            t.indexOf('World'),
            t.startsWith('Hell'),
            '7'.padStart(3, '0'),
            'ab'.repeat(3),
            t.at(-1),
            t.charAt(1),
        ];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ 'HELLO, WORLD', [ 'Hello', 'World' ], 'World', 'Hello, ', 'HeLlo, World', 'HeLLo, WorLd', 7, true, '007', 'ababab', 'd', 'e' ]"
    );
}

#[test]
fn test_strings_index_by_char() {
    let source = "const s = 'héllo'; const result = [s.length, s[1], s.slice(1, 3)];";
    assert_eq!(eval(source).inspect(), "[ 5, 'é', 'él' ]");
}

#[test]
fn test_number_formatting() {
    let source = r#"
        const result = [
            (3.14159).toFixed(2),
            (255).toString(16),
            String(0.1 + 0.2),
            String(1e21),
            String(-0),
            parseInt('42px'),
            parseInt('ff', 16),
            parseFloat('3.5rem'),
            Number(''),
            Number('abc'),
            (1234567.5).toLocaleString(),
        ];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ '3.14', 'ff', '0.30000000000000004', '1e+21', '0', 42, 255, 3.5, 0, NaN, '1,234,567.5' ]"
    );
}

#[test]
fn test_object_statics() {
    let source = r#"
        const o = { a: 1, b: 2 };
        const frozen = Object.freeze({ x: 1 });
        let failed = false;
        try { frozen.x = 2; } catch (e) { failed = true; }
        const result = [
            Object.keys(o),
            Object.values(o),
            Object.entries(o),
            Object.assign({}, o, { c: 3 }),
            Object.fromEntries([['k', 'v']]),
            failed,
            'a' in o,
            o.hasOwnProperty('b'),
        ];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ [ 'a', 'b' ], [ 1, 2 ], [ [ 'a', 1 ], [ 'b', 2 ] ], { a: 1, b: 2, c: 3 }, { k: 'v' }, true, true, true ]"
    );
}

#[test]
fn test_json_round_trip() {
    let source = r#"
        const text = JSON.stringify({ a: [1, 'x', null, undefined], b: { c: true }, skip: undefined, f() {} });
        const back = JSON.parse(text);
        const result = [text, back.a[1], JSON.stringify([1, 2], null, 2)];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ '{\"a\":[1,\"x\",null,null],\"b\":{\"c\":true}}', 'x', '[\n  1,\n  2\n]' ]"
    );
}

#[test]
fn test_json_parse_error_is_catchable() {
    let source = r#"
        let name;
        try { JSON.parse('{oops'); } catch (e) { name = e.name; }
        const result = name;
    "#;
    assert_eq!(eval_display(source), "SyntaxError");
}

#[test]
fn test_json_rejects_cycles() {
    let err = try_eval("const a = {}; a.self = a; JSON.stringify(a);").unwrap_err();
    assert_eq!(err.to_string(), "TypeError: Converting circular structure to JSON");
}

#[test]
fn test_math_is_deterministic() {
    let first = eval("const result = [Math.random(), Math.random()];").inspect();
    let second = eval("const result = [Math.random(), Math.random()];").inspect();
    assert_eq!(first, second);
    assert_eq!(eval("const result = Math.max(1, 5, 3) + Math.min() ;"), Value::Number(f64::INFINITY));
    assert_eq!(eval("const result = Math.round(2.5) + Math.floor(-1.5);"), Value::Number(1.0));
}

#[test]
fn test_error_constructors() {
    let source = r#"
        const e = new RangeError('too far', { cause: 'why' });
        const plain = Error('called plainly');
        class AppError extends Error {
            constructor(message) {
                super(message);
                this.name = 'AppError';
            }
        }
        const custom = new AppError('custom');
        const result = [String(e), e.cause, plain.message, String(custom), custom instanceof Error];
    "#;
    assert_eq!(
        eval(source).inspect(),
        "[ 'RangeError: too far', 'why', 'called plainly', 'AppError: custom', true ]"
    );
}

#[test]
fn test_compound_assignment_operators() {
    let source = r#"
        let a = 1;
        a += 2; a *= 3; a -= 1; a /= 2; a %= 3;
        let b = null;
        b ??= 'set';
        let c = 0;
        c ||= 5;
        let d = 1;
        d &&= 7;
        const o = { n: 1 };
        o.n += 1;
        o['n'] **= 3;
        const result = [a, b, c, d, o.n];
    "#;
    assert_eq!(eval(source).inspect(), "[ 1, 'set', 5, 7, 8 ]");
}

#[test]
fn test_conditional_and_comma() {
    let source = "let x = 0; const result = (x++, x++, x > 1 ? 'big' : 'small');";
    assert_eq!(eval_display(source), "big");
}

#[test]
fn test_syntax_error_has_span() {
    let err = try_eval("const = 1;").unwrap_err();
    assert!(matches!(err, EvalError::Syntax { .. }));
    assert!(err.span().is_some());
}
