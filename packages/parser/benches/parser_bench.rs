use criterion::{black_box, criterion_group, criterion_main, Criterion};
use playbox_parser::{parse, tokenize};

const COUNTER: &str = r#"
    function Counter({ start = 0, label }) {
        const [count, setCount] = React.useState(start);
        const doubled = React.useMemo(() => count * 2, [count]);
        return React.createElement("button", { onClick: () => setCount(count + 1) },
            `${label ?? "Count"}: ${count} (${doubled})`);
    }
    exports.default = Counter;
"#;

fn parse_small_component(c: &mut Criterion) {
    c.bench_function("parse_small_component", |b| b.iter(|| parse(black_box(COUNTER))));
}

fn parse_large_file(c: &mut Criterion) {
    let mut source = String::new();
    for i in 0..50 {
        source.push_str(&format!(
            r#"
            class Widget{i} extends Base {{
                constructor(props) {{
                    super(props);
                    this.state = {{ open: false, items: [1, 2, 3].map((n) => n * {i}) }};
                }}
                render() {{
                    const {{ open, items }} = this.state;
                    if (!open) return null;
                    return items.filter((n) => n % 2 === 0).reduce((a, b) => a + b, 0);
                }}
            }}
            "#,
            i = i
        ));
    }

    c.bench_function("parse_large_file", |b| b.iter(|| parse(black_box(&source))));
}

fn tokenize_only(c: &mut Criterion) {
    c.bench_function("tokenize_only", |b| b.iter(|| tokenize(black_box(COUNTER))));
}

criterion_group!(benches, parse_small_component, parse_large_file, tokenize_only);
criterion_main!(benches);
