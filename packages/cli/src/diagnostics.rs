//! Span-annotated rendering of pipeline failures

use ariadne::{Color, Label, Report, ReportKind, Source};
use playbox_editor::{Pipeline, PipelineError};
use playbox_evaluator::EvalError;
use playbox_rewriter::rewrite;

/// Text a failure's span points into. Compile errors are positioned in the
/// rewritten text, execution errors in the fully compiled text.
fn spanned_text(pipeline: &Pipeline, source: &str, err: &PipelineError) -> Option<String> {
    match err {
        PipelineError::Compile(_) => Some(rewrite(source).text),
        PipelineError::Execution(_) => pipeline.compile(source).ok().map(|unit| unit.executable_text),
    }
}

fn label(err: &PipelineError) -> String {
    match err {
        PipelineError::Compile(err) => err.message.clone(),
        PipelineError::Execution(EvalError::Syntax { .. }) => "syntax error here".to_string(),
        PipelineError::Execution(err) => err.bare_message(),
    }
}

/// Plain one-line form used when there is no span to annotate
pub fn headline(err: &PipelineError) -> String {
    format!("[{:?}] {}", err.kind(), err)
}

/// Render `err` against the text its span refers to, falling back to the
/// headline when the failure has no position
pub fn report(pipeline: &Pipeline, filename: &str, source: &str, err: &PipelineError) -> String {
    let (Some(span), Some(text)) = (err.span(), spanned_text(pipeline, source, err)) else {
        return headline(err);
    };

    let end = span.end.max(span.start + 1).min(text.len().max(1));
    let start = span.start.min(end.saturating_sub(1));

    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, filename, start)
        .with_message(headline(err))
        .with_label(Label::new((filename, start..end)).with_color(Color::Red).with_message(label(err)))
        .finish()
        .write((filename, Source::from(text.as_str())), &mut output);

    match written {
        Ok(()) => String::from_utf8(output).unwrap_or_else(|_| headline(err)),
        Err(_) => headline(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbox_capabilities::CapabilityRegistry;
    use playbox_editor::PipelineOptions;
    use std::rc::Rc;

    fn pipeline() -> Pipeline {
        Pipeline::new(Rc::new(CapabilityRegistry::standard()), PipelineOptions::default())
    }

    #[test]
    fn test_compile_error_is_annotated() {
        let pipeline = pipeline();
        let source = "export default function A() {\n    return <div><span></div>;\n}\n";
        let err = pipeline.run(source).err().expect("compile error");
        let rendered = report(&pipeline, "a.jsx", source, &err);
        assert!(rendered.contains("a.jsx"), "{}", rendered);
        assert!(rendered.contains("[Compile]"), "{}", rendered);
    }

    #[test]
    fn test_runtime_error_without_span_uses_headline() {
        let pipeline = pipeline();
        let source = "throw new Error(\"boom\");\nexport default function A() { return null; }";
        let err = pipeline.run(source).err().expect("runtime error");
        assert_eq!(report(&pipeline, "a.jsx", source, &err), "[Runtime] Error: boom");
    }
}
