use playbox_capabilities::RegistryConfig;
use playbox_compiler_jsx::{compile_unit, CompileOptions};
use playbox_editor::{LiveSession, Pipeline, PipelineOptions, Recompute};
use playbox_evaluator::{props_from_json, ExecutorOptions, Value};
use playbox_rewriter::rewrite;
use wasm_bindgen::prelude::*;

/// Browser stacks are much smaller than native ones
const WASM_MAX_CALL_DEPTH: usize = 64;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// Live preview of one editable example
#[wasm_bindgen]
pub struct LivePreview {
    session: LiveSession,
}

#[wasm_bindgen]
impl LivePreview {
    /// Compile `baseline_text` against the standard registry, or one built
    /// from `registry_config_json`
    #[wasm_bindgen(constructor)]
    pub fn new(baseline_text: &str, registry_config_json: Option<String>) -> Result<LivePreview, JsValue> {
        let config = match registry_config_json.as_deref() {
            Some(json) => RegistryConfig::from_json(json).map_err(|e| js_error(format!("Invalid registry config: {}", e)))?,
            None => RegistryConfig::default(),
        };
        let options = PipelineOptions {
            executor: ExecutorOptions {
                max_call_depth: WASM_MAX_CALL_DEPTH,
                ..ExecutorOptions::default()
            },
            ..PipelineOptions::default()
        };
        let pipeline = Pipeline::from_config(&config, options).map_err(js_error)?;
        let session = LiveSession::load(pipeline, baseline_text).map_err(js_error)?;
        Ok(LivePreview { session })
    }

    /// Feed the full edited text; returns `true` when a pipeline pass ran
    #[wasm_bindgen(js_name = onTextChange)]
    pub fn on_text_change(&mut self, text: &str) -> bool {
        matches!(
            self.session.on_text_change(text),
            Recompute::Compiled | Recompute::Failed(_)
        )
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen(getter)]
    pub fn diagnostic(&self) -> Option<String> {
        self.session.diagnostic()
    }

    #[wasm_bindgen(getter, js_name = componentName)]
    pub fn component_name(&self) -> String {
        self.session.component().name().to_string()
    }

    #[wasm_bindgen(getter, js_name = recomputeCount)]
    pub fn recompute_count(&self) -> f64 {
        self.session.recompute_count() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn edited(&self) -> bool {
        self.session.is_edited()
    }

    /// Render the displayed component to virtual DOM JSON
    #[wasm_bindgen(js_name = renderJson)]
    pub fn render_json(&self, props_json: Option<String>) -> Result<String, JsValue> {
        let props = match props_json.as_deref() {
            Some(json) => {
                let value: serde_json::Value =
                    serde_json::from_str(json).map_err(|e| js_error(format!("Invalid props: {}", e)))?;
                props_from_json(&value)
            }
            None => Value::Undefined,
        };
        let nodes = self.session.render(props).map_err(js_error)?;
        serde_json::to_string(&nodes).map_err(|e| js_error(format!("Serialization error: {}", e)))
    }
}

/// Rewrite and compile a source unit without executing it
#[wasm_bindgen]
pub fn transform(text: &str) -> Result<String, JsValue> {
    let rewritten = rewrite(text);
    let unit = compile_unit(
        &rewritten.text,
        rewritten.default_binding.as_deref(),
        &CompileOptions::default(),
    )
    .map_err(js_error)?;
    Ok(unit.executable_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "export default function Card() { return <div className=\"card\">Card</div>; }";

    #[test]
    fn test_transform_removes_module_syntax() {
        let code = transform("import React from \"react\";\nexport default function A() { return <b />; }").unwrap();
        assert!(!code.contains("import"));
        assert!(code.contains("React.createElement(\"b\""));
        assert!(code.contains("exports.default = A"));
    }

    #[test]
    fn test_live_preview_round_trip() {
        let mut preview = LivePreview::new(EXAMPLE, None).unwrap();
        assert_eq!(preview.component_name(), "Card");
        assert!(!preview.on_text_change(EXAMPLE));

        assert!(preview.on_text_change("export default function Card() { return <div>; }"));
        assert!(preview.diagnostic().is_some());
        assert_eq!(preview.component_name(), "Card");

        preview.reset();
        assert!(preview.diagnostic().is_none());
        assert!(!preview.edited());

        let json = preview.render_json(None).unwrap();
        assert!(json.contains("\"class\":\"card\""), "{}", json);
    }
}
