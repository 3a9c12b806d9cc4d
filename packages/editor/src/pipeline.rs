//! # Transform Pipeline
//!
//! One pass over a source unit: Rewrite → Compile → Execute
//!
//! Every stage is synchronous and pure with respect to earlier passes; the
//! only shared state is the read-only capability registry.

use crate::errors::{EditorError, PipelineError};
use playbox_capabilities::{CapabilityRegistry, RegistryConfig};
use playbox_compiler_jsx::{compile_unit, CompileOptions, CompiledUnit};
use playbox_evaluator::{execute, Component, ExecutorOptions, ModuleResolver};
use playbox_rewriter::rewrite;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineOptions {
    pub executor: ExecutorOptions,
    pub compile: CompileOptions,
}

/// Rewrites, compiles and executes source units against one registry
#[derive(Clone)]
pub struct Pipeline {
    registry: Rc<CapabilityRegistry>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(registry: Rc<CapabilityRegistry>, options: PipelineOptions) -> Self {
        Self { registry, options }
    }

    /// Pipeline over a registry built from `config`
    pub fn from_config(config: &RegistryConfig, options: PipelineOptions) -> Result<Self, EditorError> {
        let registry = CapabilityRegistry::from_config(config)?;
        Ok(Self::new(Rc::new(registry), options))
    }

    pub fn registry(&self) -> &Rc<CapabilityRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Rewrite and compile; nothing is executed
    pub fn compile(&self, text: &str) -> Result<CompiledUnit, PipelineError> {
        let rewritten = rewrite(text);
        for ignored in &rewritten.ignored_defaults {
            warn!(name = %ignored, "ignoring additional default export");
        }
        let unit = compile_unit(
            &rewritten.text,
            rewritten.default_binding.as_deref(),
            &self.options.compile,
        )?;
        debug!(
            default_binding = ?unit.default_binding,
            len = unit.executable_text.len(),
            "compiled unit"
        );
        Ok(unit)
    }

    /// Full pass: the component the text exports, or the stage that failed
    #[instrument(skip_all, fields(len = text.len()))]
    pub fn run(&self, text: &str) -> Result<Component, PipelineError> {
        let unit = self.compile(text)?;
        let resolver: Rc<dyn ModuleResolver> = self.registry.clone();
        let runtime = self.registry.runtime();
        let component = execute(&unit.executable_text, resolver, &runtime, &self.options.executor)?;
        Ok(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::new(Rc::new(CapabilityRegistry::standard()), PipelineOptions::default())
    }

    #[test]
    fn test_compile_records_default_binding() {
        let unit = pipeline()
            .compile("export default function Widget() { return <b>1</b>; }")
            .unwrap();
        assert_eq!(unit.default_binding.as_deref(), Some("Widget"));
        assert!(!unit.executable_text.contains("export"));
        assert!(unit.executable_text.contains("React.createElement(\"b\""));
    }

    #[test]
    fn test_run_returns_component() {
        let component = pipeline()
            .run("import React from \"react\";\nexport default function App() { return <div />; }")
            .unwrap();
        assert_eq!(component.name(), "App");
    }

    #[test]
    fn test_compile_error_stops_before_execution() {
        let err = pipeline().run("export default () => <div>;").unwrap_err();
        assert!(matches!(err, PipelineError::Compile(_)), "{:?}", err);
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: PipelineOptions = serde_json::from_str(r#"{ "executor": { "maxCallDepth": 12 } }"#).unwrap();
        assert_eq!(options.executor.max_call_depth, 12);
        assert_eq!(options.compile, CompileOptions::default());
    }
}
