//! # Live Session
//!
//! Recompiles one source unit as it is edited and decides what the preview
//! shows.
//!
//! ```text
//!  load ──▶ Baseline ──edit──▶ Edited ──edit──▶ Edited ...
//!              ▲                  │
//!              └──────reset───────┘
//! ```
//!
//! The displayed component is always one that executed successfully: a
//! failing edit only attaches a diagnostic. Recomputation is memoized on the
//! (edited text, baseline text) pair.

use crate::errors::{EditorError, FailureKind, PipelineError};
use crate::pipeline::Pipeline;
use playbox_common::Fingerprint;
use playbox_evaluator::{render_component, Component, EvalResult, VNode, Value};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// What the preview shows
#[derive(Debug, Clone)]
pub struct RenderState {
    /// Last component that executed successfully
    pub component: Component,
    /// Message of the failure that kept `component` on screen
    pub diagnostic: Option<String>,
}

/// Effect of one text change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recompute {
    /// Same inputs as the last pass; nothing ran
    Unchanged,
    /// Back to the text last compiled successfully; its component is shown
    Restored,
    Compiled,
    Failed(FailureKind),
}

/// Inputs of the last pass
#[derive(Debug, Clone)]
struct MemoKey {
    text: Fingerprint,
    baseline: Fingerprint,
}

impl MemoKey {
    fn of(text: &str, baseline: &str) -> Self {
        Self {
            text: Fingerprint::of(text),
            baseline: Fingerprint::of(baseline),
        }
    }

    fn matches(&self, text: &str, baseline: &str) -> bool {
        self.text.matches(text) && self.baseline.matches(baseline)
    }
}

/// Editing session over one example
pub struct LiveSession {
    pipeline: Pipeline,
    baseline_text: String,
    baseline_component: Component,
    /// Latest text received
    text: String,
    /// Text behind `component`
    good_text: String,
    component: Component,
    failure: Option<PipelineError>,
    memo: MemoKey,
    recompute_count: u64,
}

impl LiveSession {
    /// Compile `baseline_text` and start showing it. The baseline has no
    /// fallback, so its failure is an error.
    #[instrument(skip_all)]
    pub fn load(pipeline: Pipeline, baseline_text: impl Into<String>) -> Result<Self, EditorError> {
        let baseline_text = baseline_text.into();
        debug!(len = baseline_text.len(), "loading baseline");
        let component = pipeline.run(&baseline_text).map_err(EditorError::Baseline)?;
        info!(component = %component.name(), "baseline loaded");
        Ok(Self::with_baseline(pipeline, baseline_text, component))
    }

    /// Read the baseline from a file
    pub fn open(pipeline: Pipeline, path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let text = std::fs::read_to_string(path)?;
        Self::load(pipeline, text)
    }

    /// Session over a baseline compiled elsewhere
    pub fn with_baseline(pipeline: Pipeline, baseline_text: impl Into<String>, component: Component) -> Self {
        let baseline_text = baseline_text.into();
        Self {
            pipeline,
            memo: MemoKey::of(&baseline_text, &baseline_text),
            text: baseline_text.clone(),
            good_text: baseline_text.clone(),
            baseline_component: component.clone(),
            baseline_text,
            component,
            failure: None,
            recompute_count: 0,
        }
    }

    /// Feed the full edited text
    #[instrument(skip_all, fields(len = text.len()))]
    pub fn on_text_change(&mut self, text: &str) -> Recompute {
        if self.memo.matches(text, &self.baseline_text) && self.text == text {
            debug!("text unchanged, skipping recompile");
            return Recompute::Unchanged;
        }
        self.text = text.to_string();
        self.memo = MemoKey::of(text, &self.baseline_text);

        if text == self.good_text {
            debug!("text matches last good compile");
            self.failure = None;
            return Recompute::Restored;
        }

        self.recompute_count += 1;
        match self.pipeline.run(text) {
            Ok(component) => {
                info!(component = %component.name(), count = self.recompute_count, "recompiled");
                self.component = component;
                self.good_text = self.text.clone();
                self.failure = None;
                Recompute::Compiled
            }
            Err(err) => {
                let kind = err.kind();
                warn!(kind = ?kind, error = %err, "recompile failed, keeping last component");
                self.failure = Some(err);
                Recompute::Failed(kind)
            }
        }
    }

    /// Back to the baseline text and component, diagnostic cleared
    pub fn reset(&mut self) {
        debug!("reset to baseline");
        self.text = self.baseline_text.clone();
        self.good_text = self.baseline_text.clone();
        self.component = self.baseline_component.clone();
        self.failure = None;
        self.memo = MemoKey::of(&self.baseline_text, &self.baseline_text);
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            component: self.component.clone(),
            diagnostic: self.diagnostic(),
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn baseline_component(&self) -> &Component {
        &self.baseline_component
    }

    pub fn diagnostic(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }

    /// Failure behind the current diagnostic
    pub fn failure(&self) -> Option<&PipelineError> {
        self.failure.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn baseline_text(&self) -> &str {
        &self.baseline_text
    }

    pub fn is_edited(&self) -> bool {
        self.text != self.baseline_text
    }

    /// Pipeline passes run by `on_text_change`
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Render the displayed component with `props`
    pub fn render(&self, props: Value) -> EvalResult<Vec<VNode>> {
        render_component(&self.component, props)
    }
}
