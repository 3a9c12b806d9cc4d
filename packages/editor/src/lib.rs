//! # Playbox Editor
//!
//! Live recompilation of an editable component example.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ rewriter: import/export → resolve() calls   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ compiler-jsx: markup → createElement calls  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ evaluator: sandboxed execution → Component  │
//! │  - capabilities injected through resolve()  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: LiveSession                         │
//! │  - memoized on (edited text, baseline text) │
//! │  - failing edits keep the last component    │
//! │  - reset restores the baseline              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use playbox_capabilities::CapabilityRegistry;
//! use playbox_editor::{LiveSession, Pipeline, PipelineOptions, Recompute};
//! use std::rc::Rc;
//!
//! let pipeline = Pipeline::new(Rc::new(CapabilityRegistry::standard()), PipelineOptions::default());
//! let mut session = LiveSession::load(pipeline, "export default function A() { return <p>a</p>; }").unwrap();
//!
//! // A broken edit keeps `A` on screen and attaches a diagnostic
//! assert!(matches!(session.on_text_change("export default function B() { return <p>; }"), Recompute::Failed(_)));
//! assert_eq!(session.component().name(), "A");
//! assert!(session.diagnostic().is_some());
//!
//! session.reset();
//! assert!(session.diagnostic().is_none());
//! ```

mod errors;
mod pipeline;
mod session;

pub use errors::{EditorError, FailureKind, PipelineError};
pub use pipeline::{Pipeline, PipelineOptions};
pub use session::{LiveSession, Recompute, RenderState};
