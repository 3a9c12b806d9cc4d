//! Error types for the editor

use playbox_capabilities::CapabilityError;
use playbox_common::Span;
use playbox_compiler_jsx::CompileError;
use playbox_evaluator::EvalError;
use serde::Serialize;
use thiserror::Error;

/// Why one pass through the pipeline produced no component
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Malformed markup or unbalanced code around it; execution not attempted
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// The compiled text failed to parse, run or yield a component
    #[error("{0}")]
    Execution(#[from] EvalError),
}

/// Failure category shown alongside a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Compile,
    UnresolvedDependency,
    NotAComponent,
    Runtime,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Compile(_) | PipelineError::Execution(EvalError::Syntax { .. }) => FailureKind::Compile,
            PipelineError::Execution(EvalError::UnresolvedDependency { .. }) => FailureKind::UnresolvedDependency,
            PipelineError::Execution(EvalError::NotAComponent) => FailureKind::NotAComponent,
            PipelineError::Execution(_) => FailureKind::Runtime,
        }
    }

    /// Offending range, when the failing stage knows one. Compile spans index
    /// the rewritten text, execution spans the compiled text.
    pub fn span(&self) -> Option<Span> {
        match self {
            PipelineError::Compile(err) => Some(err.span),
            PipelineError::Execution(err) => err.span(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Baseline failed to compile: {0}")]
    Baseline(#[source] PipelineError),

    #[error("Capability registry error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        let unresolved = PipelineError::from(EvalError::UnresolvedDependency { name: "x".to_string() });
        assert_eq!(unresolved.kind(), FailureKind::UnresolvedDependency);
        assert_eq!(unresolved.to_string(), "Cannot find module: x");

        assert_eq!(PipelineError::from(EvalError::NotAComponent).kind(), FailureKind::NotAComponent);
        assert_eq!(
            PipelineError::from(EvalError::Thrown { message: "Error: boom".to_string() }).kind(),
            FailureKind::Runtime
        );
        assert_eq!(
            PipelineError::from(CompileError::at("<a>", 3, "Unterminated element")).kind(),
            FailureKind::Compile
        );
    }
}
