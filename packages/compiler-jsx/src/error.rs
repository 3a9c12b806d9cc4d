use playbox_common::{ScanError, SourcePos, Span};
use serde::Serialize;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Markup compilation failure
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message} ({pos})")]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub pos: SourcePos,
}

impl CompileError {
    pub fn new(source: &str, span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
            pos: SourcePos::from_offset(source, span.start),
        }
    }

    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::new(source, Span::at(offset), message)
    }

    pub fn from_scan(source: &str, err: ScanError) -> Self {
        Self::new(source, err.span(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position() {
        let err = CompileError::at("a\nbc", 3, "Unexpected token");
        assert_eq!(err.to_string(), "Unexpected token (2:2)");
    }
}
