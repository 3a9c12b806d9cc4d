use playbox_common::Span;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token {found}, expected {expected}")]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof { span: Span, expected: String },

    #[error("{message}")]
    InvalidSyntax { span: Span, message: String },

    #[error("{message}")]
    LexError { span: Span, message: String },
}

impl ParseError {
    pub fn unexpected_token(span: Span, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(span: Span, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            span,
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(span: Span, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span,
            message: message.into(),
        }
    }

    pub fn lex_error(span: Span, message: impl Into<String>) -> Self {
        Self::LexError {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::LexError { span, .. } => *span,
        }
    }

    /// Shift the span of an error raised while parsing a slice of a larger source
    pub(crate) fn offset(mut self, by: usize) -> Self {
        let span = match &mut self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::LexError { span, .. } => span,
        };
        *span = Span::new(span.start + by, span.end + by);
        self
    }
}

/// Pretty-print an error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = error.span();
    let end = span.end.max(span.start + 1).min(source.len().max(1));
    let start = span.start.min(end.saturating_sub(1));

    let label = match error {
        ParseError::UnexpectedToken { expected, .. } | ParseError::UnexpectedEof { expected, .. } => {
            format!("expected {}", expected)
        }
        ParseError::InvalidSyntax { message, .. } | ParseError::LexError { message, .. } => message.clone(),
    };

    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, filename, start)
        .with_message(error.to_string())
        .with_label(Label::new((filename, start..end)).with_color(Color::Red).with_message(label))
        .finish()
        .write((filename, Source::from(source)), &mut output);

    match written {
        Ok(()) => String::from_utf8(output).unwrap_or_else(|_| error.to_string()),
        Err(_) => error.to_string(),
    }
}
