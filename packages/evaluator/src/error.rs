use playbox_common::Span;
use playbox_parser::ParseError;
use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

/// Failure raised while executing or rendering a compiled unit.
///
/// Values thrown by script code are not stored here (they are not `Send`);
/// the interpreter keeps the thrown value aside and `Thrown` carries its
/// message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("SyntaxError: {message}")]
    Syntax { message: String, span: Span },

    #[error("ReferenceError: {message}")]
    Reference { message: String },

    #[error("TypeError: {message}")]
    Type { message: String },

    #[error("RangeError: {message}")]
    Range { message: String },

    #[error("{message}")]
    Thrown { message: String },

    #[error("Cannot find module: {name}")]
    UnresolvedDependency { name: String },

    #[error("exported value must be a function")]
    NotAComponent,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EvalError {
    pub fn reference(message: impl Into<String>) -> Self {
        EvalError::Reference {
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::Type {
            message: message.into(),
        }
    }

    pub fn range(message: impl Into<String>) -> Self {
        EvalError::Range {
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        EvalError::Syntax {
            message: message.into(),
            span,
        }
    }

    /// Script-visible error name, `None` for failures script code cannot catch
    pub fn script_name(&self) -> Option<&'static str> {
        match self {
            EvalError::Syntax { .. } => Some("SyntaxError"),
            EvalError::Reference { .. } => Some("ReferenceError"),
            EvalError::Type { .. } => Some("TypeError"),
            EvalError::Range { .. } => Some("RangeError"),
            EvalError::Thrown { .. } | EvalError::UnresolvedDependency { .. } => Some("Error"),
            EvalError::NotAComponent | EvalError::Internal { .. } => None,
        }
    }

    /// Message without the error name prefix
    pub fn bare_message(&self) -> String {
        match self {
            EvalError::Syntax { message, .. }
            | EvalError::Reference { message }
            | EvalError::Type { message }
            | EvalError::Range { message }
            | EvalError::Thrown { message }
            | EvalError::Internal { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            EvalError::Syntax { span, .. } => Some(*span),
            _ => None,
        }
    }
}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        EvalError::Syntax {
            message: err.to_string(),
            span: err.span(),
        }
    }
}
