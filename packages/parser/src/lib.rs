//! # Playbox Script Parser
//!
//! Tokenizes (with `logos`) and parses the script subset that compiled
//! source units are written in: declarations with destructuring, functions,
//! arrows, classes, the usual statements and operators, template literals and
//! optional chaining. Automatic semicolon insertion follows line breaks.
//!
//! ```rust
//! use playbox_parser::{parse, StmtKind};
//!
//! let program = parse("const greet = (name) => `Hi ${name}`").unwrap();
//! assert!(matches!(program.body[0].kind, StmtKind::VarDecl { .. }));
//! ```

pub mod ast;
pub mod error;
pub mod literals;
pub mod parser;
pub mod tokenizer;

pub use ast::*;
#[cfg(feature = "pretty-errors")]
pub use error::format_error;
pub use error::{ParseError, ParseResult};
pub use literals::format_number;
pub use parser::{parse, Parser};
pub use tokenizer::{tokenize, try_tokenize, Token};
