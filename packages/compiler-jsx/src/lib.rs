//! # Playbox Markup Compiler
//!
//! Rewrites embedded tag-like markup into nested `React.createElement` calls
//! and appends the default-export postamble, producing a [`CompiledUnit`]
//! ready for the sandbox executor.
//!
//! Compilation is synchronous and pure: no state survives between calls.
//! Malformed markup, or unbalanced code around it, fails with a
//! [`CompileError`] carrying the offending span and its line/column. There is
//! no error recovery and no partial output.
//!
//! ```rust
//! use playbox_compiler_jsx::{compile_markup, CompileOptions};
//!
//! let code = compile_markup("const el = <div className=\"card\">Hi</div>;", &CompileOptions::default()).unwrap();
//! assert_eq!(code, "const el = React.createElement(\"div\", { className: \"card\" }, \"Hi\");");
//! ```

mod compiler;
mod context;
mod entities;
mod error;
mod unit;

pub use compiler::compile_markup;
pub use context::CompileOptions;
pub use error::{CompileError, CompileResult};
pub use unit::{compile_unit, default_export_postamble, CompiledUnit};

#[cfg(test)]
mod tests;
