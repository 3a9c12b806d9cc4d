//! # Playbox Declaration Rewriter
//!
//! Turns module-style component source into text with no `import`/`export`
//! syntax. Imports become `resolve("name")` calls bound with plain `const`
//! declarations; exports become plain declarations, and the name of the
//! default export is recorded so the markup compiler can publish it.
//!
//! The pass is a small recursive-descent scanner over the import/export
//! grammar only. Everything else (strings, templates, comments, function
//! bodies, markup) is copied through untouched, so lookalike text inside a
//! literal or a comment is never rewritten.
//!
//! ## Rules
//!
//! Applied per declaration, most specific first:
//!
//! 1. `import "./styles.css"` (non-executable resource) is deleted
//! 2. `import A, { a, b } from "m"` binds `A` with the default/fallback rule and
//!    destructures `a`, `b` from the same resolution
//! 3. `import * as N from "m"` binds the whole module
//! 4. `import { a, b } from "m"` destructures
//! 5. `import A from "m"` binds with the default/fallback rule
//! 6. `import "m"` is deleted
//! 7. exports are normalized to plain declarations (see [`DeclarationKind`])
//!
//! Removed text is replaced by the same number of newlines it contained, so
//! line numbers in later diagnostics still point at the edited text.
//!
//! ## Usage
//!
//! ```rust
//! use playbox_rewriter::rewrite;
//!
//! let out = rewrite("import React from \"react\";\nexport default function App() {}\n");
//! assert_eq!(out.default_binding.as_deref(), Some("App"));
//! assert!(!out.text.contains("import"));
//! ```

mod declaration;
mod exports;
mod imports;
mod rewriter;

pub use declaration::{Declaration, DeclarationKind, ImportClause, Specifier};
pub use rewriter::{rewrite, RewriteOutput, Rewriter, RESOLVE_FN};
