pub mod cursor;
pub mod fingerprint;
pub mod span;
pub mod stack;

pub use cursor::{is_ident_continue, is_ident_start, Cursor, ScanError};
pub use fingerprint::{fingerprint, Fingerprint};
pub use span::{SourcePos, Span};
pub use stack::{StackGuard, DEFAULT_STACK_BUDGET};
