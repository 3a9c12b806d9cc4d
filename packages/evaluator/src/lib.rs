//! # Playbox Evaluator
//!
//! Sandbox executor for compiled source units. Compiled text is parsed by
//! `playbox-parser` and run by an embedded tree-walking interpreter; it is
//! never handed to a host `eval`.
//!
//! The only authority executed text has is what [`execute`] injects:
//! `exports`, `resolve` (backed by a [`ModuleResolver`]) and the `React`
//! runtime, plus pure builtins (`Math`, `JSON`, `Object`, `Array`, ...).
//! Unbounded recursion is cut off at [`ExecutorOptions::max_call_depth`].
//!
//! ```rust
//! use playbox_evaluator::{execute, EvalError, ExecutorOptions, ModuleResolver, Value};
//! use std::rc::Rc;
//!
//! struct NoModules;
//!
//! impl ModuleResolver for NoModules {
//!     fn resolve(&self, name: &str) -> Result<Value, EvalError> {
//!         Err(EvalError::UnresolvedDependency { name: name.to_string() })
//!     }
//! }
//!
//! let text = "function Hello() { return 1; }\nexports.default = Hello;";
//! let component = execute(text, Rc::new(NoModules), &Value::Undefined, &ExecutorOptions::default()).unwrap();
//! assert_eq!(component.name(), "Hello");
//! ```

pub mod builtins;
pub mod error;
pub mod execute;
pub mod interpreter;
pub mod realm;
pub mod render;
pub mod scope;
pub mod value;

#[cfg(test)]
mod tests;

pub use builtins::console::CONSOLE_TARGET;
pub use error::{EvalError, EvalResult};
pub use execute::{execute, Component, ExecutorOptions, ModuleResolver};
pub use interpreter::Interpreter;
pub use realm::Realm;
pub use render::{props_from_json, render_component, VNode};
pub use value::{Element, Function, FunctionKind, NativeFn, Object, ObjectRef, Value};
