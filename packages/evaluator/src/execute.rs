use crate::error::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::realm::Realm;
use crate::scope::Env;
use crate::value::Value;
use playbox_common::DEFAULT_STACK_BUDGET;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::{debug, instrument};

/// Slot the executed text assigns its exports to
pub const EXPORTS_PARAM: &str = "exports";
/// Dependency resolution function visible to the executed text
pub const RESOLVE_PARAM: &str = "resolve";
/// UI framework runtime visible to the executed text
pub const RUNTIME_PARAM: &str = "React";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorOptions {
    /// Calls nested deeper than this fail with a `RangeError`
    pub max_call_depth: usize,
    /// Native stack bytes execution may use before failing with a `RangeError`
    pub stack_budget: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 100,
            stack_budget: DEFAULT_STACK_BUDGET,
        }
    }
}

/// Source of the values behind `resolve(name)`
pub trait ModuleResolver {
    /// The capability bound to `name`, or [`EvalError::UnresolvedDependency`]
    fn resolve(&self, name: &str) -> EvalResult<Value>;
}

/// Callable value produced by one successful execution. Holds on to the
/// realm it was created in so it can still be rendered.
#[derive(Clone)]
pub struct Component {
    value: Value,
    realm: Rc<Realm>,
}

impl Component {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn realm(&self) -> &Rc<Realm> {
        &self.realm
    }

    pub fn name(&self) -> &str {
        self.value.as_function().map_or("", |f| f.name.as_str())
    }

    /// Same component value, not merely an equal one
    pub fn ptr_eq(&self, other: &Component) -> bool {
        self.value.ptr_eq(&other.value)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("name", &self.name()).finish()
    }
}

/// Run compiled text once in a fresh scope and extract its component.
///
/// The text sees three parameters: `exports` (an empty object), `resolve`
/// (backed by `resolver`) and `React` (the `runtime` capability). Every
/// failure, including a panic inside the interpreter, comes back as an
/// [`EvalError`].
#[instrument(skip_all, fields(len = text.len()))]
pub fn execute(
    text: &str,
    resolver: Rc<dyn ModuleResolver>,
    runtime: &Value,
    options: &ExecutorOptions,
) -> EvalResult<Component> {
    match panic::catch_unwind(AssertUnwindSafe(|| run(text, resolver, runtime, options))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "executor panicked".to_string());
            Err(EvalError::Internal { message })
        }
    }
}

fn run(
    text: &str,
    resolver: Rc<dyn ModuleResolver>,
    runtime: &Value,
    options: &ExecutorOptions,
) -> EvalResult<Component> {
    let program = playbox_parser::parse(text)?;
    let realm = Realm::new(options.clone());

    let params = realm.globals.child();
    params.define(EXPORTS_PARAM, Value::empty_object());
    params.define(RESOLVE_PARAM, resolve_function(resolver));
    params.define(RUNTIME_PARAM, runtime.clone());

    let body: Env = params.child();
    let mut interp = Interpreter::new(realm.clone());
    interp.run_program(&program, &body)?;

    // The text may have replaced the slot itself
    let exports = params.get(EXPORTS_PARAM).unwrap_or(Value::Undefined);
    let value = component_of(&interp, &exports)?;
    debug!(name = %value.as_function().map_or("", |f| f.name.as_str()), "extracted component");
    Ok(Component { value, realm })
}

fn resolve_function(resolver: Rc<dyn ModuleResolver>) -> Value {
    Value::native(RESOLVE_PARAM, move |interp, _, args| {
        let name = match args.first() {
            Some(Value::String(name)) => name.to_string(),
            Some(other) => interp.to_string_value(other)?,
            None => "undefined".to_string(),
        };
        debug!(module = %name, "resolve");
        resolver.resolve(&name)
    })
}

/// Callable `exports`, else callable `exports.default`
fn component_of(interp: &Interpreter, exports: &Value) -> EvalResult<Value> {
    if exports.is_callable() {
        return Ok(exports.clone());
    }
    if exports.is_nullish() {
        return Err(EvalError::NotAComponent);
    }
    let default = interp.get_property(exports, "default")?;
    if default.is_callable() {
        return Ok(default);
    }
    Err(EvalError::NotAComponent)
}
