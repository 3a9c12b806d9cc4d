use crate::error::{EvalError, EvalResult};
use crate::value::{Class, Value};
use playbox_parser::ast::VarKind;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct Binding {
    value: Value,
    mutable: bool,
    redeclarable: bool,
}

/// Receiver and owning class of the innermost non-arrow function
#[derive(Clone)]
struct Frame {
    this: Value,
    home: Option<Rc<Class>>,
}

#[derive(Default)]
struct Scope {
    bindings: HashMap<String, Binding>,
    parent: Option<Env>,
    frame: Option<Frame>,
}

/// Lexical environment: a shared, growable chain of scopes
#[derive(Clone, Default)]
pub struct Env(Rc<RefCell<Scope>>);

impl Env {
    /// Root scope
    pub fn global() -> Self {
        Env::default()
    }

    /// Block scope
    pub fn child(&self) -> Self {
        Env(Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
            frame: None,
        })))
    }

    /// Scope of a non-arrow function call, which carries its own `this`
    pub fn function_scope(&self, this: Value, home: Option<Rc<Class>>) -> Self {
        Env(Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
            frame: Some(Frame { this, home }),
        })))
    }

    /// Create a binding in this scope. Redeclaring a name in the same scope
    /// fails unless both declarations are `var`.
    pub fn declare(&self, name: &str, value: Value, kind: VarKind) -> Result<(), String> {
        let mut scope = self.0.borrow_mut();
        let redeclarable = kind == VarKind::Var;
        if let Some(existing) = scope.bindings.get(name) {
            if !(existing.redeclarable && redeclarable) {
                return Err(format!("Identifier '{}' has already been declared", name));
            }
        }
        scope.bindings.insert(
            name.to_string(),
            Binding {
                value,
                mutable: kind != VarKind::Const,
                redeclarable,
            },
        );
        Ok(())
    }

    /// Bind without the redeclaration check (parameters, hoisted functions)
    pub fn define(&self, name: &str, value: Value) {
        self.0
            .borrow_mut()
            .bindings
            .insert(
                name.to_string(),
                Binding {
                    value,
                    mutable: true,
                    redeclarable: true,
                },
            );
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let next = {
                let scope = current.0.borrow();
                if let Some(binding) = scope.bindings.get(name) {
                    return Some(binding.value.clone());
                }
                scope.parent.clone()
            };
            current = next?;
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&self, name: &str, value: Value) -> EvalResult<()> {
        let mut current = self.clone();
        loop {
            let next = {
                let mut scope = current.0.borrow_mut();
                if let Some(binding) = scope.bindings.get_mut(name) {
                    if !binding.mutable {
                        return Err(EvalError::type_error("Assignment to constant variable."));
                    }
                    binding.value = value;
                    return Ok(());
                }
                scope.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => return Err(EvalError::reference(format!("{} is not defined", name))),
            }
        }
    }

    fn frame(&self) -> Option<Frame> {
        let mut current = self.clone();
        loop {
            let next = {
                let scope = current.0.borrow();
                if let Some(frame) = &scope.frame {
                    return Some(frame.clone());
                }
                scope.parent.clone()
            };
            current = next?;
        }
    }

    /// `this` of the innermost non-arrow function, `undefined` at top level
    pub fn this_value(&self) -> Value {
        self.frame().map(|frame| frame.this).unwrap_or(Value::Undefined)
    }

    /// Class whose method or constructor is running
    pub fn home_class(&self) -> Option<Rc<Class>> {
        self.frame().and_then(|frame| frame.home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_and_assignment() {
        let global = Env::global();
        global.declare("a", Value::Number(1.0), VarKind::Let).unwrap();
        let inner = global.child();
        inner.declare("a", Value::Number(2.0), VarKind::Const).unwrap();
        assert_eq!(inner.get("a"), Some(Value::Number(2.0)));
        assert!(inner.set("a", Value::Number(3.0)).is_err());

        let other = global.child();
        other.set("a", Value::Number(5.0)).unwrap();
        assert_eq!(global.get("a"), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_redeclaration() {
        let env = Env::global();
        env.declare("x", Value::Null, VarKind::Let).unwrap();
        assert!(env.declare("x", Value::Null, VarKind::Let).is_err());
        env.declare("v", Value::Null, VarKind::Var).unwrap();
        assert!(env.declare("v", Value::Bool(true), VarKind::Var).is_ok());
    }

    #[test]
    fn test_undeclared_assignment_is_reference_error() {
        let env = Env::global();
        let err = env.set("missing", Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "ReferenceError: missing is not defined");
    }

    #[test]
    fn test_this_skips_block_scopes() {
        let global = Env::global();
        let function = global.function_scope(Value::Number(7.0), None);
        let block = function.child().child();
        assert_eq!(block.this_value(), Value::Number(7.0));
        assert_eq!(global.this_value(), Value::Undefined);
    }
}
