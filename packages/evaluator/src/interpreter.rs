//! Tree-walking interpreter for parsed programs.
//!
//! Statements return a [`Flow`] so `return`, `break` and `continue` unwind
//! without Rust panics. Values thrown by script code travel as
//! [`EvalError::Thrown`]; the thrown value itself waits in
//! `pending_exception` until a `catch` picks it up.

use crate::error::{EvalError, EvalResult};
use crate::realm::Realm;
use crate::scope::Env;
use crate::value::{Class, Closure, Function, FunctionKind, Object, Value};
use indexmap::IndexMap;
use playbox_common::{Span, StackGuard};
use playbox_parser::ast::*;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

/// Completion of a statement
#[derive(Debug)]
pub(crate) enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

#[derive(Clone, Copy)]
enum BindMode {
    Declare(VarKind),
    Assign,
}

/// Assignable location
enum Reference {
    Binding(String),
    Property(Value, String),
}

pub struct Interpreter {
    realm: Rc<Realm>,
    depth: usize,
    guard: StackGuard,
    pending_exception: Option<Value>,
}

impl Interpreter {
    pub fn new(realm: Rc<Realm>) -> Self {
        Self {
            guard: StackGuard::new(realm.options.stack_budget),
            realm,
            depth: 0,
            pending_exception: None,
        }
    }

    pub fn realm(&self) -> &Rc<Realm> {
        &self.realm
    }

    /// Run a whole program in `env`. A top-level `return` ends it early.
    pub fn run_program(&mut self, program: &Program, env: &Env) -> EvalResult<()> {
        match self.exec_block(&program.body, env)? {
            Flow::Normal | Flow::Return(_) => Ok(()),
            Flow::Break | Flow::Continue => Err(EvalError::syntax("Illegal break or continue statement", program.span)),
        }
    }

    /// Value of a script exception, for `catch` and for callers that
    /// surface errors to script code
    pub fn exception_value(&mut self, err: EvalError) -> Value {
        match err {
            EvalError::Thrown { message } => self.pending_exception.take().unwrap_or_else(|| Value::from(message)),
            other => {
                let name = other.script_name().unwrap_or("Error");
                self.realm.make_error(name, &other.bare_message())
            }
        }
    }

    /// Raise a script value as an exception
    pub fn throw_value(&mut self, value: Value) -> EvalError {
        let message = value.to_display_string();
        self.pending_exception = Some(value);
        EvalError::Thrown { message }
    }

    // Statements

    pub(crate) fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> EvalResult<Flow> {
        self.hoist_functions(stmts, env);
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn hoist_functions(&mut self, stmts: &[Stmt], env: &Env) {
        for stmt in stmts {
            if let StmtKind::Function(def) = &stmt.kind {
                if let Some(name) = &def.name {
                    let function = self.make_closure(def, env, None, None);
                    env.define(name, function);
                }
            }
        }
    }

    /// Body of `if`/loops: its own scope, with hoisting
    fn exec_nested(&mut self, stmt: &Stmt, env: &Env) -> EvalResult<Flow> {
        self.exec_block(std::slice::from_ref(stmt), &env.child())
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> EvalResult<Flow> {
        self.check_stack()?;
        self.exec_stmt_inner(stmt, env).map_err(|err| match err {
            EvalError::Syntax { message, span } if span == Span::default() => EvalError::Syntax {
                message,
                span: stmt.span,
            },
            other => other,
        })
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt, env: &Env) -> EvalResult<Flow> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }
            StmtKind::VarDecl { kind, declarations } => {
                self.declare_vars(*kind, declarations, env)?;
                Ok(Flow::Normal)
            }
            // Hoisted by the enclosing block
            StmtKind::Function(_) => Ok(Flow::Normal),
            StmtKind::Class(def) => {
                let class = self.eval_class(def, env, None)?;
                if let Some(name) = &def.name {
                    env.declare(name, class, VarKind::Let)
                        .map_err(|message| EvalError::syntax(message, stmt.span))?;
                }
                Ok(Flow::Normal)
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.exec_nested(consequent, env)
                } else if let Some(alternate) = alternate {
                    self.exec_nested(alternate, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::Block(body) => self.exec_block(body, &env.child()),
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => self.exec_for(init.as_ref(), test.as_ref(), update.as_ref(), body, env),
            StmtKind::ForIn { binding, object, body } => {
                let object = self.eval(object, env)?;
                let keys = if object.is_nullish() { Vec::new() } else { self.own_keys(&object) };
                for key in keys {
                    let iteration = env.child();
                    self.bind_for(binding, Value::from(key), &iteration)?;
                    match self.exec_nested(body, &iteration)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::ForOf {
                binding,
                iterable,
                body,
            } => {
                let iterable = self.eval(iterable, env)?;
                for item in self.iterate(&iterable)? {
                    let iteration = env.child();
                    self.bind_for(binding, item, &iteration)?;
                    match self.exec_nested(body, &iteration)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::While { test, body } => {
                while self.eval(test, env)?.truthy() {
                    match self.exec_nested(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::DoWhile { body, test } => {
                loop {
                    match self.exec_nested(body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if !self.eval(test, env)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::Switch { discriminant, cases } => self.exec_switch(discriminant, cases, env),
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Throw(expr) => {
                let value = self.eval(expr, env)?;
                Err(self.throw_value(value))
            }
            StmtKind::Try {
                block,
                param,
                handler,
                finalizer,
            } => self.exec_try(block, param.as_ref(), handler.as_deref(), finalizer.as_deref(), env),
            StmtKind::Empty => Ok(Flow::Normal),
        }
    }

    fn declare_vars(&mut self, kind: VarKind, declarations: &[VarDeclarator], env: &Env) -> EvalResult<()> {
        for declarator in declarations {
            let value = match &declarator.init {
                Some(init) => self.eval_named(init, env, pattern_name(&declarator.target))?,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.target, value, BindMode::Declare(kind), env)?;
        }
        Ok(())
    }

    fn bind_for(&mut self, binding: &ForBinding, value: Value, env: &Env) -> EvalResult<()> {
        let mode = match binding.kind {
            Some(kind) => BindMode::Declare(kind),
            None => BindMode::Assign,
        };
        self.bind_pattern(&binding.target, value, mode, env)
    }

    fn exec_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        env: &Env,
    ) -> EvalResult<Flow> {
        let mut iteration = env.child();
        // `let` bindings are copied into a fresh scope every iteration so
        // closures created in the body keep that iteration's values
        let mut per_iteration = Vec::new();
        match init {
            Some(ForInit::VarDecl { kind, declarations }) => {
                self.declare_vars(*kind, declarations, &iteration)?;
                if *kind != VarKind::Var {
                    for declarator in declarations {
                        collect_bound_names(&declarator.target, &mut per_iteration);
                    }
                }
            }
            Some(ForInit::Expr(expr)) => {
                self.eval(expr, &iteration)?;
            }
            None => {}
        }

        loop {
            if let Some(test) = test {
                if !self.eval(test, &iteration)?.truthy() {
                    break;
                }
            }
            match self.exec_nested(body, &iteration)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            if !per_iteration.is_empty() {
                let next = env.child();
                for name in &per_iteration {
                    next.define(name, iteration.get(name).unwrap_or(Value::Undefined));
                }
                iteration = next;
            }
            if let Some(update) = update {
                self.eval(update, &iteration)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_switch(&mut self, discriminant: &Expr, cases: &[SwitchCase], env: &Env) -> EvalResult<Flow> {
        let value = self.eval(discriminant, env)?;
        let scope = env.child();
        for case in cases {
            self.hoist_functions(&case.body, &scope);
        }

        let mut start = None;
        for (index, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if self.eval(test, &scope)?.strict_equals(&value) {
                    start = Some(index);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| cases.iter().position(|case| case.test.is_none())) else {
            return Ok(Flow::Normal);
        };

        for case in &cases[start..] {
            for stmt in &case.body {
                match self.exec_stmt(stmt, &scope)? {
                    Flow::Normal => {}
                    Flow::Break => return Ok(Flow::Normal),
                    flow => return Ok(flow),
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_try(
        &mut self,
        block: &[Stmt],
        param: Option<&Pattern>,
        handler: Option<&[Stmt]>,
        finalizer: Option<&[Stmt]>,
        env: &Env,
    ) -> EvalResult<Flow> {
        let mut result = self.exec_block(block, &env.child());

        if let Some(handler) = handler {
            let catchable = matches!(&result, Err(err) if err.script_name().is_some());
            if catchable {
                if let Err(err) = result {
                    let exception = self.exception_value(err);
                    let scope = env.child();
                    result = match param {
                        Some(param) => self
                            .bind_pattern(param, exception, BindMode::Declare(VarKind::Let), &scope)
                            .and_then(|_| self.exec_block(handler, &scope)),
                        None => self.exec_block(handler, &scope),
                    };
                }
            }
        }

        if let Some(finalizer) = finalizer {
            match self.exec_block(finalizer, &env.child())? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        result
    }

    // Patterns

    fn bind_pattern(&mut self, pattern: &Pattern, value: Value, mode: BindMode, env: &Env) -> EvalResult<()> {
        match pattern {
            Pattern::Identifier(name) => match mode {
                BindMode::Declare(kind) => env
                    .declare(name, value, kind)
                    .map_err(|message| EvalError::syntax(message, Span::default())),
                BindMode::Assign => env.set(name, value),
            },
            Pattern::Object { properties, rest } => {
                if value.is_nullish() {
                    return Err(EvalError::type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value, value
                    )));
                }
                let mut used = Vec::with_capacity(properties.len());
                for property in properties {
                    let key = self.prop_key(&property.key, env)?;
                    let item = self.get_property(&value, &key)?;
                    self.bind_pattern(&property.value, item, mode, env)?;
                    used.push(key);
                }
                if let Some(rest) = rest {
                    let mut remaining = IndexMap::new();
                    for key in self.own_keys(&value) {
                        if !used.contains(&key) {
                            let item = self.get_property(&value, &key)?;
                            remaining.insert(key, item);
                        }
                    }
                    self.bind_pattern(rest, Value::object(remaining), mode, env)?;
                }
                Ok(())
            }
            Pattern::Array { elements, rest } => {
                let items = self.iterate(&value)?;
                for (index, element) in elements.iter().enumerate() {
                    if let Some(element) = element {
                        let item = items.get(index).cloned().unwrap_or(Value::Undefined);
                        self.bind_pattern(element, item, mode, env)?;
                    }
                }
                if let Some(rest) = rest {
                    let tail = items.into_iter().skip(elements.len()).collect();
                    self.bind_pattern(rest, Value::array(tail), mode, env)?;
                }
                Ok(())
            }
            Pattern::Default { target, default } => {
                let value = if value.is_undefined() {
                    self.eval_named(default, env, pattern_name(target))?
                } else {
                    value
                };
                self.bind_pattern(target, value, mode, env)
            }
            Pattern::Member(expr) => match mode {
                BindMode::Assign => {
                    let reference = self.expr_reference(expr, env)?;
                    self.write_reference(&reference, value, env)
                }
                BindMode::Declare(_) => Err(EvalError::syntax("Invalid destructuring target", expr.span)),
            },
        }
    }

    fn bind_parameters(&mut self, def: &FunctionDef, args: Vec<Value>, scope: &Env) -> EvalResult<()> {
        let mut args = args.into_iter();
        for param in &def.params {
            let value = args.next().unwrap_or(Value::Undefined);
            self.bind_pattern(param, value, BindMode::Declare(VarKind::Var), scope)?;
        }
        if let Some(rest) = &def.rest {
            self.bind_pattern(rest, Value::array(args.collect()), BindMode::Declare(VarKind::Var), scope)?;
        }
        Ok(())
    }

    // Expressions

    pub(crate) fn eval(&mut self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        self.check_stack()?;
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::Number(*n)),
            ExprKind::String(s) => Ok(Value::String(s.clone())),
            ExprKind::Template { quasis, exprs } => {
                let mut out = String::new();
                for (index, quasi) in quasis.iter().enumerate() {
                    out.push_str(quasi);
                    if let Some(expr) = exprs.get(index) {
                        let value = self.eval(expr, env)?;
                        out.push_str(&self.to_string_value(&value)?);
                    }
                }
                Ok(Value::from(out))
            }
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::This => Ok(env.this_value()),
            ExprKind::Ident(name) => env
                .get(name)
                .ok_or_else(|| EvalError::reference(format!("{} is not defined", name))),
            ExprKind::Array(elements) => Ok(Value::array(self.eval_arguments(elements, env)?)),
            ExprKind::Object(properties) => self.eval_object(properties, env),
            ExprKind::Function(def) => Ok(self.function_expression(def, env, None)),
            ExprKind::Class(def) => self.eval_class(def, env, None),
            ExprKind::Unary { op, argument } => self.eval_unary(*op, argument, env),
            ExprKind::Update { op, prefix, target } => {
                let reference = self.expr_reference(target, env)?;
                let old = self.read_reference(&reference, env)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.write_reference(&reference, Value::Number(new), env)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                self.binary_op(*op, &left, &right)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval(left, env)?;
                if short_circuits(*op, &left) {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            ExprKind::Assign { op, target, value } => self.eval_assign(*op, target, value, env),
            ExprKind::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for expr in exprs {
                    last = self.eval(expr, env)?;
                }
                Ok(last)
            }
            ExprKind::Call { .. } | ExprKind::Member { .. } => {
                Ok(self.eval_chain(expr, env)?.unwrap_or(Value::Undefined))
            }
            ExprKind::New { callee, args } => {
                let constructor = self.eval(callee, env)?;
                let args = self.eval_arguments(args, env)?;
                if !constructor.is_callable() {
                    return Err(EvalError::type_error(format!("{} is not a constructor", describe(callee))));
                }
                self.construct(&constructor, args)
            }
            ExprKind::SuperCall(args) => {
                let home = env
                    .home_class()
                    .ok_or_else(|| EvalError::syntax("'super' keyword unexpected here", expr.span))?;
                let parent = home
                    .parent
                    .clone()
                    .ok_or_else(|| EvalError::syntax("'super' keyword unexpected here", expr.span))?;
                let args = self.eval_arguments(args, env)?;
                let this = env.this_value();
                self.construct_on(&parent, &this, args)?;
                self.init_fields(&home, &this)?;
                Ok(Value::Undefined)
            }
            ExprKind::SuperMember(property) => self.super_property(property, env, expr.span),
        }
    }

    /// Evaluate, naming anonymous functions and classes after their binding
    fn eval_named(&mut self, expr: &Expr, env: &Env, name: Option<&str>) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Function(def) if def.name.is_none() => Ok(self.function_expression(def, env, name)),
            ExprKind::Class(def) if def.name.is_none() => self.eval_class(def, env, name),
            _ => self.eval(expr, env),
        }
    }

    /// Member access and calls, `None` once an optional link short-circuits
    fn eval_chain(&mut self, expr: &Expr, env: &Env) -> EvalResult<Option<Value>> {
        match &expr.kind {
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.eval_chain(object, env)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(property, env)?;
                self.get_property(&target, &key).map(Some)
            }
            ExprKind::Call { callee, args, optional } => {
                let Some((function, this)) = self.eval_callee(callee, env)? else {
                    return Ok(None);
                };
                if *optional && function.is_nullish() {
                    return Ok(None);
                }
                let args = self.eval_arguments(args, env)?;
                if !function.is_callable() {
                    return Err(EvalError::type_error(format!("{} is not a function", describe(callee))));
                }
                self.call_function(&function, this, args).map(Some)
            }
            _ => self.eval(expr, env).map(Some),
        }
    }

    /// Function and receiver for a call
    fn eval_callee(&mut self, callee: &Expr, env: &Env) -> EvalResult<Option<(Value, Value)>> {
        match &callee.kind {
            ExprKind::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.eval_chain(object, env)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(property, env)?;
                let function = self.get_property(&target, &key)?;
                Ok(Some((function, target)))
            }
            ExprKind::SuperMember(property) => {
                let function = self.super_property(property, env, callee.span)?;
                Ok(Some((function, env.this_value())))
            }
            _ => Ok(self.eval_chain(callee, env)?.map(|function| (function, Value::Undefined))),
        }
    }

    fn super_property(&mut self, property: &MemberProp, env: &Env, span: Span) -> EvalResult<Value> {
        let parent = env
            .home_class()
            .and_then(|home| home.parent.clone())
            .ok_or_else(|| EvalError::syntax("'super' keyword unexpected here", span))?;
        let key = self.member_key(property, env)?;
        if env.this_value().is_callable() {
            // Static method: `super` is the parent constructor
            return self.get_property(&parent, &key);
        }
        let prototype = self.get_property(&parent, "prototype")?;
        if prototype.is_nullish() {
            return Ok(Value::Undefined);
        }
        self.get_property(&prototype, &key)
    }

    pub(crate) fn eval_arguments(&mut self, args: &[Argument], env: &Env) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::Expr(expr) => values.push(self.eval(expr, env)?),
                Argument::Spread(expr) => {
                    let spread = self.eval(expr, env)?;
                    values.extend(self.iterate(&spread)?);
                }
            }
        }
        Ok(values)
    }

    fn eval_object(&mut self, properties: &[ObjectProp], env: &Env) -> EvalResult<Value> {
        let mut map = IndexMap::with_capacity(properties.len());
        for property in properties {
            match property {
                ObjectProp::KeyValue(key, value) => {
                    let key = self.prop_key(key, env)?;
                    let value = self.eval_named(value, env, Some(&key))?;
                    map.insert(key, value);
                }
                ObjectProp::Spread(expr) => {
                    let source = self.eval(expr, env)?;
                    if source.is_nullish() {
                        continue;
                    }
                    for key in self.own_keys(&source) {
                        let value = self.get_property(&source, &key)?;
                        map.insert(key, value);
                    }
                }
            }
        }
        Ok(Value::object(map))
    }

    fn eval_unary(&mut self, op: UnaryOp, argument: &Expr, env: &Env) -> EvalResult<Value> {
        match op {
            UnaryOp::Typeof => {
                if let ExprKind::Ident(name) = &argument.kind {
                    if !env.has(name) {
                        return Ok(Value::string("undefined"));
                    }
                }
                let value = self.eval(argument, env)?;
                Ok(Value::string(value.type_of()))
            }
            UnaryOp::Delete => {
                if let ExprKind::Member { object, property, .. } = &argument.kind {
                    let target = self.eval(object, env)?;
                    let key = self.member_key(property, env)?;
                    self.delete_property(&target, &key)?;
                }
                Ok(Value::Bool(true))
            }
            UnaryOp::Void => {
                self.eval(argument, env)?;
                Ok(Value::Undefined)
            }
            UnaryOp::Not => Ok(Value::Bool(!self.eval(argument, env)?.truthy())),
            UnaryOp::Minus => Ok(Value::Number(-self.eval(argument, env)?.to_number())),
            UnaryOp::Plus => Ok(Value::Number(self.eval(argument, env)?.to_number())),
            UnaryOp::BitNot => Ok(Value::Number(f64::from(!to_int32(self.eval(argument, env)?.to_number())))),
        }
    }

    fn eval_assign(&mut self, op: AssignOp, target: &Pattern, value: &Expr, env: &Env) -> EvalResult<Value> {
        if op == AssignOp::Assign {
            let value = self.eval_named(value, env, pattern_name(target))?;
            self.bind_pattern(target, value.clone(), BindMode::Assign, env)?;
            return Ok(value);
        }

        let reference = match target {
            Pattern::Identifier(name) => Reference::Binding(name.clone()),
            Pattern::Member(expr) => self.expr_reference(expr, env)?,
            _ => return Err(EvalError::syntax("Invalid left-hand side in assignment", value.span)),
        };
        let current = self.read_reference(&reference, env)?;

        let result = if let Some(logical) = op.logical() {
            if short_circuits(logical, &current) {
                return Ok(current);
            }
            self.eval_named(value, env, pattern_name(target))?
        } else {
            let rhs = self.eval(value, env)?;
            let binary = op
                .binary()
                .ok_or_else(|| EvalError::syntax("Invalid assignment operator", value.span))?;
            self.binary_op(binary, &current, &rhs)?
        };
        self.write_reference(&reference, result.clone(), env)?;
        Ok(result)
    }

    fn expr_reference(&mut self, expr: &Expr, env: &Env) -> EvalResult<Reference> {
        match &expr.kind {
            ExprKind::Ident(name) => Ok(Reference::Binding(name.clone())),
            ExprKind::Member { object, property, .. } => {
                let target = self.eval(object, env)?;
                let key = self.member_key(property, env)?;
                Ok(Reference::Property(target, key))
            }
            ExprKind::SuperMember(property) => {
                let key = self.member_key(property, env)?;
                Ok(Reference::Property(env.this_value(), key))
            }
            _ => Err(EvalError::syntax("Invalid left-hand side in assignment", expr.span)),
        }
    }

    fn read_reference(&mut self, reference: &Reference, env: &Env) -> EvalResult<Value> {
        match reference {
            Reference::Binding(name) => env
                .get(name)
                .ok_or_else(|| EvalError::reference(format!("{} is not defined", name))),
            Reference::Property(target, key) => self.get_property(target, key),
        }
    }

    fn write_reference(&mut self, reference: &Reference, value: Value, env: &Env) -> EvalResult<()> {
        match reference {
            Reference::Binding(name) => env.set(name, value),
            Reference::Property(target, key) => self.set_property(target, key, value),
        }
    }

    fn member_key(&mut self, property: &MemberProp, env: &Env) -> EvalResult<String> {
        match property {
            MemberProp::Name(name) => Ok(name.clone()),
            MemberProp::Computed(expr) => Ok(self.eval(expr, env)?.to_property_key()),
        }
    }

    fn prop_key(&mut self, key: &PropKey, env: &Env) -> EvalResult<String> {
        match key {
            PropKey::Static(name) => Ok(name.clone()),
            PropKey::Computed(expr) => Ok(self.eval(expr, env)?.to_property_key()),
        }
    }

    // Operators

    pub fn binary_op(&mut self, op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
        let number = |f: fn(f64, f64) -> f64| -> EvalResult<Value> { Ok(Value::Number(f(left.to_number(), right.to_number()))) };
        match op {
            BinaryOp::Add => {
                let left = self.to_primitive(left)?;
                let right = self.to_primitive(right)?;
                if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                    Ok(Value::from(format!("{}{}", left, right)))
                } else {
                    Ok(Value::Number(left.to_number() + right.to_number()))
                }
            }
            BinaryOp::Sub => number(|a, b| a - b),
            BinaryOp::Mul => number(|a, b| a * b),
            BinaryOp::Div => number(|a, b| a / b),
            BinaryOp::Rem => number(|a, b| a % b),
            BinaryOp::Pow => number(|a, b| if b.is_nan() { f64::NAN } else { a.powf(b) }),
            BinaryOp::Eq => Ok(Value::Bool(left.loose_equals(right))),
            BinaryOp::NotEq => Ok(Value::Bool(!left.loose_equals(right))),
            BinaryOp::StrictEq => Ok(Value::Bool(left.strict_equals(right))),
            BinaryOp::StrictNotEq => Ok(Value::Bool(!left.strict_equals(right))),
            BinaryOp::Lt => Ok(Value::Bool(self.compare(left, right)? == Some(Ordering::Less))),
            BinaryOp::Gt => Ok(Value::Bool(self.compare(left, right)? == Some(Ordering::Greater))),
            BinaryOp::LtEq => Ok(Value::Bool(matches!(
                self.compare(left, right)?,
                Some(Ordering::Less | Ordering::Equal)
            ))),
            BinaryOp::GtEq => Ok(Value::Bool(matches!(
                self.compare(left, right)?,
                Some(Ordering::Greater | Ordering::Equal)
            ))),
            BinaryOp::BitAnd => Ok(Value::Number(f64::from(to_int32(left.to_number()) & to_int32(right.to_number())))),
            BinaryOp::BitOr => Ok(Value::Number(f64::from(to_int32(left.to_number()) | to_int32(right.to_number())))),
            BinaryOp::BitXor => Ok(Value::Number(f64::from(to_int32(left.to_number()) ^ to_int32(right.to_number())))),
            BinaryOp::Shl => {
                let shift = to_int32(right.to_number()) as u32 & 31;
                Ok(Value::Number(f64::from(to_int32(left.to_number()).wrapping_shl(shift))))
            }
            BinaryOp::Shr => {
                let shift = to_int32(right.to_number()) as u32 & 31;
                Ok(Value::Number(f64::from(to_int32(left.to_number()) >> shift)))
            }
            BinaryOp::UShr => {
                let shift = to_int32(right.to_number()) as u32 & 31;
                Ok(Value::Number(f64::from((to_int32(left.to_number()) as u32) >> shift)))
            }
            BinaryOp::Instanceof => self.instance_of(left, right).map(Value::Bool),
            BinaryOp::In => {
                let key = left.to_property_key();
                match right {
                    Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Element(_) => {
                        Ok(Value::Bool(self.has_property(right, &key)))
                    }
                    _ => Err(EvalError::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key, right
                    ))),
                }
            }
        }
    }

    fn compare(&mut self, left: &Value, right: &Value) -> EvalResult<Option<Ordering>> {
        let left = self.to_primitive(left)?;
        let right = self.to_primitive(right)?;
        Ok(match (&left, &right) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => left.to_number().partial_cmp(&right.to_number()),
        })
    }

    fn instance_of(&mut self, value: &Value, constructor: &Value) -> EvalResult<bool> {
        let Value::Function(function) = constructor else {
            return Err(EvalError::type_error("Right-hand side of 'instanceof' is not callable"));
        };
        if let FunctionKind::Bound { target, .. } = &function.kind {
            return self.instance_of(value, target);
        }
        if matches!(value, Value::Array(_)) {
            return Ok(constructor.ptr_eq(&self.realm.intrinsics.array_constructor));
        }
        let Value::Object(object) = value else {
            return Ok(false);
        };
        let Value::Object(prototype) = self.get_property(constructor, "prototype")? else {
            return Ok(false);
        };
        let mut current = object.borrow().proto.clone();
        while let Some(proto) = current {
            if Rc::ptr_eq(&proto, &prototype) {
                return Ok(true);
            }
            current = proto.borrow().proto.clone();
        }
        Ok(false)
    }

    /// Objects become strings, calling a script-defined `toString` if any
    pub fn to_primitive(&mut self, value: &Value) -> EvalResult<Value> {
        match value {
            Value::Object(object) => {
                let custom = object.borrow().get("toString");
                match custom {
                    Some(method @ Value::Function(_)) if is_script_function(&method) => {
                        self.call_function(&method, value.clone(), Vec::new())
                    }
                    _ => Ok(Value::from(value.to_display_string())),
                }
            }
            Value::Array(_) | Value::Function(_) | Value::Element(_) => Ok(Value::from(value.to_display_string())),
            other => Ok(other.clone()),
        }
    }

    pub fn to_string_value(&mut self, value: &Value) -> EvalResult<String> {
        Ok(self.to_primitive(value)?.to_display_string())
    }

    // Properties

    pub fn get_property(&self, target: &Value, key: &str) -> EvalResult<Value> {
        let intrinsics = &self.realm.intrinsics;
        let method = |table: &std::collections::HashMap<&'static str, Value>| {
            table
                .get(key)
                .or_else(|| intrinsics.object_methods.get(key))
                .cloned()
                .unwrap_or(Value::Undefined)
        };
        match target {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                target, key
            ))),
            Value::Bool(_) => Ok(method(&intrinsics.object_methods)),
            Value::Number(_) => Ok(method(&intrinsics.number_methods)),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Some(index) = array_index(key) {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map(|c| Value::from(c.to_string()))
                        .unwrap_or(Value::Undefined));
                }
                Ok(method(&intrinsics.string_methods))
            }
            Value::Array(items) => {
                if key == "length" {
                    return Ok(Value::Number(items.borrow().len() as f64));
                }
                if let Some(index) = array_index(key) {
                    return Ok(items.borrow().get(index).cloned().unwrap_or(Value::Undefined));
                }
                Ok(method(&intrinsics.array_methods))
            }
            Value::Object(object) => {
                if let Some(value) = object.borrow().get(key) {
                    return Ok(value);
                }
                Ok(intrinsics.object_methods.get(key).cloned().unwrap_or(Value::Undefined))
            }
            Value::Function(function) => Ok(self.function_property(function, key)),
            Value::Element(element) => Ok(match key {
                "type" => element.element_type.clone(),
                "props" => element.props.clone(),
                "key" => element.key.as_deref().map(Value::from).unwrap_or(Value::Null),
                _ => Value::Undefined,
            }),
        }
    }

    fn function_property(&self, function: &Rc<Function>, key: &str) -> Value {
        if let Some(value) = function.get(key) {
            return value;
        }
        match key {
            "name" => return Value::from(function.name.as_str()),
            "length" => return Value::Number(function.arity() as f64),
            "prototype" => {
                if let FunctionKind::Closure(closure) = &function.kind {
                    if !closure.def.is_arrow {
                        let prototype = Value::object_from([("constructor", Value::Function(function.clone()))]);
                        function.set("prototype", prototype.clone());
                        return prototype;
                    }
                }
            }
            _ => {}
        }
        // Static members are inherited from the parent class
        if let FunctionKind::Class(class) = &function.kind {
            if let Some(Value::Function(parent)) = &class.parent {
                let inherited = self.function_property(parent, key);
                if !inherited.is_undefined() {
                    return inherited;
                }
            }
        }
        let intrinsics = &self.realm.intrinsics;
        intrinsics
            .function_methods
            .get(key)
            .or_else(|| intrinsics.object_methods.get(key))
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    pub fn set_property(&self, target: &Value, key: &str, value: Value) -> EvalResult<()> {
        match target {
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                target, key
            ))),
            Value::Object(object) => {
                let mut object = object.borrow_mut();
                if object.frozen {
                    return Err(EvalError::type_error(format!(
                        "Cannot assign to read only property '{}' of object",
                        key
                    )));
                }
                object.properties.insert(key.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if key == "length" {
                    let length = value.to_number();
                    if length < 0.0 || length.fract() != 0.0 || !length.is_finite() {
                        return Err(EvalError::range("Invalid array length"));
                    }
                    items.resize(length as usize, Value::Undefined);
                } else if let Some(index) = array_index(key) {
                    if index >= items.len() {
                        items.resize(index + 1, Value::Undefined);
                    }
                    items[index] = value;
                }
                Ok(())
            }
            Value::Function(function) => {
                function.set(key, value);
                Ok(())
            }
            Value::Element(_) => Err(EvalError::type_error(format!(
                "Cannot assign to read only property '{}' of object",
                key
            ))),
            _ => Ok(()),
        }
    }

    fn delete_property(&self, target: &Value, key: &str) -> EvalResult<()> {
        match target {
            Value::Object(object) => {
                let mut object = object.borrow_mut();
                if object.frozen {
                    return Err(EvalError::type_error(format!("Cannot delete property '{}' of object", key)));
                }
                object.properties.shift_remove(key);
            }
            Value::Array(items) => {
                if let Some(index) = array_index(key) {
                    if let Some(slot) = items.borrow_mut().get_mut(index) {
                        *slot = Value::Undefined;
                    }
                }
            }
            Value::Function(function) => {
                function.properties.borrow_mut().shift_remove(key);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn has_property(&self, target: &Value, key: &str) -> bool {
        match target {
            Value::Object(object) => object.borrow().has(key),
            Value::Array(items) => key == "length" || array_index(key).is_some_and(|i| i < items.borrow().len()),
            Value::Function(function) => !self.function_property(function, key).is_undefined(),
            Value::Element(_) => matches!(key, "type" | "props" | "key"),
            _ => false,
        }
    }

    /// Own enumerable keys, in insertion order
    pub fn own_keys(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Object(object) => object.borrow().properties.keys().cloned().collect(),
            Value::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
            Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
            Value::Function(function) => function
                .properties
                .borrow()
                .keys()
                .filter(|key| key.as_str() != "prototype")
                .cloned()
                .collect(),
            Value::Element(_) => vec!["type".to_string(), "props".to_string(), "key".to_string()],
            _ => Vec::new(),
        }
    }

    /// Items of an iterable value
    pub fn iterate(&self, value: &Value) -> EvalResult<Vec<Value>> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::String(s) => Ok(s.chars().map(|c| Value::from(c.to_string())).collect()),
            other => Err(EvalError::type_error(format!("{} is not iterable", other.inspect()))),
        }
    }

    // Functions

    fn make_closure(&self, def: &Rc<FunctionDef>, env: &Env, home: Option<Rc<Class>>, name: Option<&str>) -> Value {
        let name = def.name.as_deref().or(name).unwrap_or_default();
        Value::Function(Rc::new(Function::new(
            name,
            FunctionKind::Closure(Closure {
                def: def.clone(),
                env: env.clone(),
                home,
            }),
        )))
    }

    fn function_expression(&self, def: &Rc<FunctionDef>, env: &Env, name: Option<&str>) -> Value {
        match &def.name {
            // Named function expressions see their own name
            Some(own) if !def.is_arrow => {
                let scope = env.child();
                let function = self.make_closure(def, &scope, None, None);
                scope.define(own, function.clone());
                function
            }
            _ => self.make_closure(def, env, None, name),
        }
    }

    /// Call any callable value
    pub fn call_function(&mut self, function: &Value, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        let Value::Function(function) = function else {
            return Err(EvalError::type_error(format!("{} is not a function", function.inspect())));
        };
        self.enter()?;
        let result = self.invoke(function, this, args);
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> EvalResult<()> {
        if self.depth >= self.realm.options.max_call_depth {
            return Err(EvalError::range("Maximum call stack size exceeded"));
        }
        self.check_stack()?;
        self.depth += 1;
        Ok(())
    }

    /// Fails once nested statements, expressions and calls have used the
    /// native stack budget
    pub fn check_stack(&self) -> EvalResult<()> {
        if self.guard.exhausted() {
            return Err(EvalError::range("Maximum call stack size exceeded"));
        }
        Ok(())
    }

    fn invoke(&mut self, function: &Rc<Function>, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        match &function.kind {
            FunctionKind::Closure(closure) => {
                let scope = if closure.def.is_arrow {
                    closure.env.child()
                } else {
                    closure.env.function_scope(this, closure.home.clone())
                };
                self.bind_parameters(&closure.def, args, &scope)?;
                self.run_body(&closure.def, &scope)
            }
            FunctionKind::Native(native) => {
                let native = native.clone();
                (*native)(self, &this, &args)
            }
            FunctionKind::Class(_) => Err(EvalError::type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                function.name
            ))),
            FunctionKind::Host => Ok(Value::Null),
            FunctionKind::Bound {
                target,
                this,
                args: bound,
            } => {
                let mut all = bound.clone();
                all.extend(args);
                self.invoke_value(target, this.clone(), all)
            }
        }
    }

    fn invoke_value(&mut self, target: &Value, this: Value, args: Vec<Value>) -> EvalResult<Value> {
        match target {
            Value::Function(function) => self.invoke(function, this, args),
            other => Err(EvalError::type_error(format!("{} is not a function", other.inspect()))),
        }
    }

    fn run_body(&mut self, def: &FunctionDef, scope: &Env) -> EvalResult<Value> {
        match &def.body {
            FunctionBody::Expr(expr) => self.eval(expr, scope),
            FunctionBody::Block(body) => match self.exec_block(body, scope)? {
                Flow::Return(value) => Ok(value),
                _ => Ok(Value::Undefined),
            },
        }
    }

    /// `new constructor(...args)`
    pub fn construct(&mut self, constructor: &Value, args: Vec<Value>) -> EvalResult<Value> {
        let Value::Function(function) = constructor else {
            return Err(EvalError::type_error(format!("{} is not a constructor", constructor.inspect())));
        };
        match &function.kind {
            FunctionKind::Class(class) => {
                let instance = new_instance(Some(class.prototype.clone()));
                self.enter()?;
                let result = self.run_constructor(class, &instance, args);
                self.depth -= 1;
                result
            }
            FunctionKind::Closure(closure) if closure.def.is_arrow => Err(EvalError::type_error(format!(
                "{} is not a constructor",
                display_name(function)
            ))),
            FunctionKind::Closure(_) | FunctionKind::Native(_) => {
                let proto = match self.get_property(constructor, "prototype")? {
                    Value::Object(proto) => Some(proto),
                    _ => None,
                };
                let instance = new_instance(proto);
                let result = self.call_function(constructor, instance.clone(), args)?;
                Ok(if is_object_like(&result) { result } else { instance })
            }
            FunctionKind::Bound { target, args: bound, .. } => {
                let mut all = bound.clone();
                all.extend(args);
                self.construct(target, all)
            }
            FunctionKind::Host => Err(EvalError::type_error(format!(
                "{} is not a constructor",
                display_name(function)
            ))),
        }
    }

    fn run_constructor(&mut self, class: &Rc<Class>, this: &Value, args: Vec<Value>) -> EvalResult<Value> {
        match &class.def.constructor {
            Some(constructor) => {
                if class.parent.is_none() {
                    self.init_fields(class, this)?;
                }
                let scope = class.env.function_scope(this.clone(), Some(class.clone()));
                self.bind_parameters(constructor, args, &scope)?;
                let result = self.run_body(constructor, &scope)?;
                Ok(if is_object_like(&result) { result } else { this.clone() })
            }
            None => {
                if let Some(parent) = &class.parent {
                    self.construct_on(parent, this, args)?;
                }
                self.init_fields(class, this)?;
                Ok(this.clone())
            }
        }
    }

    /// Run a parent constructor against an existing instance (`super(...)`)
    fn construct_on(&mut self, parent: &Value, this: &Value, args: Vec<Value>) -> EvalResult<()> {
        let Value::Function(function) = parent else {
            return Err(EvalError::type_error("Super constructor is not a constructor"));
        };
        match &function.kind {
            FunctionKind::Class(class) => {
                self.enter()?;
                let result = self.run_constructor(class, this, args);
                self.depth -= 1;
                result.map(|_| ())
            }
            FunctionKind::Native(_) | FunctionKind::Closure(_) => {
                self.call_function(parent, this.clone(), args).map(|_| ())
            }
            _ => Err(EvalError::type_error(format!(
                "Super constructor {} is not a constructor",
                display_name(function)
            ))),
        }
    }

    fn init_fields(&mut self, class: &Rc<Class>, this: &Value) -> EvalResult<()> {
        for member in &class.def.members {
            let ClassMemberValue::Field(init) = &member.value else {
                continue;
            };
            if member.is_static {
                continue;
            }
            let scope = class.env.function_scope(this.clone(), Some(class.clone()));
            let key = self.prop_key(&member.key, &scope)?;
            let value = match init {
                Some(init) => self.eval_named(init, &scope, Some(&key))?,
                None => Value::Undefined,
            };
            self.set_property(this, &key, value)?;
        }
        Ok(())
    }

    fn eval_class(&mut self, def: &Rc<ClassDef>, env: &Env, name: Option<&str>) -> EvalResult<Value> {
        let name = def.name.as_deref().or(name).unwrap_or_default().to_string();
        let parent = match &def.superclass {
            Some(expr) => match self.eval(expr, env)? {
                parent @ Value::Function(_) => Some(parent),
                Value::Null => None,
                other => {
                    return Err(EvalError::type_error(format!(
                        "Class extends value {} is not a constructor or null",
                        other.inspect()
                    )))
                }
            },
            None => None,
        };
        let parent_proto = match &parent {
            Some(parent) => match self.get_property(parent, "prototype")? {
                Value::Object(proto) => Some(proto),
                _ => None,
            },
            None => None,
        };

        let prototype = Rc::new(RefCell::new(Object::with_proto(parent_proto)));
        let class_env = env.child();
        let class = Rc::new(Class {
            def: def.clone(),
            env: class_env.clone(),
            parent,
            prototype: prototype.clone(),
        });
        let function = Rc::new(Function::new(name, FunctionKind::Class(class.clone())));
        let value = Value::Function(function.clone());
        function.set("prototype", Value::Object(prototype.clone()));
        prototype
            .borrow_mut()
            .properties
            .insert("constructor".to_string(), value.clone());
        if let Some(own) = &def.name {
            class_env.define(own, value.clone());
        }

        for member in &def.members {
            let key = self.prop_key(&member.key, &class_env)?;
            match &member.value {
                ClassMemberValue::Method(method) => {
                    let method = self.make_closure(method, &class_env, Some(class.clone()), Some(&key));
                    if member.is_static {
                        function.set(key, method);
                    } else {
                        prototype.borrow_mut().properties.insert(key, method);
                    }
                }
                ClassMemberValue::Field(init) if member.is_static => {
                    let scope = class_env.function_scope(value.clone(), Some(class.clone()));
                    let field = match init {
                        Some(init) => self.eval_named(init, &scope, Some(&key))?,
                        None => Value::Undefined,
                    };
                    function.set(key, field);
                }
                ClassMemberValue::Field(_) => {}
            }
        }
        Ok(value)
    }
}

fn new_instance(proto: Option<crate::value::ObjectRef>) -> Value {
    Value::Object(Rc::new(RefCell::new(Object::with_proto(proto))))
}

fn is_object_like(value: &Value) -> bool {
    matches!(
        value,
        Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Element(_)
    )
}

fn is_script_function(value: &Value) -> bool {
    matches!(value, Value::Function(f) if matches!(f.kind, FunctionKind::Closure(_)))
}

fn display_name(function: &Function) -> &str {
    if function.name.is_empty() {
        "anonymous"
    } else {
        &function.name
    }
}

fn short_circuits(op: LogicalOp, left: &Value) -> bool {
    match op {
        LogicalOp::And => !left.truthy(),
        LogicalOp::Or => left.truthy(),
        LogicalOp::Nullish => !left.is_nullish(),
    }
}

fn pattern_name(pattern: &Pattern) -> Option<&str> {
    match pattern {
        Pattern::Identifier(name) => Some(name),
        _ => None,
    }
}

fn collect_bound_names(pattern: &Pattern, names: &mut Vec<String>) {
    match pattern {
        Pattern::Identifier(name) => names.push(name.clone()),
        Pattern::Object { properties, rest } => {
            for property in properties {
                collect_bound_names(&property.value, names);
            }
            if let Some(rest) = rest {
                collect_bound_names(rest, names);
            }
        }
        Pattern::Array { elements, rest } => {
            for element in elements.iter().flatten() {
                collect_bound_names(element, names);
            }
            if let Some(rest) = rest {
                collect_bound_names(rest, names);
            }
        }
        Pattern::Default { target, .. } => collect_bound_names(target, names),
        Pattern::Member(_) => {}
    }
}

/// Source-like name of a callee for error messages
fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Ident(name) => name.clone(),
        ExprKind::This => "this".to_string(),
        ExprKind::Member { object, property, .. } => match property {
            MemberProp::Name(name) => format!("{}.{}", describe(object), name),
            MemberProp::Computed(_) => format!("{}[...]", describe(object)),
        },
        ExprKind::SuperMember(MemberProp::Name(name)) => format!("super.{}", name),
        ExprKind::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

/// Canonical array index (`"3"`, not `"03"` or `"+3"`)
pub(crate) fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

pub(crate) fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    (n.trunc() % 4_294_967_296.0) as i64 as u32 as i32
}
