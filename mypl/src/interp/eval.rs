//! Statement execution and expression evaluation

use super::builtins;
use super::env::Environment;
use super::error::{InterpResult, RuntimeError};
use super::heap::{Heap, ObjHandle, Record};
use super::ops;
use super::output::Output;
use super::value::Value;
use crate::ast::{Expr, FunDecl, Item, Program, Spanned, Stmt, TypeDecl};
use std::collections::HashMap;
use std::io::{self, BufRead};
use std::rc::Rc;

/// Default maximum depth of nested user-function calls
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Outcome of executing a statement. `Returning` propagates through every
/// enclosing block and loop and is consumed only at the call boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    Normal,
    Returning(Value),
}

/// The interpreter
pub struct Interpreter {
    env: Environment,
    heap: Heap,
    /// User-defined functions, fixed after `load`
    functions: HashMap<String, Rc<FunDecl>>,
    /// Record types, fixed after `load`
    types: HashMap<String, Rc<TypeDecl>>,
    output: Output,
    input: Box<dyn BufRead>,
    recursion_depth: usize,
    max_depth: usize,
}

impl Interpreter {
    /// Create an interpreter printing to stdout and reading from stdin
    pub fn new() -> Self {
        Interpreter {
            env: Environment::new(),
            heap: Heap::new(),
            functions: HashMap::new(),
            types: HashMap::new(),
            output: Output::Stdout,
            input: Box::new(io::BufReader::new(io::stdin())),
            recursion_depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn with_input(mut self, input: Box<dyn BufRead>) -> Self {
        self.input = input;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Register every function and record type. Order does not matter.
    pub fn load(&mut self, program: &Program) {
        for item in &program.items {
            match item {
                Item::FunDecl(decl) => {
                    self.functions
                        .insert(decl.name.node.clone(), Rc::new(decl.clone()));
                }
                Item::TypeDecl(decl) => {
                    self.types
                        .insert(decl.name.node.clone(), Rc::new(decl.clone()));
                }
            }
        }
        tracing::debug!(
            functions = self.functions.len(),
            types = self.types.len(),
            "loaded declarations"
        );
    }

    /// Load a program and call `main` with no arguments
    pub fn run(&mut self, program: &Program) -> InterpResult<Value> {
        self.load(program);

        let main = self
            .functions
            .get("main")
            .cloned()
            .ok_or_else(|| RuntimeError::undefined_function("main"))?;
        tracing::debug!("entering main");
        let result = self.call_function(&main, Vec::new())?;
        tracing::debug!(result = %result, heap_records = self.heap.len(), "main returned");
        Ok(result)
    }

    /// Call a built-in or user function with already evaluated arguments
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> InterpResult<Value> {
        if builtins::is_builtin(name) {
            return self.call_builtin(name, args);
        }
        let decl = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::undefined_function(name))?;
        self.call_function(&decl, args)
    }

    /// Write text to the configured output
    pub(super) fn write_output(&mut self, text: &str) -> InterpResult<()> {
        self.output.write(text)
    }

    /// One line of input without its line terminator; empty at end of input
    pub(super) fn read_line(&mut self) -> InterpResult<String> {
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| RuntimeError::io_error(&e.to_string()))?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    // ============================================
    // Calls and records
    // ============================================

    /// Run a user function in a fresh scope under the global scope. The
    /// caller's scope is restored afterwards.
    fn call_function(&mut self, decl: &FunDecl, args: Vec<Value>) -> InterpResult<Value> {
        if decl.params.len() != args.len() {
            return Err(RuntimeError::arity_mismatch(
                &decl.name.node,
                decl.params.len(),
                args.len(),
            ));
        }

        self.recursion_depth += 1;
        if self.recursion_depth > self.max_depth {
            self.recursion_depth -= 1;
            return Err(RuntimeError::stack_overflow());
        }
        tracing::trace!(function = %decl.name.node, depth = self.recursion_depth, "call");

        let caller = self.env.current_id();
        let depth = self.env.depth();
        self.env.set_current_id(Environment::GLOBAL)?;
        self.env.push();
        for (param, arg) in decl.params.iter().zip(args) {
            self.env.define(&param.name.node, arg);
        }

        let flow = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.exec_block(&decl.body)
        });

        // Restore the caller's view before reporting any error from the body
        self.recursion_depth -= 1;
        self.env.unwind_to(depth, caller)?;
        let flow = flow?;

        Ok(match flow {
            ControlFlow::Returning(value) => value,
            ControlFlow::Normal => Value::Nil,
        })
    }

    /// `new T`: field initializers run in order, in a scope under the
    /// global scope where earlier fields are visible to later ones
    fn construct(&mut self, type_name: &Spanned<String>) -> InterpResult<Value> {
        let decl = self
            .types
            .get(&type_name.node)
            .cloned()
            .ok_or_else(|| RuntimeError::undefined_type(&type_name.node).at(type_name.span))?;

        let caller = self.env.current_id();
        let depth = self.env.depth();
        self.env.set_current_id(Environment::GLOBAL)?;
        self.env.push();

        let record = self.eval_fields(&decl);
        self.env.unwind_to(depth, caller)?;
        let record = record?;

        Ok(Value::Object(self.heap.allocate(record)))
    }

    fn eval_fields(&mut self, decl: &TypeDecl) -> InterpResult<Record> {
        let mut record = Record::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let value = self.eval(&field.init)?;
            self.env.define(&field.name.node, value.clone());
            record.insert(field.name.node.clone(), value);
        }
        Ok(record)
    }

    /// Evaluate arguments in the caller's scope, then dispatch
    fn eval_call(
        &mut self,
        func: &Spanned<String>,
        args: &[Spanned<Expr>],
    ) -> InterpResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }
        self.call(&func.node, values).map_err(|e| e.at(func.span))
    }

    // ============================================
    // Statements
    // ============================================

    /// Execute statements in the current scope, stopping at the first return
    fn exec_block(&mut self, stmts: &[Spanned<Stmt>]) -> InterpResult<ControlFlow> {
        for stmt in stmts {
            if let ControlFlow::Returning(value) = self.exec_stmt(stmt)? {
                return Ok(ControlFlow::Returning(value));
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Execute statements in their own scope
    fn exec_scoped(&mut self, stmts: &[Spanned<Stmt>]) -> InterpResult<ControlFlow> {
        self.env.push();
        let flow = self.exec_block(stmts)?;
        self.env.pop()?;
        Ok(flow)
    }

    fn exec_stmt(&mut self, stmt: &Spanned<Stmt>) -> InterpResult<ControlFlow> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.exec_stmt_inner(stmt))
            .map_err(|e| e.at(stmt.span))
    }

    fn exec_stmt_inner(&mut self, stmt: &Spanned<Stmt>) -> InterpResult<ControlFlow> {
        match &stmt.node {
            Stmt::VarDecl(decl) => {
                let value = self.eval(&decl.init)?;
                self.env.define(&decl.name.node, value);
            }

            Stmt::Assign { target, value } => {
                let value = self.eval(value)?;
                self.assign(target, value)?;
            }

            Stmt::Call { func, args } => {
                self.eval_call(func, args)?;
            }

            Stmt::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    if self.eval_bool(&branch.cond)? {
                        return self.exec_scoped(&branch.body);
                    }
                }
                if let Some(body) = else_body {
                    return self.exec_scoped(body);
                }
            }

            Stmt::While { cond, body } => {
                // One scope shared by every iteration
                let mut running = self.eval_bool(cond)?;
                self.env.push();
                while running {
                    if let ControlFlow::Returning(value) = self.exec_block(body)? {
                        self.env.pop()?;
                        return Ok(ControlFlow::Returning(value));
                    }
                    running = self.eval_bool(cond)?;
                }
                self.env.pop()?;
            }

            Stmt::For {
                var,
                start,
                end,
                body,
            } => {
                self.env.push();
                self.env.declare(&var.node);
                let mut counter = self.eval_int(start)?;
                self.env.set(&var.node, Value::Int(counter))?;
                let end = self.eval_int(end)?;

                while counter <= end {
                    if let ControlFlow::Returning(value) = self.exec_block(body)? {
                        self.env.pop()?;
                        return Ok(ControlFlow::Returning(value));
                    }
                    // The body may have changed the counter
                    let value = self.env.get(&var.node)?;
                    let n = value.as_int().ok_or_else(|| {
                        RuntimeError::type_error("int", value.type_name()).at(var.span)
                    })?;
                    let Some(next) = n.checked_add(1) else {
                        break;
                    };
                    counter = next;
                    self.env.set(&var.node, Value::Int(counter))?;
                }
                self.env.pop()?;
            }

            Stmt::Return(expr) => {
                let value = self.eval(expr)?;
                return Ok(ControlFlow::Returning(value));
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Assign to `x` or `x.f1...fn`. Intermediate fields are followed
    /// through the heap; the last record is updated and written back.
    fn assign(&mut self, target: &[Spanned<String>], value: Value) -> InterpResult<()> {
        let Some((root, fields)) = target.split_first() else {
            return Err(RuntimeError::internal("empty assignment target"));
        };
        let Some((last, middle)) = fields.split_last() else {
            return self.env.set(&root.node, value).map_err(|e| e.at(root.span));
        };

        let mut current = self.env.get(&root.node).map_err(|e| e.at(root.span))?;
        for field in middle {
            let handle = self.expect_record(current, field)?;
            current = self.heap.field(handle, &field.node).map_err(|e| e.at(field.span))?;
        }
        let handle = self.expect_record(current, last)?;
        self.heap
            .set_field(handle, &last.node, value)
            .map_err(|e| e.at(last.span))
    }

    fn expect_record(&self, value: Value, next: &Spanned<String>) -> InterpResult<ObjHandle> {
        match value {
            Value::Object(handle) => Ok(handle),
            Value::Nil => Err(RuntimeError::nil_dereference(&next.node).at(next.span)),
            other => Err(RuntimeError::type_error("record", other.type_name()).at(next.span)),
        }
    }

    // ============================================
    // Expressions
    // ============================================

    /// Evaluate an expression with automatic stack growth for deep recursion
    pub fn eval(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr))
            .map_err(|e| e.at(expr.span))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        match &expr.node {
            Expr::IntLit(text) => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| RuntimeError::invalid_number(text, "int")),
            Expr::DoubleLit(text) => text
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| RuntimeError::invalid_number(text, "double")),
            Expr::StringLit(s) => Ok(Value::string(s.as_str())),
            Expr::CharLit(c) => Ok(Value::Char(*c)),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::Nil => Ok(Value::Nil),

            Expr::Path(path) => self.eval_path(path),

            Expr::New(type_name) => self.construct(type_name),

            Expr::Call { func, args } => self.eval_call(func, args),

            Expr::Binary { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, &left, &right)
            }

            Expr::Unary { op, expr } => {
                let value = self.eval(expr)?;
                ops::unary(*op, &value)
            }

            Expr::Matrix(rows) => {
                let mut entries = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut values = Vec::with_capacity(row.len());
                    for elem in row {
                        let value = self.eval(elem)?;
                        let x = value.as_double().ok_or_else(|| {
                            RuntimeError::type_error("double", value.type_name()).at(elem.span)
                        })?;
                        values.push(x);
                    }
                    entries.push(values);
                }
                ops::matrix_from_rows(entries)
            }
        }
    }

    /// Read `x` or `x.f1...fn`. A nil anywhere along the path makes the
    /// whole path nil.
    fn eval_path(&mut self, path: &[Spanned<String>]) -> InterpResult<Value> {
        let Some((root, fields)) = path.split_first() else {
            return Err(RuntimeError::internal("empty path"));
        };
        let mut value = self.env.get(&root.node).map_err(|e| e.at(root.span))?;
        for field in fields {
            value = match value {
                Value::Nil => return Ok(Value::Nil),
                Value::Object(handle) => self
                    .heap
                    .field(handle, &field.node)
                    .map_err(|e| e.at(field.span))?,
                other => {
                    return Err(
                        RuntimeError::type_error("record", other.type_name()).at(field.span)
                    );
                }
            };
        }
        Ok(value)
    }

    fn eval_bool(&mut self, expr: &Spanned<Expr>) -> InterpResult<bool> {
        let value = self.eval(expr)?;
        value
            .as_bool()
            .ok_or_else(|| RuntimeError::type_error("bool", value.type_name()).at(expr.span))
    }

    fn eval_int(&mut self, expr: &Spanned<Expr>) -> InterpResult<i64> {
        let value = self.eval(expr)?;
        value
            .as_int()
            .ok_or_else(|| RuntimeError::type_error("int", value.type_name()).at(expr.span))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
