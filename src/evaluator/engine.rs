use super::builtins;
use crate::ast::{AssignOp, Bindings, DeclarationKind, Expression, Program, Statement, Value};
use crate::error::RuntimeError;
use ahash::AHashMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::trace;

// This macro generates a match arm for a binary operation.
macro_rules! eval_op {
    ($self:ident, $l:ident, $r:ident, $op_str:expr, $op_fn:expr, number) => {
        $self.eval_arithmetic($l, $r, $op_str, $op_fn)
    };
    ($self:ident, $l:ident, $r:ident, $op_str:expr, $op_fn:expr, ordering) => {
        $self.eval_comparison($l, $r, $op_str, $op_fn)
    };
}

/// How a statement finished.
enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

struct Slot {
    value: Value,
    constant: bool,
}

/// The tree-walking interpreter for one program run.
///
/// Name lookup walks the scope stack innermost first and ends at the caller's
/// bindings. Scope 0 is a copy-on-write overlay over those bindings, so
/// assignments to a bound name never reach the caller's map.
pub(super) struct AstEngine<'a> {
    bindings: &'a Bindings,
    scopes: Vec<AHashMap<String, Slot>>,
    steps: u64,
    max_steps: Option<u64>,
}

impl<'a> AstEngine<'a> {
    pub(super) fn new(bindings: &'a Bindings, max_steps: Option<u64>) -> Self {
        Self {
            bindings,
            scopes: vec![AHashMap::new()],
            steps: 0,
            max_steps,
        }
    }

    /// Runs the program and returns the value of its first executed `return`, or null.
    pub(super) fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let completion = self.scoped(|engine| engine.exec_all(&program.body))?;
        trace!(steps = self.steps, "program finished");
        Ok(match completion {
            Completion::Return(value) => value,
            Completion::Normal | Completion::Break | Completion::Continue => Value::Null,
        })
    }

    fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        self.scopes.push(AHashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn tick(&mut self) -> Result<(), RuntimeError> {
        if let Some(max) = self.max_steps {
            self.steps += 1;
            if self.steps > max {
                return Err(RuntimeError::StepBudgetExhausted(max));
            }
        }
        Ok(())
    }

    fn exec_all(&mut self, statements: &[Statement]) -> Result<Completion, RuntimeError> {
        for statement in statements {
            match self.exec(statement)? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal)
    }

    fn exec(&mut self, statement: &Statement) -> Result<Completion, RuntimeError> {
        self.tick()?;
        match statement {
            Statement::Declare { kind, name, init } => {
                let value = match init {
                    Some(init) => self.eval(init)?,
                    None => Value::Null,
                };
                self.declare(name, value, *kind == DeclarationKind::Const)?;
                Ok(Completion::Normal)
            }
            Statement::Assign { target, op, value } => {
                let rhs = self.eval(value)?;
                let new_value = match op {
                    AssignOp::Set => rhs,
                    AssignOp::Add => add(self.lookup(target)?, rhs)?,
                    AssignOp::Subtract => {
                        Self::arithmetic(self.lookup(target)?, rhs, "-=", |a, b| Ok(a - b))?
                    }
                    AssignOp::Multiply => {
                        Self::arithmetic(self.lookup(target)?, rhs, "*=", |a, b| Ok(a * b))?
                    }
                    AssignOp::Divide => Self::arithmetic(self.lookup(target)?, rhs, "/=", divide)?,
                };
                self.assign(target, new_value)?;
                Ok(Completion::Normal)
            }
            Statement::Expression(expression) => {
                self.eval(expression)?;
                Ok(Completion::Normal)
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.scoped(|engine| engine.exec(then_branch))
                } else if let Some(else_branch) = else_branch {
                    self.scoped(|engine| engine.exec(else_branch))
                } else {
                    Ok(Completion::Normal)
                }
            }
            Statement::While { condition, body } => {
                while self.eval(condition)?.is_truthy() {
                    self.tick()?;
                    match self.scoped(|engine| engine.exec(body))? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }
            Statement::For {
                init,
                condition,
                update,
                body,
            } => self.scoped(|engine| {
                if let Some(init) = init {
                    engine.exec(init)?;
                }
                loop {
                    if let Some(condition) = condition {
                        if !engine.eval(condition)?.is_truthy() {
                            break;
                        }
                    }
                    engine.tick()?;
                    match engine.scoped(|engine| engine.exec(body))? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if let Some(update) = update {
                        engine.exec(update)?;
                    }
                }
                Ok(Completion::Normal)
            }),
            Statement::Block(statements) => self.scoped(|engine| engine.exec_all(statements)),
            Statement::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value)?,
                    None => Value::Null,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break => Ok(Completion::Break),
            Statement::Continue => Ok(Completion::Continue),
        }
    }

    fn declare(&mut self, name: &str, value: Value, constant: bool) -> Result<(), RuntimeError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Err(RuntimeError::UndefinedVariable(name.to_string()));
        };
        if scope.contains_key(name) {
            return Err(RuntimeError::AlreadyDeclared(name.to_string()));
        }
        trace!(name, constant, "declared local");
        scope.insert(name.to_string(), Slot { value, constant });
        Ok(())
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                if slot.constant {
                    return Err(RuntimeError::ConstantReassignment(name.to_string()));
                }
                slot.value = value;
                return Ok(());
            }
        }
        if !self.bindings.contains_key(name) {
            return Err(RuntimeError::UndefinedVariable(name.to_string()));
        }
        // First write to a caller binding lands in the overlay.
        self.scopes[0].insert(
            name.to_string(),
            Slot {
                value,
                constant: false,
            },
        );
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).map(|slot| &slot.value))
            .or_else(|| self.bindings.get(name))
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }

    fn eval(&mut self, expr: &Expression) -> Result<Value, RuntimeError> {
        match expr {
            // --- Arithmetic Operations ---
            Expression::Sum(l, r) => {
                let left = self.eval(l)?;
                let right = self.eval(r)?;
                add(left, right)
            }
            Expression::Subtract(l, r) => eval_op!(self, l, r, "-", |a, b| Ok(a - b), number),
            Expression::Multiply(l, r) => eval_op!(self, l, r, "*", |a, b| Ok(a * b), number),
            Expression::Divide(l, r) => eval_op!(self, l, r, "/", divide, number),
            Expression::Remainder(l, r) => eval_op!(self, l, r, "%", remainder, number),
            Expression::Power(l, r) => eval_op!(self, l, r, "**", |a, b| Ok(a.powf(b)), number),
            Expression::Negate(v) => match self.eval(v)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(type_mismatch("-", "Number", other)),
            },
            Expression::Plus(v) => match self.eval(v)? {
                Value::Number(n) => Ok(Value::Number(n)),
                other => Err(type_mismatch("+", "Number", other)),
            },

            // --- Comparison Operations ---
            Expression::GreaterThan(l, r) => eval_op!(self, l, r, ">", Ordering::is_gt, ordering),
            Expression::SmallerThan(l, r) => eval_op!(self, l, r, "<", Ordering::is_lt, ordering),
            Expression::GreaterThanOrEqual(l, r) => {
                eval_op!(self, l, r, ">=", Ordering::is_ge, ordering)
            }
            Expression::SmallerThanOrEqual(l, r) => {
                eval_op!(self, l, r, "<=", Ordering::is_le, ordering)
            }

            // --- Equality ---
            Expression::Equal(l, r) => {
                let left = self.eval(l)?;
                let right = self.eval(r)?;
                Ok(Value::Bool(left == right))
            }
            Expression::NotEqual(l, r) => {
                let left = self.eval(l)?;
                let right = self.eval(r)?;
                Ok(Value::Bool(left != right))
            }

            // --- Logical Operations ---
            Expression::And(l, r) => {
                let left = self.eval(l)?;
                if !left.is_truthy() {
                    return Ok(left);
                }
                self.eval(r)
            }
            Expression::Or(l, r) => {
                let left = self.eval(l)?;
                if left.is_truthy() {
                    return Ok(left);
                }
                self.eval(r)
            }
            Expression::Not(v) => Ok(Value::Bool(!self.eval(v)?.is_truthy())),
            Expression::Conditional(c, t, e) => {
                if self.eval(c)?.is_truthy() {
                    self.eval(t)
                } else {
                    self.eval(e)
                }
            }

            // --- Access and calls ---
            Expression::Member(target, name) => match self.eval(target)? {
                Value::Null => Err(RuntimeError::NullAccess {
                    property: name.clone(),
                }),
                Value::Record(mut fields) => Ok(fields.remove(name).unwrap_or_default()),
                Value::List(items) if name == "length" => Ok(Value::Number(items.len() as f64)),
                Value::Str(s) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
                _ => Ok(Value::Null),
            },
            Expression::Index(target, index) => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                index_value(target, index)
            }
            Expression::Call(builtin, args) => {
                self.tick()?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                builtins::call(*builtin, args)
            }
            Expression::Apply(callee, _) => Err(RuntimeError::NotCallable(callee.to_string())),

            // --- Constructors ---
            Expression::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?,
            )),
            Expression::Record(fields) => {
                let mut record = BTreeMap::new();
                for (key, value) in fields {
                    let value = self.eval(value)?;
                    record.insert(key.clone(), value);
                }
                Ok(Value::Record(record))
            }

            // --- Leaf nodes ---
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Variable(name) => self.lookup(name),
        }
    }

    fn eval_arithmetic<F>(
        &mut self,
        l: &Expression,
        r: &Expression,
        op: &'static str,
        f: F,
    ) -> Result<Value, RuntimeError>
    where
        F: Fn(f64, f64) -> Result<f64, RuntimeError>,
    {
        let left = self.eval(l)?;
        let right = self.eval(r)?;
        Self::arithmetic(left, right, op, f)
    }

    fn arithmetic<F>(left: Value, right: Value, op: &str, f: F) -> Result<Value, RuntimeError>
    where
        F: Fn(f64, f64) -> Result<f64, RuntimeError>,
    {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(a, b)?)),
            (Value::Number(_), other) | (other, _) => Err(type_mismatch(op, "Number", other)),
        }
    }

    fn eval_comparison<F>(
        &mut self,
        l: &Expression,
        r: &Expression,
        op: &'static str,
        f: F,
    ) -> Result<Value, RuntimeError>
    where
        F: Fn(Ordering) -> bool,
    {
        let left = self.eval(l)?;
        let right = self.eval(r)?;
        let ordering = match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Number(_) | Value::Str(_), _) => {
                return Err(type_mismatch(op, left.type_name(), right.clone()));
            }
            _ => return Err(type_mismatch(op, "Number or String", left.clone())),
        };
        // NaN compares false against everything.
        Ok(Value::Bool(ordering.is_some_and(f)))
    }
}

/// `+` adds numbers and concatenates as soon as either side is a string.
fn add(left: Value, right: Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (left @ Value::Str(_), right) | (left, right @ Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", left, right)))
        }
        (Value::Number(_), other) | (other, _) => Err(type_mismatch("+", "Number", other)),
    }
}

fn divide(a: f64, b: f64) -> Result<f64, RuntimeError> {
    if b == 0.0 {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(a / b)
}

fn remainder(a: f64, b: f64) -> Result<f64, RuntimeError> {
    if b == 0.0 {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(a % b)
}

fn index_value(target: Value, index: Value) -> Result<Value, RuntimeError> {
    let position = |n: f64| (n >= 0.0 && n.fract() == 0.0).then_some(n as usize);
    Ok(match (target, index) {
        (Value::Null, index) => {
            return Err(RuntimeError::NullAccess {
                property: index.to_string(),
            });
        }
        (Value::List(mut items), Value::Number(n)) => match position(n) {
            Some(i) if i < items.len() => items.swap_remove(i),
            _ => Value::Null,
        },
        (Value::Str(s), Value::Number(n)) => position(n)
            .and_then(|i| s.chars().nth(i))
            .map_or(Value::Null, |c| Value::Str(c.to_string())),
        (Value::Record(mut fields), key) => fields.remove(&key.to_string()).unwrap_or_default(),
        _ => Value::Null,
    })
}

fn type_mismatch(op: &str, expected: &str, found: Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        operation: op.to_string(),
        expected: expected.to_string(),
        found,
    }
}
