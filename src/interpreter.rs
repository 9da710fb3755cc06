//! Tree-walking evaluator.
//!
//! Statements execute against a chain of [`Environment`]s; the
//! interpreter keeps a cursor to the innermost scope and moves it as
//! blocks and calls open and close. All program output goes through an
//! injected [`Write`] sink so callers (and tests) decide where `print`
//! lands.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::{Function, Value};

/// How a statement finished.
///
/// `Return` rides up through enclosing blocks and loops untouched and
/// is collapsed back into a plain value at the function-call boundary.
/// It is ordinary data, not an error: runtime errors stay on the `Err`
/// side of `Result` and unwind past it.
#[derive(Debug)]
enum Flow {
    Normal,
    Return(Value),
}

/// The evaluator. One instance holds the global scope, so a REPL can
/// feed it line after line and keep its definitions.
pub struct Interpreter<'out> {
    environment: Rc<RefCell<Environment>>,
    out: &'out mut dyn Write,
    call_depth: usize,
}

impl<'out> Interpreter<'out> {
    /// Creates an interpreter writing program output to `out`, with
    /// the `clock` native pre-defined in the global scope.
    pub fn new(out: &'out mut dyn Write) -> Self {
        info!("Initializing interpreter");

        let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        environment.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let timestamp: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                        .as_secs_f64();

                    Ok(Value::Number(timestamp))
                },
            },
        );

        Self {
            environment,
            out,
            call_depth: 0,
        }
    }

    /// Runs a program. The first runtime error aborts the remaining
    /// statements and is handed back to the caller.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        info!("Interpretation completed");

        Ok(())
    }

    // ───────────────────────── statements ─────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.out, "{value}")?;

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope: Environment =
                    Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    if let flow @ Flow::Return(_) = self.execute(body)? {
                        return Ok(flow);
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function { name, params, body } => {
                debug!("fun '{}' with {} params", name.lexeme, params.len());

                // The environment captured here is the scope the
                // declaration ran in, which is what makes closures
                // over locals work.
                let function: Value = Value::Function(Rc::new(Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: Rc::clone(&self.environment),
                }));

                self.environment.borrow_mut().define(&name.lexeme, function);

                Ok(Flow::Normal)
            }

            Stmt::Return { keyword, value } => {
                if self.call_depth == 0 {
                    return Err(LoxError::runtime(
                        keyword.line,
                        "Cannot return from top-level code.",
                    ));
                }

                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }
        }
    }

    /// Runs `statements` inside `scope`, then puts the previous
    /// environment cursor back no matter how execution ended. An early
    /// `return` or a runtime error must not leave the interpreter
    /// stranded in an inner scope.
    fn execute_block(&mut self, statements: &[Stmt], scope: Environment) -> Result<Flow> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, Rc::new(RefCell::new(scope)));

        let mut flow: Result<Flow> = Ok(Flow::Normal);

        for stmt in statements {
            flow = self.execute(stmt);

            if !matches!(flow, Ok(Flow::Normal)) {
                break;
            }
        }

        self.environment = previous;

        flow
    }

    // ───────────────────────── expressions ────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable(name) => self.environment.borrow().get(&name.lexeme, name.line),

            Expr::Assign { name, value } => {
                let value: Value = self.evaluate(value)?;

                self.environment
                    .borrow_mut()
                    .assign(&name.lexeme, value.clone(), name.line)?;

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee, paren, &args)
            }
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

            _ => Err(LoxError::runtime(
                operator.line,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    /// Short-circuit `or`/`and`. The operand value itself comes back
    /// uncoerced: `nil or "x"` is `"x"`, `0 and 1` is `1`.
    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;

        if operator.token_type == TokenType::OR {
            if is_truthy(&left) {
                return Ok(left);
            }
        } else if !is_truthy(&left) {
            return Ok(left);
        }

        self.evaluate(right)
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        // Two strings are their own little world: `+` concatenates and
        // every other operator is rejected, equality included.
        if let (Value::String(a), Value::String(b)) = (&left, &right) {
            return match operator.token_type {
                TokenType::PLUS => Ok(Value::String(format!("{a}{b}"))),

                _ => Err(LoxError::runtime(
                    operator.line,
                    format!(
                        "Cannot use operator '{}' with string operands",
                        operator.lexeme
                    ),
                )),
            };
        }

        // Equality is total over values: nil only equals nil, mixed
        // types are unequal, functions compare by identity.
        match operator.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
            _ => {}
        }

        let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
            return Err(LoxError::runtime(
                operator.line,
                "Operands must both be numbers.",
            ));
        };

        let (a, b) = (*a, *b);

        match operator.token_type {
            TokenType::PLUS => Ok(Value::Number(a + b)),

            TokenType::MINUS => Ok(Value::Number(a - b)),

            TokenType::STAR => Ok(Value::Number(a * b)),

            TokenType::SLASH => {
                // Checked before dividing; IEEE infinity is not a Lox
                // value.
                if b == 0.0 {
                    Err(LoxError::runtime(operator.line, "Cannot divide by zero"))
                } else {
                    Ok(Value::Number(a / b))
                }
            }

            TokenType::GREATER => Ok(Value::Bool(a > b)),

            TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),

            TokenType::LESS => Ok(Value::Bool(a < b)),

            TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),

            _ => Err(LoxError::runtime(
                operator.line,
                format!("Invalid binary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn invoke_callable(&mut self, callee: &Value, paren: &Token, args: &[Value]) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("calling native fn '{name}'");

                if args.len() != *arity {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!("Expected {} arguments but got {}.", arity, args.len()),
                    ));
                }

                func(args).map_err(|msg: String| LoxError::runtime(paren.line, msg))
            }

            Value::Function(function) => {
                debug!("calling fn '{}'", function.name.lexeme);

                if args.len() != function.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            args.len()
                        ),
                    ));
                }

                // The parameter scope hangs off the captured closure,
                // not off the caller's environment.
                let mut scope: Environment =
                    Environment::with_enclosing(Rc::clone(&function.closure));

                for (param, arg) in function.params.iter().zip(args.iter()) {
                    scope.define(&param.lexeme, arg.clone());
                }

                self.call_depth += 1;
                let flow: Result<Flow> = self.execute_block(&function.body, scope);
                self.call_depth -= 1;

                match flow? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Nil),
                }
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }
}

fn literal_value(lit: &LiteralValue) -> Value {
    match lit {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}
