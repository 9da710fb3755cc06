//! Runtime values and the callable objects the interpreter produces.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Stmt;
use crate::environment::Environment;
use crate::token::Token;

/// Every value a Lox program can produce at runtime.
///
/// Values are cheap to clone. Numbers, booleans and nil are plain
/// copies; strings clone their buffer; a function clone just bumps an
/// `Rc` count.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),

    String(String),

    Bool(bool),

    Nil,

    /// A user-declared function together with its captured scope.
    Function(Rc<Function>),

    /// A built-in provided by the interpreter itself, such as
    /// `clock`. Errors come back as bare messages; the caller pins
    /// them to a source line.
    NativeFunction {
        name: String,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, String>,
    },
}

/// A user-declared function: the pieces of its declaration plus the
/// environment it closes over.
///
/// `closure` is the environment that was current at declaration time.
/// Calls hang the parameter scope off of it, which is what lets a
/// returned function keep using the locals of its defining scope.
pub struct Function {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
    pub closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

// The captured environment can reach back to this function through a
// recursive binding, so the derived impl would chase that cycle
// forever. Print a summary instead.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name.lexeme)
            .field("arity", &self.params.len())
            .finish_non_exhaustive()
    }
}

// Same cycle problem as Debug: functions compare by identity, never
// by structure.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,

            (Value::String(a), Value::String(b)) => a == b,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            (Value::Nil, Value::Nil) => true,

            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

            (
                Value::NativeFunction {
                    name: a, arity: m, ..
                },
                Value::NativeFunction {
                    name: b, arity: n, ..
                },
            ) => a == b && m == n,

            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),

            Value::Function(func) => write!(f, "<fn {}>", func.name.lexeme),

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),
        }
    }
}
