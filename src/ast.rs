//! AST node definitions for the Lox language.
//!
//! Two closed families, [`Expr`] for expressions and [`Stmt`] for
//! statements, each an enum over a fixed variant set consumed by
//! exhaustive `match` in the parser, printer, and interpreter.  Adding a
//! node kind is a compile‑time‑checked change everywhere it matters.
//!
//! Nodes own their tokens and children (`Box`/`Vec`), form a tree (never a
//! DAG), and are immutable once the parser has built them.

use serde::Serialize;

use crate::token::Token;

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree.  The
/// parser copies (or converts) the value at parse‑time, so literals carry no
/// token reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal (Lox’s `null`).
    Nil,
}

/// **Abstract‑syntax‑tree node** representing every kind of *expression*
/// in Lox.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        /// Operand to which the operator is applied.
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        /// Operator token such as `+`, `*`, `==`, …
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Variable access ‑ resolves to the identifier’s current value at runtime.
    Variable(Token),

    /// Assignment expression: `identifier "=" expression`
    Assign { name: Token, value: Box<Expr> },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// Function‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        /// Expression that evaluates to a callable.
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        /// Argument list (may be empty).
        arguments: Vec<Expr>,
    },
}

impl Expr {
    /// Representative source line for diagnostics.  Literals carry no token,
    /// so they report line `0`; every enclosing node overrides that.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,

            Expr::Unary { operator, .. } => operator.line,

            Expr::Binary { operator, .. } => operator.line,

            Expr::Grouping(expr) => expr.line(),

            Expr::Variable(token) => token.line,

            Expr::Assign { name, .. } => name.line,

            Expr::Logical { operator, .. } => operator.line,

            Expr::Call { paren, .. } => paren.line,
        }
    }
}

/// **Abstract‑syntax‑tree node** for *statements* (complete executable
/// constructs).  A program is a sequence of these nodes returned by
/// [`crate::parser::Parser::parse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop.  `for` loops desugar to this at parse time, so the
    /// interpreter never sees a dedicated `for` node.
    While { condition: Expr, body: Box<Stmt> },

    /// Function declaration ‑ becomes a first‑class callable value.
    Function {
        name: Token,

        /// Parameter name tokens (arity ≤ 255).
        params: Vec<Token>,

        /// Body executed when the function is called.
        body: Vec<Stmt>,
    },

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for runtime error locations).
        keyword: Token,

        /// Optional expression to return.
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },
}
