//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, runtime, CLI) convert their internal
//! failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic
//! inter‑operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The three error classes are never conflated: a lexical error carries only
//! a line, a parse error carries a line plus a location description
//! (`at end` / `at '<lexeme>'`), and a runtime error carries the line of the
//! offending token.  The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error {location}: {message}")]
    Parse {
        message: String,

        /// `at end` or `at '<lexeme>'`, naming the token that broke the parse.
        location: String,

        line: usize,
    },

    /// Runtime evaluation error.  Formatted message first, line second,
    /// matching the conventional Lox runtime-error output.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>, L: Into<String>>(line: usize, location: L, msg: S) -> Self {
        let message: String = msg.into();
        let location: String = location.into();

        info!(
            "Creating Parse error: line={}, location={}, msg={}",
            line, location, message
        );

        LoxError::Parse {
            message,
            location,
            line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }

    /// Source line the error refers to, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Runtime { line, .. } => Some(*line),
            LoxError::Io(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
