//! Embedded formula language: tokenizer, parser, AST and validator

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod validator;

use thiserror::Error;

pub use ast::{ArgValue, Argument, AstNode, BinaryOp, CallStyle, FunctionCall, Span};
pub use parser::parse_formula;
pub use validator::{FormulaValidator, validate_ast};

/// Syntax error in a formula; `offset` is a character offset into the text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaParseError {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected character '{ch}'")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("invalid number '{text}'")]
    InvalidNumber { text: String, offset: usize },

    #[error("unexpected '{found}'")]
    UnexpectedToken { found: String, offset: usize },

    #[error("formula ends unexpectedly")]
    UnexpectedEnd { offset: usize },

    #[error("unary '+' is not supported; drop the sign")]
    UnaryPlus { offset: usize },

    #[error("grouping parentheses are not supported")]
    Grouping { offset: usize },

    #[error("expected an argument after '{delimiter}'")]
    MissingArgument { delimiter: char, offset: usize },

    #[error("'(' is never closed")]
    UnclosedParen { offset: usize },
}

impl FormulaParseError {
    /// Character offset of the error (0 for an empty formula)
    pub fn offset(&self) -> usize {
        match self {
            FormulaParseError::Empty => 0,
            FormulaParseError::UnexpectedChar { offset, .. }
            | FormulaParseError::InvalidNumber { offset, .. }
            | FormulaParseError::UnexpectedToken { offset, .. }
            | FormulaParseError::UnexpectedEnd { offset }
            | FormulaParseError::UnaryPlus { offset }
            | FormulaParseError::Grouping { offset }
            | FormulaParseError::MissingArgument { offset, .. }
            | FormulaParseError::UnclosedParen { offset } => *offset,
        }
    }
}
