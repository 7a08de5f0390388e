//! Formula syntax tree
//!
//! Every node carries its own character span inside the formula text, so
//! diagnostics never have to search the text for the node again.

use std::fmt;
use std::ops::Range;

/// Character range `[start, end)` inside the formula text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        f.write_str(symbol)
    }
}

/// How a call was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    /// `name:a:b`
    Colon,
    /// `name(expr)` or `name:a(expr)`
    Paren,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Numeric atom, sign included (`-2`)
    Number(String),
    Identifier(String),
    /// Parenthesized formula body
    Formula(Box<AstNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: ArgValue,
    pub span: Span,
    /// `:`, an alternate delimiter such as `,`, or `(` for a body
    pub delimiter: char,
    pub delimiter_offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub name_span: Span,
    pub args: Vec<Argument>,
    pub style: CallStyle,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Literal {
        value: f64,
        span: Span,
    },
    /// Bare identifier: a global formula reference
    Variable {
        name: String,
        span: Span,
    },
    /// Negation; the only unary operator
    Unary {
        operand: Box<AstNode>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        span: Span,
    },
    Function(FunctionCall),
}

impl AstNode {
    pub fn span(&self) -> Span {
        match self {
            AstNode::Literal { span, .. }
            | AstNode::Variable { span, .. }
            | AstNode::Unary { span, .. }
            | AstNode::Binary { span, .. } => *span,
            AstNode::Function(call) => call.span,
        }
    }
}
