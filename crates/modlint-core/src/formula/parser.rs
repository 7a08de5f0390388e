//! Recursive-descent parser for formulas
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | factor
//! factor := NUMBER | IDENT [chain] ['(' expr ')']
//! chain  := ':' [atom (delim atom)*]
//! atom   := ['-'] NUMBER | IDENT
//! ```
//!
//! Unary `+` and grouping parentheses are rejected. Whether an operator may
//! use the colon or the parenthesized form is checked by the validator.

use super::FormulaParseError;
use super::ast::{ArgValue, Argument, AstNode, BinaryOp, CallStyle, FunctionCall, Span};
use super::lexer::{FormulaToken, FormulaTokenKind, tokenize};

/// Parse a formula into an AST.
///
/// # Example
///
/// ```
/// use modlint_core::formula::{AstNode, parse_formula};
///
/// let ast = parse_formula("between:10:20:c:STR * 2").unwrap();
/// assert!(matches!(ast, AstNode::Binary { .. }));
/// assert!(parse_formula("abs:(1-2)").is_err());
/// ```
pub fn parse_formula(text: &str) -> Result<AstNode, FormulaParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(FormulaParseError::Empty);
    }

    let mut parser = FormulaParser {
        tokens: &tokens,
        pos: 0,
        end: text.chars().count(),
    };
    let node = parser.parse_expr()?;
    if let Some(token) = parser.current() {
        return Err(FormulaParseError::UnexpectedToken {
            found: token.text.clone(),
            offset: token.span.start,
        });
    }
    Ok(node)
}

struct FormulaParser<'a> {
    tokens: &'a [FormulaToken],
    pos: usize,
    /// Character length of the formula, for end-of-input offsets
    end: usize,
}

impl<'a> FormulaParser<'a> {
    fn parse_expr(&mut self) -> Result<AstNode, FormulaParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current_kind() {
                Some(FormulaTokenKind::Plus) => BinaryOp::Add,
                Some(FormulaTokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> Result<AstNode, FormulaParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_kind() {
                Some(FormulaTokenKind::Star) => BinaryOp::Mul,
                Some(FormulaTokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<AstNode, FormulaParseError> {
        match self.current() {
            Some(token) if token.kind == FormulaTokenKind::Minus => {
                let start = token.span;
                self.advance();
                let operand = self.parse_unary()?;
                let span = start.to(operand.span());
                Ok(AstNode::Unary {
                    operand: Box::new(operand),
                    span,
                })
            }
            Some(token) if token.kind == FormulaTokenKind::Plus => Err(FormulaParseError::UnaryPlus {
                offset: token.span.start,
            }),
            _ => self.parse_factor(),
        }
    }

    fn parse_factor(&mut self) -> Result<AstNode, FormulaParseError> {
        let Some(token) = self.current().cloned() else {
            return Err(FormulaParseError::UnexpectedEnd { offset: self.end });
        };

        match &token.kind {
            FormulaTokenKind::Number(value) => {
                self.advance();
                Ok(AstNode::Literal {
                    value: *value,
                    span: token.span,
                })
            }
            FormulaTokenKind::Ident(name) => {
                self.advance();
                match self.current_kind() {
                    Some(FormulaTokenKind::Colon | FormulaTokenKind::LParen) => {
                        self.parse_call(name.clone(), token.span)
                    }
                    _ => Ok(AstNode::Variable {
                        name: name.clone(),
                        span: token.span,
                    }),
                }
            }
            FormulaTokenKind::LParen => Err(FormulaParseError::Grouping {
                offset: token.span.start,
            }),
            _ => Err(FormulaParseError::UnexpectedToken {
                found: token.text,
                offset: token.span.start,
            }),
        }
    }

    /// Called with the name consumed and the cursor on `:` or `(`
    fn parse_call(&mut self, name: String, name_span: Span) -> Result<AstNode, FormulaParseError> {
        let mut args = Vec::new();
        let mut end = name_span.end;

        if let Some(colon) = self.current().filter(|t| t.kind == FormulaTokenKind::Colon).cloned() {
            self.advance();
            end = colon.span.end;
            if !self.at_chain_end() {
                let arg = self.parse_atom(':', colon.span.start)?;
                end = arg.span.end;
                args.push(arg);
                while let Some(delim) = self
                    .current()
                    .filter(|t| matches!(t.kind, FormulaTokenKind::Colon | FormulaTokenKind::Comma))
                    .cloned()
                {
                    self.advance();
                    let delimiter = delim.text.chars().next().unwrap_or(':');
                    let arg = self.parse_atom(delimiter, delim.span.start)?;
                    end = arg.span.end;
                    args.push(arg);
                }
            }
        }

        let mut style = CallStyle::Colon;
        if let Some(open) = self.current().filter(|t| t.kind == FormulaTokenKind::LParen).cloned() {
            self.advance();
            let body = self.parse_expr()?;
            match self.current() {
                Some(close) if close.kind == FormulaTokenKind::RParen => {
                    end = close.span.end;
                    self.advance();
                }
                _ => {
                    return Err(FormulaParseError::UnclosedParen {
                        offset: open.span.start,
                    });
                }
            }
            args.push(Argument {
                value: ArgValue::Formula(Box::new(body)),
                span: Span::new(open.span.start, end),
                delimiter: '(',
                delimiter_offset: open.span.start,
            });
            style = CallStyle::Paren;
        }

        Ok(AstNode::Function(FunctionCall {
            name,
            name_span,
            args,
            style,
            span: Span::new(name_span.start, end),
        }))
    }

    /// `name:` with nothing after it is a zero-argument call
    fn at_chain_end(&self) -> bool {
        matches!(
            self.current_kind(),
            None | Some(
                FormulaTokenKind::RParen
                    | FormulaTokenKind::Plus
                    | FormulaTokenKind::Star
                    | FormulaTokenKind::Slash
            )
        )
    }

    fn parse_atom(&mut self, delimiter: char, delimiter_offset: usize) -> Result<Argument, FormulaParseError> {
        let Some(token) = self.current().cloned() else {
            return Err(FormulaParseError::MissingArgument {
                delimiter,
                offset: self.end,
            });
        };

        let (value, span) = match &token.kind {
            FormulaTokenKind::Number(_) => {
                self.advance();
                (ArgValue::Number(token.text.clone()), token.span)
            }
            FormulaTokenKind::Ident(name) => {
                self.advance();
                (ArgValue::Identifier(name.clone()), token.span)
            }
            FormulaTokenKind::Minus => match self.tokens.get(self.pos + 1) {
                Some(number) if matches!(number.kind, FormulaTokenKind::Number(_)) => {
                    let span = token.span.to(number.span);
                    let text = format!("-{}", number.text);
                    self.pos += 2;
                    (ArgValue::Number(text), span)
                }
                _ => {
                    return Err(FormulaParseError::MissingArgument {
                        delimiter,
                        offset: token.span.start,
                    });
                }
            },
            FormulaTokenKind::LParen => {
                return Err(FormulaParseError::Grouping {
                    offset: token.span.start,
                });
            }
            _ => {
                return Err(FormulaParseError::MissingArgument {
                    delimiter,
                    offset: token.span.start,
                });
            }
        };

        Ok(Argument {
            value,
            span,
            delimiter,
            delimiter_offset,
        })
    }

    fn current(&self) -> Option<&'a FormulaToken> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<&'a FormulaTokenKind> {
        self.current().map(|t| &t.kind)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

fn binary(op: BinaryOp, left: AstNode, right: AstNode) -> AstNode {
    let span = left.span().to(right.span());
    AstNode::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}
