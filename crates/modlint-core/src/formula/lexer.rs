//! Tokenizer for the formula language

use super::FormulaParseError;
use super::ast::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaTokenKind {
    Number(f64),
    Ident(String),
    Colon,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormulaToken {
    pub kind: FormulaTokenKind,
    /// Source text of the token
    pub text: String,
    pub span: Span,
}

/// Split a formula into tokens; whitespace (including newlines) is skipped
pub fn tokenize(text: &str) -> Result<Vec<FormulaToken>, FormulaParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let kind = match ch {
            ':' => punct(&mut pos, FormulaTokenKind::Colon),
            ',' => punct(&mut pos, FormulaTokenKind::Comma),
            '+' => punct(&mut pos, FormulaTokenKind::Plus),
            '-' => punct(&mut pos, FormulaTokenKind::Minus),
            '*' => punct(&mut pos, FormulaTokenKind::Star),
            '/' => punct(&mut pos, FormulaTokenKind::Slash),
            '(' => punct(&mut pos, FormulaTokenKind::LParen),
            ')' => punct(&mut pos, FormulaTokenKind::RParen),
            c if c.is_ascii_digit() || (c == '.' && next_is_digit(&chars, pos + 1)) => {
                pos = scan_number(&chars, pos);
                let literal: String = chars[start..pos].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| FormulaParseError::InvalidNumber {
                        text: literal.clone(),
                        offset: start,
                    })?;
                FormulaTokenKind::Number(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                while pos < chars.len() && (chars[pos].is_alphanumeric() || matches!(chars[pos], '_' | '.'))
                {
                    pos += 1;
                }
                FormulaTokenKind::Ident(chars[start..pos].iter().collect())
            }
            other => {
                return Err(FormulaParseError::UnexpectedChar {
                    ch: other,
                    offset: start,
                });
            }
        };

        tokens.push(FormulaToken {
            kind,
            text: chars[start..pos].iter().collect(),
            span: Span::new(start, pos),
        });
    }

    Ok(tokens)
}

fn punct(pos: &mut usize, kind: FormulaTokenKind) -> FormulaTokenKind {
    *pos += 1;
    kind
}

fn next_is_digit(chars: &[char], idx: usize) -> bool {
    chars.get(idx).is_some_and(char::is_ascii_digit)
}

/// `12`, `1.5`, `.5`, `5.`, `1e3`, `2.5E-2`
fn scan_number(chars: &[char], mut pos: usize) -> usize {
    while next_is_digit(chars, pos) {
        pos += 1;
    }
    if chars.get(pos) == Some(&'.') {
        pos += 1;
        while next_is_digit(chars, pos) {
            pos += 1;
        }
    }
    if matches!(chars.get(pos), Some('e' | 'E')) {
        let signed = matches!(chars.get(pos + 1), Some('+' | '-'));
        let digits_at = if signed { pos + 2 } else { pos + 1 };
        if next_is_digit(chars, digits_at) {
            pos = digits_at;
            while next_is_digit(chars, pos) {
                pos += 1;
            }
        }
    }
    pos
}
