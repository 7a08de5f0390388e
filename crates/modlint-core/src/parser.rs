//! Object parser for mod files
//!
//! Builds [`ParsedObject`]s from the token stream with local error recovery:
//! a malformed object is reported and parsing resumes at the next anchor, so
//! one typo never hides the rest of the file.
//!
//! Values may span lines. After a newline the parser looks at the next
//! significant token: `[`, end of input, a comment or an `identifier =`
//! pattern ends the value; anything else continues it.

use crate::diagnostics::{Correction, ValidationMessage, codes};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::object::{ParsedObject, PropertyInfo, link_siblings};
use crate::position::{LineSpan, TextSpan};

/// Parse a mod file into objects plus structural diagnostics.
///
/// `file` is only a label for diagnostics. Never fails: malformed input is
/// reported and skipped.
///
/// # Example
///
/// ```
/// use modlint_core::parser::parse;
///
/// let (objects, messages) = parse("[Action] ID=test;", "actions.txt");
/// assert!(messages.is_empty());
/// assert_eq!(objects[0].type_name, "Action");
/// assert_eq!(objects[0].value("ID"), Some("test"));
/// ```
pub fn parse(source: &str, file: &str) -> (Vec<ParsedObject>, Vec<ValidationMessage>) {
    let tokens = tokenize(source);
    let mut parser = Parser::new(source, file, &tokens);
    parser.parse_document();

    let Parser {
        mut objects,
        messages,
        ..
    } = parser;
    link_siblings(&mut objects);

    tracing::debug!(
        file,
        objects = objects.len(),
        diagnostics = messages.len(),
        "parsed file"
    );
    (objects, messages)
}

/// Token stream parser
struct Parser<'a> {
    source: &'a str,
    file: &'a str,
    tokens: &'a [Token],
    pos: usize,
    objects: Vec<ParsedObject>,
    messages: Vec<ValidationMessage>,
    reported_unexpected: bool,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, file: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            file,
            tokens,
            pos: 0,
            objects: Vec::new(),
            messages: Vec::new(),
            reported_unexpected: false,
        }
    }

    fn parse_document(&mut self) {
        while !self.at_end() {
            match self.current_kind() {
                TokenKind::Newline | TokenKind::Comment => self.advance(),
                TokenKind::LeftBracket => self.parse_object(),
                _ => {
                    // Only the first stray token per file is reported
                    if !self.reported_unexpected {
                        self.reported_unexpected = true;
                        let token = self.current().clone();
                        self.error(
                            codes::UNEXPECTED_TOKEN,
                            format!(
                                "Unexpected {} '{}' outside object definition",
                                token.kind, token.text
                            ),
                            token_span(&token),
                        );
                    }
                    self.advance();
                }
            }
        }
    }

    /// Grammar: `'[' IDENT ']' property*`
    fn parse_object(&mut self) {
        let open = self.current().clone();
        self.advance();

        if !self.at(TokenKind::Identifier) {
            self.error(
                codes::MISSING_TYPE_NAME,
                "Expected an object type name after '['",
                token_span(&open),
            );
            self.recover_to_close_bracket();
            // Consume the body so its properties are not misreported
            let mut discarded = ParsedObject::new("", self.file, LineSpan::new(open.line, 0, 0));
            self.parse_properties(&mut discarded);
            return;
        }

        let name = self.current().clone();
        self.advance();
        let type_span = LineSpan::new(name.line, name.column, name.end_column());

        if self.at(TokenKind::RightBracket) {
            self.advance();
        } else {
            let message = ValidationMessage::error(
                codes::MISSING_BRACKET,
                format!("Missing ']' after object type '{}'", name.text),
                self.file,
                name.line,
            )
            .with_span(type_span.into())
            .with_correction(Correction::insert(
                self.file,
                name.line,
                name.end_column(),
                "]",
            ));
            self.messages.push(message);
            self.recover_to_close_bracket();
        }

        let mut object = ParsedObject::new(name.text.as_str(), self.file, type_span);
        object.start_line = open.line;
        self.parse_properties(&mut object);
        self.objects.push(object);
    }

    /// Skip to a `]` on the current line and consume it, if there is one
    fn recover_to_close_bracket(&mut self) {
        let mut idx = self.pos;
        while let Some(token) = self.tokens.get(idx) {
            match token.kind {
                TokenKind::RightBracket => {
                    self.pos = idx + 1;
                    return;
                }
                TokenKind::Newline | TokenKind::LeftBracket | TokenKind::EndOfFile => return,
                _ => idx += 1,
            }
        }
    }

    fn parse_properties(&mut self, object: &mut ParsedObject) {
        loop {
            match self.current_kind() {
                TokenKind::EndOfFile | TokenKind::LeftBracket => break,
                TokenKind::Newline | TokenKind::Comment | TokenKind::Semicolon => self.advance(),
                TokenKind::Identifier => {
                    self.parse_property(object);
                }
                _ => {
                    let token = self.current().clone();
                    self.error(
                        codes::UNEXPECTED_TOKEN,
                        format!("Unexpected {} '{}' in object body", token.kind, token.text),
                        token_span(&token),
                    );
                    self.skip_rest_of_property();
                }
            }
        }
    }

    /// Grammar: `IDENT '=' value [';']`
    fn parse_property(&mut self, object: &mut ParsedObject) {
        let key = self.current().clone();
        let name_span = LineSpan::new(key.line, key.column, key.end_column());
        object.end_line = object.end_line.max(key.line);
        self.advance();

        if !self.at(TokenKind::Equals) {
            self.error(
                codes::MISSING_EQUALS,
                format!("Expected '=' after property name '{}'", key.text),
                name_span.into(),
            );
            self.skip_rest_of_property();
            return;
        }
        let equals = self.current().clone();
        self.advance();

        let (value_tokens, end) = self.collect_value();
        let terminated = end == ValueEnd::Semicolon;
        let value = self.assemble_value(&value_tokens);

        let value_span = match (value_tokens.first(), value_tokens.last()) {
            (Some(first), Some(last)) => {
                TextSpan::new(first.line, first.column, last.line, last.end_column())
            }
            _ => TextSpan::point(equals.line, equals.end_column()),
        };
        object.end_line = object.end_line.max(value_span.end_line);

        if end == ValueEnd::Open
            && !value.is_empty()
            && !contains_placeholder(&value)
            && self.semicolon_required()
        {
            let message = ValidationMessage::error(
                codes::MISSING_SEMICOLON,
                format!("Missing ';' after value of '{}'", key.text),
                self.file,
                value_span.end_line,
            )
            .with_span(value_span)
            .with_correction(Correction::insert(
                self.file,
                value_span.end_line,
                value_span.end_column,
                ";",
            ));
            self.messages.push(message);
        }

        let stored = object.insert_property(
            &key.text,
            PropertyInfo {
                value,
                name_span,
                value_span,
                terminated,
            },
        );
        if stored != key.text {
            tracing::trace!(key = %key.text, stored = %stored, "duplicate property key");
        }
    }

    /// Collect value tokens up to `;`, a comment, `[`, end of input or the
    /// start of the next property. A closing `;` is consumed.
    fn collect_value(&mut self) -> (Vec<Token>, ValueEnd) {
        let mut value = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return (value, ValueEnd::Semicolon);
                }
                TokenKind::Comment | TokenKind::LeftBracket | TokenKind::EndOfFile => {
                    return (value, ValueEnd::Open);
                }
                TokenKind::Newline => {
                    let next = self.next_significant(self.pos);
                    if self.ends_value_at(next) {
                        return (value, ValueEnd::Open);
                    }
                    tracing::trace!(line = self.current().line, "continuation line");
                    self.pos = next;
                }
                TokenKind::Identifier if self.peek_kind(1) == TokenKind::Equals => {
                    return (value, ValueEnd::SameLineProperty);
                }
                _ => {
                    value.push(self.current().clone());
                    self.advance();
                }
            }
        }
    }

    /// Does the token at `idx` (first token after a line break) end a value?
    fn ends_value_at(&self, idx: usize) -> bool {
        match self.kind_at(idx) {
            TokenKind::EndOfFile | TokenKind::LeftBracket | TokenKind::Comment => true,
            TokenKind::Identifier => self.kind_at(idx + 1) == TokenKind::Equals,
            _ => false,
        }
    }

    /// A missing `;` matters only when something structural follows
    fn semicolon_required(&self) -> bool {
        let mut idx = self.pos;
        loop {
            match self.kind_at(idx) {
                TokenKind::Newline | TokenKind::Comment => idx += 1,
                TokenKind::EndOfFile | TokenKind::LeftBracket => return true,
                TokenKind::Identifier => return self.kind_at(idx + 1) == TokenKind::Equals,
                _ => return false,
            }
        }
    }

    /// Join value tokens with the original text between them.
    ///
    /// A line change contributes one `\n` per line crossed plus the next
    /// line's leading indentation, so positions past the first line are
    /// file columns.
    fn assemble_value(&self, tokens: &[Token]) -> String {
        let mut value = String::new();
        let mut previous: Option<&Token> = None;
        for token in tokens {
            if let Some(prev) = previous {
                if prev.line == token.line {
                    value.push_str(&self.source[prev.end_offset()..token.offset]);
                } else {
                    value.extend(std::iter::repeat_n('\n', token.line - prev.line));
                    let line_start = self.source[..token.offset]
                        .rfind('\n')
                        .map(|i| i + 1)
                        .unwrap_or(0);
                    value.push_str(&self.source[line_start..token.offset]);
                }
            }
            value.push_str(&token.text);
            previous = Some(token);
        }
        value
    }

    fn skip_rest_of_property(&mut self) {
        while !matches!(
            self.current_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::LeftBracket | TokenKind::EndOfFile
        ) {
            self.advance();
        }
        if self.at(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn error(&mut self, code: &str, message: impl Into<String>, span: TextSpan) {
        self.messages.push(
            ValidationMessage::error(code, message, self.file, span.start_line).with_span(span),
        );
    }

    // Helper methods

    fn at_end(&self) -> bool {
        self.at(TokenKind::EndOfFile)
    }

    fn current(&self) -> &Token {
        // tokenize always ends with EndOfFile and advance never passes it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind_at(&self, idx: usize) -> TokenKind {
        self.tokens
            .get(idx)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EndOfFile)
    }

    fn current_kind(&self) -> TokenKind {
        self.kind_at(self.pos)
    }

    fn peek_kind(&self, ahead: usize) -> TokenKind {
        self.kind_at(self.pos + ahead)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn next_significant(&self, mut idx: usize) -> usize {
        while self.kind_at(idx) == TokenKind::Newline {
            idx += 1;
        }
        idx
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }
}

/// How a property value ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueEnd {
    Semicolon,
    /// `key1=value1 key2=value2;` needs no separator
    SameLineProperty,
    /// Line break, comment, `[` or end of input
    Open,
}

fn token_span(token: &Token) -> TextSpan {
    TextSpan::new(token.line, token.column, token.line, token.end_column())
}

/// `<...>` text-replacement placeholders (dynamic-text tags)
fn contains_placeholder(value: &str) -> bool {
    value
        .find('<')
        .is_some_and(|open| value[open..].contains('>'))
}
