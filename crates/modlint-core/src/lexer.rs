//! Tokenizer for `[Type] key=value;` mod files
//!
//! The lexer has two modes. In [`LexMode::Normal`] whitespace separates
//! tokens and `--` starts a line comment. After an `=` it switches to
//! [`LexMode::InValue`], where everything up to `;`, a newline or `[` is one
//! [`TokenKind::StringValue`], except that a whitespace run followed by
//! `identifier =` ends the value early (`a=1 b=2;` is two properties).
//!
//! The mode is threaded explicitly: [`next_token`] is a pure function of
//! `(source, cursor, mode)`. Tokenizing never fails; unexpected characters
//! degrade to `StringValue` tokens.

use std::fmt;

/// Token kinds produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LeftBracket,
    RightBracket,
    Equals,
    Semicolon,
    Identifier,
    StringValue,
    Comment,
    Newline,
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Equals => "'='",
            TokenKind::Semicolon => "';'",
            TokenKind::Identifier => "identifier",
            TokenKind::StringValue => "value",
            TokenKind::Comment => "comment",
            TokenKind::Newline => "newline",
            TokenKind::EndOfFile => "end of file",
        };
        f.write_str(text)
    }
}

/// A token with its raw text and position (line 1-based, column 0-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset of the first character in the source
    pub offset: usize,
}

impl Token {
    fn new(kind: TokenKind, text: &str, start: Cursor) -> Self {
        Self {
            kind,
            text: text.to_string(),
            line: start.line,
            column: start.column,
            offset: start.offset,
        }
    }

    /// Column just past the token (exclusive)
    pub fn end_column(&self) -> usize {
        self.column + self.text.chars().count()
    }

    /// Byte offset just past the token
    pub fn end_offset(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Lexer state between tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexMode {
    #[default]
    Normal,
    InValue,
}

/// Read position in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 0,
        }
    }
}

impl Cursor {
    fn peek(&self, source: &str) -> Option<char> {
        source[self.offset..].chars().next()
    }

    fn peek_nth(&self, source: &str, n: usize) -> Option<char> {
        source[self.offset..].chars().nth(n)
    }

    fn at_str(&self, source: &str, s: &str) -> bool {
        source[self.offset..].starts_with(s)
    }

    /// Advance over one character; newlines move to the next line
    fn bump(&mut self, source: &str) -> Option<char> {
        let ch = self.peek(source)?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_horizontal_whitespace(&mut self, source: &str) {
        while let Some(ch) = self.peek(source) {
            if is_horizontal_whitespace(ch) || (ch == '\r' && self.peek_nth(source, 1) != Some('\n'))
            {
                self.bump(source);
            } else {
                break;
            }
        }
    }
}

fn is_horizontal_whitespace(ch: char) -> bool {
    ch.is_whitespace() && ch != '\n' && ch != '\r'
}

/// First character of a property key or type name (`!` marks replace-keys)
pub fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '!'
}

pub fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '.'
}

/// Characters that end a bare word in normal mode
fn is_normal_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '[' | ']' | '=' | ';')
}

/// Does `text` start with `identifier [ws] =`?
///
/// Shared by the lexer (same-line property starts) and the parser
/// (continuation-line detection).
pub fn starts_with_property_assignment(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    match chars.next() {
        Some(ch) if is_identifier_start(ch) => {}
        _ => return false,
    }
    while chars.peek().is_some_and(|&ch| is_identifier_char(ch)) {
        chars.next();
    }
    while chars.peek().is_some_and(|&ch| is_horizontal_whitespace(ch)) {
        chars.next();
    }
    chars.next() == Some('=')
}

/// Scan one token starting at `cursor` in `mode`.
///
/// Returns the token, the cursor after it and the mode for the next call.
pub fn next_token(source: &str, cursor: Cursor, mode: LexMode) -> (Token, Cursor, LexMode) {
    let origin = cursor;
    let mut cursor = cursor;
    cursor.skip_horizontal_whitespace(source);
    let start = cursor;

    let Some(ch) = cursor.peek(source) else {
        return (Token::new(TokenKind::EndOfFile, "", start), cursor, mode);
    };

    // Terminators behave identically in both modes
    match ch {
        '\n' => {
            cursor.bump(source);
            return (Token::new(TokenKind::Newline, "\n", start), cursor, LexMode::Normal);
        }
        '\r' => {
            // skip_horizontal_whitespace only stops at '\r' when '\n' follows
            cursor.offset += 1;
            cursor.bump(source);
            return (
                Token::new(TokenKind::Newline, "\r\n", start),
                cursor,
                LexMode::Normal,
            );
        }
        ';' => {
            cursor.bump(source);
            return (Token::new(TokenKind::Semicolon, ";", start), cursor, LexMode::Normal);
        }
        '[' => {
            cursor.bump(source);
            return (
                Token::new(TokenKind::LeftBracket, "[", start),
                cursor,
                LexMode::Normal,
            );
        }
        _ => {}
    }

    match mode {
        // `key= other=1`: the value is empty and a new property starts
        LexMode::InValue
            if start.offset > origin.offset
                && starts_with_property_assignment(&source[start.offset..]) =>
        {
            scan_normal(source, cursor, start, ch)
        }
        LexMode::InValue => {
            let end = scan_value(source, cursor);
            let text = &source[start.offset..end.offset];
            tracing::trace!(line = start.line, value = text, "lexed value");
            (Token::new(TokenKind::StringValue, text, start), end, LexMode::Normal)
        }
        LexMode::Normal => scan_normal(source, cursor, start, ch),
    }
}

fn scan_normal(source: &str, mut cursor: Cursor, start: Cursor, ch: char) -> (Token, Cursor, LexMode) {
    match ch {
        ']' => {
            cursor.bump(source);
            (Token::new(TokenKind::RightBracket, "]", start), cursor, LexMode::Normal)
        }
        '=' => {
            cursor.bump(source);
            (Token::new(TokenKind::Equals, "=", start), cursor, LexMode::InValue)
        }
        '-' if cursor.at_str(source, "--") => {
            while let Some(next) = cursor.peek(source) {
                if next == '\n' || (next == '\r' && cursor.peek_nth(source, 1) == Some('\n')) {
                    break;
                }
                cursor.bump(source);
            }
            let text = &source[start.offset..cursor.offset];
            (Token::new(TokenKind::Comment, text, start), cursor, LexMode::Normal)
        }
        c if is_identifier_start(c) => {
            cursor.bump(source);
            while cursor.peek(source).is_some_and(is_identifier_char) {
                cursor.bump(source);
            }
            let text = &source[start.offset..cursor.offset];
            (Token::new(TokenKind::Identifier, text, start), cursor, LexMode::Normal)
        }
        _ => {
            // Anything else is a bare word that runs to the next delimiter
            while let Some(next) = cursor.peek(source) {
                if is_normal_delimiter(next) || cursor.at_str(source, "--") {
                    break;
                }
                cursor.bump(source);
            }
            if cursor.offset == start.offset {
                cursor.bump(source);
            }
            let text = &source[start.offset..cursor.offset];
            (Token::new(TokenKind::StringValue, text, start), cursor, LexMode::Normal)
        }
    }
}

/// End of a value starting at `cursor` (trailing whitespace excluded)
fn scan_value(source: &str, mut cursor: Cursor) -> Cursor {
    let mut last_non_space = cursor;
    while let Some(ch) = cursor.peek(source) {
        match ch {
            '\n' | ';' | '[' => break,
            '\r' if cursor.peek_nth(source, 1) == Some('\n') => break,
            c if is_horizontal_whitespace(c) || c == '\r' => {
                let mut probe = cursor;
                probe.skip_horizontal_whitespace(source);
                if starts_with_property_assignment(&source[probe.offset..]) {
                    break;
                }
                cursor = probe;
            }
            _ => {
                cursor.bump(source);
                last_non_space = cursor;
            }
        }
    }
    last_non_space
}

/// Tokenize a whole source buffer; the result always ends with `EndOfFile`.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut cursor = Cursor::default();
    let mut mode = LexMode::Normal;

    loop {
        let (token, next_cursor, next_mode) = next_token(source, cursor, mode);
        let done = token.is(TokenKind::EndOfFile);
        tokens.push(token);
        if done {
            break;
        }
        cursor = next_cursor;
        mode = next_mode;
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize(source).into_iter().map(|t| t.text).collect()
    }

    /// Rebuild the source from tokens, filling gaps with spaces
    fn reconstruct(tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut line = 1;
        let mut column = 0;
        for token in tokens {
            if token.line == line && token.column > column {
                out.push_str(&" ".repeat(token.column - column));
            }
            out.push_str(&token.text);
            if token.is(TokenKind::Newline) {
                line += 1;
                column = 0;
            } else {
                column = token.end_column();
            }
        }
        out
    }

    #[test]
    fn test_simple_object() {
        assert_eq!(
            kinds("[Action] ID=test;"),
            vec![
                TokenKind::LeftBracket,
                TokenKind::Identifier,
                TokenKind::RightBracket,
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::StringValue,
                TokenKind::Semicolon,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_value_keeps_inner_whitespace() {
        let tokens = tokenize("name = Test Item;");
        let value = tokens.iter().find(|t| t.is(TokenKind::StringValue)).unwrap();
        assert_eq!(value.text, "Test Item");
        assert_eq!(value.column, 7);
        assert_eq!(value.end_column(), 16);
    }

    #[test]
    fn test_same_line_property_ends_value() {
        assert_eq!(
            texts("a=value one b=2;"),
            vec!["a", "=", "value one", "b", "=", "2", ";", ""]
        );
    }

    #[test]
    fn test_same_line_property_with_spaced_equals() {
        assert_eq!(texts("a=1 b = 2;"), vec!["a", "=", "1", "b", "=", "2", ";", ""]);
    }

    #[test]
    fn test_property_right_after_equals() {
        assert_eq!(texts("a= b=2;"), vec!["a", "=", "b", "=", "2", ";", ""]);
        assert_eq!(texts("a=b=2;"), vec!["a", "=", "b=2", ";", ""]);
    }

    #[test]
    fn test_dash_is_value_text_in_value_mode() {
        assert_eq!(texts("a=-2;"), vec!["a", "=", "-2", ";", ""]);
        assert_eq!(texts("a=a--b;"), vec!["a", "=", "a--b", ";", ""]);
    }

    #[test]
    fn test_comment_outside_value() {
        let tokens = tokenize("-- header\n[A]");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text, "-- header");
        assert_eq!(tokens[1].kind, TokenKind::Newline);
    }

    #[test]
    fn test_crlf_is_one_newline() {
        let tokens = tokenize("[A]\r\nk=v;\r\n");
        let newlines: Vec<_> = tokens.iter().filter(|t| t.is(TokenKind::Newline)).collect();
        assert_eq!(newlines.len(), 2);
        assert_eq!(newlines[0].text, "\r\n");
        let key = tokens.iter().find(|t| t.text == "k").unwrap();
        assert_eq!((key.line, key.column), (2, 0));
        let value = tokens.iter().find(|t| t.text == "v").unwrap();
        assert_eq!(value.kind, TokenKind::StringValue);
    }

    #[test]
    fn test_value_mode_ends_at_newline() {
        let tokens = tokenize("a=first line\nsecond line");
        assert_eq!(tokens[2].text, "first line");
        assert_eq!(tokens[3].kind, TokenKind::Newline);
        assert_eq!(tokens[4].kind, TokenKind::Identifier);
        assert_eq!(tokens[4].line, 2);
    }

    #[test]
    fn test_value_with_tags_and_formula() {
        assert_eq!(
            texts("desc=Deal <color=red=> damage;"),
            vec!["desc", "=", "Deal <color=red=> damage", ";", ""]
        );
        assert_eq!(
            texts("f=between:10:c:STR * 2;"),
            vec!["f", "=", "between:10:c:STR * 2", ";", ""]
        );
    }

    #[test]
    fn test_unexpected_characters_degrade_to_values() {
        let tokens = tokenize("@@@ [A]");
        assert_eq!(tokens[0].kind, TokenKind::StringValue);
        assert_eq!(tokens[0].text, "@@@");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::EndOfFile]);
    }

    #[test]
    fn test_reconstruction_round_trip() {
        let sources = [
            "[Action] ID=test;",
            "[ItemType]\nname = Test Item\ndamage = 10;",
            "-- comment\n[A]  key=a b c  ;\n\n[B]\n  x=1 y=2;",
            "[A]\r\nk=v;\r\n",
            "[Broken k=v; ]] @@ x",
        ];
        for source in sources {
            assert_eq!(reconstruct(&tokenize(source)), source, "source: {source:?}");
        }
    }

    #[test]
    fn test_property_assignment_probe() {
        assert!(starts_with_property_assignment("key=1"));
        assert!(starts_with_property_assignment("!list = a"));
        assert!(starts_with_property_assignment("a.b_c\t=x"));
        assert!(!starts_with_property_assignment("<color=red>"));
        assert!(!starts_with_property_assignment("two words=1"));
        assert!(!starts_with_property_assignment("9lives=1"));
    }
}
