//! Coordinate math between nested-parser offsets and file positions
//!
//! Two coordinate systems meet here:
//! - *relative* positions: line/column offsets inside a property value that
//!   was handed to a nested parser (formula, dynamic text)
//! - *absolute* positions: 1-indexed line, 0-indexed column in the file
//!
//! Columns are counted in characters, never bytes.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Position relative to the start of a sub-parse (both components 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelativePosition {
    pub line: usize,
    pub column: usize,
}

impl RelativePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Position in the original file (line 1-based, column 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbsolutePosition {
    pub line: usize,
    pub column: usize,
}

impl AbsolutePosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Map a relative position onto the file, given where the sub-parse began.
///
/// The base column only applies to relative line 0; on later lines the
/// relative column already is the file column.
pub fn to_absolute_position(
    relative: RelativePosition,
    base_line: usize,
    base_column: usize,
) -> AbsolutePosition {
    let column = if relative.line == 0 {
        base_column + relative.column
    } else {
        relative.column
    };
    AbsolutePosition {
        line: base_line + relative.line,
        column,
    }
}

/// Relative line/column of a character offset within `text`.
///
/// Offsets past the end clamp to the end of the text.
pub fn relative_position_at(text: &str, char_offset: usize) -> RelativePosition {
    let mut line = 0;
    let mut column = 0;
    for ch in text.chars().take(char_offset) {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    RelativePosition { line, column }
}

/// A single-line span, used for property names and object type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl LineSpan {
    pub fn new(line: usize, start_column: usize, end_column: usize) -> Self {
        Self {
            line,
            start_column,
            end_column,
        }
    }
}

/// A possibly multi-line span (end column exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl TextSpan {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Zero-width span at a single point
    pub fn point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn start(&self) -> AbsolutePosition {
        AbsolutePosition::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> AbsolutePosition {
        AbsolutePosition::new(self.end_line, self.end_column)
    }

    pub fn is_multiline(&self) -> bool {
        self.end_line > self.start_line
    }
}

impl From<LineSpan> for TextSpan {
    fn from(span: LineSpan) -> Self {
        TextSpan::new(span.line, span.start_column, span.line, span.end_column)
    }
}

/// Map a character range inside a value onto the file.
///
/// `text` is the value as handed to the nested parser and `origin` is where
/// its first character sits in the file.
pub fn map_value_range(text: &str, range: Range<usize>, origin: AbsolutePosition) -> TextSpan {
    let start = to_absolute_position(
        relative_position_at(text, range.start),
        origin.line,
        origin.column,
    );
    let end = to_absolute_position(
        relative_position_at(text, range.end.max(range.start)),
        origin.line,
        origin.column,
    );
    TextSpan::new(start.line, start.column, end.line, end.column)
}

/// Byte offset of a line/column pair in `source`.
///
/// Returns `None` when the line does not exist or the column runs past the
/// end of the line. A column equal to the line length addresses the line end.
pub fn byte_offset_of(source: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let mut line_start = 0;
    for _ in 1..line {
        let newline = source[line_start..].find('\n')?;
        line_start += newline + 1;
    }
    let line_text = source[line_start..]
        .split('\n')
        .next()
        .unwrap_or("")
        .trim_end_matches('\r');

    let mut chars = line_text.char_indices();
    let mut offset = line_text.len();
    for _ in 0..column {
        chars.next()?;
    }
    if let Some((idx, _)) = chars.next() {
        offset = idx;
    }
    Some(line_start + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_value_adds_base_column() {
        let pos = to_absolute_position(RelativePosition::new(0, 4), 7, 10);
        assert_eq!(pos, AbsolutePosition::new(7, 14));
    }

    #[test]
    fn test_multi_line_value_ignores_base_column() {
        let pos = to_absolute_position(RelativePosition::new(2, 3), 7, 10);
        assert_eq!(pos, AbsolutePosition::new(9, 3));
    }

    #[test]
    fn test_relative_position_counts_chars() {
        let text = "ab\ncdé\nf";
        assert_eq!(relative_position_at(text, 0), RelativePosition::new(0, 0));
        assert_eq!(relative_position_at(text, 2), RelativePosition::new(0, 2));
        assert_eq!(relative_position_at(text, 3), RelativePosition::new(1, 0));
        assert_eq!(relative_position_at(text, 6), RelativePosition::new(1, 3));
        assert_eq!(relative_position_at(text, 7), RelativePosition::new(2, 0));
        assert_eq!(relative_position_at(text, 100), RelativePosition::new(2, 1));
    }

    #[test]
    fn test_map_value_range_single_line() {
        let span = map_value_range("abs:1+foo:2", 6..9, AbsolutePosition::new(3, 8));
        assert_eq!(span, TextSpan::new(3, 14, 3, 17));
    }

    #[test]
    fn test_map_value_range_second_line() {
        let text = "abs:1+\n    foo:2";
        let span = map_value_range(text, 11..14, AbsolutePosition::new(3, 8));
        assert_eq!(span, TextSpan::new(4, 4, 4, 7));
    }

    #[test]
    fn test_byte_offset_of() {
        let source = "[A]\nkey=välue;\n";
        assert_eq!(byte_offset_of(source, 1, 0), Some(0));
        assert_eq!(byte_offset_of(source, 2, 4), Some(8));
        // 'ä' is two bytes, so the column after it is shifted by one byte
        assert_eq!(byte_offset_of(source, 2, 6), Some(11));
        assert_eq!(byte_offset_of(source, 2, 10), Some(15));
        assert_eq!(byte_offset_of(source, 2, 11), None);
        assert_eq!(byte_offset_of(source, 9, 0), None);
    }

    #[test]
    fn test_byte_offset_of_crlf_line_end() {
        let source = "a=1\r\nb=2\r\n";
        assert_eq!(byte_offset_of(source, 1, 3), Some(3));
        assert_eq!(byte_offset_of(source, 2, 3), Some(8));
    }
}
