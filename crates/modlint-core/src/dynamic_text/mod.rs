//! Dynamic text: `<tag=arg=arg>` markup inside string values

pub mod parser;
pub mod validator;

use std::ops::Range;

pub use parser::parse_segments;
pub use validator::{DynamicTextValidator, validate_dynamic_text};

/// One piece of a dynamic-text value. Concatenating [`Segment::source`] of
/// every segment gives back the original value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text { text: String, range: Range<usize> },
    Tag(Tag),
}

impl Segment {
    /// The exact source text this segment covers
    pub fn source(&self) -> &str {
        match self {
            Segment::Text { text, .. } => text,
            Segment::Tag(tag) => &tag.source,
        }
    }

    pub fn range(&self) -> Range<usize> {
        match self {
            Segment::Text { range, .. } => range.clone(),
            Segment::Tag(tag) => tag.range.clone(),
        }
    }
}

/// `<name=arg1=arg2>`; all ranges are character offsets into the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Name with surrounding whitespace trimmed
    pub name: String,
    pub name_range: Range<usize>,
    pub args: Vec<TagArgument>,
    /// From `<` through `>`
    pub range: Range<usize>,
    pub source: String,
}

/// One `=`-separated argument, untrimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagArgument {
    pub text: String,
    pub range: Range<usize>,
}

impl TagArgument {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
