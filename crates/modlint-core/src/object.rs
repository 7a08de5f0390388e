//! Parsed object model
//!
//! A file parses into an owned `Vec<ParsedObject>`; sibling order is kept as
//! indices into that vector rather than references.

use indexmap::IndexMap;

use crate::position::{AbsolutePosition, LineSpan, TextSpan};

/// Suffix appended to a key each time it is seen again in one object
pub const DUPLICATE_SUFFIX: char = '+';

/// Prefix that marks a list property as "replace" rather than "append"
pub const REPLACE_MARKER: char = '!';

/// One `key=value` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    /// Raw value text; multi-line values keep their line structure
    pub value: String,
    /// Span of the key as written (always single line)
    pub name_span: LineSpan,
    /// Span of the value; a point right after `=` when the value is empty
    pub value_span: TextSpan,
    /// Whether a `;` terminated the value
    pub terminated: bool,
}

impl PropertyInfo {
    /// Where the first value character sits in the file
    pub fn value_origin(&self) -> AbsolutePosition {
        self.value_span.start()
    }
}

/// One `[TypeName] key=value; ...` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedObject {
    pub type_name: String,
    pub file: String,
    /// Properties in source order; repeated keys carry `+` suffixes
    pub properties: IndexMap<String, PropertyInfo>,
    pub start_line: usize,
    pub end_line: usize,
    pub type_span: LineSpan,
    /// Index of the previous object in the same file
    pub previous: Option<usize>,
    /// Index of the next object in the same file
    pub next: Option<usize>,
}

impl ParsedObject {
    pub fn new(type_name: impl Into<String>, file: impl Into<String>, type_span: LineSpan) -> Self {
        Self {
            type_name: type_name.into(),
            file: file.into(),
            properties: IndexMap::new(),
            start_line: type_span.line,
            end_line: type_span.line,
            type_span,
            previous: None,
            next: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyInfo> {
        self.properties.get(key)
    }

    /// Value of the first occurrence of `key`
    pub fn value(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|p| p.value.as_str())
    }

    /// The object's `ID` value, when present and non-empty
    pub fn id(&self) -> Option<&str> {
        self.value("ID").filter(|id| !id.is_empty())
    }

    /// Store a property, suffixing the key with `+` until it is unique.
    ///
    /// Returns the key the property was stored under.
    pub fn insert_property(&mut self, key: &str, property: PropertyInfo) -> String {
        let mut stored = key.to_string();
        while self.properties.contains_key(&stored) {
            stored.push(DUPLICATE_SUFFIX);
        }
        self.properties.insert(stored.clone(), property);
        stored
    }

    /// How many earlier properties share `stored`'s base key, so `range`,
    /// `!range` and `range+` count as one key written three times
    pub fn occurrence(&self, stored: &str) -> usize {
        let key = base_key(stored);
        self.properties
            .keys()
            .take_while(|k| k.as_str() != stored)
            .filter(|k| base_key(k) == key)
            .count()
    }

    /// Total properties sharing `key` as their base key
    pub fn occurrences_of(&self, key: &str) -> usize {
        self.properties.keys().filter(|k| base_key(k) == key).count()
    }
}

/// Strip duplicate suffixes and the replace marker from a stored key
pub fn base_key(stored: &str) -> &str {
    let key = stored.trim_end_matches(DUPLICATE_SUFFIX);
    key.strip_prefix(REPLACE_MARKER).unwrap_or(key)
}

/// Fill in the `previous`/`next` links from vector order
pub fn link_siblings(objects: &mut [ParsedObject]) {
    let len = objects.len();
    for (index, object) in objects.iter_mut().enumerate() {
        object.previous = index.checked_sub(1);
        object.next = (index + 1 < len).then_some(index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(value: &str) -> PropertyInfo {
        PropertyInfo {
            value: value.to_string(),
            name_span: LineSpan::new(1, 0, 1),
            value_span: TextSpan::new(1, 2, 1, 2 + value.len()),
            terminated: true,
        }
    }

    #[test]
    fn test_duplicate_keys_get_suffixes() {
        let mut object = ParsedObject::new("Item", "a.txt", LineSpan::new(1, 1, 5));
        assert_eq!(object.insert_property("tag", property("a")), "tag");
        assert_eq!(object.insert_property("tag", property("b")), "tag+");
        assert_eq!(object.insert_property("tag", property("c")), "tag++");
        assert_eq!(object.value("tag++"), Some("c"));
        assert_eq!(object.properties.len(), 3);
    }

    #[test]
    fn test_base_key() {
        assert_eq!(base_key("tag++"), "tag");
        assert_eq!(base_key("!items+"), "items");
        assert_eq!(base_key("ID"), "ID");
    }

    #[test]
    fn test_occurrence_ignores_replace_marker() {
        let mut object = ParsedObject::new("A", "f", LineSpan::new(1, 1, 2));
        object.insert_property("range", property("1"));
        object.insert_property("!range", property("2"));
        object.insert_property("range", property("3"));
        assert_eq!(object.occurrence("range"), 0);
        assert_eq!(object.occurrence("!range"), 1);
        assert_eq!(object.occurrence("range+"), 2);
        assert_eq!(object.occurrences_of("range"), 3);
    }

    #[test]
    fn test_link_siblings() {
        let span = LineSpan::new(1, 1, 2);
        let mut objects = vec![
            ParsedObject::new("A", "f", span),
            ParsedObject::new("B", "f", span),
            ParsedObject::new("C", "f", span),
        ];
        link_siblings(&mut objects);
        assert_eq!(objects[0].previous, None);
        assert_eq!(objects[0].next, Some(1));
        assert_eq!(objects[1].previous, Some(0));
        assert_eq!(objects[2].next, None);
    }

    #[test]
    fn test_empty_id_is_absent() {
        let mut object = ParsedObject::new("Item", "a.txt", LineSpan::new(1, 1, 5));
        object.insert_property("ID", property(""));
        assert_eq!(object.id(), None);
    }
}
