//! Schema-driven property value validation
//!
//! Values are checked against the declared [`FieldType`] of their field.
//! An empty value is always accepted: the game treats it as "use the
//! default". Formula and dynamic-text fields are handed to their own
//! parsers, and every issue is mapped from value offsets back to the file.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::{Correction, ValidationMessage, ValueIssue, codes};
use crate::dynamic_text::DynamicTextValidator;
use crate::formula::{FormulaValidator, parse_formula};
use crate::position::{AbsolutePosition, map_value_range};
use crate::schema::{FieldDef, FieldType, SchemaContext};
use crate::similarity::{DEFAULT_MAX_DISTANCE, find_similar, format_suggestions};

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+$").unwrap());

static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap());

const XY: &[&str] = &["X", "Y"];
const XYZ: &[&str] = &["X", "Y", "Z"];
const RECT: &[&str] = &["X", "Y", "width", "height"];

/// One comma-separated component, trimmed, with its character range
#[derive(Debug, Clone)]
struct Component {
    text: String,
    range: Range<usize>,
}

/// Validates property values; cheap to build per run
pub struct PropertyValidator<'a> {
    schema: &'a SchemaContext,
    max_distance: usize,
    style_hints: bool,
    documentation_url: Option<&'a str>,
}

impl<'a> PropertyValidator<'a> {
    pub fn new(schema: &'a SchemaContext) -> Self {
        Self {
            schema,
            max_distance: DEFAULT_MAX_DISTANCE,
            style_hints: true,
            documentation_url: None,
        }
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_style_hints(mut self, enabled: bool) -> Self {
        self.style_hints = enabled;
        self
    }

    /// Base URL for operator docs, overriding the formula metadata's own
    pub fn with_documentation_url(mut self, url: Option<&'a str>) -> Self {
        self.documentation_url = url;
        self
    }

    /// Validate one property value and map its issues onto the file.
    ///
    /// `origin` is the file position of the value's first character.
    pub fn validate_property(
        &self,
        key: &str,
        value: &str,
        field: &FieldDef,
        origin: AbsolutePosition,
        class_name: &str,
        file: &str,
    ) -> Vec<ValidationMessage> {
        self.check_value(key, value, field)
            .into_iter()
            .map(|issue| self.to_message(issue, value, origin, file, format!("{class_name}.{key}")))
            .collect()
    }

    /// Issues in `value`, as character ranges into it
    pub fn check_value(&self, key: &str, value: &str, field: &FieldDef) -> Vec<ValueIssue> {
        if value.trim().is_empty() || field.is_virtual {
            return Vec::new();
        }

        match &field.field_type {
            FieldType::Formula => self.check_formula(value, field.allows_x),
            FieldType::DynamicText => DynamicTextValidator::new(self.schema)
                .with_max_distance(self.max_distance)
                .with_style_hints(self.style_hints)
                .validate(value),
            FieldType::List(inner) => self.check_list(key, value, inner),
            FieldType::String | FieldType::Unknown(_) => Vec::new(),
            other => {
                let components = split_components(value);
                match component_names(other) {
                    Some(names) => self.check_composite(key, &components, other, names, full_range(value)),
                    None => self.check_scalar(key, &trimmed(value), other).into_iter().collect(),
                }
            }
        }
    }

    /// Turn a value issue into a file diagnostic
    pub fn to_message(
        &self,
        issue: ValueIssue,
        value: &str,
        origin: AbsolutePosition,
        file: &str,
        context: String,
    ) -> ValidationMessage {
        let span = map_value_range(value, issue.range.clone(), origin);
        let mut message = ValidationMessage::new(issue.severity, issue.code, issue.message, file, span.start_line)
            .with_span(span)
            .with_context(context);
        if let Some(suggestion) = issue.suggestion {
            message = message.with_suggestion(suggestion);
        }
        if let Some(replacement) = issue.replacement {
            message = message.with_correction(Correction::replace(file, span, replacement));
        }
        if let Some(operator) = issue.operator {
            let url = self
                .schema
                .formulas
                .operator_url(self.documentation_url, &operator);
            message = message.with_formula_reference(operator, url);
        }
        message
    }

    fn check_formula(&self, value: &str, allow_x: bool) -> Vec<ValueIssue> {
        match parse_formula(value) {
            Ok(ast) => FormulaValidator::new(&self.schema.formulas)
                .with_max_distance(self.max_distance)
                .validate(&ast, allow_x),
            Err(err) => {
                let len = value.chars().count();
                let at = err.offset().min(len);
                vec![ValueIssue::error(
                    codes::FORMULA_SYNTAX,
                    format!("Formula syntax error: {err}"),
                    at..(at + 1).min(len),
                )]
            }
        }
    }

    fn check_list(&self, key: &str, value: &str, inner: &FieldType) -> Vec<ValueIssue> {
        let components = split_components(value);

        if let Some(names) = component_names(inner) {
            let width = names.len();
            if components.len() % width != 0 {
                return vec![ValueIssue::error(
                    composite_code(inner),
                    format!(
                        "'{key}' expects groups of {width} components ({}) but got {} values",
                        names.join(","),
                        components.len()
                    ),
                    full_range(value),
                )];
            }
            return components
                .chunks(width)
                .flat_map(|group| {
                    let range = group[0].range.start..group[width - 1].range.end;
                    self.check_composite(key, group, inner, names, range)
                })
                .collect();
        }

        components
            .iter()
            .filter(|c| !c.text.is_empty())
            .filter_map(|c| self.check_scalar(key, c, inner))
            .collect()
    }

    fn check_composite(
        &self,
        key: &str,
        components: &[Component],
        field_type: &FieldType,
        names: &[&str],
        whole: Range<usize>,
    ) -> Vec<ValueIssue> {
        if components.len() != names.len() {
            return vec![ValueIssue::error(
                composite_code(field_type),
                format!(
                    "'{key}' expects {} comma-separated components ({}) but got {}",
                    names.len(),
                    names.join(","),
                    components.len()
                ),
                whole,
            )];
        }

        let integral = *field_type == FieldType::Rectangle;
        components
            .iter()
            .zip(names)
            .filter(|(c, _)| !is_valid_number(&c.text, integral))
            .map(|(c, name)| {
                let expected = if integral { "an integer" } else { "a number" };
                ValueIssue::error(
                    composite_code(field_type),
                    format!(
                        "{name} component of '{key}' must be {expected}, got '{}'",
                        c.text
                    ),
                    c.range.clone(),
                )
            })
            .collect()
    }

    fn check_scalar(&self, key: &str, value: &Component, field_type: &FieldType) -> Option<ValueIssue> {
        let text = value.text.as_str();
        let range = value.range.clone();
        match field_type {
            FieldType::Boolean => (!text.eq_ignore_ascii_case("true") && !text.eq_ignore_ascii_case("false"))
                .then(|| {
                    ValueIssue::error(
                        codes::INVALID_BOOLEAN,
                        format!("'{key}' expects true or false, got '{text}'"),
                        range,
                    )
                }),
            FieldType::Integer => (!INTEGER.is_match(text)).then(|| {
                ValueIssue::error(
                    codes::INVALID_INTEGER,
                    format!("'{key}' expects an integer, got '{text}'"),
                    range,
                )
            }),
            FieldType::Float => (!FLOAT.is_match(text)).then(|| {
                ValueIssue::error(
                    codes::INVALID_FLOAT,
                    format!("'{key}' expects a number, got '{text}'"),
                    range,
                )
            }),
            FieldType::Byte => (!INTEGER.is_match(text) || text.parse::<u8>().is_err()).then(|| {
                ValueIssue::error(
                    codes::INVALID_BYTE,
                    format!("'{key}' expects a whole number from 0 to 255, got '{text}'"),
                    range,
                )
            }),
            FieldType::Enum(name) => {
                let members = self.schema.objects.enum_members(name).unwrap_or_default();
                if members.iter().any(|m| m == text) {
                    return None;
                }
                let matches = find_similar(text, members, self.max_distance);
                let mut issue = ValueIssue::error(
                    codes::INVALID_ENUM,
                    format!("'{text}' is not a member of {name}"),
                    range,
                );
                if let Some(list) = format_suggestions(&matches) {
                    issue = issue.with_suggestion(format!("Did you mean {list}?"));
                }
                if let Some(best) = matches.first() {
                    issue = issue.with_replacement(best.candidate.clone());
                }
                Some(issue)
            }
            _ => None,
        }
    }
}

fn component_names(field_type: &FieldType) -> Option<&'static [&'static str]> {
    match field_type {
        FieldType::Vector2 | FieldType::TileCoord => Some(XY),
        FieldType::Vector3 => Some(XYZ),
        FieldType::Rectangle => Some(RECT),
        _ => None,
    }
}

fn composite_code(field_type: &FieldType) -> &'static str {
    match field_type {
        FieldType::Rectangle => codes::INVALID_RECTANGLE,
        _ => codes::INVALID_VECTOR,
    }
}

fn is_valid_number(text: &str, integral: bool) -> bool {
    if integral {
        INTEGER.is_match(text)
    } else {
        FLOAT.is_match(text)
    }
}

/// Character range of `value` without surrounding whitespace
fn full_range(value: &str) -> Range<usize> {
    trimmed(value).range
}

fn trimmed(value: &str) -> Component {
    let chars: Vec<char> = value.chars().collect();
    component(&chars, 0, chars.len())
}

/// Split on commas, trimming each piece and keeping its position
fn split_components(value: &str) -> Vec<Component> {
    let chars: Vec<char> = value.chars().collect();
    let mut components = Vec::new();
    let mut start = 0;
    for (i, &c) in chars.iter().enumerate() {
        if c == ',' {
            components.push(component(&chars, start, i));
            start = i + 1;
        }
    }
    components.push(component(&chars, start, chars.len()));
    components
}

fn component(chars: &[char], start: usize, end: usize) -> Component {
    let piece = &chars[start..end];
    let leading = piece.iter().take_while(|c| c.is_whitespace()).count();
    let trailing = piece[leading..].iter().rev().take_while(|c| c.is_whitespace()).count();
    let range = (start + leading)..(end - trailing);
    Component {
        text: chars[range.clone()].iter().collect(),
        range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    const OBJECTS: &str = r#"{
        "objectTypes": {},
        "classes": {},
        "enums": { "DamageType": ["Fire", "Ice", "Poison"] }
    }"#;
    const FORMULAS: &str = r#"{
        "documentationUrl": "https://docs.example/formulas",
        "operators": [
            { "name": "abs", "usages": [[ {"name":"value","type":"number"} ]] } ] }"#;
    const DYNAMIC_TEXT: &str = r#"{ "tags": [ { "name": "color", "requiredArgs": ["color"] } ] }"#;

    fn schema() -> SchemaContext {
        SchemaContext::from_json_strs(OBJECTS, FORMULAS, DYNAMIC_TEXT).unwrap()
    }

    fn field(field_type: FieldType) -> FieldDef {
        FieldDef {
            name: "field".into(),
            field_type,
            is_virtual: false,
            pattern: None,
            allows_x: false,
        }
    }

    fn check(value: &str, field_type: FieldType) -> Vec<ValueIssue> {
        let schema = schema();
        PropertyValidator::new(&schema).check_value("key", value, &field(field_type))
    }

    fn codes_of(value: &str, field_type: FieldType) -> Vec<&'static str> {
        check(value, field_type).into_iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_empty_value_always_valid() {
        for field_type in [
            FieldType::Boolean,
            FieldType::Integer,
            FieldType::Vector3,
            FieldType::Formula,
            FieldType::Enum("DamageType".into()),
        ] {
            assert!(check("", field_type.clone()).is_empty(), "{field_type}");
        }
    }

    #[test]
    fn test_boolean() {
        assert!(check("TRUE", FieldType::Boolean).is_empty());
        assert!(check("false", FieldType::Boolean).is_empty());
        for bad in ["1", "0", "yes"] {
            assert_eq!(codes_of(bad, FieldType::Boolean), vec![codes::INVALID_BOOLEAN], "{bad}");
        }
    }

    #[test]
    fn test_numbers() {
        assert!(check("-42", FieldType::Integer).is_empty());
        assert_eq!(codes_of("4.2", FieldType::Integer), vec![codes::INVALID_INTEGER]);
        assert_eq!(codes_of("+4", FieldType::Integer), vec![codes::INVALID_INTEGER]);

        for good in ["1", "-1.5", "+.5", "5.", "1e3", "2.5E-2"] {
            assert!(check(good, FieldType::Float).is_empty(), "{good}");
        }
        for bad in [".", "1.2.3", "e5", "abc"] {
            assert_eq!(codes_of(bad, FieldType::Float), vec![codes::INVALID_FLOAT], "{bad}");
        }
    }

    #[test]
    fn test_byte_range() {
        assert!(check("0", FieldType::Byte).is_empty());
        assert!(check("255", FieldType::Byte).is_empty());
        assert_eq!(codes_of("256", FieldType::Byte), vec![codes::INVALID_BYTE]);
        assert_eq!(codes_of("-1", FieldType::Byte), vec![codes::INVALID_BYTE]);
    }

    #[test]
    fn test_vectors_report_component() {
        assert!(check("1.5, -2", FieldType::Vector2).is_empty());
        let issues = check("1, y", FieldType::TileCoord);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.starts_with("Y component"));
        assert_eq!(issues[0].range, 3..4);

        assert_eq!(codes_of("1,2", FieldType::Vector3), vec![codes::INVALID_VECTOR]);
        assert!(check("1,2,3", FieldType::Vector3).is_empty());
    }

    #[test]
    fn test_rectangle_needs_integers() {
        assert!(check("0,0,32,32", FieldType::Rectangle).is_empty());
        let issues = check("0,0,3.5,32", FieldType::Rectangle);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::INVALID_RECTANGLE);
        assert!(issues[0].message.contains("width"));
    }

    #[test]
    fn test_lists() {
        let list = |inner| FieldType::List(Box::new(inner));
        assert!(check("1, 2,3", list(FieldType::Integer)).is_empty());
        assert!(check("1,,3", list(FieldType::Integer)).is_empty());
        let issues = check("1,x,3", list(FieldType::Integer));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].range, 2..3);

        assert!(check("1,2,3,4", list(FieldType::Vector2)).is_empty());
        assert_eq!(codes_of("1,2,3", list(FieldType::Vector2)), vec![codes::INVALID_VECTOR]);
        assert!(check("anything, at all", list(FieldType::String)).is_empty());
    }

    #[test]
    fn test_enum_membership() {
        let enum_type = FieldType::Enum("DamageType".into());
        assert!(check("Fire", enum_type.clone()).is_empty());
        let issues = check("Fir", enum_type.clone());
        assert_eq!(issues[0].code, codes::INVALID_ENUM);
        assert_eq!(issues[0].replacement.as_deref(), Some("Fire"));
        assert_eq!(codes_of("fire", enum_type), vec![codes::INVALID_ENUM]);
    }

    #[test]
    fn test_open_types_accept_anything() {
        assert!(check("whatever ; goes", FieldType::String).is_empty());
        assert!(check("1,2,3", FieldType::Unknown("Mystery".into())).is_empty());
    }

    #[test]
    fn test_virtual_field_not_checked() {
        let schema = schema();
        let mut def = field(FieldType::Integer);
        def.is_virtual = true;
        assert!(PropertyValidator::new(&schema).check_value("key", "abc", &def).is_empty());
    }

    #[test]
    fn test_formula_field() {
        assert!(check("abs:2 * 3", FieldType::Formula).is_empty());
        assert_eq!(codes_of("abs:(1-2)", FieldType::Formula), vec![codes::FORMULA_SYNTAX]);

        let schema = schema();
        let mut def = field(FieldType::Formula);
        def.allows_x = true;
        assert!(PropertyValidator::new(&schema).check_value("key", "abs:x", &def).is_empty());
        assert_eq!(codes_of("abs:x", FieldType::Formula), vec![codes::FORMULA_ARGUMENT_TYPE]);
    }

    #[test]
    fn test_dynamic_text_field() {
        assert!(check("<color=red>hi", FieldType::DynamicText).is_empty());
        assert_eq!(codes_of("<colour=red>", FieldType::DynamicText), vec![codes::UNKNOWN_TAG]);
    }

    #[test]
    fn test_messages_map_to_file_positions() {
        let schema = schema();
        let validator = PropertyValidator::new(&schema);
        let value = "abs:1 +\n    abz:2";
        let messages = validator.validate_property(
            "damage",
            value,
            &field(FieldType::Formula),
            AbsolutePosition::new(3, 7),
            "ActionType",
            "mod.txt",
        );
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.severity, Severity::Error);
        assert_eq!(message.line, 4);
        assert_eq!(message.column(), Some(4));
        assert_eq!(message.context.as_deref(), Some("ActionType.damage"));
        assert_eq!(message.corrections[0].replacement, "abs");
        assert_eq!(message.corrections[0].start_line, 4);
        assert_eq!(message.corrections[0].end_column, 7);
    }

    #[test]
    fn test_operator_reference_and_docs() {
        let schema = schema();
        let messages = PropertyValidator::new(&schema).validate_property(
            "damage",
            "abs:foo",
            &field(FieldType::Formula),
            AbsolutePosition::new(1, 10),
            "ActionType",
            "mod.txt",
        );
        assert_eq!(messages[0].formula_reference.as_deref(), Some("abs"));
        assert_eq!(
            messages[0].documentation_url.as_deref(),
            Some("https://docs.example/formulas#abs")
        );
        assert_eq!(messages[0].column(), Some(14));

        let custom = PropertyValidator::new(&schema)
            .with_documentation_url(Some("https://mirror.example"))
            .validate_property(
                "damage",
                "abs:foo",
                &field(FieldType::Formula),
                AbsolutePosition::new(1, 10),
                "ActionType",
                "mod.txt",
            );
        assert_eq!(
            custom[0].documentation_url.as_deref(),
            Some("https://mirror.example#abs")
        );
    }
}
