//! Validation orchestrator
//!
//! Runs in two phases. Phase 1 parses and validates every file on its own
//! (in parallel); phase 2 looks across all parsed objects for duplicate IDs.
//! Phase 1 output is collected in input order so phase 2 always sees the
//! same "first occurrence".

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::debug;

use crate::diagnostics::{Correction, RelatedLocation, ValidationMessage, ValidationResult, codes};
use crate::object::{ParsedObject, PropertyInfo, REPLACE_MARKER, base_key};
use crate::parser::parse;
use crate::position::TextSpan;
use crate::property::PropertyValidator;
use crate::schema::{ClassInfo, ObjectCategory, ObjectTypeInfo, SchemaContext};
use crate::similarity::{DEFAULT_MAX_DISTANCE, find_similar, format_suggestions};

/// Key that copies another definition
pub const CLONE_KEY: &str = "clone";

/// Key holding an object's identifier
pub const ID_KEY: &str = "ID";

/// Switches for a validation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    pub check_duplicate_ids: bool,
    /// Report stylistic info diagnostics (zero-argument tags)
    pub style_hints: bool,
    pub max_suggestion_distance: usize,
    /// Base URL for operator docs; overrides the formula metadata's own
    pub documentation_url: Option<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_duplicate_ids: true,
            style_hints: true,
            max_suggestion_distance: DEFAULT_MAX_DISTANCE,
            documentation_url: None,
        }
    }
}

/// Phase 1 output for one file
#[derive(Debug, Clone)]
pub struct FileValidation {
    pub file: String,
    pub objects: Vec<ParsedObject>,
    pub messages: Vec<ValidationMessage>,
}

/// Validates mod files against a [`SchemaContext`]
pub struct Validator<'a> {
    schema: &'a SchemaContext,
    options: ValidationOptions,
}

impl<'a> Validator<'a> {
    pub fn new(schema: &'a SchemaContext, options: ValidationOptions) -> Self {
        Self { schema, options }
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate a single file, duplicate IDs within it included
    pub fn validate(&self, source: &str, file: &str) -> ValidationResult {
        self.validate_files(&[(file, source)])
    }

    /// Validate a batch of `(file label, source text)` pairs
    pub fn validate_files<P, S>(&self, files: &[(P, S)]) -> ValidationResult
    where
        P: AsRef<str> + Sync,
        S: AsRef<str> + Sync,
    {
        // indexed collect keeps input order
        let validated: Vec<FileValidation> = files
            .par_iter()
            .map(|(file, source)| self.validate_file(source.as_ref(), file.as_ref()))
            .collect();

        let mut result = ValidationResult::new();
        for file in &validated {
            result.extend(file.messages.iter().cloned());
        }
        if self.options.check_duplicate_ids {
            result.extend(duplicate_ids(&validated));
        }
        result
    }

    /// Phase 1: parse one file and run every single-file check
    pub fn validate_file(&self, source: &str, file: &str) -> FileValidation {
        let (objects, mut messages) = parse(source, file);
        let parse_messages = messages.len();

        for index in 0..objects.len() {
            self.check_object(&objects, index, &mut messages);
        }

        debug!(
            file,
            objects = objects.len(),
            parse_messages,
            messages = messages.len(),
            "validated file"
        );
        FileValidation {
            file: file.to_string(),
            objects,
            messages,
        }
    }

    fn check_object(&self, objects: &[ParsedObject], index: usize, out: &mut Vec<ValidationMessage>) {
        let object = &objects[index];
        let registry = &self.schema.objects;

        let Some(info) = registry.object_type(&object.type_name) else {
            out.push(self.unknown_object_type(object));
            return;
        };

        if info.requires_id && !object.properties.contains_key(ID_KEY) {
            out.push(
                ValidationMessage::error(
                    codes::MISSING_ID,
                    format!("[{}] requires an {ID_KEY}", object.type_name),
                    &object.file,
                    object.start_line,
                )
                .with_span(object.type_span.into()),
            );
        }

        if !info.supports_clone {
            for (stored, property) in &object.properties {
                if base_key(stored) == CLONE_KEY {
                    out.push(
                        ValidationMessage::error(
                            codes::CLONE_UNSUPPORTED,
                            format!("[{}] does not support {CLONE_KEY}", object.type_name),
                            &object.file,
                            property.name_span.line,
                        )
                        .with_span(property.name_span.into()),
                    );
                }
            }
        }

        if !info.parents.is_empty() && !self.follows_parent(objects, index, info) {
            out.push(
                ValidationMessage::error(
                    codes::PARENT_ORDER,
                    format!(
                        "[{}] must directly follow one of: {}",
                        object.type_name,
                        info.parents.join(", ")
                    ),
                    &object.file,
                    object.start_line,
                )
                .with_span(object.type_span.into()),
            );
        }

        let Some(class) = info.class.as_deref().and_then(|name| registry.class(name)) else {
            debug!(object_type = %object.type_name, "no class registered; skipping property checks");
            return;
        };

        let properties = PropertyValidator::new(self.schema)
            .with_max_distance(self.options.max_suggestion_distance)
            .with_style_hints(self.options.style_hints)
            .with_documentation_url(self.options.documentation_url.as_deref());

        for (stored, property) in &object.properties {
            self.check_property(object, class, stored, property, &properties, out);
        }
    }

    /// Walk back over nested siblings until a parent type (or anything else) shows up
    fn follows_parent(&self, objects: &[ParsedObject], index: usize, info: &ObjectTypeInfo) -> bool {
        let mut cursor = objects[index].previous;
        while let Some(previous) = cursor {
            let sibling = &objects[previous];
            if info.parents.iter().any(|p| *p == sibling.type_name) {
                return true;
            }
            match self.schema.objects.object_type(&sibling.type_name) {
                Some(t) if t.category == ObjectCategory::Nested && !t.parents.is_empty() => {
                    cursor = sibling.previous;
                }
                _ => return false,
            }
        }
        false
    }

    fn check_property(
        &self,
        object: &ParsedObject,
        class: &ClassInfo,
        stored: &str,
        property: &PropertyInfo,
        properties: &PropertyValidator<'_>,
        out: &mut Vec<ValidationMessage>,
    ) {
        let key = base_key(stored);
        let replaces = stored.starts_with(REPLACE_MARKER);
        let file = object.file.as_str();
        let name_span: TextSpan = property.name_span.into();

        if key == CLONE_KEY {
            return;
        }

        let Some(field) = class.field(key) else {
            let matches = find_similar(
                key,
                class.concrete_field_names(),
                self.options.max_suggestion_distance,
            );
            let mut message = ValidationMessage::warning(
                codes::UNKNOWN_PROPERTY,
                format!("Unknown property '{key}' for [{}]", object.type_name),
                file,
                property.name_span.line,
            )
            .with_span(name_span)
            .with_context(class.name.clone());
            if let Some(list) = format_suggestions(&matches) {
                message = message.with_suggestion(format!("Did you mean {list}?"));
            }
            if let Some(best) = matches.first() {
                let replacement = if replaces {
                    format!("{REPLACE_MARKER}{}", best.candidate)
                } else {
                    best.candidate.clone()
                };
                message = message.with_correction(Correction::replace(file, name_span, replacement));
            }
            out.push(message);
            return;
        };

        let is_list = field.field_type.is_list();
        if object.occurrence(stored) == 1 && !is_list {
            let count = object.occurrences_of(key);
            out.push(
                ValidationMessage::warning(
                    codes::DUPLICATE_PROPERTY,
                    format!("'{key}' is defined {count} times; the engine keeps every value"),
                    file,
                    property.name_span.line,
                )
                .with_span(name_span),
            );
        }

        if replaces && !is_list {
            out.push(
                ValidationMessage::hint(
                    codes::REPLACE_MARKER,
                    format!("'{REPLACE_MARKER}' only changes list properties; '{key}' is a {}", field.field_type),
                    file,
                    property.name_span.line,
                )
                .with_span(name_span)
                .with_correction(Correction::replace(file, name_span, key)),
            );
        }

        out.extend(properties.validate_property(
            key,
            &property.value,
            field,
            property.value_origin(),
            &class.name,
            file,
        ));
    }

    fn unknown_object_type(&self, object: &ParsedObject) -> ValidationMessage {
        let span: TextSpan = object.type_span.into();
        let matches = find_similar(
            &object.type_name,
            self.schema.objects.type_names(),
            self.options.max_suggestion_distance,
        );
        let mut message = ValidationMessage::error(
            codes::UNKNOWN_OBJECT_TYPE,
            format!("Unknown object type '{}'", object.type_name),
            &object.file,
            object.start_line,
        )
        .with_span(span);
        if let Some(list) = format_suggestions(&matches) {
            message = message.with_suggestion(format!("Did you mean {list}?"));
        }
        if let Some(best) = matches.first() {
            message = message.with_correction(Correction::replace(&object.file, span, best.candidate.clone()));
        }
        message
    }
}

/// Phase 2: one error per (type, ID) group with more than one member,
/// placed on the second occurrence
pub fn duplicate_ids(files: &[FileValidation]) -> Vec<ValidationMessage> {
    let mut groups: IndexMap<(&str, &str), Vec<&ParsedObject>> = IndexMap::new();
    for object in files.iter().flat_map(|f| &f.objects) {
        if let Some(id) = object.id() {
            groups
                .entry((object.type_name.as_str(), id))
                .or_default()
                .push(object);
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .filter_map(|((type_name, id), members)| {
            let related: Vec<RelatedLocation> = members
                .iter()
                .map(|o| RelatedLocation {
                    file: o.file.clone(),
                    line: o.get(ID_KEY).map_or(o.start_line, |p| p.name_span.line),
                })
                .collect();
            let locations: Vec<String> = related.iter().map(ToString::to_string).collect();
            let second = members[1];
            let property = second.get(ID_KEY)?;
            Some(
                ValidationMessage::error(
                    codes::DUPLICATE_ID,
                    format!(
                        "Duplicate {ID_KEY} '{id}' for [{type_name}] at {}",
                        locations.join(", ")
                    ),
                    &second.file,
                    property.name_span.line,
                )
                .with_span(property.value_span)
                .with_related(related)
                .cross_file(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    const OBJECTS: &str = r#"{
        "objectTypes": {
            "Action": { "category": "definition", "class": "ActionType",
                        "requiresId": true, "supportsClone": true },
            "AoE": { "category": "nested", "class": "AoEType", "parents": ["Action"] },
            "Item": { "category": "definition", "class": "ItemType", "requiresId": true },
            "Note": { "category": "special" }
        },
        "classes": {
            "BaseType": { "fields": [ { "name": "ID" } ] },
            "ActionType": { "extends": "BaseType", "fields": [
                { "name": "damage", "type": "Formula" },
                { "name": "range", "type": "int" },
                { "name": "tags", "type": "List<string>" },
                { "name": "element", "type": "DamageType" }
            ] },
            "AoEType": { "fields": [ { "name": "radius", "type": "float" } ] },
            "ItemType": { "extends": "BaseType", "fields": [ { "name": "name" } ] }
        },
        "typeAliases": { "int": "integer" },
        "enums": { "DamageType": ["Fire", "Ice"] }
    }"#;
    const FORMULAS: &str = r#"{ "operators": [
        { "name": "abs", "usages": [[ {"name":"value","type":"number"} ]] } ] }"#;
    const DYNAMIC_TEXT: &str = r#"{ "tags": [] }"#;

    fn schema() -> SchemaContext {
        SchemaContext::from_json_strs(OBJECTS, FORMULAS, DYNAMIC_TEXT).unwrap()
    }

    fn validate(source: &str) -> ValidationResult {
        let schema = schema();
        Validator::new(&schema, ValidationOptions::default()).validate(source, "mod.txt")
    }

    fn codes_of(result: &ValidationResult) -> Vec<&str> {
        result.iter().map(|m| m.code.as_str()).collect()
    }

    #[test]
    fn test_clean_file() {
        let result = validate("[Action] ID=fireball; damage=abs:3; range=5;\n[AoE] radius=1.5;\n");
        assert!(result.is_empty(), "{result:?}");
    }

    #[test]
    fn test_unknown_type_suggests_correction() {
        let result = validate("[Acton] ID=x;");
        assert_eq!(codes_of(&result), vec![codes::UNKNOWN_OBJECT_TYPE]);
        let correction = &result.errors[0].corrections[0];
        assert_eq!(correction.replacement, "Action");
        assert_eq!((correction.start_column, correction.end_column), (1, 6));
    }

    #[test]
    fn test_missing_id() {
        let result = validate("[Item] name=Sword;");
        assert_eq!(codes_of(&result), vec![codes::MISSING_ID]);
    }

    #[test]
    fn test_clone_support() {
        assert!(validate("[Action] ID=a; clone=b;").is_empty());
        let result = validate("[Item] ID=a; clone=b;");
        assert_eq!(codes_of(&result), vec![codes::CLONE_UNSUPPORTED]);
    }

    #[test]
    fn test_parent_adjacency() {
        assert!(validate("[Action] ID=a;\n[AoE] radius=1;\n[AoE] radius=2;").is_empty());
        let result = validate("[Item] ID=i; name=x;\n[AoE] radius=1;");
        assert_eq!(codes_of(&result), vec![codes::PARENT_ORDER]);
        assert_eq!(result.errors[0].line, 2);
        assert_eq!(codes_of(&validate("[AoE] radius=1;")), vec![codes::PARENT_ORDER]);
    }

    #[test]
    fn test_unknown_property_correction_on_name() {
        let result = validate("[Action] ID=a; damag=1;");
        assert_eq!(codes_of(&result), vec![codes::UNKNOWN_PROPERTY]);
        let message = &result.warnings[0];
        assert_eq!(message.severity, Severity::Warning);
        let correction = &message.corrections[0];
        assert_eq!(correction.replacement, "damage");
        assert_eq!((correction.start_column, correction.end_column), (15, 20));
    }

    #[test]
    fn test_duplicate_and_replace_marker() {
        let result = validate("[Action] ID=a; range=1; range=2; range=3;");
        assert_eq!(codes_of(&result), vec![codes::DUPLICATE_PROPERTY]);
        assert!(result.warnings[0].message.contains("3 times"));

        assert!(validate("[Action] ID=a; tags=a; tags=b; !tags=c;").is_empty());

        // `!` does not make a second key
        let result = validate("[Action] ID=a; range=1; !range=2;");
        assert_eq!(
            codes_of(&result),
            vec![codes::DUPLICATE_PROPERTY, codes::REPLACE_MARKER]
        );
        assert!(result.warnings[0].message.contains("2 times"));
        assert_eq!(result.warnings[0].span.unwrap().start_column, 24);

        let result = validate("[Action] ID=a; !range=1;");
        assert_eq!(codes_of(&result), vec![codes::REPLACE_MARKER]);
        assert_eq!(result.hints[0].corrections[0].replacement, "range");
    }

    #[test]
    fn test_values_are_type_checked() {
        let result = validate("[Action] ID=a; range=far; element=Fir; damage=abz:1;");
        assert_eq!(
            codes_of(&result),
            vec![codes::INVALID_INTEGER, codes::INVALID_ENUM, codes::UNKNOWN_OPERATOR]
        );
    }

    #[test]
    fn test_types_without_class_skip_properties() {
        assert!(validate("[Note] anything=goes;").is_empty());
    }

    #[test]
    fn test_duplicate_ids_across_files() {
        let schema = schema();
        let validator = Validator::new(&schema, ValidationOptions::default());
        let result = validator.validate_files(&[
            ("a.txt", "[Action] ID=dup;"),
            ("b.txt", "\n[Action] ID=dup;"),
            ("c.txt", "[Item] ID=dup;"),
        ]);
        assert_eq!(codes_of(&result), vec![codes::DUPLICATE_ID]);
        let message = &result.errors[0];
        assert!(message.cross_file);
        assert_eq!(message.file, "b.txt");
        assert_eq!(message.line, 2);
        assert_eq!(message.related.len(), 2);
        assert!(message.message.contains("a.txt:1"));
        assert!(message.message.contains("b.txt:2"));
    }

    #[test]
    fn test_duplicate_id_check_can_be_disabled() {
        let schema = schema();
        let options = ValidationOptions {
            check_duplicate_ids: false,
            ..ValidationOptions::default()
        };
        let result = Validator::new(&schema, options)
            .validate("[Action] ID=dup;\n[Action] ID=dup;", "mod.txt");
        assert!(result.is_empty());
    }
}
