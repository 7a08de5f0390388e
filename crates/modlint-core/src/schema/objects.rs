//! Object-type and class field registry (`objects.json`)

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::error::ModlintError;
use crate::result::Result;

/// Maximum alias hops when resolving a type name
const MAX_ALIAS_DEPTH: usize = 16;

/// How an object type is used by the game loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    Definition,
    Instance,
    Nested,
    Special,
}

impl ObjectCategory {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "definition" => Some(Self::Definition),
            "instance" => Some(Self::Instance),
            "nested" => Some(Self::Nested),
            "special" => Some(Self::Special),
            _ => None,
        }
    }
}

/// Declared field type after alias resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Byte,
    Vector2,
    TileCoord,
    Vector3,
    Rectangle,
    List(Box<FieldType>),
    String,
    Formula,
    DynamicText,
    /// Member of a named enum
    Enum(String),
    /// Anything the registry does not know; always accepted
    Unknown(String),
}

impl FieldType {
    /// Resolve a declared type string through `aliases` and `enums`
    pub fn resolve(
        declared: &str,
        aliases: &HashMap<String, String>,
        enums: &HashMap<String, Vec<String>>,
    ) -> Self {
        let mut name = declared.trim();
        for _ in 0..MAX_ALIAS_DEPTH {
            match aliases.get(name) {
                Some(target) if target != name => name = target.as_str(),
                _ => break,
            }
        }

        if let Some(inner) = name
            .strip_prefix("List<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return FieldType::List(Box::new(Self::resolve(inner, aliases, enums)));
        }

        match name.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => FieldType::Boolean,
            "integer" | "int" => FieldType::Integer,
            "float" | "double" => FieldType::Float,
            "byte" => FieldType::Byte,
            "vector2" => FieldType::Vector2,
            "tilecoord" => FieldType::TileCoord,
            "vector3" => FieldType::Vector3,
            "rectangle" => FieldType::Rectangle,
            "string" => FieldType::String,
            "formula" => FieldType::Formula,
            "dynamictext" => FieldType::DynamicText,
            _ if enums.contains_key(name) => FieldType::Enum(name.to_string()),
            _ => FieldType::Unknown(name.to_string()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldType::List(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Float => f.write_str("float"),
            FieldType::Byte => f.write_str("byte"),
            FieldType::Vector2 => f.write_str("Vector2"),
            FieldType::TileCoord => f.write_str("TileCoord"),
            FieldType::Vector3 => f.write_str("Vector3"),
            FieldType::Rectangle => f.write_str("Rectangle"),
            FieldType::List(inner) => write!(f, "List<{inner}>"),
            FieldType::String => f.write_str("string"),
            FieldType::Formula => f.write_str("Formula"),
            FieldType::DynamicText => f.write_str("DynamicText"),
            FieldType::Enum(name) | FieldType::Unknown(name) => f.write_str(name),
        }
    }
}

/// A field of a class
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    /// Synthesized by the loader: key accepted, value not type-checked
    pub is_virtual: bool,
    /// Anchored regex for pattern fields
    pub pattern: Option<Regex>,
    /// Formula fields whose argument placeholder `x` is filled in later
    pub allows_x: bool,
}

/// A class with inherited fields flattened in
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl ClassInfo {
    /// Exact field names win over pattern fields
    pub fn field(&self, key: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.pattern.is_none() && f.name == key)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|f| f.pattern.as_ref().is_some_and(|re| re.is_match(key)))
            })
    }

    /// Names usable as suggestions (pattern fields excluded)
    pub fn concrete_field_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.pattern.is_none())
            .map(|f| f.name.as_str())
    }
}

/// Registry entry for one `[TypeName]`
#[derive(Debug, Clone)]
pub struct ObjectTypeInfo {
    pub name: String,
    pub category: ObjectCategory,
    pub class: Option<String>,
    pub requires_id: bool,
    pub supports_clone: bool,
    /// Types this object must directly follow
    pub parents: Vec<String>,
    /// Element class of list-style objects
    pub list_of: Option<String>,
}

/// Object types, classes and enums
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    types: IndexMap<String, ObjectTypeInfo>,
    classes: HashMap<String, ClassInfo>,
    enums: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObjectSchema {
    #[serde(default)]
    object_types: IndexMap<String, RawObjectType>,
    #[serde(default)]
    classes: HashMap<String, RawClass>,
    #[serde(default)]
    type_aliases: HashMap<String, String>,
    #[serde(default)]
    enums: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObjectType {
    category: String,
    class: Option<String>,
    #[serde(default)]
    requires_id: bool,
    #[serde(default)]
    supports_clone: bool,
    #[serde(default)]
    parents: Vec<String>,
    list_of: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClass {
    extends: Option<String>,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    name: String,
    #[serde(rename = "type", default = "default_field_type")]
    field_type: String,
    #[serde(rename = "virtual", default)]
    is_virtual: bool,
    #[serde(default)]
    pattern: bool,
    #[serde(default)]
    allows_x: bool,
}

fn default_field_type() -> String {
    "string".to_string()
}

impl ObjectSchema {
    /// Parse `objects.json`; `origin` labels JSON errors
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let mut raw: RawObjectSchema =
            serde_json::from_str(text).map_err(|e| ModlintError::json_error(origin, e))?;

        let mut types = IndexMap::new();
        for (name, entry) in std::mem::take(&mut raw.object_types) {
            let category = ObjectCategory::parse(&entry.category).ok_or_else(|| {
                ModlintError::schema_error(format!(
                    "object type '{name}' has unknown category '{}'",
                    entry.category
                ))
            })?;
            types.insert(
                name.clone(),
                ObjectTypeInfo {
                    name,
                    category,
                    class: entry.class,
                    requires_id: entry.requires_id,
                    supports_clone: entry.supports_clone,
                    parents: entry.parents,
                    list_of: entry.list_of,
                },
            );
        }

        let mut classes = HashMap::new();
        for name in raw.classes.keys() {
            let fields = flatten_fields(name, &raw, &mut Vec::new())?;
            classes.insert(
                name.clone(),
                ClassInfo {
                    name: name.clone(),
                    fields,
                },
            );
        }

        tracing::debug!(
            types = types.len(),
            classes = classes.len(),
            enums = raw.enums.len(),
            "loaded object schema"
        );

        Ok(Self {
            types,
            classes,
            enums: raw.enums,
        })
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectTypeInfo> {
        self.types.get(name)
    }

    /// Registered type names in schema order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    /// Class of an object type, if both are registered
    pub fn class_for(&self, type_name: &str) -> Option<&ClassInfo> {
        self.object_type(type_name)?
            .class
            .as_deref()
            .and_then(|class| self.class(class))
    }

    pub fn enum_members(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }
}

/// Fields of `name` with inherited fields first; child fields shadow parents
fn flatten_fields(name: &str, raw: &RawObjectSchema, chain: &mut Vec<String>) -> Result<Vec<FieldDef>> {
    if chain.iter().any(|c| c == name) {
        chain.push(name.to_string());
        return Err(ModlintError::schema_error(format!(
            "cyclic class inheritance: {}",
            chain.join(" -> ")
        )));
    }
    let Some(class) = raw.classes.get(name) else {
        tracing::warn!(class = name, "class extends an unknown class; ignoring parent");
        return Ok(Vec::new());
    };
    chain.push(name.to_string());

    let mut fields = match &class.extends {
        Some(parent) => flatten_fields(parent, raw, chain)?,
        None => Vec::new(),
    };
    chain.pop();

    let own: HashSet<&str> = class.fields.iter().map(|f| f.name.as_str()).collect();
    fields.retain(|f| !own.contains(f.name.as_str()));

    for field in &class.fields {
        let pattern = if field.pattern {
            let anchored = format!("^(?:{})$", field.name);
            Some(Regex::new(&anchored).map_err(|e| {
                ModlintError::schema_error(format!(
                    "invalid pattern for field '{}' of class '{name}': {e}",
                    field.name
                ))
            })?)
        } else {
            None
        };
        fields.push(FieldDef {
            name: field.name.clone(),
            field_type: FieldType::resolve(&field.field_type, &raw.type_aliases, &raw.enums),
            is_virtual: field.is_virtual,
            pattern,
            allows_x: field.allows_x,
        });
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "objectTypes": {
            "Action": { "category": "definition", "class": "ActionType",
                        "requiresId": true, "supportsClone": true },
            "AoE": { "category": "nested", "class": "AoEType", "parents": ["Action"] }
        },
        "classes": {
            "BaseType": { "fields": [ { "name": "ID" }, { "name": "tier", "type": "int" } ] },
            "ActionType": {
                "extends": "BaseType",
                "fields": [
                    { "name": "tier", "type": "float" },
                    { "name": "damage", "type": "Formula", "allowsX": true },
                    { "name": "stat_.*", "type": "integer", "pattern": true },
                    { "name": "tags", "type": "List<DamageType>" }
                ]
            }
        },
        "typeAliases": { "int": "integer" },
        "enums": { "DamageType": ["Fire", "Ice"] }
    }"#;

    fn schema() -> ObjectSchema {
        ObjectSchema::from_json(SCHEMA, Path::new("objects.json")).unwrap()
    }

    #[test]
    fn test_object_types_loaded() {
        let schema = schema();
        let action = schema.object_type("Action").unwrap();
        assert_eq!(action.category, ObjectCategory::Definition);
        assert!(action.requires_id);
        assert_eq!(schema.object_type("AoE").unwrap().parents, vec!["Action"]);
        assert_eq!(schema.type_names().collect::<Vec<_>>(), vec!["Action", "AoE"]);
    }

    #[test]
    fn test_inherited_and_shadowed_fields() {
        let schema = schema();
        let class = schema.class_for("Action").unwrap();
        assert_eq!(class.field("ID").unwrap().field_type, FieldType::String);
        // Child declaration shadows the parent's `tier`
        assert_eq!(class.field("tier").unwrap().field_type, FieldType::Float);
        assert!(class.field("damage").unwrap().allows_x);
    }

    #[test]
    fn test_pattern_fields_are_anchored() {
        let schema = schema();
        let class = schema.class_for("Action").unwrap();
        assert_eq!(class.field("stat_hp").unwrap().name, "stat_.*");
        assert!(class.field("my_stat_hp").is_none());
        assert!(!class.concrete_field_names().any(|n| n == "stat_.*"));
    }

    #[test]
    fn test_list_of_enum() {
        let schema = schema();
        let tags = schema.class_for("Action").unwrap().field("tags").unwrap();
        assert_eq!(
            tags.field_type,
            FieldType::List(Box::new(FieldType::Enum("DamageType".to_string())))
        );
    }

    #[test]
    fn test_unknown_category_is_fatal() {
        let json = r#"{ "objectTypes": { "X": { "category": "weird" } } }"#;
        let err = ObjectSchema::from_json(json, Path::new("objects.json")).unwrap_err();
        assert!(err.to_string().contains("unknown category"));
    }

    #[test]
    fn test_cyclic_extends_is_fatal() {
        let json = r#"{ "classes": {
            "A": { "extends": "B", "fields": [] },
            "B": { "extends": "A", "fields": [] } } }"#;
        let err = ObjectSchema::from_json(json, Path::new("objects.json")).unwrap_err();
        assert!(err.to_string().contains("cyclic"));
    }

    #[test]
    fn test_invalid_pattern_is_fatal() {
        let json = r#"{ "classes": { "A": { "fields": [ { "name": "(", "pattern": true } ] } } }"#;
        assert!(ObjectSchema::from_json(json, Path::new("objects.json")).is_err());
    }

    #[test]
    fn test_field_type_resolution() {
        let aliases = HashMap::from([("Coord".to_string(), "TileCoord".to_string())]);
        let enums = HashMap::new();
        assert_eq!(FieldType::resolve("Coord", &aliases, &enums), FieldType::TileCoord);
        assert_eq!(FieldType::resolve("bool", &aliases, &enums), FieldType::Boolean);
        assert_eq!(
            FieldType::resolve("Sprite", &aliases, &enums),
            FieldType::Unknown("Sprite".to_string())
        );
        assert_eq!(FieldType::resolve("List<int>", &aliases, &enums).to_string(), "List<integer>");
    }
}
