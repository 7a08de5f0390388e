//! Read-only schema registries
//!
//! Built once from three JSON documents and passed by reference to every
//! stage. Nothing here is mutated after loading, so a [`SchemaContext`] can be
//! shared across threads.

pub mod dynamic_text;
pub mod formula;
pub mod objects;

use std::fs;
use std::path::{Path, PathBuf};

pub use dynamic_text::{DynamicTextSchema, TagArg, TagDef, TagTable};
pub use formula::{ArgKind, ArgSpec, FormulaSchema, OperatorDef, OperatorTable};
pub use objects::{ClassInfo, FieldDef, FieldType, ObjectCategory, ObjectSchema, ObjectTypeInfo};

use crate::error::ModlintError;
use crate::result::Result;

/// Locations of the three schema documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPaths {
    pub objects: PathBuf,
    pub formulas: PathBuf,
    pub dynamic_text: PathBuf,
}

impl SchemaPaths {
    /// `objects.json`, `formulas.json` and `dynamic_text.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            objects: dir.join("objects.json"),
            formulas: dir.join("formulas.json"),
            dynamic_text: dir.join("dynamic_text.json"),
        }
    }
}

/// All registries needed to validate mod files
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    pub objects: ObjectSchema,
    pub formulas: FormulaSchema,
    pub dynamic_text: DynamicTextSchema,
}

impl SchemaContext {
    /// Build from JSON text already in memory
    pub fn from_json_strs(objects: &str, formulas: &str, dynamic_text: &str) -> Result<Self> {
        Ok(Self {
            objects: ObjectSchema::from_json(objects, Path::new("objects.json"))?,
            formulas: FormulaSchema::from_json(formulas, Path::new("formulas.json"))?,
            dynamic_text: DynamicTextSchema::from_json(
                dynamic_text,
                Path::new("dynamic_text.json"),
            )?,
        })
    }

    /// Read and build from files; any failure is fatal for the run
    pub fn load(paths: &SchemaPaths) -> Result<Self> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|e| ModlintError::io_error(path, e))
        };

        let context = Self {
            objects: ObjectSchema::from_json(&read(&paths.objects)?, &paths.objects)?,
            formulas: FormulaSchema::from_json(&read(&paths.formulas)?, &paths.formulas)?,
            dynamic_text: DynamicTextSchema::from_json(
                &read(&paths.dynamic_text)?,
                &paths.dynamic_text,
            )?,
        };
        tracing::info!(objects = %paths.objects.display(), "schema loaded");
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_context_is_shareable() {
        assert_send_sync::<SchemaContext>();
    }

    #[test]
    fn test_from_json_strs() {
        let context = SchemaContext::from_json_strs(
            r#"{ "objectTypes": { "Item": { "category": "definition" } } }"#,
            r#"{ "operators": [ { "name": "abs" } ] }"#,
            r#"{ "tags": [ { "name": "color" } ] }"#,
        )
        .unwrap();
        assert!(context.objects.object_type("Item").is_some());
        assert!(context.formulas.operators.resolve("abs").is_some());
        assert!(context.dynamic_text.tags.resolve("color").is_some());
    }

    #[test]
    fn test_malformed_json_names_document() {
        let err = SchemaContext::from_json_strs("{}", "not json", "{}").unwrap_err();
        assert!(err.to_string().contains("formulas.json"));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("objects.json"), "{}").unwrap();
        fs::write(dir.path().join("formulas.json"), "{}").unwrap();
        fs::write(dir.path().join("dynamic_text.json"), "{}").unwrap();

        let context = SchemaContext::load(&SchemaPaths::in_dir(dir.path())).unwrap();
        assert!(context.formulas.operators.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = SchemaContext::load(&SchemaPaths::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, ModlintError::IoError { .. }));
    }
}
