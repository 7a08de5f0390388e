//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::schema::SchemaPaths;
use crate::similarity::DEFAULT_MAX_DISTANCE;
use crate::validator::ValidationOptions;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModlintConfig {
    pub schema: SchemaConfiguration,
    pub validation: ValidationConfiguration,
    pub files: FilesConfiguration,
}

impl ModlintConfig {
    /// Schema locations resolved against `base_dir`
    pub fn schema_paths(&self, base_dir: &Path) -> SchemaPaths {
        SchemaPaths {
            objects: base_dir.join(&self.schema.objects),
            formulas: base_dir.join(&self.schema.formulas),
            dynamic_text: base_dir.join(&self.schema.dynamic_text),
        }
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            check_duplicate_ids: self.validation.check_duplicate_ids,
            style_hints: self.validation.style_hints,
            max_suggestion_distance: self.validation.max_suggestion_distance,
            documentation_url: self.validation.documentation_url.clone(),
        }
    }
}

/// Where the three schema documents live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaConfiguration {
    pub objects: PathBuf,
    pub formulas: PathBuf,
    #[serde(alias = "dynamic_text")]
    pub dynamic_text: PathBuf,
}

impl Default for SchemaConfiguration {
    fn default() -> Self {
        Self {
            objects: PathBuf::from("schema/objects.json"),
            formulas: PathBuf::from("schema/formulas.json"),
            dynamic_text: PathBuf::from("schema/dynamic_text.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfiguration {
    /// Report the same (type, ID) defined more than once across files
    #[serde(alias = "check_duplicate_ids")]
    pub check_duplicate_ids: bool,

    /// Emit info diagnostics for stylistic conventions
    #[serde(alias = "style_hints")]
    pub style_hints: bool,

    /// Edit distance limit for "did you mean" suggestions
    #[serde(alias = "max_suggestion_distance")]
    pub max_suggestion_distance: usize,

    /// Base URL for formula operator docs
    #[serde(alias = "documentation_url", skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

impl Default for ValidationConfiguration {
    fn default() -> Self {
        Self {
            check_duplicate_ids: true,
            style_hints: true,
            max_suggestion_distance: DEFAULT_MAX_DISTANCE,
            documentation_url: None,
        }
    }
}

/// Which files `check` picks up when given directories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FilesConfiguration {
    /// Extensions without the dot
    pub extensions: Vec<String>,
    /// Glob patterns of paths to skip
    pub exclude: Vec<String>,
}

impl Default for FilesConfiguration {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string()],
            exclude: Vec::new(),
        }
    }
}

impl FilesConfiguration {
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}
