//! Configuration for modlint
//!
//! Settings live in a TOML or JSON file discovered by walking up from the
//! working directory:
//!
//! ```toml
//! [schema]
//! objects = "schema/objects.json"
//! formulas = "schema/formulas.json"
//! dynamic_text = "schema/dynamic_text.json"
//!
//! [validation]
//! check_duplicate_ids = true
//! style_hints = false
//! max_suggestion_distance = 2
//!
//! [files]
//! extensions = ["txt"]
//! exclude = ["**/backup/**"]
//! ```
//!
//! JSON files use camelCase keys (`dynamicText`, `checkDuplicateIds`).
//! Schema paths are relative to the directory holding the config file.
//! When no file is found the defaults apply.

mod loader;
mod modlint_config;

pub use loader::{CONFIG_FILE_NAMES, ConfigLoader, LoadedConfig};
pub use modlint_config::{
    FilesConfiguration, ModlintConfig, SchemaConfiguration, ValidationConfiguration,
};
