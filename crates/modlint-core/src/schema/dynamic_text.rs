//! Dynamic-text tag and command metadata (`dynamic_text.json`)

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ModlintError;
use crate::result::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagArg {
    pub name: String,
    /// Argument text is itself a formula
    pub is_formula: bool,
}

/// A tag (`<color=red>`) or a `command` sub-command
#[derive(Debug, Clone)]
pub struct TagDef {
    pub name: String,
    pub aliases: Vec<String>,
    pub required_args: Vec<TagArg>,
    pub optional_args: Vec<TagArg>,
}

impl TagDef {
    pub fn max_args(&self) -> usize {
        self.required_args.len() + self.optional_args.len()
    }

    /// Spec of the argument at `index`, required first
    pub fn arg(&self, index: usize) -> Option<&TagArg> {
        self.required_args
            .iter()
            .chain(&self.optional_args)
            .nth(index)
    }
}

/// Tags addressable by name or alias, case-insensitively
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    tags: Vec<TagDef>,
    lookup: HashMap<String, usize>,
    names: Vec<String>,
}

impl TagTable {
    fn from_raw(raw: Vec<RawTag>, scope: &str) -> Self {
        let mut table = TagTable::default();
        for entry in raw {
            let index = table.tags.len();
            let tag = entry.into_def();
            for name in std::iter::once(&tag.name).chain(&tag.aliases) {
                let key = name.to_lowercase();
                if table.lookup.contains_key(&key) {
                    tracing::warn!(scope, name = %name, "duplicate tag name; keeping the first");
                    continue;
                }
                table.lookup.insert(key, index);
                table.names.push(name.clone());
            }
            table.tags.push(tag);
        }
        table
    }

    pub fn resolve(&self, name: &str) -> Option<&TagDef> {
        self.lookup.get(&name.to_lowercase()).map(|&i| &self.tags[i])
    }

    /// Every name and alias, in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DynamicTextSchema {
    pub tags: TagTable,
    /// Sub-commands of the `command` tag
    pub commands: TagTable,
}

impl DynamicTextSchema {
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let raw: RawDynamicTextSchema =
            serde_json::from_str(text).map_err(|e| ModlintError::json_error(origin, e))?;
        let schema = Self {
            tags: TagTable::from_raw(raw.tags, "tags"),
            commands: TagTable::from_raw(raw.commands, "commands"),
        };
        tracing::debug!(
            tags = schema.tags.tags.len(),
            commands = schema.commands.tags.len(),
            "loaded dynamic text metadata"
        );
        Ok(schema)
    }
}

#[derive(Debug, Deserialize)]
struct RawDynamicTextSchema {
    #[serde(default)]
    tags: Vec<RawTag>,
    #[serde(default)]
    commands: Vec<RawTag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTag {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    required_args: Vec<RawTagArg>,
    #[serde(default)]
    optional_args: Vec<RawTagArg>,
}

/// `"name"` or `{ "name": ..., "type": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTagArg {
    Name(String),
    Spec {
        name: String,
        #[serde(rename = "type")]
        kind: Option<String>,
    },
}

impl RawTagArg {
    fn into_arg(self) -> TagArg {
        match self {
            RawTagArg::Name(name) => TagArg {
                name,
                is_formula: false,
            },
            RawTagArg::Spec { name, kind } => TagArg {
                name,
                is_formula: kind.is_some_and(|k| k.eq_ignore_ascii_case("formula")),
            },
        }
    }
}

impl RawTag {
    fn into_def(self) -> TagDef {
        TagDef {
            name: self.name,
            aliases: self.aliases,
            required_args: self.required_args.into_iter().map(RawTagArg::into_arg).collect(),
            optional_args: self.optional_args.into_iter().map(RawTagArg::into_arg).collect(),
        }
    }
}
