//! Formula operator metadata (`formulas.json`)

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ModlintError;
use crate::result::Result;

/// What an operator argument accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Numeric literal (or `x` where allowed)
    Numeric,
    /// Nested formula (trailing argument)
    Formula,
    /// Free atom: stat names, targets, flags
    Atom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
}

/// One operator, possibly with its own sub-operator namespace
#[derive(Debug, Clone)]
pub struct OperatorDef {
    pub name: String,
    pub aliases: Vec<String>,
    pub category: Option<String>,
    pub function_style: bool,
    /// Accepted argument lists; never empty
    pub usages: Vec<Vec<ArgSpec>>,
    pub alternate_delimiters: Vec<String>,
    pub delegates_to: Option<String>,
    pub sub_operators: OperatorTable,
}

impl OperatorDef {
    /// Non-formula argument counts accepted by some usage, ascending
    pub fn arities(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self
            .usages
            .iter()
            .map(|usage| usage.iter().filter(|a| a.kind != ArgKind::Formula).count())
            .collect();
        counts.sort_unstable();
        counts.dedup();
        counts
    }

    /// The usage taking exactly `count` non-formula arguments, preferring
    /// one whose trailing formula argument matches `has_formula`
    pub fn usage_for(&self, count: usize, has_formula: bool) -> Option<&[ArgSpec]> {
        let plain_count = |usage: &Vec<ArgSpec>| usage.iter().filter(|a| a.kind != ArgKind::Formula).count();
        let wants_formula = |usage: &Vec<ArgSpec>| usage.last().is_some_and(|a| a.kind == ArgKind::Formula);
        self.usages
            .iter()
            .find(|u| plain_count(u) == count && wants_formula(u) == has_formula)
            .or_else(|| self.usages.iter().find(|u| plain_count(u) == count))
            .map(Vec::as_slice)
    }

    /// Whether any usage ends in a formula-valued argument
    pub fn takes_formula(&self) -> bool {
        self.usages
            .iter()
            .any(|usage| usage.last().is_some_and(|a| a.kind == ArgKind::Formula))
    }

    pub fn has_sub_operators(&self) -> bool {
        !self.sub_operators.is_empty()
    }
}

/// Operators addressable by name or alias (case-sensitive)
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    operators: Vec<OperatorDef>,
    lookup: HashMap<String, usize>,
    /// Names and aliases in definition order, for suggestions
    names: Vec<String>,
}

impl OperatorTable {
    fn from_raw(raw: Vec<RawOperator>, scope: &str) -> Result<Self> {
        let mut table = OperatorTable::default();
        for entry in raw {
            let index = table.operators.len();
            let operator = entry.into_def()?;
            for name in std::iter::once(&operator.name).chain(&operator.aliases) {
                if table.lookup.contains_key(name) {
                    tracing::warn!(scope, name = %name, "duplicate operator name; keeping the first");
                    continue;
                }
                table.lookup.insert(name.clone(), index);
                table.names.push(name.clone());
            }
            table.operators.push(operator);
        }
        Ok(table)
    }

    /// Canonical operator for a name or alias
    pub fn resolve(&self, name: &str) -> Option<&OperatorDef> {
        self.lookup.get(name).map(|&i| &self.operators[i])
    }

    /// Every name and alias, in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn operators(&self) -> &[OperatorDef] {
        &self.operators
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

/// Top-level formula metadata
#[derive(Debug, Clone, Default)]
pub struct FormulaSchema {
    pub documentation_url: Option<String>,
    pub operators: OperatorTable,
}

impl FormulaSchema {
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let raw: RawFormulaSchema =
            serde_json::from_str(text).map_err(|e| ModlintError::json_error(origin, e))?;
        let operators = OperatorTable::from_raw(raw.operators, "formula")?;
        tracing::debug!(operators = operators.operators.len(), "loaded formula metadata");
        Ok(Self {
            documentation_url: raw.documentation_url,
            operators,
        })
    }

    /// Link for one operator under the documentation base URL
    pub fn operator_url(&self, base: Option<&str>, operator: &str) -> Option<String> {
        base.or(self.documentation_url.as_deref())
            .map(|url| format!("{}#{}", url.trim_end_matches('/'), operator))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFormulaSchema {
    documentation_url: Option<String>,
    #[serde(default)]
    operators: Vec<RawOperator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperator {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    category: Option<String>,
    #[serde(default)]
    function_style: bool,
    usages: Option<Vec<Vec<RawArg>>>,
    #[serde(default)]
    alternate_delimiters: Vec<String>,
    delegates_to: Option<String>,
    #[serde(default)]
    sub_operators: Vec<RawOperator>,
}

#[derive(Debug, Deserialize)]
struct RawArg {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    formula: bool,
}

impl RawArg {
    fn into_spec(self) -> ArgSpec {
        let kind = match self.kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
            _ if self.formula => ArgKind::Formula,
            Some("formula") => ArgKind::Formula,
            Some("number" | "integer" | "int" | "float") => ArgKind::Numeric,
            _ => ArgKind::Atom,
        };
        ArgSpec {
            name: self.name,
            kind,
        }
    }
}

impl RawOperator {
    fn into_def(self) -> Result<OperatorDef> {
        let usages: Vec<Vec<ArgSpec>> = match self.usages {
            Some(usages) if !usages.is_empty() => usages
                .into_iter()
                .map(|usage| usage.into_iter().map(RawArg::into_spec).collect())
                .collect(),
            _ => vec![Vec::new()],
        };

        for usage in &usages {
            let misplaced = usage
                .iter()
                .rev()
                .skip(1)
                .any(|a| a.kind == ArgKind::Formula);
            if misplaced {
                return Err(ModlintError::schema_error(format!(
                    "operator '{}': only the last argument may be a formula",
                    self.name
                )));
            }
        }

        let sub_operators = OperatorTable::from_raw(self.sub_operators, &self.name)?;
        Ok(OperatorDef {
            name: self.name,
            aliases: self.aliases,
            category: self.category,
            function_style: self.function_style,
            usages,
            alternate_delimiters: self.alternate_delimiters,
            delegates_to: self.delegates_to,
            sub_operators,
        })
    }
}
