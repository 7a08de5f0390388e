//! Diagnostic types produced by every validation stage
//!
//! Provides diagnostics with:
//! - Severity and a stable diagnostic code
//! - Exact replacement instructions ([`Correction`]) for auto-fixes
//! - Optional cross-references (formula operator, documentation URL)
//! - A four-bucket [`ValidationResult`] aggregate

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::position::TextSpan;

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages
    Info,
    /// Hints for improvements
    Hint,
    /// Warnings that should be addressed
    Warning,
    /// Errors that must be fixed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Exact replacement instruction against the original buffer.
///
/// Lines are 1-indexed, columns 0-indexed, end column exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub file: String,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub replacement: String,
}

impl Correction {
    /// Replace the text covered by `span`
    pub fn replace(file: impl Into<String>, span: TextSpan, replacement: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            start_line: span.start_line,
            start_column: span.start_column,
            end_line: span.end_line,
            end_column: span.end_column,
            replacement: replacement.into(),
        }
    }

    /// Zero-width insertion at a point
    pub fn insert(
        file: impl Into<String>,
        line: usize,
        column: usize,
        text: impl Into<String>,
    ) -> Self {
        Self::replace(file, TextSpan::point(line, column), text)
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::new(
            self.start_line,
            self.start_column,
            self.end_line,
            self.end_column,
        )
    }

    /// `start <= end` in (line, column) order
    pub fn is_well_formed(&self) -> bool {
        self.start_line <= self.end_line
            && (self.start_line < self.end_line || self.start_column <= self.end_column)
    }

    pub fn is_insertion(&self) -> bool {
        self.start_line == self.end_line && self.start_column == self.end_column
    }
}

/// Another place in the input that a diagnostic refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLocation {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for RelatedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Represents a diagnostic message from validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMessage {
    /// Severity level of the diagnostic
    pub severity: Severity,
    /// Stable identifier of the check, e.g. `syntax/missing-semicolon`
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// File label the diagnostic belongs to
    pub file: String,
    /// Primary line (1-based)
    pub line: usize,
    /// Highlighted region, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<TextSpan>,
    /// Extra context, e.g. the offending value or the owning object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Human-readable fix suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-applicable fixes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub corrections: Vec<Correction>,
    /// Formula operator this diagnostic is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula_reference: Option<String>,
    /// Documentation link for the referenced operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    /// Produced by a cross-file check
    #[serde(default)]
    pub cross_file: bool,
    /// Other locations involved (e.g. every duplicate)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub related: Vec<RelatedLocation>,
}

impl ValidationMessage {
    /// Create a new diagnostic
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            file: file.into(),
            line,
            span: None,
            context: None,
            suggestion: None,
            corrections: Vec::new(),
            formula_reference: None,
            documentation_url: None,
            cross_file: false,
            related: Vec::new(),
        }
    }

    pub fn error(
        code: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self::new(Severity::Error, code, message, file, line)
    }

    pub fn warning(
        code: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self::new(Severity::Warning, code, message, file, line)
    }

    pub fn hint(
        code: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self::new(Severity::Hint, code, message, file, line)
    }

    pub fn info(
        code: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
    ) -> Self {
        Self::new(Severity::Info, code, message, file, line)
    }

    /// Attach a highlighted span; the primary line follows the span start
    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.line = span.start_line;
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_correction(mut self, correction: Correction) -> Self {
        debug_assert!(correction.is_well_formed());
        self.corrections.push(correction);
        self
    }

    pub fn with_formula_reference(
        mut self,
        operator: impl Into<String>,
        documentation_url: Option<String>,
    ) -> Self {
        self.formula_reference = Some(operator.into());
        self.documentation_url = documentation_url;
        self
    }

    pub fn with_related(mut self, related: Vec<RelatedLocation>) -> Self {
        self.related = related;
        self
    }

    pub fn cross_file(mut self) -> Self {
        self.cross_file = true;
        self
    }

    /// Start column of the primary span, if any
    pub fn column(&self) -> Option<usize> {
        self.span.map(|s| s.start_column)
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}[{}]: {}",
            self.file, self.line, self.severity, self.code, self.message
        )
    }
}

/// Issue found inside a property value by a nested parser.
///
/// `range` holds character offsets into the value text; the orchestrator maps
/// it back to file coordinates through [`crate::position::map_value_range`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub range: std::ops::Range<usize>,
    pub suggestion: Option<String>,
    /// Replacement for the text at `range`, when the fix is unambiguous
    pub replacement: Option<String>,
    /// Operator the issue is about (formula issues only)
    pub operator: Option<String>,
}

impl ValueIssue {
    pub fn new(
        severity: Severity,
        code: &'static str,
        message: impl Into<String>,
        range: std::ops::Range<usize>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            range,
            suggestion: None,
            replacement: None,
            operator: None,
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>, range: std::ops::Range<usize>) -> Self {
        Self::new(Severity::Error, code, message, range)
    }

    pub fn warning(
        code: &'static str,
        message: impl Into<String>,
        range: std::ops::Range<usize>,
    ) -> Self {
        Self::new(Severity::Warning, code, message, range)
    }

    pub fn info(code: &'static str, message: impl Into<String>, range: std::ops::Range<usize>) -> Self {
        Self::new(Severity::Info, code, message, range)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Shift the range by `offset` characters (for issues found in a slice)
    pub fn offset_by(mut self, offset: usize) -> Self {
        self.range = (self.range.start + offset)..(self.range.end + offset);
        self
    }
}

/// Aggregated output of a validation run, bucketed by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationMessage>,
    pub warnings: Vec<ValidationMessage>,
    pub hints: Vec<ValidationMessage>,
    pub info: Vec<ValidationMessage>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a message into the bucket matching its severity
    pub fn push(&mut self, message: ValidationMessage) {
        match message.severity {
            Severity::Error => self.errors.push(message),
            Severity::Warning => self.warnings.push(message),
            Severity::Hint => self.hints.push(message),
            Severity::Info => self.info.push(message),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
            && self.warnings.is_empty()
            && self.hints.is_empty()
            && self.info.is_empty()
    }

    pub fn total(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.hints.len() + self.info.len()
    }

    /// Every message, errors first
    pub fn iter(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .chain(&self.hints)
            .chain(&self.info)
    }

    /// Every correction carried by any message, in message order
    pub fn corrections(&self) -> impl Iterator<Item = &Correction> {
        self.iter().flat_map(|m| m.corrections.iter())
    }

    /// Messages at or above `min` severity
    pub fn at_least(&self, min: Severity) -> Vec<&ValidationMessage> {
        self.iter().filter(|m| m.severity >= min).collect()
    }
}

impl Extend<ValidationMessage> for ValidationResult {
    fn extend<T: IntoIterator<Item = ValidationMessage>>(&mut self, iter: T) {
        for message in iter {
            self.push(message);
        }
    }
}

impl FromIterator<ValidationMessage> for ValidationResult {
    fn from_iter<T: IntoIterator<Item = ValidationMessage>>(iter: T) -> Self {
        let mut result = ValidationResult::new();
        result.extend(iter);
        result
    }
}
