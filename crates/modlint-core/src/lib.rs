//! Modlint Core
//!
//! Validation engine for bracket/semicolon game mod files.
//! Parses `[Type] key = value;` objects, checks them against the schema
//! registries (object types, formula operators, dynamic-text tags) and
//! reports diagnostics with exact corrections.

pub mod autofix;
pub mod config;
pub mod console; // Terminal colors for rendered diagnostics
pub mod diagnostics;
pub mod dynamic_text;
pub mod error;
pub mod formula;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod position;
pub mod property;
pub mod result;
pub mod schema;
pub mod similarity;
pub mod validator;

// Re-export commonly used types
pub use autofix::{FixOutcome, apply_corrections, fix_file};
pub use config::{
    ConfigLoader, FilesConfiguration, LoadedConfig, ModlintConfig, SchemaConfiguration,
    ValidationConfiguration,
};
pub use console::{Color, Console};
pub use diagnostics::{
    Correction, DiagnosticRenderer, OutputFormat, RelatedLocation, Severity, ValidationMessage,
    ValidationResult, ValueIssue,
};
pub use dynamic_text::{DynamicTextValidator, Segment, Tag, parse_segments, validate_dynamic_text};
pub use error::{ErrorKind, ModlintError};
pub use formula::{AstNode, FormulaParseError, FormulaValidator, parse_formula, validate_ast};
pub use lexer::{Token, TokenKind, tokenize};
pub use object::{ParsedObject, PropertyInfo};
pub use parser::parse;
pub use position::{AbsolutePosition, LineSpan, TextSpan, map_value_range};
pub use property::PropertyValidator;
pub use result::Result;
pub use schema::{SchemaContext, SchemaPaths};
pub use similarity::{find_similar, format_suggestions};
pub use validator::{FileValidation, ValidationOptions, Validator};

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so they never mix with machine-readable output.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("modlint=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
