//! Diagnostics: message model, stable codes and rendering

pub mod codes;
pub mod renderer;
pub mod types;

pub use renderer::{DiagnosticRenderer, OutputFormat};
pub use types::*;
