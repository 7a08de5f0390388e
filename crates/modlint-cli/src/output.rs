//! Output formatting and reporting

use anyhow::{Context, Result};
use colored::*;
use modlint_core::{DiagnosticRenderer, Severity, ValidationMessage};
use std::collections::HashMap;

use crate::OutputFormat;

/// Summary statistics for a check run
#[derive(Debug, Clone, Default)]
pub struct CheckSummary {
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub hints: usize,
    pub info: usize,
    pub fixes_applied: usize,
    /// Fixes were computed but not written
    pub dry_run: bool,
}

impl CheckSummary {
    pub fn total_issues(&self) -> usize {
        self.errors + self.warnings + self.hints + self.info
    }

    pub fn has_issues(&self) -> bool {
        self.total_issues() > 0
    }
}

/// Output formatter for the supported formats
pub struct OutputFormatter {
    format: OutputFormat,
    use_colors: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        Self { format, use_colors }
    }

    /// Print the reported messages and the run summary
    pub fn print_results(
        &self,
        messages: &[ValidationMessage],
        sources: &HashMap<String, String>,
        summary: &CheckSummary,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                self.print_human_format(messages, sources, summary);
                Ok(())
            }
            OutputFormat::Json => self.print_json_format(messages, summary),
            OutputFormat::Github => {
                for message in messages {
                    println!("{}", github_annotation(message));
                }
                Ok(())
            }
        }
    }

    fn print_human_format(
        &self,
        messages: &[ValidationMessage],
        sources: &HashMap<String, String>,
        summary: &CheckSummary,
    ) {
        if !messages.is_empty() {
            let renderer = if self.use_colors {
                DiagnosticRenderer::new()
            } else {
                DiagnosticRenderer::no_colors()
            };
            println!("{}", renderer.render_all(messages, sources));
        }

        println!("{}", "Summary:".bold());
        println!("  Files checked: {}", summary.files_checked);

        if summary.has_issues() {
            println!("  Issues found:");
            if summary.errors > 0 {
                println!("    Errors: {}", summary.errors.to_string().red());
            }
            if summary.warnings > 0 {
                println!("    Warnings: {}", summary.warnings.to_string().yellow());
            }
            if summary.hints > 0 {
                println!("    Hints: {}", summary.hints.to_string().cyan());
            }
            if summary.info > 0 {
                println!("    Info: {}", summary.info.to_string().blue());
            }
        } else {
            println!("  {}", "No issues found".green());
        }

        if summary.fixes_applied > 0 {
            let label = if summary.dry_run {
                "Fixes that would be applied"
            } else {
                "Fixes applied"
            };
            println!("  {label}: {}", summary.fixes_applied.to_string().green());
        }
    }

    fn print_json_format(&self, messages: &[ValidationMessage], summary: &CheckSummary) -> Result<()> {
        let report = json_report(messages, summary)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize JSON")?
        );
        Ok(())
    }
}

/// Machine-readable report: every issue plus the run summary
fn json_report(messages: &[ValidationMessage], summary: &CheckSummary) -> Result<serde_json::Value> {
    let issues = serde_json::to_value(messages).context("failed to serialize diagnostics")?;
    Ok(serde_json::json!({
        "files_checked": summary.files_checked,
        "issues": issues,
        "summary": {
            "errors": summary.errors,
            "warnings": summary.warnings,
            "hints": summary.hints,
            "info": summary.info,
            "total": summary.total_issues(),
            "fixes_applied": summary.fixes_applied,
            "dry_run": summary.dry_run
        }
    }))
}

/// `::error file=...,line=...,col=...::message (code)`; columns are 1-based
fn github_annotation(message: &ValidationMessage) -> String {
    let level = match message.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Hint | Severity::Info => "notice",
    };
    let mut properties = format!("file={},line={}", message.file, message.line);
    if let Some(span) = message.span {
        properties.push_str(&format!(",col={}", span.start_column + 1));
        if span.end_line == span.start_line {
            properties.push_str(&format!(",endColumn={}", span.end_column + 1));
        } else {
            properties.push_str(&format!(",endLine={}", span.end_line));
        }
    }
    format!("::{level} {properties}::{} ({})", message.message, message.code)
}
