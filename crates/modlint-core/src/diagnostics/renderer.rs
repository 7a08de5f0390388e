//! Diagnostic renderer with terminal code frames and JSON output

use std::collections::HashMap;

use super::{Correction, Severity, ValidationMessage};
use crate::console::{Color, Console};

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text with colors and code frames
    Text,
    /// JSON for programmatic consumption
    Json,
    /// JSON with pretty-printing
    JsonPretty,
}

/// Renders [`ValidationMessage`]s against in-memory sources.
///
/// The core never reads files, so callers hand over the source text keyed by
/// the same file label the messages carry.
pub struct DiagnosticRenderer {
    console: Console,
    output_format: OutputFormat,
}

impl DiagnosticRenderer {
    /// Text output with automatic color detection
    pub fn new() -> Self {
        Self {
            console: Console::new(),
            output_format: OutputFormat::Text,
        }
    }

    pub fn no_colors() -> Self {
        Self {
            console: Console::no_colors(),
            output_format: OutputFormat::Text,
        }
    }

    pub fn with_format(format: OutputFormat) -> Self {
        let console = match format {
            OutputFormat::Json | OutputFormat::JsonPretty => Console::no_colors(),
            OutputFormat::Text => Console::new(),
        };
        Self {
            console,
            output_format: format,
        }
    }

    /// Replace the console (e.g. to force colors off for `--no-color`)
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Render a single message; `source` enables the code frame
    pub fn render(&self, message: &ValidationMessage, source: Option<&str>) -> String {
        match self.output_format {
            OutputFormat::Text => self.render_text(message, source),
            OutputFormat::Json => self.render_json(std::slice::from_ref(message), false),
            OutputFormat::JsonPretty => self.render_json(std::slice::from_ref(message), true),
        }
    }

    /// Render many messages; sources are looked up by the message's file
    pub fn render_all(
        &self,
        messages: &[ValidationMessage],
        sources: &HashMap<String, String>,
    ) -> String {
        match self.output_format {
            OutputFormat::Json => self.render_json(messages, false),
            OutputFormat::JsonPretty => self.render_json(messages, true),
            OutputFormat::Text => {
                let mut output = String::new();
                for (i, message) in messages.iter().enumerate() {
                    if i > 0 {
                        output.push('\n');
                    }
                    let source = sources.get(&message.file).map(String::as_str);
                    output.push_str(&self.render_text(message, source));
                }
                output
            }
        }
    }

    fn render_json(&self, messages: &[ValidationMessage], pretty: bool) -> String {
        let rendered = if pretty {
            serde_json::to_string_pretty(messages)
        } else {
            serde_json::to_string(messages)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {e}\"}}"))
    }

    fn render_text(&self, message: &ValidationMessage, source: Option<&str>) -> String {
        let mut output = String::new();

        output.push_str(&self.render_header(message));
        output.push('\n');

        match source.and_then(|s| self.render_code_frame(message, s)) {
            Some(frame) => output.push_str(&frame),
            None => {
                output.push_str(&format!(
                    "  {} {}\n",
                    self.console.colorize("→", Color::Blue),
                    self.console
                        .colorize(&format!("{}:{}", message.file, message.line), Color::Dim)
                ));
            }
        }

        if let Some(context) = &message.context {
            output.push_str(&self.note("context", context));
        }
        if let Some(suggestion) = &message.suggestion {
            output.push_str(&self.note("help", suggestion));
        }
        for related in &message.related {
            output.push_str(&self.note("see", &related.to_string()));
        }
        if let Some(url) = &message.documentation_url {
            output.push_str(&self.note("docs", url));
        }
        if let Some(source) = source {
            for correction in &message.corrections {
                output.push_str(&self.render_correction(correction, source));
            }
        }

        output
    }

    fn note(&self, label: &str, text: &str) -> String {
        format!(
            "  {} {}: {}\n",
            self.console.colorize("=", Color::Blue),
            self.console.colorize(label, Color::Bold),
            text
        )
    }

    fn severity_color(severity: Severity) -> Color {
        match severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Info => Color::Blue,
            Severity::Hint => Color::Cyan,
        }
    }

    /// `severity[code]: message`
    fn render_header(&self, message: &ValidationMessage) -> String {
        let severity = self.console.colorize(
            &message.severity.to_string(),
            Self::severity_color(message.severity),
        );
        let code = self
            .console
            .colorize(&format!("[{}]", message.code), Color::Dim);
        format!(
            "{}{}: {}",
            severity,
            code,
            self.console.colorize(&message.message, Color::Bold)
        )
    }

    /// ±2 lines around the primary line, carets under the span
    fn render_code_frame(&self, message: &ValidationMessage, source: &str) -> Option<String> {
        let lines: Vec<&str> = source.lines().collect();
        let error_line = message.line;
        if error_line == 0 || error_line > lines.len() {
            return None;
        }

        let start_line = error_line.saturating_sub(2).max(1);
        let end_line = (error_line + 2).min(lines.len());
        let gutter_width = end_line.to_string().len();
        let color = Self::severity_color(message.severity);

        let (caret_start, caret_len) = match message.span {
            Some(span) => {
                let line_len = lines[error_line - 1].chars().count();
                let end = if span.is_multiline() {
                    line_len
                } else {
                    span.end_column
                };
                (span.start_column, end.saturating_sub(span.start_column).max(1))
            }
            None => (0, 1),
        };

        let mut frame = String::new();
        frame.push_str(&format!(
            "  {}─[{}:{}:{}]\n",
            self.console.colorize("┌", Color::Blue),
            message.file,
            error_line,
            caret_start
        ));

        for line_num in start_line..=end_line {
            let content = lines[line_num - 1];
            let is_error_line = line_num == error_line;

            if is_error_line {
                frame.push_str(&self.console.colorize(">", color));
                frame.push(' ');
            } else {
                frame.push_str("  ");
            }
            frame.push_str(
                &self
                    .console
                    .colorize(&format!("{line_num:>gutter_width$}"), Color::Dim),
            );
            frame.push_str(&self.console.colorize(" │ ", Color::Dim));

            if is_error_line {
                frame.push_str(&self.highlight(content, caret_start, caret_len, color));
                frame.push('\n');
                frame.push_str("  ");
                frame.push_str(&" ".repeat(gutter_width));
                frame.push_str(&self.console.colorize(" │ ", Color::Dim));
                frame.push_str(&" ".repeat(caret_start));
                frame.push_str(&self.console.colorize(&"^".repeat(caret_len), color));
            } else {
                frame.push_str(content);
            }
            frame.push('\n');
        }

        Some(frame)
    }

    /// Colorize the characters `[col, col + len)` of `line`
    fn highlight(&self, line: &str, col: usize, len: usize, color: Color) -> String {
        let chars: Vec<char> = line.chars().collect();
        if col >= chars.len() {
            return line.to_string();
        }
        let end = (col + len).min(chars.len());
        let before: String = chars[..col].iter().collect();
        let marked: String = chars[col..end].iter().collect();
        let after: String = chars[end..].iter().collect();
        format!("{before}{}{after}", self.console.colorize(&marked, color))
    }

    /// Before/after preview of a single-line correction
    fn render_correction(&self, correction: &Correction, source: &str) -> String {
        let Some(original) = source.lines().nth(correction.start_line.saturating_sub(1)) else {
            return String::new();
        };

        if correction.end_line != correction.start_line {
            return format!(
                "  {} fix: replace lines {}-{} with {:?}\n",
                self.console.colorize("i", Color::Blue),
                correction.start_line,
                correction.end_line,
                correction.replacement
            );
        }

        let chars: Vec<char> = original.chars().collect();
        let start = correction.start_column.min(chars.len());
        let end = correction.end_column.clamp(start, chars.len());
        let modified: String = chars[..start]
            .iter()
            .copied()
            .chain(correction.replacement.chars())
            .chain(chars[end..].iter().copied())
            .collect();

        let number = self
            .console
            .colorize(&format!("{:>4}", correction.start_line), Color::Dim);
        format!(
            "  {} fix:\n    {number} │ {}{}\n    {number} │ {}{}\n",
            self.console.colorize("i", Color::Blue),
            self.console.colorize("- ", Color::Red),
            self.console.colorize(original, Color::Red),
            self.console.colorize("+ ", Color::Green),
            self.console.colorize(&modified, Color::Green),
        )
    }
}

impl Default for DiagnosticRenderer {
    fn default() -> Self {
        Self::new()
    }
}
