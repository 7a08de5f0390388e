//! Tag validation for dynamic text

use super::{Segment, Tag, TagArgument, parse_segments};
use crate::diagnostics::{ValueIssue, codes};
use crate::formula::{FormulaValidator, parse_formula};
use crate::schema::{SchemaContext, TagDef, TagTable};
use crate::similarity::{DEFAULT_MAX_DISTANCE, find_similar, format_suggestions};

/// Name of the tag whose first argument is a sub-command
pub const COMMAND_TAG: &str = "command";

/// Validate a dynamic-text value with default settings
pub fn validate_dynamic_text(value: &str, schema: &SchemaContext) -> Vec<ValueIssue> {
    DynamicTextValidator::new(schema).validate(value)
}

pub struct DynamicTextValidator<'a> {
    schema: &'a SchemaContext,
    max_distance: usize,
    style_hints: bool,
}

impl<'a> DynamicTextValidator<'a> {
    pub fn new(schema: &'a SchemaContext) -> Self {
        Self {
            schema,
            max_distance: DEFAULT_MAX_DISTANCE,
            style_hints: true,
        }
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Whether to report zero-argument tags written without a trailing `=`
    pub fn with_style_hints(mut self, enabled: bool) -> Self {
        self.style_hints = enabled;
        self
    }

    /// Issues for every tag in `value`; ranges are character offsets
    pub fn validate(&self, value: &str) -> Vec<ValueIssue> {
        let mut issues = Vec::new();
        for segment in parse_segments(value) {
            if let Segment::Tag(tag) = segment {
                self.check_tag(&tag, &mut issues);
            }
        }
        issues
    }

    fn check_tag(&self, tag: &Tag, issues: &mut Vec<ValueIssue>) {
        if tag.name.contains('<') {
            issues.push(nested_bracket(tag.range.clone()));
            return;
        }
        for arg in tag.args.iter().filter(|a| a.text.contains('<')) {
            issues.push(nested_bracket(arg.range.clone()));
        }

        let tags = &self.schema.dynamic_text.tags;
        let Some(def) = tags.resolve(&tag.name) else {
            let message = if tag.name.is_empty() {
                "Empty tag".to_string()
            } else {
                format!("Unknown tag '{}'", tag.name)
            };
            issues.push(self.unknown_name(
                codes::UNKNOWN_TAG,
                message,
                &tag.name,
                tags,
                tag.name_range.clone(),
            ));
            return;
        };

        if !def.name.eq_ignore_ascii_case(COMMAND_TAG) {
            self.check_arguments(&def.name, def, tag, &tag.args, issues);
            return;
        }

        let Some((command, rest)) = tag.args.split_first().filter(|(first, _)| !first.is_empty()) else {
            issues.push(ValueIssue::error(
                codes::TAG_ARITY,
                format!("Tag '{}' expects a command name", tag.name),
                tag.range.clone(),
            ));
            return;
        };
        let commands = &self.schema.dynamic_text.commands;
        let name = command.text.trim();
        match commands.resolve(name) {
            Some(sub) => {
                let label = format!("{}={}", tag.name, sub.name);
                self.check_arguments(&label, sub, tag, rest, issues);
            }
            None => {
                let leading = command.text.chars().take_while(|c| c.is_whitespace()).count();
                let start = command.range.start + leading;
                issues.push(self.unknown_name(
                    codes::UNKNOWN_COMMAND,
                    format!("Unknown command '{name}'"),
                    name,
                    commands,
                    start..start + name.chars().count(),
                ));
            }
        }
    }

    fn check_arguments(
        &self,
        label: &str,
        def: &TagDef,
        tag: &Tag,
        args: &[TagArgument],
        issues: &mut Vec<ValueIssue>,
    ) {
        let provided = args.len();
        // a trailing empty argument means "use the default", not an extra value
        let counted = match args.last() {
            Some(last) if last.is_empty() => provided - 1,
            _ => provided,
        };
        let required = def.required_args.len();
        let max = def.max_args();

        if counted > max {
            issues.push(ValueIssue::error(
                codes::TAG_ARITY,
                format!(
                    "'{label}' takes at most {max} {} but got {counted}",
                    plural(max)
                ),
                tag.range.clone(),
            ));
            return;
        }
        if provided < required {
            issues.push(ValueIssue::error(
                codes::TAG_ARITY,
                format!(
                    "'{label}' requires {required} {} but got {provided}",
                    plural(required)
                ),
                tag.range.clone(),
            ));
            return;
        }

        if self.style_hints && provided == 0 {
            issues.push(
                ValueIssue::info(
                    codes::ZERO_ARG_STYLE,
                    format!("Tags without arguments are written as <{}=>", tag.name),
                    tag.name_range.clone(),
                )
                .with_replacement(format!("{}=", tag.name)),
            );
        }

        for (index, arg) in args.iter().enumerate() {
            let is_formula = def.arg(index).is_some_and(|spec| spec.is_formula);
            if is_formula && !arg.is_empty() && !arg.text.contains('<') {
                self.check_formula(arg, issues);
            }
        }
    }

    fn check_formula(&self, arg: &TagArgument, issues: &mut Vec<ValueIssue>) {
        let offset = arg.range.start;
        match parse_formula(&arg.text) {
            Ok(ast) => {
                let validator =
                    FormulaValidator::new(&self.schema.formulas).with_max_distance(self.max_distance);
                issues.extend(
                    validator
                        .validate(&ast, false)
                        .into_iter()
                        .map(|issue| issue.offset_by(offset)),
                );
            }
            Err(err) => {
                let at = offset + err.offset().min(arg.text.chars().count());
                let end = (at + 1).min(arg.range.end).max(at);
                issues.push(ValueIssue::error(
                    codes::FORMULA_SYNTAX,
                    format!("Invalid formula in tag argument: {err}"),
                    at..end,
                ));
            }
        }
    }

    fn unknown_name(
        &self,
        code: &'static str,
        message: String,
        name: &str,
        table: &TagTable,
        range: std::ops::Range<usize>,
    ) -> ValueIssue {
        let matches = find_similar(name, table.names(), self.max_distance);
        let mut issue = ValueIssue::error(code, message, range);
        if let Some(text) = format_suggestions(&matches) {
            issue = issue.with_suggestion(format!("Did you mean {text}?"));
        }
        if let Some(best) = matches.first() {
            issue = issue.with_replacement(best.candidate.clone());
        }
        issue
    }
}

fn nested_bracket(range: std::ops::Range<usize>) -> ValueIssue {
    ValueIssue::warning(
        codes::NESTED_BRACKETS,
        "Nested angle brackets are not supported inside tags",
        range,
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "argument" } else { "arguments" }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJECTS: &str = r#"{ "objectTypes": {}, "classes": {} }"#;
    const FORMULAS: &str = r#"{ "operators": [
        { "name": "abs", "usages": [[ {"name":"value","type":"number"} ]] } ] }"#;
    const DYNAMIC_TEXT: &str = r#"{
        "tags": [
            { "name": "color", "aliases": ["c"], "requiredArgs": ["color"] },
            { "name": "command", "requiredArgs": ["command"] },
            { "name": "value", "requiredArgs": [ {"name":"formula","type":"formula"} ] },
            { "name": "br" },
            { "name": "icon", "optionalArgs": ["name", "size"] }
        ],
        "commands": [
            { "name": "heal", "requiredArgs": ["amount"], "optionalArgs": ["target"] }
        ]
    }"#;

    fn schema() -> SchemaContext {
        SchemaContext::from_json_strs(OBJECTS, FORMULAS, DYNAMIC_TEXT).unwrap()
    }

    fn check(value: &str) -> Vec<ValueIssue> {
        validate_dynamic_text(value, &schema())
    }

    fn codes_of(issues: &[ValueIssue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_valid_tags() {
        for value in [
            "<color=red=>",
            "<C=red>text",
            "<color=>",
            "<br=>",
            "<icon=sword=12>",
            "<command=heal=5>",
            "<command=HEAL=5=self>",
            "<value=abs:3>",
            "plain text with a < sign",
        ] {
            let issues = check(value);
            assert!(issues.is_empty(), "{value}: {issues:?}");
        }
    }

    #[test]
    fn test_unknown_tag_suggests() {
        let issues = check("hi <colr=red>");
        assert_eq!(codes_of(&issues), vec![codes::UNKNOWN_TAG]);
        assert_eq!(issues[0].range, 4..8);
        assert_eq!(issues[0].replacement.as_deref(), Some("color"));
    }

    #[test]
    fn test_too_many_arguments() {
        let issues = check("<color=red=blue>");
        assert_eq!(codes_of(&issues), vec![codes::TAG_ARITY]);
        assert!(issues[0].message.contains("at most 1 argument"));
        assert_eq!(issues[0].range, 0..16);
    }

    #[test]
    fn test_missing_required_argument() {
        assert_eq!(codes_of(&check("<color>")), vec![codes::TAG_ARITY]);
    }

    #[test]
    fn test_commands() {
        let issues = check("<command=hael=5>");
        assert_eq!(codes_of(&issues), vec![codes::UNKNOWN_COMMAND]);
        assert_eq!(issues[0].range, 9..13);
        assert_eq!(issues[0].replacement.as_deref(), Some("heal"));

        assert_eq!(codes_of(&check("<command=heal>")), vec![codes::TAG_ARITY]);
        assert_eq!(codes_of(&check("<command=heal=1=2=3>")), vec![codes::TAG_ARITY]);
        assert_eq!(codes_of(&check("<command>")), vec![codes::TAG_ARITY]);
    }

    #[test]
    fn test_nested_brackets_warn() {
        let issues = check("<color=<b>>");
        assert_eq!(codes_of(&issues), vec![codes::NESTED_BRACKETS]);
        assert_eq!(issues[0].severity, crate::diagnostics::Severity::Warning);
    }

    #[test]
    fn test_zero_argument_style_hint() {
        let issues = check("line<br>break");
        assert_eq!(codes_of(&issues), vec![codes::ZERO_ARG_STYLE]);
        assert_eq!(issues[0].severity, crate::diagnostics::Severity::Info);
        assert_eq!(issues[0].replacement.as_deref(), Some("br="));

        let quiet = DynamicTextValidator::new(&schema())
            .with_style_hints(false)
            .validate("line<br>break");
        assert!(quiet.is_empty());
    }

    #[test]
    fn test_formula_arguments_are_validated_in_place() {
        let issues = check("Deals <value=abs:foo> damage");
        assert_eq!(codes_of(&issues), vec![codes::FORMULA_ARGUMENT_TYPE]);
        assert_eq!(issues[0].range, 17..20);

        let issues = check("<value=abs:(1)>");
        assert_eq!(codes_of(&issues), vec![codes::FORMULA_SYNTAX]);
        assert_eq!(issues[0].range.start, 11);
    }
}
