//! Formula AST validation against operator metadata
//!
//! Checks, per call: the name resolves (with suggestions when it does not),
//! the calling convention matches the operator, alternate delimiters are
//! allowed, the non-formula argument count matches some usage, numeric
//! arguments are literals, and formula-valued arguments are valid formulas.
//! Operators with sub-operators (or delegating to one that has them) take a
//! sub-operator name as their first argument.
//!
//! Issue ranges are the AST nodes' own character spans.

use super::ast::{ArgValue, Argument, AstNode, CallStyle, FunctionCall, Span};
use crate::diagnostics::{ValueIssue, codes};
use crate::schema::{ArgKind, ArgSpec, FormulaSchema, OperatorDef};
use crate::similarity::{DEFAULT_MAX_DISTANCE, find_similar, format_suggestions};

/// Argument placeholder the engine substitutes later
pub const X_PLACEHOLDER: &str = "x";

/// Validate a parsed formula with default settings
pub fn validate_ast(node: &AstNode, schema: &FormulaSchema, allow_x: bool) -> Vec<ValueIssue> {
    FormulaValidator::new(schema).validate(node, allow_x)
}

/// Walks formula ASTs; holds no state between calls
pub struct FormulaValidator<'a> {
    schema: &'a FormulaSchema,
    max_distance: usize,
}

/// A non-formula argument, whether written in a chain or as a simple body
#[derive(Debug, Clone)]
struct PlainArg {
    text: String,
    is_number: bool,
    span: Span,
    delimiter: char,
    delimiter_offset: usize,
}

impl PlainArg {
    fn from_argument(arg: &Argument) -> Option<Self> {
        let (text, is_number) = match &arg.value {
            ArgValue::Number(text) => (text.clone(), true),
            ArgValue::Identifier(text) => (text.clone(), false),
            ArgValue::Formula(_) => return None,
        };
        Some(Self {
            text,
            is_number,
            span: arg.span,
            delimiter: arg.delimiter,
            delimiter_offset: arg.delimiter_offset,
        })
    }

    /// `f(5)`, `f(-5)` or `f(name)` on an operator without formula arguments
    fn from_simple_body(node: &AstNode, delimiter_offset: usize) -> Option<Self> {
        let (text, is_number) = match node {
            AstNode::Literal { value, .. } => (value.to_string(), true),
            AstNode::Unary { operand, .. } => match operand.as_ref() {
                AstNode::Literal { value, .. } => (format!("-{value}"), true),
                _ => return None,
            },
            AstNode::Variable { name, .. } => (name.clone(), false),
            _ => return None,
        };
        Some(Self {
            text,
            is_number,
            span: node.span(),
            delimiter: '(',
            delimiter_offset,
        })
    }
}

/// A parenthesized formula body
#[derive(Debug, Clone, Copy)]
struct Body<'n> {
    node: &'n AstNode,
    span: Span,
}

/// Naming for the call being checked
struct CallContext<'c> {
    /// How the call is named in messages (`m:hp` for sub-operators)
    label: String,
    /// Canonical top-level operator, for documentation links
    operator: &'c str,
    span: Span,
}

impl<'a> FormulaValidator<'a> {
    pub fn new(schema: &'a FormulaSchema) -> Self {
        Self {
            schema,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Every issue in the tree, in traversal order
    pub fn validate(&self, node: &AstNode, allow_x: bool) -> Vec<ValueIssue> {
        let mut issues = Vec::new();
        self.visit(node, allow_x, &mut issues);
        issues
    }

    fn visit(&self, node: &AstNode, allow_x: bool, issues: &mut Vec<ValueIssue>) {
        match node {
            AstNode::Literal { .. } | AstNode::Variable { .. } => {}
            AstNode::Unary { operand, .. } => self.visit(operand, allow_x, issues),
            AstNode::Binary { left, right, .. } => {
                self.visit(left, allow_x, issues);
                self.visit(right, allow_x, issues);
            }
            AstNode::Function(call) => self.check_call(call, allow_x, issues),
        }
    }

    fn check_call(&self, call: &FunctionCall, allow_x: bool, issues: &mut Vec<ValueIssue>) {
        let table = &self.schema.operators;
        let (plain, bodies) = split_args(call);

        let Some(op) = table.resolve(&call.name) else {
            issues.push(self.unknown_name(
                codes::UNKNOWN_OPERATOR,
                format!("Unknown operator '{}'", call.name),
                &call.name,
                table.names(),
                call.name_span,
            ));
            self.visit_bodies(&bodies, allow_x, issues);
            return;
        };

        self.check_style(call, op, issues);
        self.check_delimiters(call, op, issues);

        let namespace_owner = match &op.delegates_to {
            Some(delegate) => match table.resolve(delegate) {
                Some(target) if target.has_sub_operators() => Some(target),
                _ => {
                    tracing::warn!(
                        operator = %op.name,
                        delegate = %delegate,
                        "delegate operator missing or has no sub-operators"
                    );
                    self.visit_bodies(&bodies, allow_x, issues);
                    return;
                }
            },
            None if op.has_sub_operators() => Some(op),
            None => None,
        };

        let ctx = CallContext {
            label: call.name.clone(),
            operator: &op.name,
            span: call.span,
        };
        match namespace_owner {
            Some(owner) => self.check_sub_operator(&ctx, owner, plain, bodies, allow_x, issues),
            None => self.check_arguments(&ctx, op, plain, bodies, allow_x, issues),
        }
    }

    /// First argument names a sub-operator of `owner`; the rest belong to it
    fn check_sub_operator(
        &self,
        ctx: &CallContext<'_>,
        owner: &OperatorDef,
        plain: Vec<PlainArg>,
        bodies: Vec<Body<'_>>,
        allow_x: bool,
        issues: &mut Vec<ValueIssue>,
    ) {
        let mut plain = plain.into_iter();
        let Some(first) = plain.next() else {
            issues.push(
                ValueIssue::error(
                    codes::FORMULA_ARITY,
                    format!("'{}' expects a sub-operator argument", ctx.label),
                    ctx.span.range(),
                )
                .with_operator(ctx.operator),
            );
            self.visit_bodies(&bodies, allow_x, issues);
            return;
        };

        let sub = (!first.is_number)
            .then(|| owner.sub_operators.resolve(&first.text))
            .flatten();
        match sub {
            Some(sub) => {
                let sub_ctx = CallContext {
                    label: format!("{}:{}", ctx.label, sub.name),
                    operator: ctx.operator,
                    span: ctx.span,
                };
                self.check_arguments(&sub_ctx, sub, plain.collect(), bodies, allow_x, issues);
            }
            None => {
                let issue = self
                    .unknown_name(
                        codes::UNKNOWN_SUB_OPERATOR,
                        format!("Unknown sub-operator '{}' for '{}'", first.text, ctx.label),
                        &first.text,
                        owner.sub_operators.names(),
                        first.span,
                    )
                    .with_operator(ctx.operator);
                issues.push(issue);
                self.visit_bodies(&bodies, allow_x, issues);
            }
        }
    }

    fn check_arguments(
        &self,
        ctx: &CallContext<'_>,
        op: &OperatorDef,
        mut plain: Vec<PlainArg>,
        mut bodies: Vec<Body<'_>>,
        allow_x: bool,
        issues: &mut Vec<ValueIssue>,
    ) {
        if !op.takes_formula() {
            // A body on a plain operator is just one more argument
            for body in std::mem::take(&mut bodies) {
                match PlainArg::from_simple_body(body.node, body.span.start) {
                    Some(arg) => plain.push(arg),
                    None => {
                        issues.push(
                            ValueIssue::error(
                                codes::FORMULA_ARGUMENT_TYPE,
                                format!("'{}' takes plain values, not an expression", ctx.label),
                                body.span.range(),
                            )
                            .with_operator(ctx.operator),
                        );
                        self.visit(body.node, allow_x, issues);
                        // still occupies an argument slot for the arity check
                        plain.push(PlainArg {
                            text: String::new(),
                            is_number: true,
                            span: body.span,
                            delimiter: '(',
                            delimiter_offset: body.span.start,
                        });
                    }
                }
            }
        }

        // Colon form of a formula argument: surplus arguments form a nested call
        let mut nested = None;
        if op.takes_formula() && bodies.is_empty() {
            let split_at = op
                .usages
                .iter()
                .filter(|usage| usage.last().is_some_and(|a| a.kind == ArgKind::Formula))
                .map(|usage| usage.len() - 1)
                .filter(|&n| n < plain.len())
                .max();
            if let Some(n) = split_at {
                nested = Some(plain.split_off(n));
            }
        }

        let count = plain.len();
        let has_formula = !bodies.is_empty() || nested.is_some();
        let arities = op.arities();

        if !arities.contains(&count) {
            issues.push(
                ValueIssue::error(
                    codes::FORMULA_ARITY,
                    format!(
                        "'{}' expects {} but got {count}",
                        ctx.label,
                        describe_arities(&arities)
                    ),
                    ctx.span.range(),
                )
                .with_operator(ctx.operator),
            );
        } else if let Some(usage) = op.usage_for(count, has_formula) {
            let specs = usage.iter().filter(|a| a.kind != ArgKind::Formula);
            for (arg, spec) in plain.iter().zip(specs) {
                if spec.kind == ArgKind::Numeric {
                    self.check_numeric(ctx, spec, arg, allow_x, issues);
                }
            }

            let wants_formula = usage.last().is_some_and(|a| a.kind == ArgKind::Formula);
            if wants_formula && !has_formula {
                issues.push(
                    ValueIssue::error(
                        codes::FORMULA_MISSING_BODY,
                        format!("'{}' expects a formula as its last argument", ctx.label),
                        ctx.span.range(),
                    )
                    .with_operator(ctx.operator),
                );
            }
        }

        self.visit_bodies(&bodies, allow_x, issues);
        if let Some(nested) = nested {
            self.check_nested(&nested, allow_x, issues);
        }
    }

    /// Surplus chain arguments reinterpreted as `op:arg:...`
    fn check_nested(&self, args: &[PlainArg], allow_x: bool, issues: &mut Vec<ValueIssue>) {
        let Some((head, rest)) = args.split_first() else {
            return;
        };

        if head.is_number {
            if let Some(extra) = rest.first() {
                issues.push(ValueIssue::error(
                    codes::FORMULA_ARGUMENT_TYPE,
                    format!("Expected an operator name before '{}'", extra.text),
                    head.span.range(),
                ));
            }
            return;
        }

        // A lone name that is not an operator is a global formula reference
        if rest.is_empty() && self.schema.operators.resolve(&head.text).is_none() {
            return;
        }

        let end = rest.last().map_or(head.span.end, |a| a.span.end);
        let call = FunctionCall {
            name: head.text.clone(),
            name_span: head.span,
            args: rest
                .iter()
                .map(|arg| Argument {
                    value: if arg.is_number {
                        ArgValue::Number(arg.text.clone())
                    } else {
                        ArgValue::Identifier(arg.text.clone())
                    },
                    span: arg.span,
                    delimiter: arg.delimiter,
                    delimiter_offset: arg.delimiter_offset,
                })
                .collect(),
            style: CallStyle::Colon,
            span: Span::new(head.span.start, end),
        };
        self.check_call(&call, allow_x, issues);
    }

    fn check_numeric(
        &self,
        ctx: &CallContext<'_>,
        spec: &ArgSpec,
        arg: &PlainArg,
        allow_x: bool,
        issues: &mut Vec<ValueIssue>,
    ) {
        if arg.is_number || (allow_x && arg.text == X_PLACEHOLDER) {
            return;
        }
        let message = if arg.text == X_PLACEHOLDER {
            format!(
                "Placeholder 'x' is not allowed for argument '{}' of '{}' here",
                spec.name, ctx.label
            )
        } else {
            format!(
                "Argument '{}' of '{}' must be a number, got '{}'",
                spec.name, ctx.label, arg.text
            )
        };
        issues.push(
            ValueIssue::error(codes::FORMULA_ARGUMENT_TYPE, message, arg.span.range())
                .with_operator(ctx.operator),
        );
    }

    fn check_style(&self, call: &FunctionCall, op: &OperatorDef, issues: &mut Vec<ValueIssue>) {
        let message = match (op.function_style, call.style) {
            (true, CallStyle::Colon) => format!(
                "'{}' is a function-style operator; write {}(...)",
                call.name, call.name
            ),
            (false, CallStyle::Paren) => format!(
                "'{}' uses colon syntax; write {}:arg:...",
                call.name, call.name
            ),
            _ => return,
        };
        issues.push(
            ValueIssue::error(codes::CALLING_STYLE, message, call.span.range()).with_operator(&op.name),
        );
    }

    fn check_delimiters(&self, call: &FunctionCall, op: &OperatorDef, issues: &mut Vec<ValueIssue>) {
        for arg in &call.args {
            if matches!(arg.delimiter, ':' | '(') {
                continue;
            }
            let allowed = op
                .alternate_delimiters
                .iter()
                .any(|d| d.chars().eq(std::iter::once(arg.delimiter)));
            if !allowed {
                let start = arg.delimiter_offset;
                issues.push(
                    ValueIssue::error(
                        codes::ALTERNATE_DELIMITER,
                        format!(
                            "'{}' does not accept '{}' between arguments",
                            call.name, arg.delimiter
                        ),
                        start..start + 1,
                    )
                    .with_suggestion("Use ':' between arguments")
                    .with_replacement(":")
                    .with_operator(&op.name),
                );
            }
        }
    }

    fn visit_bodies(&self, bodies: &[Body<'_>], allow_x: bool, issues: &mut Vec<ValueIssue>) {
        for body in bodies {
            self.visit(body.node, allow_x, issues);
        }
    }

    fn unknown_name<'c>(
        &self,
        code: &'static str,
        message: String,
        name: &str,
        candidates: impl Iterator<Item = &'c str>,
        span: Span,
    ) -> ValueIssue {
        let matches = find_similar(name, candidates, self.max_distance);
        let mut issue = ValueIssue::error(code, message, span.range());
        if let Some(text) = format_suggestions(&matches) {
            issue = issue.with_suggestion(format!("Did you mean {text}?"));
        }
        if let Some(best) = matches.first() {
            issue = issue.with_replacement(best.candidate.clone());
        }
        issue
    }
}

fn split_args(call: &FunctionCall) -> (Vec<PlainArg>, Vec<Body<'_>>) {
    let mut plain = Vec::new();
    let mut bodies = Vec::new();
    for arg in &call.args {
        match &arg.value {
            ArgValue::Formula(node) => bodies.push(Body {
                node: node.as_ref(),
                span: arg.span,
            }),
            _ => plain.extend(PlainArg::from_argument(arg)),
        }
    }
    (plain, bodies)
}

/// `1 argument`, `2 arguments`, `1 or 2 arguments`
fn describe_arities(arities: &[usize]) -> String {
    let noun = if arities == [1] { "argument" } else { "arguments" };
    let numbers: Vec<String> = arities.iter().map(usize::to_string).collect();
    let joined = match numbers.as_slice() {
        [] => "no".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    };
    format!("{joined} {noun}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parse_formula;
    use std::path::Path;

    const FORMULAS: &str = r#"{
        "operators": [
            { "name": "abs", "usages": [[ {"name":"value","type":"number"} ]] },
            { "name": "between", "aliases": ["btw"], "alternateDelimiters": [","],
              "usages": [[ {"name":"min","type":"number"}, {"name":"max","type":"number"},
                           {"name":"target"}, {"name":"stat"} ]] },
            { "name": "repeat", "usages": [[ {"name":"times","type":"number"},
                                             {"name":"body","type":"formula"} ]] },
            { "name": "max", "functionStyle": true, "usages": [[ {"name":"body","type":"formula"} ]] },
            { "name": "round", "functionStyle": true, "usages": [[ {"name":"value","type":"number"} ]] },
            { "name": "m", "subOperators": [
                { "name": "hp", "aliases": ["health"] },
                { "name": "stat", "usages": [[ {"name":"name"} ]] } ] },
            { "name": "mIs0", "delegatesTo": "m" },
            { "name": "turn" }
        ]
    }"#;

    fn schema() -> FormulaSchema {
        FormulaSchema::from_json(FORMULAS, Path::new("formulas.json")).unwrap()
    }

    fn check(text: &str, allow_x: bool) -> Vec<ValueIssue> {
        let ast = parse_formula(text).unwrap();
        validate_ast(&ast, &schema(), allow_x)
    }

    fn codes_of(issues: &[ValueIssue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_valid_formulas() {
        for text in [
            "abs:5",
            "abs:-2.5 * 3",
            "btw:1:2:c:STR",
            "between:1,2:c:STR",
            "turn: + 1",
            "level * 2",
            "m:hp",
            "m:health + m:stat:STR",
            "mIs0:hp",
            "max(abs:1 + 2)",
            "round(4)",
        ] {
            let issues = check(text, false);
            assert!(issues.is_empty(), "{text}: {issues:?}");
        }
    }

    #[test]
    fn test_missing_argument_is_arity_error() {
        let issues = check("between:10:c:STR", false);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::FORMULA_ARITY);
        assert!(issues[0].message.contains("argument"));
        assert_eq!(issues[0].range, 0..16);
        assert_eq!(issues[0].operator.as_deref(), Some("between"));
    }

    #[test]
    fn test_unknown_operator_suggests() {
        let issues = check("abz:1", false);
        assert_eq!(codes_of(&issues), vec![codes::UNKNOWN_OPERATOR]);
        assert_eq!(issues[0].range, 0..3);
        assert_eq!(issues[0].replacement.as_deref(), Some("abs"));
        assert!(issues[0].suggestion.as_deref().unwrap().contains("'abs'"));
    }

    #[test]
    fn test_repeated_operator_uses_own_spans() {
        let issues = check("abz:1 + abz:2", false);
        let ranges: Vec<_> = issues.iter().map(|i| i.range.clone()).collect();
        assert_eq!(ranges, vec![0..3, 8..11]);

        let issues = check("abs:1+abs:y", false);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].range, 10..11);
    }

    #[test]
    fn test_numeric_arguments_must_be_literals() {
        let issues = check("abs:foo", false);
        assert_eq!(codes_of(&issues), vec![codes::FORMULA_ARGUMENT_TYPE]);
        assert!(issues[0].message.contains("must be a number"));
    }

    #[test]
    fn test_x_placeholder() {
        assert_eq!(codes_of(&check("abs:x", false)), vec![codes::FORMULA_ARGUMENT_TYPE]);
        assert!(check("abs:x", true).is_empty());
        assert!(check("between:x:10:c:STR", true).is_empty());
    }

    #[test]
    fn test_formula_valued_argument_in_chain() {
        assert!(check("repeat:3:abs:5", false).is_empty());
        assert!(check("repeat:3:level", false).is_empty());

        let issues = check("repeat:3:abs:foo", false);
        assert_eq!(codes_of(&issues), vec![codes::FORMULA_ARGUMENT_TYPE]);
        assert_eq!(issues[0].range, 13..16);

        let issues = check("repeat:3:abz:1", false);
        assert_eq!(codes_of(&issues), vec![codes::UNKNOWN_OPERATOR]);
        assert_eq!(issues[0].range, 9..12);
    }

    #[test]
    fn test_formula_argument_missing() {
        let issues = check("repeat:3", false);
        assert_eq!(codes_of(&issues), vec![codes::FORMULA_MISSING_BODY]);
    }

    #[test]
    fn test_calling_style_mismatch() {
        assert_eq!(codes_of(&check("abs(5)", false)), vec![codes::CALLING_STYLE]);
        let issues = check("max:1", false);
        assert!(codes_of(&issues).contains(&codes::CALLING_STYLE));
    }

    #[test]
    fn test_expression_body_on_plain_operator() {
        let issues = check("round(abs:1 + 2)", false);
        assert_eq!(codes_of(&issues), vec![codes::FORMULA_ARGUMENT_TYPE]);
    }

    #[test]
    fn test_nested_body_is_validated() {
        let issues = check("max(abs:foo)", false);
        assert_eq!(codes_of(&issues), vec![codes::FORMULA_ARGUMENT_TYPE]);
        assert_eq!(issues[0].range, 8..11);
    }

    #[test]
    fn test_alternate_delimiter_not_allowed() {
        let issues = check("abs:1,2", false);
        assert!(codes_of(&issues).contains(&codes::ALTERNATE_DELIMITER));
        let delimiter = issues
            .iter()
            .find(|i| i.code == codes::ALTERNATE_DELIMITER)
            .unwrap();
        assert_eq!(delimiter.range, 5..6);
        assert_eq!(delimiter.replacement.as_deref(), Some(":"));
    }

    #[test]
    fn test_sub_operators() {
        let issues = check("m:hq", false);
        assert_eq!(codes_of(&issues), vec![codes::UNKNOWN_SUB_OPERATOR]);
        assert_eq!(issues[0].range, 2..4);
        assert_eq!(issues[0].replacement.as_deref(), Some("hp"));

        assert_eq!(codes_of(&check("m:stat", false)), vec![codes::FORMULA_ARITY]);
        assert_eq!(codes_of(&check("m", false)), Vec::<&str>::new());
        assert_eq!(codes_of(&check("m:", false)), vec![codes::FORMULA_ARITY]);
    }

    #[test]
    fn test_delegation_uses_delegate_namespace() {
        let issues = check("mIs0:hq", false);
        assert_eq!(codes_of(&issues), vec![codes::UNKNOWN_SUB_OPERATOR]);
        assert_eq!(issues[0].operator.as_deref(), Some("mIs0"));
    }

    #[test]
    fn test_describe_arities() {
        assert_eq!(describe_arities(&[1]), "1 argument");
        assert_eq!(describe_arities(&[4]), "4 arguments");
        assert_eq!(describe_arities(&[0, 2]), "0 or 2 arguments");
    }
}
