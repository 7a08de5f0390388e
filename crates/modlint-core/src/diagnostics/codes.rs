//! Stable diagnostic codes, grouped by the stage that emits them

// Object parser
pub const UNEXPECTED_TOKEN: &str = "syntax/unexpected-token";
pub const MISSING_TYPE_NAME: &str = "syntax/missing-type-name";
pub const MISSING_BRACKET: &str = "syntax/missing-bracket";
pub const MISSING_EQUALS: &str = "syntax/missing-equals";
pub const MISSING_SEMICOLON: &str = "syntax/missing-semicolon";

// Objects and properties
pub const UNKNOWN_OBJECT_TYPE: &str = "object/unknown-type";
pub const MISSING_ID: &str = "object/missing-id";
pub const CLONE_UNSUPPORTED: &str = "object/clone-unsupported";
pub const PARENT_ORDER: &str = "object/parent-order";
pub const UNKNOWN_PROPERTY: &str = "property/unknown";
pub const DUPLICATE_PROPERTY: &str = "property/duplicate";
pub const REPLACE_MARKER: &str = "property/replace-marker";
pub const DUPLICATE_ID: &str = "cross-file/duplicate-id";

// Value types
pub const INVALID_BOOLEAN: &str = "type/boolean";
pub const INVALID_INTEGER: &str = "type/integer";
pub const INVALID_FLOAT: &str = "type/float";
pub const INVALID_BYTE: &str = "type/byte";
pub const INVALID_VECTOR: &str = "type/vector";
pub const INVALID_RECTANGLE: &str = "type/rectangle";
pub const INVALID_ENUM: &str = "type/enum";

// Formulas
pub const FORMULA_SYNTAX: &str = "formula/syntax";
pub const UNKNOWN_OPERATOR: &str = "formula/unknown-operator";
pub const FORMULA_ARITY: &str = "formula/arity";
pub const FORMULA_ARGUMENT_TYPE: &str = "formula/argument-type";
pub const FORMULA_MISSING_BODY: &str = "formula/missing-body";
pub const CALLING_STYLE: &str = "formula/calling-style";
pub const UNKNOWN_SUB_OPERATOR: &str = "formula/unknown-sub-operator";
pub const ALTERNATE_DELIMITER: &str = "formula/alternate-delimiter";

// Dynamic text
pub const UNKNOWN_TAG: &str = "dynamic-text/unknown-tag";
pub const UNKNOWN_COMMAND: &str = "dynamic-text/unknown-command";
pub const TAG_ARITY: &str = "dynamic-text/arity";
pub const NESTED_BRACKETS: &str = "dynamic-text/nested-brackets";
pub const ZERO_ARG_STYLE: &str = "dynamic-text/zero-arg-style";
