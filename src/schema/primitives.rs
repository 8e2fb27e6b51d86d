//! Leaf schemas: string, number, boolean, null, any, literal, enum
//!
//! The `check_*` functions here are shared by the interpreter and the
//! compiled path, so both produce identical outputs and issues.

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

use super::definition::SchemaDefinition;
use super::formats::StringFormat;
use super::{Checked, Schema};
use crate::error::{json_type_name, IssueCode, Issues, ValidationError, ValidationIssue};

// ============================================================================
// String
// ============================================================================

/// Compiled regex that serializes as its pattern
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.0.as_str())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

/// One string check or normalization, applied in declaration order
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "check", content = "value", rename_all = "snake_case")]
pub enum StringCheck {
    MinLength(usize),
    MaxLength(usize),
    Length(usize),
    Format(StringFormat),
    Regex(Pattern),
    StartsWith(String),
    EndsWith(String),
    Includes(String),
    Trim,
    ToLowerCase,
    ToUpperCase,
}

#[derive(Debug, Clone)]
pub struct StringSchema {
    checks: Vec<StringCheck>,
    coerce: bool,
}

/// String schema
pub fn string() -> StringSchema {
    StringSchema {
        checks: Vec::new(),
        coerce: false,
    }
}

impl StringSchema {
    /// Convert numbers, booleans and `null` to their string form first
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

fn coerce_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

pub(crate) fn check_string(checks: &[StringCheck], coerce: bool, input: Option<&Value>) -> Checked {
    let mut s = match input {
        Some(Value::String(s)) => s.clone(),
        Some(value) if coerce => match coerce_to_string(value) {
            Some(s) => s,
            None => return Err(ValidationError::new(ValidationIssue::type_mismatch("string", input))),
        },
        other => return Err(ValidationError::new(ValidationIssue::type_mismatch("string", other))),
    };

    let mut issues = Issues::new();
    for check in checks {
        let len = s.chars().count();
        match check {
            StringCheck::MinLength(min) if len < *min => issues.push(
                ValidationIssue::new(
                    IssueCode::TooSmall,
                    format!("String must contain at least {} character(s)", min),
                )
                .with_values(format!(">= {}", min), len.to_string()),
            ),
            StringCheck::MaxLength(max) if len > *max => issues.push(
                ValidationIssue::new(
                    IssueCode::TooBig,
                    format!("String must contain at most {} character(s)", max),
                )
                .with_values(format!("<= {}", max), len.to_string()),
            ),
            StringCheck::Length(exact) if len != *exact => {
                let code = if len < *exact {
                    IssueCode::TooSmall
                } else {
                    IssueCode::TooBig
                };
                issues.push(
                    ValidationIssue::new(
                        code,
                        format!("String must contain exactly {} character(s)", exact),
                    )
                    .with_values(exact.to_string(), len.to_string()),
                );
            }
            StringCheck::Format(format) if !format.matches(&s) => issues.push(
                ValidationIssue::new(IssueCode::InvalidString, format!("Invalid {}", format.name()))
                    .with_values(format.name(), "string"),
            ),
            StringCheck::Regex(pattern) if !pattern.0.is_match(&s) => issues.push(
                ValidationIssue::new(
                    IssueCode::InvalidString,
                    format!("String does not match pattern {}", pattern.as_str()),
                )
                .with_values(pattern.as_str(), "string"),
            ),
            StringCheck::StartsWith(prefix) if !s.starts_with(prefix.as_str()) => issues.push(
                ValidationIssue::new(
                    IssueCode::InvalidString,
                    format!("String must start with \"{}\"", prefix),
                ),
            ),
            StringCheck::EndsWith(suffix) if !s.ends_with(suffix.as_str()) => issues.push(
                ValidationIssue::new(
                    IssueCode::InvalidString,
                    format!("String must end with \"{}\"", suffix),
                ),
            ),
            StringCheck::Includes(needle) if !s.contains(needle.as_str()) => issues.push(
                ValidationIssue::new(
                    IssueCode::InvalidString,
                    format!("String must include \"{}\"", needle),
                ),
            ),
            StringCheck::Trim => s = s.trim().to_string(),
            StringCheck::ToLowerCase => s = s.to_lowercase(),
            StringCheck::ToUpperCase => s = s.to_uppercase(),
            _ => {}
        }
    }
    issues.finish(Some(Value::String(s)))
}

impl Schema for StringSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::String {
            checks: self.checks.clone(),
            coerce: self.coerce,
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        check_string(&self.checks, self.coerce, input)
    }
}

/// Fluent string checks, also reachable through wrappers
pub trait StringChecks: Sized {
    fn with_string_check(self, check: StringCheck) -> Self;

    fn min_length(self, min: usize) -> Self {
        self.with_string_check(StringCheck::MinLength(min))
    }

    fn max_length(self, max: usize) -> Self {
        self.with_string_check(StringCheck::MaxLength(max))
    }

    fn length(self, exact: usize) -> Self {
        self.with_string_check(StringCheck::Length(exact))
    }

    fn email(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::Email))
    }

    fn url(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::Url))
    }

    fn uuid(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::Uuid))
    }

    fn datetime(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::DateTime))
    }

    fn date(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::Date))
    }

    fn time(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::Time))
    }

    fn ipv4(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::Ipv4))
    }

    fn ipv6(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::Ipv6))
    }

    fn hostname(self) -> Self {
        self.with_string_check(StringCheck::Format(StringFormat::Hostname))
    }

    /// Require a match against an already-compiled regex
    fn regex(self, pattern: Regex) -> Self {
        self.with_string_check(StringCheck::Regex(Pattern(pattern)))
    }

    fn starts_with(self, prefix: impl Into<String>) -> Self {
        self.with_string_check(StringCheck::StartsWith(prefix.into()))
    }

    fn ends_with(self, suffix: impl Into<String>) -> Self {
        self.with_string_check(StringCheck::EndsWith(suffix.into()))
    }

    fn includes(self, needle: impl Into<String>) -> Self {
        self.with_string_check(StringCheck::Includes(needle.into()))
    }

    fn trim(self) -> Self {
        self.with_string_check(StringCheck::Trim)
    }

    fn to_lower_case(self) -> Self {
        self.with_string_check(StringCheck::ToLowerCase)
    }

    fn to_upper_case(self) -> Self {
        self.with_string_check(StringCheck::ToUpperCase)
    }
}

impl StringChecks for StringSchema {
    fn with_string_check(mut self, check: StringCheck) -> Self {
        self.checks.push(check);
        self
    }
}

// ============================================================================
// Number
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum NumberCheck {
    Min {
        #[serde(serialize_with = "serialize_bound")]
        value: f64,
        inclusive: bool,
    },
    Max {
        #[serde(serialize_with = "serialize_bound")]
        value: f64,
        inclusive: bool,
    },
    Int,
    MultipleOf {
        #[serde(serialize_with = "serialize_bound")]
        value: f64,
    },
}

/// JSON has no non-finite numbers; write them as tagged strings so
/// `inf`, `-inf` and `nan` bounds keep distinct fingerprints
fn serialize_bound<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

#[derive(Debug, Clone)]
pub struct NumberSchema {
    checks: Vec<NumberCheck>,
    coerce: bool,
}

/// Finite number schema
pub fn number() -> NumberSchema {
    NumberSchema {
        checks: Vec::new(),
        coerce: false,
    }
}

/// Shorthand for `number().int()`
pub fn integer() -> NumberSchema {
    number().int()
}

impl NumberSchema {
    /// Parse numeric strings and map booleans to 0/1 first
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

fn coerce_to_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::Bool(b) => Some(Number::from(u8::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Some(Number::from(i))
            } else {
                trimmed.parse::<f64>().ok().and_then(Number::from_f64)
            }
        }
        _ => None,
    }
}

fn is_multiple_of(n: f64, step: f64) -> bool {
    if step == 0.0 {
        return false;
    }
    let quotient = n / step;
    (quotient - quotient.round()).abs() < 1e-9
}

pub(crate) fn check_number(checks: &[NumberCheck], coerce: bool, input: Option<&Value>) -> Checked {
    let number = match input {
        Some(Value::Number(n)) => n.clone(),
        Some(value) if coerce => match coerce_to_number(value) {
            Some(n) => n,
            None => return Err(ValidationError::new(ValidationIssue::type_mismatch("number", input))),
        },
        other => return Err(ValidationError::new(ValidationIssue::type_mismatch("number", other))),
    };

    let Some(n) = number.as_f64().filter(|n| n.is_finite()) else {
        return Err(ValidationError::new(
            ValidationIssue::new(IssueCode::InvalidType, "Expected finite number")
                .with_values("number", "infinity"),
        ));
    };

    let mut issues = Issues::new();
    for check in checks {
        match check {
            NumberCheck::Min { value, inclusive } => {
                let ok = if *inclusive { n >= *value } else { n > *value };
                if !ok {
                    let relation = if *inclusive { "greater than or equal to" } else { "greater than" };
                    issues.push(
                        ValidationIssue::new(
                            IssueCode::TooSmall,
                            format!("Number must be {} {}", relation, value),
                        )
                        .with_values(
                            format!("{} {}", if *inclusive { ">=" } else { ">" }, value),
                            n.to_string(),
                        ),
                    );
                }
            }
            NumberCheck::Max { value, inclusive } => {
                let ok = if *inclusive { n <= *value } else { n < *value };
                if !ok {
                    let relation = if *inclusive { "less than or equal to" } else { "less than" };
                    issues.push(
                        ValidationIssue::new(
                            IssueCode::TooBig,
                            format!("Number must be {} {}", relation, value),
                        )
                        .with_values(
                            format!("{} {}", if *inclusive { "<=" } else { "<" }, value),
                            n.to_string(),
                        ),
                    );
                }
            }
            NumberCheck::Int if n.fract() != 0.0 => issues.push(
                ValidationIssue::new(IssueCode::InvalidType, "Expected integer, received float")
                    .with_values("integer", "float"),
            ),
            NumberCheck::MultipleOf { value } if !is_multiple_of(n, *value) => issues.push(
                ValidationIssue::new(
                    IssueCode::NotMultipleOf,
                    format!("Number must be a multiple of {}", value),
                )
                .with_values(format!("multiple of {}", value), n.to_string()),
            ),
            _ => {}
        }
    }
    issues.finish(Some(Value::Number(number)))
}

impl Schema for NumberSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Number {
            checks: self.checks.clone(),
            coerce: self.coerce,
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        check_number(&self.checks, self.coerce, input)
    }
}

/// Fluent numeric checks, also reachable through wrappers
pub trait NumberChecks: Sized {
    fn with_number_check(self, check: NumberCheck) -> Self;

    /// Inclusive lower bound
    fn min(self, value: f64) -> Self {
        self.with_number_check(NumberCheck::Min {
            value,
            inclusive: true,
        })
    }

    /// Inclusive upper bound
    fn max(self, value: f64) -> Self {
        self.with_number_check(NumberCheck::Max {
            value,
            inclusive: true,
        })
    }

    fn gt(self, value: f64) -> Self {
        self.with_number_check(NumberCheck::Min {
            value,
            inclusive: false,
        })
    }

    fn lt(self, value: f64) -> Self {
        self.with_number_check(NumberCheck::Max {
            value,
            inclusive: false,
        })
    }

    fn int(self) -> Self {
        self.with_number_check(NumberCheck::Int)
    }

    fn positive(self) -> Self {
        self.gt(0.0)
    }

    fn negative(self) -> Self {
        self.lt(0.0)
    }

    fn nonnegative(self) -> Self {
        self.min(0.0)
    }

    fn nonpositive(self) -> Self {
        self.max(0.0)
    }

    fn multiple_of(self, value: f64) -> Self {
        self.with_number_check(NumberCheck::MultipleOf { value })
    }
}

impl NumberChecks for NumberSchema {
    fn with_number_check(mut self, check: NumberCheck) -> Self {
        self.checks.push(check);
        self
    }
}

// ============================================================================
// Boolean, null, any
// ============================================================================

#[derive(Debug, Clone)]
pub struct BooleanSchema {
    coerce: bool,
}

pub fn boolean() -> BooleanSchema {
    BooleanSchema { coerce: false }
}

impl BooleanSchema {
    /// Use truthiness: `false`, `0`, `""` and `null` are false, anything else true
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn check_boolean(coerce: bool, input: Option<&Value>) -> Checked {
    match input {
        Some(Value::Bool(b)) => Ok(Some(Value::Bool(*b))),
        Some(value) if coerce => Ok(Some(Value::Bool(truthy(value)))),
        other => Err(ValidationError::new(ValidationIssue::type_mismatch("boolean", other))),
    }
}

impl Schema for BooleanSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Boolean {
            coerce: self.coerce,
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        check_boolean(self.coerce, input)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NullSchema;

pub fn null() -> NullSchema {
    NullSchema
}

pub(crate) fn check_null(input: Option<&Value>) -> Checked {
    match input {
        Some(Value::Null) => Ok(Some(Value::Null)),
        other => Err(ValidationError::new(ValidationIssue::type_mismatch("null", other))),
    }
}

impl Schema for NullSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Null
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        check_null(input)
    }
}

/// Accepts anything, including an absent value
#[derive(Debug, Clone, Copy)]
pub struct AnySchema;

pub fn any() -> AnySchema {
    AnySchema
}

impl Schema for AnySchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Any
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        Ok(input.cloned())
    }
}

// ============================================================================
// Literal, enum
// ============================================================================

#[derive(Debug, Clone)]
pub struct LiteralSchema {
    value: Value,
}

/// Exactly `value`
pub fn literal(value: impl Into<Value>) -> LiteralSchema {
    LiteralSchema {
        value: value.into(),
    }
}

pub(crate) fn check_literal(expected: &Value, input: Option<&Value>) -> Checked {
    match input {
        Some(value) if value == expected => Ok(Some(value.clone())),
        None => Err(ValidationError::new(ValidationIssue::required(&expected.to_string()))),
        Some(value) => Err(ValidationError::new(
            ValidationIssue::new(
                IssueCode::InvalidLiteral,
                format!("Invalid literal value, expected {}", expected),
            )
            .with_values(expected.to_string(), value.to_string()),
        )),
    }
}

impl Schema for LiteralSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Literal {
            value: self.value.clone(),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        check_literal(&self.value, input)
    }
}

#[derive(Debug, Clone)]
pub struct EnumSchema {
    values: Vec<String>,
}

/// One of a fixed set of strings
pub fn enumeration<I, S>(values: I) -> EnumSchema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    EnumSchema {
        values: values.into_iter().map(Into::into).collect(),
    }
}

impl EnumSchema {
    pub fn options(&self) -> &[String] {
        &self.values
    }
}

pub(crate) fn check_enum(values: &[String], input: Option<&Value>) -> Checked {
    match input {
        Some(Value::String(s)) if values.iter().any(|v| v == s) => Ok(Some(Value::String(s.clone()))),
        Some(value) => {
            let options = values
                .iter()
                .map(|v| format!("'{}'", v))
                .collect::<Vec<_>>()
                .join(" | ");
            let received = match value {
                Value::String(s) => format!("'{}'", s),
                other => json_type_name(Some(other)).to_string(),
            };
            Err(ValidationError::new(
                ValidationIssue::new(
                    IssueCode::InvalidEnumValue,
                    format!("Invalid enum value. Expected {}, received {}", options, received),
                )
                .with_values(options, received),
            ))
        }
        None => Err(ValidationError::new(ValidationIssue::required("enum"))),
    }
}

impl Schema for EnumSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Enum {
            values: self.values.clone(),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        check_enum(&self.values, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_type_and_required() {
        let schema = string();
        assert_eq!(schema.validate(&json!("hi")).unwrap(), json!("hi"));

        let err = schema.validate(&json!(5)).unwrap_err();
        assert_eq!(err.first().code, IssueCode::InvalidType);
        assert_eq!(err.first().received.as_deref(), Some("number"));

        let err = schema.validate_input(None).unwrap_err();
        assert_eq!(err.first().code, IssueCode::Required);
    }

    #[test]
    fn test_string_collects_all_check_failures() {
        let schema = string().min_length(5).email();
        let err = schema.validate(&json!("ab")).unwrap_err();
        let codes: Vec<_> = err.issues().iter().map(|i| i.code).collect();
        assert_eq!(codes, vec![IssueCode::TooSmall, IssueCode::InvalidString]);
    }

    #[test]
    fn test_string_length_counts_characters() {
        let schema = string().max_length(3);
        assert!(schema.validate(&json!("héé")).is_ok());
        assert!(schema.validate(&json!("héllo")).is_err());
    }

    #[test]
    fn test_string_normalizers_run_in_order() {
        let schema = string().trim().min_length(2).to_lower_case();
        assert_eq!(schema.validate(&json!("  AB  ")).unwrap(), json!("ab"));
        assert!(schema.validate(&json!("  a  ")).is_err());
    }

    #[test]
    fn test_string_regex_and_affixes() {
        let schema = string()
            .regex(Regex::new(r"^[a-z]+-\d+$").unwrap())
            .starts_with("sku")
            .ends_with("7");
        assert!(schema.validate(&json!("sku-17")).is_ok());
        assert_eq!(schema.validate(&json!("abc-12")).unwrap_err().len(), 2);
    }

    #[test]
    fn test_string_coercion() {
        let schema = string().coerce();
        assert_eq!(schema.validate(&json!(42)).unwrap(), json!("42"));
        assert_eq!(schema.validate(&json!(true)).unwrap(), json!("true"));
        assert!(schema.validate(&json!([1])).is_err());
        assert!(string().validate(&json!(42)).is_err());
    }

    #[test]
    fn test_number_bounds() {
        let schema = number().min(1.0).max(10.0);
        assert!(schema.validate(&json!(1)).is_ok());
        assert!(schema.validate(&json!(10)).is_ok());

        let err = schema.validate(&json!(0)).unwrap_err();
        assert_eq!(err.first().code, IssueCode::TooSmall);
        assert_eq!(err.first().message, "Number must be greater than or equal to 1");

        let err = number().lt(5.0).validate(&json!(5)).unwrap_err();
        assert_eq!(err.first().code, IssueCode::TooBig);
    }

    #[test]
    fn test_number_int_and_multiple_of() {
        assert!(integer().validate(&json!(3)).is_ok());
        assert_eq!(
            integer().validate(&json!(3.5)).unwrap_err().first().expected.as_deref(),
            Some("integer")
        );
        assert!(number().multiple_of(0.1).validate(&json!(0.3)).is_ok());
        assert_eq!(
            number().multiple_of(3.0).validate(&json!(10)).unwrap_err().first().code,
            IssueCode::NotMultipleOf
        );
    }

    #[test]
    fn test_number_preserves_representation() {
        assert_eq!(number().validate(&json!(7)).unwrap(), json!(7));
        assert_eq!(number().validate(&json!(7.25)).unwrap(), json!(7.25));
    }

    #[test]
    fn test_number_coercion() {
        let schema = number().coerce();
        assert_eq!(schema.validate(&json!("42")).unwrap(), json!(42));
        assert_eq!(schema.validate(&json!(" 2.5 ")).unwrap(), json!(2.5));
        assert_eq!(schema.validate(&json!(true)).unwrap(), json!(1));
        assert!(schema.validate(&json!("abc")).is_err());
        assert!(schema.validate(&json!("inf")).is_err());
    }

    #[test]
    fn test_boolean_and_coercion() {
        assert!(boolean().validate(&json!(true)).is_ok());
        assert!(boolean().validate(&json!("true")).is_err());
        let schema = boolean().coerce();
        assert_eq!(schema.validate(&json!("")).unwrap(), json!(false));
        assert_eq!(schema.validate(&json!("no")).unwrap(), json!(true));
        assert_eq!(schema.validate(&json!(0)).unwrap(), json!(false));
        assert_eq!(schema.validate(&json!(null)).unwrap(), json!(false));
    }

    #[test]
    fn test_null_and_any() {
        assert!(null().validate(&json!(null)).is_ok());
        assert!(null().validate(&json!(0)).is_err());
        assert_eq!(any().validate_input(None).unwrap(), None);
        assert_eq!(any().validate(&json!({"x": 1})).unwrap(), json!({"x": 1}));
    }

    #[test]
    fn test_literal() {
        let schema = literal("admin");
        assert!(schema.validate(&json!("admin")).is_ok());
        let err = schema.validate(&json!("user")).unwrap_err();
        assert_eq!(err.first().code, IssueCode::InvalidLiteral);
        assert!(literal(3).validate(&json!(3)).is_ok());
    }

    #[test]
    fn test_enumeration() {
        let schema = enumeration(["red", "green"]);
        assert!(schema.validate(&json!("red")).is_ok());
        let err = schema.validate(&json!("blue")).unwrap_err();
        assert_eq!(err.first().code, IssueCode::InvalidEnumValue);
        assert_eq!(err.first().received.as_deref(), Some("'blue'"));
        assert_eq!(schema.options().len(), 2);
    }
}
