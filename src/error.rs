//! Error types for schema validation
//!
//! A [`ValidationIssue`] is one located failure; a [`ValidationError`] is the
//! ordered, non-empty aggregate a schema returns. Paths are relative while an
//! error bubbles up: every composite prepends its own key or index with
//! [`ValidationError::prefixed`], so the surfaced path runs root-to-leaf.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Machine-readable issue codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    Required,
    InvalidLiteral,
    InvalidEnumValue,
    InvalidString,
    TooSmall,
    TooBig,
    NotMultipleOf,
    NotUnique,
    UnrecognizedKeys,
    InvalidUnion,
    InvalidUnionDiscriminator,
    InvalidIntersection,
    Custom,
    /// A synchronous entry point reached an async-only refinement
    AsyncInSync,
    UnknownError,
}

impl IssueCode {
    /// Wire name of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::Required => "required",
            IssueCode::InvalidLiteral => "invalid_literal",
            IssueCode::InvalidEnumValue => "invalid_enum_value",
            IssueCode::InvalidString => "invalid_string",
            IssueCode::TooSmall => "too_small",
            IssueCode::TooBig => "too_big",
            IssueCode::NotMultipleOf => "not_multiple_of",
            IssueCode::NotUnique => "not_unique",
            IssueCode::UnrecognizedKeys => "unrecognized_keys",
            IssueCode::InvalidUnion => "invalid_union",
            IssueCode::InvalidUnionDiscriminator => "invalid_union_discriminator",
            IssueCode::InvalidIntersection => "invalid_intersection",
            IssueCode::Custom => "custom",
            IssueCode::AsyncInSync => "async_in_sync",
            IssueCode::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of an issue path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Render a path as `a.b[0].c` (empty string for the root)
pub fn format_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// JSON type name used in `received`/`expected` fields
pub fn json_type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

/// A single located validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub path: Vec<PathSegment>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl ValidationIssue {
    /// Create an issue at the root path
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            path: Vec::new(),
            message: message.into(),
            received: None,
            expected: None,
        }
    }

    /// Attach expected/received descriptions
    pub fn with_values(mut self, expected: impl Into<String>, received: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.received = Some(received.into());
        self
    }

    /// Relocate the issue under a relative path
    pub fn at(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Type mismatch, or `required` when the input is absent
    pub fn type_mismatch(expected: &str, received: Option<&Value>) -> Self {
        match received {
            None => Self::required(expected),
            Some(value) => {
                let actual = json_type_name(Some(value));
                Self::new(
                    IssueCode::InvalidType,
                    format!("Expected {}, received {}", expected, actual),
                )
                .with_values(expected, actual)
            }
        }
    }

    /// Missing required value
    pub fn required(expected: &str) -> Self {
        Self::new(IssueCode::Required, "Required").with_values(expected, "undefined")
    }

    /// Custom refinement failure
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(IssueCode::Custom, message)
    }

    /// A panic or foreign failure normalized into an issue
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(IssueCode::UnknownError, message)
    }

    /// Rendered path (`a.b[0]`)
    pub fn path_string(&self) -> String {
        format_path(&self.path)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} ({})", self.message, self.code)
        } else {
            write!(f, "{}: {} ({})", self.path_string(), self.message, self.code)
        }
    }
}

/// Ordered, non-empty aggregate of validation issues
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("validation failed with {} issue(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// `{form_errors, field_errors}` view of an error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenedErrors {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Error holding exactly one issue
    pub fn new(issue: ValidationIssue) -> Self {
        Self { issues: vec![issue] }
    }

    /// Build from a list of issues; `None` if the list is empty
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self { issues })
        }
    }

    /// All issues in order
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume into the issue list
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// First issue (always present)
    pub fn first(&self) -> &ValidationIssue {
        &self.issues[0]
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Prepend a segment to every issue path
    pub fn prefixed(mut self, segment: impl Into<PathSegment>) -> Self {
        let segment = segment.into();
        for issue in &mut self.issues {
            issue.path.insert(0, segment.clone());
        }
        self
    }

    /// Prefix every message, keeping codes and paths
    pub fn with_message_prefix(mut self, prefix: &str) -> Self {
        for issue in &mut self.issues {
            issue.message = format!("{}{}", prefix, issue.message);
        }
        self
    }

    /// Issues located exactly at `path`
    pub fn issues_at(&self, path: &[PathSegment]) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.path == path).collect()
    }

    /// Nested path-keyed map; every level carries an `_errors` bucket
    pub fn format(&self) -> Value {
        let mut root = format_node();
        for issue in &self.issues {
            insert_formatted(&mut root, &issue.path, &issue.message);
        }
        Value::Object(root)
    }

    /// Root issues become form errors, the rest are grouped by rendered path
    pub fn flatten(&self) -> FlattenedErrors {
        let mut flattened = FlattenedErrors::default();
        for issue in &self.issues {
            if issue.path.is_empty() {
                flattened.form_errors.push(issue.message.clone());
            } else {
                flattened
                    .field_errors
                    .entry(issue.path_string())
                    .or_default()
                    .push(issue.message.clone());
            }
        }
        flattened
    }
}

fn format_node() -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("_errors".to_string(), Value::Array(Vec::new()));
    node
}

fn insert_formatted(node: &mut Map<String, Value>, path: &[PathSegment], message: &str) {
    match path.split_first() {
        None => {
            if let Some(Value::Array(bucket)) = node.get_mut("_errors") {
                bucket.push(Value::String(message.to_string()));
            }
        }
        // `_errors` is reserved for the bucket; a field with that name reports into it
        Some((PathSegment::Key(key), _)) if key == "_errors" => {
            insert_formatted(node, &[], message);
        }
        Some((segment, rest)) => {
            let entry = node.entry(segment.to_string()).or_insert(Value::Null);
            if !entry.is_object() {
                *entry = Value::Object(format_node());
            }
            if let Value::Object(child) = entry {
                insert_formatted(child, rest, message);
            }
        }
    }
}

/// Accumulates issues from several children without short-circuiting
#[derive(Debug, Default)]
pub struct Issues {
    issues: Vec<ValidationIssue>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Take every issue of a child error, rebased under `segment`
    pub fn absorb(&mut self, error: ValidationError, segment: impl Into<PathSegment>) {
        self.issues.extend(error.prefixed(segment).issues);
    }

    /// Take every issue of an error at the current level
    pub fn extend(&mut self, error: ValidationError) {
        self.issues.extend(error.issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// `Ok(value)` when nothing was collected
    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        match ValidationError::from_issues(self.issues) {
            None => Ok(value),
            Some(error) => Err(error),
        }
    }
}

/// Serializable success/failure result returned by the safe entry points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn success(data: Option<Value>) -> Self {
        Self {
            success: true,
            data,
            errors: Vec::new(),
        }
    }

    pub fn failure(error: ValidationError) -> Self {
        Self {
            success: false,
            data: None,
            errors: error.into_issues(),
        }
    }

    /// Back into a `Result`; a failure without issues becomes `unknown_error`
    pub fn into_result(self) -> Result<Option<Value>, ValidationError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ValidationError::from_issues(self.errors).unwrap_or_else(|| {
                ValidationError::new(ValidationIssue::unknown("Validation failed without issues"))
            }))
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

impl From<Result<Option<Value>, ValidationError>> for ValidationResult {
    fn from(result: Result<Option<Value>, ValidationError>) -> Self {
        match result {
            Ok(data) => ValidationResult::success(data),
            Err(error) => ValidationResult::failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue_at(path: Vec<PathSegment>, message: &str) -> ValidationIssue {
        ValidationIssue::custom(message).at(path)
    }

    #[test]
    fn test_prefixed_rebases_paths() {
        let error = ValidationError::new(issue_at(vec!["name".into()], "bad"))
            .prefixed(0usize)
            .prefixed("users");

        assert_eq!(
            error.first().path,
            vec![PathSegment::from("users"), PathSegment::Index(0), PathSegment::from("name")]
        );
        assert_eq!(error.first().path_string(), "users[0].name");
    }

    #[test]
    fn test_type_mismatch_on_absent_is_required() {
        let issue = ValidationIssue::type_mismatch("string", None);
        assert_eq!(issue.code, IssueCode::Required);
        assert_eq!(issue.received.as_deref(), Some("undefined"));

        let issue = ValidationIssue::type_mismatch("string", Some(&json!(3)));
        assert_eq!(issue.code, IssueCode::InvalidType);
        assert_eq!(issue.message, "Expected string, received number");
    }

    #[test]
    fn test_format_nests_errors() {
        let error = ValidationError::from_issues(vec![
            ValidationIssue::custom("root problem"),
            issue_at(vec!["address".into(), "city".into()], "too short"),
            issue_at(vec!["tags".into(), 1usize.into()], "not a string"),
        ])
        .unwrap();

        let formatted = error.format();
        assert_eq!(formatted["_errors"], json!(["root problem"]));
        assert_eq!(formatted["address"]["city"]["_errors"], json!(["too short"]));
        assert_eq!(formatted["address"]["_errors"], json!([]));
        assert_eq!(formatted["tags"]["1"]["_errors"], json!(["not a string"]));
    }

    #[test]
    fn test_field_named_errors_keeps_root_bucket() {
        let error = ValidationError::from_issues(vec![
            ValidationIssue::custom("root problem"),
            issue_at(vec!["_errors".into()], "field problem"),
            issue_at(vec!["nested".into(), "_errors".into(), "deep".into()], "deep problem"),
        ])
        .unwrap();

        let formatted = error.format();
        assert_eq!(formatted["_errors"], json!(["root problem", "field problem"]));
        assert_eq!(formatted["nested"]["_errors"], json!(["deep problem"]));
    }

    #[test]
    fn test_flatten_splits_form_and_field_errors() {
        let error = ValidationError::from_issues(vec![
            ValidationIssue::custom("passwords must match"),
            issue_at(vec!["email".into()], "Invalid email"),
            issue_at(vec!["email".into()], "Required"),
        ])
        .unwrap();

        let flat = error.flatten();
        assert_eq!(flat.form_errors, vec!["passwords must match"]);
        assert_eq!(flat.field_errors["email"], vec!["Invalid email", "Required"]);
    }

    #[test]
    fn test_issues_finish() {
        let empty = Issues::new();
        assert_eq!(empty.finish(5).unwrap(), 5);

        let mut issues = Issues::new();
        issues.absorb(ValidationError::new(ValidationIssue::custom("x")), "field");
        let error = issues.finish(()).unwrap_err();
        assert_eq!(error.len(), 1);
        assert_eq!(error.first().path, vec![PathSegment::from("field")]);
    }

    #[test]
    fn test_validation_result_round_trip() {
        let failure = ValidationResult::failure(ValidationError::new(ValidationIssue::custom("nope")));
        assert!(!failure.success);
        assert_eq!(failure.error_count(), 1);
        assert!(failure.into_result().is_err());

        let success = ValidationResult::success(Some(json!(1)));
        assert_eq!(success.into_result().unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_display_lists_issues() {
        let error = ValidationError::new(issue_at(vec!["age".into()], "Expected number"));
        let text = error.to_string();
        assert!(text.contains("1 issue"));
        assert!(text.contains("age: Expected number"));
    }
}
