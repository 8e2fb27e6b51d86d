//! Union, intersection and discriminated-union schemas

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use super::definition::SchemaDefinition;
use super::object::expect_object;
use super::{Checked, Schema, SchemaRef};
use crate::error::{
    json_type_name, IssueCode, Issues, PathSegment, ValidationError, ValidationIssue,
};

// ============================================================================
// Union
// ============================================================================

/// First member that accepts the input wins
#[derive(Clone)]
pub struct UnionSchema {
    members: Vec<SchemaRef>,
    expected: String,
}

pub fn union<I>(members: I) -> UnionSchema
where
    I: IntoIterator<Item = SchemaRef>,
{
    let members: Vec<SchemaRef> = members.into_iter().collect();
    let definitions: Vec<SchemaDefinition> = members.iter().map(|m| m.definition()).collect();
    UnionSchema {
        expected: describe_members(&definitions),
        members,
    }
}

impl UnionSchema {
    pub fn members(&self) -> &[SchemaRef] {
        &self.members
    }

    /// Append one more alternative
    pub fn or<S: Schema + 'static>(self, member: S) -> Self {
        let mut members = self.members;
        members.push(Arc::new(member));
        union(members)
    }
}

pub(crate) fn describe_members(definitions: &[SchemaDefinition]) -> String {
    definitions
        .iter()
        .map(|d| d.describe())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// No member matched; an absent input reports `required`
pub(crate) fn union_failure(expected: &str, input: Option<&Value>) -> ValidationError {
    match input {
        None => ValidationError::new(ValidationIssue::required(expected)),
        Some(_) => ValidationError::new(
            ValidationIssue::new(
                IssueCode::InvalidUnion,
                format!(
                    "Invalid input: expected {}, received {}",
                    expected,
                    json_type_name(input)
                ),
            )
            .with_values(expected, json_type_name(input)),
        ),
    }
}

impl Schema for UnionSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Union {
            members: self.members.iter().map(|m| m.definition()).collect(),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        for member in &self.members {
            if let Ok(output) = member.check(input) {
                return Ok(output);
            }
        }
        Err(union_failure(&self.expected, input))
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            for member in &self.members {
                if let Ok(output) = member.check_async(input).await {
                    return Ok(output);
                }
            }
            Err(union_failure(&self.expected, input))
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.members.iter().any(|m| m.is_async())
    }
}

// ============================================================================
// Intersection
// ============================================================================

/// Input must satisfy both sides; outputs are merged
#[derive(Clone)]
pub struct IntersectionSchema {
    left: SchemaRef,
    right: SchemaRef,
}

pub fn intersection<A, B>(left: A, right: B) -> IntersectionSchema
where
    A: Schema + 'static,
    B: Schema + 'static,
{
    IntersectionSchema {
        left: Arc::new(left),
        right: Arc::new(right),
    }
}

fn not_mergeable() -> ValidationError {
    ValidationError::new(ValidationIssue::new(
        IssueCode::InvalidIntersection,
        "Intersection results could not be merged",
    ))
}

/// Merge the two side outputs: objects shallow-merge with the right side
/// winning, everything else must be equal
pub(crate) fn merge_outputs(left: Option<Value>, right: Option<Value>) -> Checked {
    match (left, right) {
        (None, other) | (other, None) => Ok(other),
        (Some(Value::Object(mut l)), Some(Value::Object(r))) => {
            for (key, value) in r {
                l.insert(key, value);
            }
            Ok(Some(Value::Object(l)))
        }
        (Some(l), Some(r)) if l == r => Ok(Some(l)),
        _ => Err(not_mergeable()),
    }
}

/// Combine both side outcomes, keeping every issue from both
pub(crate) fn combine_sides(left: Checked, right: Checked) -> Checked {
    match (left, right) {
        (Ok(l), Ok(r)) => merge_outputs(l, r),
        (Err(l), Err(r)) => {
            let mut issues = Issues::new();
            issues.extend(l);
            issues.extend(r);
            issues.finish(None)
        }
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
    }
}

impl Schema for IntersectionSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Intersection {
            left: Box::new(self.left.definition()),
            right: Box::new(self.right.definition()),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        combine_sides(self.left.check(input), self.right.check(input))
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            let (left, right) =
                futures::join!(self.left.check_async(input), self.right.check_async(input));
            combine_sides(left, right)
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.left.is_async() || self.right.is_async()
    }
}

// ============================================================================
// Discriminated union
// ============================================================================

/// Object union selected by the value of one key
#[derive(Clone)]
pub struct DiscriminatedUnionSchema {
    discriminator: String,
    members: Vec<SchemaRef>,
}

pub fn discriminated_union<I>(discriminator: impl Into<String>, members: I) -> DiscriminatedUnionSchema
where
    I: IntoIterator<Item = SchemaRef>,
{
    DiscriminatedUnionSchema {
        discriminator: discriminator.into(),
        members: members.into_iter().collect(),
    }
}

impl DiscriminatedUnionSchema {
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }
}

/// Resolution state shared by the interpreted and compiled paths
pub(crate) struct DiscriminatorMatch<'a> {
    key: &'a str,
    raw: &'a Value,
    addressed: Issues,
}

impl<'a> DiscriminatorMatch<'a> {
    /// Validate the container and read the raw discriminator
    pub(crate) fn begin(key: &'a str, input: Option<&'a Value>) -> Result<Self, ValidationError> {
        let map = expect_object(input)?;
        match map.get(key) {
            Some(raw) => Ok(Self {
                key,
                raw,
                addressed: Issues::new(),
            }),
            None => Err(ValidationError::new(
                ValidationIssue::new(
                    IssueCode::InvalidUnionDiscriminator,
                    format!("Missing discriminator '{}'", key),
                )
                .at(vec![PathSegment::from(key)]),
            )),
        }
    }

    /// Offer one member outcome; returns the output if the member is selected
    pub(crate) fn offer(&mut self, outcome: Checked) -> Option<Option<Value>> {
        match outcome {
            Ok(output) => {
                let selected = match &output {
                    Some(Value::Object(map)) => map.get(self.key) == Some(self.raw),
                    _ => false,
                };
                selected.then_some(output)
            }
            Err(error) => {
                let rejects_key = error
                    .issues()
                    .iter()
                    .any(|i| matches!(i.path.first(), Some(PathSegment::Key(k)) if k == self.key));
                if !rejects_key {
                    self.addressed.extend(error);
                }
                None
            }
        }
    }

    /// No member selected: issues from members that accepted the discriminator,
    /// or a single no-match issue
    pub(crate) fn fail(self) -> ValidationError {
        let key = self.key;
        let raw = self.raw.to_string();
        match self.addressed.finish(()) {
            Err(error) => error,
            Ok(()) => ValidationError::new(
                ValidationIssue::new(
                    IssueCode::InvalidUnionDiscriminator,
                    format!("No variant matched discriminator value {}", raw),
                )
                .with_values(format!("valid '{}' value", key), raw)
                .at(vec![PathSegment::from(key)]),
            ),
        }
    }
}

impl Schema for DiscriminatedUnionSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::DiscriminatedUnion {
            discriminator: self.discriminator.clone(),
            members: self.members.iter().map(|m| m.definition()).collect(),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        let mut resolution = DiscriminatorMatch::begin(&self.discriminator, input)?;
        for member in &self.members {
            if let Some(output) = resolution.offer(member.check(input)) {
                return Ok(output);
            }
        }
        Err(resolution.fail())
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            let mut resolution = DiscriminatorMatch::begin(&self.discriminator, input)?;
            for member in &self.members {
                if let Some(output) = resolution.offer(member.check_async(input).await) {
                    return Ok(output);
                }
            }
            Err(resolution.fail())
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.members.iter().any(|m| m.is_async())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{literal, number, object, string, NumberChecks, StringChecks};
    use serde_json::json;

    #[test]
    fn test_union_first_match_wins() {
        let schema = union([
            string().transform(|_| json!("as string")).boxed(),
            string().boxed(),
        ]);
        assert_eq!(schema.validate(&json!("x")).unwrap(), json!("as string"));
    }

    #[test]
    fn test_union_failure_is_single_issue() {
        let schema = union([string().boxed(), number().boxed()]);
        let err = schema.validate(&json!(true)).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.first().code, IssueCode::InvalidUnion);
        assert_eq!(err.first().expected.as_deref(), Some("string | number"));
        assert_eq!(err.first().received.as_deref(), Some("boolean"));

        assert_eq!(
            schema.validate_input(None).unwrap_err().first().code,
            IssueCode::Required
        );
    }

    #[test]
    fn test_union_or() {
        let schema = union([string().boxed()]).or(number());
        assert!(schema.validate(&json!(1)).is_ok());
        assert_eq!(schema.members().len(), 2);
    }

    #[test]
    fn test_intersection_merges_objects() {
        let schema = intersection(
            object().field("a", string()).passthrough(),
            object().field("b", number()),
        );
        let out = schema.validate(&json!({"a": "x", "b": 1})).unwrap();
        assert_eq!(out, json!({"a": "x", "b": 1}));
    }

    #[test]
    fn test_intersection_collects_both_sides() {
        let schema = intersection(object().field("a", string()), object().field("b", number()));
        let err = schema.validate(&json!({})).unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|i| i.path_string()).collect();
        assert_eq!(paths, vec!["a", "b"]);
    }

    #[test]
    fn test_intersection_of_primitives() {
        let schema = intersection(number().min(0.0), number().max(10.0));
        assert_eq!(schema.validate(&json!(5)).unwrap(), json!(5));

        let conflicting = intersection(
            string().transform(|_| json!("a")),
            string().transform(|_| json!("b")),
        );
        assert_eq!(
            conflicting.validate(&json!("x")).unwrap_err().first().code,
            IssueCode::InvalidIntersection
        );
    }

    #[test]
    fn test_merge_outputs_mixed_kinds() {
        assert!(merge_outputs(Some(json!({"a": 1})), Some(json!(1))).is_err());
        assert!(merge_outputs(Some(json!([1])), Some(json!([1]))).is_ok());
        assert!(merge_outputs(Some(json!([1])), Some(json!([2]))).is_err());
        assert_eq!(merge_outputs(None, Some(json!(3))).unwrap(), Some(json!(3)));
    }

    fn shapes() -> DiscriminatedUnionSchema {
        discriminated_union(
            "type",
            [
                object()
                    .field("type", literal("circle"))
                    .field("radius", number().positive())
                    .boxed(),
                object()
                    .field("type", literal("square"))
                    .field("side", number().positive())
                    .boxed(),
            ],
        )
    }

    #[test]
    fn test_discriminated_union_selects_member() {
        let out = shapes()
            .validate(&json!({"type": "square", "side": 2}))
            .unwrap();
        assert_eq!(out, json!({"type": "square", "side": 2}));
    }

    #[test]
    fn test_discriminated_union_reports_selected_member_issues() {
        let err = shapes()
            .validate(&json!({"type": "circle", "radius": -1}))
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.first().path_string(), "radius");
        assert_eq!(err.first().code, IssueCode::TooSmall);
    }

    #[test]
    fn test_discriminated_union_unknown_or_missing_tag() {
        let err = shapes().validate(&json!({"type": "hexagon"})).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.first().code, IssueCode::InvalidUnionDiscriminator);
        assert_eq!(err.first().path_string(), "type");

        let err = shapes().validate(&json!({"radius": 1})).unwrap_err();
        assert_eq!(err.first().code, IssueCode::InvalidUnionDiscriminator);

        let err = shapes().validate(&json!("circle")).unwrap_err();
        assert_eq!(err.first().code, IssueCode::InvalidType);
    }
}
