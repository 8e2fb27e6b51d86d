//! Object schemas with a declared shape
//!
//! Fields are checked in declaration order and every failure is collected.
//! Unknown keys are handled by the [`UnknownKeys`] policy: `strip` (default)
//! drops them, `passthrough` copies them to the output, `strict` reports them
//! in one `unrecognized_keys` issue after the field issues.

use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::combinators::Optional;
use super::definition::SchemaDefinition;
use super::{Checked, Schema, SchemaRef};
use crate::error::{IssueCode, Issues, ValidationError, ValidationIssue};

/// Policy for keys not present in the shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeys {
    #[default]
    Strip,
    Passthrough,
    Strict,
}

#[derive(Clone)]
pub struct ObjectSchema {
    shape: Vec<(String, SchemaRef)>,
    unknown_keys: UnknownKeys,
}

/// Empty object schema; add fields with [`ObjectSchema::field`]
pub fn object() -> ObjectSchema {
    ObjectSchema {
        shape: Vec::new(),
        unknown_keys: UnknownKeys::Strip,
    }
}

impl ObjectSchema {
    /// Add or replace a field; a replaced field keeps its position
    pub fn field<S: Schema + 'static>(self, key: impl Into<String>, schema: S) -> Self {
        self.field_ref(key, Arc::new(schema))
    }

    pub fn field_ref(mut self, key: impl Into<String>, schema: SchemaRef) -> Self {
        let key = key.into();
        match self.shape.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = schema,
            None => self.shape.push((key, schema)),
        }
        self
    }

    /// Add every field of `other`; the unknown-key policy is kept
    pub fn extend(self, other: &ObjectSchema) -> Self {
        other
            .shape
            .iter()
            .fold(self, |acc, (k, s)| acc.field_ref(k.clone(), Arc::clone(s)))
    }

    /// Like [`ObjectSchema::extend`], also adopting `other`'s unknown-key policy
    pub fn merge(self, other: &ObjectSchema) -> Self {
        let mut merged = self.extend(other);
        merged.unknown_keys = other.unknown_keys;
        merged
    }

    /// Keep only the named fields
    pub fn pick(mut self, keys: &[&str]) -> Self {
        self.shape.retain(|(k, _)| keys.contains(&k.as_str()));
        self
    }

    /// Drop the named fields
    pub fn omit(mut self, keys: &[&str]) -> Self {
        self.shape.retain(|(k, _)| !keys.contains(&k.as_str()));
        self
    }

    /// Make every field optional
    pub fn partial(mut self) -> Self {
        self.shape = self
            .shape
            .into_iter()
            .map(|(k, s)| (k, Arc::new(Optional::new(s)) as SchemaRef))
            .collect();
        self
    }

    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    pub fn strip(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strip;
        self
    }

    pub fn keys(&self) -> Vec<&str> {
        self.shape.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn shape(&self) -> &[(String, SchemaRef)] {
        &self.shape
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }
}

pub(crate) fn expect_object(input: Option<&Value>) -> Result<&Map<String, Value>, ValidationError> {
    match input {
        Some(Value::Object(map)) => Ok(map),
        other => Err(ValidationError::new(ValidationIssue::type_mismatch("object", other))),
    }
}

/// Record one field outcome into the output map or the issue list
pub(crate) fn collect_field(out: &mut Map<String, Value>, issues: &mut Issues, key: &str, result: Checked) {
    match result {
        Ok(Some(value)) => {
            out.insert(key.to_string(), value);
        }
        Ok(None) => {}
        Err(error) => issues.absorb(error, key),
    }
}

/// Apply the unknown-key policy and produce the final outcome
pub(crate) fn finish_object(
    policy: UnknownKeys,
    input: &Map<String, Value>,
    is_known: impl Fn(&str) -> bool,
    mut out: Map<String, Value>,
    mut issues: Issues,
) -> Checked {
    let unknown: Vec<&String> = input.keys().filter(|k| !is_known(k)).collect();
    match policy {
        UnknownKeys::Strip => {}
        UnknownKeys::Passthrough => {
            for key in unknown {
                out.insert(key.clone(), input[key.as_str()].clone());
            }
        }
        UnknownKeys::Strict if !unknown.is_empty() => {
            let names = unknown
                .iter()
                .map(|k| format!("'{}'", k))
                .collect::<Vec<_>>()
                .join(", ");
            issues.push(ValidationIssue::new(
                IssueCode::UnrecognizedKeys,
                format!("Unrecognized key(s) in object: {}", names),
            ));
        }
        UnknownKeys::Strict => {}
    }
    issues.finish(Some(Value::Object(out)))
}

impl Schema for ObjectSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Object {
            shape: self
                .shape
                .iter()
                .map(|(k, s)| (k.clone(), s.definition()))
                .collect(),
            unknown_keys: self.unknown_keys,
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        let map = expect_object(input)?;
        let mut out = Map::new();
        let mut issues = Issues::new();
        for (key, schema) in &self.shape {
            collect_field(&mut out, &mut issues, key, schema.check(map.get(key)));
        }
        finish_object(
            self.unknown_keys,
            map,
            |k| self.shape.iter().any(|(known, _)| known == k),
            out,
            issues,
        )
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            let map = expect_object(input)?;
            let results = join_all(
                self.shape
                    .iter()
                    .map(|(key, schema)| schema.check_async(map.get(key))),
            )
            .await;

            let mut out = Map::new();
            let mut issues = Issues::new();
            for ((key, _), result) in self.shape.iter().zip(results) {
                collect_field(&mut out, &mut issues, key, result);
            }
            finish_object(
                self.unknown_keys,
                map,
                |k| self.shape.iter().any(|(known, _)| known == k),
                out,
                issues,
            )
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.shape.iter().any(|(_, s)| s.is_async())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{number, string, NumberChecks, StringChecks};
    use serde_json::json;

    fn user() -> ObjectSchema {
        object()
            .field("name", string().min_length(1))
            .field("age", number().int().nonnegative())
    }

    #[test]
    fn test_valid_object_strips_unknown_keys() {
        let out = user()
            .validate(&json!({"name": "Ada", "age": 36, "extra": true}))
            .unwrap();
        assert_eq!(out, json!({"name": "Ada", "age": 36}));
    }

    #[test]
    fn test_collects_field_issues_in_order() {
        let err = user().validate(&json!({"name": "", "age": -1.5})).unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|i| i.path_string()).collect();
        assert_eq!(paths, vec!["name", "age", "age"]);
    }

    #[test]
    fn test_missing_key_is_required() {
        let err = user().validate(&json!({"name": "Ada"})).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.first().code, IssueCode::Required);
        assert_eq!(err.first().path_string(), "age");
    }

    #[test]
    fn test_explicit_null_is_not_absent() {
        let schema = object().field("nick", string().optional());
        assert_eq!(schema.validate(&json!({})).unwrap(), json!({}));
        let err = schema.validate(&json!({"nick": null})).unwrap_err();
        assert_eq!(err.first().code, IssueCode::InvalidType);
    }

    #[test]
    fn test_strict_reports_unknown_keys_last() {
        let err = user()
            .strict()
            .validate(&json!({"name": "", "age": 1, "x": 1, "y": 2}))
            .unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.issues()[1].code, IssueCode::UnrecognizedKeys);
        assert!(err.issues()[1].message.contains("'x'"));
    }

    #[test]
    fn test_passthrough_keeps_unknown_keys() {
        let out = user()
            .passthrough()
            .validate(&json!({"name": "Ada", "age": 1, "role": "admin"}))
            .unwrap();
        assert_eq!(out["role"], json!("admin"));
    }

    #[test]
    fn test_not_an_object() {
        let err = user().validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.first().expected.as_deref(), Some("object"));
        assert_eq!(err.first().received.as_deref(), Some("array"));
    }

    #[test]
    fn test_shape_helpers() {
        let base = user();
        assert_eq!(base.clone().pick(&["name"]).keys(), vec!["name"]);
        assert_eq!(base.clone().omit(&["name"]).keys(), vec!["age"]);

        let extended = base.clone().extend(&object().field("email", string().email()));
        assert_eq!(extended.keys(), vec!["name", "age", "email"]);

        let merged = base.clone().merge(&object().field("age", string()).strict());
        assert_eq!(merged.keys(), vec!["name", "age"]);
        assert_eq!(merged.unknown_keys(), UnknownKeys::Strict);
        assert!(merged.validate(&json!({"name": "a", "age": "old"})).is_ok());

        assert_eq!(base.partial().validate(&json!({})).unwrap(), json!({}));
    }

    #[test]
    fn test_nested_paths() {
        let schema = object().field("profile", object().field("email", string().email()));
        let err = schema
            .validate(&json!({"profile": {"email": "nope"}}))
            .unwrap_err();
        assert_eq!(err.first().path_string(), "profile.email");
    }

    #[tokio::test]
    async fn test_async_object() {
        let schema = object()
            .field("name", string().refine_async(|v| async move { v != json!("taken") }, "taken"))
            .field("age", number());
        let err = schema
            .validate_async(&json!({"name": "taken", "age": "x"}))
            .await
            .unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|i| i.path_string()).collect();
        assert_eq!(paths, vec!["name", "age"]);
    }
}
