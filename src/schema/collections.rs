//! Array and record schemas

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde::Serialize;
use serde_json::{Map, Value};

use super::definition::SchemaDefinition;
use super::object::{collect_field, expect_object};
use super::{Checked, Schema, SchemaRef};
use crate::error::{IssueCode, Issues, ValidationError, ValidationIssue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "check", content = "value", rename_all = "snake_case")]
pub enum ArrayCheck {
    MinItems(usize),
    MaxItems(usize),
    ExactItems(usize),
    Unique,
}

#[derive(Clone)]
pub struct ArraySchema {
    item: SchemaRef,
    checks: Vec<ArrayCheck>,
}

/// Array whose elements all satisfy `item`
pub fn array<S: Schema + 'static>(item: S) -> ArraySchema {
    ArraySchema {
        item: Arc::new(item),
        checks: Vec::new(),
    }
}

impl ArraySchema {
    pub fn element(&self) -> &SchemaRef {
        &self.item
    }
}

pub(crate) fn expect_array(input: Option<&Value>) -> Result<&Vec<Value>, ValidationError> {
    match input {
        Some(Value::Array(items)) => Ok(items),
        other => Err(ValidationError::new(ValidationIssue::type_mismatch("array", other))),
    }
}

/// Length bounds; checked before any element
pub(crate) fn check_array_bounds(checks: &[ArrayCheck], len: usize) -> Result<(), ValidationError> {
    let mut issues = Issues::new();
    for check in checks {
        match *check {
            ArrayCheck::MinItems(min) if len < min => issues.push(
                ValidationIssue::new(
                    IssueCode::TooSmall,
                    format!("Array must contain at least {} element(s)", min),
                )
                .with_values(format!(">= {}", min), len.to_string()),
            ),
            ArrayCheck::MaxItems(max) if len > max => issues.push(
                ValidationIssue::new(
                    IssueCode::TooBig,
                    format!("Array must contain at most {} element(s)", max),
                )
                .with_values(format!("<= {}", max), len.to_string()),
            ),
            ArrayCheck::ExactItems(exact) if len != exact => {
                let code = if len < exact {
                    IssueCode::TooSmall
                } else {
                    IssueCode::TooBig
                };
                issues.push(
                    ValidationIssue::new(
                        code,
                        format!("Array must contain exactly {} element(s)", exact),
                    )
                    .with_values(exact.to_string(), len.to_string()),
                );
            }
            _ => {}
        }
    }
    issues.finish(())
}

/// Reject the first element equal to an earlier one
pub(crate) fn check_unique(checks: &[ArrayCheck], items: &[Value]) -> Result<(), ValidationError> {
    if !checks.contains(&ArrayCheck::Unique) {
        return Ok(());
    }
    let mut seen = HashSet::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if !seen.insert(item.to_string()) {
            return Err(ValidationError::new(
                ValidationIssue::new(IssueCode::NotUnique, "Array items must be unique")
                    .at(vec![index.into()]),
            ));
        }
    }
    Ok(())
}

/// Record one element outcome
pub(crate) fn collect_item(out: &mut Vec<Value>, issues: &mut Issues, index: usize, result: Checked) {
    match result {
        Ok(value) => out.push(value.unwrap_or(Value::Null)),
        Err(error) => issues.absorb(error, index),
    }
}

impl Schema for ArraySchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Array {
            item: Box::new(self.item.definition()),
            checks: self.checks.clone(),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        let items = expect_array(input)?;
        check_array_bounds(&self.checks, items.len())?;

        let mut out = Vec::with_capacity(items.len());
        let mut issues = Issues::new();
        for (index, item) in items.iter().enumerate() {
            collect_item(&mut out, &mut issues, index, self.item.check(Some(item)));
        }
        issues.finish(())?;
        check_unique(&self.checks, &out)?;
        Ok(Some(Value::Array(out)))
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            let items = expect_array(input)?;
            check_array_bounds(&self.checks, items.len())?;

            let results = join_all(items.iter().map(|item| self.item.check_async(Some(item)))).await;
            let mut out = Vec::with_capacity(items.len());
            let mut issues = Issues::new();
            for (index, result) in results.into_iter().enumerate() {
                collect_item(&mut out, &mut issues, index, result);
            }
            issues.finish(())?;
            check_unique(&self.checks, &out)?;
            Ok(Some(Value::Array(out)))
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.item.is_async()
    }
}

/// Fluent array checks, also reachable through wrappers
pub trait ArrayChecks: Sized {
    fn with_array_check(self, check: ArrayCheck) -> Self;

    fn min_items(self, min: usize) -> Self {
        self.with_array_check(ArrayCheck::MinItems(min))
    }

    fn max_items(self, max: usize) -> Self {
        self.with_array_check(ArrayCheck::MaxItems(max))
    }

    fn exact_items(self, len: usize) -> Self {
        self.with_array_check(ArrayCheck::ExactItems(len))
    }

    fn nonempty(self) -> Self {
        self.min_items(1)
    }

    /// Reject structurally equal elements
    fn unique(self) -> Self {
        self.with_array_check(ArrayCheck::Unique)
    }
}

impl ArrayChecks for ArraySchema {
    fn with_array_check(mut self, check: ArrayCheck) -> Self {
        self.checks.push(check);
        self
    }
}

// ============================================================================
// Record
// ============================================================================

/// String-keyed map with uniformly typed values
#[derive(Clone)]
pub struct RecordSchema {
    value: SchemaRef,
}

pub fn record<S: Schema + 'static>(value: S) -> RecordSchema {
    RecordSchema {
        value: Arc::new(value),
    }
}

impl Schema for RecordSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Record {
            value: Box::new(self.value.definition()),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        let map = expect_object(input)?;
        let mut out = Map::new();
        let mut issues = Issues::new();
        for (key, value) in map {
            collect_field(&mut out, &mut issues, key, self.value.check(Some(value)));
        }
        issues.finish(Some(Value::Object(out)))
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            let map = expect_object(input)?;
            let results = join_all(map.values().map(|v| self.value.check_async(Some(v)))).await;
            let mut out = Map::new();
            let mut issues = Issues::new();
            for (key, result) in map.keys().zip(results) {
                collect_field(&mut out, &mut issues, key, result);
            }
            issues.finish(Some(Value::Object(out)))
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.value.is_async()
    }
}
