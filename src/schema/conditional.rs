//! Schema chosen at validation time by a predicate on the raw input

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use super::definition::{Condition, SchemaDefinition};
use super::{guarded, Checked, Schema, SchemaRef};
use crate::error::ValidationError;

pub(crate) const CONDITION_MET: &str = "Condition met: ";
pub(crate) const CONDITION_NOT_MET: &str = "Condition not met: ";

#[derive(Clone)]
pub struct ConditionalSchema {
    condition: Condition,
    when_true: SchemaRef,
    when_false: SchemaRef,
}

/// `when_true` if `condition(input)` holds, otherwise `when_false`
pub fn conditional<F, A, B>(condition: F, when_true: A, when_false: B) -> ConditionalSchema
where
    F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    A: Schema + 'static,
    B: Schema + 'static,
{
    ConditionalSchema {
        condition: Condition::new(condition),
        when_true: Arc::new(when_true),
        when_false: Arc::new(when_false),
    }
}

/// Evaluate the predicate; a panic becomes an `unknown_error`
pub(crate) fn evaluate(condition: &Condition, input: Option<&Value>) -> Result<bool, ValidationError> {
    guarded(|| condition.get()(input))
}

/// Prefix branch issues so the caller can tell which branch ran
pub(crate) fn label_branch(matched: bool, outcome: Checked) -> Checked {
    outcome.map_err(|e| {
        e.with_message_prefix(if matched {
            CONDITION_MET
        } else {
            CONDITION_NOT_MET
        })
    })
}

impl ConditionalSchema {
    fn branch(&self, matched: bool) -> &SchemaRef {
        if matched {
            &self.when_true
        } else {
            &self.when_false
        }
    }
}

impl Schema for ConditionalSchema {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Conditional {
            condition: self.condition.clone(),
            when_true: Box::new(self.when_true.definition()),
            when_false: Box::new(self.when_false.definition()),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        let matched = evaluate(&self.condition, input)?;
        label_branch(matched, self.branch(matched).check(input))
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            let matched = evaluate(&self.condition, input)?;
            label_branch(matched, self.branch(matched).check_async(input).await)
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.when_true.is_async() || self.when_false.is_async()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueCode;
    use crate::schema::{number, string, NumberChecks, StringChecks};
    use serde_json::json;

    fn id_schema() -> ConditionalSchema {
        conditional(
            |v| v.is_some_and(Value::is_string),
            string().uuid(),
            number().int(),
        )
    }

    #[test]
    fn test_branch_selection() {
        let schema = id_schema();
        assert!(schema
            .validate(&json!("123e4567-e89b-12d3-a456-426614174000"))
            .is_ok());
        assert!(schema.validate(&json!(42)).is_ok());
    }

    #[test]
    fn test_branch_failures_are_labelled() {
        let schema = id_schema();
        let err = schema.validate(&json!("nope")).unwrap_err();
        assert!(err.first().message.starts_with(CONDITION_MET));
        assert_eq!(err.first().code, IssueCode::InvalidString);

        let err = schema.validate(&json!(1.5)).unwrap_err();
        assert!(err.first().message.starts_with(CONDITION_NOT_MET));
    }

    #[test]
    fn test_panicking_condition() {
        let schema = conditional(|_| panic!("bad predicate"), string(), string());
        let err = schema.validate(&json!("x")).unwrap_err();
        assert_eq!(err.first().code, IssueCode::UnknownError);
    }
}
