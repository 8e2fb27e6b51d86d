//! Optional alternate validation backend
//!
//! An [`Accelerator`] validates a definition/value pair somewhere else (a
//! native module, a WASM instance, a remote service). It must honor the same
//! accept/reject/output contract as the compiled path; the [`Engine`]
//! falls back to the compiled path whenever it errors, panics or, with
//! `verify_results` enabled, disagrees.
//!
//! [`Engine`]: crate::Engine

use serde_json::Value;
use thiserror::Error;

use crate::error::ValidationResult;
use crate::schema::SchemaDefinition;

/// Failure inside an accelerator backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcceleratorError {
    #[error("Accelerator unavailable: {0}")]
    Unavailable(String),

    #[error("Schema not supported by accelerator: {0}")]
    Unsupported(String),

    #[error("Accelerator backend failed: {0}")]
    Backend(String),
}

pub trait Accelerator: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Whether this backend can validate `definition`
    fn supports(&self, definition: &SchemaDefinition) -> bool;

    fn validate(
        &self,
        definition: &SchemaDefinition,
        value: &Value,
    ) -> Result<ValidationResult, AcceleratorError>;
}

/// Whether two outcomes agree on the decision and, when accepted, the output
pub(crate) fn agrees(local: &ValidationResult, remote: &ValidationResult) -> bool {
    match (local.success, remote.success) {
        (true, true) => local.data == remote.data,
        (false, false) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ValidationError, ValidationIssue};
    use serde_json::json;

    #[test]
    fn test_agreement_rules() {
        let ok = ValidationResult::success(Some(json!(1)));
        let other_ok = ValidationResult::success(Some(json!(2)));
        let fail = ValidationResult::failure(ValidationError::new(ValidationIssue::custom("a")));
        let other_fail = ValidationResult::failure(ValidationError::new(ValidationIssue::custom("b")));

        assert!(agrees(&ok, &ok.clone()));
        assert!(!agrees(&ok, &other_ok));
        assert!(agrees(&fail, &other_fail));
        assert!(!agrees(&ok, &fail));
    }

    #[test]
    fn test_error_display() {
        let err = AcceleratorError::Backend("trap".into());
        assert_eq!(err.to_string(), "Accelerator backend failed: trap");
    }
}
