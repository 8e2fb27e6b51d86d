//! Composable schema nodes
//!
//! Every node implements [`Schema`]: a declarative [`SchemaDefinition`] plus a
//! `check` that turns an input into a validated (possibly transformed) output
//! or a [`ValidationError`]. Inputs are `Option<&Value>` so a missing object
//! key ("absent") stays distinguishable from an explicit `null`.
//!
//! ## Building schemas
//!
//! ```rust,ignore
//! use fast_schema::prelude::*;
//!
//! let user = object()
//!     .field("name", string().min_length(1))
//!     .field("email", string().email())
//!     .field("age", number().int().nonnegative().optional());
//!
//! let parsed = user.validate(&serde_json::json!({"name": "Ada", "email": "ada@example.com"}))?;
//! ```
//!
//! Wrappers (`optional`, `refine`, ...) return new nodes; nothing is mutated
//! after construction, so a schema can be shared across threads behind an
//! [`SchemaRef`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{PathSegment, ValidationError, ValidationIssue, ValidationResult};

pub mod collections;
pub mod combinators;
pub mod conditional;
pub mod definition;
pub mod formats;
pub mod object;
pub mod primitives;
pub mod union;

pub use collections::{array, record, ArrayCheck, ArrayChecks, ArraySchema, RecordSchema};
pub use combinators::{Catch, Nullable, Optional, Pipe, Refine, Rewrap, Transform, WithDefault};
pub use conditional::{conditional, ConditionalSchema};
pub use definition::{
    AsyncPredicate, Callback, Condition, FallibleMapper, Mapper, MapperKind, Predicate, Refinement,
    RefinementCheck, SchemaDefinition,
};
pub use formats::StringFormat;
pub use object::{object, ObjectSchema, UnknownKeys};
pub use primitives::{
    any, boolean, enumeration, integer, literal, null, number, string, AnySchema, BooleanSchema,
    EnumSchema, LiteralSchema, NullSchema, NumberCheck, NumberChecks, NumberSchema, StringCheck,
    StringChecks, StringSchema,
};
pub use union::{
    discriminated_union, intersection, union, DiscriminatedUnionSchema, IntersectionSchema,
    UnionSchema,
};

/// Outcome of checking one input: `Ok(None)` means "absent and allowed"
pub type Checked = Result<Option<Value>, ValidationError>;

/// Shared, type-erased schema
pub type SchemaRef = Arc<dyn Schema>;

/// A validation node
pub trait Schema: Send + Sync {
    /// Declarative descriptor of this node and its children
    fn definition(&self) -> SchemaDefinition;

    /// Synchronous check
    fn check(&self, input: Option<&Value>) -> Checked;

    /// Asynchronous check; only nodes with async refinements need to override
    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        future::ready(self.check(input)).boxed()
    }

    /// True when this node or a descendant carries an async refinement
    fn is_async(&self) -> bool {
        false
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Validate a present value, returning the (possibly transformed) output
    fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        self.check(Some(value)).map(|v| v.unwrap_or(Value::Null))
    }

    /// Alias of [`Schema::validate`]
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        self.validate(value)
    }

    /// Validate an input that may be absent
    fn validate_input(&self, input: Option<&Value>) -> Checked {
        self.check(input)
    }

    /// Never fails; the outcome is reported in the result
    fn safe_validate(&self, value: &Value) -> ValidationResult {
        self.check(Some(value)).into()
    }

    /// Alias of [`Schema::safe_validate`]
    fn safe_parse(&self, value: &Value) -> ValidationResult {
        self.safe_validate(value)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
    ) -> BoxFuture<'a, Result<Value, ValidationError>> {
        self.check_async(Some(value))
            .map(|checked| checked.map(|v| v.unwrap_or(Value::Null)))
            .boxed()
    }

    fn safe_validate_async<'a>(&'a self, value: &'a Value) -> BoxFuture<'a, ValidationResult> {
        self.check_async(Some(value)).map(ValidationResult::from).boxed()
    }

    /// Validate, then deserialize the output into `T`
    fn parse_into<T: DeserializeOwned>(&self, value: &Value) -> Result<T, ValidationError>
    where
        Self: Sized,
    {
        let output = self.validate(value)?;
        serde_json::from_value(output).map_err(|e| {
            ValidationError::new(ValidationIssue::custom(format!(
                "Validated value does not fit target type: {}",
                e
            )))
        })
    }

    // ========================================================================
    // Combinators
    // ========================================================================

    /// Accept an absent input
    fn optional(self) -> Optional<Self>
    where
        Self: Sized,
    {
        Optional::new(self)
    }

    /// Accept an explicit `null`
    fn nullable(self) -> Nullable<Self>
    where
        Self: Sized,
    {
        Nullable::new(self)
    }

    /// Substitute `value` when the input is absent
    fn default(self, value: impl Into<Value>) -> WithDefault<Self>
    where
        Self: Sized,
    {
        WithDefault::new(self, value.into())
    }

    /// Reject outputs for which `predicate` returns false
    fn refine<F>(self, predicate: F, message: impl Into<String>) -> Refine<Self>
    where
        Self: Sized,
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.refine_at(predicate, message, Vec::new())
    }

    /// Like [`Schema::refine`], reporting the issue at `path`
    fn refine_at<F>(
        self,
        predicate: F,
        message: impl Into<String>,
        path: Vec<PathSegment>,
    ) -> Refine<Self>
    where
        Self: Sized,
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Refine::new(
            self,
            Refinement {
                check: RefinementCheck::Sync(Predicate::new(predicate)),
                message: message.into(),
                path,
            },
        )
    }

    /// Async refinement; only honored by the async entry points
    fn refine_async<F, Fut>(self, predicate: F, message: impl Into<String>) -> Refine<Self>
    where
        Self: Sized,
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = bool> + Send + 'static,
    {
        Refine::new(
            self,
            Refinement {
                check: RefinementCheck::Async(AsyncPredicate::new(predicate)),
                message: message.into(),
                path: Vec::new(),
            },
        )
    }

    /// Map the validated output; a panic in `f` propagates to the caller
    fn transform<F>(self, f: F) -> Transform<Self>
    where
        Self: Sized,
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Transform::new(self, MapperKind::Infallible(Mapper::new(f)))
    }

    /// Map the validated output; `Err(message)` becomes a `custom` issue
    fn try_transform<F>(self, f: F) -> Transform<Self>
    where
        Self: Sized,
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Transform::new(self, MapperKind::Fallible(FallibleMapper::new(f)))
    }

    /// Feed this schema's output into `next`
    fn pipe<T: Schema>(self, next: T) -> Pipe<Self, T>
    where
        Self: Sized,
    {
        Pipe::new(self, next)
    }

    /// Replace any failure with `value`
    fn catch(self, value: impl Into<Value>) -> Catch<Self>
    where
        Self: Sized,
    {
        Catch::new(self, value.into())
    }

    fn boxed(self) -> SchemaRef
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn definition(&self) -> SchemaDefinition {
        (**self).definition()
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        (**self).check(input)
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        (**self).check_async(input)
    }

    fn is_async(&self) -> bool {
        (**self).is_async()
    }
}

/// Render a panic payload as text
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("Validation callback panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("Validation callback panicked: {}", s)
    } else {
        "Validation callback panicked".to_string()
    }
}

/// Run a user callback, turning a panic into an `unknown_error`
pub(crate) fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, ValidationError> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| ValidationError::new(ValidationIssue::unknown(panic_message(payload.as_ref()))))
}
