//! Declarative schema descriptors
//!
//! A [`SchemaDefinition`] is the immutable, introspectable description of a
//! schema tree. It is what the compiler consumes and, once canonicalized, what
//! the compiled-validator cache is keyed on. User callbacks cannot be
//! serialized, so each [`Callback`] carries a process-unique id instead: two
//! definitions share a cache entry only when they share the same closures.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::collections::ArrayCheck;
use super::object::UnknownKeys;
use super::primitives::{NumberCheck, StringCheck};
use super::{panic_message, Checked};
use crate::error::{PathSegment, ValidationError, ValidationIssue};

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

/// A shared user callback with a stable identity
pub struct Callback<F: ?Sized> {
    id: u64,
    func: Arc<F>,
}

impl<F: ?Sized> Callback<F> {
    fn from_arc(func: Arc<F>) -> Self {
        Self {
            id: NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed),
            func,
        }
    }

    /// Process-unique id of this callback
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn get(&self) -> &F {
        &self.func
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Arc::clone(&self.func),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback#{}", self.id)
    }
}

impl<F: ?Sized> Serialize for Callback<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.id)
    }
}

pub type Predicate = Callback<dyn Fn(&Value) -> bool + Send + Sync>;
pub type AsyncPredicate = Callback<dyn Fn(Value) -> BoxFuture<'static, bool> + Send + Sync>;
pub type Mapper = Callback<dyn Fn(Value) -> Value + Send + Sync>;
pub type FallibleMapper = Callback<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;
pub type Condition = Callback<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::from_arc(Arc::new(f))
    }
}

impl AsyncPredicate {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = bool> + Send + 'static,
    {
        Self::from_arc(Arc::new(move |value: Value| f(value).boxed()))
    }
}

impl Mapper {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::from_arc(Arc::new(f))
    }
}

impl FallibleMapper {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::from_arc(Arc::new(f))
    }
}

impl Condition {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self::from_arc(Arc::new(f))
    }
}

/// Sync or async refinement predicate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementCheck {
    Sync(Predicate),
    Async(AsyncPredicate),
}

/// A predicate applied to an already-validated value
#[derive(Debug, Clone, Serialize)]
pub struct Refinement {
    pub check: RefinementCheck,
    pub message: String,
    pub path: Vec<PathSegment>,
}

impl Refinement {
    fn rejected(&self) -> ValidationError {
        ValidationError::new(ValidationIssue::custom(self.message.clone()).at(self.path.clone()))
    }

    /// Run on the synchronous path; async predicates are contract misuse here
    pub(crate) fn apply_sync(&self, value: Value) -> Checked {
        match &self.check {
            RefinementCheck::Sync(predicate) => {
                match std::panic::catch_unwind(AssertUnwindSafe(|| predicate.get()(&value))) {
                    Ok(true) => Ok(Some(value)),
                    Ok(false) => Err(self.rejected()),
                    Err(payload) => Err(ValidationError::new(ValidationIssue::unknown(
                        panic_message(payload.as_ref()),
                    ))),
                }
            }
            RefinementCheck::Async(_) => Err(ValidationError::new(ValidationIssue::new(
                crate::error::IssueCode::AsyncInSync,
                "Asynchronous refinement encountered during synchronous validation; use validate_async",
            ))),
        }
    }

    pub(crate) async fn apply_async(&self, value: Value) -> Checked {
        match &self.check {
            RefinementCheck::Sync(_) => self.apply_sync(value),
            RefinementCheck::Async(predicate) => {
                let pending = predicate.get()(value.clone());
                match AssertUnwindSafe(pending).catch_unwind().await {
                    Ok(true) => Ok(Some(value)),
                    Ok(false) => Err(self.rejected()),
                    Err(payload) => Err(ValidationError::new(ValidationIssue::unknown(
                        panic_message(payload.as_ref()),
                    ))),
                }
            }
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self.check, RefinementCheck::Async(_))
    }
}

/// Output mapping applied by `transform` / `try_transform`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperKind {
    /// Unguarded: a panic escapes every entry point
    Infallible(Mapper),
    /// `Err(message)` becomes a `custom` issue
    Fallible(FallibleMapper),
}

impl MapperKind {
    pub(crate) fn apply(&self, value: Value) -> Result<Value, ValidationError> {
        match self {
            MapperKind::Infallible(mapper) => Ok(mapper.get()(value)),
            MapperKind::Fallible(mapper) => mapper
                .get()(value)
                .map_err(|message| ValidationError::new(ValidationIssue::custom(message))),
        }
    }
}

/// Immutable declarative descriptor of a schema tree
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaDefinition {
    String {
        checks: Vec<StringCheck>,
        coerce: bool,
    },
    Number {
        checks: Vec<NumberCheck>,
        coerce: bool,
    },
    Boolean {
        coerce: bool,
    },
    Null,
    Any,
    Literal {
        value: Value,
    },
    Enum {
        values: Vec<String>,
    },
    Optional {
        inner: Box<SchemaDefinition>,
    },
    Nullable {
        inner: Box<SchemaDefinition>,
    },
    Default {
        inner: Box<SchemaDefinition>,
        value: Value,
    },
    Refine {
        inner: Box<SchemaDefinition>,
        refinement: Refinement,
    },
    Transform {
        inner: Box<SchemaDefinition>,
        mapper: MapperKind,
    },
    Pipe {
        first: Box<SchemaDefinition>,
        second: Box<SchemaDefinition>,
    },
    Catch {
        inner: Box<SchemaDefinition>,
        value: Value,
    },
    Object {
        shape: Vec<(String, SchemaDefinition)>,
        unknown_keys: UnknownKeys,
    },
    Array {
        item: Box<SchemaDefinition>,
        checks: Vec<ArrayCheck>,
    },
    Record {
        value: Box<SchemaDefinition>,
    },
    Union {
        members: Vec<SchemaDefinition>,
    },
    Intersection {
        left: Box<SchemaDefinition>,
        right: Box<SchemaDefinition>,
    },
    DiscriminatedUnion {
        discriminator: String,
        members: Vec<SchemaDefinition>,
    },
    Conditional {
        condition: Condition,
        when_true: Box<SchemaDefinition>,
        when_false: Box<SchemaDefinition>,
    },
}

impl SchemaDefinition {
    /// Short kind tag (`string`, `object`, ...)
    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaDefinition::String { .. } => "string",
            SchemaDefinition::Number { .. } => "number",
            SchemaDefinition::Boolean { .. } => "boolean",
            SchemaDefinition::Null => "null",
            SchemaDefinition::Any => "any",
            SchemaDefinition::Literal { .. } => "literal",
            SchemaDefinition::Enum { .. } => "enum",
            SchemaDefinition::Optional { .. } => "optional",
            SchemaDefinition::Nullable { .. } => "nullable",
            SchemaDefinition::Default { .. } => "default",
            SchemaDefinition::Refine { .. } => "refine",
            SchemaDefinition::Transform { .. } => "transform",
            SchemaDefinition::Pipe { .. } => "pipe",
            SchemaDefinition::Catch { .. } => "catch",
            SchemaDefinition::Object { .. } => "object",
            SchemaDefinition::Array { .. } => "array",
            SchemaDefinition::Record { .. } => "record",
            SchemaDefinition::Union { .. } => "union",
            SchemaDefinition::Intersection { .. } => "intersection",
            SchemaDefinition::DiscriminatedUnion { .. } => "discriminated_union",
            SchemaDefinition::Conditional { .. } => "conditional",
        }
    }

    /// Human-readable type used in `expected` fields; wrappers report their inner type
    pub fn describe(&self) -> String {
        match self {
            SchemaDefinition::Literal { value } => value.to_string(),
            SchemaDefinition::Optional { inner } => format!("{} | undefined", inner.describe()),
            SchemaDefinition::Nullable { inner } => format!("{} | null", inner.describe()),
            SchemaDefinition::Default { inner, .. }
            | SchemaDefinition::Refine { inner, .. }
            | SchemaDefinition::Transform { inner, .. }
            | SchemaDefinition::Catch { inner, .. } => inner.describe(),
            SchemaDefinition::Pipe { first, .. } => first.describe(),
            SchemaDefinition::Union { members } => members
                .iter()
                .map(|m| m.describe())
                .collect::<Vec<_>>()
                .join(" | "),
            other => other.kind_name().to_string(),
        }
    }

    /// Direct children in declaration order
    pub fn children(&self) -> Vec<&SchemaDefinition> {
        match self {
            SchemaDefinition::String { .. }
            | SchemaDefinition::Number { .. }
            | SchemaDefinition::Boolean { .. }
            | SchemaDefinition::Null
            | SchemaDefinition::Any
            | SchemaDefinition::Literal { .. }
            | SchemaDefinition::Enum { .. } => Vec::new(),
            SchemaDefinition::Optional { inner }
            | SchemaDefinition::Nullable { inner }
            | SchemaDefinition::Default { inner, .. }
            | SchemaDefinition::Refine { inner, .. }
            | SchemaDefinition::Transform { inner, .. }
            | SchemaDefinition::Catch { inner, .. } => vec![inner.as_ref()],
            SchemaDefinition::Pipe { first, second } => vec![first.as_ref(), second.as_ref()],
            SchemaDefinition::Object { shape, .. } => shape.iter().map(|(_, d)| d).collect(),
            SchemaDefinition::Array { item, .. } => vec![item.as_ref()],
            SchemaDefinition::Record { value } => vec![value.as_ref()],
            SchemaDefinition::Union { members }
            | SchemaDefinition::DiscriminatedUnion { members, .. } => members.iter().collect(),
            SchemaDefinition::Intersection { left, right } => vec![left.as_ref(), right.as_ref()],
            SchemaDefinition::Conditional {
                when_true,
                when_false,
                ..
            } => vec![when_true.as_ref(), when_false.as_ref()],
        }
    }

    /// True when any node carries an async refinement
    pub fn is_async(&self) -> bool {
        match self {
            SchemaDefinition::Refine { refinement, inner } => {
                refinement.is_async() || inner.is_async()
            }
            other => other.children().iter().any(|c| c.is_async()),
        }
    }

    /// Maximum nesting depth of composite nodes
    pub fn depth(&self) -> usize {
        let children = self.children();
        let deepest = children.iter().map(|c| c.depth()).max().unwrap_or(0);
        match self {
            SchemaDefinition::Object { .. }
            | SchemaDefinition::Array { .. }
            | SchemaDefinition::Record { .. }
            | SchemaDefinition::Union { .. }
            | SchemaDefinition::Intersection { .. }
            | SchemaDefinition::DiscriminatedUnion { .. }
            | SchemaDefinition::Conditional { .. } => 1 + deepest,
            _ => deepest,
        }
    }

    /// Rough per-call cost estimate
    pub fn complexity(&self) -> usize {
        let own = match self {
            SchemaDefinition::String { checks, .. } => {
                1 + checks
                    .iter()
                    .map(|c| match c {
                        StringCheck::Regex(_) => 10,
                        StringCheck::Format(_) => 5,
                        _ => 1,
                    })
                    .sum::<usize>()
            }
            SchemaDefinition::Number { checks, .. } => 1 + checks.len(),
            SchemaDefinition::Boolean { .. }
            | SchemaDefinition::Null
            | SchemaDefinition::Any
            | SchemaDefinition::Literal { .. } => 1,
            SchemaDefinition::Enum { values } => 1 + values.len() / 4,
            SchemaDefinition::Array { .. } => 5,
            SchemaDefinition::Record { .. } => 5,
            SchemaDefinition::Object { .. } => 10,
            SchemaDefinition::Union { .. } | SchemaDefinition::DiscriminatedUnion { .. } => 20,
            SchemaDefinition::Intersection { .. } => 15,
            SchemaDefinition::Refine { refinement, .. } => {
                if refinement.is_async() {
                    50
                } else {
                    3
                }
            }
            _ => 2,
        };
        own + self.children().iter().map(|c| c.complexity()).sum::<usize>()
    }

    /// Canonical JSON: object keys sorted at every level
    pub fn canonical_json(&self) -> String {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        let mut out = String::new();
        write_canonical(&value, &mut out);
        out
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
