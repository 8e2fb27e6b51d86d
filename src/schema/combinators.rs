//! Wrapper schemas: optional, nullable, default, refine, transform, pipe, catch

use std::panic::AssertUnwindSafe;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use super::collections::{ArrayCheck, ArrayChecks};
use super::definition::{MapperKind, Refinement, SchemaDefinition};
use super::primitives::{NumberCheck, NumberChecks, StringCheck, StringChecks};
use super::{guarded, Checked, Schema};

/// Wrappers that can rebuild themselves around a modified inner schema
pub trait Rewrap: Sized {
    type Inner;

    fn rewrap(self, f: impl FnOnce(Self::Inner) -> Self::Inner) -> Self;
}

macro_rules! wrapper_rewrap {
    ($wrapper:ident) => {
        impl<S> Rewrap for $wrapper<S> {
            type Inner = S;

            fn rewrap(mut self, f: impl FnOnce(S) -> S) -> Self {
                self.inner = f(self.inner);
                self
            }
        }
    };
}

/// Forward the leaf capability traits through a wrapper
macro_rules! forward_checks {
    ($($wrapper:ident),* $(,)?) => {$(
        wrapper_rewrap!($wrapper);

        impl<S: StringChecks> StringChecks for $wrapper<S> {
            fn with_string_check(self, check: StringCheck) -> Self {
                self.rewrap(|inner| inner.with_string_check(check))
            }
        }

        impl<S: NumberChecks> NumberChecks for $wrapper<S> {
            fn with_number_check(self, check: NumberCheck) -> Self {
                self.rewrap(|inner| inner.with_number_check(check))
            }
        }

        impl<S: ArrayChecks> ArrayChecks for $wrapper<S> {
            fn with_array_check(self, check: ArrayCheck) -> Self {
                self.rewrap(|inner| inner.with_array_check(check))
            }
        }
    )*};
}

forward_checks!(Optional, Nullable, WithDefault, Refine, Catch);

// ============================================================================
// Optional / Nullable / Default
// ============================================================================

#[derive(Debug, Clone)]
pub struct Optional<S> {
    inner: S,
}

impl<S> Optional<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Schema> Schema for Optional<S> {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Optional {
            inner: Box::new(self.inner.definition()),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        match input {
            None => Ok(None),
            Some(_) => self.inner.check(input),
        }
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        match input {
            None => futures::future::ready(Ok(None)).boxed(),
            Some(_) => self.inner.check_async(input),
        }
    }

    fn is_async(&self) -> bool {
        self.inner.is_async()
    }
}

#[derive(Debug, Clone)]
pub struct Nullable<S> {
    inner: S,
}

impl<S> Nullable<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Schema> Schema for Nullable<S> {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Nullable {
            inner: Box::new(self.inner.definition()),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        match input {
            Some(Value::Null) => Ok(Some(Value::Null)),
            _ => self.inner.check(input),
        }
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        match input {
            Some(Value::Null) => futures::future::ready(Ok(Some(Value::Null))).boxed(),
            _ => self.inner.check_async(input),
        }
    }

    fn is_async(&self) -> bool {
        self.inner.is_async()
    }
}

#[derive(Debug, Clone)]
pub struct WithDefault<S> {
    inner: S,
    value: Value,
}

impl<S> WithDefault<S> {
    pub fn new(inner: S, value: Value) -> Self {
        Self { inner, value }
    }
}

impl<S: Schema> Schema for WithDefault<S> {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Default {
            inner: Box::new(self.inner.definition()),
            value: self.value.clone(),
        }
    }

    /// The default is returned as-is, without running the inner schema
    fn check(&self, input: Option<&Value>) -> Checked {
        match input {
            None => Ok(Some(self.value.clone())),
            Some(_) => self.inner.check(input),
        }
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        match input {
            None => futures::future::ready(Ok(Some(self.value.clone()))).boxed(),
            Some(_) => self.inner.check_async(input),
        }
    }

    fn is_async(&self) -> bool {
        self.inner.is_async()
    }
}

// ============================================================================
// Refine / Transform
// ============================================================================

#[derive(Debug, Clone)]
pub struct Refine<S> {
    inner: S,
    refinement: Refinement,
}

impl<S> Refine<S> {
    pub fn new(inner: S, refinement: Refinement) -> Self {
        Self { inner, refinement }
    }
}

impl<S: Schema> Schema for Refine<S> {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Refine {
            inner: Box::new(self.inner.definition()),
            refinement: self.refinement.clone(),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        match self.inner.check(input)? {
            Some(value) => self.refinement.apply_sync(value),
            None => Ok(None),
        }
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            match self.inner.check_async(input).await? {
                Some(value) => self.refinement.apply_async(value).await,
                None => Ok(None),
            }
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.refinement.is_async() || self.inner.is_async()
    }
}

#[derive(Debug, Clone)]
pub struct Transform<S> {
    inner: S,
    mapper: MapperKind,
}

impl<S> Transform<S> {
    pub fn new(inner: S, mapper: MapperKind) -> Self {
        Self { inner, mapper }
    }
}

impl<S: Schema> Schema for Transform<S> {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Transform {
            inner: Box::new(self.inner.definition()),
            mapper: self.mapper.clone(),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        match self.inner.check(input)? {
            Some(value) => self.mapper.apply(value).map(Some),
            None => Ok(None),
        }
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            match self.inner.check_async(input).await? {
                Some(value) => self.mapper.apply(value).map(Some),
                None => Ok(None),
            }
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.inner.is_async()
    }
}

// ============================================================================
// Pipe / Catch
// ============================================================================

#[derive(Debug, Clone)]
pub struct Pipe<A, B> {
    first: A,
    second: B,
}

impl<A, B> Pipe<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Schema, B: Schema> Schema for Pipe<A, B> {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Pipe {
            first: Box::new(self.first.definition()),
            second: Box::new(self.second.definition()),
        }
    }

    fn check(&self, input: Option<&Value>) -> Checked {
        let intermediate = self.first.check(input)?;
        self.second.check(intermediate.as_ref())
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            let intermediate = self.first.check_async(input).await?;
            self.second.check_async(intermediate.as_ref()).await
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.first.is_async() || self.second.is_async()
    }
}

#[derive(Debug, Clone)]
pub struct Catch<S> {
    inner: S,
    value: Value,
}

impl<S> Catch<S> {
    pub fn new(inner: S, value: Value) -> Self {
        Self { inner, value }
    }
}

impl<S: Schema> Schema for Catch<S> {
    fn definition(&self) -> SchemaDefinition {
        SchemaDefinition::Catch {
            inner: Box::new(self.inner.definition()),
            value: self.value.clone(),
        }
    }

    /// Any failure, including a panicking transform, yields the fallback
    fn check(&self, input: Option<&Value>) -> Checked {
        match guarded(|| self.inner.check(input)) {
            Ok(Ok(value)) => Ok(value),
            _ => Ok(Some(self.value.clone())),
        }
    }

    fn check_async<'a>(&'a self, input: Option<&'a Value>) -> BoxFuture<'a, Checked> {
        async move {
            match AssertUnwindSafe(self.inner.check_async(input))
                .catch_unwind()
                .await
            {
                Ok(Ok(value)) => Ok(value),
                _ => Ok(Some(self.value.clone())),
            }
        }
        .boxed()
    }

    fn is_async(&self) -> bool {
        self.inner.is_async()
    }
}
