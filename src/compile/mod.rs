//! Closure-composition compiler
//!
//! Turns a [`SchemaDefinition`] into a tree of boxed closures. Leaf checks
//! call the same functions the interpreted schemas use, and composites reuse
//! the same aggregation helpers, so a compiled validator is observably
//! equivalent to `Schema::check` on every input.
//!
//! Children are compiled through the [`ValidatorCache`], so structurally
//! identical sub-trees share one compiled entry.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::CompilerConfig;
use crate::error::{Issues, ValidationError, ValidationResult};
use crate::schema::collections::{check_array_bounds, check_unique, collect_item, expect_array};
use crate::schema::conditional::{evaluate, label_branch};
use crate::schema::object::{collect_field, expect_object, finish_object};
use crate::schema::primitives::{
    check_boolean, check_enum, check_literal, check_null, check_number, check_string,
};
use crate::schema::union::{combine_sides, describe_members, union_failure, DiscriminatorMatch};
use crate::schema::{guarded, Checked, SchemaDefinition};

pub mod cache;
pub mod fingerprint;

pub use cache::{CacheStats, ValidatorCache};
pub use fingerprint::Fingerprint;

pub(crate) type CompiledFn = Arc<dyn Fn(Option<&Value>) -> Checked + Send + Sync>;

fn node<F>(f: F) -> CompiledFn
where
    F: Fn(Option<&Value>) -> Checked + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A specialized validator derived from a schema definition
pub struct CompiledValidator {
    fingerprint: Fingerprint,
    definition: SchemaDefinition,
    depth: usize,
    complexity: usize,
    func: CompiledFn,
}

impl CompiledValidator {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn complexity(&self) -> usize {
        self.complexity
    }

    /// Async refinements report `async_in_sync` on this path
    pub fn is_async(&self) -> bool {
        self.definition.is_async()
    }

    pub fn check(&self, input: Option<&Value>) -> Checked {
        (self.func)(input)
    }

    pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        self.check(Some(value)).map(|v| v.unwrap_or(Value::Null))
    }

    pub fn safe_validate(&self, value: &Value) -> ValidationResult {
        self.check(Some(value)).into()
    }

    pub(crate) fn handle(&self) -> CompiledFn {
        Arc::clone(&self.func)
    }
}

impl fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledValidator")
            .field("fingerprint", &self.fingerprint.short())
            .field("kind", &self.definition.kind_name())
            .field("depth", &self.depth)
            .field("complexity", &self.complexity)
            .finish()
    }
}

/// Compile `definition`, resolving children through `cache`
pub(crate) fn compile(
    definition: &SchemaDefinition,
    fingerprint: Fingerprint,
    cache: &ValidatorCache,
    options: &CompilerConfig,
) -> CompiledValidator {
    CompiledValidator {
        fingerprint,
        depth: definition.depth(),
        complexity: definition.complexity(),
        func: build(definition, cache, options),
        definition: definition.clone(),
    }
}

fn build(definition: &SchemaDefinition, cache: &ValidatorCache, options: &CompilerConfig) -> CompiledFn {
    let child = |d: &SchemaDefinition| cache.get_or_compile(d, options).handle();

    match definition {
        SchemaDefinition::String { checks, coerce } => {
            let (checks, coerce) = (checks.clone(), *coerce);
            node(move |input| check_string(&checks, coerce, input))
        }
        SchemaDefinition::Number { checks, coerce } => {
            let (checks, coerce) = (checks.clone(), *coerce);
            node(move |input| check_number(&checks, coerce, input))
        }
        SchemaDefinition::Boolean { coerce } => {
            let coerce = *coerce;
            node(move |input| check_boolean(coerce, input))
        }
        SchemaDefinition::Null => node(check_null),
        SchemaDefinition::Any => node(|input| Ok(input.cloned())),
        SchemaDefinition::Literal { value } => {
            let value = value.clone();
            node(move |input| check_literal(&value, input))
        }
        SchemaDefinition::Enum { values } => {
            let values = values.clone();
            node(move |input| check_enum(&values, input))
        }

        // Wrappers
        SchemaDefinition::Optional { inner } => {
            let inner = child(inner);
            node(move |input| match input {
                None => Ok(None),
                Some(_) => inner(input),
            })
        }
        SchemaDefinition::Nullable { inner } => {
            let inner = child(inner);
            node(move |input| match input {
                Some(Value::Null) => Ok(Some(Value::Null)),
                _ => inner(input),
            })
        }
        SchemaDefinition::Default { inner, value } => {
            let (inner, value) = (child(inner), value.clone());
            node(move |input| match input {
                None => Ok(Some(value.clone())),
                Some(_) => inner(input),
            })
        }
        SchemaDefinition::Refine { inner, refinement } => {
            let (inner, refinement) = (child(inner), refinement.clone());
            node(move |input| match inner(input)? {
                Some(value) => refinement.apply_sync(value),
                None => Ok(None),
            })
        }
        SchemaDefinition::Transform { inner, mapper } => {
            let (inner, mapper) = (child(inner), mapper.clone());
            node(move |input| match inner(input)? {
                Some(value) => mapper.apply(value).map(Some),
                None => Ok(None),
            })
        }
        SchemaDefinition::Pipe { first, second } => {
            let (first, second) = (child(first), child(second));
            node(move |input| {
                let intermediate = first(input)?;
                second(intermediate.as_ref())
            })
        }
        SchemaDefinition::Catch { inner, value } => {
            let (inner, value) = (child(inner), value.clone());
            node(move |input| match guarded(|| inner(input)) {
                Ok(Ok(output)) => Ok(output),
                _ => Ok(Some(value.clone())),
            })
        }

        // Composites
        SchemaDefinition::Object {
            shape,
            unknown_keys,
        } => {
            let fields: Vec<(String, CompiledFn)> =
                shape.iter().map(|(k, d)| (k.clone(), child(d))).collect();
            let known: HashSet<String> = shape.iter().map(|(k, _)| k.clone()).collect();
            let policy = *unknown_keys;
            node(move |input| {
                let map = expect_object(input)?;
                let mut out = Map::new();
                let mut issues = Issues::new();
                for (key, field) in &fields {
                    collect_field(&mut out, &mut issues, key, field(map.get(key)));
                }
                finish_object(policy, map, |k| known.contains(k), out, issues)
            })
        }
        SchemaDefinition::Array { item, checks } => {
            let (item, checks) = (child(item), checks.clone());
            let unroll = options.unroll_threshold;
            let chunk = options.batch_size.max(1);
            node(move |input| {
                let items = expect_array(input)?;
                check_array_bounds(&checks, items.len())?;

                let mut issues = Issues::new();
                let mut out = Vec::with_capacity(items.len().min(unroll.max(chunk)));
                if items.len() <= unroll {
                    for (index, element) in items.iter().enumerate() {
                        collect_item(&mut out, &mut issues, index, item(Some(element)));
                    }
                } else {
                    for (n, block) in items.chunks(chunk).enumerate() {
                        out.reserve(block.len());
                        let base = n * chunk;
                        for (offset, element) in block.iter().enumerate() {
                            collect_item(&mut out, &mut issues, base + offset, item(Some(element)));
                        }
                    }
                }
                issues.finish(())?;
                check_unique(&checks, &out)?;
                Ok(Some(Value::Array(out)))
            })
        }
        SchemaDefinition::Record { value } => {
            let value = child(value);
            node(move |input| {
                let map = expect_object(input)?;
                let mut out = Map::new();
                let mut issues = Issues::new();
                for (key, entry) in map {
                    collect_field(&mut out, &mut issues, key, value(Some(entry)));
                }
                issues.finish(Some(Value::Object(out)))
            })
        }
        SchemaDefinition::Union { members } => {
            let expected = describe_members(members);
            let members: Vec<CompiledFn> = members.iter().map(child).collect();
            node(move |input| {
                for member in &members {
                    if let Ok(output) = member(input) {
                        return Ok(output);
                    }
                }
                Err(union_failure(&expected, input))
            })
        }
        SchemaDefinition::Intersection { left, right } => {
            let (left, right) = (child(left), child(right));
            node(move |input| combine_sides(left(input), right(input)))
        }
        SchemaDefinition::DiscriminatedUnion {
            discriminator,
            members,
        } => {
            let key = discriminator.clone();
            let members: Vec<CompiledFn> = members.iter().map(child).collect();
            node(move |input| {
                let mut resolution = DiscriminatorMatch::begin(&key, input)?;
                for member in &members {
                    if let Some(output) = resolution.offer(member(input)) {
                        return Ok(output);
                    }
                }
                Err(resolution.fail())
            })
        }
        SchemaDefinition::Conditional {
            condition,
            when_true,
            when_false,
        } => {
            let condition = condition.clone();
            let (when_true, when_false) = (child(when_true), child(when_false));
            node(move |input| {
                let matched = evaluate(&condition, input)?;
                let branch = if matched { &when_true } else { &when_false };
                label_branch(matched, branch(input))
            })
        }
    }
}
