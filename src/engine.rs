//! Engine context
//!
//! An [`Engine`] owns everything that used to be process-wide: the compiled
//! validator cache, the optional accelerator, configuration and counters.
//!
//! ## Lifecycle
//!
//! 1. Build once with [`Engine::new`] (or [`Engine::from_config_file`]).
//! 2. Share it behind an `Arc`; every method takes `&self`.
//! 3. Tear down cached state with [`Engine::clear`] or by dropping it.
//!
//! Hot paths should compile a schema once with [`Engine::compile`] and reuse
//! the handle with [`Engine::run`]; [`Engine::validate`] recomputes the
//! definition fingerprint on every call.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::accelerator::{agrees, Accelerator};
use crate::compile::{CacheStats, CompiledValidator, ValidatorCache};
use crate::config::EngineConfig;
use crate::error::{ValidationError, ValidationResult};
use crate::schema::{guarded, Checked, Schema, SchemaDefinition};

/// Point-in-time engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub cache: CacheStats,
    /// Calls answered by the accelerator
    pub accelerated: u64,
    /// Accelerator calls that fell back to the compiled path
    pub fallbacks: u64,
}

pub struct Engine {
    config: EngineConfig,
    cache: ValidatorCache,
    accelerator: Option<Arc<dyn Accelerator>>,
    accelerated: AtomicU64,
    fallbacks: AtomicU64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cache: ValidatorCache::new(),
            accelerator: None,
            accelerated: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Build from the layered configuration sources
    pub fn from_config_file(path: Option<&Path>) -> Result<Self, config_crate::ConfigError> {
        EngineConfig::load_from(path).map(Self::new)
    }

    /// Register an accelerator backend
    pub fn with_accelerator(mut self, accelerator: Arc<dyn Accelerator>) -> Self {
        debug!(backend = accelerator.name(), "Registered accelerator");
        self.accelerator = Some(accelerator);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ValidatorCache {
        &self.cache
    }

    /// Compiled validator for `schema`, shared with every structurally identical schema
    pub fn compile(&self, schema: &dyn Schema) -> Arc<CompiledValidator> {
        self.compile_definition(&schema.definition())
    }

    pub fn compile_definition(&self, definition: &SchemaDefinition) -> Arc<CompiledValidator> {
        self.cache.get_or_compile(definition, &self.config.compiler)
    }

    fn active_accelerator(&self, compiled: &CompiledValidator) -> Option<&Arc<dyn Accelerator>> {
        if !self.config.accelerator.enabled || compiled.is_async() {
            return None;
        }
        self.accelerator
            .as_ref()
            .filter(|a| guarded(|| a.supports(compiled.definition())).unwrap_or(false))
    }

    fn record_fallback(&self, backend: &str, reason: &str) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        warn!(backend, reason, "Accelerator fallback");
    }

    /// Check `input` with a compiled validator, delegating to the accelerator
    /// when one is registered and supports the definition
    pub fn run(&self, compiled: &CompiledValidator, input: Option<&Value>) -> Checked {
        if let (Some(accelerator), Some(value)) = (self.active_accelerator(compiled), input) {
            let backend = accelerator.name();
            match guarded(|| accelerator.validate(compiled.definition(), value)) {
                Ok(Ok(remote)) if !self.config.accelerator.verify_results => {
                    self.accelerated.fetch_add(1, Ordering::Relaxed);
                    return remote.into_result();
                }
                Ok(Ok(remote)) => {
                    let local = compiled.check(input);
                    if agrees(&ValidationResult::from(local.clone()), &remote) {
                        self.accelerated.fetch_add(1, Ordering::Relaxed);
                    } else {
                        self.record_fallback(backend, "result mismatch");
                    }
                    return local;
                }
                Ok(Err(error)) => self.record_fallback(backend, &error.to_string()),
                Err(panic) => self.record_fallback(backend, &panic.first().message),
            }
        }
        compiled.check(input)
    }

    /// Validate through the compiled path, or the interpreter when compilation is disabled
    pub fn validate_input(&self, schema: &dyn Schema, input: Option<&Value>) -> Checked {
        if !self.config.compiler.enabled {
            return schema.check(input);
        }
        let compiled = self.compile(schema);
        self.run(&compiled, input)
    }

    pub fn validate(&self, schema: &dyn Schema, value: &Value) -> Result<Value, ValidationError> {
        self.validate_input(schema, Some(value))
            .map(|v| v.unwrap_or(Value::Null))
    }

    pub fn safe_validate(&self, schema: &dyn Schema, value: &Value) -> ValidationResult {
        self.validate_input(schema, Some(value)).into()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cache: self.cache.stats(),
            accelerated: self.accelerated.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }

    /// Drop cached validators and reset counters
    pub fn clear(&self) {
        self.cache.clear();
        self.accelerated.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accelerator::AcceleratorError;
    use crate::error::IssueCode;
    use crate::schema::{number, object, string, NumberChecks, StringChecks};
    use serde_json::json;

    struct Failing;

    impl Accelerator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn supports(&self, _: &SchemaDefinition) -> bool {
            true
        }

        fn validate(&self, _: &SchemaDefinition, _: &Value) -> Result<ValidationResult, AcceleratorError> {
            Err(AcceleratorError::Backend("trap".into()))
        }
    }

    #[test]
    fn test_engine_validates_and_caches() {
        let engine = Engine::default();
        let schema = object().field("n", number().int());

        assert_eq!(engine.validate(&schema, &json!({"n": 1})).unwrap(), json!({"n": 1}));
        assert!(engine.validate(&schema, &json!({"n": 1.5})).is_err());

        let stats = engine.stats();
        assert_eq!(stats.cache.entries, 2);
        assert!(stats.cache.hits >= 1);
    }

    #[test]
    fn test_disabled_compiler_uses_interpreter() {
        let mut config = EngineConfig::default();
        config.compiler.enabled = false;
        let engine = Engine::new(config);

        let err = engine.validate(&string().email(), &json!("x")).unwrap_err();
        assert_eq!(err.first().code, IssueCode::InvalidString);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_failing_accelerator_falls_back() {
        let engine = Engine::default().with_accelerator(Arc::new(Failing));
        let schema = string().min_length(2);

        assert!(engine.validate(&schema, &json!("ok")).is_ok());
        assert!(engine.validate(&schema, &json!("x")).is_err());
        assert_eq!(engine.stats().fallbacks, 2);
        assert_eq!(engine.stats().accelerated, 0);
    }

    #[test]
    fn test_clear_resets_state() {
        let engine = Engine::default().with_accelerator(Arc::new(Failing));
        engine.validate(&string(), &json!("a")).unwrap();
        engine.clear();
        assert_eq!(engine.stats(), EngineStats::default());
    }
}
