//! Concurrency-controlled batch validation
//!
//! A [`BatchRunner`] validates many `(schema, datum)` pairs with at most
//! `max_concurrency` items running at once. Items move through
//! `Pending -> Running -> {Succeeded, Failed}`; the batch ends as
//! `Completed`, `Cancelled` or `TimedOut`.
//!
//! ## Semantics
//!
//! - Results are returned in submission order whatever the completion order.
//! - `stop_on_first_error` stops admission and fails with
//!   [`BatchError::ItemFailed`] as soon as a failure is observed.
//! - Timeout and cancellation stop admission and return what has completed.
//!   Running items are not aborted; their late results are discarded.
//! - A panicking item (an unguarded `transform`) is recorded as an
//!   `unknown_error` failure instead of tearing down the batch. A task lost
//!   to the runtime is recorded the same way.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::compile::CompiledValidator;
use crate::config::BatchConfig;
use crate::engine::Engine;
use crate::error::{ValidationError, ValidationIssue, ValidationResult};
use crate::schema::{panic_message, SchemaRef};

pub mod cancel;
pub mod stats;

pub use cancel::CancellationToken;
pub use stats::BatchStats;

// ============================================================================
// Types
// ============================================================================

/// One unit of work
#[derive(Clone)]
pub struct BatchItem {
    pub schema: SchemaRef,
    pub datum: Value,
    pub identifier: Option<String>,
}

impl BatchItem {
    pub fn new(schema: SchemaRef, datum: Value) -> Self {
        Self {
            schema,
            datum,
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub max_concurrency: usize,
    pub stop_on_first_error: bool,
    pub timeout: Duration,
    pub cancellation: Option<CancellationToken>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            stop_on_first_error: config.stop_on_first_error,
            timeout: config.timeout(),
            cancellation: None,
        }
    }
}

impl BatchOptions {
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn stop_on_first_error(mut self, stop: bool) -> Self {
        self.stop_on_first_error = stop;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    Cancelled,
    TimedOut,
}

/// Outcome of one item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    /// Position in the submitted list
    pub index: usize,
    pub identifier: Option<String>,
    pub result: ValidationResult,
    /// Time spent validating
    pub duration: Duration,
    /// Offsets from batch start
    pub started: Duration,
    pub finished: Duration,
}

/// Bookkeeping for a spawned item, used when its task never reports back
#[derive(Debug, Clone)]
struct Spawned {
    index: usize,
    identifier: Option<String>,
    started: Duration,
}

impl Spawned {
    fn lost(self, error: &JoinError, finished: Duration) -> BatchResult {
        let message = if error.is_panic() {
            "Batch task panicked"
        } else {
            "Batch task was cancelled"
        };
        BatchResult {
            index: self.index,
            identifier: self.identifier,
            result: ValidationResult::failure(ValidationError::new(ValidationIssue::unknown(message))),
            duration: finished.saturating_sub(self.started),
            started: self.started,
            finished,
        }
    }
}

impl BatchResult {
    pub fn state(&self) -> ItemState {
        if self.result.success {
            ItemState::Succeeded
        } else {
            ItemState::Failed
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub status: BatchStatus,
    /// Completed items, ordered by index
    pub results: Vec<BatchResult>,
    /// Final state of every submitted item
    pub states: Vec<ItemState>,
    pub stats: BatchStats,
    pub started_at: DateTime<Utc>,
}

impl BatchReport {
    /// Indices that never completed
    pub fn unfinished(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, ItemState::Pending | ItemState::Running))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchResult> {
        self.results.iter().filter(|r| !r.result.success)
    }

    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Completed && self.results.len() == self.states.len()
    }
}

#[derive(Error, Debug, Clone)]
pub enum BatchError {
    #[error("Batch item {index} failed: {error}")]
    ItemFailed {
        index: usize,
        identifier: Option<String>,
        error: ValidationError,
    },

    #[error("Invalid batch options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, BatchError>;

// ============================================================================
// Runner
// ============================================================================

/// Runs batches, optionally through an [`Engine`] for compiled validation
#[derive(Clone, Default)]
pub struct BatchRunner {
    engine: Option<Arc<Engine>>,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: Arc<Engine>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Options seeded from the engine configuration, or the defaults
    pub fn default_options(&self) -> BatchOptions {
        self.engine
            .as_ref()
            .map(|e| BatchOptions::from(&e.config().batch))
            .unwrap_or_default()
    }

    /// Compiled handle for sync schemas when an engine with compilation is bound
    fn compiled_for(
        &self,
        schema: &SchemaRef,
        memo: &mut HashMap<usize, Arc<CompiledValidator>>,
    ) -> Option<Arc<CompiledValidator>> {
        let engine = self.engine.as_ref()?;
        if !engine.config().compiler.enabled || schema.is_async() {
            return None;
        }
        let key = Arc::as_ptr(schema) as *const () as usize;
        Some(Arc::clone(
            memo.entry(key).or_insert_with(|| engine.compile(schema.as_ref())),
        ))
    }

    pub async fn run(&self, items: Vec<BatchItem>, options: BatchOptions) -> Result<BatchReport> {
        if options.max_concurrency == 0 {
            return Err(BatchError::InvalidOptions(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        let total = items.len();
        let started_at = Utc::now();
        let clock = Instant::now();
        let deadline = clock
            .checked_add(options.timeout)
            .unwrap_or_else(|| clock + Duration::from_secs(60 * 60 * 24 * 365));
        info!(
            items = total,
            max_concurrency = options.max_concurrency,
            stop_on_first_error = options.stop_on_first_error,
            timeout_ms = options.timeout.as_millis() as u64,
            "Starting validation batch"
        );

        let semaphore = Arc::new(Semaphore::new(options.max_concurrency));
        let mut queue = items.into_iter().enumerate().peekable();
        let mut tasks: JoinSet<BatchResult> = JoinSet::new();
        let mut states = vec![ItemState::Pending; total];
        let mut slots: Vec<Option<BatchResult>> = vec![None; total];
        let mut in_flight: HashMap<Id, Spawned> = HashMap::new();
        let mut compiled_memo = HashMap::new();

        let status = loop {
            if queue.peek().is_none() && tasks.is_empty() {
                break BatchStatus::Completed;
            }

            tokio::select! {
                biased;

                () = cancel::wait_for(options.cancellation.as_ref()) => {
                    break BatchStatus::Cancelled;
                }
                () = tokio::time::sleep_until(deadline) => {
                    break BatchStatus::TimedOut;
                }
                Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    let result = match joined {
                        Ok((id, result)) => {
                            in_flight.remove(&id);
                            result
                        }
                        Err(e) => {
                            let Some(spawned) = in_flight.remove(&e.id()) else {
                                warn!(error = %e, "Untracked batch task did not complete");
                                continue;
                            };
                            warn!(index = spawned.index, error = %e, "Batch task did not complete");
                            spawned.lost(&e, clock.elapsed())
                        }
                    };
                    let index = result.index;
                    states[index] = result.state();
                    if !result.result.success {
                        debug!(
                            index,
                            identifier = result.identifier.as_deref().unwrap_or(""),
                            issues = result.result.error_count(),
                            "Batch item failed"
                        );
                        if options.stop_on_first_error {
                            tasks.detach_all();
                            let error = result.result.into_result().err().unwrap_or_else(|| {
                                ValidationError::new(ValidationIssue::unknown("Batch item failed"))
                            });
                            warn!(index, "Stopping batch on first error");
                            return Err(BatchError::ItemFailed {
                                index,
                                identifier: result.identifier,
                                error,
                            });
                        }
                    }
                    slots[index] = Some(result);
                }
                Ok(permit) = Arc::clone(&semaphore).acquire_owned(), if queue.peek().is_some() => {
                    let Some((index, item)) = queue.next() else { continue };
                    states[index] = ItemState::Running;
                    let compiled = self.compiled_for(&item.schema, &mut compiled_memo);
                    let engine = self.engine.clone();
                    let spawned = Spawned {
                        index,
                        identifier: item.identifier.clone(),
                        started: clock.elapsed(),
                    };

                    let handle = tasks.spawn(async move {
                        let started = clock.elapsed();
                        let timer = Instant::now();
                        let result = AssertUnwindSafe(validate_item(engine.as_deref(), compiled.as_deref(), &item))
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|payload| {
                                ValidationResult::failure(ValidationError::new(ValidationIssue::unknown(
                                    panic_message(payload.as_ref()),
                                )))
                            });
                        let duration = timer.elapsed();
                        let finished = clock.elapsed();
                        drop(permit);
                        BatchResult {
                            index,
                            identifier: item.identifier,
                            result,
                            duration,
                            started,
                            finished,
                        }
                    });
                    in_flight.insert(handle.id(), spawned);
                }
            }
        };

        if status != BatchStatus::Completed {
            warn!(
                status = ?status,
                running = tasks.len(),
                "Batch stopped early; running items detached"
            );
            tasks.detach_all();
        }

        let results: Vec<BatchResult> = slots.into_iter().flatten().collect();
        let stats = BatchStats::from_results(total, &results, clock.elapsed());
        info!(
            status = ?status,
            succeeded = stats.succeeded,
            failed = stats.failed,
            wall_clock_ms = stats.wall_clock.as_millis() as u64,
            "Validation batch finished"
        );

        Ok(BatchReport {
            status,
            results,
            states,
            stats,
            started_at,
        })
    }
}

async fn validate_item(
    engine: Option<&Engine>,
    compiled: Option<&CompiledValidator>,
    item: &BatchItem,
) -> ValidationResult {
    if item.schema.is_async() {
        return item.schema.safe_validate_async(&item.datum).await;
    }
    match (engine, compiled) {
        (Some(engine), Some(compiled)) => engine.run(compiled, Some(&item.datum)).into(),
        _ => item.schema.safe_validate(&item.datum),
    }
}

/// Run a batch without an engine
pub async fn validate_batch(items: Vec<BatchItem>, options: BatchOptions) -> Result<BatchReport> {
    BatchRunner::new().run(items, options).await
}
