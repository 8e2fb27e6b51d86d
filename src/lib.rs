//! Fast Schema
//!
//! Composable runtime validation for untyped JSON input. Schemas are built
//! from small combinators, validate into a (possibly coerced or transformed)
//! value, and report every failure with a root-to-leaf path.
//!
//! ## Features
//!
//! - **Schema Algebra**: primitives, wrappers (`optional`, `refine`, `pipe`, ...)
//!   and composites (`object`, `union`, `discriminated_union`, ...)
//! - **Structured Errors**: flat issue lists, nested `_errors` maps, or
//!   `{form_errors, field_errors}`
//! - **Compiled Validators**: closure-composed validators cached by a SHA256
//!   fingerprint of the schema definition
//! - **Accelerator Boundary**: optional alternate backend with transparent fallback
//! - **Batch Runtime**: bounded concurrency, timeout and cancellation on tokio
//!
//! ## Architecture
//!
//! ```text
//! schema tree ──definition()──▶ SchemaDefinition ──fingerprint──▶ ValidatorCache
//!     │                                                               │
//!     └── check(input) ◀── interpreted          compiled ──▶ Engine::run ──▶ Accelerator?
//!                                                                     │
//!                                      BatchRunner (Semaphore + JoinSet) ◀┘
//! ```

pub mod accelerator;
pub mod batch;
pub mod compile;
pub mod config;
pub mod engine;
pub mod error;
pub mod schema;

pub use accelerator::{Accelerator, AcceleratorError};
pub use batch::{
    validate_batch, BatchError, BatchItem, BatchOptions, BatchReport, BatchResult, BatchRunner,
    BatchStats, BatchStatus, CancellationToken, ItemState,
};
pub use compile::{CacheStats, CompiledValidator, Fingerprint, ValidatorCache};
pub use config::EngineConfig;
pub use engine::{Engine, EngineStats};
pub use error::{
    FlattenedErrors, IssueCode, PathSegment, ValidationError, ValidationIssue, ValidationResult,
};
pub use schema::{Schema, SchemaDefinition, SchemaRef};

/// Everything needed to build and run schemas
pub mod prelude {
    pub use crate::error::{IssueCode, PathSegment, ValidationError, ValidationResult};
    pub use crate::schema::{
        any, array, boolean, conditional, discriminated_union, enumeration, integer,
        intersection, literal, null, number, object, record, string, union, ArrayChecks,
        NumberChecks, Schema, SchemaRef, StringChecks,
    };
}
