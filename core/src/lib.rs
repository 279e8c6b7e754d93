// provisor/src/lib.rs

//! Provisor: an async, fail-fast task pipeline for provisioning project sites.
//!
//! A provisioning run is an ordered chain of named tasks that:
//!  - Thread one execution context through every task by ownership transfer.
//!  - Stop at the first failure, naming the failing task and keeping the cause.
//!  - Report incremental progress to an outside observer.
//!  - Stay open for extension: new tasks implement `Task<C>`, the pipeline never changes.
//!  - Optionally run under one deadline for the whole chain.

pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod services;
pub mod tasks;

// --- Re-exports for the Public API ---

// Context, task and progress contracts
pub use crate::core::context::{fields, ContextSlots, ProvisionContext, Services};
pub use crate::core::params::{ListContentConfig, ListSchema, ProvisionParams, TemplateSchema, TemplateSelection};
pub use crate::core::progress::{
  NoopProgress, ProgressEvent, ProgressRecorder, ProgressReporter, TaskProgress, TracingProgress,
};
pub use crate::core::task::{task_fn, FnTask, Task, TaskResultExt};

// The orchestrator
pub use crate::pipeline::definition::Pipeline;
pub use crate::pipeline::execution::{run, run_with_deadline};

pub use crate::error::{
  ConfigError, ContextError, DeadlineExceeded, PipelineError, ProvisorResult, TaskError, TaskPanicked,
};

// Static registration surface
pub use crate::registry::TaskCatalog;

pub use crate::config::PipelineConfig;
pub use crate::services::{
  DataAccess, EntityTracker, EntityTrackerConfig, Fields, InMemoryDataAccess, InMemoryEntityTracker, ItemFilter,
  ListItem,
};

/*
    Core Workflow:
    1. Build a `ProvisionContext` from `ProvisionParams` and the `Services` known up front.
    2. Compose a `Pipeline<ProvisionContext>`, either task by task with `add_task`
       or from names via `TaskCatalog::build` (see `tasks::default_catalog`).
    3. Pick a `ProgressReporter` (`TracingProgress`, `ProgressRecorder`, or a closure).
    4. `pipeline.run(ctx, reporter).await` (or `run_with_deadline`).
    5. On `Ok(ctx)` read task outputs from `ctx.slots()`; on `Err(e)` inspect
       `e.task_name()` and `e.cause()`. Completed tasks' effects stay in place.
*/
