pub mod context;
pub mod params;
pub mod progress;
pub mod task;

// Re-export key types for easier access from other provisor modules (and lib.rs)
pub use context::{ContextSlots, ProvisionContext, Services};
pub use params::{ListContentConfig, ListSchema, ProvisionParams, TemplateSchema, TemplateSelection};
pub use progress::{NoopProgress, ProgressEvent, ProgressRecorder, ProgressReporter, TaskProgress, TracingProgress};
pub use task::{task_fn, FnTask, Task, TaskResultExt};
