// provisor/src/registry.rs

//! Defines `TaskCatalog<C>`, a name-keyed table of task factories.
//!
//! The catalog is static composition: the application registers every task it
//! knows about up front, then builds a `Pipeline<C>` from an ordered list of
//! names, for example one read from `PipelineConfig`. Nothing is discovered at
//! runtime.

use crate::core::task::Task;
use crate::error::{PipelineError, ProvisorResult};
use crate::pipeline::definition::Pipeline;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, instrument, Level};

type TaskFactory<C> = Arc<dyn Fn() -> Arc<dyn Task<C>> + Send + Sync>;

/// Registry of task factories for context type `C`.
pub struct TaskCatalog<C>
where
  C: Send + 'static,
{
  factories: RwLock<HashMap<String, TaskFactory<C>>>,
}

impl<C> TaskCatalog<C>
where
  C: Send + 'static,
{
  /// Creates a new, empty catalog.
  pub fn new() -> Self {
    Self {
      factories: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `factory` under `name`, replacing any earlier registration.
  ///
  /// `name` is the catalog key; the tasks the factory builds keep their own
  /// `Task::name`, which is what pipelines and errors use.
  pub fn register<F, T>(&self, name: impl Into<String>, factory: F)
  where
    F: Fn() -> T + Send + Sync + 'static,
    T: Task<C> + 'static,
  {
    let name = name.into();
    event!(Level::DEBUG, %name, context_type = %std::any::type_name::<C>(), "Registering task factory.");
    let erased: TaskFactory<C> = Arc::new(move || Arc::new(factory()) as Arc<dyn Task<C>>);
    self.factories.write().insert(name, erased);
  }

  pub fn contains(&self, name: &str) -> bool {
    self.factories.read().contains_key(name)
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
    names.sort();
    names
  }

  /// Builds a fresh task from the factory registered under `name`.
  pub fn create(&self, name: &str) -> ProvisorResult<Arc<dyn Task<C>>> {
    let factory = self
      .factories
      .read()
      .get(name)
      .cloned()
      .ok_or_else(|| PipelineError::UnknownTask {
        task_name: name.to_string(),
      })?;
    Ok(factory())
  }

  /// Builds a pipeline running the named tasks in the given order.
  #[instrument(name = "TaskCatalog::build", skip_all, fields(num_tasks = order.len()), err(Display))]
  pub fn build<S: AsRef<str>>(&self, order: &[S]) -> ProvisorResult<Pipeline<C>> {
    let mut pipeline = Pipeline::new();
    for name in order {
      let task = self.create(name.as_ref())?;
      pipeline.push_arc(task)?;
    }
    event!(Level::DEBUG, tasks = ?pipeline.task_names(), "Pipeline built from catalog.");
    Ok(pipeline)
  }
}

impl<C> Default for TaskCatalog<C>
where
  C: Send + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::task::task_fn;

  fn catalog() -> TaskCatalog<Vec<String>> {
    let catalog = TaskCatalog::new();
    for name in ["PreTask", "CopyListData", "SetupProjectInformation"] {
      catalog.register(name, move || {
        task_fn(name, "failed", move |mut ctx: Vec<String>, _p| async move {
          ctx.push(name.to_string());
          Ok(ctx)
        })
      });
    }
    catalog
  }

  #[test]
  fn build_preserves_requested_order() {
    let pipeline = catalog().build(&["SetupProjectInformation", "PreTask"]).unwrap();
    assert_eq!(pipeline.task_names(), vec!["SetupProjectInformation", "PreTask"]);
  }

  #[test]
  fn build_rejects_unknown_names() {
    let err = catalog().build(&["PreTask", "Nope"]).unwrap_err();
    assert_eq!(
      err,
      PipelineError::UnknownTask {
        task_name: "Nope".to_string()
      }
    );
  }

  #[test]
  fn build_rejects_repeated_names() {
    let err = catalog().build(&["PreTask", "PreTask"]).unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateTask { .. }));
  }

  #[test]
  fn names_are_sorted() {
    let catalog = catalog();
    assert!(catalog.contains("PreTask"));
    assert_eq!(
      catalog.names(),
      vec!["CopyListData", "PreTask", "SetupProjectInformation"]
    );
  }
}
