// provisor/src/pipeline/definition.rs

//! Contains the `Pipeline<C>` struct definition and methods for its
//! construction and structural modification.

use crate::core::task::Task;
use crate::error::{PipelineError, ProvisorResult};
use std::sync::Arc;
use tracing::{event, Level};

/// An ordered sequence of tasks operating on context type `C`.
///
/// The order is a plain, inspectable value: tasks can be inserted relative to
/// one another or removed by name without touching any task's code. Names are
/// unique within a pipeline so a failure always points at exactly one task.
pub struct Pipeline<C>
where
  C: Send + 'static,
{
  pub(crate) tasks: Vec<Arc<dyn Task<C>>>,
}

impl<C> Pipeline<C>
where
  C: Send + 'static,
{
  /// Creates an empty pipeline. Running it returns the initial context unchanged.
  pub fn new() -> Self {
    Self { tasks: Vec::new() }
  }

  /// Creates a pipeline running `tasks` in the given order.
  pub fn from_tasks<I>(tasks: I) -> ProvisorResult<Self>
  where
    I: IntoIterator<Item = Arc<dyn Task<C>>>,
  {
    let mut pipeline = Self::new();
    for task in tasks {
      pipeline.push_arc(task)?;
    }
    Ok(pipeline)
  }

  fn position(&self, task_name: &str) -> Option<usize> {
    self.tasks.iter().position(|t| t.name() == task_name)
  }

  fn ensure_task_exists(&self, task_name: &str) -> ProvisorResult<usize> {
    self.position(task_name).ok_or_else(|| PipelineError::TaskNotFound {
      task_name: task_name.to_string(),
    })
  }

  fn ensure_task_not_exists(&self, task_name: &str) -> ProvisorResult<()> {
    if self.position(task_name).is_some() {
      return Err(PipelineError::DuplicateTask {
        task_name: task_name.to_string(),
      });
    }
    Ok(())
  }

  /// Appends `task` to the end of the pipeline.
  pub fn add_task<T>(&mut self, task: T) -> ProvisorResult<&mut Self>
  where
    T: Task<C> + 'static,
  {
    self.push_arc(Arc::new(task))
  }

  /// Appends an already shared task.
  pub fn push_arc(&mut self, task: Arc<dyn Task<C>>) -> ProvisorResult<&mut Self> {
    self.ensure_task_not_exists(task.name())?;
    event!(Level::TRACE, task_name = %task.name(), index = self.tasks.len(), "Task appended.");
    self.tasks.push(task);
    Ok(self)
  }

  pub fn insert_before<T>(&mut self, existing_task_name: &str, task: T) -> ProvisorResult<()>
  where
    T: Task<C> + 'static,
  {
    let idx = self.ensure_task_exists(existing_task_name)?;
    self.ensure_task_not_exists(task.name())?;
    self.tasks.insert(idx, Arc::new(task));
    Ok(())
  }

  pub fn insert_after<T>(&mut self, existing_task_name: &str, task: T) -> ProvisorResult<()>
  where
    T: Task<C> + 'static,
  {
    let idx = self.ensure_task_exists(existing_task_name)?;
    self.ensure_task_not_exists(task.name())?;
    self.tasks.insert(idx + 1, Arc::new(task));
    Ok(())
  }

  /// Removes the named task and returns it.
  pub fn remove_task(&mut self, task_name: &str) -> ProvisorResult<Arc<dyn Task<C>>> {
    let idx = self.ensure_task_exists(task_name)?;
    Ok(self.tasks.remove(idx))
  }

  /// Task names in execution order.
  pub fn task_names(&self) -> Vec<&str> {
    self.tasks.iter().map(|t| t.name()).collect()
  }

  pub fn tasks(&self) -> &[Arc<dyn Task<C>>] {
    &self.tasks
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }
}

impl<C> Default for Pipeline<C>
where
  C: Send + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<C> std::fmt::Debug for Pipeline<C>
where
  C: Send + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline").field("tasks", &self.task_names()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::task::task_fn;

  fn noop(name: &'static str) -> impl Task<u32> {
    task_fn(name, "noop failed", |ctx: u32, _p| async move { Ok(ctx) })
  }

  #[test]
  fn positional_edits_keep_order_inspectable() {
    let mut pipeline = Pipeline::<u32>::new();
    pipeline.add_task(noop("a")).unwrap().add_task(noop("c")).unwrap();
    pipeline.insert_before("c", noop("b")).unwrap();
    pipeline.insert_after("c", noop("d")).unwrap();
    assert_eq!(pipeline.task_names(), vec!["a", "b", "c", "d"]);

    let removed = pipeline.remove_task("b").unwrap();
    assert_eq!(removed.name(), "b");
    assert_eq!(pipeline.task_names(), vec!["a", "c", "d"]);
    assert_eq!(pipeline.len(), 3);
  }

  #[test]
  fn duplicate_names_are_rejected() {
    let mut pipeline = Pipeline::<u32>::new();
    pipeline.add_task(noop("a")).unwrap();
    assert_eq!(
      pipeline.add_task(noop("a")).err(),
      Some(PipelineError::DuplicateTask {
        task_name: "a".to_string()
      })
    );
    assert_eq!(
      pipeline.insert_before("a", noop("a")),
      Err(PipelineError::DuplicateTask {
        task_name: "a".to_string()
      })
    );
  }

  #[test]
  fn edits_against_unknown_task_fail() {
    let mut pipeline = Pipeline::<u32>::new();
    assert_eq!(
      pipeline.insert_after("missing", noop("x")),
      Err(PipelineError::TaskNotFound {
        task_name: "missing".to_string()
      })
    );
    assert!(pipeline.remove_task("missing").is_err());
    assert!(pipeline.is_empty());
  }
}
