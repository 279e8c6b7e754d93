// provisor/src/core/task.rs

//! The `Task<C>` capability: one named, asynchronous step of a pipeline.

use crate::core::progress::TaskProgress;
use crate::error::TaskError;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

/// A unit of work in a pipeline operating on context type `C`.
///
/// A task receives the context by value and hands it back on success. Every
/// failure must leave `execute` as a `TaskError` naming this task; use
/// `TaskResultExt::for_task` to attribute raw failures.
///
/// Tasks never refer to each other. Whatever a task needs from an earlier one
/// it reads from the context under a documented field name.
#[async_trait]
pub trait Task<C>: Send + Sync
where
  C: Send + 'static,
{
  /// Name used for failure attribution, progress labels and logs.
  fn name(&self) -> &str;

  async fn execute(&self, ctx: C, progress: TaskProgress) -> Result<C, TaskError>;
}

/// Attributes a raw failure to a named task.
pub trait TaskResultExt<T> {
  fn for_task(self, task_name: &str, message: &str) -> Result<T, TaskError>;
}

impl<T, E> TaskResultExt<T> for Result<T, E>
where
  E: Into<anyhow::Error>,
{
  fn for_task(self, task_name: &str, message: &str) -> Result<T, TaskError> {
    self.map_err(|e| TaskError::new(task_name, message, e))
  }
}

/// A task backed by an async closure.
///
/// The closure returns `anyhow::Result<C>`; failures are wrapped into a
/// `TaskError` carrying this task's name and `failure_message`.
pub struct FnTask<C, F> {
  name: String,
  failure_message: String,
  func: F,
  _ctx: PhantomData<fn(C) -> C>,
}

impl<C, F> FnTask<C, F> {
  pub fn new(name: impl Into<String>, failure_message: impl Into<String>, func: F) -> Self {
    Self {
      name: name.into(),
      failure_message: failure_message.into(),
      func,
      _ctx: PhantomData,
    }
  }
}

#[async_trait]
impl<C, F, Fut> Task<C> for FnTask<C, F>
where
  C: Send + 'static,
  F: Fn(C, TaskProgress) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = anyhow::Result<C>> + Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn execute(&self, ctx: C, progress: TaskProgress) -> Result<C, TaskError> {
    (self.func)(ctx, progress).await.for_task(&self.name, &self.failure_message)
  }
}

/// Shorthand for `FnTask::new`.
pub fn task_fn<C, F, Fut>(name: impl Into<String>, failure_message: impl Into<String>, func: F) -> FnTask<C, F>
where
  C: Send + 'static,
  F: Fn(C, TaskProgress) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = anyhow::Result<C>> + Send + 'static,
{
  FnTask::new(name, failure_message, func)
}

impl<C, F> std::fmt::Debug for FnTask<C, F> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FnTask")
      .field("name", &self.name)
      .field("failure_message", &self.failure_message)
      .finish_non_exhaustive()
  }
}
