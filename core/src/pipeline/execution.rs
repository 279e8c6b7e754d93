// provisor/src/pipeline/execution.rs

//! Contains `run()`, responsible for executing a pipeline's tasks in order
//! against one context. A run ends in exactly one of two states: every task
//! completed (the final context is returned), or one task failed (its
//! `TaskError` is returned and no later task is invoked).

use crate::core::progress::{ProgressReporter, TaskProgress};
use crate::core::task::Task;
use crate::error::{DeadlineExceeded, TaskError, TaskPanicked};
use crate::pipeline::definition::Pipeline;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{event, info_span, Instrument, Level};

/// Runs `tasks` in order, threading `ctx` through each of them.
///
/// Each task receives the context returned by its predecessor. The first
/// failure stops the run and its `TaskError` is returned as the task produced
/// it. A task that panics fails the run the same way, with a `TaskPanicked`
/// cause naming it. Effects of tasks that already completed are not undone;
/// retrying means calling `run` again.
pub async fn run<C>(
  ctx: C,
  tasks: &[Arc<dyn Task<C>>],
  reporter: Arc<dyn ProgressReporter>,
) -> Result<C, TaskError>
where
  C: Send + 'static,
{
  run_tasks(ctx, tasks, reporter, None).await
}

/// Like [`run`], with one deadline covering the whole run.
///
/// When the deadline passes while a task is running, that task's future is
/// dropped and the returned `TaskError` names it, with a `DeadlineExceeded`
/// cause. If the deadline is already spent when a task is due to start, the
/// error names that task and it is not invoked. A deadline too far away to be
/// represented as an instant is treated as no deadline.
pub async fn run_with_deadline<C>(
  ctx: C,
  tasks: &[Arc<dyn Task<C>>],
  reporter: Arc<dyn ProgressReporter>,
  deadline: Duration,
) -> Result<C, TaskError>
where
  C: Send + 'static,
{
  let expires_at = Instant::now().checked_add(deadline);
  if expires_at.is_none() {
    event!(Level::WARN, deadline_secs = deadline.as_secs(), "Deadline out of range; running without one.");
  }
  run_tasks(ctx, tasks, reporter, expires_at.map(|at| (at, deadline))).await
}

async fn run_tasks<C>(
  mut ctx: C,
  tasks: &[Arc<dyn Task<C>>],
  reporter: Arc<dyn ProgressReporter>,
  deadline: Option<(Instant, Duration)>,
) -> Result<C, TaskError>
where
  C: Send + 'static,
{
  let run_span = info_span!(
    "pipeline_run",
    context_type = %std::any::type_name::<C>(),
    num_tasks = tasks.len(),
    deadline_ms = deadline.map(|(_, d)| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
  );

  async move {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (task_idx, task) in tasks.iter().enumerate() {
      let task_name = task.name();
      let task_span = info_span!("pipeline_task", task_name = task_name, task_index = task_idx);
      let progress = TaskProgress::new(task_name, reporter.clone());

      ctx = execute_one(&**task, ctx, progress, deadline)
        .instrument(task_span)
        .await?;
    }

    event!(Level::DEBUG, "Pipeline execution completed successfully.");
    Ok(ctx)
  }
  .instrument(run_span)
  .await
}

async fn execute_one<C>(
  task: &dyn Task<C>,
  ctx: C,
  progress: TaskProgress,
  deadline: Option<(Instant, Duration)>,
) -> Result<C, TaskError>
where
  C: Send + 'static,
{
  let task_name = task.name();
  let started = Instant::now();
  event!(Level::DEBUG, "Task starting.");

  let outcome = match deadline {
    None => guarded(task, ctx, progress).await,
    Some((at, budget)) => {
      let remaining = at.saturating_duration_since(started);
      if remaining.is_zero() {
        event!(Level::ERROR, "Deadline spent before task could start.");
        return Err(TaskError::new(
          task_name,
          "Pipeline deadline exceeded before the task started",
          DeadlineExceeded { deadline: budget },
        ));
      }
      match tokio::time::timeout(remaining, guarded(task, ctx, progress)).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => Err(TaskError::new(
          task_name,
          "Pipeline deadline exceeded while the task was running",
          DeadlineExceeded { deadline: budget },
        )),
      }
    }
  };

  let elapsed_ms = started.elapsed().as_millis() as u64;
  match &outcome {
    Ok(_) => event!(Level::DEBUG, elapsed_ms, "Task completed."),
    Err(e) => event!(Level::ERROR, elapsed_ms, error = %e, cause = %e.cause(), "Task failed; stopping pipeline."),
  }
  outcome
}

/// Runs one task, turning a panic inside it into a `TaskError` naming the task.
async fn guarded<C>(task: &dyn Task<C>, ctx: C, progress: TaskProgress) -> Result<C, TaskError>
where
  C: Send + 'static,
{
  match AssertUnwindSafe(task.execute(ctx, progress)).catch_unwind().await {
    Ok(outcome) => outcome,
    Err(payload) => Err(TaskError::new(
      task.name(),
      "Task panicked",
      TaskPanicked {
        message: panic_message(payload.as_ref()),
      },
    )),
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(msg) = payload.downcast_ref::<&str>() {
    msg.to_string()
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg.clone()
  } else {
    "non-string panic payload".to_string()
  }
}

impl<C> Pipeline<C>
where
  C: Send + 'static,
{
  /// Executes the pipeline's tasks in order against `ctx`.
  ///
  /// Returns the context produced by the last task, or the `TaskError` of the
  /// first task that failed. See [`run`].
  pub async fn run(&self, ctx: C, reporter: Arc<dyn ProgressReporter>) -> Result<C, TaskError> {
    run(ctx, &self.tasks, reporter).await
  }

  /// Executes the pipeline with one deadline for the whole run. See [`run_with_deadline`].
  pub async fn run_with_deadline(
    &self,
    ctx: C,
    reporter: Arc<dyn ProgressReporter>,
    deadline: Duration,
  ) -> Result<C, TaskError> {
    run_with_deadline(ctx, &self.tasks, reporter, deadline).await
  }
}
