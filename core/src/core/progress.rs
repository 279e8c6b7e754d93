// provisor/src/core/progress.rs

//! One-way progress notifications from running tasks to an outside observer.

use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{event, Level};

/// A single progress report issued by a task.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
  pub task_name: String,
  pub message: String,
  /// Completion of the current task in `[0.0, 1.0]`, if the task knows it.
  pub fraction: Option<f64>,
}

impl ProgressEvent {
  pub fn new(task_name: impl Into<String>, message: impl Into<String>, fraction: Option<f64>) -> Self {
    Self {
      task_name: task_name.into(),
      message: message.into(),
      fraction: fraction.map(clamp_fraction),
    }
  }

  /// `fraction` as a whole-number percentage.
  pub fn percentage(&self) -> Option<u8> {
    self.fraction.map(|f| (f * 100.0).round() as u8)
  }
}

fn clamp_fraction(fraction: f64) -> f64 {
  if fraction.is_nan() {
    0.0
  } else {
    fraction.clamp(0.0, 1.0)
  }
}

/// Observer of progress events.
///
/// Reporting has no return value and cannot fail the run.
pub trait ProgressReporter: Send + Sync {
  fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressReporter for F
where
  F: Fn(&ProgressEvent) + Send + Sync,
{
  fn report(&self, event: &ProgressEvent) {
    self(event)
  }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
  fn report(&self, _event: &ProgressEvent) {}
}

/// Emits each event as a `tracing` info event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
  fn report(&self, event: &ProgressEvent) {
    match event.percentage() {
      Some(pct) => event!(Level::INFO, task_name = %event.task_name, percent = pct, "{}", event.message),
      None => event!(Level::INFO, task_name = %event.task_name, "{}", event.message),
    }
  }
}

/// Collects events in the order they were issued.
#[derive(Debug, Default)]
pub struct ProgressRecorder {
  events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressRecorder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<ProgressEvent> {
    self.events.lock().clone()
  }

  pub fn len(&self) -> usize {
    self.events.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.lock().is_empty()
  }

  pub fn clear(&self) {
    self.events.lock().clear();
  }
}

impl ProgressReporter for ProgressRecorder {
  fn report(&self, event: &ProgressEvent) {
    self.events.lock().push(event.clone());
  }
}

/// Progress handle given to a task, bound to that task's name.
#[derive(Clone)]
pub struct TaskProgress {
  task_name: Arc<str>,
  reporter: Arc<dyn ProgressReporter>,
}

impl TaskProgress {
  pub fn new(task_name: impl Into<Arc<str>>, reporter: Arc<dyn ProgressReporter>) -> Self {
    Self {
      task_name: task_name.into(),
      reporter,
    }
  }

  /// A handle that reports nowhere. Handy when calling a task directly.
  pub fn silent(task_name: impl Into<Arc<str>>) -> Self {
    Self::new(task_name, Arc::new(NoopProgress))
  }

  pub fn task_name(&self) -> &str {
    &self.task_name
  }

  /// Reports `message` with an optional completion fraction for the current task.
  ///
  /// A panicking reporter is logged and otherwise ignored.
  pub fn report(&self, message: impl Into<String>, fraction: Option<f64>) {
    let event = ProgressEvent::new(self.task_name.as_ref(), message, fraction);
    let reporter = &self.reporter;
    if catch_unwind(AssertUnwindSafe(|| reporter.report(&event))).is_err() {
      event!(Level::WARN, task_name = %self.task_name, "Progress reporter panicked; event dropped.");
    }
  }
}

impl std::fmt::Debug for TaskProgress {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskProgress")
      .field("task_name", &self.task_name)
      .finish_non_exhaustive()
  }
}
