// provisor/src/error.rs

//! Error types for the task pipeline.
//!
//! `TaskError` is the only error `run` ever returns. The other types are either
//! causes carried inside a `TaskError` (`ContextError`, `DeadlineExceeded`) or
//! composition-time errors that never surface from a run (`PipelineError`).

use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single named task.
///
/// Carries the failing task's name, a human-readable message and the original
/// cause. The cause stays a typed `anyhow::Error`, so callers can downcast it
/// (for example to `ContextError`) instead of parsing strings.
#[derive(Debug, Error)]
#[error("Task '{task_name}' failed: {message}")]
pub struct TaskError {
  task_name: String,
  message: String,
  #[source]
  cause: AnyhowError,
}

impl TaskError {
  pub fn new(task_name: impl Into<String>, message: impl Into<String>, cause: impl Into<AnyhowError>) -> Self {
    Self {
      task_name: task_name.into(),
      message: message.into(),
      cause: cause.into(),
    }
  }

  /// Name of the task that failed.
  pub fn task_name(&self) -> &str {
    &self.task_name
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  /// The underlying failure, exactly as the task raised it.
  pub fn cause(&self) -> &AnyhowError {
    &self.cause
  }

  pub fn into_cause(self) -> AnyhowError {
    self.cause
  }

  /// Returns the cause as `E` if that is what the task failed with.
  pub fn cause_as<E>(&self) -> Option<&E>
  where
    E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
  {
    self.cause.downcast_ref::<E>()
  }
}

/// Contract violations on the execution context.
///
/// These indicate a mis-ordered pipeline or a buggy task, not a condition the
/// target system can recover from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
  #[error("Missing dependency: context field '{field}' has not been set by an earlier task")]
  MissingDependency { field: String },

  #[error("Type mismatch for context field '{field}' (expected {expected_type})")]
  TypeMismatch { field: String, expected_type: String },

  #[error("Missing service: '{service}' is not configured on the context")]
  MissingService { service: String },
}

/// Cause attached to the `TaskError` of the task that was running (or about to
/// run) when a whole-run deadline ran out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Pipeline deadline of {deadline:?} exceeded")]
pub struct DeadlineExceeded {
  pub deadline: Duration,
}

/// Cause attached to the `TaskError` of a task that panicked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Task panicked: {message}")]
pub struct TaskPanicked {
  pub message: String,
}

/// Errors raised while composing a pipeline. `run` never returns these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
  #[error("Task not found in pipeline: {task_name}")]
  TaskNotFound { task_name: String },

  #[error("Task '{task_name}' is already part of the pipeline")]
  DuplicateTask { task_name: String },

  #[error("No task registered under the name '{task_name}'")]
  UnknownTask { task_name: String },
}

/// Errors raised while loading `PipelineConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Invalid value for environment variable '{var}': {message}")]
  InvalidVar { var: String, message: String },

  #[error("Failed to read params file '{path}'. Source: {source}")]
  ParamsFile {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse params file '{path}'. Source: {source}")]
  ParamsParse {
    path: String,
    #[source]
    source: serde_json::Error,
  },
}

pub type ProvisorResult<T, E = PipelineError> = std::result::Result<T, E>;
