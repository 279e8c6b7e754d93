// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use provisor::{
  task_fn, ListContentConfig, ListSchema, ProvisionParams, Task, TaskProgress, TemplateSchema,
  TemplateSelection,
};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Context Struct ---
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
}

// --- Call counters ---
#[derive(Clone, Debug, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn hit(&self) {
    self.0.fetch_add(1, Ordering::SeqCst);
  }

  pub fn get(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}

// --- Common Task Creators ---
pub fn create_simple_task(
  name: &'static str,
  message_to_append: &'static str,
  calls: CallCounter,
) -> impl Task<TestContext> {
  task_fn(name, "simple task failed", move |mut ctx: TestContext, _progress| {
    let calls = calls.clone();
    async move {
      calls.hit();
      ctx.counter += 1;
      ctx.message.push_str(message_to_append);
      ctx.steps_executed.push(name.to_string());
      tracing::debug!(target: "test_tasks", task = %name, "executed, counter: {}, message: '{}'", ctx.counter, ctx.message);
      Ok(ctx)
    }
  })
}

pub fn create_failing_task(name: &'static str, error_message: &'static str, calls: CallCounter) -> impl Task<TestContext> {
  task_fn(name, "failing task failed", move |_ctx: TestContext, _progress| {
    let calls = calls.clone();
    async move {
      calls.hit();
      tracing::warn!(target: "test_tasks", task = %name, "failing with: '{}'", error_message);
      Err::<TestContext, _>(anyhow::anyhow!(error_message))
    }
  })
}

/// A task that reports each of `fractions` in turn, then succeeds.
pub fn create_reporting_task(name: &'static str, fractions: &'static [f64]) -> impl Task<TestContext> {
  task_fn(name, "reporting task failed", move |ctx: TestContext, progress: TaskProgress| async move {
    for (i, f) in fractions.iter().enumerate() {
      progress.report(format!("{} part {}", name, i + 1), Some(*f));
    }
    Ok(ctx)
  })
}

/// A pure task: output depends only on the input context.
pub fn create_pure_task(name: &'static str, factor: i32) -> impl Task<TestContext> {
  task_fn(name, "pure task failed", move |mut ctx: TestContext, _progress| async move {
    ctx.counter = ctx.counter * factor + 1;
    ctx.steps_executed.push(name.to_string());
    Ok(ctx)
  })
}

// --- Provisioning fixtures ---
pub fn sample_params() -> ProvisionParams {
  ProvisionParams {
    site_url: "https://tenant.example/sites/p1".to_string(),
    site_title: "Project One".to_string(),
    group_id: "group-1".to_string(),
    hub_url: "https://tenant.example/sites/portfolio".to_string(),
    projects_list: "Prosjekter".to_string(),
    template: TemplateSelection {
      name: "Standard".to_string(),
      schema: TemplateSchema {
        lists: vec![ListSchema {
          title: "Fasesjekkliste".to_string(),
          fields: vec!["Title".to_string(), "GtPhase".to_string()],
        }],
        properties_list: "Prosjektegenskaper".to_string(),
      },
    },
    list_content: vec![ListContentConfig {
      title: "Phase checklist".to_string(),
      source_list: "Sjekklisteelementer".to_string(),
      destination_list: "Fasesjekkliste".to_string(),
      fields: vec!["Title".to_string(), "GtPhase".to_string()],
    }],
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
