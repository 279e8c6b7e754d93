// provisor/src/tasks/pre_task.rs

use crate::core::context::{fields, ProvisionContext};
use crate::core::progress::TaskProgress;
use crate::core::task::{Task, TaskResultExt};
use crate::error::TaskError;
use crate::services::{EntityTracker, EntityTrackerConfig, Fields};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{event, Level};

type TrackerFactory = Arc<dyn Fn(EntityTrackerConfig) -> Arc<dyn EntityTracker> + Send + Sync>;

/// Prepares the context for the remaining tasks.
///
/// Reads: `params.template`, `params.hub_url`, `params.projects_list`.
/// Writes: [`fields::TEMPLATE_SCHEMA`]. Turns off multilingual support on the
/// target site. Installs the entity tracker from its factory when the context
/// does not already carry one.
/// Requires: a data-access service and an entity tracker (given or built).
#[derive(Clone, Default)]
pub struct PreTask {
  tracker_factory: Option<TrackerFactory>,
}

impl PreTask {
  pub const NAME: &'static str = "PreTask";
  const FAILURE: &'static str = "Failed to prepare the provisioning context";

  pub fn new() -> Self {
    Self::default()
  }

  /// Builds the entity tracker from the run's params when none is configured.
  pub fn with_tracker_factory<F>(mut self, factory: F) -> Self
  where
    F: Fn(EntityTrackerConfig) -> Arc<dyn EntityTracker> + Send + Sync + 'static,
  {
    self.tracker_factory = Some(Arc::new(factory));
    self
  }
}

#[async_trait]
impl Task<ProvisionContext> for PreTask {
  fn name(&self) -> &str {
    Self::NAME
  }

  async fn execute(&self, mut ctx: ProvisionContext, progress: TaskProgress) -> Result<ProvisionContext, TaskError> {
    progress.report("Loading template schema", Some(0.0));
    let schema = ctx.params().template.schema.clone();
    event!(Level::DEBUG, template = %ctx.params().template.name, lists = schema.lists.len(), "Template schema loaded.");
    ctx.set(fields::TEMPLATE_SCHEMA, schema);

    progress.report("Configuring services", Some(0.5));
    let data = ctx.services().data_access().for_task(Self::NAME, Self::FAILURE)?.clone();
    let mut settings = Fields::new();
    settings.insert("IsMultilingual".to_string(), Value::Bool(false));
    data
      .update_site_settings(settings)
      .await
      .for_task(Self::NAME, Self::FAILURE)?;
    if ctx.services().entity_tracker().is_err() {
      if let Some(factory) = &self.tracker_factory {
        let params = ctx.params();
        let tracker = factory(EntityTrackerConfig::new(&params.hub_url, &params.projects_list));
        ctx.services_mut().set_entity_tracker(tracker);
      }
    }
    ctx.services().entity_tracker().for_task(Self::NAME, Self::FAILURE)?;

    progress.report("Context ready", Some(1.0));
    Ok(ctx)
  }
}

impl std::fmt::Debug for PreTask {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PreTask")
      .field("tracker_factory_present", &self.tracker_factory.is_some())
      .finish()
  }
}
