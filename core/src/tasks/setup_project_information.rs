// provisor/src/tasks/setup_project_information.rs

use crate::core::context::{fields, ProvisionContext};
use crate::core::params::TemplateSchema;
use crate::core::progress::TaskProgress;
use crate::core::task::{Task, TaskResultExt};
use crate::error::TaskError;
use crate::services::Fields;
use async_trait::async_trait;
use serde_json::Value;

/// Writes the project properties item and registers the site with the
/// portfolio's entity list.
///
/// Reads: [`fields::TEMPLATE_SCHEMA`], `params.site_title`, `params.site_url`,
/// `params.group_id`.
/// Writes: [`fields::PROPERTIES_ITEM_ID`], [`fields::ENTITY_ITEM_ID`].
/// Requires: a data-access service and an entity tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupProjectInformation;

impl SetupProjectInformation {
  pub const NAME: &'static str = "SetupProjectInformation";
  const FAILURE: &'static str = "Failed to set up project information";
}

#[async_trait]
impl Task<ProvisionContext> for SetupProjectInformation {
  fn name(&self) -> &str {
    Self::NAME
  }

  async fn execute(&self, mut ctx: ProvisionContext, progress: TaskProgress) -> Result<ProvisionContext, TaskError> {
    let properties_list = ctx
      .get::<TemplateSchema>(fields::TEMPLATE_SCHEMA)
      .for_task(Self::NAME, Self::FAILURE)?
      .properties_list
      .clone();
    let data = ctx.services().data_access().for_task(Self::NAME, Self::FAILURE)?.clone();
    let tracker = ctx.services().entity_tracker().for_task(Self::NAME, Self::FAILURE)?.clone();
    let params = ctx.params().clone();

    progress.report("Creating project properties", Some(0.0));
    let mut properties = Fields::new();
    properties.insert("Title".to_string(), Value::String(params.site_title.clone()));
    properties.insert("GtGroupId".to_string(), Value::String(params.group_id.clone()));
    let item = data
      .add_item(&properties_list, properties)
      .await
      .for_task(Self::NAME, Self::FAILURE)?;
    ctx.set(fields::PROPERTIES_ITEM_ID, item.id);

    progress.report("Registering project in portfolio", Some(0.5));
    let mut entity = Fields::new();
    entity.insert("Title".to_string(), Value::String(params.site_title.clone()));
    entity.insert(tracker.config().url_field.clone(), Value::String(params.site_url.clone()));
    let entity_item = tracker
      .update_entity(&params.group_id, entity)
      .await
      .for_task(Self::NAME, Self::FAILURE)?;
    ctx.set(fields::ENTITY_ITEM_ID, entity_item.id);

    progress.report("Project information saved", Some(1.0));
    Ok(ctx)
  }
}
