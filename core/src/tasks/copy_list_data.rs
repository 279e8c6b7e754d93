// provisor/src/tasks/copy_list_data.rs

use crate::core::context::{fields, ProvisionContext};
use crate::core::progress::TaskProgress;
use crate::core::task::{Task, TaskResultExt};
use crate::error::TaskError;
use crate::services::Fields;
use anyhow::Context as _;
use async_trait::async_trait;
use tracing::{event, Level};

/// Copies the selected list content from hub lists into the new site.
///
/// Reads: `params.list_content`.
/// Writes: [`fields::copied_items`] for every destination list.
/// Requires: a data-access service.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyListData;

impl CopyListData {
  pub const NAME: &'static str = "CopyListData";
  const FAILURE: &'static str = "Failed to copy list content";
}

#[async_trait]
impl Task<ProvisionContext> for CopyListData {
  fn name(&self) -> &str {
    Self::NAME
  }

  async fn execute(&self, mut ctx: ProvisionContext, progress: TaskProgress) -> Result<ProvisionContext, TaskError> {
    let data = ctx.services().data_access().for_task(Self::NAME, Self::FAILURE)?.clone();
    let configs = ctx.params().list_content.clone();
    if configs.is_empty() {
      event!(Level::DEBUG, "No list content selected.");
      return Ok(ctx);
    }

    for (idx, config) in configs.iter().enumerate() {
      let items = data
        .fetch_items(&config.source_list, None)
        .await
        .with_context(|| format!("Reading source list '{}'", config.source_list))
        .for_task(Self::NAME, Self::FAILURE)?;

      let total = items.len();
      for (n, item) in items.into_iter().enumerate() {
        let selected: Fields = item
          .fields
          .into_iter()
          .filter(|(name, _)| config.fields.iter().any(|f| f == name))
          .collect();
        data
          .add_item(&config.destination_list, selected)
          .await
          .with_context(|| format!("Writing item {} to '{}'", item.id, config.destination_list))
          .for_task(Self::NAME, Self::FAILURE)?;

        let done = (idx as f64 + (n + 1) as f64 / total as f64) / configs.len() as f64;
        progress.report(format!("{}: copied {} of {}", config.title, n + 1, total), Some(done));
      }

      event!(Level::DEBUG, destination = %config.destination_list, copied = total, "List content copied.");
      ctx.set(fields::copied_items(&config.destination_list), total);
    }

    Ok(ctx)
  }
}
