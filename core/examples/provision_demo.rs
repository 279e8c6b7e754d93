// provisor/examples/provision_demo.rs

//! Runs the reference provisioning tasks against in-memory services.
//!
//! Try `RUST_LOG=debug PROVISOR_DEADLINE_SECS=5 cargo run --example provision_demo`,
//! or point `PROVISOR_PARAMS_FILE` at a JSON `ProvisionParams` document.

use provisor::{
  fields, tasks, EntityTracker, EntityTrackerConfig, Fields, InMemoryDataAccess, InMemoryEntityTracker,
  ListContentConfig, PipelineConfig, ProvisionContext, ProvisionParams, Services, TemplateSchema, TemplateSelection,
  TracingProgress,
};
use serde_json::json;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn demo_params() -> ProvisionParams {
  ProvisionParams {
    site_url: "https://tenant.example/sites/demo".to_string(),
    site_title: "Demo Project".to_string(),
    group_id: "demo-group".to_string(),
    hub_url: "https://tenant.example/sites/portfolio".to_string(),
    projects_list: "Prosjekter".to_string(),
    template: TemplateSelection {
      name: "Standard".to_string(),
      schema: TemplateSchema::default(),
    },
    list_content: vec![ListContentConfig {
      title: "Phase checklist".to_string(),
      source_list: "Sjekklisteelementer".to_string(),
      destination_list: "Fasesjekkliste".to_string(),
      fields: vec!["Title".to_string(), "GtPhase".to_string()],
    }],
  }
}

fn demo_data_access(params: &ProvisionParams) -> anyhow::Result<Arc<InMemoryDataAccess>> {
  let data = Arc::new(InMemoryDataAccess::new());
  let rows = [
    json!({ "Title": "Mandate approved", "GtPhase": "Concept" }),
    json!({ "Title": "Plan signed off", "GtPhase": "Planning" }),
    json!({ "Title": "Handover done", "GtPhase": "Closure" }),
  ]
  .into_iter()
  .map(|row| {
    row
      .as_object()
      .cloned()
      .ok_or_else(|| anyhow::anyhow!("seed row is not an object"))
  })
  .collect::<anyhow::Result<Vec<Fields>>>()?;
  data.seed("Sjekklisteelementer", rows);
  for config in &params.list_content {
    data.create_list(&config.destination_list);
  }
  data.create_list(&params.template.schema.properties_list);
  Ok(data)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  let config = PipelineConfig::from_env()?;
  let params = config.load_params()?.unwrap_or_else(demo_params);
  let data = demo_data_access(&params)?;

  let catalog = tasks::default_catalog();
  let tracked = Arc::new(InMemoryEntityTracker::new(EntityTrackerConfig::new(
    &params.hub_url,
    &params.projects_list,
  )));
  let tracker = tracked.clone();
  catalog.register(tasks::PreTask::NAME, move || {
    let tracker = tracker.clone();
    tasks::PreTask::new().with_tracker_factory(move |_config| tracker.clone() as Arc<dyn EntityTracker>)
  });

  let order = config
    .task_order
    .clone()
    .unwrap_or_else(|| tasks::DEFAULT_ORDER.iter().map(|name| name.to_string()).collect());
  let pipeline = catalog.build(&order)?;
  tracing::info!(tasks = ?pipeline.task_names(), "Provisioning pipeline ready.");

  let ctx = ProvisionContext::new(params.clone()).with_services(Services::new().with_data_access(data.clone()));
  let outcome = match config.deadline {
    Some(deadline) => pipeline.run_with_deadline(ctx, Arc::new(TracingProgress), deadline).await,
    None => pipeline.run(ctx, Arc::new(TracingProgress)).await,
  };

  match outcome {
    Ok(ctx) => {
      for list in params.list_content.iter().map(|c| &c.destination_list) {
        let copied = ctx.slots().get_opt::<usize>(&fields::copied_items(list))?;
        tracing::info!(%list, copied = copied.copied().unwrap_or(0), "List content summary.");
      }
      if let Some(entity) = tracked.get_entity(&params.group_id).await? {
        tracing::info!(entity_id = entity.id, fields = ?entity.fields, "Project registered in portfolio.");
      }
      Ok(())
    }
    Err(e) => {
      tracing::error!(task = %e.task_name(), cause = %e.cause(), "Provisioning failed.");
      Err(e.into())
    }
  }
}
