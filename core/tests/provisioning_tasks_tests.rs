// tests/provisioning_tasks_tests.rs
mod common;

use common::*;
use provisor::{
  fields, tasks, ContextError, EntityTracker, EntityTrackerConfig, Fields, InMemoryDataAccess,
  InMemoryEntityTracker, NoopProgress, Pipeline, ProgressRecorder, ProvisionContext, Services, TemplateSchema,
};
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::Arc;

fn row(value: Value) -> Fields {
  value.as_object().cloned().unwrap()
}

fn seeded_data_access() -> Arc<InMemoryDataAccess> {
  let data = Arc::new(InMemoryDataAccess::new());
  data.seed(
    "Sjekklisteelementer",
    vec![
      row(json!({ "Title": "Mandate approved", "GtPhase": "Concept", "Internal": "x" })),
      row(json!({ "Title": "Plan signed", "GtPhase": "Planning", "Internal": "y" })),
    ],
  );
  data.create_list("Fasesjekkliste");
  data.create_list("Prosjektegenskaper");
  data
}

fn hub_tracker() -> Arc<InMemoryEntityTracker> {
  let params = sample_params();
  Arc::new(InMemoryEntityTracker::new(EntityTrackerConfig::new(
    params.hub_url,
    params.projects_list,
  )))
}

#[tokio::test]
#[serial]
async fn test_default_pipeline_provisions_a_project() {
  setup_tracing();
  let data = seeded_data_access();
  let tracker = hub_tracker();
  let ctx = ProvisionContext::new(sample_params()).with_services(
    Services::new()
      .with_data_access(data.clone())
      .with_entity_tracker(tracker.clone()),
  );
  let pipeline = tasks::default_catalog().build(&tasks::DEFAULT_ORDER).unwrap();
  let recorder = Arc::new(ProgressRecorder::new());

  let ctx = pipeline.run(ctx, recorder.clone()).await.unwrap();

  assert_eq!(data.site_settings().get("IsMultilingual"), Some(&json!(false)));

  let schema = ctx.get::<TemplateSchema>(fields::TEMPLATE_SCHEMA).unwrap();
  assert_eq!(schema.properties_list, "Prosjektegenskaper");
  assert_eq!(ctx.get::<usize>(&fields::copied_items("Fasesjekkliste")).unwrap(), &2);

  let copied = data.items("Fasesjekkliste").unwrap();
  assert_eq!(copied.len(), 2);
  assert!(copied.iter().all(|item| item.field("Internal").is_none()));
  assert_eq!(copied[1].field("GtPhase"), Some(&json!("Planning")));

  let properties_id = *ctx.get::<u64>(fields::PROPERTIES_ITEM_ID).unwrap();
  let properties = data.items("Prosjektegenskaper").unwrap();
  assert_eq!(properties.len(), 1);
  assert_eq!(properties[0].id, properties_id);
  assert_eq!(properties[0].field("GtGroupId"), Some(&json!("group-1")));

  let entity = tracker.get_entity("group-1").await.unwrap().unwrap();
  assert_eq!(ctx.get::<u64>(fields::ENTITY_ITEM_ID).unwrap(), &entity.id);
  assert_eq!(entity.field("GtSiteUrl"), Some(&json!("https://tenant.example/sites/p1")));
  assert_eq!(entity.field("Title"), Some(&json!("Project One")));

  let reporting: Vec<String> = recorder.events().into_iter().map(|e| e.task_name).collect();
  let first_copy = reporting.iter().position(|n| n == "CopyListData").unwrap();
  let first_setup = reporting.iter().position(|n| n == "SetupProjectInformation").unwrap();
  assert_eq!(reporting[0], "PreTask");
  assert!(first_copy < first_setup);
  assert_eq!(recorder.events().last().and_then(|e| e.percentage()), Some(100));
}

#[tokio::test]
#[serial]
async fn test_pre_task_builds_tracker_from_params() {
  setup_tracing();
  let data = seeded_data_access();
  let built = Arc::new(parking_lot::Mutex::new(None::<EntityTrackerConfig>));
  let seen = built.clone();
  let pre_task = tasks::PreTask::new().with_tracker_factory(move |config| {
    *seen.lock() = Some(config.clone());
    Arc::new(InMemoryEntityTracker::new(config)) as Arc<dyn EntityTracker>
  });

  let mut pipeline = Pipeline::<ProvisionContext>::new();
  pipeline.add_task(pre_task).unwrap();
  pipeline.add_task(tasks::SetupProjectInformation).unwrap();

  let ctx = ProvisionContext::new(sample_params()).with_services(Services::new().with_data_access(data));
  let ctx = pipeline.run(ctx, Arc::new(NoopProgress)).await.unwrap();

  let config = built.lock().clone().unwrap();
  assert_eq!(config.portal_url, "https://tenant.example/sites/portfolio");
  assert_eq!(config.list_name, "Prosjekter");
  assert_eq!(config.identity_field, "GtGroupId");
  assert!(ctx.get::<u64>(fields::ENTITY_ITEM_ID).is_ok());
}

#[tokio::test]
#[serial]
async fn test_pre_task_without_tracker_fails_with_missing_service() {
  setup_tracing();
  let ctx = ProvisionContext::new(sample_params())
    .with_services(Services::new().with_data_access(seeded_data_access()));
  let pipeline = tasks::default_catalog().build(&tasks::DEFAULT_ORDER).unwrap();

  let err = pipeline.run(ctx, Arc::new(NoopProgress)).await.unwrap_err();

  assert_eq!(err.task_name(), "PreTask");
  assert!(matches!(
    err.cause_as::<ContextError>(),
    Some(ContextError::MissingService { service }) if service == "entity_tracker"
  ));
}

#[tokio::test]
#[serial]
async fn test_setup_without_pre_task_reports_missing_schema() {
  setup_tracing();
  let ctx = ProvisionContext::new(sample_params()).with_services(
    Services::new()
      .with_data_access(seeded_data_access())
      .with_entity_tracker(hub_tracker()),
  );
  let pipeline = tasks::default_catalog()
    .build(&["SetupProjectInformation"])
    .unwrap();

  let err = pipeline.run(ctx, Arc::new(NoopProgress)).await.unwrap_err();

  assert_eq!(err.task_name(), "SetupProjectInformation");
  assert_eq!(
    err.cause_as::<ContextError>(),
    Some(&ContextError::MissingDependency {
      field: fields::TEMPLATE_SCHEMA.to_string()
    })
  );
}

#[tokio::test]
#[serial]
async fn test_copy_into_missing_list_is_attributed_to_copy_task() {
  setup_tracing();
  let data = Arc::new(InMemoryDataAccess::new());
  data.seed("Sjekklisteelementer", vec![row(json!({ "Title": "Only" }))]);
  let ctx = ProvisionContext::new(sample_params())
    .with_services(Services::new().with_data_access(data.clone()).with_entity_tracker(hub_tracker()));
  let pipeline = tasks::default_catalog().build(&tasks::DEFAULT_ORDER).unwrap();

  let err = pipeline.run(ctx, Arc::new(NoopProgress)).await.unwrap_err();

  assert_eq!(err.task_name(), "CopyListData");
  assert_eq!(err.message(), "Failed to copy list content");
  assert!(format!("{:#}", err.cause()).contains("Fasesjekkliste"));
  assert!(data.items("Prosjektegenskaper").is_none());
}

#[tokio::test]
#[serial]
async fn test_copy_with_no_selection_writes_nothing() {
  setup_tracing();
  let mut params = sample_params();
  params.list_content.clear();
  let data = seeded_data_access();
  let ctx = ProvisionContext::new(params)
    .with_services(Services::new().with_data_access(data.clone()).with_entity_tracker(hub_tracker()));
  let pipeline = tasks::default_catalog().build(&["PreTask", "CopyListData"]).unwrap();

  let ctx = pipeline.run(ctx, Arc::new(NoopProgress)).await.unwrap();

  assert!(!ctx.slots().contains(&fields::copied_items("Fasesjekkliste")));
  assert_eq!(data.items("Fasesjekkliste").map(|items| items.len()), Some(0));
}
