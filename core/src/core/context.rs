// provisor/src/core/context.rs

//! The execution context threaded through a provisioning run.
//!
//! `ProvisionContext` is moved into each task and moved back out through the
//! task's return value. It holds three regions:
//!
//! 1. `params`: caller inputs, read-only once the run starts.
//! 2. `slots`: named outputs accumulated by tasks. Later tasks read what earlier
//!    tasks wrote; reading a field nobody wrote is a `ContextError::MissingDependency`.
//! 3. `services`: collaborator handles built once and reused by later tasks.

use crate::core::params::ProvisionParams;
use crate::error::ContextError;
use crate::services::{DataAccess, EntityTracker};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Well-known slot names used as contracts between the provisioning tasks.
pub mod fields {
  /// `TemplateSchema`, written by `PreTask`.
  pub const TEMPLATE_SCHEMA: &str = "template_schema";
  /// `u64` id of the entity item, written by `SetupProjectInformation`.
  pub const ENTITY_ITEM_ID: &str = "entity_item_id";
  /// `u64` id of the project properties item, written by `SetupProjectInformation`.
  pub const PROPERTIES_ITEM_ID: &str = "properties_item_id";

  /// `usize` count of items `CopyListData` copied into `destination_list`.
  pub fn copied_items(destination_list: &str) -> String {
    format!("copied_items:{destination_list}")
  }
}

type SlotValue = Arc<dyn Any + Send + Sync>;

/// Named, type-erased accumulator for task outputs.
///
/// Values are stored behind `Arc`, so cloning the slots is cheap and never
/// lets one holder observe another's later writes: a write replaces the entry.
#[derive(Clone, Default)]
pub struct ContextSlots {
  values: HashMap<String, (SlotValue, &'static str)>,
}

impl ContextSlots {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds or overwrites `field`.
  pub fn insert<T: Any + Send + Sync>(&mut self, field: impl Into<String>, value: T) {
    self
      .values
      .insert(field.into(), (Arc::new(value), std::any::type_name::<T>()));
  }

  /// Reads `field` as `T`.
  pub fn get<T: Any + Send + Sync>(&self, field: &str) -> Result<&T, ContextError> {
    let (value, _) = self.values.get(field).ok_or_else(|| ContextError::MissingDependency {
      field: field.to_string(),
    })?;
    value.downcast_ref::<T>().ok_or_else(|| ContextError::TypeMismatch {
      field: field.to_string(),
      expected_type: std::any::type_name::<T>().to_string(),
    })
  }

  /// Reads `field` if some task wrote it. Type mismatches are still errors.
  pub fn get_opt<T: Any + Send + Sync>(&self, field: &str) -> Result<Option<&T>, ContextError> {
    if self.contains(field) {
      self.get(field).map(Some)
    } else {
      Ok(None)
    }
  }

  pub fn contains(&self, field: &str) -> bool {
    self.values.contains_key(field)
  }

  /// Removes `field`, returning whether it was present.
  pub fn remove(&mut self, field: &str) -> bool {
    self.values.remove(field).is_some()
  }

  /// Field names in no particular order.
  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.values.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl fmt::Debug for ContextSlots {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut map = f.debug_map();
    for (name, (_, type_name)) in &self.values {
      map.entry(name, type_name);
    }
    map.finish()
  }
}

/// Collaborator services carried by the context.
#[derive(Clone, Default)]
pub struct Services {
  data_access: Option<Arc<dyn DataAccess>>,
  entity_tracker: Option<Arc<dyn EntityTracker>>,
}

impl Services {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_data_access(mut self, data_access: Arc<dyn DataAccess>) -> Self {
    self.data_access = Some(data_access);
    self
  }

  pub fn with_entity_tracker(mut self, entity_tracker: Arc<dyn EntityTracker>) -> Self {
    self.entity_tracker = Some(entity_tracker);
    self
  }

  pub fn set_data_access(&mut self, data_access: Arc<dyn DataAccess>) {
    self.data_access = Some(data_access);
  }

  pub fn set_entity_tracker(&mut self, entity_tracker: Arc<dyn EntityTracker>) {
    self.entity_tracker = Some(entity_tracker);
  }

  pub fn data_access(&self) -> Result<&Arc<dyn DataAccess>, ContextError> {
    self.data_access.as_ref().ok_or_else(|| ContextError::MissingService {
      service: "data_access".to_string(),
    })
  }

  pub fn entity_tracker(&self) -> Result<&Arc<dyn EntityTracker>, ContextError> {
    self.entity_tracker.as_ref().ok_or_else(|| ContextError::MissingService {
      service: "entity_tracker".to_string(),
    })
  }
}

impl fmt::Debug for Services {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Services")
      .field("data_access_present", &self.data_access.is_some())
      .field("entity_tracker_present", &self.entity_tracker.is_some())
      .finish()
  }
}

/// Execution context of one provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionContext {
  params: Arc<ProvisionParams>,
  slots: ContextSlots,
  services: Services,
}

impl ProvisionContext {
  pub fn new(params: ProvisionParams) -> Self {
    Self {
      params: Arc::new(params),
      slots: ContextSlots::new(),
      services: Services::new(),
    }
  }

  pub fn with_services(mut self, services: Services) -> Self {
    self.services = services;
    self
  }

  pub fn params(&self) -> &ProvisionParams {
    &self.params
  }

  pub fn slots(&self) -> &ContextSlots {
    &self.slots
  }

  pub fn slots_mut(&mut self) -> &mut ContextSlots {
    &mut self.slots
  }

  pub fn services(&self) -> &Services {
    &self.services
  }

  pub fn services_mut(&mut self) -> &mut Services {
    &mut self.services
  }

  /// Shorthand for `slots().get(field)`.
  pub fn get<T: Any + Send + Sync>(&self, field: &str) -> Result<&T, ContextError> {
    self.slots.get(field)
  }

  /// Shorthand for `slots_mut().insert(field, value)`.
  pub fn set<T: Any + Send + Sync>(&mut self, field: impl Into<String>, value: T) {
    self.slots.insert(field, value);
  }
}
