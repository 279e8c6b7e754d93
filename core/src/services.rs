// provisor/src/services.rs

//! Collaborator capabilities carried by the provisioning context.
//!
//! Tasks only see the request/response shapes defined here; transport to the
//! hosted platform lives behind these traits and outside this crate. The
//! in-memory implementations back tests and the demo.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Field values of a list item, keyed by internal field name.
pub type Fields = Map<String, Value>;

/// A record in a list on the target system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
  pub id: u64,
  pub fields: Fields,
}

impl ListItem {
  pub fn field(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }
}

/// Field-equality filter for `DataAccess::fetch_items`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFilter {
  pub field: String,
  pub equals: Value,
}

impl ItemFilter {
  pub fn field_equals(field: impl Into<String>, equals: impl Into<Value>) -> Self {
    Self {
      field: field.into(),
      equals: equals.into(),
    }
  }

  pub fn matches(&self, item: &ListItem) -> bool {
    item.fields.get(&self.field) == Some(&self.equals)
  }
}

/// Read/write access to list-shaped records on the target system.
#[async_trait]
pub trait DataAccess: Send + Sync {
  async fn fetch_items(&self, list: &str, filter: Option<&ItemFilter>) -> Result<Vec<ListItem>>;

  async fn add_item(&self, list: &str, fields: Fields) -> Result<ListItem>;

  /// Merges `fields` into the item, returning the updated item.
  async fn update_item(&self, list: &str, id: u64, fields: Fields) -> Result<ListItem>;

  /// Merges `settings` into the site-level settings of the target site.
  async fn update_site_settings(&self, settings: Fields) -> Result<()>;
}

/// Where the portfolio keeps its entity items and which fields identify them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTrackerConfig {
  pub portal_url: String,
  pub list_name: String,
  #[serde(default = "default_identity_field")]
  pub identity_field: String,
  #[serde(default = "default_url_field")]
  pub url_field: String,
}

fn default_identity_field() -> String {
  "GtGroupId".to_string()
}

fn default_url_field() -> String {
  "GtSiteUrl".to_string()
}

impl EntityTrackerConfig {
  pub fn new(portal_url: impl Into<String>, list_name: impl Into<String>) -> Self {
    Self {
      portal_url: portal_url.into(),
      list_name: list_name.into(),
      identity_field: default_identity_field(),
      url_field: default_url_field(),
    }
  }
}

/// Associates provisioned sites with portfolio entities.
#[async_trait]
pub trait EntityTracker: Send + Sync {
  fn config(&self) -> &EntityTrackerConfig;

  async fn get_entity(&self, group_id: &str) -> Result<Option<ListItem>>;

  /// Merges `fields` into the entity for `group_id`, creating it if needed.
  async fn update_entity(&self, group_id: &str, fields: Fields) -> Result<ListItem>;
}

#[derive(Debug, Default)]
struct ListStore {
  lists: HashMap<String, Vec<ListItem>>,
  site_settings: Fields,
  next_id: u64,
}

impl ListStore {
  fn add(&mut self, list: &str, fields: Fields) -> ListItem {
    self.next_id += 1;
    let item = ListItem { id: self.next_id, fields };
    self.lists.entry(list.to_string()).or_default().push(item.clone());
    item
  }

  fn update(&mut self, list: &str, id: u64, fields: Fields) -> Result<ListItem> {
    let item = self
      .lists
      .get_mut(list)
      .and_then(|items| items.iter_mut().find(|i| i.id == id))
      .ok_or_else(|| anyhow!("Item {id} not found in list '{list}'"))?;
    item.fields.extend(fields);
    Ok(item.clone())
  }
}

/// `DataAccess` over in-process lists.
///
/// Lists must be created (`create_list`, `seed`) before use; touching an
/// unknown list fails like it would on the real platform.
#[derive(Debug, Default)]
pub struct InMemoryDataAccess {
  store: RwLock<ListStore>,
  calls: AtomicUsize,
}

impl InMemoryDataAccess {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn create_list(&self, list: &str) {
    self.store.write().lists.entry(list.to_string()).or_default();
  }

  /// Creates `list` if needed and appends one item per entry of `rows`.
  pub fn seed(&self, list: &str, rows: Vec<Fields>) {
    let mut store = self.store.write();
    store.lists.entry(list.to_string()).or_default();
    for fields in rows {
      store.add(list, fields);
    }
  }

  /// Snapshot of `list`, or `None` if it does not exist.
  pub fn items(&self, list: &str) -> Option<Vec<ListItem>> {
    self.store.read().lists.get(list).cloned()
  }

  pub fn site_settings(&self) -> Fields {
    self.store.read().site_settings.clone()
  }

  /// Number of trait calls served so far.
  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn ensure_list(store: &ListStore, list: &str) -> Result<()> {
    if store.lists.contains_key(list) {
      Ok(())
    } else {
      Err(anyhow!("List '{list}' does not exist"))
    }
  }
}

#[async_trait]
impl DataAccess for InMemoryDataAccess {
  async fn fetch_items(&self, list: &str, filter: Option<&ItemFilter>) -> Result<Vec<ListItem>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let store = self.store.read();
    Self::ensure_list(&store, list)?;
    let items = store.lists.get(list).map(Vec::as_slice).unwrap_or_default();
    Ok(
      items
        .iter()
        .filter(|item| filter.map_or(true, |f| f.matches(item)))
        .cloned()
        .collect(),
    )
  }

  async fn add_item(&self, list: &str, fields: Fields) -> Result<ListItem> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let mut store = self.store.write();
    Self::ensure_list(&store, list)?;
    Ok(store.add(list, fields))
  }

  async fn update_item(&self, list: &str, id: u64, fields: Fields) -> Result<ListItem> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.store.write().update(list, id, fields)
  }

  async fn update_site_settings(&self, settings: Fields) -> Result<()> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.store.write().site_settings.extend(settings);
    Ok(())
  }
}

/// `EntityTracker` over an in-process entity list.
#[derive(Debug)]
pub struct InMemoryEntityTracker {
  config: EntityTrackerConfig,
  store: RwLock<ListStore>,
  calls: AtomicUsize,
}

impl InMemoryEntityTracker {
  pub fn new(config: EntityTrackerConfig) -> Self {
    Self {
      config,
      store: RwLock::new(ListStore::default()),
      calls: AtomicUsize::new(0),
    }
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn find(&self, store: &ListStore, group_id: &str) -> Option<ListItem> {
    let wanted = Value::String(group_id.to_string());
    store
      .lists
      .get(&self.config.list_name)?
      .iter()
      .find(|item| item.fields.get(&self.config.identity_field) == Some(&wanted))
      .cloned()
  }
}

#[async_trait]
impl EntityTracker for InMemoryEntityTracker {
  fn config(&self) -> &EntityTrackerConfig {
    &self.config
  }

  async fn get_entity(&self, group_id: &str) -> Result<Option<ListItem>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.find(&self.store.read(), group_id))
  }

  async fn update_entity(&self, group_id: &str, fields: Fields) -> Result<ListItem> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let mut store = self.store.write();
    match self.find(&store, group_id) {
      Some(existing) => store.update(&self.config.list_name, existing.id, fields),
      None => {
        let mut all = fields;
        all.insert(self.config.identity_field.clone(), Value::String(group_id.to_string()));
        Ok(store.add(&self.config.list_name, all))
      }
    }
  }
}
