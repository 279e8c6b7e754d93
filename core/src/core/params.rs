// provisor/src/core/params.rs

//! Caller-supplied, read-only inputs of a provisioning run.

use serde::{Deserialize, Serialize};

/// One list the selected template asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSchema {
  pub title: String,
  #[serde(default)]
  pub fields: Vec<String>,
}

/// Structure a template provisions on the target site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSchema {
  #[serde(default)]
  pub lists: Vec<ListSchema>,
  /// List that receives the project properties item.
  #[serde(default = "default_properties_list")]
  pub properties_list: String,
}

fn default_properties_list() -> String {
  "Prosjektegenskaper".to_string()
}

impl Default for TemplateSchema {
  fn default() -> Self {
    Self {
      lists: Vec::new(),
      properties_list: default_properties_list(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSelection {
  pub name: String,
  pub schema: TemplateSchema,
}

/// Content to copy from a hub list into a list on the new site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContentConfig {
  pub title: String,
  pub source_list: String,
  pub destination_list: String,
  pub fields: Vec<String>,
}

/// Immutable parameters of one provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionParams {
  pub site_url: String,
  pub site_title: String,
  pub group_id: String,
  pub hub_url: String,
  #[serde(default = "default_projects_list")]
  pub projects_list: String,
  pub template: TemplateSelection,
  #[serde(default)]
  pub list_content: Vec<ListContentConfig>,
}

fn default_projects_list() -> String {
  "Prosjekter".to_string()
}
