// provisor/src/config.rs

//! Environment-driven settings for a provisioning run.
//!
//! | Variable                 | Meaning                                          |
//! |--------------------------|--------------------------------------------------|
//! | `PROVISOR_DEADLINE_SECS` | Whole-run deadline in seconds, at most one week  |
//! | `PROVISOR_TASKS`         | Comma-separated task order for `TaskCatalog`     |
//! | `PROVISOR_PARAMS_FILE`   | JSON file holding `ProvisionParams`              |

use crate::core::params::ProvisionParams;
use crate::error::ConfigError;
use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const DEADLINE_VAR: &str = "PROVISOR_DEADLINE_SECS";
pub const TASKS_VAR: &str = "PROVISOR_TASKS";
pub const PARAMS_FILE_VAR: &str = "PROVISOR_PARAMS_FILE";

/// Largest accepted `PROVISOR_DEADLINE_SECS`.
pub const MAX_DEADLINE_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
  /// Deadline for the whole run; `None` runs without one.
  pub deadline: Option<Duration>,
  /// Task order to build from a `TaskCatalog`; `None` keeps the caller's default.
  pub task_order: Option<Vec<String>>,
  pub params_file: Option<String>,
}

impl PipelineConfig {
  /// Loads `.env` (if present) and reads the `PROVISOR_*` variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenv().ok();
    let vars: HashMap<String, String> = env::vars().collect();
    let config = Self::from_vars(&vars)?;
    tracing::info!(?config, "Pipeline configuration loaded.");
    Ok(config)
  }

  /// Parses settings from an explicit variable map.
  pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
    let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    let invalid_deadline = |message: String| ConfigError::InvalidVar {
      var: DEADLINE_VAR.to_string(),
      message,
    };
    let deadline = get(DEADLINE_VAR)
      .map(|raw| {
        let secs = raw.parse::<u64>().map_err(|e| invalid_deadline(e.to_string()))?;
        if secs > MAX_DEADLINE_SECS {
          return Err(invalid_deadline(format!("{secs} exceeds the maximum of {MAX_DEADLINE_SECS} seconds")));
        }
        Ok(Duration::from_secs(secs))
      })
      .transpose()?;

    let task_order = get(TASKS_VAR).map(|raw| {
      raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect::<Vec<_>>()
    });

    Ok(Self {
      deadline,
      task_order,
      params_file: get(PARAMS_FILE_VAR).map(String::from),
    })
  }

  /// Reads `ProvisionParams` from `params_file`, if one is configured.
  pub fn load_params(&self) -> Result<Option<ProvisionParams>, ConfigError> {
    let Some(path) = &self.params_file else {
      return Ok(None);
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ParamsFile {
      path: path.clone(),
      source,
    })?;
    let params = serde_json::from_str(&raw).map_err(|source| ConfigError::ParamsParse {
      path: path.clone(),
      source,
    })?;
    Ok(Some(params))
  }
}
