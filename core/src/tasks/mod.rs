// provisor/src/tasks/mod.rs

//! Reference provisioning tasks for `ProvisionContext`.
//!
//! Typical order: `PreTask`, `CopyListData`, `SetupProjectInformation`.
//! Each task documents the context fields it reads and writes.

pub mod copy_list_data;
pub mod pre_task;
pub mod setup_project_information;

pub use copy_list_data::CopyListData;
pub use pre_task::PreTask;
pub use setup_project_information::SetupProjectInformation;

use crate::core::context::ProvisionContext;
use crate::registry::TaskCatalog;

/// Default task order of a provisioning run.
pub const DEFAULT_ORDER: [&str; 3] = [PreTask::NAME, CopyListData::NAME, SetupProjectInformation::NAME];

/// A catalog holding the reference tasks under their own names.
///
/// `PreTask` is registered without an entity tracker factory, so the tracker
/// must be supplied on the context's `Services`.
pub fn default_catalog() -> TaskCatalog<ProvisionContext> {
  let catalog = TaskCatalog::new();
  catalog.register(PreTask::NAME, PreTask::new);
  catalog.register(CopyListData::NAME, || CopyListData);
  catalog.register(SetupProjectInformation::NAME, || SetupProjectInformation);
  catalog
}
