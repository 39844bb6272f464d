//! Terraform plan files
//!
//! Reads the JSON produced by `terraform show -json <planfile>`. Only
//! `resource_changes` is used: each managed resource that still exists
//! after the plan is applied is one declaration, with the planned `after`
//! state as its attributes. `count` and `for_each` are already expanded by
//! Terraform, so every change counts once.

use super::{Declaration, DeclarationSource};
use crate::error::{Result, TfcostError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PlanDocument {
    #[serde(default)]
    resource_changes: Option<Vec<ResourceChange>>,
}

#[derive(Debug, Deserialize)]
struct ResourceChange {
    address: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(rename = "type")]
    resource_type: String,
    change: Change,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    after: Option<serde_json::Value>,
}

impl ResourceChange {
    fn is_data_source(&self) -> bool {
        self.mode.as_deref() == Some("data")
    }
}

/// A `terraform show -json` plan on disk
#[derive(Debug, Clone)]
pub struct PlanFile {
    path: PathBuf,
    name: String,
}

impl PlanFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeclarationSource for PlanFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn declarations(&self) -> Result<Vec<Declaration>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| TfcostError::unreadable(&self.name, e))?;
        parse_plan(&self.name, &content)
    }
}

/// Decode plan JSON into declarations.
pub fn parse_plan(source_name: &str, content: &str) -> Result<Vec<Declaration>> {
    let tree: serde_json::Value =
        serde_json::from_str(content).map_err(|e| TfcostError::unreadable(source_name, e))?;
    let plan = PlanDocument::deserialize(&tree)
        .map_err(|e| TfcostError::malformed(source_name, "resource_changes", e.to_string()))?;

    let changes = plan
        .resource_changes
        .ok_or_else(|| TfcostError::NoResourcesFound {
            source_name: source_name.to_string(),
        })?;

    let mut declarations = Vec::with_capacity(changes.len());
    for change in changes {
        if change.is_data_source() {
            continue;
        }
        // A null `after` means the resource is destroyed by the plan
        let Some(after) = change.change.after else {
            debug!("{}: skipping {} ({:?})", source_name, change.address, change.change.actions);
            continue;
        };
        declarations.push(Declaration {
            resource_type: change.resource_type,
            address: change.address,
            attributes: after,
            count: 1,
        });
    }
    Ok(declarations)
}
