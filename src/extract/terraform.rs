//! Terraform configuration files
//!
//! Reads `*.tf` (native HCL, decoded with `hcl-rs`) and `*.tf.json` (JSON
//! syntax) files. Both decode to the same document shape:
//!
//! ```text
//! { "resource": { "<type>": { "<name>": { ...attributes } } } }
//! ```

use super::{Declaration, DeclarationSource};
use crate::error::{Result, TfcostError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Syntax of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Hcl,
    Json,
}

impl Syntax {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Syntax::Json,
            _ => Syntax::Hcl,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    resource: Option<BTreeMap<String, BTreeMap<String, serde_json::Value>>>,
}

/// A Terraform configuration file on disk
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    name: String,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeclarationSource for ConfigFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn declarations(&self) -> Result<Vec<Declaration>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| TfcostError::unreadable(&self.name, e))?;
        parse_config(&self.name, &content, Syntax::for_path(&self.path))
    }
}

/// Decode configuration text into declarations.
pub fn parse_config(source_name: &str, content: &str, syntax: Syntax) -> Result<Vec<Declaration>> {
    let tree: serde_json::Value = match syntax {
        Syntax::Hcl => ::hcl::from_str(content).map_err(|e| TfcostError::unreadable(source_name, e))?,
        Syntax::Json => {
            serde_json::from_str(content).map_err(|e| TfcostError::unreadable(source_name, e))?
        }
    };

    let document = ConfigDocument::deserialize(&tree)
        .map_err(|e| TfcostError::malformed(source_name, "resource", e.to_string()))?;

    let resources = document
        .resource
        .ok_or_else(|| TfcostError::NoResourcesFound {
            source_name: source_name.to_string(),
        })?;

    let mut declarations = Vec::new();
    for (resource_type, named) in resources {
        for (name, body) in named {
            let address = format!("{}.{}", resource_type, name);
            for (i, attributes) in blocks(source_name, &address, body)?.into_iter().enumerate() {
                let address = if i == 0 {
                    address.clone()
                } else {
                    format!("{}[{}]", address, i)
                };
                let count = instance_count(source_name, &address, &attributes)?;
                declarations.push(Declaration {
                    resource_type: resource_type.clone(),
                    address,
                    attributes,
                    count,
                });
            }
        }
    }
    Ok(declarations)
}

/// A resource body is an object, or a list of objects when the same
/// block appears more than once.
fn blocks(
    source_name: &str,
    address: &str,
    body: serde_json::Value,
) -> Result<Vec<serde_json::Value>> {
    match body {
        serde_json::Value::Object(_) => Ok(vec![body]),
        serde_json::Value::Array(items) if items.iter().all(|i| i.is_object()) => Ok(items),
        other => Err(TfcostError::malformed(
            source_name,
            address,
            format!("expected a resource block, found {}", kind_name(&other)),
        )),
    }
}

/// Number of instances a block declares, from its `count` meta-argument.
fn instance_count(source_name: &str, address: &str, attributes: &serde_json::Value) -> Result<u64> {
    if attributes.get("for_each").is_some() {
        warn!("{}: {} uses for_each, counting it once", source_name, address);
        return Ok(1);
    }
    match attributes.get("count") {
        None => Ok(1),
        Some(serde_json::Value::Number(n)) => n.as_u64().ok_or_else(|| {
            TfcostError::malformed(
                source_name,
                address,
                format!("count must be a non-negative integer, found {}", n),
            )
        }),
        Some(serde_json::Value::String(expr)) => match expr.trim().parse::<u64>() {
            Ok(n) => Ok(n),
            Err(_) => {
                warn!(
                    "{}: {} has a computed count ({}), counting it once",
                    source_name, address, expr
                );
                Ok(1)
            }
        },
        Some(other) => Err(TfcostError::malformed(
            source_name,
            address,
            format!("count must be a number, found {}", kind_name(other)),
        )),
    }
}

fn kind_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}
