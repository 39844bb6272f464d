//! Input discovery
//!
//! Resolves the configured input into a list of declaration sources: either
//! every file under a directory whose name matches a glob pattern, or a
//! single plan file.

use super::{ConfigFile, DeclarationSource, PlanFile};
use crate::error::{Result, TfcostError};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where declarations come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Terraform files matching `pattern` under `root`
    Files {
        root: PathBuf,
        pattern: String,
        recursive: bool,
    },
    /// A `terraform show -json` plan
    Plan(PathBuf),
}

impl InputSource {
    /// Open every source this input refers to, in a stable order.
    pub fn open(&self) -> Result<Vec<Box<dyn DeclarationSource>>> {
        match self {
            InputSource::Files {
                root,
                pattern,
                recursive,
            } => Ok(discover(root, pattern, *recursive)?
                .into_iter()
                .map(|p| Box::new(ConfigFile::new(p)) as Box<dyn DeclarationSource>)
                .collect()),
            InputSource::Plan(path) => Ok(vec![Box::new(PlanFile::new(path.clone()))]),
        }
    }

    pub fn is_plan(&self) -> bool {
        matches!(self, InputSource::Plan(_))
    }
}

/// Find files under `root` whose names match `pattern`.
///
/// Without `recursive` only the top level of `root` is searched. Terraform's
/// own `.terraform` directory is never entered.
pub fn discover(root: &Path, pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let invalid = |e: ignore::Error| TfcostError::Validation {
        field: "pattern".to_string(),
        reason: format!("invalid glob '{}': {}", pattern, e),
    };

    let mut overrides = OverrideBuilder::new(root);
    overrides.add(pattern).map_err(invalid)?;
    let overrides = overrides.build().map_err(invalid)?;

    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(false)
        .overrides(overrides)
        .filter_entry(|entry| entry.file_name() != ".terraform");
    if !recursive {
        walker.max_depth(Some(1));
    }

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = entry.map_err(|e| TfcostError::unreadable(root.display().to_string(), e))?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    debug!("Matched {} file(s) for '{}' under {}", files.len(), pattern, root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_discover_top_level_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.tf");
        touch(dir.path(), "db.tf");
        touch(dir.path(), "README.md");
        touch(dir.path(), "modules/vpc/main.tf");

        let files = discover(dir.path(), "*.tf", false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["db.tf", "main.tf"]);
    }

    #[test]
    fn test_discover_recursive_skips_dot_terraform() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.tf");
        touch(dir.path(), "modules/vpc/main.tf");
        touch(dir.path(), ".terraform/modules/x/main.tf");

        let files = discover(dir.path(), "*.tf", true).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| !p.to_string_lossy().contains(".terraform")));
    }

    #[test]
    fn test_discover_invalid_glob() {
        let dir = TempDir::new().unwrap();
        let err = discover(dir.path(), "[", false).unwrap_err();
        assert!(matches!(err, TfcostError::Validation { .. }));
    }

    #[test]
    fn test_open_plan() {
        let source = InputSource::Plan(PathBuf::from("plan.json"));
        let opened = source.open().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].name(), "plan.json");
        assert!(source.is_plan());
    }
}
