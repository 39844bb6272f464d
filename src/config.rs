use crate::catalog::DEFAULT_DEDICATED_SURCHARGE;
use crate::cost::{CostOptions, DEFAULT_RUNNING_HOURS};
use crate::error::{ConfigError, Result, TfcostError};
use crate::extract::sources::InputSource;
use crate::pricing::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which adapter reads the declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Terraform files matching a glob pattern
    File,
    /// A `terraform show -json` plan
    Plan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// AWS region code, e.g. us-east-1
    pub region: Option<String>,
    pub running_hours: u32,
    /// Flat hourly fee per region for dedicated tenancy
    pub dedicated_surcharge: f64,
    pub source: SourceKind,
    /// Directory searched for Terraform files
    pub dir: PathBuf,
    pub pattern: String,
    pub recursive: bool,
    pub plan: Option<PathBuf>,
    /// Skip sources that fail to extract instead of aborting
    pub keep_going: bool,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            running_hours: DEFAULT_RUNNING_HOURS,
            dedicated_surcharge: DEFAULT_DEDICATED_SURCHARGE,
            source: SourceKind::File,
            dir: PathBuf::from("."),
            pattern: "*.tf".to_string(),
            recursive: false,
            plan: None,
            keep_going: false,
            pricing: PricingConfig::default(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: 3,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.display().to_string()).into());
            }
            p.to_path_buf()
        } else {
            // Try .tfcost.toml in current dir, then ~/.config/tfcost/config.toml
            let local = PathBuf::from(".tfcost.toml");
            if local.exists() {
                local
            } else {
                match dirs::config_dir().map(|d| d.join("tfcost").join("config.toml")) {
                    Some(global) if global.exists() => global,
                    _ => return Ok(Config::default()),
                }
            }
        };

        let content = std::fs::read_to_string(&config_path)?;
        let config: PartialConfig = toml::from_str(&content).map_err(|e| {
            ConfigError::ParseError(format!("{}: {}", config_path.display(), e))
        })?;
        Ok(config.into())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Region code, required before any estimate runs.
    pub fn require_region(&self) -> Result<&str> {
        self.region
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| TfcostError::Config(ConfigError::MissingField("region".to_string())))
    }

    /// Resolve the configured input.
    pub fn input_source(&self) -> Result<InputSource> {
        match self.source {
            SourceKind::File => Ok(InputSource::Files {
                root: self.dir.clone(),
                pattern: self.pattern.clone(),
                recursive: self.recursive,
            }),
            SourceKind::Plan => {
                let plan = self.plan.clone().ok_or_else(|| {
                    TfcostError::Config(ConfigError::MissingField("plan".to_string()))
                })?;
                Ok(InputSource::Plan(plan))
            }
        }
    }

    pub fn cost_options(&self) -> CostOptions {
        CostOptions {
            running_hours: self.running_hours,
            dedicated_surcharge: self.dedicated_surcharge,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.pricing.timeout_secs)
    }
}

/// On-disk form: every field optional, missing ones take the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    region: Option<String>,
    running_hours: Option<u32>,
    dedicated_surcharge: Option<f64>,
    source: Option<SourceKind>,
    dir: Option<PathBuf>,
    pattern: Option<String>,
    recursive: Option<bool>,
    plan: Option<PathBuf>,
    keep_going: Option<bool>,
    #[serde(default)]
    pricing: PartialPricingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialPricingConfig {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
}

impl From<PartialConfig> for Config {
    fn from(p: PartialConfig) -> Self {
        let d = Config::default();
        Config {
            region: p.region.or(d.region),
            running_hours: p.running_hours.unwrap_or(d.running_hours),
            dedicated_surcharge: p.dedicated_surcharge.unwrap_or(d.dedicated_surcharge),
            source: p.source.unwrap_or(d.source),
            dir: p.dir.unwrap_or(d.dir),
            pattern: p.pattern.unwrap_or(d.pattern),
            recursive: p.recursive.unwrap_or(d.recursive),
            plan: p.plan.or(d.plan),
            keep_going: p.keep_going.unwrap_or(d.keep_going),
            pricing: PricingConfig {
                endpoint: p.pricing.endpoint.unwrap_or(d.pricing.endpoint),
                timeout_secs: p.pricing.timeout_secs.unwrap_or(d.pricing.timeout_secs),
                max_attempts: p.pricing.max_attempts.unwrap_or(d.pricing.max_attempts),
            },
        }
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config {
        region: Some("us-east-1".to_string()),
        ..Config::default()
    };
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
