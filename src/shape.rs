//! Shape keys
//!
//! A shape is the set of billing-relevant attributes of one resource
//! configuration. It is stored in the tally as a comma-joined key
//! (`m4.large,Shared`, `db.t3.micro,MySQL,Single-AZ`) and sent to the
//! pricing service under an identifier-safe alias (`m4_large_Shared`).

use crate::catalog::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between shape components. Never appears inside a component.
pub const DELIMITER: char = ',';

/// EC2 tenancy as the pricing service names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tenancy {
    Shared,
    Dedicated,
}

impl Tenancy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tenancy::Shared => "Shared",
            Tenancy::Dedicated => "Dedicated",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "Shared" => Some(Tenancy::Shared),
            "Dedicated" => Some(Tenancy::Dedicated),
            _ => None,
        }
    }
}

/// RDS deployment option as the pricing service names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deployment {
    SingleAz,
    MultiAz,
}

impl Deployment {
    pub fn from_multi_az(multi_az: bool) -> Self {
        if multi_az {
            Deployment::MultiAz
        } else {
            Deployment::SingleAz
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Deployment::SingleAz => "Single-AZ",
            Deployment::MultiAz => "Multi-AZ",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "Single-AZ" => Some(Deployment::SingleAz),
            "Multi-AZ" => Some(Deployment::MultiAz),
            _ => None,
        }
    }
}

/// Decoded billing attributes of one resource configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Compute {
        instance_type: String,
        tenancy: Tenancy,
    },
    Database {
        instance_class: String,
        engine: String,
        deployment: Deployment,
    },
}

impl Shape {
    pub fn compute(instance_type: impl Into<String>, tenancy: Tenancy) -> Self {
        Shape::Compute {
            instance_type: instance_type.into(),
            tenancy,
        }
    }

    pub fn database(
        instance_class: impl Into<String>,
        engine: impl Into<String>,
        deployment: Deployment,
    ) -> Self {
        Shape::Database {
            instance_class: instance_class.into(),
            engine: engine.into(),
            deployment,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Shape::Compute { .. } => ResourceKind::Compute,
            Shape::Database { .. } => ResourceKind::Database,
        }
    }

    pub fn is_dedicated(&self) -> bool {
        matches!(
            self,
            Shape::Compute {
                tenancy: Tenancy::Dedicated,
                ..
            }
        )
    }

    /// Encode into a tally key.
    pub fn key(&self) -> ShapeKey {
        let parts: Vec<&str> = match self {
            Shape::Compute {
                instance_type,
                tenancy,
            } => vec![instance_type.as_str(), tenancy.as_str()],
            Shape::Database {
                instance_class,
                engine,
                deployment,
            } => vec![instance_class.as_str(), engine.as_str(), deployment.as_str()],
        };
        ShapeKey(parts.join(&DELIMITER.to_string()))
    }

    /// Named attributes substituted into a query template.
    pub fn attributes(&self) -> Vec<(&'static str, &str)> {
        match self {
            Shape::Compute {
                instance_type,
                tenancy,
            } => vec![
                ("instance_type", instance_type.as_str()),
                ("tenancy", tenancy.as_str()),
            ],
            Shape::Database {
                instance_class,
                engine,
                deployment,
            } => vec![
                ("instance_class", instance_class.as_str()),
                ("engine", engine.as_str()),
                ("deployment_option", deployment.as_str()),
            ],
        }
    }

    /// Decode a tally key for the given family.
    ///
    /// A compute key without a tenancy component is read as shared tenancy,
    /// which keeps bare instance-type keys (`r4.xlarge`) usable.
    pub fn decode(kind: ResourceKind, key: &ShapeKey) -> Option<Self> {
        let parts: Vec<&str> = key.0.split(DELIMITER).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        match (kind, parts.as_slice()) {
            (ResourceKind::Compute, [instance_type]) => {
                Some(Shape::compute(*instance_type, Tenancy::Shared))
            }
            (ResourceKind::Compute, [instance_type, tenancy]) => {
                Some(Shape::compute(*instance_type, Tenancy::parse(tenancy)?))
            }
            (ResourceKind::Database, [class, engine, deployment]) => Some(Shape::database(
                *class,
                *engine,
                Deployment::parse(deployment)?,
            )),
            _ => None,
        }
    }
}

/// Opaque tally key for one shape
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeKey(String);

impl ShapeKey {
    pub fn new(key: impl Into<String>) -> Self {
        ShapeKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier-safe alias for this key.
    pub fn alias(&self) -> String {
        to_alias(&self.0)
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeKey {
    fn from(key: &str) -> Self {
        ShapeKey::new(key)
    }
}

/// Replace every character that is not legal in a query identifier with `_`.
///
/// Distinct keys can collide after this (`m4.large` and `m4-large`); the
/// query builder rejects such collisions.
pub fn to_alias(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
