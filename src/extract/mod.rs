//! Declaration extractors
//!
//! Adapters that turn an input source (Terraform configuration files or a
//! `terraform show -json` plan) into declarations, and the counting policy
//! that turns a declaration into a resource type and a shape.
//!
//! Both adapters produce the same `Declaration` value: the resource type,
//! a human-readable address, the raw attribute object and how many
//! instances the declaration stands for. Classification then decodes the
//! attributes into a typed structure per known resource type, so a missing
//! or mistyped field fails the declaration instead of producing a different
//! shape.

pub mod plan;
pub mod sources;
pub mod terraform;

use crate::catalog::{self, ResourceKind};
use crate::error::{Result, TfcostError};
use crate::shape::{Deployment, Shape, Tenancy, DELIMITER};
use crate::tally::ResourceTally;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub use self::plan::PlanFile;
pub use self::terraform::ConfigFile;

/// One declared resource, as read from an input source
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub resource_type: String,
    pub address: String,
    pub attributes: serde_json::Value,
    /// Number of instances this declaration creates
    pub count: u64,
}

/// An input the extractors can read declarations from
pub trait DeclarationSource {
    /// Identifier used in logs and errors (usually the file path)
    fn name(&self) -> &str;

    /// Read all resource declarations.
    ///
    /// Fails with `NoResourcesFound` when the source has no resource section.
    fn declarations(&self) -> Result<Vec<Declaration>>;
}

/// Outcome of tallying one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    /// Resources counted into the tally
    pub counted: u64,
    /// Resource types that were skipped because they are not priced
    pub unrecognized: BTreeSet<String>,
}

/// A source left out of the tally because it failed to extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSource {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct InstanceAttributes {
    instance_type: String,
    #[serde(default)]
    tenancy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DbInstanceAttributes {
    instance_class: String,
    engine: String,
    #[serde(default)]
    multi_az: Option<bool>,
}

/// Map a declaration to its shape.
///
/// Unknown resource types yield `UnrecognizedResourceType`, which is
/// informational.
pub fn classify(source_name: &str, decl: &Declaration) -> Result<Shape> {
    let kind = catalog::kind_of(&decl.resource_type).ok_or_else(|| {
        TfcostError::UnrecognizedResourceType {
            resource_type: decl.resource_type.clone(),
        }
    })?;

    let malformed = |reason: String| TfcostError::malformed(source_name, &decl.address, reason);

    match kind {
        ResourceKind::Compute => {
            let attrs: InstanceAttributes = decode(&decl.attributes).map_err(malformed)?;
            literal("instance_type", &attrs.instance_type).map_err(malformed)?;
            let tenancy = tenancy(attrs.tenancy.as_deref()).map_err(malformed)?;
            Ok(Shape::compute(attrs.instance_type, tenancy))
        }
        ResourceKind::Database => {
            let attrs: DbInstanceAttributes = decode(&decl.attributes).map_err(malformed)?;
            literal("instance_class", &attrs.instance_class).map_err(malformed)?;
            literal("engine", &attrs.engine).map_err(malformed)?;
            Ok(Shape::database(
                attrs.instance_class,
                pricing_engine(&attrs.engine),
                Deployment::from_multi_az(attrs.multi_az.unwrap_or(false)),
            ))
        }
    }
}

/// Count every declaration of a source into the tally.
///
/// The whole source is classified before the tally is touched, so a
/// malformed declaration leaves the tally exactly as it was.
pub fn tally_source(
    source: &dyn DeclarationSource,
    tally: &mut ResourceTally,
) -> Result<SourceReport> {
    let declarations = source.declarations()?;
    let mut report = SourceReport {
        source: source.name().to_string(),
        ..Default::default()
    };

    let mut shapes = Vec::with_capacity(declarations.len());
    for decl in &declarations {
        match classify(source.name(), decl) {
            Ok(shape) => {
                debug!(
                    "{}: {} -> {} (x{})",
                    source.name(),
                    decl.address,
                    shape.key(),
                    decl.count
                );
                shapes.push((decl.resource_type.as_str(), shape.key(), decl.count));
            }
            Err(e) if e.is_informational() => {
                info!("{}: {}", source.name(), e);
                report.unrecognized.insert(decl.resource_type.clone());
            }
            Err(e) => return Err(e),
        }
    }

    for (resource_type, key, count) in shapes {
        if count > 0 {
            tally.add(resource_type, &key, count);
            report.counted += count;
        }
    }

    Ok(report)
}

fn decode<T: DeserializeOwned>(attributes: &serde_json::Value) -> std::result::Result<T, String> {
    T::deserialize(attributes).map_err(|e| e.to_string())
}

/// Reject values the decoder left as unevaluated expressions.
fn literal(field: &str, value: &str) -> std::result::Result<(), String> {
    if value.contains("${") {
        return Err(format!("{} is not a literal value: {}", field, value));
    }
    if value.trim().is_empty() {
        return Err(format!("{} is empty", field));
    }
    if value.contains(DELIMITER) {
        return Err(format!("{} contains '{}': {}", field, DELIMITER, value));
    }
    Ok(())
}

fn tenancy(value: Option<&str>) -> std::result::Result<Tenancy, String> {
    match value {
        None | Some("default") => Ok(Tenancy::Shared),
        Some("dedicated") => Ok(Tenancy::Dedicated),
        Some(other) => Err(format!("unsupported tenancy '{}'", other)),
    }
}

/// Pricing service name for a Terraform engine identifier.
fn pricing_engine(engine: &str) -> String {
    let name = match engine {
        "mysql" => "MySQL",
        "postgres" => "PostgreSQL",
        "mariadb" => "MariaDB",
        "aurora" | "aurora-mysql" => "Aurora MySQL",
        "aurora-postgresql" => "Aurora PostgreSQL",
        e if e.starts_with("oracle") => "Oracle",
        e if e.starts_with("sqlserver") => "SQL Server",
        other => other,
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decl(resource_type: &str, attributes: serde_json::Value) -> Declaration {
        Declaration {
            resource_type: resource_type.to_string(),
            address: format!("{}.test", resource_type),
            attributes,
            count: 1,
        }
    }

    struct StaticSource(Vec<Declaration>);

    impl DeclarationSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn declarations(&self) -> Result<Vec<Declaration>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_classify_instance_default_tenancy() {
        let shape = classify("main.tf", &decl("aws_instance", json!({"instance_type": "t2.micro"})))
            .unwrap();
        assert_eq!(shape, Shape::compute("t2.micro", Tenancy::Shared));
    }

    #[test]
    fn test_classify_instance_dedicated() {
        let shape = classify(
            "main.tf",
            &decl(
                "aws_instance",
                json!({"instance_type": "m4.large", "tenancy": "dedicated"}),
            ),
        )
        .unwrap();
        assert!(shape.is_dedicated());
    }

    #[test]
    fn test_classify_instance_host_tenancy_is_malformed() {
        let err = classify(
            "main.tf",
            &decl(
                "aws_instance",
                json!({"instance_type": "m4.large", "tenancy": "host"}),
            ),
        )
        .unwrap_err();
        assert!(matches!(err, TfcostError::MalformedDeclaration { .. }));
    }

    #[test]
    fn test_classify_db_instance() {
        let shape = classify(
            "main.tf",
            &decl(
                "aws_db_instance",
                json!({"instance_class": "db.t3.micro", "engine": "postgres", "multi_az": true}),
            ),
        )
        .unwrap();
        assert_eq!(
            shape,
            Shape::database("db.t3.micro", "PostgreSQL", Deployment::MultiAz)
        );
    }

    #[test]
    fn test_classify_missing_field() {
        let err = classify("main.tf", &decl("aws_instance", json!({"ami": "ami-123"}))).unwrap_err();
        match err {
            TfcostError::MalformedDeclaration {
                source_name,
                address,
                reason,
            } => {
                assert_eq!(source_name, "main.tf");
                assert_eq!(address, "aws_instance.test");
                assert!(reason.contains("instance_type"));
            }
            other => panic!("Expected MalformedDeclaration, got: {:?}", other),
        }
    }

    #[test]
    fn test_classify_mistyped_field() {
        let err = classify("main.tf", &decl("aws_instance", json!({"instance_type": 42}))).unwrap_err();
        assert!(matches!(err, TfcostError::MalformedDeclaration { .. }));
    }

    #[test]
    fn test_classify_interpolation_rejected() {
        let err = classify(
            "main.tf",
            &decl("aws_instance", json!({"instance_type": "${var.instance_type}"})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a literal"));
    }

    #[test]
    fn test_classify_unrecognized() {
        let err = classify("main.tf", &decl("aws_s3_bucket", json!({"bucket": "b"}))).unwrap_err();
        assert!(err.is_informational());
    }

    #[test]
    fn test_tally_source_all_or_nothing() {
        let source = StaticSource(vec![
            decl("aws_instance", json!({"instance_type": "m4.large"})),
            decl("aws_instance", json!({})),
        ]);
        let mut tally = ResourceTally::new();
        assert!(tally_source(&source, &mut tally).is_err());
        assert!(tally.is_empty());
    }

    #[test]
    fn test_tally_source_counts_and_skips() {
        let mut many = decl("aws_instance", json!({"instance_type": "m4.large"}));
        many.count = 3;
        let mut none = decl("aws_instance", json!({"instance_type": "t2.nano"}));
        none.count = 0;
        let source = StaticSource(vec![
            many,
            none,
            decl("aws_s3_bucket", json!({"bucket": "b"})),
        ]);

        let mut tally = ResourceTally::new();
        let report = tally_source(&source, &mut tally).unwrap();
        assert_eq!(report.counted, 3);
        assert!(report.unrecognized.contains("aws_s3_bucket"));
        assert_eq!(
            tally.count("aws_instance", &Shape::compute("m4.large", Tenancy::Shared).key()),
            3
        );
        assert_eq!(tally.total("aws_instance"), 3);
    }

    #[test]
    fn test_pricing_engine_names() {
        assert_eq!(pricing_engine("mysql"), "MySQL");
        assert_eq!(pricing_engine("oracle-se2"), "Oracle");
        assert_eq!(pricing_engine("sqlserver-ex"), "SQL Server");
        assert_eq!(pricing_engine("neptune"), "neptune");
    }
}
