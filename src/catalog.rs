//! Fixed lookup tables
//!
//! Known resource types (with their pricing query templates and display names)
//! and the region table. Both are built once on first use and never written
//! afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Terraform resource type for EC2 instances
pub const AWS_INSTANCE: &str = "aws_instance";

/// Terraform resource type for RDS instances
pub const AWS_DB_INSTANCE: &str = "aws_db_instance";

/// Term type used for every pricing lookup
pub const TERM_TYPE: &str = "OnDemand";

/// Flat hourly fee AWS charges per region while any dedicated instance runs
pub const DEFAULT_DEDICATED_SURCHARGE: f64 = 2.00;

/// Billable family a resource type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Compute,
    Database,
}

/// A resource type the pricing query knows how to ask about
#[derive(Debug, Clone)]
pub struct ResourceTemplate {
    pub resource_type: &'static str,
    pub friendly_name: &'static str,
    pub kind: ResourceKind,
    /// Sub-query with `{alias}`, `{location}`, `{term_type}` and the
    /// shape attribute placeholders (see `Shape::attributes`).
    pub query: &'static str,
}

impl ResourceTemplate {
    /// Fill in the template for one shape.
    pub fn render(&self, alias: &str, location: &str, attributes: &[(&str, &str)]) -> String {
        let mut rendered = self
            .query
            .replace("{alias}", alias)
            .replace("{location}", location)
            .replace("{term_type}", TERM_TYPE);
        for (name, value) in attributes {
            rendered = rendered.replace(&format!("{{{}}}", name), value);
        }
        rendered
    }
}

static TEMPLATES: LazyLock<BTreeMap<&'static str, ResourceTemplate>> = LazyLock::new(|| {
    [
        ResourceTemplate {
            resource_type: AWS_INSTANCE,
            friendly_name: "EC2",
            kind: ResourceKind::Compute,
            query: "{alias}: AmazonEC2(Location:\"{location}\", TermType:\"{term_type}\", \
                    InstanceType:\"{instance_type}\", OS:\"Linux\", Tenancy:\"{tenancy}\") \
                    {PricePerUnit Unit Currency}",
        },
        ResourceTemplate {
            resource_type: AWS_DB_INSTANCE,
            friendly_name: "RDS",
            kind: ResourceKind::Database,
            query: "{alias}: AmazonRDS(Location:\"{location}\", TermType:\"{term_type}\", \
                    InstanceType:\"{instance_class}\", DeploymentOption:\"{deployment_option}\", \
                    DatabaseEngine:\"{engine}\") {PricePerUnit Unit Currency}",
        },
    ]
    .into_iter()
    .map(|t| (t.resource_type, t))
    .collect()
});

static REGIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("us-gov-west-1", "AWS GovCloud (US)"),
        ("us-east-1", "US East (N. Virginia)"),
        ("us-east-2", "US East (Ohio)"),
        ("us-west-1", "US West (N. California)"),
        ("us-west-2", "US West (Oregon)"),
        ("ca-central-1", "Canada (Central)"),
        ("eu-west-1", "EU (Ireland)"),
        ("eu-central-1", "EU (Frankfurt)"),
        ("eu-west-2", "EU (London)"),
        ("ap-northeast-1", "Asia Pacific (Tokyo)"),
        ("ap-northeast-2", "Asia Pacific (Seoul)"),
        ("ap-southeast-1", "Asia Pacific (Singapore)"),
        ("ap-southeast-2", "Asia Pacific (Sydney)"),
        ("ap-south-1", "Asia Pacific (Mumbai)"),
        ("sa-east-1", "South America (Sao Paulo)"),
    ])
});

/// Look up the query template for a resource type.
pub fn template(resource_type: &str) -> Option<&'static ResourceTemplate> {
    TEMPLATES.get(resource_type)
}

/// Billable family of a resource type, if it is known.
pub fn kind_of(resource_type: &str) -> Option<ResourceKind> {
    template(resource_type).map(|t| t.kind)
}

/// Display name for a resource type, falling back to the type itself.
pub fn friendly_name(resource_type: &str) -> &str {
    template(resource_type)
        .map(|t| t.friendly_name)
        .unwrap_or(resource_type)
}

/// Known resource type names, in table order.
pub fn known_resource_types() -> impl Iterator<Item = &'static str> {
    TEMPLATES.keys().copied()
}

/// Pricing service display name for a short region code.
pub fn region_display_name(region: &str) -> Option<&'static str> {
    REGIONS.get(region).copied()
}

/// Supported region codes, sorted.
pub fn region_codes() -> Vec<&'static str> {
    let mut codes: Vec<_> = REGIONS.keys().copied().collect();
    codes.sort_unstable();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup() {
        assert_eq!(region_display_name("us-east-1"), Some("US East (N. Virginia)"));
        assert_eq!(region_display_name("mars-north-1"), None);
        assert_eq!(region_codes().len(), 15);
    }

    #[test]
    fn test_render_compute_template() {
        let t = template(AWS_INSTANCE).unwrap();
        let rendered = t.render(
            "m4_large_Shared",
            "US East (Ohio)",
            &[("instance_type", "m4.large"), ("tenancy", "Shared")],
        );
        assert!(rendered.starts_with("m4_large_Shared: AmazonEC2("));
        assert!(rendered.contains("Location:\"US East (Ohio)\""));
        assert!(rendered.contains("TermType:\"OnDemand\""));
        assert!(rendered.contains("InstanceType:\"m4.large\""));
        assert!(rendered.contains("Tenancy:\"Shared\""));
        assert!(rendered.ends_with("{PricePerUnit Unit Currency}"));
    }

    #[test]
    fn test_friendly_names() {
        assert_eq!(friendly_name(AWS_INSTANCE), "EC2");
        assert_eq!(friendly_name(AWS_DB_INSTANCE), "RDS");
        assert_eq!(friendly_name("aws_s3_bucket"), "aws_s3_bucket");
    }
}
