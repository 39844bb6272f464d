//! Estimation pipeline
//!
//! Runs the stages in order: read every source into one tally, build the
//! batched query, ask the pricing service, reduce to a cost breakdown.
//! Sources are read one after the other and the tally is never touched
//! again once the query is built.

use crate::catalog;
use crate::cost::{self, CostOptions};
use crate::error::{Result, TfcostError};
use crate::extract::sources::InputSource;
use crate::extract::{self, DeclarationSource, SkippedSource, SourceReport};
use crate::pricing::{PricingResponse, PricingService};
use crate::query;
use crate::report::EstimateReport;
use crate::tally::ResourceTally;
use tracing::{info, warn};

/// Parameters of one estimate
#[derive(Debug, Clone)]
pub struct EstimateRequest {
    pub region: String,
    pub input: InputSource,
    pub options: CostOptions,
    /// Skip sources that fail to extract instead of aborting
    pub keep_going: bool,
}

/// Result of reading every source
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub tally: ResourceTally,
    pub sources: Vec<SourceReport>,
    pub skipped: Vec<SkippedSource>,
}

impl Extraction {
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.source.clone()).collect()
    }
}

/// Read every source the input refers to into one tally.
///
/// Every known resource type is present in the result, even with nothing
/// declared, so the report always has an entry for it.
pub fn collect(input: &InputSource, keep_going: bool) -> Result<Extraction> {
    let sources = input.open()?;
    if sources.is_empty() {
        warn!("No input files matched");
    }
    collect_from(&sources, input.is_plan(), keep_going)
}

/// Tally already opened sources.
///
/// A source without a resource section is only worth a warning when it is
/// one of many Terraform files; a plan without resources is an error.
pub fn collect_from(
    sources: &[Box<dyn DeclarationSource>],
    plan: bool,
    keep_going: bool,
) -> Result<Extraction> {
    let mut extraction = Extraction::default();
    for resource_type in catalog::known_resource_types() {
        extraction.tally.ensure_type(resource_type);
    }

    for source in sources {
        match extract::tally_source(source.as_ref(), &mut extraction.tally) {
            Ok(report) => {
                info!("{}: counted {} resource(s)", report.source, report.counted);
                extraction.sources.push(report);
            }
            Err(e @ TfcostError::NoResourcesFound { .. }) if !plan => {
                warn!("{}", e);
            }
            Err(e) if keep_going => {
                warn!("Skipping {}: {}", source.name(), e);
                extraction.skipped.push(SkippedSource {
                    source: source.name().to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(extraction)
}

/// Price a finished extraction.
pub async fn price(
    extraction: Extraction,
    region: &str,
    options: &CostOptions,
    service: &dyn PricingService,
) -> Result<EstimateReport> {
    let query = query::build(&extraction.tally, region)?;
    let response = if query.is_empty() {
        info!("Nothing billable found, skipping pricing request");
        PricingResponse::default()
    } else {
        service.fetch(&query).await?
    };

    let breakdown = cost::reduce(&extraction.tally, &response, options)?;
    let mut report = EstimateReport::new(region, extraction.source_names(), breakdown);
    report.skipped = extraction.skipped;
    Ok(report)
}

/// Run the whole pipeline.
pub async fn run(request: &EstimateRequest, service: &dyn PricingService) -> Result<EstimateReport> {
    let extraction = collect(&request.input, request.keep_going)?;
    price(extraction, &request.region, &request.options, service).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AWS_DB_INSTANCE, AWS_INSTANCE};
    use crate::extract::Declaration;
    use crate::pricing::PriceQuote;
    use crate::query::PricingQuery;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        result: fn() -> Result<Vec<Declaration>>,
    }

    impl DeclarationSource for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn declarations(&self) -> Result<Vec<Declaration>> {
            (self.result)()
        }
    }

    fn one_instance() -> Result<Vec<Declaration>> {
        Ok(vec![Declaration {
            resource_type: AWS_INSTANCE.to_string(),
            address: "aws_instance.web".to_string(),
            attributes: json!({"instance_type": "m4.large"}),
            count: 2,
        }])
    }

    fn no_resources() -> Result<Vec<Declaration>> {
        Err(TfcostError::NoResourcesFound {
            source_name: "variables.tf".to_string(),
        })
    }

    fn malformed() -> Result<Vec<Declaration>> {
        Ok(vec![Declaration {
            resource_type: AWS_INSTANCE.to_string(),
            address: "aws_instance.bad".to_string(),
            attributes: json!({}),
            count: 1,
        }])
    }

    fn boxed(name: &'static str, result: fn() -> Result<Vec<Declaration>>) -> Box<dyn DeclarationSource> {
        Box::new(Fixed { name, result })
    }

    #[derive(Default)]
    struct CountingService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PricingService for CountingService {
        async fn fetch(&self, query: &PricingQuery) -> Result<PricingResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PricingResponse::from_quotes(
                query
                    .bindings()
                    .iter()
                    .map(|b| (b.alias.clone(), vec![PriceQuote::hourly_usd("0.1")])),
            ))
        }
    }

    #[test]
    fn test_known_types_always_present() {
        let extraction = collect_from(&[], false, false).unwrap();
        let types: Vec<_> = extraction.tally.resource_types().collect();
        assert!(types.contains(&AWS_INSTANCE));
        assert!(types.contains(&AWS_DB_INSTANCE));
    }

    #[test]
    fn test_no_resources_is_warning_in_file_mode() {
        let sources = vec![boxed("main.tf", one_instance), boxed("variables.tf", no_resources)];
        let extraction = collect_from(&sources, false, false).unwrap();
        assert_eq!(extraction.tally.total(AWS_INSTANCE), 2);
        assert_eq!(extraction.source_names(), vec!["main.tf"]);
        assert!(extraction.skipped.is_empty());
    }

    #[test]
    fn test_no_resources_is_error_for_plan() {
        let sources = vec![boxed("plan.json", no_resources)];
        let err = collect_from(&sources, true, false).unwrap_err();
        assert!(matches!(err, TfcostError::NoResourcesFound { .. }));
    }

    #[test]
    fn test_malformed_aborts_without_keep_going() {
        let sources = vec![boxed("main.tf", one_instance), boxed("bad.tf", malformed)];
        let err = collect_from(&sources, false, false).unwrap_err();
        assert!(matches!(err, TfcostError::MalformedDeclaration { .. }));
    }

    #[test]
    fn test_keep_going_skips_bad_source() {
        let sources = vec![boxed("bad.tf", malformed), boxed("main.tf", one_instance)];
        let extraction = collect_from(&sources, false, true).unwrap();
        assert_eq!(extraction.tally.total(AWS_INSTANCE), 2);
        assert_eq!(extraction.skipped.len(), 1);
        assert_eq!(extraction.skipped[0].source, "bad.tf");
    }

    #[tokio::test]
    async fn test_empty_tally_sends_no_request() {
        let service = CountingService::default();
        let extraction = collect_from(&[], false, false).unwrap();
        let report = price(extraction, "us-east-1", &CostOptions::default(), &service)
            .await
            .unwrap();

        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.breakdown.hourly_total, 0.0);
        assert!(report.breakdown.resource(AWS_INSTANCE).is_some());
        assert!(report.breakdown.resource(AWS_DB_INSTANCE).is_some());
    }

    #[tokio::test]
    async fn test_price_single_request() {
        let service = CountingService::default();
        let sources = vec![boxed("main.tf", one_instance)];
        let extraction = collect_from(&sources, false, false).unwrap();
        let report = price(extraction, "us-east-1", &CostOptions::default(), &service)
            .await
            .unwrap();

        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert!((report.breakdown.hourly_total - 0.2).abs() < 1e-9);
        assert!((report.breakdown.monthly_total - 146.0).abs() < 1e-9);
    }
}
