//! Report rendering
//!
//! Formats a `CostBreakdown` for the terminal (one table per resource type
//! plus totals) or as JSON.

use crate::cost::{CostBreakdown, ResourceCost};
use crate::error::Result;
use crate::extract::SkippedSource;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, CellAlignment, Table};
use console::style;
use serde::Serialize;
use std::fmt::Write;

/// Everything printed for one run
#[derive(Debug, Serialize)]
pub struct EstimateReport {
    pub generated_at: DateTime<Utc>,
    pub region: String,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedSource>,
    pub breakdown: CostBreakdown,
}

impl EstimateReport {
    pub fn new(region: impl Into<String>, sources: Vec<String>, breakdown: CostBreakdown) -> Self {
        Self {
            generated_at: Utc::now(),
            region: region.into(),
            sources,
            skipped: Vec::new(),
            breakdown,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for resource in &self.breakdown.resources {
            render_resource(&mut out, resource, self.breakdown.running_hours);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(
            out,
            "{} ({})",
            style("Estimated total").bold(),
            self.region
        );
        let _ = writeln!(out, "Hourly:  {}", format_usd(self.breakdown.hourly_total));
        let _ = writeln!(out, "Monthly: {}", format_usd(self.breakdown.monthly_total));

        for skipped in &self.skipped {
            let _ = writeln!(
                out,
                "{}",
                style(format!("WARNING: skipped {}: {}", skipped.source, skipped.reason)).yellow()
            );
        }

        let unpriced = self.breakdown.unpriced().count();
        if unpriced > 0 {
            let _ = writeln!(
                out,
                "{}",
                style(format!(
                    "WARNING: {} shape(s) had no price and are counted as $0.00",
                    unpriced
                ))
                .yellow()
            );
        }
        out
    }
}

fn render_resource(out: &mut String, resource: &ResourceCost, running_hours: u32) {
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        style(format!("Cost of {}", resource.friendly_name)).bold()
    );

    if !resource.line_items.is_empty() || resource.surcharge.is_some() {
        let mut table = Table::new();
        table.set_header(vec!["Type", "Count", "Unit price/h", "Cost/h"]);
        for item in &resource.line_items {
            let unit = match item.unit_price {
                Some(p) => Cell::new(format_usd(p)),
                None => Cell::new("no price").fg(comfy_table::Color::Yellow),
            };
            table.add_row(vec![
                Cell::new(item.shape.as_str()),
                Cell::new(item.count).set_alignment(CellAlignment::Right),
                unit.set_alignment(CellAlignment::Right),
                Cell::new(format_usd(item.hourly_cost)).set_alignment(CellAlignment::Right),
            ]);
        }
        if let Some(surcharge) = &resource.surcharge {
            table.add_row(vec![
                Cell::new(&surcharge.reason),
                Cell::new("-").set_alignment(CellAlignment::Right),
                Cell::new("-").set_alignment(CellAlignment::Right),
                Cell::new(format_usd(surcharge.hourly_cost)).set_alignment(CellAlignment::Right),
            ]);
        }
        let _ = writeln!(out, "Breakdown by type:");
        let _ = writeln!(out, "{table}");
    }

    let _ = writeln!(out, "Total Hourly: {}", format_usd(resource.hourly_total));
    let _ = writeln!(out, "Total Monthly: {}", format_usd(resource.monthly_total));
    let _ = writeln!(
        out,
        "Note: Monthly cost based on {} runtime hours per month",
        running_hours
    );
}

/// Dollar amount with enough precision for sub-cent hourly prices.
pub fn format_usd(amount: f64) -> String {
    if amount != 0.0 && amount.abs() < 1.0 {
        format!("${:.4}", amount)
    } else {
        format!("${:.2}", amount)
    }
}
