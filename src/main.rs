use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tfcost::config::{self, Config, SourceKind};
use tfcost::error::format_error_chain;
use tfcost::estimate;
use tfcost::exit_codes::exit_code_for_anyhow;
use tfcost::pricing::GraphQlPricingClient;
use tfcost::{catalog, validation};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tfcost")]
#[command(
    about = "Estimate the AWS cost of Terraform resources",
    long_about = "tfcost reads Terraform configuration files (or a `terraform show -json` plan),\ncounts the billable AWS resources they declare and prices them with one\nbatched request to a public AWS pricing service.\n\nSupported resources:\n  - aws_instance (EC2, shared and dedicated tenancy)\n  - aws_db_instance (RDS, single and multi-AZ)"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the cost of the declared resources
    Estimate {
        /// AWS region code (e.g. us-east-1)
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,
        /// Glob pattern for Terraform files
        #[arg(long, env = "GLOB_PATTERN")]
        pattern: Option<String>,
        /// Hours per month used for the monthly projection
        #[arg(long, env = "RUNNING_HOURS")]
        running_hours: Option<u32>,
        /// Read a `terraform show -json` plan instead of configuration files
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Input source type
        #[arg(long, value_enum)]
        source: Option<SourceKind>,
        /// Directory to search for Terraform files
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Search subdirectories too
        #[arg(short, long)]
        recursive: bool,
        /// Skip files that fail to parse instead of aborting
        #[arg(long)]
        keep_going: bool,
        /// Pricing service endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// List the supported region codes
    Regions,
    /// List the supported resource types
    Types,
    /// Initialize a configuration file
    Init {
        /// Path of the config file to write
        #[arg(short = 'o', long = "path", default_value = ".tfcost.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean; RUST_LOG overrides
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("Error:").red().bold(), format_error_chain(&e));
        std::process::exit(exit_code_for_anyhow(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Estimate {
            region,
            pattern,
            running_hours,
            plan,
            source,
            dir,
            recursive,
            keep_going,
            endpoint,
        } => {
            if let Some(region) = region {
                config.region = Some(region);
            }
            if let Some(pattern) = pattern {
                config.pattern = pattern;
            }
            if let Some(hours) = running_hours {
                config.running_hours = hours;
            }
            if let Some(plan) = plan {
                config.plan = Some(plan);
                config.source = SourceKind::Plan;
            }
            if let Some(source) = source {
                config.source = source;
            }
            if let Some(dir) = dir {
                config.dir = dir;
            }
            if let Some(endpoint) = endpoint {
                config.pricing.endpoint = endpoint;
            }
            config.recursive |= recursive;
            config.keep_going |= keep_going;

            run_estimate(&config, cli.output).await?;
        }
        Commands::Regions => list_regions(cli.output)?,
        Commands::Types => list_types(cli.output)?,
        Commands::Init { path } => {
            config::init_config(&path)?;
        }
    }

    Ok(())
}

async fn run_estimate(config: &Config, output: OutputFormat) -> Result<()> {
    let region = config.require_region()?;
    validation::validate_region(region)?;
    validation::validate_running_hours(config.running_hours)?;
    validation::validate_surcharge(config.dedicated_surcharge)?;
    let input = config.input_source()?;
    if !input.is_plan() {
        validation::validate_pattern(&config.pattern)?;
    }

    let extraction = estimate::collect(&input, config.keep_going)?;

    let client = GraphQlPricingClient::new(
        config.pricing.endpoint.clone(),
        config.timeout(),
        config.pricing.max_attempts,
    )?;

    let pb = if output == OutputFormat::Text && !extraction.tally.is_empty() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Fetching prices (the first request can take a while)...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = estimate::price(extraction, region, &config.cost_options(), &client).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let report = result?;

    match output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => print!("{}", report.render_text()),
    }
    Ok(())
}

fn list_regions(output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            let regions: std::collections::BTreeMap<_, _> = catalog::region_codes()
                .into_iter()
                .map(|code| (code, catalog::region_display_name(code).unwrap_or_default()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&regions)?);
        }
        OutputFormat::Text => {
            let mut table = Table::new();
            table.set_header(vec!["Code", "Location"]);
            for code in catalog::region_codes() {
                table.add_row(vec![code, catalog::region_display_name(code).unwrap_or_default()]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn list_types(output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            let types: std::collections::BTreeMap<_, _> = catalog::known_resource_types()
                .map(|t| (t, catalog::friendly_name(t)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&types)?);
        }
        OutputFormat::Text => {
            let mut table = Table::new();
            table.set_header(vec!["Resource type", "Service"]);
            for resource_type in catalog::known_resource_types() {
                table.add_row(vec![resource_type, catalog::friendly_name(resource_type)]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
