//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use propscope::analysis::{AnalysisRunner, GeminiAnalyzer};
use propscope::config::AppConfig;
use propscope::extract::Extractor;
use propscope::fetch::FetchEngine;
use propscope::models::PropertyFacts;

#[derive(Parser)]
#[command(name = "propscope", version, about = "Fetch, extract, and analyze real-estate listings")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a listing URL and print the extracted property as JSON.
    Extract {
        /// Listing URL.
        url: String,
    },
    /// Run AI condition analysis over a set of image URLs.
    Analyze {
        #[arg(long)]
        address: String,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        beds: Option<u32>,
        #[arg(long)]
        baths: Option<f64>,
        #[arg(long)]
        sqft: Option<u32>,
        #[arg(long)]
        description: Option<String>,
        /// Image URL; repeat for multiple images.
        #[arg(long = "image", required = true)]
        images: Vec<String>,
    },
    /// Fetch, extract, and analyze in one pass.
    Inspect {
        /// Listing URL.
        url: String,
    },
}

/// Whether `-v`/`--verbose` appears on the raw command line. Checked before
/// clap parses so logging can be initialized first.
pub fn is_verbose() -> bool {
    std::env::args().any(|a| a == "-v" || a == "--verbose")
}

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(p) => AppConfig::load(p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(AppConfig::default()),
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Command::Extract { url } => {
            let property = extract_listing(&config, &url).await?;
            println!("{}", serde_json::to_string_pretty(&property)?);
        }
        Command::Analyze {
            address,
            price,
            beds,
            baths,
            sqft,
            description,
            images,
        } => {
            let facts = PropertyFacts {
                address,
                price,
                beds,
                baths,
                sqft,
                description,
                days_on_market: None,
            };
            let verdict = analyze(&config, &facts, &images).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Command::Inspect { url } => {
            let property = extract_listing(&config, &url).await?;
            let facts = PropertyFacts::from(&property);
            let verdict = analyze(&config, &facts, &property.image_urls).await?;
            let report = serde_json::json!({
                "property": property,
                "analysis": verdict,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn extract_listing(
    config: &AppConfig,
    url: &str,
) -> anyhow::Result<propscope::models::ExtractedProperty> {
    let engine = FetchEngine::new(config.fetch.clone());
    let document = match engine.fetch(url).await {
        Ok(doc) => doc,
        Err(e) => {
            anyhow::bail!("{e}\n{}", e.remediation());
        }
    };
    let extractor = Extractor::default();
    Ok(extractor.extract(&document)?)
}

async fn analyze(
    config: &AppConfig,
    facts: &PropertyFacts,
    images: &[String],
) -> anyhow::Result<propscope::models::CombinedVerdict> {
    let analyzer = GeminiAnalyzer::from_config(&config.analysis)?;
    let runner = AnalysisRunner::new(Arc::new(analyzer), config.analysis.clone());
    Ok(runner.analyze(facts, images).await?)
}
