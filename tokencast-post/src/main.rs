//! tokencast-post - generate and dispatch token promo posts

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use libtokencast::config::Config;
use libtokencast::db::Database;
use libtokencast::dispatcher::Dispatcher;
use libtokencast::generator::ContentGenerator;
use libtokencast::logging::{LogFormat, LoggingConfig};
use libtokencast::model::xai::XaiClient;
use libtokencast::pipeline::PromoPipeline;
use libtokencast::platforms::create_platforms;
use libtokencast::registry::PlatformRegistry;
use libtokencast::source::DbTokenSource;
use libtokencast::{Result, RunReport, TokencastError};

#[derive(Parser, Debug)]
#[command(name = "tokencast-post")]
#[command(about = "Generate and post token promos", long_about = None)]
struct Cli {
    /// Maximum number of tokens to process
    #[arg(short, long, default_value_t = 1)]
    limit: usize,

    /// Target specific platform(s) (comma-separated, defaults to config)
    #[arg(short, long)]
    platforms: Option<String>,

    /// Generate and store messages without posting
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    LoggingConfig::new(LogFormat::Text, level.to_string(), cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;

    let platforms = match &cli.platforms {
        Some(list) => list
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        None => config.defaults.platforms.clone(),
    };
    if platforms.is_empty() {
        return Err(TokencastError::Validation(
            "no target platforms (pass --platforms or set [defaults])".to_string(),
        ));
    }

    let model = XaiClient::from_config(&config.model)?;
    let adapters = create_platforms(&config)?;
    info!(
        "dispatching to [{}] with {} adapter(s) available",
        platforms.join(", "),
        adapters.len()
    );

    let pipeline = PromoPipeline::new(
        Arc::new(DbTokenSource::new(db.clone())),
        ContentGenerator::new(Arc::new(model)),
        Dispatcher::new(Arc::new(PlatformRegistry::builtin()), adapters),
        db,
    );

    let report = pipeline
        .run_once(cli.limit, &platforms, cli.dry_run)
        .await?;

    print_report(&report, &cli.format);
    Ok(())
}

fn print_report(report: &RunReport, format: &str) {
    if format == "json" {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize report: {}", e),
        }
        return;
    }

    if report.processed.is_empty() {
        println!("Nothing to post.");
    }
    for token in &report.processed {
        println!("{}:", token.symbol);
        for message in &token.messages {
            println!("  [{}] {}", message.source.as_str(), message.text);
        }
        for outcome in &token.outcomes {
            match (outcome.success, &outcome.error) {
                (true, _) => println!(
                    "  {} ok{}",
                    outcome.platform,
                    outcome
                        .platform_post_id
                        .as_deref()
                        .map(|id| format!(" ({})", id))
                        .unwrap_or_default()
                ),
                (false, Some(kind)) => {
                    println!("  {} failed: {}", outcome.platform, kind.as_str())
                }
                (false, None) => println!("  {} failed", outcome.platform),
            }
        }
    }
    if report.skipped > 0 {
        println!("Skipped {} invalid record(s).", report.skipped);
    }
}
