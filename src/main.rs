//! Review Pulse - sentiment summaries from a review analysis service.
//!
//! A CLI that submits reviews (or loads the service's stored dataset),
//! retries transient failures, and reports ranked results with a
//! per-sentiment summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, service unreachable, bad response, etc.)

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use review_pulse::cli::Args;
use review_pulse::client::{HttpTransport, Orchestrator};
use review_pulse::config::{Config, CONFIG_FILE_NAME};
use review_pulse::pipeline::{Pipeline, PipelineSnapshot};
use review_pulse::report::{self, Report, ReportMetadata};
use review_pulse::PipelineError;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Review Pulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .reviewpulse.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to point at your analysis service and tune retries.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Fetch, summarize and report.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let transport = HttpTransport::new(config.timeout())?;
    let pipeline = Pipeline::new(Orchestrator::new(
        transport,
        config.service.base_url.clone(),
        config.retry.policy(),
    ));

    let spinner = (!args.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let outcome = if args.load_data {
        if let Some(ref pb) = spinner {
            pb.set_message(format!("Loading stored dataset from {}", config.service.base_url));
        }
        pipeline.load_dataset().await
    } else {
        let input = args
            .review_input()
            .context("Failed to read review input")?;
        if let Some(ref pb) = spinner {
            pb.set_message(format!("Analyzing reviews at {}", config.service.base_url));
        }
        pipeline.submit_reviews(&input).await
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let snapshot = match outcome {
        Ok(snapshot) => snapshot,
        Err(PipelineError::Fetch(e)) => {
            let attempts = pipeline.snapshot().attempts;
            eprintln!("\n❌ {} (after {} attempt(s))", e, attempts);
            eprintln!("   {}", e.guidance());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    write_report(&args, &config, &snapshot, pipeline.orchestrator().base_url())
}

/// Render the report and print or save it.
fn write_report(
    args: &Args,
    config: &Config,
    snapshot: &PipelineSnapshot,
    base_url: &str,
) -> Result<()> {
    let source = snapshot
        .source
        .context("Fetch succeeded without recording its source")?;

    let metadata = ReportMetadata {
        service_url: base_url.to_string(),
        source,
        fetched_at: snapshot.fetched_at.unwrap_or_else(chrono::Utc::now),
        attempts: snapshot.attempts,
    };

    let mut report = Report::new(
        metadata,
        &snapshot.results,
        snapshot.summary.clone(),
        config.report.top,
    );
    report.show_scores = config.report.show_scores;

    let output = report::render(&report, config.report.format)?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Report saved to: {}", path.display());
            }
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
