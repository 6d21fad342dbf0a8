//! Website Canary Binary

use clap::{Parser, Subcommand};
use site_canary::{
    CanaryPoller, CanaryScheduler, Config, Dashboard, HttpProber, LogMetricsSink,
    MemoryMetricsSink, MetricsSink, Result,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "site_canary", version, about = "Scheduled website availability canary")]
struct Cli {
    /// Path to the JSON list of target URLs
    #[arg(long, global = true, env = "CANARY_TARGETS_PATH")]
    targets: Option<PathBuf>,

    /// Record metrics in memory and print them instead of sending them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single canary invocation
    Run,
    /// Run the canary on the configured interval until interrupted
    Schedule,
    /// Print the dashboard body derived from the target list
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    initialize_tracing();

    info!("Starting site canary v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = Config::from_env();
    if let Some(targets) = cli.targets {
        config.targets_path = targets;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Canary configuration - Targets: {}, Namespace: {}, Probe timeout: {:?}, Sink: {}",
        config.targets_path.display(),
        config.namespace,
        config.probe_timeout,
        config.sink_url.as_deref().unwrap_or("log")
    );

    match cli.command {
        Command::Run => {
            let memory_sink = MemoryMetricsSink::new();
            let dry_run_sink: Arc<dyn MetricsSink> = Arc::new(memory_sink.clone());
            let poller = build_poller(&config, cli.dry_run.then_some(dry_run_sink))?;

            match poller.run_once().await {
                Ok(summary) => println!("{}", serde_json::to_string(&summary)?),
                Err(e) => {
                    error!("Canary invocation failed: {}", e);
                    std::process::exit(1);
                }
            }

            if cli.dry_run {
                println!("{}", serde_json::to_string_pretty(&memory_sink.drain().await)?);
            }
        }
        Command::Schedule => {
            // Scheduled dry runs log each datum as it is produced
            let dry_run_sink: Arc<dyn MetricsSink> = Arc::new(LogMetricsSink);
            let poller = build_poller(&config, cli.dry_run.then_some(dry_run_sink))?;

            let scheduler = CanaryScheduler::new(poller, config.schedule_interval);
            scheduler.start().await?;
        }
        Command::Dashboard => {
            let dashboard = Dashboard::load(&config).await?;
            info!("Derived dashboard {} with {} widgets", dashboard.name, dashboard.widgets.len());
            println!("{}", dashboard.body_json()?);
        }
    }

    Ok(())
}

/// Poller emitting to the configured sink, or to `dry_run_sink` when given
fn build_poller(config: &Config, dry_run_sink: Option<Arc<dyn MetricsSink>>) -> Result<CanaryPoller> {
    match dry_run_sink {
        Some(sink) => CanaryPoller::new(config, HttpProber::new(config.probe_timeout)?, sink),
        None => CanaryPoller::from_config(config),
    }
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
