// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use legiontrap::utils::logging::{
    format_error, format_field, format_info, format_success, format_warning,
};
use legiontrap::{
    Config, EventLog, EventStats, ExportFormat, FeedExporter, IngestPipeline, PrivacyMapper,
    RotationPolicy, ServerContext,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;

#[derive(Parser)]
#[command(name = "legiontrap")]
#[command(author = "cipher")]
#[command(version)]
#[command(about = "Honeypot event collector and threat-intel feed exporter", long_about = None)]
struct Cli {
    /// Optional toml file layered over the built-in defaults
    #[arg(short, long, value_name = "FILE", env = "LEGIONTRAP_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Normalize raw sensor JSON (object, array or NDJSON) into the event log
    Ingest {
        /// Reads stdin when omitted or `-`
        file: Option<PathBuf>,
    },

    /// Render the indicator feed from the current event log
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Ufw)]
        format: ExportFormat,

        /// Writes to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Event counts by window, source and type
    Stats,

    /// Roll the event log now if it is over size and prune old rotations
    Rotate,

    /// Print the effective, non-secret configuration
    ShowConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    legiontrap::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    if let Err(err) = run(cli).await {
        eprintln!("{}", format_error(&format!("{:#}", err)));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(config, host, port).await,
        Commands::Ingest { file } => cmd_ingest(&config, file).await,
        Commands::Export { format, output } => cmd_export(&config, format, output).await,
        Commands::Stats => cmd_stats(&config).await,
        Commands::Rotate => cmd_rotate(&config).await,
        Commands::ShowConfig => cmd_show_config(&config),
    }
}

async fn cmd_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let summary = config.summary();
    info!(
        "Starting legiontrap (privacy={}, scheme={}, events={})",
        summary.privacy_mode, summary.privacy_scheme, summary.events_path
    );

    let context = ServerContext::from_config(config).context("Failed to initialize server")?;
    legiontrap::server::run(context).await?;
    Ok(())
}

async fn cmd_ingest(config: &Config, file: Option<PathBuf>) -> Result<()> {
    let input = match file.as_ref().filter(|path| path.as_os_str() != "-") {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let log = Arc::new(EventLog::from_config(&config.storage));
    let pipeline = IngestPipeline::new(log);
    let summary = pipeline.ingest_text(&input).await?;

    println!(
        "{}",
        format_success(&format!("Ingested {} events", summary.accepted))
    );
    if summary.rejected > 0 {
        println!(
            "{}",
            format_warning(&format!("Skipped {} unparsable lines", summary.rejected))
        );
    }
    Ok(())
}

async fn cmd_export(config: &Config, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    let mapper = PrivacyMapper::from_config(&config.privacy)?;
    let log = Arc::new(EventLog::from_config(&config.storage));
    let exporter = FeedExporter::new(log, mapper).with_demo_fallback(config.export.demo_fallback);

    let rendered = exporter.render(format).await?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(&path, &rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{}",
                format_success(&format!("Wrote {:?} feed to {}", format, path.display()))
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    let log = EventLog::from_config(&config.storage);
    let events = log.snapshot().await;

    if events.is_empty() {
        println!(
            "{}",
            format_info(&format!("No events in {}", log.path().display()))
        );
        return Ok(());
    }

    let stats = EventStats::compute(&events, Utc::now());

    println!("{}", format_info("Event log statistics"));
    println!("{}", format_field("Total", stats.counts.total));
    println!("{}", format_field("Last 24h", stats.counts.last_24h));
    println!("{}", format_field("Last 7d", stats.counts.last_7d));
    println!("{}", format_field("Unique public IPs", stats.unique_ips));

    println!("{}", format_info("By source"));
    for (source, count) in &stats.counts.by_source {
        println!("{}", format_field(source, count));
    }
    println!("{}", format_info("By type"));
    for (event_type, count) in &stats.counts.by_type {
        println!("{}", format_field(event_type, count));
    }
    Ok(())
}

async fn cmd_rotate(config: &Config) -> Result<()> {
    let policy = RotationPolicy::from_config(&config.storage);
    let path = &config.storage.events_path;
    let now = Utc::now();

    match policy.roll_if_needed(path, now).await? {
        Some(rotated) => println!(
            "{}",
            format_success(&format!("Rotated to {}", rotated.display()))
        ),
        None => println!("{}", format_info("Event log is under the size limit")),
    }

    let removed = policy.prune(path, now).await?;
    println!(
        "{}",
        format_success(&format!(
            "Pruned {} rotated logs older than {} days",
            removed, policy.retention_days
        ))
    );
    Ok(())
}

fn cmd_show_config(config: &Config) -> Result<()> {
    let summary = config.summary();

    println!("{}", format_info("Effective configuration"));
    println!("{}", format_field("Listen", format!("{}:{}", config.server.host, config.server.port)));
    println!("{}", format_field("Privacy mode", summary.privacy_mode));
    println!("{}", format_field("Privacy scheme", summary.privacy_scheme));
    println!("{}", format_field("Events path", &summary.events_path));
    println!("{}", format_field("Rotate at bytes", summary.rotate_max_bytes));
    println!("{}", format_field("Retention days", summary.retention_days));
    println!("{}", format_field("API key set", summary.api_key_set));
    println!("{}", format_field("Telegram alerts", summary.notifier_enabled));
    println!("{}", format_field("Demo fallback", summary.demo_fallback));
    Ok(())
}
