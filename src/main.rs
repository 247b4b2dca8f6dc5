use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use rewrite_host::config;
use rewrite_host::host::Host;

#[derive(Parser, Debug)]
#[command(name = "rewrite-host")]
#[command(about = "A plugin-driven source rewriting host", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (TOML/JSON/YAML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Rewrite files using the configured plugins
    Run {
        /// Files to rewrite in place
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Print a unified diff instead of writing files
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate configuration and plugin health
    Check {
        /// Invoke every plugin against an empty source
        #[arg(long)]
        probe: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("rewrite_host={log_level}").parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match args.config {
        Some(path) => config::load_from_path(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => config::load_from_env_or_file().context("Failed to load configuration")?,
    };

    info!(plugins = config.plugins.len(), "Configuration loaded");

    match args.command {
        Command::Run { files, dry_run } => run(config, files, dry_run).await,
        Command::Check { probe } => check(config, probe).await,
    }
}

async fn run(config: config::Config, files: Vec<PathBuf>, dry_run: bool) -> anyhow::Result<()> {
    let host = Host::new(config).with_dry_run(dry_run);
    let mut required_failures = Vec::new();

    for file in &files {
        let report = host
            .rewrite_file(file)
            .await
            .with_context(|| format!("Failed to process {}", file.display()))?;

        println!(
            "{}: {} applied, {} rejected",
            report.file.display(),
            report.merge.applied.len(),
            report.merge.rejected.len()
        );

        for outcome in &report.outcomes {
            if let Err(e) = &outcome.result {
                println!("  plugin {} failed: {e}", outcome.name);
            }
        }

        for rejected in &report.merge.rejected {
            println!(
                "  rejected [{}] {}..{}: {}",
                rejected.edit.origin, rejected.edit.edit.start, rejected.edit.edit.end, rejected.reason
            );
        }

        if let Some(diff) = &report.diff {
            print!("{diff}");
        }

        if report.required_failure {
            required_failures.push(file.display().to_string());
        }
    }

    if !required_failures.is_empty() {
        anyhow::bail!(
            "Required plugin failed while processing: {}",
            required_failures.join(", ")
        );
    }

    Ok(())
}

async fn check(config: config::Config, probe: bool) -> anyhow::Result<()> {
    println!("Configuration OK ({} plugins)", config.plugins.len());
    for plugin in &config.plugins {
        let state = if plugin.enabled { "enabled" } else { "disabled" };
        println!("  {} -> {} ({state})", plugin.name, plugin.command);
    }

    if probe {
        let host = Host::new(config);
        let mut healthy = true;

        for outcome in host.probe_plugins().await {
            match &outcome.result {
                Ok(_) => println!("  {}: ok ({}ms)", outcome.name, outcome.duration_ms),
                Err(e) => {
                    healthy = false;
                    println!("  {}: {e}", outcome.name);
                }
            }
        }

        if !healthy {
            anyhow::bail!("One or more plugins failed the probe");
        }
    }

    Ok(())
}
