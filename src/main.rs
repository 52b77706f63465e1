//! neagent-watch main entry point
//!
//! This is the command-line interface for the listing watcher.

use clap::Parser;
use neagent_watch::config::{resolve_config, Config, ConfigOverrides};
use neagent_watch::run_forever;
use neagent_watch::storage::{open_store, LinkStore};
use neagent_watch::watcher::watcher_from_config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// neagent-watch: get told about new listings as soon as they appear
///
/// Polls a listing page, follows its pagination, and reports every item link
/// it has not reported before.
#[derive(Parser, Debug)]
#[command(name = "neagent-watch")]
#[command(version)]
#[command(about = "Watches a listing page for new items", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (default: ./neagent.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listing page to watch
    #[arg(short, long, value_name = "URL")]
    link: Option<String>,

    /// Seconds to wait between polls
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Append new links to this file
    #[arg(short, long, value_name = "PATH")]
    file: Option<String>,

    /// SQLite database holding already seen links
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Run unattended (no console output of new links)
    #[arg(short, long)]
    daemon: bool,

    /// Do not print new links to stdout
    #[arg(long)]
    no_stdout: bool,

    /// Telegram bot token
    #[arg(long, value_name = "TOKEN")]
    bot: Option<String>,

    /// Telegram chat id
    #[arg(long, value_name = "ID")]
    cid: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be watched without polling
    #[arg(long, conflicts_with_all = ["list", "once"])]
    dry_run: bool,

    /// Print the links already seen for the watched page and exit
    #[arg(long, conflicts_with_all = ["dry_run", "once"])]
    list: bool,

    /// Run a single poll cycle and exit
    #[arg(long, conflicts_with_all = ["dry_run", "list"])]
    once: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            link: self.link.clone(),
            timeout: self.timeout,
            file: self.file.clone(),
            database_path: self.database.clone(),
            unattended: self.daemon,
            no_stdout: self.no_stdout,
            bot: self.bot.clone(),
            cid: self.cid.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match resolve_config(cli.config.as_deref(), &cli.overrides()) {
        Ok((cfg, Some(hash))) => {
            tracing::info!("Configuration loaded (hash: {})", hash);
            cfg
        }
        Ok((cfg, None)) => {
            tracing::info!("Configuration taken from command line");
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.list {
        handle_list(&config)?;
    } else if cli.once {
        handle_once(&config).await?;
    } else {
        handle_watch(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("neagent_watch=info,warn"),
            1 => EnvFilter::new("neagent_watch=debug,info"),
            2 => EnvFilter::new("neagent_watch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== neagent-watch Dry Run ===\n");

    println!("Watch:");
    println!("  Link: {}", config.watch.link);
    println!("  Poll interval: {}s", config.watch.timeout);
    println!("  Request timeout: {}s", config.watch.request_timeout);
    println!("  Unattended: {}", config.watch.unattended);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nSelectors:");
    println!("  Pagination: {}", config.selectors.pagination);
    println!("  Items: {}", config.selectors.items);

    println!("\nNotifiers:");
    println!(
        "  Console: {}",
        config.notify.stdout && !config.watch.unattended
    );
    println!("  File: {}", file_sink_label(config));
    match &config.notify.telegram {
        Some(telegram) => println!("  Telegram: chat {}", telegram.cid),
        None => println!("  Telegram: (disabled)"),
    }
    println!("  Notify when nothing is new: {}", config.notify.notify_empty);

    println!("\n✓ Configuration is valid");
}

/// Describes the file sink for --dry-run
///
/// There is no default output file, so an unset path is reported as an
/// explicit opt-in rather than a missing value.
fn file_sink_label(config: &Config) -> String {
    match &config.notify.file {
        Some(path) => path.clone(),
        None => "(disabled: no default file; set [notify] file or pass --file)".to_string(),
    }
}

/// Handles the --list mode: prints what the store already holds
fn handle_list(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config.storage);
    store.ensure_schema()?;

    let records = store.seen_links(&config.watch.link)?;
    println!("{} links seen for {}", records.len(), config.watch.link);
    for record in records {
        println!(
            "{}  {}",
            record.inserted_at.format("%Y-%m-%d %H:%M:%S"),
            record.item_link
        );
    }

    Ok(())
}

/// Handles the --once mode: a single poll cycle
async fn handle_once(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let watcher = watcher_from_config(config)?;
    watcher.prepare()?;

    let report = watcher.run_cycle().await?;
    tracing::info!(
        "{}: {} links, {} new",
        watcher.source(),
        report.candidates,
        report.new_links.len()
    );

    Ok(())
}

/// Handles the main watch loop
async fn handle_watch(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting watcher for {}", config.watch.link);

    match run_forever(config).await {
        Ok(()) => {
            tracing::info!("Watcher stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Watcher failed to start: {}", e);
            Err(e.into())
        }
    }
}
