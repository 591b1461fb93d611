//! rpc-console
//!
//! Interactive console for node RPC services.
//!
//! # Architecture Overview
//!
//! ```text
//!   stdin / --exec
//!        │
//!        ▼
//!   ┌─────────┐    ┌────────────┐    ┌──────────┐    ┌───────────┐
//!   │ console │───▶│ dispatcher │───▶│   wire   │───▶│ transport │───▶ node
//!   └─────────┘    └─────┬──────┘    └──────────┘    └───────────┘
//!                        │  ▲
//!          response      ▼  │ bootstrap
//!   ┌─────────────┐  ┌──────────┐
//!   │  transform  │◀─│ recovery │
//!   └──────┬──────┘  └──────────┘
//!          ▼
//!   ┌─────────────┐
//!   │ field store │  surfaces, outputs, interactions
//!   └─────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use rpc_console::catalogue::{self, ids};
use rpc_console::config::watcher::ConfigWatcher;
use rpc_console::config::{load_config, ConsoleConfig};
use rpc_console::console::{Command, Session};
use rpc_console::dispatch::{Dispatcher, HttpTransport};
use rpc_console::fields::MemoryFieldStore;
use rpc_console::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "rpc-console")]
#[command(about = "Console for node RPC services", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes
    #[arg(short, long)]
    watch: bool,

    /// Run these commands and exit instead of reading stdin
    #[arg(short, long = "exec")]
    exec: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConsoleConfig::default(),
    };
    logging::init(&config.observability.log_level);
    tracing::info!("rpc-console v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(match &config.storage.path {
        Some(path) => MemoryFieldStore::load_from_file(path)?,
        None => MemoryFieldStore::new(),
    });
    ids::declare_layout(&store);

    let services = catalogue::builtin()?;
    tracing::info!(
        services = services.len(),
        calls = services.values().map(|s| s.registry.len()).sum::<usize>(),
        "Catalogue loaded"
    );
    let transport = Arc::new(HttpTransport::new()?);
    let dispatcher = Dispatcher::new(services, &config, store.clone(), transport);

    // Dropping the handle stops the watch, so keep it for the whole session.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            let reloaded = dispatcher.clone();
            tokio::spawn(async move {
                while let Some(config) = updates.recv().await {
                    reloaded.apply_config(&config);
                }
            });
            Some(handle)
        }
        (None, true) => {
            tracing::warn!("--watch ignored without --config");
            None
        }
        _ => None,
    };

    let session = Session::new(dispatcher, store.clone());

    if !cli.exec.is_empty() {
        for line in &cli.exec {
            if !run_line(&session, line).await {
                break;
            }
        }
    } else {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if !run_line(&session, &line).await {
                break;
            }
        }
    }

    if config.storage.path.is_some() {
        store.save_to_file()?;
    }
    tracing::info!("Session ended");
    Ok(())
}

/// Execute one line. Returns false when the session should end.
async fn run_line(session: &Session, line: &str) -> bool {
    match Command::parse(line) {
        Ok(None) => true,
        Ok(Some(Command::Quit)) => false,
        Ok(Some(command)) => {
            match session.execute(command).await {
                Ok(out) => print!("{out}"),
                Err(e) => eprintln!("Error: {e}"),
            }
            true
        }
        Err(e) => {
            eprintln!("Error: {e}");
            true
        }
    }
}
