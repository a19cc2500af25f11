//! Check-in Scanner (checkin-scan) - Main entry point
//!
//! Console front end for the scan coordinator: decoded QR text comes from an
//! external decoder process or from stdin (keyboard-wedge scanner), commands
//! are typed on stdin, and the current view is printed whenever it changes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use checkin_common::config::ConfigResolver;
use checkin_common::events::{CheckinEvent, EventBus};
use checkin_common::time;
use checkin_scan::console::{self, ConsoleExit};
use checkin_scan::decode::{ChannelDecodeSource, CommandDecodeSource, DecodeSource};
use checkin_scan::lookup::RestLookupClient;
use checkin_scan::ScanCoordinator;
use clap::Parser;
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EVENT_BUS_CAPACITY: usize = 100;
const DECODE_FEED_CAPACITY: usize = 16;
const CONSOLE_LINE_CAPACITY: usize = 16;

/// Command-line arguments for checkin-scan
#[derive(Parser, Debug)]
#[command(name = "checkin-scan")]
#[command(about = "Event check-in scanner")]
#[command(version)]
struct Args {
    /// Configuration file (overrides CHECKIN_CONFIG and the default location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore decodes for this long after accepting a code
    #[arg(long, env = "CHECKIN_COOLDOWN_MS")]
    cooldown_ms: Option<u64>,

    /// Decoder command to run; repeat to give fallbacks in order
    #[arg(long = "decoder-cmd")]
    decoder_cmd: Vec<String>,

    /// Treat non-command stdin lines as scanned text instead of running a decoder
    #[arg(long)]
    stdin_decoder: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: the log level comes from it
    let resolver = ConfigResolver::new("checkin");
    let config_path = resolver.resolve(args.config.as_deref());
    let mut config = resolver
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(cooldown_ms) = args.cooldown_ms {
        config.scan.cooldown_ms = cooldown_ms;
    }
    if !args.decoder_cmd.is_empty() {
        config.decoder.commands = args.decoder_cmd.clone();
    }
    config.validate().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "checkin_scan={level},checkin_common={level}",
                level = config.logging.level
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting Check-in Scanner (checkin-scan) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration file"),
        None => info!("No configuration file found; using defaults"),
    }

    let client =
        RestLookupClient::new(&config.backend).context("Failed to create backend client")?;
    info!(endpoint = %client.endpoint(), "Backend client initialized");

    let use_stdin_decoder = args.stdin_decoder || config.decoder.commands.is_empty();
    let (decoder, decode_feed): (Box<dyn DecodeSource>, Option<mpsc::Sender<String>>) =
        if use_stdin_decoder {
            info!("Reading scanned text from stdin");
            let (feed, source) = ChannelDecodeSource::channel(DECODE_FEED_CAPACITY);
            (Box::new(source), Some(feed))
        } else {
            info!(commands = ?config.decoder.commands, "Using external decoder");
            let source = CommandDecodeSource::new(config.decoder.commands.clone());
            (Box::new(source), None)
        };

    let events = EventBus::new(EVENT_BUS_CAPACITY);
    let event_log = tokio::spawn(log_events(events.subscribe()));

    let (handle, coordinator) =
        ScanCoordinator::spawn(config.scan.clone(), Arc::new(client), decoder, events);
    let printer = tokio::spawn(console::print_view_changes(handle.watch()));

    println!("{}", console::HELP);
    let lines = console::spawn_stdin_reader(CONSOLE_LINE_CAPACITY);

    tokio::select! {
        exit = console::run_console(&handle, lines, decode_feed) => match exit {
            Ok(ConsoleExit::Quit) => info!("Quit requested"),
            Ok(ConsoleExit::InputClosed) => {
                info!("Console input closed");
                if !use_stdin_decoder {
                    // The decoder keeps scanning without a console
                    shutdown_signal().await;
                }
            }
            Err(e) => warn!(error = %e, "Coordinator ended unexpectedly"),
        },
        _ = shutdown_signal() => {}
    }

    if handle.shutdown().await.is_err() {
        debug!("Coordinator already stopped");
    }
    drop(handle);
    coordinator.await.context("Coordinator task failed")?;
    if let Err(e) = printer.await {
        warn!(error = %e, "View printer task failed");
    }
    event_log.abort();

    info!("Shutdown complete");
    Ok(())
}

/// Log every coordinator event as JSON at debug level
async fn log_events(mut rx: broadcast::Receiver<CheckinEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let CheckinEvent::CheckInConfirmed {
                    record_id,
                    timestamp,
                    ..
                } = &event
                {
                    info!(%record_id, at = %time::format_stamp(timestamp), "Checked in");
                }
                match serde_json::to_string(&event) {
                    Ok(json) => debug!(event_type = event.event_type(), %json, "Event"),
                    Err(e) => warn!(error = %e, "Failed to serialize event"),
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
