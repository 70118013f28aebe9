// CLI entry point for the Gamecon bridge.
//
// Two subcommands:
// - `listen` runs a bridge with the scene-tracking consumer until Ctrl+C (or
//   until the game disconnects, with `--exit-on-disconnect`). With `--json`
//   every decoded event is also written to stdout as one JSON object per
//   line, so the bridge can feed other tools through a pipe.
// - `send` plays the game's side: it reads protocol lines from a file or
//   stdin and sends them to a running bridge, optionally paced.
//
// Config precedence: defaults, then `--config FILE`, then individual flags.
// Logs go to stderr (see `telemetry.rs`).

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use gamecon_bridge::client::GameClient;
use gamecon_bridge::config::{BridgeConfig, DEFAULT_PORT};
use gamecon_bridge::error::BridgeError;
use gamecon_bridge::scene::SceneTracker;
use gamecon_bridge::server::start_bridge;
use gamecon_bridge::telemetry;

/// How often the main thread checks its stop flags.
const MAIN_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(name = "gamecon", version, about = "Bridge between a game and event consumers")]
struct Cli {
    /// Log filter directives (overrides RUST_LOG), e.g. `gamecon_bridge=debug`.
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Accept a game connection and track the scene it describes.
    Listen(ListenArgs),
    /// Send protocol lines to a running bridge, acting as the game.
    Send(SendArgs),
}

#[derive(Debug, Args)]
struct ListenArgs {
    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    bind: Option<IpAddr>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    tick_ms: Option<u64>,
    #[arg(long)]
    accept_poll_ms: Option<u64>,
    #[arg(long)]
    grace_ms: Option<u64>,
    /// Write each decoded event to stdout as a JSON line.
    #[arg(long)]
    json: bool,
    /// Stop when the game disconnects.
    #[arg(long)]
    exit_on_disconnect: bool,
}

#[derive(Debug, Args)]
struct SendArgs {
    #[arg(long, default_value_t = format!("127.0.0.1:{DEFAULT_PORT}"))]
    addr: String,
    /// File of protocol lines; stdin when omitted.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Pause between lines.
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = telemetry::initialise(cli.log_filter.as_deref()) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Listen(args) => listen(args),
        Command::Send(args) => send(args).map_err(|e| e.to_string()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(args: &ListenArgs) -> Result<BridgeConfig, BridgeError> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::from_json_file(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if let Some(accept_poll_ms) = args.accept_poll_ms {
        config.accept_poll_ms = accept_poll_ms;
    }
    if let Some(grace_ms) = args.grace_ms {
        config.shutdown_grace_ms = grace_ms;
    }
    Ok(config)
}

fn listen(args: ListenArgs) -> Result<(), String> {
    let config = build_config(&args).map_err(|e| e.to_string())?;

    let stop = Arc::new(AtomicBool::new(false));
    let ctrlc_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || ctrlc_flag.store(true, Ordering::SeqCst))
        .map_err(|e| format!("failed to install Ctrl+C handler: {e}"))?;

    let mut tracker = SceneTracker::new();
    if args.json {
        tracker = tracker.with_json_sink(Box::new(io::stdout()));
    }
    if args.exit_on_disconnect {
        tracker = tracker.with_quit_flag(Arc::clone(&stop));
    }

    let handle = start_bridge(config, tracker).map_err(|e| e.to_string())?;
    info!(addr = %handle.local_addr(), "waiting for the game; Ctrl+C to stop");

    while !stop.load(Ordering::SeqCst) && handle.is_running() {
        thread::sleep(MAIN_POLL);
    }

    info!("shutting down");
    handle.stop().map_err(|e| e.to_string())
}

fn send(args: SendArgs) -> io::Result<()> {
    let input: Box<dyn BufRead> = match &args.file {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut client = GameClient::connect(args.addr.as_str())?;
    info!(peer = %client.peer_addr(), "sending lines");
    let interval = Duration::from_millis(args.interval_ms);
    let mut sent = 0usize;
    for line in input.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        client.send_line(line)?;
        sent += 1;
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
    info!(sent, "done");
    client.close()
}
