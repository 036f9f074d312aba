//! FloatTime CLI - Command-line client for Ontime show-control servers
//!
//! Watch the running timer, check reachability and send control commands.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use floattime_client::{OntimeClient, OntimeClientBuilder};
use floattime_core::TimerData;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod display;

use config::{parse_flag, Settings};

/// How long one-shot commands wait for the socket
const CONNECT_WAIT: Duration = Duration::from_secs(5);

/// How long to wait for the first snapshot when a command needs the current event
const FIRST_UPDATE_WAIT: Duration = Duration::from_secs(2);

/// Commands are written by a detached task; give it time before exiting
const FLUSH_GRACE: Duration = Duration::from_millis(200);

/// FloatTime - Ontime timer client
#[derive(Parser)]
#[command(name = "floattime")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Ontime server URL (overrides the stored one)
    #[arg(short, long, global = true, env = "FLOATTIME_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every timer update until interrupted
    Watch {
        /// Print updates as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Check whether the server answers HTTP
    Probe,

    /// Start the loaded event
    Start,

    /// Pause the running timer
    Pause,

    /// Reload the current event
    Reload,

    /// Load the next event
    Next,

    /// Load the previous event
    Previous,

    /// Add time to the running timer
    Add {
        /// Milliseconds to add
        #[arg(default_value = "60000", value_parser = clap::value_parser!(i64).range(0..))]
        ms: i64,
    },

    /// Remove time from the running timer
    Remove {
        /// Milliseconds to remove
        #[arg(default_value = "60000", value_parser = clap::value_parser!(i64).range(0..))]
        ms: i64,
    },

    /// Change the current event's duration
    Duration {
        /// Signed change in milliseconds
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Turn blinking on or off
    Blink {
        #[arg(value_parser = parse_switch)]
        state: bool,
    },

    /// Turn blackout on or off
    Blackout {
        #[arg(value_parser = parse_switch)]
        state: bool,
    },

    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the settings file location and contents
    Show,

    /// Store the server URL
    SetUrl { url: String },

    /// Store any setting by key
    Set { key: String, value: String },
}

fn parse_switch(value: &str) -> std::result::Result<bool, String> {
    parse_flag(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.log_level, cli.json_logs)?;

    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&config_path);
    let server = cli
        .server
        .clone()
        .unwrap_or_else(|| settings.server_url.clone());

    match cli.command {
        Commands::Watch { json } => {
            println!(
                "{} Watching {}",
                "FLOATTIME".cyan().bold(),
                server.yellow()
            );
            watch(&server, json).await?;
        }

        Commands::Probe => {
            let client = OntimeClient::new();
            if client.probe(&server).await {
                println!("{} {} is reachable", "OK".green().bold(), server);
            } else {
                bail!("{} is not reachable", server);
            }
        }

        Commands::Start => control(&server, |c| c.start_timer()).await?,
        Commands::Pause => control(&server, |c| c.pause_timer()).await?,
        Commands::Reload => control(&server, |c| c.reload_timer()).await?,
        Commands::Next => control(&server, |c| c.load_next()).await?,
        Commands::Previous => control(&server, |c| c.load_previous()).await?,

        Commands::Add { ms } => {
            adjust_time(&server, ms, settings.addtime_affects_event_duration).await?;
        }
        Commands::Remove { ms } => {
            adjust_time(&server, -ms, settings.addtime_affects_event_duration).await?;
        }

        Commands::Duration { delta } => {
            let client = connect(&server, true).await?;
            let sent = client.change_event_duration(delta);
            finish(&client, sent).await?;
        }

        Commands::Blink { state } => control(&server, |c| c.set_blink(state)).await?,
        Commands::Blackout { state } => control(&server, |c| c.set_blackout(state)).await?,

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{} {}", "Settings:".green(), config_path.display());
                let rendered =
                    toml::to_string_pretty(&settings).context("Failed to render settings")?;
                print!("{}", rendered);
            }
            ConfigAction::SetUrl { url } => {
                settings.set_server_url(&url);
                settings.save(&config_path)?;
                println!(
                    "{} server_url = {}",
                    "OK".green().bold(),
                    settings.server_url.yellow()
                );
            }
            ConfigAction::Set { key, value } => {
                settings.set(&key, &value)?;
                settings.save(&config_path)?;
                println!("{} {} = {}", "OK".green().bold(), key, value.yellow());
            }
        },
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

async fn watch(server: &str, json: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<TimerData>();

    let client = OntimeClientBuilder::new()
        .on_update(move |data| {
            let _ = tx.send(data);
        })
        .start(server)
        .await
        .with_context(|| format!("Invalid server URL: {}", server))?;

    let mut states = client.subscribe_state();

    loop {
        tokio::select! {
            update = rx.recv() => {
                let Some(data) = update else { break };
                if json {
                    println!("{}", serde_json::to_string(&data)?);
                } else {
                    let line = display::render_line(&data);
                    println!("{}", display::colorize(&line, &data));
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                info!("Connection {}", state);
                if state == floattime_client::ConnectionState::Closed {
                    println!("{}", "Disconnected".yellow());
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    client.stop().await;
    Ok(())
}

/// Connect for a one-shot command, optionally waiting for the first snapshot
async fn connect(server: &str, need_event: bool) -> Result<OntimeClient> {
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();

    let client = OntimeClientBuilder::new()
        .on_update(move |_| {
            let _ = tx.send(());
        })
        .start(server)
        .await
        .with_context(|| format!("Invalid server URL: {}", server))?;

    client
        .wait_until_connected(CONNECT_WAIT)
        .await
        .with_context(|| format!("Could not connect to {}", server))?;

    if need_event && tokio::time::timeout(FIRST_UPDATE_WAIT, rx.recv()).await.is_err() {
        warn!("No update from {} yet", server);
    }

    Ok(client)
}

async fn control<F>(server: &str, command: F) -> Result<()>
where
    F: FnOnce(&OntimeClient) -> bool,
{
    let client = connect(server, false).await?;
    let sent = command(&client);
    finish(&client, sent).await
}

async fn adjust_time(server: &str, delta_ms: i64, adjust_duration: bool) -> Result<()> {
    let client = connect(server, adjust_duration).await?;

    let time_sent = client.nudge_time(delta_ms);
    let duration_sent = adjust_duration.then(|| client.change_event_duration(delta_ms));

    flush(&client).await;
    println!("{}", adjustment_report(time_sent, duration_sent)?);
    Ok(())
}

/// Describe an add/remove that may also have changed the event duration
fn adjustment_report(time_sent: bool, duration_sent: Option<bool>) -> Result<String> {
    let ok = "OK".green().bold();
    match (time_sent, duration_sent) {
        (true, None) => Ok(format!("{} Sent", ok)),
        (true, Some(true)) => Ok(format!("{} Time and event duration changed", ok)),
        (true, Some(false)) => {
            println!("{} Time changed", ok);
            bail!("Current event unknown, event duration left unchanged")
        }
        (false, Some(true)) => bail!("Time change was not sent, event duration was changed"),
        (false, _) => bail!("Time change was not sent"),
    }
}

async fn flush(client: &OntimeClient) {
    tokio::time::sleep(FLUSH_GRACE).await;
    client.stop().await;
}

async fn finish(client: &OntimeClient, sent: bool) -> Result<()> {
    flush(client).await;

    if sent {
        println!("{} Sent", "OK".green().bold());
        Ok(())
    } else {
        bail!("Command was not sent")
    }
}
