//! `roster`: terminal client for the shared contact directory.
//!
//! # Usage
//!
//! ```
//! roster --api-url http://localhost:8000/v2
//! roster --config ~/.config/roster/config.toml
//! ```
//!
//! Logs go to a file (`$TMPDIR/roster.log` unless configured) so they do not
//! scribble over the terminal UI. Set `RUST_LOG` to change the level.

mod app;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  path::PathBuf,
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::{App, Services};
use clap::Parser;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use roster_client::{
  ApiClient, ClientConfig, DirectorySync, HistoryReader, MutationGateway, WsTransport,
  client::DEFAULT_API_URL,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Terminal client for the shared contact directory")]
struct Args {
  /// Path to a TOML config file (api_url, push_url, timeout_secs, log_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the REST API (default: http://localhost:8000/v2).
  #[arg(long, env = "ROSTER_API_URL")]
  api_url: Option<String>,

  /// Base URL of the push channel. Derived from the API URL when omitted.
  #[arg(long, env = "ROSTER_PUSH_URL")]
  push_url: Option<String>,

  /// Where to write logs.
  #[arg(long, env = "ROSTER_LOG_FILE", value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// Shape of the optional config file, also fed by `ROSTER_*` variables.
#[derive(Deserialize, Debug)]
struct Settings {
  #[serde(default = "default_api_url")]
  api_url:      String,
  #[serde(default)]
  push_url:     Option<String>,
  #[serde(default = "default_timeout_secs")]
  timeout_secs: u64,
  #[serde(default)]
  log_file:     Option<PathBuf>,
}

fn default_api_url() -> String { DEFAULT_API_URL.to_string() }

fn default_timeout_secs() -> u64 { 30 }

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
  let mut builder = config::Config::builder();
  if let Some(path) = path {
    builder = builder.add_source(config::File::from(path.as_path()).required(true));
  }
  builder
    .add_source(config::Environment::with_prefix("ROSTER"))
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("failed to deserialise settings")
}

fn init_tracing(path: PathBuf) -> Result<()> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .with_context(|| format!("opening log file {}", path.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let settings = load_settings(args.config.as_ref())?;

  // CLI flags override the config file, which overrides defaults.
  let log_file = args
    .log_file
    .or(settings.log_file)
    .unwrap_or_else(|| std::env::temp_dir().join("roster.log"));
  init_tracing(log_file)?;

  let client_config = ClientConfig {
    api_url:  args.api_url.unwrap_or(settings.api_url),
    push_url: args.push_url.or(settings.push_url),
    timeout:  Duration::from_secs(settings.timeout_secs),
  };
  tracing::info!(api = %client_config.api_url, "starting roster");

  let transport = WsTransport::from_config(&client_config).context("resolving push endpoint")?;
  let api = ApiClient::new(client_config).context("building HTTP client")?;
  let services = Services {
    gateway: MutationGateway::new(api.clone()),
    reader:  HistoryReader::new(api),
    sync:    DirectorySync::new(transport),
  };
  let mut app = App::new(services);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;
  app.shutdown().await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.drain_events().await;
    app.tick();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await
    {
      break;
    }
  }

  Ok(())
}
