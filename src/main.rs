mod app;
mod cache;
mod commands;
mod config;
mod environment;
mod error;
mod event;
mod http;
mod layer;
mod logging;
mod orchestrator;
mod region;
mod registry;
mod ui;
mod wfs;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

use crate::cache::RegionKey;
use crate::layer::LayerKind;

#[derive(Parser, Debug)]
#[command(name = "geodash")]
#[command(about = "Terminal dashboard for regional environmental data and editable GIS layers")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./geodash.yaml, then $XDG_CONFIG_HOME/geodash/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Region to start in (central, north, northeast, east, west, south)
  #[arg(short, long)]
  region: Option<String>,

  /// Log to stderr instead of the log file
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load one layer, print it and exit
  Load {
    /// hospitals, students, weather, uv, air or quakes
    layer: LayerKind,

    /// Server-side filter criteria for hospitals/students, e.g. name=Siriraj
    filters: Vec<String>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = logging::init(args.verbose)?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override region if specified on command line
  let region = RegionKey::new(
    args
      .region
      .unwrap_or_else(|| config.default_region.clone())
      .to_lowercase(),
  );

  let mut app = app::App::new(&config, region)?;

  match args.command {
    Some(Command::Load { layer, filters }) => {
      let pairs = filters
        .iter()
        .map(|f| {
          f.split_once('=')
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .ok_or_else(|| eyre!("Expected key=value, got '{}'", f))
        })
        .collect::<Result<Vec<_>>>()?;
      app.load_once(layer, &pairs).await?;
    }
    None => app.run().await?,
  }

  Ok(())
}
