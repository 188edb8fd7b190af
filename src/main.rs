use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tvstream::{
    config::{Config, Layout, defaults::DEFAULT_WATCH_INTERVAL},
    errors::AppError,
    models::{GroupedView, VideoEntry},
    playback::{CommandPlaybackSurface, MediaKind, play_entry},
    projector::{LoadStatus, ViewState, ViewStateProjector},
    repositories::create_store,
};

/// Widest title shown in a grid cell
const MAX_CELL_WIDTH: usize = 32;

#[derive(Parser)]
#[command(name = "tvstream")]
#[command(version)]
#[command(about = "Browse a video catalogue by category and hand videos to a player")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "tvstream.toml")]
    config: PathBuf,

    /// Catalogue source: builtin, a file path or an http(s) URL (overrides config file)
    #[arg(short, long, value_name = "SOURCE")]
    source: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the catalogue as category rows or a flat grid
    List {
        /// Layout (overrides config file)
        #[arg(long, value_enum)]
        layout: Option<Layout>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a single video
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },
    /// Hand a video to the configured player
    Play { id: String },
    /// Print every published snapshot, refreshing on an interval until Ctrl-C
    Watch {
        #[arg(
            long,
            value_parser = humantime::parse_duration,
            default_value = DEFAULT_WATCH_INTERVAL
        )]
        interval: Duration,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let log_filter = format!("tvstream={log_level}");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_filter.into());

    let (text_layer, json_layer) = match format {
        LogFormat::Text => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    debug!("Configuration loaded from: {}", cli.config.display());

    if let Some(source) = cli.source {
        config.catalogue.source = source;
    }

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let store = create_store(&config.catalogue)?;
    let projector =
        ViewStateProjector::with_timeout(Arc::clone(&store), config.catalogue.load_timeout);

    match cli.command {
        Command::List { layout, json } => {
            let snapshot = load_snapshot(&projector).await?;
            let layout = layout.unwrap_or(config.display.layout);
            if json {
                let text = match layout {
                    Layout::Rows => serde_json::to_string_pretty(&snapshot.grouped)?,
                    Layout::Grid => serde_json::to_string_pretty(&snapshot.flat)?,
                };
                println!("{text}");
            } else {
                match layout {
                    Layout::Rows => print!("{}", render_rows(&snapshot.grouped)),
                    Layout::Grid => {
                        print!("{}", render_grid(&snapshot.flat, config.display.grid_columns))
                    }
                }
            }
        }
        Command::Show { id, json } => {
            let snapshot = load_snapshot(&projector).await?;
            let entry = snapshot.entry(&id).ok_or_else(|| AppError::not_found("video", &id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&**entry)?);
            } else {
                print!("{}", render_entry(entry));
            }
        }
        Command::Play { id } => {
            let surface = CommandPlaybackSurface::from_config(&config.player);
            let request = play_entry(store.as_ref(), &surface, &id).await?;
            info!("Player '{}' finished playing {}", surface.command(), request.id);
        }
        Command::Watch { interval } => watch(&projector, interval).await?,
        Command::Config => {}
    }

    projector.shutdown().await;
    Ok(())
}

/// Load once and fail when nothing usable was published
async fn load_snapshot(projector: &ViewStateProjector) -> Result<Arc<ViewState>> {
    let outcome = projector.load().await;
    let snapshot = outcome
        .snapshot()
        .cloned()
        .ok_or_else(|| AppError::internal("catalogue load was discarded"))?;

    if let LoadStatus::Failed(failure) = &snapshot.status {
        anyhow::bail!("{failure}");
    }
    Ok(snapshot)
}

async fn watch(projector: &ViewStateProjector, interval: Duration) -> Result<()> {
    let subscription = projector
        .subscribe(|snapshot: &Arc<ViewState>| {
            println!("== {} ==", snapshot.status);
            print!("{}", render_rows(&snapshot.grouped));
        })
        .await;

    let _initial_load = projector.spawn_load();
    info!("Watching {} every {}", projector.describe_store(), humantime::format_duration(interval));

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("Received Ctrl-C, stopping");
                break;
            }
            _ = ticker.tick() => {
                projector.refresh().await;
            }
        }
    }

    subscription.unsubscribe();
    Ok(())
}

fn kind_label(entry: &VideoEntry) -> MediaKind {
    MediaKind::from_url(&entry.media_url)
}

fn render_rows(grouped: &GroupedView) -> String {
    let mut out = String::new();
    for row in grouped {
        out.push_str(&format!("{} ({})\n", row.category, row.len()));
        for entry in &row.entries {
            out.push_str(&format!("  {:<6} {} [{}]\n", entry.id, entry.title, kind_label(entry)));
        }
    }
    out
}

fn render_grid(entries: &[Arc<VideoEntry>], columns: usize) -> String {
    let width = entries
        .iter()
        .map(|entry| entry.title.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_CELL_WIDTH);

    let mut out = String::new();
    for chunk in entries.chunks(columns.max(1)) {
        let cells: Vec<String> = chunk
            .iter()
            .map(|entry| format!("{:<width$}", truncate(&entry.title, width)))
            .collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }
    out
}

fn render_entry(entry: &VideoEntry) -> String {
    let thumbnail = if entry.has_thumbnail() { entry.thumbnail_url.as_str() } else { "-" };
    format!(
        "id:        {}\ntitle:     {}\ncategory:  {}\nmedia:     {} ({})\nthumbnail: {}\n",
        entry.id,
        entry.title,
        entry.category,
        entry.media_url,
        kind_label(entry),
        thumbnail
    )
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        return title.to_string();
    }
    let mut short: String = title.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
