use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quarry_core::criteria::{EpisodeInfo, SeriesRef};
use quarry_core::{
    load_config, parse, validate_config, Config, DecisionEngine, HttpTransport,
    InMemoryProfileStore, ProfileSet, ProfileStore, Quality, QualitySignal, SanitizedConfig,
    SearchCriteriaBuilder, SearchIntent, SearchReport, SearchTarget,
};

/// Release search and decision tool.
#[derive(Debug, Parser)]
#[command(name = "quarry", version)]
struct Cli {
    /// Configuration file
    #[arg(long, short, env = "QUARRY_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Print collected metrics to stderr on exit
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse release titles and print what was recognised
    Parse {
        #[arg(required = true)]
        titles: Vec<String>,
    },
    /// Show the loaded configuration with secrets removed
    Config,
    /// Fetch recent releases from every RSS-capable indexer
    Rss(ProfileArgs),
    /// Search for a movie
    SearchMovie {
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: Option<u16>,
        #[arg(long)]
        imdb_id: Option<String>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Search for a single episode
    SearchEpisode {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        season: u32,
        #[arg(long)]
        episode: u32,
        /// Air date, YYYY-MM-DD
        #[arg(long)]
        air_date: Option<NaiveDate>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Search for a season: the pack first, then its episodes
    SearchSeason {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        season: u32,
        /// Number of episodes in the season
        #[arg(long)]
        episodes: u32,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Search for an album
    SearchAlbum {
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: String,
        #[arg(long)]
        year: Option<u16>,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Debug, Args)]
struct ProfileArgs {
    /// Quality profile id; defaults to the first configured
    #[arg(long)]
    quality_profile: Option<u32>,
    /// Language profile id; defaults to the first configured
    #[arg(long)]
    language_profile: Option<u32>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[command(flatten)]
    profiles: ProfileArgs,
    /// Quality currently held, e.g. webdl_720p; makes this an upgrade search
    #[arg(long)]
    upgrade_from: Option<String>,
}

#[derive(Debug, Args)]
struct SeriesArgs {
    #[arg(long)]
    series: String,
    #[arg(long)]
    tvdb_id: Option<u32>,
    /// Episodes are identified by air date
    #[arg(long)]
    daily: bool,
}

impl SeriesArgs {
    fn series_ref(&self) -> SeriesRef {
        SeriesRef {
            tvdb_id: self.tvdb_id,
            daily: self.daily,
            ..SeriesRef::new(&self.series)
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.command {
        Command::Parse { .. } => Config::default(),
        _ => {
            let config = load_config(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
            validate_config(&config).context("Configuration validation failed")?;
            config
        }
    };

    init_logging(&config);
    info!(indexers = config.indexers.len(), "Configuration loaded");

    let registry = Registry::new();
    for metric in quarry_core::metrics::all_metrics() {
        registry
            .register(metric)
            .context("Failed to register metrics")?;
    }

    let result = execute(&cli, &config).await;

    if cli.metrics {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        eprint!("{}", String::from_utf8_lossy(&buffer));
    }

    result
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.as_str().into());
    let json = config.logging.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn execute(cli: &Cli, config: &Config) -> Result<()> {
    // Episodes named on the command line are taken to have aired.
    let today = Utc::now().date_naive();

    match &cli.command {
        Command::Parse { titles } => {
            for title in titles {
                print_json(&parse(title))?;
            }
            Ok(())
        }
        Command::Config => print_json(&SanitizedConfig::from(config)),
        Command::Rss(profiles) => {
            let profiles = resolve_profiles(config, profiles)?;
            let engine = build_engine(config)?;
            let cancel = cancel_on_ctrl_c();
            let report = engine.rss_sync(&profiles, &cancel).await;
            finish(report)
        }
        Command::SearchMovie {
            title,
            year,
            imdb_id,
            search,
        } => {
            let target = SearchTarget::Movie {
                title: title.clone(),
                year: *year,
                imdb_id: imdb_id.clone(),
            };
            run_search(config, target, search).await
        }
        Command::SearchEpisode {
            series,
            season,
            episode,
            air_date,
            search,
        } => {
            let target = SearchTarget::Episode {
                series: series.series_ref(),
                episode: EpisodeInfo {
                    season: *season,
                    episode: *episode,
                    air_date: Some(air_date.unwrap_or(today)),
                    has_file: search.upgrade_from.is_some(),
                },
            };
            run_search(config, target, search).await
        }
        Command::SearchSeason {
            series,
            season,
            episodes,
            search,
        } => {
            let target = SearchTarget::Season {
                series: series.series_ref(),
                season: *season,
                episodes: (1..=*episodes)
                    .map(|episode| EpisodeInfo {
                        season: *season,
                        episode,
                        air_date: Some(today),
                        has_file: search.upgrade_from.is_some(),
                    })
                    .collect(),
            };
            run_search(config, target, search).await
        }
        Command::SearchAlbum {
            artist,
            album,
            year,
            search,
        } => {
            let target = SearchTarget::Album {
                artist: artist.clone(),
                album: album.clone(),
                year: *year,
            };
            run_search(config, target, search).await
        }
    }
}

async fn run_search(config: &Config, target: SearchTarget, args: &SearchArgs) -> Result<()> {
    let profiles = resolve_profiles(config, &args.profiles)?;
    let intent = match &args.upgrade_from {
        Some(name) => {
            let quality = Quality::from_name(name)
                .with_context(|| format!("Unknown quality: {}", name))?;
            SearchIntent::Upgrade {
                current: QualitySignal::new(quality),
            }
        }
        None => SearchIntent::Manual,
    };

    let criteria = SearchCriteriaBuilder::new(Utc::now()).build(&target, &intent, &profiles);
    if criteria.is_empty() {
        warn!("Nothing to search for: upgrades disabled or cutoff already met");
    }
    for c in &criteria {
        info!(tier = c.tier, target = %c.target.describe(), "Search criteria");
    }

    let engine = build_engine(config)?;
    let cancel = cancel_on_ctrl_c();
    let report = engine.search(&criteria, &profiles, &cancel).await;
    finish(report)
}

fn build_engine(config: &Config) -> Result<DecisionEngine> {
    let transport = HttpTransport::new(Duration::from_secs(config.engine.request_timeout_secs))
        .context("Failed to create HTTP client")?;
    Ok(DecisionEngine::from_config(config, Arc::new(transport)))
}

fn resolve_profiles(config: &Config, args: &ProfileArgs) -> Result<ProfileSet> {
    let quality_id = match args.quality_profile {
        Some(id) => id,
        None => match config.profiles.quality.first() {
            Some(profile) => profile.id,
            None => bail!("No quality profiles configured"),
        },
    };
    let language_id = match args.language_profile {
        Some(id) => id,
        None => match config.profiles.language.first() {
            Some(profile) => profile.id,
            None => bail!("No language profiles configured"),
        },
    };

    let store = InMemoryProfileStore::new(
        config.profiles.quality.clone(),
        config.profiles.language.clone(),
    );
    Ok(store.resolve(quality_id, language_id)?)
}

/// Cancel the returned token on Ctrl+C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, cancelling search");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to install Ctrl+C handler"),
        }
    });
    token
}

fn finish(report: SearchReport) -> Result<()> {
    print_json(&report)?;
    match report.best() {
        Some(best) => info!(title = %best.item.title, indexer = %best.item.indexer, "Best release"),
        None => info!(status = report.status.code(), "No release accepted"),
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
