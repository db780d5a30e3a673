//! catalog: command-line front end for the episode catalog.
//!
//! Keeps a local SQLite copy of the remote episode listing, refreshes it on
//! demand, and fetches character details straight from the remote.

use std::path::PathBuf;
use std::time::Duration;

use catalog_core::export::write_csv;
use catalog_core::freshness::describe_last_refresh;
use catalog_core::{
    CatalogConfig, Character, EpisodeStore, RefreshOutcome, RemoteClient, ReqwestTransport,
    SqliteStore, Synchronizer,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Browse the episode catalog from the terminal
#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Sync and browse a paginated episode catalog")]
struct Args {
    /// API base URL [env: CATALOG_API_URL]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path of the local episode database
    #[arg(long, global = true, default_value = "catalog.db")]
    db: PathBuf,

    /// Request timeout in seconds [env: CATALOG_TIMEOUT_SECS]
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the local listing with the full remote listing
    Refresh,
    /// List stored episodes by season and episode number
    Episodes {
        /// Refresh before listing
        #[arg(long)]
        refresh: bool,
    },
    /// Show one stored episode and its character IDs
    Episode { id: i64 },
    /// Show when the listing was last refreshed
    Status,
    /// Fetch and show a character
    Character { id: i64 },
    /// Fetch a character and write it to a CSV file
    Export {
        id: i64,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

type App = Synchronizer<ReqwestTransport, SqliteStore>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = CatalogConfig::from_env();
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(secs) = args.timeout.filter(|secs| *secs > 0) {
        config.timeout = Some(Duration::from_secs(secs));
    }
    debug!(api_url = %config.api_url, db = %args.db.display(), "configuration");

    let transport = ReqwestTransport::new(config.timeout)?;
    let store = SqliteStore::open(&args.db)?;
    let app = Synchronizer::new(RemoteClient::new(&config.api_url, transport), store);

    match args.command {
        Command::Refresh => refresh(&app).await?,
        Command::Episodes { refresh: force } => {
            // An empty, never-refreshed store is filled on first use.
            if force || app.last_refresh()?.is_none() {
                refresh(&app).await?;
            }
            list_episodes(&app)?;
        }
        Command::Episode { id } => show_episode(&app, id)?,
        Command::Status => {
            let count = app.store().read_all()?.len();
            let last = describe_last_refresh(app.last_refresh()?, Utc::now());
            println!("Episodes stored: {count}");
            println!("Last refresh:    {last}");
        }
        Command::Character { id } => {
            let character = app.remote().fetch_character(id).await?;
            print_character(&character);
        }
        Command::Export { id, out } => {
            let character = app.remote().fetch_character(id).await?;
            let path = write_csv(&out, &character)?;
            info!(character = id, path = %path.display(), "exported character");
            println!("{}", path.display());
        }
    }

    Ok(())
}

async fn refresh(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    match app.refresh().await? {
        RefreshOutcome::Completed { episodes, .. } => println!("Refreshed {episodes} episodes"),
        RefreshOutcome::Skipped => println!("A refresh is already running"),
    }
    Ok(())
}

fn list_episodes(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let episodes = app.store().read_sorted()?;
    if episodes.is_empty() {
        println!("No episodes stored");
        return Ok(());
    }
    for episode in &episodes {
        println!(
            "{}  {:<40}  {:<12}  {} characters",
            episode.number(),
            episode.name,
            episode.formatted_air_date(),
            episode.character_ids().len()
        );
    }
    Ok(())
}

fn show_episode(app: &App, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let episodes = app.store().read_all()?;
    let Some(episode) = episodes.iter().find(|e| e.id == id) else {
        return Err(format!("episode {id} is not stored; run `catalog refresh` first").into());
    };

    println!("{} {}", episode.number(), episode.name);
    println!("Aired:      {}", episode.formatted_air_date());
    println!("Season:     {}", episode.season());
    println!("Episode:    {}", episode.episode_in_season());
    let ids: Vec<String> = episode.character_ids().iter().map(i64::to_string).collect();
    println!("Characters: {}", ids.join(", "));
    Ok(())
}

fn print_character(character: &Character) {
    println!("{} {}", character.status_glyph(), character.name);
    println!("Status:   {}", character.status);
    println!("Species:  {}", character.species);
    if !character.type_tag.is_empty() {
        println!("Type:     {}", character.type_tag);
    }
    println!("Gender:   {}", character.gender);
    println!("Origin:   {}", character.origin_name());
    println!("Location: {}", character.current_location_name());
    println!("Episodes: {}", character.episode_count());
    if let Some(image) = character.image_url() {
        println!("Image:    {image}");
    }
}
