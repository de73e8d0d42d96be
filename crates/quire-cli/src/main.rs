//! `quire` — operator tool for a Quire data directory.
//!
//! Reads `quire.toml` (or the path given with `--config`) layered with
//! `QUIRE_*` environment variables, opens the JSON store (sweeping temp
//! artifacts left by interrupted writes) and runs one command against it.
//!
//! ```text
//! quire resolve wikipedia "  Paris "
//! quire ingest wikipedia Paris --title "Paris"
//! quire list sources
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use quire_core::{
  entity::{Session, Source, Topic, User},
  identity::{OriginKind, resolve_key},
  ingest::ingest,
  record::Record,
  store::DocumentStore,
};
use quire_store_json::{JsonCollection, JsonStore, StoreConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Quire entity store tool")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "quire.toml")]
  config: PathBuf,

  /// Override the configured data directory.
  #[arg(long)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Print the canonical record key for an identifier.
  Resolve { origin: OriginKind, identifier: String },
  /// Store a source unless one with the same canonical key exists.
  Ingest {
    origin:     OriginKind,
    identifier: String,
    #[arg(long)]
    title:      Option<String>,
  },
  /// List collections present in the data directory.
  Collections,
  /// Print every record of a collection as a key → record JSON object.
  List { collection: Collection },
  /// Print one record.
  Get { collection: Collection, key: String },
  /// Delete one record.
  Delete { collection: Collection, key: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
  Users,
  Topics,
  Sources,
  Sessions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .set_default("data_dir", "data")?
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("QUIRE"))
    .set_override_option(
      "data_dir",
      cli.data_dir.as_ref().map(|p| p.to_string_lossy().into_owned()),
    )?
    .build()
    .context("failed to read config file")?;

  let mut store_cfg: StoreConfig = settings
    .try_deserialize()
    .context("failed to deserialise StoreConfig")?;
  store_cfg.data_dir = expand_tilde(&store_cfg.data_dir);

  let store = JsonStore::open(&store_cfg)
    .await
    .with_context(|| format!("failed to open store at {:?}", store_cfg.data_dir))?;

  run(&store, cli.command).await
}

async fn run(store: &JsonStore, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Resolve { origin, identifier } => {
      println!("{}", resolve_key(origin, &identifier)?);
    }

    Command::Ingest { origin, identifier, title } => {
      let sources = store.collection::<Source>();
      let outcome = ingest(&sources, origin, &identifier, |_| Source {
        origin,
        identifier: identifier.clone(),
        title: title.clone().unwrap_or_else(|| identifier.trim().to_owned()),
        body: None,
        fetched_at: Utc::now(),
      })
      .await?;

      if outcome.created {
        tracing::info!(key = %outcome.key, "source ingested");
      } else {
        tracing::info!(key = %outcome.key, "source already present");
      }
      println!("{}", outcome.key);
    }

    Command::Collections => {
      for name in store.collections().await? {
        println!("{name}");
      }
    }

    Command::List { collection } => match collection {
      Collection::Users    => list(store.collection::<User>()).await?,
      Collection::Topics   => list(store.collection::<Topic>()).await?,
      Collection::Sources  => list(store.collection::<Source>()).await?,
      Collection::Sessions => list(store.collection::<Session>()).await?,
    },

    Command::Get { collection, key } => match collection {
      Collection::Users    => get(store.collection::<User>(), &key).await?,
      Collection::Topics   => get(store.collection::<Topic>(), &key).await?,
      Collection::Sources  => get(store.collection::<Source>(), &key).await?,
      Collection::Sessions => get(store.collection::<Session>(), &key).await?,
    },

    Command::Delete { collection, key } => {
      match collection {
        Collection::Users    => store.collection::<User>().delete(&key).await?,
        Collection::Topics   => store.collection::<Topic>().delete(&key).await?,
        Collection::Sources  => store.collection::<Source>().delete(&key).await?,
        Collection::Sessions => store.collection::<Session>().delete(&key).await?,
      }
      tracing::info!(%key, "deleted");
    }
  }
  Ok(())
}

async fn list<T: Record>(collection: JsonCollection<T>) -> anyhow::Result<()> {
  let mut object = serde_json::Map::new();
  for (key, record) in collection.entries().await? {
    object.insert(key, serde_json::to_value(record)?);
  }
  println!("{}", serde_json::to_string_pretty(&object)?);
  Ok(())
}

async fn get<T: Record>(collection: JsonCollection<T>, key: &str) -> anyhow::Result<()> {
  let record = collection.get(key).await?;
  println!("{}", serde_json::to_string_pretty(&record)?);
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
