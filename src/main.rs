use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use schema_updater::config::{DiscoveryKind, FetchMode, LogConfig, SchemaConfig, log_path};
use schema_updater::logging;
use schema_updater::schema::{SchemaCacheManager, SchemaType, SchemaVersion};

#[derive(Parser)]
#[command(name = "schema-updater")]
#[command(version, about = "Keeps the Hatch package and registry schemas cached locally")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Schema cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    discovery: Option<DiscoveryArg>,

    #[arg(long, global = true, value_enum)]
    fetch_mode: Option<FetchModeArg>,

    /// Log filter, e.g. `debug` (RUST_LOG overrides it)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log file written in addition to stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Download schemas whose cached version is stale
    Update,
    /// Print a schema as JSON
    Load {
        #[arg(value_enum)]
        schema_type: SchemaTypeArg,
        /// Exact release to fetch, bypassing the cache (e.g. 1.2.0)
        #[arg(long)]
        version: Option<String>,
    },
    /// Print the cache record
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaTypeArg {
    Package,
    Registry,
}

impl From<SchemaTypeArg> for SchemaType {
    fn from(arg: SchemaTypeArg) -> Self {
        match arg {
            SchemaTypeArg::Package => SchemaType::Package,
            SchemaTypeArg::Registry => SchemaType::Registry,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DiscoveryArg {
    Releases,
    Manifest,
}

#[derive(Clone, Copy, ValueEnum)]
enum FetchModeArg {
    Direct,
    Archive,
}

impl Cli {
    fn schema_config(&self) -> anyhow::Result<SchemaConfig> {
        let mut config = match &self.config {
            Some(path) => SchemaConfig::from_file(path)?,
            None => SchemaConfig {
                log: LogConfig {
                    file: Some(log_path()),
                    ..LogConfig::default()
                },
                ..SchemaConfig::default()
            },
        };

        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(discovery) = self.discovery {
            config.discovery = match discovery {
                DiscoveryArg::Releases => DiscoveryKind::Releases,
                DiscoveryArg::Manifest => DiscoveryKind::Manifest,
            };
        }
        if let Some(fetch_mode) = self.fetch_mode {
            config.fetch_mode = match fetch_mode {
                FetchModeArg::Direct => FetchMode::Direct,
                FetchModeArg::Archive => FetchMode::Archive,
            };
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Some(log_file) = &self.log_file {
            config.log.file = Some(log_file.clone());
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.schema_config()?;
    let _guard = logging::init(&config.log)?;

    // Single-threaded: requests are issued strictly one after another
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Option<Command>, config: SchemaConfig) -> anyhow::Result<()> {
    let manager =
        SchemaCacheManager::new(&config).context("failed to initialize schema cache")?;

    match command {
        Some(Command::Update) => {
            if manager.check_and_update().await {
                info!("Downloaded new schemas");
            } else {
                info!("No schema updates");
            }
        }
        Some(Command::Load {
            schema_type,
            version,
        }) => {
            let schema_type = SchemaType::from(schema_type);
            let version = SchemaVersion::from_option(version.as_deref());
            let schema = manager
                .load_schema(schema_type, version)
                .await
                .with_context(|| format!("{schema_type} schema is unavailable"))?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Some(Command::Info) => match manager.cached_info() {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => anyhow::bail!(
                "no cached schema info at {:?}",
                manager.cache().info_path()
            ),
        },
        None => {
            if manager.check_and_update().await {
                info!("Downloaded new schemas");
            }
            for schema_type in SchemaType::ALL {
                let title = manager
                    .cache()
                    .read_schema(schema_type)
                    .and_then(|schema| {
                        schema
                            .get("title")
                            .and_then(|t| t.as_str())
                            .map(str::to_string)
                    });
                if let Some(title) = title {
                    info!("{} schema title: {}", schema_type, title);
                }
            }
        }
    }

    Ok(())
}
