use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Mino;
use creatorscout_common::{Config, DiscoveryRequest, SubscriberRange};
use creatorscout_discovery::discovery::Annotator;
use creatorscout_discovery::export::export_csv;
use creatorscout_discovery::infra::{MemoryCache, RetryPolicy};
use creatorscout_discovery::traits::TabularStore;
use creatorscout_discovery::{Discovery, DiscoveryDeps};
use sheets_client::SheetsClient;

#[derive(Parser)]
#[command(name = "creatorscout", about = "Discover video creators and sync them to a spreadsheet")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one discovery pass and print the JSON summary
    Discover(DiscoverArgs),
    /// Create an empty store with the header row
    CreateStore,
    /// Print a store as CSV
    Export {
        #[arg(long)]
        store_id: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Annotate a single channel
    Analyze {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Args)]
struct DiscoverArgs {
    #[arg(long)]
    query: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    subcategory: Option<String>,
    #[arg(long)]
    min_subscribers: Option<u64>,
    #[arg(long)]
    max_subscribers: Option<u64>,
    #[arg(long, default_value_t = 0)]
    min_video_count: u64,
    #[arg(long, default_value_t = 20)]
    page_size: u32,
    #[arg(long, default_value_t = 1)]
    max_pages: u32,
    /// Existing store to reconcile against; a new one is created when omitted
    #[arg(long)]
    store_id: Option<String>,
}

impl DiscoverArgs {
    fn into_request(self) -> DiscoveryRequest {
        DiscoveryRequest {
            query: self.query,
            category: self.category,
            subcategory: self.subcategory,
            subscriber_range: SubscriberRange::new(self.min_subscribers, self.max_subscribers),
            min_video_count: self.min_video_count,
            page_size: self.page_size,
            max_pages: self.max_pages,
            store_id: self.store_id,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("creatorscout=info".parse()?);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    config.log_redacted();

    match cli.command {
        Command::Discover(args) => {
            let request = args.into_request();
            let cache = Arc::new(MemoryCache::new());
            let deps = DiscoveryDeps::from_config(&config, cache)?;
            let response = Discovery::new(deps)
                .run(&request, None)
                .await
                .context("Discovery run failed")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::CreateStore => {
            let store = sheets(&config)?;
            let created = store
                .create_store()
                .await
                .context("Failed to create store")?;
            info!(store_id = created.store_id.as_str(), "Store created");
            println!("{}", serde_json::json!({
                "store_id": created.store_id,
                "store_url": created.store_url,
            }));
        }
        Command::Export { store_id, out } => {
            let store = sheets(&config)?;
            let retry = RetryPolicy {
                attempts: config.retry_attempts,
                ..RetryPolicy::default()
            };
            let csv = export_csv(&store, &store_id, retry)
                .await
                .context("CSV export failed")?;
            match out {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(path = %path.display(), "CSV written");
                }
                None => println!("{csv}"),
            }
        }
        Command::Analyze { title, description } => {
            let mino = Mino::new(config.mino_api_key.clone(), config.mino_model.clone())
                .with_endpoint(config.mino_api_url.clone())
                .with_timeout(config.upstream_timeout);
            let annotator = Annotator::new(
                Arc::new(mino),
                Arc::new(MemoryCache::new()),
                config.upstream_timeout,
            );
            let annotation = annotator.analyze_channel(&title, &description).await;
            println!("{}", serde_json::to_string_pretty(&annotation)?);
        }
    }

    Ok(())
}

fn sheets(config: &Config) -> Result<SheetsClient> {
    let token = config
        .google_access_token
        .clone()
        .context("GOOGLE_ACCESS_TOKEN is required for store commands")?;
    SheetsClient::new(token, config.upstream_timeout).context("Failed to build Sheets client")
}
