//! StoryMagic - personalized children's story service
//!
#![doc = "StoryMagic - personalized children's story service"]
#![doc = "Main entry point for the StoryMagic web service."]

use anyhow::Result;
use prettytable::{format, row, Table};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storymagic::cli::{Cli, Commands};
use storymagic::config::Config;
use storymagic::metrics::init_metrics_exporter;
use storymagic::models::catalog;
use storymagic::providers::create_provider;
use storymagic::server::{self, dto::plan_catalog, AppState};
use storymagic::storage::{FallbackStore, MemoryStore, RemoteStore, StoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting StoryMagic service");

            let remote = RemoteStore::from_config(&config.database)?;
            let memory = MemoryStore::with_demo_data()?;
            let store: Arc<dyn StoryStore> = Arc::new(FallbackStore::new(remote, memory));

            let provider = create_provider(&config.provider)?;
            tracing::info!(
                provider = provider.name(),
                model = %provider.model(),
                illustrations = config.illustrations.enabled,
                "Story provider ready"
            );

            init_metrics_exporter(config.server.metrics_port);

            let state = Arc::new(AppState::new(store, provider, &config)?);
            server::serve(&config, state).await
        }
        Commands::Plans { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&plan_catalog(catalog()))?);
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BOX_CHARS);
            table.set_titles(row!["Plan", "Name", "Price", "Stories / month", "Features"]);
            for plan in catalog() {
                let allowance = match plan.stories_per_month.limit() {
                    Some(limit) => limit.to_string(),
                    None => "unlimited".to_string(),
                };
                table.add_row(row![
                    plan.id,
                    plan.name,
                    format!("${:.2}", plan.monthly_price),
                    allowance,
                    plan.features.join("\n")
                ]);
            }
            table.printstd();
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "storymagic=debug,tower_http=debug"
    } else {
        "storymagic=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
