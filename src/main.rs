use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use kbfacets::app::AppState;
use kbfacets::cache::store::{CacheStore, Clock, MemoryCache, SystemClock};
use kbfacets::config::Settings;
use kbfacets::db::catalog_repository::MongoCatalogRepository;
use kbfacets::db::memory::MemoryStore;
use kbfacets::db::repository::MongoDocumentRepository;
use kbfacets::db::vote_repository::MongoVoteRepository;
use kbfacets::facets::service::FacetsService;

/// Knowledge-base facets API server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a configuration file (without extension works too).
    #[arg(long)]
    config: Option<String>,

    /// Serve from an in-memory store instead of MongoDB.
    #[arg(long)]
    in_memory: bool,

    /// Load the demo catalog into the in-memory store.
    #[arg(long, requires = "in_memory")]
    seed_demo: bool,

    /// Enable the demo login routes (also `server.demo_mode`).
    #[arg(long)]
    demo_mode: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kbfacets=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;

    tracing::info!("Starting kbfacets server...");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new(clock.clone()));

    let state = if args.in_memory {
        let store = Arc::new(MemoryStore::new());
        if args.seed_demo {
            kbfacets::demo_seeder::seed_demo_data(&store);
        }
        tracing::info!("Using in-memory store");
        AppState::in_memory(store, cache, clock, settings.facets.clone())
    } else {
        let mongo_client = mongodb::Client::with_uri_str(&settings.mongodb.uri)
            .await
            .context("Failed to connect to MongoDB")?;
        let mongo_db = mongo_client.database(&settings.mongodb.database);

        tracing::info!("Connected to MongoDB at {}", settings.mongodb.uri);

        AppState {
            facets: FacetsService {
                documents: Arc::new(MongoDocumentRepository::new(&mongo_db)),
                catalog: Arc::new(MongoCatalogRepository::new(&mongo_db)),
                votes: Arc::new(MongoVoteRepository::new(&mongo_db)),
                cache,
                clock,
                settings: settings.facets.clone(),
            },
            demo_mode: false,
        }
    };
    let state = state.with_demo_mode(args.demo_mode || settings.server.demo_mode);

    let app = kbfacets::app::router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}
