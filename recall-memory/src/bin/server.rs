//! Recall Memory Server
//!
//! HTTP API for the memory system.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recall_memory::{
    server::{self, AppState},
    Config, FastEmbedder, MemoryFacade, SqliteMemoryStore, DEFAULT_USER_ID,
};

/// Serve recall memories over HTTP
#[derive(Parser, Debug)]
#[command(name = "recall-memory-server", version, about)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8050)]
    port: u16,

    /// SQLite connection string (`sqlite://path` or a bare path)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// User id every memory is stored under
    #[arg(long, env = "MEMORY_USER_ID", default_value = DEFAULT_USER_ID)]
    user_id: String,

    /// Results returned by /search_memories when the request gives no limit
    #[arg(long, default_value_t = 3)]
    default_limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = match args.database_url.as_deref() {
        Some(url) => Config::from_database_url(url)?,
        None => Config::default(),
    };
    config.user_id = args.user_id;
    config.server_host = args.host;
    config.server_port = args.port;
    config.default_search_limit = args.default_limit.max(1);

    tracing::info!(
        database = %config.database_path.display(),
        user_id = %config.user_id,
        embedding_model = %config.embedding_model,
        "Starting recall memory server"
    );

    // Initialize components
    let embedder = FastEmbedder::new(&config).context("Failed to initialize embedding model")?;
    let store = SqliteMemoryStore::open(&config, Arc::new(embedder))
        .with_context(|| format!("Failed to open memory database {}", config.database_path.display()))?;

    let facade = MemoryFacade::new(Arc::new(store), config.user_id.clone());
    let state = Arc::new(AppState::new(facade, config.default_search_limit));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!("Server listening on http://{}", config.bind_addr());

    server::serve(state, listener).await?;

    Ok(())
}
