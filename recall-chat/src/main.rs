//! recall-chat - terminal clients for the recall memory system.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recall_chat::config::{DEFAULT_MEMORY_API_URL, DEFAULT_MODEL, DEFAULT_PROVIDER};
use recall_chat::{
    build_llm_client, demo, terminal, ChatOptions, ChatOrchestrator, LlmConfig, MemoryBackend,
    PersistencePolicy,
};
use recall_memory::{
    Config, FastEmbedder, HttpMemoryStore, InMemoryStore, MemoryFacade, MemoryStore,
    SqliteMemoryStore, DEFAULT_USER_ID,
};

/// Memory-augmented chat in the terminal
#[derive(Parser, Debug)]
#[command(name = "recall-chat", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    memory: MemoryArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with an LLM that remembers earlier conversations
    Chat(ChatArgs),
    /// Save and search memories without an LLM
    Demo,
    /// Run every memory operation once and report
    Check,
}

#[derive(Args, Debug)]
struct MemoryArgs {
    /// Where memories are kept
    #[arg(long, global = true, env = "MEMORY_BACKEND", value_enum, default_value_t = MemoryBackend::Http)]
    backend: MemoryBackend,

    /// recall-memory-server base URL (http backend)
    #[arg(long, global = true, env = "MEMORY_API_URL", default_value = DEFAULT_MEMORY_API_URL)]
    memory_url: String,

    /// SQLite connection string (local backend)
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// User id memories are scoped to
    #[arg(long, global = true, env = "MEMORY_USER_ID", default_value = DEFAULT_USER_ID)]
    user_id: String,

    /// Memory service request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    memory_timeout: u64,
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// LLM provider (gemini or openai)
    #[arg(long, env = "LLM_PROVIDER", default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// Model name
    #[arg(long, env = "LLM_CHOICE", default_value = DEFAULT_MODEL)]
    model: String,

    /// Provider API key
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide = true, hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Provider base URL
    #[arg(long, env = "LLM_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, default_value_t = 0.2)]
    temperature: f32,

    #[arg(long, default_value_t = 2000)]
    max_tokens: u32,

    /// LLM request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Memories injected per question
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(3..=5))]
    context_limit: u64,

    /// When conversations are written back to memory
    #[arg(long, value_enum, default_value_t = PersistencePolicy::Always)]
    persist: PersistencePolicy,
}

impl ChatArgs {
    fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone().or_else(|| self.gemini_api_key.clone()),
            api_url: self.base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout,
        }
    }
}

/// Facade over the selected backend, plus the HTTP client when there is one
struct MemoryHandle {
    facade: MemoryFacade,
    remote: Option<Arc<HttpMemoryStore>>,
    label: String,
}

fn open_memory(args: &MemoryArgs) -> anyhow::Result<MemoryHandle> {
    let (store, remote, label): (Arc<dyn MemoryStore>, Option<Arc<HttpMemoryStore>>, String) =
        match args.backend {
            MemoryBackend::Http => {
                let url = url::Url::parse(&args.memory_url)
                    .with_context(|| format!("Invalid MEMORY_API_URL: {}", args.memory_url))?;
                let remote = Arc::new(HttpMemoryStore::new(
                    url.as_str(),
                    Duration::from_secs(args.memory_timeout),
                )?);
                let label = remote.base_url().to_string();
                let store: Arc<dyn MemoryStore> = remote.clone();
                (store, Some(remote), label)
            }
            MemoryBackend::Local => {
                let config = match args.database_url.as_deref() {
                    Some(url) => Config::from_database_url(url)?,
                    None => Config::default(),
                };
                let embedder =
                    FastEmbedder::new(&config).context("Failed to initialize embedding model")?;
                let store = SqliteMemoryStore::open(&config, Arc::new(embedder)).with_context(|| {
                    format!("Failed to open memory database {}", config.database_path.display())
                })?;
                let label = format!("sqlite {}", config.database_path.display());
                (Arc::new(store) as Arc<dyn MemoryStore>, None, label)
            }
            MemoryBackend::Ephemeral => (
                Arc::new(InMemoryStore::new()) as Arc<dyn MemoryStore>,
                None,
                "ephemeral (not saved)".to_string(),
            ),
        };

    tracing::info!(backend = ?args.backend, user_id = %args.user_id, "Memory backend ready");

    Ok(MemoryHandle {
        facade: MemoryFacade::new(store, args.user_id.clone()),
        remote,
        label,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr so they stay out of the conversation
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat(args) => {
            let llm_config = args.llm_config();
            llm_config.require_api_key()?;
            let llm = build_llm_client(&llm_config)?;
            let options = ChatOptions::new(args.context_limit as usize, args.persist)?;

            let memory = open_memory(&cli.memory)?;
            if let Some(remote) = &memory.remote {
                terminal::check_memory_service(remote).await;
            }

            let orchestrator = ChatOrchestrator::new(memory.facade, llm, options);
            terminal::run_chat(orchestrator, &memory.label).await?;
        }
        Commands::Demo => {
            let memory = open_memory(&cli.memory)?;
            if let Some(remote) = &memory.remote {
                terminal::check_memory_service(remote).await;
            }
            demo::run_demo(memory.facade).await?;
        }
        Commands::Check => {
            let memory = open_memory(&cli.memory)?;
            demo::run_check(memory.facade, memory.remote.as_deref())
                .await
                .context("Memory check failed")?;
        }
    }

    Ok(())
}
