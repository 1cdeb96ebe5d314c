//! # Recall Memory
//!
//! Long-term memory for the recall chat clients.
//!
//! ## Architecture
//!
//! - **Stores** implement [`MemoryStore`] (`add` / `search` / `get_all`):
//!   [`SqliteMemoryStore`] embeds locally and persists to SQLite,
//!   [`InMemoryStore`] keeps records for the process lifetime, and
//!   [`HttpMemoryStore`] talks to a running `recall-memory-server`.
//! - **[`MemoryFacade`]** flattens whatever shape a store answers with into
//!   plain memory strings for one fixed user.
//! - **[`server`]** exposes the facade over HTTP.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use recall_memory::{Config, FastEmbedder, MemoryFacade, SqliteMemoryStore};
//!
//! let config = Config::default();
//! let embedder = Arc::new(FastEmbedder::new(&config)?);
//! let store = SqliteMemoryStore::open(&config, embedder)?;
//! let memory = MemoryFacade::new(Arc::new(store), &config.user_id);
//!
//! memory.save("My name is Alex").await?;
//! let context = memory.search("What is the user's name?", 3).await?;
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod facade;
pub mod memory;
pub mod message;
pub mod server;
pub mod storage;

pub use config::{Config, DEFAULT_USER_ID};
pub use embedding::{Embedder, FastEmbedder};
pub use error::{Error, Result};
pub use facade::{MemoryFacade, SaveAck};
pub use memory::{AdapterResponse, MemoryRecord, MemoryStore, ResultsEnvelope};
pub use message::{Message, Role};
pub use storage::{HttpMemoryStore, InMemoryStore, SqliteMemoryStore};
