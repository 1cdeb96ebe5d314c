//! Memory store adapters

mod in_memory;
mod remote;
mod sqlite;

pub use in_memory::InMemoryStore;
pub use remote::HttpMemoryStore;
pub use sqlite::SqliteMemoryStore;
