mod kv;

pub use kv::{KeyValueStore, SqliteStore};

#[cfg(test)]
pub use kv::MemoryStore;
