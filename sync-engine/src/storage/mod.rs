//! # Durable Key-Value Storage
//!
//! String-keyed, JSON-valued persistence surviving a reload. The engine uses
//! one key per cache instance, one for the transaction list, and one for
//! lightweight flags (see [`keys`]).
//!
//! Reads are synchronous: the host store is assumed fast enough that a read
//! is not a suspension point.

pub mod file;
pub mod flags;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::core::error::Result;

pub use file::FileStore;
pub use flags::FlagStore;
pub use memory::MemoryStore;

/// Storage keys used by the engine.
pub mod keys {
    pub const TOKENS_CACHE: &str = "tokens_cache";
    pub const AFFILIATE_DASHBOARD_CACHE: &str = "affiliate_dashboard_cache";
    pub const REFERRALS_CACHE: &str = "referrals_cache";
    pub const RATES_CACHE: &str = "rates_cache";
    pub const TRANSACTIONS: &str = "transactions";
    pub const FLAGS: &str = "flags";
}

/// Host-provided persistent storage.
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and deserialize `key`.
///
/// A missing key, an unreadable store, or a value that no longer parses all
/// come back as `None`: stale or corrupt local data is never fatal, the
/// caller simply refetches.
pub fn load_json<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to read from durable store");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Discarding unparseable stored value");
            None
        }
    }
}

/// Serialize and write `value` under `key`.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn DurableStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        amount: String,
    }

    #[test]
    fn test_roundtrip_through_store() {
        let store = MemoryStore::new();
        let value = Sample { amount: "0.000000000000000001".to_string() };
        save_json(&store, "k", &value).unwrap();
        assert_eq!(load_json::<Sample>(&store, "k"), Some(value));
    }

    #[test]
    fn test_corrupt_value_loads_as_none() {
        let store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        assert_eq!(load_json::<Sample>(&store, "k"), None);
    }

    #[test]
    fn test_missing_key_loads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(load_json::<Sample>(&store, "absent"), None);
    }
}
