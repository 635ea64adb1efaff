//! Lightweight named timestamps (e.g. when a promo modal was last shown),
//! persisted together under [`keys::FLAGS`](super::keys::FLAGS).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use lib_utils::{elapsed_millis, now_millis};
use parking_lot::Mutex;

use super::{keys, load_json, save_json, DurableStore};
use crate::core::error::Result;

pub struct FlagStore {
    store: Arc<dyn DurableStore>,
    flags: Mutex<BTreeMap<String, i64>>,
}

impl FlagStore {
    /// Load existing flags from `store`.
    pub fn load(store: Arc<dyn DurableStore>) -> Self {
        let flags = load_json(store.as_ref(), keys::FLAGS).unwrap_or_default();
        Self {
            store,
            flags: Mutex::new(flags),
        }
    }

    /// Epoch-ms timestamp recorded for `name`
    pub fn get(&self, name: &str) -> Option<i64> {
        self.flags.lock().get(name).copied()
    }

    /// Record `name` as set now.
    pub fn touch(&self, name: &str) -> Result<()> {
        self.set(name, now_millis())
    }

    pub fn set(&self, name: &str, at_millis: i64) -> Result<()> {
        let mut flags = self.flags.lock();
        flags.insert(name.to_string(), at_millis);
        save_json(self.store.as_ref(), keys::FLAGS, &*flags)
    }

    /// Time since `name` was set, `None` if never set.
    pub fn elapsed_since(&self, name: &str) -> Option<Duration> {
        self.get(name).map(|at| Duration::from_millis(elapsed_millis(at)))
    }

    /// True when `name` was never set or was set longer than `interval` ago.
    pub fn is_due(&self, name: &str, interval: Duration) -> bool {
        self.elapsed_since(name).map_or(true, |elapsed| elapsed >= interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_flags_persist_across_loads() {
        let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        let flags = FlagStore::load(store.clone());
        assert!(flags.get("welcome_modal").is_none());
        flags.set("welcome_modal", 1_700_000_000_000).unwrap();

        let reloaded = FlagStore::load(store);
        assert_eq!(reloaded.get("welcome_modal"), Some(1_700_000_000_000));
    }

    #[test]
    fn test_is_due() {
        let flags = FlagStore::load(Arc::new(MemoryStore::new()));
        assert!(flags.is_due("promo", Duration::from_secs(3600)));

        flags.touch("promo").unwrap();
        assert!(!flags.is_due("promo", Duration::from_secs(3600)));

        flags.set("promo", now_millis() - 2 * 3_600_000).unwrap();
        assert!(flags.is_due("promo", Duration::from_secs(3600)));
    }
}
