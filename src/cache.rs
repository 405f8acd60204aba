//! Probe memoization.
//!
//! Each scan mode gets its own table so identical probe keys observed
//! through different input aliases hit the network exactly once. Entries
//! are write-once and live for the whole run; a failed probe is cached the
//! same way as a successful one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::probes::direct::DirectResult;
use crate::probes::proxy::ProxyResult;

/// Single-flight memoization table.
///
/// The cell for a key is created under the table lock, then initialized
/// outside it, so concurrent callers for the same key all await the same
/// probe and clone the same value. At most one probe future ever runs per
/// key.
pub struct ProbeTable<T> {
    entries: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T: Clone> ProbeTable<T> {
    pub fn new() -> Self {
        ProbeTable {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, running `probe` to produce it if
    /// this is the first caller. Later callers never re-run the probe, even
    /// when the stored value records a failure.
    pub async fn get_or_probe<F, Fut>(&self, key: &str, probe: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = {
            let mut entries = self.entries.lock().expect("probe table lock poisoned");
            entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_init(probe).await.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("probe table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for ProbeTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The three per-mode tables, owned by the engine and shared with workers.
///
/// SNI probe entries keep the narrowed failure message so an unexpected
/// handshake error stays terminal for its key but can still be surfaced by
/// every caller that hits it.
pub struct ProbeCache {
    pub direct: ProbeTable<DirectResult>,
    pub ssl: ProbeTable<Result<bool, String>>,
    pub proxy: ProbeTable<Option<ProxyResult>>,
}

impl ProbeCache {
    pub fn new() -> Self {
        ProbeCache {
            direct: ProbeTable::new(),
            ssl: ProbeTable::new(),
            proxy: ProbeTable::new(),
        }
    }
}

impl Default for ProbeCache {
    fn default() -> Self {
        Self::new()
    }
}
