use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{storage::vector_index::VectorIndex, utils::config::AppConfig};

struct SessionEntry {
    index: Arc<VectorIndex>,
    expires_at: DateTime<Utc>,
}

struct Inner {
    entries: HashMap<String, SessionEntry>,
    // Insertion order, oldest first. Drives capacity eviction.
    order: VecDeque<String>,
}

/// Cross-request cache of contract indexes keyed by an opaque id, so a
/// summary request can reuse a previously uploaded contract.
///
/// Entries expire after the configured TTL; when the store is full the
/// least-recently-inserted entry is evicted before a new one is admitted.
/// Expired and never-issued ids are indistinguishable to callers: both come
/// back as `None`. One writer at a time, readers of different keys do not
/// block each other.
pub struct SessionStore {
    ttl: Duration,
    capacity: usize,
    inner: RwLock<Inner>,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::seconds(config.session_ttl_secs as i64),
            config.session_capacity,
        )
    }

    /// Stores an index and returns the fresh opaque id it was stored under.
    pub async fn put(&self, index: VectorIndex) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let Inner { entries, order } = &mut *inner;

        entries.retain(|_, entry| entry.expires_at > now);
        order.retain(|known| entries.contains_key(known));
        while entries.len() >= self.capacity {
            let Some(oldest) = order.pop_front() else {
                break;
            };
            entries.remove(&oldest);
        }

        entries.insert(
            id.clone(),
            SessionEntry {
                index: Arc::new(index),
                expires_at: now + self.ttl,
            },
        );
        order.push_back(id.clone());
        debug!(sessions = entries.len(), "contract index cached");

        id
    }

    /// Looks up a live session. `None` covers unknown, evicted, and expired
    /// ids alike.
    pub async fn get(&self, id: &str) -> Option<Arc<VectorIndex>> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(id)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| Arc::clone(&entry.index))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}
