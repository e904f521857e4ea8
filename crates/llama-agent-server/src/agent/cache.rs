use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Size policy for a [`TextCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// `None` keeps every entry for the life of the process
    pub max_entries: Option<usize>,
}

impl CachePolicy {
    pub fn unbounded() -> Self {
        Self { max_entries: None }
    }

    pub fn bounded(max_entries: usize) -> Self {
        Self { max_entries: Some(max_entries.max(1)) }
    }
}

/// Thread-safe string cache with no expiry.
/// When bounded, the oldest inserted key is evicted first.
#[derive(Clone)]
pub struct TextCache {
    name: &'static str,
    storage: Arc<DashMap<String, String>>,
    /// Insertion order, only tracked when bounded
    order: Arc<Mutex<VecDeque<String>>>,
    policy: CachePolicy,
}

impl TextCache {
    pub fn new(name: &'static str, policy: CachePolicy) -> Self {
        debug!("Initializing {} cache (max_entries={:?})", name, policy.max_entries);
        Self {
            name,
            storage: Arc::new(DashMap::new()),
            order: Arc::new(Mutex::new(VecDeque::new())),
            policy,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let value = self.storage.get(key).map(|entry| entry.value().clone());
        if value.is_some() {
            debug!("{} cache hit for {:?}", self.name, key);
        }
        value
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let Some(max) = self.policy.max_entries else {
            self.storage.insert(key, value.into());
            return;
        };

        let mut order = self.order.lock();
        if self.storage.insert(key.clone(), value.into()).is_none() {
            order.push_back(key);
        }
        while order.len() > max {
            if let Some(oldest) = order.pop_front() {
                self.storage.remove(&oldest);
                debug!("{} cache evicted {:?}", self.name, oldest);
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.storage.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }
}
