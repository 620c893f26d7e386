use crate::{
    FetchResult, Forward, Link, LinkError, Observable, Observer, Operation, Subscriber,
    Subscription,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[cfg(feature = "graphql")]
use async_graphql::SimpleObject;

/// Configuration for request supersession
#[derive(Clone, Debug)]
pub struct AbortConfig {
    /// Context field holding the dedup key
    pub context_key: String,
    /// Whether supersession is enabled
    pub enabled: bool,
}

impl Default for AbortConfig {
    fn default() -> Self {
        Self {
            context_key: "abortKey".to_string(),
            enabled: true,
        }
    }
}

impl AbortConfig {
    pub fn new(context_key: impl Into<String>) -> Self {
        Self {
            context_key: context_key.into(),
            enabled: true,
        }
    }
}

/// An in-flight request registered under a dedup key
struct PendingRequest {
    id: u64,
    subscription: Subscription,
    registered_at: DateTime<Utc>,
}

/// Registry of in-flight requests, one per dedup key.
///
/// The registry is owned by whoever builds the link and may be shared between
/// links on purpose; two links with separate registries never affect each
/// other.
#[derive(Default)]
pub struct AbortRegistry {
    pending: DashMap<String, PendingRequest>,
    next_id: AtomicU64,
    superseded: AtomicUsize,
    cancelled: AtomicUsize,
    settled: AtomicUsize,
}

impl AbortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Cancel the request registered under `key`, if any.
    /// Returns whether a request that was still running got cancelled.
    pub fn supersede(&self, key: &str) -> bool {
        let Some((_, previous)) = self.pending.remove(key) else {
            return false;
        };

        let live = !previous.subscription.is_closed();
        previous.subscription.unsubscribe();
        if live {
            self.superseded.fetch_add(1, Ordering::Relaxed);
            log::debug!("Superseded request {} for key: {}", previous.id, key);
        }
        live
    }

    fn register(&self, key: String, id: u64, subscription: Subscription) {
        log::debug!("Registering request {} for key: {}", id, key);
        self.pending.insert(
            key,
            PendingRequest {
                id,
                subscription,
                registered_at: Utc::now(),
            },
        );
    }

    /// Remove the entry for `key` only if it still belongs to request `id`.
    fn release(&self, key: &str, id: u64) -> bool {
        self.pending
            .remove_if(key, |_, pending| pending.id == id)
            .is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.pending.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Age of the longest outstanding request
    pub fn oldest_pending_age(&self) -> Option<Duration> {
        let now = Utc::now();
        self.pending
            .iter()
            .map(|entry| now - entry.value().registered_at)
            .max()
    }

    /// Get statistics about pending requests
    pub fn stats(&self) -> AbortStats {
        AbortStats {
            pending_requests: self.pending.len(),
            superseded: self.superseded.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            settled: self.settled.load(Ordering::Relaxed),
        }
    }

    /// Cancel and forget every pending request. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let keys: Vec<_> = self.pending.iter().map(|entry| entry.key().clone()).collect();

        let mut cleared = 0;
        for key in keys {
            if let Some((_, pending)) = self.pending.remove(&key) {
                pending.subscription.unsubscribe();
                cleared += 1;
            }
        }

        log::info!("Abort registry cleared {} pending requests", cleared);
        cleared
    }
}

/// Statistics for request supersession
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(SimpleObject))]
pub struct AbortStats {
    pub pending_requests: usize,
    pub superseded: usize,
    pub cancelled: usize,
    pub settled: usize,
}

/// Thread-safe wrapper for the registry
pub type SharedAbortRegistry = Arc<AbortRegistry>;

/// Forwards events downstream and drops the registry entry once the request settles.
struct ReleaseOnSettle {
    downstream: Subscriber,
    registry: SharedAbortRegistry,
    key: String,
    id: u64,
}

impl ReleaseOnSettle {
    fn release(&self) {
        if self.registry.release(&self.key, self.id) {
            self.registry.settled.fetch_add(1, Ordering::Relaxed);
            log::debug!("Request {} settled for key: {}", self.id, self.key);
        }
    }
}

impl Observer for ReleaseOnSettle {
    fn next(&self, result: FetchResult) {
        self.downstream.next(result);
    }

    fn error(&self, error: LinkError) {
        self.release();
        self.downstream.error(error);
    }

    fn complete(&self) {
        self.release();
        self.downstream.complete();
    }
}

/// Link that cancels an in-flight request when a newer one arrives with the same dedup key.
///
/// The key is read from the operation context under [`AbortConfig::context_key`].
/// Operations without a key pass straight through. A superseded caller
/// receives nothing further: no result, no error, no completion.
pub struct AbortLink {
    config: AbortConfig,
    registry: SharedAbortRegistry,
}

impl AbortLink {
    pub fn new(config: AbortConfig) -> Self {
        Self::with_registry(config, Arc::new(AbortRegistry::new()))
    }

    pub fn with_registry(config: AbortConfig, registry: SharedAbortRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &AbortConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedAbortRegistry {
        &self.registry
    }

    pub fn stats(&self) -> AbortStats {
        self.registry.stats()
    }
}

impl Link for AbortLink {
    fn request(&self, operation: Operation, forward: Forward) -> Observable {
        if !self.config.enabled {
            return forward.run(operation);
        }

        let Some(key) = operation.context().dedup_key(&self.config.context_key) else {
            return forward.run(operation);
        };

        let registry = self.registry.clone();
        Observable::new(move |subscriber| {
            registry.supersede(&key);

            let id = registry.allocate_id();
            let observer = ReleaseOnSettle {
                downstream: subscriber,
                registry: registry.clone(),
                key: key.clone(),
                id,
            };
            let inner = forward.run(operation).subscribe(observer);

            registry.register(key.clone(), id, inner.clone());
            // Settled while subscribing, before the entry existed.
            if inner.is_closed() && registry.release(&key, id) {
                registry.settled.fetch_add(1, Ordering::Relaxed);
                log::debug!("Request {} settled while subscribing for key: {}", id, key);
            }

            Some(Box::new(move || {
                inner.unsubscribe();
                if registry.release(&key, id) {
                    registry.cancelled.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Request {} cancelled by caller for key: {}", id, key);
                }
            }))
        })
    }
}
