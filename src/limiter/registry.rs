use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval};

use super::actor::{ActorHandle, LimiterActor};
use super::clock::Clock;
use super::error::LimiterError;
use super::key::RateLimitKey;
use super::store::LimiterStore;

#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    /// Upper bound on live actors.
    pub max_actors: usize,
    /// Idle time after which an actor may be evicted by a sweep.
    pub idle_ttl: Duration,
    /// Mailbox capacity of each actor.
    pub mailbox: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_actors: 100_000,
            idle_ttl: Duration::from_secs(300),
            mailbox: 64,
        }
    }
}

struct Entry {
    handle: ActorHandle,
    last_used: Instant,
}

/// Directory of live limiter actors, one per key.
///
/// Entries are only evicted while idle, so an evicted actor has finished
/// all of its writes before a replacement for the same key can start.
pub struct ActorRegistry {
    actors: Mutex<LruCache<RateLimitKey, Entry>>,
    store: Arc<dyn LimiterStore>,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
}

impl ActorRegistry {
    pub fn new(store: Arc<dyn LimiterStore>, clock: Arc<dyn Clock>, config: RegistryConfig) -> Self {
        Self {
            actors: Mutex::new(LruCache::unbounded()),
            store,
            clock,
            config: RegistryConfig {
                max_actors: config.max_actors.max(1),
                ..config
            },
        }
    }

    /// Returns the actor for `key`, starting one if none is live.
    pub fn resolve(&self, key: &RateLimitKey) -> Result<ActorHandle, LimiterError> {
        let now = Instant::now();
        let mut actors = self.actors.lock();

        if let Some(entry) = actors.get_mut(key) {
            if !entry.handle.is_closed() {
                entry.last_used = now;
                return Ok(entry.handle.clone());
            }
            tracing::warn!(key = %key, "limiter actor exited unexpectedly, restarting");
            actors.pop(key);
        }

        if actors.len() >= self.config.max_actors {
            let excess = actors.len() + 1 - self.config.max_actors;
            let evicted = Self::evict_lru_idle(&mut actors, excess);
            tracing::debug!(evicted, "limiter registry at capacity");
            if actors.len() >= self.config.max_actors {
                tracing::error!(
                    live = actors.len(),
                    "limiter registry saturated, refusing new key {}",
                    key
                );
                return Err(LimiterError::Saturated(actors.len()));
            }
        }

        let handle = LimiterActor::new(key.clone(), Arc::clone(&self.store), Arc::clone(&self.clock))
            .spawn(self.config.mailbox);
        actors.put(
            key.clone(),
            Entry {
                handle: handle.clone(),
                last_used: now,
            },
        );
        Ok(handle)
    }

    /// Resolves `key` and runs one admission decision on its actor.
    pub async fn time_to_wait(&self, key: &RateLimitKey) -> Result<u64, LimiterError> {
        let handle = self.resolve(key)?;
        handle.time_to_wait().await
    }

    /// Evicts idle actors unused for longer than the configured TTL.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut actors = self.actors.lock();
        let expired: Vec<RateLimitKey> = actors
            .iter()
            .filter(|(_, entry)| {
                entry.handle.is_idle() && now.duration_since(entry.last_used) >= self.config.idle_ttl
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            actors.pop(key);
        }
        expired.len()
    }

    /// Runs [`sweep`](Self::sweep) every `period` until the runtime shuts down.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let evicted = registry.sweep();
                if evicted > 0 {
                    tracing::debug!(evicted, live = registry.len(), "limiter sweep");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.actors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_lru_idle(actors: &mut LruCache<RateLimitKey, Entry>, count: usize) -> usize {
        let victims: Vec<RateLimitKey> = actors
            .iter()
            .rev()
            .filter(|(_, entry)| entry.handle.is_idle())
            .take(count)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &victims {
            actors.pop(key);
        }
        victims.len()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::limiter::clock::ManualClock;
    use crate::limiter::key::RouteClass;
    use crate::limiter::store::MemoryLimiterStore;

    fn key(last: u8, route_class: RouteClass) -> RateLimitKey {
        RateLimitKey::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, last)), route_class)
    }

    fn registry(config: RegistryConfig) -> (ActorRegistry, Arc<MemoryLimiterStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryLimiterStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let registry = ActorRegistry::new(store.clone(), clock.clone(), config);
        (registry, store, clock)
    }

    #[tokio::test]
    async fn same_key_resolves_to_same_actor() {
        let (registry, _, _) = registry(RegistryConfig::default());
        let a = registry.resolve(&key(1, RouteClass::Default)).unwrap();
        let b = registry.resolve(&key(1, RouteClass::Default)).unwrap();
        let c = registry.resolve(&key(1, RouteClass::Generate)).unwrap();

        assert!(a.same_actor(&b));
        assert!(!a.same_actor(&c));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn route_classes_keep_independent_schedules() {
        let (registry, store, clock) = registry(RegistryConfig::default());
        let default_key = key(7, RouteClass::Default);
        let generate_key = key(7, RouteClass::Generate);

        assert_eq!(registry.time_to_wait(&generate_key).await.unwrap(), 0);
        assert_eq!(registry.time_to_wait(&default_key).await.unwrap(), 0);
        clock.set(500);
        assert_eq!(registry.time_to_wait(&default_key).await.unwrap(), 0);
        assert_eq!(registry.time_to_wait(&generate_key).await.unwrap(), 8500);
        assert_eq!(registry.time_to_wait(&default_key).await.unwrap(), 0);

        assert_eq!(store.get("192.0.2.7"), Some(502));
        assert_eq!(store.get("192.0.2.7_generate_limit"), Some(20_000));
    }

    #[tokio::test]
    async fn keys_do_not_affect_each_other() {
        let (registry, store, _) = registry(RegistryConfig::default());
        let a = key(1, RouteClass::Generate);
        let b = key(2, RouteClass::Generate);

        registry.time_to_wait(&a).await.unwrap();
        assert!(registry.time_to_wait(&a).await.unwrap() > 0);
        assert_eq!(store.get(&b.storage_key()), None);

        assert_eq!(registry.time_to_wait(&b).await.unwrap(), 0);
        assert_eq!(store.get(&a.storage_key()), Some(20_000));
        assert_eq!(store.get(&b.storage_key()), Some(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_evicts_only_expired_idle_actors() {
        let (registry, _, _) = registry(RegistryConfig {
            idle_ttl: Duration::from_secs(60),
            ..RegistryConfig::default()
        });

        registry.time_to_wait(&key(1, RouteClass::Default)).await.unwrap();
        tokio::time::advance(Duration::from_secs(45)).await;
        let held = registry.resolve(&key(2, RouteClass::Default)).unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(registry.sweep(), 1);
        assert_eq!(registry.len(), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        // Still held by a caller.
        assert_eq!(registry.sweep(), 0);
        drop(held);
        assert_eq!(registry.sweep(), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn evicted_key_resumes_from_store() {
        let (registry, _, clock) = registry(RegistryConfig {
            idle_ttl: Duration::ZERO,
            ..RegistryConfig::default()
        });
        let generate_key = key(3, RouteClass::Generate);

        registry.time_to_wait(&generate_key).await.unwrap();
        assert_eq!(registry.sweep(), 1);

        clock.set(500);
        assert_eq!(registry.time_to_wait(&generate_key).await.unwrap(), 8500);
    }

    #[tokio::test]
    async fn capacity_evicts_idle_actors_and_keeps_busy_ones() {
        let (registry, _, _) = registry(RegistryConfig {
            max_actors: 2,
            ..RegistryConfig::default()
        });
        let first = key(1, RouteClass::Default);
        let second = key(2, RouteClass::Default);
        let third = key(3, RouteClass::Default);

        let first_handle = registry.resolve(&first).unwrap();
        drop(registry.resolve(&second).unwrap());

        registry.resolve(&third).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.resolve(&first).unwrap().same_actor(&first_handle));
    }

    #[tokio::test]
    async fn saturated_registry_fails_closed() {
        let (registry, _, _) = registry(RegistryConfig {
            max_actors: 1,
            ..RegistryConfig::default()
        });
        let _busy = registry.resolve(&key(1, RouteClass::Default)).unwrap();

        let result = registry.resolve(&key(2, RouteClass::Default));
        assert!(matches!(result, Err(LimiterError::Saturated(1))));
    }

    #[tokio::test]
    async fn storage_failure_surfaces_through_registry() {
        let (registry, store, _) = registry(RegistryConfig::default());
        store.set_failing(true);
        let result = registry.time_to_wait(&key(9, RouteClass::Default)).await;
        assert!(matches!(result, Err(LimiterError::Storage(_))));
    }
}
