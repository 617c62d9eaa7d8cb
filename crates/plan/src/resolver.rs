//! The resolver/cache: builds resources on first use and memoizes them.
//!
//! One cache belongs to one plan instance. Each `(kind, name)` entry is built
//! at most once: concurrent first requests block until the single builder
//! finishes and then share its instance.
//!
//! Construction is synchronous, so the thread performing a build identifies
//! the resolution chain. A thread asking for an entry it is already building
//! is a direct cycle; a thread about to wait on an entry whose builder is
//! (transitively) waiting on this thread is a cycle spread across threads.
//! Both fail with [`ResourceError::CyclicDependency`] instead of recursing or
//! deadlocking.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use agentplan_core::{Resource, ResourceError, ResourceKind, ResourceResolver};
use tracing::{debug, warn};

use crate::instance::Bindings;
use crate::registry::ResourceRegistry;

type Key = (ResourceKind, String);

fn label(key: &Key) -> String {
    format!("{}:{}", key.0, key.1)
}

#[derive(Default)]
struct CacheState {
    resources: HashMap<Key, Resource>,
    /// Entries under construction and the thread building each.
    building: HashMap<Key, ThreadId>,
    /// Entries each thread is building, outermost first.
    stacks: HashMap<ThreadId, Vec<Key>>,
    /// Entry each blocked thread is waiting for.
    waiting: HashMap<ThreadId, Key>,
}

impl CacheState {
    /// The cycle closed by `me` requesting `key`, if any.
    fn cycle(&self, me: ThreadId, key: &Key) -> Option<Vec<String>> {
        let mut owner = *self.building.get(key)?;

        if owner == me {
            let stack = self.stacks.get(&me)?;
            let start = stack.iter().position(|k| k == key)?;
            let mut chain: Vec<String> = stack[start..].iter().map(label).collect();
            chain.push(label(key));
            return Some(chain);
        }

        let mut chain = vec![label(key)];
        for _ in 0..=self.waiting.len() {
            let awaited = self.waiting.get(&owner)?;
            chain.push(label(awaited));
            owner = *self.building.get(awaited)?;
            if owner == me {
                chain.push(label(key));
                return Some(chain);
            }
        }
        None
    }
}

struct CacheInner {
    registry: Arc<ResourceRegistry>,
    bindings: Arc<Bindings>,
    state: Mutex<CacheState>,
    built: Condvar,
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(self: &Arc<Self>, kind: ResourceKind, name: &str) -> Result<Resource, ResourceError> {
        let key = (kind, name.to_string());
        let me = thread::current().id();

        let mut state = self.lock();
        loop {
            if let Some(resource) = state.resources.get(&key) {
                debug!(%kind, name, "Resource cache hit");
                return Ok(resource.clone());
            }
            if !state.building.contains_key(&key) {
                break;
            }
            if let Some(chain) = state.cycle(me, &key) {
                warn!(chain = %chain.join(" -> "), "Cyclic resource dependency");
                return Err(ResourceError::CyclicDependency { chain });
            }
            state.waiting.insert(me, key.clone());
            state = self.built.wait(state).unwrap_or_else(PoisonError::into_inner);
            state.waiting.remove(&me);
        }

        let provider = self.registry.lookup(kind, name)?;
        state.building.insert(key.clone(), me);
        state.stacks.entry(me).or_default().push(key.clone());
        drop(state);

        let guard = BuildGuard { cache: self, key: &key, me };
        debug!(%kind, name, tag = provider.tag(), "Instantiating resource");

        let handle: Arc<dyn ResourceResolver> = Arc::new(ResolverHandle {
            inner: Arc::downgrade(self),
        });
        let result = provider.provide(&self.bindings, handle).and_then(|resource| {
            if resource.kind() == kind {
                Ok(resource)
            } else {
                Err(ResourceError::KindMismatch {
                    name: name.to_string(),
                    expected: kind,
                    actual: resource.kind(),
                })
            }
        });

        if let Ok(resource) = &result {
            self.lock().resources.insert(key.clone(), resource.clone());
        }
        drop(guard);
        result
    }
}

/// Clears the in-progress marker and wakes waiters, even if the constructor
/// panicked.
struct BuildGuard<'a> {
    cache: &'a CacheInner,
    key: &'a Key,
    me: ThreadId,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.cache.lock();
        state.building.remove(self.key);
        if let Some(stack) = state.stacks.get_mut(&self.me) {
            stack.pop();
            if stack.is_empty() {
                state.stacks.remove(&self.me);
            }
        }
        drop(state);
        self.cache.built.notify_all();
    }
}

/// The resolver handed to resource constructors.
///
/// Holds the cache weakly: resources live inside the cache, so a strong
/// reference here would keep the cache alive forever.
struct ResolverHandle {
    inner: Weak<CacheInner>,
}

impl ResourceResolver for ResolverHandle {
    fn resolve(&self, kind: ResourceKind, name: &str) -> Result<Resource, ResourceError> {
        self.inner
            .upgrade()
            .ok_or(ResourceError::ResolverDropped)?
            .resolve(kind, name)
    }
}

/// Lazy, memoizing, cycle-safe resource resolution for one plan instance.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<CacheInner>,
}

impl ResourceCache {
    pub fn new(registry: Arc<ResourceRegistry>, bindings: Arc<Bindings>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                registry,
                bindings,
                state: Mutex::new(CacheState::default()),
                built: Condvar::new(),
            }),
        }
    }

    /// Return the cached resource for `(kind, name)`, building it first if
    /// needed.
    pub fn resolve(&self, kind: ResourceKind, name: &str) -> Result<Resource, ResourceError> {
        self.inner.resolve(kind, name)
    }

    pub fn is_cached(&self, kind: ResourceKind, name: &str) -> bool {
        self.inner
            .lock()
            .resources
            .contains_key(&(kind, name.to_string()))
    }

    /// Number of resources built so far.
    pub fn len(&self) -> usize {
        self.inner.lock().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceResolver for ResourceCache {
    fn resolve(&self, kind: ResourceKind, name: &str) -> Result<Resource, ResourceError> {
        self.inner.resolve(kind, name)
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("providers", &self.inner.registry.len())
            .field("cached", &self.len())
            .finish()
    }
}
