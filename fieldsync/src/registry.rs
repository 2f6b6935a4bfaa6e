//! Lifecycle-scoped registry of imperative handles.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::error::RegistryError;

/// Proof of a publication, needed to withdraw it.
///
/// Each publication under a key gets a new generation, so a late
/// withdrawal from an earlier owner can never remove a newer owner's
/// handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registration {
    key: String,
    generation: u64,
}

impl Registration {
    /// The key the handle was published under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The generation assigned at publication.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct Slot<H> {
    handle: H,
    generation: u64,
}

struct RegistryInner<H> {
    /// Live handles, in publication order.
    slots: IndexMap<String, Slot<H>>,
    /// Generation assigned to the next publication.
    next_generation: u64,
}

/// Registry mapping an identifier to its currently mounted handle.
///
/// At most one live handle exists per key. This is not a pub/sub bus:
/// publishing under a live key is a caller error.
///
/// The registry is a cheap-clone shared handle, like the widget handles
/// it stores.
pub struct HandleRegistry<H> {
    inner: Arc<RwLock<RegistryInner<H>>>,
}

impl<H: Clone> HandleRegistry<H> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                slots: IndexMap::new(),
                next_generation: 1,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner<H>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner<H>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a handle under `key`.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] while another
    /// handle is live under the same key.
    pub fn publish(&self, key: impl Into<String>, handle: H) -> Result<Registration, RegistryError> {
        let key = key.into();
        let mut inner = self.write();

        if inner.slots.contains_key(&key) {
            log::error!("Handle '{}' published while another is still live", key);
            return Err(RegistryError::AlreadyRegistered { key });
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.slots.insert(key.clone(), Slot { handle, generation });
        log::debug!("Published handle '{}' (generation {})", key, generation);

        Ok(Registration { key, generation })
    }

    /// Withdraw a previously published handle.
    ///
    /// Returns the withdrawn handle. Fails if nothing is live under the
    /// key, or if the live handle belongs to a different publication.
    pub fn withdraw(&self, registration: &Registration) -> Result<H, RegistryError> {
        let mut inner = self.write();
        let key = &registration.key;

        let Some(slot) = inner.slots.get(key) else {
            log::error!("Withdrawing handle '{}' which is not registered", key);
            return Err(RegistryError::NotRegistered { key: key.clone() });
        };

        if slot.generation != registration.generation {
            log::error!(
                "Withdrawing handle '{}' with stale generation {} (live: {})",
                key,
                registration.generation,
                slot.generation
            );
            return Err(RegistryError::Stale {
                key: key.clone(),
                generation: registration.generation,
            });
        }

        let slot = inner
            .slots
            .shift_remove(key)
            .ok_or_else(|| RegistryError::NotRegistered { key: key.clone() })?;
        log::debug!("Withdrew handle '{}' (generation {})", key, slot.generation);
        Ok(slot.handle)
    }

    /// The live handle under `key`.
    pub fn get(&self, key: &str) -> Option<H> {
        self.read().slots.get(key).map(|slot| slot.handle.clone())
    }

    /// The generation of the live handle under `key`.
    pub fn generation(&self, key: &str) -> Option<u64> {
        self.read().slots.get(key).map(|slot| slot.generation)
    }

    /// Whether `registration` is still the live publication for its key.
    pub fn is_live(&self, registration: &Registration) -> bool {
        self.generation(&registration.key) == Some(registration.generation)
    }

    /// Whether any handle is live under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.read().slots.contains_key(key)
    }

    /// Live keys, in publication order.
    pub fn keys(&self) -> Vec<String> {
        self.read().slots.keys().cloned().collect()
    }

    /// Snapshot of all live `(key, handle)` pairs, in publication order.
    ///
    /// Callers act on the snapshot without holding the registry lock.
    pub fn handles(&self) -> Vec<(String, H)> {
        self.read()
            .slots
            .iter()
            .map(|(key, slot)| (key.clone(), slot.handle.clone()))
            .collect()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.read().slots.len()
    }

    /// Check if no handles are live.
    pub fn is_empty(&self) -> bool {
        self.read().slots.is_empty()
    }
}

impl<H: Clone> Default for HandleRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Clone for HandleRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H> fmt::Debug for HandleRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .inner
            .read()
            .map(|inner| inner.slots.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("HandleRegistry").field("keys", &keys).finish()
    }
}
