//! Process-local watch-list.

use crate::error::{RegistryError, RegistryResult};
use crate::registry::{AddressRegistry, BoxFuture, ChangeReceiver};
use parking_lot::RwLock;
use pumpwatch_core::{Address, WatchedAddress};
use tokio::sync::watch;
use tracing::{debug, info};

/// In-memory watch-list with change notifications.
pub struct InMemoryRegistry {
    /// Entries in insertion order.
    entries: RwLock<Vec<WatchedAddress>>,
    /// Version counter, bumped on every mutation.
    changes: watch::Sender<u64>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    /// Create a registry pre-populated with entries (no notification).
    pub fn with_entries(entries: Vec<WatchedAddress>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            entries: RwLock::new(entries),
            changes,
        }
    }

    /// Add a wallet. Validates address format, label length and uniqueness.
    ///
    /// Check, insert and version bump happen under one write lock.
    pub fn add(&self, address: &str, label: &str) -> RegistryResult<WatchedAddress> {
        let entry = parse_entry(address, label)?;
        {
            let mut entries = self.entries.write();
            push_unique(&mut entries, entry.clone())?;
            self.publish();
        }
        info!(address = %entry.address, label = %entry.label, "Watched address added");
        Ok(entry)
    }

    /// Remove a wallet.
    pub fn remove(&self, address: &str) -> RegistryResult<WatchedAddress> {
        let address = Address::parse(address)?;
        let entry = {
            let mut entries = self.entries.write();
            let entry = take_entry(&mut entries, address)?;
            self.publish();
            entry
        };
        info!(address = %entry.address, "Watched address removed");
        Ok(entry)
    }

    /// Copy of all entries in insertion order.
    pub fn entries(&self) -> Vec<WatchedAddress> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Current version (number of mutations so far).
    pub fn version(&self) -> u64 {
        *self.changes.borrow()
    }

    /// Compute the list after adding, without committing it.
    ///
    /// Callers serialize stage and commit themselves.
    pub(crate) fn stage_add(
        &self,
        address: &str,
        label: &str,
    ) -> RegistryResult<(Vec<WatchedAddress>, WatchedAddress)> {
        let entry = parse_entry(address, label)?;
        let mut next = self.entries();
        push_unique(&mut next, entry.clone())?;
        Ok((next, entry))
    }

    /// Compute the list after removing, without committing it.
    pub(crate) fn stage_remove(
        &self,
        address: &str,
    ) -> RegistryResult<(Vec<WatchedAddress>, WatchedAddress)> {
        let address = Address::parse(address)?;
        let mut next = self.entries();
        let removed = take_entry(&mut next, address)?;
        Ok((next, removed))
    }

    /// Replace the entries and notify subscribers.
    pub(crate) fn commit(&self, next: Vec<WatchedAddress>) {
        let mut entries = self.entries.write();
        *entries = next;
        self.publish();
    }

    /// Bump the version. Call with the entries write lock held.
    fn publish(&self) {
        self.changes.send_modify(|version| *version += 1);
        debug!(version = *self.changes.borrow(), "Registry change published");
    }

    fn label_for(&self, address: &Address) -> Option<String> {
        self.entries
            .read()
            .iter()
            .find(|e| &e.address == address)
            .map(|e| e.label.clone())
            .filter(|label| !label.is_empty())
    }
}

fn parse_entry(address: &str, label: &str) -> RegistryResult<WatchedAddress> {
    let address = Address::parse(address)?;
    Ok(WatchedAddress::new(address, label.trim())?)
}

fn push_unique(entries: &mut Vec<WatchedAddress>, entry: WatchedAddress) -> RegistryResult<()> {
    if entries.iter().any(|e| e.address == entry.address) {
        return Err(RegistryError::AlreadyExists(entry.address));
    }
    entries.push(entry);
    Ok(())
}

fn take_entry(entries: &mut Vec<WatchedAddress>, address: Address) -> RegistryResult<WatchedAddress> {
    let pos = entries
        .iter()
        .position(|e| e.address == address)
        .ok_or(RegistryError::NotFound(address))?;
    Ok(entries.remove(pos))
}

impl AddressRegistry for InMemoryRegistry {
    fn snapshot(&self) -> BoxFuture<'_, RegistryResult<Vec<Address>>> {
        let addresses = self
            .entries
            .read()
            .iter()
            .map(|e| e.address.clone())
            .collect();
        Box::pin(async move { Ok(addresses) })
    }

    fn label_of<'a>(&'a self, address: &'a Address) -> BoxFuture<'a, RegistryResult<Option<String>>> {
        let label = self.label_for(address);
        Box::pin(async move { Ok(label) })
    }

    fn subscribe(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }
}
