//! JSON-file backed watch-list.
//!
//! On-disk format is a single JSON object mapping address to label:
//!
//! ```json
//! { "ZDLFG5UNPzeNsEkacw9TdKHT1fBZCACfAQymjWnpcvg": "Alice" }
//! ```
//!
//! Key order is preserved, so the snapshot order survives restarts. Every
//! mutation rewrites the whole file (tmp file + rename) before the change is
//! published.

use crate::error::RegistryResult;
use crate::memory::InMemoryRegistry;
use crate::registry::{AddressRegistry, BoxFuture, ChangeReceiver};
use pumpwatch_core::{Address, WatchedAddress};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Watch-list persisted as a JSON object.
pub struct FileRegistry {
    path: PathBuf,
    inner: InMemoryRegistry,
    /// Serializes stage → persist → commit.
    write_lock: Mutex<()>,
}

impl FileRegistry {
    /// Load the watch-list at `path`. A missing file is an empty list.
    pub async fn open(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = read_entries(&path).await?;

        info!(path = %path.display(), count = entries.len(), "Watch-list loaded");
        Ok(Self {
            path,
            inner: InMemoryRegistry::with_entries(entries),
            write_lock: Mutex::new(()),
        })
    }

    /// Re-read the file and publish a change when it differs from memory.
    ///
    /// Picks up edits made by another process, such as the CLI. Returns
    /// whether a change was published.
    pub async fn reload(&self) -> RegistryResult<bool> {
        let _guard = self.write_lock.lock().await;
        let entries = read_entries(&self.path).await?;
        if entries == self.inner.entries() {
            return Ok(false);
        }
        info!(path = %self.path.display(), count = entries.len(), "Watch-list changed on disk, reloaded");
        self.inner.commit(entries);
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a wallet and persist the list.
    pub async fn add(&self, address: &str, label: &str) -> RegistryResult<WatchedAddress> {
        let _guard = self.write_lock.lock().await;
        let (next, entry) = self.inner.stage_add(address, label)?;
        self.persist(&next).await?;
        self.inner.commit(next);
        info!(address = %entry.address, label = %entry.label, "Watched address added");
        Ok(entry)
    }

    /// Remove a wallet and persist the list.
    pub async fn remove(&self, address: &str) -> RegistryResult<WatchedAddress> {
        let _guard = self.write_lock.lock().await;
        let (next, entry) = self.inner.stage_remove(address)?;
        self.persist(&next).await?;
        self.inner.commit(next);
        info!(address = %entry.address, "Watched address removed");
        Ok(entry)
    }

    pub fn entries(&self) -> Vec<WatchedAddress> {
        self.inner.entries()
    }

    async fn persist(&self, entries: &[WatchedAddress]) -> RegistryResult<()> {
        let mut map = Map::new();
        for entry in entries {
            map.insert(entry.address.to_string(), Value::String(entry.label.clone()));
        }
        let text = serde_json::to_string_pretty(&Value::Object(map))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

async fn read_entries(path: &Path) -> RegistryResult<Vec<WatchedAddress>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => parse_entries(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Watch-list file not found, treating as empty");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse the on-disk object. Entries that fail validation are skipped.
fn parse_entries(text: &str) -> RegistryResult<Vec<WatchedAddress>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let map: Map<String, Value> = serde_json::from_str(text)?;

    let mut entries: Vec<WatchedAddress> = Vec::with_capacity(map.len());
    for (address, label) in map {
        let label = match label {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => {
                warn!(%address, value = %other, "Skipping watch-list entry with non-string label");
                continue;
            }
        };
        let parsed = Address::parse(&address)
            .and_then(|a| WatchedAddress::new(a, label.trim()));
        match parsed {
            Ok(entry) if entries.iter().any(|e| e.address == entry.address) => {
                warn!(address = %entry.address, "Skipping duplicate watch-list entry");
            }
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(%address, error = %e, "Skipping invalid watch-list entry"),
        }
    }
    Ok(entries)
}

impl AddressRegistry for FileRegistry {
    fn snapshot(&self) -> BoxFuture<'_, RegistryResult<Vec<Address>>> {
        self.inner.snapshot()
    }

    fn label_of<'a>(&'a self, address: &'a Address) -> BoxFuture<'a, RegistryResult<Option<String>>> {
        self.inner.label_of(address)
    }

    fn subscribe(&self) -> ChangeReceiver {
        self.inner.subscribe()
    }
}
