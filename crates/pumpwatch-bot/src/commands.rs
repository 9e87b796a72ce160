//! Watch-list management commands.
//!
//! Each command opens the JSON file, applies one change and exits. A running
//! bot picks the change up on its next reload.

use crate::error::AppResult;
use pumpwatch_core::WatchedAddress;
use pumpwatch_registry::{format_watch_list, FileRegistry};

/// Render the watch-list stored at `path`.
pub async fn list(path: &str) -> AppResult<String> {
    let registry = FileRegistry::open(path).await?;
    Ok(format_watch_list(&registry.entries()))
}

/// Add a labelled wallet.
pub async fn add(path: &str, address: &str, label: &str) -> AppResult<WatchedAddress> {
    let registry = FileRegistry::open(path).await?;
    Ok(registry.add(address, label).await?)
}

/// Remove a wallet.
pub async fn remove(path: &str, address: &str) -> AppResult<WatchedAddress> {
    let registry = FileRegistry::open(path).await?;
    Ok(registry.remove(address).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use pumpwatch_registry::RegistryError;

    const ALICE: &str = "ZDLFG5UNPzeNsEkacw9TdKHT1fBZCACfAQymjWnpcvg";

    #[tokio::test]
    async fn test_add_list_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.json");
        let path = path.to_str().unwrap();

        assert!(list(path).await.unwrap().contains("total: 0"));

        let added = add(path, ALICE, "Alice").await.unwrap();
        assert_eq!(added.label, "Alice");

        let listing = list(path).await.unwrap();
        assert!(listing.contains(ALICE));
        assert!(listing.contains("total: 1"));

        remove(path, ALICE).await.unwrap();
        assert!(list(path).await.unwrap().contains("total: 0"));
    }

    #[tokio::test]
    async fn test_remove_unknown_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.json");

        let err = remove(path.to_str().unwrap(), ALICE).await.unwrap_err();
        assert!(matches!(err, AppError::Registry(RegistryError::NotFound(_))));
    }
}
