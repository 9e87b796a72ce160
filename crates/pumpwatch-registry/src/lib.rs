//! Watch-list registry for pumpwatch.
//!
//! Holds the set of watched wallets and announces every mutation through a
//! `tokio::sync::watch` channel. The connection manager receives that channel
//! at construction, so the registry → stream dependency is explicit.
//!
//! Two stores are provided:
//! - `InMemoryRegistry`: process-local, used by tests and embedders
//! - `FileRegistry`: JSON object `{address: label}` persisted on every change

pub mod error;
pub mod file;
pub mod listing;
pub mod memory;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use file::FileRegistry;
pub use listing::format_watch_list;
pub use memory::InMemoryRegistry;
pub use registry::{AddressRegistry, BoxFuture, ChangeReceiver};
