//! Local MOD discovery and state persistence (§4.6, §4.7):
//! `MODRegistry` scans disk for installed MODs, `MODListStore` persists
//! which of them are enabled and at what version they're pinned.

pub mod error;
pub mod list_store;
pub mod scan;
pub mod wire;

pub use error::{RegistryError, RegistryResult};
pub use list_store::MODListStore;
pub use scan::MODRegistry;
pub use wire::parse_info_json;
