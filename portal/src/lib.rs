//! Typed operations over the remote MOD catalog and upload endpoints
//! (§4.11). The core's only collaborator for remote state.

pub mod client;
pub mod credentials;
pub mod error;
pub mod types;

pub use client::PortalClient;
pub use credentials::{APICredential, ServiceCredential};
pub use error::{PortalError, PortalResult};
pub use types::{ListFilters, ListPage, ModFull, ModSummary, Release, ReleaseInfo};
