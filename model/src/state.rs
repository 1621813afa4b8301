//! `ModState`: the one long-lived mutable datum in the data model, owned by
//! `MODListStore` and persisted atomically.

use serde::{Deserialize, Serialize};

use crate::version::Version;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ModState {
    pub enabled: bool,
    pub version: Option<Version>,
}

impl ModState {
    pub fn new(enabled: bool, version: Option<Version>) -> Self {
        Self { enabled, version }
    }
}
