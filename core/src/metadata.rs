//! A synchronous [`MetadataSource`] backed by a pre-fetched catalog.
//!
//! `DependencyResolver::expand` is synchronous by design (§4.10 hot paths
//! don't suspend), but the catalog it reads from lives behind the portal's
//! async HTTP stack. Rather than blocking on async from within the
//! resolver, `ModManager` walks the portal ahead of time to build a
//! catalog covering everything `expand` could possibly touch, then hands
//! it to the resolver as a plain in-memory lookup.

use std::collections::HashMap;

use fmm_depend::{MetadataSource, ModMetadata, ResolveResult};
use fmm_model::ModName;

pub struct PrefetchedMetadataSource {
    catalog: HashMap<ModName, Vec<ModMetadata>>,
}

impl PrefetchedMetadataSource {
    pub fn new(catalog: HashMap<ModName, Vec<ModMetadata>>) -> Self {
        Self { catalog }
    }
}

impl MetadataSource for PrefetchedMetadataSource {
    fn versions(&self, name: &ModName) -> ResolveResult<Vec<ModMetadata>> {
        Ok(self.catalog.get(name).cloned().unwrap_or_default())
    }
}
