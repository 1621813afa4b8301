//! `MODListStore` (§4.7): the JSON manifest of which MODs are enabled, and
//! at what version they're pinned. Persisted as `{"mods": [...]}`,
//! write-then-rename so a crash never leaves a truncated file.

use camino::{Utf8Path, Utf8PathBuf};
use fmm_model::{ModName, Version, VersionAsString, BASE_MOD_NAME, EXPANSION_MOD_NAMES};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

#[derive(Clone, Debug, Deserialize, Serialize)]
struct Entry {
    name: ModName,
    enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<VersionAsString>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct Manifest {
    mods: Vec<Entry>,
}

#[derive(Clone, Debug)]
pub struct MODListStore {
    manifest: Manifest,
}

impl MODListStore {
    /// An empty list with just the always-present, always-enabled `base`
    /// entry.
    pub fn empty() -> Self {
        let mut store = Self { manifest: Manifest::default() };
        store.manifest.mods.push(Entry { name: ModName::base(), enabled: true, version: None });
        store
    }

    pub fn load(path: &Utf8Path) -> RegistryResult<Self> {
        if !path.is_file() {
            return Ok(Self::empty());
        }
        let bytes = std::fs::read(path)?;
        let manifest: Manifest = serde_json::from_slice(&bytes)?;
        let mut store = Self { manifest };
        if !store.exists(&ModName::base()) {
            store.manifest.mods.push(Entry { name: ModName::base(), enabled: true, version: None });
        }
        Ok(store)
    }

    pub fn save(&self, path: &Utf8Path) -> RegistryResult<()> {
        let json = serde_json::to_vec_pretty(&self.manifest)?;
        let tmp_path = Utf8PathBuf::from(format!("{path}.tmp"));
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn find(&self, name: &ModName) -> Option<&Entry> {
        self.manifest.mods.iter().find(|e| &e.name == name)
    }

    fn find_mut(&mut self, name: &ModName) -> Option<&mut Entry> {
        self.manifest.mods.iter_mut().find(|e| &e.name == name)
    }

    pub fn exists(&self, name: &ModName) -> bool {
        self.find(name).is_some()
    }

    pub fn add(&mut self, name: ModName, enabled: bool, version: Option<Version>) {
        let version = version.map(VersionAsString);
        if let Some(entry) = self.find_mut(&name) {
            entry.enabled = enabled;
            entry.version = version;
        } else {
            self.manifest.mods.push(Entry { name, enabled, version });
        }
    }

    pub fn remove(&mut self, name: &ModName) -> RegistryResult<()> {
        if is_protected(name) {
            return Err(RegistryError::IllegalOperation(name.clone()));
        }
        self.manifest.mods.retain(|e| &e.name != name);
        Ok(())
    }

    pub fn enable(&mut self, name: &ModName) -> RegistryResult<()> {
        let entry = self.find_mut(name).ok_or_else(|| RegistryError::ModNotInList(name.clone()))?;
        entry.enabled = true;
        Ok(())
    }

    pub fn disable(&mut self, name: &ModName) -> RegistryResult<()> {
        if name.is_base() {
            return Err(RegistryError::IllegalOperation(name.clone()));
        }
        let entry = self.find_mut(name).ok_or_else(|| RegistryError::ModNotInList(name.clone()))?;
        entry.enabled = false;
        Ok(())
    }

    pub fn version(&self, name: &ModName) -> RegistryResult<Option<Version>> {
        self.find(name)
            .map(|e| e.version.map(|v| v.0))
            .ok_or_else(|| RegistryError::ModNotInList(name.clone()))
    }

    pub fn enabled(&self, name: &ModName) -> RegistryResult<bool> {
        self.find(name).map(|e| e.enabled).ok_or_else(|| RegistryError::ModNotInList(name.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModName, bool, Option<Version>)> {
        self.manifest.mods.iter().map(|e| (&e.name, e.enabled, e.version.map(|v| v.0)))
    }
}

fn is_protected(name: &ModName) -> bool {
    name.as_str() == BASE_MOD_NAME || EXPANSION_MOD_NAMES.contains(&name.as_str())
}
