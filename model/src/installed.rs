//! `ModInfo` (the declared contents of a MOD's `info.json`) and
//! `InstalledMod` (what `MODRegistry` discovers on disk).

use std::cmp::Ordering;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::{dependency::DependencySpec, names::ModName, version::Version};

/// How a MOD is delivered on disk.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InstallForm {
    Archive,
    Directory,
}

/// The declared contents of a MOD's `info.json` (§6). `dependencies` defaults
/// to empty; readers must still behave as though `base` were required (the
/// resolver special-cases `base`/expansions directly rather than relying on
/// every third-party MOD to declare it).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ModInfo {
    pub name: ModName,
    pub version: Version,
    pub title: String,
    pub author: String,
    pub description: String,
    pub factorio_version: String,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

/// A MOD discovered by `MODRegistry` on disk.
#[derive(Clone, Debug)]
pub struct InstalledMod {
    pub name: ModName,
    pub version: Version,
    pub form: InstallForm,
    pub path: Utf8PathBuf,
    pub info: ModInfo,
}

impl InstalledMod {
    /// Ordering used to dedupe installed candidates of the same name: higher
    /// version first, `Directory` outranking `Archive` on ties (§3).
    pub fn install_rank(&self) -> (Version, u8) {
        let form_rank = match self.form {
            InstallForm::Directory => 1,
            InstallForm::Archive => 0,
        };
        (self.version, form_rank)
    }

    pub fn cmp_for_dedup(&self, other: &Self) -> Ordering {
        self.install_rank().cmp(&other.install_rank()).reverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(version: Version, form: InstallForm) -> InstalledMod {
        InstalledMod {
            name: "some-mod".parse().unwrap(),
            version,
            form,
            path: "some-mod".into(),
            info: ModInfo {
                name: "some-mod".parse().unwrap(),
                version,
                title: "Some Mod".into(),
                author: "someone".into(),
                description: String::new(),
                factorio_version: "1.1".into(),
                dependencies: Vec::new(),
            },
        }
    }

    #[test]
    fn higher_version_ranks_first() {
        let mut mods = vec![
            mk(Version::new(1, 0, 0), InstallForm::Directory),
            mk(Version::new(2, 0, 0), InstallForm::Directory),
        ];
        mods.sort_by(InstalledMod::cmp_for_dedup);
        assert_eq!(mods[0].version, Version::new(2, 0, 0));
    }

    #[test]
    fn directory_outranks_archive_on_tie() {
        let mut mods = vec![
            mk(Version::new(1, 0, 0), InstallForm::Archive),
            mk(Version::new(1, 0, 0), InstallForm::Directory),
        ];
        mods.sort_by(InstalledMod::cmp_for_dedup);
        assert_eq!(mods[0].form, InstallForm::Directory);
    }
}
