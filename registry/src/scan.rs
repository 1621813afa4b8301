//! Disk discovery of installed MODs (§4.6). Scans the user MOD directory
//! (archives and directories) and the game data directory (directories only,
//! restricted to `base` + the bundled expansions), parsing each candidate's
//! `info.json` and deduping by `(name, version)`.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use fmm_model::{InstallForm, InstalledMod, ModName};

use crate::{error::RegistryResult, wire::parse_info_json};

pub struct MODRegistry;

impl MODRegistry {
    /// Scans `mod_dir` (archives + directories, any name) and
    /// `game_data_dir` (directories only, reserved names only), returning
    /// every accepted `InstalledMod`, deduped by `(name, version)` with
    /// `Directory` preferred over `Archive`, sorted by name then version
    /// descending.
    pub fn scan(mod_dir: &Utf8Path, game_data_dir: &Utf8Path) -> RegistryResult<Vec<InstalledMod>> {
        let mut found = Vec::new();

        if mod_dir.is_dir() {
            for entry in fs::read_dir(mod_dir)? {
                let entry = entry?;
                let path = Utf8PathBuf::from_path_buf(entry.path()).ok();
                let Some(path) = path else { continue };

                if path.is_dir() {
                    match Self::read_directory(&path, false) {
                        Ok(Some(m)) => found.push(m),
                        Ok(None) => {}
                        Err(e) => log::debug!("skipping mod directory {path}: {e}"),
                    }
                } else if path.extension() == Some("zip") {
                    match Self::read_archive(&path) {
                        Ok(Some(m)) => found.push(m),
                        Ok(None) => {}
                        Err(e) => log::debug!("skipping mod archive {path}: {e}"),
                    }
                }
            }
        }

        if game_data_dir.is_dir() {
            for entry in fs::read_dir(game_data_dir)? {
                let entry = entry?;
                let path = Utf8PathBuf::from_path_buf(entry.path()).ok();
                let Some(path) = path else { continue };

                if !path.is_dir() {
                    continue;
                }
                match Self::read_directory(&path, true) {
                    Ok(Some(m)) => found.push(m),
                    Ok(None) => {}
                    Err(e) => log::debug!("skipping game data directory {path}: {e}"),
                }
            }
        }

        Ok(Self::dedup_and_sort(found))
    }

    fn read_archive(path: &Utf8Path) -> RegistryResult<Option<InstalledMod>> {
        let Some(stem) = path.file_stem() else { return Ok(None) };
        let Some((name, version)) = split_name_version(stem) else {
            log::debug!("archive {path} does not match name_version.zip, skipping");
            return Ok(None);
        };

        let file = fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let info_path = format!("{stem}/info.json");
        let mut info_file = match archive.by_name(&info_path) {
            Ok(f) => f,
            Err(_) => {
                log::debug!("archive {path} has no {info_path}, skipping");
                return Ok(None);
            }
        };

        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut info_file, &mut bytes)?;
        drop(info_file);
        let info = parse_info_json(&bytes)?;

        let parsed_name: ModName = name.parse()?;
        if parsed_name != info.name || version != info.version.to_string() {
            log::debug!("archive {path} name/version does not match its info.json, skipping");
            return Ok(None);
        }

        Ok(Some(InstalledMod {
            name: info.name.clone(),
            version: info.version,
            form: InstallForm::Archive,
            path: path.to_owned(),
            info,
        }))
    }

    fn read_directory(path: &Utf8Path, restrict_to_reserved: bool) -> RegistryResult<Option<InstalledMod>> {
        let Some(dir_name) = path.file_name() else { return Ok(None) };

        let candidate_name = split_name_version(dir_name).map(|(n, _)| n).unwrap_or(dir_name);

        if restrict_to_reserved {
            let reserved = candidate_name == fmm_model::BASE_MOD_NAME
                || fmm_model::EXPANSION_MOD_NAMES.contains(&candidate_name);
            if !reserved {
                return Ok(None);
            }
        }

        let info_path = path.join("info.json");
        if !info_path.is_file() {
            log::debug!("directory {path} has no info.json, skipping");
            return Ok(None);
        }

        let bytes = fs::read(&info_path)?;
        let info = parse_info_json(&bytes)?;

        Ok(Some(InstalledMod {
            name: info.name.clone(),
            version: info.version,
            form: InstallForm::Directory,
            path: path.to_owned(),
            info,
        }))
    }

    fn dedup_and_sort(mut mods: Vec<InstalledMod>) -> Vec<InstalledMod> {
        mods.sort_by(InstalledMod::cmp_for_dedup);

        let mut seen = std::collections::HashSet::new();
        mods.retain(|m| seen.insert((m.name.clone(), m.version)));

        mods.sort_by(|a, b| a.name.cmp(&b.name).then(b.version.cmp(&a.version)));
        mods
    }
}

/// Splits `name_version` into `(name, version)` on the last `_`, since MOD
/// names may themselves contain underscores.
fn split_name_version(stem: &str) -> Option<(&str, &str)> {
    let idx = stem.rfind('_')?;
    let (name, rest) = stem.split_at(idx);
    let version = &rest[1..];
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name, version))
}
