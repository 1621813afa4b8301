//! The settings-file external format (§6): a `GameVersion` header, one
//! skipped boolean, then a property tree whose top level is keyed by
//! `startup`, `runtime-global` and `runtime-per-user`.

use fmm_model::GameVersion;

use crate::{
    error::CodecResult,
    primitives::{Reader, Writer},
    tree::{decode, encode, PropertyTree},
};

const SECTION_NAMES: [&str; 3] = ["startup", "runtime-global", "runtime-per-user"];

/// A parsed settings file. Each section maps setting names to their raw
/// property tree value (already unwrapped from the `{"value": ...}`
/// envelope the format wraps every setting in).
#[derive(Clone, Debug, PartialEq)]
pub struct SettingsFile {
    pub version: GameVersion,
    pub startup: Vec<(String, PropertyTree)>,
    pub runtime_global: Vec<(String, PropertyTree)>,
    pub runtime_per_user: Vec<(String, PropertyTree)>,
}

impl SettingsFile {
    pub fn read(bytes: &[u8]) -> CodecResult<Self> {
        let mut reader = Reader::new(bytes);
        let version = reader.read_game_version()?;
        let _skipped = reader.read_bool()?;
        let root = decode(&mut reader)?;

        let mut sections = [Vec::new(), Vec::new(), Vec::new()];
        if let Some(entries) = root.as_dictionary() {
            for (name, tree) in entries {
                if let Some(index) = SECTION_NAMES.iter().position(|s| s == name) {
                    sections[index] = unwrap_values(tree);
                }
            }
        }

        let [startup, runtime_global, runtime_per_user] = sections;
        Ok(Self { version, startup, runtime_global, runtime_per_user })
    }

    pub fn write(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_game_version(self.version);
        writer.write_bool(false);

        let root = PropertyTree::Dictionary(vec![
            ("startup".into(), wrap_values(&self.startup)),
            ("runtime-global".into(), wrap_values(&self.runtime_global)),
            ("runtime-per-user".into(), wrap_values(&self.runtime_per_user)),
        ]);
        encode(&mut writer, &root);
        writer.into_bytes()
    }
}

fn wrap_values(entries: &[(String, PropertyTree)]) -> PropertyTree {
    PropertyTree::Dictionary(
        entries
            .iter()
            .map(|(key, value)| {
                (key.clone(), PropertyTree::Dictionary(vec![("value".into(), value.clone())]))
            })
            .collect(),
    )
}

fn unwrap_values(tree: &PropertyTree) -> Vec<(String, PropertyTree)> {
    let Some(entries) = tree.as_dictionary() else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|(key, wrapped)| {
            let value = wrapped.dict_get("value").cloned().unwrap_or(PropertyTree::None);
            (key.clone(), value)
        })
        .collect()
}
