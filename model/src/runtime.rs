//! The thin `Runtime` boundary the Non-goals carve out: "platform-specific
//! path probing beyond a thin `Runtime` boundary" is out of scope, so this
//! trait only describes the paths the core needs, not how to find them.

use camino::Utf8Path;

pub trait Runtime {
    fn mod_dir(&self) -> &Utf8Path;
    fn game_data_dir(&self) -> &Utf8Path;
    fn settings_path(&self) -> &Utf8Path;
    fn mod_list_path(&self) -> &Utf8Path;
}

/// A `Runtime` built from paths the caller already resolved. Used by the CLI
/// composition root and by tests; no probing logic lives here.
#[derive(Clone, Debug)]
pub struct StaticRuntime {
    pub mod_dir: camino::Utf8PathBuf,
    pub game_data_dir: camino::Utf8PathBuf,
    pub settings_path: camino::Utf8PathBuf,
    pub mod_list_path: camino::Utf8PathBuf,
}

impl Runtime for StaticRuntime {
    fn mod_dir(&self) -> &Utf8Path {
        &self.mod_dir
    }

    fn game_data_dir(&self) -> &Utf8Path {
        &self.game_data_dir
    }

    fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    fn mod_list_path(&self) -> &Utf8Path {
        &self.mod_list_path
    }
}
