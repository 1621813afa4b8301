//! Where `ModManager` looks for things on disk, and how its HTTP stack is
//! tuned. Defaults mirror a real Factorio installation's layout.

use camino::{Utf8Path, Utf8PathBuf};
use fmm_http::RetryConfig;

#[derive(Clone, Debug)]
pub struct ModManagerConfig {
    /// Where user-installed MODs (archives and directories) live.
    pub mod_dir: Utf8PathBuf,
    /// Where the game's own `base` and bundled expansions live.
    pub game_data_dir: Utf8PathBuf,
    /// The `mod-list.json` manifest path.
    pub mod_list_path: Utf8PathBuf,
    /// Root directory for the on-disk cache backend.
    pub cache_dir: Utf8PathBuf,
    pub retry: RetryConfig,
    pub portal_base_url: Option<String>,
}

impl ModManagerConfig {
    /// Lays everything out under a single root: `<root>/mods`,
    /// `<root>/data`, `<root>/mod-list.json`, `<root>/cache`.
    pub fn under_root(root: &Utf8Path) -> Self {
        Self {
            mod_dir: root.join("mods"),
            game_data_dir: root.join("data"),
            mod_list_path: root.join("mod-list.json"),
            cache_dir: root.join("cache"),
            retry: RetryConfig::default(),
            portal_base_url: None,
        }
    }

    /// `<user data dir>/factorio-mod-manager`, the default when the caller
    /// has no opinion of its own.
    pub fn default_under_user_data_dir() -> Option<Self> {
        let base = dirs::data_dir()?;
        let root = Utf8PathBuf::from_path_buf(base.join("factorio-mod-manager")).ok()?;
        Some(Self::under_root(&root))
    }
}
