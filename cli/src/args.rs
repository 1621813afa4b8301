use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line front end for the mod lifecycle manager.
#[derive(Debug, Parser)]
#[command(name = "fmm", version, about)]
pub struct ProgArgs {
    /// Root directory holding `mods/`, `data/`, `mod-list.json` and the
    /// cache. Defaults to the platform data directory.
    #[arg(long, global = true)]
    pub root_dir: Option<Utf8PathBuf>,

    /// Mod portal username, required for `install`.
    #[arg(long, global = true)]
    pub api_username: Option<String>,

    /// Mod portal token, required for `install`.
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List installed mods.
    List,
    /// Check installed mods and `mod-list.json` for dependency problems.
    Validate,
    /// Resolve a dependency closure without installing anything.
    Resolve { names: Vec<String> },
    /// Resolve and download a set of mods and their dependencies.
    Install { names: Vec<String> },
    /// Remove a mod, failing if something still depends on it.
    Uninstall { name: String },
    Enable { name: String },
    Disable { name: String },
    /// Print a save file's header (game version, mod list, startup settings).
    ReadSave { path: Utf8PathBuf },
}
