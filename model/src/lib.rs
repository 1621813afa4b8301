//! Core data-model value types (§3 of the MOD lifecycle specification):
//! versions, names, dependency specs, installed-mod records and persisted
//! mod state. Everything here is a value type constructed from inputs and
//! never mutated in place, except `ModState`, which `fmm-registry` owns and
//! persists.

pub mod dependency;
pub mod installed;
pub mod names;
pub mod runtime;
pub mod state;
pub mod version;

pub use dependency::{DependencyKind, DependencySpec};
pub use installed::{InstallForm, InstalledMod, ModInfo};
pub use names::{InvalidModName, ModName, BASE_MOD_NAME, EXPANSION_MOD_NAMES};
pub use runtime::{Runtime, StaticRuntime};
pub use state::ModState;
pub use version::{ConstraintOp, GameVersion, InvalidConstraint, InvalidVersion, Version, VersionAsString, VersionConstraint};
