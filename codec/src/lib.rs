//! Binary property-tree codec (§4.1) and the settings-file format built on
//! top of it (§6). Used by `fmm-save` for save-file headers and by anything
//! that needs to read or write Factorio-style settings blobs.

pub mod error;
pub mod primitives;
pub mod settings;
pub mod tree;

pub use error::{CodecError, CodecResult};
pub use primitives::{Reader, Writer};
pub use settings::SettingsFile;
pub use tree::{decode, dictionary_as_rgba_string, encode, PropertyTree};
