//! Stable content-addressed key derivation (§4.4 Keying).

use sha1::{Digest, Sha1};

/// The SHA-1 digest of a caller-supplied key, as lowercase hex.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheDigest(String);

impl CacheDigest {
    pub fn of(raw_key: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(raw_key.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// The first two hex digits, used as the filesystem backend's fan-out
    /// directory (§4.4: `<root>/<type>/<hh>/<rest>`).
    pub fn prefix(&self) -> &str {
        &self.0[..2]
    }

    /// The remaining 38 hex digits.
    pub fn rest(&self) -> &str {
        &self.0[2..]
    }
}
