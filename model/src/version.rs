//! Parsing, ordering and constraint evaluation for the two version shapes the
//! game uses: a 3-component MOD version (`X.Y.Z`) and a 4-component game
//! version (`X.Y.Z-B`).

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid version string \"{0}\"")]
pub struct InvalidVersion(pub String);

#[derive(Debug, Error)]
#[error("invalid version constraint \"{0}\"")]
pub struct InvalidConstraint(pub String);

/// Three-component version, `major.minor.patch`, each an unsigned 16-bit
/// integer. Total order is lexicographic by component.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [maj, min, pat] = parts.as_slice() else {
            return Err(InvalidVersion(s.to_string()));
        };

        let parse_component = |s: &str| s.parse::<u16>().map_err(|_| InvalidVersion(s.to_string()));

        Ok(Self {
            major: parse_component(maj)?,
            minor: parse_component(min)?,
            patch: parse_component(pat)?,
        })
    }
}

impl Serialize for VersionAsString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

/// Newtype used where the version must be serialized as its display string
/// rather than as a struct (eg. the JSON manifest formats in §6).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VersionAsString(pub Version);

impl<'de> Deserialize<'de> for VersionAsString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<Version>()
            .map(VersionAsString)
            .map_err(serde::de::Error::custom)
    }
}

/// Four-component game version, `major.minor.patch-build`. Fixed 8-byte
/// binary layout: four raw little-endian `u16`s, in this field order.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GameVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
}

impl GameVersion {
    pub const ENCODED_LEN: usize = 8;

    pub const fn new(major: u16, minor: u16, patch: u16, build: u16) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }
}

impl Display for GameVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}-{}", self.major, self.minor, self.patch, self.build)
    }
}

impl FromStr for GameVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, build) = s.split_once('-').ok_or_else(|| InvalidVersion(s.to_string()))?;
        let version = base.parse::<Version>().map_err(|_| InvalidVersion(s.to_string()))?;
        let build = build.parse::<u16>().map_err(|_| InvalidVersion(s.to_string()))?;

        Ok(Self {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
            build,
        })
    }
}

/// Comparison operator used in a [`VersionConstraint`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConstraintOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl ConstraintOp {
    fn as_str(self) -> &'static str {
        match self {
            ConstraintOp::Lt => "<",
            ConstraintOp::Le => "<=",
            ConstraintOp::Eq => "=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Gt => ">",
        }
    }
}

impl FromStr for ConstraintOp {
    type Err = InvalidConstraint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            "=" => Ok(Self::Eq),
            ">=" => Ok(Self::Ge),
            ">" => Ok(Self::Gt),
            _ => Err(InvalidConstraint(s.to_string())),
        }
    }
}

impl Display for ConstraintOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(op, version)`. `satisfied_by` is total on valid versions.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VersionConstraint {
    pub op: ConstraintOp,
    pub version: Version,
}

impl VersionConstraint {
    pub fn new(op: ConstraintOp, version: Version) -> Self {
        Self { op, version }
    }

    pub fn satisfied_by(&self, candidate: Version) -> bool {
        match self.op {
            ConstraintOp::Lt => candidate < self.version,
            ConstraintOp::Le => candidate <= self.version,
            ConstraintOp::Eq => candidate == self.version,
            ConstraintOp::Ge => candidate >= self.version,
            ConstraintOp::Gt => candidate > self.version,
        }
    }
}

impl Display for VersionConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

impl FromStr for VersionConstraint {
    type Err = InvalidConstraint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Operators are two characters at most; try the longest prefixes first so
        // `<=`/`>=` aren't mistaken for `<`/`>`.
        let op_len = if s.starts_with("<=") || s.starts_with(">=") {
            2
        } else if s.starts_with('<') || s.starts_with('>') || s.starts_with('=') {
            1
        } else {
            return Err(InvalidConstraint(s.to_string()));
        };

        let (op_str, rest) = s.split_at(op_len);
        let op = op_str.parse::<ConstraintOp>()?;
        let version = rest
            .trim()
            .parse::<Version>()
            .map_err(|_| InvalidConstraint(s.to_string()))?;

        Ok(Self::new(op, version))
    }
}
