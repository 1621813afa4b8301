//! MOD names, and the reserved/expansion name sets the rest of the core
//! needs to special-case (`base` can never be disabled or removed;
//! expansions can be disabled but not removed or uninstalled).

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The name reserved for the game's own always-installed content.
pub const BASE_MOD_NAME: &str = "base";

/// A small fixed set of names reserved for bundled expansions. Disablable,
/// never removable.
pub const EXPANSION_MOD_NAMES: &[&str] = &["space-age", "elevated-rails", "quality", "cargo-landing-pad"];

#[derive(Debug, Error)]
#[error("invalid mod name \"{0}\": must be a non-empty string of [A-Za-z0-9_-]")]
pub struct InvalidModName(pub String);

/// Non-empty string of `[A-Za-z0-9_-]`. Equality is case-sensitive.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModName(String);

impl ModName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == BASE_MOD_NAME
    }

    pub fn is_expansion(&self) -> bool {
        EXPANSION_MOD_NAMES.contains(&self.0.as_str())
    }

    pub fn is_reserved(&self) -> bool {
        self.is_base() || self.is_expansion()
    }

    pub fn base() -> Self {
        Self(BASE_MOD_NAME.to_string())
    }
}

impl FromStr for ModName {
    type Err = InvalidModName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if !valid {
            return Err(InvalidModName(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ModName {
    type Error = InvalidModName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModName> for String {
    fn from(value: ModName) -> Self {
        value.0
    }
}

impl Display for ModName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
