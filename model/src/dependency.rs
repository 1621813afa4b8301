//! Typed dependency specifications. Parsing/printing the mini-language lives
//! in `fmm-depend` (it needs nothing from this crate beyond these types), but
//! the shape of a parsed dependency is a data-model concern shared by
//! `ModInfo`, the graph and the resolver.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::{names::ModName, version::VersionConstraint};

/// The five dependency relations a MOD can declare on another MOD.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum DependencyKind {
    Required,
    Optional,
    HiddenOptional,
    Incompatible,
    LoadNeutral,
}

/// `(target, kind, constraint?)`.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct DependencySpec {
    pub target: ModName,
    pub kind: DependencyKind,
    pub constraint: Option<VersionConstraint>,
}

impl DependencySpec {
    pub fn new(target: ModName, kind: DependencyKind, constraint: Option<VersionConstraint>) -> Self {
        Self {
            target,
            kind,
            constraint,
        }
    }

    /// Only `Required` edges participate in scheduling and cycle detection
    /// (§3 Edge invariant).
    pub fn is_required(&self) -> bool {
        matches!(self.kind, DependencyKind::Required)
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, DependencyKind::Optional | DependencyKind::HiddenOptional)
    }
}

impl Display for DependencySpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            DependencyKind::Required => "",
            DependencyKind::Optional => "? ",
            DependencyKind::HiddenOptional => "(?) ",
            DependencyKind::Incompatible => "! ",
            DependencyKind::LoadNeutral => "~ ",
        };
        write!(f, "{}{}", prefix, self.target)?;
        if let Some(constraint) = &self.constraint {
            write!(f, " {}", constraint)?;
        }
        Ok(())
    }
}
