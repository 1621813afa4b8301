//! Error types for all four sub-components: parsing (§4.3), the graph
//! (§4.8), the validator (§4.9) and the resolver (§4.10).

use fmm_model::names::ModName;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid dependency expression \"{0}\"")]
pub struct InvalidExpression(pub String);

/// A single problem found by [`crate::validator::DependencyValidator`].
/// Distinct from the parse-level [`InvalidExpression`]: these describe a
/// MOD set that parses fine but doesn't hang together.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ValidationFinding {
    /// A cycle through `Required` edges only. `cycle` repeats the first
    /// node at the end, eg. `[A, B, A]`.
    CircularDependency { cycle: Vec<ModName> },
    /// `dependent` requires `missing`, which isn't installed at all.
    MissingDependency { dependent: ModName, missing: ModName },
    /// `dependent` requires `disabled`, which is installed but disabled.
    DisabledDependency { dependent: ModName, disabled: ModName },
    /// `dependent` requires `target` at `constraint`, but the installed
    /// version of `target` doesn't satisfy it.
    VersionMismatch {
        dependent: ModName,
        target: ModName,
        constraint: fmm_model::version::VersionConstraint,
        installed: fmm_model::version::Version,
    },
    /// `dependent` declares `target` incompatible, and `target` is present
    /// and enabled.
    Conflict { dependent: ModName, target: ModName },
    /// Advisory: `name` appears as a dependency edge but has no entry in
    /// the list being validated.
    PackageMissingFromList { name: ModName },
    /// Advisory: `name` has a list entry but is never referenced by any
    /// edge in the dependency graph being validated.
    ListMissingPackage { name: ModName },
}

/// Errors the resolver can raise while expanding a seed set or planning an
/// uninstall (§4.10).
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no version of \"{0}\" satisfies every constraint on it")]
    NoCompatibleVersion(ModName),
    #[error("constraints on \"{0}\" conflict with each other")]
    VersionConflict(ModName),
    #[error("cannot uninstall \"{0}\": \"{1}\" still requires it")]
    HasDependents(ModName, ModName),
    #[error("\"{0}\" is the base mod or a bundled expansion and cannot be uninstalled")]
    ProtectedMod(ModName),
    #[error("circular dependency while expanding the seed set: {0:?}")]
    Circular(Vec<ModName>),
    #[error(transparent)]
    Metadata(#[from] anyhow::Error),
}

pub type ExpressionResult<T> = Result<T, InvalidExpression>;
pub type ResolveResult<T> = Result<T, ResolveError>;
