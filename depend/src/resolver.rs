//! Expands a seed set of MOD names into the full set of MODs required to
//! satisfy every `Required` edge, and checks whether a MOD is safe to
//! uninstall (§4.10).
//!
//! Takes a [`MetadataSource`] rather than depending on `fmm-registry` or
//! `fmm-portal` directly, so this crate stays a leaf: those crates depend
//! on `fmm-depend`, not the other way around.

use std::collections::{HashMap, HashSet};

use fmm_model::{DependencySpec, ModName, Version, VersionConstraint};

use crate::{
    error::{ResolveError, ResolveResult},
    graph::DependencyGraph,
};

/// One resolvable version of a MOD: its declared dependencies, as the
/// resolver would read them off `info.json`.
#[derive(Clone, Debug)]
pub struct ModMetadata {
    pub name: ModName,
    pub version: Version,
    pub dependencies: Vec<DependencySpec>,
}

/// Supplies the candidate versions of a MOD by name. Implemented over
/// whatever is actually available locally (`fmm-registry`) or remotely
/// (`fmm-portal`); the resolver doesn't care which.
pub trait MetadataSource {
    fn versions(&self, name: &ModName) -> ResolveResult<Vec<ModMetadata>>;
}

pub struct DependencyResolver<'a> {
    source: &'a dyn MetadataSource,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self { source }
    }

    /// Expands `seeds` to a fixpoint: every `Required` dependency of every
    /// selected MOD is itself selected, at a version satisfying every
    /// constraint placed on it across the whole closure. `Optional` and
    /// `HiddenOptional` edges are never auto-expanded (an unresolved Open
    /// Question in §4.10, decided here: the user opts into optional content
    /// explicitly rather than having it pulled in).
    ///
    /// `installed` is the caller's current registry state, keyed by name.
    /// A required target that is `base`, a bundled expansion, or already
    /// installed at a version satisfying the edge's constraint is never
    /// added to the working set — `base`/expansions aren't resolvable
    /// through a `MetadataSource` at all, and re-resolving an already
    /// satisfied dependency would just re-download it.
    pub fn expand(&self, seeds: &[ModName], installed: &HashMap<ModName, Version>) -> ResolveResult<Vec<ModMetadata>> {
        let mut constraints: HashMap<ModName, Vec<VersionConstraint>> = HashMap::new();
        let mut discovered: HashSet<ModName> = seeds.iter().cloned().collect();
        let mut frontier: Vec<ModName> = seeds.to_vec();
        let mut selected: HashMap<ModName, ModMetadata> = HashMap::new();

        while let Some(name) = frontier.pop() {
            let best = self.highest_satisfying(&name, &[])?;

            for dep in best.dependencies.iter().filter(|d| d.is_required()) {
                if dep.target.is_base() || dep.target.is_expansion() {
                    continue;
                }
                let satisfied_by_installed = installed
                    .get(&dep.target)
                    .is_some_and(|v| dep.constraint.map_or(true, |c| c.satisfied_by(*v)));
                if satisfied_by_installed {
                    continue;
                }

                if let Some(constraint) = dep.constraint {
                    constraints.entry(dep.target.clone()).or_default().push(constraint);
                }
                if discovered.insert(dep.target.clone()) {
                    frontier.push(dep.target.clone());
                }
            }

            selected.insert(name, best);
        }

        for name in &discovered {
            let applicable = constraints.get(name).cloned().unwrap_or_default();
            let current = &selected[name];
            if applicable.iter().all(|c| c.satisfied_by(current.version)) {
                continue;
            }
            let replacement = self.highest_satisfying(name, &applicable).map_err(|_| {
                if applicable.len() > 1 {
                    ResolveError::VersionConflict(name.clone())
                } else {
                    ResolveError::NoCompatibleVersion(name.clone())
                }
            })?;
            selected.insert(name.clone(), replacement);
        }

        let mut graph = DependencyGraph::new();
        for (name, meta) in &selected {
            graph.add_node(name.clone());
            for dep in meta.dependencies.iter().filter(|d| d.is_required()) {
                graph.add_edge(name.clone(), dep.clone());
            }
        }
        if let Err(cycle) = graph.topological_order() {
            return Err(ResolveError::Circular(cycle));
        }

        let mut result: Vec<ModMetadata> = selected.into_values().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn highest_satisfying(&self, name: &ModName, constraints: &[VersionConstraint]) -> ResolveResult<ModMetadata> {
        self.source
            .versions(name)?
            .into_iter()
            .filter(|m| constraints.iter().all(|c| c.satisfied_by(m.version)))
            .max_by_key(|m| m.version)
            .ok_or_else(|| ResolveError::NoCompatibleVersion(name.clone()))
    }

    /// Checks that `target` can be uninstalled from `installed`: it isn't
    /// the base MOD or a bundled expansion, and no other installed MOD's
    /// `Required` edges still point at it.
    pub fn plan_uninstall(target: &ModName, installed: &[ModMetadata]) -> ResolveResult<()> {
        if target.is_base() || target.is_expansion() {
            return Err(ResolveError::ProtectedMod(target.clone()));
        }

        for candidate in installed {
            if &candidate.name == target {
                continue;
            }
            let depends_on_target = candidate
                .dependencies
                .iter()
                .any(|dep| dep.is_required() && &dep.target == target);
            if depends_on_target {
                return Err(ResolveError::HasDependents(target.clone(), candidate.name.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmm_model::{ConstraintOp, DependencyKind};
    use std::collections::HashMap as StdHashMap;

    struct FixedSource {
        catalog: StdHashMap<ModName, Vec<ModMetadata>>,
    }

    impl MetadataSource for FixedSource {
        fn versions(&self, name: &ModName) -> ResolveResult<Vec<ModMetadata>> {
            Ok(self.catalog.get(name).cloned().unwrap_or_default())
        }
    }

    fn name(s: &str) -> ModName {
        s.parse().unwrap()
    }

    fn meta(n: &str, v: (u16, u16, u16), deps: Vec<DependencySpec>) -> ModMetadata {
        ModMetadata { name: name(n), version: Version::new(v.0, v.1, v.2), dependencies: deps }
    }

    fn required(target: &str, constraint: Option<VersionConstraint>) -> DependencySpec {
        DependencySpec::new(name(target), DependencyKind::Required, constraint)
    }

    #[test]
    fn expands_required_transitive_dependency() {
        let mut catalog = StdHashMap::new();
        catalog.insert(name("a"), vec![meta("a", (1, 0, 0), vec![required("b", None)])]);
        catalog.insert(name("b"), vec![meta("b", (1, 0, 0), vec![])]);
        let source = FixedSource { catalog };
        let resolver = DependencyResolver::new(&source);

        let result = resolver.expand(&[name("a")], &StdHashMap::new()).unwrap();
        let names: Vec<_> = result.iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec![name("a"), name("b")]);
    }

    #[test]
    fn picks_highest_version_satisfying_constraint() {
        let mut catalog = StdHashMap::new();
        let constraint = VersionConstraint::new(ConstraintOp::Ge, Version::new(1, 1, 0));
        catalog.insert(name("a"), vec![meta("a", (1, 0, 0), vec![required("b", Some(constraint))])]);
        catalog.insert(
            name("b"),
            vec![meta("b", (1, 0, 0), vec![]), meta("b", (1, 2, 0), vec![]), meta("b", (2, 0, 0), vec![])],
        );
        let source = FixedSource { catalog };
        let resolver = DependencyResolver::new(&source);

        let result = resolver.expand(&[name("a")], &StdHashMap::new()).unwrap();
        let b = result.iter().find(|m| m.name == name("b")).unwrap();
        assert_eq!(b.version, Version::new(2, 0, 0));
    }

    #[test]
    fn optional_dependencies_are_not_auto_expanded() {
        let mut catalog = StdHashMap::new();
        let opt = DependencySpec::new(name("b"), DependencyKind::Optional, None);
        catalog.insert(name("a"), vec![meta("a", (1, 0, 0), vec![opt])]);
        let source = FixedSource { catalog };
        let resolver = DependencyResolver::new(&source);

        let result = resolver.expand(&[name("a")], &StdHashMap::new()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, name("a"));
    }

    #[test]
    fn missing_required_dependency_fails_resolution() {
        let mut catalog = StdHashMap::new();
        catalog.insert(name("a"), vec![meta("a", (1, 0, 0), vec![required("ghost", None)])]);
        let source = FixedSource { catalog };
        let resolver = DependencyResolver::new(&source);

        assert!(matches!(
            resolver.expand(&[name("a")], &StdHashMap::new()),
            Err(ResolveError::NoCompatibleVersion(n)) if n == name("ghost")
        ));
    }

    #[test]
    fn base_and_expansion_dependencies_are_never_added_to_the_working_set() {
        let mut catalog = StdHashMap::new();
        catalog.insert(
            name("a"),
            vec![meta("a", (1, 0, 0), vec![required("base", None), required("space-age", None)])],
        );
        let source = FixedSource { catalog };
        let resolver = DependencyResolver::new(&source);

        let result = resolver.expand(&[name("a")], &StdHashMap::new()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, name("a"));
    }

    #[test]
    fn a_dependency_already_installed_at_a_satisfying_version_is_not_re_resolved() {
        let constraint = VersionConstraint::new(ConstraintOp::Ge, Version::new(1, 0, 0));
        let mut catalog = StdHashMap::new();
        catalog.insert(name("a"), vec![meta("a", (1, 0, 0), vec![required("b", Some(constraint))])]);
        let source = FixedSource { catalog };
        let resolver = DependencyResolver::new(&source);

        let mut installed = StdHashMap::new();
        installed.insert(name("b"), Version::new(1, 5, 0));

        let result = resolver.expand(&[name("a")], &installed).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, name("a"));
    }

    #[test]
    fn base_mod_cannot_be_uninstalled() {
        let installed = vec![meta("base", (1, 0, 0), vec![])];
        assert!(matches!(
            DependencyResolver::plan_uninstall(&name("base"), &installed),
            Err(ResolveError::ProtectedMod(_))
        ));
    }

    #[test]
    fn mod_with_a_dependent_cannot_be_uninstalled() {
        let installed = vec![meta("a", (1, 0, 0), vec![required("b", None)]), meta("b", (1, 0, 0), vec![])];
        assert!(matches!(
            DependencyResolver::plan_uninstall(&name("b"), &installed),
            Err(ResolveError::HasDependents(_, _))
        ));
    }

    #[test]
    fn unreferenced_mod_can_be_uninstalled() {
        let installed = vec![meta("a", (1, 0, 0), vec![]), meta("b", (1, 0, 0), vec![])];
        assert!(DependencyResolver::plan_uninstall(&name("b"), &installed).is_ok());
    }
}
