//! Validates a set of MODs against their declared dependencies (§4.9).
//! Runs to completion rather than short-circuiting on the first problem, so
//! callers see every finding in one pass.

use fmm_model::{DependencyKind, ModName};

use crate::{error::ValidationFinding, graph::DependencyGraph};

/// One entry per installed MOD being validated: its name, whether it's
/// currently enabled, and (if known) its installed version.
pub struct ValidatorEntry {
    pub name: ModName,
    pub enabled: bool,
    pub version: Option<fmm_model::Version>,
}

pub struct DependencyValidator;

impl DependencyValidator {
    /// Builds the dependency graph from `entries` plus each entry's declared
    /// dependency specs, then runs every check, returning every finding.
    pub fn validate(entries: &[ValidatorEntry], dependencies: &[(ModName, Vec<fmm_model::DependencySpec>)]) -> Vec<ValidationFinding> {
        let mut findings = Vec::new();
        let mut graph = DependencyGraph::new();

        for entry in entries {
            graph.add_node(entry.name.clone());
        }
        for (owner, specs) in dependencies {
            for spec in specs {
                graph.add_edge(owner.clone(), spec.clone());
            }
        }

        for cycle in graph.find_cycles() {
            findings.push(ValidationFinding::CircularDependency { cycle });
        }

        let by_name: std::collections::HashMap<ModName, &ValidatorEntry> =
            entries.iter().map(|e| (e.name.clone(), e)).collect();

        for (owner, specs) in dependencies {
            for spec in specs {
                match spec.kind {
                    DependencyKind::Required => match by_name.get(&spec.target) {
                        None => findings.push(ValidationFinding::MissingDependency {
                            dependent: owner.clone(),
                            missing: spec.target.clone(),
                        }),
                        Some(target) if !target.enabled => findings.push(ValidationFinding::DisabledDependency {
                            dependent: owner.clone(),
                            disabled: spec.target.clone(),
                        }),
                        Some(target) => {
                            if let (Some(constraint), Some(installed)) = (&spec.constraint, target.version) {
                                if !constraint.satisfied_by(installed) {
                                    findings.push(ValidationFinding::VersionMismatch {
                                        dependent: owner.clone(),
                                        target: spec.target.clone(),
                                        constraint: *constraint,
                                        installed,
                                    });
                                }
                            }
                        }
                    },
                    DependencyKind::Incompatible => {
                        let owner_enabled = by_name.get(owner).is_some_and(|e| e.enabled);
                        if let Some(target) = by_name.get(&spec.target) {
                            if owner_enabled && target.enabled {
                                findings.push(ValidationFinding::Conflict {
                                    dependent: owner.clone(),
                                    target: spec.target.clone(),
                                });
                            }
                        }
                    }
                    DependencyKind::Optional | DependencyKind::HiddenOptional | DependencyKind::LoadNeutral => {}
                }
            }
        }

        let mut missing_from_list: Vec<&ModName> = graph
            .nodes()
            .filter(|name| !by_name.contains_key(*name))
            .collect();
        missing_from_list.sort();
        for name in missing_from_list {
            findings.push(ValidationFinding::PackageMissingFromList { name: name.clone() });
        }

        let mut list_missing_package: Vec<&ModName> = entries
            .iter()
            .map(|e| &e.name)
            .filter(|name| !graph.contains(*name))
            .collect();
        list_missing_package.sort();
        for name in list_missing_package {
            findings.push(ValidationFinding::ListMissingPackage { name: name.clone() });
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmm_model::{DependencySpec, Version};

    fn name(s: &str) -> ModName {
        s.parse().unwrap()
    }

    fn entry(n: &str, enabled: bool, version: Option<Version>) -> ValidatorEntry {
        ValidatorEntry { name: name(n), enabled, version }
    }

    #[test]
    fn circular_dependency_between_two_mods_is_reported_once() {
        let entries = vec![entry("a", true, None), entry("b", true, None)];
        let deps = vec![
            (name("a"), vec![DependencySpec::new(name("b"), DependencyKind::Required, None)]),
            (name("b"), vec![DependencySpec::new(name("a"), DependencyKind::Required, None)]),
        ];

        let findings = DependencyValidator::validate(&entries, &deps);
        let cycles: Vec<_> = findings
            .iter()
            .filter(|f| matches!(f, ValidationFinding::CircularDependency { .. }))
            .collect();
        assert_eq!(cycles.len(), 1);
        if let ValidationFinding::CircularDependency { cycle } = cycles[0] {
            assert_eq!(cycle.len(), 3);
            assert_eq!(cycle.first(), cycle.last());
        }
    }

    #[test]
    fn missing_required_dependency_is_reported() {
        let entries = vec![entry("a", true, None)];
        let deps = vec![(name("a"), vec![DependencySpec::new(name("ghost"), DependencyKind::Required, None)])];

        let findings = DependencyValidator::validate(&entries, &deps);
        assert!(findings.iter().any(|f| matches!(
            f,
            ValidationFinding::MissingDependency { dependent, missing }
                if dependent == &name("a") && missing == &name("ghost")
        )));
    }

    #[test]
    fn disabled_required_dependency_is_reported() {
        let entries = vec![entry("a", true, None), entry("b", false, None)];
        let deps = vec![(name("a"), vec![DependencySpec::new(name("b"), DependencyKind::Required, None)])];

        let findings = DependencyValidator::validate(&entries, &deps);
        assert!(findings
            .iter()
            .any(|f| matches!(f, ValidationFinding::DisabledDependency { .. })));
    }

    #[test]
    fn version_mismatch_is_reported() {
        use fmm_model::{ConstraintOp, VersionConstraint};
        let entries = vec![
            entry("a", true, None),
            entry("b", true, Some(Version::new(1, 0, 0))),
        ];
        let constraint = VersionConstraint::new(ConstraintOp::Ge, Version::new(2, 0, 0));
        let deps = vec![(
            name("a"),
            vec![DependencySpec::new(name("b"), DependencyKind::Required, Some(constraint))],
        )];

        let findings = DependencyValidator::validate(&entries, &deps);
        assert!(findings
            .iter()
            .any(|f| matches!(f, ValidationFinding::VersionMismatch { .. })));
    }

    #[test]
    fn enabled_incompatible_target_is_a_conflict() {
        let entries = vec![entry("a", true, None), entry("b", true, None)];
        let deps = vec![(name("a"), vec![DependencySpec::new(name("b"), DependencyKind::Incompatible, None)])];

        let findings = DependencyValidator::validate(&entries, &deps);
        assert!(findings.iter().any(|f| matches!(f, ValidationFinding::Conflict { .. })));
    }

    #[test]
    fn disabled_owner_with_an_enabled_incompatible_target_is_not_a_conflict() {
        let entries = vec![entry("a", false, None), entry("b", true, None)];
        let deps = vec![(name("a"), vec![DependencySpec::new(name("b"), DependencyKind::Incompatible, None)])];

        let findings = DependencyValidator::validate(&entries, &deps);
        assert!(!findings.iter().any(|f| matches!(f, ValidationFinding::Conflict { .. })));
    }

    #[test]
    fn optional_missing_dependency_produces_no_finding() {
        let entries = vec![entry("a", true, None)];
        let deps = vec![(name("a"), vec![DependencySpec::new(name("ghost"), DependencyKind::Optional, None)])];

        let findings = DependencyValidator::validate(&entries, &deps);
        assert!(findings.is_empty());
    }
}
