//! Integration coverage for the expression round-trip property and the
//! two-mod circular dependency scenario.

use fmm_depend::{parse, print, DependencyValidator, ValidationFinding, ValidatorEntry};
use fmm_model::{DependencyKind, DependencySpec, ModName};

fn name(s: &str) -> ModName {
    s.parse().unwrap()
}

#[test]
fn every_parseable_expression_round_trips_through_print() {
    let expressions = [
        "base",
        "? quality",
        "(?) space-age",
        "! broken-mod",
        "~ neutral-mod",
        "some-mod >= 1.2.0",
        "? some-mod <= 2.0.0",
    ];

    for expr in expressions {
        let spec = parse(expr).unwrap();
        let reprinted = print(&spec);
        let reparsed = parse(&reprinted).unwrap();
        assert_eq!(spec, reparsed, "{expr:?} did not round trip");
    }
}

#[test]
fn two_mods_depending_on_each_other_yield_one_circular_finding() {
    let entries = vec![
        ValidatorEntry { name: name("a"), enabled: true, version: None },
        ValidatorEntry { name: name("b"), enabled: true, version: None },
    ];
    let deps = vec![
        (name("a"), vec![DependencySpec::new(name("b"), DependencyKind::Required, None)]),
        (name("b"), vec![DependencySpec::new(name("a"), DependencyKind::Required, None)]),
    ];

    let findings = DependencyValidator::validate(&entries, &deps);
    let circular: Vec<_> = findings
        .into_iter()
        .filter(|f| matches!(f, ValidationFinding::CircularDependency { .. }))
        .collect();

    assert_eq!(circular.len(), 1);
    match &circular[0] {
        ValidationFinding::CircularDependency { cycle } => {
            assert_eq!(cycle.len(), 3);
            let names: Vec<&str> = cycle.iter().map(ModName::as_str).collect();
            assert_eq!(names.first(), names.last());
        }
        _ => unreachable!(),
    }
}
