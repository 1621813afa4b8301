//! Parser for the dependency mini-language (§4.3):
//!
//! ```text
//! dep       := prefix? name (ws op ws version)?
//! prefix    := "(?)" | "!" | "?" | "~"
//! op        := ">=" | "<=" | ">" | "<" | "="
//! name      := [A-Za-z0-9_-]+
//! version   := [0-9]+ "." [0-9]+ "." [0-9]+
//! ```
//!
//! Printing is `DependencySpec`'s existing `Display` impl, which already
//! round-trips through this parser (`parse(print(d)) == d`).

use std::sync::OnceLock;

use fmm_model::{DependencyKind, DependencySpec, ModName, VersionConstraint};
use regex::Regex;

use crate::error::{ExpressionResult, InvalidExpression};

/// `(?)` is tried before the bare `?` so the longer prefix wins.
fn pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^
            (?P<prefix>\(\?\)|!|\?|~)?
            \s*
            (?P<name>[A-Za-z0-9_-]+)
            (?:
                \s+
                (?P<op>>=|<=|>|<|=)
                \s+
                (?P<version>[0-9]+\.[0-9]+\.[0-9]+)
            )?
            $
            ",
        )
        .expect("static dependency expression regex is valid")
    })
}

fn kind_for_prefix(prefix: Option<&str>) -> DependencyKind {
    match prefix {
        None => DependencyKind::Required,
        Some("?") => DependencyKind::Optional,
        Some("(?)") => DependencyKind::HiddenOptional,
        Some("!") => DependencyKind::Incompatible,
        Some("~") => DependencyKind::LoadNeutral,
        Some(other) => unreachable!("regex only captures known prefixes, got \"{other}\""),
    }
}

/// Parses a single dependency-mini-language string into a [`DependencySpec`].
pub fn parse(expr: &str) -> ExpressionResult<DependencySpec> {
    let trimmed = expr.trim();
    let captures = pattern()
        .captures(trimmed)
        .ok_or_else(|| InvalidExpression(expr.to_string()))?;

    let prefix = captures.name("prefix").map(|m| m.as_str());
    let kind = kind_for_prefix(prefix);

    let name = captures
        .name("name")
        .expect("name is a mandatory capture group")
        .as_str();
    let target: ModName = name.parse().map_err(|_| InvalidExpression(expr.to_string()))?;

    let constraint = match (captures.name("op"), captures.name("version")) {
        (Some(op), Some(version)) => {
            let op = op.as_str().parse().map_err(|_| InvalidExpression(expr.to_string()))?;
            let version = version.as_str().parse().map_err(|_| InvalidExpression(expr.to_string()))?;
            Some(VersionConstraint::new(op, version))
        }
        (None, None) => None,
        _ => unreachable!("op and version are captured by the same optional group"),
    };

    Ok(DependencySpec::new(target, kind, constraint))
}

/// Prints a [`DependencySpec`] back to its mini-language form. A thin alias
/// over `Display` so callers don't need to import it separately.
pub fn print(spec: &DependencySpec) -> String {
    spec.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_optional_with_constraint() {
        let spec = parse("? some-mod >= 1.2.0").unwrap();
        assert_eq!(spec.target, "some-mod".parse::<ModName>().unwrap());
        assert_eq!(spec.kind, DependencyKind::Optional);
        assert_eq!(spec.constraint.unwrap().to_string(), ">= 1.2.0");
    }

    #[test]
    fn parses_bare_required_dependency() {
        let spec = parse("some-mod").unwrap();
        assert_eq!(spec.kind, DependencyKind::Required);
        assert!(spec.constraint.is_none());
    }

    #[test]
    fn hidden_optional_prefix_binds_before_bare_optional() {
        let spec = parse("(?) quiet-mod").unwrap();
        assert_eq!(spec.kind, DependencyKind::HiddenOptional);
    }

    #[test]
    fn parses_all_prefixes_and_operators() {
        for (input, kind) in [
            ("some-mod", DependencyKind::Required),
            ("? some-mod", DependencyKind::Optional),
            ("(?) some-mod", DependencyKind::HiddenOptional),
            ("! some-mod", DependencyKind::Incompatible),
            ("~ some-mod", DependencyKind::LoadNeutral),
        ] {
            assert_eq!(parse(input).unwrap().kind, kind, "input was {input:?}");
        }

        for op in ["<", "<=", "=", ">=", ">"] {
            let expr = format!("some-mod {op} 1.0.0");
            let spec = parse(&expr).unwrap();
            assert_eq!(spec.constraint.unwrap().op.to_string(), op);
        }
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(parse("").is_err());
        assert!(parse("has space-in-name-but no op").is_err());
        assert!(parse("some-mod ~ 1.0.0").is_err());
        assert!(parse("some-mod >= 1.0").is_err());
    }

    #[test]
    fn round_trips_through_print() {
        let inputs = [
            "some-mod",
            "? some-mod >= 1.2.0",
            "(?) quiet-mod <= 3.0.0",
            "! bad-mod",
            "~ neutral-mod = 1.0.0",
        ];
        for input in inputs {
            let spec = parse(input).unwrap();
            let printed = print(&spec);
            let reparsed = parse(&printed).unwrap();
            assert_eq!(spec, reparsed, "round trip failed for {input:?}");
        }
    }
}
