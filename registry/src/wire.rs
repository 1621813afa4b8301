//! `info.json`'s wire shape. `fmm_model::ModInfo.dependencies` is a `Vec<DependencySpec>`
//! because that's the useful in-memory shape everywhere else; on the wire,
//! dependencies are grammar strings (`"? some-mod >= 1.2.0"`), so this raw
//! DTO exists purely to read them off disk and hand each string to
//! `fmm_depend::parse` before building the real `ModInfo`.

use fmm_model::{ModInfo, ModName, Version};
use serde::Deserialize;

use crate::error::RegistryResult;

#[derive(Deserialize)]
struct RawModInfo {
    name: String,
    version: String,
    title: String,
    author: String,
    #[serde(default)]
    description: String,
    factorio_version: String,
    #[serde(default)]
    dependencies: Vec<String>,
}

pub fn parse_info_json(bytes: &[u8]) -> RegistryResult<ModInfo> {
    let raw: RawModInfo = serde_json::from_slice(bytes)?;

    let name: ModName = raw.name.parse()?;
    let version: Version = raw.version.parse()?;
    let dependencies = raw
        .dependencies
        .iter()
        .map(|expr| fmm_depend::parse(expr))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModInfo {
        name,
        version,
        title: raw.title,
        author: raw.author,
        description: raw.description,
        factorio_version: raw.factorio_version,
        dependencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dependency_grammar_strings_into_specs() {
        let json = br#"{
            "name": "some-mod",
            "version": "1.2.3",
            "title": "Some Mod",
            "author": "someone",
            "description": "does things",
            "factorio_version": "1.1",
            "dependencies": ["base", "? optional-mod >= 1.0.0", "! bad-mod"]
        }"#;

        let info = parse_info_json(json).unwrap();
        assert_eq!(info.name.as_str(), "some-mod");
        assert_eq!(info.version, Version::new(1, 2, 3));
        assert_eq!(info.dependencies.len(), 3);
        assert!(info.dependencies[0].is_required());
        assert!(info.dependencies[1].is_optional());
    }

    #[test]
    fn rejects_malformed_dependency_expressions() {
        let json = br#"{
            "name": "some-mod",
            "version": "1.0.0",
            "title": "Some Mod",
            "author": "someone",
            "description": "",
            "factorio_version": "1.1",
            "dependencies": ["some-mod ~~ 1.0.0"]
        }"#;

        assert!(parse_info_json(json).is_err());
    }

    #[test]
    fn description_defaults_to_empty_string() {
        let json = br#"{
            "name": "some-mod",
            "version": "1.0.0",
            "title": "Some Mod",
            "author": "someone",
            "factorio_version": "1.1"
        }"#;

        let info = parse_info_json(json).unwrap();
        assert_eq!(info.description, "");
    }
}
