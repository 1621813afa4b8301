//! Exercises `MODRegistry::scan` end to end against a real temp directory
//! tree, including the archive/directory dedup rule.

use std::{fs, io::Write};

use camino::Utf8Path;
use fmm_model::InstallForm;
use fmm_registry::MODRegistry;

fn write_mod_dir(root: &Utf8Path, name: &str, version: &str) {
    let path = root.join(name);
    fs::create_dir_all(&path).unwrap();
    fs::write(
        path.join("info.json"),
        format!(
            r#"{{"name":"{name}","version":"{version}","title":"t","author":"a","description":"d","factorio_version":"1.1"}}"#
        ),
    )
    .unwrap();
}

fn write_mod_archive(root: &Utf8Path, name: &str, version: &str) {
    let archive_path = root.join(format!("{name}_{version}.zip"));
    let file = fs::File::create(&archive_path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file(format!("{name}_{version}/info.json"), options).unwrap();
    zip.write_all(
        format!(
            r#"{{"name":"{name}","version":"{version}","title":"t","author":"a","description":"d","factorio_version":"1.1"}}"#
        )
        .as_bytes(),
    )
    .unwrap();
    zip.finish().unwrap();
}

#[test]
fn directory_wins_over_archive_at_the_same_version() {
    let dir = tempfile::tempdir().unwrap();
    let mod_dir = Utf8Path::from_path(dir.path()).unwrap().join("mods");
    fs::create_dir_all(&mod_dir).unwrap();
    let game_data_dir = Utf8Path::from_path(dir.path()).unwrap().join("data");
    fs::create_dir_all(&game_data_dir).unwrap();

    write_mod_dir(&mod_dir, "some-mod", "1.0.0");
    write_mod_archive(&mod_dir, "some-mod", "1.0.0");

    let found = MODRegistry::scan(&mod_dir, &game_data_dir).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].form, InstallForm::Directory);
}

#[test]
fn multiple_versions_of_the_same_mod_are_both_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mod_dir = Utf8Path::from_path(dir.path()).unwrap().join("mods");
    fs::create_dir_all(&mod_dir).unwrap();
    let game_data_dir = Utf8Path::from_path(dir.path()).unwrap().join("data");
    fs::create_dir_all(&game_data_dir).unwrap();

    write_mod_archive(&mod_dir, "some-mod", "1.0.0");
    write_mod_archive(&mod_dir, "some-mod", "2.0.0");

    let found = MODRegistry::scan(&mod_dir, &game_data_dir).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].version.to_string(), "2.0.0");
    assert_eq!(found[1].version.to_string(), "1.0.0");
}

#[test]
fn game_data_directory_only_accepts_reserved_names() {
    let dir = tempfile::tempdir().unwrap();
    let mod_dir = Utf8Path::from_path(dir.path()).unwrap().join("mods");
    fs::create_dir_all(&mod_dir).unwrap();
    let game_data_dir = Utf8Path::from_path(dir.path()).unwrap().join("data");
    fs::create_dir_all(&game_data_dir).unwrap();

    write_mod_dir(&game_data_dir, "base", "1.1.110");
    write_mod_dir(&game_data_dir, "third-party", "1.0.0");

    let found = MODRegistry::scan(&mod_dir, &game_data_dir).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name.as_str(), "base");
}
