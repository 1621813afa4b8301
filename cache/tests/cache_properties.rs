//! End-to-end property checks for the filesystem backend (§8): cache-type
//! isolation and compression transparency across a range of payload sizes
//! and thresholds.

use std::fs;

use camino::Utf8Path;
use fmm_cache::{CacheBackend, CacheConfig, FilesystemCacheBackend};
use tempfile::tempdir;

#[test]
fn entries_in_one_cache_type_are_invisible_from_another() {
    let dir = tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();

    let download = FilesystemCacheBackend::new(root.to_path_buf(), CacheConfig::new("download"));
    let info = FilesystemCacheBackend::new(root.to_path_buf(), CacheConfig::new("info"));

    let src = root.join("payload.bin");
    fs::write(&src, b"shared bytes, different namespaces").unwrap();
    download.store("same-key", &src).unwrap();

    assert!(download.exist("same-key").unwrap());
    assert!(!info.exist("same-key").unwrap());
    assert_eq!(info.read("same-key").unwrap(), None);
}

#[test]
fn compression_round_trips_regardless_of_threshold() {
    let dir = tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    let src = root.join("payload.bin");

    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"tiny".to_vec(),
        b"medium sized payload that repeats a bit".repeat(8),
        b"large payload".repeat(2048),
    ];

    for (i, threshold) in [None, Some(0u64), Some(64), Some(1_000_000)].into_iter().enumerate() {
        let mut config = CacheConfig::new(format!("type-{i}"));
        if let Some(t) = threshold {
            config = config.with_compress_threshold(t);
        }
        let backend = FilesystemCacheBackend::new(root.to_path_buf(), config);

        for (j, payload) in payloads.iter().enumerate() {
            let key = format!("key-{i}-{j}");
            fs::write(&src, payload).unwrap();
            backend.store(&key, &src).unwrap();
            assert_eq!(backend.read(&key).unwrap().unwrap(), *payload);
        }
    }
}

#[test]
fn write_to_copies_bytes_to_the_destination_path() {
    let dir = tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    let backend = FilesystemCacheBackend::new(root.to_path_buf(), CacheConfig::new("download"));

    let src = root.join("payload.bin");
    fs::write(&src, b"artifact bytes").unwrap();
    backend.store("artifact", &src).unwrap();

    let dest = root.join("out").join("artifact.bin");
    assert!(backend.write_to("artifact", &dest).unwrap());
    assert_eq!(fs::read(&dest).unwrap(), b"artifact bytes");
}
