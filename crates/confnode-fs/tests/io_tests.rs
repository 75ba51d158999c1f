use assert_fs::prelude::*;
use confnode_fs::{Error, NormalizedPath, io};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("config.json"));

    io::write_atomic(&path, b"{}").unwrap();

    assert_eq!(fs::read_to_string(path.to_native()).unwrap(), "{}");
}

#[test]
fn write_atomic_replaces_existing_content() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("config.json"));

    io::write_text(&path, "first").unwrap();
    io::write_text(&path, "second").unwrap();

    assert_eq!(io::read_text(&path).unwrap(), "second");
}

#[test]
fn write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("config.json"));

    io::write_text(&path, "content").unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "found temp files: {:?}", leftovers);
}

#[test]
fn write_text_leaves_only_the_target() {
    let temp = assert_fs::TempDir::new().unwrap();
    let target = temp.child("snapshot.json");

    io::write_text(&NormalizedPath::new(target.path()), "{\"a\": 1}").unwrap();

    target.assert(predicate::str::contains("\"a\": 1"));
    temp.child(format!(".snapshot.json.{}.tmp", std::process::id()))
        .assert(predicate::path::missing());
}

#[test]
fn write_atomic_into_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing").join("config.json"));

    let err = io::write_text(&path, "content").unwrap_err();

    assert!(matches!(err, Error::Io { .. }));
    assert!(!temp.path().join("missing").exists());
}

#[test]
fn read_text_missing_file_reports_path() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("nope.json"));

    let err = io::read_text(&path).unwrap_err();

    assert!(err.to_string().contains("nope.json"));
}

#[cfg(unix)]
mod unix_tests {
    use super::*;
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    fn is_root() -> bool {
        match std::process::Command::new("id").arg("-u").output() {
            Ok(output) => String::from_utf8_lossy(&output.stdout).trim() == "0",
            Err(_) => false,
        }
    }

    #[test]
    fn write_atomic_to_readonly_directory_fails() {
        if is_root() {
            eprintln!("Skipping test: running as root bypasses permission checks");
            return;
        }
        let temp = TempDir::new().unwrap();
        let readonly = temp.path().join("readonly");
        fs::create_dir(&readonly).unwrap();
        fs::set_permissions(&readonly, Permissions::from_mode(0o555)).unwrap();

        let result = io::write_text(&NormalizedPath::new(readonly.join("config.json")), "x");

        let _ = fs::set_permissions(&readonly, Permissions::from_mode(0o755));
        assert!(result.is_err(), "writing into a read-only directory should fail");
    }
}

#[test]
fn concurrent_writes_to_one_target_all_succeed() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("config.json"));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = &path;
                scope.spawn(move || io::write_text(path, &format!("writer {i}")))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
    });

    assert!(io::read_text(&path).unwrap().starts_with("writer "));
    let entries = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(entries, 1);
}
