//! Integration tests for the fortenv binary.
//!
//! These fabricate installation trees under a temp scan root and drive the
//! binary the way a user would. Discovery flavor follows the host, so the
//! scan-root tests are Unix-only.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn fortenv() -> Command {
    Command::cargo_bin("fortenv").expect("binary built")
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, b"").expect("touch");
}

#[cfg(target_os = "linux")]
mod scan_root {
    use super::*;

    #[test]
    fn list_reports_discovered_versions() {
        let root = tempfile::tempdir().expect("tempdir");
        let top = root.path().join("intel").join("composer_xe_2013.5.192");
        touch(&top.join("bin").join("intel64").join("ifort"));

        fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("2013.5.192"))
            .stdout(predicate::str::contains("composer_xe"));
    }

    #[test]
    fn list_json_is_machine_readable() {
        let root = tempfile::tempdir().expect("tempdir");
        let top = root.path().join("intel").join("composer_xe_2013.5.192");
        touch(&top.join("bin").join("intel64").join("ifort"));

        let output = fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .args(["list", "--format", "json"])
            .output()
            .expect("run");
        assert!(output.status.success());
        let parsed: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("valid json");
        assert_eq!(parsed[0]["version"], "2013.5.192");
        assert_eq!(parsed[0]["origin"], "composer_xe");
    }

    #[test]
    fn list_with_no_installations_says_so() {
        let root = tempfile::tempdir().expect("tempdir");
        fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No Intel Fortran installations"));
    }

    #[test]
    fn resolve_prints_layout_and_mutations() {
        let root = tempfile::tempdir().expect("tempdir");
        let top = root.path().join("intel").join("composer_xe_2013.5.192");
        touch(&top.join("bin").join("intel64").join("ifort"));

        fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .args(["resolve", "--version", "2013", "--abi", "x86_64"])
            .assert()
            .success()
            .stdout(predicate::str::contains("version:    2013.5.192"))
            .stdout(predicate::str::contains("composer_xe_2013.5.192"))
            .stdout(predicate::str::contains("LD_LIBRARY_PATH"));
    }

    #[test]
    fn verbose_resolve_reports_progress() {
        let root = tempfile::tempdir().expect("tempdir");
        let top = root.path().join("intel").join("composer_xe_2013.5.192");
        touch(&top.join("bin").join("intel64").join("ifort"));

        fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .args(["--verbose", "resolve"])
            .assert()
            .success()
            .stderr(predicate::str::contains("installed Intel Fortran versions"))
            .stderr(predicate::str::contains("selected Intel Fortran version 2013.5.192"));
    }

    #[test]
    fn resolve_unknown_version_fails_with_searched_paths() {
        let root = tempfile::tempdir().expect("tempdir");
        let top = root.path().join("intel").join("composer_xe_2013.5.192");
        touch(&top.join("bin").join("intel64").join("ifort"));

        fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .args(["resolve", "--version", "99.9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("99.9"))
            .stderr(predicate::str::contains("composer_xe_*"));
    }

    #[test]
    fn resolve_with_nothing_installed_declines() {
        let root = tempfile::tempdir().expect("tempdir");
        fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .arg("resolve")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No Intel Fortran installation"));
    }

    #[test]
    fn env_emits_export_lines() {
        let root = tempfile::tempdir().expect("tempdir");
        let top = root.path().join("intel").join("composer_xe_2013.5.192");
        touch(&top.join("bin").join("intel64").join("ifort"));

        fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .arg("env")
            .assert()
            .success()
            .stdout(predicate::str::contains("export INCLUDE="))
            .stdout(predicate::str::contains("export PATH="))
            .stdout(predicate::str::contains("export LD_LIBRARY_PATH="));
    }

    #[test]
    fn env_with_explicit_topdir() {
        let root = tempfile::tempdir().expect("tempdir");
        let top = root.path().join("custom");
        touch(&top.join("bin").join("ifort"));

        fortenv()
            .args(["--scan-root", root.path().to_str().expect("utf-8")])
            .args(["env", "--topdir", top.to_str().expect("utf-8")])
            .assert()
            .success()
            .stdout(predicate::str::contains(top.join("bin").to_str().expect("utf-8")));
    }
}

#[cfg(unix)]
mod check {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn check_fails_without_ifort_on_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        fortenv()
            .env("PATH", dir.path())
            .arg("check")
            .assert()
            .failure()
            .stdout(predicate::str::contains("not found"));
    }

    #[test]
    fn check_succeeds_with_ifort_on_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exe = dir.path().join("ifort");
        fs::write(&exe, b"#!/bin/sh\n").expect("write");
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).expect("chmod");

        fortenv()
            .env("PATH", dir.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("ifort found"));
    }
}
