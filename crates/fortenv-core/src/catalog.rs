//! Enumeration of the compiler installations visible on the host.
//!
//! Windows installs register themselves under one of two registry tree
//! roots (the root moved at the 2023 product rename); Linux installs are
//! directories under `/opt/intel*` whose names encode the version in one of
//! two installer-era conventions. Each mechanism is an
//! [`InstallationCatalog`] implementation; which one a host gets is decided
//! once, from its [`HostContext`], and both reduce to the same
//! [`InstalledVersion`] records, most recent first.

use crate::error::RegistryError;
use crate::host::{HostContext, OsFamily};
use crate::registry::{RegistryAccess, LEGACY_ROOT, MODERN_ROOT};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Where an installation was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallOrigin {
    /// Pre-2023 registry tree (`...\Compilers\Fortran`).
    RegistryLegacy,
    /// 2023+ registry tree (`...\Compilers\1AFortran`).
    RegistryModern,
    /// `composer_xe_*` / `composerxe-*` directory naming (2011-era installers).
    ComposerXe,
    /// `compilers_and_libraries_*` directory naming (2017-era installers).
    CompilersAndLibraries,
}

impl InstallOrigin {
    pub fn describe(&self) -> &'static str {
        match self {
            InstallOrigin::RegistryLegacy => "registry (legacy root)",
            InstallOrigin::RegistryModern => "registry (modern root)",
            InstallOrigin::ComposerXe => "composer_xe directory",
            InstallOrigin::CompilersAndLibraries => "compilers_and_libraries directory",
        }
    }
}

impl std::fmt::Display for InstallOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// One installation visible on the host. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledVersion {
    /// Opaque dotted version string, e.g. `"19.0"` or `"2021.3"`.
    pub version: String,
    pub origin: InstallOrigin,
}

/// A source of installed-version records.
///
/// Implementations return their findings most recent first, with each
/// discovery source deduplicated. An empty result is an ordinary outcome,
/// not an error: "nothing installed" and "this host cannot look" both
/// read as zero entries here, and only the resolver distinguishes them.
pub trait InstallationCatalog {
    fn installed_versions(&self) -> Vec<InstalledVersion>;
}

/// The catalog mechanism appropriate for `host`.
pub fn catalog_for(host: &HostContext) -> Box<dyn InstallationCatalog> {
    match host.os() {
        OsFamily::Windows => Box::new(RegistryCatalog::new(host)),
        OsFamily::Linux => Box::new(FilesystemCatalog::new(host.scan_root())),
        OsFamily::Other => Box::new(NullCatalog),
    }
}

/// Enumerate the installations visible on `host`, most recent first.
pub fn list_versions(host: &HostContext) -> Vec<InstalledVersion> {
    catalog_for(host).installed_versions()
}

/// Registry-backed discovery: version subkeys of the two compiler tree
/// roots under HKLM.
pub struct RegistryCatalog {
    registry: Option<Arc<dyn RegistryAccess>>,
}

impl RegistryCatalog {
    pub fn new(host: &HostContext) -> Self {
        Self {
            registry: host.registry_handle(),
        }
    }
}

impl InstallationCatalog for RegistryCatalog {
    fn installed_versions(&self) -> Vec<InstalledVersion> {
        let Some(reg) = &self.registry else {
            return Vec::new();
        };
        let roots = [
            (LEGACY_ROOT, InstallOrigin::RegistryLegacy),
            (MODERN_ROOT, InstallOrigin::RegistryModern),
        ];
        let mut out = Vec::new();
        for (root, origin) in roots {
            let mut versions: Vec<String> = match reg.subkeys(root) {
                Ok(names) => names
                    .into_iter()
                    .filter(|name| VersionKey::parse(name).is_some())
                    .collect(),
                // A root a given generation never wrote is expected.
                Err(RegistryError::KeyNotFound(_)) => Vec::new(),
                Err(err) => {
                    debug!("registry scan of {root} failed: {err}");
                    Vec::new()
                }
            };
            versions.sort();
            versions.dedup();
            out.extend(
                versions
                    .into_iter()
                    .map(|version| InstalledVersion { version, origin }),
            );
        }
        sort_newest_first(&mut out);
        out
    }
}

/// Directory-scan discovery: installer-era naming conventions under the
/// host's `intel*` roots.
pub struct FilesystemCatalog {
    scan_root: PathBuf,
}

impl FilesystemCatalog {
    pub fn new(scan_root: impl Into<PathBuf>) -> Self {
        Self {
            scan_root: scan_root.into(),
        }
    }
}

impl InstallationCatalog for FilesystemCatalog {
    fn installed_versions(&self) -> Vec<InstalledVersion> {
        let eras = [
            ("composer_xe_", InstallOrigin::ComposerXe),
            ("compilers_and_libraries_", InstallOrigin::CompilersAndLibraries),
        ];
        let mut out = Vec::new();
        for (prefix, origin) in eras {
            let mut versions: Vec<String> = intel_dirs(&self.scan_root)
                .iter()
                .flat_map(|intel| prefixed_dirs(intel, prefix))
                .filter_map(|dir| dir_name(&dir).as_deref().and_then(extract_dir_version))
                .collect();
            versions.sort();
            versions.dedup();
            out.extend(
                versions
                    .into_iter()
                    .map(|version| InstalledVersion { version, origin }),
            );
        }
        sort_newest_first(&mut out);
        out
    }
}

/// Hosts with no known discovery mechanism.
struct NullCatalog;

impl InstallationCatalog for NullCatalog {
    fn installed_versions(&self) -> Vec<InstalledVersion> {
        Vec::new()
    }
}

/// Matches `<year>[_sp<N>].<subversion>` at the end of an installer
/// directory name. The service-pack infix is dropped: the installers for
/// `composer_xe_2011_sp1.11.344` call themselves `2011.11.x`.
static ERA_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{0,4})(?:_sp\d*)?\.([0-9][0-9.]*)$").expect("era version pattern")
});

/// Numeric ordering key for dotted version strings.
///
/// Components are compared as integer tuples, so `2011.10` sorts above
/// `2011.9` and `10.0` above `9.0` -- plain string comparison misorders
/// exactly the shapes these installers produce. Parsing fails for anything
/// that is not all-numeric-dotted, which is what the catalogs use to skip
/// stray registry subkeys and directory names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct VersionKey(Vec<u64>);

impl VersionKey {
    pub(crate) fn parse(version: &str) -> Option<Self> {
        let mut parts = Vec::new();
        for part in version.split('.') {
            parts.push(part.parse::<u64>().ok()?);
        }
        Some(Self(parts))
    }
}

/// Descending comparison helper for the catalogs and tests.
pub(crate) fn version_cmp(a: &str, b: &str) -> Ordering {
    match (VersionKey::parse(a), VersionKey::parse(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb),
        // Catalog entries always parse; raw comparison only backstops
        // caller-supplied strings.
        _ => a.cmp(b),
    }
}

fn sort_newest_first(versions: &mut [InstalledVersion]) {
    versions.sort_by(|a, b| version_cmp(&b.version, &a.version));
}

/// Immediate `intel*` directories under the scan root. An unreadable root
/// simply yields nothing.
pub(crate) fn intel_dirs(scan_root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let Ok(entries) = fs::read_dir(scan_root) else {
        return dirs;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && entry.file_name().to_string_lossy().starts_with("intel") {
            dirs.push(path);
        }
    }
    dirs.sort();
    dirs
}

/// Immediate subdirectories of `dir` whose name starts with `prefix`.
pub(crate) fn prefixed_dirs(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return dirs;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && entry.file_name().to_string_lossy().starts_with(prefix) {
            dirs.push(path);
        }
    }
    dirs.sort();
    dirs
}

pub(crate) fn dir_name(dir: &Path) -> Option<String> {
    dir.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Extract the `<year>.<subversion>` version encoded in an installer
/// directory name, dropping the optional `_sp<N>` infix. Names that don't
/// parse as a numeric dotted version are rejected.
pub(crate) fn extract_dir_version(name: &str) -> Option<String> {
    let caps = ERA_VERSION.captures(name)?;
    let version = format!("{}.{}", &caps[1], &caps[2]);
    VersionKey::parse(&version).map(|_| version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapRegistry {
        subkeys: HashMap<String, Vec<String>>,
    }

    impl RegistryAccess for MapRegistry {
        fn subkeys(&self, path: &str) -> Result<Vec<String>, RegistryError> {
            self.subkeys
                .get(path)
                .cloned()
                .ok_or_else(|| RegistryError::KeyNotFound(path.to_string()))
        }

        fn read_value(&self, path: &str, name: &str) -> Result<String, RegistryError> {
            Err(RegistryError::ValueNotFound(format!(r"{path}\{name}")))
        }
    }

    fn registry_host(subkeys: HashMap<String, Vec<String>>) -> HostContext {
        HostContext::new(OsFamily::Windows, true).with_registry(Arc::new(MapRegistry { subkeys }))
    }

    #[test]
    fn test_numeric_key_orders_unlike_strings() {
        assert_eq!(version_cmp("10.0", "9.0"), Ordering::Greater);
        assert_eq!(version_cmp("2011.10", "2011.9"), Ordering::Greater);
        assert_eq!(version_cmp("19.0", "19.0.1"), Ordering::Less);
    }

    #[test]
    fn test_extract_dir_version() {
        assert_eq!(
            extract_dir_version("composer_xe_2011_sp1.11.344").as_deref(),
            Some("2011.11.344")
        );
        assert_eq!(
            extract_dir_version("compilers_and_libraries_2017.4.196").as_deref(),
            Some("2017.4.196")
        );
        assert_eq!(extract_dir_version("composer_xe_12.1").as_deref(), Some("12.1"));
        // No year component, or nothing version-like at all.
        assert_eq!(extract_dir_version("composer_xe_.344"), None);
        assert_eq!(extract_dir_version("documentation"), None);
    }

    #[test]
    fn test_registry_catalog_merges_both_roots_newest_first() {
        let mut subkeys = HashMap::new();
        subkeys.insert(
            LEGACY_ROOT.to_string(),
            vec!["19.0".to_string(), "2021.3".to_string(), "Defaults".to_string()],
        );
        subkeys.insert(MODERN_ROOT.to_string(), vec!["2024.0".to_string()]);
        let host = registry_host(subkeys);

        let versions = list_versions(&host);
        let listed: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(listed, vec!["2024.0", "2021.3", "19.0"]);
        assert_eq!(versions[0].origin, InstallOrigin::RegistryModern);
        assert_eq!(versions[1].origin, InstallOrigin::RegistryLegacy);
    }

    #[test]
    fn test_missing_modern_root_is_not_an_error() {
        let mut subkeys = HashMap::new();
        subkeys.insert(LEGACY_ROOT.to_string(), vec!["19.1".to_string()]);
        let host = registry_host(subkeys);

        let versions = list_versions(&host);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].version, "19.1");
    }

    #[test]
    fn test_no_registry_capability_yields_empty_catalog() {
        let host = HostContext::new(OsFamily::Windows, true);
        assert!(list_versions(&host).is_empty());
    }

    #[test]
    fn test_registry_catalog_dedups_within_a_root() {
        let mut subkeys = HashMap::new();
        subkeys.insert(
            LEGACY_ROOT.to_string(),
            vec!["19.0".to_string(), "19.0".to_string()],
        );
        let host = registry_host(subkeys);
        assert_eq!(list_versions(&host).len(), 1);
    }

    #[test]
    fn test_directory_catalog_scans_both_eras() {
        let root = tempfile::tempdir().expect("tempdir");
        let opt = root.path();
        std::fs::create_dir_all(opt.join("intel").join("composer_xe_2011_sp1.9.293")).unwrap();
        std::fs::create_dir_all(opt.join("intel").join("composer_xe_2011_sp1.11.344")).unwrap();
        std::fs::create_dir_all(
            opt.join("intel2017").join("compilers_and_libraries_2017.4.196"),
        )
        .unwrap();
        std::fs::create_dir_all(opt.join("intel").join("documentation_2017")).unwrap();

        let catalog = FilesystemCatalog::new(opt);
        let versions = catalog.installed_versions();
        let listed: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(listed, vec!["2017.4.196", "2011.11.344", "2011.9.293"]);
        assert_eq!(versions[0].origin, InstallOrigin::CompilersAndLibraries);
    }

    #[test]
    fn test_unknown_host_family_has_no_sources() {
        let host = HostContext::new(OsFamily::Other, true);
        assert!(list_versions(&host).is_empty());
    }
}
