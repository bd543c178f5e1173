//! Installation root discovery and internal layout detection.
//!
//! Finding the top directory is platform-specific (registry `ProductDir`
//! value on Windows, era-specific directory searches on Linux); deciding
//! what is inside it is not. Installations before v11 keep a flat
//! `bin`/`lib`/`include` tree, later ones split per architecture
//! (`bin/intel64`, `compiler/lib/intel64`, `compiler/include`) -- one
//! existence check on `bin/<archdir>` disambiguates. The optional MKL
//! subtree and the redistributable runtime directory are probed
//! independently.

use crate::abi::Abi;
use crate::catalog::{dir_name, extract_dir_version, intel_dirs, prefixed_dirs};
use crate::error::{RegistryError, ToolchainError};
use crate::host::{HostContext, OsFamily};
use crate::registry::{version_root, RegistryAccess};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Relative sub-paths of the bundled MKL subtree, when one is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MklPaths {
    pub bin_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub include_dir: PathBuf,
}

/// A located installation with its internal directory convention resolved.
///
/// `bin_dir`, `lib_dir` and `include_dir` are relative to `top_dir`;
/// `redist_dir` is absolute. `mkl` is `Some` exactly when the installation
/// bundles a math-library subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainLayout {
    pub top_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub include_dir: PathBuf,
    pub mkl: Option<MklPaths>,
    pub redist_dir: PathBuf,
}

/// Trailing dotted version of a `composerxe-<version>` directory name.
static BARE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9][0-9.]*)$").expect("bare version pattern"));

/// One era-specific way of searching the Linux scan root. Tried in order,
/// first success wins; a future installer generation is one more entry.
struct DirStrategy {
    /// Glob-style description of what gets searched, for error reports.
    pattern: &'static str,
    find: fn(&Path, &str, &str) -> Option<PathBuf>,
}

const DIR_STRATEGIES: &[DirStrategy] = &[
    DirStrategy {
        pattern: "intel*/composer_xe_*",
        find: find_composer_xe,
    },
    DirStrategy {
        pattern: "intel*/compilers_and_libraries_*",
        find: find_compilers_and_libraries,
    },
];

/// Locate the installation for `version`/`abi` and resolve its layout.
///
/// An `explicit_top` that exists on disk short-circuits discovery (the
/// caller knows best); anything else goes through the platform's
/// strategies. Fails with [`ToolchainError::InstallDirMissing`] when no
/// root can be found, or when a found root lacks the compiler binary for
/// the requested ABI.
pub fn resolve(
    host: &HostContext,
    version: Option<&str>,
    abi: Abi,
    explicit_top: Option<&Path>,
) -> Result<ToolchainLayout, ToolchainError> {
    let top = match explicit_top {
        Some(dir) if dir.exists() => dir.to_path_buf(),
        _ => {
            let Some(version) = version else {
                return Err(ToolchainError::InstallDirMissing {
                    version: "(any)".to_string(),
                    abi,
                    searched: explicit_top.map(Path::to_path_buf).into_iter().collect(),
                });
            };
            discover_top(host, version, abi)?
        }
    };
    detect_layout(host, &top, version.unwrap_or("(any)"), abi)
}

fn discover_top(host: &HostContext, version: &str, abi: Abi) -> Result<PathBuf, ToolchainError> {
    match host.os() {
        OsFamily::Windows => {
            let reg = host.registry().ok_or(ToolchainError::RegistryUnavailable)?;
            let dir = read_product_dir(reg, version, abi, None)?;
            Ok(PathBuf::from(dir))
        }
        OsFamily::Linux => {
            let exe = host.compiler_exe();
            let mut searched = Vec::new();
            for strategy in DIR_STRATEGIES {
                if let Some(top) = (strategy.find)(host.scan_root(), version, exe) {
                    debug!("found {version} under {}", top.display());
                    return Ok(top);
                }
                searched.push(host.scan_root().join(strategy.pattern));
            }
            Err(ToolchainError::InstallDirMissing {
                version: version.to_string(),
                abi,
                searched,
            })
        }
        OsFamily::Other => Err(ToolchainError::InstallDirMissing {
            version: version.to_string(),
            abi,
            searched: Vec::new(),
        }),
    }
}

/// Read the `ProductDir` value for `version`, scoped by the ABI's registry
/// arch segment and, optionally, a downstream-toolset marker key.
pub fn read_product_dir(
    reg: &dyn RegistryAccess,
    version: &str,
    abi: Abi,
    msvs: Option<&str>,
) -> Result<String, ToolchainError> {
    let mut path = format!(r"{}\{}\{}", version_root(version), version, abi.registry_arch());
    if let Some(marker) = msvs {
        path = format!(r"{path}\{marker}");
    }
    match reg.read_value(&path, "ProductDir") {
        Ok(dir) => Ok(dir),
        Err(RegistryError::KeyNotFound(_)) | Err(RegistryError::ValueNotFound(_)) => {
            Err(ToolchainError::RegistryEntryMissing {
                path: format!(r"{path}\ProductDir"),
                version: version.to_string(),
                abi,
            })
        }
        Err(RegistryError::Access(err)) => Err(ToolchainError::Io(err)),
    }
}

/// 2011-era search: `composer_xe_<name>` directories whose extracted
/// version equals the request and which hold a compiler binary under
/// either arch dir. The same installers also shipped `composerxe-<version>`
/// roots, probed as a fallback within the era.
fn find_composer_xe(scan_root: &Path, version: &str, exe: &str) -> Option<PathBuf> {
    for intel in intel_dirs(scan_root) {
        for dir in prefixed_dirs(&intel, "composer_xe_") {
            let Some(name) = dir_name(&dir) else { continue };
            if extract_dir_version(&name).as_deref() == Some(version) && has_arch_binary(&dir, exe)
            {
                return Some(dir);
            }
        }
    }
    for intel in intel_dirs(scan_root) {
        for dir in prefixed_dirs(&intel, "composerxe-") {
            let Some(name) = dir_name(&dir) else { continue };
            let matches = BARE_VERSION
                .captures(&name)
                .is_some_and(|caps| &caps[1] == version);
            if matches && has_arch_binary(&dir, exe) {
                return Some(dir);
            }
        }
    }
    None
}

/// 2017-era search: `compilers_and_libraries_<year>.<ver>` directories.
/// Accepts an exact version match or one containing the integer-truncated
/// request (`2017` finds `2017.4`); the usable root is the `linux/`
/// subdirectory.
fn find_compilers_and_libraries(scan_root: &Path, version: &str, exe: &str) -> Option<PathBuf> {
    let truncated = integer_part(version);
    for intel in intel_dirs(scan_root) {
        for dir in prefixed_dirs(&intel, "compilers_and_libraries_") {
            let Some(name) = dir_name(&dir) else { continue };
            let Some(cur) = extract_dir_version(&name) else { continue };
            let matches = cur == version
                || truncated.as_deref().is_some_and(|t| cur.contains(t));
            if matches {
                let root = dir.join("linux");
                if has_arch_binary(&root, exe) {
                    return Some(root);
                }
            }
        }
    }
    None
}

fn integer_part(version: &str) -> Option<String> {
    let first = version.split('.').next()?;
    first.parse::<u64>().ok().map(|_| first.to_string())
}

/// A compiler binary under either arch-specific bin dir. Which arch the
/// caller wants is checked later, against the detected layout.
fn has_arch_binary(top: &Path, exe: &str) -> bool {
    top.join("bin").join("ia32").join(exe).is_file()
        || top.join("bin").join("intel64").join(exe).is_file()
}

fn detect_layout(
    host: &HostContext,
    top: &Path,
    version: &str,
    abi: Abi,
) -> Result<ToolchainLayout, ToolchainError> {
    let arch = abi.arch_dir();
    // One existence check decides between the split v11+ convention and
    // the flat legacy one.
    let (bin_dir, lib_dir, include_dir) = if top.join("bin").join(arch).is_dir() {
        (
            PathBuf::from("bin").join(arch),
            PathBuf::from("compiler").join("lib").join(arch),
            PathBuf::from("compiler").join("include"),
        )
    } else {
        (
            PathBuf::from("bin"),
            PathBuf::from("lib"),
            PathBuf::from("include"),
        )
    };

    // Never hand back a path set whose compiler isn't actually there.
    let compiler = top.join(&bin_dir).join(host.compiler_exe());
    if !compiler.is_file() {
        return Err(ToolchainError::InstallDirMissing {
            version: version.to_string(),
            abi,
            searched: vec![top.join(&bin_dir)],
        });
    }

    let mkl = top.join("mkl").join("bin").join(arch).is_dir().then(|| MklPaths {
        bin_dir: PathBuf::from("mkl").join("bin").join(arch),
        lib_dir: PathBuf::from("mkl").join("lib").join(arch),
        include_dir: PathBuf::from("mkl").join("include"),
    });

    Ok(ToolchainLayout {
        top_dir: top.to_path_buf(),
        bin_dir,
        lib_dir,
        include_dir,
        mkl,
        redist_dir: redist_dir(host.os(), top, arch),
    })
}

/// Runtime shared-library directory for executables built with the
/// toolchain, distinct from the development-time library dir. Newer
/// installers suffix the arch directory with a platform tag.
fn redist_dir(os: OsFamily, top: &Path, arch: &str) -> PathBuf {
    match os {
        OsFamily::Windows => {
            let base = top.join("redist").join(arch);
            let base = if base.is_dir() {
                base
            } else {
                top.join("redist").join(format!("{arch}_win"))
            };
            base.join("compiler")
        }
        _ => {
            let base = top.join("lib").join(arch);
            if base.is_dir() {
                base
            } else {
                top.join("lib").join(format!("{arch}_lin"))
            }
        }
    }
}
