//! Windows registry capability.
//!
//! Discovery needs exactly two things from a registry: enumerate the
//! immediate subkeys of a compiler tree root, and read a string value under
//! a key. The [`RegistryAccess`] trait carries both, keeps the rest of the
//! crate testable on any platform, and makes "this host cannot query a
//! registry" (`None` capability) distinguishable from "key not found"
//! (a [`RegistryError`] from a live backend).

use crate::error::RegistryError;
use std::sync::Arc;

/// Read access to a registry tree. Paths are relative to
/// `HKEY_LOCAL_MACHINE` and backslash-separated.
pub trait RegistryAccess: Send + Sync {
    /// Names of the immediate subkeys of `path`.
    fn subkeys(&self, path: &str) -> Result<Vec<String>, RegistryError>;

    /// A string value stored under `path`.
    fn read_value(&self, path: &str, name: &str) -> Result<String, RegistryError>;
}

/// Registry tree root for compiler product years below 2023.
pub const LEGACY_ROOT: &str = r"Software\Wow6432Node\Intel\Compilers\Fortran";

/// Registry tree root for compiler product years 2023 and later. The tree
/// moved when the product line was renamed.
pub const MODERN_ROOT: &str = r"Software\Wow6432Node\Intel\Compilers\1AFortran";

/// Tree root a given version's key lives under.
///
/// Decided by the leading version component; a version whose leading
/// component is not numeric is looked up under the legacy root.
pub fn version_root(version: &str) -> &'static str {
    let year = version.split('.').next().and_then(|s| s.parse::<u32>().ok());
    match year {
        Some(y) if y >= 2023 => MODERN_ROOT,
        _ => LEGACY_ROOT,
    }
}

/// The host's registry, if this build has one.
pub fn host_registry() -> Option<Arc<dyn RegistryAccess>> {
    #[cfg(windows)]
    {
        Some(Arc::new(WindowsRegistry))
    }
    #[cfg(not(windows))]
    {
        None
    }
}

/// Live `HKEY_LOCAL_MACHINE` access through the winreg crate.
#[cfg(windows)]
pub struct WindowsRegistry;

#[cfg(windows)]
impl RegistryAccess for WindowsRegistry {
    fn subkeys(&self, path: &str) -> Result<Vec<String>, RegistryError> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let key = hklm.open_subkey(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RegistryError::KeyNotFound(path.to_string())
            } else {
                RegistryError::Access(err)
            }
        })?;
        let mut names = Vec::new();
        for name in key.enum_keys() {
            names.push(name.map_err(RegistryError::Access)?);
        }
        Ok(names)
    }

    fn read_value(&self, path: &str, name: &str) -> Result<String, RegistryError> {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;

        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let key = hklm.open_subkey(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RegistryError::KeyNotFound(path.to_string())
            } else {
                RegistryError::Access(err)
            }
        })?;
        key.get_value::<String, _>(name).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                RegistryError::ValueNotFound(format!(r"{path}\{name}"))
            } else {
                RegistryError::Access(err)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_root_year_boundary() {
        assert_eq!(version_root("19.0"), LEGACY_ROOT);
        assert_eq!(version_root("2021.3"), LEGACY_ROOT);
        assert_eq!(version_root("2022.9"), LEGACY_ROOT);
        assert_eq!(version_root("2023.0"), MODERN_ROOT);
        assert_eq!(version_root("2024.1"), MODERN_ROOT);
    }

    #[test]
    fn test_version_root_tolerates_odd_versions() {
        assert_eq!(version_root(""), LEGACY_ROOT);
        assert_eq!(version_root("composer"), LEGACY_ROOT);
    }
}
