//! Error types for toolchain discovery and resolution.

use crate::abi::Abi;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while locating a compiler installation.
///
/// Discovery-stage conditions (an empty catalog, a missing registry root)
/// are not errors at all: the catalog simply contributes nothing and the
/// pipeline declines softly when the caller pinned nothing. These variants
/// cover the hard cases, where something the caller asked for could not be
/// honored; their messages carry the version, ABI and searched locations so
/// a misconfigured installation can be diagnosed without re-running in
/// verbose mode.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// An expected registry key or value was absent during lookup.
    #[error("registry entry `{path}` not found for compiler version {version} (abi {abi})")]
    RegistryEntryMissing {
        path: String,
        version: String,
        abi: Abi,
    },

    /// No installation root could be located for the requested
    /// version/ABI, or a located root lacks the compiler binary.
    #[error("can't find an Intel Fortran {version} installation for abi {abi} (searched: {})", join_paths(.searched))]
    InstallDirMissing {
        version: String,
        abi: Abi,
        searched: Vec<PathBuf>,
    },

    /// The host has no way to query a registry at all. Distinguished from
    /// [`ToolchainError::RegistryEntryMissing`] because the platform, not
    /// the data, is unusable.
    #[error("no registry access available on this host")]
    RegistryUnavailable,

    /// An ABI alias outside the recognized set.
    #[error("unrecognized abi '{0}' (expected one of: ia32, x86, i386, x86_64, amd64, em64t)")]
    UnknownAbi(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from the raw registry capability.
///
/// Key-not-found and value-not-found are ordinary outcomes the callers map
/// per stage (the catalog treats a missing root as zero entries, the
/// resolver as a hard failure); `Access` is the backend itself failing.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry key not found: {0}")]
    KeyNotFound(String),

    #[error("registry value not found: {0}")]
    ValueNotFound(String),

    #[error("registry access failed: {0}")]
    Access(#[from] std::io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_dir_missing_message_carries_context() {
        let err = ToolchainError::InstallDirMissing {
            version: "99.9".to_string(),
            abi: Abi::X86_64,
            searched: vec![PathBuf::from("/opt/intel*/composer_xe_*")],
        };
        let msg = err.to_string();
        assert!(msg.contains("99.9"));
        assert!(msg.contains("x86_64"));
        assert!(msg.contains("/opt/intel*/composer_xe_*"));
    }

    #[test]
    fn test_registry_entry_missing_message() {
        let err = ToolchainError::RegistryEntryMissing {
            path: r"Software\Wow6432Node\Intel\Compilers\Fortran\19.0\IA32\ProductDir".to_string(),
            version: "19.0".to_string(),
            abi: Abi::Ia32,
        };
        assert!(err.to_string().contains(r"\19.0\IA32\ProductDir"));
    }
}
