//! Host identification for the discovery pipeline.
//!
//! Everything the pipeline needs to know about the machine it runs on is
//! captured once in an immutable [`HostContext`] and passed down, instead
//! of being read ad hoc from process globals. Tests assemble synthetic
//! contexts (a Linux scan root inside a tempdir, an in-memory registry) and
//! exercise every platform path on any build host.

use crate::abi::Abi;
use crate::registry::{self, RegistryAccess};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Operating-system family relevant to discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// Registry-based discovery, `ifort.exe`.
    Windows,
    /// `/opt/intel*` directory discovery, `ifort`.
    Linux,
    /// No known discovery source; only an explicit top dir can resolve.
    Other,
}

/// Immutable snapshot of the host facts discovery depends on.
#[derive(Clone)]
pub struct HostContext {
    os: OsFamily,
    wide: bool,
    registry: Option<Arc<dyn RegistryAccess>>,
    scan_root: PathBuf,
}

impl HostContext {
    /// Identify the current host: target OS family, 64-bit check, live
    /// registry capability where the build has one.
    pub fn detect() -> Self {
        let os = if cfg!(windows) {
            OsFamily::Windows
        } else if cfg!(target_os = "linux") {
            OsFamily::Linux
        } else {
            OsFamily::Other
        };
        let wide = match os {
            // A 32-bit process on a 64-bit Windows sees the real
            // architecture only through PROCESSOR_ARCHITEW6432.
            OsFamily::Windows => {
                env_is("PROCESSOR_ARCHITECTURE", "AMD64")
                    || env_is("PROCESSOR_ARCHITEW6432", "AMD64")
            }
            _ => cfg!(target_pointer_width = "64"),
        };
        let mut ctx = Self::new(os, wide);
        ctx.registry = registry::host_registry();
        ctx
    }

    /// A bare context with no registry capability and the default scan
    /// root. Intended for tests and for callers composing their own
    /// capabilities.
    pub fn new(os: OsFamily, wide: bool) -> Self {
        Self {
            os,
            wide,
            registry: None,
            scan_root: PathBuf::from("/opt"),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn RegistryAccess>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Override the root scanned for `intel*` installation directories.
    pub fn with_scan_root(mut self, scan_root: impl Into<PathBuf>) -> Self {
        self.scan_root = scan_root.into();
        self
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    pub fn registry(&self) -> Option<&dyn RegistryAccess> {
        self.registry.as_deref()
    }

    /// Shared handle to the registry capability, for components that
    /// outlive a borrow of the context.
    pub fn registry_handle(&self) -> Option<Arc<dyn RegistryAccess>> {
        self.registry.clone()
    }

    pub fn scan_root(&self) -> &Path {
        &self.scan_root
    }

    /// File name of the compiler executable on this host.
    pub fn compiler_exe(&self) -> &'static str {
        match self.os {
            OsFamily::Windows => "ifort.exe",
            _ => crate::COMPILER_BINARY,
        }
    }

    /// ABI assumed when the caller does not specify one: 64-bit on Linux
    /// and on 64-bit Windows, 32-bit anywhere else.
    pub fn default_abi(&self) -> Abi {
        match self.os {
            OsFamily::Windows if self.wide => Abi::X86_64,
            OsFamily::Linux => Abi::X86_64,
            _ => Abi::Ia32,
        }
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("os", &self.os)
            .field("wide", &self.wide)
            .field("registry", &self.registry.is_some())
            .field("scan_root", &self.scan_root)
            .finish()
    }
}

fn env_is(name: &str, expected: &str) -> bool {
    std::env::var(name).map(|v| v == expected).unwrap_or(false)
}
