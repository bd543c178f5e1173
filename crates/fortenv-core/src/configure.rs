//! The resolution pipeline: catalog, selection, layout, environment.

use crate::abi::Abi;
use crate::catalog;
use crate::env::{self, EnvMutation};
use crate::error::ToolchainError;
use crate::host::HostContext;
use crate::layout;
use crate::select;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Caller intent for one resolution run.
#[derive(Debug, Clone, Default)]
pub struct ToolchainRequest {
    /// Compiler version, possibly partial: `"19"`, `"19.0"`, `"2021.3"`.
    /// Latest installed when unset.
    pub version: Option<String>,
    /// Target ABI alias (`ia32`, `x86`, `i386`, `x86_64`, `amd64`,
    /// `em64t`). Host default when unset.
    pub abi: Option<String>,
    /// Installation top directory, bypassing discovery when it exists.
    pub top_dir: Option<PathBuf>,
    /// Report catalog contents, the selected version and the resolved top
    /// dir at `info` level (always available at `debug`).
    pub verbose: bool,
}

/// Everything a caller needs to configure a build environment for the
/// resolved toolchain: the mutation sequence plus the two informational
/// directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    /// The selected version, when one was selected (an explicit top dir
    /// can resolve without one).
    pub version: Option<String>,
    pub abi: Abi,
    pub top_dir: PathBuf,
    /// Runtime shared-library directory, for callers that stage
    /// redistributables alongside their build products.
    pub redist_dir: PathBuf,
    pub mutations: Vec<EnvMutation>,
}

impl Activation {
    /// Apply the mutation sequence onto a caller-owned environment map.
    pub fn apply(&self, env: &mut HashMap<String, String>) {
        env::apply(env, &self.mutations);
    }
}

/// Run the full pipeline against `host`.
///
/// Returns `Ok(None)` -- after logging a diagnostic -- when no installation
/// is visible and the caller pinned nothing, so build setups can probe
/// opportunistically without treating "not installed" as a failure.
/// Anything the caller did pin (version, ABI, top dir) that cannot be
/// honored is a typed hard error, never a silent skip.
pub fn generate(
    host: &HostContext,
    request: &ToolchainRequest,
) -> Result<Option<Activation>, ToolchainError> {
    let versions = catalog::list_versions(host);
    if versions.is_empty() && request.version.is_none() && request.top_dir.is_none() {
        info!("Intel Fortran compiler not configured: no installation found");
        return Ok(None);
    }

    let listed: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
    if request.verbose {
        info!("installed Intel Fortran versions: {listed:?}");
    } else {
        debug!("installed Intel Fortran versions: {listed:?}");
    }

    let selected = select::select(&versions, request.version.as_deref());
    if let Some(version) = &selected {
        if request.verbose {
            info!("selected Intel Fortran version {version}");
        } else {
            debug!("selected Intel Fortran version {version}");
        }
    }

    let abi = match &request.abi {
        Some(alias) => alias.parse::<Abi>()?,
        None => host.default_abi(),
    };

    let layout = layout::resolve(host, selected.as_deref(), abi, request.top_dir.as_deref())?;
    if request.verbose {
        info!("Intel Fortran compiler top: {}", layout.top_dir.display());
    } else {
        debug!("Intel Fortran compiler top: {}", layout.top_dir.display());
    }

    let mutations = env::compose(&layout, host.os());
    Ok(Some(Activation {
        version: selected,
        abi,
        top_dir: layout.top_dir,
        redist_dir: layout.redist_dir,
        mutations,
    }))
}
