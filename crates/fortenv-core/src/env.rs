//! Environment mutations derived from a resolved layout.
//!
//! Composition is a pure function from layout to an ordered mutation
//! sequence; actually touching an environment map is a separate, trivial
//! apply step owned by the caller. That keeps the interesting part (which
//! paths, onto which variables, in which order) testable without any
//! process state.

use crate::host::OsFamily;
use crate::layout::ToolchainLayout;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// One append of a path fragment onto a named environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvMutation {
    pub variable: &'static str,
    pub value: PathBuf,
}

impl EnvMutation {
    fn new(variable: &'static str, value: PathBuf) -> Self {
        Self { variable, value }
    }
}

/// Compose the ordered mutation sequence for a resolved layout.
///
/// The base toolchain dirs come first and keep precedence over the MKL
/// dirs appended after them; callers that apply prepend-per-mutation
/// semantics instead of appending must preserve that relative precedence.
/// Windows additionally routes the redistributable runtime directory onto
/// `PATH`; Linux routes the library directories onto `LD_LIBRARY_PATH`.
/// Never fails -- a layout without MKL simply yields fewer mutations.
pub fn compose(layout: &ToolchainLayout, os: OsFamily) -> Vec<EnvMutation> {
    let top = &layout.top_dir;
    let mut out = vec![
        EnvMutation::new("INCLUDE", top.join(&layout.include_dir)),
        EnvMutation::new("LIB", top.join(&layout.lib_dir)),
        EnvMutation::new("PATH", top.join(&layout.bin_dir)),
    ];
    if let Some(mkl) = &layout.mkl {
        out.push(EnvMutation::new("PATH", top.join(&mkl.bin_dir)));
        out.push(EnvMutation::new("INCLUDE", top.join(&mkl.include_dir)));
        out.push(EnvMutation::new("LIB", top.join(&mkl.lib_dir)));
    }
    match os {
        OsFamily::Windows => {
            out.push(EnvMutation::new("PATH", layout.redist_dir.clone()));
        }
        OsFamily::Linux => {
            out.push(EnvMutation::new("LD_LIBRARY_PATH", top.join(&layout.lib_dir)));
            if let Some(mkl) = &layout.mkl {
                out.push(EnvMutation::new("LD_LIBRARY_PATH", top.join(&mkl.lib_dir)));
            }
        }
        OsFamily::Other => {}
    }
    out
}

/// Apply mutations onto a caller-owned environment map, in sequence.
///
/// Each fragment is appended to the variable's path-list value with the
/// host's separator; fragments already present are left where they are
/// rather than added again.
pub fn apply(env: &mut HashMap<String, String>, mutations: &[EnvMutation]) {
    let sep = if cfg!(windows) { ';' } else { ':' };
    for mutation in mutations {
        let fragment = mutation.value.to_string_lossy();
        match env.get_mut(mutation.variable) {
            Some(current) if !current.is_empty() => {
                if !current.split(sep).any(|part| part == fragment) {
                    current.push(sep);
                    current.push_str(&fragment);
                }
            }
            _ => {
                env.insert(mutation.variable.to_string(), fragment.into_owned());
            }
        }
    }
}

/// True when an `ifort` binary is reachable through the `PATH` value of
/// `env`.
///
/// A cheap probe, independent of the resolution pipeline: host build
/// setups call this to decide whether to enable the toolchain at all.
pub fn compiler_in_path(env: &HashMap<String, String>) -> bool {
    let Some(path) = env.get("PATH") else {
        return false;
    };
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    which::which_in(crate::COMPILER_BINARY, Some(path), cwd).is_ok()
}
