//! Discovery and environment resolution for Intel Fortran compiler
//! installations.
//!
//! Locating an installed `ifort` is the irregular part of driving it:
//! three generations of on-disk naming on Linux (`composer_xe_*`,
//! `composerxe-*`, `compilers_and_libraries_*`), two registry tree roots
//! on Windows, and per-era internal directory layouts. This crate models
//! that as a four-stage pipeline:
//!
//! ```text
//! catalog (what is installed on this host)
//!     -> select (which version the caller meant)
//!         -> layout (where that installation keeps its pieces)
//!             -> env (ordered PATH/INCLUDE/LIB mutations)
//! ```
//!
//! Each stage consumes the previous stage's output; a stage can end the
//! run with a typed [`ToolchainError`], and a host with nothing installed
//! ends it softly instead ([`generate`] returns `Ok(None)`) as long as the
//! caller pinned nothing. Host facts (OS family, registry capability,
//! scan root) enter once through [`HostContext`], which is what makes the
//! whole pipeline drivable from tests on any platform.
//!
//! Resolution is synchronous and per-call: blocking filesystem and
//! registry reads, no caching, no network, no state beyond the caller's
//! own environment map.

pub mod abi;
pub mod catalog;
pub mod configure;
pub mod env;
pub mod error;
pub mod host;
pub mod layout;
pub mod registry;
pub mod select;

pub use abi::Abi;
pub use catalog::{
    catalog_for, list_versions, FilesystemCatalog, InstallOrigin, InstallationCatalog,
    InstalledVersion, RegistryCatalog,
};
pub use configure::{generate, Activation, ToolchainRequest};
pub use env::{apply, compiler_in_path, compose, EnvMutation};
pub use error::{RegistryError, ToolchainError};
pub use host::{HostContext, OsFamily};
pub use layout::{resolve, MklPaths, ToolchainLayout};
pub use registry::RegistryAccess;

/// File name of the compiler this crate locates. Windows hosts probe for
/// the `.exe`-suffixed form.
pub const COMPILER_BINARY: &str = "ifort";
