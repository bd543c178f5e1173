//! Target ABI variants and alias normalization.

use crate::error::ToolchainError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The instruction-set/calling-convention variant a toolchain installation
/// is built for.
///
/// Callers hand in whatever alias their build system uses; everything folds
/// into these two canonical values, and every later stage (catalog lookup,
/// registry scoping, layout detection) works from the same enum, so an
/// alias accepted in one stage cannot be rejected by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Abi {
    /// 32-bit x86.
    Ia32,
    /// 64-bit x86 (also known as amd64 or em64t).
    X86_64,
}

impl Abi {
    /// Architecture directory name used inside v11+ installations
    /// (`bin/<arch_dir>`, `mkl/lib/<arch_dir>`, ...).
    pub fn arch_dir(&self) -> &'static str {
        match self {
            Abi::Ia32 => "ia32",
            Abi::X86_64 => "intel64",
        }
    }

    /// Architecture key segment in the Windows compiler registry tree.
    pub fn registry_arch(&self) -> &'static str {
        match self {
            Abi::Ia32 => "IA32",
            Abi::X86_64 => "EM64T_NATIVE",
        }
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Abi::Ia32 => write!(f, "ia32"),
            Abi::X86_64 => write!(f, "x86_64"),
        }
    }
}

impl FromStr for Abi {
    type Err = ToolchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ia32" | "x86" | "i386" => Ok(Abi::Ia32),
            "x86_64" | "amd64" | "em64t" => Ok(Abi::X86_64),
            _ => Err(ToolchainError::UnknownAbi(s.to_string())),
        }
    }
}
