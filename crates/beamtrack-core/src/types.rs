//! Shared identifiers for backends and memory residency.

use crate::error::{DispatchError, Result};
use std::fmt;
use std::str::FromStr;

/// One of the two interchangeable implementation sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Backend {
    /// Host-memory implementations.
    Cpu,
    /// Device-memory implementations.
    Gpu,
}

impl Backend {
    /// Both backends, in registry slot order.
    pub const ALL: [Backend; 2] = [Backend::Cpu, Backend::Gpu];

    /// Slot index of this backend inside a registry.
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Gpu => 1,
        }
    }

    /// The backend that is not `self`.
    pub const fn other(self) -> Self {
        match self {
            Self::Cpu => Self::Gpu,
            Self::Gpu => Self::Cpu,
        }
    }

    /// Memory residency the backend's operations expect.
    pub const fn residency(self) -> Residency {
        match self {
            Self::Cpu => Residency::Host,
            Self::Gpu => Residency::Device,
        }
    }

    /// Lowercase identifier used in configuration and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" | "host" => Ok(Self::Cpu),
            "gpu" | "cuda" | "device" => Ok(Self::Gpu),
            _ => Err(DispatchError::invalid_backend(s)),
        }
    }
}

/// Where a buffer's data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Residency {
    /// Directly addressable by the CPU.
    Host,
    /// Resident on an accelerator; not dereferenceable from host code.
    Device,
}

impl fmt::Display for Residency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Device => f.write_str("device"),
        }
    }
}
