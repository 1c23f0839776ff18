//! Error types for the native bridge.
//!
//! Validation errors are always raised before a library is loaded or a
//! record is built, so a failed call never reaches native code.

use crate::attribute::Attribute;
use beamtrack_core::types::Residency;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating, packing or invoking a tracking call.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A required attribute was not supplied.
    #[error("Missing attribute '{attribute}'")]
    MissingAttribute {
        /// The absent attribute
        attribute: Attribute,
    },

    /// A name outside the attribute vocabulary was supplied.
    #[error("Unknown attribute '{name}': expected one of x, xp, y, yp, z, dp, q0, mass0, beta0, gamma0, p0c")]
    UnknownAttribute {
        /// The rejected name
        name: String,
    },

    /// The same attribute was supplied twice.
    #[error("Attribute '{attribute}' supplied more than once")]
    DuplicateAttribute {
        /// The repeated attribute
        attribute: Attribute,
    },

    /// A buffer's length disagrees with the particle count.
    #[error("Length mismatch for '{attribute}': expected {expected} particles, got {actual}")]
    LengthMismatch {
        /// The offending attribute
        attribute: Attribute,
        /// Particle count of the call
        expected: usize,
        /// Length of the buffer
        actual: usize,
    },

    /// Buffers of one call live in different memories.
    #[error("Mixed residency: '{attribute}' is {actual} memory, other attributes are {expected}")]
    MixedResidency {
        /// First attribute whose residency differs
        attribute: Attribute,
        /// Residency of the preceding attributes
        expected: Residency,
        /// Residency of the offending attribute
        actual: Residency,
    },

    /// The particle count does not fit the record's 32-bit count field.
    #[error("Particle count {count} exceeds the native limit of {}", i32::MAX)]
    ParticleCountOverflow {
        /// Requested particle count
        count: usize,
    },

    /// A strided host view does not fit its backing slice.
    #[error("Invalid layout: {reason}")]
    InvalidLayout {
        /// Description of the problem
        reason: String,
    },

    /// The tracking library could not be loaded.
    #[error("Failed to load tracking library '{}': {source}", .path.display())]
    LibraryLoad {
        /// Path given by the caller
        path: PathBuf,
        /// Loader error
        #[source]
        source: libloading::Error,
    },

    /// The entry point could not be resolved or the native call failed.
    #[error("Native call '{symbol}' failed: {reason}")]
    NativeCall {
        /// Entry point symbol
        symbol: String,
        /// Failure description
        reason: String,
    },

    /// Bridge configuration is incomplete or invalid.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of the problem
        reason: String,
    },
}

impl BridgeError {
    /// Create a MissingAttribute error.
    pub fn missing_attribute(attribute: Attribute) -> Self {
        Self::MissingAttribute { attribute }
    }

    /// Create an UnknownAttribute error.
    pub fn unknown_attribute<S: Into<String>>(name: S) -> Self {
        Self::UnknownAttribute { name: name.into() }
    }

    /// Create a DuplicateAttribute error.
    pub fn duplicate_attribute(attribute: Attribute) -> Self {
        Self::DuplicateAttribute { attribute }
    }

    /// Create a LengthMismatch error.
    pub fn length_mismatch(attribute: Attribute, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            attribute,
            expected,
            actual,
        }
    }

    /// Create a MixedResidency error.
    pub fn mixed_residency(attribute: Attribute, expected: Residency, actual: Residency) -> Self {
        Self::MixedResidency {
            attribute,
            expected,
            actual,
        }
    }

    /// Create an InvalidLayout error.
    pub fn invalid_layout<S: Into<String>>(reason: S) -> Self {
        Self::InvalidLayout {
            reason: reason.into(),
        }
    }

    /// Create a LibraryLoad error.
    pub fn library_load<P: Into<PathBuf>>(path: P, source: libloading::Error) -> Self {
        Self::LibraryLoad {
            path: path.into(),
            source,
        }
    }

    /// Create a NativeCall error.
    pub fn native_call<S: Into<String>, E: std::fmt::Display>(symbol: S, reason: E) -> Self {
        Self::NativeCall {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a Config error.
    pub fn config<S: Into<String>>(reason: S) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised before any library is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingAttribute { .. }
                | Self::UnknownAttribute { .. }
                | Self::DuplicateAttribute { .. }
                | Self::LengthMismatch { .. }
                | Self::MixedResidency { .. }
                | Self::ParticleCountOverflow { .. }
                | Self::InvalidLayout { .. }
        )
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BridgeError::missing_attribute(Attribute::P0c);
        assert_eq!(err.to_string(), "Missing attribute 'p0c'");
        assert!(err.is_validation());

        let err = BridgeError::length_mismatch(Attribute::X, 11, 10);
        assert_eq!(
            err.to_string(),
            "Length mismatch for 'x': expected 11 particles, got 10"
        );

        let err = BridgeError::mixed_residency(Attribute::Y, Residency::Host, Residency::Device);
        assert_eq!(
            err.to_string(),
            "Mixed residency: 'y' is device memory, other attributes are host"
        );
    }

    #[test]
    fn test_resource_errors_are_not_validation() {
        let err = BridgeError::native_call("run", "symbol not found");
        assert!(!err.is_validation());
        assert!(err.to_string().contains("symbol not found"));
        assert!(!BridgeError::config("no library path").is_validation());
    }
}
