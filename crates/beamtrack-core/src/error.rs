//! Error types for backend dispatch and numeric operations.
//!
//! Dispatch failures (unknown operation, operation only available on the
//! inactive backend) are kept apart from failures raised inside an
//! operation, so callers can tell a routing problem from a numeric one.

use crate::compute::kernel::Signature;
use crate::types::{Backend, Residency};
use thiserror::Error;

/// Errors raised by operation implementations.
#[derive(Debug, Clone, Error)]
pub enum ComputeError {
    /// An implementation received an array that lives in the wrong memory.
    ///
    /// Host implementations never read device arrays and vice versa.
    #[error("Residency mismatch: expected {expected} array, got {actual}")]
    ResidencyMismatch {
        /// Residency the implementation works on
        expected: Residency,
        /// Residency of the array that was passed
        actual: Residency,
    },

    /// Arrays passed together have different lengths.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the first array
        expected: usize,
        /// Length of the offending array
        actual: usize,
    },

    /// A reduction was asked to summarize zero elements.
    #[error("Empty input: {operation} requires at least one element")]
    EmptyInput {
        /// Name of the reduction
        operation: String,
    },

    /// The resolved kernel was called through the wrong signature.
    #[error("Signature mismatch: expected {expected}, got {actual}")]
    SignatureMismatch {
        /// Signature the caller used
        expected: Signature,
        /// Signature of the registered kernel
        actual: Signature,
    },

    /// A permutation index points outside the array.
    #[error("Invalid permutation: {reason}")]
    InvalidPermutation {
        /// Description of the offending index
        reason: String,
    },

    /// The device runtime reported a failure.
    #[error("Device error: {reason}")]
    Device {
        /// Message from the device runtime
        reason: String,
    },
}

impl ComputeError {
    /// Create a ResidencyMismatch error.
    pub fn residency_mismatch(expected: Residency, actual: Residency) -> Self {
        Self::ResidencyMismatch { expected, actual }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create an EmptyInput error for the named operation.
    pub fn empty_input<S: Into<String>>(operation: S) -> Self {
        Self::EmptyInput {
            operation: operation.into(),
        }
    }

    /// Create a SignatureMismatch error.
    pub fn signature_mismatch(expected: Signature, actual: Signature) -> Self {
        Self::SignatureMismatch { expected, actual }
    }

    /// Create an InvalidPermutation error.
    pub fn invalid_permutation<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPermutation {
            reason: reason.into(),
        }
    }

    /// Wrap a device runtime error.
    pub fn device<E: std::fmt::Display>(err: E) -> Self {
        Self::Device {
            reason: err.to_string(),
        }
    }
}

/// Errors raised while registering, switching or resolving operations.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// Neither backend defines the operation.
    #[error("Unknown operation '{operation}': not registered for any backend")]
    UnknownOperation {
        /// Requested operation name
        operation: String,
    },

    /// The operation exists, but only for the backend that is not active.
    #[error("Operation '{operation}' is not available on the {active} backend (only on {available})")]
    BackendMismatch {
        /// Requested operation name
        operation: String,
        /// Backend currently active
        active: Backend,
        /// Backend that does define the operation
        available: Backend,
    },

    /// Strict registration refused to overwrite an existing entry.
    #[error("Operation '{operation}' is already defined for the {backend} backend")]
    DuplicateDefinition {
        /// Backend whose set already holds the name
        backend: Backend,
        /// Operation name
        operation: String,
    },

    /// A backend identifier could not be parsed.
    #[error("Invalid backend '{value}': expected 'cpu' or 'gpu'")]
    InvalidBackend {
        /// The rejected identifier
        value: String,
    },

    /// The resolved operation failed.
    #[error("Operation '{operation}' failed: {source}")]
    Compute {
        /// Operation name
        operation: String,
        /// Underlying failure
        #[source]
        source: ComputeError,
    },
}

impl DispatchError {
    /// Create an UnknownOperation error.
    pub fn unknown_operation<S: Into<String>>(operation: S) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    /// Create a BackendMismatch error.
    pub fn backend_mismatch<S: Into<String>>(
        operation: S,
        active: Backend,
        available: Backend,
    ) -> Self {
        Self::BackendMismatch {
            operation: operation.into(),
            active,
            available,
        }
    }

    /// Create a DuplicateDefinition error.
    pub fn duplicate_definition<S: Into<String>>(backend: Backend, operation: S) -> Self {
        Self::DuplicateDefinition {
            backend,
            operation: operation.into(),
        }
    }

    /// Create an InvalidBackend error.
    pub fn invalid_backend<S: Into<String>>(value: S) -> Self {
        Self::InvalidBackend {
            value: value.into(),
        }
    }

    /// Attach an operation name to a compute failure.
    pub fn compute<S: Into<String>>(operation: S, source: ComputeError) -> Self {
        Self::Compute {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Result type alias for operation implementations.
pub type ComputeResult<T> = std::result::Result<T, ComputeError>;
