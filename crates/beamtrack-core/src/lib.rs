//! Backend dispatch and numeric operations for particle tracking.
//!
//! This crate keeps two interchangeable implementations of the numeric
//! operations used while tracking a particle bunch: a host (CPU) set working
//! on `nalgebra` vectors and, with the `cuda` feature, a device (GPU) set
//! working on device buffers. Callers resolve operations by name through a
//! registry whose active view is switched between the two sets atomically.
//!
//! # Key Concepts
//!
//! - **Static sets**: per-backend `name -> implementation` maps
//! - **Active view**: the set callers currently resolve through
//! - **Residency**: whether an array lives in host or device memory
//!
//! # Modules
//!
//! - [`compute`]: Arrays, kernel signatures and the CPU/GPU operation sets
//! - [`config`]: Registry configuration
//! - [`dispatch`]: The registry, scoped switching and the global instance
//! - [`error`]: Error types for dispatch and computation
//! - [`types`]: Backend and residency identifiers
//!
//! # Example
//! ```
//! use beamtrack_core::prelude::*;
//!
//! let reg = default_registry(&DispatchConfig::default());
//! let x = Array::from(vec![1.0, 2.0, 3.0]);
//! assert_eq!(reg.reduce("mean", &x).unwrap(), 2.0);
//! ```

pub mod compute;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use error::{ComputeError, ComputeResult, DispatchError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use beamtrack_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::compute::{Array, Kernel, Signature};
    pub use crate::config::{DispatchConfig, DispatchConfigBuilder};
    pub use crate::dispatch::{
        default_registry, registry, ActiveView, BackendGuard, DispatchRegistry,
    };
    pub use crate::error::{ComputeError, ComputeResult, DispatchError, Result};
    pub use crate::types::{Backend, Residency};

    #[cfg(feature = "cuda")]
    pub use crate::compute::gpu::{DeviceArray, GpuContext};

    pub use nalgebra::DVector;
}
