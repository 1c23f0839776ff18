//! CPU/GPU backend dispatch and a native tracking bridge for beam dynamics.
//!
//! This crate re-exports the two halves of the library:
//!
//! - [`beamtrack_core`]: the dispatch registry and the CPU/GPU numeric
//!   operation sets
//! - [`beamtrack_native`]: attribute validation, the fixed-layout particle record and
//!   the runtime-loaded tracking entry point
//!
//! # Example
//! ```
//! use beamtrack::prelude::*;
//!
//! let mut bunch = ParticleColumns::from_fn(4, |attr, i| match attr {
//!     Attribute::X => i as f64 * 1e-3,
//!     _ => 0.0,
//! });
//! let x = Array::from(bunch.column(Attribute::X).clone());
//! let reg = default_registry(&DispatchConfig::default());
//! assert!((reg.reduce("mean", &x).unwrap() - 1.5e-3).abs() < 1e-15);
//! assert_eq!(bunch.attribute_set().validate(4).unwrap(), Residency::Host);
//! ```

pub use beamtrack_core;
pub use beamtrack_native;

pub use nalgebra;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use beamtrack_core::prelude::*;
    pub use beamtrack_native::prelude::{
        pack_and_invoke, Attribute, AttributeBuffer, AttributeSet, BridgeConfig, BridgeError,
        DeviceBuffer, LibraryCache, NativeBridge, ParticleColumns, ParticleData, StridedHost,
        ATTRIBUTE_COUNT, DEVICE_TAG, HOST_TAG,
    };
}
