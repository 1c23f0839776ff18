//! Bridge from particle attribute buffers to a native tracking library.
//!
//! A tracking library exports one entry point, `run`, taking a fixed-layout
//! record of eleven attribute arrays and a tag byte saying whether those
//! arrays live in host or device memory. This crate validates name-keyed
//! buffers against the attribute vocabulary, packs them into that record
//! in the fixed order, and calls the entry point of a library loaded once
//! per path.
//!
//! # Modules
//!
//! - [`attribute`]: The closed attribute vocabulary and its record order
//! - [`buffer`]: Host, staged host and device buffers
//! - [`set`]: Attribute sets and their validation
//! - [`columns`]: Owned host columns for a particle bunch
//! - [`record`]: The `#[repr(C)]` record and tag bytes
//! - [`library`]: Library loading and the path-keyed handle cache
//! - [`bridge`]: `pack_and_invoke` and [`NativeBridge`]
//! - [`config`]: Library path and entry symbol configuration
//!
//! # Example
//! ```no_run
//! use beamtrack_native::prelude::*;
//!
//! let mut bunch = ParticleColumns::zeros(1000);
//! bunch.fill(Attribute::Gamma0, 7000.0);
//! let set = pack_and_invoke("./libtrack.so", bunch.attribute_set(), 1000)?;
//! # drop(set);
//! # Ok::<(), BridgeError>(())
//! ```

pub mod attribute;
pub mod bridge;
pub mod buffer;
pub mod columns;
pub mod config;
pub mod error;
pub mod library;
pub mod record;
pub mod set;

pub use bridge::{pack_and_invoke, NativeBridge};
pub use error::{BridgeError, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::attribute::{Attribute, ATTRIBUTE_COUNT};
    pub use crate::bridge::{pack_and_invoke, NativeBridge};
    pub use crate::buffer::{AttributeBuffer, DeviceBuffer, StridedHost};
    pub use crate::columns::ParticleColumns;
    pub use crate::config::{BridgeConfig, BridgeConfigBuilder};
    pub use crate::error::{BridgeError, Result};
    pub use crate::library::{LibraryCache, TrackingLibrary};
    pub use crate::record::{ParticleData, RunFn, DEVICE_TAG, HOST_TAG};
    pub use crate::set::AttributeSet;
}
