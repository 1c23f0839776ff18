//! CUDA device backend (requires the `cuda` feature).
//!
//! Device arrays live in memory owned by the process-wide [`GpuContext`].
//! The operation set compiled here mirrors the host set where a device
//! implementation exists; `min` and `max` are host-only.
//!
//! # Requirements
//!
//! - CUDA driver and NVRTC available at runtime
//! - A device with compute capability 6.0 or higher (double-precision
//!   `atomicAdd`)

pub mod context;
pub mod kernels;
pub mod ops;

pub use context::{DeviceArray, GpuContext};
pub use ops::kernels;
