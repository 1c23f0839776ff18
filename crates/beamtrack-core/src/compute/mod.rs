//! Numeric arrays and the host/device operation sets.

pub mod array;
pub mod cpu;
#[cfg(feature = "cuda")]
pub mod gpu;
pub mod kernel;

pub use array::Array;
pub use kernel::{Kernel, Signature};
