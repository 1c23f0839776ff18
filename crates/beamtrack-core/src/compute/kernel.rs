//! Typed operation implementations.
//!
//! Operations registered in the dispatch registry have different arities,
//! so the function pointer is tagged by its calling shape. Calling a kernel
//! through the wrong shape is an error, never a reinterpretation.

use crate::compute::array::Array;
use crate::error::{ComputeError, ComputeResult};
use std::fmt;

/// Single-array statistic: `mean(x)`, `std(x)`.
pub type ReduceFn = fn(&Array) -> ComputeResult<f64>;

/// Element-wise map: `sin(x)`, `exp(x)`.
pub type MapFn = fn(&Array) -> ComputeResult<Array>;

/// RMS emittance of `(u, up)`, optionally dispersion-corrected by `dp`.
pub type EmittanceFn = fn(&Array, &Array, Option<&Array>) -> ComputeResult<f64>;

/// Gather `out[i] = x[perm[i]]`.
pub type PermuteFn = fn(&Array, &[u32]) -> ComputeResult<Array>;

/// Calling shape of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    /// See [`ReduceFn`].
    Reduce,
    /// See [`MapFn`].
    Map,
    /// See [`EmittanceFn`].
    Emittance,
    /// See [`PermuteFn`].
    Permute,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reduce => f.write_str("reduce(x) -> f64"),
            Self::Map => f.write_str("map(x) -> array"),
            Self::Emittance => f.write_str("emittance(u, up, dp?) -> f64"),
            Self::Permute => f.write_str("permute(x, perm) -> array"),
        }
    }
}

/// The function pointer, tagged by calling shape.
#[derive(Clone, Copy)]
pub enum Kernel {
    /// Single-array statistic
    Reduce(ReduceFn),
    /// Element-wise map
    Map(MapFn),
    /// Emittance with optional dispersion
    Emittance(EmittanceFn),
    /// Permutation gather
    Permute(PermuteFn),
}

impl Kernel {
    /// Calling shape of this kernel.
    pub fn signature(&self) -> Signature {
        match self {
            Self::Reduce(_) => Signature::Reduce,
            Self::Map(_) => Signature::Map,
            Self::Emittance(_) => Signature::Emittance,
            Self::Permute(_) => Signature::Permute,
        }
    }

    /// Evaluate a reduction kernel.
    pub fn reduce(&self, x: &Array) -> ComputeResult<f64> {
        match self {
            Self::Reduce(f) => f(x),
            other => Err(ComputeError::signature_mismatch(
                Signature::Reduce,
                other.signature(),
            )),
        }
    }

    /// Evaluate an element-wise kernel.
    pub fn map(&self, x: &Array) -> ComputeResult<Array> {
        match self {
            Self::Map(f) => f(x),
            other => Err(ComputeError::signature_mismatch(
                Signature::Map,
                other.signature(),
            )),
        }
    }

    /// Evaluate an emittance kernel.
    pub fn emittance(&self, u: &Array, up: &Array, dp: Option<&Array>) -> ComputeResult<f64> {
        match self {
            Self::Emittance(f) => f(u, up, dp),
            other => Err(ComputeError::signature_mismatch(
                Signature::Emittance,
                other.signature(),
            )),
        }
    }

    /// Evaluate a permutation kernel.
    pub fn permute(&self, x: &Array, perm: &[u32]) -> ComputeResult<Array> {
        match self {
            Self::Permute(f) => f(x, perm),
            other => Err(ComputeError::signature_mismatch(
                Signature::Permute,
                other.signature(),
            )),
        }
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Kernel").field(&self.signature()).finish()
    }
}
