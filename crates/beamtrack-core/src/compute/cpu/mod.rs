//! Host-memory implementations of the numeric operation set.
//!
//! Every function here accepts [`Array::Host`](crate::compute::Array) only and
//! reports a residency mismatch for device arrays. Large inputs are reduced
//! with rayon; below [`PARALLEL_THRESHOLD`] a sequential pass is cheaper.

pub mod elementwise;
pub mod reductions;

pub use elementwise::{apply_permutation, cos, exp, sin, sqrt};
pub use reductions::{emittance, max, mean, min, std, sum};

use crate::compute::kernel::Kernel;

/// Element count from which host operations switch to rayon.
pub const PARALLEL_THRESHOLD: usize = 16_384;

/// The CPU operation set, as registered in the default registry.
pub fn kernels() -> Vec<(&'static str, Kernel)> {
    vec![
        ("sum", Kernel::Reduce(sum)),
        ("mean", Kernel::Reduce(mean)),
        ("std", Kernel::Reduce(std)),
        ("min", Kernel::Reduce(min)),
        ("max", Kernel::Reduce(max)),
        ("sin", Kernel::Map(sin)),
        ("cos", Kernel::Map(cos)),
        ("exp", Kernel::Map(exp)),
        ("sqrt", Kernel::Map(sqrt)),
        ("emittance", Kernel::Emittance(emittance)),
        ("apply_permutation", Kernel::Permute(apply_permutation)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_kernel_names_are_unique() {
        let names: HashSet<_> = kernels().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names.len(), kernels().len());
        assert!(names.contains("mean"));
        assert!(names.contains("apply_permutation"));
    }
}
