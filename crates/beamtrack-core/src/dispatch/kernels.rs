//! The numeric operation registry.
//!
//! [`default_registry`] builds a registry holding the CPU set and, with the
//! `cuda` feature, the GPU set. [`registry`] is the process-wide instance
//! callers usually go through.

use crate::compute::array::Array;
use crate::compute::cpu;
use crate::compute::kernel::Kernel;
use crate::config::DispatchConfig;
use crate::dispatch::registry::DispatchRegistry;
use crate::error::{DispatchError, Result};
use crate::types::Backend;
use once_cell::sync::Lazy;
use tracing::warn;

static REGISTRY: Lazy<DispatchRegistry<Kernel>> = Lazy::new(|| {
    let config = DispatchConfig::from_env().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring backend override, using defaults");
        DispatchConfig::default()
    });
    default_registry(&config)
});

/// The process-wide registry, configured from the environment on first use.
pub fn registry() -> &'static DispatchRegistry<Kernel> {
    &REGISTRY
}

/// A registry holding every built-in operation, activated per `config`.
pub fn default_registry(config: &DispatchConfig) -> DispatchRegistry<Kernel> {
    // Built-in names are unique per backend, so strictness only applies to
    // registrations made after construction.
    let registry = DispatchRegistry::from_sets(
        cpu::kernels()
            .into_iter()
            .map(|(name, kernel)| (name.to_string(), kernel))
            .collect(),
        gpu_kernels(),
        config.initial_backend,
        config.strict_registration,
    );
    tracing::debug!(?registry, "default registry built");
    registry
}

#[cfg(feature = "cuda")]
fn gpu_kernels() -> crate::dispatch::OperationSet<Kernel> {
    crate::compute::gpu::kernels()
        .into_iter()
        .map(|(name, kernel)| (name.to_string(), kernel))
        .collect()
}

#[cfg(not(feature = "cuda"))]
fn gpu_kernels() -> crate::dispatch::OperationSet<Kernel> {
    crate::dispatch::OperationSet::new()
}

impl DispatchRegistry<Kernel> {
    /// Resolve `name` and evaluate it as a reduction.
    pub fn reduce(&self, name: &str, x: &Array) -> Result<f64> {
        self.resolve(name)?
            .reduce(x)
            .map_err(|e| DispatchError::compute(name, e))
    }

    /// Resolve `name` and evaluate it element-wise.
    pub fn map(&self, name: &str, x: &Array) -> Result<Array> {
        self.resolve(name)?
            .map(x)
            .map_err(|e| DispatchError::compute(name, e))
    }

    /// Resolve `"emittance"` and evaluate it.
    pub fn emittance(&self, u: &Array, up: &Array, dp: Option<&Array>) -> Result<f64> {
        self.resolve("emittance")?
            .emittance(u, up, dp)
            .map_err(|e| DispatchError::compute("emittance", e))
    }

    /// Resolve `"apply_permutation"` and evaluate it.
    pub fn apply_permutation(&self, x: &Array, perm: &[u32]) -> Result<Array> {
        self.resolve("apply_permutation")?
            .permute(x, perm)
            .map_err(|e| DispatchError::compute("apply_permutation", e))
    }

    /// Returns true if the GPU set is populated.
    pub fn has_gpu_operations(&self) -> bool {
        !self.names(Backend::Gpu).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComputeError;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_registry_cpu_set() {
        let reg = default_registry(&DispatchConfig::default());
        assert_eq!(reg.active_backend(), Backend::Cpu);
        assert_eq!(reg.names(Backend::Cpu).len(), cpu::kernels().len());

        let x = Array::from(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(reg.reduce("mean", &x).unwrap(), 5.0);
        assert_relative_eq!(reg.reduce("std", &x).unwrap(), 2.0);
        assert_relative_eq!(reg.reduce("min", &x).unwrap(), 2.0);
    }

    #[test]
    fn test_convenience_wrappers() {
        let reg = default_registry(&DispatchConfig::default());
        let x = Array::from(vec![0.0, 1.0, 4.0]);

        let roots = reg.map("sqrt", &x).unwrap();
        assert_eq!(roots.as_host().unwrap().as_slice(), &[0.0, 1.0, 2.0]);

        let permuted = reg.apply_permutation(&x, &[2, 0, 1]).unwrap();
        assert_eq!(permuted.as_host().unwrap().as_slice(), &[4.0, 0.0, 1.0]);

        let u = Array::from(vec![1.0, -1.0, 1.0, -1.0]);
        let up = Array::from(vec![1.0, 1.0, -1.0, -1.0]);
        assert_relative_eq!(reg.emittance(&u, &up, None).unwrap(), 1.0);
    }

    #[test]
    fn test_wrong_shape_is_a_compute_error() {
        let reg = default_registry(&DispatchConfig::default());
        let x = Array::from(vec![1.0]);

        let err = reg.map("mean", &x).unwrap_err();
        match err {
            DispatchError::Compute { operation, source } => {
                assert_eq!(operation, "mean");
                assert!(matches!(source, ComputeError::SignatureMismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_propagates() {
        let reg = default_registry(&DispatchConfig::default());
        let err = reg.reduce("mean", &Array::from(Vec::new())).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Compute {
                source: ComputeError::EmptyInput { .. },
                ..
            }
        ));
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_gpu_set_empty_without_cuda() {
        let reg = default_registry(&DispatchConfig::default());
        assert!(!reg.has_gpu_operations());

        reg.activate(Backend::Gpu);
        let err = reg.reduce("mean", &Array::from(vec![1.0])).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::BackendMismatch {
                active: Backend::Gpu,
                available: Backend::Cpu,
                ..
            }
        ));
    }

    #[cfg(feature = "cuda")]
    #[test]
    fn test_gpu_set_lacks_min_max() {
        let reg = default_registry(&DispatchConfig::default());
        assert!(reg.has_gpu_operations());
        assert!(!reg.is_registered(Backend::Gpu, "min"));
        assert!(!reg.is_registered(Backend::Gpu, "max"));
        assert!(reg.common_names().contains(&"emittance".to_string()));
    }
}
