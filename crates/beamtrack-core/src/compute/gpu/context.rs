//! Device context and device-resident arrays.

use super::kernels;
use crate::error::{ComputeError, ComputeResult};
use cudarc::driver::{
    CudaDevice, CudaFunction, CudaSlice, DevicePtr, DevicePtrMut, DeviceSlice,
};
use cudarc::nvrtc::{compile_ptx_with_opts, CompileOptions};
use nalgebra::DVector;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use tracing::info;

static CONTEXT: Lazy<ComputeResult<GpuContext>> = Lazy::new(GpuContext::initialize);

/// Device 0 plus the compiled operation module.
pub struct GpuContext {
    device: Arc<CudaDevice>,
}

impl GpuContext {
    /// The process-wide context, initialized on first call.
    ///
    /// Initialization failure is cached; every later call reports the same
    /// error.
    pub fn global() -> ComputeResult<&'static GpuContext> {
        CONTEXT.as_ref().map_err(Clone::clone)
    }

    /// Returns true if a device could be initialized.
    pub fn is_available() -> bool {
        Self::global().is_ok()
    }

    fn initialize() -> ComputeResult<Self> {
        let device = CudaDevice::new(0).map_err(ComputeError::device)?;

        let ptx = compile_ptx_with_opts(
            kernels::SOURCE,
            CompileOptions {
                arch: Some(kernels::ARCH),
                ..Default::default()
            },
        )
        .map_err(ComputeError::device)?;
        device
            .load_ptx(ptx, kernels::MODULE, kernels::FUNCTIONS)
            .map_err(ComputeError::device)?;

        info!(ordinal = device.ordinal(), arch = kernels::ARCH, "CUDA device initialized");
        Ok(Self { device })
    }

    /// The underlying cudarc device.
    pub fn device(&self) -> &Arc<CudaDevice> {
        &self.device
    }

    pub(crate) fn function(&self, name: &str) -> ComputeResult<CudaFunction> {
        self.device
            .get_func(kernels::MODULE, name)
            .ok_or_else(|| ComputeError::device(format!("kernel '{name}' is not loaded")))
    }
}

/// A contiguous run of `f64` in device memory.
pub struct DeviceArray {
    data: CudaSlice<f64>,
}

impl DeviceArray {
    /// Upload host data to the default device.
    pub fn from_host(data: &[f64]) -> ComputeResult<Self> {
        let ctx = GpuContext::global()?;
        let data = ctx.device.htod_sync_copy(data).map_err(ComputeError::device)?;
        Ok(Self { data })
    }

    /// Allocate `len` zeroed elements on the default device.
    pub fn zeros(len: usize) -> ComputeResult<Self> {
        let ctx = GpuContext::global()?;
        let data = ctx.device.alloc_zeros::<f64>(len).map_err(ComputeError::device)?;
        Ok(Self { data })
    }

    pub(crate) fn from_slice(data: CudaSlice<f64>) -> Self {
        Self { data }
    }

    /// Download into a host vector.
    pub fn to_host(&self) -> ComputeResult<DVector<f64>> {
        let ctx = GpuContext::global()?;
        let host = ctx.device.dtoh_sync_copy(&self.data).map_err(ComputeError::device)?;
        Ok(DVector::from_vec(host))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Raw device address of the first element.
    pub fn device_ptr(&self) -> u64 {
        *self.data.device_ptr()
    }

    /// Raw device address for a caller that will write through it.
    pub fn device_ptr_mut(&mut self) -> u64 {
        *self.data.device_ptr_mut()
    }

    pub(crate) fn slice(&self) -> &CudaSlice<f64> {
        &self.data
    }
}

impl fmt::Debug for DeviceArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceArray")
            .field("len", &self.len())
            .field("ptr", &format_args!("{:#x}", self.device_ptr()))
            .finish()
    }
}
