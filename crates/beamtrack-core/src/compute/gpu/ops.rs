//! Device implementations of the numeric operation set.
//!
//! Reductions accumulate with one `atomicAdd` per thread into a single
//! device scalar; the final division and square roots happen on the host.
//! Estimators match the host set exactly (1/n), so results differ from
//! the CPU only by summation order.

use super::context::{DeviceArray, GpuContext};
use super::kernels::MapOp;
use crate::compute::array::Array;
use crate::compute::cpu::elementwise::check_permutation;
use crate::compute::cpu::reductions::emittance_from_moments;
use crate::compute::kernel::Kernel;
use crate::error::{ComputeError, ComputeResult};
use cudarc::driver::{CudaSlice, LaunchAsync, LaunchConfig};

fn launch_len(n: usize) -> ComputeResult<(LaunchConfig, i32)> {
    let n_i32 = i32::try_from(n)
        .map_err(|_| ComputeError::device(format!("{n} elements exceed a single launch")))?;
    Ok((LaunchConfig::for_num_elems(n_i32 as u32), n_i32))
}

fn device_slice(x: &Array) -> ComputeResult<&CudaSlice<f64>> {
    Ok(x.as_device()?.slice())
}

fn device_sum(ctx: &GpuContext, x: &CudaSlice<f64>, n: usize) -> ComputeResult<f64> {
    if n == 0 {
        return Ok(0.0);
    }
    let (cfg, n_i32) = launch_len(n)?;
    let mut out = ctx.device().alloc_zeros::<f64>(1).map_err(ComputeError::device)?;
    let func = ctx.function("sum_f64")?;
    // SAFETY: argument list matches `sum_f64(const double*, double*, int)`.
    unsafe { func.launch(cfg, (x, &mut out, n_i32)) }.map_err(ComputeError::device)?;
    let host = ctx.device().dtoh_sync_copy(&out).map_err(ComputeError::device)?;
    Ok(host[0])
}

fn device_centered_product_mean(
    ctx: &GpuContext,
    a: &CudaSlice<f64>,
    mean_a: f64,
    b: &CudaSlice<f64>,
    mean_b: f64,
    n: usize,
) -> ComputeResult<f64> {
    let (cfg, n_i32) = launch_len(n)?;
    let mut out = ctx.device().alloc_zeros::<f64>(1).map_err(ComputeError::device)?;
    let func = ctx.function("centered_product_sum_f64")?;
    // SAFETY: matches `centered_product_sum_f64(a, mean_a, b, mean_b, out, n)`.
    unsafe { func.launch(cfg, (a, mean_a, b, mean_b, &mut out, n_i32)) }
        .map_err(ComputeError::device)?;
    let host = ctx.device().dtoh_sync_copy(&out).map_err(ComputeError::device)?;
    Ok(host[0] / n as f64)
}

fn device_map(x: &Array, op: MapOp) -> ComputeResult<Array> {
    let ctx = GpuContext::global()?;
    let input = device_slice(x)?;
    let n = x.len();
    let mut out = ctx.device().alloc_zeros::<f64>(n).map_err(ComputeError::device)?;
    if n > 0 {
        let (cfg, n_i32) = launch_len(n)?;
        let func = ctx.function("map_f64")?;
        // SAFETY: matches `map_f64(const double*, double*, int, int)`.
        unsafe { func.launch(cfg, (input, &mut out, n_i32, op as i32)) }
            .map_err(ComputeError::device)?;
    }
    Ok(Array::Device(DeviceArray::from_slice(out)))
}

/// Sum of all elements.
pub fn sum(x: &Array) -> ComputeResult<f64> {
    let ctx = GpuContext::global()?;
    device_sum(ctx, device_slice(x)?, x.len())
}

/// Arithmetic mean.
pub fn mean(x: &Array) -> ComputeResult<f64> {
    if x.is_empty() {
        return Err(ComputeError::empty_input("mean"));
    }
    Ok(sum(x)? / x.len() as f64)
}

/// Population standard deviation (1/n estimator).
pub fn std(x: &Array) -> ComputeResult<f64> {
    if x.is_empty() {
        return Err(ComputeError::empty_input("std"));
    }
    let ctx = GpuContext::global()?;
    let data = device_slice(x)?;
    let m = device_sum(ctx, data, x.len())? / x.len() as f64;
    Ok(device_centered_product_mean(ctx, data, m, data, m, x.len())?.sqrt())
}

/// Element-wise sine.
pub fn sin(x: &Array) -> ComputeResult<Array> {
    device_map(x, MapOp::Sin)
}

/// Element-wise cosine.
pub fn cos(x: &Array) -> ComputeResult<Array> {
    device_map(x, MapOp::Cos)
}

/// Element-wise exponential.
pub fn exp(x: &Array) -> ComputeResult<Array> {
    device_map(x, MapOp::Exp)
}

/// Element-wise square root.
pub fn sqrt(x: &Array) -> ComputeResult<Array> {
    device_map(x, MapOp::Sqrt)
}

/// RMS emittance with optional dispersion correction.
pub fn emittance(u: &Array, up: &Array, dp: Option<&Array>) -> ComputeResult<f64> {
    u.check_same_len(up)?;
    if u.is_empty() {
        return Err(ComputeError::empty_input("emittance"));
    }
    let ctx = GpuContext::global()?;
    let n = u.len();
    let (u_data, up_data) = (device_slice(u)?, device_slice(up)?);

    let mean_u = device_sum(ctx, u_data, n)? / n as f64;
    let mean_up = device_sum(ctx, up_data, n)? / n as f64;
    let cov_u2 = device_centered_product_mean(ctx, u_data, mean_u, u_data, mean_u, n)?;
    let cov_up2 = device_centered_product_mean(ctx, up_data, mean_up, up_data, mean_up, n)?;
    let cov_u_up = device_centered_product_mean(ctx, u_data, mean_u, up_data, mean_up, n)?;

    let (cov_u_dp, cov_up_dp, cov_dp2) = match dp {
        Some(dp) => {
            u.check_same_len(dp)?;
            let dp_data = device_slice(dp)?;
            let mean_dp = device_sum(ctx, dp_data, n)? / n as f64;
            let cov_dp2 =
                device_centered_product_mean(ctx, dp_data, mean_dp, dp_data, mean_dp, n)?;
            if cov_dp2 > 0.0 {
                (
                    device_centered_product_mean(ctx, u_data, mean_u, dp_data, mean_dp, n)?,
                    device_centered_product_mean(ctx, up_data, mean_up, dp_data, mean_dp, n)?,
                    cov_dp2,
                )
            } else {
                (0.0, 0.0, 1.0)
            }
        }
        None => (0.0, 0.0, 1.0),
    };

    Ok(emittance_from_moments(
        cov_u2, cov_up2, cov_u_up, cov_u_dp, cov_up_dp, cov_dp2,
    ))
}

/// Gather `out[i] = x[perm[i]]`. The permutation is validated on the host
/// and uploaded for the launch.
pub fn apply_permutation(x: &Array, perm: &[u32]) -> ComputeResult<Array> {
    let input = device_slice(x)?;
    check_permutation(x.len(), perm)?;
    let ctx = GpuContext::global()?;
    let n = x.len();
    let mut out = ctx.device().alloc_zeros::<f64>(n).map_err(ComputeError::device)?;
    if n > 0 {
        let perm_dev = ctx.device().htod_sync_copy(perm).map_err(ComputeError::device)?;
        let (cfg, n_i32) = launch_len(n)?;
        let func = ctx.function("gather_f64")?;
        // SAFETY: matches `gather_f64(const double*, const unsigned*, double*, int)`.
        unsafe { func.launch(cfg, (input, &perm_dev, &mut out, n_i32)) }
            .map_err(ComputeError::device)?;
    }
    Ok(Array::Device(DeviceArray::from_slice(out)))
}

/// The GPU operation set, as registered in the default registry.
pub fn kernels() -> Vec<(&'static str, Kernel)> {
    vec![
        ("sum", Kernel::Reduce(sum)),
        ("mean", Kernel::Reduce(mean)),
        ("std", Kernel::Reduce(std)),
        ("sin", Kernel::Map(sin)),
        ("cos", Kernel::Map(cos)),
        ("exp", Kernel::Map(exp)),
        ("sqrt", Kernel::Map(sqrt)),
        ("emittance", Kernel::Emittance(emittance)),
        ("apply_permutation", Kernel::Permute(apply_permutation)),
    ]
}
