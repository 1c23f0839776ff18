//! CUDA C source for the device operation set, compiled with NVRTC on first
//! use of the [`GpuContext`](super::GpuContext).

/// Module name the kernels are loaded under.
pub const MODULE: &str = "beamtrack_ops";

/// Target architecture; double-precision `atomicAdd` needs sm_60.
pub const ARCH: &str = "compute_60";

/// Entry points exported by [`SOURCE`].
pub const FUNCTIONS: &[&str] = &["sum_f64", "centered_product_sum_f64", "map_f64", "gather_f64"];

/// Opcode for `map_f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MapOp {
    /// `sin(x)`
    Sin = 0,
    /// `cos(x)`
    Cos = 1,
    /// `exp(x)`
    Exp = 2,
    /// `sqrt(x)`
    Sqrt = 3,
}

/// Kernel source.
pub const SOURCE: &str = r#"
extern "C" __global__ void sum_f64(const double* x, double* out, int n) {
    double acc = 0.0;
    for (int i = blockIdx.x * blockDim.x + threadIdx.x; i < n; i += blockDim.x * gridDim.x) {
        acc += x[i];
    }
    atomicAdd(out, acc);
}

extern "C" __global__ void centered_product_sum_f64(
    const double* a, double mean_a,
    const double* b, double mean_b,
    double* out, int n)
{
    double acc = 0.0;
    for (int i = blockIdx.x * blockDim.x + threadIdx.x; i < n; i += blockDim.x * gridDim.x) {
        acc += (a[i] - mean_a) * (b[i] - mean_b);
    }
    atomicAdd(out, acc);
}

extern "C" __global__ void map_f64(const double* x, double* out, int n, int op) {
    int i = blockIdx.x * blockDim.x + threadIdx.x;
    if (i >= n) return;
    switch (op) {
        case 0: out[i] = sin(x[i]); break;
        case 1: out[i] = cos(x[i]); break;
        case 2: out[i] = exp(x[i]); break;
        default: out[i] = sqrt(x[i]); break;
    }
}

extern "C" __global__ void gather_f64(const double* x, const unsigned int* perm, double* out, int n) {
    int i = blockIdx.x * blockDim.x + threadIdx.x;
    if (i < n) out[i] = x[perm[i]];
}
"#;
