//! Reductions over host arrays.

use super::PARALLEL_THRESHOLD;
use crate::compute::array::Array;
use crate::error::{ComputeError, ComputeResult};
use rayon::prelude::*;

fn host_slice(x: &Array) -> ComputeResult<&[f64]> {
    Ok(x.as_host()?.as_slice())
}

fn non_empty<'a>(x: &'a Array, operation: &str) -> ComputeResult<&'a [f64]> {
    let data = host_slice(x)?;
    if data.is_empty() {
        return Err(ComputeError::empty_input(operation));
    }
    Ok(data)
}

fn sum_slice(data: &[f64]) -> f64 {
    if data.len() < PARALLEL_THRESHOLD {
        data.iter().sum()
    } else {
        data.par_iter().sum()
    }
}

/// Mean of the element-wise product of two centered arrays (biased, 1/n).
fn centered_product_mean(a: &[f64], mean_a: f64, b: &[f64], mean_b: f64) -> f64 {
    let n = a.len() as f64;
    let acc: f64 = if a.len() < PARALLEL_THRESHOLD {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - mean_a) * (y - mean_b))
            .sum()
    } else {
        a.par_iter()
            .zip(b.par_iter())
            .map(|(x, y)| (x - mean_a) * (y - mean_b))
            .sum()
    };
    acc / n
}

/// Sum of all elements. The empty sum is zero.
pub fn sum(x: &Array) -> ComputeResult<f64> {
    Ok(sum_slice(host_slice(x)?))
}

/// Arithmetic mean.
pub fn mean(x: &Array) -> ComputeResult<f64> {
    let data = non_empty(x, "mean")?;
    Ok(sum_slice(data) / data.len() as f64)
}

/// Population standard deviation (1/n estimator).
pub fn std(x: &Array) -> ComputeResult<f64> {
    let data = non_empty(x, "std")?;
    let m = sum_slice(data) / data.len() as f64;
    Ok(centered_product_mean(data, m, data, m).sqrt())
}

/// Smallest element.
pub fn min(x: &Array) -> ComputeResult<f64> {
    let data = non_empty(x, "min")?;
    Ok(data.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Largest element.
pub fn max(x: &Array) -> ComputeResult<f64> {
    let data = non_empty(x, "max")?;
    Ok(data.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// RMS emittance `sqrt(<u²><up²> - <u·up>²)` of a phase-space plane.
///
/// When `dp` is given, the linear correlation of `u` and `up` with the
/// momentum deviation is subtracted first (dispersion correction). A `dp`
/// with zero spread carries no dispersion and is ignored.
pub fn emittance(u: &Array, up: &Array, dp: Option<&Array>) -> ComputeResult<f64> {
    u.check_same_len(up)?;
    let u_data = non_empty(u, "emittance")?;
    let up_data = host_slice(up)?;

    let mean_u = sum_slice(u_data) / u_data.len() as f64;
    let mean_up = sum_slice(up_data) / up_data.len() as f64;

    let cov_u2 = centered_product_mean(u_data, mean_u, u_data, mean_u);
    let cov_up2 = centered_product_mean(up_data, mean_up, up_data, mean_up);
    let cov_u_up = centered_product_mean(u_data, mean_u, up_data, mean_up);

    let (cov_u_dp, cov_up_dp, cov_dp2) = match dp {
        Some(dp) => {
            u.check_same_len(dp)?;
            let dp_data = host_slice(dp)?;
            let mean_dp = sum_slice(dp_data) / dp_data.len() as f64;
            let cov_dp2 = centered_product_mean(dp_data, mean_dp, dp_data, mean_dp);
            if cov_dp2 > 0.0 {
                (
                    centered_product_mean(u_data, mean_u, dp_data, mean_dp),
                    centered_product_mean(up_data, mean_up, dp_data, mean_dp),
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

/// Shared by the host and device implementations so both backends apply
/// the same dispersion correction to their second moments.
pub(crate) fn emittance_from_moments(
    cov_u2: f64,
    cov_up2: f64,
    cov_u_up: f64,
    cov_u_dp: f64,
    cov_up_dp: f64,
    cov_dp2: f64,
) -> f64 {
    let sigma11 = cov_u2 - cov_u_dp * cov_u_dp / cov_dp2;
    let sigma12 = cov_u_up - cov_u_dp * cov_up_dp / cov_dp2;
    let sigma22 = cov_up2 - cov_up_dp * cov_up_dp / cov_dp2;
    // Rounding can push a degenerate determinant slightly below zero.
    (sigma11 * sigma22 - sigma12 * sigma12).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_basic_statistics() {
        let x = Array::from(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(sum(&x).unwrap(), 40.0);
        assert_relative_eq!(mean(&x).unwrap(), 5.0);
        assert_relative_eq!(std(&x).unwrap(), 2.0);
        assert_relative_eq!(min(&x).unwrap(), 2.0);
        assert_relative_eq!(max(&x).unwrap(), 9.0);
    }

    #[test]
    fn test_empty_input() {
        let empty = Array::from(Vec::<f64>::new());
        assert_eq!(sum(&empty).unwrap(), 0.0);
        assert!(matches!(mean(&empty), Err(ComputeError::EmptyInput { .. })));
        assert!(matches!(std(&empty), Err(ComputeError::EmptyInput { .. })));
        assert!(matches!(min(&empty), Err(ComputeError::EmptyInput { .. })));
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let n = PARALLEL_THRESHOLD * 3 + 17;
        let data: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();
        let sequential: f64 = data.iter().sum();
        let x = Array::from(data);
        assert_relative_eq!(sum(&x).unwrap(), sequential, max_relative = 1e-10);
    }

    #[test]
    fn test_emittance_uncorrelated_plane() {
        // u and up are independent +-1 patterns: <u²> = <up²> = 1, <u·up> = 0.
        let u = Array::from(vec![1.0, -1.0, 1.0, -1.0]);
        let up = Array::from(vec![1.0, 1.0, -1.0, -1.0]);
        assert_relative_eq!(emittance(&u, &up, None).unwrap(), 1.0);
    }

    #[test]
    fn test_emittance_fully_correlated_plane_is_zero() {
        let u = Array::from(vec![1.0, 2.0, 3.0, 4.0]);
        let up = Array::from(vec![2.0, 4.0, 6.0, 8.0]);
        assert_relative_eq!(emittance(&u, &up, None).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_emittance_dispersion_correction() {
        // u is pure dispersion: the corrected emittance vanishes.
        let dp = Array::from(vec![-1.0, 0.5, 1.0, -0.5]);
        let u = Array::from(vec![-2.0, 1.0, 2.0, -1.0]);
        let up = Array::from(vec![0.3, -0.1, 0.2, 0.4]);
        let raw = emittance(&u, &up, None).unwrap();
        let corrected = emittance(&u, &up, Some(&dp)).unwrap();
        assert!(raw > 0.0);
        assert_relative_eq!(corrected, 0.0, epsilon = 1e-12);

        // Zero-spread dp is ignored.
        let flat = Array::from(vec![0.1; 4]);
        assert_relative_eq!(emittance(&u, &up, Some(&flat)).unwrap(), raw);
    }

    #[test]
    fn test_emittance_length_mismatch() {
        let u = Array::from(vec![1.0, 2.0]);
        let up = Array::from(vec![1.0]);
        assert!(matches!(
            emittance(&u, &up, None),
            Err(ComputeError::DimensionMismatch { .. })
        ));
    }
}
