//! Element-wise maps and gathers over host arrays.

use super::PARALLEL_THRESHOLD;
use crate::compute::array::Array;
use crate::error::{ComputeError, ComputeResult};
use nalgebra::DVector;
use rayon::prelude::*;

fn map_host(x: &Array, f: fn(f64) -> f64) -> ComputeResult<Array> {
    let v = x.as_host()?;
    if v.len() < PARALLEL_THRESHOLD {
        return Ok(Array::Host(v.map(f)));
    }
    let out: Vec<f64> = v.as_slice().par_iter().map(|&e| f(e)).collect();
    Ok(Array::Host(DVector::from_vec(out)))
}

/// Element-wise sine.
pub fn sin(x: &Array) -> ComputeResult<Array> {
    map_host(x, f64::sin)
}

/// Element-wise cosine.
pub fn cos(x: &Array) -> ComputeResult<Array> {
    map_host(x, f64::cos)
}

/// Element-wise exponential.
pub fn exp(x: &Array) -> ComputeResult<Array> {
    map_host(x, f64::exp)
}

/// Element-wise square root. Negative inputs give NaN.
pub fn sqrt(x: &Array) -> ComputeResult<Array> {
    map_host(x, f64::sqrt)
}

/// Gather `out[i] = x[perm[i]]` into a new array.
///
/// `perm` must have one index per element; indices are not required to be
/// distinct.
pub fn apply_permutation(x: &Array, perm: &[u32]) -> ComputeResult<Array> {
    let v = x.as_host()?;
    check_permutation(v.len(), perm)?;
    Ok(Array::Host(DVector::from_iterator(
        perm.len(),
        perm.iter().map(|&i| v[i as usize]),
    )))
}

/// Validates `perm` against an array of length `len`.
pub(crate) fn check_permutation(len: usize, perm: &[u32]) -> ComputeResult<()> {
    if perm.len() != len {
        return Err(ComputeError::dimension_mismatch(len, perm.len()));
    }
    if let Some((pos, &idx)) = perm.iter().enumerate().find(|(_, &i)| i as usize >= len) {
        return Err(ComputeError::invalid_permutation(format!(
            "index {idx} at position {pos} is out of range for length {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_maps() {
        let x = Array::from(vec![0.0, 1.0, 4.0]);
        let s = sqrt(&x).unwrap();
        assert_eq!(s.as_host().unwrap().as_slice(), &[0.0, 1.0, 2.0]);

        let e = exp(&x).unwrap();
        assert_relative_eq!(e.as_host().unwrap()[1], std::f64::consts::E);

        let c = cos(&x).unwrap();
        assert_relative_eq!(c.as_host().unwrap()[0], 1.0);
        assert_relative_eq!(sin(&x).unwrap().as_host().unwrap()[0], 0.0);
    }

    #[test]
    fn test_parallel_map() {
        let n = PARALLEL_THRESHOLD + 5;
        let x = Array::from(vec![0.25; n]);
        let out = sqrt(&x).unwrap();
        assert_eq!(out.len(), n);
        assert!(out.as_host().unwrap().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_apply_permutation() {
        let x = Array::from(vec![10.0, 20.0, 30.0]);
        let out = apply_permutation(&x, &[2, 0, 1]).unwrap();
        assert_eq!(out.as_host().unwrap().as_slice(), &[30.0, 10.0, 20.0]);
    }

    #[test]
    fn test_apply_permutation_rejects_bad_indices() {
        let x = Array::from(vec![1.0, 2.0]);
        assert!(matches!(
            apply_permutation(&x, &[0, 2]),
            Err(ComputeError::InvalidPermutation { .. })
        ));
        assert!(matches!(
            apply_permutation(&x, &[0]),
            Err(ComputeError::DimensionMismatch { .. })
        ));
    }
}
