//! Numeric arrays handed to operation implementations.
//!
//! An [`Array`] is either a host vector or, with the `cuda` feature, a
//! device-resident buffer. Implementations check residency up front and
//! refuse the other kind instead of copying behind the caller's back.

use crate::error::{ComputeError, ComputeResult};
use crate::types::Residency;
use nalgebra::DVector;

#[cfg(feature = "cuda")]
use crate::compute::gpu::DeviceArray;

/// A one-dimensional `f64` array in host or device memory.
#[derive(Debug)]
pub enum Array {
    /// Host-resident data.
    Host(DVector<f64>),
    /// Device-resident data.
    #[cfg(feature = "cuda")]
    Device(DeviceArray),
}

impl Array {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Host(v) => v.len(),
            #[cfg(feature = "cuda")]
            Self::Device(d) => d.len(),
        }
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Memory the data lives in.
    pub fn residency(&self) -> Residency {
        match self {
            Self::Host(_) => Residency::Host,
            #[cfg(feature = "cuda")]
            Self::Device(_) => Residency::Device,
        }
    }

    /// Borrow the host vector, failing for device arrays.
    pub fn as_host(&self) -> ComputeResult<&DVector<f64>> {
        match self {
            Self::Host(v) => Ok(v),
            #[cfg(feature = "cuda")]
            Self::Device(_) => Err(ComputeError::residency_mismatch(
                Residency::Host,
                Residency::Device,
            )),
        }
    }

    /// Mutably borrow the host vector, failing for device arrays.
    pub fn as_host_mut(&mut self) -> ComputeResult<&mut DVector<f64>> {
        match self {
            Self::Host(v) => Ok(v),
            #[cfg(feature = "cuda")]
            Self::Device(_) => Err(ComputeError::residency_mismatch(
                Residency::Host,
                Residency::Device,
            )),
        }
    }

    /// Borrow the device buffer, failing for host arrays.
    #[cfg(feature = "cuda")]
    pub fn as_device(&self) -> ComputeResult<&DeviceArray> {
        match self {
            Self::Device(d) => Ok(d),
            Self::Host(_) => Err(ComputeError::residency_mismatch(
                Residency::Device,
                Residency::Host,
            )),
        }
    }

    /// Copy the contents into a host vector (download for device arrays).
    pub fn to_host(&self) -> ComputeResult<DVector<f64>> {
        match self {
            Self::Host(v) => Ok(v.clone()),
            #[cfg(feature = "cuda")]
            Self::Device(d) => d.to_host(),
        }
    }

    /// Upload a copy of this array to the default device.
    #[cfg(feature = "cuda")]
    pub fn to_device(&self) -> ComputeResult<Self> {
        match self {
            Self::Host(v) => Ok(Self::Device(DeviceArray::from_host(v.as_slice())?)),
            Self::Device(d) => Ok(Self::Device(DeviceArray::from_host(
                d.to_host()?.as_slice(),
            )?)),
        }
    }

    /// Fails unless `other` has the same length as `self`.
    pub(crate) fn check_same_len(&self, other: &Self) -> ComputeResult<()> {
        if self.len() == other.len() {
            Ok(())
        } else {
            Err(ComputeError::dimension_mismatch(self.len(), other.len()))
        }
    }
}

impl From<DVector<f64>> for Array {
    fn from(v: DVector<f64>) -> Self {
        Self::Host(v)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Self::Host(DVector::from_vec(v))
    }
}

impl From<&[f64]> for Array {
    fn from(v: &[f64]) -> Self {
        Self::Host(DVector::from_column_slice(v))
    }
}

#[cfg(feature = "cuda")]
impl From<DeviceArray> for Array {
    fn from(d: DeviceArray) -> Self {
        Self::Device(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_array_accessors() {
        let mut a = Array::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(a.len(), 3);
        assert!(!a.is_empty());
        assert_eq!(a.residency(), Residency::Host);

        a.as_host_mut().unwrap()[0] = 7.0;
        assert_eq!(a.as_host().unwrap()[0], 7.0);
        assert_eq!(a.to_host().unwrap().as_slice(), &[7.0, 2.0, 3.0]);
    }

    #[test]
    fn test_same_len_check() {
        let a = Array::from(vec![1.0, 2.0]);
        let b = Array::from(vec![1.0, 2.0, 3.0]);
        assert!(a.check_same_len(&a).is_ok());
        assert!(matches!(
            a.check_same_len(&b),
            Err(ComputeError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }
}
