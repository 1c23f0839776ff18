//! Borrowed attribute storage.
//!
//! An [`AttributeBuffer`] borrows the memory of one attribute for the
//! duration of a bridge call. The variant says where the data lives and
//! whether it can be handed to native code as-is.

use crate::error::{BridgeError, Result};
use beamtrack_core::types::Residency;
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::marker::PhantomData;

#[cfg(feature = "cuda")]
use beamtrack_core::compute::gpu::DeviceArray;

/// Host data laid out with a stride, such as one row of a column-major
/// matrix.
///
/// Native code needs a contiguous run of doubles, so these are staged into
/// a temporary copy for the call and written back afterwards.
pub struct StridedHost<'a> {
    data: &'a mut [f64],
    stride: usize,
    len: usize,
}

impl<'a> StridedHost<'a> {
    /// `len` elements of `data`, `stride` apart, starting at index 0.
    pub fn new(data: &'a mut [f64], stride: usize, len: usize) -> Result<Self> {
        if stride == 0 {
            return Err(BridgeError::invalid_layout("stride must be at least 1"));
        }
        let needed = match len.checked_sub(1) {
            None => 0,
            Some(last) => last
                .checked_mul(stride)
                .and_then(|offset| offset.checked_add(1))
                .ok_or_else(|| {
                    BridgeError::invalid_layout(format!(
                        "{len} elements with stride {stride} overflow the address space"
                    ))
                })?,
        };
        if needed > data.len() {
            return Err(BridgeError::invalid_layout(format!(
                "{len} elements with stride {stride} need {needed} values, slice has {}",
                data.len()
            )));
        }
        Ok(Self { data, stride, len })
    }

    /// Row `row` of a column-major matrix.
    pub fn matrix_row(matrix: &'a mut DMatrix<f64>, row: usize) -> Result<Self> {
        let (nrows, ncols) = matrix.shape();
        if row >= nrows {
            return Err(BridgeError::invalid_layout(format!(
                "row {row} out of range for a matrix with {nrows} rows"
            )));
        }
        Self::new(&mut matrix.as_mut_slice()[row..], nrows, ncols)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distance between consecutive elements.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Element `i`, if in range.
    pub fn get(&self, i: usize) -> Option<f64> {
        if i >= self.len {
            return None;
        }
        i.checked_mul(self.stride)
            .and_then(|offset| self.data.get(offset))
            .copied()
    }

    /// Contiguous copy of the elements.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.iter().step_by(self.stride).take(self.len).copied().collect()
    }

    /// Overwrites the elements from a contiguous slice of the same length.
    pub(crate) fn write_back(&mut self, values: &[f64]) {
        for (dst, src) in self.data.iter_mut().step_by(self.stride).zip(values) {
            *dst = *src;
        }
    }
}

impl fmt::Debug for StridedHost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedHost")
            .field("len", &self.len)
            .field("stride", &self.stride)
            .finish()
    }
}

/// A device allocation borrowed for one call.
///
/// Only the address is kept; host code never dereferences it.
pub struct DeviceBuffer<'a> {
    ptr: u64,
    len: usize,
    _borrow: PhantomData<&'a mut [f64]>,
}

impl<'a> DeviceBuffer<'a> {
    /// Wraps a raw device address.
    ///
    /// # Safety
    ///
    /// `ptr` must address at least `len` doubles of device memory that stay
    /// allocated, and are not accessed by anyone else, for `'a`.
    pub unsafe fn from_raw(ptr: u64, len: usize) -> Self {
        Self {
            ptr,
            len,
            _borrow: PhantomData,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Device address of the first element.
    pub fn address(&self) -> u64 {
        self.ptr
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut f64 {
        self.ptr as usize as *mut f64
    }
}

impl fmt::Debug for DeviceBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("len", &self.len)
            .field("ptr", &format_args!("{:#x}", self.ptr))
            .finish()
    }
}

#[cfg(feature = "cuda")]
impl<'a> From<&'a mut DeviceArray> for DeviceBuffer<'a> {
    fn from(array: &'a mut DeviceArray) -> Self {
        let len = array.len();
        // SAFETY: the exclusive borrow keeps the allocation alive and
        // unaliased for 'a.
        unsafe { Self::from_raw(array.device_ptr_mut(), len) }
    }
}

/// Storage of one attribute for one bridge call.
#[derive(Debug)]
pub enum AttributeBuffer<'a> {
    /// Contiguous host memory, passed to native code without copying.
    Host(&'a mut [f64]),
    /// Strided host memory, staged through a contiguous copy.
    HostStaged(StridedHost<'a>),
    /// Device memory, passed by address.
    Device(DeviceBuffer<'a>),
}

impl AttributeBuffer<'_> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Host(data) => data.len(),
            Self::HostStaged(view) => view.len(),
            Self::Device(device) => device.len(),
        }
    }

    /// Returns true if the buffer has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Memory the data lives in.
    pub fn residency(&self) -> Residency {
        match self {
            Self::Host(_) | Self::HostStaged(_) => Residency::Host,
            Self::Device(_) => Residency::Device,
        }
    }

    /// Returns true if the data must be copied before a native call.
    pub fn needs_staging(&self) -> bool {
        matches!(self, Self::HostStaged(_))
    }
}

impl<'a> From<&'a mut [f64]> for AttributeBuffer<'a> {
    fn from(data: &'a mut [f64]) -> Self {
        Self::Host(data)
    }
}

impl<'a> From<&'a mut Vec<f64>> for AttributeBuffer<'a> {
    fn from(data: &'a mut Vec<f64>) -> Self {
        Self::Host(data.as_mut_slice())
    }
}

impl<'a> From<&'a mut DVector<f64>> for AttributeBuffer<'a> {
    fn from(data: &'a mut DVector<f64>) -> Self {
        Self::Host(data.as_mut_slice())
    }
}

impl<'a> From<StridedHost<'a>> for AttributeBuffer<'a> {
    fn from(view: StridedHost<'a>) -> Self {
        Self::HostStaged(view)
    }
}

impl<'a> From<DeviceBuffer<'a>> for AttributeBuffer<'a> {
    fn from(device: DeviceBuffer<'a>) -> Self {
        Self::Device(device)
    }
}

#[cfg(feature = "cuda")]
impl<'a> From<&'a mut DeviceArray> for AttributeBuffer<'a> {
    fn from(array: &'a mut DeviceArray) -> Self {
        Self::Device(DeviceBuffer::from(array))
    }
}
