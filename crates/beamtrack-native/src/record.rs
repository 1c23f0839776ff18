//! The fixed-layout particle record passed to the tracking entry point.
//!
//! Layout and tag values are an external ABI shared with the native
//! library: `{ int npart; double *x, *xp, *y, *yp, *z, *dp, *q0, *mass0,
//! *beta0, *gamma0, *p0c; }` and `void run(record*, char tag)`.

use crate::attribute::ATTRIBUTE_COUNT;
use crate::error::{BridgeError, Result};
use beamtrack_core::types::Residency;
use std::os::raw::{c_char, c_int};

/// Tag telling the entry point the arrays are host memory.
pub const HOST_TAG: c_char = b'g' as c_char;

/// Tag telling the entry point the arrays are device memory.
pub const DEVICE_TAG: c_char = b'c' as c_char;

/// Signature of the tracking entry point.
pub type RunFn = unsafe extern "C" fn(record: *mut ParticleData, tag: c_char);

/// Tag byte for arrays in `residency`.
pub const fn residency_tag(residency: Residency) -> c_char {
    match residency {
        Residency::Host => HOST_TAG,
        Residency::Device => DEVICE_TAG,
    }
}

/// `particle_count` as the record's `int` field.
pub(crate) fn native_count(particle_count: usize) -> Result<c_int> {
    c_int::try_from(particle_count).map_err(|_| BridgeError::ParticleCountOverflow {
        count: particle_count,
    })
}

/// Particle count followed by one array pointer per attribute, in
/// attribute order.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ParticleData {
    /// Number of particles; every array holds this many doubles.
    pub npart: c_int,
    /// Horizontal position
    pub x: *mut f64,
    /// Horizontal momentum
    pub xp: *mut f64,
    /// Vertical position
    pub y: *mut f64,
    /// Vertical momentum
    pub yp: *mut f64,
    /// Longitudinal position
    pub z: *mut f64,
    /// Relative momentum deviation
    pub dp: *mut f64,
    /// Reference charge
    pub q0: *mut f64,
    /// Reference rest mass
    pub mass0: *mut f64,
    /// Reference relativistic beta
    pub beta0: *mut f64,
    /// Reference relativistic gamma
    pub gamma0: *mut f64,
    /// Reference momentum times c
    pub p0c: *mut f64,
}

impl ParticleData {
    /// Builds a record from pointers given in attribute order.
    pub fn new(npart: c_int, pointers: [*mut f64; ATTRIBUTE_COUNT]) -> Self {
        let [x, xp, y, yp, z, dp, q0, mass0, beta0, gamma0, p0c] = pointers;
        Self {
            npart,
            x,
            xp,
            y,
            yp,
            z,
            dp,
            q0,
            mass0,
            beta0,
            gamma0,
            p0c,
        }
    }

    /// The array pointers in attribute order.
    pub fn pointers(&self) -> [*mut f64; ATTRIBUTE_COUNT] {
        [
            self.x,
            self.xp,
            self.y,
            self.yp,
            self.z,
            self.dp,
            self.q0,
            self.mass0,
            self.beta0,
            self.gamma0,
            self.p0c,
        ]
    }
}
