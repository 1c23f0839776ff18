//! End-to-end: statistics through the registry around a native tracking call.

use beamtrack::prelude::*;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::os::raw::c_char;

/// Linear drift of length 1: `x += xp`, `y += yp`.
unsafe extern "C" fn unit_drift(record: *mut ParticleData, tag: c_char) {
    assert_eq!(tag, HOST_TAG);
    // SAFETY: the bridge passes a valid record of host arrays.
    let record = unsafe { &*record };
    for i in 0..record.npart as usize {
        unsafe {
            *record.x.add(i) += *record.xp.add(i);
            *record.y.add(i) += *record.yp.add(i);
        }
    }
}

fn normal_bunch(n: usize) -> ParticleColumns {
    let mut rng = StdRng::seed_from_u64(0);
    let normal = Normal::new(0.0, 1e-3).unwrap();
    ParticleColumns::from_fn(n, |attr, _| match attr {
        Attribute::X | Attribute::Xp | Attribute::Y | Attribute::Yp => normal.sample(&mut rng),
        Attribute::Gamma0 => 2.49,
        _ => 0.0,
    })
}

fn host(bunch: &ParticleColumns, attr: Attribute) -> Array {
    Array::from(bunch.column(attr).clone())
}

#[test]
fn test_drift_preserves_emittance() {
    let n = 100_000;
    let reg = default_registry(&DispatchConfig::default());
    let mut bunch = normal_bunch(n);

    let before = reg
        .emittance(&host(&bunch, Attribute::X), &host(&bunch, Attribute::Xp), None)
        .unwrap();
    let std_before = reg.reduce("std", &host(&bunch, Attribute::X)).unwrap();

    NativeBridge::with_entry_point(unit_drift)
        .invoke(bunch.attribute_set(), n)
        .unwrap();

    let after = reg
        .emittance(&host(&bunch, Attribute::X), &host(&bunch, Attribute::Xp), None)
        .unwrap();
    let std_after = reg.reduce("std", &host(&bunch, Attribute::X)).unwrap();

    assert!((after - before).abs() <= 1e-9 * before);
    assert!(std_after > std_before);
    assert_eq!(bunch.len(), n);
}

#[test]
fn test_reference_columns_untouched() {
    let mut bunch = normal_bunch(16);
    let gamma = bunch.column(Attribute::Gamma0).clone();

    NativeBridge::with_entry_point(unit_drift)
        .invoke(bunch.attribute_set(), 16)
        .unwrap();
    assert_eq!(bunch.column(Attribute::Gamma0), &gamma);
}
