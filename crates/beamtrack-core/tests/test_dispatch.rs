//! Integration tests for backend dispatch.
//!
//! These tests check the switching properties of the registry: switching
//! back restores the exact previous bindings, nothing from an old view
//! survives a switch, and resolution never crosses over to the inactive
//! backend.

use beamtrack_core::prelude::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn host(values: &[f64]) -> Array {
    Array::from(values)
}

/// Registry with unequal name sets, independent of the `cuda` feature.
fn labelled_registry() -> DispatchRegistry<&'static str> {
    let reg = DispatchRegistry::new();
    reg.register_all(
        Backend::Cpu,
        [("mean", "cpu.mean"), ("std", "cpu.std"), ("min", "cpu.min")],
    )
    .unwrap();
    reg.register_all(
        Backend::Gpu,
        [("mean", "gpu.mean"), ("std", "gpu.std"), ("gather", "gpu.gather")],
    )
    .unwrap();
    reg
}

fn bindings(view: &ActiveView<&'static str>) -> Vec<(String, &'static str)> {
    view.names()
        .map(|name| (name.to_string(), *view.get(name).unwrap()))
        .collect()
}

#[test]
fn test_switch_back_restores_bindings() {
    let reg = labelled_registry();
    reg.activate(Backend::Cpu);
    let before = bindings(&reg.snapshot());

    reg.activate(Backend::Gpu);
    reg.activate(Backend::Cpu);

    assert_eq!(bindings(&reg.snapshot()), before);
}

#[test]
fn test_no_stale_bindings_after_switch() {
    let reg = labelled_registry();
    reg.activate(Backend::Cpu);
    assert_eq!(reg.resolve("min").unwrap(), "cpu.min");

    reg.activate(Backend::Gpu);
    let view = reg.snapshot();
    assert!(!view.contains("min"));
    assert!(matches!(
        reg.resolve("min"),
        Err(DispatchError::BackendMismatch { .. })
    ));
    for name in view.names() {
        assert!(view.get(name).unwrap().starts_with("gpu."));
    }
}

#[test]
fn test_activating_same_backend_twice_is_identity() {
    let reg = labelled_registry();
    reg.activate(Backend::Gpu);
    let once = reg.snapshot();
    reg.activate(Backend::Gpu);
    let twice = reg.snapshot();

    assert!(once.ptr_eq(&twice));
    assert_eq!(bindings(&once), bindings(&twice));
}

#[test]
fn test_registration_into_active_backend_is_visible() {
    let reg = labelled_registry();
    reg.activate(Backend::Cpu);
    reg.register(Backend::Cpu, "max", "cpu.max").unwrap();

    assert_eq!(reg.resolve("max").unwrap(), "cpu.max");
    let view = reg.snapshot();
    assert_eq!(
        view.names().map(str::to_string).collect::<Vec<_>>(),
        reg.names(Backend::Cpu)
    );

    reg.register(Backend::Gpu, "sum", "gpu.sum").unwrap();
    assert!(reg.snapshot().ptr_eq(&view));
    assert!(matches!(
        reg.resolve("sum"),
        Err(DispatchError::BackendMismatch { .. })
    ));
}

#[test]
fn test_scoped_switch_restores_on_early_return() {
    fn run_on_gpu(reg: &DispatchRegistry<&'static str>) -> Result<&'static str> {
        let _guard = reg.scoped(Backend::Gpu);
        reg.resolve("min")?;
        Ok("unreachable")
    }

    let reg = labelled_registry();
    reg.activate(Backend::Cpu);
    assert!(run_on_gpu(&reg).is_err());
    assert_eq!(reg.active_backend(), Backend::Cpu);
    assert_eq!(reg.resolve("min").unwrap(), "cpu.min");
}

#[test]
fn test_default_registry_cpu_pipeline() {
    let reg = default_registry(&DispatchConfig::default());
    let x = host(&[3.0, 1.0, 2.0]);

    let sorted = reg.apply_permutation(&x, &[1, 2, 0]).unwrap();
    assert_eq!(sorted.as_host().unwrap().as_slice(), &[1.0, 2.0, 3.0]);
    assert_eq!(reg.reduce("sum", &sorted).unwrap(), 6.0);
    assert_eq!(reg.reduce("max", &sorted).unwrap(), 3.0);

    let err = reg.apply_permutation(&x, &[0, 1, 3]).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Compute {
            source: ComputeError::InvalidPermutation { .. },
            ..
        }
    ));
}

#[test]
fn test_initial_backend_from_config() {
    let config = DispatchConfig::builder()
        .initial_backend(Backend::Gpu)
        .build();
    let reg = default_registry(&config);
    assert_eq!(reg.active_backend(), Backend::Gpu);
    assert!(matches!(
        reg.reduce("min", &host(&[1.0])),
        Err(DispatchError::BackendMismatch { .. })
    ));
}

#[test]
fn test_global_registry_is_shared() {
    assert!(std::ptr::eq(registry(), registry()));
    assert!(registry().is_registered(Backend::Cpu, "emittance"));
}

fn backend_strategy() -> impl Strategy<Value = Backend> {
    prop_oneof![Just(Backend::Cpu), Just(Backend::Gpu)]
}

proptest! {
    #[test]
    fn prop_view_matches_last_activation(switches in prop::collection::vec(backend_strategy(), 1..32)) {
        let reg = labelled_registry();
        for backend in &switches {
            reg.activate(*backend);
        }
        let last = *switches.last().unwrap();
        let view = reg.snapshot();
        prop_assert_eq!(view.backend(), last);

        let prefix = format!("{}.", last);
        for name in view.names() {
            prop_assert!(view.get(name).unwrap().starts_with(&prefix));
        }
        prop_assert_eq!(view.len(), reg.names(last).len());
    }

    #[test]
    fn prop_guards_restore_starting_backend(
        start in backend_strategy(),
        nested in prop::collection::vec(backend_strategy(), 0..8),
    ) {
        fn descend(reg: &DispatchRegistry<&'static str>, rest: &[Backend]) {
            if let Some((first, rest)) = rest.split_first() {
                let _guard = reg.scoped(*first);
                descend(reg, rest);
            }
        }

        let reg = labelled_registry();
        reg.activate(start);
        descend(&reg, &nested);
        prop_assert_eq!(reg.active_backend(), start);
    }

    #[test]
    fn prop_mean_matches_sum_over_len(values in prop::collection::vec(-1e6f64..1e6, 1..256)) {
        let reg = default_registry(&DispatchConfig::default());
        let x = host(&values);
        let mean = reg.reduce("mean", &x).unwrap();
        let sum = reg.reduce("sum", &x).unwrap();
        prop_assert!((mean * values.len() as f64 - sum).abs() <= 1e-6 * (1.0 + sum.abs()));
    }
}
