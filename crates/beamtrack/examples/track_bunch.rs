//! Example: track a Gaussian bunch through a native tracking library.
//!
//! Builds a 6D Gaussian proton bunch, prints its transverse emittances,
//! hands it to the library given on the command line (or in
//! `BEAMTRACK_TRACKING_LIB`) and prints the emittances again.
//!
//! ```text
//! cargo run --example track_bunch -- ./libtrack.so
//! RUST_LOG=debug cargo run --example track_bunch
//! ```

use beamtrack::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::error::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxResult<T> = std::result::Result<T, Box<dyn Error>>;

const N_MACROPARTICLES: usize = 10_000;
const PROTON_MASS_EV: f64 = 938.272_088e6;
const GAMMA: f64 = 2.49;
const EPSN_X: f64 = 2e-6;
const EPSN_Y: f64 = 2e-6;
const BETA_X: f64 = 16.0;
const BETA_Y: f64 = 22.0;
const SIGMA_Z: f64 = 12.0;
const SIGMA_DP: f64 = 1e-3;

fn gaussian_bunch(n: usize, seed: u64) -> BoxResult<ParticleColumns> {
    let beta = (1.0 - GAMMA.powi(-2)).sqrt();
    let p0c = PROTON_MASS_EV * beta * GAMMA;
    let (eps_x, eps_y) = (EPSN_X / (beta * GAMMA), EPSN_Y / (beta * GAMMA));

    let mut rng = StdRng::seed_from_u64(seed);
    let mut sample = |sigma: f64| -> BoxResult<Vec<f64>> {
        let normal = Normal::new(0.0, sigma)?;
        Ok((0..n).map(|_| normal.sample(&mut rng)).collect())
    };

    let mut bunch = ParticleColumns::zeros(n);
    for (attribute, sigma) in [
        (Attribute::X, (eps_x * BETA_X).sqrt()),
        (Attribute::Xp, (eps_x / BETA_X).sqrt()),
        (Attribute::Y, (eps_y * BETA_Y).sqrt()),
        (Attribute::Yp, (eps_y / BETA_Y).sqrt()),
        (Attribute::Z, SIGMA_Z),
        (Attribute::Dp, SIGMA_DP),
    ] {
        bunch.set_column(attribute, DVector::from_vec(sample(sigma)?))?;
    }
    bunch.fill(Attribute::Q0, 1.0);
    bunch.fill(Attribute::Mass0, PROTON_MASS_EV);
    bunch.fill(Attribute::Beta0, beta);
    bunch.fill(Attribute::Gamma0, GAMMA);
    bunch.fill(Attribute::P0c, p0c);
    Ok(bunch)
}

fn emittances(reg: &DispatchRegistry<Kernel>, bunch: &ParticleColumns) -> BoxResult<(f64, f64)> {
    let column = |attribute| Array::from(bunch.column(attribute).clone());
    let dp = column(Attribute::Dp);
    let eps_x = reg.emittance(&column(Attribute::X), &column(Attribute::Xp), Some(&dp))?;
    let eps_y = reg.emittance(&column(Attribute::Y), &column(Attribute::Yp), Some(&dp))?;
    Ok((eps_x, eps_y))
}

fn main() -> BoxResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beamtrack_native=info,beamtrack_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = BridgeConfig::from_env();
    if let Some(path) = std::env::args_os().nth(1) {
        config.library_path = Some(path.into());
    }

    println!("Native Tracking Example");
    println!("=======================\n");

    let reg = registry();
    let _cpu = reg.scoped(Backend::Cpu);

    let mut bunch = gaussian_bunch(N_MACROPARTICLES, 42)?;
    let (eps_x, eps_y) = emittances(reg, &bunch)?;
    println!("Before tracking:");
    println!("  particles: {}", bunch.len());
    println!("  eps_x:     {eps_x:.4e} m rad");
    println!("  eps_y:     {eps_y:.4e} m rad");

    let bridge = match NativeBridge::from_config(&config) {
        Ok(bridge) => bridge,
        Err(err) => {
            println!("\nNo tracking library: {err}");
            println!("Pass a library path or set BEAMTRACK_TRACKING_LIB.");
            return Ok(());
        }
    };
    info!(?bridge, "tracking");
    bridge.invoke(bunch.attribute_set(), N_MACROPARTICLES)?;

    let (eps_x, eps_y) = emittances(reg, &bunch)?;
    println!("\nAfter tracking:");
    println!("  eps_x:     {eps_x:.4e} m rad");
    println!("  eps_y:     {eps_y:.4e} m rad");
    let mean_x = reg.reduce("mean", &Array::from(bunch.column(Attribute::X).clone()))?;
    println!("  mean x:    {mean_x:.4e} m");

    Ok(())
}
