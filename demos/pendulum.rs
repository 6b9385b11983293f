//! Balances the inverted pendulum with a policy learned from random pushes.
//!
//! Run with `cargo run --example pendulum`.
use std::sync::Arc;

use anyhow::Result;
use lspi::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = StdRng::seed_from_u64(42);
    let mut pendulum = Pendulum::new(0)?;
    let basis: Arc<dyn FeatureMap> = Arc::new(GaussianRbf::new(pendulum.num_actions())?);

    let random = Policy::with_zero_weights(1.0, 3, basis.clone())?;
    let samples = collect_samples(&mut pendulum, 1000, 50, &random, &mut rng)?;
    log::info!("Collected {} samples from 1000 episodes", samples.len());

    let lspi = Lspi::new(LspiConfig::default().max_iterations(20))?;
    let initial = Policy::with_zero_weights(0.0, 3, basis)?;
    let outcome = lspi.learn(&samples, &initial, &mut rng)?;
    println!(
        "{:?} after {} iterations (weight change {:.3e})",
        outcome.termination, outcome.iterations, outcome.distance
    );

    let random_return = evaluate_policy(&mut pendulum, 1000, 50, &random, &mut rng)?;
    let learned_return = evaluate_policy(&mut pendulum, 1000, 50, &outcome.policy, &mut rng)?;
    println!(
        "average return: random {:.3}, learned {:.3}",
        random_return, learned_return
    );
    Ok(())
}
