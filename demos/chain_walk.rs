//! Learns a chain-walk policy from random exploration and prints it.
//!
//! Run with `cargo run --example chain_walk [config.yaml]`; set `RUST_LOG`
//! to `debug` to follow the solver.
use std::sync::Arc;

use anyhow::Result;
use lspi::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

const NUM_STATES: usize = 20;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => LspiConfig::load(path)?,
        None => LspiConfig::default()
            .max_iterations(20)
            .improver(PolicyImprover::LstdqExact),
    };

    let mut rng = StdRng::seed_from_u64(42);
    let mut chain = Chain::new(NUM_STATES, 0.9, 0)?;
    let basis: Arc<dyn FeatureMap> = Arc::new(ExactBasis::new(&chain.num_states(), 2)?);

    let random = Policy::with_zero_weights(1.0, 2, basis.clone())?;
    let samples = collect_samples(&mut chain, 10, 500, &random, &mut rng)?;
    log::info!("Collected {} samples", samples.len());

    let lspi = Lspi::new(config)?;
    let initial = Policy::with_zero_weights(0.0, 2, basis)?;
    let outcome = lspi.learn(&samples, &initial, &mut rng)?;
    println!(
        "{:?} after {} iterations (weight change {:.3e})",
        outcome.termination, outcome.iterations, outcome.distance
    );

    for s in 0..NUM_STATES {
        chain.set_state(&[s as f64])?;
        let action = outcome.policy.evaluate(&chain.state(), &mut rng)?;
        println!("state {:>2}: {}", s, chain.action_str(action));
    }

    let random_return = evaluate_policy(&mut chain, 10, 500, &random, &mut rng)?;
    let learned_return = evaluate_policy(&mut chain, 10, 500, &outcome.policy, &mut rng)?;
    println!(
        "average return: random {:.1}, learned {:.1}",
        random_return, learned_return
    );
    Ok(())
}
