use std::f64::consts::FRAC_PI_2;

use log::warn;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use crate::error::{LspiError, Result};
use crate::sample::Sample;
use crate::sampling::Simulator;

/// Force applied by each action, in newtons
const FORCES: [f64; 3] = [-50.0, 0.0, 50.0];
/// Initial angle and velocity are drawn from `[-INITIAL_SPREAD, INITIAL_SPREAD)`
const INITIAL_SPREAD: f64 = 0.2;

const POLE_MASS: f64 = 2.0;
const CART_MASS: f64 = 8.0;
const POLE_LENGTH: f64 = 0.5;
const GRAVITY: f64 = 9.8;

// Runge-Kutta-Fehlberg 4(5) tableau
const STAGES: [[f64; 5]; 5] = [
    [0.25, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0],
    [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0],
    [8341.0 / 4104.0, -32832.0 / 4104.0, 29440.0 / 4104.0, -845.0 / 4104.0, 0.0],
    [
        -6080.0 / 20520.0,
        41040.0 / 20520.0,
        -28352.0 / 20520.0,
        9295.0 / 20520.0,
        -5643.0 / 20520.0,
    ],
];
const SOLUTION_WEIGHTS: [f64; 6] = [
    902880.0 / 7618050.0,
    0.0,
    3953664.0 / 7618050.0,
    3855735.0 / 7618050.0,
    -1371249.0 / 7618050.0,
    277020.0 / 7618050.0,
];
const ERROR_WEIGHTS: [f64; 6] = [
    -2090.0 / 752400.0,
    0.0,
    22528.0 / 752400.0,
    21970.0 / 752400.0,
    -15048.0 / 752400.0,
    -27360.0 / 752400.0,
];

/// Inverted pendulum on a cart
///
/// The state is `[angle, angular velocity]` with the pendulum upright at
/// angle 0. Actions push the cart with -50, 0 or +50 N plus Gaussian noise,
/// and each step integrates the dynamics over `dt` seconds with an adaptive
/// Runge-Kutta-Fehlberg scheme. The pendulum falls once `|angle| > pi/2`:
/// that transition pays -1 and is terminal, every other transition pays 0.
/// There is no goal state.
#[derive(Debug, Clone)]
pub struct Pendulum {
    dt: f64,
    tolerance: f64,
    noise: Normal<f64>,
    state: [f64; 2],
    rng: StdRng,
}

impl Pendulum {
    /// Pendulum with a 0.1 s step, integration tolerance 1e-5 and noise
    /// standard deviation 10 N
    pub fn new(seed: u64) -> Result<Self> {
        Self::with_params(0.1, 1e-5, 10.0, seed)
    }

    pub fn with_params(dt: f64, tolerance: f64, noise: f64, seed: u64) -> Result<Self> {
        if !(dt > 0.0) {
            return Err(LspiError::invalid("time step must be positive"));
        }
        if !(tolerance > 0.0) {
            return Err(LspiError::invalid("integration tolerance must be positive"));
        }
        let noise = Normal::new(0.0, noise)
            .map_err(|e| LspiError::invalid(format!("invalid control noise: {}", e)))?;

        let mut pendulum = Self {
            dt,
            tolerance,
            noise,
            state: [0.0; 2],
            rng: StdRng::seed_from_u64(seed),
        };
        pendulum.reset();
        Ok(pendulum)
    }

    pub fn angle(&self) -> f64 {
        self.state[0]
    }

    pub fn velocity(&self) -> f64 {
        self.state[1]
    }

    /// Advance `state` by `dt` under constant `force`
    ///
    /// Returns `false` as second element when the step size collapsed before
    /// reaching `dt`.
    fn integrate(&self, state: [f64; 2], force: f64) -> ([f64; 2], bool) {
        let max_step = self.dt;
        let min_step = self.dt / 1000.0;
        let mut h = self.dt;
        let mut t = 0.0;
        let mut y = state;

        while t < self.dt && h >= min_step {
            if t + h > self.dt {
                h = self.dt - t;
            }

            let mut k = [[0.0; 2]; 6];
            k[0] = dynamics(y, force);
            for (j, coefficients) in STAGES.iter().enumerate() {
                let mut stage = y;
                for (ki, c) in k.iter().zip(coefficients).take(j + 1) {
                    stage[0] += h * c * ki[0];
                    stage[1] += h * c * ki[1];
                }
                k[j + 1] = dynamics(stage, force);
            }
            let combine = |weights: &[f64; 6]| {
                k.iter().zip(weights).fold([0.0; 2], |acc, (ki, w)| {
                    [acc[0] + h * w * ki[0], acc[1] + h * w * ki[1]]
                })
            };

            let error = combine(&ERROR_WEIGHTS);
            let delta = error[0].abs().max(error[1].abs());
            let tau = self.tolerance * y[0].abs().max(y[1].abs()).max(force.abs()).max(1.0);

            if delta <= tau {
                t += h;
                let increment = combine(&SOLUTION_WEIGHTS);
                y = [y[0] + increment[0], y[1] + increment[1]];
            }
            if delta != 0.0 {
                h = max_step.min(0.8 * h * (tau / delta).powf(0.2));
            }
        }
        (y, t >= self.dt)
    }
}

/// Time derivative of `[angle, velocity]` under `force`
fn dynamics(state: [f64; 2], force: f64) -> [f64; 2] {
    let [angle, velocity] = state;
    let (sin, cos) = angle.sin_cos();
    let a = 1.0 / (POLE_MASS + CART_MASS);
    let acceleration = (GRAVITY * sin
        - a * POLE_MASS * POLE_LENGTH * velocity * velocity * (2.0 * angle).sin() / 2.0
        - a * cos * force)
        / (4.0 / 3.0 * POLE_LENGTH - a * POLE_MASS * POLE_LENGTH * cos * cos);
    [velocity, acceleration]
}

fn fallen(state: &[f64; 2]) -> bool {
    state[0].abs() > FRAC_PI_2
}

impl Simulator for Pendulum {
    fn reset(&mut self) {
        self.state = [
            self.rng.random_range(-INITIAL_SPREAD..INITIAL_SPREAD),
            self.rng.random_range(-INITIAL_SPREAD..INITIAL_SPREAD),
        ];
    }

    fn step(&mut self, action: usize) -> Result<Sample> {
        let force = FORCES.get(action).ok_or_else(|| {
            LspiError::invalid(format!("action {} out of range for 3 actions", action))
        })? + self.noise.sample(&mut self.rng);

        let (next, completed) = self.integrate(self.state, force);
        if !completed {
            warn!(
                "Pendulum integration step size collapsed from state {:?}, singularity likely",
                self.state
            );
        }

        let terminal = fallen(&next);
        let reward = if terminal { -1.0 } else { 0.0 };
        let sample = Sample::with_absorb(self.state.to_vec(), action, reward, next.to_vec(), terminal);
        self.state = next;
        Ok(sample)
    }

    fn state(&self) -> Vec<f64> {
        self.state.to_vec()
    }

    fn set_state(&mut self, state: &[f64]) -> Result<()> {
        let &[angle, velocity] = state else {
            return Err(LspiError::DimensionMismatch {
                expected: 2,
                got: state.len(),
            });
        };
        if !angle.is_finite() || !velocity.is_finite() {
            return Err(LspiError::invalid("pendulum state must be finite"));
        }
        self.state = [angle, velocity];
        Ok(())
    }

    /// Continuous state: no discrete component sizes
    fn num_states(&self) -> Vec<usize> {
        Vec::new()
    }

    fn num_actions(&self) -> usize {
        FORCES.len()
    }

    fn is_non_goal_terminal(&self) -> bool {
        fallen(&self.state)
    }

    fn state_str(&self) -> String {
        format!("angle {:.4}, velocity {:.4}", self.state[0], self.state[1])
    }

    fn action_str(&self, action: usize) -> String {
        match FORCES.get(action) {
            Some(force) => format!("{:+} N", force),
            None => action.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn noiseless() -> Pendulum {
        let mut pendulum = Pendulum::with_params(0.1, 1e-5, 0.0, 20).unwrap();
        pendulum.set_state(&[0.1571, 0.1397]).unwrap();
        pendulum
    }

    #[test]
    fn test_noiseless_step() {
        let mut pendulum = noiseless();
        let sample = pendulum.step(1).unwrap();

        assert_eq!(sample.state(), &[0.1571, 0.1397]);
        assert_eq!(sample.action(), 1);
        assert_eq!(sample.reward(), 0.0);
        assert!(!sample.absorb());
        assert_abs_diff_eq!(sample.next_state()[0], 0.18512, epsilon = 1e-4);
        assert_abs_diff_eq!(sample.next_state()[1], 0.42837, epsilon = 1e-4);
        assert_eq!(pendulum.state(), sample.next_state());
    }

    #[test]
    fn test_force_direction() {
        let next = |action| {
            let mut pendulum = noiseless();
            pendulum.step(action).unwrap().next_state().to_vec()
        };
        let (left, none, right) = (next(0), next(1), next(2));

        // pushing the cart right swings the pendulum back
        assert_abs_diff_eq!(left[0], 0.22892, epsilon = 1e-4);
        assert_abs_diff_eq!(left[1], 1.31300, epsilon = 1e-4);
        assert_abs_diff_eq!(right[0], 0.14112, epsilon = 1e-4);
        assert_abs_diff_eq!(right[1], -0.46432, epsilon = 1e-4);
        assert!(left[1] > none[1] && none[1] > right[1]);
    }

    #[test]
    fn test_pendulum_falls_without_control() {
        let mut pendulum = noiseless();
        let mut last = None;
        for _ in 0..1000 {
            if pendulum.is_terminal() {
                break;
            }
            last = Some(pendulum.step(1).unwrap());
        }

        assert!(pendulum.is_terminal());
        assert!(pendulum.is_non_goal_terminal());
        assert!(!pendulum.is_goal());
        let last = last.unwrap();
        assert_eq!(last.reward(), -1.0);
        assert!(last.absorb());
        assert!(pendulum.angle() > FRAC_PI_2);
    }

    #[test]
    fn test_initial_state_distribution() {
        let pendulum = Pendulum::new(0).unwrap();
        assert_ne!(pendulum.angle(), 0.0);
        assert_ne!(pendulum.velocity(), 0.0);

        let runs = 20_000;
        let mut total = [0.0; 2];
        for seed in 1..=runs {
            let pendulum = Pendulum::new(seed).unwrap();
            assert!(pendulum.angle().abs() <= INITIAL_SPREAD);
            assert!(pendulum.velocity().abs() <= INITIAL_SPREAD);
            total[0] += pendulum.angle();
            total[1] += pendulum.velocity();
        }
        assert_abs_diff_eq!(total[0] / runs as f64, 0.0, epsilon = 0.01);
        assert_abs_diff_eq!(total[1] / runs as f64, 0.0, epsilon = 0.01);
    }

    #[test]
    fn test_invalid_input() {
        assert!(Pendulum::with_params(0.0, 1e-5, 10.0, 0).is_err());
        assert!(Pendulum::with_params(0.1, 0.0, 10.0, 0).is_err());
        assert!(Pendulum::with_params(0.1, 1e-5, -1.0, 0).is_err());

        let mut pendulum = Pendulum::new(0).unwrap();
        assert!(pendulum.step(3).is_err());
        assert!(pendulum.set_state(&[0.0]).is_err());
        assert!(pendulum.set_state(&[f64::NAN, 0.0]).is_err());
        assert_eq!(pendulum.num_actions(), 3);
        assert_eq!(pendulum.action_str(2), "+50 N");
    }
}
