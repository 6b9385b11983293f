use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::FeatureMap;
use crate::error::{LspiError, Result};

const CENTERS_PER_ACTION: usize = 9;
const SIGMA2: f64 = 1.0;

/// Gaussian radial basis over a 2-D (angle, angular velocity) state.
///
/// Each action owns a block of a constant bias term plus a 3x3 grid of
/// Gaussians centred at angles `{-pi/4, 0, pi/4}` and velocities
/// `{-1, 0, 1}`. States with `|angle| > pi/2` and invalid actions map to the
/// zero vector.
#[derive(Debug, Clone)]
pub struct GaussianRbf {
    num_actions: usize,
}

impl GaussianRbf {
    pub fn new(num_actions: usize) -> Result<Self> {
        if num_actions == 0 {
            return Err(LspiError::invalid("number of actions must be positive"));
        }
        Ok(Self { num_actions })
    }

    fn block_size() -> usize {
        CENTERS_PER_ACTION + 1
    }
}

impl FeatureMap for GaussianRbf {
    fn evaluate(&self, state: &[f64], action: usize) -> Result<Vec<f64>> {
        if state.len() < 2 {
            return Err(LspiError::DimensionMismatch {
                expected: 2,
                got: state.len(),
            });
        }

        let mut phi = vec![0.0; self.size()];
        if action >= self.num_actions || state[0].abs() > FRAC_PI_2 {
            return Ok(phi);
        }

        let mut index = Self::block_size() * action;
        phi[index] = 1.0;
        for x in [-FRAC_PI_4, 0.0, FRAC_PI_4] {
            for y in [-1.0, 0.0, 1.0] {
                index += 1;
                let dist = (state[0] - x).powi(2) + (state[1] - y).powi(2);
                phi[index] = (-dist / (2.0 * SIGMA2)).exp();
            }
        }
        Ok(phi)
    }

    fn size(&self) -> usize {
        Self::block_size() * self.num_actions
    }
}
