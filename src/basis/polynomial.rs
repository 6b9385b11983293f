use super::FeatureMap;
use crate::error::{LspiError, Result};

/// Polynomial features of the first state component.
///
/// Each action owns a block of `degree` features `[1, x, x^2, ...]`; all
/// other blocks are zero.
#[derive(Debug, Clone)]
pub struct PolynomialBasis {
    degree: usize,
    num_actions: usize,
}

impl PolynomialBasis {
    /// Create a polynomial basis with `degree` terms per action
    pub fn new(degree: usize, num_actions: usize) -> Result<Self> {
        if degree == 0 || num_actions == 0 {
            return Err(LspiError::invalid(
                "polynomial basis needs a positive degree and action count",
            ));
        }
        Ok(Self {
            degree,
            num_actions,
        })
    }
}

impl FeatureMap for PolynomialBasis {
    fn evaluate(&self, state: &[f64], action: usize) -> Result<Vec<f64>> {
        let x = *state.first().ok_or(LspiError::DimensionMismatch {
            expected: 1,
            got: 0,
        })?;
        if action >= self.num_actions {
            return Err(LspiError::invalid(format!(
                "action {} out of range for {} actions",
                action, self.num_actions
            )));
        }

        let mut phi = vec![0.0; self.size()];
        let base = action * self.degree;
        let mut term = 1.0;
        for value in &mut phi[base..base + self.degree] {
            *value = term;
            term *= x;
        }
        Ok(phi)
    }

    fn size(&self) -> usize {
        self.degree * self.num_actions
    }
}
