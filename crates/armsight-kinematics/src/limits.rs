use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dh::{JointConfiguration, NUM_JOINTS};
use crate::error::KinematicsError;

/// Closed position interval `[lower, upper]` for every joint, in radians.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    bounds: [(f64, f64); NUM_JOINTS],
}

impl JointLimits {
    /// Create joint limits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if an interval is empty or not finite.
    pub fn new(bounds: [(f64, f64); NUM_JOINTS]) -> Result<Self, KinematicsError> {
        for (i, &(lower, upper)) in bounds.iter().enumerate() {
            if !lower.is_finite() || !upper.is_finite() || lower > upper {
                return Err(KinematicsError::InvalidConfiguration(format!(
                    "joint {} has an invalid interval [{lower}, {upper}]",
                    i + 1
                )));
            }
        }
        Ok(Self { bounds })
    }

    /// Limits of the Franka Emika Panda arm.
    pub fn franka_panda() -> Self {
        Self {
            bounds: [
                (-2.8973, 2.8973),
                (-1.7628, 1.7628),
                (-2.8973, 2.8973),
                (-3.071, -0.0698),
                (-2.8973, 2.8973),
                (-0.0175, 3.7525),
                (-2.8973, 2.8973),
            ],
        }
    }

    /// The `(lower, upper)` pairs in joint order.
    pub fn bounds(&self) -> &[(f64, f64); NUM_JOINTS] {
        &self.bounds
    }

    /// Whether every angle lies inside its closed interval.
    ///
    /// Configurations with the wrong number of joints are never contained.
    pub fn contains(&self, q: &[f64]) -> bool {
        q.len() == NUM_JOINTS
            && q
                .iter()
                .zip(self.bounds.iter())
                .all(|(&v, &(lower, upper))| v >= lower && v <= upper)
    }

    /// Clamp each angle into its interval.
    pub fn clamp(&self, q: &mut JointConfiguration) {
        for (v, &(lower, upper)) in q.iter_mut().zip(self.bounds.iter()) {
            *v = v.clamp(lower, upper);
        }
    }

    /// Draw a configuration uniformly from the box.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> JointConfiguration {
        let mut q = [0.0; NUM_JOINTS];
        for (v, &(lower, upper)) in q.iter_mut().zip(self.bounds.iter()) {
            *v = rng.random_range(lower..=upper);
        }
        q
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::franka_panda()
    }
}
