//! Box-constrained inverse kinematics.
//!
//! The solver minimises `0.5 * ||FK(q) - T||_F^2`, the squared Frobenius pose
//! error, with the L-BFGS quasi-Newton method from `argmin`. Joint limits are
//! enforced through the smooth change of variables
//! `q_i = c_i + h_i * sin(z_i)`, where `c_i` is the centre and `h_i` the
//! half-width of the interval of joint `i`; the optimizer works on the
//! unconstrained `z` and never sees an angle outside the box.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use argmin::core::{CostFunction, Error, Executor, Gradient, State, TerminationReason};
use argmin::solver::{linesearch::MoreThuenteLineSearch, quasinewton::LBFGS};
use glam::DMat4;
use serde::{Deserialize, Serialize};

use crate::chain::KinematicChain;
use crate::dh::{JointConfiguration, NUM_JOINTS};
use crate::error::KinematicsError;
use crate::limits::JointLimits;
use crate::transform::RigidTransform;

/// Seeds on a bound are moved inside by this fraction of the interval width,
/// where the change of variables has a zero derivative.
const BOUND_MARGIN: f64 = 1e-6;

/// Parameters of the inverse kinematics solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IkConfig {
    /// Maximum number of L-BFGS iterations.
    pub max_iterations: u64,
    /// Largest accepted Frobenius pose error of a solution.
    pub pose_tolerance: f64,
    /// Convergence threshold on the gradient norm.
    pub gradient_tolerance: f64,
    /// Convergence threshold on the change of cost between iterations.
    pub cost_tolerance: f64,
    /// Number of correction pairs kept by L-BFGS.
    pub history_size: usize,
    /// Wall-clock budget for a single solve.
    pub timeout: Option<Duration>,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            pose_tolerance: 1e-4,
            gradient_tolerance: 1e-9,
            cost_tolerance: f64::EPSILON,
            history_size: 10,
            timeout: None,
        }
    }
}

/// Shared flag to abort a running solve from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every solve holding this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A converged inverse kinematics solution.
#[derive(Clone, Debug, PartialEq)]
pub struct IkSolution {
    /// Joint angles inside the joint limits.
    pub joints: JointConfiguration,
    /// Frobenius distance between `FK(joints)` and the target.
    pub residual: f64,
    /// Number of optimizer iterations.
    pub iterations: u64,
}

/// Inverse kinematics solver for a [`KinematicChain`] with [`JointLimits`].
///
/// The result is a local solution close to the initial guess. Seeding with the
/// current joint state keeps the arm away from distant aliases of the same
/// pose. The solver never retries with a different seed.
///
/// # Examples
///
/// ```
/// use armsight_kinematics::{InverseSolver, HOME_CONFIGURATION};
///
/// let solver = InverseSolver::franka_panda();
/// let target = solver.chain().forward_kinematics(&HOME_CONFIGURATION)?;
/// let q = solver.solve(&target, &HOME_CONFIGURATION)?;
/// assert!(solver.limits().contains(&q));
/// # Ok::<(), armsight_kinematics::KinematicsError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct InverseSolver {
    chain: KinematicChain,
    limits: JointLimits,
    config: IkConfig,
}

impl InverseSolver {
    /// Create a solver.
    pub fn new(chain: KinematicChain, limits: JointLimits, config: IkConfig) -> Self {
        Self {
            chain,
            limits,
            config,
        }
    }

    /// Solver for the Franka Emika Panda with the default configuration.
    pub fn franka_panda() -> Self {
        Self::new(
            KinematicChain::franka_panda(),
            JointLimits::franka_panda(),
            IkConfig::default(),
        )
    }

    /// Replace the solver configuration.
    pub fn with_config(mut self, config: IkConfig) -> Self {
        self.config = config;
        self
    }

    /// The kinematic chain.
    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    /// The joint limits enforced on every solution.
    pub fn limits(&self) -> &JointLimits {
        &self.limits
    }

    /// The solver configuration.
    pub fn config(&self) -> &IkConfig {
        &self.config
    }

    /// Find joint angles whose forward kinematics match `target`.
    ///
    /// # Arguments
    ///
    /// * `target` - Desired pose of the joint 7 frame in the base frame.
    /// * `initial_guess` - Seed configuration; 7 angles in radians.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for a malformed seed or a non-finite
    /// target, and `IkFailure` when no in-bounds configuration within
    /// `pose_tolerance` was found.
    pub fn solve(
        &self,
        target: &RigidTransform,
        initial_guess: &[f64],
    ) -> Result<JointConfiguration, KinematicsError> {
        Ok(self.run(target, initial_guess, None)?.joints)
    }

    /// Same as [`InverseSolver::solve`] but also reports the residual and the
    /// iteration count.
    pub fn solve_detailed(
        &self,
        target: &RigidTransform,
        initial_guess: &[f64],
    ) -> Result<IkSolution, KinematicsError> {
        self.run(target, initial_guess, None)
    }

    /// Same as [`InverseSolver::solve_detailed`], aborting with `IkFailure`
    /// as soon as `token` is cancelled.
    pub fn solve_with_cancellation(
        &self,
        target: &RigidTransform,
        initial_guess: &[f64],
        token: &CancellationToken,
    ) -> Result<IkSolution, KinematicsError> {
        self.run(target, initial_guess, Some(token.clone()))
    }

    fn run(
        &self,
        target: &RigidTransform,
        initial_guess: &[f64],
        cancel: Option<CancellationToken>,
    ) -> Result<IkSolution, KinematicsError> {
        let seed: JointConfiguration = initial_guess
            .try_into()
            .map_err(|_| KinematicsError::joint_count(initial_guess.len(), NUM_JOINTS))?;
        if seed.iter().any(|v| !v.is_finite()) {
            return Err(KinematicsError::InvalidConfiguration(
                "initial guess contains non-finite angles".to_string(),
            ));
        }
        if !target.as_matrix().is_finite() {
            return Err(KinematicsError::InvalidConfiguration(
                "target pose contains non-finite entries".to_string(),
            ));
        }

        let box_map = BoxMap::new(&self.limits);
        let z0 = box_map.to_unbounded(&seed);
        log::debug!("IK seed: {:?}", box_map.to_joints(&z0));

        let problem = PoseObjective {
            chain: self.chain.clone(),
            target: *target.as_matrix(),
            box_map,
            cancel,
        };

        let failure = |reason: String, residual: f64| KinematicsError::IkFailure { reason, residual };

        let linesearch = MoreThuenteLineSearch::new();
        let solver = LBFGS::new(linesearch, self.config.history_size)
            .with_tolerance_grad(self.config.gradient_tolerance)
            .and_then(|s| s.with_tolerance_cost(self.config.cost_tolerance))
            .map_err(|e| failure(format!("invalid solver configuration: {e:#}"), f64::NAN))?;

        // stop early once the pose error is an order of magnitude below the tolerance
        let target_cost = 0.5 * (0.1 * self.config.pose_tolerance).powi(2);

        let mut executor = Executor::new(problem, solver).configure(|state| {
            state
                .param(z0)
                .max_iters(self.config.max_iterations)
                .target_cost(target_cost)
        });
        if let Some(timeout) = self.config.timeout {
            executor = executor.timeout(timeout);
        }

        let result = executor
            .run()
            .map_err(|e| failure(format!("optimizer aborted: {e:#}"), f64::NAN))?;

        let state = result.state();
        let iterations = state.get_iter();
        let z = state
            .get_best_param()
            .ok_or_else(|| failure("optimizer returned no parameters".to_string(), f64::NAN))?;

        let joints = box_map.to_joints(z);
        let residual = self
            .chain
            .forward_kinematics(&joints)?
            .frobenius_distance(target);

        log::debug!(
            "IK finished after {} iterations: {:?}, residual {:.3e}",
            iterations,
            state.get_termination_reason(),
            residual
        );

        match state.get_termination_reason() {
            Some(TerminationReason::SolverConverged | TerminationReason::TargetCostReached) => {
                if residual <= self.config.pose_tolerance {
                    Ok(IkSolution {
                        joints,
                        residual,
                        iterations,
                    })
                } else {
                    Err(failure(
                        "converged to a configuration that does not reach the target".to_string(),
                        residual,
                    ))
                }
            }
            Some(reason) => Err(failure(format!("terminated: {reason:?}"), residual)),
            None => Err(failure("optimizer did not terminate".to_string(), residual)),
        }
    }
}

/// Change of variables between unconstrained `z` and in-bounds joint angles.
#[derive(Clone, Copy, Debug)]
struct BoxMap {
    lower: [f64; NUM_JOINTS],
    upper: [f64; NUM_JOINTS],
    center: [f64; NUM_JOINTS],
    half_width: [f64; NUM_JOINTS],
}

impl BoxMap {
    fn new(limits: &JointLimits) -> Self {
        let bounds = limits.bounds();
        Self {
            lower: std::array::from_fn(|i| bounds[i].0),
            upper: std::array::from_fn(|i| bounds[i].1),
            center: std::array::from_fn(|i| 0.5 * (bounds[i].0 + bounds[i].1)),
            half_width: std::array::from_fn(|i| 0.5 * (bounds[i].1 - bounds[i].0)),
        }
    }

    /// Angles for `z`; the clamp only absorbs rounding at the interval ends.
    fn to_joints(&self, z: &[f64]) -> JointConfiguration {
        std::array::from_fn(|i| {
            (self.center[i] + self.half_width[i] * z[i].sin()).clamp(self.lower[i], self.upper[i])
        })
    }

    /// `dq_i / dz_i`.
    fn derivative(&self, z: &[f64]) -> JointConfiguration {
        std::array::from_fn(|i| self.half_width[i] * z[i].cos())
    }

    /// Inverse map of a seed, clamped into the open interval first.
    fn to_unbounded(&self, q: &JointConfiguration) -> Vec<f64> {
        (0..NUM_JOINTS)
            .map(|i| {
                if self.half_width[i] <= 0.0 {
                    return 0.0;
                }
                let margin = 2.0 * self.half_width[i] * BOUND_MARGIN;
                let v = q[i].clamp(self.lower[i] + margin, self.upper[i] - margin);
                ((v - self.center[i]) / self.half_width[i]).clamp(-1.0, 1.0).asin()
            })
            .collect()
    }
}

/// The IK objective expressed over the unconstrained variables.
struct PoseObjective {
    chain: KinematicChain,
    target: DMat4,
    box_map: BoxMap,
    cancel: Option<CancellationToken>,
}

impl PoseObjective {
    fn check_cancelled(&self) -> Result<(), Error> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::msg("cancelled")),
            _ => Ok(()),
        }
    }
}

impl CostFunction for PoseObjective {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, z: &Self::Param) -> Result<Self::Output, Error> {
        self.check_cancelled()?;
        let q = self.box_map.to_joints(z);
        let fk = self.chain.forward_kinematics(&q)?;
        let diff = *fk.as_matrix() - self.target;
        let cost = 0.5 * frobenius_inner(&diff, &diff);
        if !cost.is_finite() {
            return Err(Error::msg("non-finite cost"));
        }
        Ok(cost)
    }
}

impl Gradient for PoseObjective {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, z: &Self::Param) -> Result<Self::Gradient, Error> {
        self.check_cancelled()?;
        let q = self.box_map.to_joints(z);
        let dq_dz = self.box_map.derivative(z);
        let (fk, partials) = self.chain.matrix_with_partials(&q);
        let diff = fk - self.target;
        let gradient: Vec<f64> = partials
            .iter()
            .zip(dq_dz.iter())
            .map(|(partial, scale)| frobenius_inner(&diff, partial) * scale)
            .collect();
        if gradient.iter().any(|g| !g.is_finite()) {
            return Err(Error::msg("non-finite gradient"));
        }
        Ok(gradient)
    }
}

fn frobenius_inner(a: &DMat4, b: &DMat4) -> f64 {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .map(|(x, y)| x * y)
        .sum()
}
