#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Forward and inverse kinematics
//!
//! ```rust
//! use armsight_kinematics::{InverseSolver, HOME_CONFIGURATION};
//!
//! let solver = InverseSolver::franka_panda();
//!
//! // pose of the last joint frame at the home configuration
//! let target = solver.chain().forward_kinematics(&HOME_CONFIGURATION)?;
//!
//! // recover joint angles for that pose, seeded from a nearby state
//! let seed = HOME_CONFIGURATION.map(|q| q + 0.01);
//! let q = solver.solve(&target, &seed)?;
//! assert!(solver.limits().contains(&q));
//! # Ok::<(), armsight_kinematics::KinematicsError>(())
//! ```

/// Kinematic chain and forward kinematics.
pub mod chain;

/// Denavit-Hartenberg parameter tables.
pub mod dh;

/// Error types for the kinematics module.
pub mod error;

/// Inverse kinematics solver.
pub mod ik;

/// Joint position limits.
pub mod limits;

/// Rigid body transforms.
pub mod transform;

pub use chain::KinematicChain;
pub use dh::{
    DhParameter, DhParameters, JointConfiguration, LinkId, HOME_CONFIGURATION, NUM_JOINTS,
};
pub use error::KinematicsError;
pub use ik::{CancellationToken, IkConfig, IkSolution, InverseSolver};
pub use limits::JointLimits;
pub use transform::RigidTransform;
