/// An error type for the kinematics module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// The joint vector or a link identifier does not describe the chain.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The inverse solver did not reach the target pose.
    #[error("Inverse kinematics failed: {reason} (residual {residual:.3e})")]
    IkFailure {
        /// Why the solve was abandoned.
        reason: String,
        /// Frobenius pose error at the last evaluated configuration.
        residual: f64,
    },
}

impl KinematicsError {
    pub(crate) fn joint_count(len: usize, expected: usize) -> Self {
        KinematicsError::InvalidConfiguration(format!(
            "expected {expected} joint angles, got {len}"
        ))
    }
}
