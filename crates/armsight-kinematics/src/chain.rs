use glam::{DMat4, DVec4};

use crate::dh::{DhParameter, DhParameters, JointConfiguration, LinkId, NUM_JOINTS};
use crate::error::KinematicsError;
use crate::transform::RigidTransform;

/// Forward kinematics of a 7-joint serial arm described by Denavit-Hartenberg
/// parameters.
///
/// The chain only holds its parameter table, so it can be shared freely
/// between threads.
///
/// # Examples
///
/// ```
/// use armsight_kinematics::{KinematicChain, HOME_CONFIGURATION};
///
/// let chain = KinematicChain::franka_panda();
/// let ee = chain.forward_kinematics(&HOME_CONFIGURATION)?;
/// assert!(ee.is_rigid(1e-9));
/// # Ok::<(), armsight_kinematics::KinematicsError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KinematicChain {
    params: DhParameters,
}

impl KinematicChain {
    /// Create a chain from a parameter table.
    pub fn new(params: DhParameters) -> Self {
        Self { params }
    }

    /// Chain of the Franka Emika Panda arm.
    pub fn franka_panda() -> Self {
        Self::new(DhParameters::franka_panda())
    }

    /// The parameter table.
    pub fn parameters(&self) -> &DhParameters {
        &self.params
    }

    /// Homogeneous transform of a single segment for the joint angle `theta`.
    ///
    /// Computes `Rot_x(alpha) * Trans_x(a) * Rot_z(theta) * Trans_z(d)`.
    pub fn link_transform(&self, theta: f64, link: LinkId) -> RigidTransform {
        RigidTransform::from_matrix(dh_matrix(theta, self.params.get(link)))
    }

    /// Pose of the last joint frame (joint 7) in the base frame.
    ///
    /// The flange and gripper offsets are not applied, see
    /// [`KinematicChain::forward_kinematics_tool`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `q` does not hold exactly 7 angles.
    pub fn forward_kinematics(&self, q: &[f64]) -> Result<RigidTransform, KinematicsError> {
        let q = as_configuration(q)?;
        let ee = self
            .params
            .joints()
            .iter()
            .zip(q.iter())
            .fold(DMat4::IDENTITY, |acc, (p, &theta)| acc * dh_matrix(theta, p));
        Ok(RigidTransform::from_matrix(ee))
    }

    /// Fixed transform from the joint 7 frame to the gripper frame
    /// (flange followed by gripper, both at `theta = 0`).
    pub fn tool_offset(&self) -> RigidTransform {
        self.link_transform(0.0, LinkId::Flange) * self.link_transform(0.0, LinkId::Gripper)
    }

    /// Pose of the gripper frame in the base frame.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `q` does not hold exactly 7 angles.
    pub fn forward_kinematics_tool(&self, q: &[f64]) -> Result<RigidTransform, KinematicsError> {
        Ok(self.forward_kinematics(q)? * self.tool_offset())
    }

    /// Cumulative frames `A1 * .. * Ai` for `i = 1..=7`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `q` does not hold exactly 7 angles.
    pub fn link_frames(
        &self,
        q: &[f64],
    ) -> Result<[RigidTransform; NUM_JOINTS], KinematicsError> {
        let q = as_configuration(q)?;
        let mut frames = [RigidTransform::IDENTITY; NUM_JOINTS];
        let mut acc = DMat4::IDENTITY;
        for (i, (p, &theta)) in self.params.joints().iter().zip(q.iter()).enumerate() {
            acc *= dh_matrix(theta, p);
            frames[i] = RigidTransform::from_matrix(acc);
        }
        Ok(frames)
    }

    /// End-effector matrix together with its partial derivative with respect
    /// to every joint angle.
    ///
    /// `dF/dq_k = (A1 .. A_{k-1}) * dA_k/dtheta * (A_{k+1} .. A7)`, built from
    /// prefix and suffix products.
    pub(crate) fn matrix_with_partials(
        &self,
        q: &JointConfiguration,
    ) -> (DMat4, [DMat4; NUM_JOINTS]) {
        let links: [DMat4; NUM_JOINTS] =
            std::array::from_fn(|i| dh_matrix(q[i], &self.params.joints()[i]));

        // prefix[i] = A1 .. Ai, prefix[0] = I
        let mut prefix = [DMat4::IDENTITY; NUM_JOINTS + 1];
        for i in 0..NUM_JOINTS {
            prefix[i + 1] = prefix[i] * links[i];
        }

        // suffix[i] = A_{i+1} .. A7, suffix[NUM_JOINTS] = I
        let mut suffix = [DMat4::IDENTITY; NUM_JOINTS + 1];
        for i in (0..NUM_JOINTS).rev() {
            suffix[i] = links[i] * suffix[i + 1];
        }

        let partials = std::array::from_fn(|k| {
            prefix[k] * dh_matrix_derivative(q[k], &self.params.joints()[k]) * suffix[k + 1]
        });

        (prefix[NUM_JOINTS], partials)
    }
}

fn as_configuration(q: &[f64]) -> Result<&JointConfiguration, KinematicsError> {
    q.try_into()
        .map_err(|_| KinematicsError::joint_count(q.len(), NUM_JOINTS))
}

/// Closed form of the modified DH transform:
///
/// ```text
/// | c_theta          -s_theta          0        a        |
/// | s_theta*c_alpha   c_theta*c_alpha  -s_alpha -d*s_alpha |
/// | s_theta*s_alpha   c_theta*s_alpha   c_alpha  d*c_alpha |
/// | 0                 0                 0        1        |
/// ```
fn dh_matrix(theta: f64, p: &DhParameter) -> DMat4 {
    let (st, ct) = theta.sin_cos();
    let (sa, ca) = p.alpha.sin_cos();
    DMat4::from_cols(
        DVec4::new(ct, st * ca, st * sa, 0.0),
        DVec4::new(-st, ct * ca, ct * sa, 0.0),
        DVec4::new(0.0, -sa, ca, 0.0),
        DVec4::new(p.a, -p.d * sa, p.d * ca, 1.0),
    )
}

/// Derivative of [`dh_matrix`] with respect to `theta`.
fn dh_matrix_derivative(theta: f64, p: &DhParameter) -> DMat4 {
    let (st, ct) = theta.sin_cos();
    let (sa, ca) = p.alpha.sin_cos();
    DMat4::from_cols(
        DVec4::new(-st, ct * ca, ct * sa, 0.0),
        DVec4::new(-ct, -st * ca, -st * sa, 0.0),
        DVec4::ZERO,
        DVec4::ZERO,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dh::HOME_CONFIGURATION;
    use crate::limits::JointLimits;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn frobenius(m: &DMat4) -> f64 {
        m.to_cols_array().iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    #[test]
    fn test_fk_home_pose() -> Result<(), Box<dyn std::error::Error>> {
        let chain = KinematicChain::franka_panda();
        let ee = chain.forward_kinematics(&HOME_CONFIGURATION)?;

        assert!(ee.is_rigid(1e-9));

        let t = ee.translation_part();
        assert_relative_eq!(t[0], 0.3068905666, epsilon = 1e-9);
        assert_relative_eq!(t[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(t[2], 0.6972820523, epsilon = 1e-9);

        let r = ee.rotation_part();
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let expected = [[s, -s, 0.0], [-s, -s, 0.0], [0.0, 0.0, -1.0]];
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(r[i][j], expected[i][j], epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_fk_zero_pose() -> Result<(), Box<dyn std::error::Error>> {
        let chain = KinematicChain::franka_panda();
        let t = chain.forward_kinematics(&[0.0; 7])?.translation_part();
        // 0.333 + 0.316 + 0.384 stacked along z, 0.0825 - 0.0825 + 0.088 along x
        assert_relative_eq!(t[0], 0.088, epsilon = 1e-12);
        assert_relative_eq!(t[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(t[2], 1.033, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_fk_rejects_wrong_length() {
        let chain = KinematicChain::franka_panda();
        assert!(matches!(
            chain.forward_kinematics(&[0.0; 6]),
            Err(KinematicsError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            chain.forward_kinematics(&[0.0; 8]),
            Err(KinematicsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_fk_wraps_angles() -> Result<(), Box<dyn std::error::Error>> {
        let chain = KinematicChain::franka_panda();
        let mut q = HOME_CONFIGURATION;
        let a = chain.forward_kinematics(&q)?;
        q[0] += 2.0 * std::f64::consts::PI;
        q[4] -= 4.0 * std::f64::consts::PI;
        let b = chain.forward_kinematics(&q)?;
        assert_relative_eq!(a.frobenius_distance(&b), 0.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_link_transform_matches_dh_composition() {
        let chain = KinematicChain::franka_panda();
        let theta = 0.7;
        let p = *chain.parameters().get(LinkId::J4);

        let rot_x = DMat4::from_rotation_x(p.alpha);
        let trans_x = DMat4::from_translation(glam::DVec3::new(p.a, 0.0, 0.0));
        let rot_z = DMat4::from_rotation_z(theta);
        let trans_z = DMat4::from_translation(glam::DVec3::new(0.0, 0.0, p.d));
        let expected = RigidTransform::from_matrix(rot_x * trans_x * rot_z * trans_z);

        let link = chain.link_transform(theta, LinkId::J4);
        assert_relative_eq!(link.frobenius_distance(&expected), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tool_offset() -> Result<(), Box<dyn std::error::Error>> {
        let chain = KinematicChain::franka_panda();
        let offset = chain.tool_offset().translation_part();
        assert_relative_eq!(offset[2], 0.107 + 0.1034, epsilon = 1e-12);

        // the gripper points down at home, so the tool frame sits below joint 7
        let tool = chain.forward_kinematics_tool(&HOME_CONFIGURATION)?;
        assert_relative_eq!(tool.translation_part()[2], 0.4868820523, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_link_frames_end_with_fk() -> Result<(), Box<dyn std::error::Error>> {
        let chain = KinematicChain::franka_panda();
        let frames = chain.link_frames(&HOME_CONFIGURATION)?;
        let ee = chain.forward_kinematics(&HOME_CONFIGURATION)?;
        assert_eq!(frames[NUM_JOINTS - 1], ee);
        assert_relative_eq!(frames[0].translation_part()[2], 0.333, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_fk_continuity() -> Result<(), Box<dyn std::error::Error>> {
        let chain = KinematicChain::franka_panda();
        let limits = JointLimits::franka_panda();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20 {
            let q = limits.sample(&mut rng);
            let base = chain.forward_kinematics(&q)?;
            for k in 0..NUM_JOINTS {
                let mut previous = f64::INFINITY;
                for eps in [1e-2, 1e-3, 1e-4] {
                    let mut q_eps = q;
                    q_eps[k] += eps;
                    let d = chain.forward_kinematics(&q_eps)?.frobenius_distance(&base);
                    // a link transform is at most ~2 in Frobenius per radian here
                    assert!(d <= 5.0 * eps, "joint {k}: {d} for eps {eps}");
                    assert!(d <= previous);
                    previous = d;
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_partials_match_finite_differences() {
        let chain = KinematicChain::franka_panda();
        let limits = JointLimits::franka_panda();
        let mut rng = StdRng::seed_from_u64(3);
        let h = 1e-6;

        for _ in 0..10 {
            let q = limits.sample(&mut rng);
            let (_, partials) = chain.matrix_with_partials(&q);
            for (k, partial) in partials.iter().enumerate() {
                let mut q_plus = q;
                let mut q_minus = q;
                q_plus[k] += h;
                q_minus[k] -= h;
                let (f_plus, _) = chain.matrix_with_partials(&q_plus);
                let (f_minus, _) = chain.matrix_with_partials(&q_minus);
                let numeric = (f_plus - f_minus) * (0.5 / h);
                assert!(frobenius(&(numeric - *partial)) < 1e-6);
            }
        }
    }
}
