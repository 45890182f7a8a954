use std::ops::Mul;

use glam::{DMat3, DMat4, DVec3};

/// A rigid body transform stored as a 4x4 homogeneous matrix.
///
/// The top-left 3x3 block is a rotation and the last column holds the
/// translation. The rotation and translation are only exposed as views derived
/// from the matrix, so the two parts can never drift apart.
///
/// # Examples
///
/// ```
/// use armsight_kinematics::RigidTransform;
///
/// let a = RigidTransform::from_translation([1.0, 0.0, 0.0]);
/// let b = RigidTransform::from_translation([0.0, 2.0, 0.0]);
/// let c = a * b;
///
/// assert_eq!(c.translation_part(), [1.0, 2.0, 0.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform(DMat4);

impl RigidTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self(DMat4::IDENTITY);

    /// Create the identity transform.
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Wrap a homogeneous matrix.
    ///
    /// PRECONDITION: the matrix is rigid; see [`RigidTransform::is_rigid`].
    pub fn from_matrix(matrix: DMat4) -> Self {
        Self(matrix)
    }

    /// Create a transform from a row-major 4x4 array.
    pub fn from_rows(rows: &[[f64; 4]; 4]) -> Self {
        // glam stores columns, so the row-major array is read as columns and transposed
        Self(DMat4::from_cols_array_2d(rows).transpose())
    }

    /// Create a pure translation.
    pub fn from_translation(translation: [f64; 3]) -> Self {
        Self(DMat4::from_translation(DVec3::from_array(translation)))
    }

    /// Create a transform from a rotation matrix (row-major) and a translation.
    pub fn from_parts(rotation: &[[f64; 3]; 3], translation: [f64; 3]) -> Self {
        let r = DMat3::from_cols_array_2d(rotation).transpose();
        let mut m = DMat4::from_mat3(r);
        m.w_axis = DVec3::from_array(translation).extend(1.0);
        Self(m)
    }

    /// The underlying homogeneous matrix.
    pub fn as_matrix(&self) -> &DMat4 {
        &self.0
    }

    /// The matrix as a row-major 4x4 array.
    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        self.0.transpose().to_cols_array_2d()
    }

    /// The rotation block as a row-major 3x3 array.
    pub fn rotation_part(&self) -> [[f64; 3]; 3] {
        DMat3::from_mat4(self.0).transpose().to_cols_array_2d()
    }

    /// The translation column.
    pub fn translation_part(&self) -> [f64; 3] {
        self.0.w_axis.truncate().to_array()
    }

    /// The inverse rigid transform `[R^T | -R^T t]`.
    pub fn inverse(&self) -> Self {
        let rt = DMat3::from_mat4(self.0).transpose();
        let t = self.0.w_axis.truncate();
        let mut m = DMat4::from_mat3(rt);
        m.w_axis = (-(rt * t)).extend(1.0);
        Self(m)
    }

    /// Apply the transform to a point.
    pub fn transform_point(&self, point: [f64; 3]) -> [f64; 3] {
        self.0
            .transform_point3(DVec3::from_array(point))
            .to_array()
    }

    /// Frobenius norm of the element-wise difference between two transforms.
    pub fn frobenius_distance(&self, other: &Self) -> f64 {
        self.0
            .to_cols_array()
            .iter()
            .zip(other.0.to_cols_array().iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Check that the rotation block is orthonormal with a positive determinant
    /// and that the bottom row is `[0, 0, 0, 1]`, up to `tolerance`.
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        let r = DMat3::from_mat4(self.0);
        let rtr = r.transpose() * r;
        let orthonormal = rtr.abs_diff_eq(DMat3::IDENTITY, tolerance);
        let proper = (r.determinant() - 1.0).abs() <= tolerance;
        let row = self.0.row(3);
        let bottom = row.abs_diff_eq(glam::DVec4::W, tolerance);
        orthonormal && proper && bottom
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: RigidTransform) -> Self::Output {
        RigidTransform(self.0 * rhs.0)
    }
}

impl Mul<&RigidTransform> for &RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: &RigidTransform) -> Self::Output {
        RigidTransform(self.0 * rhs.0)
    }
}

impl From<RigidTransform> for DMat4 {
    fn from(transform: RigidTransform) -> Self {
        transform.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rot_z(angle: f64) -> [[f64; 3]; 3] {
        let (s, c) = angle.sin_cos();
        [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
    }

    #[test]
    fn test_rows_roundtrip_keeps_layout() {
        let rows = [
            [0.0, -1.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 2.0],
            [0.0, 0.0, 1.0, 3.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let t = RigidTransform::from_rows(&rows);
        assert_eq!(t.to_rows(), rows);
        assert_eq!(t.translation_part(), [1.0, 2.0, 3.0]);
        assert_eq!(
            t.rotation_part(),
            [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn test_composition_is_not_commutative() {
        let a = RigidTransform::from_parts(&rot_z(std::f64::consts::FRAC_PI_2), [0.0; 3]);
        let b = RigidTransform::from_translation([1.0, 0.0, 0.0]);

        let ab = (a * b).translation_part();
        let ba = (b * a).translation_part();

        assert_relative_eq!(ab[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(ab[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(ba[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(ba[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse() {
        let t = RigidTransform::from_parts(&rot_z(0.3), [0.5, -0.2, 1.0]);
        let identity = t * t.inverse();
        assert_relative_eq!(
            identity.frobenius_distance(&RigidTransform::IDENTITY),
            0.0,
            epsilon = 1e-12
        );
        assert!(t.inverse().is_rigid(1e-12));
    }

    #[test]
    fn test_transform_point() {
        let t = RigidTransform::from_parts(&rot_z(std::f64::consts::FRAC_PI_2), [1.0, 0.0, 0.0]);
        let p = t.transform_point([1.0, 0.0, 0.0]);
        assert_relative_eq!(p[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(p[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_is_rigid_rejects_scaling() {
        let scaled = RigidTransform::from_matrix(DMat4::from_scale(DVec3::splat(2.0)));
        assert!(!scaled.is_rigid(1e-9));
        assert!(RigidTransform::identity().is_rigid(1e-12));
    }
}
