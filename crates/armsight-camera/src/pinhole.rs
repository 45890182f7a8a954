use serde::{Deserialize, Serialize};

use crate::depth::{DepthImage, ImageSize};
use crate::error::CameraError;

/// Represents the intrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `ax` - The focal scale along the x axis
/// * `ay` - The focal scale along the y axis
/// * `u0` - The x coordinate of the principal point
/// * `v0` - The y coordinate of the principal point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// The focal scale along the x axis
    pub ax: f64,
    /// The focal scale along the y axis
    pub ay: f64,
    /// The x coordinate of the principal point
    pub u0: f64,
    /// The y coordinate of the principal point
    pub v0: f64,
}

impl CameraIntrinsics {
    /// Derive the intrinsics from a vertical field of view and a resolution.
    ///
    /// The focal scale is `1 / (2 * tan(fov / 2))` and is not multiplied by
    /// the resolution, so unprojected x and y come out in depth units times
    /// pixels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIntrinsics` if the field of view is outside `(0, 180)`
    /// degrees or either dimension is zero.
    pub fn from_fov(fov_deg: f64, resolution: ImageSize) -> Result<Self, CameraError> {
        if !(fov_deg > 0.0 && fov_deg < 180.0) {
            return Err(CameraError::InvalidIntrinsics(format!(
                "field of view must be in (0, 180) degrees, got {fov_deg}"
            )));
        }
        if resolution.width == 0 || resolution.height == 0 {
            return Err(CameraError::InvalidIntrinsics(format!(
                "resolution must be non-zero, got {resolution}"
            )));
        }

        let ax = 1.0 / (2.0 * (fov_deg.to_radians() / 2.0).tan());
        Ok(Self {
            ax,
            ay: ax,
            u0: resolution.width as f64 / 2.0,
            v0: resolution.height as f64 / 2.0,
        })
    }

    /// The 3x3 camera matrix `[[ax, 0, u0], [0, ay, v0], [0, 0, 1]]`, row-major.
    pub fn camera_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.ax, 0.0, self.u0],
            [0.0, self.ay, self.v0],
            [0.0, 0.0, 1.0],
        ]
    }
}

/// Readings exposed by a depth sensor handle.
pub trait SensorReadings {
    /// Vertical field of view in degrees.
    fn perspective_angle(&self) -> f64;

    /// Image resolution in pixels.
    fn resolution(&self) -> ImageSize;
}

/// Lifts depth pixels into 3D points in the camera frame.
///
/// The intrinsics are computed once at construction. If the sensor's field of
/// view or resolution changes afterwards, build a new unprojector.
///
/// # Examples
///
/// ```
/// use armsight_camera::{DepthImage, ImageSize, PinholeUnprojector};
///
/// let size = ImageSize { width: 640, height: 480 };
/// let unprojector = PinholeUnprojector::new(60.0, size).unwrap();
/// let depth = DepthImage::from_size_val(size, 2.0).unwrap();
///
/// let point = unprojector.unproject(&depth, 320, 240).unwrap();
/// assert_eq!(point, [0.0, 0.0, 2.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PinholeUnprojector {
    intrinsics: CameraIntrinsics,
}

impl PinholeUnprojector {
    /// Create an unprojector for a vertical field of view in degrees and a resolution.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIntrinsics` for a degenerate field of view or resolution.
    pub fn new(fov_deg: f64, resolution: ImageSize) -> Result<Self, CameraError> {
        Ok(Self {
            intrinsics: CameraIntrinsics::from_fov(fov_deg, resolution)?,
        })
    }

    /// Create an unprojector from the current readings of a sensor.
    pub fn from_sensor<S: SensorReadings + ?Sized>(sensor: &S) -> Result<Self, CameraError> {
        Self::new(sensor.perspective_angle(), sensor.resolution())
    }

    /// The cached intrinsics.
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Unproject the pixel at column `u` and row `v` into a camera-frame point.
    ///
    /// # Arguments
    ///
    /// * `depth` - The depth image.
    /// * `u` - The pixel column.
    /// * `v` - The pixel row.
    ///
    /// # Returns
    ///
    /// The point `[x, y, z]` with `z` the depth at the pixel.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the pixel lies outside the depth image.
    pub fn unproject(&self, depth: &DepthImage, u: usize, v: usize) -> Result<[f64; 3], CameraError> {
        let z = depth.get(u, v).ok_or(CameraError::OutOfRange {
            u,
            v,
            width: depth.width(),
            height: depth.height(),
        })?;
        Ok(self.lift(z, u, v))
    }

    /// Unproject every pixel of a depth image, in row-major order.
    pub fn unproject_depth(&self, depth: &DepthImage) -> Vec<[f64; 3]> {
        let width = depth.width();
        depth
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &z)| self.lift(z, i % width, i / width))
            .collect()
    }

    fn lift(&self, z: f64, u: usize, v: usize) -> [f64; 3] {
        let CameraIntrinsics { ax, ay, u0, v0 } = self.intrinsics;
        [z * (u as f64 - u0) / ax, z * (v as f64 - v0) / ay, z]
    }
}
