use serde::{Deserialize, Serialize};

use crate::error::CameraError;

/// Image size in pixels
///
/// # Examples
///
/// ```
/// use armsight_camera::ImageSize;
///
/// let image_size = ImageSize {
///   width: 640,
///   height: 480,
/// };
///
/// assert_eq!(image_size.width, 640);
/// assert_eq!(image_size.height, 480);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels, `width * height`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidImageSize` if the product overflows `usize`.
    pub fn num_pixels(&self) -> Result<usize, CameraError> {
        self.width
            .checked_mul(self.height)
            .ok_or(CameraError::InvalidImageSize(*self))
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// A single-channel depth image.
///
/// Depth values are distances along the optical axis, stored row-major with
/// `u` the column and `v` the row.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthImage {
    size: ImageSize,
    data: Vec<f64>,
}

impl DepthImage {
    /// Create a new depth image from row-major data.
    ///
    /// # Errors
    ///
    /// If the length of the data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use armsight_camera::{DepthImage, ImageSize};
    ///
    /// let depth = DepthImage::new([2, 2].into(), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    ///
    /// assert_eq!(depth.get(1, 0), Some(2.0));
    /// assert_eq!(depth.get(0, 1), Some(3.0));
    /// ```
    pub fn new(size: ImageSize, data: Vec<f64>) -> Result<Self, CameraError> {
        let num_pixels = size.num_pixels()?;
        if data.len() != num_pixels {
            return Err(CameraError::InvalidDepthShape(data.len(), num_pixels));
        }
        Ok(Self { size, data })
    }

    /// Create a depth image filled with a single value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidImageSize` if the pixel count overflows `usize`.
    pub fn from_size_val(size: ImageSize, val: f64) -> Result<Self, CameraError> {
        Ok(Self {
            size,
            data: vec![val; size.num_pixels()?],
        })
    }

    /// The image size.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The image width in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// The image height in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The row-major depth values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Depth at column `u` and row `v`, or `None` outside the image.
    pub fn get(&self, u: usize, v: usize) -> Option<f64> {
        if u >= self.size.width || v >= self.size.height {
            return None;
        }
        Some(self.data[v * self.size.width + u])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_image_shape_check() {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        assert!(DepthImage::new(size, vec![0.0; 12]).is_ok());
        assert_eq!(
            DepthImage::new(size, vec![0.0; 11]),
            Err(CameraError::InvalidDepthShape(11, 12))
        );
    }

    #[test]
    fn test_depth_image_indexing_is_row_major() -> Result<(), CameraError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let depth = DepthImage::new(size, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])?;
        assert_eq!(depth.get(2, 0), Some(2.0));
        assert_eq!(depth.get(0, 1), Some(3.0));
        assert_eq!(depth.get(2, 1), Some(5.0));
        assert_eq!(depth.get(3, 0), None);
        assert_eq!(depth.get(0, 2), None);
        Ok(())
    }

    #[test]
    fn test_from_size_val() -> Result<(), CameraError> {
        let depth = DepthImage::from_size_val([640, 480].into(), 2.0)?;
        assert_eq!(depth.width(), 640);
        assert_eq!(depth.height(), 480);
        assert!(depth.as_slice().iter().all(|&z| z == 2.0));
        Ok(())
    }

    #[test]
    fn test_oversized_image_is_rejected() {
        let size = ImageSize {
            width: usize::MAX,
            height: 2,
        };
        assert_eq!(size.num_pixels(), Err(CameraError::InvalidImageSize(size)));
        assert_eq!(
            DepthImage::new(size, vec![]),
            Err(CameraError::InvalidImageSize(size))
        );
        assert_eq!(
            DepthImage::from_size_val(size, 1.0),
            Err(CameraError::InvalidImageSize(size))
        );
    }
}
