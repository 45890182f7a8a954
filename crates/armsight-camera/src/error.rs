use crate::depth::ImageSize;

/// An error type for the camera module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// The pixel lies outside the depth image.
    #[error("Pixel ({u}, {v}) is outside the {width}x{height} depth image")]
    OutOfRange {
        /// Column index.
        u: usize,
        /// Row index.
        v: usize,
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
    },

    /// The sensor readings cannot produce a camera model.
    #[error("Invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// Error when the depth data does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidDepthShape(usize, usize),

    /// The pixel count of the image size overflows `usize`.
    #[error("Image size {0} is too large")]
    InvalidImageSize(ImageSize),
}
