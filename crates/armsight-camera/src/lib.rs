#![deny(missing_docs)]
//! Pinhole depth-camera model.
//!
//! Converts a depth pixel into a 3D point in the camera frame using intrinsics
//! derived from the sensor's vertical field of view and resolution.

/// Depth images and their sizes.
pub mod depth;

/// Error types for the camera module.
pub mod error;

/// Pinhole intrinsics and unprojection.
pub mod pinhole;

pub use depth::{DepthImage, ImageSize};
pub use error::CameraError;
pub use pinhole::{CameraIntrinsics, PinholeUnprojector, SensorReadings};
