#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use armsight_kinematics as kinematics;

#[doc(inline)]
pub use armsight_camera as camera;
