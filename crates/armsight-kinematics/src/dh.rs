use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KinematicsError;

/// Number of actuated joints in the chain.
pub const NUM_JOINTS: usize = 7;

/// A joint configuration: one angle per joint, in radians.
pub type JointConfiguration = [f64; NUM_JOINTS];

/// Home configuration of the Franka Panda arm.
pub const HOME_CONFIGURATION: JointConfiguration = [
    0.0,
    -FRAC_PI_4,
    0.0,
    -3.0 * FRAC_PI_4,
    0.0,
    FRAC_PI_2,
    FRAC_PI_4,
];

/// Identifier of a segment in the Denavit-Hartenberg table.
///
/// `J1`..`J7` are the actuated joints; `Flange` and `Gripper` are fixed
/// terminal offsets evaluated with `theta = 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkId {
    /// Joint 1 (base).
    J1,
    /// Joint 2.
    J2,
    /// Joint 3.
    J3,
    /// Joint 4.
    J4,
    /// Joint 5.
    J5,
    /// Joint 6.
    J6,
    /// Joint 7 (wrist).
    J7,
    /// Fixed flange offset after joint 7.
    Flange,
    /// Fixed gripper offset after the flange.
    Gripper,
}

impl LinkId {
    /// The actuated joints in chain order.
    pub const JOINTS: [LinkId; NUM_JOINTS] = [
        LinkId::J1,
        LinkId::J2,
        LinkId::J3,
        LinkId::J4,
        LinkId::J5,
        LinkId::J6,
        LinkId::J7,
    ];

    /// Position of the segment in the parameter table.
    pub const fn index(self) -> usize {
        match self {
            LinkId::J1 => 0,
            LinkId::J2 => 1,
            LinkId::J3 => 2,
            LinkId::J4 => 3,
            LinkId::J5 => 4,
            LinkId::J6 => 5,
            LinkId::J7 => 6,
            LinkId::Flange => 7,
            LinkId::Gripper => 8,
        }
    }

    /// Textual name, as used in configuration files.
    pub const fn name(self) -> &'static str {
        match self {
            LinkId::J1 => "j1",
            LinkId::J2 => "j2",
            LinkId::J3 => "j3",
            LinkId::J4 => "j4",
            LinkId::J5 => "j5",
            LinkId::J6 => "j6",
            LinkId::J7 => "j7",
            LinkId::Flange => "flange",
            LinkId::Gripper => "gripper",
        }
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LinkId {
    type Err = KinematicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "j1" => Ok(LinkId::J1),
            "j2" => Ok(LinkId::J2),
            "j3" => Ok(LinkId::J3),
            "j4" => Ok(LinkId::J4),
            "j5" => Ok(LinkId::J5),
            "j6" => Ok(LinkId::J6),
            "j7" => Ok(LinkId::J7),
            "flange" => Ok(LinkId::Flange),
            "gripper" => Ok(LinkId::Gripper),
            _ => Err(KinematicsError::InvalidConfiguration(format!(
                "unknown link identifier `{s}`"
            ))),
        }
    }
}

/// Denavit-Hartenberg parameters of a single segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DhParameter {
    /// Link length along the previous x axis.
    pub a: f64,
    /// Link offset along the joint z axis.
    pub d: f64,
    /// Link twist about the previous x axis, in radians.
    pub alpha: f64,
}

impl DhParameter {
    /// Create a new parameter triple.
    pub const fn new(a: f64, d: f64, alpha: f64) -> Self {
        Self { a, d, alpha }
    }
}

/// The parameter table of a 7-joint arm with flange and gripper offsets.
///
/// The table is fixed at construction and only read afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DhParameters {
    joints: [DhParameter; NUM_JOINTS],
    flange: DhParameter,
    gripper: DhParameter,
}

impl DhParameters {
    /// Create a parameter table.
    ///
    /// # Arguments
    ///
    /// * `joints` - Parameters of joints 1 to 7, in chain order.
    /// * `flange` - Fixed offset after joint 7.
    /// * `gripper` - Fixed offset after the flange.
    pub const fn new(
        joints: [DhParameter; NUM_JOINTS],
        flange: DhParameter,
        gripper: DhParameter,
    ) -> Self {
        Self {
            joints,
            flange,
            gripper,
        }
    }

    /// The Franka Emika Panda table, with lengths in meters.
    pub fn franka_panda() -> Self {
        Self::new(
            [
                DhParameter::new(0.0, 0.333, 0.0),
                DhParameter::new(0.0, 0.0, -FRAC_PI_2),
                DhParameter::new(0.0, 0.316, FRAC_PI_2),
                DhParameter::new(0.0825, 0.0, FRAC_PI_2),
                DhParameter::new(-0.0825, 0.384, -FRAC_PI_2),
                DhParameter::new(0.0, 0.0, FRAC_PI_2),
                DhParameter::new(0.088, 0.0, FRAC_PI_2),
            ],
            DhParameter::new(0.0, 0.107, 0.0),
            DhParameter::new(0.0, 0.1034, 0.0),
        )
    }

    /// Look up the parameters of a segment.
    pub fn get(&self, link: LinkId) -> &DhParameter {
        match link {
            LinkId::Flange => &self.flange,
            LinkId::Gripper => &self.gripper,
            joint => &self.joints[joint.index()],
        }
    }

    /// Look up the parameters of a segment by its textual name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the name is not one of `j1`..`j7`,
    /// `flange` or `gripper`.
    pub fn get_by_name(&self, name: &str) -> Result<&DhParameter, KinematicsError> {
        Ok(self.get(name.parse()?))
    }

    /// Parameters of the actuated joints in chain order.
    pub fn joints(&self) -> &[DhParameter; NUM_JOINTS] {
        &self.joints
    }
}

impl Default for DhParameters {
    fn default() -> Self {
        Self::franka_panda()
    }
}
