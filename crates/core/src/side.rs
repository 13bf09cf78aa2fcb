//! Shooting side and the per-side joint lookup table.

use serde::{Deserialize, Serialize};

use crate::landmarks::Joint;

/// Which arm takes the shot. Every downstream stage reads the joint
/// variants for this side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShootingSide {
    Left,
    Right,
}

/// The three joints of one arm, resolved once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmJoints {
    pub shoulder: Joint,
    pub elbow: Joint,
    pub wrist: Joint,
}

const LEFT_ARM: ArmJoints = ArmJoints {
    shoulder: Joint::LeftShoulder,
    elbow: Joint::LeftElbow,
    wrist: Joint::LeftWrist,
};

const RIGHT_ARM: ArmJoints = ArmJoints {
    shoulder: Joint::RightShoulder,
    elbow: Joint::RightElbow,
    wrist: Joint::RightWrist,
};

impl ShootingSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Joint identifiers for this side's arm.
    pub fn arm(self) -> ArmJoints {
        match self {
            Self::Left => LEFT_ARM,
            Self::Right => RIGHT_ARM,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl std::fmt::Display for ShootingSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
