//! Payloads for a four joint hobby-servo arm.
//!
//! Angles are whole degrees over the servo travel:
//!
//! - `0` is one end stop, `180` the other.
//! - Anything outside `0..=180` is clamped on the way in, never rejected.
//!
//! A [`Pose`] is a complete assignment of one angle per [`JointId`].
#![cfg_attr(not(feature = "std"), no_std)]

use core::fmt;
use serde::{Deserialize, Serialize};

/// Number of joints on the arm.
pub const JOINT_COUNT: usize = 4;

/// Lowest commandable angle in degrees.
pub const ANGLE_MIN: u8 = 0;

/// Highest commandable angle in degrees.
pub const ANGLE_MAX: u8 = 180;

/// Clamp any signed angle into `ANGLE_MIN..=ANGLE_MAX`.
#[inline]
pub const fn clamp_angle(raw: i32) -> u8 {
    if raw < ANGLE_MIN as i32 {
        ANGLE_MIN
    } else if raw > ANGLE_MAX as i32 {
        ANGLE_MAX
    } else {
        raw as u8
    }
}

// =========================================================================
// Joints
// =========================================================================

/// One of the four servo slots, base first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JointId {
    J1,
    J2,
    J3,
    J4,
}

impl JointId {
    pub const ALL: [JointId; JOINT_COUNT] = [JointId::J1, JointId::J2, JointId::J3, JointId::J4];

    /// Zero based slot index.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            JointId::J1 => 0,
            JointId::J2 => 1,
            JointId::J3 => 2,
            JointId::J4 => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            JointId::J1 => "Joint 1",
            JointId::J2 => "Joint 2",
            JointId::J3 => "Joint 3",
            JointId::J4 => "Joint 4",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =========================================================================
// Poses
// =========================================================================

/// Target angles for all four joints, indexed by [`JointId::index`].
///
/// Every constructor clamps, so a `Pose` can only hold angles within the
/// servo travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; JOINT_COUNT]", into = "[u8; JOINT_COUNT]")]
pub struct Pose([u8; JOINT_COUNT]);

impl Pose {
    /// Build a pose from one angle per joint (J1, J2, J3, J4).
    pub const fn new(j1: u8, j2: u8, j3: u8, j4: u8) -> Self {
        Self([
            clamp_angle(j1 as i32),
            clamp_angle(j2 as i32),
            clamp_angle(j3 as i32),
            clamp_angle(j4 as i32),
        ])
    }

    /// Same angle on every joint.
    pub const fn uniform(angle: u8) -> Self {
        Self::new(angle, angle, angle, angle)
    }

    #[inline]
    pub const fn angle(&self, joint: JointId) -> u8 {
        self.0[joint.index()]
    }

    #[inline]
    pub const fn angles(&self) -> [u8; JOINT_COUNT] {
        self.0
    }

    /// Copy of this pose with one joint replaced (clamped).
    #[must_use]
    pub const fn with_angle(mut self, joint: JointId, angle: i32) -> Self {
        self.0[joint.index()] = clamp_angle(angle);
        self
    }

    /// `(joint, angle)` pairs in joint order.
    pub fn iter(&self) -> impl Iterator<Item = (JointId, u8)> + '_ {
        JointId::ALL.into_iter().map(|joint| (joint, self.angle(joint)))
    }
}

impl From<[i32; JOINT_COUNT]> for Pose {
    fn from(raw: [i32; JOINT_COUNT]) -> Self {
        Self(raw.map(clamp_angle))
    }
}

impl From<[u8; JOINT_COUNT]> for Pose {
    fn from(raw: [u8; JOINT_COUNT]) -> Self {
        Self(raw.map(|angle| clamp_angle(angle as i32)))
    }
}

impl From<Pose> for [u8; JOINT_COUNT] {
    fn from(pose: Pose) -> Self {
        pose.0
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [j1, j2, j3, j4] = self.0;
        write!(f, "J1: {j1} | J2: {j2} | J3: {j3} | J4: {j4}")
    }
}
