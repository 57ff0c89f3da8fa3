//! Host-side stand-ins for the arm hardware.
//!
//! [`SimServos`] keeps every write and the pose the servos were last told to
//! hold. [`SimJoystick`] reads its axes and button from atomics that a
//! [`SimJoystickHandle`] on another thread can change.

use crate::actuator::ServoSink;
use crate::input::{AXIS_CENTER, AXIS_MAX, Axis, JoystickInput, Level};
use cu_arm_payloads::{JointId, Pose};
use log::trace;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Servo bus that records instead of actuating.
#[derive(Debug, Clone)]
pub struct SimServos {
    pose: Pose,
    writes: Vec<(JointId, u8)>,
}

impl Default for SimServos {
    fn default() -> Self {
        Self {
            pose: Pose::uniform(0),
            writes: Vec::new(),
        }
    }
}

impl SimServos {
    /// Pose the servos were last commanded to.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Every write since creation or the last [`SimServos::clear_log`].
    pub fn writes(&self) -> &[(JointId, u8)] {
        &self.writes
    }

    pub fn clear_log(&mut self) {
        self.writes.clear();
    }
}

impl ServoSink for SimServos {
    fn write(&mut self, joint: JointId, degrees: u8) {
        trace!("servo {joint} <- {degrees}");
        self.pose = self.pose.with_angle(joint, degrees as i32);
        self.writes.push((joint, degrees));
    }
}

#[derive(Debug)]
struct Shared {
    x: AtomicU16,
    y: AtomicU16,
    held: AtomicBool,
    tapped: AtomicBool,
}

/// Joystick fed from a [`SimJoystickHandle`].
#[derive(Debug)]
pub struct SimJoystick {
    shared: Arc<Shared>,
}

/// Moves the stick of a [`SimJoystick`].
#[derive(Debug, Clone)]
pub struct SimJoystickHandle {
    shared: Arc<Shared>,
}

impl SimJoystick {
    /// Centred stick, released button.
    pub fn new() -> (Self, SimJoystickHandle) {
        let shared = Arc::new(Shared {
            x: AtomicU16::new(AXIS_CENTER),
            y: AtomicU16::new(AXIS_CENTER),
            held: AtomicBool::new(false),
            tapped: AtomicBool::new(false),
        });
        (
            Self {
                shared: shared.clone(),
            },
            SimJoystickHandle { shared },
        )
    }
}

impl JoystickInput for SimJoystick {
    fn read_axis(&mut self, axis: Axis) -> u16 {
        match axis {
            Axis::X => self.shared.x.load(Ordering::Acquire),
            Axis::Y => self.shared.y.load(Ordering::Acquire),
        }
    }

    fn button_level(&mut self) -> Level {
        let tapped = self.shared.tapped.swap(false, Ordering::AcqRel);
        if tapped || self.shared.held.load(Ordering::Acquire) {
            Level::Low
        } else {
            Level::High
        }
    }
}

impl SimJoystickHandle {
    pub fn set_axes(&self, x: u16, y: u16) {
        self.shared.x.store(x.min(AXIS_MAX), Ordering::Release);
        self.shared.y.store(y.min(AXIS_MAX), Ordering::Release);
    }

    pub fn center(&self) {
        self.set_axes(AXIS_CENTER, AXIS_CENTER);
    }

    /// Pressed for exactly one sample.
    pub fn tap(&self) {
        self.shared.tapped.store(true, Ordering::Release);
    }

    /// Pressed until [`SimJoystickHandle::set_held`] releases it.
    pub fn set_held(&self, held: bool) {
        self.shared.held.store(held, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputSample;

    #[test]
    fn servos_track_last_command() {
        let mut servos = SimServos::default();
        servos.write(JointId::J4, 33);
        servos.write(JointId::J4, 34);
        assert_eq!(servos.pose().angle(JointId::J4), 34);
        assert_eq!(servos.writes(), &[(JointId::J4, 33), (JointId::J4, 34)]);
        servos.clear_log();
        assert!(servos.writes().is_empty());
    }

    #[test]
    fn tap_is_seen_once() {
        let (mut stick, handle) = SimJoystick::new();
        handle.tap();
        assert_eq!(stick.button_level(), Level::Low);
        assert_eq!(stick.button_level(), Level::High);
        handle.set_held(true);
        assert_eq!(stick.button_level(), Level::Low);
        assert_eq!(stick.button_level(), Level::Low);
    }

    #[test]
    fn handle_moves_axes() {
        let (mut stick, handle) = SimJoystick::new();
        assert_eq!(InputSample::capture(&mut stick), InputSample::idle());
        handle.set_axes(10, 9000);
        let sample = InputSample::capture(&mut stick);
        assert_eq!((sample.x, sample.y), (10, AXIS_MAX));
        handle.center();
        assert_eq!(stick.read_axis(Axis::X), AXIS_CENTER);
    }
}
