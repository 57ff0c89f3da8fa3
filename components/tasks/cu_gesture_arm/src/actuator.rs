//! Joint angles and the single path that writes them to the servos.

use cu_arm_payloads::{JointId, Pose, clamp_angle};
use log::debug;

/// Servo actuation boundary.
///
/// Takes an absolute angle in degrees for one joint. Writes are fire and
/// forget: the arm never waits for the servo to arrive.
pub trait ServoSink {
    fn write(&mut self, joint: JointId, degrees: u8);
}

impl<T: ServoSink + ?Sized> ServoSink for &mut T {
    fn write(&mut self, joint: JointId, degrees: u8) {
        (**self).write(joint, degrees)
    }
}

impl<T: ServoSink + ?Sized> ServoSink for Box<T> {
    fn write(&mut self, joint: JointId, degrees: u8) {
        (**self).write(joint, degrees)
    }
}

/// Last commanded angle of every joint.
///
/// Read access is public; only [`IncrementalActuator`] can change it, and it
/// always forwards the change to the servos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointState {
    pose: Pose,
}

impl JointState {
    #[inline]
    pub fn angle(&self, joint: JointId) -> u8 {
        self.pose.angle(joint)
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        self.pose
    }
}

/// Owner of [`JointState`] and of the servo bus.
pub struct IncrementalActuator<S: ServoSink> {
    state: JointState,
    sink: S,
}

impl<S: ServoSink> IncrementalActuator<S> {
    /// Take ownership of the servos and drive them to `initial`.
    pub fn new(sink: S, initial: Pose) -> Self {
        let mut actuator = Self {
            state: JointState { pose: initial },
            sink,
        };
        actuator.apply_pose(initial);
        actuator
    }

    /// Move `joint` by `change` degrees, clamped to the servo travel.
    ///
    /// The result is written to the servo even when clamping left it
    /// unchanged, so the servo never drifts from the model.
    pub fn apply_delta(&mut self, joint: JointId, change: i32) -> u8 {
        let current = self.state.angle(joint) as i32;
        self.commit(joint, clamp_angle(current.saturating_add(change)))
    }

    /// Put `joint` at `angle`, clamped to the servo travel.
    pub fn set_absolute(&mut self, joint: JointId, angle: i32) -> u8 {
        self.commit(joint, clamp_angle(angle))
    }

    /// Write a whole pose, base joint first.
    pub fn apply_pose(&mut self, pose: Pose) {
        for (joint, angle) in pose.iter() {
            self.commit(joint, angle);
        }
    }

    #[inline]
    pub fn state(&self) -> &JointState {
        &self.state
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        self.state.pose
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn commit(&mut self, joint: JointId, angle: u8) -> u8 {
        self.state.pose = self.state.pose.with_angle(joint, angle as i32);
        self.sink.write(joint, angle);
        debug!("{joint} -> {angle}");
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimServos;

    fn actuator_at(pose: Pose) -> IncrementalActuator<SimServos> {
        let mut actuator = IncrementalActuator::new(SimServos::default(), pose);
        actuator.sink_mut().clear_log();
        actuator
    }

    #[test]
    fn new_commits_initial_pose() {
        let actuator = IncrementalActuator::new(SimServos::default(), Pose::uniform(90));
        assert_eq!(actuator.sink().writes().len(), 4);
        assert_eq!(actuator.sink().pose(), Pose::uniform(90));
    }

    #[test]
    fn apply_delta_stays_in_range_for_any_input() {
        let deltas = [i32::MIN, -1000, -181, -180, -25, -1, 0, 1, 25, 180, 181, 1000, i32::MAX];
        for start in [0u8, 1, 45, 90, 155, 179, 180] {
            for joint in JointId::ALL {
                for delta in deltas {
                    let mut actuator = actuator_at(Pose::uniform(start));
                    let result = actuator.apply_delta(joint, delta);
                    assert!(result <= 180, "start {start} delta {delta} gave {result}");
                    assert_eq!(actuator.state().angle(joint), result);
                    assert_eq!(actuator.sink().pose().angle(joint), result);
                }
            }
        }
    }

    #[test]
    fn apply_delta_writes_even_when_clamped_in_place() {
        let mut actuator = actuator_at(Pose::uniform(180));
        assert_eq!(actuator.apply_delta(JointId::J2, 25), 180);
        assert_eq!(actuator.sink().writes(), &[(JointId::J2, 180)]);
    }

    #[test]
    fn apply_delta_only_touches_its_joint() {
        let mut actuator = actuator_at(Pose::uniform(90));
        actuator.apply_delta(JointId::J3, -25);
        assert_eq!(actuator.pose(), Pose::new(90, 90, 65, 90));
    }

    #[test]
    fn set_absolute_clamps_instead_of_failing() {
        let mut actuator = actuator_at(Pose::uniform(90));
        assert_eq!(actuator.set_absolute(JointId::J1, 250), 180);
        assert_eq!(actuator.set_absolute(JointId::J4, -3), 0);
        assert_eq!(actuator.set_absolute(JointId::J2, 42), 42);
        assert_eq!(actuator.pose(), Pose::new(180, 42, 90, 0));
    }
}
