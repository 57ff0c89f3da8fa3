//! Joystick jogging.
//!
//! Each axis drives one joint at a time, moving it by a fixed increment on
//! every tick the stick is outside the dead zone. The button swaps which
//! joint each axis drives; X and Y always swap together.
//!
//! | axis | mode on | mode off |
//! |------|---------|----------|
//! | X (left/right) | J2, left `+` | J3, left `-` |
//! | Y (up/down)    | J1, up `+`   | J4, up `+`   |
//!
//! Stick deflection is ignored while a gesture is playing; the button still
//! switches modes.

use crate::actuator::{IncrementalActuator, ServoSink};
use crate::config::JoystickConfig;
use crate::gesture::GestureEngine;
use crate::input::{Axis, InputSample, Level, Zone};
use cu_arm_payloads::JointId;
use log::{debug, info};
use std::time::Duration;

/// Which joint each axis currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlMode {
    pub x: bool,
    pub y: bool,
}

impl Default for ControlMode {
    fn default() -> Self {
        Self { x: true, y: true }
    }
}

#[derive(Debug, Clone, Copy)]
struct Route {
    joint: JointId,
    /// Sign of the delta for the low zone; the high zone uses the opposite.
    low_sign: i32,
}

const X_ROUTES: [Route; 2] = [
    Route {
        joint: JointId::J2,
        low_sign: 1,
    },
    Route {
        joint: JointId::J3,
        low_sign: -1,
    },
];

const Y_ROUTES: [Route; 2] = [
    Route {
        joint: JointId::J1,
        low_sign: 1,
    },
    Route {
        joint: JointId::J4,
        low_sign: 1,
    },
];

impl ControlMode {
    pub fn toggle(&mut self) {
        self.x = !self.x;
        self.y = !self.y;
    }

    fn route(&self, axis: Axis) -> Route {
        let (routes, on) = match axis {
            Axis::X => (&X_ROUTES, self.x),
            Axis::Y => (&Y_ROUTES, self.y),
        };
        if on { routes[0] } else { routes[1] }
    }

    /// Joint `axis` drives in this mode.
    pub fn joint_for(&self, axis: Axis) -> JointId {
        self.route(axis).joint
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperReport {
    pub moved_x: Option<(JointId, u8)>,
    pub moved_y: Option<(JointId, u8)>,
    pub toggled: bool,
}

impl MapperReport {
    pub fn moved(&self) -> bool {
        self.moved_x.is_some() || self.moved_y.is_some()
    }
}

/// Turns joystick samples into joint deltas and mode switches.
pub struct JoystickMapper {
    config: JoystickConfig,
    mode: ControlMode,
    last_button: Level,
    last_toggle: Option<Duration>,
}

impl JoystickMapper {
    pub fn new(config: JoystickConfig) -> Self {
        Self {
            config,
            mode: ControlMode::default(),
            last_button: Level::High,
            last_toggle: None,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Apply one sample taken at clock time `now`.
    ///
    /// No joint moves while `engine` is playing a gesture.
    pub fn tick<S: ServoSink>(
        &mut self,
        now: Duration,
        sample: InputSample,
        engine: &GestureEngine,
        actuator: &mut IncrementalActuator<S>,
    ) -> MapperReport {
        let report = match engine.active() {
            Some(playback) => {
                debug!("Stick ignored while {} plays", playback.gesture());
                MapperReport {
                    toggled: self.button(now, sample.button),
                    ..MapperReport::default()
                }
            }
            None => MapperReport {
                moved_x: self.jog(Axis::X, sample.axis(Axis::X), actuator),
                moved_y: self.jog(Axis::Y, sample.axis(Axis::Y), actuator),
                toggled: self.button(now, sample.button),
            },
        };
        if report.moved() {
            info!("{}", actuator.pose());
        }
        report
    }

    fn jog<S: ServoSink>(
        &self,
        axis: Axis,
        reading: u16,
        actuator: &mut IncrementalActuator<S>,
    ) -> Option<(JointId, u8)> {
        let (sign, direction) = match (axis, Zone::classify(reading, &self.config)) {
            (_, Zone::Neutral) => return None,
            (Axis::X, Zone::Low) => (1, "Left"),
            (Axis::X, Zone::High) => (-1, "Right"),
            (Axis::Y, Zone::Low) => (1, "Up"),
            (Axis::Y, Zone::High) => (-1, "Down"),
        };
        let route = self.mode.route(axis);
        info!("{direction} - {}", route.joint);
        let delta = sign * route.low_sign * self.config.increment as i32;
        Some((route.joint, actuator.apply_delta(route.joint, delta)))
    }

    /// Toggle on a released-to-pressed edge, unless the previous accepted
    /// press is within the debounce window.
    fn button(&mut self, now: Duration, level: Level) -> bool {
        let edge = level.is_pressed() && !self.last_button.is_pressed();
        self.last_button = level;
        if !edge {
            return false;
        }
        if let Some(last) = self.last_toggle {
            if now.saturating_sub(last) < self.config.debounce() {
                return false;
            }
        }
        self.last_toggle = Some(now);
        self.mode.toggle();
        info!(
            "Switched Control Mode | Left/Right: {} | Up/Down: {}",
            self.mode.joint_for(Axis::X),
            self.mode.joint_for(Axis::Y)
        );
        true
    }
}
