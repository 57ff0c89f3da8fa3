//! Motion control core for a four joint hobby-servo arm.
//!
//! Two upstream triggers drive the arm:
//!
//! - an analog joystick, jogging one joint per axis by a fixed increment per
//!   tick ([`joystick::JoystickMapper`]);
//! - command words arriving on a pub/sub control topic, each playing a named
//!   gesture and returning to idle ([`router::CommandRouter`]).
//!
//! Both go through [`gesture::GestureEngine`] or
//! [`actuator::IncrementalActuator`], which own the joint angles and are the
//! only writers to the servos. [`controller::ArmController`] runs the single
//! threaded loop tying everything together.
//!
//! Hardware sits behind [`actuator::ServoSink`] and [`input::JoystickInput`];
//! [`sim`] has host implementations used by the `arm-console` binary and the
//! tests.

pub mod actuator;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod input;
pub mod joystick;
pub mod router;
pub mod sim;

pub use cu_arm_payloads::{ANGLE_MAX, ANGLE_MIN, JointId, Pose, clamp_angle};

pub mod prelude {
    pub use crate::actuator::{IncrementalActuator, JointState, ServoSink};
    pub use crate::clock::ArmClock;
    pub use crate::config::{ArmConfig, JoystickConfig, RouterConfig};
    pub use crate::controller::{ArmController, MessageSource, TickSummary};
    pub use crate::error::{ArmError, ArmResult};
    pub use crate::gesture::{GestureEngine, GestureName, GestureStep, IDLE_POSE};
    pub use crate::input::{Axis, InputSample, JoystickInput, Level, Zone};
    pub use crate::joystick::{ControlMode, JoystickMapper, MapperReport};
    pub use crate::router::{CommandRouter, Message, RouteOutcome, TopicClass};
    pub use cu_arm_payloads::{JointId, Pose};
    pub use cu29_clock::RobotClockMock;
}
