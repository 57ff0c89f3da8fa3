//! The control loop.
//!
//! One thread, strictly in sequence on every tick:
//!
//! 1. service the transport: every pending message is routed, and an
//!    ack-gated gesture blocks right here until it has returned to idle;
//! 2. sample the joystick and apply it;
//! 3. hold for the tick period.
//!
//! Messages arriving while a gesture plays wait in the transport and are
//! handled in order afterwards. Nothing is ever interleaved with a playing
//! gesture.

use crate::actuator::{IncrementalActuator, ServoSink};
use crate::clock::ArmClock;
use crate::config::ArmConfig;
use crate::error::ArmResult;
use crate::gesture::{GestureEngine, GestureName};
use crate::input::{InputSample, JoystickInput};
use crate::joystick::{JoystickMapper, MapperReport};
use crate::router::{CommandRouter, Message, RouteOutcome};
use cu_arm_payloads::Pose;
use log::info;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// Transport boundary: hands over messages already received.
pub trait MessageSource {
    fn poll_message(&mut self) -> Option<Message>;
}

impl MessageSource for Receiver<Message> {
    fn poll_message(&mut self) -> Option<Message> {
        self.try_recv().ok()
    }
}

/// Scripted transport, oldest message first.
impl MessageSource for VecDeque<Message> {
    fn poll_message(&mut self) -> Option<Message> {
        self.pop_front()
    }
}

impl<T: MessageSource + ?Sized> MessageSource for &mut T {
    fn poll_message(&mut self) -> Option<Message> {
        (**self).poll_message()
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub routed: Vec<RouteOutcome>,
    pub joystick: MapperReport,
}

pub struct ArmController<S: ServoSink, J: JoystickInput, M: MessageSource> {
    actuator: IncrementalActuator<S>,
    mapper: JoystickMapper,
    engine: GestureEngine,
    router: CommandRouter,
    input: J,
    inbox: M,
    clock: ArmClock,
    tick_period: Duration,
}

impl<S: ServoSink, J: JoystickInput, M: MessageSource> ArmController<S, J, M> {
    /// Validate `config` and drive every servo to the home angle.
    pub fn new(
        config: &ArmConfig,
        servos: S,
        input: J,
        inbox: M,
        clock: ArmClock,
    ) -> ArmResult<Self> {
        config.validate()?;
        let actuator = IncrementalActuator::new(servos, Pose::uniform(config.home_angle));
        info!("Servos homed at {}", actuator.pose());
        Ok(Self {
            actuator,
            mapper: JoystickMapper::new(config.joystick.clone()),
            engine: GestureEngine::new(clock.clone(), config.rng_seed),
            router: CommandRouter::new(config.router.clone()),
            input,
            inbox,
            clock,
            tick_period: config.tick_period(),
        })
    }

    /// Settle into the idle pose before the first tick.
    pub fn startup(&mut self) -> ArmResult<()> {
        self.engine.perform(&mut self.actuator, GestureName::Idle)
    }

    /// One pass of the loop, without the trailing hold.
    pub fn tick(&mut self) -> TickSummary {
        let mut routed = Vec::new();
        while let Some(message) = self.inbox.poll_message() {
            routed.push(
                self.router
                    .route(&message, &mut self.engine, &mut self.actuator),
            );
        }
        let sample = InputSample::capture(&mut self.input);
        let joystick =
            self.mapper
                .tick(self.clock.now(), sample, &self.engine, &mut self.actuator);
        TickSummary { routed, joystick }
    }

    /// Startup, then tick at the configured cadence until `running` clears.
    pub fn run(&mut self, running: &AtomicBool) -> ArmResult<()> {
        self.startup()?;
        info!("Control loop running every {}ms", self.tick_period.as_millis());
        while running.load(Ordering::Acquire) {
            self.tick();
            self.clock.hold(self.tick_period);
        }
        info!("Control loop stopped at {}", self.actuator.pose());
        Ok(())
    }

    pub fn pose(&self) -> Pose {
        self.actuator.pose()
    }

    pub fn actuator(&self) -> &IncrementalActuator<S> {
        &self.actuator
    }

    pub fn mapper(&self) -> &JoystickMapper {
        &self.mapper
    }

    pub fn clock(&self) -> &ArmClock {
        &self.clock
    }
}
