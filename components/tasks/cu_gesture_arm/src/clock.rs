//! Monotonic time for the control loop, on top of the copper [`RobotClock`].
//!
//! [`ArmClock::new`] follows the robot clock and really sleeps in
//! [`ArmClock::hold`]. [`ArmClock::mock`] hands back a clock whose time only
//! moves when a hold is requested or the [`RobotClockMock`] is driven, so
//! timed behaviour can be checked without waiting for it.

use cu29_clock::{CuDuration, RobotClock, RobotClockMock};
use std::time::Duration;

/// Time reference shared by every component of the arm.
///
/// Cloning is cheap and clones observe the same time.
#[derive(Debug, Clone)]
pub struct ArmClock {
    clock: RobotClock,
    mock: Option<RobotClockMock>,
}

impl ArmClock {
    pub fn new() -> Self {
        Self {
            clock: RobotClock::new(),
            mock: None,
        }
    }

    /// A clock starting at zero together with the handle that drives it.
    pub fn mock() -> (Self, RobotClockMock) {
        let (clock, mock) = RobotClock::mock();
        (
            Self {
                clock,
                mock: Some(mock.clone()),
            },
            mock,
        )
    }

    /// Elapsed time since the clock was created.
    pub fn now(&self) -> Duration {
        self.clock.now().into()
    }

    /// Block the caller for `duration`.
    ///
    /// This is the only way the core waits: the whole loop stops while a hold
    /// is in progress.
    pub fn hold(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        match &self.mock {
            Some(mock) => mock.increment(CuDuration::from(duration)),
            None => std::thread::sleep(duration),
        }
    }
}

impl Default for ArmClock {
    fn default() -> Self {
        Self::new()
    }
}
