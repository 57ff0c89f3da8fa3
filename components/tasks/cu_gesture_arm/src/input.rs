//! Joystick input boundary.
//!
//! Axes are raw 12-bit ADC readings (0–4095, idle near 2048). The button is
//! pulled up: idle reads [`Level::High`], pressed reads [`Level::Low`].

use crate::config::JoystickConfig;

/// Full scale of an axis reading.
pub const AXIS_MAX: u16 = 4095;

/// Nominal reading of a centred stick.
pub const AXIS_CENTER: u16 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left/right.
    X,
    /// Up/down.
    Y,
}

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Active-low: a pressed button pulls the pin down.
    #[inline]
    pub fn is_pressed(self) -> bool {
        self == Level::Low
    }
}

/// Analog and digital input boundary for the joystick.
pub trait JoystickInput {
    fn read_axis(&mut self, axis: Axis) -> u16;
    fn button_level(&mut self) -> Level;
}

impl<T: JoystickInput + ?Sized> JoystickInput for &mut T {
    fn read_axis(&mut self, axis: Axis) -> u16 {
        (**self).read_axis(axis)
    }

    fn button_level(&mut self) -> Level {
        (**self).button_level()
    }
}

impl<T: JoystickInput + ?Sized> JoystickInput for Box<T> {
    fn read_axis(&mut self, axis: Axis) -> u16 {
        (**self).read_axis(axis)
    }

    fn button_level(&mut self) -> Level {
        (**self).button_level()
    }
}

/// One control tick worth of input. Not retained between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSample {
    pub x: u16,
    pub y: u16,
    pub button: Level,
}

impl InputSample {
    pub fn capture(input: &mut impl JoystickInput) -> Self {
        Self {
            x: input.read_axis(Axis::X).min(AXIS_MAX),
            y: input.read_axis(Axis::Y).min(AXIS_MAX),
            button: input.button_level(),
        }
    }

    /// Stick centred, button released.
    pub const fn idle() -> Self {
        Self {
            x: AXIS_CENTER,
            y: AXIS_CENTER,
            button: Level::High,
        }
    }

    pub fn axis(&self, axis: Axis) -> u16 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// Where an axis reading falls relative to the dead zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Left or up.
    Low,
    Neutral,
    /// Right or down.
    High,
}

impl Zone {
    /// Both thresholds are exclusive: a reading equal to either one is neutral.
    pub fn classify(reading: u16, config: &JoystickConfig) -> Self {
        if reading < config.low_threshold {
            Zone::Low
        } else if reading > config.high_threshold {
            Zone::High
        } else {
            Zone::Neutral
        }
    }
}
