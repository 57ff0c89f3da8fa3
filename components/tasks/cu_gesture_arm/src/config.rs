//! Arm configuration, stored as RON.
//!
//! Every field has a default matching the reference arm, so an empty file
//! (`()`) is a valid configuration:
//!
//! ```ron
//! (
//!     home_angle: 90,
//!     tick_period_ms: 100,
//!     joystick: (low_threshold: 1000, high_threshold: 3000, increment: 25, debounce_ms: 300),
//!     router: (
//!         control_topic: "esp32/pc",
//!         telemetry_topic: "esp32/rpi",
//!         default_ack_ms: 1200,
//!         ack_overrides: {"wave": 800},
//!         aliases: {"hello": "wave"},
//!     ),
//! )
//! ```

use crate::error::{ArmError, ArmResult};
use crate::gesture::GestureName;
use crate::input::AXIS_MAX;
use cu_arm_payloads::ANGLE_MAX;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Shortest button debounce accepted. Anything faster lets contact bounce
/// through as extra mode switches.
pub const MIN_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// Angle every joint is driven to at power-on, before the idle gesture.
    pub home_angle: u8,
    /// Cadence of the control loop.
    pub tick_period_ms: u64,
    /// Seed for the random gesture. `None` draws from the OS.
    pub rng_seed: Option<u64>,
    pub joystick: JoystickConfig,
    pub router: RouterConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// Readings strictly below this are in the low zone.
    pub low_threshold: u16,
    /// Readings strictly above this are in the high zone.
    pub high_threshold: u16,
    /// Degrees applied per tick while an axis is deflected.
    pub increment: u8,
    /// Presses closer together than this are treated as contact bounce.
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Topic whose payloads trigger gestures.
    pub control_topic: String,
    /// Topic whose payloads are only logged.
    pub telemetry_topic: String,
    /// How long a remotely triggered gesture holds its end pose before idle.
    pub default_ack_ms: u64,
    /// Per-gesture ack hold, keyed by gesture name.
    pub ack_overrides: BTreeMap<String, u64>,
    /// Extra payload words mapped to gesture names.
    pub aliases: BTreeMap<String, String>,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            home_angle: 90,
            tick_period_ms: 100,
            rng_seed: None,
            joystick: JoystickConfig::default(),
            router: RouterConfig::default(),
        }
    }
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            low_threshold: 1000,
            high_threshold: 3000,
            increment: 25,
            debounce_ms: 300,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            control_topic: "esp32/pc".to_string(),
            telemetry_topic: "esp32/rpi".to_string(),
            default_ack_ms: 1200,
            ack_overrides: BTreeMap::from([("wave".to_string(), 800)]),
            aliases: BTreeMap::from([("hello".to_string(), "wave".to_string())]),
        }
    }
}

impl ArmConfig {
    pub fn load(path: &Path) -> ArmResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse and validate.
    pub fn from_ron(text: &str) -> ArmResult<Self> {
        let config: ArmConfig = ron::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> ArmResult<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn save(&self, path: &Path) -> ArmResult<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn validate(&self) -> ArmResult<()> {
        if self.home_angle > ANGLE_MAX {
            return Err(invalid(format!(
                "home_angle {} is beyond {ANGLE_MAX}",
                self.home_angle
            )));
        }
        if self.tick_period_ms == 0 {
            return Err(invalid("tick_period_ms must be at least 1".into()));
        }
        self.joystick.validate()?;
        self.router.validate()
    }
}

impl JoystickConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> ArmResult<()> {
        if self.low_threshold >= self.high_threshold {
            return Err(invalid(format!(
                "joystick low_threshold {} must be below high_threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.high_threshold > AXIS_MAX {
            return Err(invalid(format!(
                "joystick high_threshold {} is beyond the axis range 0..={AXIS_MAX}",
                self.high_threshold
            )));
        }
        if self.increment == 0 || self.increment > ANGLE_MAX {
            return Err(invalid(format!(
                "joystick increment {} must be within 1..={ANGLE_MAX}",
                self.increment
            )));
        }
        if self.debounce_ms < MIN_DEBOUNCE_MS {
            return Err(invalid(format!(
                "joystick debounce_ms {} is below {MIN_DEBOUNCE_MS}",
                self.debounce_ms
            )));
        }
        Ok(())
    }
}

impl RouterConfig {
    /// Ack hold for a gesture triggered from the control topic.
    pub fn ack_for(&self, gesture: GestureName) -> Duration {
        let ms = self
            .ack_overrides
            .iter()
            .find(|(name, _)| GestureName::parse(name) == Some(gesture))
            .map(|(_, ms)| *ms)
            .unwrap_or(self.default_ack_ms);
        Duration::from_millis(ms)
    }

    pub fn validate(&self) -> ArmResult<()> {
        if self.control_topic.is_empty() || self.telemetry_topic.is_empty() {
            return Err(invalid("router topics must not be empty".into()));
        }
        if self.control_topic == self.telemetry_topic {
            return Err(invalid(format!(
                "control and telemetry topics are both `{}`",
                self.control_topic
            )));
        }
        for name in self.ack_overrides.keys() {
            if GestureName::parse(name).is_none() {
                return Err(invalid(format!("ack override for unknown gesture `{name}`")));
            }
        }
        for (alias, target) in &self.aliases {
            if alias.trim().is_empty() {
                return Err(invalid("empty alias".into()));
            }
            if let Some(shadowed) = GestureName::parse(alias) {
                return Err(invalid(format!("alias `{alias}` would hide gesture {shadowed}")));
            }
            if GestureName::parse(target).is_none() {
                return Err(invalid(format!(
                    "alias `{alias}` points to unknown gesture `{target}`"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ArmError {
    ArmError::InvalidConfig(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        ArmConfig::default().validate().unwrap();
    }

    #[test]
    fn bundled_file_matches_defaults() {
        let config = ArmConfig::from_ron(include_str!("../armconfig.ron")).unwrap();
        assert_eq!(config, ArmConfig::default());
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(ArmConfig::from_ron("()").unwrap(), ArmConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ArmConfig::from_ron("(joystick: (increment: 10), rng_seed: Some(7))").unwrap();
        assert_eq!(config.joystick.increment, 10);
        assert_eq!(config.joystick.low_threshold, 1000);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.router.control_topic, "esp32/pc");
    }

    #[test]
    fn ack_lookup() {
        let router = RouterConfig::default();
        assert_eq!(router.ack_for(GestureName::Wave), Duration::from_millis(800));
        assert_eq!(router.ack_for(GestureName::Salute), Duration::from_millis(1200));
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = ArmConfig::from_ron("(joystick: (low_threshold: 3000, high_threshold: 1000))")
            .unwrap_err();
        assert!(matches!(err, ArmError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_increment_and_out_of_range_threshold() {
        let mut config = ArmConfig::default();
        config.joystick.increment = 0;
        assert!(config.validate().is_err());

        let mut config = ArmConfig::default();
        config.joystick.high_threshold = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_alias_to_unknown_gesture() {
        let mut config = ArmConfig::default();
        config
            .router
            .aliases
            .insert("dance".to_string(), "moonwalk".to_string());
        assert!(matches!(config.validate(), Err(ArmError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_fast_debounce() {
        let err = ArmConfig::from_ron("(joystick: (debounce_ms: 0))").unwrap_err();
        assert!(matches!(err, ArmError::InvalidConfig(_)));
        let mut config = ArmConfig::default();
        config.joystick.debounce_ms = MIN_DEBOUNCE_MS - 1;
        assert!(config.validate().is_err());
        config.joystick.debounce_ms = 500;
        config.validate().unwrap();
    }

    #[test]
    fn rejects_alias_hiding_a_gesture() {
        let mut config = ArmConfig::default();
        config
            .router
            .aliases
            .insert("Wave".to_string(), "idle".to_string());
        assert!(matches!(config.validate(), Err(ArmError::InvalidConfig(_))));
        let err = ArmConfig::from_ron(r#"(router: (aliases: {"tpose": "hug"}))"#).unwrap_err();
        assert!(matches!(err, ArmError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_same_topic_twice() {
        let mut config = ArmConfig::default();
        config.router.telemetry_topic = config.router.control_topic.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(
            ArmConfig::from_ron("(home_angle: )"),
            Err(ArmError::ConfigParse(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arm.ron");
        let mut config = ArmConfig::default();
        config.tick_period_ms = 50;
        config.router.default_ack_ms = 900;
        config.save(&path).unwrap();
        assert_eq!(ArmConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn load_from_handwritten_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"(router: (control_topic: "arm/cmd", telemetry_topic: "arm/log"))"#
        )
        .unwrap();
        let config = ArmConfig::load(file.path()).unwrap();
        assert_eq!(config.router.control_topic, "arm/cmd");
        assert_eq!(config.router.ack_for(GestureName::Wave), Duration::from_millis(800));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ArmConfig::load(&dir.path().join("nope.ron")),
            Err(ArmError::Io(_))
        ));
    }
}
