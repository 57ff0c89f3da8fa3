//! Pub/sub command routing.
//!
//! Two topics are consumed. Payloads on the control topic are command words
//! (ASCII, case-insensitive) naming a gesture or a configured alias. A match
//! is played ack-gated: the gesture, then a hold of the ack duration, then
//! idle, so a remote command always leaves the arm at rest. Payloads on the
//! telemetry topic are logged and never move anything.

use crate::actuator::{IncrementalActuator, ServoSink};
use crate::config::RouterConfig;
use crate::error::ArmError;
use crate::gesture::{GestureEngine, GestureName};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::time::Duration;

/// Longest command word considered. Longer payloads are unrecognized.
pub const MAX_COMMAND_LEN: usize = 32;

type CommandWord = heapless::String<MAX_COMMAND_LEN>;

/// A message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn payload_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicClass {
    Control,
    Telemetry,
    Other,
}

/// A resolved control payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AckCommand {
    gesture: GestureName,
    ack: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Gesture played, held for `ack`, then back to idle.
    Performed { gesture: GestureName, ack: Duration },
    /// Telemetry payload, logged only.
    Logged,
    /// Control payload that names nothing. No joint moved.
    Unrecognized,
    /// Another gesture was still playing. No joint moved.
    Rejected { active: GestureName },
    /// Topic is neither control nor telemetry.
    Ignored,
}

pub struct CommandRouter {
    config: RouterConfig,
    aliases: BTreeMap<String, GestureName>,
}

impl CommandRouter {
    /// Build from a validated config. Aliases to unknown gestures, and aliases
    /// spelled like a catalog gesture, are dropped.
    pub fn new(config: RouterConfig) -> Self {
        let aliases = config
            .aliases
            .iter()
            .filter(|(alias, _)| GestureName::parse(alias).is_none())
            .filter_map(|(alias, target)| {
                let gesture = GestureName::parse(target)?;
                Some((alias.trim().to_ascii_lowercase(), gesture))
            })
            .collect();
        Self { config, aliases }
    }

    pub fn classify(&self, topic: &str) -> TopicClass {
        if topic == self.config.control_topic {
            TopicClass::Control
        } else if topic == self.config.telemetry_topic {
            TopicClass::Telemetry
        } else {
            TopicClass::Other
        }
    }

    /// Map a control payload to the gesture it asks for.
    ///
    /// Empty, non UTF-8 and oversized payloads resolve to nothing.
    pub(crate) fn resolve(&self, payload: &[u8]) -> Option<AckCommand> {
        let text = std::str::from_utf8(payload).ok()?.trim();
        let mut word = CommandWord::try_from(text).ok()?;
        if word.is_empty() {
            return None;
        }
        word.make_ascii_lowercase();
        let gesture = match self.aliases.get(word.as_str()) {
            Some(gesture) => *gesture,
            None => GestureName::parse(&word)?,
        };
        Some(AckCommand {
            gesture,
            ack: self.config.ack_for(gesture),
        })
    }

    /// Handle one inbound message to completion.
    pub fn route<S: ServoSink>(
        &self,
        message: &Message,
        engine: &mut GestureEngine,
        actuator: &mut IncrementalActuator<S>,
    ) -> RouteOutcome {
        info!(
            "Received message on {}: {}",
            message.topic,
            message.payload_text()
        );
        match self.classify(&message.topic) {
            TopicClass::Control => match self.resolve(&message.payload) {
                Some(command) => self.acknowledge(command, engine, actuator),
                None => {
                    warn!(
                        "Unknown command `{}`. Try: {}.",
                        message.payload_text(),
                        GestureName::catalog()
                    );
                    RouteOutcome::Unrecognized
                }
            },
            TopicClass::Telemetry => {
                info!("Telemetry from {}: {}", message.topic, message.payload_text());
                RouteOutcome::Logged
            }
            TopicClass::Other => {
                debug!("No route for topic {}", message.topic);
                RouteOutcome::Ignored
            }
        }
    }

    /// Gesture, ack hold, idle. Runs to the end once the gesture starts.
    fn acknowledge<S: ServoSink>(
        &self,
        command: AckCommand,
        engine: &mut GestureEngine,
        actuator: &mut IncrementalActuator<S>,
    ) -> RouteOutcome {
        let AckCommand { gesture, ack } = command;
        if let Err(ArmError::Busy { active }) = engine.perform(actuator, gesture) {
            return RouteOutcome::Rejected { active };
        }
        debug!("Holding {gesture} for {}ms", ack.as_millis());
        engine.clock().hold(ack);
        if let Err(ArmError::Busy { active }) = engine.perform(actuator, GestureName::Idle) {
            return RouteOutcome::Rejected { active };
        }
        RouteOutcome::Performed { gesture, ack }
    }
}
