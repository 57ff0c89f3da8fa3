//! Named gestures and the engine that plays them.
//!
//! A gesture is a list of phrases; a phrase is a few poses, each followed by
//! a hold, repeated a fixed number of times. The catalog is static except for
//! [`GestureName::Rando`], which draws its poses when it starts.
//!
//! Playback is a scheduled-step executor: [`GestureEngine::begin`] loads the
//! expanded step list and [`GestureEngine::poll`] writes whatever is due. The
//! control loop uses the blocking [`GestureEngine::perform`], which polls and
//! holds the clock until the last step's hold has elapsed. Either way a
//! gesture runs to completion once started; a second request while one is
//! playing is rejected with [`ArmError::Busy`].

use crate::actuator::{IncrementalActuator, ServoSink};
use crate::clock::ArmClock;
use crate::error::{ArmError, ArmResult};
use cu_arm_payloads::Pose;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::time::Duration;

/// Rest pose every remote command ends on.
pub const IDLE_POSE: Pose = Pose::new(5, 105, 105, 180);

/// Capacity of an expanded gesture. The longest catalog entry needs 54.
pub const MAX_SCRIPT_STEPS: usize = 64;

/// Number of random poses in [`GestureName::Rando`].
pub const RANDO_STEPS: usize = 13;

/// Hold after each random pose.
pub const RANDO_HOLD: Duration = Duration::from_millis(800);

/// Per-joint draw ranges for [`GestureName::Rando`], J1 to J4.
pub const RANDO_RANGES: [Range<u8>; 4] = [0..180, 0..80, 25..150, 50..180];

/// Every gesture the arm knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureName {
    Idle,
    Point,
    Hold,
    Tpose,
    Salute,
    Hug,
    Wave,
    Attack,
    Raise,
    Run,
    Talk,
    Sus,
    Rando,
}

impl GestureName {
    pub const ALL: [GestureName; 13] = [
        GestureName::Idle,
        GestureName::Point,
        GestureName::Hold,
        GestureName::Tpose,
        GestureName::Salute,
        GestureName::Hug,
        GestureName::Wave,
        GestureName::Attack,
        GestureName::Raise,
        GestureName::Run,
        GestureName::Talk,
        GestureName::Sus,
        GestureName::Rando,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            GestureName::Idle => "idle",
            GestureName::Point => "point",
            GestureName::Hold => "hold",
            GestureName::Tpose => "tpose",
            GestureName::Salute => "salute",
            GestureName::Hug => "hug",
            GestureName::Wave => "wave",
            GestureName::Attack => "attack",
            GestureName::Raise => "raise",
            GestureName::Run => "run",
            GestureName::Talk => "talk",
            GestureName::Sus => "sus",
            GestureName::Rando => "rando",
        }
    }

    /// Case-insensitive lookup, surrounding whitespace ignored.
    pub fn parse(word: &str) -> Option<Self> {
        let word = word.trim();
        Self::ALL
            .into_iter()
            .find(|gesture| gesture.as_str().eq_ignore_ascii_case(word))
    }

    /// Comma separated catalog, for diagnostics.
    pub fn catalog() -> String {
        Self::ALL.map(GestureName::as_str).join(", ")
    }
}

impl fmt::Display for GestureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureName {
    type Err = ArmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ArmError::UnknownCommand(s.to_string()))
    }
}

// =========================================================================
// Catalog
// =========================================================================

/// One pose and how long to keep it before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureStep {
    pub pose: Pose,
    pub hold: Duration,
}

impl GestureStep {
    pub const fn new(pose: Pose, hold: Duration) -> Self {
        Self { pose, hold }
    }
}

const fn step(j1: u8, j2: u8, j3: u8, j4: u8, hold_ms: u64) -> GestureStep {
    GestureStep::new(Pose::new(j1, j2, j3, j4), Duration::from_millis(hold_ms))
}

struct Phrase {
    steps: &'static [GestureStep],
    repeat: u8,
}

const SUS_UP: Pose = Pose::new(25, 105, 75, 50);
const SUS_DOWN: Pose = Pose::new(25, 105, 75, 160);

const fn sus_beat(hold_ms: u64) -> [GestureStep; 2] {
    [
        GestureStep::new(SUS_UP, Duration::from_millis(hold_ms)),
        GestureStep::new(SUS_DOWN, Duration::from_millis(hold_ms)),
    ]
}

const IDLE: &[Phrase] = &[Phrase {
    steps: &[GestureStep::new(IDLE_POSE, Duration::ZERO)],
    repeat: 1,
}];
const POINT: &[Phrase] = &[Phrase {
    steps: &[step(100, 125, 155, 100, 0)],
    repeat: 1,
}];
const HOLD: &[Phrase] = &[Phrase {
    steps: &[step(75, 150, 155, 100, 0)],
    repeat: 1,
}];
const TPOSE: &[Phrase] = &[Phrase {
    steps: &[step(0, 55, 125, 180, 0)],
    repeat: 1,
}];
const SALUTE: &[Phrase] = &[Phrase {
    steps: &[step(100, 125, 155, 100, 0)],
    repeat: 1,
}];
const HUG: &[Phrase] = &[Phrase {
    steps: &[step(75, 105, 25, 155, 0)],
    repeat: 1,
}];
const RAISE: &[Phrase] = &[Phrase {
    steps: &[step(180, 105, 105, 180, 0)],
    repeat: 1,
}];
const WAVE: &[Phrase] = &[Phrase {
    steps: &[step(180, 80, 100, 180, 350), step(180, 80, 0, 180, 350)],
    repeat: 3,
}];
const ATTACK: &[Phrase] = &[Phrase {
    steps: &[step(180, 130, 90, 90, 350), step(0, 130, 90, 180, 350)],
    repeat: 1,
}];
const RUN: &[Phrase] = &[Phrase {
    steps: &[step(75, 130, 80, 80, 250), step(0, 125, 80, 80, 250)],
    repeat: 7,
}];
const TALK: &[Phrase] = &[Phrase {
    steps: &[step(50, 175, 105, 75, 500), step(50, 105, 105, 75, 500)],
    repeat: 4,
}];
// Shakes faster and faster.
const SUS: &[Phrase] = &[
    Phrase {
        steps: &sus_beat(600),
        repeat: 4,
    },
    Phrase {
        steps: &sus_beat(400),
        repeat: 5,
    },
    Phrase {
        steps: &sus_beat(200),
        repeat: 7,
    },
    Phrase {
        steps: &sus_beat(100),
        repeat: 11,
    },
];

fn phrases(gesture: GestureName) -> &'static [Phrase] {
    match gesture {
        GestureName::Idle => IDLE,
        GestureName::Point => POINT,
        GestureName::Hold => HOLD,
        GestureName::Tpose => TPOSE,
        GestureName::Salute => SALUTE,
        GestureName::Hug => HUG,
        GestureName::Wave => WAVE,
        GestureName::Attack => ATTACK,
        GestureName::Raise => RAISE,
        GestureName::Run => RUN,
        GestureName::Talk => TALK,
        GestureName::Sus => SUS,
        // Drawn at start time, see GestureEngine::script.
        GestureName::Rando => &[],
    }
}

pub type Script = heapless::Vec<GestureStep, MAX_SCRIPT_STEPS>;

// =========================================================================
// Playback
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Nothing more to do before `until` (clock time).
    Pending { until: Duration },
    Finished,
}

/// A gesture in progress.
#[derive(Debug, Clone)]
pub struct Playback {
    gesture: GestureName,
    script: Script,
    next: usize,
    due: Duration,
}

impl Playback {
    fn new(gesture: GestureName, script: Script, now: Duration) -> Self {
        Self {
            gesture,
            script,
            next: 0,
            due: now,
        }
    }

    pub fn gesture(&self) -> GestureName {
        self.gesture
    }

    /// Steps not written yet.
    pub fn remaining(&self) -> usize {
        self.script.len() - self.next
    }

    fn poll<S: ServoSink>(
        &mut self,
        now: Duration,
        actuator: &mut IncrementalActuator<S>,
    ) -> PlaybackStatus {
        while now >= self.due {
            let Some(step) = self.script.get(self.next) else {
                return PlaybackStatus::Finished;
            };
            actuator.apply_pose(step.pose);
            debug!(
                "{} step {}/{}: {} hold {}ms",
                self.gesture,
                self.next + 1,
                self.script.len(),
                step.pose,
                step.hold.as_millis()
            );
            self.next += 1;
            // A late poll shifts the rest of the gesture instead of bunching steps.
            self.due = self.due.max(now) + step.hold;
        }
        PlaybackStatus::Pending { until: self.due }
    }
}

// =========================================================================
// Engine
// =========================================================================

/// Plays gestures on an [`IncrementalActuator`], one at a time.
pub struct GestureEngine {
    clock: ArmClock,
    rng: StdRng,
    playback: Option<Playback>,
}

impl GestureEngine {
    /// `seed` makes the random gesture reproducible.
    pub fn new(clock: ArmClock, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            clock,
            rng,
            playback: None,
        }
    }

    pub fn clock(&self) -> &ArmClock {
        &self.clock
    }

    pub fn is_busy(&self) -> bool {
        self.playback.is_some()
    }

    /// Gesture currently playing, if any.
    pub fn active(&self) -> Option<&Playback> {
        self.playback.as_ref()
    }

    /// Expand a gesture into the steps it will write.
    ///
    /// Draws fresh poses for [`GestureName::Rando`] on every call.
    pub fn script(&mut self, gesture: GestureName) -> Script {
        let mut script = Script::new();
        if gesture == GestureName::Rando {
            for _ in 0..RANDO_STEPS {
                let pose = self.random_pose();
                push_step(&mut script, gesture, GestureStep::new(pose, RANDO_HOLD));
            }
            push_step(&mut script, gesture, GestureStep::new(IDLE_POSE, Duration::ZERO));
            return script;
        }
        for phrase in phrases(gesture) {
            for _ in 0..phrase.repeat {
                for step in phrase.steps {
                    push_step(&mut script, gesture, *step);
                }
            }
        }
        script
    }

    /// Start `gesture` without waiting. Rejected while another is playing.
    pub fn begin(&mut self, gesture: GestureName) -> ArmResult<()> {
        if let Some(active) = &self.playback {
            warn!(
                "Ignoring {gesture}: {} is still playing ({} steps left)",
                active.gesture,
                active.remaining()
            );
            return Err(ArmError::Busy {
                active: active.gesture,
            });
        }
        let script = self.script(gesture);
        info!("Playing {gesture} ({} steps)", script.len());
        self.playback = Some(Playback::new(gesture, script, self.clock.now()));
        Ok(())
    }

    /// Write every step that is due. Idle engines report `Finished`.
    pub fn poll<S: ServoSink>(&mut self, actuator: &mut IncrementalActuator<S>) -> PlaybackStatus {
        let now = self.clock.now();
        let Some(playback) = self.playback.as_mut() else {
            return PlaybackStatus::Finished;
        };
        let status = playback.poll(now, actuator);
        if status == PlaybackStatus::Finished {
            debug!("{} done: {}", playback.gesture, actuator.pose());
            self.playback = None;
        }
        status
    }

    /// Play `gesture` to the end, holding the clock between steps.
    pub fn perform<S: ServoSink>(
        &mut self,
        actuator: &mut IncrementalActuator<S>,
        gesture: GestureName,
    ) -> ArmResult<()> {
        self.begin(gesture)?;
        while let PlaybackStatus::Pending { until } = self.poll(actuator) {
            self.clock.hold(until.saturating_sub(self.clock.now()));
        }
        Ok(())
    }

    /// Look `word` up in the catalog and play it.
    ///
    /// An unknown word leaves the joints alone and is reported.
    pub fn perform_named<S: ServoSink>(
        &mut self,
        actuator: &mut IncrementalActuator<S>,
        word: &str,
    ) -> ArmResult<GestureName> {
        let Some(gesture) = GestureName::parse(word) else {
            warn!(
                "Unknown command `{word}`. Try: {}.",
                GestureName::catalog()
            );
            return Err(ArmError::UnknownCommand(word.to_string()));
        };
        self.perform(actuator, gesture)?;
        Ok(gesture)
    }

    fn random_pose(&mut self) -> Pose {
        let [j1, j2, j3, j4] = RANDO_RANGES.map(|range| self.rng.random_range(range));
        Pose::new(j1, j2, j3, j4)
    }
}

fn push_step(script: &mut Script, gesture: GestureName, step: GestureStep) {
    if script.push(step).is_err() {
        warn!("{gesture} is longer than {MAX_SCRIPT_STEPS} steps, truncated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cu29_clock::{CuDuration, RobotClockMock};
    use crate::sim::SimServos;
    use cu_arm_payloads::JointId;

    fn rig() -> (GestureEngine, RobotClockMock, IncrementalActuator<SimServos>) {
        let (clock, mock) = ArmClock::mock();
        let engine = GestureEngine::new(clock, Some(42));
        let mut actuator = IncrementalActuator::new(SimServos::default(), Pose::uniform(90));
        actuator.sink_mut().clear_log();
        (engine, mock, actuator)
    }

    fn total_hold(script: &Script) -> Duration {
        script.iter().map(|step| step.hold).sum()
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(GestureName::parse("WAVE"), Some(GestureName::Wave));
        assert_eq!(GestureName::parse("TPose"), Some(GestureName::Tpose));
        assert_eq!(GestureName::parse(" idle\n"), Some(GestureName::Idle));
        assert_eq!(GestureName::parse("xyz"), None);
        assert_eq!(GestureName::parse(""), None);
        assert!("Sus".parse::<GestureName>().is_ok());
        for gesture in GestureName::ALL {
            assert_eq!(GestureName::parse(gesture.as_str()), Some(gesture));
        }
    }

    #[test]
    fn every_gesture_fits_and_is_non_empty() {
        let (mut engine, _, _) = rig();
        for gesture in GestureName::ALL {
            let script = engine.script(gesture);
            assert!(!script.is_empty(), "{gesture} is empty");
            assert!(script.len() < MAX_SCRIPT_STEPS, "{gesture} was truncated");
        }
    }

    #[test]
    fn catalog_shapes() {
        let (mut engine, _, _) = rig();
        let wave = engine.script(GestureName::Wave);
        assert_eq!(wave.len(), 6);
        assert_eq!(total_hold(&wave), Duration::from_millis(2100));
        assert_eq!(wave[0].pose, Pose::new(180, 80, 100, 180));
        assert_eq!(wave[1].pose, Pose::new(180, 80, 0, 180));

        assert_eq!(engine.script(GestureName::Run).len(), 14);
        assert_eq!(engine.script(GestureName::Talk).len(), 8);
        assert_eq!(engine.script(GestureName::Attack).len(), 2);

        let sus = engine.script(GestureName::Sus);
        assert_eq!(sus.len(), 2 * (4 + 5 + 7 + 11));
        assert_eq!(
            total_hold(&sus),
            Duration::from_millis(2 * (4 * 600 + 5 * 400 + 7 * 200 + 11 * 100))
        );

        let point = engine.script(GestureName::Point);
        assert_eq!(point.as_slice(), &[step(100, 125, 155, 100, 0)]);
    }

    #[test]
    fn idle_always_ends_on_idle_pose() {
        for start in [Pose::uniform(0), Pose::uniform(180), Pose::new(17, 170, 3, 99)] {
            let (mut engine, _, mut actuator) = rig();
            actuator.apply_pose(start);
            engine.perform(&mut actuator, GestureName::Idle).unwrap();
            assert_eq!(actuator.pose(), IDLE_POSE);
            assert_eq!(actuator.sink().pose(), IDLE_POSE);
        }
    }

    #[test]
    fn wave_writes_every_pose_and_holds_between() {
        let (mut engine, mock, mut actuator) = rig();
        engine.perform(&mut actuator, GestureName::Wave).unwrap();
        assert_eq!(Duration::from(mock.now()), Duration::from_millis(2100));
        let j3: Vec<u8> = actuator
            .sink()
            .writes()
            .iter()
            .filter(|(joint, _)| *joint == JointId::J3)
            .map(|(_, angle)| *angle)
            .collect();
        assert_eq!(j3, vec![100, 0, 100, 0, 100, 0]);
        assert_eq!(actuator.pose(), Pose::new(180, 80, 0, 180));
        assert!(!engine.is_busy());
    }

    #[test]
    fn rando_stays_in_ranges_then_idles() {
        let (mut engine, mock, mut actuator) = rig();
        let script = engine.script(GestureName::Rando);
        assert_eq!(script.len(), RANDO_STEPS + 1);
        for step in &script[..RANDO_STEPS] {
            assert_eq!(step.hold, RANDO_HOLD);
            for (joint, angle) in step.pose.iter() {
                let range = &RANDO_RANGES[joint.index()];
                assert!(range.contains(&angle), "{joint} drew {angle}");
            }
        }
        assert_eq!(script[RANDO_STEPS], GestureStep::new(IDLE_POSE, Duration::ZERO));

        engine.perform(&mut actuator, GestureName::Rando).unwrap();
        assert_eq!(Duration::from(mock.now()), RANDO_HOLD * RANDO_STEPS as u32);
        assert_eq!(actuator.pose(), IDLE_POSE);
    }

    #[test]
    fn seeded_rando_is_reproducible() {
        let (clock, _) = ArmClock::mock();
        let mut a = GestureEngine::new(clock.clone(), Some(7));
        let mut b = GestureEngine::new(clock, Some(7));
        assert_eq!(a.script(GestureName::Rando), b.script(GestureName::Rando));
    }

    #[test]
    fn second_request_is_rejected_mid_playback() {
        let (mut engine, mock, mut actuator) = rig();
        engine.begin(GestureName::Wave).unwrap();
        assert_eq!(
            engine.poll(&mut actuator),
            PlaybackStatus::Pending {
                until: Duration::from_millis(350)
            }
        );

        let err = engine.begin(GestureName::Tpose).unwrap_err();
        assert!(matches!(err, ArmError::Busy { active: GestureName::Wave }));
        assert!(matches!(
            engine.perform(&mut actuator, GestureName::Hug),
            Err(ArmError::Busy { .. })
        ));

        // Only wave poses ever reach the servos.
        while let PlaybackStatus::Pending { until } = engine.poll(&mut actuator) {
            mock.set_value(CuDuration::from(until).as_nanos());
        }
        assert_eq!(actuator.sink().writes().len(), 6 * 4);
        assert!(
            actuator
                .sink()
                .writes()
                .iter()
                .all(|(joint, angle)| *joint != JointId::J1 || *angle == 180)
        );
        engine.begin(GestureName::Tpose).unwrap();
    }

    #[test]
    fn late_poll_does_not_bunch_steps() {
        let (mut engine, mock, mut actuator) = rig();
        engine.begin(GestureName::Attack).unwrap();
        engine.poll(&mut actuator);
        mock.set_value(CuDuration::from_millis(5000).as_nanos());
        assert_eq!(
            engine.poll(&mut actuator),
            PlaybackStatus::Pending {
                until: Duration::from_millis(5350)
            }
        );
        assert_eq!(engine.active().map(Playback::remaining), Some(0));
        mock.set_value(CuDuration::from_millis(5350).as_nanos());
        assert_eq!(engine.poll(&mut actuator), PlaybackStatus::Finished);
        assert!(engine.active().is_none());
    }

    #[test]
    fn unknown_name_changes_nothing() {
        let (mut engine, mock, mut actuator) = rig();
        let err = engine.perform_named(&mut actuator, "xyz").unwrap_err();
        assert!(matches!(err, ArmError::UnknownCommand(word) if word == "xyz"));
        assert!(actuator.sink().writes().is_empty());
        assert_eq!(actuator.pose(), Pose::uniform(90));
        assert_eq!(mock.value(), 0);
    }

    #[test]
    fn perform_named_plays_matches() {
        let (mut engine, _, mut actuator) = rig();
        assert_eq!(
            engine.perform_named(&mut actuator, "Raise").unwrap(),
            GestureName::Raise
        );
        assert_eq!(actuator.pose(), Pose::new(180, 105, 105, 180));
    }
}
