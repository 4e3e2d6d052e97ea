//! Alert policy.
//!
//! Pure classifiers over the observation fields, plus the [`HeatWatcher`]
//! loop that evaluates them on a fixed cadence.
//!
//! # Proximity
//!
//! [`classify_proximity`] buckets a local distance into exactly one of
//! critical / warning / clear. The server's ranger loop evaluates it once
//! per sample and plays the matching cue; there is no latching, so a
//! persistently close obstacle cues on every sample.
//!
//! # Heat
//!
//! [`classify_heat`] covers the two temperature conditions:
//!
//! - **Fire risk** - hot (angle above 60°) with nobody moving nearby.
//!   Level-triggered: re-asserted every cycle while it holds.
//! - **Rapid change** - motion present and the angle moved more than 10°
//!   from the last announced value. Edge-triggered: the watcher commits
//!   the new angle after announcing, so the same reading does not re-fire.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::announcer::{AnnounceError, Announcement, Announcer};
use crate::observation::{DistanceSample, ObservationState};

/// Angle above which a motionless room reads as a fire risk, in degrees.
pub const FIRE_ANGLE_DEGREES: i32 = 60;

/// Angle swing that reads as a rapid change, in degrees.
pub const RAPID_CHANGE_DEGREES: i32 = 10;

/// Local distances below this are critical proximity, in centimeters.
pub const CRITICAL_DISTANCE_CM: u16 = 10;

/// Local distances below this (and not critical) are warning proximity.
pub const WARNING_DISTANCE_CM: u16 = 15;

/// Proximity classification of a local distance sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityClass {
    /// Closer than 10 cm: move back now.
    Critical,
    /// 10-15 cm: back off.
    Warning,
    /// 15 cm or more: nothing to say.
    Clear,
}

impl ProximityClass {
    /// The cue this class plays, if any.
    pub fn announcement(self) -> Option<Announcement> {
        match self {
            ProximityClass::Critical => Some(Announcement::CriticalProximity),
            ProximityClass::Warning => Some(Announcement::WarningProximity),
            ProximityClass::Clear => None,
        }
    }
}

/// Bucket a local distance sample. Total and mutually exclusive.
pub fn classify_proximity(distance: DistanceSample) -> ProximityClass {
    match distance.cm() {
        d if d < CRITICAL_DISTANCE_CM => ProximityClass::Critical,
        d if d < WARNING_DISTANCE_CM => ProximityClass::Warning,
        _ => ProximityClass::Clear,
    }
}

/// A temperature condition worth announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatAlert {
    /// High temperature with no motion detected.
    FireRisk { angle: i32 },
    /// The angle moved sharply since the last announced value.
    RapidChange { angle: i32 },
}

/// Classify the heat conditions from one observation.
///
/// Fire risk applies while motion is absent; rapid change only while
/// motion is present.
pub fn classify_heat(motion: bool, angle: i32, angle_previous: i32) -> Option<HeatAlert> {
    if !motion {
        if angle > FIRE_ANGLE_DEGREES {
            return Some(HeatAlert::FireRisk { angle });
        }
        None
    } else if (angle - angle_previous).abs() > RAPID_CHANGE_DEGREES {
        Some(HeatAlert::RapidChange { angle })
    } else {
        None
    }
}

/// Heat watcher configuration.
#[derive(Debug, Clone)]
pub struct HeatWatcherConfig {
    /// Cadence of policy evaluation.
    pub poll_interval: Duration,
}

impl Default for HeatWatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// The heat-alert policy loop.
///
/// Re-evaluates [`classify_heat`] over the latest observation on a fixed
/// cadence. On a fire risk the watcher speaks the reading once and then
/// repeats the fire cue until a motion report arrives; the repeat loop
/// re-checks the motion flag before every cue, so it ends within one
/// repetition of the flag flipping. Only this watcher's thread blocks
/// while the alarm sounds.
pub struct HeatWatcher {
    state: Arc<ObservationState>,
    announcer: Arc<dyn Announcer>,
    config: HeatWatcherConfig,
}

impl HeatWatcher {
    pub fn new(state: Arc<ObservationState>, announcer: Arc<dyn Announcer>) -> Self {
        Self::with_config(state, announcer, HeatWatcherConfig::default())
    }

    pub fn with_config(
        state: Arc<ObservationState>,
        announcer: Arc<dyn Announcer>,
        config: HeatWatcherConfig,
    ) -> Self {
        Self {
            state,
            announcer,
            config,
        }
    }

    /// Run the policy loop forever.
    pub fn run(self) {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "heat watcher started"
        );
        loop {
            self.evaluate();
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Run one policy cycle.
    pub fn evaluate(&self) {
        let obs = self.state.snapshot();
        match classify_heat(obs.motion, obs.angle, obs.angle_previous) {
            Some(HeatAlert::FireRisk { angle }) => {
                warn!(angle, "fire risk: high temperature and no motion");
                self.announce(Announcement::Temperature { degrees: angle });
                self.sound_fire_alarm();
            }
            Some(HeatAlert::RapidChange { angle }) => {
                info!(
                    angle,
                    previous = obs.angle_previous,
                    "temperature changed sharply"
                );
                self.announce(Announcement::Temperature { degrees: angle });
                self.state.commit_angle_previous(angle);
            }
            None => {}
        }
    }

    /// Repeat the fire cue until motion is observed.
    fn sound_fire_alarm(&self) {
        while !self.state.motion() {
            self.announce(Announcement::FireSiren);
        }
        info!("motion observed, fire alarm stopped");
    }

    fn announce(&self, announcement: Announcement) {
        if let Err(error) = self.announcer.announce(announcement) {
            self.log_failure(announcement, &error);
        }
    }

    fn log_failure(&self, announcement: Announcement, error: &AnnounceError) {
        warn!(
            announcement = announcement.label(),
            error = %error,
            "announcement failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::DistanceSample;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Announcer that records calls; optionally reports motion to the
    /// shared state after a set number of fire cues.
    struct RecordingAnnouncer {
        calls: Mutex<Vec<Announcement>>,
        state: Option<Arc<ObservationState>>,
        cues_until_motion: AtomicUsize,
    }

    impl RecordingAnnouncer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                state: None,
                cues_until_motion: AtomicUsize::new(usize::MAX),
            })
        }

        fn motion_after(state: Arc<ObservationState>, cues: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                state: Some(state),
                cues_until_motion: AtomicUsize::new(cues),
            })
        }

        fn calls(&self) -> Vec<Announcement> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Announcer for RecordingAnnouncer {
        fn announce(&self, announcement: Announcement) -> Result<(), AnnounceError> {
            self.calls.lock().unwrap().push(announcement);
            if announcement == Announcement::FireSiren {
                if let Some(state) = &self.state {
                    if self.cues_until_motion.fetch_sub(1, Ordering::SeqCst) == 1 {
                        // A close remote reading flips the motion flag.
                        state.record_remote_distance(DistanceSample::from_cm(5));
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_proximity_is_total_and_exclusive() {
        for cm in 0..=900i64 {
            let class = classify_proximity(DistanceSample::from_cm(cm));
            let expected = if cm < 10 {
                ProximityClass::Critical
            } else if cm < 15 {
                ProximityClass::Warning
            } else {
                ProximityClass::Clear
            };
            assert_eq!(class, expected, "distance {cm}");
        }
    }

    #[test]
    fn test_proximity_scenario() {
        let classes: Vec<_> = [5i64, 12, 20]
            .into_iter()
            .map(|cm| classify_proximity(DistanceSample::from_cm(cm)))
            .collect();

        assert_eq!(
            classes,
            vec![
                ProximityClass::Critical,
                ProximityClass::Warning,
                ProximityClass::Clear,
            ]
        );
    }

    #[test]
    fn test_fire_risk_requires_no_motion() {
        assert_eq!(classify_heat(false, 0, 0), None, "cool room is quiet");
        assert_eq!(
            classify_heat(false, 75, 0),
            Some(HeatAlert::FireRisk { angle: 75 })
        );
        assert_eq!(classify_heat(false, 60, 0), None, "60 is not above 60");
        // With motion present the same angle is not a fire risk (and 75-0
        // reads as a rapid change instead).
        assert_eq!(
            classify_heat(true, 75, 0),
            Some(HeatAlert::RapidChange { angle: 75 })
        );
    }

    #[test]
    fn test_rapid_change_uses_absolute_difference() {
        assert_eq!(
            classify_heat(true, 30, 45),
            Some(HeatAlert::RapidChange { angle: 30 })
        );
        assert_eq!(classify_heat(true, 45, 36), None, "9 degrees is not rapid");
        assert_eq!(classify_heat(true, 45, 35), None, "10 degrees is not rapid");
        assert_eq!(
            classify_heat(true, 46, 35),
            Some(HeatAlert::RapidChange { angle: 46 })
        );
    }

    #[test]
    fn test_rapid_change_does_not_refire_after_commit() {
        let state = Arc::new(ObservationState::new());
        state.record_remote_distance(DistanceSample::from_cm(50)); // motion
        state.record_angle(75);
        let announcer = RecordingAnnouncer::new();
        let watcher = HeatWatcher::new(state.clone(), announcer.clone());

        watcher.evaluate();
        assert_eq!(
            announcer.calls(),
            vec![Announcement::Temperature { degrees: 75 }]
        );
        assert_eq!(state.angle_previous(), 75);

        // Same reading again: no new announcement.
        watcher.evaluate();
        assert_eq!(announcer.calls().len(), 1);
    }

    #[test]
    fn test_fire_alarm_runs_until_motion() {
        let state = Arc::new(ObservationState::new());
        state.record_angle(75);
        let announcer = RecordingAnnouncer::motion_after(state.clone(), 3);
        let watcher = HeatWatcher::new(state.clone(), announcer.clone());

        watcher.evaluate();

        let calls = announcer.calls();
        assert_eq!(calls[0], Announcement::Temperature { degrees: 75 });
        assert_eq!(
            calls[1..],
            [
                Announcement::FireSiren,
                Announcement::FireSiren,
                Announcement::FireSiren,
            ]
        );
        assert!(state.motion());

        // Next cycle: motion is present, 75 was never committed as the
        // previous angle, so the change announces and the siren stays off.
        watcher.evaluate();
        let calls = announcer.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[4], Announcement::Temperature { degrees: 75 });
    }

    #[test]
    fn test_quiet_when_nothing_holds() {
        let state = Arc::new(ObservationState::new());
        let announcer = RecordingAnnouncer::new();
        let watcher = HeatWatcher::new(state, announcer.clone());

        watcher.evaluate();

        assert!(announcer.calls().is_empty());
    }
}
