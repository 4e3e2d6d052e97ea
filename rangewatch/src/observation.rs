//! Shared observation state.
//!
//! Core types for the readings the polling loops produce and the policy
//! loops consume:
//!
//! - [`DistanceSample`] - a clamped ultrasonic distance in centimeters
//! - [`ObservationState`] - the process-wide latest-value store, one atomic
//!   cell per field
//! - [`Observation`] - a plain snapshot of all fields for policy evaluation
//!
//! # Freshness, not consistency
//!
//! Several loops write into the state and several read from it, with no
//! lock anywhere. Each field is an atomic cell, so a single-field load
//! always observes a value some writer actually stored (no torn reads),
//! but fields are updated independently: a snapshot may combine an angle
//! from this instant with a distance from a few polls ago. Consumers are
//! level-triggered polling loops that re-derive their decisions every
//! cycle and tolerate stale-by-one-poll reads. All accesses use `Relaxed`
//! ordering; no cross-field ordering is implied or needed.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU16, Ordering};
use std::time::Duration;

/// Sensor-range ceiling in centimeters; samples clamp here.
pub const MAX_RANGE_CM: u16 = 900;

/// Speed of sound used for round-trip conversion, in cm/s.
pub const SPEED_OF_SOUND_CM_PER_S: f64 = 34_000.0;

/// A remote distance at or below this reads as "motion present".
pub const MOTION_DISTANCE_CM: u16 = 70;

/// One ultrasonic distance reading, clamped to `0..=900` cm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DistanceSample(u16);

impl DistanceSample {
    /// The clamp ceiling: what an out-of-range or timed-out echo reads as.
    pub const MAX: Self = Self(MAX_RANGE_CM);

    /// Clamp an arbitrary integer reading into range.
    ///
    /// Used when decoding wire readings, which a peer could send as
    /// anything.
    pub fn from_cm(cm: i64) -> Self {
        Self(cm.clamp(0, MAX_RANGE_CM as i64) as u16)
    }

    /// Convert a round-trip echo time into a distance.
    ///
    /// Half the elapsed time at the speed of sound: the pulse travels to
    /// the obstacle and back. Clamped to the sensor ceiling.
    pub fn from_round_trip(elapsed: Duration) -> Self {
        let cm = elapsed.as_secs_f64() / 2.0 * SPEED_OF_SOUND_CM_PER_S;
        Self(cm.min(MAX_RANGE_CM as f64) as u16)
    }

    /// The distance in centimeters.
    pub fn cm(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for DistanceSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}cm", self.0)
    }
}

/// A point-in-time view of every observation field.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// Is something moving near the remote node?
    pub motion: bool,
    /// Latest reported angle/temperature, in degrees.
    pub angle: i32,
    /// Angle at the last announced rapid change.
    pub angle_previous: i32,
    /// Latest distance from the local ultrasonic ranger.
    pub distance_local: DistanceSample,
    /// Latest distance reported by the remote node.
    pub distance_remote: DistanceSample,
}

/// The process-wide latest-value store.
///
/// Writers: the local ranger loop (`distance_local`), the two reading
/// receivers (`distance_remote` + `motion`, `angle`), and the heat
/// watcher (`angle_previous`). Readers: everyone.
pub struct ObservationState {
    motion: AtomicBool,
    angle: AtomicI32,
    angle_previous: AtomicI32,
    distance_local: AtomicU16,
    distance_remote: AtomicU16,
}

impl ObservationState {
    /// Create a state with every field zeroed.
    pub fn new() -> Self {
        Self {
            motion: AtomicBool::new(false),
            angle: AtomicI32::new(0),
            angle_previous: AtomicI32::new(0),
            distance_local: AtomicU16::new(0),
            distance_remote: AtomicU16::new(0),
        }
    }

    pub fn motion(&self) -> bool {
        self.motion.load(Ordering::Relaxed)
    }

    pub fn angle(&self) -> i32 {
        self.angle.load(Ordering::Relaxed)
    }

    pub fn angle_previous(&self) -> i32 {
        self.angle_previous.load(Ordering::Relaxed)
    }

    pub fn distance_local(&self) -> DistanceSample {
        DistanceSample(self.distance_local.load(Ordering::Relaxed))
    }

    pub fn distance_remote(&self) -> DistanceSample {
        DistanceSample(self.distance_remote.load(Ordering::Relaxed))
    }

    /// Store the latest local ranger sample.
    pub fn record_local_distance(&self, sample: DistanceSample) {
        self.distance_local.store(sample.cm(), Ordering::Relaxed);
    }

    /// Store the latest remote distance and re-derive the motion flag.
    ///
    /// Motion is present iff the remote node sees something within
    /// [`MOTION_DISTANCE_CM`]; the boundary itself counts as motion.
    pub fn record_remote_distance(&self, sample: DistanceSample) {
        let motion = sample.cm() <= MOTION_DISTANCE_CM;
        self.distance_remote.store(sample.cm(), Ordering::Relaxed);
        if self.motion.swap(motion, Ordering::Relaxed) != motion {
            tracing::debug!(motion, distance = %sample, "motion flag changed");
        }
    }

    /// Store the latest reported angle.
    pub fn record_angle(&self, degrees: i32) {
        self.angle.store(degrees, Ordering::Relaxed);
    }

    /// Remember the angle a rapid-change alert was announced at.
    pub fn commit_angle_previous(&self, degrees: i32) {
        self.angle_previous.store(degrees, Ordering::Relaxed);
    }

    /// Read every field once.
    ///
    /// Fields are loaded independently; see the module docs on freshness.
    pub fn snapshot(&self) -> Observation {
        Observation {
            motion: self.motion(),
            angle: self.angle(),
            angle_previous: self.angle_previous(),
            distance_local: self.distance_local(),
            distance_remote: self.distance_remote(),
        }
    }
}

impl Default for ObservationState {
    fn default() -> Self {
        Self::new()
    }
}
