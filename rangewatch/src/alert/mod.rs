//! Alert classification and announcement.
//!
//! Two halves:
//!
//! - [`policy`] - pure classifiers over the observation state plus the
//!   [`HeatWatcher`] loop that runs them on a fixed cadence
//! - [`announcer`] - the playback capability: a trait the policy code
//!   calls and a stock implementation that shells out to a speech command
//!   and an audio player
//!
//! Classification is re-derived from scratch every cycle (level-triggered)
//! with one exception: the rapid-change alert compares against the angle
//! remembered from its own last firing (edge-triggered).

mod announcer;
mod policy;

pub use announcer::{
    AnnounceError, Announcement, Announcer, AnnouncerConfig, CommandAnnouncer,
};
pub use policy::{
    classify_heat, classify_proximity, HeatAlert, HeatWatcher, HeatWatcherConfig, ProximityClass,
    CRITICAL_DISTANCE_CM, FIRE_ANGLE_DEGREES, RAPID_CHANGE_DEGREES, WARNING_DISTANCE_CM,
};
