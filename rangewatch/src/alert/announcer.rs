//! Audio announcement capability.
//!
//! The policy loops do not play sound themselves; they hand an
//! [`Announcement`] to an [`Announcer`]. The stock [`CommandAnnouncer`]
//! shells out to a text-to-speech command for spoken readouts and to an
//! audio player for the short cues. Tests substitute recording stubs.
//!
//! Playback is fire-and-forget from the caller's side: a failed
//! announcement is logged and the condition that produced it will simply
//! be re-derived on the next cycle.

use std::io;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

/// What to announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    /// Spoken readout of the current temperature/angle.
    Temperature { degrees: i32 },
    /// Short "move back now" cue for critical proximity.
    CriticalProximity,
    /// Short "back" cue for warning proximity.
    WarningProximity,
    /// One repetition of the fire alarm cue.
    FireSiren,
}

impl Announcement {
    /// Stable label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Announcement::Temperature { .. } => "temperature",
            Announcement::CriticalProximity => "critical-proximity",
            Announcement::WarningProximity => "warning-proximity",
            Announcement::FireSiren => "fire-siren",
        }
    }
}

/// Error type for announcement playback.
#[derive(Debug, thiserror::Error)]
pub enum AnnounceError {
    /// The playback command could not be launched at all.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The playback command ran but reported failure.
    #[error("`{command}` exited with {status}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
    },
}

/// Capability interface for issuing announcements.
///
/// Implementations must be callable from any loop; playback blocks the
/// calling thread until the sound finishes.
pub trait Announcer: Send + Sync {
    fn announce(&self, announcement: Announcement) -> Result<(), AnnounceError>;
}

/// Announcer configuration: which commands to run and which sounds to play.
#[derive(Debug, Clone)]
pub struct AnnouncerConfig {
    /// Text-to-speech command for spoken readouts.
    pub speech_command: String,

    /// Language argument passed to the speech command.
    pub speech_language: String,

    /// Audio player for the cue files.
    pub player_command: String,

    /// Cue played on critical proximity.
    pub critical_sound: PathBuf,

    /// Cue played on warning proximity.
    pub warning_sound: PathBuf,

    /// Cue repeated while a fire risk stands.
    pub fire_sound: PathBuf,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            speech_command: "gtts".into(),
            speech_language: "en".into(),
            player_command: "aplay".into(),
            critical_sound: "sounds/move-back.wav".into(),
            warning_sound: "sounds/back.wav".into(),
            fire_sound: "sounds/fire-alarm.wav".into(),
        }
    }
}

impl AnnouncerConfig {
    /// Resolve the cue files relative to a sound directory.
    pub fn with_sound_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.critical_sound = dir.join("move-back.wav");
        self.warning_sound = dir.join("back.wav");
        self.fire_sound = dir.join("fire-alarm.wav");
        self
    }

    /// Use a different audio player.
    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player_command = player.into();
        self
    }
}

/// Announcer that shells out for playback.
pub struct CommandAnnouncer {
    config: AnnouncerConfig,
}

impl CommandAnnouncer {
    pub fn new(config: AnnouncerConfig) -> Self {
        Self { config }
    }

    fn speak(&self, degrees: i32) -> Result<(), AnnounceError> {
        let phrase = format!("The current temperature is {degrees} degrees.");
        self.run(
            Command::new(&self.config.speech_command)
                .arg(&self.config.speech_language)
                .arg(phrase),
            &self.config.speech_command,
        )
    }

    fn play(&self, sound: &PathBuf) -> Result<(), AnnounceError> {
        self.run(
            Command::new(&self.config.player_command).arg(sound),
            &self.config.player_command,
        )
    }

    fn run(&self, command: &mut Command, name: &str) -> Result<(), AnnounceError> {
        let status = command.status().map_err(|source| AnnounceError::Launch {
            command: name.to_string(),
            source,
        })?;
        if !status.success() {
            return Err(AnnounceError::Failed {
                command: name.to_string(),
                status,
            });
        }
        Ok(())
    }
}

impl Announcer for CommandAnnouncer {
    fn announce(&self, announcement: Announcement) -> Result<(), AnnounceError> {
        debug!(announcement = announcement.label(), "announcing");
        match announcement {
            Announcement::Temperature { degrees } => self.speak(degrees),
            Announcement::CriticalProximity => self.play(&self.config.critical_sound),
            Announcement::WarningProximity => self.play(&self.config.warning_sound),
            Announcement::FireSiren => self.play(&self.config.fire_sound),
        }
    }
}
