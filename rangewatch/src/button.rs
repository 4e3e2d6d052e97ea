//! Button watcher.
//!
//! A two-line momentary button: a drive line held high as the pull
//! reference and a sense line that reads high until the button shorts it
//! low. The watcher polls on a fixed cadence and treats a high→low
//! transition as a press, announcing the current angle.
//!
//! There is no debounce beyond the sampling interval itself: mechanical
//! bounce faster than one poll can register extra presses. Accepted
//! behavior.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::alert::{Announcement, Announcer};
use crate::gpio::{GpioBackend, GpioError, GpioLine, Level};
use crate::observation::ObservationState;

/// Button watcher configuration.
#[derive(Debug, Clone)]
pub struct ButtonConfig {
    /// Pin driven high as the pull reference.
    pub drive_pin: u32,

    /// Pin sampled for the button level.
    pub sense_pin: u32,

    /// Sampling cadence.
    pub poll_interval: Duration,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            drive_pin: 21,
            sense_pin: 20,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl ButtonConfig {
    /// Use a specific drive/sense pin pair.
    pub fn with_pins(mut self, drive_pin: u32, sense_pin: u32) -> Self {
        self.drive_pin = drive_pin;
        self.sense_pin = sense_pin;
        self
    }
}

/// Falling-edge detector over successive level samples.
///
/// Starts from high (the line's idle state), so a press already held at
/// startup does not register until the line has been seen high first.
#[derive(Debug)]
pub struct PressDetector {
    previous: Level,
}

impl PressDetector {
    pub fn new() -> Self {
        Self {
            previous: Level::High,
        }
    }

    /// Feed one sample; true exactly on a high→low transition.
    pub fn update(&mut self, level: Level) -> bool {
        let pressed = self.previous == Level::High && level == Level::Low;
        self.previous = level;
        pressed
    }
}

impl Default for PressDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// The button polling loop.
pub struct ButtonWatcher<B> {
    drive: GpioLine<B>,
    sense: GpioLine<B>,
    config: ButtonConfig,
    detector: PressDetector,
}

impl<B: GpioBackend> ButtonWatcher<B> {
    /// Acquire both lines.
    pub fn open(backend: Arc<B>, config: ButtonConfig) -> Result<Self, GpioError> {
        let drive = GpioLine::output(backend.clone(), config.drive_pin)?;
        let sense = GpioLine::input(backend, config.sense_pin)?;
        info!(
            drive_pin = config.drive_pin,
            sense_pin = config.sense_pin,
            "button watcher ready"
        );
        Ok(Self {
            drive,
            sense,
            config,
            detector: PressDetector::new(),
        })
    }

    /// Poll forever; on each press announce the current angle.
    ///
    /// Returns only on a GPIO failure, which the node runner treats as
    /// fatal to the process.
    pub fn run(
        mut self,
        state: Arc<ObservationState>,
        announcer: Arc<dyn Announcer>,
    ) -> Result<(), GpioError> {
        loop {
            // Keep the pull reference asserted; the line does not hold its
            // level across polls on every board.
            self.drive.write(Level::High)?;
            let level = self.sense.read()?;
            if self.detector.update(level) {
                let degrees = state.angle();
                info!(degrees, "button pressed");
                if let Err(e) = announcer.announce(Announcement::Temperature { degrees }) {
                    warn!(error = %e, "announcement failed");
                }
            }
            thread::sleep(self.config.poll_interval);
        }
    }
}
