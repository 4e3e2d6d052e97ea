//! Ultrasonic ranging.
//!
//! Drives an HC-SR04-style sensor through two GPIO lines: a trigger output
//! that requests a pulse and an echo input that goes high for the pulse's
//! round-trip flight time.
//!
//! # Protocol per sample
//!
//! 1. Drive the trigger high for [`RangerConfig::trigger_pulse`]
//!    (busy-waited; the width is far below timer-sleep resolution), then
//!    low.
//! 2. Busy-poll the echo line to the low→high transition; stamp the start.
//! 3. Busy-poll to the high→low transition; stamp the end.
//! 4. Distance = elapsed / 2 × 34 000 cm/s, clamped to `0..=900` cm.
//!
//! # Failure policy
//!
//! Any GPIO error aborts the sample and propagates; the node runners treat
//! it as fatal to the whole process. There is no retry path.
//!
//! By default the echo polls have **no timeout**: a sensor that never
//! answers hangs the sampling loop. Configure
//! [`RangerConfig::echo_timeout`] to bound the wait; a timed-out sample
//! resolves to the 900 cm ceiling, the same reading a never-returning
//! echo approximates.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::gpio::{GpioBackend, GpioError, GpioLine, Level};
use crate::observation::DistanceSample;

/// Ultrasonic ranger configuration.
#[derive(Debug, Clone)]
pub struct RangerConfig {
    /// Pin driving the sensor's trigger input.
    pub trigger_pin: u32,

    /// Pin sampling the sensor's echo output.
    pub echo_pin: u32,

    /// Minimum trigger pulse width.
    pub trigger_pulse: Duration,

    /// Delay between samples.
    pub settle_delay: Duration,

    /// Bound on each echo-edge wait. `None` polls forever.
    pub echo_timeout: Option<Duration>,
}

impl Default for RangerConfig {
    fn default() -> Self {
        Self {
            trigger_pin: 23,
            echo_pin: 24,
            trigger_pulse: Duration::from_micros(10),
            settle_delay: Duration::from_millis(500),
            echo_timeout: None,
        }
    }
}

impl RangerConfig {
    /// Use a specific trigger/echo pin pair.
    pub fn with_pins(mut self, trigger_pin: u32, echo_pin: u32) -> Self {
        self.trigger_pin = trigger_pin;
        self.echo_pin = echo_pin;
        self
    }

    /// Set the delay between samples.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Bound each echo-edge wait.
    pub fn with_echo_timeout(mut self, echo_timeout: Duration) -> Self {
        self.echo_timeout = Some(echo_timeout);
        self
    }
}

/// One ultrasonic sensor: a trigger line, an echo line, and the sampling
/// protocol between them.
pub struct UltrasonicRanger<B> {
    trigger: GpioLine<B>,
    echo: GpioLine<B>,
    config: RangerConfig,
}

impl<B: GpioBackend> UltrasonicRanger<B> {
    /// Acquire both lines and park the trigger low.
    ///
    /// The trigger must be in a known idle state before the first pulse;
    /// the sensor treats any rising edge as a request.
    pub fn open(backend: Arc<B>, config: RangerConfig) -> Result<Self, GpioError> {
        let trigger = GpioLine::output(backend.clone(), config.trigger_pin)?;
        let echo = GpioLine::input(backend, config.echo_pin)?;
        trigger.write(Level::Low)?;
        tracing::info!(
            trigger_pin = config.trigger_pin,
            echo_pin = config.echo_pin,
            "ultrasonic ranger ready"
        );
        Ok(Self {
            trigger,
            echo,
            config,
        })
    }

    /// The configured delay between samples.
    pub fn settle_delay(&self) -> Duration {
        self.config.settle_delay
    }

    /// Take one distance sample.
    pub fn sample(&mut self) -> Result<DistanceSample, GpioError> {
        self.trigger.write(Level::High)?;
        busy_wait(self.config.trigger_pulse);
        self.trigger.write(Level::Low)?;

        let start = match self.wait_for_edge(Level::High)? {
            Some(stamp) => stamp,
            None => {
                debug!(pin = self.echo.pin(), "echo never rose, reading as max range");
                return Ok(DistanceSample::MAX);
            }
        };
        let end = match self.wait_for_edge(Level::Low)? {
            Some(stamp) => stamp,
            None => {
                debug!(pin = self.echo.pin(), "echo never fell, reading as max range");
                return Ok(DistanceSample::MAX);
            }
        };

        Ok(DistanceSample::from_round_trip(end - start))
    }

    /// Poll the echo line until it reaches `level`.
    ///
    /// Returns the transition timestamp, or `None` when the configured
    /// timeout expired first. With no timeout this polls indefinitely.
    fn wait_for_edge(&self, level: Level) -> Result<Option<Instant>, GpioError> {
        let deadline = self.config.echo_timeout.map(|t| Instant::now() + t);
        loop {
            if self.echo.read()? == level {
                return Ok(Some(Instant::now()));
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
            }
        }
    }
}

/// Block for `duration` without yielding the CPU.
///
/// Used for the trigger pulse, whose ~10µs width is below what a timer
/// sleep can hold.
fn busy_wait(duration: Duration) {
    let started = Instant::now();
    while started.elapsed() < duration {
        std::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend whose echo pin replays a scripted level sequence and whose
    /// writes are recorded.
    struct ScriptedGpio {
        echo: Mutex<VecDeque<Level>>,
        writes: Mutex<Vec<(u32, Level)>>,
    }

    impl ScriptedGpio {
        fn new(echo: &[Level]) -> Arc<Self> {
            Arc::new(Self {
                echo: Mutex::new(echo.iter().copied().collect()),
                writes: Mutex::new(Vec::new()),
            })
        }

        fn writes(&self) -> Vec<(u32, Level)> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl GpioBackend for ScriptedGpio {
        fn export(&self, _pin: u32) -> Result<(), GpioError> {
            Ok(())
        }

        fn unexport(&self, _pin: u32) -> Result<(), GpioError> {
            Ok(())
        }

        fn set_direction(&self, _pin: u32, _direction: crate::gpio::Direction) -> Result<(), GpioError> {
            Ok(())
        }

        fn read(&self, pin: u32) -> Result<Level, GpioError> {
            // Past the end of the script the line stays at its final level.
            let mut echo = self.echo.lock().unwrap();
            if echo.len() > 1 {
                Ok(echo.pop_front().unwrap())
            } else {
                echo.front().copied().ok_or(GpioError::Read {
                    pin,
                    source: std::io::Error::new(std::io::ErrorKind::Other, "script exhausted"),
                })
            }
        }

        fn write(&self, pin: u32, level: Level) -> Result<(), GpioError> {
            self.writes.lock().unwrap().push((pin, level));
            Ok(())
        }
    }

    fn config() -> RangerConfig {
        RangerConfig::default()
            .with_pins(23, 24)
            .with_settle_delay(Duration::ZERO)
    }

    #[test]
    fn test_open_parks_trigger_low() {
        let backend = ScriptedGpio::new(&[Level::Low]);
        let _ranger = UltrasonicRanger::open(backend.clone(), config()).unwrap();

        assert_eq!(backend.writes(), vec![(23, Level::Low)]);
    }

    #[test]
    fn test_sample_pulses_trigger_and_measures() {
        let backend = ScriptedGpio::new(&[
            Level::Low,  // waiting for the rising edge
            Level::Low,
            Level::High, // start stamp
            Level::High, // pulse in flight
            Level::High,
            Level::Low, // end stamp
        ]);
        let mut ranger = UltrasonicRanger::open(backend.clone(), config()).unwrap();

        let sample = ranger.sample().unwrap();

        // Scripted polls run in microseconds; a sane sample is tiny but
        // the math is exercised end to end.
        assert!(sample.cm() < 900);
        assert_eq!(
            backend.writes(),
            vec![(23, Level::Low), (23, Level::High), (23, Level::Low)]
        );
    }

    #[test]
    fn test_silent_echo_times_out_at_max_range() {
        let backend = ScriptedGpio::new(&[Level::Low]); // echo never rises
        let mut ranger = UltrasonicRanger::open(
            backend,
            config().with_echo_timeout(Duration::from_millis(5)),
        )
        .unwrap();

        let sample = ranger.sample().unwrap();

        assert_eq!(sample, DistanceSample::MAX);
    }

    #[test]
    fn test_stuck_high_echo_times_out_at_max_range() {
        let backend = ScriptedGpio::new(&[Level::High]); // echo never falls
        let mut ranger = UltrasonicRanger::open(
            backend,
            config().with_echo_timeout(Duration::from_millis(5)),
        )
        .unwrap();

        let sample = ranger.sample().unwrap();

        assert_eq!(sample, DistanceSample::MAX);
    }

    #[test]
    fn test_gpio_failure_propagates() {
        let backend = ScriptedGpio::new(&[]); // read errors immediately
        let mut ranger = UltrasonicRanger::open(backend, config()).unwrap();

        let err = ranger.sample().unwrap_err();

        assert!(matches!(err, GpioError::Read { pin: 24, .. }));
    }
}
