//! GPIO line control.
//!
//! Everything that touches a digital pin goes through this module:
//!
//! - [`GpioBackend`] - the capability the OS must provide (export, direction,
//!   read, write, unexport per pin number)
//! - [`SysfsGpio`] - the stock backend over the sysfs GPIO control tree
//! - [`GpioLine`] - one pin with a fixed direction, owned by exactly one
//!   component for its lifetime
//!
//! The backend is a trait so that the ranging and button loops can be
//! exercised against a scripted control tree in tests; nothing above this
//! module knows how lines reach the hardware.
//!
//! # Ownership
//!
//! A [`GpioLine`] is acquired with its direction fixed (`input`/`output`)
//! and never shared: reads are only available on inputs, writes only on
//! outputs, and the wrong-direction call is rejected with a typed error
//! rather than left to the hardware. [`GpioLine::release`] unexports the
//! pin best-effort; the polling loops never reach it (they run until the
//! process dies), so nothing may depend on it for correctness.

mod sysfs;

use std::io;
use std::sync::Arc;

pub use sysfs::SysfsGpio;

/// Direction of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input: the line is sampled.
    In,
    /// Output: the line is driven.
    Out,
}

impl Direction {
    /// The token the sysfs control tree expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logic level of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Parse a level from the single character the control tree reports.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Level::Low),
            '1' => Some(Level::High),
            _ => None,
        }
    }

    /// The character the control tree expects when driving the line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "0",
            Level::High => "1",
        }
    }
}

/// Error type for GPIO operations.
///
/// Every OS-level failure carries the pin and the operation that failed;
/// nothing is swallowed.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// Failed to request ownership of a pin.
    #[error("failed to export pin {pin}: {source}")]
    Export {
        pin: u32,
        #[source]
        source: io::Error,
    },

    /// Failed to relinquish ownership of a pin.
    #[error("failed to unexport pin {pin}: {source}")]
    Unexport {
        pin: u32,
        #[source]
        source: io::Error,
    },

    /// Failed to configure a pin's direction.
    #[error("failed to set pin {pin} direction to {direction}: {source}")]
    SetDirection {
        pin: u32,
        direction: Direction,
        #[source]
        source: io::Error,
    },

    /// Failed to sample an input pin.
    #[error("failed to read pin {pin}: {source}")]
    Read {
        pin: u32,
        #[source]
        source: io::Error,
    },

    /// Failed to drive an output pin.
    #[error("failed to write pin {pin}: {source}")]
    Write {
        pin: u32,
        #[source]
        source: io::Error,
    },

    /// The control tree reported something other than `0` or `1`.
    #[error("pin {pin} reported an unexpected value {value:?}")]
    InvalidValue { pin: u32, value: String },

    /// A read was issued on an output line, or a write on an input line.
    #[error("pin {pin} is configured as {actual}, not {expected}")]
    WrongDirection {
        pin: u32,
        expected: Direction,
        actual: Direction,
    },
}

/// Capability interface over the OS GPIO control surface.
///
/// One method per control verb. All operations are synchronous and may
/// block briefly on the underlying OS call.
pub trait GpioBackend: Send + Sync {
    /// Request ownership of a pin from the OS.
    fn export(&self, pin: u32) -> Result<(), GpioError>;

    /// Relinquish ownership of a pin.
    fn unexport(&self, pin: u32) -> Result<(), GpioError>;

    /// Configure a pin as input or output.
    ///
    /// Must be called after [`export`](Self::export) and before the first
    /// read or write.
    fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), GpioError>;

    /// Sample an input pin's current logic level.
    fn read(&self, pin: u32) -> Result<Level, GpioError>;

    /// Drive an output pin high or low.
    fn write(&self, pin: u32, level: Level) -> Result<(), GpioError>;
}

/// One digital line: a pin number plus a fixed direction.
///
/// Acquiring a line exports the pin and configures its direction in one
/// step; the direction cannot change for the lifetime of the line.
pub struct GpioLine<B> {
    backend: Arc<B>,
    pin: u32,
    direction: Direction,
}

impl<B: GpioBackend> GpioLine<B> {
    /// Acquire a pin as an input line.
    pub fn input(backend: Arc<B>, pin: u32) -> Result<Self, GpioError> {
        Self::acquire(backend, pin, Direction::In)
    }

    /// Acquire a pin as an output line.
    pub fn output(backend: Arc<B>, pin: u32) -> Result<Self, GpioError> {
        Self::acquire(backend, pin, Direction::Out)
    }

    fn acquire(backend: Arc<B>, pin: u32, direction: Direction) -> Result<Self, GpioError> {
        backend.export(pin)?;
        backend.set_direction(pin, direction)?;
        tracing::debug!(pin, %direction, "gpio line acquired");
        Ok(Self {
            backend,
            pin,
            direction,
        })
    }

    /// The pin number this line controls.
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// Sample the line. Only valid on input lines.
    pub fn read(&self) -> Result<Level, GpioError> {
        if self.direction != Direction::In {
            return Err(GpioError::WrongDirection {
                pin: self.pin,
                expected: Direction::In,
                actual: self.direction,
            });
        }
        self.backend.read(self.pin)
    }

    /// Drive the line. Only valid on output lines.
    pub fn write(&self, level: Level) -> Result<(), GpioError> {
        if self.direction != Direction::Out {
            return Err(GpioError::WrongDirection {
                pin: self.pin,
                expected: Direction::Out,
                actual: self.direction,
            });
        }
        self.backend.write(self.pin, level)
    }

    /// Relinquish the pin, consuming the line.
    ///
    /// Best-effort: the pin is gone from this process either way.
    pub fn release(self) -> Result<(), GpioError> {
        self.backend.unexport(self.pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scripted_backend() -> (tempfile::TempDir, Arc<SysfsGpio>) {
        let root = tempfile::tempdir().unwrap();
        for pin in [5u32, 6] {
            let dir = root.path().join(format!("gpio{pin}"));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("direction"), "in").unwrap();
            fs::write(dir.join("value"), "0").unwrap();
        }
        let backend = Arc::new(SysfsGpio::with_root(root.path()).with_settle(std::time::Duration::ZERO));
        (root, backend)
    }

    #[test]
    fn test_acquire_fixes_direction() {
        let (root, backend) = scripted_backend();

        let line = GpioLine::output(backend, 5).unwrap();
        assert_eq!(line.pin(), 5);

        let direction = fs::read_to_string(root.path().join("gpio5/direction")).unwrap();
        assert_eq!(direction, "out");
    }

    #[test]
    fn test_write_rejected_on_input_line() {
        let (_root, backend) = scripted_backend();

        let line = GpioLine::input(backend, 5).unwrap();
        let err = line.write(Level::High).unwrap_err();

        assert!(matches!(
            err,
            GpioError::WrongDirection {
                pin: 5,
                expected: Direction::Out,
                actual: Direction::In,
            }
        ));
    }

    #[test]
    fn test_read_rejected_on_output_line() {
        let (_root, backend) = scripted_backend();

        let line = GpioLine::output(backend, 6).unwrap();
        let err = line.read().unwrap_err();

        assert!(matches!(err, GpioError::WrongDirection { pin: 6, .. }));
    }

    #[test]
    fn test_write_then_read_through_backend() {
        let (root, backend) = scripted_backend();

        let out = GpioLine::output(backend.clone(), 5).unwrap();
        out.write(Level::High).unwrap();
        assert_eq!(
            fs::read_to_string(root.path().join("gpio5/value")).unwrap(),
            "1"
        );

        let sense = GpioLine::input(backend, 6).unwrap();
        fs::write(root.path().join("gpio6/value"), "1").unwrap();
        assert_eq!(sense.read().unwrap(), Level::High);
    }

    #[test]
    fn test_release_unexports() {
        let (root, backend) = scripted_backend();

        let line = GpioLine::output(backend, 5).unwrap();
        line.release().unwrap();

        assert_eq!(
            fs::read_to_string(root.path().join("unexport")).unwrap(),
            "5"
        );
    }

    #[test]
    fn test_level_from_char() {
        assert_eq!(Level::from_char('0'), Some(Level::Low));
        assert_eq!(Level::from_char('1'), Some(Level::High));
        assert_eq!(Level::from_char('x'), None);
    }
}
