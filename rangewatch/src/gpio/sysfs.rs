//! Sysfs GPIO backend.
//!
//! Implements [`GpioBackend`] against the `/sys/class/gpio` control tree:
//! pin numbers written to `export`/`unexport`, `in`/`out` written to
//! `gpio<N>/direction`, `0`/`1` read from and written to `gpio<N>/value`.
//!
//! The root directory is configurable so tests can point the backend at a
//! scripted temporary tree instead of real hardware.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::{Direction, GpioBackend, GpioError, Level};

/// Default sysfs GPIO control tree.
const DEFAULT_ROOT: &str = "/sys/class/gpio";

/// How long to wait after an export before touching the pin's attributes.
///
/// The kernel creates `gpio<N>/` asynchronously after the export write; a
/// direction write issued straight away can race the tree showing up.
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

/// GPIO backend over a sysfs-style control tree.
pub struct SysfsGpio {
    root: PathBuf,
    settle: Duration,
}

impl SysfsGpio {
    /// Create a backend over the real control tree at `/sys/class/gpio`.
    pub fn new() -> Self {
        Self::with_root(DEFAULT_ROOT)
    }

    /// Create a backend over an alternative control tree root.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            settle: EXPORT_SETTLE,
        }
    }

    /// Override the post-export settle delay (tests use zero).
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    fn pin_attr(&self, pin: u32, attr: &str) -> PathBuf {
        self.root.join(format!("gpio{pin}")).join(attr)
    }
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioBackend for SysfsGpio {
    fn export(&self, pin: u32) -> Result<(), GpioError> {
        fs::write(self.root.join("export"), pin.to_string())
            .map_err(|source| GpioError::Export { pin, source })?;
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        Ok(())
    }

    fn unexport(&self, pin: u32) -> Result<(), GpioError> {
        fs::write(self.root.join("unexport"), pin.to_string())
            .map_err(|source| GpioError::Unexport { pin, source })
    }

    fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), GpioError> {
        fs::write(self.pin_attr(pin, "direction"), direction.as_str()).map_err(|source| {
            GpioError::SetDirection {
                pin,
                direction,
                source,
            }
        })
    }

    fn read(&self, pin: u32) -> Result<Level, GpioError> {
        let raw = fs::read_to_string(self.pin_attr(pin, "value"))
            .map_err(|source| GpioError::Read { pin, source })?;
        raw.trim()
            .chars()
            .next()
            .and_then(Level::from_char)
            .ok_or(GpioError::InvalidValue { pin, value: raw })
    }

    fn write(&self, pin: u32, level: Level) -> Result<(), GpioError> {
        fs::write(self.pin_attr(pin, "value"), level.as_str())
            .map_err(|source| GpioError::Write { pin, source })
    }
}
