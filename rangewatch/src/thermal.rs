//! Thermal probe.
//!
//! Reads whole degrees Celsius from a sysfs thermal zone. The kernel
//! exposes each zone's reading in millidegrees in `<zone>/temp`; the
//! probe truncates to whole degrees, which is all the wire format
//! carries.
//!
//! Feeds the `report` command, which streams the reading to the server's
//! angle/temperature channel once a second.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Error type for thermal probe reads.
#[derive(Debug, thiserror::Error)]
pub enum ThermalError {
    /// The zone's attribute could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The zone reported something that is not a millidegree integer.
    #[error("malformed reading in {path}: {raw:?}")]
    Malformed { path: PathBuf, raw: String },
}

/// One sysfs thermal zone.
pub struct ThermalProbe {
    zone: PathBuf,
}

impl ThermalProbe {
    /// The zone most boards wire the ambient sensor to.
    pub const DEFAULT_ZONE: &'static str = "/sys/class/thermal/thermal_zone0";

    /// Probe the default zone.
    pub fn new() -> Self {
        Self::with_zone(Self::DEFAULT_ZONE)
    }

    /// Probe a specific zone directory.
    pub fn with_zone(zone: impl AsRef<Path>) -> Self {
        Self {
            zone: zone.as_ref().to_path_buf(),
        }
    }

    /// Read the zone's current temperature in whole degrees Celsius.
    pub fn read_celsius(&self) -> Result<i32, ThermalError> {
        let path = self.zone.join("temp");
        let raw = fs::read_to_string(&path).map_err(|source| ThermalError::Read {
            path: path.clone(),
            source,
        })?;
        let millidegrees: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ThermalError::Malformed { path, raw })?;
        Ok((millidegrees / 1000) as i32)
    }
}

impl Default for ThermalProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_with(content: &str) -> (tempfile::TempDir, ThermalProbe) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("temp"), content).unwrap();
        let probe = ThermalProbe::with_zone(dir.path());
        (dir, probe)
    }

    #[test]
    fn test_millidegrees_truncate_to_whole_degrees() {
        let (_dir, probe) = zone_with("48850\n");
        assert_eq!(probe.read_celsius().unwrap(), 48);
    }

    #[test]
    fn test_negative_reading() {
        let (_dir, probe) = zone_with("-3200\n");
        assert_eq!(probe.read_celsius().unwrap(), -3);
    }

    #[test]
    fn test_missing_zone_is_a_read_error() {
        let probe = ThermalProbe::with_zone("/nonexistent/thermal_zone9");
        assert!(matches!(
            probe.read_celsius().unwrap_err(),
            ThermalError::Read { .. }
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (_dir, probe) = zone_with("lukewarm\n");
        assert!(matches!(
            probe.read_celsius().unwrap_err(),
            ThermalError::Malformed { .. }
        ));
    }
}
