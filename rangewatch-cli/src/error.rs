//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and the exit behavior the failure policy promises: one line on stderr,
//! status 1, no cleanup.

use std::fmt;
use std::process;

use rangewatch::gpio::GpioError;
use rangewatch::link::LinkError;
use rangewatch::thermal::ThermalError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to build the async runtime or spawn a thread
    Runtime(std::io::Error),
    /// GPIO setup failed
    Gpio(GpioError),
    /// Peer link setup failed
    Link(LinkError),
    /// Thermal probe failed
    Thermal(ThermalError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Gpio(_) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. The sysfs GPIO tree is missing: check /sys/class/gpio exists");
                eprintln!("  2. Permissions: GPIO export usually needs root or the gpio group");
                eprintln!("  3. A pin is already exported by another process");
            }
            CliError::Link(LinkError::Connect { peer, .. }) => {
                eprintln!();
                eprintln!("Check that the server node is running and reachable at {peer}.");
            }
            CliError::Link(LinkError::Bind { port, .. }) => {
                eprintln!();
                eprintln!("Check that port {port} is not already in use on this host.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Gpio(e) => write!(f, "GPIO setup failed: {}", e),
            CliError::Link(e) => write!(f, "Peer link failed: {}", e),
            CliError::Thermal(e) => write!(f, "Thermal probe failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Gpio(e) => Some(e),
            CliError::Link(e) => Some(e),
            CliError::Thermal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpioError> for CliError {
    fn from(e: GpioError) -> Self {
        CliError::Gpio(e)
    }
}

impl From<LinkError> for CliError {
    fn from(e: LinkError) -> Self {
        CliError::Link(e)
    }
}

impl From<ThermalError> for CliError {
    fn from(e: ThermalError) -> Self {
        CliError::Thermal(e)
    }
}
