//! CLI command implementations.
//!
//! Each node role has its own module with argument definitions and a
//! runner:
//!
//! - [`motion`] - ultrasonic ranger loop + distance sender
//! - [`server`] - receivers, local ranger, heat watcher, button watcher
//! - [`report`] - thermal probe streamed to the temperature channel

pub mod motion;
pub mod report;
pub mod server;

use std::process;
use std::thread;

use tracing::error;

use crate::error::CliError;

/// Spawn a named polling-loop thread whose failure kills the process.
///
/// The GPIO loops have no recovery path: when one returns an error it is
/// logged and the whole process exits, per the failure policy.
pub fn spawn_fatal<E, F>(name: &str, f: F) -> Result<thread::JoinHandle<()>, CliError>
where
    E: std::fmt::Display,
    F: FnOnce() -> Result<(), E> + Send + 'static,
{
    let thread_name = name.to_string();
    thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            if let Err(e) = f() {
                error!(thread = %thread_name, error = %e, "loop failed");
                process::exit(1);
            }
        })
        .map_err(CliError::Runtime)
}
