//! RangeWatch - two-node proximity and heat monitoring with audio alerts.
//!
//! A motion node ranges distance with an ultrasonic sensor and streams it
//! to a server node; the server fuses that stream with a remotely
//! reported temperature reading and a physical button, and decides when
//! to emit audio alerts (fire warning, back-up warnings, temperature
//! readouts).
//!
//! # Architecture
//!
//! Every component is an indefinitely running loop. The GPIO loops
//! (ultrasonic ranger, button watcher, heat watcher) run on plain OS
//! threads because they block on sysfs I/O and busy-waits; the peer
//! links run as tokio tasks. Loops communicate only through the
//! [`observation::ObservationState`] - lock-free atomic cells holding the
//! latest value of each reading - or over the links themselves.
//!
//! ```text
//!   motion node                         server node
//!  ┌───────────────┐                  ┌──────────────────────────────┐
//!  │ ranger loop   │                  │ receiver :8080 ──▶ distance,  │
//!  │   │ distance  │    TCP lines     │                    motion     │
//!  │   ▼           │  ─────────────▶  │ receiver :8888 ──▶ angle      │
//!  │ sender loop   │                  │ ranger loop ──▶ proximity cues│
//!  └───────────────┘                  │ heat watcher ──▶ fire/change  │
//!        reporter ── TCP lines ─────▶ │ button loop ──▶ readout       │
//!                                     └──────────────────────────────┘
//! ```
//!
//! # Failure model
//!
//! GPIO and network-setup failures are fatal to the process; a mid-stream
//! link failure kills only the owning loop. Nothing retries, nothing
//! reconnects, and there is no shutdown path: loops run until the
//! process dies.

pub mod alert;
pub mod button;
pub mod gpio;
pub mod link;
pub mod logging;
pub mod observation;
pub mod ranging;
pub mod thermal;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
