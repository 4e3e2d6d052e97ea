//! Reading receiver - the inbound side of a peer link.
//!
//! Binds a fixed port, accepts exactly one peer, and decodes its line
//! stream into the observation state. Two instances run on the server
//! node: one feeding the remote distance (and deriving the motion flag),
//! one feeding the angle. A second client is never accepted; when the
//! peer goes away the channel is dead for the rest of the process.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use super::protocol::parse_reading;
use super::LinkError;
use crate::observation::{DistanceSample, ObservationState};

/// Which observation field a receiver feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingChannel {
    /// Distance stream from the motion node; also derives the motion flag.
    RemoteDistance,
    /// Angle/temperature stream from the reporter.
    Angle,
}

impl ReadingChannel {
    /// The port this channel conventionally listens on.
    pub fn default_port(&self) -> u16 {
        match self {
            ReadingChannel::RemoteDistance => 8080,
            ReadingChannel::Angle => 8888,
        }
    }

    /// Stable label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ReadingChannel::RemoteDistance => "remote-distance",
            ReadingChannel::Angle => "angle",
        }
    }

    /// Apply one decoded reading to the observation state.
    fn apply(&self, value: i64, state: &ObservationState) {
        match self {
            ReadingChannel::RemoteDistance => {
                state.record_remote_distance(DistanceSample::from_cm(value));
            }
            ReadingChannel::Angle => {
                state.record_angle(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32);
            }
        }
    }
}

/// Reading receiver configuration.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Port to listen on.
    pub port: u16,

    /// Field the decoded readings feed.
    pub channel: ReadingChannel,
}

impl ReceiverConfig {
    /// Configuration for a channel on its conventional port.
    pub fn new(channel: ReadingChannel) -> Self {
        Self {
            port: channel.default_port(),
            channel,
        }
    }

    /// Listen on a different port (tests use 0 for an ephemeral one).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// The inbound half of a peer link.
#[derive(Debug)]
pub struct ReadingReceiver {
    listener: TcpListener,
    config: ReceiverConfig,
}

impl ReadingReceiver {
    /// Bind and listen.
    ///
    /// Callers treat a failure here as fatal to the process.
    pub async fn bind(config: ReceiverConfig) -> Result<Self, LinkError> {
        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .map_err(|source| LinkError::Bind {
                port: config.port,
                source,
            })?;
        info!(
            port = config.port,
            channel = config.channel.name(),
            "reading receiver listening"
        );
        Ok(Self { listener, config })
    }

    /// The port actually bound (differs from the configured one when it
    /// was 0).
    pub fn local_port(&self) -> u16 {
        self.listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or(self.config.port)
    }

    /// Accept the one peer and decode its readings forever.
    ///
    /// An accept failure is returned as an error (fatal to the process by
    /// the caller's policy). A read failure or the peer closing ends the
    /// loop with `Ok(())`: fatal to this channel only.
    pub async fn run(self, state: Arc<ObservationState>) -> Result<(), LinkError> {
        let channel = self.config.channel;
        let (stream, peer) =
            self.listener
                .accept()
                .await
                .map_err(|source| LinkError::Accept {
                    port: self.config.port,
                    source,
                })?;
        info!(%peer, channel = channel.name(), "peer connected");

        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_reading(&line) {
                    Some(value) => {
                        channel.apply(value, &state);
                        debug!(value, channel = channel.name(), "reading received");
                    }
                    None => {
                        debug!(raw = %line, channel = channel.name(), "unparseable line skipped");
                    }
                },
                Ok(None) => {
                    warn!(channel = channel.name(), "peer closed the connection");
                    break;
                }
                Err(e) => {
                    error!(channel = channel.name(), error = %e, "read failed");
                    break;
                }
            }
        }
        Ok(())
    }
}
