//! Reading sender - the outbound side of a peer link.
//!
//! Connects to the remote node once at startup and then pushes the
//! current value of a [`ReadingSource`] on a fixed cadence. There is no
//! acknowledgement and no backpressure: the peer consumes whatever
//! arrives, and a send failure ends the stream for good.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::protocol::encode_reading;
use super::LinkError;
use crate::observation::ObservationState;

/// Source of the value a sender streams.
///
/// Implementations return the freshest value available; the sender never
/// waits for a new one.
pub trait ReadingSource: Send + Sync {
    fn current(&self) -> i64;
}

/// Streams the local ultrasonic distance out of the observation state.
pub struct LocalDistanceSource {
    state: Arc<ObservationState>,
}

impl LocalDistanceSource {
    pub fn new(state: Arc<ObservationState>) -> Self {
        Self { state }
    }
}

impl ReadingSource for LocalDistanceSource {
    fn current(&self) -> i64 {
        i64::from(self.state.distance_local().cm())
    }
}

/// Reading sender configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Remote endpoint, `host:port`.
    pub peer: String,

    /// Interval between sends.
    pub interval: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            peer: "192.168.0.38:8080".into(),
            interval: Duration::from_millis(100),
        }
    }
}

impl SenderConfig {
    /// Stream to a different peer.
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    /// Change the send cadence.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// The outbound half of a peer link.
#[derive(Debug)]
pub struct ReadingSender {
    stream: TcpStream,
    config: SenderConfig,
}

impl ReadingSender {
    /// Establish the connection.
    ///
    /// Callers treat a failure here as fatal: without the link the node
    /// has no reason to run.
    pub async fn connect(config: &SenderConfig) -> Result<Self, LinkError> {
        let stream = TcpStream::connect(&config.peer)
            .await
            .map_err(|source| LinkError::Connect {
                peer: config.peer.clone(),
                source,
            })?;
        info!(peer = %config.peer, "reading sender connected");
        Ok(Self {
            stream,
            config: config.clone(),
        })
    }

    /// Push one framed reading.
    pub async fn send(&mut self, value: i64) -> Result<(), LinkError> {
        self.stream
            .write_all(encode_reading(value).as_bytes())
            .await
            .map_err(|source| LinkError::Send {
                peer: self.config.peer.clone(),
                source,
            })
    }

    /// Stream the source's current value forever.
    ///
    /// Returns only on a send failure, which is fatal to this stream (the
    /// caller decides whether the process survives).
    pub async fn stream_from(mut self, source: Arc<dyn ReadingSource>) -> Result<(), LinkError> {
        info!(
            peer = %self.config.peer,
            interval_ms = self.config.interval.as_millis() as u64,
            "reading stream started"
        );
        loop {
            let value = source.current();
            self.send(value).await?;
            debug!(value, peer = %self.config.peer, "reading sent");
            tokio::time::sleep(self.config.interval).await;
        }
    }
}
