//! Motion node: ultrasonic ranger loop plus the distance sender.
//!
//! Two loops: a thread sampling the ranger into the observation state,
//! and a tokio task streaming the latest sample to the server every
//! 100 ms. A GPIO failure or a failed connect is fatal; a mid-stream
//! send failure ends only the sender.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Args;
use tracing::{error, trace};

use rangewatch::gpio::SysfsGpio;
use rangewatch::link::{LocalDistanceSource, ReadingSender, SenderConfig};
use rangewatch::observation::ObservationState;
use rangewatch::ranging::{RangerConfig, UltrasonicRanger};

use super::spawn_fatal;
use crate::error::CliError;

/// Arguments for the motion command.
#[derive(Args)]
pub struct MotionArgs {
    /// Pin driving the sensor's trigger input
    #[arg(long, default_value_t = 23)]
    trigger_pin: u32,

    /// Pin sampling the sensor's echo output
    #[arg(long, default_value_t = 24)]
    echo_pin: u32,

    /// Delay between samples, in milliseconds
    #[arg(long, default_value_t = 60)]
    settle_ms: u64,

    /// Give up on an echo edge after this many milliseconds
    /// (default: wait forever, like the sensor loop always has)
    #[arg(long)]
    echo_timeout_ms: Option<u64>,

    /// Server endpoint for the distance stream
    #[arg(long, default_value = "192.168.0.38:8080")]
    peer: String,

    /// Interval between distance sends, in milliseconds
    #[arg(long, default_value_t = 100)]
    send_interval_ms: u64,
}

/// Run the motion node.
pub fn run(args: MotionArgs) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let state = Arc::new(ObservationState::new());
    let backend = Arc::new(SysfsGpio::new());

    let mut ranger_config = RangerConfig::default()
        .with_pins(args.trigger_pin, args.echo_pin)
        .with_settle_delay(Duration::from_millis(args.settle_ms));
    if let Some(ms) = args.echo_timeout_ms {
        ranger_config = ranger_config.with_echo_timeout(Duration::from_millis(ms));
    }
    let ranger = UltrasonicRanger::open(backend, ranger_config)?;

    // Connect before any loop starts; a refused connection is fatal.
    let sender_config = SenderConfig::default()
        .with_peer(args.peer)
        .with_interval(Duration::from_millis(args.send_interval_ms));
    let sender = runtime.block_on(ReadingSender::connect(&sender_config))?;

    let source = Arc::new(LocalDistanceSource::new(state.clone()));
    runtime.spawn(async move {
        if let Err(e) = sender.stream_from(source).await {
            error!(error = %e, "distance sender stopped");
        }
    });

    let ranger_thread = spawn_fatal("ranger", move || sample_forever(ranger, state))?;
    let _ = ranger_thread.join();
    Ok(())
}

/// The ranger polling loop: sample, publish, settle, repeat.
fn sample_forever(
    mut ranger: UltrasonicRanger<SysfsGpio>,
    state: Arc<ObservationState>,
) -> Result<(), rangewatch::gpio::GpioError> {
    let settle = ranger.settle_delay();
    loop {
        let sample = ranger.sample()?;
        state.record_local_distance(sample);
        trace!(distance = %sample, "distance sampled");
        thread::sleep(settle);
    }
}
