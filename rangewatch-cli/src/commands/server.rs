//! Server node: fuse the reading streams and emit audio alerts.
//!
//! Five loops:
//! - two reading receivers (remote distance on 8080, angle on 8888) as
//!   tokio tasks
//! - the local ranger thread, which classifies proximity per sample
//! - the heat watcher thread
//! - the button watcher thread
//!
//! Setup failures (GPIO, bind) abort before any loop starts. After that,
//! a GPIO failure or a failed accept kills the process; a dead reading
//! stream kills only its own channel.

use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Args;
use tracing::{error, info, trace, warn};

use rangewatch::alert::{
    classify_proximity, Announcer, AnnouncerConfig, CommandAnnouncer, HeatWatcher,
};
use rangewatch::button::{ButtonConfig, ButtonWatcher};
use rangewatch::gpio::SysfsGpio;
use rangewatch::link::{ReadingChannel, ReadingReceiver, ReceiverConfig};
use rangewatch::observation::ObservationState;
use rangewatch::ranging::{RangerConfig, UltrasonicRanger};

use super::spawn_fatal;
use crate::error::CliError;

/// Arguments for the server command.
#[derive(Args)]
pub struct ServerArgs {
    /// Pin driving the local sensor's trigger input
    #[arg(long, default_value_t = 23)]
    trigger_pin: u32,

    /// Pin sampling the local sensor's echo output
    #[arg(long, default_value_t = 24)]
    echo_pin: u32,

    /// Pin driven high as the button's pull reference
    #[arg(long, default_value_t = 21)]
    button_drive_pin: u32,

    /// Pin sampling the button level
    #[arg(long, default_value_t = 20)]
    button_sense_pin: u32,

    /// Port for the remote distance stream
    #[arg(long, default_value_t = 8080)]
    motion_port: u16,

    /// Port for the angle/temperature stream
    #[arg(long, default_value_t = 8888)]
    angle_port: u16,

    /// Delay between local samples, in milliseconds
    #[arg(long, default_value_t = 500)]
    settle_ms: u64,

    /// Give up on an echo edge after this many milliseconds
    /// (default: wait forever, like the sensor loop always has)
    #[arg(long)]
    echo_timeout_ms: Option<u64>,

    /// Directory holding the alert cue sounds
    #[arg(long, default_value = "sounds")]
    sound_dir: String,
}

/// Run the server node.
pub fn run(args: ServerArgs) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let state = Arc::new(ObservationState::new());
    let backend = Arc::new(SysfsGpio::new());
    let announcer: Arc<dyn Announcer> = Arc::new(CommandAnnouncer::new(
        AnnouncerConfig::default().with_sound_dir(args.sound_dir),
    ));

    // Bind both channels before any loop starts; a taken port is fatal.
    let distance_receiver = runtime.block_on(ReadingReceiver::bind(
        ReceiverConfig::new(ReadingChannel::RemoteDistance).with_port(args.motion_port),
    ))?;
    let angle_receiver = runtime.block_on(ReadingReceiver::bind(
        ReceiverConfig::new(ReadingChannel::Angle).with_port(args.angle_port),
    ))?;
    spawn_receiver(&runtime, distance_receiver, state.clone());
    spawn_receiver(&runtime, angle_receiver, state.clone());

    let mut ranger_config = RangerConfig::default()
        .with_pins(args.trigger_pin, args.echo_pin)
        .with_settle_delay(Duration::from_millis(args.settle_ms));
    if let Some(ms) = args.echo_timeout_ms {
        ranger_config = ranger_config.with_echo_timeout(Duration::from_millis(ms));
    }
    let ranger = UltrasonicRanger::open(backend.clone(), ranger_config)?;
    let button = ButtonWatcher::open(
        backend,
        ButtonConfig::default().with_pins(args.button_drive_pin, args.button_sense_pin),
    )?;

    {
        let state = state.clone();
        let announcer = announcer.clone();
        spawn_fatal("ranger", move || {
            sample_and_classify_forever(ranger, state, announcer)
        })?;
    }
    {
        let state = state.clone();
        let announcer = announcer.clone();
        spawn_fatal("button", move || button.run(state, announcer))?;
    }

    let watcher = HeatWatcher::new(state, announcer);
    let heat_thread = thread::Builder::new()
        .name("heat-watcher".into())
        .spawn(move || watcher.run())
        .map_err(CliError::Runtime)?;

    info!("server node running");
    let _ = heat_thread.join();
    Ok(())
}

/// Run a receiver as a task; an accept failure is fatal to the process,
/// a finished loop is not.
fn spawn_receiver(
    runtime: &tokio::runtime::Runtime,
    receiver: ReadingReceiver,
    state: Arc<ObservationState>,
) {
    runtime.spawn(async move {
        match receiver.run(state).await {
            Ok(()) => warn!("reading channel ended"),
            Err(e) => {
                error!(error = %e, "receiver failed to start");
                process::exit(1);
            }
        }
    });
}

/// The local ranger loop: sample, publish, classify proximity, settle.
fn sample_and_classify_forever(
    mut ranger: UltrasonicRanger<SysfsGpio>,
    state: Arc<ObservationState>,
    announcer: Arc<dyn Announcer>,
) -> Result<(), rangewatch::gpio::GpioError> {
    let settle = ranger.settle_delay();
    loop {
        let sample = ranger.sample()?;
        state.record_local_distance(sample);
        trace!(distance = %sample, "local distance sampled");

        // Level-triggered: a persistently close obstacle cues every sample.
        let class = classify_proximity(sample);
        if let Some(announcement) = class.announcement() {
            warn!(distance = %sample, class = ?class, "proximity alert");
            if let Err(e) = announcer.announce(announcement) {
                warn!(error = %e, "announcement failed");
            }
        }

        thread::sleep(settle);
    }
}
