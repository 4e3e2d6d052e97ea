//! Temperature reporter: thermal probe streamed to the server.
//!
//! Samples the thermal zone once a second and pushes each whole-degree
//! reading to the server's angle/temperature channel. Probe and send
//! failures are both fatal; the reporter has nothing sensible to do
//! without either side.

use std::time::Duration;

use clap::Args;
use tracing::info;

use rangewatch::link::{ReadingSender, SenderConfig};
use rangewatch::thermal::ThermalProbe;

use crate::error::CliError;

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// Server endpoint for the temperature stream
    #[arg(long, default_value = "192.168.0.38:8888")]
    peer: String,

    /// Thermal zone directory to sample
    #[arg(long, default_value = ThermalProbe::DEFAULT_ZONE)]
    zone: String,

    /// Interval between readings, in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

/// Run the reporter.
pub fn run(args: ReportArgs) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let probe = ThermalProbe::with_zone(&args.zone);
    let config = SenderConfig::default()
        .with_peer(args.peer)
        .with_interval(Duration::from_millis(args.interval_ms));

    runtime.block_on(async move {
        let mut sender = ReadingSender::connect(&config).await?;
        loop {
            let celsius = probe.read_celsius()?;
            info!(celsius, "temperature sampled");
            sender.send(i64::from(celsius)).await?;
            tokio::time::sleep(config.interval).await;
        }
    })
}
