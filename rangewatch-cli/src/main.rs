//! RangeWatch CLI - node runners.
//!
//! One binary, one subcommand per node role: `motion` for the sensing
//! node, `server` for the fusion/alert node, `report` for the
//! temperature reporter.

use clap::{Parser, Subcommand};
use tracing::info;

use rangewatch::logging;

mod commands;
mod error;

use commands::motion::MotionArgs;
use commands::report::ReportArgs;
use commands::server::ServerArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "rangewatch")]
#[command(about = "Two-node proximity and heat monitoring with audio alerts", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory for log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the motion node: range distance and stream it to the server
    Motion(MotionArgs),
    /// Run the server node: fuse readings and emit audio alerts
    Server(ServerArgs),
    /// Stream thermal-probe readings to the server's temperature channel
    Report(ReportArgs),
}

fn main() {
    let cli = Cli::parse();

    let _logging_guard = match logging::init_logging(&cli.log_dir, logging::default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    info!("rangewatch v{}", rangewatch::VERSION);

    let result = match cli.command {
        Command::Motion(args) => commands::motion::run(args),
        Command::Server(args) => commands::server::run(args),
        Command::Report(args) => commands::report::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
