use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linebot_runtime::runtime::{self, RuntimeOptions};

/// Run a line-follower mission against the simulated plant
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mission plan (JSON). Runs the built-in mission if not given
    #[arg(short, long)]
    mission: Option<PathBuf>,

    /// Fail when a line sensor shows no range during calibration
    #[arg(long)]
    strict_calibration: bool,

    /// Give up on any single wait after this many milliseconds (0 = wait forever)
    #[arg(long, default_value = "0")]
    wait_timeout_ms: u64,

    /// Wall-clock budget for the whole mission
    #[arg(long, default_value = "60")]
    time_limit_secs: u64,

    /// Place a cube beside the starting line at this x position (repeatable)
    #[arg(long = "cube-at")]
    cubes: Vec<f32>,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=debug for state transitions and brake detail)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let options = RuntimeOptions {
        mission: args.mission,
        strict_calibration: args.strict_calibration,
        wait_timeout: (args.wait_timeout_ms > 0).then(|| Duration::from_millis(args.wait_timeout_ms)),
        time_limit: Duration::from_secs(args.time_limit_secs),
        cubes: args.cubes,
    };

    match runtime::run(options).await {
        Ok(report) => info!(
            "Finished {} steps: {} crosses, {} cubes",
            report.steps, report.crosses, report.cubes
        ),
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            std::process::exit(1);
        }
    }
}
