//! Face filter binary.

use std::process::ExitCode;

use tracing::{error, info};

use facefilter_worker::logging::init_tracing;
use facefilter_worker::{FilterConfig, StopReason};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = match FilterConfig::from_args() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };
    info!(
        mode = config.mode.name(),
        geometry = %config.geometry,
        cascade = %config.cascade_path.display(),
        min_score = config.min_score,
        "Starting facefilter"
    );

    match facefilter_worker::run(config).await {
        Ok(summary) => {
            match summary.stop {
                StopReason::EndOfStream => info!("Stream ended, shutdown complete"),
                StopReason::Cancelled => info!("Cancelled, shutdown complete"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
