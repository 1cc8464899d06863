//! Inline face detection filter for raw GRAY8 frame streams.
//!
//! This crate handles:
//! - Configuration from flags, environment and `.env`
//! - Classifier loading and cancellation through [`RunState`]
//! - The shared frame loop for spawn-and-observe and inline-filter modes
//! - Throughput reporting, logging and metrics

pub mod action;
pub mod config;
pub mod error;
pub mod filter_loop;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod run_state;
pub mod throughput;

use std::sync::Arc;

use tracing::info;

pub use action::{ForwardAction, FrameAction, ObserveAction};
pub use config::{Cli, FilterConfig, RunMode};
pub use error::{WorkerError, WorkerResult};
pub use filter_loop::{FilterLoop, LoopState, RunSummary, StopReason};
pub use input::InputSource;
pub use run_state::RunState;
pub use throughput::{ThroughputMonitor, ThroughputReport, REPORT_EVERY};

/// Run the configured mode to completion with signal-driven cancellation.
pub async fn run(config: FilterConfig) -> WorkerResult<RunSummary> {
    if let Some(addr) = config.metrics_addr {
        metrics::init_metrics(addr)?;
        info!(%addr, "Serving metrics");
    }

    let run_state = Arc::new(RunState::new());
    let listener = run_state.cancellation().spawn_signal_listener();

    let result = match &config.mode {
        RunMode::SpawnAndObserve { command } => {
            let mut filter = FilterLoop::from_config(&config, Arc::clone(&run_state), ObserveAction);
            filter.run(InputSource::Spawn(command.clone())).await
        }
        RunMode::InlineFilter => {
            let action = ForwardAction::new(tokio::io::stdout());
            let mut filter = FilterLoop::from_config(&config, Arc::clone(&run_state), action);
            filter.run(InputSource::Stdin).await
        }
    };

    listener.abort();
    result
}
