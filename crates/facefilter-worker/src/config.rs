//! Command line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use facefilter_media::command::{DEFAULT_LAUNCHER, DEFAULT_LAUNCHER_ARG};
use facefilter_media::PipelineCommand;
use facefilter_models::Geometry;

use crate::error::{WorkerError, WorkerResult};

/// Raw command line, also readable from `FACEFILTER_*` environment variables.
#[derive(Debug, Parser)]
#[command(
    name = "facefilter",
    version,
    about = "Real-time face detection filter for raw GRAY8 frame streams",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub mode: ModeCommand,
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Frame width (pixels)
    #[arg(long, global = true, env = "FACEFILTER_WIDTH", default_value_t = 640)]
    pub width: u32,

    /// Frame height (pixels)
    #[arg(long, global = true, env = "FACEFILTER_HEIGHT", default_value_t = 480)]
    pub height: u32,

    /// Path to the cascade file
    #[arg(
        long,
        global = true,
        env = "FACEFILTER_CASCADE",
        default_value = "cascade/facefinder"
    )]
    pub cascade: PathBuf,

    /// Minimum detection score to report
    #[arg(
        long,
        global = true,
        env = "FACEFILTER_MIN_SCORE",
        default_value_t = 5.0,
        allow_negative_numbers = true
    )]
    pub min_score: f64,

    /// Serve Prometheus metrics on this address
    #[arg(long, global = true, env = "FACEFILTER_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Debug, Subcommand)]
pub enum ModeCommand {
    /// Spawn the media pipeline, read frames from it and log detections.
    Spawn {
        /// Pipeline description ending in GRAY8 raw video written to stdout
        #[arg(long, env = "FACEFILTER_PIPELINE")]
        pipeline: Option<String>,

        /// Program that runs the pipeline
        #[arg(long, env = "FACEFILTER_LAUNCHER", default_value = DEFAULT_LAUNCHER)]
        launcher: String,

        /// Argument placed before the pipeline (repeatable)
        #[arg(
            long = "launcher-arg",
            value_name = "ARG",
            allow_hyphen_values = true,
            default_values = [DEFAULT_LAUNCHER_ARG]
        )]
        launcher_args: Vec<String>,
    },
    /// Read frames from stdin, outline detections and write frames to stdout.
    Filter,
}

/// Operating mode of the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Frames come from a spawned pipeline; detections are only logged.
    SpawnAndObserve { command: PipelineCommand },
    /// Frames flow stdin to stdout; detections are logged and outlined.
    InlineFilter,
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::SpawnAndObserve { .. } => "spawn",
            RunMode::InlineFilter => "filter",
        }
    }
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub geometry: Geometry,
    pub cascade_path: PathBuf,
    pub min_score: f32,
    pub metrics_addr: Option<SocketAddr>,
    pub mode: RunMode,
}

impl FilterConfig {
    /// Validate the parsed command line. Nothing is opened or spawned here.
    pub fn from_cli(cli: Cli) -> WorkerResult<Self> {
        let CommonArgs {
            width,
            height,
            cascade,
            min_score,
            metrics_addr,
        } = cli.common;

        let geometry = Geometry::new(width, height)
            .map_err(|e| WorkerError::config_error(e.to_string()))?;

        if !min_score.is_finite() {
            return Err(WorkerError::config_error(format!(
                "min-score must be a finite number, got {}",
                min_score
            )));
        }

        if cascade.as_os_str().is_empty() {
            return Err(WorkerError::config_error("cascade path is empty"));
        }

        let mode = match cli.mode {
            ModeCommand::Spawn {
                pipeline,
                launcher,
                launcher_args,
            } => {
                let pipeline = pipeline.unwrap_or_default();
                if pipeline.trim().is_empty() {
                    return Err(WorkerError::config_error(
                        "You must pass --pipeline with a valid pipeline description",
                    ));
                }
                let command = PipelineCommand::from_pipeline(&launcher, launcher_args, &pipeline)
                    .map_err(|e| WorkerError::config_error(e.to_string()))?;
                RunMode::SpawnAndObserve { command }
            }
            ModeCommand::Filter => RunMode::InlineFilter,
        };

        Ok(Self {
            geometry,
            cascade_path: cascade,
            min_score: min_score as f32,
            metrics_addr,
            mode,
        })
    }

    /// Parse and validate from the process arguments and environment.
    pub fn from_args() -> WorkerResult<Self> {
        Self::from_cli(Cli::parse())
    }
}
