//! Frame input sources.

use facefilter_media::{CancelToken, ChildExit, MediaResult, PipelineCommand, PipelineProcess};
use tokio::io::AsyncRead;
use tracing::warn;

/// Boxed byte stream the loop reads frames from.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Where frames come from.
pub enum InputSource {
    /// Stdout of a pipeline process started for this run.
    Spawn(PipelineCommand),
    /// The process's own standard input.
    Stdin,
    /// Any other stream, e.g. a file or an in-memory buffer.
    Stream(ByteStream),
}

impl InputSource {
    /// Open the stream, spawning the pipeline if needed.
    pub fn open(self, cancel: &CancelToken) -> MediaResult<OpenInput> {
        match self {
            InputSource::Spawn(command) => {
                let (process, stdout) = PipelineProcess::start(&command, cancel.clone())?;
                Ok(OpenInput {
                    stream: Box::new(stdout),
                    process: Some(process),
                })
            }
            InputSource::Stdin => Ok(OpenInput {
                stream: Box::new(tokio::io::stdin()),
                process: None,
            }),
            InputSource::Stream(stream) => Ok(OpenInput {
                stream,
                process: None,
            }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            InputSource::Spawn(command) => format!("pipeline `{}`", command),
            InputSource::Stdin => "stdin".to_string(),
            InputSource::Stream(_) => "stream".to_string(),
        }
    }
}

/// An opened input: the byte stream plus the process feeding it, if any.
pub struct OpenInput {
    stream: ByteStream,
    process: Option<PipelineProcess>,
}

impl OpenInput {
    /// Split into the stream and a guard that tears the process down.
    pub fn into_parts(self) -> (ByteStream, InputGuard) {
        (
            self.stream,
            InputGuard {
                process: self.process,
            },
        )
    }
}

/// Keeps the owned process alive while frames are read. Dropping it kills
/// the process; [`InputGuard::release`] additionally waits for it.
pub struct InputGuard {
    process: Option<PipelineProcess>,
}

impl InputGuard {
    /// Close the stream first, then terminate and reap the process.
    pub async fn release(self, stream: ByteStream) -> Option<ChildExit> {
        drop(stream);
        let process = self.process?;
        match process.shutdown().await {
            Ok(exit) => Some(exit),
            Err(e) => {
                warn!("Failed to shut down pipeline cleanly: {}", e);
                None
            }
        }
    }
}
