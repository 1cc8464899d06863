//! External media pipeline supervision.
//!
//! The launcher runs as a child process whose stdout is the frame stream.
//! A monitor task owns the child and terminates it when cancellation is
//! requested, when [`PipelineProcess::shutdown`] is called, or when the
//! handle is dropped. The child is therefore killed on every exit path.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::command::PipelineCommand;
use crate::error::{MediaError, MediaResult};

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// The child was still running and had to be killed.
    Killed(ExitStatus),
}

impl ChildExit {
    pub fn status(&self) -> ExitStatus {
        match self {
            ChildExit::Exited(status) | ChildExit::Killed(status) => *status,
        }
    }

    pub fn was_killed(&self) -> bool {
        matches!(self, ChildExit::Killed(_))
    }
}

/// Handle to a running pipeline process.
pub struct PipelineProcess {
    program: String,
    pid: Option<u32>,
    kill_tx: Option<oneshot::Sender<()>>,
    monitor: Option<JoinHandle<std::io::Result<ChildExit>>>,
}

impl PipelineProcess {
    /// Spawn `command` and return the handle plus the child's stdout.
    ///
    /// Stdin is closed and stderr is inherited so launcher diagnostics pass
    /// straight through to ours. The child is bound to `cancel`.
    pub fn start(command: &PipelineCommand, cancel: CancelToken) -> MediaResult<(Self, ChildStdout)> {
        let program = command.program().to_string();
        let resolved = which::which(&program).map_err(|_| MediaError::LauncherNotFound(program.clone()))?;

        debug!("Running launcher: {} ({})", command, resolved.display());

        let mut child = Command::new(&resolved)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MediaError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.start_kill();
                return Err(MediaError::StdoutUnavailable(program));
            }
        };

        let pid = child.id();
        info!(pid = ?pid, "Started {} with args: {:?}", program, command.args());

        let (kill_tx, kill_rx) = oneshot::channel();
        let monitor = tokio::spawn(supervise(child, kill_rx, cancel, program.clone()));

        Ok((
            Self {
                program,
                pid,
                kill_tx: Some(kill_tx),
                monitor: Some(monitor),
            },
            stdout,
        ))
    }

    /// Terminate the child if it is still running and reap it.
    pub async fn shutdown(mut self) -> MediaResult<ChildExit> {
        if let Some(kill_tx) = self.kill_tx.take() {
            // The monitor may already be done if the child exited.
            let _ = kill_tx.send(());
        }

        let Some(monitor) = self.monitor.take() else {
            return Err(MediaError::Io(std::io::Error::other("pipeline already shut down")));
        };

        let exit = monitor
            .await
            .map_err(|e| MediaError::Io(std::io::Error::other(e)))??;

        match exit {
            ChildExit::Killed(status) => info!(pid = ?self.pid, "Terminated {} ({})", self.program, status),
            ChildExit::Exited(status) if status.success() => {
                info!(pid = ?self.pid, "{} exited cleanly", self.program)
            }
            ChildExit::Exited(status) => {
                warn!(pid = ?self.pid, "{} exited with {}", self.program, status)
            }
        }

        Ok(exit)
    }
}

impl Drop for PipelineProcess {
    fn drop(&mut self) {
        if let Some(kill_tx) = self.kill_tx.take() {
            let _ = kill_tx.send(());
        }
    }
}

async fn supervise(
    mut child: Child,
    mut kill_rx: oneshot::Receiver<()>,
    cancel: CancelToken,
    program: String,
) -> std::io::Result<ChildExit> {
    tokio::select! {
        status = child.wait() => return status.map(ChildExit::Exited),
        _ = cancel.cancelled() => info!("Cancellation requested, terminating {}", program),
        // Fires on explicit shutdown and when the handle is dropped.
        _ = &mut kill_rx => debug!("Shutdown requested, terminating {}", program),
    }

    if let Some(status) = child.try_wait()? {
        return Ok(ChildExit::Exited(status));
    }
    child.kill().await?;
    child.wait().await.map(ChildExit::Killed)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cancel::CancellationController;
    use crate::codec::{FrameReader, ReadOutcome};
    use facefilter_models::{Frame, Geometry};
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn sh(script: &str) -> PipelineCommand {
        PipelineCommand::new("sh", ["-c", script])
    }

    #[tokio::test]
    async fn test_stdout_carries_frames() {
        let controller = CancellationController::new();
        let cmd = sh("head -c 24 /dev/zero");
        let (process, stdout) = PipelineProcess::start(&cmd, controller.token()).unwrap();

        let geometry = Geometry::new(4, 2).unwrap();
        let mut reader = FrameReader::new(stdout, geometry);
        let mut frame = Frame::new(geometry);
        let mut frames = 0;
        while reader.read_frame(&mut frame).await.unwrap() == ReadOutcome::Frame {
            frames += 1;
        }
        assert_eq!(frames, 3);

        drop(reader);
        // Let the monitor reap the child before asking for termination.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let exit = process.shutdown().await.unwrap();
        assert!(!exit.was_killed());
        assert!(exit.status().success());
    }

    #[tokio::test]
    async fn test_shutdown_kills_running_child() {
        let controller = CancellationController::new();
        let (process, _stdout) = PipelineProcess::start(&sh("exec sleep 30"), controller.token()).unwrap();

        let exit = tokio::time::timeout(Duration::from_secs(5), process.shutdown())
            .await
            .expect("shutdown should not wait for the child")
            .unwrap();
        assert!(exit.was_killed());
        assert!(!exit.status().success());
    }

    #[tokio::test]
    async fn test_cancellation_closes_stream() {
        let controller = CancellationController::new();
        let (process, mut stdout) = PipelineProcess::start(&sh("exec sleep 30"), controller.token()).unwrap();

        controller.cancel();

        let mut buf = Vec::new();
        let read = tokio::time::timeout(Duration::from_secs(5), stdout.read_to_end(&mut buf))
            .await
            .expect("stdout should close once the child is killed")
            .unwrap();
        assert_eq!(read, 0);

        let exit = process.shutdown().await.unwrap();
        assert!(exit.was_killed());
    }

    #[tokio::test]
    async fn test_missing_launcher() {
        let controller = CancellationController::new();
        let cmd = PipelineCommand::new("definitely-not-a-real-launcher-binary", ["x"]);
        let err = PipelineProcess::start(&cmd, controller.token()).err().unwrap();
        assert!(matches!(err, MediaError::LauncherNotFound(_)));
    }
}
