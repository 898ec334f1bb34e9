//! Running a transcript under the automation utility.

use std::{
    io::Write as _,
    path::PathBuf,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use async_trait::async_trait;
use command_group::AsyncCommandGroup;
use remote_bootstrap_core::Transcript;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::{io::AsyncReadExt, process::Command};

use crate::locate::{UTILITY_NAME, locate_utility};

/// Hard ceiling on one automation run.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(600);

/// Driver error.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Automation utility not found: {0}")]
    UtilityNotFound(String),
    #[error("Failed to spawn {}: {source}", utility.display())]
    Spawn {
        utility: PathBuf,
        source: std::io::Error,
    },
    #[error("Automation run did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of one automation run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Text captured from the subprocess stdout.
    pub stdout: String,
    /// Text captured from the subprocess stderr.
    pub stderr: String,
    /// Exit status of the subprocess.
    pub status: ExitStatus,
}

impl RunOutcome {
    /// Exit code to mirror to the operator. A signal-killed subprocess has
    /// no code and maps to 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(1)
    }

    /// Whether the subprocess exited zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Trait for transcript runners.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Run one transcript to completion and capture its output.
    ///
    /// # Errors
    /// Returns error if the subprocess cannot be spawned, errors out at the
    /// I/O level, or exceeds the run timeout. A subprocess that merely exits
    /// non-zero is a successful run with a non-zero `RunOutcome`.
    async fn run(&self, transcript: &Transcript) -> Result<RunOutcome, DriverError>;
}

/// Driver spawning the external `expect` binary.
#[derive(Debug, Clone)]
pub struct ExpectDriver {
    utility: PathBuf,
    timeout: Duration,
}

impl ExpectDriver {
    /// Create a driver for an already-located utility.
    #[must_use]
    pub fn new(utility: PathBuf) -> Self {
        Self {
            utility,
            timeout: RUN_TIMEOUT,
        }
    }

    /// Locate `expect` on PATH and build a driver for it.
    ///
    /// # Errors
    /// Returns `UtilityNotFound` if the utility is not installed.
    pub async fn discover() -> Result<Self, DriverError> {
        let utility = locate_utility(UTILITY_NAME)
            .await
            .ok_or_else(|| DriverError::UtilityNotFound(UTILITY_NAME.to_string()))?;
        Ok(Self::new(utility))
    }

    /// Override the run timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the utility this driver spawns.
    #[must_use]
    pub fn utility(&self) -> &std::path::Path {
        &self.utility
    }
}

#[async_trait]
impl AutomationDriver for ExpectDriver {
    async fn run(&self, transcript: &Transcript) -> Result<RunOutcome, DriverError> {
        let script_file = write_transcript(transcript)?;

        tracing::debug!(utility = %self.utility.display(), "Spawning automation utility");
        let mut child = Command::new(&self.utility)
            .arg(script_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .group_spawn()
            .map_err(|source| DriverError::Spawn {
                utility: self.utility.clone(),
                source,
            })?;

        let stdout_task = drain(child.inner().stdout.take());
        let stderr_task = drain(child.inner().stderr.take());

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                // expect and the ssh client under it die together.
                if let Err(err) = child.kill().await {
                    tracing::warn!(?err, "Failed to kill timed-out automation process group");
                }
                return Err(DriverError::TimedOut(self.timeout));
            }
        };

        let stdout = stdout_task.await.map_err(std::io::Error::other)?;
        let stderr = stderr_task.await.map_err(std::io::Error::other)?;
        tracing::info!(code = ?status.code(), "Automation utility finished");

        Ok(RunOutcome {
            stdout,
            stderr,
            status,
        })
    }
}

/// Write the transcript to a private (0600) temp file. It is handed to the
/// utility as a path, never as a command-line argument, so the password it
/// contains stays out of the process table.
fn write_transcript(transcript: &Transcript) -> Result<NamedTempFile, DriverError> {
    let mut file = tempfile::Builder::new()
        .prefix("remote-bootstrap-")
        .suffix(".exp")
        .tempfile()?;
    file.write_all(transcript.as_str().as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn drain<R>(pipe: Option<R>) -> tokio::task::JoinHandle<String>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(err) = pipe.read_to_end(&mut buf).await {
                tracing::debug!(?err, "Error draining subprocess pipe");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use remote_bootstrap_core::Endpoint;

    use super::*;

    fn sample_transcript() -> Transcript {
        let endpoint = Endpoint::new("203.0.113.7", "root", "hunter2");
        Transcript::build(&endpoint, "echo hello\n")
    }

    fn fake_utility(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-expect");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let driver = ExpectDriver::new(fake_utility(dir.path(), "printf 'ok'"));
        let outcome = driver.run(&sample_transcript()).await.unwrap();
        assert_eq!(outcome.stdout, "ok");
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_mirrors_nonzero_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let driver = ExpectDriver::new(fake_utility(dir.path(), "exit 7"));
        let outcome = driver.run(&sample_transcript()).await.unwrap();
        assert_eq!(outcome.exit_code(), 7);
        assert!(!outcome.success());
    }

    #[tokio::test]
    async fn test_captures_stderr_separately() {
        let dir = tempfile::tempdir().unwrap();
        let driver = ExpectDriver::new(fake_utility(dir.path(), "printf 'bad' >&2; exit 1"));
        let outcome = driver.run(&sample_transcript()).await.unwrap();
        assert_eq!(outcome.stdout, "");
        assert_eq!(outcome.stderr, "bad");
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_hands_the_transcript_to_the_utility() {
        let dir = tempfile::tempdir().unwrap();
        let driver = ExpectDriver::new(fake_utility(dir.path(), "cat \"$1\""));
        let outcome = driver.run(&sample_transcript()).await.unwrap();
        assert!(outcome.stdout.contains("send \"echo hello"));
        assert!(outcome.stdout.contains("hunter2"));
        assert!(outcome.stdout.contains("spawn ssh -o StrictHostKeyChecking=no root@203.0.113.7"));
    }

    #[tokio::test]
    async fn test_kills_the_run_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let driver = ExpectDriver::new(fake_utility(dir.path(), "sleep 5"))
            .with_timeout(Duration::from_millis(200));
        let err = driver.run(&sample_transcript()).await.unwrap_err();
        assert!(matches!(err, DriverError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let err = ExpectDriver::new(PathBuf::from("/definitely/missing/expect"))
            .run(&sample_transcript())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Spawn { .. }));
    }
}
