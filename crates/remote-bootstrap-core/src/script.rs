//! Loading the local bootstrap script.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable overriding the bootstrap script path.
pub const SCRIPT_ENV: &str = "REMOTE_BOOTSTRAP_SCRIPT";

/// File the runner looks for next to its own executable.
pub const DEFAULT_SCRIPT_NAME: &str = "setup-on-server.sh";

/// Script loading error.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Bootstrap script not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot locate the running executable: {0}")]
    ExeLocation(std::io::Error),
}

/// The bootstrap script, read once and treated as opaque text.
#[derive(Debug, Clone)]
pub struct BootstrapScript {
    path: PathBuf,
    body: String,
}

impl BootstrapScript {
    /// Resolve the script path from the process environment: an explicit
    /// `REMOTE_BOOTSTRAP_SCRIPT` wins, otherwise the default file next to
    /// the running executable.
    ///
    /// # Errors
    /// Returns error if the executable location cannot be determined.
    pub fn resolve_path_from_env() -> Result<PathBuf, ScriptError> {
        Self::resolve_path(std::env::var(SCRIPT_ENV).ok())
    }

    /// Resolve the script path from an optional override.
    ///
    /// # Errors
    /// Returns error if the executable location cannot be determined.
    pub fn resolve_path(override_path: Option<String>) -> Result<PathBuf, ScriptError> {
        if let Some(path) = override_path {
            return Ok(PathBuf::from(path));
        }
        let exe = std::env::current_exe().map_err(ScriptError::ExeLocation)?;
        Ok(exe
            .parent()
            .map_or_else(|| PathBuf::from(DEFAULT_SCRIPT_NAME), |dir| dir.join(DEFAULT_SCRIPT_NAME)))
    }

    /// Read the script from disk.
    ///
    /// # Errors
    /// Returns `NotFound` for a missing file, `Read` for any other I/O error.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let body = tokio::fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ScriptError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ScriptError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        tracing::debug!(path = %path.display(), bytes = body.len(), "Loaded bootstrap script");
        Ok(Self {
            path: path.to_path_buf(),
            body,
        })
    }

    /// Where the script was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw script text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}
