//! Locating the password-automation utility.

use std::{
    collections::HashSet,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use tokio::process::Command;

/// The automation utility the runner drives.
pub const UTILITY_NAME: &str = "expect";

const LOGIN_PATH_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve the utility by name.
///
/// The search order is:
/// 1. Explicit absolute paths.
/// 2. The current process PATH via `which`.
/// 3. One retry against the login shell's PATH, which can be wider than ours.
pub async fn locate_utility(name: &str) -> Option<PathBuf> {
    if name.trim().is_empty() {
        return None;
    }

    let path = Path::new(name);
    if path.is_absolute() && path.is_file() {
        return Some(path.to_path_buf());
    }

    if let Some(found) = which_async(name.to_string(), None).await {
        return Some(found);
    }

    if let Some(login_path) = login_shell_path().await {
        return which_async(name.to_string(), Some(login_path)).await;
    }

    None
}

async fn which_async(name: String, search_path: Option<OsString>) -> Option<PathBuf> {
    tokio::task::spawn_blocking(move || -> Option<PathBuf> {
        match search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(&name, Some(paths), cwd).ok()
            }
            None => which::which(&name).ok(),
        }
    })
    .await
    .ok()
    .flatten()
}

/// The process PATH merged with whatever the operator's login shell exports.
async fn login_shell_path() -> Option<OsString> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    let mut cmd = Command::new(&shell);
    cmd.arg("-l")
        .arg("-c")
        .arg("printf '%s' \"$PATH\"")
        .env("TERM", "dumb")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let child = cmd.spawn().ok()?;
    let output = match tokio::time::timeout(LOGIN_PATH_TIMEOUT, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            tracing::debug!(%shell, ?err, "Failed to read PATH from login shell");
            return None;
        }
        Err(_) => {
            tracing::warn!(%shell, "Timed out reading PATH from login shell");
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }
    let login_path = String::from_utf8(output.stdout).ok()?;
    let login_path = login_path.trim();
    if login_path.is_empty() {
        return None;
    }

    let current = std::env::var_os("PATH").unwrap_or_default();
    Some(merge_paths(&current, OsStr::new(login_path)))
}

/// Merge two PATH strings into a single, de-duplicated PATH.
fn merge_paths(primary: &OsStr, secondary: &OsStr) -> OsString {
    let mut seen = HashSet::<PathBuf>::new();
    let mut merged = Vec::<PathBuf>::new();

    for p in std::env::split_paths(primary).chain(std::env::split_paths(secondary)) {
        if !p.as_os_str().is_empty() && seen.insert(p.clone()) {
            merged.push(p);
        }
    }

    std::env::join_paths(merged).unwrap_or_default()
}
