//! Session transcript generation.
//!
//! The transcript is the expect(1) program driving one password-authenticated
//! SSH session: connect, authenticate, pipe the bootstrap script through a
//! heredoc into a remote `bash`, exit. It is a pure function of the endpoint
//! and the script body, fully constructed before anything is spawned.

use crate::Endpoint;

/// Timeout baked into the transcript for each expect step, in seconds.
const SESSION_TIMEOUT_SECS: u32 = 300;

/// Heredoc delimiter wrapping the script body on the remote side.
const HEREDOC_TAG: &str = "REMOTE_SCRIPT";

/// A generated automation session program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    /// Build the transcript for one bootstrap run.
    #[must_use]
    pub fn build(endpoint: &Endpoint, script_body: &str) -> Self {
        let destination = endpoint.destination();
        let password = tcl_escape(endpoint.password());

        // The closing heredoc tag must land on its own remote line.
        let mut body = script_body.to_string();
        if !body.ends_with('\n') {
            body.push('\n');
        }
        let body = tcl_escape(&body);

        let text = format!(
            "#!/usr/bin/expect -f\n\
             set timeout {SESSION_TIMEOUT_SECS}\n\
             spawn ssh -o StrictHostKeyChecking=no {destination}\n\
             expect \"password:\"\n\
             send \"{password}\\r\"\n\
             expect \"# \"\n\
             send \"bash << '{HEREDOC_TAG}'\\r\"\n\
             send \"{body}\"\n\
             send \"{HEREDOC_TAG}\\r\"\n\
             expect \"# \"\n\
             send \"exit\\r\"\n\
             expect eof\n"
        );
        Self { text }
    }

    /// The transcript text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the transcript, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

/// Escape a value for interpolation into a Tcl double-quoted string, so the
/// remote side receives it byte for byte.
fn tcl_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '"' | '$' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
