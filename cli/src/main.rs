//! One-shot remote bootstrap runner.
//!
//! Reads the local bootstrap script, drives a password-authenticated SSH
//! session to the target endpoint through `expect`, and mirrors the captured
//! session output and exit code to the invoking operator. Takes no
//! command-line arguments; the endpoint and script path come from built-in
//! defaults overridable via the `REMOTE_BOOTSTRAP_*` environment variables.

use std::process::ExitCode;

use remote_bootstrap_core::{BootstrapScript, Endpoint, Transcript};
use remote_bootstrap_exec::{AutomationDriver, DriverError, ExpectDriver, manual_instructions};
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout is reserved for the session output.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("bootstrap_run", %run_id);
    match run().instrument(span).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<u8> {
    let endpoint = Endpoint::from_env();
    let script_path = BootstrapScript::resolve_path_from_env()?;

    // A missing script aborts here, before any utility lookup or spawn.
    let script = BootstrapScript::load(&script_path).await?;
    let transcript = Transcript::build(&endpoint, script.body());

    let driver = match ExpectDriver::discover().await {
        Ok(driver) => driver,
        Err(DriverError::UtilityNotFound(name)) => {
            tracing::warn!(utility = %name, "Automation utility is not installed");
            eprint!("{}", manual_instructions(&endpoint, script.path()));
            return Ok(1);
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        host = %endpoint.host,
        utility = %driver.utility().display(),
        script = %script.path().display(),
        "Starting bootstrap session"
    );
    let outcome = driver.run(&transcript).await?;

    print!("{}", outcome.stdout);
    if !outcome.stderr.is_empty() {
        eprint!("STDERR: {}", outcome.stderr);
    }

    Ok(u8::try_from(outcome.exit_code()).unwrap_or(1))
}
