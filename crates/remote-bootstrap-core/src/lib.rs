//! Data model for the remote bootstrap runner.
//!
//! This crate provides the fundamental building blocks:
//! - `Endpoint` - the target host/user/password triple
//! - `BootstrapScript` - the local provisioning script
//! - `Transcript` - the generated automation session program
//!
//! Everything here is side-effect free apart from reading the script file;
//! subprocess and network concerns live in `remote-bootstrap-exec`.

pub mod endpoint;
pub mod script;
pub mod transcript;

pub use endpoint::Endpoint;
pub use script::{BootstrapScript, ScriptError};
pub use transcript::Transcript;
