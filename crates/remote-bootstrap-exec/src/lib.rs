//! Automation-utility execution for the remote bootstrap runner.
//!
//! Provides:
//! - `locate_utility` - find the password-automation utility on PATH
//! - `AutomationDriver` / `ExpectDriver` - run a transcript under the utility
//! - `manual_instructions` - the operator recipe when the utility is absent

pub mod driver;
pub mod fallback;
pub mod locate;

pub use driver::{AutomationDriver, DriverError, ExpectDriver, RunOutcome};
pub use fallback::manual_instructions;
pub use locate::{UTILITY_NAME, locate_utility};
