//! Command handlers for the circleci-weigh-in CLI
//!
//! Each submodule handles a specific CLI command. The weigh-in itself lives
//! in [`workflow`]; [`run`] wires it to flags, environment and config.

pub mod compare;
pub mod completions;
pub mod run;
pub mod workflow;

pub use compare::cmd_compare;
pub use completions::cmd_completions;
pub use run::{cmd_run, RunArgs};
pub use workflow::{RunOutcome, WeighInSettings, WeighInWorkflow};
