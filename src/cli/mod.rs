//! Command-line interface definitions and handlers.

mod args;
mod commands;

pub use args::{AdminAction, Args, BoothArgs, Command, ConfigAction, RobotAction};
pub use commands::{admin, dispatch, gallery, handle_config_action, robot, run_booth, CliResult};
