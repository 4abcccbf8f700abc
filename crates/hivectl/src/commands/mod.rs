//! Command dispatch: bridges CLI args -> device views -> output formatting.

pub mod devices;
pub mod set;
pub mod thermostats;
pub mod watch;

use hive_core::{Home, HomeConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    home: &Home,
    config: &HomeConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Thermostats => thermostats::handle(home, global).await,
        Command::Devices => devices::handle(home, global).await,
        Command::Set(args) => set::handle(home, args, global).await,
        Command::Watch(args) => watch::handle(home, config, args, global).await,
        Command::Completions(_) => Ok(()),
    }
}
