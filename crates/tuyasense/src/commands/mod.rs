//! Command handlers for everything that talks to the cloud.

pub mod config_cmd;
pub mod discover;
pub mod read;
pub mod watch;

use tuyasense_core::{PollerConfig, SensorHub};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(
    cmd: Command,
    config: &PollerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let hub = SensorHub::connect(config).await?;

    match cmd {
        Command::Discover => discover::handle(&hub, global),
        Command::Read(args) => read::handle(&hub, &args, global).await,
        Command::Watch(args) => watch::handle(&hub, &args, global).await,
        Command::Config(_) | Command::Completions(_) => unreachable!("handled before connecting"),
    }
}
