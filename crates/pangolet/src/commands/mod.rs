//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod config_cmd;
pub mod discover;
pub mod ip;
pub mod resources;
pub mod util;
pub mod whitelist;

use pangolet_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Resources(args) => resources::handle(controller, args, global).await,
        Command::Whitelist(args) => whitelist::handle(controller, args, global).await,
        Command::Ip => ip::handle(controller, global).await,
        Command::Discover(args) => discover::handle(controller, args, global).await,
        Command::Genres(args) => discover::handle_genres(controller, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
