//! Whitelist command handler.

use serde::Serialize;

use pangolet_core::{
    Confirm, ConfirmChoice, Controller, FixedChoice, ResourceKey, WhitelistOutcome,
};

use crate::cli::{GlobalOpts, WhitelistArgs};
use crate::error::CliError;
use crate::output;

use super::util::{self, TerminalConfirm};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Added,
    AlreadyWhitelisted,
    Cancelled,
    Whitelisted,
    NotWhitelisted,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::AlreadyWhitelisted => "already_whitelisted",
            Self::Cancelled => "cancelled",
            Self::Whitelisted => "whitelisted",
            Self::NotWhitelisted => "not_whitelisted",
        }
    }
}

impl From<&WhitelistOutcome> for Status {
    fn from(outcome: &WhitelistOutcome) -> Self {
        match outcome {
            WhitelistOutcome::Added { .. } => Self::Added,
            WhitelistOutcome::AlreadyWhitelisted { .. } => Self::AlreadyWhitelisted,
            WhitelistOutcome::Cancelled { .. } => Self::Cancelled,
        }
    }
}

#[derive(Serialize)]
struct WhitelistReport {
    resource: String,
    ip: String,
    status: Status,
}

fn detail(r: &WhitelistReport) -> String {
    let (ip, name) = (&r.ip, &r.resource);
    match r.status {
        Status::Added => format!("Added {ip} to the access rules of {name}"),
        Status::AlreadyWhitelisted => format!("{ip} is already whitelisted for {name}"),
        Status::Cancelled => format!("Cancelled; {ip} was not added to {name}"),
        Status::Whitelisted => format!("{ip} is whitelisted for {name}"),
        Status::NotWhitelisted => format!("{ip} is not whitelisted for {name}"),
    }
}

pub async fn handle(
    controller: &Controller,
    args: WhitelistArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let resource = util::resolve_resource(controller, &args.resource).await?;
    let key = resource.key();
    let name = resource.display_name();

    let report = if args.check {
        let check = controller.check_whitelisted(&key).await?;
        WhitelistReport {
            resource: name,
            ip: check.ip,
            status: if check.listed {
                Status::Whitelisted
            } else {
                Status::NotWhitelisted
            },
        }
    } else {
        let interactive = util::is_interactive();
        let outcome = if global.yes {
            run(controller, &key, &FixedChoice(ConfirmChoice::Confirm)).await?
        } else if interactive {
            run(controller, &key, &TerminalConfirm).await?
        } else {
            run(controller, &key, &FixedChoice(ConfirmChoice::Cancel)).await?
        };

        if matches!(outcome, WhitelistOutcome::Cancelled { .. }) && !interactive && !global.yes {
            return Err(CliError::NonInteractiveRequiresYes {
                action: format!("whitelist {name}"),
            });
        }

        WhitelistReport {
            resource: name,
            ip: outcome.ip().to_owned(),
            status: Status::from(&outcome),
        }
    };

    let out = output::render_single(
        &global.output,
        &report,
        detail,
        |r| r.status.as_str().to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn run<C: Confirm>(
    controller: &Controller,
    key: &ResourceKey,
    confirm: &C,
) -> Result<WhitelistOutcome, CliError> {
    Ok(controller.whitelist(key, confirm).await?)
}
