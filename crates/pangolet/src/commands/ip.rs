//! Public IP command handler.

use serde::Serialize;

use pangolet_core::Controller;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct PublicIp {
    ip: String,
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let ip = PublicIp {
        ip: controller.public_ip().await?,
    };
    let out = output::render_single(&global.output, &ip, |i| i.ip.clone(), |i| i.ip.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
