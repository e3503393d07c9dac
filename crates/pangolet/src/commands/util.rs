//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use dialoguer::Select;

use pangolet_core::{
    ActionStyle, Confirm, ConfirmChoice, ConfirmPrompt, Controller, Resource,
};

use crate::error::CliError;

/// Load the resource list and find `query` by key, nice id, or name.
pub async fn resolve_resource(
    controller: &Controller,
    query: &str,
) -> Result<Arc<Resource>, CliError> {
    if controller.resources().is_empty() {
        controller.load_resources().await?;
    }
    controller.resolve(query).ok_or_else(|| CliError::NotFound {
        resource_type: "resource".into(),
        identifier: query.into(),
        list_command: "resources list".into(),
    })
}

/// Whether prompts can be shown on this terminal.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Terminal confirmer ──────────────────────────────────────────────

/// Puts a [`ConfirmPrompt`] to the user as a two-item selection.
///
/// Escape, a closed terminal, or a panicked prompt thread all count as cancel.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> ConfirmChoice {
        let prompt = prompt.clone();
        tokio::task::spawn_blocking(move || ask(&prompt))
            .await
            .unwrap_or(ConfirmChoice::Cancel)
    }
}

fn ask(prompt: &ConfirmPrompt) -> ConfirmChoice {
    eprintln!("{}", prompt.title);
    let labels: Vec<&str> = prompt.actions.iter().map(|a| a.label.as_str()).collect();
    let default = prompt
        .actions
        .iter()
        .position(|a| a.style == ActionStyle::Cancel)
        .unwrap_or(0);

    match Select::new()
        .with_prompt(&prompt.message)
        .items(&labels)
        .default(default)
        .interact_opt()
    {
        Ok(Some(index)) => prompt
            .actions
            .get(index)
            .map_or(ConfirmChoice::Cancel, |a| a.choice),
        Ok(None) | Err(_) => ConfirmChoice::Cancel,
    }
}
