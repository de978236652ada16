//! Command implementations

pub mod copy;
pub mod profile;

use crate::error::Result as CliResult;
use anyhow::Context;
use dialoguer::Confirm;
use std::io::IsTerminal;

/// Confirm an action with the user
///
/// Without a terminal on stdin nothing can be asked, so the answer is "no".
pub fn confirm_action(message: &str, skip_hint: &str) -> CliResult<bool> {
    if std::io::stdin().is_terminal() {
        Ok(Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .context("Failed to get user confirmation")?)
    } else {
        eprintln!("Warning: {} Use {} to skip confirmation.", message, skip_hint);
        Ok(false)
    }
}
