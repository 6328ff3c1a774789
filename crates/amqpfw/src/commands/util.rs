//! Shared helpers for command handlers.

use std::path::Path;

use amqpfw_core::{DesiredFirewall, RulesFile};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Refuses instead of prompting when stdin is not a terminal.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    use std::io::IsTerminal;

    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Read a rules file (TOML, YAML, or JSON by extension) and validate it.
pub fn read_rules_file(path: &Path) -> Result<DesiredFirewall, CliError> {
    let shown = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::RulesFile {
        path: shown.clone(),
        reason: e.to_string(),
    })?;

    let file = parse_rules(path, &contents).map_err(|reason| CliError::RulesFile {
        path: shown,
        reason,
    })?;
    DesiredFirewall::try_from(file).map_err(CliError::InvalidRules)
}

fn parse_rules(path: &Path, contents: &str) -> Result<RulesFile, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("toml") => toml::from_str(contents).map_err(|e| e.to_string()),
        Some("yaml" | "yml") => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
        Some("json") => serde_json::from_str(contents).map_err(|e| e.to_string()),
        _ => Err("unknown extension: expected .toml, .yaml, .yml, or .json".into()),
    }
}
