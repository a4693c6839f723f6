use anyhow::Result;
use inquire::validator::Validation;
use inquire::{Confirm, Text};

use costbench_core::SavedSelections;

/// Prompts for a selection name, rejecting blank and taken names up front
pub fn prompt_selection_name(existing: &SavedSelections) -> Result<String> {
    let taken: Vec<String> = existing.iter().map(|s| s.name.to_lowercase()).collect();

    let name = Text::new("Selection name:")
        .with_validator(move |input: &str| {
            let trimmed = input.trim();
            if trimmed.is_empty() {
                Ok(Validation::Invalid(
                    "Please enter a name for your selection".into(),
                ))
            } else if taken.contains(&trimmed.to_lowercase()) {
                Ok(Validation::Invalid(
                    "A selection with this name already exists".into(),
                ))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    Ok(name)
}

/// Prompts for an optional description; blank means none
pub fn prompt_description() -> Result<Option<String>> {
    let description = Text::new("Description (optional):").prompt()?;
    let description = description.trim();
    Ok((!description.is_empty()).then(|| description.to_string()))
}

pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}
