use anyhow::Result;
use dialoguer::Confirm;

/// Ask before a change that touches many records. `assume_yes` skips the prompt.
pub fn confirm(prompt: String, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}
