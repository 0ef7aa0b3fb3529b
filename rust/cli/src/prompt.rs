use anyhow::anyhow;
use dialoguer::{Input, Password, Select};
use handshake::{PromptError, Prompter};

pub(crate) struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn choose(&self, prompt: &str, options: &[&str]) -> Result<usize, PromptError> {
        Select::new()
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact()
            .map_err(|e| PromptError::InternalError(anyhow!(e)))
    }

    fn require_string(&self, prompt: &str) -> Result<String, PromptError> {
        Input::<String>::new()
            .with_prompt(prompt)
            .validate_with(|input: &String| -> Result<(), &str> {
                if input.trim().is_empty() {
                    Err("a value is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()
            .map_err(|e| PromptError::InternalError(anyhow!(e)))
    }
}

pub(crate) fn password() -> anyhow::Result<String> {
    Ok(Password::new().with_prompt("Password").interact()?)
}
