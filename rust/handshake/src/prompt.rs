use anyhow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("cannot read answer: {0:?}")]
    InternalError(#[from] anyhow::Error),
    #[error("choice {choice} is out of range for {options} options")]
    InvalidChoice { choice: usize, options: usize },
    #[error("{0} requires a non-empty answer")]
    EmptyInput(String),
}

/// Blocking access to whoever decides how MFA is answered.
pub trait Prompter {
    /// Returns the index into `options` that was picked.
    fn choose(&self, prompt: &str, options: &[&str]) -> Result<usize, PromptError>;
    fn require_string(&self, prompt: &str) -> Result<String, PromptError>;
}
