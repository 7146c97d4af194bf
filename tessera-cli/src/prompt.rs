//! Terminal implementation of the migration prompts.

use is_terminal::IsTerminal;
use tessera_migrate::{MigrateResult, NameInput, Prompt};

use crate::output;

/// Whether prompts can be shown: stdin is a TTY and `CI` is not set.
pub fn can_prompt() -> bool {
    std::io::stdin().is_terminal() && std::env::var_os("CI").is_none()
}

/// Prompts on stdin/stdout.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    interactive: bool,
}

impl TerminalPrompt {
    /// Detect whether the terminal is interactive.
    pub fn detect() -> Self {
        Self {
            interactive: can_prompt(),
        }
    }
}

impl Prompt for TerminalPrompt {
    fn can_prompt(&self) -> bool {
        self.interactive
    }

    fn confirm(&mut self, message: &str) -> MigrateResult<bool> {
        Ok(output::confirm(message).unwrap_or(false))
    }

    fn migration_name(&mut self) -> MigrateResult<NameInput> {
        Ok(match output::input("Enter a name for the new migration") {
            Some(name) => NameInput::Name(name),
            None => NameInput::Cancelled,
        })
    }
}
