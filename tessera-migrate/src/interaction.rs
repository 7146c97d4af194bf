//! Collaborators the dev workflow talks to besides the engine.
//!
//! The terminal prompt and the generator/seed commands live in the CLI; the
//! workflow only sees these traits so it can be driven without a TTY.

use async_trait::async_trait;

use crate::datasource_info::DatasourceInfo;
use crate::error::MigrateResult;

/// Answer to the migration name prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameInput {
    /// The user typed a name (possibly empty).
    Name(String),
    /// The user aborted the prompt.
    Cancelled,
}

/// Interactive questions.
pub trait Prompt: Send {
    /// Whether a human can answer prompts.
    fn can_prompt(&self) -> bool;

    /// Ask a yes/no question.
    fn confirm(&mut self, message: &str) -> MigrateResult<bool>;

    /// Ask for a migration name.
    fn migration_name(&mut self) -> MigrateResult<NameInput>;
}

/// A prompt that never asks anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Prompt for NonInteractive {
    fn can_prompt(&self) -> bool {
        false
    }

    fn confirm(&mut self, _message: &str) -> MigrateResult<bool> {
        Ok(false)
    }

    fn migration_name(&mut self) -> MigrateResult<NameInput> {
        Ok(NameInput::Name(String::new()))
    }
}

/// Result of running the seed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedRun {
    /// No seed command is configured.
    NotConfigured,
    /// The seed command exited successfully.
    Succeeded,
    /// The seed command failed.
    Failed(String),
}

/// Steps that run once the database matches the schema.
#[async_trait]
pub trait PostMigrateHooks: Send {
    /// Regenerate the client.
    async fn generate(&mut self, datasource: &DatasourceInfo) -> MigrateResult<()>;

    /// Seed the database.
    async fn seed(&mut self) -> MigrateResult<SeedRun>;
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

#[async_trait]
impl PostMigrateHooks for NoHooks {
    async fn generate(&mut self, _datasource: &DatasourceInfo) -> MigrateResult<()> {
        Ok(())
    }

    async fn seed(&mut self) -> MigrateResult<SeedRun> {
        Ok(SeedRun::NotConfigured)
    }
}
