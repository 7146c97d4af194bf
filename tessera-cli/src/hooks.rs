//! Generator and seed commands from `tessera.toml`.

use std::path::PathBuf;
use std::process::ExitStatus;

use async_trait::async_trait;
use tessera_migrate::{DatasourceInfo, MigrateResult, MigrationError, PostMigrateHooks, SeedRun};
use tokio::process::Command;
use tracing::{debug, info};

use crate::output;

/// Runs `[generator] command` and `[seed] command` through the shell.
#[derive(Debug, Clone, Default)]
pub struct CommandHooks {
    generator: Option<String>,
    seed: Option<String>,
    cwd: PathBuf,
}

impl CommandHooks {
    /// Create hooks running in `cwd`.
    pub fn new(generator: Option<String>, seed: Option<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            seed,
            cwd: cwd.into(),
        }
    }

    async fn shell(&self, command: &str) -> std::io::Result<ExitStatus> {
        debug!(command, cwd = %self.cwd.display(), "running hook command");

        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };
        cmd.current_dir(&self.cwd).status().await
    }
}

#[async_trait]
impl PostMigrateHooks for CommandHooks {
    async fn generate(&mut self, datasource: &DatasourceInfo) -> MigrateResult<()> {
        let Some(command) = self.generator.clone() else {
            debug!("no generator command configured");
            return Ok(());
        };

        info!(provider = ?datasource.pretty_provider, "running generator");
        output::dim(&format!("Running generate... ({command})"));
        let status = self
            .shell(&command)
            .await
            .map_err(|e| MigrationError::other(format!("could not run `{command}`: {e}")))?;

        if status.success() {
            output::success("Generated client");
            Ok(())
        } else {
            Err(MigrationError::other(format!(
                "generator command `{command}` failed with {status}"
            )))
        }
    }

    async fn seed(&mut self) -> MigrateResult<SeedRun> {
        let Some(command) = self.seed.clone() else {
            return Ok(SeedRun::NotConfigured);
        };

        output::newline();
        output::dim(&format!("Running seed command `{command}` ..."));
        match self.shell(&command).await {
            Ok(status) if status.success() => Ok(SeedRun::Succeeded),
            Ok(status) => Ok(SeedRun::Failed(format!(
                "seed command `{command}` failed with {status}"
            ))),
            Err(e) => Ok(SeedRun::Failed(format!("could not run `{command}`: {e}"))),
        }
    }
}
