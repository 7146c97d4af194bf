//! JSON-RPC adapter for the schema engine binary.
//!
//! The engine is started as a child process and speaks JSON-RPC 2.0 over
//! stdio, one message per line. Requests are strictly sequential.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use super::SchemaEngine;
use super::types::{
    AppliedMigrations, ApplyMigrationsInput, CreateMigrationInput, CreateMigrationOutput,
    DataLossEvaluation, DevDiagnostic, DevDiagnosticInput, DiagnoseMigrationHistoryInput,
    DiagnoseMigrationHistoryOutput, EnsureDatabaseOutput, EvaluateDataLossInput, IntrospectInput,
    IntrospectOutput, ResetInput, SchemasContainer,
};
use crate::error::{MigrateResult, MigrationError};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How to start the engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Engine binary, resolved through `PATH` when not absolute.
    pub binary: PathBuf,
    /// Schema files passed as `--datamodels`.
    pub schema_paths: Vec<PathBuf>,
    /// Driver adapter the engine should connect through.
    pub adapter: Option<String>,
    /// Working directory of the child process.
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    id: Option<Value>,
    method: Option<String>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
    data: Option<JsonRpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorData {
    error_code: Option<String>,
    message: Option<String>,
}

/// A schema engine running as a child process.
pub struct JsonRpcEngine {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl JsonRpcEngine {
    /// Start the engine and check that it answers.
    ///
    /// Any failure here is [`MigrationError::EngineUnavailable`].
    pub async fn spawn(options: EngineOptions) -> MigrateResult<Self> {
        let mut command = Command::new(&options.binary);
        command.arg("--datamodels").args(&options.schema_paths);
        if let Some(adapter) = &options.adapter {
            command.arg("--adapter").arg(adapter);
        }
        if let Some(dir) = &options.working_dir {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            MigrationError::engine_unavailable(format!("{}: {e}", options.binary.display()))
        })?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MigrationError::engine_unavailable("engine stdout is not piped"))?;

        let mut engine = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
        };

        let version =
            match tokio::time::timeout(HANDSHAKE_TIMEOUT, engine.request::<_, Value>("version", ()))
                .await
            {
                Ok(Ok(version)) => version,
                Ok(Err(e)) => return Err(MigrationError::engine_unavailable(e.to_string())),
                Err(_) => {
                    return Err(MigrationError::engine_unavailable(
                        "the schema engine did not answer the version handshake",
                    ));
                }
            };

        info!(binary = %options.binary.display(), %version, "schema engine started");
        Ok(engine)
    }

    async fn request<P, R>(&mut self, method: &str, params: P) -> MigrateResult<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_string(&JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        })
        .map_err(|e| MigrationError::engine_query(method, e.to_string()))?;
        line.push('\n');

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MigrationError::engine_query(method, "engine input is closed"))?;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| MigrationError::engine_query(method, e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| MigrationError::engine_query(method, e.to_string()))?;

        debug!(method, id, "engine request sent");

        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|e| MigrationError::engine_query(method, e.to_string()))?
                .ok_or_else(|| MigrationError::engine_query(method, "engine closed its output"))?;
            if line.trim().is_empty() {
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_str(&line).map_err(|e| {
                MigrationError::engine_query(method, format!("malformed response: {e}"))
            })?;

            let Some(response_id) = response.id else {
                debug!(notification = ?response.method, "engine notification");
                continue;
            };
            if response_id.as_u64() != Some(id) {
                return Err(MigrationError::engine_query(
                    method,
                    format!("response id {response_id} does not match request id {id}"),
                ));
            }

            if let Some(error) = response.error {
                let (code, message) = match error.data {
                    Some(data) => (data.error_code, data.message.unwrap_or(error.message)),
                    None => (None, error.message),
                };
                return Err(MigrationError::Engine { code, message });
            }

            return serde_json::from_value(response.result.unwrap_or(Value::Null))
                .map_err(|e| MigrationError::engine_query(method, format!("unexpected result: {e}")));
        }
    }
}

#[async_trait]
impl SchemaEngine for JsonRpcEngine {
    async fn dev_diagnostic(&mut self, input: DevDiagnosticInput) -> MigrateResult<DevDiagnostic> {
        self.request("devDiagnostic", input).await
    }

    async fn apply_migrations(
        &mut self,
        input: ApplyMigrationsInput,
    ) -> MigrateResult<AppliedMigrations> {
        self.request("applyMigrations", input).await
    }

    async fn evaluate_data_loss(
        &mut self,
        input: EvaluateDataLossInput,
    ) -> MigrateResult<DataLossEvaluation> {
        self.request("evaluateDataLoss", input).await
    }

    async fn create_migration(
        &mut self,
        input: CreateMigrationInput,
    ) -> MigrateResult<CreateMigrationOutput> {
        self.request("createMigration", input).await
    }

    async fn diagnose_migration_history(
        &mut self,
        input: DiagnoseMigrationHistoryInput,
    ) -> MigrateResult<DiagnoseMigrationHistoryOutput> {
        self.request("diagnoseMigrationHistory", input).await
    }

    async fn ensure_database(
        &mut self,
        schema: SchemasContainer,
    ) -> MigrateResult<EnsureDatabaseOutput> {
        self.request("ensureDatabase", serde_json::json!({ "schema": schema }))
            .await
    }

    async fn reset(&mut self, input: ResetInput) -> MigrateResult<()> {
        self.request::<_, Value>("reset", input).await?;
        Ok(())
    }

    async fn introspect(&mut self, input: IntrospectInput) -> MigrateResult<IntrospectOutput> {
        self.request("introspect", input).await
    }

    async fn stop(&mut self) -> MigrateResult<()> {
        // Closing stdin asks the engine to exit.
        drop(self.stdin.take());

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(|e| MigrationError::engine_query("stop", e.to_string()))?;
                debug!(%status, "schema engine exited");
            }
            Err(_) => {
                debug!("schema engine did not exit in time, killing it");
                self.child
                    .kill()
                    .await
                    .map_err(|e| MigrationError::engine_query("stop", e.to_string()))?;
            }
        }
        Ok(())
    }
}
