//! Scoped engine session.

use tracing::{debug, warn};

use super::SchemaEngine;
use crate::error::{MigrateResult, MigrationError};

/// Owns a started engine and guarantees it is stopped at most once.
///
/// Calls after [`stop`](Self::stop) fail instead of reaching the engine.
pub struct EngineSession<E: SchemaEngine> {
    engine: E,
    stopped: bool,
}

impl<E: SchemaEngine> EngineSession<E> {
    /// Take ownership of a started engine.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            stopped: false,
        }
    }

    /// Borrow the engine for a call.
    pub fn engine(&mut self) -> MigrateResult<&mut E> {
        if self.stopped {
            return Err(MigrationError::other("the schema engine session is already stopped"));
        }
        Ok(&mut self.engine)
    }

    /// Stop the engine. Later calls are no-ops.
    pub async fn stop(&mut self) -> MigrateResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        debug!("stopping schema engine");
        self.engine.stop().await
    }
}

impl<E: SchemaEngine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        if !self.stopped {
            warn!("schema engine session dropped without being stopped");
        }
    }
}
