//! Register reload run after a job ends.

use std::sync::Arc;

use async_trait::async_trait;
use logibooks_client::{ApiError, RegistersApi};
use logibooks_core::types::DbId;
use logibooks_core::JobOperation;
use logibooks_jobs::ListRefresher;
use tokio::sync::Notify;

/// Reloads the register header and signals `done` once it has.
pub struct RegisterRefresher {
    registers: RegistersApi,
    done: Arc<Notify>,
}

impl RegisterRefresher {
    pub fn new(registers: RegistersApi, done: Arc<Notify>) -> Self {
        Self { registers, done }
    }
}

#[async_trait]
impl ListRefresher for RegisterRefresher {
    async fn refresh(&self, register_id: DbId, operation: JobOperation) -> Result<(), ApiError> {
        let result = self.registers.get(register_id).await;
        self.done.notify_one();

        let summary = result?;
        tracing::info!(
            register_id,
            %operation,
            file_name = summary.file_name.as_deref().unwrap_or("-"),
            "Register reloaded",
        );
        Ok(())
    }
}
