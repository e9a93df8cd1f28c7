//! Backend seams used by the poller.

use async_trait::async_trait;
use logibooks_client::{ApiError, RegistersApi};
use logibooks_core::types::DbId;
use logibooks_core::{JobHandle, JobOperation, JobProgress};

/// Start, progress and cancel endpoints of a job kind.
#[async_trait]
pub trait JobApi: Send + Sync + 'static {
    async fn start(
        &self,
        register_id: DbId,
        operation: JobOperation,
    ) -> Result<JobHandle, ApiError>;

    async fn progress(
        &self,
        operation: JobOperation,
        handle: &JobHandle,
    ) -> Result<JobProgress, ApiError>;

    async fn cancel(&self, operation: JobOperation, handle: &JobHandle) -> Result<(), ApiError>;
}

/// Reloads whatever the finished job changed.
///
/// Called once after a job completes or fails. Errors are logged, never
/// surfaced as job failures.
#[async_trait]
pub trait ListRefresher: Send + Sync + 'static {
    async fn refresh(&self, register_id: DbId, operation: JobOperation) -> Result<(), ApiError>;
}

#[async_trait]
impl JobApi for RegistersApi {
    async fn start(
        &self,
        register_id: DbId,
        operation: JobOperation,
    ) -> Result<JobHandle, ApiError> {
        match operation {
            JobOperation::Validation => self.start_validation(register_id).await,
            JobOperation::FeacnLookup { extended } => {
                self.start_feacn_lookup(register_id, extended).await
            }
        }
    }

    async fn progress(
        &self,
        operation: JobOperation,
        handle: &JobHandle,
    ) -> Result<JobProgress, ApiError> {
        match operation {
            JobOperation::Validation => self.validation_progress(handle).await,
            JobOperation::FeacnLookup { .. } => self.feacn_lookup_progress(handle).await,
        }
    }

    async fn cancel(&self, operation: JobOperation, handle: &JobHandle) -> Result<(), ApiError> {
        match operation {
            JobOperation::Validation => self.cancel_validation(handle).await,
            JobOperation::FeacnLookup { .. } => self.cancel_feacn_lookup(handle).await,
        }
    }
}
