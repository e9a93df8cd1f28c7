//! Register endpoints used by long-running jobs.
//!
//! Two job kinds run per register, each with a start, progress and cancel
//! endpoint:
//!
//! | Job            | Start                                    | Progress / cancel                    |
//! |----------------|------------------------------------------|--------------------------------------|
//! | Validation     | `POST {base}/{id}/validate`              | `GET`/`DELETE {base}/validate/{h}`   |
//! | FEACN lookup   | `POST {base}/{id}/lookup-feacn-codes`    | `GET`/`DELETE {base}/lookup-feacn-codes/{h}` |

use std::sync::Arc;

use logibooks_core::types::DbId;
use logibooks_core::{JobHandle, JobProgress};
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::ApiClient;

const DEFAULT_BASE: &str = "/registers";

/// Body returned by the start endpoints.
#[derive(Debug, Deserialize)]
struct JobStarted {
    id: JobHandle,
}

/// Register header as returned by `GET {base}/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSummary {
    pub id: DbId,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Fields this client does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Typed wrapper over the register endpoints.
#[derive(Clone)]
pub struct RegistersApi {
    api: Arc<ApiClient>,
    base: String,
}

impl RegistersApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self::with_base(api, DEFAULT_BASE)
    }

    /// Use a non-default collection path (e.g. a partner-specific prefix).
    pub fn with_base(api: Arc<ApiClient>, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { api, base }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub async fn get(&self, register_id: DbId) -> Result<RegisterSummary, ApiError> {
        self.api.get_json(&format!("{}/{register_id}", self.base)).await
    }

    // ---- validation ----

    pub async fn start_validation(&self, register_id: DbId) -> Result<JobHandle, ApiError> {
        let started: JobStarted = self
            .api
            .post_json::<_, serde_json::Value>(&self.validate_start_path(register_id), None)
            .await?;
        Ok(started.id)
    }

    pub async fn validation_progress(&self, handle: &JobHandle) -> Result<JobProgress, ApiError> {
        self.api.get_json(&self.validate_job_path(handle)).await
    }

    pub async fn cancel_validation(&self, handle: &JobHandle) -> Result<(), ApiError> {
        self.api.delete(&self.validate_job_path(handle)).await
    }

    // ---- FEACN lookup ----

    pub async fn start_feacn_lookup(
        &self,
        register_id: DbId,
        extended: bool,
    ) -> Result<JobHandle, ApiError> {
        let started: JobStarted = self
            .api
            .post_json::<_, serde_json::Value>(&self.lookup_start_path(register_id, extended), None)
            .await?;
        Ok(started.id)
    }

    pub async fn feacn_lookup_progress(&self, handle: &JobHandle) -> Result<JobProgress, ApiError> {
        self.api.get_json(&self.lookup_job_path(handle)).await
    }

    pub async fn cancel_feacn_lookup(&self, handle: &JobHandle) -> Result<(), ApiError> {
        self.api.delete(&self.lookup_job_path(handle)).await
    }

    // ---- paths ----

    fn validate_start_path(&self, register_id: DbId) -> String {
        format!("{}/{register_id}/validate", self.base)
    }

    fn validate_job_path(&self, handle: &JobHandle) -> String {
        format!("{}/validate/{handle}", self.base)
    }

    fn lookup_start_path(&self, register_id: DbId, extended: bool) -> String {
        let path = format!("{}/{register_id}/lookup-feacn-codes", self.base);
        if extended {
            format!("{path}?extended=true")
        } else {
            path
        }
    }

    fn lookup_job_path(&self, handle: &JobHandle) -> String {
        format!("{}/lookup-feacn-codes/{handle}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;

    fn registers() -> RegistersApi {
        let config = ClientConfig::new("http://localhost:8080/api".parse().unwrap());
        let api = ApiClient::with_client(reqwest::Client::new(), &config, Arc::new(SessionStore::new()));
        RegistersApi::new(Arc::new(api))
    }

    #[test]
    fn validation_paths() {
        let r = registers();
        let handle = JobHandle::new("abc").unwrap();
        assert_eq!(r.validate_start_path(12), "/registers/12/validate");
        assert_eq!(r.validate_job_path(&handle), "/registers/validate/abc");
    }

    #[test]
    fn lookup_paths() {
        let r = registers();
        let handle = JobHandle::new("9").unwrap();
        assert_eq!(r.lookup_start_path(3, false), "/registers/3/lookup-feacn-codes");
        assert_eq!(
            r.lookup_start_path(3, true),
            "/registers/3/lookup-feacn-codes?extended=true"
        );
        assert_eq!(r.lookup_job_path(&handle), "/registers/lookup-feacn-codes/9");
    }

    #[test]
    fn custom_base_drops_trailing_slash() {
        let r = RegistersApi::with_base(Arc::clone(registers().client()), "/partner/registers/");
        assert_eq!(r.validate_start_path(1), "/partner/registers/1/validate");
    }

    #[test]
    fn register_summary_keeps_unknown_fields() {
        let summary: RegisterSummary = serde_json::from_value(serde_json::json!({
            "id": 5,
            "fileName": "batch.xlsx",
            "ordersTotal": 120
        }))
        .unwrap();
        assert_eq!(summary.id, 5);
        assert_eq!(summary.file_name.as_deref(), Some("batch.xlsx"));
        assert_eq!(summary.extra["ordersTotal"], 120);
    }
}
